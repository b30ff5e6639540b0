//! Shell completion generation

use clap::CommandFactory;
use clap_complete::{Shell, generate};

use super::Cli;

/// Generate completion script for the given shell on stdout
pub fn run(shell: Shell) {
    let mut cmd = Cli::command();
    generate(shell, &mut cmd, "offsite", &mut std::io::stdout());
}
