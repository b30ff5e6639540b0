//! offsite - offline-first companion CLI for the Meridian Studio website

use clap::Parser;

mod cache;
mod cli;
mod client;
mod config;
mod error;
mod gateway;
mod output;
mod quote;
mod relay;

use cli::{CacheCommands, Cli, Commands};
use error::Result;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let filter = if cli.debug { "offsite=debug" } else { "offsite=warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(filter)).init();

    if let Err(err) = run(cli).await {
        eprintln!("Error: {}", err);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config_path = cli.config.as_deref();
    let cache_dir = cli.cache_dir.as_deref();
    let format = {
        let config = cli::load_config_lenient(config_path).unwrap_or_default();
        cli::resolve_format(cli.format, &config)
    };

    match cli.command {
        Commands::Init => cli::init::run(config_path).await,
        Commands::Status => cli::status::run(config_path, cache_dir),
        Commands::Fetch { url } => cli::fetch::run(&url, format, config_path, cache_dir).await,
        Commands::Warm => cli::warm::run(config_path, cache_dir).await,
        Commands::Services { catalog } => cli::services::run(catalog.as_deref(), format),
        Commands::Quote { catalog } => cli::quote::run(catalog.as_deref(), config_path).await,
        Commands::Cache(cache_cmd) => match cache_cmd {
            CacheCommands::Status => cli::cache::status(format, cache_dir),
            CacheCommands::Clear => cli::cache::clear(format, cache_dir),
        },
        Commands::Completion { shell } => {
            cli::completions::run(shell);
            Ok(())
        }
        Commands::Version => {
            println!("offsite version {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}
