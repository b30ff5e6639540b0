//! Status command implementation

use std::path::Path;

use colored::Colorize;

use crate::cache::{CACHE_VERSION, MAX_DYNAMIC_ENTRIES, PRECACHE_MANIFEST, shell_partition};
use crate::config::Config;
use crate::error::{Error, Result};

/// Show configuration and cache readiness
pub fn run(config_path: Option<&str>, cache_dir: Option<&Path>) -> Result<()> {
    println!("{}", "offsite status".bold());
    println!();

    match Config::load_at(config_path) {
        Ok(config) => {
            println!("  Config:     {}", Config::resolve_path(config_path)?.display());
            println!("  Site:       {}", config.site_url);
            println!(
                "  Relay:      {}",
                config.relay_url.as_deref().unwrap_or("(not set)")
            );
            println!(
                "  Scheduling: {}",
                config.scheduling_url.as_deref().unwrap_or("(not set)")
            );
        }
        Err(Error::Config(crate::error::ConfigError::NotFound)) => {
            println!(
                "  Config:     {} (run {} to create one)",
                "not found".yellow(),
                "offsite init".cyan()
            );
            println!("  Site:       {} (default)", Config::default().site_url);
        }
        Err(err) => return Err(err),
    }

    println!();
    println!("  Cache version: v{}", CACHE_VERSION);

    let store = super::open_store(cache_dir)?;
    let shell_count = store.len(&shell_partition())?;
    let total: usize = store.stats()?.iter().map(|s| s.entries).sum();

    println!(
        "  Shell:         {}/{} precached{}",
        shell_count,
        PRECACHE_MANIFEST.len(),
        if shell_count < PRECACHE_MANIFEST.len() {
            format!(" (run {} to fill)", "offsite warm".cyan())
        } else {
            String::new()
        }
    );
    println!(
        "  Entries:       {} total (dynamic cap {})",
        total, MAX_DYNAMIC_ENTRIES
    );
    println!("  Location:      {}", super::store_dir(cache_dir)?.display());

    if shell_count == PRECACHE_MANIFEST.len() {
        println!("\n{} Ready for offline browsing", "✓".green());
    }

    Ok(())
}
