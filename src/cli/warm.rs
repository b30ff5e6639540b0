//! Warm command implementation

use std::path::Path;

use colored::Colorize;
use indicatif::ProgressBar;

use crate::cache::PRECACHE_MANIFEST;
use crate::client::HttpFetcher;
use crate::error::Result;
use crate::gateway::CacheGateway;

/// Run the warm command: precache the app shell
pub async fn run(config_path: Option<&str>, cache_dir: Option<&Path>) -> Result<()> {
    let config = super::load_config_lenient(config_path)?;
    let store = super::open_store(cache_dir)?;
    let gateway = CacheGateway::new(HttpFetcher::new()?, store, &config.site_url)?;

    let spinner = ProgressBar::new_spinner();
    spinner.set_message(format!(
        "Precaching {} shell paths from {}...",
        PRECACHE_MANIFEST.len(),
        config.site_url
    ));
    spinner.enable_steady_tick(std::time::Duration::from_millis(100));

    let report = gateway.install().await;
    spinner.finish_and_clear();

    println!(
        "{} Cached {}/{} shell paths",
        if report.failed.is_empty() { "✓".green() } else { "!".yellow() },
        report.cached.len(),
        PRECACHE_MANIFEST.len()
    );

    for (url, reason) in &report.failed {
        println!("  {} {} ({})", "✗".red(), url, reason.dimmed());
    }

    if report.failed.is_empty() {
        println!("Site shell is ready for offline browsing.");
    } else {
        println!("Some paths could not be cached; run {} to retry.", "offsite warm".cyan());
    }

    Ok(())
}
