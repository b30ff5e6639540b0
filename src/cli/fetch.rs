//! Fetch command implementation

use std::path::Path;

use colored::Colorize;

use crate::client::{HttpFetcher, SiteRequest};
use crate::error::Result;
use crate::gateway::{CacheGateway, Source};
use crate::output::formatters::format_size;

use super::OutputFormat;

/// Run the fetch command.
///
/// Accepts an absolute URL or a site-relative path, which is resolved
/// against the configured site origin.
pub async fn run(
    url: &str,
    format: OutputFormat,
    config_path: Option<&str>,
    cache_dir: Option<&Path>,
) -> Result<()> {
    let config = super::load_config_lenient(config_path)?;
    let store = super::open_store(cache_dir)?;
    let gateway = CacheGateway::new(HttpFetcher::new()?, store, &config.site_url)?;

    let absolute = if url.starts_with('/') {
        gateway
            .origin()
            .join(url)
            .map_err(|e| crate::error::FetchError::InvalidUrl(e.to_string()))?
            .to_string()
    } else {
        url.to_string()
    };

    let request = SiteRequest::get(&absolute)?;
    let served = gateway.fetch(&request).await?;

    match format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string_pretty(&serde_json::json!({
                    "url": absolute,
                    "class": served.class.to_string(),
                    "source": served.source.to_string(),
                    "status": served.response.status,
                    "size_bytes": served.response.body.len(),
                }))?
            );
        }
        OutputFormat::Table => {
            let source = match &served.source {
                Source::Network => served.source.to_string().cyan(),
                Source::Cache(_) => served.source.to_string().green(),
                Source::OfflineFallback => served.source.to_string().yellow(),
            };
            println!("{}", absolute.bold());
            println!("  Strategy: {}", served.class);
            println!("  Source:   {}", source);
            println!("  Status:   {}", served.response.status);
            println!("  Size:     {}", format_size(served.response.body.len()));
        }
    }

    // Process exit must not race the detached cache write
    gateway.flush().await;

    Ok(())
}
