//! Cache management command implementations

use std::path::Path;

use colored::Colorize;
use tabled::Tabled;

use crate::error::Result;
use crate::output::formatters::{format_local_timestamp, format_size};
use crate::output::table::format_table;

use super::OutputFormat;

#[derive(Tabled)]
struct PartitionRow {
    #[tabled(rename = "PARTITION")]
    partition: String,
    #[tabled(rename = "ENTRIES")]
    entries: usize,
    #[tabled(rename = "SIZE")]
    size: String,
    #[tabled(rename = "OLDEST")]
    oldest: String,
    #[tabled(rename = "NEWEST")]
    newest: String,
}

/// Show per-partition statistics
pub fn status(format: OutputFormat, cache_dir: Option<&Path>) -> Result<()> {
    let store = super::open_store(cache_dir)?;
    let stats = store.stats()?;

    match format {
        OutputFormat::Json => {
            let partitions: Vec<serde_json::Value> = stats
                .iter()
                .map(|s| {
                    serde_json::json!({
                        "partition": s.partition,
                        "entries": s.entries,
                        "size_bytes": s.size_bytes,
                        "oldest": s.oldest,
                        "newest": s.newest,
                    })
                })
                .collect();
            let payload = serde_json::json!({
                "location": super::store_dir(cache_dir)?.display().to_string(),
                "partitions": partitions,
            });
            println!("{}", serde_json::to_string_pretty(&payload)?);
        }
        OutputFormat::Table => {
            let rows: Vec<PartitionRow> = stats
                .iter()
                .map(|s| PartitionRow {
                    partition: s.partition.clone(),
                    entries: s.entries,
                    size: format_size(s.size_bytes),
                    oldest: s.oldest.map(format_local_timestamp).unwrap_or_else(|| "-".to_string()),
                    newest: s.newest.map(format_local_timestamp).unwrap_or_else(|| "-".to_string()),
                })
                .collect();
            println!("{}", format_table(&rows));
            println!(
                "Cache location: {}",
                super::store_dir(cache_dir)?.display().to_string().dimmed()
            );
        }
    }

    Ok(())
}

/// Remove every cached entry
pub fn clear(format: OutputFormat, cache_dir: Option<&Path>) -> Result<()> {
    let store = super::open_store(cache_dir)?;
    let cleared = store.clear_all()?;

    match format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string_pretty(&serde_json::json!({
                    "entries_removed": cleared.entries_removed,
                }))?
            );
        }
        OutputFormat::Table => {
            println!(
                "{} Removed {} cached {}",
                "✓".green(),
                cleared.entries_removed,
                if cleared.entries_removed == 1 { "entry" } else { "entries" }
            );
        }
    }

    Ok(())
}
