//! CLI command definitions and handlers

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand, ValueEnum};
pub use clap_complete::Shell;

pub mod cache;
pub mod completions;
pub mod fetch;
pub mod init;
pub mod quote;
pub mod services;
pub mod status;
pub mod warm;

use crate::cache::CacheStore;
use crate::config::Config;
use crate::error::{Error, Result};

/// Offline-first companion for the Meridian Studio website
#[derive(Parser, Debug)]
#[command(name = "offsite")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Output format (table, json); falls back to the configured preference
    #[arg(
        long,
        global = true,
        env = "OFFSITE_FORMAT",
        hide_env = true,
        hide_possible_values = true
    )]
    pub format: Option<OutputFormat>,

    /// Override config file location
    #[arg(long, global = true, env = "OFFSITE_CONFIG", hide_env = true)]
    pub config: Option<String>,

    /// Override cache directory location
    #[arg(long, global = true, env = "OFFSITE_CACHE_DIR", hide_env = true)]
    pub cache_dir: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, global = true, env = "OFFSITE_DEBUG", hide_env = true)]
    pub debug: bool,
}

/// Output format for command results
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize offsite configuration
    Init,

    /// Show configuration and cache status
    Status,

    /// Fetch a site URL through the cache gateway
    Fetch {
        /// Absolute URL or site-relative path (e.g. /pricing)
        url: String,
    },

    /// Precache the app shell for offline browsing
    Warm,

    /// List the service catalog
    Services {
        /// Use a catalog JSON file instead of the built-in catalog
        #[arg(long)]
        catalog: Option<PathBuf>,
    },

    /// Build a project quote interactively
    Quote {
        /// Use a catalog JSON file instead of the built-in catalog
        #[arg(long)]
        catalog: Option<PathBuf>,
    },

    /// Manage the local response cache
    #[command(subcommand)]
    Cache(CacheCommands),

    /// Generate shell completions
    Completion {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },

    /// Display version information
    Version,
}

/// Cache management subcommands
#[derive(Subcommand, Debug)]
pub enum CacheCommands {
    /// Show per-partition cache statistics
    Status,

    /// Remove every cached entry
    Clear,
}

/// Load config, falling back to defaults when no file exists yet.
///
/// Browsing and quoting work out of the box; only init-dependent settings
/// (relay, scheduling) are gated behind an explicit config.
pub fn load_config_lenient(path: Option<&str>) -> Result<Config> {
    match Config::load_at(path) {
        Ok(config) => Ok(config),
        Err(Error::Config(crate::error::ConfigError::NotFound)) => Ok(Config::default()),
        Err(err) => Err(err),
    }
}

/// Resolve the output format: explicit flag first, then the configured
/// preference, then the table default
pub fn resolve_format(flag: Option<OutputFormat>, config: &Config) -> OutputFormat {
    if let Some(format) = flag {
        return format;
    }
    match config.preferences.format.as_deref() {
        Some("json") => OutputFormat::Json,
        _ => OutputFormat::Table,
    }
}

/// Open the cache store at an override directory or the default location
pub fn open_store(cache_dir: Option<&Path>) -> Result<CacheStore> {
    let store = match cache_dir {
        Some(dir) => CacheStore::open_at(dir)?,
        None => CacheStore::open()?,
    };
    Ok(store)
}

/// The directory the store lives in, for display
pub fn store_dir(cache_dir: Option<&Path>) -> Result<PathBuf> {
    match cache_dir {
        Some(dir) => Ok(dir.to_path_buf()),
        None => Ok(CacheStore::default_dir()?),
    }
}
