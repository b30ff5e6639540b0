//! Partitioned response cache
//!
//! Three named partitions back the gateway's strategies: `shell` holds the
//! precached app shell, `static` holds opportunistically cached subresources,
//! `dynamic` holds documents and everything else under a FIFO size cap.
//! Partition names carry a version suffix; bumping [`CACHE_VERSION`] retires
//! every previously stored entry on the next open.

pub mod store;

pub use store::{CacheStore, CachedResponse, ClearStats, PartitionStats};

/// Bump to invalidate all previously cached partitions on deploy
pub const CACHE_VERSION: u32 = 4;

/// FIFO cap on the dynamic partition
pub const MAX_DYNAMIC_ENTRIES: usize = 50;

/// App-shell partition name for the current version
pub fn shell_partition() -> String {
    format!("shell-v{CACHE_VERSION}")
}

/// Static-asset partition name for the current version
pub fn static_partition() -> String {
    format!("static-v{CACHE_VERSION}")
}

/// Dynamic partition name for the current version
pub fn dynamic_partition() -> String {
    format!("dynamic-v{CACHE_VERSION}")
}

/// All partition names for the current version.
///
/// Anything stored under another name is stale and purged on store open.
pub fn current_partitions() -> [String; 3] {
    [shell_partition(), static_partition(), dynamic_partition()]
}

/// Paths precached into the shell partition at install time
pub const PRECACHE_MANIFEST: &[&str] = &[
    "/",
    "/about",
    "/services",
    "/pricing",
    "/case-studies",
    "/contact",
    "/quote",
    "/blog",
    "/faq",
    "/privacy",
    "/terms",
    "/offline",
    "/manifest.json",
    "/favicon.ico",
    "/icons/icon-192.png",
    "/icons/icon-512.png",
    "/css/site.css",
];

/// Fallback page served when a document is unreachable and uncached
pub const OFFLINE_PATH: &str = "/offline";

/// The only cross-origin hosts the gateway will cache (web font CDN)
pub const FONT_HOSTS: &[&str] = &["fonts.googleapis.com", "fonts.gstatic.com"];

/// URL substrings that must always hit the live network.
///
/// Own API routes plus the form, marketing-email, scheduling, chat, and
/// analytics vendors. Serving any of these stale would break forms, live
/// chat, or tracking.
pub const NETWORK_ONLY_SUBSTRINGS: &[&str] = &[
    "/api/",
    "formspree.io",
    "brevo.com",
    "calendly.com",
    "tawk.to",
    "clarity.ms",
    "google-analytics.com",
];
