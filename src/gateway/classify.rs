//! Request classification
//!
//! Every request resolves to exactly one strategy. Rules are evaluated in
//! priority order and the first match wins, so a non-GET request to a
//! static-looking URL still bypasses the cache.

use reqwest::{Method, Url};

use crate::cache::{FONT_HOSTS, NETWORK_ONLY_SUBSTRINGS};
use crate::client::{Destination, SiteRequest};

/// Strategy assigned to a request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestClass {
    /// Straight to the network, untouched and uncached
    Bypass,
    /// Serve cached if present, network only on a miss
    CacheFirst,
    /// Live network wins, cache then offline page as fallback
    NetworkFirst,
    /// Serve cached immediately, refresh in the background
    StaleWhileRevalidate,
}

impl std::fmt::Display for RequestClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            RequestClass::Bypass => "bypass",
            RequestClass::CacheFirst => "cache-first",
            RequestClass::NetworkFirst => "network-first",
            RequestClass::StaleWhileRevalidate => "stale-while-revalidate",
        };
        f.write_str(name)
    }
}

/// Path extensions treated as static assets regardless of destination hint
const STATIC_EXTENSIONS: &[&str] = &[
    ".css", ".js", ".mjs", ".png", ".jpg", ".jpeg", ".gif", ".webp", ".avif", ".svg", ".ico",
    ".woff", ".woff2", ".ttf", ".otf", ".map",
];

fn has_static_extension(url: &Url) -> bool {
    let path = url.path().to_ascii_lowercase();
    STATIC_EXTENSIONS.iter().any(|ext| path.ends_with(ext))
}

fn is_font_host(url: &Url) -> bool {
    url.host_str()
        .map(|h| FONT_HOSTS.contains(&h))
        .unwrap_or(false)
}

// Scheme, host, and port, the browser's origin tuple; host alone would
// treat http://site as same-origin with https://site
fn is_same_origin(url: &Url, origin: &Url) -> bool {
    url.scheme() == origin.scheme()
        && url.host_str() == origin.host_str()
        && url.port_or_known_default() == origin.port_or_known_default()
}

/// Classify a request against the site origin.
///
/// Priority order: mutation bypass, foreign-origin bypass, network-only
/// denylist, static assets, documents, then stale-while-revalidate for the
/// rest.
pub fn classify(request: &SiteRequest, origin: &Url) -> RequestClass {
    // 1. Never cache mutation requests
    if request.method != Method::GET {
        return RequestClass::Bypass;
    }

    // 2. Cross-origin, except the font CDN
    if !is_same_origin(&request.url, origin) && !is_font_host(&request.url) {
        return RequestClass::Bypass;
    }

    // 3. Forms, live chat, analytics must never be served stale
    let url_str = request.url.as_str();
    if NETWORK_ONLY_SUBSTRINGS.iter().any(|s| url_str.contains(s)) {
        return RequestClass::Bypass;
    }

    // 4. Static subresources. Font-CDN requests are only allowed through
    // rule 2 so they can be cached; they belong here even without an
    // extension (the stylesheet URLs have none).
    if matches!(
        request.destination,
        Destination::Image | Destination::Font | Destination::Style | Destination::Script
    ) || has_static_extension(&request.url)
        || is_font_host(&request.url)
    {
        return RequestClass::CacheFirst;
    }

    // 5. Documents
    if request.destination == Destination::Document {
        return RequestClass::NetworkFirst;
    }

    // 6. Everything else
    RequestClass::StaleWhileRevalidate
}
