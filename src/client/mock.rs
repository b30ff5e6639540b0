//! Mock fetcher for testing the gateway without real HTTP
//!
//! Configure canned responses per URL, flip the network "offline", and assert
//! on per-URL fetch counts.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use super::{Fetch, SiteRequest, SiteResponse};
use crate::error::FetchError;

/// Mock fetcher with canned routes.
///
/// # Example
/// ```ignore
/// let mock = MockFetcher::new().with_route("https://example.com/", SiteResponse::ok("home"));
/// let resp = mock.fetch(&SiteRequest::get("https://example.com/")?).await?;
/// assert_eq!(mock.fetch_count("https://example.com/"), 1);
/// ```
pub struct MockFetcher {
    routes: Mutex<HashMap<String, SiteResponse>>,
    /// When true, every fetch fails as if the network were down
    offline: Mutex<bool>,
    fetch_counts: Arc<Mutex<HashMap<String, usize>>>,
}

impl Default for MockFetcher {
    fn default() -> Self {
        Self {
            routes: Mutex::new(HashMap::new()),
            offline: Mutex::new(false),
            fetch_counts: Arc::new(Mutex::new(HashMap::new())),
        }
    }
}

impl MockFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a canned response for a URL
    pub fn with_route(self, url: &str, response: SiteResponse) -> Self {
        self.routes
            .lock()
            .expect("routes lock")
            .insert(url.to_string(), response);
        self
    }

    /// Add or replace a route after construction
    pub fn set_route(&self, url: &str, response: SiteResponse) {
        self.routes
            .lock()
            .expect("routes lock")
            .insert(url.to_string(), response);
    }

    /// Simulate losing (or regaining) network connectivity
    pub fn set_offline(&self, offline: bool) {
        *self.offline.lock().expect("offline lock") = offline;
    }

    /// How many times a URL has been fetched
    pub fn fetch_count(&self, url: &str) -> usize {
        self.fetch_counts
            .lock()
            .expect("counts lock")
            .get(url)
            .copied()
            .unwrap_or(0)
    }

    /// Total fetches across all URLs
    pub fn total_fetches(&self) -> usize {
        self.fetch_counts.lock().expect("counts lock").values().sum()
    }
}

#[async_trait]
impl Fetch for MockFetcher {
    async fn fetch(&self, request: &SiteRequest) -> Result<SiteResponse, FetchError> {
        let url = request.url.to_string();

        *self
            .fetch_counts
            .lock()
            .expect("counts lock")
            .entry(url.clone())
            .or_insert(0) += 1;

        if *self.offline.lock().expect("offline lock") {
            return Err(FetchError::Network("Failed to connect".to_string()));
        }

        self.routes
            .lock()
            .expect("routes lock")
            .get(&url)
            .cloned()
            .ok_or_else(|| FetchError::Network(format!("no route for {url}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_serves_canned_route() {
        let mock = MockFetcher::new().with_route("https://example.com/", SiteResponse::ok("home"));

        let req = SiteRequest::get("https://example.com/").unwrap();
        let resp = mock.fetch(&req).await.unwrap();

        assert_eq!(resp.status, 200);
        assert_eq!(resp.body, b"home");
        assert_eq!(mock.fetch_count("https://example.com/"), 1);
    }

    #[tokio::test]
    async fn test_mock_offline_fails_every_fetch() {
        let mock = MockFetcher::new().with_route("https://example.com/", SiteResponse::ok("home"));
        mock.set_offline(true);

        let req = SiteRequest::get("https://example.com/").unwrap();
        let result = mock.fetch(&req).await;

        assert!(matches!(result, Err(FetchError::Network(_))));
        // Failed attempts still count
        assert_eq!(mock.fetch_count("https://example.com/"), 1);
    }

    #[tokio::test]
    async fn test_mock_unknown_route_is_network_error() {
        let mock = MockFetcher::new();
        let req = SiteRequest::get("https://example.com/missing").unwrap();
        assert!(mock.fetch(&req).await.is_err());
    }
}
