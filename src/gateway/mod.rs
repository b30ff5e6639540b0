//! Offline cache gateway
//!
//! Dispatches every request to one of three caching strategies over a
//! [`Fetch`]er and the partitioned [`CacheStore`]. Cache writes never sit on
//! the response path: they run as detached tasks, and a storage failure only
//! logs a warning.

use std::sync::{Arc, Mutex};

use futures::StreamExt;
use reqwest::Url;
use tokio::task::JoinHandle;

use crate::cache::{
    CacheStore, OFFLINE_PATH, PRECACHE_MANIFEST, dynamic_partition, shell_partition,
    static_partition,
};
use crate::client::{Fetch, SiteRequest, SiteResponse};
use crate::error::FetchError;

pub mod classify;

pub use classify::{RequestClass, classify};

/// Parallelism for install-time precaching
const PRECACHE_CONCURRENCY: usize = 4;

/// Where a served response came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    Network,
    Cache(String),
    OfflineFallback,
}

impl std::fmt::Display for Source {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Source::Network => f.write_str("network"),
            Source::Cache(partition) => write!(f, "cache ({partition})"),
            Source::OfflineFallback => f.write_str("offline fallback"),
        }
    }
}

/// A response plus how the gateway produced it
#[derive(Debug)]
pub struct Served {
    pub response: SiteResponse,
    pub source: Source,
    pub class: RequestClass,
}

/// Outcome of install-time precaching; failures are per-URL, never fatal
#[derive(Debug, Default)]
pub struct InstallReport {
    pub cached: Vec<String>,
    pub failed: Vec<(String, String)>,
}

/// Strategy-dispatching cache gateway
pub struct CacheGateway<F: Fetch> {
    fetcher: Arc<F>,
    store: Arc<Mutex<CacheStore>>,
    origin: Url,
    /// Detached write tasks not yet joined; drained by [`flush`](Self::flush)
    pending: Mutex<Vec<JoinHandle<()>>>,
}

impl<F: Fetch + 'static> CacheGateway<F> {
    pub fn new(fetcher: F, store: CacheStore, site_url: &str) -> Result<Self, FetchError> {
        let origin = Url::parse(site_url).map_err(|e| FetchError::InvalidUrl(e.to_string()))?;
        Ok(Self {
            fetcher: Arc::new(fetcher),
            store: Arc::new(Mutex::new(store)),
            origin,
            pending: Mutex::new(Vec::new()),
        })
    }

    /// The site origin this gateway serves
    pub fn origin(&self) -> &Url {
        &self.origin
    }

    /// Precache the app-shell manifest into the shell partition.
    ///
    /// Per-URL best effort: one unreachable path must not abort the install.
    pub async fn install(&self) -> InstallReport {
        let results: Vec<(String, Result<(), String>)> =
            futures::stream::iter(PRECACHE_MANIFEST.iter())
                .map(|path| async move {
                    let url = match self.origin.join(path) {
                        Ok(url) => url.to_string(),
                        Err(e) => return ((*path).to_string(), Err(e.to_string())),
                    };
                    (url.clone(), self.precache_one(&url).await)
                })
                .buffer_unordered(PRECACHE_CONCURRENCY)
                .collect()
                .await;

        let mut report = InstallReport::default();
        for (url, result) in results {
            match result {
                Ok(()) => report.cached.push(url),
                Err(err) => {
                    log::warn!("Precache failed for {}: {}", url, err);
                    report.failed.push((url, err));
                }
            }
        }
        report
    }

    async fn precache_one(&self, url: &str) -> Result<(), String> {
        let request = SiteRequest::get(url).map_err(|e| e.to_string())?;
        let response = self.fetcher.fetch(&request).await.map_err(|e| e.to_string())?;
        if !response.is_ok() {
            return Err(format!("status {}", response.status));
        }
        self.store_now(&shell_partition(), url, &response);
        Ok(())
    }

    /// Classify and dispatch a single request
    pub async fn fetch(&self, request: &SiteRequest) -> Result<Served, FetchError> {
        let class = classify(request, &self.origin);
        log::debug!("{} -> {}", request.url, class);

        match class {
            RequestClass::Bypass => {
                let response = self.fetcher.fetch(request).await?;
                Ok(Served {
                    response,
                    source: Source::Network,
                    class,
                })
            }
            RequestClass::CacheFirst => self.cache_first(request).await,
            RequestClass::NetworkFirst => self.network_first(request).await,
            RequestClass::StaleWhileRevalidate => self.stale_while_revalidate(request).await,
        }
    }

    /// Cached copy if present; the network is only consulted on a miss
    async fn cache_first(&self, request: &SiteRequest) -> Result<Served, FetchError> {
        let url = request.url.to_string();

        if let Some(cached) = self.lookup(&url) {
            log::debug!("Cache hit: {}", url);
            return Ok(Served {
                response: cached.response,
                source: Source::Cache(cached.partition),
                class: RequestClass::CacheFirst,
            });
        }

        let response = self.fetcher.fetch(request).await?;
        if response.is_ok() {
            self.store_detached(static_partition(), url, response.clone());
        }
        Ok(Served {
            response,
            source: Source::Network,
            class: RequestClass::CacheFirst,
        })
    }

    /// Live response wins; cache, then the offline page, on network failure
    async fn network_first(&self, request: &SiteRequest) -> Result<Served, FetchError> {
        let url = request.url.to_string();

        match self.fetcher.fetch(request).await {
            Ok(response) => {
                if response.is_ok() {
                    self.store_detached(dynamic_partition(), url, response.clone());
                }
                Ok(Served {
                    response,
                    source: Source::Network,
                    class: RequestClass::NetworkFirst,
                })
            }
            Err(err) => {
                log::debug!("Network failed for {}: {}, trying cache", url, err);

                if let Some(cached) = self.lookup(&url) {
                    return Ok(Served {
                        response: cached.response,
                        source: Source::Cache(cached.partition),
                        class: RequestClass::NetworkFirst,
                    });
                }

                let offline_url = self
                    .origin
                    .join(OFFLINE_PATH)
                    .map_err(|e| FetchError::InvalidUrl(e.to_string()))?;
                if let Some(cached) = self.lookup(offline_url.as_str()) {
                    return Ok(Served {
                        response: cached.response,
                        source: Source::OfflineFallback,
                        class: RequestClass::NetworkFirst,
                    });
                }

                Err(FetchError::Offline(url))
            }
        }
    }

    /// Cached copy immediately; the refresh happens off the response path
    async fn stale_while_revalidate(&self, request: &SiteRequest) -> Result<Served, FetchError> {
        let url = request.url.to_string();

        if let Some(cached) = self.lookup(&url) {
            log::debug!("Cache hit (revalidating): {}", url);
            self.revalidate_detached(request.clone());
            return Ok(Served {
                response: cached.response,
                source: Source::Cache(cached.partition),
                class: RequestClass::StaleWhileRevalidate,
            });
        }

        // Nothing cached: the in-flight fetch's result is the answer
        let response = self.fetcher.fetch(request).await?;
        if response.is_ok() {
            self.store_detached(dynamic_partition(), url, response.clone());
        }
        Ok(Served {
            response,
            source: Source::Network,
            class: RequestClass::StaleWhileRevalidate,
        })
    }

    fn lookup(&self, url: &str) -> Option<crate::cache::CachedResponse> {
        // Best effort: a broken store must never fail the response path
        let guard = self.store.lock().ok()?;
        match guard.get_any(url) {
            Ok(found) => found,
            Err(e) => {
                log::warn!("Cache read failed for {}: {}", url, e);
                None
            }
        }
    }

    /// Synchronous write, used at install time where waiting is fine
    fn store_now(&self, partition: &str, url: &str, response: &SiteResponse) {
        if let Ok(guard) = self.store.lock()
            && let Err(e) = guard.put(partition, url, response)
        {
            log::warn!("Cache write failed for {}: {}", url, e);
        }
    }

    /// Wait for every outstanding detached write and revalidation.
    ///
    /// The response path never blocks on cache writes, but a short-lived
    /// process must join them before exiting or the runtime drops them
    /// mid-flight and entries silently go missing.
    pub async fn flush(&self) {
        loop {
            let handles: Vec<JoinHandle<()>> = match self.pending.lock() {
                Ok(mut guard) => guard.drain(..).collect(),
                Err(_) => return,
            };
            if handles.is_empty() {
                return;
            }
            for handle in handles {
                if let Err(e) = handle.await {
                    log::warn!("Detached cache task aborted: {}", e);
                }
            }
        }
    }

    fn track(&self, handle: JoinHandle<()>) {
        if let Ok(mut guard) = self.pending.lock() {
            guard.push(handle);
        }
    }

    /// Fire-and-forget write; the response has usually already been returned
    /// by the time this completes
    fn store_detached(&self, partition: String, url: String, response: SiteResponse) {
        let store = Arc::clone(&self.store);
        self.track(tokio::spawn(async move {
            if let Ok(guard) = store.lock()
                && let Err(e) = guard.put(&partition, &url, &response)
            {
                log::warn!("Cache write failed for {}: {}", url, e);
            }
        }));
    }

    /// Background refresh for stale-while-revalidate
    fn revalidate_detached(&self, request: SiteRequest) {
        let fetcher = Arc::clone(&self.fetcher);
        let store = Arc::clone(&self.store);
        let handle = tokio::spawn(async move {
            let url = request.url.to_string();
            match fetcher.fetch(&request).await {
                Ok(response) if response.is_ok() => {
                    if let Ok(guard) = store.lock()
                        && let Err(e) = guard.put(&dynamic_partition(), &url, &response)
                    {
                        log::warn!("Cache write failed for {}: {}", url, e);
                    }
                }
                Ok(response) => {
                    log::debug!("Revalidation of {} returned status {}", url, response.status);
                }
                Err(e) => {
                    log::debug!("Revalidation of {} failed: {}", url, e);
                }
            }
        });
        self.track(handle);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{Destination, MockFetcher};
    use reqwest::Method;
    use std::time::Duration;
    use tempfile::TempDir;

    const ORIGIN: &str = "https://www.meridianstudio.dev";

    fn gateway(mock: MockFetcher) -> (CacheGateway<MockFetcher>, TempDir) {
        let dir = TempDir::new().unwrap();
        let store = CacheStore::open_at(dir.path()).unwrap();
        let gw = CacheGateway::new(mock, store, ORIGIN).unwrap();
        (gw, dir)
    }

    /// Poll until `check` passes; detached writes land shortly after dispatch
    async fn eventually(check: impl Fn() -> bool) {
        for _ in 0..200 {
            if check() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("condition not reached within 1s");
    }

    #[tokio::test]
    async fn test_cache_first_hit_never_refetches() {
        let url = format!("{ORIGIN}/css/site.css");
        let mock = MockFetcher::new().with_route(&url, SiteResponse::ok("css"));
        let (gw, _dir) = gateway(mock);
        let req = SiteRequest::get(&url).unwrap();

        let first = gw.fetch(&req).await.unwrap();
        assert_eq!(first.source, Source::Network);

        // Wait for the detached write, then hit again
        {
            let store = Arc::clone(&gw.store);
            let u = url.clone();
            eventually(move || store.lock().unwrap().get_any(&u).unwrap().is_some()).await;
        }

        let second = gw.fetch(&req).await.unwrap();
        assert_eq!(second.source, Source::Cache(static_partition()));
        assert_eq!(second.response.body, b"css");
        assert_eq!(gw.fetcher.fetch_count(&url), 1);
    }

    #[tokio::test]
    async fn test_non_get_bypasses_cache_entirely() {
        let url = format!("{ORIGIN}/css/site.css");
        let mock = MockFetcher::new().with_route(&url, SiteResponse::ok("css"));
        let (gw, _dir) = gateway(mock);

        let mut req = SiteRequest::get(&url).unwrap();
        req.method = Method::POST;

        let served = gw.fetch(&req).await.unwrap();
        assert_eq!(served.class, RequestClass::Bypass);

        gw.fetch(&req).await.unwrap();
        assert_eq!(gw.fetcher.fetch_count(&url), 2);
        // Bypassed responses are never written to any partition
        assert!(gw.store.lock().unwrap().get_any(&url).unwrap().is_none());
    }

    #[tokio::test]
    async fn test_network_first_stores_documents() {
        let url = format!("{ORIGIN}/pricing");
        let mock = MockFetcher::new().with_route(&url, SiteResponse::ok("<html>pricing</html>"));
        let (gw, _dir) = gateway(mock);
        let req = SiteRequest::get(&url).unwrap();

        let served = gw.fetch(&req).await.unwrap();
        assert_eq!(served.class, RequestClass::NetworkFirst);
        assert_eq!(served.source, Source::Network);

        let store = Arc::clone(&gw.store);
        let u = url.clone();
        eventually(move || {
            store
                .lock()
                .unwrap()
                .get(&dynamic_partition(), &u)
                .unwrap()
                .is_some()
        })
        .await;
    }

    #[tokio::test]
    async fn test_flush_joins_detached_writes() {
        let url = format!("{ORIGIN}/pricing");
        let mock = MockFetcher::new().with_route(&url, SiteResponse::ok("<html>pricing</html>"));
        let (gw, _dir) = gateway(mock);
        let req = SiteRequest::get(&url).unwrap();

        gw.fetch(&req).await.unwrap();
        gw.flush().await;

        // No polling: after flush the write is durably in the store
        assert!(
            gw.store
                .lock()
                .unwrap()
                .get(&dynamic_partition(), &url)
                .unwrap()
                .is_some()
        );
    }

    #[tokio::test]
    async fn test_flush_joins_pending_revalidation() {
        let url = format!("{ORIGIN}/manifest.json");
        let mock = MockFetcher::new().with_route(&url, SiteResponse::ok("v1"));
        let (gw, _dir) = gateway(mock);
        let req = SiteRequest::get(&url).unwrap();

        gw.fetch(&req).await.unwrap();
        gw.flush().await;

        gw.fetcher.set_route(&url, SiteResponse::ok("v2"));
        let stale = gw.fetch(&req).await.unwrap();
        assert_eq!(stale.response.body, b"v1");
        gw.flush().await;

        let refreshed = gw.store.lock().unwrap().get_any(&url).unwrap().unwrap();
        assert_eq!(refreshed.response.body, b"v2");
        assert_eq!(gw.fetcher.fetch_count(&url), 2);
    }

    #[tokio::test]
    async fn test_network_first_falls_back_to_cache_when_offline() {
        let url = format!("{ORIGIN}/pricing");
        let mock = MockFetcher::new().with_route(&url, SiteResponse::ok("<html>pricing</html>"));
        let (gw, _dir) = gateway(mock);
        let req = SiteRequest::get(&url).unwrap();

        gw.fetch(&req).await.unwrap();
        {
            let store = Arc::clone(&gw.store);
            let u = url.clone();
            eventually(move || store.lock().unwrap().get_any(&u).unwrap().is_some()).await;
        }

        gw.fetcher.set_offline(true);
        let served = gw.fetch(&req).await.unwrap();
        assert_eq!(served.source, Source::Cache(dynamic_partition()));
        assert_eq!(served.response.body, b"<html>pricing</html>");
    }

    #[tokio::test]
    async fn test_network_first_falls_back_to_offline_page() {
        let offline_url = format!("{ORIGIN}{OFFLINE_PATH}");
        let mock = MockFetcher::new();
        let (gw, _dir) = gateway(mock);

        // Precache the offline page, as install would
        gw.store
            .lock()
            .unwrap()
            .put(&shell_partition(), &offline_url, &SiteResponse::ok("you are offline"))
            .unwrap();

        gw.fetcher.set_offline(true);
        let req = SiteRequest::get(&format!("{ORIGIN}/never-visited")).unwrap();
        let served = gw.fetch(&req).await.unwrap();

        assert_eq!(served.source, Source::OfflineFallback);
        assert_eq!(served.response.body, b"you are offline");
    }

    #[tokio::test]
    async fn test_network_first_cold_cache_propagates_error() {
        let mock = MockFetcher::new();
        let (gw, _dir) = gateway(mock);
        gw.fetcher.set_offline(true);

        let req = SiteRequest::get(&format!("{ORIGIN}/never-visited")).unwrap();
        let result = gw.fetch(&req).await;
        assert!(matches!(result, Err(FetchError::Offline(_))));
    }

    #[tokio::test]
    async fn test_swr_serves_stale_and_revalidates() {
        let url = format!("{ORIGIN}/manifest.json");
        let mock = MockFetcher::new().with_route(&url, SiteResponse::ok("v1"));
        let (gw, _dir) = gateway(mock);
        let req = SiteRequest::get(&url).unwrap();
        assert_eq!(req.destination, Destination::Other);

        // Cold: network result is returned and stored
        let first = gw.fetch(&req).await.unwrap();
        assert_eq!(first.source, Source::Network);
        {
            let store = Arc::clone(&gw.store);
            let u = url.clone();
            eventually(move || store.lock().unwrap().get_any(&u).unwrap().is_some()).await;
        }

        // Warm: stale copy comes back even though the origin now has v2
        gw.fetcher.set_route(&url, SiteResponse::ok("v2"));
        let second = gw.fetch(&req).await.unwrap();
        assert_eq!(second.source, Source::Cache(dynamic_partition()));
        assert_eq!(second.response.body, b"v1");

        // The detached revalidation lands for next time
        let store = Arc::clone(&gw.store);
        let u = url.clone();
        eventually(move || {
            store
                .lock()
                .unwrap()
                .get_any(&u)
                .unwrap()
                .map(|c| c.response.body == b"v2")
                .unwrap_or(false)
        })
        .await;
        assert_eq!(gw.fetcher.fetch_count(&url), 2);
    }

    #[tokio::test]
    async fn test_swr_network_failure_with_stale_copy_still_serves() {
        let url = format!("{ORIGIN}/manifest.json");
        let mock = MockFetcher::new().with_route(&url, SiteResponse::ok("v1"));
        let (gw, _dir) = gateway(mock);
        let req = SiteRequest::get(&url).unwrap();

        gw.fetch(&req).await.unwrap();
        {
            let store = Arc::clone(&gw.store);
            let u = url.clone();
            eventually(move || store.lock().unwrap().get_any(&u).unwrap().is_some()).await;
        }

        gw.fetcher.set_offline(true);
        let served = gw.fetch(&req).await.unwrap();
        assert_eq!(served.response.body, b"v1");
    }

    #[tokio::test]
    async fn test_vendor_requests_never_cached() {
        let url = "https://www.google-analytics.com/collect";
        let mock = MockFetcher::new().with_route(url, SiteResponse::ok("ok"));
        let (gw, _dir) = gateway(mock);
        let req = SiteRequest::get(url).unwrap();

        let served = gw.fetch(&req).await.unwrap();
        assert_eq!(served.class, RequestClass::Bypass);

        gw.fetch(&req).await.unwrap();
        assert_eq!(gw.fetcher.fetch_count(url), 2);
        assert!(gw.store.lock().unwrap().get_any(url).unwrap().is_none());
    }

    #[tokio::test]
    async fn test_non_200_responses_returned_but_not_stored() {
        let url = format!("{ORIGIN}/gone");
        let mock = MockFetcher::new().with_route(&url, SiteResponse::with_status(404, "not found"));
        let (gw, _dir) = gateway(mock);

        let req = SiteRequest::get(&url).unwrap();
        let served = gw.fetch(&req).await.unwrap();
        assert_eq!(served.response.status, 404);

        gw.flush().await;
        assert!(gw.store.lock().unwrap().get_any(&url).unwrap().is_none());
    }

    #[tokio::test]
    async fn test_install_precaches_shell_best_effort() {
        let mock = MockFetcher::new();
        // Only register some of the manifest; the rest will fail
        for path in ["/", "/about", OFFLINE_PATH] {
            mock.set_route(&format!("{ORIGIN}{path}"), SiteResponse::ok("shell"));
        }
        let (gw, _dir) = gateway(mock);

        let report = gw.install().await;
        assert_eq!(report.cached.len(), 3);
        assert_eq!(report.cached.len() + report.failed.len(), PRECACHE_MANIFEST.len());

        let store = gw.store.lock().unwrap();
        assert!(store
            .get(&shell_partition(), &format!("{ORIGIN}{OFFLINE_PATH}"))
            .unwrap()
            .is_some());
    }
}
