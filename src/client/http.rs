//! Live network fetcher backed by reqwest

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use reqwest::Client as HttpClient;

use super::{Fetch, SiteRequest, SiteResponse};
use crate::error::FetchError;

/// Keep bulk operations like `offsite warm` polite to the origin
const RATE_LIMIT_PER_SECOND: u32 = 8;

/// Fetcher that hits the live network
pub struct HttpFetcher {
    http: HttpClient,
    rate_limiter: Arc<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>,
}

impl HttpFetcher {
    pub fn new() -> Result<Self, FetchError> {
        let http = HttpClient::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(concat!("offsite/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| FetchError::Network(e.to_string()))?;

        let quota = Quota::per_second(std::num::NonZeroU32::new(RATE_LIMIT_PER_SECOND).unwrap());
        let rate_limiter = Arc::new(RateLimiter::direct(quota));

        Ok(Self { http, rate_limiter })
    }
}

#[async_trait]
impl Fetch for HttpFetcher {
    async fn fetch(&self, request: &SiteRequest) -> Result<SiteResponse, FetchError> {
        self.rate_limiter.until_ready().await;

        let response = self
            .http
            .request(request.method.clone(), request.url.clone())
            .send()
            .await
            .map_err(FetchError::from)?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(k, v)| {
                v.to_str()
                    .ok()
                    .map(|v| (k.as_str().to_string(), v.to_string()))
            })
            .collect();
        let body = response
            .bytes()
            .await
            .map_err(|e| FetchError::InvalidResponse(e.to_string()))?
            .to_vec();

        Ok(SiteResponse {
            status,
            headers,
            body,
        })
    }
}
