//! Site resource fetcher
//!
//! The gateway talks to the network exclusively through the [`Fetch`] trait so
//! caching strategies can be tested against a mock without real HTTP.

use async_trait::async_trait;
use reqwest::{Method, Url};
use serde::{Deserialize, Serialize};

use crate::error::FetchError;

pub mod http;
#[cfg(test)]
pub mod mock;

pub use http::HttpFetcher;
#[cfg(test)]
#[allow(unused_imports)]
pub use mock::MockFetcher;

/// Network fetcher abstraction
#[async_trait]
pub trait Fetch: Send + Sync {
    /// Perform the request against the live network
    async fn fetch(&self, request: &SiteRequest) -> Result<SiteResponse, FetchError>;
}

/// What kind of resource a request is for.
///
/// Mirrors the browser's request destination, which drives strategy selection:
/// subresources (styles, scripts, images, fonts) are cache-first, documents
/// are network-first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Destination {
    Document,
    Style,
    Script,
    Image,
    Font,
    Other,
}

impl Destination {
    /// Infer a destination from a URL's path extension.
    ///
    /// The CLI has no renderer to tell it what a fetch is for, so extension
    /// sniffing stands in for the browser's destination hint.
    pub fn infer(url: &Url) -> Self {
        let path = url.path().to_ascii_lowercase();
        match path.rsplit('.').next() {
            Some("css") => Destination::Style,
            Some("js") | Some("mjs") => Destination::Script,
            Some("png") | Some("jpg") | Some("jpeg") | Some("gif") | Some("webp")
            | Some("avif") | Some("svg") | Some("ico") => Destination::Image,
            Some("woff") | Some("woff2") | Some("ttf") | Some("otf") => Destination::Font,
            _ if path.ends_with('/') || !path.rsplit('/').next().unwrap_or("").contains('.') => {
                Destination::Document
            }
            _ => Destination::Other,
        }
    }
}

/// A request the gateway will classify and dispatch
#[derive(Debug, Clone)]
pub struct SiteRequest {
    pub method: Method,
    pub url: Url,
    pub destination: Destination,
}

impl SiteRequest {
    /// GET request with an inferred destination
    pub fn get(url: &str) -> Result<Self, FetchError> {
        let url = Url::parse(url).map_err(|e| FetchError::InvalidUrl(e.to_string()))?;
        let destination = Destination::infer(&url);
        Ok(Self {
            method: Method::GET,
            url,
            destination,
        })
    }

    /// Same URL with an explicit destination
    pub fn with_destination(mut self, destination: Destination) -> Self {
        self.destination = destination;
        self
    }
}

/// An immutable snapshot of a response: status, headers, body
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SiteResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl SiteResponse {
    pub fn ok(body: impl Into<Vec<u8>>) -> Self {
        Self {
            status: 200,
            headers: Vec::new(),
            body: body.into(),
        }
    }

    pub fn with_status(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: body.into(),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == 200
    }

    /// Header lookup, case-insensitive
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}
