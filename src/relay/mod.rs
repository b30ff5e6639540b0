//! Mail-relay client for the quote wizard's Email action
//!
//! The wire contract with the site backend is fixed: POST
//! `{ name, email, summary }`, receive `{ success, error? }`. Any non-2xx
//! status or `success: false` is a failure whose server-provided message is
//! surfaced verbatim.

use std::time::Duration;

use reqwest::Client as HttpClient;
use serde::{Deserialize, Serialize};

use crate::error::RelayError;

/// Request body sent to the relay endpoint
#[derive(Debug, Clone, Serialize)]
pub struct QuoteEmail {
    pub name: String,
    pub email: String,
    pub summary: String,
}

/// Relay response body
#[derive(Debug, Clone, Deserialize)]
struct RelayResponse {
    success: bool,
    #[serde(default)]
    error: Option<String>,
}

const GENERIC_FAILURE: &str = "Something went wrong sending your quote. Please try again.";

/// State of the Email action.
///
/// Success and failure are sticky: the status only changes again when the
/// user explicitly retries. The draft plan is untouched in every state.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum DeliveryStatus {
    #[default]
    Idle,
    Sending,
    Sent,
    Failed(String),
}

impl DeliveryStatus {
    /// The send control is disabled only while a send is in flight
    pub fn can_send(&self) -> bool {
        !matches!(self, DeliveryStatus::Sending)
    }

    pub fn start(&mut self) {
        *self = DeliveryStatus::Sending;
    }

    pub fn finish(&mut self, result: &Result<(), RelayError>) {
        *self = match result {
            Ok(()) => DeliveryStatus::Sent,
            Err(err) => DeliveryStatus::Failed(err.to_string()),
        };
    }
}

/// HTTP client for the relay endpoint
pub struct RelayClient {
    http: HttpClient,
    url: String,
    token: Option<String>,
}

impl RelayClient {
    /// `token` is the opaque value the backend validates; it is forwarded
    /// as-is in the X-Relay-Token header when present.
    pub fn new(url: &str, token: Option<&str>) -> Result<Self, RelayError> {
        let http = HttpClient::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| RelayError::Network(e.to_string()))?;

        Ok(Self {
            http,
            url: url.to_string(),
            token: token.map(str::to_string),
        })
    }

    /// Submit a quote email. Failure leaves the caller's draft untouched;
    /// retrying is just calling this again.
    pub async fn send(&self, email: &QuoteEmail) -> Result<(), RelayError> {
        let mut request = self.http.post(&self.url).json(email);
        if let Some(token) = &self.token {
            request = request.header("X-Relay-Token", token);
        }

        let response = request.send().await.map_err(RelayError::from)?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| RelayError::InvalidResponse(e.to_string()))?;

        // The relay reports failures in the body even on 4xx/5xx, so parse
        // first and fall back to the generic message
        let parsed: Option<RelayResponse> = serde_json::from_str(&body).ok();

        match parsed {
            Some(RelayResponse { success: true, .. }) if status.is_success() => Ok(()),
            Some(RelayResponse { error, .. }) => Err(RelayError::Rejected(
                error.unwrap_or_else(|| GENERIC_FAILURE.to_string()),
            )),
            None if status.is_success() => Err(RelayError::InvalidResponse(
                "relay returned a malformed body".to_string(),
            )),
            None => Err(RelayError::Rejected(GENERIC_FAILURE.to_string())),
        }
    }
}
