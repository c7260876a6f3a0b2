//! Query execution against the search backend.
//!
//! [`QueryService`] is the seam between the grid model and the network.
//! [`HttpQueryService`] is the production implementation: one
//! `POST <endpoint>/_search` per call, no retries, no shared state.
//!
//! # Failure mapping
//!
//! | Outcome | Error |
//! |---------|-------|
//! | connect / DNS / timeout / body read failure | [`GridError::TransportFailure`] |
//! | non-2xx status | [`GridError::BackendError`] with the backend's reason |
//! | 2xx with non-JSON body | [`GridError::BackendError`] |

use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;

use crate::config::BackendConfig;
use crate::error::GridError;
use crate::query::QuerySpec;
use crate::result_set::ResultSet;

/// Executes a [`QuerySpec`] and returns the parsed response.
///
/// Implementations must issue at most one backend call per invocation and
/// must not retry on their own; retry policy belongs to the caller.
#[async_trait]
pub trait QueryService: Send + Sync {
    async fn execute(&self, query: &QuerySpec) -> Result<ResultSet, GridError>;
}

/// [`QueryService`] backed by an HTTP search endpoint.
pub struct HttpQueryService {
    client: reqwest::Client,
    search_url: String,
}

impl HttpQueryService {
    /// Build a service for `config.endpoint`.
    ///
    /// The transport timeout comes from `config.timeout_secs`; the grid
    /// itself never times a request out.
    pub fn new(config: &BackendConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            search_url: search_url(&config.endpoint),
        })
    }

    pub fn search_url(&self) -> &str {
        &self.search_url
    }
}

#[async_trait]
impl QueryService for HttpQueryService {
    async fn execute(&self, query: &QuerySpec) -> Result<ResultSet, GridError> {
        let body = query.serialize();
        tracing::debug!(url = %self.search_url, %body, "sending search request");

        let response = self
            .client
            .post(&self.search_url)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| GridError::TransportFailure(describe_transport_error(&e)))?;

        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| GridError::TransportFailure(describe_transport_error(&e)))?;

        if !status.is_success() {
            let message = backend_reason(&bytes).unwrap_or_else(|| {
                let text = String::from_utf8_lossy(&bytes).trim().to_string();
                if text.is_empty() {
                    status.to_string()
                } else {
                    format!("{}: {}", status, text)
                }
            });
            tracing::warn!(status = status.as_u16(), %message, "backend rejected query");
            return Err(GridError::BackendError {
                status: Some(status.as_u16()),
                message,
            });
        }

        ResultSet::from_bytes(&bytes)
    }
}

fn search_url(endpoint: &str) -> String {
    format!("{}/_search", endpoint.trim_end_matches('/'))
}

fn describe_transport_error(e: &reqwest::Error) -> String {
    if e.is_timeout() {
        format!("request timed out: {}", e)
    } else if e.is_connect() {
        format!("connection failed: {}", e)
    } else {
        e.to_string()
    }
}

/// Pull a human-readable reason out of an error response body.
///
/// Understands `{"error": {"reason": ...}}`, `{"error": {"root_cause": [{"reason": ...}]}}`
/// and `{"error": "..."}`.
fn backend_reason(body: &[u8]) -> Option<String> {
    let json: Value = serde_json::from_slice(body).ok()?;
    let error = json.get("error")?;
    if let Some(s) = error.as_str() {
        return Some(s.to_string());
    }
    let reason = error
        .get("reason")
        .and_then(Value::as_str)
        .or_else(|| {
            error
                .get("root_cause")
                .and_then(Value::as_array)
                .and_then(|causes| causes.first())
                .and_then(|c| c.get("reason"))
                .and_then(Value::as_str)
        })?;
    match error.get("type").and_then(Value::as_str) {
        Some(kind) => Some(format!("{}: {}", kind, reason)),
        None => Some(reason.to_string()),
    }
}
