//! Patient-record backend client: document persistence and patient search.
//!
//! Both endpoints share one error policy: a non-2xx response carries a JSON
//! body of the form `{"error": "..."}`; we surface that message verbatim, or
//! a generic fallback when the body is missing or malformed. Transport errors
//! (connection refused, timeout) are wrapped into the same user-facing shape.
//! No call is retried — a failure is reported once, visibly.

use crate::config::PortalConfig;
use crate::error::DocintelError;
use crate::patient::Patient;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info};

/// Error body served by the backend on non-2xx responses.
#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: String,
}

/// Client for the patient-record backend.
///
/// Constructed once from a [`PortalConfig`] and injected into whichever
/// component needs it; it holds no mutable state and is cheap to clone.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    /// Build a client with the configured base URL and request timeout.
    pub fn new(config: &PortalConfig) -> Result<Self, DocintelError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.api_timeout_secs))
            .build()
            .map_err(|e| DocintelError::Internal(format!("HTTP client: {e}")))?;

        Ok(Self {
            http,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Base URL this client talks to, without a trailing slash.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Search patients by free-text query (name or cédula).
    ///
    /// Returns the backend's ordered result list. An empty list is a valid
    /// outcome and is *not* an error — the caller distinguishes "no match"
    /// from "search failed". Query encoding is handled by the query-string
    /// builder; callers pass the raw trimmed term.
    pub async fn search_patients(&self, query: &str) -> Result<Vec<Patient>, DocintelError> {
        let url = format!("{}/api/patients/search", self.base_url);
        debug!("Searching patients: q={query:?}");

        let response = self
            .http
            .get(&url)
            .query(&[("q", query)])
            .send()
            .await
            .map_err(|e| DocintelError::Api {
                message: transport_message(&e),
            })?;

        if !response.status().is_success() {
            return Err(DocintelError::Api {
                message: error_message(response, "Failed to fetch patient data.").await,
            });
        }

        let patients: Vec<Patient> = response.json().await.map_err(|e| DocintelError::Api {
            message: format!("Malformed search response: {e}"),
        })?;

        info!("Search for {query:?} returned {} record(s)", patients.len());
        Ok(patients)
    }

    /// Persist an extracted document to the backend store.
    ///
    /// POSTs `{content, sourceFile}` to `/api/documents`. On success the
    /// server's acknowledgement body is returned; callers typically only care
    /// that the call succeeded.
    pub async fn save_document(
        &self,
        content: &str,
        source_file: &str,
    ) -> Result<serde_json::Value, DocintelError> {
        let url = format!("{}/api/documents", self.base_url);
        debug!(
            "Saving document: sourceFile={source_file:?}, {} chars",
            content.len()
        );

        let body = serde_json::json!({
            "content": content,
            "sourceFile": source_file,
        });

        let response = self
            .http
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| DocintelError::Api {
                message: transport_message(&e),
            })?;

        if !response.status().is_success() {
            return Err(DocintelError::Api {
                message: error_message(response, "Failed to save document.").await,
            });
        }

        let ack: serde_json::Value = response.json().await.unwrap_or(serde_json::Value::Null);
        info!("Document saved: sourceFile={source_file:?}");
        Ok(ack)
    }
}

/// Extract the server's `{error}` message, falling back to a generic one.
async fn error_message(response: reqwest::Response, fallback: &str) -> String {
    let status = response.status();
    match response.json::<ApiErrorBody>().await {
        Ok(body) if !body.error.is_empty() => body.error,
        _ => format!("{fallback} (HTTP {status})"),
    }
}

/// Human-readable message for a transport-level failure.
fn transport_message(e: &reqwest::Error) -> String {
    if e.is_timeout() {
        "The server did not respond in time.".to_string()
    } else if e.is_connect() {
        "Could not reach the server. Is the backend running?".to_string()
    } else {
        format!("Request failed: {e}")
    }
}
