//! Vision-model interaction: build the multimodal request and call Gemini.
//!
//! This module converts an encoded image into a single `generateContent` call
//! and returns the raw extracted string. It is intentionally thin — the
//! instruction text lives in [`crate::prompts`] so it can be changed without
//! touching transport or error handling here.
//!
//! ## Error policy
//!
//! The call is atomic success/failure: no retries, no partial results. Any
//! transport or service failure is wrapped into one human-readable message;
//! a rejected credential is special-cased into its own message because the
//! fix (check the environment variable) is different from every other failure.

use crate::capture::encode::ImagePayload;
use crate::config::PortalConfig;
use crate::error::DocintelError;
use crate::prompts::EXTRACTION_PROMPT;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Base endpoint of the Gemini REST API.
const GENERATE_CONTENT_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";

// ── Request body ─────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub(crate) struct GenerateContentRequest {
    contents: Vec<Content>,
}

#[derive(Debug, Serialize)]
struct Content {
    role: &'static str,
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum Part {
    Inline {
        #[serde(rename = "inlineData")]
        inline_data: InlineData,
    },
    Text {
        text: String,
    },
}

#[derive(Debug, Serialize)]
struct InlineData {
    #[serde(rename = "mimeType")]
    mime_type: String,
    data: String,
}

impl GenerateContentRequest {
    /// One user turn: the image first, then the fixed instruction.
    pub(crate) fn for_image(payload: &ImagePayload) -> Self {
        Self {
            contents: vec![Content {
                role: "user",
                parts: vec![
                    Part::Inline {
                        inline_data: InlineData {
                            mime_type: payload.mime_type.clone(),
                            data: payload.data.clone(),
                        },
                    },
                    Part::Text {
                        text: EXTRACTION_PROMPT.to_string(),
                    },
                ],
            }],
        }
    }
}

// ── Response body ────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ServiceErrorBody {
    error: Option<ServiceErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct ServiceErrorDetail {
    #[serde(default)]
    message: String,
}

// ── Client ───────────────────────────────────────────────────────────────

/// Client for the text-extraction service.
///
/// Construction resolves the credential eagerly: a missing key fails here,
/// immediately, rather than on the first call deep inside a capture.
#[derive(Debug, Clone)]
pub struct ExtractionClient {
    http: reqwest::Client,
    api_key: String,
    model: String,
}

impl ExtractionClient {
    /// Build a client from the config, resolving the API key up front.
    ///
    /// # Errors
    /// [`DocintelError::MissingApiKey`] when no credential is configured.
    pub fn new(config: &PortalConfig) -> Result<Self, DocintelError> {
        let api_key = config.resolve_api_key()?;
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.api_timeout_secs))
            .build()
            .map_err(|e| DocintelError::Internal(format!("HTTP client: {e}")))?;

        Ok(Self {
            http,
            api_key,
            model: config.model.clone(),
        })
    }

    /// Model identifier this client sends requests to.
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Extract all text from the image, verbatim.
    ///
    /// Returns the raw string the model produced — possibly empty; the capture
    /// session classifies an empty result as an extraction failure.
    pub async fn extract_text(&self, payload: &ImagePayload) -> Result<String, DocintelError> {
        let url = format!("{GENERATE_CONTENT_BASE}/{}:generateContent", self.model);
        let body = GenerateContentRequest::for_image(payload);
        let start = Instant::now();

        let response = self
            .http
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| DocintelError::Extraction {
                message: if e.is_timeout() {
                    "the AI service did not respond in time".to_string()
                } else {
                    e.to_string()
                },
            })?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let message = service_error_message(&text)
                .unwrap_or_else(|| format!("HTTP {status} from AI service"));
            warn!("Extraction call failed: {status}: {message}");

            if is_invalid_key(status, &message) {
                return Err(DocintelError::InvalidApiKey);
            }
            return Err(DocintelError::Extraction { message });
        }

        let parsed: GenerateContentResponse =
            response.json().await.map_err(|e| DocintelError::Extraction {
                message: format!("malformed AI response: {e}"),
            })?;

        let text = collect_text(&parsed);
        debug!(
            "Extraction returned {} chars in {:?}",
            text.len(),
            start.elapsed()
        );
        Ok(text)
    }
}

/// Concatenate the text parts of the first candidate.
fn collect_text(response: &GenerateContentResponse) -> String {
    response
        .candidates
        .first()
        .and_then(|c| c.content.as_ref())
        .map(|content| {
            content
                .parts
                .iter()
                .filter_map(|p| p.text.as_deref())
                .collect::<Vec<_>>()
                .join("")
        })
        .unwrap_or_default()
}

/// Pull the service's error message out of a non-2xx body, if present.
fn service_error_message(body: &str) -> Option<String> {
    let parsed: ServiceErrorBody = serde_json::from_str(body).ok()?;
    let message = parsed.error?.message;
    if message.is_empty() {
        None
    } else {
        Some(message)
    }
}

/// Classify a failure as a rejected credential.
///
/// Gemini reports bad keys as HTTP 400 with an `API key not valid` message;
/// 401/403 are credential failures by definition.
fn is_invalid_key(status: reqwest::StatusCode, message: &str) -> bool {
    status == reqwest::StatusCode::UNAUTHORIZED
        || status == reqwest::StatusCode::FORBIDDEN
        || message.contains("API key not valid")
        || message.contains("API_KEY_INVALID")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload() -> ImagePayload {
        ImagePayload {
            data: "aGVsbG8=".into(),
            mime_type: "image/png".into(),
        }
    }

    #[test]
    fn request_body_matches_wire_shape() {
        let body = serde_json::to_value(GenerateContentRequest::for_image(&payload())).unwrap();
        let parts = &body["contents"][0]["parts"];
        assert_eq!(body["contents"][0]["role"], "user");
        // Image first, instruction second.
        assert_eq!(parts[0]["inlineData"]["mimeType"], "image/png");
        assert_eq!(parts[0]["inlineData"]["data"], "aGVsbG8=");
        assert_eq!(parts[1]["text"], EXTRACTION_PROMPT);
    }

    #[test]
    fn collects_text_across_parts() {
        let response: GenerateContentResponse = serde_json::from_str(
            r#"{"candidates":[{"content":{"parts":[{"text":"CÉDULA "},{"text":"1122334455"}]}}]}"#,
        )
        .unwrap();
        assert_eq!(collect_text(&response), "CÉDULA 1122334455");
    }

    #[test]
    fn empty_candidates_yield_empty_text() {
        let response: GenerateContentResponse = serde_json::from_str(r#"{}"#).unwrap();
        assert_eq!(collect_text(&response), "");
    }

    #[test]
    fn parses_service_error_body() {
        let body = r#"{"error":{"code":400,"message":"API key not valid. Please pass a valid API key.","status":"INVALID_ARGUMENT"}}"#;
        let msg = service_error_message(body).unwrap();
        assert!(msg.contains("API key not valid"));
        assert!(is_invalid_key(reqwest::StatusCode::BAD_REQUEST, &msg));
    }

    #[test]
    fn ordinary_service_errors_are_not_credential_errors() {
        assert!(!is_invalid_key(
            reqwest::StatusCode::INTERNAL_SERVER_ERROR,
            "backend overload"
        ));
        assert!(is_invalid_key(reqwest::StatusCode::FORBIDDEN, "whatever"));
    }

    #[test]
    fn missing_key_fails_at_construction() {
        // No explicit key; shadow the env vars so resolution cannot succeed.
        let config = PortalConfig::default();
        if std::env::var("GEMINI_API_KEY").is_err() && std::env::var("API_KEY").is_err() {
            let err = ExtractionClient::new(&config).unwrap_err();
            assert!(matches!(err, DocintelError::MissingApiKey));
        }
    }
}
