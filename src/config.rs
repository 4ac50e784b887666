//! Configuration for the document portal client.
//!
//! All behaviour is controlled through [`PortalConfig`], built via its
//! [`PortalConfigBuilder`]. Keeping every knob in one struct makes it trivial
//! to share a config between the capture and search clients, log it, and diff
//! two runs to understand why their outputs differ.
//!
//! The AI credential is deliberately *not* read from the environment at some
//! ambient call site deep in the pipeline. It is resolved once, up front, via
//! [`PortalConfig::resolve_api_key`] — most-specific source wins — and the
//! resulting clients are constructed explicitly and injected wherever they are
//! needed.

use crate::error::DocintelError;
use crate::progress::CaptureProgress;
use std::fmt;
use std::sync::Arc;

/// Default backend base URL, matching the development server.
pub const DEFAULT_API_BASE: &str = "http://localhost:3001";

/// Default vision model used for text extraction.
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

/// Configuration for capture and search operations.
///
/// Built via [`PortalConfig::builder()`] or [`PortalConfig::default()`].
///
/// # Example
/// ```rust
/// use docintel::PortalConfig;
///
/// let config = PortalConfig::builder()
///     .api_base_url("https://records.example.org")
///     .api_key("AIza...")
///     .concurrency(8)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct PortalConfig {
    /// Base URL of the patient-record backend. Default: `http://localhost:3001`.
    ///
    /// Stored without a trailing slash; the builder normalises it so endpoint
    /// paths can always be appended as `{base}/api/...`.
    pub api_base_url: String,

    /// AI service credential. If `None`, [`resolve_api_key`](Self::resolve_api_key)
    /// falls back to the `GEMINI_API_KEY` then `API_KEY` environment variables.
    pub api_key: Option<String>,

    /// Vision model identifier. Default: `gemini-2.5-flash`.
    pub model: String,

    /// Per-request timeout in seconds for extraction and backend calls. Default: 60.
    ///
    /// A timeout is reported as an ordinary call failure — the extraction
    /// contract is atomic success/failure, with no retry.
    pub api_timeout_secs: u64,

    /// Download timeout for URL inputs in seconds. Default: 120.
    pub download_timeout_secs: u64,

    /// Number of files processed concurrently in batch capture. Default: 4.
    ///
    /// Extraction is network-bound; a small amount of parallelism cuts
    /// wall-clock time on a folder of scans without hammering the API.
    /// A single interactive capture always uses exactly one in-flight session.
    pub concurrency: usize,

    /// Persist extracted text to the backend after extraction. Default: true.
    ///
    /// Disable for a dry run that only extracts and displays text.
    pub save: bool,

    /// Apply deterministic cleanup to the model output. Default: true.
    ///
    /// See [`crate::postprocess::clean_extracted_text`].
    pub clean_output: bool,

    /// Optional progress callback for batch capture events.
    pub progress: Option<Arc<dyn CaptureProgress>>,
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE.to_string(),
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            api_timeout_secs: 60,
            download_timeout_secs: 120,
            concurrency: 4,
            save: true,
            clean_output: true,
            progress: None,
        }
    }
}

impl fmt::Debug for PortalConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PortalConfig")
            .field("api_base_url", &self.api_base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("model", &self.model)
            .field("api_timeout_secs", &self.api_timeout_secs)
            .field("download_timeout_secs", &self.download_timeout_secs)
            .field("concurrency", &self.concurrency)
            .field("save", &self.save)
            .field("clean_output", &self.clean_output)
            .field("progress", &self.progress.as_ref().map(|_| "<dyn CaptureProgress>"))
            .finish()
    }
}

impl PortalConfig {
    /// Create a new builder for `PortalConfig`.
    pub fn builder() -> PortalConfigBuilder {
        PortalConfigBuilder {
            config: Self::default(),
        }
    }

    /// Build a config from the environment.
    ///
    /// Reads `DOCINTEL_API_BASE` and `DOCINTEL_MODEL` when set; everything
    /// else keeps its default. The API key is *not* read here — it is resolved
    /// lazily by [`resolve_api_key`](Self::resolve_api_key) so that search-only
    /// usage never demands a credential it does not need.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(base) = std::env::var("DOCINTEL_API_BASE") {
            if !base.is_empty() {
                config.api_base_url = base.trim_end_matches('/').to_string();
            }
        }
        if let Ok(model) = std::env::var("DOCINTEL_MODEL") {
            if !model.is_empty() {
                config.model = model;
            }
        }
        config
    }

    /// Resolve the AI credential, from most-specific to least-specific.
    ///
    /// 1. **Explicit key** (`config.api_key`) — the caller supplied it.
    /// 2. **`GEMINI_API_KEY`** — the service's conventional variable.
    /// 3. **`API_KEY`** — legacy variable accepted for compatibility with
    ///    existing deployments.
    ///
    /// Absence is a fatal configuration error, reported before any network
    /// call is attempted.
    pub fn resolve_api_key(&self) -> Result<String, DocintelError> {
        if let Some(ref key) = self.api_key {
            if !key.is_empty() {
                return Ok(key.clone());
            }
        }
        for var in ["GEMINI_API_KEY", "API_KEY"] {
            if let Ok(key) = std::env::var(var) {
                if !key.is_empty() {
                    return Ok(key);
                }
            }
        }
        Err(DocintelError::MissingApiKey)
    }
}

/// Builder for [`PortalConfig`].
#[derive(Debug)]
pub struct PortalConfigBuilder {
    config: PortalConfig,
}

impl PortalConfigBuilder {
    pub fn api_base_url(mut self, base: impl Into<String>) -> Self {
        self.config.api_base_url = base.into().trim_end_matches('/').to_string();
        self
    }

    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.config.api_key = Some(key.into());
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = secs.max(1);
        self
    }

    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.config.download_timeout_secs = secs.max(1);
        self
    }

    pub fn concurrency(mut self, n: usize) -> Self {
        self.config.concurrency = n.max(1);
        self
    }

    pub fn save(mut self, v: bool) -> Self {
        self.config.save = v;
        self
    }

    pub fn clean_output(mut self, v: bool) -> Self {
        self.config.clean_output = v;
        self
    }

    pub fn progress(mut self, callback: Arc<dyn CaptureProgress>) -> Self {
        self.config.progress = Some(callback);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<PortalConfig, DocintelError> {
        let c = &self.config;
        if c.api_base_url.is_empty() {
            return Err(DocintelError::InvalidConfig(
                "API base URL must not be empty".into(),
            ));
        }
        if !c.api_base_url.starts_with("http://") && !c.api_base_url.starts_with("https://") {
            return Err(DocintelError::InvalidConfig(format!(
                "API base URL must be http(s), got '{}'",
                c.api_base_url
            )));
        }
        if c.model.is_empty() {
            return Err(DocintelError::InvalidConfig(
                "Model identifier must not be empty".into(),
            ));
        }
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_development_backend() {
        let c = PortalConfig::default();
        assert_eq!(c.api_base_url, "http://localhost:3001");
        assert_eq!(c.model, "gemini-2.5-flash");
        assert!(c.save);
        assert!(c.clean_output);
    }

    #[test]
    fn builder_normalises_trailing_slash() {
        let c = PortalConfig::builder()
            .api_base_url("https://records.example.org/")
            .build()
            .unwrap();
        assert_eq!(c.api_base_url, "https://records.example.org");
    }

    #[test]
    fn builder_rejects_non_http_base() {
        let err = PortalConfig::builder()
            .api_base_url("ftp://records.example.org")
            .build()
            .unwrap_err();
        assert!(matches!(err, DocintelError::InvalidConfig(_)));
    }

    #[test]
    fn builder_clamps_concurrency() {
        let c = PortalConfig::builder().concurrency(0).build().unwrap();
        assert_eq!(c.concurrency, 1);
    }

    #[test]
    fn explicit_key_wins_over_environment() {
        let c = PortalConfig::builder().api_key("explicit").build().unwrap();
        assert_eq!(c.resolve_api_key().unwrap(), "explicit");
    }

    #[test]
    fn empty_explicit_key_is_not_a_key() {
        // An empty string must not satisfy the credential precondition.
        let c = PortalConfig::builder().api_key("").build().unwrap();
        // Depending on the test environment GEMINI_API_KEY may be set;
        // only assert that the empty explicit key itself was skipped.
        match c.resolve_api_key() {
            Ok(key) => assert!(!key.is_empty()),
            Err(e) => assert!(matches!(e, DocintelError::MissingApiKey)),
        }
    }

    #[test]
    fn debug_redacts_api_key() {
        let c = PortalConfig::builder().api_key("secret-key").build().unwrap();
        let dbg = format!("{c:?}");
        assert!(!dbg.contains("secret-key"));
        assert!(dbg.contains("<redacted>"));
    }
}
