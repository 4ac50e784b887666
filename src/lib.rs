//! # docintel
//!
//! Patient document capture, AI text extraction, and record search for the
//! ASODISVALLE document-management portal.
//!
//! ## What this crate does
//!
//! Scanned documents arrive as photos — cédulas, clinical histories, referral
//! letters — and their text needs to end up in the patient-record store.
//! Instead of local OCR, each image is sent to a vision model that reads it
//! as a human would, and the verbatim text is persisted to the backend. The
//! same crate carries the search client used to look patient records up by
//! name or cédula.
//!
//! ## Pipeline Overview
//!
//! ```text
//! image (file / URL / camera)
//!  │
//!  ├─ 1. Acquire  sniff content type, reject non-images before any I/O
//!  ├─ 2. Encode   bytes → base64 inlineData payload
//!  ├─ 3. Extract  one Gemini generateContent call, verbatim-text prompt
//!  ├─ 4. Clean    deterministic cleanup of model quirks
//!  └─ 5. Save     POST {content, sourceFile} to the record store
//! ```
//!
//! Every capture is tracked by a status machine
//! (`idle → extracting → … → saved`) with pure transitions — see
//! [`capture::session`] — and at most one capture is in flight per session.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use docintel::{run_capture, ApiClient, CaptureSession, ExtractionClient, PortalConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Credential auto-resolved from GEMINI_API_KEY / API_KEY.
//!     let config = PortalConfig::from_env();
//!     let extraction = ExtractionClient::new(&config)?;
//!     let api = ApiClient::new(&config)?;
//!
//!     let image = docintel::capture::input::acquire("scan.png", 120).await?;
//!     let mut session = CaptureSession::new();
//!     let outcome = run_capture(&mut session, image, &extraction, &api, &config).await?;
//!     println!("{}: {}", outcome.source_file, outcome.status.as_str());
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `docintel` binary (clap + anyhow + indicatif + tracing-subscriber) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! docintel = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod api;
pub mod capture;
pub mod config;
pub mod error;
pub mod patient;
pub mod postprocess;
pub mod progress;
pub mod prompts;
pub mod search;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use api::ApiClient;
pub use capture::{
    run_capture, run_capture_batch, AcquiredImage, BatchItem, BatchReport, BatchStats, Camera,
    CaptureOutcome, CaptureSession, CaptureStats, CaptureStatus, ExtractionClient, FrameSource,
};
pub use config::{PortalConfig, PortalConfigBuilder};
pub use error::{CaptureError, DocintelError};
pub use patient::Patient;
pub use progress::{CaptureProgress, NoopCaptureProgress};
pub use search::{ProfileTab, ProfileView, SearchSession, SearchStatus};
