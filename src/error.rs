//! Error types for the docintel library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`DocintelError`] — **Fatal**: the operation cannot proceed at all
//!   (missing API key, unreadable input, invalid configuration, an overlapping
//!   capture). Returned as `Err(DocintelError)` from the top-level entry
//!   points.
//!
//! * [`CaptureError`] — **Non-fatal**: a single file in a batch failed
//!   (rejected input, extraction error, save error) but the other files are
//!   fine. Stored inside [`crate::capture::BatchItem`] so callers can inspect
//!   partial success rather than losing the whole batch to one bad scan.
//!
//! The separation lets callers decide their own tolerance: abort on the first
//! file failure, log and continue, or collect all errors for a post-run report.
//!
//! Service failures during a *single* capture are not errors at this level at
//! all — they are state transitions. An extraction or save failure lands in
//! the [`crate::capture::CaptureSession`] as user-visible text, in exactly one
//! of the terminal states of the status machine.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the docintel library.
///
/// Per-file failures in batch mode use [`CaptureError`] and are stored in
/// [`crate::capture::BatchItem`] rather than propagated here.
#[derive(Debug, Error)]
pub enum DocintelError {
    // ── Configuration errors ──────────────────────────────────────────────
    /// No AI service credential is configured.
    ///
    /// Reported before any network call is attempted — a capture without a
    /// credential can never succeed, so it fails immediately.
    #[error(
        "API key not configured.\nSet GEMINI_API_KEY (or API_KEY) in the environment, \
         or pass one explicitly via PortalConfig."
    )]
    MissingApiKey,

    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("Image file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'")]
    PermissionDenied { path: PathBuf },

    /// The file exists and was read, but its content is not a supported image.
    #[error("File is not a valid image: '{path}'\nFirst bytes: {magic:?}")]
    NotAnImage { path: PathBuf, magic: [u8; 4] },

    /// The input string is not a valid file path or URL.
    #[error("Invalid input '{input}': not a file path or a valid HTTP/HTTPS URL")]
    InvalidInput { input: String },

    /// HTTP URL was syntactically valid but download failed.
    #[error("Failed to download '{url}': {reason}\nCheck your internet connection.")]
    DownloadFailed { url: String, reason: String },

    // ── Camera errors ─────────────────────────────────────────────────────
    /// The camera could not be opened (permission denied or no device).
    #[error("Could not access the camera: {detail}\nEnsure a device is connected and permission is granted.")]
    CameraUnavailable { detail: String },

    /// Frame capture failed while the camera was open.
    #[error("Camera frame capture failed: {detail}")]
    FrameCaptureFailed { detail: String },

    // ── Session errors ────────────────────────────────────────────────────
    /// A new image was acquired while a capture was still in flight.
    ///
    /// The status machine allows exactly one capture session at a time;
    /// the in-flight session is left untouched.
    #[error("A capture is already in progress ({status}). Wait for it to finish or reset the session.")]
    CaptureBusy { status: &'static str },

    // ── Service errors ────────────────────────────────────────────────────
    /// The AI service rejected the configured credential.
    #[error("Invalid API key. Please check your GEMINI_API_KEY environment variable.")]
    InvalidApiKey,

    /// The text-extraction call failed (transport or service error).
    #[error("Failed to get response from AI: {message}")]
    Extraction { message: String },

    /// The patient-record API returned an error or was unreachable.
    #[error("{message}")]
    Api { message: String },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write the CSV export file.
    #[error("Failed to write export file '{path}': {source}")]
    ExportFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A non-fatal error for a single file in a batch capture.
///
/// Stored in [`crate::capture::BatchItem`] when a file fails. The overall
/// batch continues regardless of how many files fail.
#[derive(Debug, Clone, Error, serde::Serialize, serde::Deserialize)]
pub enum CaptureError {
    /// The input was rejected before any network call (unreadable, not an image).
    #[error("'{file}': rejected: {reason}")]
    Rejected { file: String, reason: String },

    /// Text extraction failed or returned no text.
    #[error("'{file}': extraction failed: {detail}")]
    Extraction { file: String, detail: String },

    /// Extraction succeeded but the persistence call failed.
    #[error("'{file}': could not save document: {detail}")]
    Save { file: String, detail: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_api_key_names_the_env_var() {
        let msg = DocintelError::MissingApiKey.to_string();
        assert!(msg.contains("GEMINI_API_KEY"), "got: {msg}");
    }

    #[test]
    fn busy_display_includes_state() {
        let e = DocintelError::CaptureBusy {
            status: "extracting",
        };
        assert!(e.to_string().contains("extracting"));
    }

    #[test]
    fn not_an_image_display() {
        let e = DocintelError::NotAnImage {
            path: PathBuf::from("notes.txt"),
            magic: *b"Lore",
        };
        let msg = e.to_string();
        assert!(msg.contains("notes.txt"));
    }

    #[test]
    fn capture_error_save_display() {
        let e = CaptureError::Save {
            file: "scan-01.png".into(),
            detail: "HTTP 500".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("scan-01.png"));
        assert!(msg.contains("HTTP 500"));
    }
}
