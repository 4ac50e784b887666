//! Capture orchestration: drive a session through extraction and persistence.
//!
//! [`run_capture`] is the single-capture entry point used by the interactive
//! flow: one acquired image, one session, extraction strictly before the save
//! attempt, and the save attempt issued only when extraction yielded non-empty
//! text. Neither call is retried or cancelled once issued — the caller waits
//! for resolution, and every failure path ends as user-visible text in the
//! session.
//!
//! [`run_capture_batch`] processes a folder of scans with bounded concurrency.
//! Each file gets its own independent session; one bad scan never aborts the
//! batch. Per-file failures are recorded as [`CaptureError`] in the report.

use crate::api::ApiClient;
use crate::capture::encode::encode_image;
use crate::capture::extract::ExtractionClient;
use crate::capture::input::{acquire_local, AcquiredImage};
use crate::capture::session::{CaptureSession, CaptureStatus};
use crate::config::PortalConfig;
use crate::error::{CaptureError, DocintelError};
use crate::postprocess::clean_extracted_text;
use futures::stream::{self, StreamExt};
use serde::Serialize;
use std::path::PathBuf;
use std::time::Instant;
use tracing::{info, warn};

/// Message recorded when the model answers with an empty string.
const EMPTY_EXTRACTION_MESSAGE: &str = "The AI service returned no text for this image.";

/// Timing and size figures for one capture.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CaptureStats {
    /// Wall-clock duration of the extraction call, in milliseconds.
    pub extract_ms: u64,
    /// Wall-clock duration of the save call, in milliseconds. Zero when no
    /// save was issued.
    pub save_ms: u64,
    /// Size of the acquired image in bytes.
    pub image_bytes: usize,
    /// Length of the extracted text in characters.
    pub text_chars: usize,
}

/// The result of one capture attempt.
#[derive(Debug, Clone, Serialize)]
pub struct CaptureOutcome {
    /// Source filename the capture was tagged with.
    pub source_file: String,
    /// Final session status — one of `extraction_failed`, `extracted`
    /// (dry run), `saved`, or `save_failed`.
    pub status: CaptureStatus,
    /// Text as the user sees it (extraction result or `Error: …` marker).
    pub text: Option<String>,
    /// Accumulated user-visible error text, if any step failed.
    pub error: Option<String>,
    pub stats: CaptureStats,
}

/// Run one capture: extraction, then — for non-empty text — persistence.
///
/// The session is left in the outcome's final state so an interactive caller
/// can keep rendering it or reset it for the next attempt.
///
/// # Errors
/// Fatal only: [`DocintelError::CaptureBusy`] when the session already has a
/// capture in flight. Extraction and save failures are not `Err` — they are
/// terminal session states, reported inside the outcome.
pub async fn run_capture(
    session: &mut CaptureSession,
    image: AcquiredImage,
    extraction: &ExtractionClient,
    api: &ApiClient,
    config: &PortalConfig,
) -> Result<CaptureOutcome, DocintelError> {
    let source_file = image.file_name.clone();
    let image_bytes = image.bytes.len();
    let payload = encode_image(&image);

    session.begin(image)?;
    info!("Capture started: {source_file:?}");

    let mut stats = CaptureStats {
        image_bytes,
        ..CaptureStats::default()
    };

    // ── Extraction phase ─────────────────────────────────────────────────
    let extract_start = Instant::now();
    match extraction.extract_text(&payload).await {
        Ok(raw) => {
            let text = if config.clean_output {
                clean_extracted_text(&raw)
            } else {
                raw
            };
            if text.trim().is_empty() {
                // An empty answer is a failed extraction: nothing to display,
                // nothing to save.
                warn!("Extraction returned no text for {source_file:?}");
                session.extraction_failed(EMPTY_EXTRACTION_MESSAGE);
            } else {
                stats.text_chars = text.chars().count();
                session.extraction_succeeded(text);
            }
        }
        Err(e) => {
            warn!("Extraction failed for {source_file:?}: {e}");
            session.extraction_failed(&e.to_string());
        }
    }
    stats.extract_ms = extract_start.elapsed().as_millis() as u64;

    // ── Save phase (only after non-empty extraction) ─────────────────────
    if session.status() == CaptureStatus::Extracted && config.save {
        session.save_issued();
        let save_start = Instant::now();
        let content = session.extracted_text().unwrap_or_default().to_string();

        match api.save_document(&content, &source_file).await {
            Ok(_) => session.save_succeeded(),
            Err(e) => {
                warn!("Save failed for {source_file:?}: {e}");
                session.save_failed(&e.to_string());
            }
        }
        stats.save_ms = save_start.elapsed().as_millis() as u64;
    }

    let outcome = CaptureOutcome {
        source_file,
        status: session.status(),
        text: session.extracted_text().map(str::to_string),
        error: session.error().map(str::to_string),
        stats,
    };
    info!(
        "Capture finished: {:?} → {}",
        outcome.source_file,
        outcome.status.as_str()
    );
    Ok(outcome)
}

// ── Batch capture ────────────────────────────────────────────────────────

/// One file's entry in a batch report.
#[derive(Debug, Serialize)]
pub struct BatchItem {
    /// File path as given.
    pub file: String,
    /// The capture outcome; `None` when the file was rejected before a
    /// session could start (unreadable, not an image).
    pub outcome: Option<CaptureOutcome>,
    /// The failure, if this file did not reach `saved` (or `extracted` in a
    /// dry run). `None` means full success.
    pub error: Option<CaptureError>,
}

impl BatchItem {
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Aggregate figures for a batch run.
#[derive(Debug, Default, Serialize)]
pub struct BatchStats {
    pub total_files: usize,
    /// Files whose extraction produced non-empty text.
    pub extracted: usize,
    /// Files persisted to the backend.
    pub saved: usize,
    /// Files that failed at any stage (rejected, extraction, save).
    pub failed: usize,
    pub total_duration_ms: u64,
}

/// Everything a batch run produced, in input order.
#[derive(Debug, Serialize)]
pub struct BatchReport {
    pub items: Vec<BatchItem>,
    pub stats: BatchStats,
}

/// Capture a set of image files with bounded concurrency.
///
/// Files are processed up to `config.concurrency` at a time; each gets its own
/// [`CaptureSession`], so the one-in-flight rule holds per session while the
/// batch as a whole overlaps network waits. Items are reported in input order
/// regardless of completion order.
pub async fn run_capture_batch(
    files: &[PathBuf],
    extraction: &ExtractionClient,
    api: &ApiClient,
    config: &PortalConfig,
) -> BatchReport {
    let total = files.len();
    let start = Instant::now();
    info!("Batch capture: {total} file(s), concurrency {}", config.concurrency);

    if let Some(ref cb) = config.progress {
        cb.on_batch_start(total);
    }

    let mut items: Vec<(usize, BatchItem)> = stream::iter(files.iter().enumerate().map(
        |(index, path)| async move {
            let file = path.display().to_string();
            if let Some(ref cb) = config.progress {
                cb.on_file_start(&file);
            }
            let item = capture_one_file(&file, extraction, api, config).await;
            if let Some(ref cb) = config.progress {
                cb.on_file_done(&file, item.error.as_ref().map(|e| e.to_string()).as_deref());
            }
            (index, item)
        },
    ))
    .buffer_unordered(config.concurrency)
    .collect()
    .await;

    items.sort_by_key(|(index, _)| *index);
    let items: Vec<BatchItem> = items.into_iter().map(|(_, item)| item).collect();

    let stats = BatchStats {
        total_files: total,
        extracted: items
            .iter()
            .filter(|i| {
                i.outcome
                    .as_ref()
                    .is_some_and(|o| o.status != CaptureStatus::ExtractionFailed)
            })
            .count(),
        saved: items
            .iter()
            .filter(|i| {
                i.outcome
                    .as_ref()
                    .is_some_and(|o| o.status == CaptureStatus::Saved)
            })
            .count(),
        failed: items.iter().filter(|i| !i.is_success()).count(),
        total_duration_ms: start.elapsed().as_millis() as u64,
    };

    if let Some(ref cb) = config.progress {
        cb.on_batch_complete(total, total - stats.failed);
    }
    info!(
        "Batch complete: {}/{} succeeded in {}ms",
        total - stats.failed,
        total,
        stats.total_duration_ms
    );

    BatchReport { items, stats }
}

/// Process one file of a batch with a fresh session; never panics or aborts
/// the batch.
async fn capture_one_file(
    file: &str,
    extraction: &ExtractionClient,
    api: &ApiClient,
    config: &PortalConfig,
) -> BatchItem {
    let image = match acquire_local(file) {
        Ok(img) => img,
        Err(e) => {
            warn!("Rejected {file:?}: {e}");
            return BatchItem {
                file: file.to_string(),
                outcome: None,
                error: Some(CaptureError::Rejected {
                    file: file.to_string(),
                    reason: e.to_string(),
                }),
            };
        }
    };

    let mut session = CaptureSession::new();
    match run_capture(&mut session, image, extraction, api, config).await {
        Ok(outcome) => {
            let error = match outcome.status {
                CaptureStatus::ExtractionFailed => Some(CaptureError::Extraction {
                    file: file.to_string(),
                    detail: outcome.error.clone().unwrap_or_default(),
                }),
                CaptureStatus::SaveFailed => Some(CaptureError::Save {
                    file: file.to_string(),
                    detail: outcome.error.clone().unwrap_or_default(),
                }),
                _ => None,
            };
            BatchItem {
                file: file.to_string(),
                outcome: Some(outcome),
                error,
            }
        }
        // A fresh session cannot be busy; anything else is unexpected but
        // still must not abort the batch.
        Err(e) => BatchItem {
            file: file.to_string(),
            outcome: None,
            error: Some(CaptureError::Rejected {
                file: file.to_string(),
                reason: e.to_string(),
            }),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outcome_serialises_with_snake_case_status() {
        let outcome = CaptureOutcome {
            source_file: "scan.png".into(),
            status: CaptureStatus::SaveFailed,
            text: Some("text".into()),
            error: Some("Could not save document: HTTP 500".into()),
            stats: CaptureStats::default(),
        };
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["status"], "save_failed");
        assert_eq!(json["source_file"], "scan.png");
    }

    #[test]
    fn batch_item_success_means_no_error() {
        let item = BatchItem {
            file: "a.png".into(),
            outcome: None,
            error: Some(CaptureError::Rejected {
                file: "a.png".into(),
                reason: "not an image".into(),
            }),
        };
        assert!(!item.is_success());
    }

    #[test]
    fn empty_message_is_user_readable() {
        assert!(EMPTY_EXTRACTION_MESSAGE.contains("no text"));
    }
}
