//! The capture status machine.
//!
//! One capture session tracks one attempt to acquire an image, extract its
//! text, and persist the result:
//!
//! ```text
//! Idle ──▶ Extracting ──▶ Extracted ──▶ Saving ──▶ Saved
//!              │                           │
//!              ▼                           ▼
//!      ExtractionFailed               SaveFailed
//! ```
//!
//! `Saved`, `SaveFailed`, and `ExtractionFailed` are terminal until an
//! explicit reset returns the session to `Idle`.
//!
//! Transitions are a pure function — [`step`] — so the whole machine can be
//! driven and asserted by tests without any I/O or rendering layer.
//! [`CaptureSession`] layers the transient fields (image, extracted text,
//! accumulated error text) on top and enforces the one-session-at-a-time
//! guard: acquiring a new image while extraction or save is in flight is
//! rejected, never silently interleaved.

use crate::capture::input::AcquiredImage;
use crate::error::DocintelError;
use serde::{Deserialize, Serialize};

/// Where a capture session currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaptureStatus {
    /// No capture in progress. Initial state.
    #[default]
    Idle,
    /// Image acquired; extraction call in flight.
    Extracting,
    /// Extraction failed or returned empty. Terminal until reset.
    ExtractionFailed,
    /// Extraction produced non-empty text; save not yet issued.
    Extracted,
    /// Persistence call in flight.
    Saving,
    /// Persistence succeeded. Terminal until reset.
    Saved,
    /// Persistence failed; extracted text is kept. Terminal until reset.
    SaveFailed,
}

impl CaptureStatus {
    /// True while a network call is in flight for this session.
    pub fn is_busy(self) -> bool {
        matches!(self, CaptureStatus::Extracting | CaptureStatus::Saving)
    }

    /// True once the session has reached an end state.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            CaptureStatus::Saved | CaptureStatus::SaveFailed | CaptureStatus::ExtractionFailed
        )
    }

    /// Stable lower-case name, used in messages and CLI output.
    pub fn as_str(self) -> &'static str {
        match self {
            CaptureStatus::Idle => "idle",
            CaptureStatus::Extracting => "extracting",
            CaptureStatus::ExtractionFailed => "extraction_failed",
            CaptureStatus::Extracted => "extracted",
            CaptureStatus::Saving => "saving",
            CaptureStatus::Saved => "saved",
            CaptureStatus::SaveFailed => "save_failed",
        }
    }
}

/// Everything that can happen to a capture session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureEvent {
    /// An image was acquired from a file, URL, or camera shutter.
    ImageAcquired,
    /// The extraction call returned non-empty text.
    ExtractionSucceeded,
    /// The extraction call failed or returned empty.
    ExtractionFailed,
    /// The persistence call was issued.
    SaveIssued,
    /// The persistence call succeeded.
    SaveSucceeded,
    /// The persistence call failed.
    SaveFailed,
    /// Explicit user reset.
    Reset,
}

/// Pure transition function: `(state, event) -> state`.
///
/// Events that make no sense in the current state leave it unchanged; the
/// session layer decides which of those are errors (an `ImageAcquired` while
/// busy) and which are silently impossible.
pub fn step(status: CaptureStatus, event: CaptureEvent) -> CaptureStatus {
    use CaptureEvent as E;
    use CaptureStatus as S;

    match (status, event) {
        (_, E::Reset) => S::Idle,
        (s, E::ImageAcquired) if !s.is_busy() => S::Extracting,
        (S::Extracting, E::ExtractionSucceeded) => S::Extracted,
        (S::Extracting, E::ExtractionFailed) => S::ExtractionFailed,
        (S::Extracted, E::SaveIssued) => S::Saving,
        (S::Saving, E::SaveSucceeded) => S::Saved,
        (S::Saving, E::SaveFailed) => S::SaveFailed,
        (s, _) => s,
    }
}

/// One capture attempt: the acquired image, its extracted text, the save
/// status, and any user-visible error text accumulated along the way.
///
/// A session owns its transient fields exclusively — nothing is shared with
/// search sessions or with other captures. It is created empty, mutated
/// through the extraction and save phases, and discarded or reset afterwards.
#[derive(Debug, Default)]
pub struct CaptureSession {
    status: CaptureStatus,
    image: Option<AcquiredImage>,
    extracted_text: Option<String>,
    error: Option<String>,
}

impl CaptureSession {
    /// A fresh, idle session with all fields empty.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self) -> CaptureStatus {
        self.status
    }

    /// Image currently held by the session, if any.
    pub fn image(&self) -> Option<&AcquiredImage> {
        self.image.as_ref()
    }

    /// Text as the user sees it: the extraction result, or the explicit
    /// `Error: …` marker after a failed extraction.
    pub fn extracted_text(&self) -> Option<&str> {
        self.extracted_text.as_deref()
    }

    /// Accumulated user-visible error text, if any step failed.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Begin a new capture with an acquired image.
    ///
    /// Clears any previous attempt's fields and moves to `Extracting`.
    ///
    /// # Errors
    /// [`DocintelError::CaptureBusy`] when a capture is already in flight;
    /// the in-flight session is left untouched.
    pub fn begin(&mut self, image: AcquiredImage) -> Result<(), DocintelError> {
        if self.status.is_busy() {
            return Err(DocintelError::CaptureBusy {
                status: self.status.as_str(),
            });
        }
        self.extracted_text = None;
        self.error = None;
        self.image = Some(image);
        self.status = step(self.status, CaptureEvent::ImageAcquired);
        Ok(())
    }

    /// Record a successful extraction. `text` must be non-empty; callers
    /// classify an empty result via [`extraction_failed`](Self::extraction_failed).
    pub fn extraction_succeeded(&mut self, text: String) {
        debug_assert!(!text.trim().is_empty());
        self.extracted_text = Some(text);
        self.status = step(self.status, CaptureEvent::ExtractionSucceeded);
    }

    /// Record a failed (or empty) extraction.
    ///
    /// The failure reason becomes the session error, and the displayed text is
    /// set to an explicit error marker. The save phase never starts.
    pub fn extraction_failed(&mut self, message: &str) {
        self.error = Some(message.to_string());
        self.extracted_text = Some(format!("Error: {message}"));
        self.status = step(self.status, CaptureEvent::ExtractionFailed);
    }

    /// Mark the persistence call as issued.
    pub fn save_issued(&mut self) {
        self.status = step(self.status, CaptureEvent::SaveIssued);
    }

    /// Record a successful save.
    pub fn save_succeeded(&mut self) {
        self.status = step(self.status, CaptureEvent::SaveSucceeded);
    }

    /// Record a failed save.
    ///
    /// The message is appended to any prior error text so earlier context is
    /// preserved, and the already-displayed extracted text is kept as-is.
    pub fn save_failed(&mut self, message: &str) {
        let line = format!("Could not save document: {message}");
        self.error = Some(match self.error.take() {
            Some(prev) => format!("{prev}\n{line}"),
            None => line,
        });
        self.status = step(self.status, CaptureEvent::SaveFailed);
    }

    /// Explicit reset: return to `Idle`, dropping the image bytes and clearing
    /// every transient field.
    pub fn reset(&mut self) {
        self.image = None;
        self.extracted_text = None;
        self.error = None;
        self.status = step(self.status, CaptureEvent::Reset);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn png() -> AcquiredImage {
        AcquiredImage {
            bytes: vec![0x89, 0x50, 0x4E, 0x47],
            mime_type: "image/png".into(),
            file_name: "scan.png".into(),
        }
    }

    #[test]
    fn happy_path_sequence() {
        let mut s = CaptureSession::new();
        assert_eq!(s.status(), CaptureStatus::Idle);

        s.begin(png()).unwrap();
        assert_eq!(s.status(), CaptureStatus::Extracting);

        s.extraction_succeeded("CÉDULA 1122334455".into());
        assert_eq!(s.status(), CaptureStatus::Extracted);

        s.save_issued();
        assert_eq!(s.status(), CaptureStatus::Saving);

        s.save_succeeded();
        assert_eq!(s.status(), CaptureStatus::Saved);
        assert!(s.status().is_terminal());
        assert!(s.error().is_none());
    }

    #[test]
    fn extraction_failure_sets_error_marker_and_skips_save() {
        let mut s = CaptureSession::new();
        s.begin(png()).unwrap();
        s.extraction_failed("service unavailable");

        assert_eq!(s.status(), CaptureStatus::ExtractionFailed);
        assert_eq!(s.extracted_text(), Some("Error: service unavailable"));
        assert_eq!(s.error(), Some("service unavailable"));

        // Save events are impossible from here; state must not move.
        s.save_issued();
        assert_eq!(s.status(), CaptureStatus::ExtractionFailed);
        s.save_succeeded();
        assert_eq!(s.status(), CaptureStatus::ExtractionFailed);
    }

    #[test]
    fn save_failure_appends_and_keeps_text() {
        let mut s = CaptureSession::new();
        s.begin(png()).unwrap();
        s.extraction_succeeded("extracted text".into());
        s.save_issued();
        s.save_failed("HTTP 500");

        assert_eq!(s.status(), CaptureStatus::SaveFailed);
        // The displayed text is not rolled back.
        assert_eq!(s.extracted_text(), Some("extracted text"));
        assert_eq!(s.error(), Some("Could not save document: HTTP 500"));
    }

    #[test]
    fn save_failure_preserves_earlier_error_context() {
        let mut s = CaptureSession::new();
        s.begin(png()).unwrap();
        s.extraction_succeeded("text".into());
        s.error = Some("earlier warning".into());
        s.save_issued();
        s.save_failed("timeout");

        let err = s.error().unwrap();
        assert!(err.starts_with("earlier warning\n"), "got: {err}");
        assert!(err.contains("Could not save document: timeout"));
    }

    #[test]
    fn busy_guard_rejects_overlapping_acquisition() {
        let mut s = CaptureSession::new();
        s.begin(png()).unwrap();
        assert_eq!(s.status(), CaptureStatus::Extracting);

        let err = s.begin(png()).unwrap_err();
        assert!(matches!(
            err,
            DocintelError::CaptureBusy {
                status: "extracting"
            }
        ));
        // In-flight session untouched.
        assert_eq!(s.status(), CaptureStatus::Extracting);
        assert!(s.image().is_some());

        s.extraction_succeeded("t".into());
        s.save_issued();
        let err = s.begin(png()).unwrap_err();
        assert!(matches!(err, DocintelError::CaptureBusy { status: "saving" }));
    }

    #[test]
    fn terminal_states_accept_a_new_capture() {
        let mut s = CaptureSession::new();
        s.begin(png()).unwrap();
        s.extraction_failed("bad scan");
        assert!(s.status().is_terminal());

        // No explicit reset needed to start over from a terminal state.
        s.begin(png()).unwrap();
        assert_eq!(s.status(), CaptureStatus::Extracting);
        assert!(s.error().is_none());
        assert!(s.extracted_text().is_none());
    }

    #[test]
    fn reset_clears_everything_from_any_terminal_state() {
        for fail_save in [true, false] {
            let mut s = CaptureSession::new();
            s.begin(png()).unwrap();
            s.extraction_succeeded("text".into());
            s.save_issued();
            if fail_save {
                s.save_failed("boom");
            } else {
                s.save_succeeded();
            }

            s.reset();
            assert_eq!(s.status(), CaptureStatus::Idle);
            assert!(s.image().is_none());
            assert!(s.extracted_text().is_none());
            assert!(s.error().is_none());
        }
    }

    #[test]
    fn step_is_total_and_ignores_impossible_events() {
        use CaptureEvent as E;
        use CaptureStatus as S;

        // Saving ignores extraction events.
        assert_eq!(step(S::Saving, E::ExtractionSucceeded), S::Saving);
        // Idle ignores save events.
        assert_eq!(step(S::Idle, E::SaveSucceeded), S::Idle);
        // Reset works from everywhere.
        for s in [
            S::Idle,
            S::Extracting,
            S::Extracted,
            S::ExtractionFailed,
            S::Saving,
            S::Saved,
            S::SaveFailed,
        ] {
            assert_eq!(step(s, E::Reset), S::Idle);
        }
    }

    #[test]
    fn status_serialises_in_snake_case() {
        let json = serde_json::to_string(&CaptureStatus::ExtractionFailed).unwrap();
        assert_eq!(json, "\"extraction_failed\"");
    }
}
