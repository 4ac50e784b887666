//! Capture pipeline: image acquisition → text extraction → persistence.
//!
//! Each submodule implements exactly one stage or concern. Keeping them
//! separate makes each independently testable and lets us swap an
//! implementation (e.g. a different frame source) without touching the others.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ encode ──▶ extract ──▶ save
//! (file/URL/  (base64)  (vision    (POST
//!  camera)              model)      /api/documents)
//! ```
//!
//! 1. [`input`]   — acquire image bytes from a local file or URL, sniffing the
//!    content type and rejecting non-images before any network call
//! 2. [`camera`]  — the live-device acquisition path; an RAII guard releases
//!    the hardware on every exit path
//! 3. [`encode`]  — base64-wrap the bytes for the multimodal request body
//! 4. [`extract`] — the vision-model call; the only stage with AI-service I/O
//! 5. [`session`] — the capture status machine; pure transitions, no I/O
//! 6. [`run`]     — the orchestrator driving a session through the stages,
//!    plus batch capture over a directory of scans
//! 7. [`export`]  — client-side CSV export of the extracted text

pub mod camera;
pub mod encode;
pub mod export;
pub mod input;
pub mod run;
pub mod session;

mod extract;

pub use camera::{Camera, FrameSource};
pub use encode::ImagePayload;
pub use extract::ExtractionClient;
pub use input::AcquiredImage;
pub use run::{run_capture, run_capture_batch, BatchItem, BatchReport, BatchStats, CaptureOutcome, CaptureStats};
pub use session::{CaptureEvent, CaptureSession, CaptureStatus};
