//! Camera-based acquisition: live frames, an explicit shutter, and guaranteed
//! device release.
//!
//! The hardware itself is behind the [`FrameSource`] trait so the pipeline
//! stays testable without a physical device — a host application plugs in its
//! platform's capture backend, tests plug in a canned source. What the library
//! owns is the lifecycle contract: the device is acquired when the [`Camera`]
//! is opened and released on *every* exit path — explicit close, drop, or
//! panic unwinding — because a leaked camera handle blocks every other user of
//! the hardware until the process dies.
//!
//! A shutter press captures the current frame, encodes it as JPEG, and tags it
//! with a synthetic `capture-{epoch_millis}.jpg` filename so it flows through
//! the rest of the pipeline exactly like a picked file.

use crate::capture::input::AcquiredImage;
use crate::error::DocintelError;
use image::DynamicImage;
use std::io::Cursor;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, info};

/// A live source of video frames.
///
/// Implementations wrap a real device (or a test double). The library calls
/// `start` exactly once before any `frame`, and guarantees `stop` is called
/// exactly once afterwards, on every exit path. `stop` must be idempotent in
/// the face of a failed `start`.
pub trait FrameSource: Send {
    /// Acquire the device and begin streaming.
    ///
    /// # Errors
    /// Permission denial or device unavailability. No retry is attempted;
    /// the error is surfaced to the user as-is.
    fn start(&mut self) -> Result<(), DocintelError>;

    /// The current frame. Only called between a successful `start` and `stop`.
    fn frame(&mut self) -> Result<DynamicImage, DocintelError>;

    /// Release the device. Must be safe to call more than once.
    fn stop(&mut self);
}

/// An open camera: a started [`FrameSource`] plus the teardown guarantee.
///
/// Dropping the camera stops the source, so the hardware handle cannot leak
/// across an early return or a panic. Prefer [`Camera::close`] when teardown
/// should be explicit and observable.
#[derive(Debug)]
pub struct Camera<S: FrameSource> {
    source: S,
    stopped: bool,
}

impl<S: FrameSource> Camera<S> {
    /// Open the camera, acquiring the device.
    ///
    /// # Errors
    /// [`DocintelError::CameraUnavailable`] (or whatever the source reports)
    /// when the device cannot be acquired. Nothing is leaked on failure — a
    /// source that failed to start is not stopped.
    pub fn open(mut source: S) -> Result<Self, DocintelError> {
        source.start()?;
        info!("Camera stream started");
        Ok(Self {
            source,
            stopped: false,
        })
    }

    /// Shutter action: capture the current frame as a still image.
    ///
    /// The frame is JPEG-encoded and tagged with a synthetic filename derived
    /// from the current time, mirroring how a picked file carries its name.
    pub fn snapshot(&mut self) -> Result<AcquiredImage, DocintelError> {
        let frame = self.source.frame()?;

        let mut bytes = Vec::new();
        frame
            .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Jpeg)
            .map_err(|e| DocintelError::FrameCaptureFailed {
                detail: e.to_string(),
            })?;

        let file_name = format!("capture-{}.jpg", epoch_millis());
        debug!("Captured frame → {file_name} ({} bytes)", bytes.len());

        Ok(AcquiredImage {
            bytes,
            mime_type: "image/jpeg".to_string(),
            file_name,
        })
    }

    /// Explicitly stop the stream and release the device.
    pub fn close(mut self) {
        self.stop_once();
    }

    fn stop_once(&mut self) {
        if !self.stopped {
            self.source.stop();
            self.stopped = true;
            info!("Camera stream stopped");
        }
    }
}

impl<S: FrameSource> Drop for Camera<S> {
    fn drop(&mut self) {
        self.stop_once();
    }
}

fn epoch_millis() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0)
}
