//! Progress-callback trait for batch-capture events.
//!
//! Inject an [`Arc<dyn CaptureProgress>`] via
//! [`crate::config::PortalConfigBuilder::progress`] to receive real-time
//! events as the batch processes each file.
//!
//! # Why callbacks instead of channels?
//!
//! The callback approach is the least-invasive integration point: callers can
//! forward events to a terminal progress bar, a log, or a channel of their own
//! without the library knowing anything about how the host application
//! communicates. The trait is `Send + Sync` because files are processed
//! concurrently.
//!
//! [`Arc<dyn CaptureProgress>`]: std::sync::Arc

/// Called by the batch pipeline as it processes each file.
///
/// All methods have default no-op implementations so callers only override
/// what they care about. When concurrency is greater than one, `on_file_start`
/// and `on_file_done` may be called from different tasks interleaved;
/// implementations must protect shared mutable state accordingly.
pub trait CaptureProgress: Send + Sync {
    /// Called once before any file is processed.
    fn on_batch_start(&self, total_files: usize) {
        let _ = total_files;
    }

    /// Called just before a file's extraction begins.
    fn on_file_start(&self, file: &str) {
        let _ = file;
    }

    /// Called when a file finishes, successfully or not.
    ///
    /// `error` is `None` on success, or the user-visible failure message.
    fn on_file_done(&self, file: &str, error: Option<&str>) {
        let _ = (file, error);
    }

    /// Called once after all files have been attempted.
    fn on_batch_complete(&self, total_files: usize, success_count: usize) {
        let _ = (total_files, success_count);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopCaptureProgress;

impl CaptureProgress for NoopCaptureProgress {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Counting {
        done: AtomicUsize,
    }

    impl CaptureProgress for Counting {
        fn on_file_done(&self, _file: &str, _error: Option<&str>) {
            self.done.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn default_methods_are_noops() {
        let c = Counting {
            done: AtomicUsize::new(0),
        };
        c.on_batch_start(3);
        c.on_file_start("a.png");
        c.on_file_done("a.png", None);
        c.on_batch_complete(3, 1);
        assert_eq!(c.done.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn noop_callback_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<NoopCaptureProgress>();
    }
}
