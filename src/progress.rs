//! Progress-callback trait for OCR job events.
//!
//! A remote OCR job spends most of its life in the poll loop, so callers
//! usually want some feedback. The callback is the least-invasive
//! integration point: the CLI drives a terminal spinner with it, a service
//! could forward events to a channel or a job table, and the library stays
//! ignorant of both. All methods default to no-ops so implementors override
//! only what they need.

/// Called by [`crate::ocr::OcrClient`] as a job progresses.
///
/// Implementations must be `Send + Sync`; the client may be shared across
/// tasks.
pub trait JobProgress: Send + Sync {
    /// Called once the submit request was accepted.
    fn on_submitted(&self, request_id: &str) {
        let _ = request_id;
    }

    /// Called after each status poll.
    ///
    /// * `attempt` — 1-indexed poll count
    /// * `max`     — configured poll budget
    /// * `status`  — status string reported by the service
    fn on_poll(&self, attempt: u32, max: u32, status: &str) {
        let _ = (attempt, max, status);
    }

    /// Called when the job reaches `complete`.
    fn on_complete(&self, image_count: usize) {
        let _ = image_count;
    }

    /// Called when the job fails or the poll budget runs out.
    fn on_failed(&self, detail: &str) {
        let _ = detail;
    }
}

/// No-op implementation for callers that don't need progress events.
pub struct NoopJobProgress;

impl JobProgress for NoopJobProgress {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct CountingProgress {
        polls: AtomicU32,
        completed: AtomicU32,
    }

    impl JobProgress for CountingProgress {
        fn on_poll(&self, _attempt: u32, _max: u32, _status: &str) {
            self.polls.fetch_add(1, Ordering::SeqCst);
        }
        fn on_complete(&self, _image_count: usize) {
            self.completed.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopJobProgress;
        cb.on_submitted("req-1");
        cb.on_poll(1, 300, "processing");
        cb.on_complete(4);
        cb.on_failed("boom");
    }

    #[test]
    fn counting_callback_receives_events() {
        let cb = CountingProgress {
            polls: AtomicU32::new(0),
            completed: AtomicU32::new(0),
        };
        cb.on_poll(1, 300, "processing");
        cb.on_poll(2, 300, "processing");
        cb.on_complete(0);
        assert_eq!(cb.polls.load(Ordering::SeqCst), 2);
        assert_eq!(cb.completed.load(Ordering::SeqCst), 1);
    }
}
