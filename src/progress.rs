//! Progress-callback trait for job submission and polling events.
//!
//! Inject an [`Arc<dyn PollProgressCallback>`] via
//! [`crate::config::ClientConfigBuilder::progress_callback`] to observe a
//! polling session: one `on_submitted`, then one `on_attempt` per status
//! request, then exactly one of `on_completed` / `on_failed`.
//!
//! # Example
//!
//! ```rust
//! use converthub::{ClientConfig, PollAttempt, PollProgressCallback};
//! use std::sync::{Arc, atomic::{AtomicU32, Ordering}};
//!
//! struct CountingCallback {
//!     attempts: AtomicU32,
//! }
//!
//! impl PollProgressCallback for CountingCallback {
//!     fn on_attempt(&self, attempt: &PollAttempt) {
//!         self.attempts.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("attempt {} after {:?}", attempt.index, attempt.elapsed);
//!     }
//! }
//!
//! let cb = Arc::new(CountingCallback { attempts: AtomicU32::new(0) });
//! let config = ClientConfig::builder()
//!     .api_key("key")
//!     .progress_callback(cb as Arc<dyn PollProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use crate::output::PollAttempt;
use std::sync::Arc;

/// Called by the poller as a job moves toward a terminal state.
///
/// All methods have default no-op implementations so callers only override
/// what they care about.
pub trait PollProgressCallback: Send + Sync {
    /// Called once the API accepted a conversion and issued a job id.
    fn on_submitted(&self, job_id: &str) {
        let _ = job_id;
    }

    /// Called after every status request, whatever its outcome.
    fn on_attempt(&self, attempt: &PollAttempt) {
        let _ = attempt;
    }

    /// Called when the job completed and its result was resolved.
    fn on_completed(&self, job_id: &str, attempts: u32) {
        let _ = (job_id, attempts);
    }

    /// Called when the session ends in failure or timeout.
    fn on_failed(&self, job_id: &str, message: &str) {
        let _ = (job_id, message);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl PollProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::ClientConfig`].
pub type ProgressCallback = Arc<dyn PollProgressCallback>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::AttemptOutcome;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    #[derive(Default)]
    struct TrackingCallback {
        submitted: Mutex<Option<String>>,
        attempts: AtomicU32,
        completed: AtomicU32,
        failures: Mutex<Vec<String>>,
    }

    impl PollProgressCallback for TrackingCallback {
        fn on_submitted(&self, job_id: &str) {
            *self.submitted.lock().unwrap() = Some(job_id.to_string());
        }

        fn on_attempt(&self, _attempt: &PollAttempt) {
            self.attempts.fetch_add(1, Ordering::SeqCst);
        }

        fn on_completed(&self, _job_id: &str, attempts: u32) {
            self.completed.store(attempts, Ordering::SeqCst);
        }

        fn on_failed(&self, _job_id: &str, message: &str) {
            self.failures.lock().unwrap().push(message.to_string());
        }
    }

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopProgressCallback;
        cb.on_submitted("job");
        cb.on_attempt(&PollAttempt {
            index: 1,
            elapsed: Duration::ZERO,
            outcome: AttemptOutcome::InProgress,
        });
        cb.on_completed("job", 1);
        cb.on_failed("job", "boom");
    }

    #[test]
    fn tracking_callback_receives_events() {
        let tracker = Arc::new(TrackingCallback::default());
        let cb: ProgressCallback = tracker.clone();

        cb.on_submitted("job_42");
        for index in 1..=3 {
            cb.on_attempt(&PollAttempt {
                index,
                elapsed: Duration::from_secs(u64::from(index)),
                outcome: AttemptOutcome::InProgress,
            });
        }
        cb.on_completed("job_42", 3);
        cb.on_failed("job_43", "corrupt file");

        assert_eq!(tracker.submitted.lock().unwrap().as_deref(), Some("job_42"));
        assert_eq!(tracker.attempts.load(Ordering::SeqCst), 3);
        assert_eq!(tracker.completed.load(Ordering::SeqCst), 3);
        assert_eq!(*tracker.failures.lock().unwrap(), vec!["corrupt file"]);
    }
}
