//! Observer trait for workflow events.
//!
//! Inject an [`Arc<dyn WorkflowCallback>`] via
//! [`crate::config::WorkflowConfigBuilder::callback`] to hear about intake
//! decisions, state transitions, and conversion outcomes as they happen.
//!
//! # Example
//!
//! ```rust
//! use pdfconv::{WorkflowCallback, WorkflowConfig, WorkflowState};
//! use std::sync::{Arc, Mutex};
//!
//! #[derive(Default)]
//! struct Recorder {
//!     seen: Mutex<Vec<WorkflowState>>,
//! }
//!
//! impl WorkflowCallback for Recorder {
//!     fn on_transition(&self, _from: WorkflowState, to: WorkflowState) {
//!         self.seen.lock().unwrap().push(to);
//!     }
//! }
//!
//! let config = WorkflowConfig::builder()
//!     .callback(Arc::new(Recorder::default()) as Arc<dyn WorkflowCallback>)
//!     .build()
//!     .unwrap();
//! ```

use crate::error::RejectionReason;
use crate::pipeline::transfer::ConversionRequest;
use crate::workflow::WorkflowState;
use std::sync::Arc;

/// Called by the [`crate::workflow::WorkflowController`] as the workflow moves.
///
/// All methods have default no-op implementations so callers only override
/// what they care about. Callbacks run synchronously on the controller's
/// task and should return quickly.
pub trait WorkflowCallback: Send + Sync {
    /// A file passed validation and is now the selected file.
    fn on_file_accepted(&self, name: &str, size: u64) {
        let _ = (name, size);
    }

    /// A file failed validation; the previous selection is unchanged.
    fn on_file_rejected(&self, name: &str, reason: RejectionReason) {
        let _ = (name, reason);
    }

    /// The observable state changed.
    fn on_transition(&self, from: WorkflowState, to: WorkflowState) {
        let _ = (from, to);
    }

    /// A request is about to be sent.
    fn on_submit(&self, request: &ConversionRequest) {
        let _ = request;
    }

    /// The service returned an artifact.
    ///
    /// # Arguments
    /// * `file_name` - derived download name
    /// * `bytes`     - artifact size
    fn on_complete(&self, file_name: &str, bytes: usize) {
        let _ = (file_name, bytes);
    }

    /// The request failed; `message` is what the user is shown.
    fn on_failure(&self, message: &str) {
        let _ = message;
    }
}

/// A no-op implementation for callers that don't need events.
pub struct NoopCallback;

impl WorkflowCallback for NoopCallback {}

/// Convenience alias matching the type stored in [`crate::config::WorkflowConfig`].
pub type SharedCallback = Arc<dyn WorkflowCallback>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct Counting {
        accepted: AtomicUsize,
        rejected: AtomicUsize,
        failures: AtomicUsize,
    }

    impl WorkflowCallback for Counting {
        fn on_file_accepted(&self, _name: &str, _size: u64) {
            self.accepted.fetch_add(1, Ordering::SeqCst);
        }

        fn on_file_rejected(&self, _name: &str, _reason: RejectionReason) {
            self.rejected.fetch_add(1, Ordering::SeqCst);
        }

        fn on_failure(&self, _message: &str) {
            self.failures.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn counting_callback_tallies_through_trait_object() {
        let counting = Arc::new(Counting::default());
        let cb: SharedCallback = counting.clone();
        cb.on_file_accepted("a.pdf", 1);
        cb.on_file_rejected("b.txt", RejectionReason::WrongFileType);
        cb.on_file_rejected("c.pdf", RejectionReason::FileTooLarge { limit: 1 });
        cb.on_failure("x");
        cb.on_failure("y");
        // defaults stay no-ops and leave the tallies alone
        cb.on_transition(WorkflowState::FormatSelected, WorkflowState::Processing);
        cb.on_complete("a.md", 10);

        assert_eq!(counting.accepted.load(Ordering::SeqCst), 1);
        assert_eq!(counting.rejected.load(Ordering::SeqCst), 2);
        assert_eq!(counting.failures.load(Ordering::SeqCst), 2);
    }
}
