//! Progress-callback trait for request attempts and retries.
//!
//! Inject an [`Arc<dyn RequestProgressCallback>`] via
//! [`crate::config::ExtractConfigBuilder::progress_callback`] to observe a
//! request as it happens: when an attempt starts, why it failed, how long
//! the next wait is, and how it ended. The CLI uses this to drive its
//! spinner; a web backend could forward the same events to the client so
//! the user sees "retrying (2/3)…" instead of a frozen page.
//!
//! # Example
//!
//! ```rust
//! use llm_reply_json::{ExtractConfig, RequestProgressCallback};
//! use std::sync::{Arc, atomic::{AtomicU32, Ordering}};
//!
//! struct RetryCounter(AtomicU32);
//!
//! impl RequestProgressCallback for RetryCounter {
//!     fn on_attempt_failed(&self, _attempt: u32, _max: u32, _error: &str) {
//!         self.0.fetch_add(1, Ordering::SeqCst);
//!     }
//! }
//!
//! let config = ExtractConfig::builder()
//!     .progress_callback(Arc::new(RetryCounter(AtomicU32::new(0))))
//!     .build()
//!     .unwrap();
//! ```

use std::sync::Arc;
use std::time::Duration;

/// Called by the request layer around each attempt.
///
/// Implementations must be `Send + Sync`: [`crate::request::request_many`]
/// runs several requests at once and they share the callback. All methods
/// default to no-ops.
pub trait RequestProgressCallback: Send + Sync {
    /// An attempt is about to call the model.
    fn on_attempt_start(&self, attempt: u32, max_attempts: u32) {
        let _ = (attempt, max_attempts);
    }

    /// An attempt failed; `error` is the user-facing description.
    fn on_attempt_failed(&self, attempt: u32, max_attempts: u32, error: &str) {
        let _ = (attempt, max_attempts, error);
    }

    /// Another attempt will start after `delay`.
    fn on_retry_scheduled(&self, next_attempt: u32, delay: Duration) {
        let _ = (next_attempt, delay);
    }

    /// The request produced a valid result on `attempt`.
    fn on_success(&self, attempt: u32) {
        let _ = attempt;
    }

    /// The request ended without a result after `attempts` attempts.
    fn on_gave_up(&self, attempts: u32, error: &str) {
        let _ = (attempts, error);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl RequestProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::ExtractConfig`].
pub type ProgressCallback = Arc<dyn RequestProgressCallback>;
