//! Progress-callback trait for per-artifact generation events.
//!
//! Inject an [`Arc<dyn GenerationProgressCallback>`] via
//! [`crate::config::StudyConfigBuilder::progress_callback`] to drive a busy
//! indicator while the four model calls are in flight.
//!
//! # Example
//!
//! ```rust
//! use edgequake_study::{ArtifactKind, GenerationProgressCallback, StudyConfig};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     done: AtomicUsize,
//! }
//!
//! impl GenerationProgressCallback for CountingCallback {
//!     fn on_artifact_complete(&self, kind: ArtifactKind, text_len: usize) {
//!         let n = self.done.fetch_add(1, Ordering::SeqCst) + 1;
//!         eprintln!("{kind} done ({text_len} chars), {n}/4");
//!     }
//! }
//!
//! let config = StudyConfig::builder()
//!     .progress_callback(Arc::new(CountingCallback { done: AtomicUsize::new(0) }))
//!     .build()
//!     .unwrap();
//! ```

use crate::prompts::ArtifactKind;
use std::sync::Arc;

/// Called by [`crate::generate`] around each model call.
///
/// All methods default to no-ops. With `concurrent = true` the per-artifact
/// methods may be called in any order, from different tasks.
pub trait GenerationProgressCallback: Send + Sync {
    /// Called once, after the context is built and before the first call.
    ///
    /// # Arguments
    /// * `context_chars` — length of the bounded context
    /// * `truncated`     — whether the input was cut to fit
    fn on_generation_start(&self, context_chars: usize, truncated: bool) {
        let _ = (context_chars, truncated);
    }

    /// Called just before the request for `kind` is sent.
    fn on_artifact_start(&self, kind: ArtifactKind) {
        let _ = kind;
    }

    /// Called when the model returned text for `kind`.
    fn on_artifact_complete(&self, kind: ArtifactKind, text_len: usize) {
        let _ = (kind, text_len);
    }

    /// Called when the call for `kind` failed. No retry follows.
    fn on_artifact_error(&self, kind: ArtifactKind, error: &str) {
        let _ = (kind, error);
    }

    /// Called once after all four calls have finished.
    ///
    /// # Arguments
    /// * `succeeded` — calls that returned text (0–4)
    fn on_generation_complete(&self, succeeded: usize) {
        let _ = succeeded;
    }
}

/// Default when no callback is configured.
pub struct NoopProgressCallback;

impl GenerationProgressCallback for NoopProgressCallback {}

/// Type stored in [`crate::config::StudyConfig`].
pub type ProgressCallback = Arc<dyn GenerationProgressCallback>;
