//! Result and error types for the locator engine.
//!
//! The error surface is deliberately tiny: per-strategy and per-candidate
//! failures are swallowed inside the engine (a bad candidate is simply "not
//! unique"), so the only errors a caller can see are entry-point contract
//! violations.

use thiserror::Error;

/// Result type for locator engine operations.
pub type ApuntarResult<T> = Result<T, ApuntarError>;

/// Errors surfaced by [`Session::generate`](crate::Session::generate).
#[derive(Debug, Error)]
pub enum ApuntarError {
    /// The supplied handle does not refer to an element of the document.
    #[error("target is not an element attached to this document")]
    TargetDetached,

    /// Even the absolute-path fallback could not be constructed — the
    /// document is in an inconsistent state.
    #[error("cannot locate element: absolute path construction failed for <{tag}>")]
    CannotLocate {
        /// Tag of the element that could not be addressed.
        tag: String,
    },

    /// JSON error (debug dumps of generated candidates).
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
