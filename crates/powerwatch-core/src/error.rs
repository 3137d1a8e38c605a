//! Core error type.
//!
//! Everything that can go wrong inside the monitoring loop is folded into
//! [`CoreError`] and handled at the loop boundary; only startup failures are
//! allowed to escape to the caller.

use thiserror::Error;

/// Errors produced by the monitoring core.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A metrics read failed (transient — the loop backs off and retries).
    #[error("metrics read failed: {0}")]
    Metrics(String),

    /// The audio device could not be opened or the stream died.
    /// Never fatal: the alert continues in silent form.
    #[error("audio device error: {0}")]
    Audio(String),

    /// Journal or export file I/O failed.
    #[error("journal I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// `start()` was called while the worker is already running.
    #[error("monitoring is already running")]
    AlreadyRunning,
}
