//! Error types for aurum-signal.

use thiserror::Error;

/// Signal acquisition errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SignalError {
    /// The feed could not produce a fresh value. The controller must hold
    /// the current allocation rather than act on a stale reading.
    #[error("signal unavailable: {0}")]
    Unavailable(String),
}

/// Result type alias for signal operations.
pub type SignalResult<T> = std::result::Result<T, SignalError>;
