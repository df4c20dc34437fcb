//! Error types for aurum-core.

use thiserror::Error;

/// Core error types.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Invalid allocation: {0}")]
    InvalidAllocation(String),
}

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
