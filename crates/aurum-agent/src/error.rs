//! Application error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Key error: {0}")]
    Key(#[from] aurum_chain::KeyError),

    #[error("Chain error: {0}")]
    Chain(#[from] aurum_chain::ChainError),

    #[error("Signal error: {0}")]
    Signal(#[from] aurum_signal::SignalError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type AppResult<T> = Result<T, AppError>;
