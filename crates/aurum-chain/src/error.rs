//! Error types for aurum-chain.

use alloy::primitives::B256;
use aurum_core::PendingTransaction;
use thiserror::Error;

/// Ledger interaction errors.
///
/// The taxonomy mirrors what the controller needs to decide: `Submission`,
/// `Reverted`, and transport-level failures are safe to retry on the next
/// poll (nothing changed on-chain, or the change is final and failed);
/// `ConfirmationTimeout` is ambiguous and must be resolved against the ledger
/// before anything new is submitted.
#[derive(Debug, Error)]
pub enum ChainError {
    /// Nothing was broadcast; signing or transport failed before send.
    #[error("transaction submission failed: {0}")]
    Submission(String),

    /// The transaction was broadcast but not finalized within the bound.
    /// Carries the pending handle so the caller can re-check the hash later.
    #[error("transaction not confirmed within {timeout_secs}s, outcome unknown")]
    ConfirmationTimeout {
        pending: PendingTransaction,
        timeout_secs: u64,
    },

    /// The transaction was included but execution failed on-chain.
    #[error("transaction {hash} reverted in block {block_number}")]
    Reverted { hash: B256, block_number: u64 },

    /// The node returned a JSON-RPC error object.
    #[error("rpc error {code}: {message}")]
    Rpc { code: i64, message: String },

    /// HTTP-level failure talking to the node.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The node answered with something we could not interpret.
    #[error("invalid response from node: {0}")]
    InvalidResponse(String),

    /// Startup-time misconfiguration. Fatal; never silently defaulted.
    #[error("invalid chain configuration: {0}")]
    Config(String),
}

impl ChainError {
    /// Whether the next idle poll may simply re-attempt the transition.
    ///
    /// False for `ConfirmationTimeout` (the prior hash must be checked
    /// first) and for configuration errors (fatal at startup).
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Submission(_)
            | Self::Reverted { .. }
            | Self::Rpc { .. }
            | Self::Transport(_)
            | Self::InvalidResponse(_) => true,
            Self::ConfirmationTimeout { .. } | Self::Config(_) => false,
        }
    }
}

/// Result type alias for chain operations.
pub type ChainResult<T> = std::result::Result<T, ChainError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classes() {
        assert!(ChainError::Submission("boom".into()).is_retryable());
        assert!(ChainError::Reverted {
            hash: B256::ZERO,
            block_number: 1
        }
        .is_retryable());
        assert!(ChainError::Rpc {
            code: -32000,
            message: "underpriced".into()
        }
        .is_retryable());

        let pending = PendingTransaction::new(B256::ZERO, 0);
        assert!(!ChainError::ConfirmationTimeout {
            pending,
            timeout_secs: 60
        }
        .is_retryable());
        assert!(!ChainError::Config("bad address".into()).is_retryable());
    }
}
