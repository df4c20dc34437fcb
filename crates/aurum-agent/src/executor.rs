//! Rebalance executor.
//!
//! Turns one `RebalanceIntent` into exactly one on-chain transaction attempt:
//! fetch nonce, submit, await finality. No retries live here; the controller
//! owns retry policy so nonce reuse logic stays in one place.

use std::time::Duration;

use aurum_chain::{ChainResult, DynTransactionBackend};
use aurum_core::{RebalanceIntent, TransactionRecord};
use tracing::info;

/// Single-shot transition executor.
pub struct RebalanceExecutor {
    backend: DynTransactionBackend,
    confirm_timeout: Duration,
}

impl RebalanceExecutor {
    /// Create an executor over the given backend with a bounded
    /// confirmation wait.
    #[must_use]
    pub fn new(backend: DynTransactionBackend, confirm_timeout: Duration) -> Self {
        Self {
            backend,
            confirm_timeout,
        }
    }

    /// Execute one transition: exactly one submission attempt, success or
    /// revert, blocking the caller for the full submit+confirm window.
    pub async fn execute(&self, intent: RebalanceIntent) -> ChainResult<TransactionRecord> {
        let signer = self.backend.signer_address();
        let nonce = self.backend.next_nonce(signer).await?;

        let pending = self.backend.submit(intent.to_stable(), nonce).await?;
        info!(
            hash = %pending.hash,
            nonce,
            target = %intent.target,
            "Rebalance transaction submitted"
        );

        let record = self
            .backend
            .await_confirmation(pending, self.confirm_timeout)
            .await?;
        info!(
            hash = %record.hash,
            block_number = record.block_number,
            target = %intent.target,
            "Rebalance confirmed"
        );

        Ok(record)
    }

    /// The backend this executor submits through.
    #[must_use]
    pub fn backend(&self) -> &DynTransactionBackend {
        &self.backend
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use aurum_chain::{ChainError, MockBackend, MockOutcome};
    use aurum_core::{Allocation, TxStatus};

    use super::*;

    fn executor_with(backend: Arc<MockBackend>) -> RebalanceExecutor {
        RebalanceExecutor::new(backend, Duration::from_secs(60))
    }

    #[tokio::test]
    async fn test_execute_risk_off_maps_to_stable() {
        let backend = Arc::new(MockBackend::new(10));
        backend.push_outcome(MockOutcome::Confirm { block_number: 77 });

        let executor = executor_with(Arc::clone(&backend));
        let record = executor
            .execute(RebalanceIntent::new(Allocation::RiskOff))
            .await
            .unwrap();

        assert_eq!(record.status, TxStatus::Confirmed);
        assert_eq!(record.nonce, 10);
        assert_eq!(record.block_number, Some(77));

        let submissions = backend.submissions();
        assert_eq!(submissions.len(), 1);
        assert!(submissions[0].to_stable);
        assert_eq!(submissions[0].nonce, 10);
    }

    #[tokio::test]
    async fn test_execute_risk_on_maps_from_stable() {
        let backend = Arc::new(MockBackend::new(0));
        backend.push_outcome(MockOutcome::Confirm { block_number: 1 });

        let executor = executor_with(Arc::clone(&backend));
        executor
            .execute(RebalanceIntent::new(Allocation::RiskOn))
            .await
            .unwrap();

        assert!(!backend.submissions()[0].to_stable);
    }

    #[tokio::test]
    async fn test_execute_is_single_shot_on_failure() {
        let backend = Arc::new(MockBackend::new(0));
        backend.push_outcome(MockOutcome::FailSubmission("node down".to_string()));

        let executor = executor_with(Arc::clone(&backend));
        let err = executor
            .execute(RebalanceIntent::new(Allocation::RiskOff))
            .await
            .unwrap_err();

        assert!(matches!(err, ChainError::Submission(_)));
        // No hidden retry happened.
        assert!(backend.submissions().is_empty());
    }

    #[tokio::test]
    async fn test_execute_surfaces_timeout_with_pending() {
        let backend = Arc::new(MockBackend::new(4));
        backend.push_outcome(MockOutcome::Timeout);

        let executor = executor_with(Arc::clone(&backend));
        let err = executor
            .execute(RebalanceIntent::new(Allocation::RiskOff))
            .await
            .unwrap_err();

        match err {
            ChainError::ConfirmationTimeout { pending, .. } => {
                assert_eq!(pending.nonce, 4);
                assert_eq!(pending.hash, MockBackend::hash_for_nonce(4));
            }
            other => panic!("expected ConfirmationTimeout, got {other}"),
        }
        // The one submission stands; nothing was re-broadcast.
        assert_eq!(backend.submissions().len(), 1);
    }
}
