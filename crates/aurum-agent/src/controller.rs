//! Rebalance controller.
//!
//! The state machine that owns the agent's view of the vault: current
//! allocation, the transitioning marker, and the unresolved-timeout slot.
//! A single logical poll loop drives it; nothing else mutates agent state,
//! which is what makes the at-most-one-in-flight invariant hold without
//! locking.

use std::time::Duration;

use alloy::primitives::B256;
use aurum_chain::ChainError;
use aurum_core::{Allocation, PendingTransaction, RebalanceIntent, TransactionRecord};
use aurum_signal::DynSignalSource;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::executor::RebalanceExecutor;

/// A transaction whose confirmation timed out: it may or may not still land.
/// Parked until the ledger answers, so it is never blindly re-submitted.
struct UnresolvedTransition {
    pending: PendingTransaction,
    target: Allocation,
    polls_waited: u32,
}

/// Operator-visible snapshot of controller state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControllerStatus {
    /// Where the controller believes the vault's assets sit.
    pub allocation: Allocation,
    /// Whether an executor call is currently outstanding.
    pub transitioning: bool,
    /// Hash of a timed-out transaction awaiting resolution, if any.
    pub unresolved_hash: Option<B256>,
}

/// The rebalancing control loop.
///
/// States mirror `Allocation`, plus an internal transitioning marker that
/// prevents re-entrant submissions while an executor call is outstanding.
/// Sentiment samples taken while transitioning are never observed; only the
/// value read when idle matters, which coalesces rapid oscillation.
pub struct RebalanceController {
    signal: DynSignalSource,
    executor: RebalanceExecutor,
    allocation: Allocation,
    transitioning: bool,
    unresolved: Option<UnresolvedTransition>,
    /// Volatile audit trail of every terminal transaction outcome.
    history: Vec<TransactionRecord>,
    poll_interval: Duration,
    timeout_resolution_polls: u32,
}

impl RebalanceController {
    /// Create a controller.
    ///
    /// `initial_allocation` is assumed, not queried from the ledger; callers
    /// must validate it against actual vault state before first use.
    #[must_use]
    pub fn new(
        signal: DynSignalSource,
        executor: RebalanceExecutor,
        initial_allocation: Allocation,
        poll_interval: Duration,
        timeout_resolution_polls: u32,
    ) -> Self {
        Self {
            signal,
            executor,
            allocation: initial_allocation,
            transitioning: false,
            unresolved: None,
            history: Vec::new(),
            poll_interval,
            timeout_resolution_polls,
        }
    }

    /// Current believed allocation.
    #[must_use]
    pub fn allocation(&self) -> Allocation {
        self.allocation
    }

    /// Operator-visible status snapshot.
    #[must_use]
    pub fn status(&self) -> ControllerStatus {
        ControllerStatus {
            allocation: self.allocation,
            transitioning: self.transitioning,
            unresolved_hash: self.unresolved.as_ref().map(|u| u.pending.hash),
        }
    }

    /// Terminal transaction outcomes observed so far.
    #[must_use]
    pub fn history(&self) -> &[TransactionRecord] {
        &self.history
    }

    /// Run the poll loop until cancelled.
    ///
    /// Cancellation is cooperative: it stops new polls but an in-flight
    /// `poll_once` (and therefore an in-flight submit+confirm) always runs
    /// to completion or its bounded timeout. A submitted transaction is
    /// never abandoned with unknown outcome.
    pub async fn run(&mut self, cancel: CancellationToken) {
        let mut interval = tokio::time::interval(self.poll_interval);
        // A slow confirm should not cause a burst of catch-up polls.
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(
            allocation = %self.allocation,
            poll_interval_secs = self.poll_interval.as_secs(),
            "Controller started"
        );

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    self.poll_once().await;
                }
                _ = cancel.cancelled() => {
                    info!("Shutdown requested, stopping poll loop");
                    break;
                }
            }
        }

        info!(
            allocation = %self.allocation,
            transitions = self.history.len(),
            "Controller stopped"
        );
    }

    /// One poll cycle of the state machine.
    ///
    /// Public so tests can drive the machine deterministically with scripted
    /// sources and mock backends instead of real sleeps.
    pub async fn poll_once(&mut self) {
        // An unresolved timed-out transaction blocks all new decisions until
        // the ledger answers or the wait budget runs out.
        if self.unresolved.is_some() && !self.resolve_unresolved().await {
            return;
        }

        let sentiment = match self.signal.sample() {
            Ok(s) => s,
            Err(e) => {
                warn!(
                    error = %e,
                    allocation = %self.allocation,
                    "Signal unavailable, holding current state"
                );
                return;
            }
        };
        info!(%sentiment, allocation = %self.allocation, "Sentiment observed");

        if sentiment.agrees_with(self.allocation) {
            debug!(allocation = %self.allocation, "Steady state, no transition");
            return;
        }

        let intent = RebalanceIntent::new(sentiment.desired_allocation());
        info!(target = %intent.target, from = %self.allocation, "Transition initiated");

        self.transitioning = true;
        let result = self.executor.execute(intent).await;
        self.transitioning = false;

        match result {
            Ok(record) => {
                self.allocation = intent.target;
                self.history.push(record);
                info!(
                    allocation = %self.allocation,
                    hash = %record.hash,
                    block_number = record.block_number,
                    "Allocation updated"
                );
            }
            Err(ChainError::ConfirmationTimeout {
                pending,
                timeout_secs,
            }) => {
                // Outcome unknown: the transaction may still confirm. State
                // stays at the pre-transition allocation and the hash is
                // parked for resolution before any new submission.
                warn!(
                    hash = %pending.hash,
                    timeout_secs,
                    allocation = %self.allocation,
                    "Confirmation timed out, parking hash for resolution"
                );
                self.unresolved = Some(UnresolvedTransition {
                    pending,
                    target: intent.target,
                    polls_waited: 0,
                });
            }
            Err(e) => {
                // Submission failures, reverts, and transport faults leave
                // on-chain state unchanged; the next idle poll re-attempts
                // if sentiment still disagrees.
                warn!(
                    error = %e,
                    retryable = e.is_retryable(),
                    allocation = %self.allocation,
                    "Transition failed, allocation unchanged"
                );
            }
        }
    }

    /// Check the ledger for a parked timed-out transaction.
    ///
    /// Returns true when the slot is cleared and normal decisions may resume
    /// this poll; false while the outcome is still ambiguous.
    async fn resolve_unresolved(&mut self) -> bool {
        let Some(mut unresolved) = self.unresolved.take() else {
            return true;
        };

        match self
            .executor
            .backend()
            .check_transaction(unresolved.pending)
            .await
        {
            Ok(Some(record)) if record.is_confirmed() => {
                self.allocation = unresolved.target;
                self.history.push(record);
                info!(
                    hash = %record.hash,
                    block_number = record.block_number,
                    allocation = %self.allocation,
                    "Timed-out transaction confirmed on-chain, adopting transition"
                );
                true
            }
            Ok(Some(record)) => {
                self.history.push(record);
                warn!(
                    hash = %record.hash,
                    allocation = %self.allocation,
                    "Timed-out transaction reverted, allocation unchanged"
                );
                true
            }
            Ok(None) => {
                unresolved.polls_waited += 1;
                if unresolved.polls_waited >= self.timeout_resolution_polls {
                    warn!(
                        hash = %unresolved.pending.hash,
                        polls = unresolved.polls_waited,
                        "Transaction never appeared on-chain, treating as dropped"
                    );
                    true
                } else {
                    debug!(
                        hash = %unresolved.pending.hash,
                        polls = unresolved.polls_waited,
                        "Transaction outcome still unknown, waiting"
                    );
                    self.unresolved = Some(unresolved);
                    false
                }
            }
            Err(e) => {
                warn!(
                    error = %e,
                    hash = %unresolved.pending.hash,
                    "Could not query unresolved transaction, will retry"
                );
                self.unresolved = Some(unresolved);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use aurum_chain::{MockBackend, MockOutcome};
    use aurum_core::{Sentiment, TxStatus};
    use aurum_signal::ScriptedSource;

    use super::*;

    fn controller(
        script: Vec<Sentiment>,
        backend: Arc<MockBackend>,
        initial: Allocation,
    ) -> RebalanceController {
        RebalanceController::new(
            Arc::new(ScriptedSource::new(script)),
            RebalanceExecutor::new(backend, Duration::from_secs(60)),
            initial,
            Duration::from_secs(10),
            3,
        )
    }

    #[tokio::test]
    async fn test_steady_state_never_submits() {
        let backend = Arc::new(MockBackend::new(0));
        let mut ctrl = controller(
            vec![Sentiment::RiskOn; 5],
            Arc::clone(&backend),
            Allocation::RiskOn,
        );

        for _ in 0..5 {
            ctrl.poll_once().await;
        }

        assert!(backend.submissions().is_empty());
        assert_eq!(ctrl.allocation(), Allocation::RiskOn);
        assert!(ctrl.history().is_empty());
    }

    #[tokio::test]
    async fn test_single_transition_on_disagreement() {
        // Allocation=RISK_ON, sentiment [RISK_ON, RISK_ON, RISK_OFF]:
        // exactly one execute, targeting RISK_OFF.
        let backend = Arc::new(MockBackend::new(0));
        backend.push_outcome(MockOutcome::Confirm { block_number: 12 });
        let mut ctrl = controller(
            vec![Sentiment::RiskOn, Sentiment::RiskOn, Sentiment::RiskOff],
            Arc::clone(&backend),
            Allocation::RiskOn,
        );

        for _ in 0..3 {
            ctrl.poll_once().await;
        }

        let submissions = backend.submissions();
        assert_eq!(submissions.len(), 1);
        assert!(submissions[0].to_stable);
        assert_eq!(ctrl.allocation(), Allocation::RiskOff);
        assert_eq!(ctrl.history().len(), 1);
        assert_eq!(ctrl.history()[0].status, TxStatus::Confirmed);
        assert_eq!(backend.max_in_flight(), 1);
    }

    #[tokio::test]
    async fn test_submission_failure_holds_state_then_retries() {
        let backend = Arc::new(MockBackend::new(0));
        backend.push_outcome(MockOutcome::FailSubmission("node down".to_string()));
        backend.push_outcome(MockOutcome::Confirm { block_number: 5 });
        let mut ctrl = controller(
            vec![Sentiment::RiskOff, Sentiment::RiskOff],
            Arc::clone(&backend),
            Allocation::RiskOn,
        );

        ctrl.poll_once().await;
        assert_eq!(ctrl.allocation(), Allocation::RiskOn);
        assert!(backend.submissions().is_empty());

        // Next poll re-attempts the same target and succeeds.
        ctrl.poll_once().await;
        assert_eq!(ctrl.allocation(), Allocation::RiskOff);
        assert_eq!(backend.submissions().len(), 1);
    }

    #[tokio::test]
    async fn test_revert_holds_state_then_retries() {
        let backend = Arc::new(MockBackend::new(0));
        backend.push_outcome(MockOutcome::Revert { block_number: 3 });
        backend.push_outcome(MockOutcome::Confirm { block_number: 4 });
        let mut ctrl = controller(
            vec![Sentiment::RiskOff, Sentiment::RiskOff],
            Arc::clone(&backend),
            Allocation::RiskOn,
        );

        ctrl.poll_once().await;
        assert_eq!(ctrl.allocation(), Allocation::RiskOn);

        ctrl.poll_once().await;
        assert_eq!(ctrl.allocation(), Allocation::RiskOff);
        // Two submissions total: the reverted one and the retry.
        assert_eq!(backend.submissions().len(), 2);
        // The reverted attempt consumed its nonce; the retry used the next.
        assert_eq!(backend.submissions()[0].nonce, 0);
        assert_eq!(backend.submissions()[1].nonce, 1);
    }

    #[tokio::test]
    async fn test_timeout_parks_hash_and_blocks_new_submissions() {
        let backend = Arc::new(MockBackend::new(7));
        backend.push_outcome(MockOutcome::Timeout);
        let mut ctrl = controller(
            vec![Sentiment::RiskOff; 4],
            Arc::clone(&backend),
            Allocation::RiskOn,
        );

        // Not optimistically advanced.
        ctrl.poll_once().await;
        assert_eq!(ctrl.allocation(), Allocation::RiskOn);
        let status = ctrl.status();
        assert_eq!(
            status.unresolved_hash,
            Some(MockBackend::hash_for_nonce(7))
        );

        // While unresolved and the ledger does not know the hash, no new
        // submission happens.
        ctrl.poll_once().await;
        assert_eq!(backend.submissions().len(), 1);
        assert!(ctrl.status().unresolved_hash.is_some());
    }

    #[tokio::test]
    async fn test_timed_out_transaction_later_confirms() {
        let backend = Arc::new(MockBackend::new(7));
        backend.push_outcome(MockOutcome::Timeout);
        let mut ctrl = controller(
            vec![Sentiment::RiskOff; 3],
            Arc::clone(&backend),
            Allocation::RiskOn,
        );

        ctrl.poll_once().await;
        assert_eq!(ctrl.allocation(), Allocation::RiskOn);

        // The ledger now reports the transaction as mined and successful.
        backend.set_resolution(
            MockBackend::hash_for_nonce(7),
            Some((TxStatus::Confirmed, 120)),
        );
        ctrl.poll_once().await;

        // Transition adopted without a second submission.
        assert_eq!(ctrl.allocation(), Allocation::RiskOff);
        assert_eq!(backend.submissions().len(), 1);
        assert!(ctrl.status().unresolved_hash.is_none());
        assert_eq!(ctrl.history().len(), 1);
        assert_eq!(ctrl.history()[0].block_number, Some(120));
    }

    #[tokio::test]
    async fn test_dropped_transaction_clears_after_wait_budget() {
        let backend = Arc::new(MockBackend::new(7));
        backend.push_outcome(MockOutcome::Timeout);
        // After the budget clears, the re-attempt succeeds.
        backend.push_outcome(MockOutcome::Confirm { block_number: 9 });
        let mut ctrl = controller(
            vec![Sentiment::RiskOff; 6],
            Arc::clone(&backend),
            Allocation::RiskOn,
        );

        ctrl.poll_once().await; // timeout, parked
        ctrl.poll_once().await; // unknown, wait 1
        ctrl.poll_once().await; // unknown, wait 2
        assert!(ctrl.status().unresolved_hash.is_some());
        assert_eq!(backend.submissions().len(), 1);

        // Third unknown check hits the budget (3): cleared, and the same
        // poll re-evaluates sentiment and submits again.
        ctrl.poll_once().await;
        assert!(ctrl.status().unresolved_hash.is_none());
        assert_eq!(backend.submissions().len(), 2);
        assert_eq!(ctrl.allocation(), Allocation::RiskOff);
    }

    #[tokio::test]
    async fn test_signal_unavailable_holds_state() {
        let backend = Arc::new(MockBackend::new(0));
        // Empty script: every sample is Unavailable.
        let mut ctrl = controller(vec![], Arc::clone(&backend), Allocation::RiskOff);

        for _ in 0..3 {
            ctrl.poll_once().await;
        }

        assert!(backend.submissions().is_empty());
        assert_eq!(ctrl.allocation(), Allocation::RiskOff);
    }

    #[tokio::test]
    async fn test_oscillation_reevaluated_against_new_allocation() {
        // After a confirmed transition to RISK_OFF, a fresh RISK_ON reading
        // is a new disagreement and transitions back; sentiment during the
        // first transition was never observed.
        let backend = Arc::new(MockBackend::new(0));
        backend.push_outcome(MockOutcome::Confirm { block_number: 1 });
        backend.push_outcome(MockOutcome::Confirm { block_number: 2 });
        let mut ctrl = controller(
            vec![Sentiment::RiskOff, Sentiment::RiskOn],
            Arc::clone(&backend),
            Allocation::RiskOn,
        );

        ctrl.poll_once().await;
        assert_eq!(ctrl.allocation(), Allocation::RiskOff);

        ctrl.poll_once().await;
        assert_eq!(ctrl.allocation(), Allocation::RiskOn);

        let submissions = backend.submissions();
        assert_eq!(submissions.len(), 2);
        assert!(submissions[0].to_stable);
        assert!(!submissions[1].to_stable);
        assert_eq!(backend.max_in_flight(), 1);
    }

    #[tokio::test]
    async fn test_idle_status_reports_not_transitioning() {
        let backend = Arc::new(MockBackend::new(0));
        let ctrl = controller(vec![], backend, Allocation::RiskOn);

        let status = ctrl.status();
        assert_eq!(status.allocation, Allocation::RiskOn);
        assert!(!status.transitioning);
        assert!(status.unresolved_hash.is_none());
    }

    #[tokio::test]
    async fn test_run_stops_on_cancellation() {
        let backend = Arc::new(MockBackend::new(0));
        let mut ctrl = controller(
            vec![Sentiment::RiskOn; 2],
            Arc::clone(&backend),
            Allocation::RiskOn,
        );

        let cancel = CancellationToken::new();
        cancel.cancel();
        // Already-cancelled token: the loop exits without polling forever.
        ctrl.run(cancel).await;
        assert_eq!(ctrl.allocation(), Allocation::RiskOn);
    }
}
