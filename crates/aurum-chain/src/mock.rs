//! Mock transaction backend for testing.
//!
//! Records every submission, plays back scripted outcomes, and tracks how
//! many submit/confirm spans are ever outstanding at once so tests can
//! assert the single-in-flight invariant.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

use alloy::primitives::{Address, B256, U256};
use parking_lot::Mutex;

use aurum_core::{PendingTransaction, TransactionRecord, TxStatus};

use crate::backend::{BoxFuture, TransactionBackend};
use crate::error::{ChainError, ChainResult};

/// Scripted outcome of one submit/confirm cycle.
#[derive(Debug, Clone)]
pub enum MockOutcome {
    /// Submission and confirmation both succeed.
    Confirm { block_number: u64 },
    /// Broadcast fails; no transaction exists afterwards.
    FailSubmission(String),
    /// Inclusion succeeds but execution reverts.
    Revert { block_number: u64 },
    /// Confirmation does not arrive within the bound.
    Timeout,
}

/// Recorded submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordedSubmit {
    pub to_stable: bool,
    pub nonce: u64,
}

/// Scriptable in-memory backend.
pub struct MockBackend {
    address: Address,
    nonce: AtomicU64,
    outcomes: Mutex<VecDeque<MockOutcome>>,
    submissions: Mutex<Vec<RecordedSubmit>>,
    /// Pending hash -> outcome to report from `check_transaction`.
    resolutions: Mutex<HashMap<B256, Option<(TxStatus, u64)>>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl MockBackend {
    /// Create a mock backend with the given starting nonce.
    #[must_use]
    pub fn new(start_nonce: u64) -> Self {
        Self {
            address: Address::repeat_byte(0xa9),
            nonce: AtomicU64::new(start_nonce),
            outcomes: Mutex::new(VecDeque::new()),
            submissions: Mutex::new(Vec::new()),
            resolutions: Mutex::new(HashMap::new()),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    /// Queue the outcome for the next submit/confirm cycle.
    pub fn push_outcome(&self, outcome: MockOutcome) {
        self.outcomes.lock().push_back(outcome);
    }

    /// All submissions recorded so far.
    pub fn submissions(&self) -> Vec<RecordedSubmit> {
        self.submissions.lock().clone()
    }

    /// Set what `check_transaction` reports for a hash. `None` means the
    /// ledger does not know it.
    pub fn set_resolution(&self, hash: B256, resolution: Option<(TxStatus, u64)>) {
        self.resolutions.lock().insert(hash, resolution);
    }

    /// High-water mark of concurrently outstanding submit/confirm spans.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    /// Deterministic hash for a given nonce.
    #[must_use]
    pub fn hash_for_nonce(nonce: u64) -> B256 {
        B256::from(U256::from(nonce))
    }

    fn enter_flight(&self) {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
    }

    fn exit_flight(&self) {
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

impl TransactionBackend for MockBackend {
    fn signer_address(&self) -> Address {
        self.address
    }

    fn next_nonce(&self, _address: Address) -> BoxFuture<'_, ChainResult<u64>> {
        Box::pin(async move { Ok(self.nonce.load(Ordering::SeqCst)) })
    }

    fn submit(&self, to_stable: bool, nonce: u64) -> BoxFuture<'_, ChainResult<PendingTransaction>> {
        Box::pin(async move {
            let outcome = self
                .outcomes
                .lock()
                .front()
                .cloned()
                .unwrap_or(MockOutcome::Confirm { block_number: 1 });

            if let MockOutcome::FailSubmission(reason) = outcome {
                self.outcomes.lock().pop_front();
                return Err(ChainError::Submission(reason));
            }

            self.enter_flight();
            self.submissions
                .lock()
                .push(RecordedSubmit { to_stable, nonce });
            Ok(PendingTransaction::new(Self::hash_for_nonce(nonce), nonce))
        })
    }

    fn await_confirmation(
        &self,
        pending: PendingTransaction,
        timeout: Duration,
    ) -> BoxFuture<'_, ChainResult<TransactionRecord>> {
        Box::pin(async move {
            let outcome = self
                .outcomes
                .lock()
                .pop_front()
                .unwrap_or(MockOutcome::Confirm { block_number: 1 });
            self.exit_flight();

            match outcome {
                MockOutcome::Confirm { block_number } => {
                    // A mined transaction consumes the nonce.
                    self.nonce.fetch_add(1, Ordering::SeqCst);
                    Ok(TransactionRecord::confirmed(pending, block_number))
                }
                MockOutcome::Revert { block_number } => {
                    self.nonce.fetch_add(1, Ordering::SeqCst);
                    Err(ChainError::Reverted {
                        hash: pending.hash,
                        block_number,
                    })
                }
                MockOutcome::Timeout => Err(ChainError::ConfirmationTimeout {
                    pending,
                    timeout_secs: timeout.as_secs(),
                }),
                MockOutcome::FailSubmission(reason) => {
                    // Unreachable by construction; submit consumed it.
                    Err(ChainError::Submission(reason))
                }
            }
        })
    }

    fn check_transaction(
        &self,
        pending: PendingTransaction,
    ) -> BoxFuture<'_, ChainResult<Option<TransactionRecord>>> {
        Box::pin(async move {
            let resolution = self
                .resolutions
                .lock()
                .get(&pending.hash)
                .cloned()
                .flatten();
            Ok(resolution.map(|(status, block_number)| match status {
                TxStatus::Failed => TransactionRecord::failed(pending, block_number),
                _ => TransactionRecord::confirmed(pending, block_number),
            }))
        })
    }
}
