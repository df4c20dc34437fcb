//! Transaction backend trait.
//!
//! Trait-based abstraction over the ledger so the executor and controller
//! can be driven against a mock in tests and against the real JSON-RPC
//! backend in production.

use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use alloy::primitives::Address;
use aurum_core::{PendingTransaction, TransactionRecord};

use crate::error::ChainResult;

/// Boxed future for dyn-compatible async trait methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn std::future::Future<Output = T> + Send + 'a>>;

/// Exclusive interface to the ledger.
///
/// The backend wraps account, nonce, and gas concerns: it holds the signing
/// credential and the fixed transaction options, and is the only component
/// that ever broadcasts.
pub trait TransactionBackend: Send + Sync {
    /// Address of the signing account.
    fn signer_address(&self) -> Address;

    /// Next usable nonce for the given account, reflecting the latest known
    /// on-chain count.
    fn next_nonce(&self, address: Address) -> BoxFuture<'_, ChainResult<u64>>;

    /// Build, sign, and broadcast `executeRebalance(to_stable)` with the
    /// given nonce. Returns immediately with a pending handle, not a
    /// confirmation. Never partially signs.
    fn submit(&self, to_stable: bool, nonce: u64) -> BoxFuture<'_, ChainResult<PendingTransaction>>;

    /// Block until the transaction is included in a finalized block or the
    /// timeout elapses.
    fn await_confirmation(
        &self,
        pending: PendingTransaction,
        timeout: Duration,
    ) -> BoxFuture<'_, ChainResult<TransactionRecord>>;

    /// One receipt lookup for a previously submitted transaction. `None`
    /// when the ledger does not (yet) know the hash. Used to resolve an
    /// ambiguous confirmation timeout before anything new is submitted.
    fn check_transaction(
        &self,
        pending: PendingTransaction,
    ) -> BoxFuture<'_, ChainResult<Option<TransactionRecord>>>;
}

/// Arc wrapper for TransactionBackend trait objects.
pub type DynTransactionBackend = Arc<dyn TransactionBackend>;
