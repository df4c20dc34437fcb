//! Ledger backend for the Aurum rebalancing agent.
//!
//! This crate is the exclusive interface to the chain: it builds, signs, and
//! broadcasts the vault's `executeRebalance(bool)` call and interprets
//! confirmation. Everything above it talks to the `TransactionBackend` trait,
//! so the EVM JSON-RPC implementation and the test mock are interchangeable.

pub mod backend;
pub mod config;
pub mod error;
pub mod evm;
pub mod keys;
pub mod mock;
pub mod rpc;

pub use backend::{BoxFuture, DynTransactionBackend, TransactionBackend};
pub use config::ChainConfig;
pub use error::{ChainError, ChainResult};
pub use evm::EvmBackend;
pub use keys::{KeyError, KeyManager, KeySource};
pub use mock::{MockBackend, MockOutcome};
pub use rpc::RpcClient;
