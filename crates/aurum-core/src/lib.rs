//! Core domain types for the Aurum rebalancing agent.
//!
//! This crate provides the fundamental types shared across the agent:
//! - `Allocation`: which side of the vault the assets actually sit on
//! - `Sentiment`: the externally observed desired allocation
//! - `RebalanceIntent`: a single requested transition, consumed once
//! - `PendingTransaction`, `TransactionRecord`: the submission audit trail

pub mod error;
pub mod types;

pub use error::{CoreError, Result};
pub use types::{Allocation, PendingTransaction, RebalanceIntent, Sentiment, TransactionRecord, TxStatus};
