//! Allocation, sentiment, and transaction lifecycle types.
//!
//! `Allocation` and `Sentiment` are structurally identical two-state enums
//! but semantically distinct: allocation is where the vault's assets actually
//! sit, sentiment is where the signal says they should sit. Keeping them as
//! separate types makes the desired-vs-actual comparison explicit at every
//! call site.

use crate::error::CoreError;
use alloy::primitives::B256;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// The vault's current actual asset placement.
///
/// Mutated only by the controller, and only after a transaction reaches
/// `TxStatus::Confirmed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Allocation {
    /// Assets sit in the volatile asset.
    RiskOn,
    /// Assets sit in the stable asset.
    RiskOff,
}

impl Allocation {
    /// The `toStable` flag of the on-chain `executeRebalance(bool)` call that
    /// moves the vault *into* this allocation.
    #[must_use]
    pub fn to_stable(&self) -> bool {
        matches!(self, Self::RiskOff)
    }

    /// The opposite allocation.
    #[must_use]
    pub fn opposite(&self) -> Self {
        match self {
            Self::RiskOn => Self::RiskOff,
            Self::RiskOff => Self::RiskOn,
        }
    }
}

impl std::fmt::Display for Allocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RiskOn => write!(f, "RISK_ON"),
            Self::RiskOff => write!(f, "RISK_OFF"),
        }
    }
}

impl FromStr for Allocation {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "risk_on" => Ok(Self::RiskOn),
            "risk_off" => Ok(Self::RiskOff),
            other => Err(CoreError::InvalidAllocation(other.to_string())),
        }
    }
}

/// The externally observed signal: where the market says the vault should be.
///
/// Produced fresh on every poll and never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sentiment {
    RiskOn,
    RiskOff,
}

impl Sentiment {
    /// The allocation this sentiment asks for.
    #[must_use]
    pub fn desired_allocation(&self) -> Allocation {
        match self {
            Self::RiskOn => Allocation::RiskOn,
            Self::RiskOff => Allocation::RiskOff,
        }
    }

    /// Whether this sentiment agrees with the given actual allocation.
    #[must_use]
    pub fn agrees_with(&self, allocation: Allocation) -> bool {
        self.desired_allocation() == allocation
    }
}

impl std::fmt::Display for Sentiment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RiskOn => write!(f, "RISK_ON"),
            Self::RiskOff => write!(f, "RISK_OFF"),
        }
    }
}

/// A single requested transition.
///
/// Created by the controller when sentiment disagrees with the current
/// allocation, consumed exactly once by the executor, never mutated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RebalanceIntent {
    /// Allocation the vault should move to.
    pub target: Allocation,
    /// When the controller decided to transition.
    pub requested_at: DateTime<Utc>,
}

impl RebalanceIntent {
    /// Create an intent targeting the given allocation, stamped now.
    #[must_use]
    pub fn new(target: Allocation) -> Self {
        Self {
            target,
            requested_at: Utc::now(),
        }
    }

    /// The `toStable` flag for the on-chain call this intent maps to.
    #[must_use]
    pub fn to_stable(&self) -> bool {
        self.target.to_stable()
    }
}

/// Handle for a broadcast transaction whose outcome is not yet known.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingTransaction {
    /// Transaction hash as returned by the node.
    pub hash: B256,
    /// Nonce the transaction was signed with.
    pub nonce: u64,
    /// When the transaction was broadcast.
    pub submitted_at: DateTime<Utc>,
}

impl PendingTransaction {
    /// Create a handle for a just-broadcast transaction.
    #[must_use]
    pub fn new(hash: B256, nonce: u64) -> Self {
        Self {
            hash,
            nonce,
            submitted_at: Utc::now(),
        }
    }
}

/// Terminal and non-terminal transaction states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TxStatus {
    /// Broadcast, not yet included in a finalized block.
    Pending,
    /// Included and executed successfully.
    Confirmed,
    /// Included but execution reverted.
    Failed,
}

impl std::fmt::Display for TxStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "PENDING"),
            Self::Confirmed => write!(f, "CONFIRMED"),
            Self::Failed => write!(f, "FAILED"),
        }
    }
}

/// Volatile audit record of one transaction attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransactionRecord {
    /// Transaction hash.
    pub hash: B256,
    /// Nonce the transaction was signed with.
    pub nonce: u64,
    /// When the transaction was broadcast.
    pub submitted_at: DateTime<Utc>,
    /// Current status.
    pub status: TxStatus,
    /// Block the transaction landed in, once known.
    pub block_number: Option<u64>,
}

impl TransactionRecord {
    /// Record for a confirmed transaction.
    #[must_use]
    pub fn confirmed(pending: PendingTransaction, block_number: u64) -> Self {
        Self {
            hash: pending.hash,
            nonce: pending.nonce,
            submitted_at: pending.submitted_at,
            status: TxStatus::Confirmed,
            block_number: Some(block_number),
        }
    }

    /// Record for a transaction that was included but reverted.
    #[must_use]
    pub fn failed(pending: PendingTransaction, block_number: u64) -> Self {
        Self {
            hash: pending.hash,
            nonce: pending.nonce,
            submitted_at: pending.submitted_at,
            status: TxStatus::Failed,
            block_number: Some(block_number),
        }
    }

    /// Whether the transaction executed successfully on-chain.
    #[must_use]
    pub fn is_confirmed(&self) -> bool {
        self.status == TxStatus::Confirmed
    }
}
