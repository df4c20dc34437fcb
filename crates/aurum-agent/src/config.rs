//! Application configuration.
//!
//! All configuration is an explicit struct passed into constructors; there
//! are no process-wide values loaded at import time. Loaded once at startup
//! and validated fail-fast.

use std::path::Path;
use std::time::Duration;

use aurum_chain::ChainConfig;
use aurum_core::{Allocation, Sentiment};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};

/// Which concrete sentiment source to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignalKind {
    /// Wall-clock toggle simulation (demo stand-in for a real oracle feed).
    #[default]
    Simulated,
    /// Pre-recorded sequence, then unavailable. For dry runs.
    Scripted,
}

/// Sentiment source configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignalConfig {
    /// Source kind.
    #[serde(default)]
    pub kind: SignalKind,
    /// Full toggle period for the simulated source (seconds).
    #[serde(default = "default_toggle_period_secs")]
    pub toggle_period_secs: u64,
    /// Playback sequence for the scripted source.
    #[serde(default)]
    pub script: Vec<Sentiment>,
}

fn default_toggle_period_secs() -> u64 {
    120
}

impl Default for SignalConfig {
    fn default() -> Self {
        Self {
            kind: SignalKind::Simulated,
            toggle_period_secs: default_toggle_period_secs(),
            script: Vec::new(),
        }
    }
}

/// Application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Poll cadence (seconds).
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
    /// Allocation the vault is assumed to hold at startup. The operator must
    /// validate this against actual vault state before first use.
    #[serde(default = "default_initial_allocation")]
    pub initial_allocation: Allocation,
    /// Ceiling on waiting for transaction finality (seconds).
    #[serde(default = "default_confirm_timeout_secs")]
    pub confirm_timeout_secs: u64,
    /// After a confirmation timeout, how many polls to keep re-checking the
    /// unresolved hash before treating the transaction as dropped.
    #[serde(default = "default_timeout_resolution_polls")]
    pub timeout_resolution_polls: u32,
    /// Sentiment source.
    #[serde(default)]
    pub signal: SignalConfig,
    /// Ledger backend.
    pub chain: ChainConfig,
}

fn default_poll_interval_secs() -> u64 {
    10
}

fn default_initial_allocation() -> Allocation {
    Allocation::RiskOn
}

fn default_confirm_timeout_secs() -> u64 {
    60
}

fn default_timeout_resolution_polls() -> u32 {
    6
}

impl AgentConfig {
    /// Load from a specific file.
    pub fn from_file(path: &str) -> AppResult<Self> {
        if !Path::new(path).exists() {
            return Err(AppError::Config(format!("config file not found: {path}")));
        }
        let content = std::fs::read_to_string(path)
            .map_err(|e| AppError::Config(format!("Failed to read config: {e}")))?;

        let config: Self = toml::from_str(&content)
            .map_err(|e| AppError::Config(format!("Failed to parse config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Fail-fast startup validation.
    pub fn validate(&self) -> AppResult<()> {
        if self.poll_interval_secs == 0 {
            return Err(AppError::Config(
                "poll_interval_secs must be non-zero".to_string(),
            ));
        }
        if self.confirm_timeout_secs == 0 {
            return Err(AppError::Config(
                "confirm_timeout_secs must be non-zero".to_string(),
            ));
        }
        if self.signal.kind == SignalKind::Simulated && self.signal.toggle_period_secs == 0 {
            return Err(AppError::Config(
                "signal.toggle_period_secs must be non-zero".to_string(),
            ));
        }
        self.chain.validate()?;
        Ok(())
    }

    /// Poll cadence as a `Duration`.
    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    /// Confirmation ceiling as a `Duration`.
    #[must_use]
    pub fn confirm_timeout(&self) -> Duration {
        Duration::from_secs(self.confirm_timeout_secs)
    }
}
