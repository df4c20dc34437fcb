//! Chain configuration.
//!
//! Fixed transaction options (chain id, gas limit, gas price) plus the vault
//! address and key source. Supplied once at startup and validated there;
//! never renegotiated per call.

use std::path::PathBuf;
use std::time::Duration;

use alloy::primitives::Address;
use serde::{Deserialize, Serialize};

use crate::error::{ChainError, ChainResult};
use crate::keys::KeySource;

/// Chain backend configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainConfig {
    /// JSON-RPC endpoint of the node.
    pub rpc_url: String,
    /// Chain identifier included in every signed transaction.
    #[serde(default = "default_chain_id")]
    pub chain_id: u64,
    /// Fixed gas limit for the rebalance call.
    #[serde(default = "default_gas_limit")]
    pub gas_limit: u64,
    /// Fixed gas price in wei.
    #[serde(default = "default_gas_price_wei")]
    pub gas_price_wei: u128,
    /// Address of the vault contract exposing `executeRebalance(bool)`.
    pub vault_address: String,
    /// Environment variable holding the hex signing key.
    #[serde(default = "default_key_env_var")]
    pub key_env_var: Option<String>,
    /// File holding the hex signing key. Takes precedence over the env var.
    #[serde(default)]
    pub key_file: Option<PathBuf>,
    /// Expected address of the signing key. If set, the derived address must
    /// match.
    #[serde(default)]
    pub signer_address: Option<String>,
    /// How often to poll for a receipt while awaiting confirmation (ms).
    #[serde(default = "default_receipt_poll_interval_ms")]
    pub receipt_poll_interval_ms: u64,
    /// Ceiling on any single JSON-RPC request (ms).
    #[serde(default = "default_rpc_timeout_ms")]
    pub rpc_timeout_ms: u64,
}

fn default_chain_id() -> u64 {
    209
}

fn default_gas_limit() -> u64 {
    2_000_000
}

fn default_gas_price_wei() -> u128 {
    1_000_000_000 // 1 gwei
}

fn default_key_env_var() -> Option<String> {
    Some("AURUM_AGENT_KEY".to_string())
}

fn default_receipt_poll_interval_ms() -> u64 {
    1_000
}

fn default_rpc_timeout_ms() -> u64 {
    10_000
}

impl ChainConfig {
    /// Parse the configured vault address.
    pub fn vault(&self) -> ChainResult<Address> {
        self.vault_address
            .parse()
            .map_err(|_| ChainError::Config(format!("invalid vault address: {}", self.vault_address)))
    }

    /// Parse the expected signer address, when configured.
    pub fn expected_signer(&self) -> ChainResult<Option<Address>> {
        self.signer_address
            .as_ref()
            .map(|s| {
                s.parse().map_err(|_| {
                    ChainError::Config(format!("invalid signer address: {s}"))
                })
            })
            .transpose()
    }

    /// Resolve the key source. The file takes precedence over the env var.
    pub fn key_source(&self) -> ChainResult<KeySource> {
        if let Some(path) = &self.key_file {
            return Ok(KeySource::File { path: path.clone() });
        }
        if let Some(var_name) = &self.key_env_var {
            return Ok(KeySource::EnvVar {
                var_name: var_name.clone(),
            });
        }
        Err(ChainError::Config(
            "no signing key source: set key_file or key_env_var".to_string(),
        ))
    }

    /// Receipt polling cadence as a `Duration`.
    #[must_use]
    pub fn receipt_poll_interval(&self) -> Duration {
        Duration::from_millis(self.receipt_poll_interval_ms)
    }

    /// Per-request JSON-RPC ceiling as a `Duration`.
    #[must_use]
    pub fn rpc_timeout(&self) -> Duration {
        Duration::from_millis(self.rpc_timeout_ms)
    }

    /// Fail-fast startup validation of every fixed parameter.
    pub fn validate(&self) -> ChainResult<()> {
        if self.rpc_url.is_empty() {
            return Err(ChainError::Config("rpc_url must not be empty".to_string()));
        }
        if self.gas_limit == 0 {
            return Err(ChainError::Config("gas_limit must be non-zero".to_string()));
        }
        if self.gas_price_wei == 0 {
            return Err(ChainError::Config(
                "gas_price_wei must be non-zero".to_string(),
            ));
        }
        if self.receipt_poll_interval_ms == 0 {
            return Err(ChainError::Config(
                "receipt_poll_interval_ms must be non-zero".to_string(),
            ));
        }
        if self.rpc_timeout_ms == 0 {
            return Err(ChainError::Config(
                "rpc_timeout_ms must be non-zero".to_string(),
            ));
        }
        self.vault()?;
        self.expected_signer()?;
        self.key_source()?;
        Ok(())
    }
}
