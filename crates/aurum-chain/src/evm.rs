//! EVM JSON-RPC implementation of `TransactionBackend`.
//!
//! Builds a legacy transaction against the vault's `executeRebalance(bool)`
//! entry point, signs it with the held key, broadcasts it, and polls for the
//! receipt until finality or the caller's deadline.

use std::time::Duration;

use alloy::consensus::{SignableTransaction, TxEnvelope, TxLegacy};
use alloy::eips::eip2718::Encodable2718;
use alloy::network::TxSignerSync;
use alloy::primitives::{Address, Bytes, TxKind, U256};
use alloy::sol;
use alloy::sol_types::SolCall;
use tracing::{debug, info};

use aurum_core::{PendingTransaction, TransactionRecord};

use crate::backend::{BoxFuture, TransactionBackend};
use crate::config::ChainConfig;
use crate::error::{ChainError, ChainResult};
use crate::keys::KeyManager;
use crate::rpc::{Receipt, RpcClient};

sol! {
    /// The entire application-level wire contract with the vault.
    function executeRebalance(bool toStable);
}

/// Real ledger backend: alloy signing over HTTP JSON-RPC.
pub struct EvmBackend {
    rpc: RpcClient,
    keys: KeyManager,
    vault: Address,
    chain_id: u64,
    gas_limit: u64,
    gas_price_wei: u128,
    receipt_poll_interval: Duration,
}

impl EvmBackend {
    /// Build a backend from validated configuration and a loaded key.
    ///
    /// # Errors
    /// Returns `ChainError::Config` when the vault address does not parse;
    /// `validate()` on the config should already have caught that.
    pub fn new(config: &ChainConfig, keys: KeyManager) -> ChainResult<Self> {
        config.validate()?;
        Ok(Self {
            rpc: RpcClient::new(config.rpc_url.clone(), config.rpc_timeout())?,
            vault: config.vault()?,
            chain_id: config.chain_id,
            gas_limit: config.gas_limit,
            gas_price_wei: config.gas_price_wei,
            receipt_poll_interval: config.receipt_poll_interval(),
            keys,
        })
    }

    /// ABI-encode the rebalance call.
    fn calldata(to_stable: bool) -> Bytes {
        executeRebalanceCall { toStable: to_stable }.abi_encode().into()
    }

    /// Sign a legacy transaction and return its raw RLP encoding.
    fn sign_raw(&self, to_stable: bool, nonce: u64) -> ChainResult<Vec<u8>> {
        let mut tx = TxLegacy {
            chain_id: Some(self.chain_id),
            nonce,
            gas_price: self.gas_price_wei,
            gas_limit: self.gas_limit,
            to: TxKind::Call(self.vault),
            value: U256::ZERO,
            input: Self::calldata(to_stable),
        };

        let signature = self
            .keys
            .signer()
            .sign_transaction_sync(&mut tx)
            .map_err(|e| ChainError::Submission(format!("signing failed: {e}")))?;

        let envelope = TxEnvelope::Legacy(tx.into_signed(signature));
        Ok(envelope.encoded_2718())
    }

    /// Interpret a receipt as a terminal outcome.
    fn receipt_outcome(
        pending: PendingTransaction,
        receipt: &Receipt,
    ) -> ChainResult<TransactionRecord> {
        let block_number = receipt.block()?;
        if receipt.succeeded() {
            Ok(TransactionRecord::confirmed(pending, block_number))
        } else {
            Err(ChainError::Reverted {
                hash: pending.hash,
                block_number,
            })
        }
    }
}

impl TransactionBackend for EvmBackend {
    fn signer_address(&self) -> Address {
        self.keys.address()
    }

    fn next_nonce(&self, address: Address) -> BoxFuture<'_, ChainResult<u64>> {
        Box::pin(async move {
            let nonce = self.rpc.transaction_count(address).await?;
            debug!(%address, nonce, "Fetched account nonce");
            Ok(nonce)
        })
    }

    fn submit(&self, to_stable: bool, nonce: u64) -> BoxFuture<'_, ChainResult<PendingTransaction>> {
        Box::pin(async move {
            let raw = self.sign_raw(to_stable, nonce)?;
            let hash = self
                .rpc
                .send_raw_transaction(&raw)
                .await
                .map_err(|e| match e {
                    // Transport and node rejections before inclusion mean
                    // nothing was accepted; fold them into Submission.
                    ChainError::Transport(inner) => {
                        ChainError::Submission(format!("broadcast failed: {inner}"))
                    }
                    ChainError::Rpc { code, message } => {
                        ChainError::Submission(format!("node rejected tx ({code}): {message}"))
                    }
                    other => other,
                })?;

            info!(%hash, nonce, to_stable, "Transaction broadcast");
            Ok(PendingTransaction::new(hash, nonce))
        })
    }

    fn await_confirmation(
        &self,
        pending: PendingTransaction,
        timeout: Duration,
    ) -> BoxFuture<'_, ChainResult<TransactionRecord>> {
        Box::pin(async move {
            let deadline = tokio::time::Instant::now() + timeout;
            let timed_out = || {
                Err(ChainError::ConfirmationTimeout {
                    pending,
                    timeout_secs: timeout.as_secs(),
                })
            };

            loop {
                // Each poll is capped by the remaining budget so a node that
                // accepts the connection and goes silent cannot hold this
                // call past the caller's ceiling.
                let remaining = deadline.saturating_duration_since(tokio::time::Instant::now());
                if remaining.is_zero() {
                    return timed_out();
                }

                match tokio::time::timeout(remaining, self.rpc.transaction_receipt(pending.hash))
                    .await
                {
                    Ok(Ok(Some(receipt))) => return Self::receipt_outcome(pending, &receipt),
                    Ok(Ok(None)) => {
                        debug!(hash = %pending.hash, "No receipt yet");
                    }
                    // Transient poll failures do not decide the outcome;
                    // keep polling until the deadline.
                    Ok(Err(e)) => {
                        debug!(hash = %pending.hash, error = %e, "Receipt poll failed, retrying");
                    }
                    Err(_) => return timed_out(),
                }

                let remaining = deadline.saturating_duration_since(tokio::time::Instant::now());
                if remaining.is_zero() {
                    return timed_out();
                }
                tokio::time::sleep(self.receipt_poll_interval.min(remaining)).await;
            }
        })
    }

    fn check_transaction(
        &self,
        pending: PendingTransaction,
    ) -> BoxFuture<'_, ChainResult<Option<TransactionRecord>>> {
        Box::pin(async move {
            match self.rpc.transaction_receipt(pending.hash).await? {
                None => Ok(None),
                Some(receipt) => {
                    let block_number = receipt.block()?;
                    let record = if receipt.succeeded() {
                        TransactionRecord::confirmed(pending, block_number)
                    } else {
                        TransactionRecord::failed(pending, block_number)
                    };
                    Ok(Some(record))
                }
            }
        })
    }
}
