//! Main application orchestration.
//!
//! Wires configuration into concrete components: key loading, the ledger
//! backend, the sentiment source, and the controller, then runs the poll
//! loop until ctrl-c.

use std::sync::Arc;

use aurum_chain::{DynTransactionBackend, EvmBackend, KeyManager};
use aurum_signal::{ClockToggleSource, DynSignalSource, ScriptedSource};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::config::{AgentConfig, SignalKind};
use crate::controller::RebalanceController;
use crate::error::AppResult;
use crate::executor::RebalanceExecutor;

/// Main application.
pub struct Application {
    config: AgentConfig,
    controller: RebalanceController,
}

impl Application {
    /// Build the whole component graph from validated configuration.
    ///
    /// All startup-time misconfiguration (bad addresses, missing key, zero
    /// gas) fails here, before any polling starts.
    pub fn new(config: AgentConfig) -> AppResult<Self> {
        config.validate()?;

        let keys = KeyManager::load(config.chain.key_source()?, config.chain.expected_signer()?)?;
        info!(signer = %keys.address(), "Signing key loaded");

        let backend: DynTransactionBackend = Arc::new(EvmBackend::new(&config.chain, keys)?);
        let executor = RebalanceExecutor::new(backend, config.confirm_timeout());

        let signal = Self::build_signal(&config)?;
        let controller = RebalanceController::new(
            signal,
            executor,
            config.initial_allocation,
            config.poll_interval(),
            config.timeout_resolution_polls,
        );

        Ok(Self { config, controller })
    }

    fn build_signal(config: &AgentConfig) -> AppResult<DynSignalSource> {
        Ok(match config.signal.kind {
            SignalKind::Simulated => Arc::new(ClockToggleSource::with_system_clock(
                config.signal.toggle_period_secs,
            )?),
            SignalKind::Scripted => Arc::new(ScriptedSource::new(config.signal.script.clone())),
        })
    }

    /// Run until ctrl-c.
    ///
    /// Shutdown is cooperative: the signal cancels the poll loop, and an
    /// in-flight transition always runs to completion or its bounded
    /// timeout before the process exits.
    pub async fn run(mut self) -> AppResult<()> {
        // The initial allocation is assumed from config, not read from the
        // vault; make that visible to the operator on every start.
        warn!(
            allocation = %self.config.initial_allocation,
            "Initial allocation taken from config; verify it matches actual vault state"
        );

        let cancel = CancellationToken::new();
        let signal_cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("Shutdown signal received");
                signal_cancel.cancel();
            }
        });

        self.controller.run(cancel).await;

        let status = self.controller.status();
        info!(
            allocation = %status.allocation,
            transitions = self.controller.history().len(),
            "Agent stopped"
        );
        Ok(())
    }
}
