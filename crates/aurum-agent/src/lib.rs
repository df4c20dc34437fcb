//! Aurum treasury-rebalancing agent.
//!
//! Orchestrates the rebalancing control loop:
//! - Poll the sentiment signal on a fixed cadence
//! - Compare desired vs. actual allocation
//! - Drive exactly one on-chain transaction per logical transition
//! - Interpret finality and survive submission failures

pub mod app;
pub mod config;
pub mod controller;
pub mod error;
pub mod executor;
pub mod logging;

pub use app::Application;
pub use config::{AgentConfig, SignalConfig, SignalKind};
pub use controller::{ControllerStatus, RebalanceController};
pub use error::{AppError, AppResult};
pub use executor::RebalanceExecutor;
