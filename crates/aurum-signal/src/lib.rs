//! Sentiment signal sources for the Aurum rebalancing agent.
//!
//! The controller only ever talks to the `SignalSource` trait; the concrete
//! sources here (clock-toggle simulation, scripted playback) are swappable
//! with a real oracle client without touching the control loop.

pub mod clock;
pub mod error;
pub mod scripted;
pub mod simulated;
pub mod source;

pub use clock::{Clock, SystemClock};
pub use error::{SignalError, SignalResult};
pub use scripted::ScriptedSource;
pub use simulated::ClockToggleSource;
pub use source::{DynSignalSource, SignalSource};
