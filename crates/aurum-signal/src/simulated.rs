//! Clock-toggle sentiment simulation.
//!
//! Demo stand-in for a real oracle feed: sentiment flips by wall-clock
//! modulo, risk-on for the first half of each period. In production this
//! source is replaced by an oracle client implementing the same trait.

use aurum_core::Sentiment;

use crate::clock::{Clock, SystemClock};
use crate::error::{SignalError, SignalResult};
use crate::source::SignalSource;

/// Sentiment source that toggles on a fixed wall-clock period.
pub struct ClockToggleSource<C: Clock> {
    period_secs: u64,
    clock: C,
}

impl<C: Clock> ClockToggleSource<C> {
    /// Create a source with the given full period and clock.
    ///
    /// # Errors
    /// Returns `SignalError::Unavailable` for a zero period.
    pub fn new(period_secs: u64, clock: C) -> Result<Self, SignalError> {
        if period_secs == 0 {
            return Err(SignalError::Unavailable(
                "toggle period must be non-zero".to_string(),
            ));
        }
        Ok(Self { period_secs, clock })
    }
}

impl ClockToggleSource<SystemClock> {
    /// Create a source on the system clock.
    ///
    /// # Errors
    /// Returns `SignalError::Unavailable` for a zero period; the period is
    /// never silently replaced.
    pub fn with_system_clock(period_secs: u64) -> Result<Self, SignalError> {
        Self::new(period_secs, SystemClock)
    }
}

impl<C: Clock> SignalSource for ClockToggleSource<C> {
    fn sample(&self) -> SignalResult<Sentiment> {
        let now = self.clock.now_secs();
        if now % self.period_secs < self.period_secs / 2 {
            Ok(Sentiment::RiskOn)
        } else {
            Ok(Sentiment::RiskOff)
        }
    }
}
