//! Scripted sentiment playback.
//!
//! Plays a fixed sequence of readings, one per `sample` call, then reports
//! the feed as unavailable. Used for deterministic controller tests and dry
//! runs with no real clock involved.

use aurum_core::Sentiment;
use parking_lot::Mutex;

use crate::error::{SignalError, SignalResult};
use crate::source::SignalSource;

/// Sentiment source backed by a pre-recorded sequence.
pub struct ScriptedSource {
    script: Mutex<std::vec::IntoIter<Sentiment>>,
}

impl ScriptedSource {
    /// Create a source that yields the given readings in order.
    #[must_use]
    pub fn new(script: Vec<Sentiment>) -> Self {
        Self {
            script: Mutex::new(script.into_iter()),
        }
    }
}

impl SignalSource for ScriptedSource {
    fn sample(&self) -> SignalResult<Sentiment> {
        self.script
            .lock()
            .next()
            .ok_or_else(|| SignalError::Unavailable("script exhausted".to_string()))
    }
}
