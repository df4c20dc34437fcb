//! The `SignalSource` trait.

use std::sync::Arc;

use aurum_core::Sentiment;

use crate::error::SignalResult;

/// A pluggable sentiment feed.
///
/// `sample` must be non-blocking and free of side effects; it is called once
/// per poll cycle at whatever cadence the controller runs. When the feed
/// cannot produce a fresh value it must return `SignalError::Unavailable`
/// instead of a stale reading.
pub trait SignalSource: Send + Sync {
    /// Take one sentiment reading.
    fn sample(&self) -> SignalResult<Sentiment>;
}

/// Arc wrapper for SignalSource trait objects.
pub type DynSignalSource = Arc<dyn SignalSource>;
