//! Abstract collector trait and metadata.
//!
//! Every metric domain implements [`Collector`]: it declares its own polling
//! interval, owns its previous-sample state, and produces one [`Snapshot`]
//! per cycle. `collect()` is total — entity failures degrade the snapshot,
//! they never abort the cycle.

use std::time::Duration;

use crate::sample::Snapshot;

/// Static metadata about a collector.
#[derive(Debug, Clone)]
pub struct CollectorInfo {
    /// Unique identifier (e.g. `"cpu"`); display regions bind to it by name.
    pub name: &'static str,
    /// One-line human-readable description.
    pub description: &'static str,
    /// Default polling interval; configuration may override per collector.
    pub default_interval: Duration,
}

/// Trait that every metric collector must implement.
pub trait Collector: Send {
    /// Collector metadata.
    fn info(&self) -> &CollectorInfo;

    /// Configured polling interval for this instance.
    fn interval(&self) -> Duration;

    /// Run one collection cycle. Always returns a snapshot; per-entity
    /// failures set the partial flag instead of propagating.
    fn collect(&mut self) -> Snapshot;

    /// Convenience: name from info.
    fn name(&self) -> &'static str {
        self.info().name
    }
}
