//! # vitals-core
//!
//! **Your machine's vital signs, without the guesswork.**
//!
//! `vitals-core` is the collection engine behind the `vitals` monitor. It
//! polls Linux kernel counters (`/proc`, `statvfs`, the journal) on
//! independent cadences and turns cumulative counters into rates and
//! percentages through a stateful delta engine.
//!
//! ## Quick Start
//!
//! ```no_run
//! use vitals_core::{Coordinator, MonitorConfig, all_collectors};
//!
//! let config = MonitorConfig::default();
//! let coord = Coordinator::spawn(all_collectors(&config));
//!
//! // Collectors publish in the background; read whenever convenient.
//! std::thread::sleep(std::time::Duration::from_secs(2));
//! if let Some(snap) = coord.latest("cpu") {
//!     println!("{}", serde_json::to_string_pretty(&*snap).unwrap());
//! }
//! ```
//!
//! ## Architecture
//!
//! Collectors → Delta engine → Snapshots → Coordinator board → Readers
//!
//! Three rules the delta engine never breaks:
//! - A first observation of an entity produces **no rate**, never a fake 0%.
//! - A counter that moved backwards resets **that field only**; the other
//!   fields of the same entity keep their rates.
//! - A vanished entity loses its baseline, so a recycled pid or re-plugged
//!   disk starts fresh instead of inheriting a dead entity's history.
//!
//! Every collector implements the [`Collector`] trait. The [`Coordinator`]
//! runs each one on its own thread and publishes the newest [`Snapshot`] per
//! collector atomically; a slow collector never blocks the others.

pub mod collector;
pub mod collectors;
pub mod config;
pub mod coordinator;
pub mod delta;
pub mod procfs;
pub mod sample;

pub use collector::{Collector, CollectorInfo};
pub use collectors::{
    COLLECTOR_NAMES, CpuCollector, LogCollector, MemoryCollector, ProcessCollector,
    StorageCollector, all_collectors, collector_by_name,
};
pub use config::{ConfigError, MonitorConfig};
pub use coordinator::{CollectorHealth, Coordinator, HealthReport};
pub use delta::{DeltaOutcome, DeltaTable, DeltaWindow, FieldDelta};
pub use sample::{
    CpuStats, DeviceIo, FilesystemUsage, LogLevel, LogLine, LogStats, MemoryStats, Metric,
    MetricKind, ProcessRow, ProcessStats, RawSample, Severity, Snapshot, SnapshotData,
    StorageStats,
};

/// Library version (from Cargo.toml).
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
