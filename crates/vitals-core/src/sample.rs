//! Core data model: raw counter samples, derived metrics, and per-cycle
//! snapshots.
//!
//! Everything a collector publishes is an immutable value copy. Snapshots are
//! superseded wholesale by the next cycle, never mutated in place, so a
//! consumer holding one always sees a self-consistent view.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::{SystemTime, UNIX_EPOCH};

/// Wall-clock milliseconds since the Unix epoch, for snapshot headers.
pub fn unix_ms_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

// ---------------------------------------------------------------------------
// RawSample
// ---------------------------------------------------------------------------

/// One raw counter reading for a single entity.
///
/// `timestamp` is monotonic seconds (process-local epoch), not wall time, so
/// elapsed-interval math is immune to wall-clock steps. Fields hold the raw,
/// cumulative counter values as read from the kernel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawSample {
    /// Logical subject of the measurement: `"total"`, `"core-3"`,
    /// `"1234:5678"` (pid:starttime), `"sda"`.
    pub entity_id: String,
    /// Capture time in monotonic seconds.
    pub timestamp: f64,
    /// Field name to raw counter value.
    pub fields: HashMap<String, u64>,
}

impl RawSample {
    pub fn new(entity_id: impl Into<String>, timestamp: f64) -> Self {
        Self {
            entity_id: entity_id.into(),
            timestamp,
            fields: HashMap::new(),
        }
    }

    /// Builder-style field insertion.
    pub fn with_field(mut self, name: impl Into<String>, value: u64) -> Self {
        self.fields.insert(name.into(), value);
        self
    }

    pub fn field(&self, name: &str) -> Option<u64> {
        self.fields.get(name).copied()
    }
}

// ---------------------------------------------------------------------------
// Metric
// ---------------------------------------------------------------------------

/// What kind of value a metric carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricKind {
    /// Derived from two samples: bounded share of a maximum possible delta.
    Percentage,
    /// Derived from two samples: units per second.
    Rate,
    /// Instantaneous gauge, one sample suffices.
    Absolute,
}

/// Threshold annotation attached to a metric. Display-only: thresholds never
/// feed back into computation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    #[default]
    Normal,
    Warning,
    Critical,
}

impl Severity {
    /// Grade a value against warning/critical thresholds.
    pub fn grade(value: f64, warning: f64, critical: f64) -> Self {
        if value >= critical {
            Self::Critical
        } else if value >= warning {
            Self::Warning
        } else {
            Self::Normal
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Normal => write!(f, "normal"),
            Self::Warning => write!(f, "warning"),
            Self::Critical => write!(f, "critical"),
        }
    }
}

/// A single derived value for one entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metric {
    pub entity_id: String,
    pub kind: MetricKind,
    pub value: f64,
    pub unit: String,
    pub severity: Severity,
}

impl Metric {
    pub fn percentage(entity_id: impl Into<String>, value: f64) -> Self {
        Self {
            entity_id: entity_id.into(),
            kind: MetricKind::Percentage,
            value,
            unit: "%".to_string(),
            severity: Severity::Normal,
        }
    }

    pub fn rate(entity_id: impl Into<String>, value: f64, unit: impl Into<String>) -> Self {
        Self {
            entity_id: entity_id.into(),
            kind: MetricKind::Rate,
            value,
            unit: unit.into(),
            severity: Severity::Normal,
        }
    }

    pub fn absolute(entity_id: impl Into<String>, value: f64, unit: impl Into<String>) -> Self {
        Self {
            entity_id: entity_id.into(),
            kind: MetricKind::Absolute,
            value,
            unit: unit.into(),
            severity: Severity::Normal,
        }
    }

    pub fn graded(mut self, warning: f64, critical: f64) -> Self {
        self.severity = Severity::grade(self.value, warning, critical);
        self
    }
}

// ---------------------------------------------------------------------------
// Per-domain stats
// ---------------------------------------------------------------------------

/// CPU usage, load, and clock frequency.
///
/// `usage` carries one percentage metric per entity (`"total"`, `"core-0"`,
/// ...). Entities observed for the first time this cycle have no rate yet and
/// are simply absent — never a fabricated 0%.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct CpuStats {
    pub core_count: usize,
    pub model_name: Option<String>,
    pub usage: Vec<Metric>,
    pub load_1m: Option<f64>,
    pub load_5m: Option<f64>,
    pub load_15m: Option<f64>,
    /// 1-minute load as a percentage of core count.
    pub load_1m_percent: Option<f64>,
    /// Instantaneous per-core clock frequencies, where exposed.
    pub frequencies_mhz: Vec<f64>,
    /// Mean of `frequencies_mhz`, absent when the kernel exposes none.
    pub frequency_avg: Option<Metric>,
}

/// System-wide memory gauges, all bytes, all instantaneous.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct MemoryStats {
    pub total: u64,
    pub free: u64,
    pub available: u64,
    pub buffers: u64,
    pub cached: u64,
    pub slab: u64,
    pub active: u64,
    pub inactive: u64,
    pub dirty: u64,
    pub swap_total: u64,
    pub swap_free: u64,
    pub swap_cached: u64,
    pub used: u64,
    pub used_percent: Option<Metric>,
    pub swap_used: u64,
    pub swap_used_percent: Option<Metric>,
}

/// One row of the process table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessRow {
    pub pid: i32,
    pub name: String,
    pub state: char,
    pub ppid: i32,
    pub nice: i64,
    pub threads: u64,
    /// Percentage of one core. `None` until this process incarnation has two
    /// samples behind it.
    pub cpu_percent: Option<f64>,
    pub memory_rss: u64,
    /// VmSize; 0 when `/proc/[pid]/status` was unreadable.
    pub memory_virtual: u64,
    pub memory_percent: f64,
    pub cmdline: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ProcessStats {
    /// Sorted by CPU descending, truncated to the configured row limit.
    pub rows: Vec<ProcessRow>,
    pub total_processes: usize,
    pub running: usize,
    pub sleeping: usize,
    pub stopped: usize,
    pub total_memory: u64,
    pub total_threads: u64,
}

/// Capacity of one mounted filesystem (instantaneous).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilesystemUsage {
    pub device: String,
    pub mount_point: String,
    pub fs_type: String,
    pub total_bytes: u64,
    pub used_bytes: u64,
    /// Bytes available to unprivileged users, which is what `df` reports.
    pub avail_bytes: u64,
    pub used_percent: f64,
}

/// Throughput and latency for one block device over the last window.
///
/// Every rate is `None` on the device's first cycle, and per-field after a
/// counter reset, the same way per-process CPU is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct DeviceIo {
    pub device: String,
    pub reads_per_sec: Option<f64>,
    pub writes_per_sec: Option<f64>,
    pub read_bytes_per_sec: Option<f64>,
    pub write_bytes_per_sec: Option<f64>,
    pub avg_read_ms: Option<f64>,
    pub avg_write_ms: Option<f64>,
    pub utilization_percent: Option<f64>,
    pub io_in_progress: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct StorageStats {
    pub filesystems: Vec<FilesystemUsage>,
    pub devices: Vec<DeviceIo>,
    /// Read throughput summed over whole disks, absent until any device has
    /// two samples behind it.
    pub read_bytes_per_sec: Option<Metric>,
    pub write_bytes_per_sec: Option<Metric>,
}

/// Severity bucket for a log line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogLevel {
    Critical,
    Error,
    Warning,
    Info,
    Debug,
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Critical => write!(f, "CRITICAL"),
            Self::Error => write!(f, "ERROR"),
            Self::Warning => write!(f, "WARNING"),
            Self::Info => write!(f, "INFO"),
            Self::Debug => write!(f, "DEBUG"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogLine {
    /// Raw timestamp text as the source printed it, if one was recognized.
    pub timestamp: Option<String>,
    pub source: String,
    pub level: LogLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct LogStats {
    /// Most recent lines, oldest first, truncated to the configured limit.
    pub lines: Vec<LogLine>,
    /// Lines matching the configured severity patterns or graded at warning
    /// or above.
    pub error_count: usize,
    pub critical: usize,
    pub error: usize,
    pub warning: usize,
    pub info: usize,
    pub debug: usize,
    /// Which source produced the lines: `"journalctl"` or a file path.
    pub source: String,
}

// ---------------------------------------------------------------------------
// Snapshot
// ---------------------------------------------------------------------------

/// Domain payload of a snapshot. Closed set: collectors are selected at
/// startup from static configuration, no open-ended dispatch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "domain", rename_all = "snake_case")]
pub enum SnapshotData {
    Cpu(CpuStats),
    Memory(MemoryStats),
    Processes(ProcessStats),
    Storage(StorageStats),
    Logs(LogStats),
}

/// The complete output of one collector for one collection cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub collector: String,
    pub captured_unix_ms: u64,
    /// Set when any entity or field degraded this cycle; the reasons are in
    /// `issues`. A partial snapshot is still valid for everything it carries.
    pub partial: bool,
    pub issues: Vec<String>,
    pub data: SnapshotData,
}

impl Snapshot {
    pub fn new(collector: &str, data: SnapshotData) -> Self {
        Self {
            collector: collector.to_string(),
            captured_unix_ms: unix_ms_now(),
            partial: false,
            issues: Vec::new(),
            data,
        }
    }

    /// Record a degradation reason and mark the snapshot partial.
    pub fn degrade(&mut self, issue: impl Into<String>) {
        self.partial = true;
        self.issues.push(issue.into());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_sample_builder() {
        let s = RawSample::new("core-0", 1.5)
            .with_field("busy", 100)
            .with_field("total", 1000);
        assert_eq!(s.field("busy"), Some(100));
        assert_eq!(s.field("total"), Some(1000));
        assert_eq!(s.field("missing"), None);
    }

    #[test]
    fn severity_grading() {
        assert_eq!(Severity::grade(50.0, 70.0, 90.0), Severity::Normal);
        assert_eq!(Severity::grade(75.0, 70.0, 90.0), Severity::Warning);
        assert_eq!(Severity::grade(95.0, 70.0, 90.0), Severity::Critical);
        assert_eq!(Severity::grade(90.0, 70.0, 90.0), Severity::Critical);
    }

    #[test]
    fn snapshot_degrade_sets_partial() {
        let mut snap = Snapshot::new("cpu", SnapshotData::Cpu(CpuStats::default()));
        assert!(!snap.partial);
        snap.degrade("/proc/stat: permission denied");
        assert!(snap.partial);
        assert_eq!(snap.issues.len(), 1);
    }

    #[test]
    fn snapshot_serializes_with_domain_tag() {
        let snap = Snapshot::new("memory", SnapshotData::Memory(MemoryStats::default()));
        let json = serde_json::to_string(&snap).unwrap();
        assert!(json.contains("\"domain\":\"memory\""));
        let back: Snapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(back, snap);
    }
}
