//! Memory collector: system-wide gauges from `/proc/meminfo`.
//!
//! Everything here is instantaneous — no delta state. Used memory prefers
//! `MemAvailable` (total − available); on kernels without it, the classic
//! total − free − buffers − cached fallback applies.

use std::time::Duration;

use crate::collector::{Collector, CollectorInfo};
use crate::config::MonitorConfig;
use crate::procfs::{self, Unavailable};
use crate::sample::{MemoryStats, Metric, Snapshot, SnapshotData};

static MEMORY_INFO: CollectorInfo = CollectorInfo {
    name: "memory",
    description: "RAM and swap gauges from /proc/meminfo",
    default_interval: Duration::from_secs(1),
};

pub struct MemoryCollector {
    interval: Duration,
    warning: f64,
    critical: f64,
}

impl MemoryCollector {
    pub fn new(config: &MonitorConfig) -> Self {
        Self {
            interval: config.memory_interval(),
            warning: config.memory_warning_threshold,
            critical: config.memory_critical_threshold,
        }
    }

    fn build(&self, meminfo: Result<String, Unavailable>) -> Snapshot {
        let mut stats = MemoryStats::default();
        let mut issues = Vec::new();

        match meminfo {
            Ok(content) => {
                let mem = procfs::parse_meminfo(&content);
                if mem.is_empty() {
                    issues.push("/proc/meminfo: no parsable fields".to_string());
                }
                let get = |key: &str| mem.get(key).copied().unwrap_or(0);
                stats.total = get("MemTotal");
                stats.free = get("MemFree");
                stats.available = get("MemAvailable");
                stats.buffers = get("Buffers");
                stats.cached = get("Cached");
                stats.slab = get("Slab");
                stats.active = get("Active");
                stats.inactive = get("Inactive");
                stats.dirty = get("Dirty");
                stats.swap_total = get("SwapTotal");
                stats.swap_free = get("SwapFree");
                stats.swap_cached = get("SwapCached");

                if stats.total > 0 {
                    stats.used = if stats.available > 0 {
                        stats.total.saturating_sub(stats.available)
                    } else {
                        stats
                            .total
                            .saturating_sub(stats.free)
                            .saturating_sub(stats.buffers)
                            .saturating_sub(stats.cached)
                    };
                    let percent = 100.0 * stats.used as f64 / stats.total as f64;
                    stats.used_percent = Some(
                        Metric::percentage("memory", percent)
                            .graded(self.warning, self.critical),
                    );
                }

                if stats.swap_total > 0 {
                    stats.swap_used = stats.swap_total.saturating_sub(stats.swap_free);
                    let percent = 100.0 * stats.swap_used as f64 / stats.swap_total as f64;
                    stats.swap_used_percent = Some(
                        Metric::percentage("swap", percent)
                            .graded(self.warning, self.critical),
                    );
                }
            }
            Err(e) => issues.push(e.to_string()),
        }

        let mut snap = Snapshot::new(MEMORY_INFO.name, SnapshotData::Memory(stats));
        for issue in issues {
            snap.degrade(issue);
        }
        snap
    }
}

impl Collector for MemoryCollector {
    fn info(&self) -> &CollectorInfo {
        &MEMORY_INFO
    }

    fn interval(&self) -> Duration {
        self.interval
    }

    fn collect(&mut self) -> Snapshot {
        self.build(procfs::read_proc("/proc/meminfo"))
    }
}
