//! Storage collector: filesystem capacity gauges plus per-device I/O rates.
//!
//! Capacity comes from `statvfs` on real (disk-backed) mounts and needs no
//! history. I/O rates come from `/proc/diskstats` counters run through the
//! delta table, keyed by device name. Partitions are dropped when their
//! parent whole-disk device is also present, so `sda` and `sda1` are not
//! both counted.

use std::collections::HashSet;
use std::time::Duration;

use crate::collector::{Collector, CollectorInfo};
use crate::config::MonitorConfig;
use crate::delta::{DeltaOutcome, DeltaTable, clamp_percent, rate};
use crate::procfs::{self, DiskCounters, MountEntry, Unavailable};
use crate::sample::{
    DeviceIo, FilesystemUsage, Metric, RawSample, Snapshot, SnapshotData, StorageStats,
};

const SECTOR_BYTES: u64 = 512;

static STORAGE_INFO: CollectorInfo = CollectorInfo {
    name: "storage",
    description: "Filesystem usage and block device I/O rates",
    default_interval: Duration::from_secs(2),
};

pub struct StorageCollector {
    interval: Duration,
    deltas: DeltaTable,
}

impl StorageCollector {
    pub fn new(config: &MonitorConfig) -> Self {
        Self {
            interval: config.storage_interval(),
            deltas: DeltaTable::new(),
        }
    }

    fn filesystems(mounts: &[MountEntry]) -> Vec<FilesystemUsage> {
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        for entry in mounts {
            if !procfs::real_filesystem(&entry.fs_type) {
                continue;
            }
            // Bind mounts expose the same device twice.
            if !seen.insert(entry.device.clone()) {
                continue;
            }
            let Some(cap) = procfs::fs_capacity(&entry.mount_point) else {
                continue;
            };
            if cap.total_bytes == 0 {
                continue;
            }
            let used = cap.total_bytes.saturating_sub(cap.free_bytes);
            out.push(FilesystemUsage {
                device: entry.device.clone(),
                mount_point: entry.mount_point.clone(),
                fs_type: entry.fs_type.clone(),
                total_bytes: cap.total_bytes,
                used_bytes: used,
                avail_bytes: cap.avail_bytes,
                used_percent: 100.0 * used as f64 / cap.total_bytes as f64,
            });
        }
        out.sort_by(|a, b| a.mount_point.cmp(&b.mount_point));
        out
    }

    fn device_io(
        &mut self,
        now: f64,
        counters: &[DiskCounters],
        issues: &mut Vec<String>,
    ) -> Vec<DeviceIo> {
        let names: Vec<String> = counters.iter().map(|c| c.device.clone()).collect();
        let whole_disks: Vec<&DiskCounters> = counters
            .iter()
            .filter(|c| !procfs::is_partition_of(&c.device, &names))
            .collect();

        let live: HashSet<String> = whole_disks.iter().map(|c| c.device.clone()).collect();
        self.deltas.retain(|id| live.contains(id));

        let mut out = Vec::new();
        for disk in whole_disks {
            let sample = RawSample::new(disk.device.clone(), now)
                .with_field("reads", disk.reads_completed)
                .with_field("writes", disk.writes_completed)
                .with_field("sectors_read", disk.sectors_read)
                .with_field("sectors_written", disk.sectors_written)
                .with_field("read_ms", disk.read_time_ms)
                .with_field("write_ms", disk.write_time_ms)
                .with_field("io_ms", disk.io_time_ms);
            let mut io = DeviceIo {
                device: disk.device.clone(),
                io_in_progress: disk.io_in_progress,
                ..Default::default()
            };
            if let DeltaOutcome::Window(w) = self.deltas.observe(sample) {
                let per_sec = |field: &str| w.counted(field).map(|d| rate(d, w.elapsed));
                io.reads_per_sec = per_sec("reads");
                io.writes_per_sec = per_sec("writes");
                io.read_bytes_per_sec =
                    per_sec("sectors_read").map(|s| s * SECTOR_BYTES as f64);
                io.write_bytes_per_sec =
                    per_sec("sectors_written").map(|s| s * SECTOR_BYTES as f64);
                // Average latency: time spent on reads over reads completed.
                io.avg_read_ms = match (w.counted("read_ms"), w.counted("reads")) {
                    (Some(ms), Some(n)) if n > 0 => Some(ms as f64 / n as f64),
                    _ => None,
                };
                io.avg_write_ms = match (w.counted("write_ms"), w.counted("writes")) {
                    (Some(ms), Some(n)) if n > 0 => Some(ms as f64 / n as f64),
                    _ => None,
                };
                // io_time_ms over wall time is the classic %util figure.
                io.utilization_percent = w.counted("io_ms").map(|ms| {
                    let (value, clamped) = clamp_percent(0.1 * rate(ms, w.elapsed), 1);
                    if clamped {
                        log::warn!("{}: utilization clamped to {value}", disk.device);
                        issues.push(format!("{}: utilization clamped", disk.device));
                    }
                    value
                });
            }
            out.push(io);
        }
        out.sort_by(|a, b| a.device.cmp(&b.device));
        out
    }

    /// Throughput summed over devices that have a measured window this cycle.
    fn total_rate(
        devices: &[DeviceIo],
        entity: &str,
        field: fn(&DeviceIo) -> Option<f64>,
    ) -> Option<Metric> {
        let rates: Vec<f64> = devices.iter().filter_map(field).collect();
        if rates.is_empty() {
            None
        } else {
            Some(Metric::rate(entity, rates.iter().sum(), "B/s"))
        }
    }

    fn build(
        &mut self,
        now: f64,
        mounts: Result<String, Unavailable>,
        diskstats: Result<String, Unavailable>,
        filesystems: Vec<FilesystemUsage>,
    ) -> Snapshot {
        let mut stats = StorageStats {
            filesystems,
            ..Default::default()
        };
        let mut issues = Vec::new();

        if let Err(e) = &mounts {
            issues.push(e.to_string());
        }
        match diskstats {
            Ok(content) => {
                let counters = procfs::parse_diskstats(&content);
                stats.devices = self.device_io(now, &counters, &mut issues);
                stats.read_bytes_per_sec =
                    Self::total_rate(&stats.devices, "read", |d| d.read_bytes_per_sec);
                stats.write_bytes_per_sec =
                    Self::total_rate(&stats.devices, "write", |d| d.write_bytes_per_sec);
            }
            Err(e) => issues.push(e.to_string()),
        }

        let mut snap = Snapshot::new(STORAGE_INFO.name, SnapshotData::Storage(stats));
        for issue in issues {
            snap.degrade(issue);
        }
        snap
    }
}

impl Collector for StorageCollector {
    fn info(&self) -> &CollectorInfo {
        &STORAGE_INFO
    }

    fn interval(&self) -> Duration {
        self.interval
    }

    fn collect(&mut self) -> Snapshot {
        let now = procfs::monotonic_seconds();
        let mounts = procfs::read_proc("/proc/mounts");
        let filesystems = match &mounts {
            Ok(content) => Self::filesystems(&procfs::parse_mounts(content)),
            Err(_) => Vec::new(),
        };
        let diskstats = procfs::read_proc("/proc/diskstats");
        self.build(now, mounts, diskstats, filesystems)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sample::MetricKind;

    fn storage_stats(snap: &Snapshot) -> &StorageStats {
        match &snap.data {
            SnapshotData::Storage(s) => s,
            other => panic!("expected storage data, got {other:?}"),
        }
    }

    fn disk(device: &str, reads: u64, writes: u64, sectors_r: u64, sectors_w: u64) -> DiskCounters {
        DiskCounters {
            device: device.to_string(),
            reads_completed: reads,
            sectors_read: sectors_r,
            read_time_ms: 0,
            writes_completed: writes,
            sectors_written: sectors_w,
            write_time_ms: 0,
            io_in_progress: 0,
            io_time_ms: 0,
        }
    }

    #[test]
    fn first_cycle_has_no_rates() {
        let mut c = StorageCollector::new(&MonitorConfig::default());
        let io = c.device_io(0.0, &[disk("sda", 100, 50, 800, 400)], &mut Vec::new());
        assert_eq!(io.len(), 1);
        assert_eq!(io[0].reads_per_sec, None);
        assert_eq!(io[0].read_bytes_per_sec, None);
    }

    #[test]
    fn sector_deltas_become_byte_rates() {
        let mut c = StorageCollector::new(&MonitorConfig::default());
        c.device_io(0.0, &[disk("sda", 100, 50, 1000, 400)], &mut Vec::new());
        // +200 reads, +1024 sectors read over 2s => 100 reads/s, 256 KiB/s.
        let io = c.device_io(2.0, &[disk("sda", 300, 50, 2024, 400)], &mut Vec::new());
        assert!((io[0].reads_per_sec.unwrap() - 100.0).abs() < 1e-9);
        assert!((io[0].read_bytes_per_sec.unwrap() - 262_144.0).abs() < 1e-9);
        assert!((io[0].writes_per_sec.unwrap() - 0.0).abs() < 1e-9);
    }

    #[test]
    fn counter_reset_on_one_field_leaves_others_counted() {
        let mut c = StorageCollector::new(&MonitorConfig::default());
        c.device_io(0.0, &[disk("sda", 2000, 100, 5000, 300)], &mut Vec::new());
        // reads went 2000 -> 1000: reset. writes kept counting.
        let io = c.device_io(1.0, &[disk("sda", 1000, 150, 5000, 300)], &mut Vec::new());
        assert_eq!(io[0].reads_per_sec, None);
        assert!((io[0].writes_per_sec.unwrap() - 50.0).abs() < 1e-9);
        // Next cycle the reset field has a valid baseline of 1000 again.
        let io = c.device_io(2.0, &[disk("sda", 1010, 150, 5000, 300)], &mut Vec::new());
        assert!((io[0].reads_per_sec.unwrap() - 10.0).abs() < 1e-9);
    }

    #[test]
    fn partitions_folded_into_whole_disk() {
        let mut c = StorageCollector::new(&MonitorConfig::default());
        let counters = [
            disk("sda", 100, 0, 0, 0),
            disk("sda1", 60, 0, 0, 0),
            disk("sda2", 40, 0, 0, 0),
            disk("nvme0n1", 10, 0, 0, 0),
            disk("nvme0n1p1", 10, 0, 0, 0),
        ];
        let io = c.device_io(0.0, &counters, &mut Vec::new());
        let names: Vec<&str> = io.iter().map(|d| d.device.as_str()).collect();
        assert_eq!(names, ["nvme0n1", "sda"]);
    }

    #[test]
    fn removed_device_loses_baseline() {
        let mut c = StorageCollector::new(&MonitorConfig::default());
        let both = [disk("sda", 100, 0, 0, 0), disk("sdb", 500, 0, 0, 0)];
        c.device_io(0.0, &both, &mut Vec::new());
        c.device_io(1.0, &[disk("sda", 110, 0, 0, 0)], &mut Vec::new());
        assert!(!c.deltas.contains("sdb"));
        // sdb comes back (hotplug): first sample again, no rate.
        let returned = [disk("sda", 120, 0, 0, 0), disk("sdb", 5, 0, 0, 0)];
        let io = c.device_io(2.0, &returned, &mut Vec::new());
        let sdb = io.iter().find(|d| d.device == "sdb").unwrap();
        assert_eq!(sdb.reads_per_sec, None);
    }

    #[test]
    fn utilization_from_io_time() {
        let mut c = StorageCollector::new(&MonitorConfig::default());
        let mut d0 = disk("sda", 0, 0, 0, 0);
        d0.io_time_ms = 1000;
        c.device_io(0.0, &[d0], &mut Vec::new());
        // 500 ms of I/O time in a 2 s window => 25% utilized.
        let mut d1 = disk("sda", 0, 0, 0, 0);
        d1.io_time_ms = 1500;
        let io = c.device_io(2.0, &[d1], &mut Vec::new());
        assert!((io[0].utilization_percent.unwrap() - 25.0).abs() < 1e-9);
    }

    #[test]
    fn clamped_utilization_is_capped_and_flagged() {
        let mut c = StorageCollector::new(&MonitorConfig::default());
        c.device_io(0.0, &[disk("sda", 0, 0, 0, 0)], &mut Vec::new());
        // 5000 ms of I/O time cannot fit in a 1 s window: capped at 100.
        let mut d1 = disk("sda", 0, 0, 0, 0);
        d1.io_time_ms = 5000;
        let mut issues = Vec::new();
        let io = c.device_io(1.0, &[d1], &mut issues);
        assert_eq!(io[0].utilization_percent, Some(100.0));
        assert_eq!(issues, ["sda: utilization clamped"]);
    }

    #[test]
    fn clamped_utilization_marks_snapshot_partial() {
        let mut c = StorageCollector::new(&MonitorConfig::default());
        let line = |io_ms: u64| format!("8 0 sda 0 0 0 0 0 0 0 0 0 {io_ms} 0");
        let first = c.build(0.0, Ok(String::new()), Ok(line(0)), Vec::new());
        assert!(!first.partial);
        let snap = c.build(1.0, Ok(String::new()), Ok(line(5000)), Vec::new());
        assert!(snap.partial);
        assert!(snap.issues.iter().any(|i| i.contains("utilization clamped")));
    }

    #[test]
    fn read_throughput_sums_whole_disks() {
        let mut c = StorageCollector::new(&MonitorConfig::default());
        let stats_at = |sda_sectors: u64, sdb_sectors: u64| {
            format!(
                "8 0 sda 0 0 {sda_sectors} 0 0 0 0 0 0 0 0\n\
                 8 16 sdb 0 0 {sdb_sectors} 0 0 0 0 0 0 0 0\n"
            )
        };
        let first = c.build(0.0, Ok(String::new()), Ok(stats_at(0, 0)), Vec::new());
        assert_eq!(storage_stats(&first).read_bytes_per_sec, None);
        // +1024 and +2048 sectors over 2 s => (512 + 1024) sectors/s combined.
        let snap = c.build(2.0, Ok(String::new()), Ok(stats_at(1024, 2048)), Vec::new());
        let total = storage_stats(&snap).read_bytes_per_sec.as_ref().unwrap();
        assert_eq!(total.kind, MetricKind::Rate);
        assert_eq!(total.unit, "B/s");
        assert!((total.value - 1536.0 * 512.0).abs() < 1e-9);
    }

    #[test]
    fn unreadable_diskstats_degrades_snapshot() {
        let mut c = StorageCollector::new(&MonitorConfig::default());
        let err = || {
            Err(Unavailable {
                source: "/proc/diskstats".to_string(),
                reason: "permission denied".to_string(),
            })
        };
        let snap = c.build(0.0, Ok(String::new()), err(), Vec::new());
        assert!(snap.partial);
        assert_eq!(snap.issues.len(), 1);
        match &snap.data {
            SnapshotData::Storage(s) => assert!(s.devices.is_empty()),
            other => panic!("expected storage data, got {other:?}"),
        }
    }
}
