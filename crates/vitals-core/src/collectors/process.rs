//! Process collector: one entity per live process incarnation.
//!
//! Entity identity is `pid:starttime`, not the pid alone — the kernel recycles
//! pids, and a recycled pid must start from `NoRateYet`, never from the dead
//! process's tick baseline. Reconciliation drops vanished incarnations from
//! the delta table every cycle.
//!
//! Per-process CPU is a percentage of one core
//! (`100 × tick_delta / (elapsed × CLK_TCK)`); a multi-threaded process can
//! legitimately exceed 100, capped at 100 × core count.

use std::collections::HashSet;
use std::time::Duration;

use crate::collector::{Collector, CollectorInfo};
use crate::config::MonitorConfig;
use crate::delta::{DeltaOutcome, DeltaTable, clamp_percent, percentage};
use crate::procfs::{self, PidStat, PidStatus};
use crate::sample::{ProcessRow, ProcessStats, RawSample, Snapshot, SnapshotData};

static PROCESS_INFO: CollectorInfo = CollectorInfo {
    name: "process",
    description: "Per-process CPU, memory, and state from /proc/[pid]",
    default_interval: Duration::from_secs(2),
};

/// Everything read about one process this cycle.
pub struct ProcEntry {
    pub stat: PidStat,
    pub status: PidStatus,
    pub cmdline: String,
}

pub struct ProcessCollector {
    interval: Duration,
    deltas: DeltaTable,
    row_limit: usize,
    ticks_per_second: f64,
    page_size: u64,
    core_count: usize,
    /// MemTotal in bytes, read once on first use.
    mem_total: u64,
}

impl ProcessCollector {
    pub fn new(config: &MonitorConfig) -> Self {
        Self {
            interval: config.process_interval(),
            deltas: DeltaTable::new(),
            row_limit: config.process_row_limit,
            ticks_per_second: procfs::clock_ticks_per_second(),
            page_size: procfs::page_size(),
            core_count: procfs::core_count(),
            mem_total: 0,
        }
    }

    fn entity_id(stat: &PidStat) -> String {
        format!("{}:{}", stat.pid, stat.starttime)
    }

    fn build(&mut self, now: f64, total_listed: usize, entries: Vec<ProcEntry>) -> Snapshot {
        let mut stats = ProcessStats {
            total_processes: total_listed,
            ..Default::default()
        };
        let mut issues = Vec::new();
        let mut live: HashSet<String> = HashSet::with_capacity(entries.len());

        for entry in &entries {
            let entity = Self::entity_id(&entry.stat);
            live.insert(entity.clone());

            let sample =
                RawSample::new(entity.clone(), now).with_field("ticks", entry.stat.cpu_ticks);
            let cpu_percent = match self.deltas.observe(sample) {
                DeltaOutcome::Window(w) => w.counted("ticks").map(|ticks| {
                    let raw = percentage(ticks, w.elapsed * self.ticks_per_second);
                    let (value, clamped) = clamp_percent(raw, self.core_count);
                    if clamped {
                        log::warn!("pid {}: cpu clamped to {value}", entry.stat.pid);
                        issues.push(format!("pid {}: cpu clamped", entry.stat.pid));
                    }
                    value
                }),
                DeltaOutcome::First | DeltaOutcome::Stale => None,
            };

            let memory_rss = entry
                .status
                .vm_rss_bytes
                .unwrap_or(entry.stat.rss_pages.max(0) as u64 * self.page_size);
            let memory_percent = if self.mem_total > 0 {
                100.0 * memory_rss as f64 / self.mem_total as f64
            } else {
                0.0
            };

            match entry.stat.state {
                'R' => stats.running += 1,
                'S' | 'D' | 'I' => stats.sleeping += 1,
                'T' | 'Z' => stats.stopped += 1,
                _ => {}
            }
            let threads = entry.status.threads.unwrap_or(entry.stat.num_threads);
            stats.total_memory += memory_rss;
            stats.total_threads += threads;

            stats.rows.push(ProcessRow {
                pid: entry.stat.pid,
                name: entry.stat.comm.clone(),
                state: entry.stat.state,
                ppid: entry.stat.ppid,
                nice: entry.stat.nice,
                threads,
                cpu_percent,
                memory_rss,
                memory_virtual: entry.status.vm_size_bytes.unwrap_or(0),
                memory_percent,
                cmdline: entry.cmdline.clone(),
            });
        }

        // Vanished incarnations (and recycled pids with a new starttime)
        // lose their baselines here.
        self.deltas.retain(|id| live.contains(id));

        stats.rows.sort_by(|a, b| {
            b.cpu_percent
                .unwrap_or(0.0)
                .partial_cmp(&a.cpu_percent.unwrap_or(0.0))
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| b.memory_rss.cmp(&a.memory_rss))
        });
        stats.rows.truncate(self.row_limit);

        let mut snap = Snapshot::new(PROCESS_INFO.name, SnapshotData::Processes(stats));
        for issue in issues {
            snap.degrade(issue);
        }
        snap
    }
}

impl Collector for ProcessCollector {
    fn info(&self) -> &CollectorInfo {
        &PROCESS_INFO
    }

    fn interval(&self) -> Duration {
        self.interval
    }

    fn collect(&mut self) -> Snapshot {
        let now = procfs::monotonic_seconds();

        if self.mem_total == 0
            && let Ok(content) = procfs::read_proc("/proc/meminfo")
        {
            self.mem_total = procfs::parse_meminfo(&content)
                .get("MemTotal")
                .copied()
                .unwrap_or(0);
        }

        let pids = procfs::list_pids();
        let mut entries = Vec::with_capacity(pids.len());
        for pid in &pids {
            // A process can exit between listing and reading; that is an
            // absent entity this cycle, not an error.
            let Ok(stat_text) = procfs::read_proc(&format!("/proc/{pid}/stat")) else {
                continue;
            };
            let Some(stat) = procfs::parse_pid_stat(&stat_text) else {
                continue;
            };
            let status = procfs::read_proc(&format!("/proc/{pid}/status"))
                .map(|t| procfs::parse_pid_status(&t))
                .unwrap_or_default();
            let cmdline = procfs::read_proc(&format!("/proc/{pid}/cmdline"))
                .map(|t| procfs::parse_cmdline(&t))
                .unwrap_or_default();
            entries.push(ProcEntry {
                stat,
                status,
                cmdline,
            });
        }

        let mut snap = self.build(now, pids.len(), entries);
        if pids.is_empty() {
            snap.degrade("/proc: no process ids listed");
        }
        snap
    }
}
