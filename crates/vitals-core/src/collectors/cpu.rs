//! CPU collector: aggregate and per-core usage from `/proc/stat` tick
//! deltas, plus load averages and clock frequencies as gauges.
//!
//! Busy ticks are total minus idle minus iowait, so steal time counts as
//! busy: it is CPU the workload wanted but did not get, and showing it as
//! idle would understate pressure.

use std::time::Duration;

use crate::collector::{Collector, CollectorInfo};
use crate::config::MonitorConfig;
use crate::delta::{DeltaOutcome, DeltaTable, clamp_percent, percentage};
use crate::procfs::{self, Unavailable};
use crate::sample::{CpuStats, Metric, RawSample, Snapshot, SnapshotData};

static CPU_INFO: CollectorInfo = CollectorInfo {
    name: "cpu",
    description: "Aggregate and per-core usage, load averages, clock frequency",
    default_interval: Duration::from_secs(1),
};

pub struct CpuCollector {
    interval: Duration,
    deltas: DeltaTable,
    warning: f64,
    critical: f64,
}

impl CpuCollector {
    pub fn new(config: &MonitorConfig) -> Self {
        Self {
            interval: config.cpu_interval(),
            deltas: DeltaTable::new(),
            warning: config.cpu_warning_threshold,
            critical: config.cpu_critical_threshold,
        }
    }

    /// Build one snapshot from already-read counter text. Separated from
    /// `collect()` so cycles are reproducible under test.
    fn build(
        &mut self,
        now: f64,
        stat: Result<String, Unavailable>,
        cpuinfo: Result<String, Unavailable>,
        load: Option<(f64, f64, f64)>,
    ) -> Snapshot {
        let mut stats = CpuStats::default();
        let mut issues = Vec::new();

        match stat {
            Ok(content) => {
                let times = procfs::parse_stat_cpu_lines(&content);
                if times.is_empty() {
                    issues.push("/proc/stat: no cpu lines".to_string());
                }
                let live: Vec<String> = times.iter().map(|t| t.entity_id()).collect();
                // Offlined cores must not leave stale baselines behind.
                self.deltas.retain(|id| live.iter().any(|l| l == id));

                for t in &times {
                    let sample = RawSample::new(t.entity_id(), now)
                        .with_field("busy", t.busy())
                        .with_field("total", t.total());
                    let entity = t.entity_id();
                    match self.deltas.observe(sample) {
                        DeltaOutcome::Window(w) => {
                            let (Some(busy), Some(total)) =
                                (w.counted("busy"), w.counted("total"))
                            else {
                                issues.push(format!("{entity}: counter reset, no rate"));
                                continue;
                            };
                            if total == 0 {
                                // Interval shorter than one tick; nothing to say.
                                continue;
                            }
                            let (value, clamped) =
                                clamp_percent(percentage(busy, total as f64), 1);
                            if clamped {
                                log::warn!("{entity}: usage clamped to {value}");
                                issues.push(format!("{entity}: usage clamped"));
                            }
                            stats.usage.push(
                                Metric::percentage(entity, value)
                                    .graded(self.warning, self.critical),
                            );
                        }
                        DeltaOutcome::First | DeltaOutcome::Stale => {}
                    }
                }
            }
            Err(e) => issues.push(e.to_string()),
        }

        match cpuinfo {
            Ok(content) => {
                let info = procfs::parse_cpuinfo(&content);
                stats.core_count = info.count;
                stats.model_name = info.model_name;
                stats.frequencies_mhz = info.frequencies_mhz;
                if !stats.frequencies_mhz.is_empty() {
                    let avg = stats.frequencies_mhz.iter().sum::<f64>()
                        / stats.frequencies_mhz.len() as f64;
                    stats.frequency_avg = Some(Metric::absolute("frequency", avg, "MHz"));
                }
            }
            Err(e) => issues.push(e.to_string()),
        }
        if stats.core_count == 0 {
            stats.core_count = procfs::core_count();
        }

        if let Some((l1, l5, l15)) = load {
            stats.load_1m = Some(l1);
            stats.load_5m = Some(l5);
            stats.load_15m = Some(l15);
            stats.load_1m_percent = Some(100.0 * l1 / stats.core_count.max(1) as f64);
        }

        let mut snap = Snapshot::new(CPU_INFO.name, SnapshotData::Cpu(stats));
        for issue in issues {
            snap.degrade(issue);
        }
        snap
    }
}

impl Collector for CpuCollector {
    fn info(&self) -> &CollectorInfo {
        &CPU_INFO
    }

    fn interval(&self) -> Duration {
        self.interval
    }

    fn collect(&mut self) -> Snapshot {
        let now = procfs::monotonic_seconds();
        // getloadavg first; /proc/loadavg is the fallback.
        let load = procfs::loadavg().or_else(|| {
            procfs::read_proc("/proc/loadavg")
                .ok()
                .and_then(|c| procfs::parse_loadavg(&c))
        });
        self.build(
            now,
            procfs::read_proc("/proc/stat"),
            procfs::read_proc("/proc/cpuinfo"),
            load,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sample::{MetricKind, Severity};

    fn collector() -> CpuCollector {
        CpuCollector::new(&MonitorConfig::default())
    }

    fn stat(aggregate: (u64, u64), core0: (u64, u64)) -> Result<String, Unavailable> {
        // (user, idle); everything else zero.
        Ok(format!(
            "cpu  {} 0 0 {} 0 0 0 0 0 0\ncpu0 {} 0 0 {} 0 0 0 0 0 0\n",
            aggregate.0, aggregate.1, core0.0, core0.1
        ))
    }

    fn cpu_stats(snap: &Snapshot) -> &CpuStats {
        match &snap.data {
            SnapshotData::Cpu(s) => s,
            other => panic!("expected cpu data, got {other:?}"),
        }
    }

    #[test]
    fn first_cycle_has_no_usage() {
        let mut c = collector();
        let snap = c.build(1.0, stat((100, 900), (100, 900)), Ok(String::new()), None);
        assert!(cpu_stats(&snap).usage.is_empty());
        assert!(!snap.partial);
    }

    #[test]
    fn second_cycle_computes_fifty_percent() {
        // user 100->150, idle 900->950: busy delta 50 of total delta 100.
        let mut c = collector();
        c.build(0.0, stat((100, 900), (100, 900)), Ok(String::new()), None);
        let snap = c.build(1.0, stat((150, 950), (150, 950)), Ok(String::new()), None);
        let stats = cpu_stats(&snap);
        let total = stats.usage.iter().find(|m| m.entity_id == "total").unwrap();
        assert!((total.value - 50.0).abs() < 1e-9);
        assert_eq!(total.severity, Severity::Normal);
        let core = stats.usage.iter().find(|m| m.entity_id == "core-0").unwrap();
        assert!((core.value - 50.0).abs() < 1e-9);
    }

    #[test]
    fn high_usage_is_graded_critical() {
        let mut c = collector();
        c.build(0.0, stat((100, 900), (100, 900)), Ok(String::new()), None);
        // busy delta 95, total delta 100 => 95% >= critical 90.
        let snap = c.build(1.0, stat((195, 905), (195, 905)), Ok(String::new()), None);
        let total = cpu_stats(&snap)
            .usage
            .iter()
            .find(|m| m.entity_id == "total")
            .unwrap();
        assert_eq!(total.severity, Severity::Critical);
    }

    #[test]
    fn counter_reset_degrades_only_that_entity() {
        let mut c = collector();
        c.build(0.0, stat((1000, 9000), (1000, 9000)), Ok(String::new()), None);
        // Aggregate resets, core-0 keeps counting.
        let snap = c.build(
            1.0,
            Ok("cpu  10 0 0 90 0 0 0 0 0 0\ncpu0 1050 0 0 9050 0 0 0 0 0 0\n".to_string()),
            Ok(String::new()),
            None,
        );
        let stats = cpu_stats(&snap);
        assert!(stats.usage.iter().all(|m| m.entity_id != "total"));
        assert!(stats.usage.iter().any(|m| m.entity_id == "core-0"));
        assert!(snap.partial);
    }

    #[test]
    fn unavailable_stat_is_partial_not_fatal() {
        let mut c = collector();
        let snap = c.build(
            1.0,
            Err(Unavailable {
                source: "/proc/stat".to_string(),
                reason: "permission denied".to_string(),
            }),
            Ok(String::new()),
            Some((0.5, 0.4, 0.3)),
        );
        assert!(snap.partial);
        // Gauges still populate.
        assert_eq!(cpu_stats(&snap).load_1m, Some(0.5));
    }

    #[test]
    fn offlined_core_drops_its_baseline() {
        let mut c = collector();
        c.build(0.0, stat((100, 900), (100, 900)), Ok(String::new()), None);
        // core-0 disappears; only the aggregate remains.
        c.build(
            1.0,
            Ok("cpu  150 0 0 950 0 0 0 0 0 0\n".to_string()),
            Ok(String::new()),
            None,
        );
        assert!(!c.deltas.contains("core-0"));
        assert!(c.deltas.contains("total"));
    }

    #[test]
    fn load_percent_uses_core_count() {
        let mut c = collector();
        let cpuinfo = "processor\t: 0\nprocessor\t: 1\nprocessor\t: 2\nprocessor\t: 3\n";
        let snap = c.build(
            1.0,
            stat((1, 9), (1, 9)),
            Ok(cpuinfo.to_string()),
            Some((2.0, 1.0, 0.5)),
        );
        let stats = cpu_stats(&snap);
        assert_eq!(stats.core_count, 4);
        assert!((stats.load_1m_percent.unwrap() - 50.0).abs() < 1e-9);
    }

    #[test]
    fn frequency_gauge_averages_cores() {
        let mut c = collector();
        let cpuinfo = "processor\t: 0\ncpu MHz\t\t: 2000.000\n\
                       processor\t: 1\ncpu MHz\t\t: 3000.000\n";
        let snap = c.build(1.0, stat((1, 9), (1, 9)), Ok(cpuinfo.to_string()), None);
        let freq = cpu_stats(&snap).frequency_avg.as_ref().unwrap();
        assert_eq!(freq.kind, MetricKind::Absolute);
        assert_eq!(freq.unit, "MHz");
        assert!((freq.value - 2500.0).abs() < 1e-9);
        // No frequencies exposed: no gauge, not a zero.
        let snap = c.build(2.0, stat((2, 18), (2, 18)), Ok(String::new()), None);
        assert_eq!(cpu_stats(&snap).frequency_avg, None);
    }
}
