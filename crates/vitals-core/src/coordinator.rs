//! Collection coordinator: one background thread per collector, each on its
//! own cadence, publishing into a shared snapshot board.
//!
//! Publication is last-wins and atomic per collector: readers always see the
//! newest complete snapshot, never a half-written one. A collector that
//! overruns its cycle budget (one interval) skips publishing that cycle and
//! counts a failure; its previous snapshot stays on the board, which keeps a
//! slow collector from ever blocking the others or the reader.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use crate::collector::Collector;
use crate::sample::Snapshot;

/// How long a cadence sleep waits between stop-flag checks.
const TICK: Duration = Duration::from_millis(50);

/// A collector is reported unhealthy after this many consecutive overruns
/// or all-issue cycles.
const UNHEALTHY_AFTER: u64 = 3;

#[derive(Debug, Clone, Default)]
struct CycleStats {
    cycles: u64,
    failures: u64,
    consecutive_failures: u64,
    last_duration: Option<Duration>,
    last_partial: bool,
}

#[derive(Default)]
struct Board {
    snapshots: Mutex<HashMap<String, Arc<Snapshot>>>,
    stats: Mutex<HashMap<String, CycleStats>>,
}

pub struct Coordinator {
    board: Arc<Board>,
    stop: Arc<AtomicBool>,
    handles: Vec<JoinHandle<()>>,
    names: Vec<&'static str>,
}

impl Coordinator {
    /// Spawn one worker thread per collector. Each runs until `shutdown`.
    pub fn spawn(collectors: Vec<Box<dyn Collector>>) -> Self {
        let board = Arc::new(Board::default());
        let stop = Arc::new(AtomicBool::new(false));
        let mut handles = Vec::with_capacity(collectors.len());
        let mut names = Vec::with_capacity(collectors.len());

        for collector in collectors {
            let name = collector.info().name;
            names.push(name);
            let board = Arc::clone(&board);
            let stop = Arc::clone(&stop);
            let handle = std::thread::Builder::new()
                .name(format!("vitals-{name}"))
                .spawn(move || run_loop(collector, &board, &stop))
                .unwrap_or_else(|e| panic!("failed to spawn collector thread {name}: {e}"));
            handles.push(handle);
        }

        Self {
            board,
            stop,
            handles,
            names,
        }
    }

    /// Newest published snapshot for one collector. Reading never blocks a
    /// collection cycle longer than a map lookup, and re-reading between
    /// publishes returns the same `Arc`.
    pub fn latest(&self, collector: &str) -> Option<Arc<Snapshot>> {
        self.board
            .snapshots
            .lock()
            .expect("snapshot board poisoned")
            .get(collector)
            .cloned()
    }

    /// Newest snapshot per collector, for bulk rendering.
    pub fn latest_all(&self) -> HashMap<String, Arc<Snapshot>> {
        self.board
            .snapshots
            .lock()
            .expect("snapshot board poisoned")
            .clone()
    }

    /// Health report as structured data.
    pub fn health_report(&self) -> HealthReport {
        let stats = self.board.stats.lock().expect("stats board poisoned");
        let mut collectors = Vec::with_capacity(self.names.len());
        let mut healthy_count = 0;
        for &name in &self.names {
            let s = stats.get(name).cloned().unwrap_or_default();
            let healthy = s.consecutive_failures < UNHEALTHY_AFTER;
            if healthy {
                healthy_count += 1;
            }
            collectors.push(CollectorHealth {
                name: name.to_string(),
                healthy,
                cycles: s.cycles,
                failures: s.failures,
                consecutive_failures: s.consecutive_failures,
                last_cycle_secs: s.last_duration.map(|d| d.as_secs_f64()),
                last_partial: s.last_partial,
            });
        }
        HealthReport {
            healthy: healthy_count,
            total: self.names.len(),
            collectors,
        }
    }

    /// Signal every worker to stop and wait for them to drain. Workers
    /// notice within one tick; an in-flight `collect()` finishes first.
    pub fn shutdown(&mut self) {
        self.stop.store(true, Ordering::SeqCst);
        for handle in self.handles.drain(..) {
            if handle.join().is_err() {
                log::error!("collector thread panicked during shutdown");
            }
        }
    }
}

impl Drop for Coordinator {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn run_loop(mut collector: Box<dyn Collector>, board: &Board, stop: &AtomicBool) {
    let name = collector.info().name;
    let interval = collector.interval();
    // First cycle fires immediately so the board fills fast.
    let mut next_tick = Instant::now();

    while !stop.load(Ordering::SeqCst) {
        let now = Instant::now();
        if now < next_tick {
            std::thread::sleep(TICK.min(next_tick - now));
            continue;
        }

        let started = Instant::now();
        let snapshot = collector.collect();
        let elapsed = started.elapsed();

        // Budget = one interval. An overrun skips publishing so a stalled
        // collector can never put half-stale data in front of a fresh cycle.
        let overran = elapsed >= interval && !interval.is_zero();
        if overran {
            log::warn!(
                "{name}: cycle took {:.3}s, over the {:.3}s budget, dropping snapshot",
                elapsed.as_secs_f64(),
                interval.as_secs_f64()
            );
        } else {
            let snapshot = Arc::new(snapshot);
            board
                .snapshots
                .lock()
                .expect("snapshot board poisoned")
                .insert(name.to_string(), snapshot);
        }

        {
            let mut stats = board.stats.lock().expect("stats board poisoned");
            let s = stats.entry(name.to_string()).or_default();
            s.cycles += 1;
            s.last_duration = Some(elapsed);
            if overran {
                s.failures += 1;
                s.consecutive_failures += 1;
            } else {
                s.consecutive_failures = 0;
                s.last_partial = board
                    .snapshots
                    .lock()
                    .expect("snapshot board poisoned")
                    .get(name)
                    .is_some_and(|snap| snap.partial);
            }
        }

        // Advance by whole intervals; missed slots are skipped, never
        // stacked into a burst of catch-up cycles.
        next_tick += interval;
        let now = Instant::now();
        while next_tick <= now {
            next_tick += interval;
        }
    }
    log::debug!("{name}: collector thread stopped");
}

/// Overall health of the running collector set.
#[derive(Debug, Clone)]
pub struct HealthReport {
    /// Collectors currently under the consecutive-failure threshold.
    pub healthy: usize,
    pub total: usize,
    pub collectors: Vec<CollectorHealth>,
}

#[derive(Debug, Clone)]
pub struct CollectorHealth {
    pub name: String,
    pub healthy: bool,
    /// Completed cycles, including ones that overran and published nothing.
    pub cycles: u64,
    pub failures: u64,
    pub consecutive_failures: u64,
    pub last_cycle_secs: Option<f64>,
    /// Whether the newest published snapshot was degraded.
    pub last_partial: bool,
}
