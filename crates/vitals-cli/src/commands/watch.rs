//! Plain-text watch mode: one summary block per interval, pipe-friendly.
//!
//! Collectors run on their own cadences in the background; this loop only
//! reads the board, so a slow collector shows its previous snapshot instead
//! of stalling the output.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use vitals_core::{Coordinator, MonitorConfig, Snapshot, SnapshotData};

pub fn run(config: &MonitorConfig, interval: f64, filter: &str) {
    if !(interval > 0.0) {
        eprintln!("watch interval must be positive, got {interval}");
        std::process::exit(2);
    }
    let collectors = super::resolve_collectors(filter, config);
    let names: Vec<&'static str> = collectors.iter().map(|c| c.info().name).collect();
    let mut coord = Coordinator::spawn(collectors);

    let running = Arc::new(AtomicBool::new(true));
    {
        let running = Arc::clone(&running);
        if let Err(e) = ctrlc::set_handler(move || running.store(false, Ordering::SeqCst)) {
            log::warn!("could not install Ctrl-C handler: {e}");
        }
    }

    let tick = Duration::from_millis(100);
    let mut elapsed = Duration::ZERO;
    let period = Duration::from_secs_f64(interval);
    // First print happens after one period, once the boards have data.
    while running.load(Ordering::SeqCst) {
        std::thread::sleep(tick);
        elapsed += tick;
        if elapsed < period {
            continue;
        }
        elapsed = Duration::ZERO;

        for &name in &names {
            match coord.latest(name) {
                Some(snap) => print_summary(&snap),
                None => println!("{name:<8} (no data yet)"),
            }
        }
        println!();
    }

    coord.shutdown();
}

fn print_summary(snap: &Snapshot) {
    let flag = if snap.partial { " [partial]" } else { "" };
    match &snap.data {
        SnapshotData::Cpu(cpu) => {
            let total = cpu
                .usage
                .iter()
                .find(|m| m.entity_id == "total")
                .map(|m| format!("{:.1}%", m.value))
                .unwrap_or_else(|| "--".to_string());
            let load = cpu
                .load_1m
                .map(|l| format!("{l:.2}"))
                .unwrap_or_else(|| "--".to_string());
            println!(
                "cpu      {total} busy   load {load}   {} cores{flag}",
                cpu.core_count
            );
        }
        SnapshotData::Memory(mem) => {
            let percent = mem
                .used_percent
                .as_ref()
                .map(|m| format!("{:.1}%", m.value))
                .unwrap_or_else(|| "--".to_string());
            println!(
                "memory   {} / {} used ({percent}){flag}",
                super::format_bytes(mem.used),
                super::format_bytes(mem.total)
            );
        }
        SnapshotData::Processes(procs) => {
            let top = procs
                .rows
                .first()
                .map(|r| {
                    format!(
                        "top {} {}",
                        r.name,
                        r.cpu_percent
                            .map(|c| format!("{c:.1}%"))
                            .unwrap_or_else(|| "--".to_string())
                    )
                })
                .unwrap_or_default();
            println!(
                "process  {} total ({} running)   {top}{flag}",
                procs.total_processes, procs.running
            );
        }
        SnapshotData::Storage(storage) => {
            let fullest = storage
                .filesystems
                .iter()
                .max_by(|a, b| a.used_percent.total_cmp(&b.used_percent))
                .map(|fs| format!("{} {:.1}% full", fs.mount_point, fs.used_percent))
                .unwrap_or_else(|| "no filesystems".to_string());
            let io = match (&storage.read_bytes_per_sec, &storage.write_bytes_per_sec) {
                (Some(r), Some(w)) => format!(
                    "   R {}/s W {}/s",
                    super::format_bytes(r.value as u64),
                    super::format_bytes(w.value as u64)
                ),
                _ => String::new(),
            };
            println!(
                "storage  {} filesystems, {} devices   {fullest}{io}{flag}",
                storage.filesystems.len(),
                storage.devices.len()
            );
        }
        SnapshotData::Logs(logs) => {
            println!(
                "logs     {} flagged, {} lines shown ({}){flag}",
                logs.error_count,
                logs.lines.len(),
                logs.source
            );
        }
    }
}
