//! One-shot snapshot as JSON on stdout.
//!
//! Rate metrics need two samples, so each selected collector runs once to
//! establish baselines, sleeps for the warmup window, then runs again; the
//! second snapshot is the one printed.

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use vitals_core::{MonitorConfig, Snapshot};

pub fn run(
    config: &MonitorConfig,
    filter: &str,
    warmup: f64,
    compact: bool,
    output: Option<&Path>,
) {
    let mut collectors = super::resolve_collectors(filter, config);

    for collector in &mut collectors {
        let _ = collector.collect();
    }
    if warmup > 0.0 {
        std::thread::sleep(Duration::from_secs_f64(warmup));
    }

    // BTreeMap for stable key order in the output.
    let mut report: BTreeMap<&str, Snapshot> = BTreeMap::new();
    for collector in &mut collectors {
        let name = collector.info().name;
        report.insert(name, collector.collect());
    }

    let json = if compact {
        serde_json::to_string(&report)
    } else {
        serde_json::to_string_pretty(&report)
    };
    let text = match json {
        Ok(text) => text,
        Err(e) => {
            eprintln!("failed to serialize snapshot: {e}");
            std::process::exit(1);
        }
    };
    match output {
        Some(path) => {
            if let Err(e) = std::fs::write(path, text) {
                eprintln!("failed to write {}: {e}", path.display());
                std::process::exit(1);
            }
        }
        None => println!("{text}"),
    }
}
