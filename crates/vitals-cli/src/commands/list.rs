//! List the built-in collectors, their cadences, and descriptions.

use vitals_core::{MonitorConfig, collectors};

pub fn run(config: &MonitorConfig) {
    let all = collectors::all_collectors(config);
    println!("{:<10} {:>9} {:>9}  DESCRIPTION", "NAME", "INTERVAL", "DEFAULT");
    for collector in &all {
        let info = collector.info();
        println!(
            "{:<10} {:>8.1}s {:>8.1}s  {}",
            info.name,
            collector.interval().as_secs_f64(),
            info.default_interval.as_secs_f64(),
            info.description
        );
    }
}
