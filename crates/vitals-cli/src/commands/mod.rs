pub mod list;
pub mod monitor;
pub mod snapshot;
pub mod watch;

use std::path::Path;

use vitals_core::{Collector, MonitorConfig, collector_by_name, collectors};

/// Load the monitor config. A missing file falls back to defaults; a file
/// that exists but cannot be parsed or fails validation is fatal, never
/// silently replaced with defaults.
pub fn load_config(path: Option<&Path>) -> MonitorConfig {
    match MonitorConfig::load(path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("config error: {e}");
            std::process::exit(2);
        }
    }
}

/// Resolve a comma-separated collector filter ("all" for everything) into
/// instantiated collectors. Unknown names are fatal, not ignored.
pub fn resolve_collectors(filter: &str, config: &MonitorConfig) -> Vec<Box<dyn Collector>> {
    if filter == "all" {
        return collectors::all_collectors(config);
    }
    let mut out = Vec::new();
    for name in filter.split(',').map(str::trim).filter(|n| !n.is_empty()) {
        match collector_by_name(name, config) {
            Some(c) => out.push(c),
            None => {
                eprintln!(
                    "unknown collector '{name}' (available: {})",
                    collectors::COLLECTOR_NAMES.join(", ")
                );
                std::process::exit(2);
            }
        }
    }
    if out.is_empty() {
        eprintln!("no collectors selected");
        std::process::exit(2);
    }
    out
}

/// Human-readable byte count, binary units.
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 6] = ["B", "KiB", "MiB", "GiB", "TiB", "PiB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{bytes} B")
    } else {
        format!("{value:.1} {}", UNITS[unit])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_bytes_small() {
        assert_eq!(format_bytes(0), "0 B");
        assert_eq!(format_bytes(512), "512 B");
    }

    #[test]
    fn test_format_bytes_units() {
        assert_eq!(format_bytes(1024), "1.0 KiB");
        assert_eq!(format_bytes(1536), "1.5 KiB");
        assert_eq!(format_bytes(8 * 1024 * 1024 * 1024), "8.0 GiB");
    }

    #[test]
    fn test_resolve_all() {
        let config = MonitorConfig::default();
        let all = resolve_collectors("all", &config);
        assert_eq!(all.len(), collectors::COLLECTOR_NAMES.len());
    }

    #[test]
    fn test_resolve_filter() {
        let config = MonitorConfig::default();
        let some = resolve_collectors("cpu, memory", &config);
        let names: Vec<&str> = some.iter().map(|c| c.info().name).collect();
        assert_eq!(names, ["cpu", "memory"]);
    }
}
