//! The built-in collectors. Each owns its own delta state and interval.

mod cpu;
mod logs;
mod memory;
mod process;
mod storage;

pub use cpu::CpuCollector;
pub use logs::LogCollector;
pub use memory::MemoryCollector;
pub use process::ProcessCollector;
pub use storage::StorageCollector;

use crate::collector::Collector;
use crate::config::MonitorConfig;

/// Collector names in display order.
pub const COLLECTOR_NAMES: [&str; 5] = ["cpu", "memory", "process", "storage", "logs"];

/// Instantiate every built-in collector from one config.
pub fn all_collectors(config: &MonitorConfig) -> Vec<Box<dyn Collector>> {
    vec![
        Box::new(CpuCollector::new(config)),
        Box::new(MemoryCollector::new(config)),
        Box::new(ProcessCollector::new(config)),
        Box::new(StorageCollector::new(config)),
        Box::new(LogCollector::new(config)),
    ]
}

/// Instantiate a single collector by name.
pub fn collector_by_name(name: &str, config: &MonitorConfig) -> Option<Box<dyn Collector>> {
    let boxed: Box<dyn Collector> = match name {
        "cpu" => Box::new(CpuCollector::new(config)),
        "memory" => Box::new(MemoryCollector::new(config)),
        "process" => Box::new(ProcessCollector::new(config)),
        "storage" => Box::new(StorageCollector::new(config)),
        "logs" => Box::new(LogCollector::new(config)),
        _ => return None,
    };
    Some(boxed)
}
