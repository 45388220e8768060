//! Stateless counter reader: bounded reads of procfs/sysfs text, tolerant
//! parsers, and thin libc wrappers.
//!
//! The contract at this boundary: a missing or unreadable source degrades to
//! [`Unavailable`], and an unparsable line degrades to an absent field. The
//! kernel rewrites these files concurrently, so partially-written text is
//! normal, not an error.

use std::collections::HashMap;
use std::io::Read;
use std::path::Path;
use std::process::Stdio;
use std::sync::OnceLock;
use std::time::{Duration, Instant};

/// A counter source that could not be read this cycle.
///
/// Carried into snapshot issues; retried unconditionally next cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Unavailable {
    pub source: String,
    pub reason: String,
}

impl std::fmt::Display for Unavailable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.source, self.reason)
    }
}

impl std::error::Error for Unavailable {}

/// Read a whole procfs-style file as text.
pub fn read_proc(path: &str) -> Result<String, Unavailable> {
    std::fs::read_to_string(path).map_err(|e| Unavailable {
        source: path.to_string(),
        reason: e.to_string(),
    })
}

/// Monotonic seconds from a process-local epoch.
///
/// Used as the sample timestamp for all delta math: immune to wall-clock
/// steps, cheap to read.
pub fn monotonic_seconds() -> f64 {
    static EPOCH: OnceLock<Instant> = OnceLock::new();
    let epoch = EPOCH.get_or_init(Instant::now);
    epoch.elapsed().as_secs_f64()
}

// ---------------------------------------------------------------------------
// /proc/stat
// ---------------------------------------------------------------------------

/// Cumulative tick counters for one CPU entity from `/proc/stat`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CpuTimes {
    /// `"cpu"` for the aggregate, `"cpu0"`, `"cpu1"`, ... per core.
    pub name: String,
    pub user: u64,
    pub nice: u64,
    pub system: u64,
    pub idle: u64,
    pub iowait: u64,
    pub irq: u64,
    pub softirq: u64,
    pub steal: u64,
    pub guest: u64,
    pub guest_nice: u64,
}

impl CpuTimes {
    pub fn total(&self) -> u64 {
        self.user
            + self.nice
            + self.system
            + self.idle
            + self.iowait
            + self.irq
            + self.softirq
            + self.steal
            + self.guest
            + self.guest_nice
    }

    /// Ticks spent doing nothing: idle plus iowait. Steal counts as busy.
    pub fn idle_total(&self) -> u64 {
        self.idle + self.iowait
    }

    pub fn busy(&self) -> u64 {
        self.total() - self.idle_total()
    }

    /// Entity id for the delta table: `"total"` or `"core-N"`.
    pub fn entity_id(&self) -> String {
        if self.name == "cpu" {
            "total".to_string()
        } else {
            format!("core-{}", &self.name[3..])
        }
    }
}

/// Parse the `cpu*` lines of `/proc/stat`. Malformed lines are skipped.
pub fn parse_stat_cpu_lines(content: &str) -> Vec<CpuTimes> {
    let mut out = Vec::new();
    for line in content.lines() {
        if !line.starts_with("cpu") {
            continue;
        }
        let mut parts = line.split_whitespace();
        let Some(name) = parts.next() else { continue };
        let values: Vec<u64> = parts.map_while(|p| p.parse().ok()).collect();
        // user/nice/system/idle are the minimum the kernel has always exposed.
        if values.len() < 4 {
            continue;
        }
        let at = |i: usize| values.get(i).copied().unwrap_or(0);
        out.push(CpuTimes {
            name: name.to_string(),
            user: at(0),
            nice: at(1),
            system: at(2),
            idle: at(3),
            iowait: at(4),
            irq: at(5),
            softirq: at(6),
            steal: at(7),
            guest: at(8),
            guest_nice: at(9),
        });
    }
    out
}

// ---------------------------------------------------------------------------
// /proc/loadavg and libc getloadavg
// ---------------------------------------------------------------------------

/// Parse the three load averages from `/proc/loadavg` text.
pub fn parse_loadavg(content: &str) -> Option<(f64, f64, f64)> {
    let mut parts = content.split_whitespace();
    let l1 = parts.next()?.parse().ok()?;
    let l5 = parts.next()?.parse().ok()?;
    let l15 = parts.next()?.parse().ok()?;
    Some((l1, l5, l15))
}

/// Load averages via `getloadavg(3)`, avoiding a procfs dependency.
pub fn loadavg() -> Option<(f64, f64, f64)> {
    #[cfg(unix)]
    {
        let mut values = [0.0_f64; 3];
        // SAFETY: `getloadavg` writes up to `n` doubles to a valid buffer.
        let n = unsafe { libc::getloadavg(values.as_mut_ptr(), 3) };
        if n == 3 {
            Some((values[0], values[1], values[2]))
        } else {
            None
        }
    }
    #[cfg(not(unix))]
    {
        None
    }
}

// ---------------------------------------------------------------------------
// /proc/meminfo
// ---------------------------------------------------------------------------

/// Parse `/proc/meminfo` into bytes per key. Unparsable lines are dropped.
pub fn parse_meminfo(content: &str) -> HashMap<String, u64> {
    let mut out = HashMap::new();
    for line in content.lines() {
        let Some((key, rest)) = line.split_once(':') else {
            continue;
        };
        let Some(value_kb) = rest
            .split_whitespace()
            .next()
            .and_then(|v| v.parse::<u64>().ok())
        else {
            continue;
        };
        out.insert(key.trim().to_string(), value_kb * 1024);
    }
    out
}

// ---------------------------------------------------------------------------
// /proc/cpuinfo
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Default)]
pub struct CpuInfo {
    pub count: usize,
    pub model_name: Option<String>,
    /// Instantaneous per-core clock, where the kernel exposes `cpu MHz`.
    pub frequencies_mhz: Vec<f64>,
}

pub fn parse_cpuinfo(content: &str) -> CpuInfo {
    let mut info = CpuInfo::default();
    for line in content.lines() {
        if line.starts_with("processor") {
            info.count += 1;
        } else if line.starts_with("model name") && info.model_name.is_none() {
            info.model_name = line
                .split_once(':')
                .map(|(_, v)| v.trim().to_string())
                .filter(|v| !v.is_empty());
        } else if line.starts_with("cpu MHz")
            && let Some(mhz) = line.split_once(':').and_then(|(_, v)| v.trim().parse().ok())
        {
            info.frequencies_mhz.push(mhz);
        }
    }
    info
}

// ---------------------------------------------------------------------------
// /proc/diskstats
// ---------------------------------------------------------------------------

/// Cumulative I/O counters for one block device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiskCounters {
    pub device: String,
    pub reads_completed: u64,
    pub sectors_read: u64,
    pub read_time_ms: u64,
    pub writes_completed: u64,
    pub sectors_written: u64,
    pub write_time_ms: u64,
    pub io_in_progress: u64,
    pub io_time_ms: u64,
}

/// Parse `/proc/diskstats`. Lines with fewer than the 14 classic fields are
/// skipped; partitions are kept (filtering is a policy choice upstream).
pub fn parse_diskstats(content: &str) -> Vec<DiskCounters> {
    let mut out = Vec::new();
    for line in content.lines() {
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() < 14 {
            continue;
        }
        let num = |i: usize| fields[i].parse::<u64>().ok();
        let Some(counters) = (|| {
            Some(DiskCounters {
                device: fields[2].to_string(),
                reads_completed: num(3)?,
                sectors_read: num(5)?,
                read_time_ms: num(6)?,
                writes_completed: num(7)?,
                sectors_written: num(9)?,
                write_time_ms: num(10)?,
                io_in_progress: num(11)?,
                io_time_ms: num(12)?,
            })
        })() else {
            continue;
        };
        out.push(counters);
    }
    out
}

/// Whether `name` looks like a partition of another listed device
/// (e.g. `sda1` of `sda`, `nvme0n1p2` of `nvme0n1`).
pub fn is_partition_of(name: &str, all_names: &[String]) -> bool {
    all_names.iter().any(|parent| {
        parent.as_str() != name
            && name.starts_with(parent.as_str())
            && name[parent.len()..]
                .trim_start_matches('p')
                .chars()
                .all(|c| c.is_ascii_digit())
            && !name[parent.len()..].is_empty()
    })
}

// ---------------------------------------------------------------------------
// /proc/mounts and filesystem capacity
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MountEntry {
    pub device: String,
    pub mount_point: String,
    pub fs_type: String,
}

pub fn parse_mounts(content: &str) -> Vec<MountEntry> {
    let mut out = Vec::new();
    for line in content.lines() {
        let mut parts = line.split_whitespace();
        let (Some(device), Some(mount_point), Some(fs_type)) =
            (parts.next(), parts.next(), parts.next())
        else {
            continue;
        };
        out.push(MountEntry {
            device: device.to_string(),
            mount_point: mount_point.to_string(),
            fs_type: fs_type.to_string(),
        });
    }
    out
}

/// On-disk filesystem types worth reporting; virtual mounts are noise.
pub fn real_filesystem(fs_type: &str) -> bool {
    matches!(
        fs_type,
        "ext2"
            | "ext3"
            | "ext4"
            | "xfs"
            | "btrfs"
            | "reiserfs"
            | "jfs"
            | "ntfs"
            | "vfat"
            | "exfat"
            | "f2fs"
            | "zfs"
    )
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FsCapacity {
    pub total_bytes: u64,
    pub free_bytes: u64,
    /// Free bytes available to unprivileged users.
    pub avail_bytes: u64,
}

/// Capacity of a mounted filesystem via `statvfs(3)`.
pub fn fs_capacity(mount_point: &str) -> Option<FsCapacity> {
    #[cfg(unix)]
    {
        use std::ffi::CString;
        let path = CString::new(mount_point).ok()?;
        let mut stat: libc::statvfs = unsafe { std::mem::zeroed() };
        // SAFETY: `path` is a valid NUL-terminated string and `stat` is a
        // properly sized out-parameter.
        let rc = unsafe { libc::statvfs(path.as_ptr(), &mut stat) };
        if rc != 0 {
            return None;
        }
        let frsize = stat.f_frsize as u64;
        Some(FsCapacity {
            total_bytes: stat.f_blocks as u64 * frsize,
            free_bytes: stat.f_bfree as u64 * frsize,
            avail_bytes: stat.f_bavail as u64 * frsize,
        })
    }
    #[cfg(not(unix))]
    {
        let _ = mount_point;
        None
    }
}

// ---------------------------------------------------------------------------
// Per-process files
// ---------------------------------------------------------------------------

/// The fields of `/proc/[pid]/stat` this crate cares about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PidStat {
    pub pid: i32,
    pub comm: String,
    pub state: char,
    pub ppid: i32,
    pub nice: i64,
    pub num_threads: u64,
    /// utime + stime, cumulative clock ticks.
    pub cpu_ticks: u64,
    /// Jiffies after boot when the process started. Part of the process
    /// identity: a reused pid with a different starttime is a new process.
    pub starttime: u64,
    pub rss_pages: i64,
}

/// Parse `/proc/[pid]/stat`. The comm field may contain spaces and
/// parentheses, so everything is anchored on the *last* `)`.
pub fn parse_pid_stat(content: &str) -> Option<PidStat> {
    let open = content.find('(')?;
    let close = content.rfind(')')?;
    let pid = content[..open].trim().parse().ok()?;
    let comm = content[open + 1..close].to_string();
    // Fields after comm, 0-indexed: state=0, ppid=1, ..., utime=11, stime=12,
    // nice=16, num_threads=17, starttime=19, rss=21.
    let rest: Vec<&str> = content[close + 1..].split_whitespace().collect();
    if rest.len() < 22 {
        return None;
    }
    let utime: u64 = rest[11].parse().ok()?;
    let stime: u64 = rest[12].parse().ok()?;
    Some(PidStat {
        pid,
        comm,
        state: rest[0].chars().next()?,
        ppid: rest[1].parse().ok()?,
        nice: rest[16].parse().ok()?,
        num_threads: rest[17].parse().ok()?,
        cpu_ticks: utime + stime,
        starttime: rest[19].parse().ok()?,
        rss_pages: rest[21].parse().ok()?,
    })
}

/// Selected lines of `/proc/[pid]/status`. Every field is optional: a line
/// that fails to parse is simply absent.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PidStatus {
    pub vm_rss_bytes: Option<u64>,
    pub vm_size_bytes: Option<u64>,
    pub threads: Option<u64>,
}

pub fn parse_pid_status(content: &str) -> PidStatus {
    let mut status = PidStatus::default();
    let kb_field = |line: &str| -> Option<u64> {
        line.split_whitespace()
            .nth(1)
            .and_then(|v| v.parse::<u64>().ok())
            .map(|kb| kb * 1024)
    };
    for line in content.lines() {
        if line.starts_with("VmRSS:") {
            status.vm_rss_bytes = kb_field(line);
        } else if line.starts_with("VmSize:") {
            status.vm_size_bytes = kb_field(line);
        } else if line.starts_with("Threads:") {
            status.threads = line
                .split_whitespace()
                .nth(1)
                .and_then(|v| v.parse().ok());
        }
    }
    status
}

/// NUL-separated `/proc/[pid]/cmdline` as a single printable string.
pub fn parse_cmdline(raw: &str) -> String {
    raw.replace('\0', " ").trim().to_string()
}

/// Currently live pids, from the numeric entries of `/proc`.
pub fn list_pids() -> Vec<i32> {
    let Ok(entries) = std::fs::read_dir("/proc") else {
        return Vec::new();
    };
    let mut pids: Vec<i32> = entries
        .flatten()
        .filter_map(|e| e.file_name().to_str().and_then(|n| n.parse().ok()))
        .collect();
    pids.sort_unstable();
    pids
}

/// Whether a pid directory still exists (a process can vanish between
/// listing and reading; callers treat that as an absent entity).
pub fn pid_alive(pid: i32) -> bool {
    Path::new(&format!("/proc/{pid}")).exists()
}

// ---------------------------------------------------------------------------
// System constants
// ---------------------------------------------------------------------------

/// Kernel clock ticks per second (`_SC_CLK_TCK`), the unit of process CPU
/// accounting. Falls back to the near-universal 100.
pub fn clock_ticks_per_second() -> f64 {
    #[cfg(unix)]
    {
        // SAFETY: sysconf with a valid name constant is always safe.
        let ticks = unsafe { libc::sysconf(libc::_SC_CLK_TCK) };
        if ticks > 0 {
            return ticks as f64;
        }
    }
    100.0
}

/// Memory page size in bytes, fallback 4096.
pub fn page_size() -> u64 {
    #[cfg(unix)]
    {
        // SAFETY: sysconf with a valid name constant is always safe.
        let size = unsafe { libc::sysconf(libc::_SC_PAGESIZE) };
        if size > 0 {
            return size as u64;
        }
    }
    4096
}

/// Logical core count, used as the upper bound for aggregate percentages.
pub fn core_count() -> usize {
    std::thread::available_parallelism()
        .map(std::num::NonZero::get)
        .unwrap_or(1)
}

// ---------------------------------------------------------------------------
// Bounded subprocess reads
// ---------------------------------------------------------------------------

/// Run a command with a hard wall-clock timeout, returning trimmed stdout.
///
/// The child is polled with `try_wait` and killed on deadline, so no single
/// read can stall a collection cycle indefinitely.
pub fn run_command(cmd: &str, args: &[&str], timeout: Duration) -> Option<String> {
    let mut child = std::process::Command::new(cmd)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .ok()?;

    // Drain the pipe on its own thread while polling for exit: a child that
    // writes more than the pipe capacity would otherwise block on write and
    // never exit, turning the deadline kill into total output loss.
    let mut stdout = child.stdout.take()?;
    let reader = std::thread::spawn(move || {
        let mut out = Vec::new();
        let _ = stdout.read_to_end(&mut out);
        out
    });

    let start = Instant::now();
    loop {
        match child.try_wait() {
            Ok(Some(status)) => {
                let out = reader.join().unwrap_or_default();
                if !status.success() {
                    return None;
                }
                let s = String::from_utf8_lossy(&out).trim().to_string();
                return if s.is_empty() { None } else { Some(s) };
            }
            Ok(None) => {
                if start.elapsed() >= timeout {
                    let _ = child.kill();
                    let _ = child.wait();
                    let _ = reader.join();
                    log::warn!("command {cmd} exceeded {timeout:?}, killed");
                    return None;
                }
                std::thread::sleep(Duration::from_millis(5));
            }
            Err(_) => {
                let _ = child.kill();
                let _ = child.wait();
                let _ = reader.join();
                return None;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // -----------------------------------------------------------------------
    // /proc/stat
    // -----------------------------------------------------------------------

    const STAT: &str = "\
cpu  100 5 30 900 20 3 2 10 0 0
cpu0 50 2 15 450 10 1 1 5 0 0
cpu1 50 3 15 450 10 2 1 5 0 0
intr 12345 0 1
ctxt 987654
";

    #[test]
    fn parses_aggregate_and_per_core_lines() {
        let times = parse_stat_cpu_lines(STAT);
        assert_eq!(times.len(), 3);
        assert_eq!(times[0].name, "cpu");
        assert_eq!(times[0].entity_id(), "total");
        assert_eq!(times[1].entity_id(), "core-0");
        assert_eq!(times[2].entity_id(), "core-1");
        assert_eq!(times[0].total(), 1070);
        assert_eq!(times[0].idle_total(), 920);
        assert_eq!(times[0].busy(), 150);
    }

    #[test]
    fn short_cpu_line_still_parses() {
        // Ancient kernels expose only user/nice/system/idle.
        let times = parse_stat_cpu_lines("cpu 1 2 3 4\n");
        assert_eq!(times.len(), 1);
        assert_eq!(times[0].total(), 10);
        assert_eq!(times[0].steal, 0);
    }

    #[test]
    fn malformed_cpu_line_is_skipped() {
        let times = parse_stat_cpu_lines("cpu  1 2\ncpu0 garbage here\ncpu1 1 2 3 4\n");
        assert_eq!(times.len(), 1);
        assert_eq!(times[0].name, "cpu1");
    }

    // -----------------------------------------------------------------------
    // /proc/loadavg, /proc/meminfo, /proc/cpuinfo
    // -----------------------------------------------------------------------

    #[test]
    fn parses_loadavg_text() {
        assert_eq!(
            parse_loadavg("0.52 0.58 0.59 1/389 12345\n"),
            Some((0.52, 0.58, 0.59))
        );
        assert_eq!(parse_loadavg("not numbers"), None);
    }

    #[test]
    fn meminfo_values_in_bytes() {
        let mem = parse_meminfo(
            "MemTotal:       16384000 kB\nMemAvailable:    8192000 kB\nBogus line\nHugePagesize:       2048 kB\n",
        );
        assert_eq!(mem.get("MemTotal"), Some(&(16_384_000 * 1024)));
        assert_eq!(mem.get("MemAvailable"), Some(&(8_192_000 * 1024)));
        assert!(!mem.contains_key("Bogus line"));
    }

    #[test]
    fn cpuinfo_extracts_count_model_and_mhz() {
        let info = parse_cpuinfo(
            "processor\t: 0\nmodel name\t: Example CPU @ 3.0GHz\ncpu MHz\t\t: 2994.375\n\nprocessor\t: 1\nmodel name\t: Example CPU @ 3.0GHz\ncpu MHz\t\t: 3001.221\n",
        );
        assert_eq!(info.count, 2);
        assert_eq!(info.model_name.as_deref(), Some("Example CPU @ 3.0GHz"));
        assert_eq!(info.frequencies_mhz.len(), 2);
        assert!((info.frequencies_mhz[0] - 2994.375).abs() < 1e-9);
    }

    // -----------------------------------------------------------------------
    // /proc/diskstats and partition detection
    // -----------------------------------------------------------------------

    const DISKSTATS: &str = "\
   8       0 sda 5000 100 200000 8000 3000 50 100000 6000 0 9000 14000
   8       1 sda1 4900 100 190000 7900 2900 50 99000 5900 0 8900 13800
 259       0 nvme0n1 100 0 5000 50 200 0 9000 80 2 120 130
 bad line
";

    #[test]
    fn parses_diskstats_fields() {
        let disks = parse_diskstats(DISKSTATS);
        assert_eq!(disks.len(), 3);
        let sda = &disks[0];
        assert_eq!(sda.device, "sda");
        assert_eq!(sda.reads_completed, 5000);
        assert_eq!(sda.sectors_read, 200_000);
        assert_eq!(sda.write_time_ms, 6000);
        assert_eq!(sda.io_in_progress, 0);
        assert_eq!(sda.io_time_ms, 9000);
    }

    #[test]
    fn partition_detection() {
        let names = vec![
            "sda".to_string(),
            "sda1".to_string(),
            "nvme0n1".to_string(),
            "nvme0n1p2".to_string(),
        ];
        assert!(is_partition_of("sda1", &names));
        assert!(is_partition_of("nvme0n1p2", &names));
        assert!(!is_partition_of("sda", &names));
        assert!(!is_partition_of("nvme0n1", &names));
    }

    // -----------------------------------------------------------------------
    // mounts
    // -----------------------------------------------------------------------

    #[test]
    fn parses_mounts_and_filters_virtual_types() {
        let mounts = parse_mounts(
            "/dev/sda1 / ext4 rw,relatime 0 0\nproc /proc proc rw 0 0\ntmpfs /tmp tmpfs rw 0 0\n",
        );
        assert_eq!(mounts.len(), 3);
        let real: Vec<_> = mounts
            .iter()
            .filter(|m| real_filesystem(&m.fs_type))
            .collect();
        assert_eq!(real.len(), 1);
        assert_eq!(real[0].mount_point, "/");
    }

    // -----------------------------------------------------------------------
    // per-process files
    // -----------------------------------------------------------------------

    #[test]
    fn parses_pid_stat_with_hostile_comm() {
        // comm contains spaces and a closing paren.
        let content = "1234 (weird name)) S 1 1234 1234 0 -1 4194304 100 0 0 0 \
                       250 270 0 0 20 5 3 0 7000 10240000 512 18446744073709551615 \
                       0 0 0 0 0 0 0 0 0 0 0 0 17 0 0 0 0 0 0";
        let stat = parse_pid_stat(content).unwrap();
        assert_eq!(stat.pid, 1234);
        assert_eq!(stat.comm, "weird name)");
        assert_eq!(stat.state, 'S');
        assert_eq!(stat.ppid, 1);
        assert_eq!(stat.cpu_ticks, 250 + 270);
        assert_eq!(stat.nice, 5);
        assert_eq!(stat.num_threads, 3);
        assert_eq!(stat.starttime, 7000);
        assert_eq!(stat.rss_pages, 512);
    }

    #[test]
    fn truncated_pid_stat_is_none() {
        assert_eq!(parse_pid_stat("1234 (x) S 1 2 3"), None);
        assert_eq!(parse_pid_stat(""), None);
    }

    #[test]
    fn parses_pid_status_fields() {
        let status = parse_pid_status(
            "Name:\tbash\nVmSize:\t  10000 kB\nVmRSS:\t   2500 kB\nThreads:\t1\n",
        );
        assert_eq!(status.vm_rss_bytes, Some(2500 * 1024));
        assert_eq!(status.vm_size_bytes, Some(10000 * 1024));
        assert_eq!(status.threads, Some(1));
    }

    #[test]
    fn pid_status_tolerates_garbage() {
        let status = parse_pid_status("VmRSS:\tnot-a-number kB\n");
        assert_eq!(status.vm_rss_bytes, None);
    }

    #[test]
    fn cmdline_nul_separated() {
        assert_eq!(parse_cmdline("/usr/bin/foo\0--bar\0baz\0"), "/usr/bin/foo --bar baz");
        assert_eq!(parse_cmdline(""), "");
    }

    // -----------------------------------------------------------------------
    // live reads (environment-dependent)
    // -----------------------------------------------------------------------

    #[test]
    fn system_constants_are_sane() {
        assert!(clock_ticks_per_second() > 0.0);
        assert!(page_size() >= 512);
        assert!(core_count() >= 1);
    }

    #[test]
    fn monotonic_seconds_advances() {
        let a = monotonic_seconds();
        let b = monotonic_seconds();
        assert!(b >= a);
    }

    #[test]
    #[cfg(target_os = "linux")]
    fn live_proc_stat_parses() {
        let content = read_proc("/proc/stat").unwrap();
        let times = parse_stat_cpu_lines(&content);
        assert!(!times.is_empty());
        assert_eq!(times[0].name, "cpu");
    }

    #[test]
    fn missing_source_is_unavailable() {
        let err = read_proc("/proc/definitely-not-a-real-file").unwrap_err();
        assert_eq!(err.source, "/proc/definitely-not-a-real-file");
        assert!(!err.reason.is_empty());
    }

    // -----------------------------------------------------------------------
    // run_command
    // -----------------------------------------------------------------------

    #[test]
    fn run_command_captures_small_output() {
        let out = run_command("sh", &["-c", "echo hello"], Duration::from_secs(5));
        assert_eq!(out.as_deref(), Some("hello"));
    }

    #[test]
    fn run_command_survives_output_beyond_pipe_capacity() {
        // 200 KB is well past the usual 64 KiB pipe buffer. The child must
        // not wedge on a full pipe while we wait for it to exit.
        let out = run_command(
            "sh",
            &["-c", "yes x | head -c 200000"],
            Duration::from_secs(5),
        );
        assert!(out.is_some_and(|s| s.len() >= 190_000));
    }

    #[test]
    fn run_command_kills_at_deadline() {
        let start = Instant::now();
        let out = run_command("sleep", &["30"], Duration::from_millis(100));
        assert_eq!(out, None);
        assert!(start.elapsed() < Duration::from_secs(10));
    }

    #[test]
    fn run_command_missing_binary_is_none() {
        let out = run_command("definitely-not-a-real-binary", &[], Duration::from_secs(1));
        assert_eq!(out, None);
    }
}
