//! Log collector: recent system log lines with severity classification.
//!
//! Prefers `journalctl` (bounded by a kill-on-timeout deadline so a hung
//! journal can never stall the cycle) and falls back to tailing the first
//! readable configured log file. Severity is keyword-based; a line with no
//! recognized keyword is `Info`.

use std::time::Duration;

use crate::collector::{Collector, CollectorInfo};
use crate::config::MonitorConfig;
use crate::procfs;
use crate::sample::{LogLevel, LogLine, LogStats, Snapshot, SnapshotData};

/// How many recent lines to fetch before truncating for display. Counts
/// cover the full fetch window, the visible list does not.
const FETCH_LINES: usize = 100;

const JOURNALCTL_TIMEOUT: Duration = Duration::from_secs(2);

static LOG_INFO: CollectorInfo = CollectorInfo {
    name: "logs",
    description: "Recent system log lines from journalctl or syslog files",
    default_interval: Duration::from_secs(5),
};

pub struct LogCollector {
    interval: Duration,
    sources: Vec<String>,
    /// Lowercased ahead of time; matching is case-insensitive substring.
    patterns: Vec<String>,
    line_limit: usize,
}

/// Bucket a log line by the strongest severity keyword it contains.
fn classify(line: &str) -> LogLevel {
    let lower = line.to_lowercase();
    let has = |needle: &str| lower.contains(needle);
    if has("crit") || has("fatal") || has("panic") || has("emerg") || has("alert") {
        LogLevel::Critical
    } else if has("error") || has("fail") {
        LogLevel::Error
    } else if has("warn") {
        LogLevel::Warning
    } else if has("debug") {
        LogLevel::Debug
    } else {
        LogLevel::Info
    }
}

/// Split off a leading ISO-ish timestamp (journalctl `-o short-iso`) when
/// the line starts with one.
fn split_timestamp(line: &str) -> (Option<String>, &str) {
    if let Some((first, rest)) = line.split_once(' ')
        && first.len() >= 19
        && first.as_bytes().first().is_some_and(u8::is_ascii_digit)
        && first.contains('T')
    {
        return (Some(first.to_string()), rest.trim_start());
    }
    (None, line)
}

impl LogCollector {
    pub fn new(config: &MonitorConfig) -> Self {
        Self {
            interval: config.log_interval(),
            sources: config.log_sources.clone(),
            patterns: config
                .severity_patterns
                .iter()
                .map(|p| p.to_lowercase())
                .collect(),
            line_limit: config.log_line_limit,
        }
    }

    fn build(&self, source: &str, raw: &[&str]) -> Snapshot {
        let mut stats = LogStats {
            source: source.to_string(),
            ..Default::default()
        };
        let mut lines = Vec::with_capacity(raw.len());
        for text in raw {
            let text = text.trim_end();
            if text.is_empty() {
                continue;
            }
            let level = classify(text);
            match level {
                LogLevel::Critical => stats.critical += 1,
                LogLevel::Error => stats.error += 1,
                LogLevel::Warning => stats.warning += 1,
                LogLevel::Info => stats.info += 1,
                LogLevel::Debug => stats.debug += 1,
            }
            let lower = text.to_lowercase();
            if matches!(level, LogLevel::Critical | LogLevel::Error | LogLevel::Warning)
                || self.patterns.iter().any(|p| lower.contains(p))
            {
                stats.error_count += 1;
            }
            let (timestamp, message) = split_timestamp(text);
            lines.push(LogLine {
                timestamp,
                source: source.to_string(),
                level,
                message: message.to_string(),
            });
        }
        // Keep only the newest lines for display; counts already cover all.
        if lines.len() > self.line_limit {
            lines.drain(..lines.len() - self.line_limit);
        }
        stats.lines = lines;
        Snapshot::new(LOG_INFO.name, SnapshotData::Logs(stats))
    }

    fn from_journal(&self) -> Option<Snapshot> {
        let count = FETCH_LINES.to_string();
        let output = procfs::run_command(
            "journalctl",
            &["-n", &count, "--no-pager", "-o", "short-iso", "-q"],
            JOURNALCTL_TIMEOUT,
        )?;
        if output.trim().is_empty() {
            return None;
        }
        let raw: Vec<&str> = output.lines().collect();
        Some(self.build("journalctl", &raw))
    }

    fn from_files(&self) -> Option<Snapshot> {
        for path in &self.sources {
            let Ok(content) = std::fs::read_to_string(path) else {
                continue;
            };
            let all: Vec<&str> = content.lines().collect();
            let tail = &all[all.len().saturating_sub(FETCH_LINES)..];
            return Some(self.build(path, tail));
        }
        None
    }
}

impl Collector for LogCollector {
    fn info(&self) -> &CollectorInfo {
        &LOG_INFO
    }

    fn interval(&self) -> Duration {
        self.interval
    }

    fn collect(&mut self) -> Snapshot {
        if let Some(snap) = self.from_journal() {
            return snap;
        }
        if let Some(snap) = self.from_files() {
            return snap;
        }
        let mut snap = Snapshot::new(LOG_INFO.name, SnapshotData::Logs(LogStats::default()));
        snap.degrade("no readable log source (journalctl unavailable, no configured file readable)");
        snap
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collector() -> LogCollector {
        LogCollector::new(&MonitorConfig::default())
    }

    fn log_stats(snap: &Snapshot) -> &LogStats {
        match &snap.data {
            SnapshotData::Logs(s) => s,
            other => panic!("expected log data, got {other:?}"),
        }
    }

    #[test]
    fn keyword_classification() {
        assert_eq!(classify("kernel: Out of memory: Killed process"), LogLevel::Info);
        assert_eq!(classify("sshd[812]: error: maximum authentication attempts"), LogLevel::Error);
        assert_eq!(classify("systemd[1]: Failed to start nginx.service"), LogLevel::Error);
        assert_eq!(classify("CRITICAL: disk temperature above threshold"), LogLevel::Critical);
        assert_eq!(classify("kernel panic - not syncing"), LogLevel::Critical);
        assert_eq!(classify("thermald: warning: cpu throttled"), LogLevel::Warning);
        assert_eq!(classify("app[3]: DEBUG probing backend"), LogLevel::Debug);
        assert_eq!(classify("systemd[1]: Started cron.service"), LogLevel::Info);
    }

    #[test]
    fn journal_timestamps_are_split_off() {
        let (ts, rest) = split_timestamp("2026-08-30T10:11:12+0000 host sshd[1]: accepted");
        assert_eq!(ts.as_deref(), Some("2026-08-30T10:11:12+0000"));
        assert_eq!(rest, "host sshd[1]: accepted");

        // Classic syslog lines keep their full text.
        let (ts, rest) = split_timestamp("Aug 30 10:11:12 host sshd[1]: accepted");
        assert_eq!(ts, None);
        assert_eq!(rest, "Aug 30 10:11:12 host sshd[1]: accepted");
    }

    #[test]
    fn counts_cover_all_lines_display_is_truncated() {
        let mut c = collector();
        c.line_limit = 3;
        let raw: Vec<String> = (0..10)
            .map(|i| {
                if i % 2 == 0 {
                    format!("line {i}: error: something broke")
                } else {
                    format!("line {i}: all quiet")
                }
            })
            .collect();
        let refs: Vec<&str> = raw.iter().map(String::as_str).collect();
        let snap = c.build("/var/log/syslog", &refs);
        let stats = log_stats(&snap);
        assert_eq!(stats.error, 5);
        assert_eq!(stats.info, 5);
        assert_eq!(stats.error_count, 5);
        assert_eq!(stats.lines.len(), 3);
        // Newest lines win.
        assert!(stats.lines[2].message.contains("line 9"));
    }

    #[test]
    fn pattern_match_counts_even_at_info_level() {
        let mut c = collector();
        c.patterns = vec!["segfault".to_string()];
        let snap = c.build("x", &["app[1]: segfault at 0x0 in libfoo"]);
        let stats = log_stats(&snap);
        // "segfault" is not a severity keyword, so the line grades Info, but
        // the configured pattern still flags it.
        assert_eq!(stats.info, 1);
        assert_eq!(stats.error_count, 1);
    }

    #[test]
    fn blank_lines_are_dropped() {
        let c = collector();
        let snap = c.build("x", &["", "  ", "one real line"]);
        assert_eq!(log_stats(&snap).lines.len(), 1);
    }

    #[test]
    fn no_source_yields_degraded_empty_snapshot() {
        let mut c = collector();
        c.sources = vec!["/nonexistent/never/here.log".to_string()];
        // from_files has nothing readable.
        assert!(c.from_files().is_none());
    }
}
