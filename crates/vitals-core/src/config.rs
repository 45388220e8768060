//! Monitor configuration: intervals, thresholds, log sources.
//!
//! Loaded once at startup and treated as immutable. Invalid configuration is
//! the only fatal error class in the system — everything downstream degrades
//! per field, per entity, or per cycle instead.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Startup configuration for all collectors.
///
/// Severity patterns are matched as case-insensitive substrings, not regular
/// expressions. Thresholds annotate metric severity only; they never change
/// what is computed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    // Update intervals (seconds, > 0)
    pub cpu_interval_secs: f64,
    pub memory_interval_secs: f64,
    pub process_interval_secs: f64,
    pub storage_interval_secs: f64,
    pub log_interval_secs: f64,

    // Severity annotation thresholds (percent)
    pub cpu_warning_threshold: f64,
    pub cpu_critical_threshold: f64,
    pub memory_warning_threshold: f64,
    pub memory_critical_threshold: f64,

    // Process table
    pub process_row_limit: usize,

    // Log monitoring
    pub log_sources: Vec<String>,
    pub severity_patterns: Vec<String>,
    pub log_line_limit: usize,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            cpu_interval_secs: 1.0,
            memory_interval_secs: 1.0,
            process_interval_secs: 2.0,
            storage_interval_secs: 2.0,
            log_interval_secs: 5.0,
            cpu_warning_threshold: 70.0,
            cpu_critical_threshold: 90.0,
            memory_warning_threshold: 80.0,
            memory_critical_threshold: 95.0,
            process_row_limit: 50,
            log_sources: vec![
                "/var/log/syslog".to_string(),
                "/var/log/messages".to_string(),
                "/var/log/kern.log".to_string(),
            ],
            severity_patterns: vec![
                "error".to_string(),
                "critical".to_string(),
                "fatal".to_string(),
                "panic".to_string(),
                "failed".to_string(),
                "failure".to_string(),
                "warning".to_string(),
            ],
            log_line_limit: 20,
        }
    }
}

impl MonitorConfig {
    /// Load from an explicit path, or search the default locations
    /// (`$HOME/.config/vitals/config.json`, `/etc/vitals/config.json`, cwd).
    /// Missing config is not an error — defaults apply.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match path {
            Some(p) => Some(p.to_path_buf()),
            None => Self::default_locations().into_iter().find(|p| p.exists()),
        };

        let config = match path {
            Some(path) => {
                let raw = std::fs::read_to_string(&path).map_err(|e| ConfigError::Unreadable {
                    path: path.clone(),
                    reason: e.to_string(),
                })?;
                serde_json::from_str(&raw).map_err(|e| ConfigError::Malformed {
                    path,
                    reason: e.to_string(),
                })?
            }
            None => Self::default(),
        };

        config.validate()?;
        Ok(config)
    }

    fn default_locations() -> Vec<PathBuf> {
        let mut locations = Vec::new();
        if let Some(home) = std::env::var_os("HOME") {
            locations.push(
                PathBuf::from(home)
                    .join(".config")
                    .join("vitals")
                    .join("config.json"),
            );
        }
        locations.push(PathBuf::from("/etc/vitals/config.json"));
        locations.push(PathBuf::from("config.json"));
        locations
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::Unreadable {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;
        }
        let raw = serde_json::to_string_pretty(self).map_err(|e| ConfigError::Malformed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        std::fs::write(path, raw).map_err(|e| ConfigError::Unreadable {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Reject configurations the collection loops cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let intervals = [
            ("cpu_interval_secs", self.cpu_interval_secs),
            ("memory_interval_secs", self.memory_interval_secs),
            ("process_interval_secs", self.process_interval_secs),
            ("storage_interval_secs", self.storage_interval_secs),
            ("log_interval_secs", self.log_interval_secs),
        ];
        for (name, value) in intervals {
            if !(value > 0.0) || !value.is_finite() {
                return Err(ConfigError::Invalid(format!(
                    "{name} must be a positive number, got {value}"
                )));
            }
        }
        if self.process_row_limit == 0 {
            return Err(ConfigError::Invalid(
                "process_row_limit must be at least 1".to_string(),
            ));
        }
        if self.log_line_limit == 0 {
            return Err(ConfigError::Invalid(
                "log_line_limit must be at least 1".to_string(),
            ));
        }
        for pair in [
            ("cpu", self.cpu_warning_threshold, self.cpu_critical_threshold),
            (
                "memory",
                self.memory_warning_threshold,
                self.memory_critical_threshold,
            ),
        ] {
            let (name, warning, critical) = pair;
            if warning > critical {
                return Err(ConfigError::Invalid(format!(
                    "{name} warning threshold ({warning}) exceeds critical ({critical})"
                )));
            }
        }
        Ok(())
    }

    pub fn cpu_interval(&self) -> Duration {
        Duration::from_secs_f64(self.cpu_interval_secs)
    }

    pub fn memory_interval(&self) -> Duration {
        Duration::from_secs_f64(self.memory_interval_secs)
    }

    pub fn process_interval(&self) -> Duration {
        Duration::from_secs_f64(self.process_interval_secs)
    }

    pub fn storage_interval(&self) -> Duration {
        Duration::from_secs_f64(self.storage_interval_secs)
    }

    pub fn log_interval(&self) -> Duration {
        Duration::from_secs_f64(self.log_interval_secs)
    }
}

/// Fatal configuration problem, surfaced to the operator before any
/// collection loop starts.
#[derive(Debug)]
pub enum ConfigError {
    Unreadable { path: PathBuf, reason: String },
    Malformed { path: PathBuf, reason: String },
    Invalid(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unreadable { path, reason } => {
                write!(f, "cannot read config {}: {}", path.display(), reason)
            }
            Self::Malformed { path, reason } => {
                write!(f, "malformed config {}: {}", path.display(), reason)
            }
            Self::Invalid(reason) => write!(f, "invalid config: {reason}"),
        }
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        let config = MonitorConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.process_row_limit, 50);
        assert!((config.log_interval_secs - 5.0).abs() < 1e-9);
    }

    #[test]
    fn zero_interval_is_fatal() {
        let config = MonitorConfig {
            cpu_interval_secs: 0.0,
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
        assert!(err.to_string().contains("cpu_interval_secs"));
    }

    #[test]
    fn negative_interval_is_fatal() {
        let config = MonitorConfig {
            log_interval_secs: -2.0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn inverted_thresholds_are_fatal() {
        let config = MonitorConfig {
            memory_warning_threshold: 99.0,
            memory_critical_threshold: 80.0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        let config = MonitorConfig {
            cpu_interval_secs: 0.5,
            process_row_limit: 10,
            ..Default::default()
        };
        config.save(&path).unwrap();
        let loaded = MonitorConfig::load(Some(&path)).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"process_row_limit": 5}"#).unwrap();
        let loaded = MonitorConfig::load(Some(&path)).unwrap();
        assert_eq!(loaded.process_row_limit, 5);
        assert!((loaded.cpu_interval_secs - 1.0).abs() < 1e-9);
    }

    #[test]
    fn malformed_file_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(
            MonitorConfig::load(Some(&path)),
            Err(ConfigError::Malformed { .. })
        ));
    }

    #[test]
    fn invalid_loaded_values_are_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"storage_interval_secs": 0}"#).unwrap();
        assert!(matches!(
            MonitorConfig::load(Some(&path)),
            Err(ConfigError::Invalid(_))
        ));
    }
}
