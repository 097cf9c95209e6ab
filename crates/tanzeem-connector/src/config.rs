//! Configuration loading from TOML and environment variables.
//!
//! The connector reads its configuration from:
//! 1. A TOML config file (passed with `--config`)
//! 2. Environment variables (override TOML values)
//!
//! Environment variable prefix: TANZEEM_

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use tanzeem_sync::{SyncConfig, SyncKind};

/// Top-level connector configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConnectorConfig {
    /// Hierarchy store configuration.
    #[serde(default)]
    pub store: StoreConfig,
    /// External directory configuration.
    #[serde(default)]
    pub directory: DirectoryConfig,
    /// Sync schedule configuration.
    #[serde(default)]
    pub sync: ScheduleConfig,
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Where the hierarchy store keeps its snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Path of the JSON snapshot file.
    #[serde(default = "default_store_path")]
    pub path: PathBuf,
    /// Whether flushes are mirrored to the snapshot file.
    #[serde(default = "default_true")]
    pub persist: bool,
}

/// External directory export location.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirectoryConfig {
    /// Path of the directory export (JSON).
    #[serde(default = "default_directory_path")]
    pub snapshot_path: PathBuf,
    /// Upper bound on one fetch, in seconds.
    #[serde(default = "default_fetch_timeout")]
    pub fetch_timeout_secs: u64,
}

/// Intervals for the scheduled sync runner.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleConfig {
    /// Seconds between Jamaat syncs.
    #[serde(default = "default_jamaat_interval")]
    pub jamaat_interval_secs: u64,
    /// Seconds between Member syncs.
    #[serde(default = "default_member_interval")]
    pub member_interval_secs: u64,
    /// Whether both syncs run immediately on start.
    #[serde(default = "default_true")]
    pub run_on_start: bool,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "tanzeem_sync=debug,info").
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Whether to output JSON-formatted logs.
    #[serde(default)]
    pub json_format: bool,
}

// -- Defaults --

fn default_true() -> bool {
    true
}
fn default_store_path() -> PathBuf {
    PathBuf::from(tanzeem_protocol::DEFAULT_STORE_PATH)
}
fn default_directory_path() -> PathBuf {
    PathBuf::from(tanzeem_protocol::DEFAULT_DIRECTORY_PATH)
}
fn default_fetch_timeout() -> u64 {
    tanzeem_protocol::DEFAULT_FETCH_TIMEOUT_SECS
}
fn default_jamaat_interval() -> u64 {
    tanzeem_protocol::DEFAULT_JAMAAT_SYNC_INTERVAL_SECS
}
fn default_member_interval() -> u64 {
    tanzeem_protocol::DEFAULT_MEMBER_SYNC_INTERVAL_SECS
}
fn default_log_level() -> String {
    "info".to_string()
}

// -- Trait impls --

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_store_path(),
            persist: true,
        }
    }
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self {
            snapshot_path: default_directory_path(),
            fetch_timeout_secs: default_fetch_timeout(),
        }
    }
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            jamaat_interval_secs: default_jamaat_interval(),
            member_interval_secs: default_member_interval(),
            run_on_start: true,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json_format: false,
        }
    }
}

impl ScheduleConfig {
    /// Interval for one sync kind. Zero is clamped to one second.
    pub fn interval(&self, kind: SyncKind) -> Duration {
        let secs = match kind {
            SyncKind::Jamaats => self.jamaat_interval_secs,
            SyncKind::Members => self.member_interval_secs,
        };
        Duration::from_secs(secs.max(1))
    }
}

impl ConnectorConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, anyhow::Error> {
        let content = std::fs::read_to_string(path)?;
        let config: ConnectorConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load configuration from a TOML file, with environment variable overrides.
    ///
    /// A missing file falls back to defaults. Overrides use the `TANZEEM_`
    /// prefix, for example `TANZEEM_STORE_PATH=/var/lib/tanzeem/store.json`.
    pub fn load(path: Option<&Path>) -> Result<Self, anyhow::Error> {
        let mut config = if let Some(path) = path {
            if path.exists() {
                Self::from_file(path)?
            } else {
                tracing::warn!(
                    path = %path.display(),
                    "Config file not found, using defaults"
                );
                Self::default()
            }
        } else {
            Self::default()
        };

        config.apply_overrides(|key| std::env::var(key).ok());

        Ok(config)
    }

    /// Apply overrides from a key lookup (the process environment in `load`).
    ///
    /// Unparseable numeric values are ignored with a warning.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(val) = lookup("TANZEEM_STORE_PATH") {
            self.store.path = PathBuf::from(val);
        }
        if let Some(val) = lookup("TANZEEM_STORE_PERSIST") {
            self.store.persist = is_truthy(&val);
        }
        if let Some(val) = lookup("TANZEEM_DIRECTORY_PATH") {
            self.directory.snapshot_path = PathBuf::from(val);
        }
        if let Some(secs) = parse_secs(&lookup, "TANZEEM_FETCH_TIMEOUT") {
            self.directory.fetch_timeout_secs = secs;
        }
        if let Some(secs) = parse_secs(&lookup, "TANZEEM_JAMAAT_SYNC_INTERVAL") {
            self.sync.jamaat_interval_secs = secs;
        }
        if let Some(secs) = parse_secs(&lookup, "TANZEEM_MEMBER_SYNC_INTERVAL") {
            self.sync.member_interval_secs = secs;
        }
        if let Some(val) = lookup("TANZEEM_LOG_LEVEL") {
            self.logging.level = val;
        }
        if let Some(val) = lookup("TANZEEM_LOG_JSON") {
            self.logging.json_format = is_truthy(&val);
        }
    }

    /// Reconciliation settings derived from the directory section.
    /// A zero fetch timeout is clamped to one second.
    pub fn sync_config(&self) -> SyncConfig {
        SyncConfig {
            fetch_timeout: Duration::from_secs(self.directory.fetch_timeout_secs.max(1)),
        }
    }
}

fn is_truthy(val: &str) -> bool {
    val == "true" || val == "1"
}

fn parse_secs(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<u64> {
    let raw = lookup(key)?;
    match raw.trim().parse() {
        Ok(secs) => Some(secs),
        Err(_) => {
            tracing::warn!(key, value = %raw, "Ignoring non-numeric override");
            None
        }
    }
}
