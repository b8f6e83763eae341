use serde::Deserialize;
use std::time::Duration;

use crate::ConfigError;

/// Main configuration structure for bulkfetch
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub fetch: FetchConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default, rename = "throttle")]
    pub throttles: Vec<ThrottleEntry>,
    #[serde(default, rename = "index")]
    pub indexes: Vec<IndexEntry>,
    #[serde(default, rename = "task")]
    pub tasks: Vec<Task>,
}

/// Fetch pool configuration
#[derive(Debug, Clone, Deserialize)]
pub struct FetchConfig {
    /// Base number of concurrent fetch workers. One extra worker is added
    /// per throttled host so a slow host cannot starve the pool.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Number of concurrent write-back workers
    #[serde(default = "default_write_concurrency", rename = "write-concurrency")]
    pub write_concurrency: usize,

    /// Index of the first task to process in this run
    #[serde(default)]
    pub offset: usize,

    /// Maximum number of tasks to process; None means the rest of the list
    #[serde(default)]
    pub limit: Option<usize>,

    /// Run identifier, embedded in the log file name
    #[serde(default = "default_fetch_id")]
    pub id: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            write_concurrency: default_write_concurrency(),
            offset: 0,
            limit: None,
            id: default_fetch_id(),
        }
    }
}

fn default_concurrency() -> usize {
    25
}

fn default_write_concurrency() -> usize {
    4
}

fn default_fetch_id() -> String {
    "0".to_string()
}

/// Object store configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Base directory of the filesystem store
    #[serde(default = "default_storage_dir")]
    pub dir: String,

    /// Key prefix prepended to every stored object (e.g. "test_data/")
    #[serde(default)]
    pub root: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            dir: default_storage_dir(),
            root: String::new(),
        }
    }
}

fn default_storage_dir() -> String {
    "./fetched".to_string()
}

/// One URL to fetch, together with the parser descriptor written back into
/// the run log. The link is kept exactly as configured; only a normalized
/// copy is used for the request itself.
#[derive(Debug, Clone, Deserialize)]
pub struct Task {
    pub link: String,

    /// Name of the downstream parser for this content
    pub parser: String,

    /// Opaque payload handed through to the run log untouched
    #[serde(default)]
    pub payload: String,
}

/// Minimum-interval policy for one host
#[derive(Debug, Clone, Deserialize)]
pub struct ThrottleEntry {
    pub host: String,

    /// Delay magnitude, interpreted in `unit`
    pub delay: f64,

    /// Delay unit: "ms", "s", "m" or "h"
    pub unit: String,
}

impl ThrottleEntry {
    /// Resolves the delay into a concrete duration.
    pub fn duration(&self) -> Result<Duration, ConfigError> {
        if !self.delay.is_finite() || self.delay < 0.0 {
            return Err(ConfigError::InvalidThrottle {
                host: self.host.clone(),
                detail: format!("delay must be a non-negative number, got {}", self.delay),
            });
        }
        let millis = match self.unit.as_str() {
            "ms" => self.delay,
            "s" => self.delay * 1_000.0,
            "m" => self.delay * 60_000.0,
            "h" => self.delay * 3_600_000.0,
            other => {
                return Err(ConfigError::InvalidThrottle {
                    host: self.host.clone(),
                    detail: format!("unknown unit '{}' (expected ms, s, m or h)", other),
                })
            }
        };
        Ok(Duration::from_secs_f64(millis / 1_000.0))
    }
}

/// Auxiliary index toggle
#[derive(Debug, Clone, Deserialize)]
pub struct IndexEntry {
    pub name: String,
    pub enabled: bool,
}

impl Config {
    /// Resolved `(host, delay)` pairs for every configured throttle.
    pub fn throttle_policies(&self) -> Result<Vec<(String, Duration)>, ConfigError> {
        self.throttles
            .iter()
            .map(|t| Ok((t.host.clone(), t.duration()?)))
            .collect()
    }

    /// Names of the auxiliary indexes that are switched on.
    pub fn enabled_indexes(&self) -> Vec<String> {
        self.indexes
            .iter()
            .filter(|i| i.enabled)
            .map(|i| i.name.clone())
            .collect()
    }
}
