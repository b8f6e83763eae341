//! Bulkfetch: bulk URL fetching with content-addressed deduplication
//!
//! This crate fetches a configured list of URLs concurrently, throttles
//! requests per host, deduplicates payloads by SHA-384 content hash, stores
//! novel content exactly once in an object store, and writes a structured
//! run log describing every fetch and failure.

pub mod config;
pub mod dedup;
pub mod pipeline;
pub mod report;
pub mod store;

use thiserror::Error;

/// Main error type for bulkfetch operations
#[derive(Debug, Error)]
pub enum BulkfetchError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Store error: {0}")]
    Store(#[from] store::StoreError),

    /// The response arrived but its body could not be drained. The run is
    /// aborted: a half-read payload can neither be hashed nor stored.
    #[error("Failed to read response body for {url}: {message}")]
    BodyRead { url: String, message: String },

    /// The blob for a new hash was written but its index entry could not be
    /// created within the retry bound. The run is aborted, since a blob
    /// without an index entry breaks deduplication for every later run.
    #[error("Could not create index after {attempts} attempts: path={path}")]
    IndexWrite { path: String, attempts: u32 },

    #[error("Report serialization error: {0}")]
    ReportSerialize(#[from] serde_json::Error),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid throttle for host '{host}': {detail}")]
    InvalidThrottle { host: String, detail: String },
}

/// Result type alias for bulkfetch operations
pub type Result<T> = std::result::Result<T, BulkfetchError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::{load_config, Config, Task};
pub use pipeline::{run_pipeline, RunSummary};
pub use store::{FsStore, MemoryStore, ObjectStore};
