//! Configuration module for bulkfetch
//!
//! This module handles loading, parsing, and validating TOML configuration
//! files: the task list, per-host throttle policies, auxiliary index
//! toggles, and the pool/slice knobs for a run.
//!
//! # Example
//!
//! ```no_run
//! use bulkfetch::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("config.toml")).unwrap();
//! println!("{} tasks configured", config.tasks.len());
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{Config, FetchConfig, IndexEntry, StorageConfig, Task, ThrottleEntry};

// Re-export parser functions
pub use parser::{load_config, parse_config};
