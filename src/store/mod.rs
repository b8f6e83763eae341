//! Object store backends
//!
//! This module provides the store contract the pipeline writes through,
//! plus two implementations: a filesystem store for real runs and an
//! in-memory store for tests.

mod fs;
mod memory;
mod traits;

pub use fs::FsStore;
pub use memory::MemoryStore;
pub use traits::{ObjectStore, StoreError, StoreResult, Visibility};

/// Content type recorded for stored blobs and index files
pub const CONTENT_TYPE_TEXT: &str = "text/plain";

/// Content type recorded for the run log
pub const CONTENT_TYPE_JSON: &str = "application/json";
