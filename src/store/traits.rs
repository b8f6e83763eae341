//! Object store trait and error types
//!
//! This module defines the trait interface the pipeline requires from a
//! durable blob store, and the associated error type. The pipeline assumes
//! read-after-write visibility from implementations; it does not defend
//! against eventually consistent backends.

use thiserror::Error;

/// Errors that can occur during store operations
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid object path: {0}")]
    InvalidPath(String),

    #[error("Backend error: {0}")]
    Backend(String),
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Access level requested for a stored object
///
/// Filesystem-backed stores ignore this; remote stores map it to an ACL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Private,
    Public,
}

/// Trait for object store backends
///
/// Implementations must be safe to share across worker tasks.
pub trait ObjectStore: Send + Sync {
    /// Reads an object. Returns `None` when no object exists at `path`;
    /// errors are reserved for backend failures.
    fn get(&self, path: &str) -> StoreResult<Option<Vec<u8>>>;

    /// Writes an object, replacing any existing content at `path`.
    fn put(
        &self,
        path: &str,
        content: &[u8],
        content_type: &str,
        visibility: Visibility,
    ) -> StoreResult<()>;

    /// Removes an object. Removing a missing object is not an error.
    fn delete(&self, path: &str) -> StoreResult<()>;
}
