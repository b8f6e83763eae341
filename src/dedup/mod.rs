//! Content-addressed storage with deduplication
//!
//! Fetched payloads are stored under a path derived from their SHA-384
//! checksum. The first task to produce a given checksum writes the blob and
//! creates its index; every later task with the same checksum only appends
//! an index row. The blob itself is written at most once.

mod index;

pub use index::{format_duration, registry, CanonicalIndex, ContentIndex};

use std::sync::Arc;
use std::sync::Mutex;

use crate::pipeline::FetchResult;
use crate::report::{FetchRecord, StoreLocation};
use crate::store::{ObjectStore, StoreError, Visibility, CONTENT_TYPE_TEXT};
use crate::BulkfetchError;

/// Bound on synchronous retries when creating a brand-new index file.
/// Exhausting it is fatal: the blob already exists and a missing index
/// entry would break deduplication permanently.
const INDEX_CREATE_ATTEMPTS: u32 = 10;

/// Number of per-hash lock shards guarding index read-modify-write cycles
const LOCK_SHARDS: usize = 64;

/// Outcome of a failed `resolve`
#[derive(Debug)]
pub enum ResolveError {
    /// The store write failed in a way worth retrying: the caller must
    /// resubmit the contained fetch without marking the task complete.
    Transient {
        fetch: Box<FetchResult>,
        reason: StoreError,
    },

    /// The run cannot continue.
    Fatal(BulkfetchError),
}

/// Content-addressed store over an object store backend
pub struct ContentStore {
    store: Arc<dyn ObjectStore>,
    root: String,
    canonical: CanonicalIndex,
    auxiliary: Vec<Box<dyn ContentIndex>>,
    locks: Vec<Mutex<()>>,
}

impl ContentStore {
    /// Creates a content store with the given key prefix and auxiliary
    /// indexes. The prefix is normalized to end with `/` unless empty.
    pub fn new(
        store: Arc<dyn ObjectStore>,
        root: &str,
        auxiliary: Vec<Box<dyn ContentIndex>>,
    ) -> Self {
        let mut root = root.trim_start_matches('/').to_string();
        if !root.is_empty() && !root.ends_with('/') {
            root.push('/');
        }
        Self {
            store,
            root,
            canonical: CanonicalIndex,
            auxiliary,
            locks: (0..LOCK_SHARDS).map(|_| Mutex::new(())).collect(),
        }
    }

    /// Store path of the blob for a checksum
    pub fn content_path(&self, checksum: &str) -> String {
        format!("{}sha384_content/{}", self.root, checksum)
    }

    /// Key prefix this store writes under
    pub fn root(&self) -> &str {
        &self.root
    }

    fn shard(&self, checksum: &str) -> &Mutex<()> {
        // The checksum is hex, so the first byte is uniformly distributed.
        let bucket = checksum.as_bytes().first().copied().unwrap_or(0) as usize;
        &self.locks[bucket % LOCK_SHARDS]
    }

    /// Resolves one fetched payload: writes the blob on first sight of its
    /// checksum, appends an index row either way, and returns the terminal
    /// record for the task.
    pub fn resolve(&self, fetch: FetchResult) -> Result<FetchRecord, ResolveError> {
        let content_path = self.content_path(&fetch.checksum);
        let index_path = self.canonical.path(&fetch, &self.root);

        // Serialize read-modify-write per hash so concurrent workers cannot
        // lose or duplicate index rows.
        let _guard = self.shard(&fetch.checksum).lock().unwrap();

        let existing = match self.store.get(&index_path) {
            Ok(existing) => existing,
            Err(reason) => {
                // A read failure must not be mistaken for "absent": that
                // would rewrite the blob. Hand the fetch back instead.
                return Err(ResolveError::Transient {
                    fetch: Box::new(fetch),
                    reason,
                });
            }
        };

        let novel = existing.is_none();
        match existing {
            Some(mut data) => {
                // Hash seen before: append one row, write the index back in
                // full (the store has no partial-append primitive).
                data.extend_from_slice(self.canonical.content(&fetch, &content_path).as_bytes());
                if let Err(reason) =
                    self.store
                        .put(&index_path, &data, CONTENT_TYPE_TEXT, Visibility::Private)
                {
                    tracing::error!("Could not update index {}: {}", index_path, reason);
                    return Err(ResolveError::Transient {
                        fetch: Box::new(fetch),
                        reason,
                    });
                }
            }
            None => {
                // New hash: store the blob first, then create its index.
                if let Err(reason) = self.store.put(
                    &content_path,
                    &fetch.body,
                    CONTENT_TYPE_TEXT,
                    Visibility::Private,
                ) {
                    tracing::error!("Could not put new content {}: {}", content_path, reason);
                    return Err(ResolveError::Transient {
                        fetch: Box::new(fetch),
                        reason,
                    });
                }

                let row = self.canonical.content(&fetch, &content_path);
                self.create_index(&index_path, row.as_bytes())?;
            }
        }

        // Auxiliary indexes are retried inline like a first-time index
        // create: requeueing here would append the canonical row twice.
        for aux in &self.auxiliary {
            let aux_path = aux.path(&fetch, &self.root);
            let mut data = match self.store.get(&aux_path) {
                Ok(data) => data.unwrap_or_default(),
                Err(reason) => {
                    tracing::error!("Could not read index '{}': {}", aux.name(), reason);
                    Vec::new()
                }
            };
            data.extend_from_slice(aux.content(&fetch, &content_path).as_bytes());
            self.create_index(&aux_path, &data)?;
        }

        Ok(FetchRecord {
            novel,
            parser: fetch.task.parser.clone(),
            checksum_index: StoreLocation { path: index_path },
            content: StoreLocation { path: content_path },
            payload: fetch.task.payload.clone(),
        })
    }

    /// Writes an index file with a bounded number of attempts; exhausting
    /// the bound aborts the run.
    fn create_index(&self, path: &str, content: &[u8]) -> Result<(), ResolveError> {
        for _ in 0..INDEX_CREATE_ATTEMPTS {
            match self
                .store
                .put(path, content, CONTENT_TYPE_TEXT, Visibility::Private)
            {
                Ok(()) => return Ok(()),
                Err(reason) => {
                    tracing::error!("Could not add index {}: {}", path, reason);
                }
            }
        }
        Err(ResolveError::Fatal(BulkfetchError::IndexWrite {
            path: path.to_string(),
            attempts: INDEX_CREATE_ATTEMPTS,
        }))
    }
}
