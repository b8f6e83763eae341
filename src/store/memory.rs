//! In-memory object store
//!
//! Backed by a mutex-guarded map. Used by tests and useful for dry runs;
//! nothing survives the process.

use crate::store::traits::{ObjectStore, StoreResult, Visibility};
use std::collections::HashMap;
use std::sync::Mutex;

/// Object store holding everything in process memory
#[derive(Default)]
pub struct MemoryStore {
    objects: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored objects
    pub fn len(&self) -> usize {
        self.objects.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All object paths, sorted (test helper)
    pub fn paths(&self) -> Vec<String> {
        let mut paths: Vec<String> = self.objects.lock().unwrap().keys().cloned().collect();
        paths.sort();
        paths
    }
}

impl ObjectStore for MemoryStore {
    fn get(&self, path: &str) -> StoreResult<Option<Vec<u8>>> {
        Ok(self.objects.lock().unwrap().get(path).cloned())
    }

    fn put(
        &self,
        path: &str,
        content: &[u8],
        _content_type: &str,
        _visibility: Visibility,
    ) -> StoreResult<()> {
        self.objects
            .lock()
            .unwrap()
            .insert(path.to_string(), content.to_vec());
        Ok(())
    }

    fn delete(&self, path: &str) -> StoreResult<()> {
        self.objects.lock().unwrap().remove(path);
        Ok(())
    }
}
