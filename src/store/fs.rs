//! Filesystem-backed object store
//!
//! Objects are plain files under a base directory; the object path maps
//! directly to a relative file path. Content type and visibility are
//! accepted for contract compatibility and ignored.

use crate::store::traits::{ObjectStore, StoreError, StoreResult, Visibility};
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

/// Object store rooted at a local directory
pub struct FsStore {
    base: PathBuf,
}

impl FsStore {
    /// Opens a store rooted at `base`, creating the directory if needed.
    pub fn new(base: &Path) -> StoreResult<Self> {
        std::fs::create_dir_all(base)?;
        Ok(Self {
            base: base.to_path_buf(),
        })
    }

    /// Maps an object path to a file path, rejecting traversal components.
    fn file_path(&self, path: &str) -> StoreResult<PathBuf> {
        let relative = Path::new(path.trim_start_matches('/'));
        for component in relative.components() {
            match component {
                Component::Normal(_) => {}
                _ => return Err(StoreError::InvalidPath(path.to_string())),
            }
        }
        if relative.as_os_str().is_empty() {
            return Err(StoreError::InvalidPath(path.to_string()));
        }
        Ok(self.base.join(relative))
    }
}

impl ObjectStore for FsStore {
    fn get(&self, path: &str) -> StoreResult<Option<Vec<u8>>> {
        let file = self.file_path(path)?;
        match std::fs::read(&file) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StoreError::Io(e)),
        }
    }

    fn put(
        &self,
        path: &str,
        content: &[u8],
        _content_type: &str,
        _visibility: Visibility,
    ) -> StoreResult<()> {
        let file = self.file_path(path)?;
        if let Some(parent) = file.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&file, content)?;
        Ok(())
    }

    fn delete(&self, path: &str) -> StoreResult<()> {
        let file = self.file_path(path)?;
        match std::fs::remove_file(&file) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StoreError::Io(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_put_get_roundtrip() {
        let dir = tempdir().unwrap();
        let store = FsStore::new(dir.path()).unwrap();

        store
            .put("a/b/object.txt", b"payload", "text/plain", Visibility::Private)
            .unwrap();

        let content = store.get("a/b/object.txt").unwrap();
        assert_eq!(content, Some(b"payload".to_vec()));
    }

    #[test]
    fn test_get_missing_returns_none() {
        let dir = tempdir().unwrap();
        let store = FsStore::new(dir.path()).unwrap();
        assert_eq!(store.get("missing").unwrap(), None);
    }

    #[test]
    fn test_put_overwrites() {
        let dir = tempdir().unwrap();
        let store = FsStore::new(dir.path()).unwrap();

        store
            .put("object", b"first", "text/plain", Visibility::Private)
            .unwrap();
        store
            .put("object", b"second", "text/plain", Visibility::Private)
            .unwrap();

        assert_eq!(store.get("object").unwrap(), Some(b"second".to_vec()));
    }

    #[test]
    fn test_delete_is_idempotent() {
        let dir = tempdir().unwrap();
        let store = FsStore::new(dir.path()).unwrap();

        store
            .put("object", b"payload", "text/plain", Visibility::Private)
            .unwrap();
        store.delete("object").unwrap();
        store.delete("object").unwrap();
        assert_eq!(store.get("object").unwrap(), None);
    }

    #[test]
    fn test_leading_slash_is_tolerated() {
        let dir = tempdir().unwrap();
        let store = FsStore::new(dir.path()).unwrap();

        store
            .put("/rooted/object", b"payload", "text/plain", Visibility::Private)
            .unwrap();
        assert_eq!(
            store.get("/rooted/object").unwrap(),
            Some(b"payload".to_vec())
        );
    }

    #[test]
    fn test_traversal_is_rejected() {
        let dir = tempdir().unwrap();
        let store = FsStore::new(dir.path()).unwrap();

        let result = store.put("../escape", b"x", "text/plain", Visibility::Private);
        assert!(matches!(result, Err(StoreError::InvalidPath(_))));
    }
}
