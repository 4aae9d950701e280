//! Key/value blob stores backing the persistent archive.

use crate::ArchiveResult;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Suffix used for files that are still being written.
const TEMP_SUFFIX: &str = ".tmp";

/// Durable byte storage addressed by string keys.
pub trait BlobStore: Send + Sync {
    /// Store a value, replacing any previous value under the key.
    fn put(&self, key: &str, value: &[u8]) -> ArchiveResult<()>;

    /// Retrieve a value.
    fn get(&self, key: &str) -> ArchiveResult<Option<Vec<u8>>>;

    /// Delete a value. Returns whether anything was removed.
    fn delete(&self, key: &str) -> ArchiveResult<bool>;

    /// List all keys that start with a given prefix.
    fn list_keys_with_prefix(&self, prefix: &str) -> ArchiveResult<Vec<String>>;
}

/// One file per key inside a directory.
///
/// Writes go to a temporary file that is renamed into place, so a reader
/// never observes a half-written value.
#[derive(Debug, Clone)]
pub struct FileBlobStore {
    dir: PathBuf,
}

impl FileBlobStore {
    /// Open (and create if needed) a store rooted at `dir`.
    pub fn open(dir: impl Into<PathBuf>) -> ArchiveResult<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    /// Directory holding the files.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(key)
    }
}

impl BlobStore for FileBlobStore {
    fn put(&self, key: &str, value: &[u8]) -> ArchiveResult<()> {
        let path = self.path_for(key);
        let temp = self.path_for(&format!("{key}{TEMP_SUFFIX}"));
        std::fs::write(&temp, value)?;
        std::fs::rename(&temp, &path)?;
        Ok(())
    }

    fn get(&self, key: &str) -> ArchiveResult<Option<Vec<u8>>> {
        match std::fs::read(self.path_for(key)) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn delete(&self, key: &str) -> ArchiveResult<bool> {
        match std::fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    fn list_keys_with_prefix(&self, prefix: &str) -> ArchiveResult<Vec<String>> {
        let mut keys = Vec::new();
        for entry in std::fs::read_dir(&self.dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                if name.starts_with(prefix) && !name.ends_with(TEMP_SUFFIX) {
                    keys.push(name.to_string());
                }
            }
        }
        keys.sort();
        Ok(keys)
    }
}

/// In-memory store. Clones share the same contents.
#[derive(Debug, Clone, Default)]
pub struct MemoryBlobStore {
    entries: Arc<Mutex<BTreeMap<String, Vec<u8>>>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

impl BlobStore for MemoryBlobStore {
    fn put(&self, key: &str, value: &[u8]) -> ArchiveResult<()> {
        self.entries.lock().insert(key.to_string(), value.to_vec());
        Ok(())
    }

    fn get(&self, key: &str) -> ArchiveResult<Option<Vec<u8>>> {
        Ok(self.entries.lock().get(key).cloned())
    }

    fn delete(&self, key: &str) -> ArchiveResult<bool> {
        Ok(self.entries.lock().remove(key).is_some())
    }

    fn list_keys_with_prefix(&self, prefix: &str) -> ArchiveResult<Vec<String>> {
        Ok(self
            .entries
            .lock()
            .keys()
            .filter(|key| key.starts_with(prefix))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn exercise(store: &dyn BlobStore) {
        assert_eq!(store.get("a1").unwrap(), None);

        store.put("a1", b"one").unwrap();
        store.put("a2", b"two").unwrap();
        store.put("b1", b"other").unwrap();
        store.put("a1", b"uno").unwrap();

        assert_eq!(store.get("a1").unwrap(), Some(b"uno".to_vec()));
        assert_eq!(store.list_keys_with_prefix("a").unwrap(), vec!["a1", "a2"]);

        assert!(store.delete("a1").unwrap());
        assert!(!store.delete("a1").unwrap());
        assert_eq!(store.list_keys_with_prefix("a").unwrap(), vec!["a2"]);
    }

    #[test]
    fn test_memory_store_semantics() {
        let store = MemoryBlobStore::new();
        exercise(&store);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_file_store_semantics() {
        let dir = tempdir().unwrap();
        let store = FileBlobStore::open(dir.path().join("depot")).unwrap();
        exercise(&store);
        assert!(store.dir().join("a2").is_file());
    }

    #[test]
    fn test_file_store_ignores_temp_files_and_dirs() {
        let dir = tempdir().unwrap();
        let store = FileBlobStore::open(dir.path()).unwrap();

        std::fs::write(dir.path().join("slot7.tmp"), b"partial").unwrap();
        std::fs::create_dir(dir.path().join("slot-dir")).unwrap();
        store.put("slot1", b"done").unwrap();

        assert_eq!(store.list_keys_with_prefix("slot").unwrap(), vec!["slot1"]);
    }

    #[test]
    fn test_memory_store_clones_share_contents() {
        let store = MemoryBlobStore::new();
        let clone = store.clone();
        store.put("k", b"v").unwrap();
        assert_eq!(clone.get("k").unwrap(), Some(b"v".to_vec()));
    }
}
