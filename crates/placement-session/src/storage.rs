//! Durable client storage: where the session survives a reload.
//!
//! The portal doesn't care WHERE the two session slots live: a browser's
//! local storage, a JSON file next to a desktop app, a plain map in tests.
//! It defines the [`KeyValueStorage`] trait (string slots with get/set/remove)
//! and ships two implementations:
//!
//! - [`MemoryStorage`]: a shared in-process map. Clones share contents, the
//!   same way every script on a page sees one local storage.
//! - [`FileStorage`]: a JSON object on disk, rewritten atomically.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use crate::StorageError;

/// String-slot storage with get/set/remove semantics.
///
/// # Trait bounds
///
/// - `Send` → the provider that owns the storage sits behind a mutex that
///   async tasks share.
/// - `'static` → the storage lives as long as the provider.
///
/// Errors are reported, never swallowed, at this level. Deciding what a
/// failure means for the session is the [`SessionStore`](crate::SessionStore)'s
/// job.
pub trait KeyValueStorage: Send + 'static {
    /// Returns the value stored under `key`, or `None` if the slot is empty.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Stores `value` under `key`, replacing any previous value.
    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Empties the slot. Removing an empty slot is not an error.
    fn remove(&mut self, key: &str) -> Result<(), StorageError>;
}

// ---------------------------------------------------------------------------
// MemoryStorage
// ---------------------------------------------------------------------------

/// In-process storage shared between clones.
///
/// Two handles created with `clone()` read and write the same map, which
/// lets tests "reload" by building a second store over a clone.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    slots: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of occupied slots.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    // A panic while holding this lock can't leave the map half-updated
    // (every operation is a single insert/remove), so poisoning is ignored.
    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl KeyValueStorage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.lock().get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        self.lock().remove(key);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// FileStorage
// ---------------------------------------------------------------------------

/// Storage backed by a JSON object file: `{"role":"admin","token":"..."}`.
///
/// A missing file reads as empty. Every mutation rewrites the whole file
/// through a sibling temp file and a rename, so a crash mid-write leaves
/// either the old or the new contents, never a torn file.
#[derive(Debug, Clone)]
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<BTreeMap<String, String>, StorageError> {
        match fs::read(&self.path) {
            Ok(bytes) if bytes.is_empty() => Ok(BTreeMap::new()),
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(StorageError::Io(e)),
        }
    }

    fn save(&self, slots: &BTreeMap<String, String>) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let bytes = serde_json::to_vec_pretty(slots)?;
        let tmp = self.path.with_extension("tmp");
        {
            let mut file = fs::File::create(&tmp)?;
            file.write_all(&bytes)?;
            file.sync_all()?;
        }
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl KeyValueStorage for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.load()?.remove(key))
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut slots = self.load()?;
        slots.insert(key.to_string(), value.to_string());
        self.save(&slots)
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        let mut slots = self.load()?;
        if slots.remove(key).is_some() {
            self.save(&slots)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // =====================================================================
    // MemoryStorage
    // =====================================================================

    #[test]
    fn test_memory_get_empty_slot_returns_none() {
        let storage = MemoryStorage::new();
        assert_eq!(storage.get("token").unwrap(), None);
        assert!(storage.is_empty());
    }

    #[test]
    fn test_memory_set_then_get_returns_value() {
        let mut storage = MemoryStorage::new();
        storage.set("token", "abc").unwrap();
        assert_eq!(storage.get("token").unwrap().as_deref(), Some("abc"));
    }

    #[test]
    fn test_memory_remove_empties_slot() {
        let mut storage = MemoryStorage::new();
        storage.set("role", "admin").unwrap();
        storage.remove("role").unwrap();
        assert_eq!(storage.get("role").unwrap(), None);
        // Removing again is fine.
        storage.remove("role").unwrap();
    }

    #[test]
    fn test_memory_clones_share_slots() {
        let mut a = MemoryStorage::new();
        let b = a.clone();
        a.set("token", "shared").unwrap();
        assert_eq!(b.get("token").unwrap().as_deref(), Some("shared"));
        assert_eq!(b.len(), 1);
    }

    // =====================================================================
    // FileStorage
    // =====================================================================

    #[test]
    fn test_file_missing_file_reads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path().join("session.json"));
        assert_eq!(storage.get("token").unwrap(), None);
    }

    #[test]
    fn test_file_set_persists_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");

        let mut first = FileStorage::new(&path);
        first.set("token", "t1").unwrap();
        first.set("role", "student").unwrap();

        let second = FileStorage::new(&path);
        assert_eq!(second.get("token").unwrap().as_deref(), Some("t1"));
        assert_eq!(second.get("role").unwrap().as_deref(), Some("student"));
    }

    #[test]
    fn test_file_remove_deletes_only_that_slot() {
        let dir = tempfile::tempdir().unwrap();
        let mut storage = FileStorage::new(dir.path().join("session.json"));
        storage.set("token", "t1").unwrap();
        storage.set("role", "admin").unwrap();

        storage.remove("token").unwrap();

        assert_eq!(storage.get("token").unwrap(), None);
        assert_eq!(storage.get("role").unwrap().as_deref(), Some("admin"));
    }

    #[test]
    fn test_file_creates_missing_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("deeper").join("s.json");
        let mut storage = FileStorage::new(&path);

        storage.set("token", "t").unwrap();

        assert!(path.exists());
    }

    #[test]
    fn test_file_corrupt_contents_return_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        fs::write(&path, b"not json at all").unwrap();

        let storage = FileStorage::new(&path);

        assert!(matches!(
            storage.get("token"),
            Err(StorageError::Corrupt(_))
        ));
    }

    #[test]
    fn test_file_never_leaves_temp_file_behind() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        let mut storage = FileStorage::new(&path);

        storage.set("token", "t").unwrap();

        assert!(!path.with_extension("tmp").exists());
    }
}
