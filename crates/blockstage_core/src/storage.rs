//! Named storage slots for saved scenes
//!
//! A [`SceneStorage`] holds text values under slot names, the way a
//! browser's local storage does. [`MemoryStorage`] keeps them in a map;
//! [`FileStorage`] writes one `<slot>.json` file per slot.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Errors from a storage backend
#[derive(Debug, Error)]
pub enum StorageError {
    /// Underlying file I/O failed
    #[error("storage I/O error: {0}")]
    Io(#[from] io::Error),
    /// The slot name cannot be stored by this backend
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

/// Key/value text storage
pub trait SceneStorage {
    /// Read a slot; None if it was never written
    fn get_item(&self, slot: &str) -> Result<Option<String>, StorageError>;
    /// Write a slot
    fn set_item(&mut self, slot: &str, value: &str) -> Result<(), StorageError>;
    /// Remove a slot; removing a missing slot is not an error
    fn remove_item(&mut self, slot: &str) -> Result<(), StorageError>;
}

/// In-memory storage
#[derive(Debug, Default, Clone)]
pub struct MemoryStorage {
    items: HashMap<String, String>,
}

impl MemoryStorage {
    /// Create empty storage
    pub fn new() -> Self {
        Self::default()
    }
}

impl SceneStorage for MemoryStorage {
    fn get_item(&self, slot: &str) -> Result<Option<String>, StorageError> {
        Ok(self.items.get(slot).cloned())
    }

    fn set_item(&mut self, slot: &str, value: &str) -> Result<(), StorageError> {
        self.items.insert(slot.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&mut self, slot: &str) -> Result<(), StorageError> {
        self.items.remove(slot);
        Ok(())
    }
}

/// Storage backed by a directory of JSON files
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    /// Store slots under `dir` (created on first write)
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    /// Path of the file backing `slot`
    pub fn path_for(&self, slot: &str) -> Result<PathBuf, StorageError> {
        let valid = !slot.is_empty()
            && slot
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(StorageError::Unavailable(format!("invalid slot name '{}'", slot)));
        }
        Ok(self.dir.join(format!("{}.json", slot)))
    }
}

impl SceneStorage for FileStorage {
    fn get_item(&self, slot: &str) -> Result<Option<String>, StorageError> {
        match fs::read_to_string(self.path_for(slot)?) {
            Ok(text) => Ok(Some(text)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn set_item(&mut self, slot: &str, value: &str) -> Result<(), StorageError> {
        let path = self.path_for(slot)?;
        fs::create_dir_all(&self.dir)?;
        fs::write(&path, value)?;
        log::debug!("Wrote slot '{}' to {}", slot, path.display());
        Ok(())
    }

    fn remove_item(&mut self, slot: &str) -> Result<(), StorageError> {
        match fs::remove_file(self.path_for(slot)?) {
            Err(err) if err.kind() != io::ErrorKind::NotFound => Err(err.into()),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_storage() {
        let mut storage = MemoryStorage::new();
        assert_eq!(storage.get_item("savedScene").unwrap(), None);
        storage.set_item("savedScene", "[]").unwrap();
        assert_eq!(storage.get_item("savedScene").unwrap().as_deref(), Some("[]"));
        storage.remove_item("savedScene").unwrap();
        assert_eq!(storage.get_item("savedScene").unwrap(), None);
    }

    #[test]
    fn test_file_storage() {
        let dir = tempfile::tempdir().unwrap();
        let mut storage = FileStorage::new(dir.path().join("saves"));

        assert_eq!(storage.get_item("savedScene").unwrap(), None);
        storage.set_item("savedScene", "[1]").unwrap();
        assert!(dir.path().join("saves/savedScene.json").exists());
        assert_eq!(storage.get_item("savedScene").unwrap().as_deref(), Some("[1]"));

        storage.remove_item("savedScene").unwrap();
        storage.remove_item("savedScene").unwrap();
        assert_eq!(storage.get_item("savedScene").unwrap(), None);
    }

    #[test]
    fn test_file_storage_rejects_path_slots() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path());
        assert!(matches!(storage.path_for("../escape"), Err(StorageError::Unavailable(_))));
        assert!(matches!(storage.path_for(""), Err(StorageError::Unavailable(_))));
    }
}
