//! Durable storage for the navigational record.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use tracing::debug;

use super::NavState;

/// Name of the single persisted record.
pub const STATE_FILE_NAME: &str = "catalog-nav.json";

/// Durable backing for the navigational record.
///
/// `load` treats every failure the same way: absent, unreadable, and
/// malformed records all come back as `None`, and callers substitute
/// defaults. Corruption is never an error the user sees.
pub trait StateStorage: Send + Sync {
    /// Read the stored record, if one exists and decodes.
    fn load(&self) -> Option<NavState>;

    /// Write the record, replacing any previous one.
    fn save(&self, state: &NavState) -> io::Result<()>;

    /// Delete the record. Deleting an absent record is not an error.
    fn remove(&self) -> io::Result<()>;
}

/// JSON-file storage under a state directory.
#[derive(Debug, Clone)]
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    /// Storage for the named record inside `dir`. The directory is created
    /// on first save.
    #[must_use]
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        Self {
            path: dir.as_ref().join(STATE_FILE_NAME),
        }
    }

    /// Full path of the record file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl StateStorage for FileStorage {
    fn load(&self) -> Option<NavState> {
        let raw = std::fs::read_to_string(&self.path).ok()?;
        match serde_json::from_str(&raw) {
            Ok(state) => Some(state),
            Err(e) => {
                debug!(
                    path = %self.path.display(),
                    error = %e,
                    "stored state malformed; falling back to defaults"
                );
                None
            }
        }
    }

    fn save(&self, state: &NavState) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(state).map_err(io::Error::other)?;
        std::fs::write(&self.path, json)
    }

    fn remove(&self) -> io::Result<()> {
        match std::fs::remove_file(&self.path) {
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            other => other,
        }
    }
}

/// Volatile storage for tests and demos.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    record: Mutex<Option<NavState>>,
    saves: Arc<AtomicUsize>,
}

impl MemoryStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Counter of completed saves, for asserting write coalescing. Clone
    /// it out before handing the storage to a store.
    #[must_use]
    pub fn save_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.saves)
    }
}

impl StateStorage for MemoryStorage {
    fn load(&self) -> Option<NavState> {
        self.record.lock().expect("lock poisoned").clone()
    }

    fn save(&self, state: &NavState) -> io::Result<()> {
        *self.record.lock().expect("lock poisoned") = Some(state.clone());
        self.saves.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    fn remove(&self) -> io::Result<()> {
        *self.record.lock().expect("lock poisoned") = None;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_file_storage_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::in_dir(dir.path());

        let state = NavState {
            current_page: 3,
            search: "tee".to_string(),
            ..NavState::default()
        };
        storage.save(&state).unwrap();

        assert_eq!(storage.load(), Some(state));
    }

    #[test]
    fn test_load_absent_record_is_none() {
        let dir = tempfile::tempdir().unwrap();
        assert!(FileStorage::in_dir(dir.path()).load().is_none());
    }

    #[test]
    fn test_load_malformed_record_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::in_dir(dir.path());
        std::fs::create_dir_all(dir.path()).unwrap();
        std::fs::write(storage.path(), "{not json").unwrap();

        assert!(storage.load().is_none());
    }

    #[test]
    fn test_remove_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::in_dir(dir.path());

        storage.remove().unwrap();
        storage.save(&NavState::default()).unwrap();
        storage.remove().unwrap();

        assert!(storage.load().is_none());
    }

    #[test]
    fn test_save_creates_state_directory() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::in_dir(dir.path().join("nested").join("state"));

        storage.save(&NavState::default()).unwrap();

        assert!(storage.path().exists());
    }

    #[test]
    fn test_memory_storage_counts_saves() {
        let storage = MemoryStorage::new();
        let saves = storage.save_counter();

        storage.save(&NavState::default()).unwrap();
        storage.save(&NavState::default()).unwrap();

        assert_eq!(saves.load(Ordering::Relaxed), 2);
        storage.remove().unwrap();
        assert!(storage.load().is_none());
    }
}
