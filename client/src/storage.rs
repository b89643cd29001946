//! Key-value storage for the anonymous cart.
//!
//! Storage is shared by every store instance in the same profile, the way
//! browser tabs share an origin's storage. Each write is announced to all
//! subscribers together with the id of the instance that made it, so an
//! instance can skip its own writes and reload on everyone else's.

use crate::error::StorageError;
use dashmap::DashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::broadcast;
use uuid::Uuid;

/// Capacity of the change-notification channel.
const EVENT_CAPACITY: usize = 64;

/// A change made to a storage key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageEvent {
    pub key: String,
    /// Instance that made the change
    pub origin: Uuid,
}

/// String key-value storage with change notifications.
pub trait KeyValueStorage: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    fn set(&self, key: &str, value: &str, origin: Uuid) -> Result<(), StorageError>;

    /// Remove a key. Removing a missing key is not an error.
    fn remove(&self, key: &str, origin: Uuid) -> Result<(), StorageError>;

    fn subscribe(&self) -> broadcast::Receiver<StorageEvent>;
}

/// In-process storage, optionally limited to a byte quota.
#[derive(Debug)]
pub struct MemoryStorage {
    entries: DashMap<String, String>,
    quota: Option<usize>,
    events: broadcast::Sender<StorageEvent>,
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStorage {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            entries: DashMap::new(),
            quota: None,
            events,
        }
    }

    /// Storage that rejects writes once keys and values exceed `bytes`.
    pub fn with_quota(bytes: usize) -> Self {
        Self {
            quota: Some(bytes),
            ..Self::new()
        }
    }

    /// Create storage wrapped in Arc for sharing between store instances.
    pub fn new_shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Bytes used by every key except `key`.
    fn used_excluding(&self, key: &str) -> usize {
        self.entries
            .iter()
            .filter(|e| e.key() != key)
            .map(|e| e.key().len() + e.value().len())
            .sum()
    }

    fn notify(&self, key: &str, origin: Uuid) {
        // No receivers is fine.
        let _ = self.events.send(StorageEvent {
            key: key.to_string(),
            origin,
        });
    }
}

impl KeyValueStorage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.get(key).map(|v| v.value().clone()))
    }

    fn set(&self, key: &str, value: &str, origin: Uuid) -> Result<(), StorageError> {
        if let Some(quota) = self.quota {
            let needed = self.used_excluding(key) + key.len() + value.len();
            if needed > quota {
                return Err(StorageError::QuotaExceeded {
                    key: key.to_string(),
                    needed,
                    quota,
                });
            }
        }

        self.entries.insert(key.to_string(), value.to_string());
        self.notify(key, origin);
        Ok(())
    }

    fn remove(&self, key: &str, origin: Uuid) -> Result<(), StorageError> {
        if self.entries.remove(key).is_some() {
            self.notify(key, origin);
        }
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<StorageEvent> {
        self.events.subscribe()
    }
}

/// Storage keeping one file per key in a directory.
///
/// Notifications reach instances sharing this `FileStorage` value; changes
/// made by other processes are not observed.
#[derive(Debug)]
pub struct FileStorage {
    dir: PathBuf,
    events: broadcast::Sender<StorageEvent>,
}

impl FileStorage {
    /// Open storage rooted at `dir`, creating the directory if needed.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self, StorageError> {
        let dir = dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&dir).map_err(|e| StorageError::Io(e.to_string()))?;
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Ok(Self { dir, events })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        let name: String = key
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        self.dir.join(format!("{name}.json"))
    }

    fn notify(&self, key: &str, origin: Uuid) {
        let _ = self.events.send(StorageEvent {
            key: key.to_string(),
            origin,
        });
    }
}

impl KeyValueStorage for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        match std::fs::read_to_string(self.path_for(key)) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StorageError::Io(e.to_string())),
        }
    }

    fn set(&self, key: &str, value: &str, origin: Uuid) -> Result<(), StorageError> {
        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");

        // Write then rename so readers never see a partial blob.
        std::fs::write(&tmp, value).map_err(|e| StorageError::Io(e.to_string()))?;
        std::fs::rename(&tmp, &path).map_err(|e| StorageError::Io(e.to_string()))?;

        self.notify(key, origin);
        Ok(())
    }

    fn remove(&self, key: &str, origin: Uuid) -> Result<(), StorageError> {
        match std::fs::remove_file(self.path_for(key)) {
            Ok(()) => {
                self.notify(key, origin);
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorageError::Io(e.to_string())),
        }
    }

    fn subscribe(&self) -> broadcast::Receiver<StorageEvent> {
        self.events.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_set_get_remove() {
        let storage = MemoryStorage::new();
        let origin = Uuid::new_v4();

        assert_eq!(storage.get("cart").unwrap(), None);
        storage.set("cart", "[]", origin).unwrap();
        assert_eq!(storage.get("cart").unwrap().as_deref(), Some("[]"));

        storage.remove("cart", origin).unwrap();
        assert_eq!(storage.get("cart").unwrap(), None);

        // Removing again is fine.
        storage.remove("cart", origin).unwrap();
    }

    #[test]
    fn memory_quota() {
        let storage = MemoryStorage::with_quota(16);
        let origin = Uuid::new_v4();

        storage.set("cart", "[1,2,3]", origin).unwrap();
        // Overwriting the same key only counts the new value.
        storage.set("cart", "[1,2,3,4]", origin).unwrap();

        let err = storage
            .set("cart", "[1,2,3,4,5,6,7,8,9]", origin)
            .unwrap_err();
        assert!(matches!(err, StorageError::QuotaExceeded { quota: 16, .. }));
        assert_eq!(storage.get("cart").unwrap().as_deref(), Some("[1,2,3,4]"));
    }

    #[test]
    fn memory_events_carry_origin() {
        let storage = MemoryStorage::new();
        let mut rx = storage.subscribe();
        let origin = Uuid::new_v4();

        storage.set("cart", "[]", origin).unwrap();
        let event = rx.try_recv().unwrap();
        assert_eq!(event.key, "cart");
        assert_eq!(event.origin, origin);

        // Removing a missing key is silent.
        storage.remove("other", origin).unwrap();
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn file_storage_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::open(dir.path().join("profile")).unwrap();
        let origin = Uuid::new_v4();
        let mut rx = storage.subscribe();

        assert_eq!(storage.get("cart").unwrap(), None);
        storage.set("cart", r#"[{"a":1}]"#, origin).unwrap();
        assert_eq!(storage.get("cart").unwrap().as_deref(), Some(r#"[{"a":1}]"#));
        assert_eq!(rx.try_recv().unwrap().key, "cart");

        storage.remove("cart", origin).unwrap();
        assert_eq!(storage.get("cart").unwrap(), None);
        storage.remove("cart", origin).unwrap();
    }

    #[test]
    fn file_storage_sanitizes_keys() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::open(dir.path()).unwrap();

        storage.set("../escape/key", "x", Uuid::new_v4()).unwrap();
        assert_eq!(storage.get("../escape/key").unwrap().as_deref(), Some("x"));
        assert!(dir.path().join(".._escape_key.json").exists());
    }
}
