//! Local durable persistence of the custom collection.
//!
//! A [`SlotStore`] is a string key-value store in the spirit of browser local storage: one
//! slot per key, whole-value reads and writes. [`LocalPersistence`] stores the custom collection
//! as JSON in the fixed [`STORAGE_KEY`] slot. Reads never fail: a missing or corrupt slot is
//! an empty collection. Writes do fail, and the mutation service aborts on them.
//!
//! Entries written before records carried ids are given one on load, and the slot is rewritten
//! at once so the id stays the same on every later load.

use crate::constants::{SLOT_FILE_EXTENSION, STORAGE_KEY};
use crate::solution::Solution;
use crate::store::{CustomSolution, SolutionId, SyncStatus};
use crate::{KbError, KbResult};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, RwLock};

/// Whole-value string storage keyed by slot name.
pub trait SlotStore: Send + Sync {
    /// Returns the slot's value, or `None` if the slot was never written.
    fn get(&self, key: &str) -> KbResult<Option<String>>;

    /// Overwrites the slot's value.
    fn set(&self, key: &str, value: &str) -> KbResult<()>;
}

/// Slot store keeping one `<key>.json` file per slot under a directory.
#[derive(Debug, Clone)]
pub struct FileSlotStore {
    dir: PathBuf,
}

impl FileSlotStore {
    /// Creates a store rooted at `dir`. The directory is created on first write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn slot_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.{SLOT_FILE_EXTENSION}"))
    }
}

impl SlotStore for FileSlotStore {
    fn get(&self, key: &str) -> KbResult<Option<String>> {
        match std::fs::read_to_string(self.slot_path(key)) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(KbError::SlotRead(e)),
        }
    }

    fn set(&self, key: &str, value: &str) -> KbResult<()> {
        std::fs::create_dir_all(&self.dir)
            .map_err(|e| KbError::SlotWrite(kb_files::FilesError::Io(e)))?;
        kb_files::write_atomic(&self.slot_path(key), value).map_err(KbError::SlotWrite)
    }
}

/// In-memory slot store for tests and throwaway sessions. Clone-friendly via Arc.
#[derive(Debug, Clone, Default)]
pub struct MemorySlotStore {
    slots: Arc<RwLock<HashMap<String, String>>>,
}

impl MemorySlotStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SlotStore for MemorySlotStore {
    fn get(&self, key: &str) -> KbResult<Option<String>> {
        let slots = self.slots.read().map_err(|_| KbError::SlotPoisoned)?;
        Ok(slots.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> KbResult<()> {
        let mut slots = self.slots.write().map_err(|_| KbError::SlotPoisoned)?;
        slots.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Slot entry as read back, possibly written before ids existed.
#[derive(Deserialize)]
struct StoredRecord {
    id: Option<SolutionId>,
    #[serde(default)]
    sync: SyncStatus,
    #[serde(flatten)]
    solution: Solution,
}

/// Reads and writes the custom collection in a single slot.
#[derive(Debug, Clone)]
pub struct LocalPersistence<S> {
    store: S,
    key: String,
}

impl<S: SlotStore> LocalPersistence<S> {
    /// Persistence under the standard [`STORAGE_KEY`] slot.
    pub fn new(store: S) -> Self {
        Self::with_key(store, STORAGE_KEY)
    }

    pub fn with_key(store: S, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
        }
    }

    /// Loads the custom collection, treating an absent or unreadable slot as empty.
    ///
    /// Entries without an id get a fresh one, and the slot is saved back so the ids persist.
    pub fn load(&self) -> Vec<CustomSolution> {
        let raw = match self.store.get(&self.key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(e) => {
                tracing::warn!("failed to read local slot {}: {}", self.key, e);
                return Vec::new();
            }
        };

        let stored = match serde_json::from_str::<Vec<StoredRecord>>(&raw) {
            Ok(stored) => stored,
            Err(e) => {
                tracing::warn!("ignoring corrupt local slot {}: {}", self.key, e);
                return Vec::new();
            }
        };

        let missing_ids = stored.iter().filter(|r| r.id.is_none()).count();
        let custom: Vec<CustomSolution> = stored
            .into_iter()
            .map(|record| CustomSolution {
                id: record.id.unwrap_or_default(),
                sync: record.sync,
                solution: record.solution,
            })
            .collect();

        if missing_ids > 0 {
            match self.save(&custom) {
                Ok(()) => tracing::info!("assigned ids to {} legacy slot entries", missing_ids),
                Err(e) => tracing::warn!("failed to persist assigned ids: {}", e),
            }
        }
        custom
    }

    /// Writes the custom collection to the slot.
    ///
    /// # Errors
    ///
    /// Returns `KbError::Serialization` or the slot store's write error.
    pub fn save(&self, custom: &[CustomSolution]) -> KbResult<()> {
        let raw = serde_json::to_string(custom).map_err(KbError::Serialization)?;
        self.store.set(&self.key, &raw)
    }
}
