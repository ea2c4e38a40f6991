//! Save slots: snapshot format, blob stores, and best-effort slot management.
//!
//! Saves are JSON blobs keyed by `{prefix}{slot}`. Failures never reach the
//! game loop: explicit saves report a bool, loads report `None`, and the
//! autosave is silent apart from a log line.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;

use crate::core::config::EngineConfig;
use crate::core::state::JournalEntry;

pub const SAVE_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Serialized player state. Missing fields load as empty/zero.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Snapshot {
    pub resonance: i32,
    pub suspicion: i32,
    pub quiet_level: i32,
    pub integrity: i32,
    pub inventory: Vec<String>,
    pub flags: Vec<String>,
    pub npc_trust: BTreeMap<String, i32>,
    pub journal: Vec<JournalEntry>,
    pub current_scene: String,
    pub choices_made: Vec<String>,
    pub scenes_visited: Vec<String>,
    pub turn_count: u32,
}

impl Snapshot {
    pub fn to_json(&self) -> Result<String, PersistenceError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(input: &str) -> Result<Snapshot, PersistenceError> {
        Ok(serde_json::from_str(input)?)
    }
}

fn default_version() -> u32 {
    SAVE_VERSION
}

/// What a save slot holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveRecord {
    pub state: Snapshot,
    /// Milliseconds since the Unix epoch.
    #[serde(default)]
    pub timestamp: u64,
    #[serde(default)]
    pub scene_name: String,
    #[serde(default = "default_version")]
    pub version: u32,
}

/// Summary of an occupied slot, for load/save menus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotInfo {
    pub timestamp: u64,
    pub scene_name: String,
}

/// A key-value blob store backing the save slots.
pub trait SaveStore {
    fn write(&self, key: &str, blob: &str) -> Result<(), PersistenceError>;
    fn read(&self, key: &str) -> Result<Option<String>, PersistenceError>;
    fn remove(&self, key: &str) -> Result<(), PersistenceError>;
}

/// In-memory store; contents die with the process.
#[derive(Debug, Default)]
pub struct MemoryStore {
    blobs: RefCell<FxHashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SaveStore for MemoryStore {
    fn write(&self, key: &str, blob: &str) -> Result<(), PersistenceError> {
        self.blobs
            .borrow_mut()
            .insert(key.to_string(), blob.to_string());
        Ok(())
    }

    fn read(&self, key: &str) -> Result<Option<String>, PersistenceError> {
        Ok(self.blobs.borrow().get(key).cloned())
    }

    fn remove(&self, key: &str) -> Result<(), PersistenceError> {
        self.blobs.borrow_mut().remove(key);
        Ok(())
    }
}

/// One `<key>.json` file per blob inside a directory.
#[derive(Debug, Clone)]
pub struct DirStore {
    dir: PathBuf,
}

impl DirStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

impl SaveStore for DirStore {
    fn write(&self, key: &str, blob: &str) -> Result<(), PersistenceError> {
        std::fs::create_dir_all(&self.dir)?;
        std::fs::write(self.path_for(key), blob)?;
        Ok(())
    }

    fn read(&self, key: &str) -> Result<Option<String>, PersistenceError> {
        match std::fs::read_to_string(self.path_for(key)) {
            Ok(blob) => Ok(Some(blob)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn remove(&self, key: &str) -> Result<(), PersistenceError> {
        match std::fs::remove_file(self.path_for(key)) {
            Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }
}

/// Current time in milliseconds since the Unix epoch.
pub fn system_clock() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Named save slots plus the autosave, over any [`SaveStore`].
pub struct SaveSlots {
    store: Box<dyn SaveStore>,
    prefix: String,
    slots: Vec<String>,
    autosave_key: String,
    clock: fn() -> u64,
}

impl SaveSlots {
    pub fn new(store: Box<dyn SaveStore>, config: &EngineConfig) -> Self {
        Self {
            store,
            prefix: config.save_prefix.clone(),
            slots: config.save_slots.clone(),
            autosave_key: config.autosave_key.clone(),
            clock: system_clock,
        }
    }

    /// Replace the timestamp source (targets without a system clock, tests).
    pub fn with_clock(mut self, clock: fn() -> u64) -> Self {
        self.clock = clock;
        self
    }

    fn key(&self, slot: &str) -> String {
        format!("{}{}", self.prefix, slot)
    }

    fn try_save(&self, slot: &str, state: Snapshot, scene_name: &str) -> Result<(), PersistenceError> {
        let record = SaveRecord {
            state,
            timestamp: (self.clock)(),
            scene_name: scene_name.to_string(),
            version: SAVE_VERSION,
        };
        let blob = serde_json::to_string(&record)?;
        self.store.write(&self.key(slot), &blob)
    }

    fn try_load(&self, slot: &str) -> Result<Option<SaveRecord>, PersistenceError> {
        match self.store.read(&self.key(slot))? {
            Some(blob) => Ok(Some(serde_json::from_str(&blob)?)),
            None => Ok(None),
        }
    }

    /// Write a snapshot to a slot. Returns false on failure.
    pub fn save_slot(&self, slot: &str, state: Snapshot, scene_name: &str) -> bool {
        match self.try_save(slot, state, scene_name) {
            Ok(()) => {
                tracing::debug!(slot, "saved");
                true
            }
            Err(e) => {
                tracing::error!(slot, error = %e, "save failed");
                false
            }
        }
    }

    /// Read a slot. Empty, unreadable, and corrupt slots all yield `None`.
    pub fn load_slot(&self, slot: &str) -> Option<SaveRecord> {
        match self.try_load(slot) {
            Ok(record) => record,
            Err(e) => {
                tracing::error!(slot, error = %e, "load failed");
                None
            }
        }
    }

    pub fn autosave(&self, state: Snapshot, scene_name: &str) {
        let key = self.autosave_key.clone();
        self.save_slot(&key, state, scene_name);
    }

    pub fn load_autosave(&self) -> Option<SaveRecord> {
        self.load_slot(&self.autosave_key)
    }

    pub fn slot_info(&self, slot: &str) -> Option<SlotInfo> {
        // No logging here: menus probe every slot.
        let record = self.try_load(slot).ok()??;
        Some(SlotInfo {
            timestamp: record.timestamp,
            scene_name: record.scene_name,
        })
    }

    /// Info for every named slot followed by the autosave.
    pub fn all_slot_info(&self) -> Vec<(String, Option<SlotInfo>)> {
        self.slots
            .iter()
            .chain(std::iter::once(&self.autosave_key))
            .map(|slot| (slot.clone(), self.slot_info(slot)))
            .collect()
    }

    pub fn delete_slot(&self, slot: &str) -> bool {
        match self.store.remove(&self.key(slot)) {
            Ok(()) => true,
            Err(e) => {
                tracing::error!(slot, error = %e, "delete failed");
                false
            }
        }
    }
}

impl std::fmt::Debug for SaveSlots {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SaveSlots")
            .field("prefix", &self.prefix)
            .field("slots", &self.slots)
            .field("autosave_key", &self.autosave_key)
            .finish()
    }
}
