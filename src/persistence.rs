//! Progression storage
//!
//! A [`ProgressStore`] holds a single progression record. The JSON file store
//! is what the binary uses; the in-memory store backs tests and runs without
//! a save path.

use std::cell::RefCell;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use tracing::{debug, info, warn};

use crate::game::progression::ProgressionState;

/// Largest save file accepted
const MAX_SAVE_SIZE: u64 = 1024 * 1024;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("Malformed progression record: {0}")]
    Parse(serde_json::Error),
    #[error("Failed to serialize progression: {0}")]
    Serialize(serde_json::Error),
    #[error("Save file too large: {0} bytes")]
    TooLarge(u64),
}

/// Load/save seam for the single progression record
pub trait ProgressStore {
    /// `Ok(None)` when nothing has been saved yet
    fn load(&mut self) -> Result<Option<ProgressionState>, StoreError>;
    fn save(&mut self, state: &ProgressionState) -> Result<(), StoreError>;
}

/// Load progression, falling back to defaults on absence or any failure
pub fn load_or_default(store: &mut dyn ProgressStore) -> ProgressionState {
    match store.load() {
        Ok(Some(state)) => state.normalized(),
        Ok(None) => ProgressionState::default(),
        Err(e) => {
            warn!("Failed to load progression, starting fresh: {}", e);
            ProgressionState::default()
        }
    }
}

/// Progression stored as pretty JSON in one file
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ProgressStore for JsonFileStore {
    fn load(&mut self) -> Result<Option<ProgressionState>, StoreError> {
        if !self.path.exists() {
            debug!("No save file at {}", self.path.display());
            return Ok(None);
        }

        let len = fs::metadata(&self.path)?.len();
        if len > MAX_SAVE_SIZE {
            return Err(StoreError::TooLarge(len));
        }

        let contents = fs::read_to_string(&self.path)?;
        let state: ProgressionState =
            serde_json::from_str(&contents).map_err(StoreError::Parse)?;
        info!(
            "Loaded progression from {} ({} maps unlocked)",
            self.path.display(),
            state.unlocked_maps().len()
        );
        Ok(Some(state))
    }

    fn save(&mut self, state: &ProgressionState) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }

        let contents = serde_json::to_string_pretty(state).map_err(StoreError::Serialize)?;
        fs::write(&self.path, contents)?;
        debug!("Saved progression to {}", self.path.display());
        Ok(())
    }
}

/// Record kept as a JSON string behind a shared handle.
///
/// Cloning shares the slot, so a test can keep one clone to inspect or
/// corrupt what the game loop wrote through the other.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    slot: Rc<RefCell<Option<String>>>,
    fail_writes: Rc<RefCell<bool>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store seeded with raw contents, valid or not
    pub fn with_contents(raw: impl Into<String>) -> Self {
        let store = Self::default();
        *store.slot.borrow_mut() = Some(raw.into());
        store
    }

    pub fn raw(&self) -> Option<String> {
        self.slot.borrow().clone()
    }

    /// Make subsequent saves fail with an IO error
    pub fn set_fail_writes(&self, fail: bool) {
        *self.fail_writes.borrow_mut() = fail;
    }
}

impl ProgressStore for MemoryStore {
    fn load(&mut self) -> Result<Option<ProgressionState>, StoreError> {
        match self.slot.borrow().as_deref() {
            Some(raw) => serde_json::from_str(raw).map(Some).map_err(StoreError::Parse),
            None => Ok(None),
        }
    }

    fn save(&mut self, state: &ProgressionState) -> Result<(), StoreError> {
        if *self.fail_writes.borrow() {
            return Err(StoreError::Io(io::Error::new(
                io::ErrorKind::PermissionDenied,
                "writes disabled",
            )));
        }
        let raw = serde_json::to_string(state).map_err(StoreError::Serialize)?;
        *self.slot.borrow_mut() = Some(raw);
        Ok(())
    }
}
