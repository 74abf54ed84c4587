//! File-backed persistence for the event store.
//!
//! The whole store is one JSON document. Saves go through a
//! write-to-temp-then-rename sequence with an fsync in between, so a crash
//! mid-write never leaves a half-written file where the next run can see it.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};
use uuid::Uuid;

use crate::error::StoreError;
use crate::store::Store;

/// Handle to the persisted store document.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    /// Creates a handle for the store document at `path`. The file does not
    /// have to exist yet.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The path this handle reads and writes.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the persisted store.
    ///
    /// Returns `Ok(None)` when the file does not exist — whether to start
    /// from an empty store is the caller's policy, not this layer's.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::CorruptState` when the file exists but cannot be
    /// parsed or fails invariant validation; `StoreError::Io` on read
    /// failure.
    pub fn load(&self) -> Result<Option<Store>, StoreError> {
        if !self.path.exists() {
            debug!(path = %self.path.display(), "no store file; nothing to load");
            return Ok(None);
        }

        let text = fs::read_to_string(&self.path)?;
        let store: Store = serde_json::from_str(&text).map_err(|e| {
            StoreError::corrupt(format!("{}: {e}", self.path.display()))
        })?;
        store.validate()?;
        debug!(path = %self.path.display(), hearings = store.len(), "loaded store");
        Ok(Some(store))
    }

    /// Loads the persisted store, starting empty when no file exists yet.
    ///
    /// # Errors
    ///
    /// A corrupt existing file is still an error; only absence falls back to
    /// an empty store.
    pub fn load_or_default(&self) -> Result<Store, StoreError> {
        Ok(self.load()?.unwrap_or_default())
    }

    /// Persists the full store atomically.
    ///
    /// Writes to a uniquely named sibling temp file, fsyncs it, then renames
    /// it over the target. Readers either see the prior document or the new
    /// one, never a partial write.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Io` on any filesystem failure; the temp file is
    /// cleaned up on the failure paths that leave one behind.
    pub fn save(&self, store: &Store) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let tmp_path = self
            .path
            .with_extension(format!("tmp.{}", Uuid::new_v4()));

        let json = serde_json::to_vec_pretty(store)
            .map_err(|e| StoreError::corrupt(format!("store failed to serialize: {e}")))?;

        let result = (|| {
            fs::write(&tmp_path, &json)?;
            let f = fs::File::open(&tmp_path)?;
            f.sync_all()?;
            fs::rename(&tmp_path, &self.path)
        })();

        if result.is_err() {
            let _ = fs::remove_file(&tmp_path);
        }
        result?;

        info!(
            path = %self.path.display(),
            hearings = store.len(),
            changes = store.change_log.len(),
            "saved store"
        );
        Ok(())
    }
}
