//! Persistent archive: circular slots of overflowed bins plus the state checkpoint.

use crate::state::{Checkpoint, DepotState};
use crate::store::BlobStore;
use crate::{ArchiveError, ArchiveResult, Event};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::{debug, warn};
use url::Url;

/// Key prefix for archive slots. The slot index is appended.
pub const BIN_ARCHIVE_PREFIX: &str = "splyt_binArchive";

/// Reserved key for the full-state checkpoint.
pub const STATE_KEY: &str = "splyt_depotState";

/// One archived bin as read back from storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArchivedBin {
    pub url: Url,
    pub events: Vec<Event>,
}

#[derive(Serialize)]
struct SlotRef<'a> {
    url: &'a Url,
    events: &'a [Event],
}

/// Archive operations over a [`BlobStore`].
pub struct PersistentArchive {
    store: Box<dyn BlobStore>,
}

impl PersistentArchive {
    pub fn new(store: Box<dyn BlobStore>) -> Self {
        Self { store }
    }

    /// Storage key for a slot index.
    pub fn slot_key(index: usize) -> String {
        format!("{BIN_ARCHIVE_PREFIX}{index}")
    }

    /// Serialize and store a bin, overwriting whatever the slot held.
    pub fn write_slot(&self, index: usize, url: &Url, events: &[Event]) -> ArchiveResult<()> {
        let bytes = serde_json::to_vec(&SlotRef { url, events })?;
        self.store.put(&Self::slot_key(index), &bytes)?;
        debug!(index, events = events.len(), "Archived bin");
        Ok(())
    }

    /// Read a slot back.
    pub fn read_slot(&self, index: usize) -> ArchiveResult<ArchivedBin> {
        let key = Self::slot_key(index);
        let bytes = self
            .store
            .get(&key)?
            .ok_or_else(|| ArchiveError::NotFound(key.clone()))?;

        serde_json::from_slice(&bytes).map_err(|e| ArchiveError::Corrupt {
            key,
            reason: e.to_string(),
        })
    }

    /// Remove a slot. Missing slots are not an error.
    pub fn delete_slot(&self, index: usize) -> ArchiveResult<()> {
        self.store.delete(&Self::slot_key(index))?;
        Ok(())
    }

    pub fn write_checkpoint(&self, state: &DepotState) -> ArchiveResult<()> {
        let bytes = serde_json::to_vec(&Checkpoint::from_state(state))?;
        self.store.put(STATE_KEY, &bytes)
    }

    /// Read the checkpoint, if a readable one exists.
    ///
    /// Undecodable or unreadable checkpoints are logged and reported as absent.
    pub fn read_checkpoint(&self) -> Option<Checkpoint> {
        let bytes = match self.store.get(STATE_KEY) {
            Ok(Some(bytes)) => bytes,
            Ok(None) => return None,
            Err(e) => {
                warn!(error = %e, "Failed to read depot checkpoint");
                return None;
            }
        };

        match serde_json::from_slice(&bytes) {
            Ok(checkpoint) => Some(checkpoint),
            Err(e) => {
                warn!(error = %e, "Discarding corrupt depot checkpoint");
                None
            }
        }
    }

    pub fn delete_checkpoint(&self) -> ArchiveResult<()> {
        self.store.delete(STATE_KEY)?;
        Ok(())
    }

    /// Indices of every slot physically present in storage.
    pub fn list_stale_slots(&self) -> ArchiveResult<BTreeSet<usize>> {
        let keys = self.store.list_keys_with_prefix(BIN_ARCHIVE_PREFIX)?;
        Ok(keys
            .iter()
            .filter_map(|key| key.strip_prefix(BIN_ARCHIVE_PREFIX))
            .filter_map(|suffix| suffix.parse().ok())
            .collect())
    }
}
