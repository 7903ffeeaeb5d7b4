//! Recently generated cards, kept so a revisit can skip the whole pipeline.

use crate::storage::StorageManager;
use crate::templates::CardDescriptor;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

const HISTORY_FILE: &str = "history.json";

#[derive(thiserror::Error, Debug)]
pub enum HistoryError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("history file is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Normalized page URL, see `normalize::history_key`.
    pub key: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub card: CardDescriptor,
}

/// Oldest first, at most `capacity` entries, one per key.
pub struct CardHistory {
    storage: Arc<dyn StorageManager>,
    capacity: usize,
}

impl CardHistory {
    pub fn new(storage: Arc<dyn StorageManager>, capacity: usize) -> Self {
        Self { storage, capacity }
    }

    pub fn list(&self) -> Result<Vec<HistoryEntry>, HistoryError> {
        if !self.storage.exists(HISTORY_FILE) {
            return Ok(Vec::new());
        }
        let bytes = self.storage.read(HISTORY_FILE)?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    fn save(&self, entries: &[HistoryEntry]) -> Result<(), HistoryError> {
        let json = serde_json::to_vec_pretty(entries)?;
        self.storage.write(HISTORY_FILE, &json)?;
        Ok(())
    }

    pub fn find(&self, key: &str) -> Result<Option<HistoryEntry>, HistoryError> {
        Ok(self.list()?.into_iter().find(|entry| entry.key == key))
    }

    /// Store `card` as the newest entry, replacing any entry with the same
    /// key and evicting the oldest past capacity. A capacity of 0 disables
    /// recording.
    pub fn record(&self, key: &str, card: CardDescriptor) -> Result<(), HistoryError> {
        if self.capacity == 0 {
            return Ok(());
        }

        let mut entries = self.list().unwrap_or_else(|err| {
            log::warn!("discarding unreadable history: {err}");
            Vec::new()
        });
        entries.retain(|entry| entry.key != key);
        entries.push(HistoryEntry {
            key: key.to_string(),
            created_at: chrono::Utc::now(),
            card,
        });

        if entries.len() > self.capacity {
            let excess = entries.len() - self.capacity;
            entries.drain(..excess);
        }

        log::debug!("history: {} entries", entries.len());
        self.save(&entries)
    }

    pub fn clear(&self) -> Result<(), HistoryError> {
        if self.storage.exists(HISTORY_FILE) {
            self.storage.delete(HISTORY_FILE)?;
        }
        Ok(())
    }
}
