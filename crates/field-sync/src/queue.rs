//! File-backed list of activity writes waiting for a connection.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::SyncError;
use crate::payload::NewActivityPayload;

/// One queued write.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueuedEntry {
    pub id: String,
    pub data: NewActivityPayload,
    /// RFC 3339 time the entry was queued.
    pub timestamp: String,
}

/// Entries kept in insertion order and persisted as a JSON array.
#[derive(Debug)]
pub struct OfflineQueue {
    path: PathBuf,
    entries: Vec<QueuedEntry>,
}

impl OfflineQueue {
    /// Load the queue at `path`. A missing file is an empty queue.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SyncError> {
        let path = path.as_ref().to_path_buf();
        let entries = match fs::read_to_string(&path) {
            Ok(text) if text.trim().is_empty() => Vec::new(),
            Ok(text) => serde_json::from_str(&text)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => return Err(e.into()),
        };

        tracing::debug!(path = %path.display(), entries = entries.len(), "Offline queue loaded");
        Ok(Self { path, entries })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append a write and return its queue ID. Call [`save`](Self::save) to persist.
    pub fn push(&mut self, data: NewActivityPayload) -> String {
        let id = Uuid::new_v4().to_string();
        self.entries.push(QueuedEntry {
            id: id.clone(),
            data,
            timestamp: Utc::now().to_rfc3339(),
        });
        id
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[QueuedEntry] {
        &self.entries
    }

    /// Drop one entry. Returns whether it was present.
    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|entry| entry.id != id);
        self.entries.len() != before
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Write the queue to disk, replacing the previous file.
    pub fn save(&self) -> Result<(), SyncError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_vec_pretty(&self.entries)?)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}
