//! Replaying the offline queue.
//!
//! Entries go out one at a time in insertion order. An entry leaves the queue
//! only once the server holds it; failures stay queued for the next flush.
//! There is no retry or backoff inside a flush.

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::error::SyncError;
use crate::payload::{NewActivityPayload, SyncStatus};
use crate::queue::OfflineQueue;

/// Somewhere a queued activity can be written.
#[async_trait]
pub trait ActivitySink: Send + Sync {
    async fn insert(&self, payload: &NewActivityPayload) -> Result<(), SyncError>;
}

/// Outcome of one flush.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FlushReport {
    pub attempted: usize,
    pub synced: usize,
    pub failed: usize,
}

/// Replay every queued entry through `sink` and persist what remains.
///
/// An entry the server already holds counts as synced.
pub async fn flush(
    queue: &mut OfflineQueue,
    sink: &dyn ActivitySink,
) -> Result<FlushReport, SyncError> {
    let mut report = FlushReport::default();

    for entry in queue.entries().to_vec() {
        report.attempted += 1;

        let mut payload = entry.data;
        payload.sync_status = SyncStatus::Synced;

        match sink.insert(&payload).await {
            Ok(()) | Err(SyncError::Duplicate(_)) => {
                queue.remove(&entry.id);
                report.synced += 1;
            }
            Err(e) => {
                warn!(entry = %entry.id, error = %e, "Queued entry failed to sync");
                report.failed += 1;
            }
        }
    }

    queue.save()?;

    if report.attempted > 0 {
        info!(
            synced = report.synced,
            failed = report.failed,
            "Offline queue flushed"
        );
    }
    Ok(report)
}

/// Owns a queue and refuses overlapping flushes.
pub struct SyncManager {
    queue: Mutex<OfflineQueue>,
    syncing: AtomicBool,
}

impl SyncManager {
    pub fn new(queue: OfflineQueue) -> Self {
        Self {
            queue: Mutex::new(queue),
            syncing: AtomicBool::new(false),
        }
    }

    pub fn is_syncing(&self) -> bool {
        self.syncing.load(Ordering::SeqCst)
    }

    /// Queue an entry and persist the queue.
    pub async fn enqueue(&self, payload: NewActivityPayload) -> Result<String, SyncError> {
        let mut queue = self.queue.lock().await;
        let id = queue.push(payload);
        queue.save()?;
        Ok(id)
    }

    pub async fn pending(&self) -> usize {
        self.queue.lock().await.len()
    }

    /// Flush the queue, or fail with `AlreadySyncing` if a flush is running.
    pub async fn flush(&self, sink: &dyn ActivitySink) -> Result<FlushReport, SyncError> {
        if self
            .syncing
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(SyncError::AlreadySyncing);
        }
        let _guard = SyncingGuard(&self.syncing);

        let mut queue = self.queue.lock().await;
        flush(&mut queue, sink).await
    }
}

/// Clears the syncing flag when a flush ends, including when its future is
/// dropped mid-flight.
struct SyncingGuard<'a>(&'a AtomicBool);

impl Drop for SyncingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}
