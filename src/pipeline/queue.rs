//! In-flight queue.
//!
//! Records items that were fetched during a collection but are not yet
//! persisted. Advisory only: nothing reads it back to resume work, but the
//! runner can tell what a failed save left behind. Entries for a channel
//! live until its next save is committed or its next collection starts.

use std::sync::{Arc, Mutex, MutexGuard};

use crate::models::Stage;

/// An item fetched but not yet saved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingItem {
    pub channel_id: String,
    pub stage: Stage,
    /// Channel, video or video id whose comments were fetched
    pub id: String,
}

/// Cloneable handle to a shared pending list.
#[derive(Debug, Clone, Default)]
pub struct InFlightQueue {
    items: Arc<Mutex<Vec<PendingItem>>>,
}

impl InFlightQueue {
    pub fn new() -> Self {
        Self::default()
    }

    fn items(&self) -> MutexGuard<'_, Vec<PendingItem>> {
        self.items.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn push(&self, channel_id: &str, stage: Stage, id: &str) {
        self.items().push(PendingItem {
            channel_id: channel_id.to_string(),
            stage,
            id: id.to_string(),
        });
    }

    /// Items still pending for `channel_id`.
    pub fn pending(&self, channel_id: &str) -> Vec<PendingItem> {
        self.items()
            .iter()
            .filter(|item| item.channel_id == channel_id)
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.items().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items().is_empty()
    }

    /// Drop every pending item of `channel_id` once its snapshot is saved.
    ///
    /// Returns how many items were committed.
    pub fn commit(&self, channel_id: &str) -> usize {
        self.remove(channel_id)
    }

    /// Drop items a previous collection of `channel_id` left unsaved.
    ///
    /// A new collection starts from the caller's snapshot, so those items are
    /// superseded either way.
    pub fn discard(&self, channel_id: &str) -> usize {
        self.remove(channel_id)
    }

    fn remove(&self, channel_id: &str) -> usize {
        let mut items = self.items();
        let before = items.len();
        items.retain(|item| item.channel_id != channel_id);
        before - items.len()
    }
}
