//! In-memory repository, for tests and one-off runs.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use crate::error::Result;
use crate::models::ChannelSnapshot;
use crate::storage::{Repository, WriteMetadata};

#[derive(Debug, Default)]
pub struct MemoryRepository {
    snapshots: Mutex<HashMap<String, ChannelSnapshot>>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn snapshots(&self) -> MutexGuard<'_, HashMap<String, ChannelSnapshot>> {
        self.snapshots
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn len(&self) -> usize {
        self.snapshots().len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots().is_empty()
    }
}

impl Repository for MemoryRepository {
    fn get_by_id(&self, channel_id: &str) -> Result<Option<ChannelSnapshot>> {
        Ok(self.snapshots().get(channel_id).cloned())
    }

    fn save(&self, snapshot: &ChannelSnapshot) -> Result<WriteMetadata> {
        let mut stored = snapshot.clone();
        stored.delta = None;
        stored.errors.clear();

        let mut meta = WriteMetadata::for_snapshot(snapshot, format!("memory:{}", snapshot.channel_id));
        let mut snapshots = self.snapshots();
        if snapshots.get(&snapshot.channel_id) == Some(&stored) {
            meta.unchanged = true;
        } else {
            snapshots.insert(snapshot.channel_id.clone(), stored);
        }
        Ok(meta)
    }
}
