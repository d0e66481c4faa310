//! Storage abstractions for snapshot persistence.
//!
//! A repository keeps the latest snapshot per channel. The local backend
//! also rotates superseded versions into a per-channel history:
//!
//! ```text
//! storage/
//! ├── channels/
//! │   └── {channel_id}.json          # Latest snapshot
//! └── history/
//!     └── {channel_id}/
//!         └── 20260101T120000.000Z_000.json
//! ```

pub mod local;
pub mod memory;

use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::models::ChannelSnapshot;

// Re-export for convenience
pub use local::LocalRepository;
pub use memory::MemoryRepository;

/// Metadata about a save operation.
#[derive(Debug, Clone)]
pub struct WriteMetadata {
    pub channel_id: String,
    pub video_count: usize,
    pub comment_count: usize,
    /// Where the snapshot ended up (path or backend key)
    pub location: String,
    /// The stored content was identical and nothing was written
    pub unchanged: bool,
    /// A previous version was moved into history
    pub rotated: bool,
    pub timestamp: DateTime<Utc>,
}

impl WriteMetadata {
    fn for_snapshot(snapshot: &ChannelSnapshot, location: String) -> Self {
        Self {
            channel_id: snapshot.channel_id.clone(),
            video_count: snapshot.videos.len(),
            comment_count: snapshot.total_comments(),
            location,
            unchanged: false,
            rotated: false,
            timestamp: Utc::now(),
        }
    }
}

/// Trait for snapshot storage backends.
///
/// Reports attached to a snapshot (`delta`, `errors`) are never stored.
pub trait Repository {
    /// Load the latest snapshot of a channel, if one was saved.
    fn get_by_id(&self, channel_id: &str) -> Result<Option<ChannelSnapshot>>;

    /// Store `snapshot` as the latest version of its channel.
    ///
    /// Saving the same snapshot twice leaves the store as after the first
    /// save.
    fn save(&self, snapshot: &ChannelSnapshot) -> Result<WriteMetadata>;

    /// Names of the superseded versions of a channel, newest first.
    fn list_history(&self, _channel_id: &str) -> Result<Vec<String>> {
        Ok(Vec::new())
    }
}

impl<R: Repository + ?Sized> Repository for &R {
    fn get_by_id(&self, channel_id: &str) -> Result<Option<ChannelSnapshot>> {
        (**self).get_by_id(channel_id)
    }

    fn save(&self, snapshot: &ChannelSnapshot) -> Result<WriteMetadata> {
        (**self).save(snapshot)
    }

    fn list_history(&self, channel_id: &str) -> Result<Vec<String>> {
        (**self).list_history(channel_id)
    }
}
