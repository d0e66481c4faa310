//! Delta report structures.

use serde::{Deserialize, Serialize};

use crate::models::VideoRecord;

/// Signed change of the channel-level counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelDelta {
    pub subscriber_count: i64,
    pub view_count: i64,
    pub video_count: i64,
}

/// Counter changes of a video present in both snapshots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoUpdate {
    pub video_id: String,
    pub views_delta: i64,
    pub likes_delta: i64,
    pub comment_count_delta: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoDelta {
    pub new_videos: Vec<VideoRecord>,
    pub updated_videos: Vec<VideoUpdate>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentDelta {
    pub new_comments: i64,
    pub videos_with_new_comments: usize,
}

/// Structured diff between two snapshots of the same channel.
///
/// Built fresh for every collection that had a prior snapshot. It is a
/// report, never part of the stored state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeltaReport {
    pub channel_delta: ChannelDelta,
    pub video_delta: VideoDelta,
    pub comment_delta: CommentDelta,
}

impl DeltaReport {
    /// Check if anything changed.
    pub fn has_changes(&self) -> bool {
        self.channel_delta != ChannelDelta::default()
            || !self.video_delta.new_videos.is_empty()
            || !self.video_delta.updated_videos.is_empty()
            || self.comment_delta != CommentDelta::default()
    }
}
