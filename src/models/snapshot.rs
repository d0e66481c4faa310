//! Channel, video and comment snapshot structures.

use std::collections::{HashMap, HashSet};
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, ErrorKind};
use crate::models::DeltaReport;

/// One of the three independently-triggerable collection phases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Channel,
    Videos,
    Comments,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Stage::Channel => "channel",
            Stage::Videos => "videos",
            Stage::Comments => "comments",
        })
    }
}

/// Error marker scoped to the stage that failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageError {
    pub stage: Stage,
    pub kind: ErrorKind,
    pub message: String,
}

impl StageError {
    pub fn new(stage: Stage, error: &AppError) -> Self {
        Self {
            stage,
            kind: error.kind(),
            message: error.to_string(),
        }
    }
}

/// A single comment or reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentRecord {
    pub comment_id: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub published_at: String,
    #[serde(default)]
    pub like_count: u64,
    /// Top-level comment this one replies to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
}

/// A video with normalized counters and its collected comments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoRecord {
    pub video_id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub published_at: String,
    #[serde(default)]
    pub view_count: u64,
    #[serde(default)]
    pub like_count: u64,
    #[serde(default)]
    pub comment_count: u64,
    #[serde(default)]
    pub thumbnail_url: String,
    #[serde(default)]
    pub comments: Vec<CommentRecord>,
    /// The source marked this video private, deleted or otherwise inaccessible
    #[serde(default)]
    pub unavailable: bool,
}

/// Counters a source record actually carried.
///
/// `None` marks a counter the record held no usable value for, including a
/// `"0"` placeholder, so merging leaves the stored value alone.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VideoCounts {
    pub view_count: Option<u64>,
    pub like_count: Option<u64>,
    pub comment_count: Option<u64>,
}

impl VideoCounts {
    /// Treat every counter of `video` as resolved.
    pub fn of(video: &VideoRecord) -> Self {
        Self {
            view_count: Some(video.view_count),
            like_count: Some(video.like_count),
            comment_count: Some(video.comment_count),
        }
    }
}

impl VideoRecord {
    /// Take the remote fields of `fresh`, keeping collected comments.
    ///
    /// `counts` says which counters of `fresh` to take. `None` leaves every
    /// counter and the availability flag untouched, which is used when only
    /// listing data (no statistics) could be fetched.
    pub fn absorb(&mut self, fresh: VideoRecord, counts: Option<VideoCounts>) {
        if !fresh.title.is_empty() {
            self.title = fresh.title;
        }
        if !fresh.published_at.is_empty() {
            self.published_at = fresh.published_at;
        }
        if !fresh.thumbnail_url.is_empty() {
            self.thumbnail_url = fresh.thumbnail_url;
        }
        if let Some(counts) = counts {
            if let Some(n) = counts.view_count {
                self.view_count = n;
            }
            if let Some(n) = counts.like_count {
                self.like_count = n;
            }
            if let Some(n) = counts.comment_count {
                self.comment_count = n;
            }
            self.unavailable = fresh.unavailable;
        }
    }

    /// Replace the comment list, or merge it with the stored one when the
    /// fetch was partial.
    pub fn merge_comments(&mut self, fetched: Vec<CommentRecord>, complete: bool) {
        if complete {
            self.comments = fetched;
            return;
        }
        let mut index: HashMap<String, usize> = self
            .comments
            .iter()
            .enumerate()
            .map(|(i, c)| (c.comment_id.clone(), i))
            .collect();
        for comment in fetched {
            match index.get(&comment.comment_id) {
                Some(&i) => self.comments[i] = comment,
                None => {
                    index.insert(comment.comment_id.clone(), self.comments.len());
                    self.comments.push(comment);
                }
            }
        }
    }
}

/// The full in-memory representation of one channel at a point in time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelSnapshot {
    pub channel_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// `None` when the channel hides the value
    #[serde(default)]
    pub subscriber_count: Option<u64>,
    #[serde(default)]
    pub view_count: Option<u64>,
    #[serde(default)]
    pub video_count: Option<u64>,
    #[serde(default)]
    pub uploads_container_id: Option<String>,
    #[serde(default)]
    pub videos: Vec<VideoRecord>,
    pub fetched_at: DateTime<Utc>,

    /// Diff against the snapshot this one was collected on top of
    #[serde(skip_serializing, default)]
    pub delta: Option<DeltaReport>,

    /// Stages that failed during the call that produced this snapshot
    #[serde(skip_serializing, default)]
    pub errors: Vec<StageError>,
}

impl ChannelSnapshot {
    /// An empty snapshot for a channel that has never been collected.
    pub fn empty(channel_id: impl Into<String>) -> Self {
        Self {
            channel_id: channel_id.into(),
            name: String::new(),
            description: String::new(),
            subscriber_count: None,
            view_count: None,
            video_count: None,
            uploads_container_id: None,
            videos: Vec::new(),
            fetched_at: DateTime::<Utc>::default(),
            delta: None,
            errors: Vec::new(),
        }
    }

    /// Overwrite channel-level scalars from `fresh`, preserving videos.
    pub fn absorb_channel(&mut self, fresh: ChannelSnapshot) {
        self.name = fresh.name;
        self.description = fresh.description;
        self.subscriber_count = fresh.subscriber_count;
        self.view_count = fresh.view_count;
        self.video_count = fresh.video_count;
        if fresh.uploads_container_id.is_some() {
            self.uploads_container_id = fresh.uploads_container_id;
        }
    }

    /// Merge freshly fetched videos by `video_id`: update existing entries in
    /// place, append unseen ones in fetch order.
    ///
    /// Returns the number of newly appended videos.
    pub fn merge_videos(&mut self, fresh: Vec<VideoRecord>, with_counts: bool) -> usize {
        self.merge_videos_with(fresh, |v| with_counts.then(|| VideoCounts::of(v)))
    }

    /// Like [`Self::merge_videos`], deciding per record which of its counters
    /// to take.
    pub fn merge_videos_with<F>(&mut self, fresh: Vec<VideoRecord>, counts: F) -> usize
    where
        F: Fn(&VideoRecord) -> Option<VideoCounts>,
    {
        let mut index: HashMap<String, usize> = self
            .videos
            .iter()
            .enumerate()
            .map(|(i, v)| (v.video_id.clone(), i))
            .collect();

        let mut appended = 0;
        for video in fresh {
            match index.get(&video.video_id) {
                Some(&i) => {
                    let counts = counts(&video);
                    self.videos[i].absorb(video, counts);
                }
                None => {
                    index.insert(video.video_id.clone(), self.videos.len());
                    self.videos.push(video);
                    appended += 1;
                }
            }
        }
        appended
    }

    pub fn video(&self, video_id: &str) -> Option<&VideoRecord> {
        self.videos.iter().find(|v| v.video_id == video_id)
    }

    pub fn video_mut(&mut self, video_id: &str) -> Option<&mut VideoRecord> {
        self.videos.iter_mut().find(|v| v.video_id == video_id)
    }

    pub fn total_comments(&self) -> usize {
        self.videos.iter().map(|v| v.comments.len()).sum()
    }

    /// Whether `videos` holds each `video_id` at most once.
    pub fn has_unique_videos(&self) -> bool {
        let mut seen = HashSet::new();
        self.videos.iter().all(|v| seen.insert(v.video_id.as_str()))
    }

    pub fn error_for(&self, stage: Stage) -> Option<&StageError> {
        self.errors.iter().find(|e| e.stage == stage)
    }

    pub fn is_complete(&self) -> bool {
        self.errors.is_empty()
    }
}
