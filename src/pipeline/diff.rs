//! Delta calculation between two snapshots of a channel.
//!
//! Computes what changed since the previous collection: channel counter
//! movement, new videos, videos whose counters moved, and comment growth.

use std::collections::HashMap;

use crate::models::{
    ChannelDelta, ChannelSnapshot, CommentDelta, DeltaReport, VideoDelta, VideoRecord,
    VideoUpdate,
};

/// Calculator for computing deltas between snapshots.
#[derive(Debug, Clone, Default)]
pub struct DeltaCalculator;

impl DeltaCalculator {
    pub fn new() -> Self {
        Self
    }

    /// Diff `old` against `new`.
    ///
    /// Output order follows the video order of `new`, so equal inputs always
    /// produce equal reports.
    pub fn diff(&self, old: &ChannelSnapshot, new: &ChannelSnapshot) -> DeltaReport {
        let old_videos: HashMap<&str, &VideoRecord> = old
            .videos
            .iter()
            .map(|v| (v.video_id.as_str(), v))
            .collect();

        let mut video_delta = VideoDelta::default();
        let mut videos_with_new_comments = 0;

        for video in &new.videos {
            match old_videos.get(video.video_id.as_str()) {
                None => {
                    video_delta.new_videos.push(video.clone());
                    if !video.comments.is_empty() {
                        videos_with_new_comments += 1;
                    }
                }
                Some(previous) => {
                    if video.comments.len() > previous.comments.len() {
                        videos_with_new_comments += 1;
                    }
                    if counters_moved(previous, video) {
                        video_delta.updated_videos.push(VideoUpdate {
                            video_id: video.video_id.clone(),
                            views_delta: signed(previous.view_count, video.view_count),
                            likes_delta: signed(previous.like_count, video.like_count),
                            comment_count_delta: signed(
                                previous.comment_count,
                                video.comment_count,
                            ),
                        });
                    }
                }
            }
        }

        DeltaReport {
            channel_delta: ChannelDelta {
                subscriber_count: optional_delta(old.subscriber_count, new.subscriber_count),
                view_count: optional_delta(old.view_count, new.view_count),
                video_count: optional_delta(old.video_count, new.video_count),
            },
            video_delta,
            comment_delta: CommentDelta {
                new_comments: new.total_comments() as i64 - old.total_comments() as i64,
                videos_with_new_comments,
            },
        }
    }
}

fn counters_moved(old: &VideoRecord, new: &VideoRecord) -> bool {
    old.view_count != new.view_count
        || old.like_count != new.like_count
        || old.comment_count != new.comment_count
}

fn signed(old: u64, new: u64) -> i64 {
    new as i64 - old as i64
}

// Hidden on either side yields 0
fn optional_delta(old: Option<u64>, new: Option<u64>) -> i64 {
    match (old, new) {
        (Some(old), Some(new)) => signed(old, new),
        _ => 0,
    }
}
