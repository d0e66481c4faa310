#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::HashMap;

use collector::api::Transport;
use collector::error::{AppError, Result};
use collector::models::Page;
use serde_json::{Value, json};

pub const CHANNEL_ID: &str = "UCBR8-60-B28hp2BmDPdntcQ";
pub const UPLOADS_ID: &str = "UUBR8-60-B28hp2BmDPdntcQ";

/// A comment thread: top-level comment plus reply ids.
#[derive(Debug, Clone)]
pub struct FakeThread {
    pub id: String,
    pub replies: Vec<String>,
    /// Replies delivered inline with the thread; the rest need `list_replies`
    pub inline: usize,
}

impl FakeThread {
    pub fn new(id: &str, replies: usize, inline: usize) -> Self {
        Self {
            id: id.to_string(),
            replies: (1..=replies).map(|n| format!("{id}.r{n}")).collect(),
            inline,
        }
    }
}

#[derive(Debug, Clone)]
pub struct FakeVideo {
    pub id: String,
    pub views: u64,
    pub likes: u64,
    pub threads: Vec<FakeThread>,
    /// Listed but no longer returned by `get_batch_details`
    pub deleted: bool,
}

impl FakeVideo {
    pub fn new(id: &str, views: u64) -> Self {
        Self {
            id: id.to_string(),
            views,
            likes: views / 10,
            threads: Vec::new(),
            deleted: false,
        }
    }

    pub fn with_threads(mut self, threads: Vec<FakeThread>) -> Self {
        self.threads = threads;
        self
    }

    pub fn comment_count(&self) -> usize {
        self.threads.iter().map(|t| 1 + t.replies.len()).sum()
    }
}

#[derive(Debug, Clone)]
pub struct FakeChannel {
    pub subscribers: u64,
    pub views: u64,
    /// Reported video count; defaults to `videos.len()` when `None`
    pub video_count: Option<u64>,
    pub videos: Vec<FakeVideo>,
}

impl FakeChannel {
    pub fn new(videos: Vec<FakeVideo>) -> Self {
        Self {
            subscribers: 10_000,
            views: 5_000_000,
            video_count: None,
            videos,
        }
    }
}

/// Scripted transport over a [`FakeChannel`], counting calls per endpoint.
pub struct MockTransport {
    pub channel: RefCell<FakeChannel>,
    calls: RefCell<HashMap<&'static str, usize>>,
    failures: RefCell<Vec<(&'static str, usize, fn() -> AppError)>>,
    /// Items per page for every paged endpoint
    pub page_limit: usize,
}

impl MockTransport {
    pub fn new(channel: FakeChannel) -> Self {
        Self {
            channel: RefCell::new(channel),
            calls: RefCell::new(HashMap::new()),
            failures: RefCell::new(Vec::new()),
            page_limit: 2,
        }
    }

    /// Fail call number `nth` (1-based) of `endpoint`.
    pub fn fail_on(&self, endpoint: &'static str, nth: usize, error: fn() -> AppError) {
        self.failures.borrow_mut().push((endpoint, nth, error));
    }

    pub fn calls(&self, endpoint: &str) -> usize {
        self.calls.borrow().get(endpoint).copied().unwrap_or(0)
    }

    pub fn total_calls(&self) -> usize {
        self.calls.borrow().values().sum()
    }

    fn record(&self, endpoint: &'static str) -> Result<()> {
        let mut calls = self.calls.borrow_mut();
        let count = calls.entry(endpoint).or_insert(0);
        *count += 1;
        let nth = *count;
        let failure = self
            .failures
            .borrow()
            .iter()
            .find(|(e, n, _)| *e == endpoint && *n == nth)
            .map(|(_, _, make)| make());
        match failure {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn page<T: Clone>(&self, items: &[T], token: Option<&str>, limit: usize) -> Page<T> {
        let start: usize = token.and_then(|t| t.parse().ok()).unwrap_or(0);
        let end = (start + limit).min(items.len());
        let next = (end < items.len()).then(|| end.to_string());
        Page::new(items[start.min(end)..end].to_vec(), next)
    }

    fn comment_json(id: &str, parent: Option<&str>) -> Value {
        let mut snippet = json!({
            "textOriginal": format!("text of {id}"),
            "authorDisplayName": "@viewer",
            "likeCount": 1,
            "publishedAt": "2024-02-01T12:00:00Z"
        });
        if let Some(parent) = parent {
            snippet["parentId"] = json!(parent);
        }
        json!({ "id": id, "snippet": snippet })
    }
}

impl Transport for MockTransport {
    fn get_entity_info(&self, id: &str) -> Result<Value> {
        self.record("channels")?;
        if id != CHANNEL_ID {
            return Err(AppError::not_found(id));
        }
        let channel = self.channel.borrow();
        let video_count = channel
            .video_count
            .unwrap_or(channel.videos.len() as u64);
        Ok(json!({
            "id": CHANNEL_ID,
            "snippet": { "title": "Fixture Channel", "description": "Test fixture" },
            "statistics": {
                "subscriberCount": channel.subscribers.to_string(),
                "hiddenSubscriberCount": false,
                "viewCount": channel.views.to_string(),
                "videoCount": video_count.to_string()
            },
            "contentDetails": { "relatedPlaylists": { "uploads": UPLOADS_ID } }
        }))
    }

    fn list_children(
        &self,
        container_id: &str,
        continuation_token: Option<&str>,
        page_size: u32,
    ) -> Result<Page<Value>> {
        self.record("playlistItems")?;
        if container_id != UPLOADS_ID {
            return Err(AppError::not_found(container_id));
        }
        let items: Vec<Value> = self
            .channel
            .borrow()
            .videos
            .iter()
            .map(|v| {
                json!({
                    "id": format!("PL{}", v.id),
                    "snippet": {
                        "title": format!("Video {}", v.id),
                        "resourceId": { "kind": "youtube#video", "videoId": v.id }
                    },
                    "contentDetails": {
                        "videoId": v.id,
                        "videoPublishedAt": "2024-01-15T08:30:00Z"
                    }
                })
            })
            .collect();
        let limit = self.page_limit.min(page_size as usize);
        Ok(self.page(&items, continuation_token, limit))
    }

    fn get_batch_details(&self, ids: &[String]) -> Result<Vec<Value>> {
        self.record("videos")?;
        assert!(ids.len() <= 50, "batch of {} ids", ids.len());
        let channel = self.channel.borrow();
        Ok(ids
            .iter()
            .filter_map(|id| channel.videos.iter().find(|v| &v.id == id && !v.deleted))
            .map(|v| {
                json!({
                    "id": v.id,
                    "snippet": { "title": format!("Video {}", v.id) },
                    "statistics": {
                        "viewCount": v.views.to_string(),
                        "likeCount": v.likes.to_string(),
                        "commentCount": v.comment_count().to_string()
                    },
                    "status": { "privacyStatus": "public" }
                })
            })
            .collect())
    }

    fn list_comments(
        &self,
        container_id: &str,
        continuation_token: Option<&str>,
    ) -> Result<Page<Value>> {
        self.record("commentThreads")?;
        let channel = self.channel.borrow();
        let Some(video) = channel.videos.iter().find(|v| v.id == container_id) else {
            return Err(AppError::not_found(container_id));
        };
        let threads: Vec<Value> = video
            .threads
            .iter()
            .map(|t| {
                let inline: Vec<Value> = t
                    .replies
                    .iter()
                    .take(t.inline)
                    .map(|r| Self::comment_json(r, Some(&t.id)))
                    .collect();
                json!({
                    "id": t.id,
                    "snippet": {
                        "videoId": video.id,
                        "totalReplyCount": t.replies.len(),
                        "topLevelComment": Self::comment_json(&t.id, None)
                    },
                    "replies": { "comments": inline }
                })
            })
            .collect();
        Ok(self.page(&threads, continuation_token, self.page_limit))
    }

    fn list_replies(
        &self,
        parent_id: &str,
        continuation_token: Option<&str>,
    ) -> Result<Page<Value>> {
        self.record("comments")?;
        let channel = self.channel.borrow();
        let thread = channel
            .videos
            .iter()
            .flat_map(|v| v.threads.iter())
            .find(|t| t.id == parent_id)
            .ok_or_else(|| AppError::not_found(parent_id))?;
        let replies: Vec<Value> = thread
            .replies
            .iter()
            .map(|r| Self::comment_json(r, Some(parent_id)))
            .collect();
        Ok(self.page(&replies, continuation_token, self.page_limit))
    }
}

/// Three videos with a mix of inline and paged replies.
pub fn sample_channel() -> FakeChannel {
    FakeChannel::new(vec![
        FakeVideo::new("vid-a", 1_000).with_threads(vec![
            FakeThread::new("a1", 3, 1),
            FakeThread::new("a2", 0, 0),
            FakeThread::new("a3", 1, 1),
        ]),
        FakeVideo::new("vid-b", 500).with_threads(vec![FakeThread::new("b1", 2, 2)]),
        FakeVideo::new("vid-c", 20),
    ])
}
