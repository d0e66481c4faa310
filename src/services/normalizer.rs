// src/services/normalizer.rs

//! Shape normalizer.
//!
//! Turns raw channel, video and comment records into the canonical models.
//! Counters may sit in a flat field, in a `statistics` object, in a
//! `statistics` field holding a JSON string, under `contentDetails` or
//! `snippet`, or under any key that merely contains the counter name. Each
//! location is tried in a fixed order and the first usable value wins.
//!
//! Normalization never fails: unreadable values resolve to `0`. Feeding a
//! normalized record (serialized back to JSON) through the normalizer again
//! yields the same record.

use chrono::{DateTime, SecondsFormat};
use serde_json::{Map, Value};

use crate::models::{ChannelSnapshot, CommentRecord, VideoCounts, VideoRecord};

type Object = Map<String, Value>;

/// Titles the API substitutes for videos that can no longer be watched.
const UNAVAILABLE_TITLES: [&str; 2] = ["Private video", "Deleted video"];

/// Thumbnail sizes, best first.
const THUMBNAIL_SIZES: [&str; 5] = ["maxres", "standard", "high", "medium", "default"];

/// How deep the generic key scan descends.
const SCAN_DEPTH: usize = 3;

/// Counters the normalizer knows how to find.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Counter {
    Views,
    Likes,
    Comments,
    Subscribers,
    Videos,
}

impl Counter {
    fn flat_keys(self) -> &'static [&'static str] {
        match self {
            Counter::Views => &["view_count", "viewCount", "views"],
            Counter::Likes => &["like_count", "likeCount", "likes"],
            Counter::Comments => &["comment_count", "commentCount"],
            Counter::Subscribers => &["subscriber_count", "subscriberCount", "subscribers"],
            Counter::Videos => &["video_count", "videoCount", "total_videos"],
        }
    }

    fn statistics_key(self) -> &'static str {
        match self {
            Counter::Views => "viewCount",
            Counter::Likes => "likeCount",
            Counter::Comments => "commentCount",
            Counter::Subscribers => "subscriberCount",
            Counter::Videos => "videoCount",
        }
    }

    /// Lowercase, separator-free name matched by the generic scan.
    fn needle(self) -> &'static str {
        match self {
            Counter::Views => "viewcount",
            Counter::Likes => "likecount",
            Counter::Comments => "commentcount",
            Counter::Subscribers => "subscribercount",
            Counter::Videos => "videocount",
        }
    }

    fn scan_matches(self, key: &str) -> bool {
        let key: String = key
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .map(|c| c.to_ascii_lowercase())
            .collect();
        key.contains(self.needle()) && !(self == Counter::Likes && key.contains("dislike"))
    }
}

/// Places a counter may live in, in lookup order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Location {
    Flat,
    Statistics,
    EncodedStatistics,
    ContentDetails,
    Snippet,
    Scan,
}

const LOOKUP_ORDER: [Location; 6] = [
    Location::Flat,
    Location::Statistics,
    Location::EncodedStatistics,
    Location::ContentDetails,
    Location::Snippet,
    Location::Scan,
];

/// Known shapes of a `statistics` field.
#[derive(Debug)]
enum StatisticsShape<'a> {
    Object(&'a Object),
    Encoded(Object),
    Absent,
}

impl<'a> StatisticsShape<'a> {
    fn of(value: Option<&'a Value>) -> Self {
        match value {
            Some(Value::Object(map)) => StatisticsShape::Object(map),
            Some(Value::String(s)) => match serde_json::from_str::<Value>(s) {
                Ok(Value::Object(map)) => StatisticsShape::Encoded(map),
                _ => StatisticsShape::Absent,
            },
            _ => StatisticsShape::Absent,
        }
    }

    fn object(&self) -> Option<&Object> {
        match self {
            StatisticsShape::Object(map) => Some(map),
            StatisticsShape::Encoded(map) => Some(map),
            StatisticsShape::Absent => None,
        }
    }
}

/// What a single raw value says about a counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Candidate {
    Missing,
    /// A `"0"` string that may be masking the real count
    Placeholder,
    Count(u64),
}

impl Candidate {
    fn classify(value: &Value, zero_is_placeholder: bool) -> Self {
        match value {
            Value::Number(n) => n
                .as_u64()
                .or_else(|| {
                    n.as_f64()
                        .filter(|f| f.is_finite() && *f >= 0.0)
                        .map(|f| f as u64)
                })
                .map_or(Candidate::Missing, Candidate::Count),
            Value::String(s) => {
                let s = s.trim();
                if s.is_empty() {
                    return Candidate::Missing;
                }
                if s == "0" && zero_is_placeholder {
                    return Candidate::Placeholder;
                }
                parse_count(s).map_or(Candidate::Missing, Candidate::Count)
            }
            _ => Candidate::Missing,
        }
    }
}

/// Parse "12345", "12,345" or "12345.0".
fn parse_count(s: &str) -> Option<u64> {
    let cleaned: String = s
        .chars()
        .filter(|c| !matches!(c, ',' | '_' | ' '))
        .collect();
    cleaned.parse::<u64>().ok().or_else(|| {
        cleaned
            .parse::<f64>()
            .ok()
            .filter(|f| f.is_finite() && *f >= 0.0)
            .map(|f| f as u64)
    })
}

/// A top-level comment with the replies delivered alongside it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentThread {
    pub top: CommentRecord,
    pub replies: Vec<CommentRecord>,
    /// Replies the source says exist, which may exceed `replies.len()`
    pub total_reply_count: u64,
}

/// Normalizer for raw API records.
#[derive(Debug, Clone)]
pub struct ShapeNormalizer {
    /// Base used to synthesize a thumbnail URL from a video id
    thumbnail_base: String,
}

impl Default for ShapeNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

impl ShapeNormalizer {
    pub fn new() -> Self {
        Self {
            thumbnail_base: "https://i.ytimg.com/vi".to_string(),
        }
    }

    /// Use a different host for synthesized thumbnails.
    pub fn with_thumbnail_base(base: impl Into<String>) -> Self {
        Self {
            thumbnail_base: base.into().trim_end_matches('/').to_string(),
        }
    }

    /// Normalize a video record from any known shape.
    ///
    /// A record without a recognizable id yields an empty `video_id`; use
    /// [`Self::normalize_videos`] to drop those.
    pub fn normalize_video(&self, raw: &Value) -> VideoRecord {
        self.normalize_video_counted(raw).0
    }

    /// Normalize a video and report which counters the record resolved.
    ///
    /// The record's counters read `0` where the matching entry in
    /// [`VideoCounts`] is `None`.
    pub fn normalize_video_counted(&self, raw: &Value) -> (VideoRecord, VideoCounts) {
        let empty = Object::new();
        let record = raw.as_object().unwrap_or(&empty);

        let video_id = video_id(record).unwrap_or_default();
        let title = first_string(record, &[&["title"], &["snippet", "title"]]).unwrap_or_default();
        let published_at = first_string(
            record,
            &[
                &["published_at"],
                &["publishedAt"],
                &["contentDetails", "videoPublishedAt"],
                &["snippet", "publishedAt"],
            ],
        )
        .map(|s| normalize_timestamp(&s))
        .unwrap_or_default();

        let thumbnail_url = self.thumbnail(record, &video_id);
        let unavailable = is_unavailable(record, &title);
        let comments = record
            .get("comments")
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(|c| self.normalize_comment(c, None))
                    .collect()
            })
            .unwrap_or_default();

        let counts = video_counts(record);
        let video = VideoRecord {
            view_count: counts.view_count.unwrap_or(0),
            like_count: counts.like_count.unwrap_or(0),
            comment_count: counts.comment_count.unwrap_or(0),
            video_id,
            title,
            published_at,
            thumbnail_url,
            comments,
            unavailable,
        };
        (video, counts)
    }

    /// Normalize a batch, dropping records without a video id.
    pub fn normalize_videos(&self, raw: &[Value]) -> Vec<VideoRecord> {
        raw.iter()
            .map(|r| self.normalize_video(r))
            .filter(|v| {
                if v.video_id.is_empty() {
                    log::debug!("Skipping video record without an id");
                    false
                } else {
                    true
                }
            })
            .collect()
    }

    /// Normalize a channel record into a snapshot without videos.
    pub fn normalize_channel(&self, raw: &Value) -> ChannelSnapshot {
        let empty = Object::new();
        let record = raw.as_object().unwrap_or(&empty);

        let channel_id = first_string(record, &[&["channel_id"], &["id"], &["snippet", "channelId"]])
            .unwrap_or_default();
        let mut snapshot = ChannelSnapshot::empty(channel_id);

        snapshot.name = first_string(record, &[&["name"], &["title"], &["snippet", "title"]])
            .unwrap_or_default();
        snapshot.description = first_string(
            record,
            &[&["description"], &["snippet", "description"]],
        )
        .unwrap_or_default();

        let hidden = truthy(record, &["statistics", "hiddenSubscriberCount"])
            || truthy(record, &["hidden_subscriber_count"])
            || first_string(record, &[&["subscriber_count"]]).as_deref() == Some("hidden")
            || matches!(record.get("subscriber_count"), Some(Value::Null));
        snapshot.subscriber_count =
            (!hidden).then(|| resolve_counter(record, Counter::Subscribers).unwrap_or(0));
        snapshot.view_count = Some(resolve_counter(record, Counter::Views).unwrap_or(0));
        snapshot.video_count = Some(resolve_counter(record, Counter::Videos).unwrap_or(0));
        snapshot.uploads_container_id = first_string(
            record,
            &[
                &["uploads_container_id"],
                &["contentDetails", "relatedPlaylists", "uploads"],
            ],
        );

        snapshot
    }

    /// Normalize one comment, either canonical or a `comment` resource.
    ///
    /// `parent` fills in the parent id when the record itself lacks one.
    pub fn normalize_comment(&self, raw: &Value, parent: Option<&str>) -> Option<CommentRecord> {
        let record = raw.as_object()?;
        let comment_id = first_string(record, &[&["comment_id"], &["id"]])?;

        let like_count = [lookup(record, &["like_count"]), lookup(record, &["snippet", "likeCount"])]
            .into_iter()
            .flatten()
            .find_map(|v| match Candidate::classify(v, false) {
                Candidate::Count(n) => Some(n),
                _ => None,
            })
            .unwrap_or(0);

        let parent_id = first_string(record, &[&["parent_id"], &["snippet", "parentId"]])
            .or_else(|| parent.map(str::to_string));

        Some(CommentRecord {
            comment_id,
            text: first_string(
                record,
                &[
                    &["text"],
                    &["snippet", "textOriginal"],
                    &["snippet", "textDisplay"],
                ],
            )
            .unwrap_or_default(),
            author: first_string(record, &[&["author"], &["snippet", "authorDisplayName"]])
                .unwrap_or_default(),
            published_at: first_string(record, &[&["published_at"], &["snippet", "publishedAt"]])
                .map(|s| normalize_timestamp(&s))
                .unwrap_or_default(),
            like_count,
            parent_id,
        })
    }

    /// Normalize a `commentThread` resource, or a bare comment treated as a
    /// thread without replies.
    pub fn normalize_comment_thread(&self, raw: &Value) -> Option<CommentThread> {
        let record = raw.as_object()?;

        let Some(top_raw) = lookup(record, &["snippet", "topLevelComment"]) else {
            let top = self.normalize_comment(raw, None)?;
            return Some(CommentThread {
                top,
                replies: Vec::new(),
                total_reply_count: 0,
            });
        };

        let mut top = self.normalize_comment(top_raw, None)?;
        top.parent_id = None;

        let replies: Vec<CommentRecord> = lookup(record, &["replies", "comments"])
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(|c| self.normalize_comment(c, Some(&top.comment_id)))
                    .collect()
            })
            .unwrap_or_default();

        let total_reply_count = lookup(record, &["snippet", "totalReplyCount"])
            .and_then(|v| match Candidate::classify(v, false) {
                Candidate::Count(n) => Some(n),
                _ => None,
            })
            .unwrap_or(replies.len() as u64)
            .max(replies.len() as u64);

        Some(CommentThread {
            top,
            replies,
            total_reply_count,
        })
    }

    fn thumbnail(&self, record: &Object, video_id: &str) -> String {
        if let Some(url) = first_string(record, &[&["thumbnail_url"], &["thumbnail"]]) {
            return url;
        }
        let thumbnails = lookup(record, &["snippet", "thumbnails"]).and_then(Value::as_object);
        if let Some(thumbnails) = thumbnails {
            for size in THUMBNAIL_SIZES {
                if let Some(url) = thumbnails
                    .get(size)
                    .and_then(|t| t.get("url"))
                    .and_then(Value::as_str)
                    .filter(|u| !u.is_empty())
                {
                    return url.to_string();
                }
            }
        }
        if video_id.is_empty() {
            return String::new();
        }
        format!("{}/{}/hqdefault.jpg", self.thumbnail_base, video_id)
    }
}

fn video_counts(record: &Object) -> VideoCounts {
    VideoCounts {
        view_count: resolve_counter(record, Counter::Views),
        like_count: resolve_counter(record, Counter::Likes),
        comment_count: resolve_counter(record, Counter::Comments),
    }
}

/// Resolve a counter by trying each location in order; `None` if none
/// yields a usable value.
fn resolve_counter(record: &Object, counter: Counter) -> Option<u64> {
    let statistics = StatisticsShape::of(record.get("statistics"));

    for location in LOOKUP_ORDER {
        let candidate = match location {
            Location::Flat => counter
                .flat_keys()
                .iter()
                .filter_map(|key| record.get(*key))
                .map(|v| Candidate::classify(v, true))
                .find(|c| matches!(c, Candidate::Count(_)))
                .unwrap_or(Candidate::Missing),
            Location::Statistics => match &statistics {
                StatisticsShape::Object(map) => from_statistics(map, counter),
                _ => Candidate::Missing,
            },
            Location::EncodedStatistics => match &statistics {
                StatisticsShape::Encoded(map) => from_statistics(map, counter),
                _ => Candidate::Missing,
            },
            Location::ContentDetails => nested_statistics(record, "contentDetails", counter),
            Location::Snippet => nested_statistics(record, "snippet", counter),
            Location::Scan => scan(record, counter, SCAN_DEPTH),
        };

        if let Candidate::Count(n) = candidate {
            return Some(n);
        }
    }
    None
}

fn from_statistics(map: &Object, counter: Counter) -> Candidate {
    map.get(counter.statistics_key())
        .map_or(Candidate::Missing, |v| Candidate::classify(v, false))
}

fn nested_statistics(record: &Object, parent: &str, counter: Counter) -> Candidate {
    let shape = StatisticsShape::of(record.get(parent).and_then(|p| p.get("statistics")));
    shape
        .object()
        .map_or(Candidate::Missing, |map| from_statistics(map, counter))
}

/// Depth-limited search for any key containing the counter name.
///
/// `"0"` strings count as placeholders here too, since nothing ties these
/// keys to the counter beyond their name.
fn scan(record: &Object, counter: Counter, depth: usize) -> Candidate {
    for (key, value) in record {
        if counter.scan_matches(key) {
            if let found @ Candidate::Count(_) = Candidate::classify(value, true) {
                return found;
            }
        }
    }
    if depth == 0 {
        return Candidate::Missing;
    }
    for value in record.values() {
        if let Value::Object(child) = value {
            if let found @ Candidate::Count(_) = scan(child, counter, depth - 1) {
                return found;
            }
        }
    }
    Candidate::Missing
}

fn lookup<'a>(record: &'a Object, path: &[&str]) -> Option<&'a Value> {
    let (first, rest) = path.split_first()?;
    rest.iter()
        .try_fold(record.get(*first)?, |value, key| value.get(*key))
}

/// First non-empty string found at any of the paths.
fn first_string(record: &Object, paths: &[&[&str]]) -> Option<String> {
    paths.iter().find_map(|path| {
        lookup(record, path)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    })
}

fn truthy(record: &Object, path: &[&str]) -> bool {
    match lookup(record, path) {
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => s.eq_ignore_ascii_case("true"),
        _ => false,
    }
}

fn video_id(record: &Object) -> Option<String> {
    first_string(
        record,
        &[
            &["video_id"],
            &["id", "videoId"],
            &["contentDetails", "videoId"],
            &["snippet", "resourceId", "videoId"],
            &["id"],
        ],
    )
}

fn is_unavailable(record: &Object, title: &str) -> bool {
    truthy(record, &["unavailable"])
        || UNAVAILABLE_TITLES.contains(&title)
        || first_string(record, &[&["status", "privacyStatus"]]).as_deref() == Some("private")
        || matches!(
            first_string(record, &[&["status", "uploadStatus"]]).as_deref(),
            Some("deleted" | "rejected" | "failed")
        )
}

/// RFC 3339 timestamps are rewritten in UTC with second precision; anything
/// else is kept as given.
fn normalize_timestamp(raw: &str) -> String {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| {
            dt.with_timezone(&chrono::Utc)
                .to_rfc3339_opts(SecondsFormat::Secs, true)
        })
        .unwrap_or_else(|_| raw.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn renormalize(normalizer: &ShapeNormalizer, video: &VideoRecord) -> VideoRecord {
        normalizer.normalize_video(&serde_json::to_value(video).unwrap())
    }

    #[test]
    fn flat_placeholder_zero_defers_to_statistics() {
        let n = ShapeNormalizer::new();
        let v = n.normalize_video(&json!({
            "id": "vid1",
            "views": "0",
            "statistics": { "viewCount": "12345" }
        }));
        assert_eq!(v.view_count, 12345);
    }

    #[test]
    fn flat_placeholder_zero_defers_to_later_flat_key() {
        let n = ShapeNormalizer::new();
        let v = n.normalize_video(&json!({ "id": "vid1", "view_count": "0", "views": "500" }));
        assert_eq!(v.view_count, 500);
    }

    #[test]
    fn placeholder_only_counters_are_reported_unresolved() {
        let n = ShapeNormalizer::new();
        let (v, counts) = n.normalize_video_counted(&json!({
            "id": "vid1",
            "views": "0",
            "likes": 0,
            "statistics": { "commentCount": "4" }
        }));
        assert_eq!(v.view_count, 0);
        assert_eq!(counts.view_count, None);
        assert_eq!(counts.like_count, Some(0));
        assert_eq!(counts.comment_count, Some(4));
    }

    #[test]
    fn malformed_statistics_resolve_to_zero() {
        let n = ShapeNormalizer::new();
        let v = n.normalize_video(&json!({
            "id": "vid1",
            "statistics": { "viewCount": "not_a_number", "commentCount": null }
        }));
        assert_eq!(v.view_count, 0);
        assert_eq!(v.comment_count, 0);
        assert_eq!(v.like_count, 0);
    }

    #[test]
    fn statistics_encoded_as_string() {
        let n = ShapeNormalizer::new();
        let v = n.normalize_video(&json!({
            "id": "vid1",
            "statistics": "{\"viewCount\": \"77\", \"likeCount\": 5, \"commentCount\": \"3\"}"
        }));
        assert_eq!((v.view_count, v.like_count, v.comment_count), (77, 5, 3));
    }

    #[test]
    fn nested_locations_in_priority_order() {
        let n = ShapeNormalizer::new();
        let v = n.normalize_video(&json!({
            "id": "vid1",
            "contentDetails": { "statistics": { "viewCount": "10" } },
            "snippet": { "statistics": { "viewCount": "20", "likeCount": "4" } }
        }));
        assert_eq!(v.view_count, 10);
        assert_eq!(v.like_count, 4);
    }

    #[test]
    fn statistics_zero_is_genuine() {
        let n = ShapeNormalizer::new();
        let v = n.normalize_video(&json!({
            "id": "vid1",
            "statistics": { "viewCount": "0" },
            "snippet": { "statistics": { "viewCount": "99" } }
        }));
        assert_eq!(v.view_count, 0);
    }

    #[test]
    fn generic_scan_finds_odd_keys_but_not_dislikes() {
        let n = ShapeNormalizer::new();
        let v = n.normalize_video(&json!({
            "id": "vid1",
            "metrics": { "totalViewCount": "1,234", "dislikeCount": "9" }
        }));
        assert_eq!(v.view_count, 1234);
        assert_eq!(v.like_count, 0);
    }

    #[test]
    fn playlist_item_shape() {
        let n = ShapeNormalizer::new();
        let v = n.normalize_video(&json!({
            "id": "UExpbGF5bGlzdEl0ZW0",
            "snippet": {
                "title": "  First upload ",
                "publishedAt": "2024-03-01T10:00:00+02:00",
                "resourceId": { "kind": "youtube#video", "videoId": "abc123" },
                "thumbnails": {
                    "default": { "url": "https://img/default.jpg" },
                    "high": { "url": "https://img/high.jpg" }
                }
            },
            "contentDetails": { "videoId": "abc123" }
        }));
        assert_eq!(v.video_id, "abc123");
        assert_eq!(v.title, "First upload");
        assert_eq!(v.published_at, "2024-03-01T08:00:00Z");
        assert_eq!(v.thumbnail_url, "https://img/high.jpg");
    }

    #[test]
    fn thumbnail_is_synthesized_from_id() {
        let n = ShapeNormalizer::new();
        let v = n.normalize_video(&json!({ "video_id": "xyz" }));
        assert_eq!(v.thumbnail_url, "https://i.ytimg.com/vi/xyz/hqdefault.jpg");
    }

    #[test]
    fn private_videos_are_unavailable() {
        let n = ShapeNormalizer::new();
        let v = n.normalize_video(&json!({
            "snippet": { "title": "Private video", "resourceId": { "videoId": "p1" } }
        }));
        assert!(v.unavailable);
    }

    #[test]
    fn normalization_is_idempotent() {
        let n = ShapeNormalizer::new();
        let raws = [
            json!({ "id": "a", "views": "0", "statistics": { "viewCount": "12345" } }),
            json!({ "id": "b", "statistics": { "viewCount": "bad", "commentCount": null } }),
            json!({ "id": "c", "views": "0" }),
            json!({ "id": "d", "statistics": "{\"likeCount\": \"8\"}", "snippet": {
                "title": "Deleted video", "publishedAt": "2023-12-31T23:59:59.123Z" } }),
            json!({ "video_id": "e", "comments": [
                { "comment_id": "c1", "text": "hi", "like_count": "2" },
                { "comment_id": "c2", "text": "re", "parent_id": "c1" }
            ] }),
            json!({ "id": "f", "metrics": { "viewCount": 5.0 } }),
        ];
        for raw in &raws {
            let once = n.normalize_video(raw);
            let twice = renormalize(&n, &once);
            assert_eq!(once, twice, "not idempotent for {raw}");
        }
    }

    #[test]
    fn never_fails_on_non_objects() {
        let n = ShapeNormalizer::new();
        for raw in [json!(null), json!("text"), json!([1, 2]), json!(42)] {
            let v = n.normalize_video(&raw);
            assert_eq!(v.view_count, 0);
            assert!(v.video_id.is_empty());
        }
        assert!(n.normalize_videos(&[json!(null), json!({"id": "ok"})]).len() == 1);
    }

    #[test]
    fn channel_resource_shape() {
        let n = ShapeNormalizer::new();
        let c = n.normalize_channel(&json!({
            "id": "UCabc",
            "snippet": { "title": "Channel", "description": "About" },
            "statistics": {
                "viewCount": "5000000",
                "subscriberCount": "10000",
                "hiddenSubscriberCount": false,
                "videoCount": "250"
            },
            "contentDetails": { "relatedPlaylists": { "uploads": "UUabc" } }
        }));
        assert_eq!(c.channel_id, "UCabc");
        assert_eq!(c.name, "Channel");
        assert_eq!(c.subscriber_count, Some(10000));
        assert_eq!(c.view_count, Some(5_000_000));
        assert_eq!(c.video_count, Some(250));
        assert_eq!(c.uploads_container_id.as_deref(), Some("UUabc"));
    }

    #[test]
    fn hidden_subscribers_stay_hidden() {
        let n = ShapeNormalizer::new();
        let c = n.normalize_channel(&json!({
            "id": "UCabc",
            "statistics": { "hiddenSubscriberCount": true, "viewCount": "1" }
        }));
        assert_eq!(c.subscriber_count, None);
        assert_eq!(c.view_count, Some(1));
    }

    #[test]
    fn stored_channel_renormalizes_unchanged() {
        let n = ShapeNormalizer::new();
        let mut stored = ChannelSnapshot::empty("UCabc");
        stored.name = "Channel".into();
        stored.view_count = Some(9);
        stored.video_count = Some(0);
        stored.uploads_container_id = Some("UUabc".into());

        let again = n.normalize_channel(&serde_json::to_value(&stored).unwrap());
        assert_eq!(again.subscriber_count, None);
        assert_eq!(again.view_count, Some(9));
        assert_eq!(again.video_count, Some(0));
        assert_eq!(again.uploads_container_id.as_deref(), Some("UUabc"));
    }

    #[test]
    fn comment_thread_with_inline_replies() {
        let n = ShapeNormalizer::new();
        let thread = n
            .normalize_comment_thread(&json!({
                "id": "t1",
                "snippet": {
                    "totalReplyCount": 3,
                    "topLevelComment": {
                        "id": "t1",
                        "snippet": {
                            "textOriginal": "Great",
                            "authorDisplayName": "@viewer",
                            "likeCount": 4,
                            "publishedAt": "2024-01-01T00:00:00Z"
                        }
                    }
                },
                "replies": { "comments": [
                    { "id": "t1.r1", "snippet": { "textOriginal": "Agreed", "parentId": "t1" } },
                    { "id": "t1.r2", "snippet": { "textOriginal": "Same" } }
                ] }
            }))
            .unwrap();

        assert_eq!(thread.top.comment_id, "t1");
        assert_eq!(thread.top.like_count, 4);
        assert!(thread.top.parent_id.is_none());
        assert_eq!(thread.replies.len(), 2);
        assert!(thread.replies.iter().all(|r| r.parent_id.as_deref() == Some("t1")));
        assert_eq!(thread.total_reply_count, 3);
    }

    #[test]
    fn comment_without_id_is_skipped() {
        let n = ShapeNormalizer::new();
        assert!(n.normalize_comment(&json!({ "text": "orphan" }), None).is_none());
    }
}
