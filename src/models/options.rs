//! Per-call collection options.

use serde::{Deserialize, Serialize};

/// Which stages to run and how far to go.
///
/// For every cap, `0` means unlimited. Unknown keys are rejected when the
/// options are read from a config file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CollectOptions {
    #[serde(default = "defaults::enabled")]
    pub fetch_channel_data: bool,

    #[serde(default = "defaults::enabled")]
    pub fetch_videos: bool,

    #[serde(default)]
    pub fetch_comments: bool,

    #[serde(default)]
    pub max_videos: usize,

    /// Hard ceiling on top-level comments plus replies kept per video
    #[serde(default = "defaults::max_comments_per_video")]
    pub max_comments_per_video: usize,

    #[serde(default = "defaults::max_top_level_comments")]
    pub max_top_level_comments: usize,

    #[serde(default = "defaults::max_replies_per_comment")]
    pub max_replies_per_comment: usize,

    /// Skip comment refreshes for videos that already hold enough comments
    #[serde(default = "defaults::enabled")]
    pub optimize_quota: bool,
}

impl Default for CollectOptions {
    fn default() -> Self {
        Self {
            fetch_channel_data: true,
            fetch_videos: true,
            fetch_comments: false,
            max_videos: 0,
            max_comments_per_video: defaults::max_comments_per_video(),
            max_top_level_comments: defaults::max_top_level_comments(),
            max_replies_per_comment: defaults::max_replies_per_comment(),
            optimize_quota: true,
        }
    }
}

impl CollectOptions {
    /// Only the channel metadata stage.
    pub fn channel_only() -> Self {
        Self::only(true, false, false)
    }

    /// Only the video stage.
    pub fn videos_only() -> Self {
        Self::only(false, true, false)
    }

    /// Only the comment stage.
    pub fn comments_only() -> Self {
        Self::only(false, false, true)
    }

    /// All three stages.
    pub fn all_stages() -> Self {
        Self::only(true, true, true)
    }

    fn only(channel: bool, videos: bool, comments: bool) -> Self {
        Self {
            fetch_channel_data: channel,
            fetch_videos: videos,
            fetch_comments: comments,
            ..Self::default()
        }
    }

    pub fn any_stage(&self) -> bool {
        self.fetch_channel_data || self.fetch_videos || self.fetch_comments
    }
}

/// Apply a cap where `0` means unlimited.
pub(crate) fn within_cap(len: usize, cap: usize) -> bool {
    cap == 0 || len < cap
}

mod defaults {
    pub fn enabled() -> bool {
        true
    }
    pub fn max_comments_per_video() -> usize {
        100
    }
    pub fn max_top_level_comments() -> usize {
        100
    }
    pub fn max_replies_per_comment() -> usize {
        10
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn misspelled_keys_are_rejected() {
        let err = toml::from_str::<CollectOptions>("fetch_comment = true").unwrap_err();
        assert!(err.to_string().contains("fetch_comment"));
    }

    #[test]
    fn missing_keys_take_defaults() {
        let options: CollectOptions = toml::from_str("fetch_comments = true").unwrap();
        assert!(options.fetch_channel_data);
        assert!(options.fetch_comments);
        assert_eq!(options.max_replies_per_comment, 10);
    }

    #[test]
    fn zero_cap_is_unlimited() {
        assert!(within_cap(1_000_000, 0));
        assert!(within_cap(2, 3));
        assert!(!within_cap(3, 3));
    }
}
