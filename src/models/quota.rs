//! Quota cost table and ledger entries.

use serde::{Deserialize, Serialize};

/// Logical operation kinds charged against the quota budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    ChannelInfo,
    VideoPage,
    VideoDetails,
    CommentPage,
    ReplyPage,
}

impl Operation {
    /// Name of the remote call, as it appears in the ledger.
    pub fn name(self) -> &'static str {
        match self {
            Operation::ChannelInfo => "channels.list",
            Operation::VideoPage => "playlistItems.list",
            Operation::VideoDetails => "videos.list",
            Operation::CommentPage => "commentThreads.list",
            Operation::ReplyPage => "comments.list",
        }
    }
}

/// Fixed unit cost per operation kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CostTable {
    #[serde(default = "defaults::unit")]
    pub channel_info: u64,
    #[serde(default = "defaults::unit")]
    pub video_page: u64,
    #[serde(default = "defaults::unit")]
    pub video_details: u64,
    #[serde(default = "defaults::unit")]
    pub comment_page: u64,
    #[serde(default = "defaults::unit")]
    pub reply_page: u64,
}

impl Default for CostTable {
    fn default() -> Self {
        Self {
            channel_info: 1,
            video_page: 1,
            video_details: 1,
            comment_page: 1,
            reply_page: 1,
        }
    }
}

impl CostTable {
    pub fn cost(&self, operation: Operation) -> u64 {
        match operation {
            Operation::ChannelInfo => self.channel_info,
            Operation::VideoPage => self.video_page,
            Operation::VideoDetails => self.video_details,
            Operation::CommentPage => self.comment_page,
            Operation::ReplyPage => self.reply_page,
        }
    }
}

/// One append-only record of the ledger.
///
/// A negative `unit_cost` returns previously reserved units.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuotaLedgerEntry {
    pub operation_name: String,
    pub unit_cost: i64,
    pub remaining_after: u64,
}

mod defaults {
    pub fn unit() -> u64 {
        1
    }
}
