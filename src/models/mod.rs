// src/models/mod.rs

//! Domain models for the collector.
//!
//! This module contains all data structures used throughout the crate,
//! organized by their primary purpose.

mod config;
mod delta;
mod options;
mod quota;
mod snapshot;

// Re-export all public types
pub use config::{ApiConfig, Config, QuotaConfig, RetryConfig, StorageConfig};
pub use delta::{ChannelDelta, CommentDelta, DeltaReport, VideoDelta, VideoUpdate};
pub use options::CollectOptions;
pub(crate) use options::within_cap;
pub use quota::{CostTable, Operation, QuotaLedgerEntry};
pub use snapshot::{ChannelSnapshot, CommentRecord, Stage, StageError, VideoCounts, VideoRecord};

/// One page returned by a paged list operation.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Continuation token for the next page; absent or empty on the last page
    pub next_token: Option<String>,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, next_token: Option<String>) -> Self {
        Self { items, next_token }
    }

    pub fn last(items: Vec<T>) -> Self {
        Self::new(items, None)
    }

    pub fn empty() -> Self {
        Self::last(Vec::new())
    }

    /// The token to continue with, if any.
    pub fn continuation(&self) -> Option<&str> {
        self.next_token.as_deref().filter(|t| !t.is_empty())
    }
}
