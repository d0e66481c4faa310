// src/pipeline/run.rs

//! Load, collect, save.

use crate::api::Transport;
use crate::error::Result;
use crate::models::{ChannelSnapshot, CollectOptions};
use crate::pipeline::CollectionOrchestrator;
use crate::storage::{Repository, WriteMetadata};
use crate::utils::parse_channel_id;

/// Result of one [`run_collect`] call.
#[derive(Debug)]
pub struct CollectOutcome {
    /// The collected snapshot, with its delta and stage errors
    pub snapshot: ChannelSnapshot,
    pub write: WriteMetadata,
    /// In-flight items cleared after the save
    pub committed: usize,
}

/// Collect a channel on top of its stored snapshot and save the result.
///
/// `input` may be a channel id or a channel URL. Stage failures do not fail
/// the run; they are reported in the returned snapshot. Storage failures do.
pub fn run_collect<T: Transport, R: Repository>(
    orchestrator: &CollectionOrchestrator<T>,
    repository: &R,
    input: &str,
    options: &CollectOptions,
) -> Result<CollectOutcome> {
    let channel_id = parse_channel_id(input)?;
    let existing = repository.get_by_id(&channel_id)?;
    if existing.is_none() {
        log::info!("No stored snapshot for {}; starting fresh", channel_id);
    }

    let snapshot = orchestrator.collect(&channel_id, options, existing);

    for error in &snapshot.errors {
        log::warn!("{} stage: {} ({})", error.stage, error.message, error.kind);
    }
    if let Some(delta) = snapshot.delta.as_ref().filter(|d| d.has_changes()) {
        log::info!(
            "Changes: subscribers {:+}, views {:+}, videos {:+}, {} new videos, {} updated, {:+} comments",
            delta.channel_delta.subscriber_count,
            delta.channel_delta.view_count,
            delta.channel_delta.video_count,
            delta.video_delta.new_videos.len(),
            delta.video_delta.updated_videos.len(),
            delta.comment_delta.new_comments
        );
    }

    let write = repository.save(&snapshot)?;
    let committed = orchestrator.context().queue().commit(&channel_id);
    log::debug!("Committed {} in-flight items for {}", committed, channel_id);

    Ok(CollectOutcome {
        snapshot,
        write,
        committed,
    })
}
