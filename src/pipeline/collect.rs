// src/pipeline/collect.rs

//! Collection orchestrator.
//!
//! Runs the channel, video and comment stages against a [`Transport`] and
//! merges the results into a working snapshot. Each stage can be requested
//! on its own; feeding the returned snapshot back in as `existing` lets a
//! caller spread one collection over several calls without losing data.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::Utc;

use crate::api::{MAX_BATCH_IDS, MAX_PAGE_SIZE, Transport};
use crate::error::{AppError, ErrorKind, Result};
use crate::models::{
    ChannelSnapshot, CollectOptions, CommentRecord, Config, Operation, QuotaConfig, Stage,
    StageError, VideoCounts, VideoRecord, within_cap,
};
use crate::pipeline::diff::DeltaCalculator;
use crate::pipeline::progress::{CollectProgress, ProgressCallback, emit};
use crate::pipeline::queue::InFlightQueue;
use crate::services::{PaginationDriver, QuotaLedger, Reservation, ShapeNormalizer};
use crate::utils::is_valid_entity_id;

/// Per-orchestrator state shared by every call.
pub struct CollectContext {
    ledger: Arc<QuotaLedger>,
    queue: InFlightQueue,
    progress: Option<ProgressCallback>,
}

impl CollectContext {
    pub fn new(ledger: Arc<QuotaLedger>) -> Self {
        Self {
            ledger,
            queue: InFlightQueue::new(),
            progress: None,
        }
    }

    pub fn ledger(&self) -> &Arc<QuotaLedger> {
        &self.ledger
    }

    pub fn queue(&self) -> &InFlightQueue {
        &self.queue
    }

    fn emit(&self, event: CollectProgress) {
        emit(self.progress.as_ref(), event);
    }
}

/// Comments gathered for one video.
struct FetchedComments {
    comments: Vec<CommentRecord>,
    error: Option<AppError>,
}

/// Sequences the collection stages for one channel at a time.
pub struct CollectionOrchestrator<T: Transport> {
    transport: T,
    normalizer: ShapeNormalizer,
    pagination: PaginationDriver,
    delta: DeltaCalculator,
    context: CollectContext,
}

impl<T: Transport> CollectionOrchestrator<T> {
    /// Create an orchestrator with default retry and quota settings.
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            normalizer: ShapeNormalizer::new(),
            pagination: PaginationDriver::default(),
            delta: DeltaCalculator::new(),
            context: CollectContext::new(Arc::new(QuotaLedger::from_config(
                &QuotaConfig::default(),
            ))),
        }
    }

    /// Create an orchestrator using the retry and quota sections of `config`.
    pub fn from_config(transport: T, config: &Config) -> Self {
        Self::new(transport)
            .with_pagination(PaginationDriver::new(config.retry.clone()))
            .with_ledger(Arc::new(QuotaLedger::from_config(&config.quota)))
    }

    pub fn with_normalizer(mut self, normalizer: ShapeNormalizer) -> Self {
        self.normalizer = normalizer;
        self
    }

    pub fn with_pagination(mut self, pagination: PaginationDriver) -> Self {
        self.pagination = pagination;
        self
    }

    pub fn with_delta_calculator(mut self, delta: DeltaCalculator) -> Self {
        self.delta = delta;
        self
    }

    /// Share a ledger, e.g. between orchestrators drawing on one budget.
    pub fn with_ledger(mut self, ledger: Arc<QuotaLedger>) -> Self {
        self.context.ledger = ledger;
        self
    }

    pub fn with_queue(mut self, queue: InFlightQueue) -> Self {
        self.context.queue = queue;
        self
    }

    pub fn with_progress(mut self, callback: ProgressCallback) -> Self {
        self.context.progress = Some(callback);
        self
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn context(&self) -> &CollectContext {
        &self.context
    }

    pub fn ledger(&self) -> &QuotaLedger {
        &self.context.ledger
    }

    /// Collect the stages `options` requests for channel `id`.
    ///
    /// Never fails: stage failures are recorded in the returned snapshot's
    /// `errors`, and data from stages that succeeded is kept. When `existing`
    /// is given, the result is merged on top of it and carries a delta
    /// against it.
    pub fn collect(
        &self,
        id: &str,
        options: &CollectOptions,
        existing: Option<ChannelSnapshot>,
    ) -> ChannelSnapshot {
        let stages = requested_stages(options);

        if let Some(err) = identifier_error(id, existing.as_ref()) {
            log::warn!("Rejecting collection for '{}': {}", id, err);
            let mut snapshot = ChannelSnapshot::empty(id);
            snapshot.errors = stages.iter().map(|s| StageError::new(*s, &err)).collect();
            return snapshot;
        }

        let stale = self.context.queue.discard(id);
        if stale > 0 {
            log::debug!("Discarding {} unsaved items from an earlier collection of {}", stale, id);
        }

        let mut working = existing
            .clone()
            .unwrap_or_else(|| ChannelSnapshot::empty(id));
        working.delta = None;
        working.errors.clear();

        log::info!(
            "Collecting {} (stages: {:?}, {} units remaining)",
            id,
            stages,
            self.context.ledger.remaining()
        );

        let mut quota_exhausted = false;
        let mut completed = 0;

        for stage in stages {
            if quota_exhausted {
                let err = AppError::quota_exceeded(
                    format!("stage:{stage}"),
                    self.stage_estimate(stage, options, &working),
                    self.context.ledger.remaining(),
                );
                working.errors.push(StageError::new(stage, &err));
                self.context.emit(CollectProgress::StageSkipped {
                    stage,
                    reason: ErrorKind::QuotaExceeded,
                });
                continue;
            }

            self.context.emit(CollectProgress::StageStarted { stage });
            let result = match stage {
                Stage::Channel => self.channel_stage(&mut working, options),
                Stage::Videos => self.video_stage(&mut working, options),
                Stage::Comments => self.comment_stage(&mut working, options),
            };

            match result {
                Ok(()) => {
                    completed += 1;
                    self.context.emit(CollectProgress::StageCompleted { stage });
                }
                Err(e) => {
                    log::warn!("Stage {} failed for {}: {}", stage, id, e);
                    if e.kind() == ErrorKind::QuotaExceeded {
                        quota_exhausted = true;
                    }
                    self.context.emit(CollectProgress::StageFailed {
                        stage,
                        kind: e.kind(),
                    });
                    working.errors.push(StageError::new(stage, &e));
                }
            }
        }

        if completed > 0 {
            working.fetched_at = Utc::now();
        }

        if let Some(previous) = existing.as_ref() {
            working.delta = Some(self.delta.diff(previous, &working));
        }

        log::info!(
            "Collected {}: {} videos, {} comments, {} stage errors, {} units consumed",
            id,
            working.videos.len(),
            working.total_comments(),
            working.errors.len(),
            self.context.ledger.consumed()
        );

        working
    }

    fn channel_stage(&self, working: &mut ChannelSnapshot, options: &CollectOptions) -> Result<()> {
        let ledger = &self.context.ledger;
        let mut reservation =
            ledger.open(Stage::Channel, self.stage_estimate(Stage::Channel, options, working))?;

        let id = working.channel_id.clone();
        let raw = self.pagination.call(|| {
            reservation.spend(Operation::ChannelInfo)?;
            self.transport.get_entity_info(&id)
        })?;

        let fresh = self.normalizer.normalize_channel(&raw);
        if !fresh.channel_id.is_empty() && fresh.channel_id != id {
            log::warn!(
                "Channel record for {} reports id {}; keeping {}",
                id,
                fresh.channel_id,
                id
            );
        }
        working.absorb_channel(fresh);
        self.context.queue.push(&id, Stage::Channel, &id);
        Ok(())
    }

    fn video_stage(&self, working: &mut ChannelSnapshot, options: &CollectOptions) -> Result<()> {
        let id = working.channel_id.clone();
        let Some(uploads) = working.uploads_container_id.clone() else {
            return Err(AppError::precondition(format!(
                "channel {id} has no uploads container; collect channel data first"
            )));
        };

        let ledger = &self.context.ledger;
        let mut reservation =
            ledger.open(Stage::Videos, self.stage_estimate(Stage::Videos, options, working))?;

        let page_size = match options.max_videos {
            0 => MAX_PAGE_SIZE,
            cap => cap.min(MAX_PAGE_SIZE as usize) as u32,
        };
        let listing = self.pagination.fetch_all(
            |token| {
                reservation.spend(Operation::VideoPage)?;
                self.transport.list_children(&uploads, token, page_size)
            },
            options.max_videos,
        );

        let listed = self.normalizer.normalize_videos(&listing.items);
        self.context.emit(CollectProgress::VideosListed {
            count: listed.len(),
        });
        log::debug!("Listed {} videos for {}", listed.len(), id);

        let (details, missing, detail_error) = self.fetch_details(&listed, &mut reservation);
        drop(reservation);

        let merged: Vec<VideoRecord> = listed
            .into_iter()
            .map(|mut video| {
                if let Some((detailed, counts)) = details.get(&video.video_id) {
                    video.absorb(detailed.clone(), Some(*counts));
                }
                video
            })
            .collect();
        let appended =
            working.merge_videos_with(merged, |v| details.get(&v.video_id).map(|(_, c)| *c));

        for video_id in &missing {
            if let Some(video) = working.video_mut(video_id) {
                video.unavailable = true;
            }
        }
        for video_id in details.keys().chain(missing.iter()) {
            self.context.queue.push(&id, Stage::Videos, video_id);
        }

        log::debug!(
            "Merged videos for {}: {} new, {} with statistics, {} unavailable",
            id,
            appended,
            details.len(),
            missing.len()
        );

        match (listing.error, detail_error) {
            (Some(e), _) | (None, Some(e)) => Err(e),
            (None, None) => Ok(()),
        }
    }

    /// Fetch statistics for `listed` in batches.
    ///
    /// Returns the detailed records by id along with the counters each one
    /// resolved, the ids a successful batch did not return, and the first
    /// batch failure.
    fn fetch_details(
        &self,
        listed: &[VideoRecord],
        reservation: &mut Reservation<'_>,
    ) -> (HashMap<String, (VideoRecord, VideoCounts)>, Vec<String>, Option<AppError>) {
        let mut seen = HashSet::new();
        let ids: Vec<String> = listed
            .iter()
            .filter(|v| seen.insert(v.video_id.as_str()))
            .map(|v| v.video_id.clone())
            .collect();

        let batches = ids.len().div_ceil(MAX_BATCH_IDS);
        let mut details = HashMap::new();
        let mut missing = Vec::new();
        let mut error: Option<AppError> = None;

        for (index, chunk) in ids.chunks(MAX_BATCH_IDS).enumerate() {
            let result = self.pagination.call(|| {
                reservation.spend(Operation::VideoDetails)?;
                self.transport.get_batch_details(chunk)
            });

            match result {
                Ok(raw) => {
                    for record in &raw {
                        let (video, counts) = self.normalizer.normalize_video_counted(record);
                        if video.video_id.is_empty() {
                            log::debug!("Skipping detail record without an id");
                            continue;
                        }
                        details.insert(video.video_id.clone(), (video, counts));
                    }
                    missing.extend(chunk.iter().filter(|id| !details.contains_key(*id)).cloned());
                    self.context.emit(CollectProgress::DetailsFetched {
                        batch: index + 1,
                        batches,
                    });
                }
                Err(e) => {
                    log::warn!("Detail batch {}/{} failed: {}", index + 1, batches, e);
                    let stop = e.kind() == ErrorKind::QuotaExceeded;
                    error.get_or_insert(e);
                    if stop {
                        break;
                    }
                }
            }
        }

        (details, missing, error)
    }

    /// Units `stage` would reserve when run against `working`.
    fn stage_estimate(
        &self,
        stage: Stage,
        options: &CollectOptions,
        working: &ChannelSnapshot,
    ) -> u64 {
        let ledger = &self.context.ledger;
        match stage {
            Stage::Channel => ledger.estimate_stage(stage, options, None),
            Stage::Videos => {
                let known = working.video_count.map(|n| n as usize);
                ledger.estimate_stage(stage, options, known)
            }
            Stage::Comments => {
                let targets = comment_targets(working, options).len();
                ledger.stage_cost(stage, options, targets)
            }
        }
    }

    fn comment_stage(&self, working: &mut ChannelSnapshot, options: &CollectOptions) -> Result<()> {
        let id = working.channel_id.clone();
        let targets = comment_targets(working, options);

        if targets.is_empty() {
            log::debug!("No videos of {} need comments", id);
            return Ok(());
        }

        let ledger = &self.context.ledger;
        let mut reservation = ledger.open(
            Stage::Comments,
            ledger.stage_cost(Stage::Comments, options, targets.len()),
        )?;

        let mut first_error: Option<AppError> = None;
        for video_id in &targets {
            let fetched = self.fetch_comments(video_id, options, &mut reservation);
            let complete = fetched.error.is_none();
            let count = fetched.comments.len();

            if let Some(video) = working.video_mut(video_id) {
                video.merge_comments(fetched.comments, complete);
                if options.max_comments_per_video > 0 {
                    video.comments.truncate(options.max_comments_per_video);
                }
            }
            self.context.queue.push(&id, Stage::Comments, video_id);
            self.context.emit(CollectProgress::CommentsFetched {
                video_id: video_id.clone(),
                count,
            });

            match fetched.error {
                None => {}
                Some(e) if e.kind() == ErrorKind::NotFound => {
                    log::debug!("Video {} no longer has comments: {}", video_id, e);
                }
                Some(e) if e.kind() == ErrorKind::QuotaExceeded => return Err(e),
                Some(e) => {
                    log::warn!("Comments of {} incomplete: {}", video_id, e);
                    first_error.get_or_insert(e);
                }
            }
        }

        first_error.map_or(Ok(()), Err)
    }

    /// Threads in page order, each followed by its replies, up to the caps.
    fn fetch_comments(
        &self,
        video_id: &str,
        options: &CollectOptions,
        reservation: &mut Reservation<'_>,
    ) -> FetchedComments {
        let threads = self.pagination.fetch_all(
            |token| {
                reservation.spend(Operation::CommentPage)?;
                self.transport.list_comments(video_id, token)
            },
            options.max_top_level_comments,
        );

        let mut error = threads.error;
        let mut comments = Vec::new();

        for raw in &threads.items {
            if !within_cap(comments.len(), options.max_comments_per_video) {
                break;
            }
            let Some(thread) = self.normalizer.normalize_comment_thread(raw) else {
                continue;
            };

            let mut replies = thread.replies;
            let more_available = (thread.total_reply_count as usize) > replies.len();
            let room = within_cap(replies.len(), options.max_replies_per_comment);
            if more_available && room && error.is_none() {
                let top_id = thread.top.comment_id.as_str();
                let paged = self.pagination.fetch_all(
                    |token| {
                        reservation.spend(Operation::ReplyPage)?;
                        self.transport.list_replies(top_id, token)
                    },
                    options.max_replies_per_comment,
                );
                let fetched: Vec<CommentRecord> = paged
                    .items
                    .iter()
                    .filter_map(|r| self.normalizer.normalize_comment(r, Some(top_id)))
                    .collect();
                if fetched.len() > replies.len() {
                    replies = fetched;
                }
                if let Some(e) = paged.error {
                    error = Some(e);
                }
            }
            if options.max_replies_per_comment > 0 {
                replies.truncate(options.max_replies_per_comment);
            }

            comments.push(thread.top);
            comments.extend(replies);
        }

        if options.max_comments_per_video > 0 {
            comments.truncate(options.max_comments_per_video);
        }

        FetchedComments { comments, error }
    }
}

fn requested_stages(options: &CollectOptions) -> Vec<Stage> {
    [
        (options.fetch_channel_data, Stage::Channel),
        (options.fetch_videos, Stage::Videos),
        (options.fetch_comments, Stage::Comments),
    ]
    .into_iter()
    .filter_map(|(enabled, stage)| enabled.then_some(stage))
    .collect()
}

fn identifier_error(id: &str, existing: Option<&ChannelSnapshot>) -> Option<AppError> {
    if !is_valid_entity_id(id) {
        return Some(AppError::invalid_identifier(id));
    }
    match existing {
        Some(snapshot) if snapshot.channel_id != id => Some(AppError::invalid_identifier(format!(
            "{id} (existing snapshot belongs to {})",
            snapshot.channel_id
        ))),
        _ => None,
    }
}

/// Whether the stored comments fall short of what the video can offer.
/// Videos the comment stage would fetch, in snapshot order.
fn comment_targets(working: &ChannelSnapshot, options: &CollectOptions) -> Vec<String> {
    working
        .videos
        .iter()
        .filter(|v| !v.unavailable)
        .filter(|v| !options.optimize_quota || needs_comments(v, options))
        .map(|v| v.video_id.clone())
        .collect()
}

fn needs_comments(video: &VideoRecord, options: &CollectOptions) -> bool {
    let available = video.comment_count as usize;
    let wanted = match options.max_comments_per_video {
        0 => available,
        cap => available.min(cap),
    };
    video.comments.len() < wanted
}
