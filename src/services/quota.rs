// src/services/quota.rs

//! Quota ledger.
//!
//! Every remote call is paid for in units out of a fixed budget. The ledger
//! is shared between stages (and between orchestrators, if the caller
//! wants); `reserve` checks and deducts under one lock.

use std::sync::{Mutex, MutexGuard};

use crate::api::{MAX_BATCH_IDS, MAX_PAGE_SIZE};
use crate::error::{AppError, Result};
use crate::models::{
    CollectOptions, CostTable, Operation, QuotaConfig, QuotaLedgerEntry, Stage,
};

/// Comment threads delivered per page.
const COMMENT_THREADS_PER_PAGE: usize = 100;

#[derive(Debug)]
struct LedgerState {
    remaining: u64,
    entries: Vec<QuotaLedgerEntry>,
}

/// Append-only record of quota consumption against a budget.
#[derive(Debug)]
pub struct QuotaLedger {
    budget: u64,
    costs: CostTable,
    state: Mutex<LedgerState>,
}

impl QuotaLedger {
    pub fn new(budget: u64, costs: CostTable) -> Self {
        Self {
            budget,
            costs,
            state: Mutex::new(LedgerState {
                remaining: budget,
                entries: Vec::new(),
            }),
        }
    }

    pub fn from_config(config: &QuotaConfig) -> Self {
        Self::new(config.daily_budget, config.costs.clone())
    }

    pub fn budget(&self) -> u64 {
        self.budget
    }

    pub fn costs(&self) -> &CostTable {
        &self.costs
    }

    fn state(&self) -> MutexGuard<'_, LedgerState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Atomically deduct `cost` units, or refuse without changing anything.
    pub fn reserve(&self, operation: &str, cost: u64) -> Result<()> {
        let mut state = self.state();
        if cost > state.remaining {
            log::warn!(
                "Quota refused for {}: needs {}, {} remaining",
                operation,
                cost,
                state.remaining
            );
            return Err(AppError::quota_exceeded(operation, cost, state.remaining));
        }
        state.remaining -= cost;
        let remaining_after = state.remaining;
        state.entries.push(QuotaLedgerEntry {
            operation_name: operation.to_string(),
            unit_cost: cost as i64,
            remaining_after,
        });
        Ok(())
    }

    /// Reserve the configured cost of one call.
    pub fn charge(&self, operation: Operation) -> Result<()> {
        self.reserve(operation.name(), self.costs.cost(operation))
    }

    /// Return units reserved but not spent.
    pub fn release(&self, operation: &str, units: u64) {
        if units == 0 {
            return;
        }
        let mut state = self.state();
        let returned = units.min(self.budget - state.remaining);
        state.remaining += returned;
        let remaining_after = state.remaining;
        state.entries.push(QuotaLedgerEntry {
            operation_name: operation.to_string(),
            unit_cost: -(returned as i64),
            remaining_after,
        });
    }

    pub fn consumed(&self) -> u64 {
        self.budget - self.state().remaining
    }

    pub fn remaining(&self) -> u64 {
        self.state().remaining
    }

    pub fn entries(&self) -> Vec<QuotaLedgerEntry> {
        self.state().entries.clone()
    }

    /// Units a call with `options` is expected to need, with nothing known
    /// about the channel.
    pub fn estimate(&self, options: &CollectOptions) -> u64 {
        self.estimate_for(options, None)
    }

    /// Like [`Self::estimate`], using the channel's known video count.
    pub fn estimate_for(&self, options: &CollectOptions, known_videos: Option<usize>) -> u64 {
        [
            (options.fetch_channel_data, Stage::Channel),
            (options.fetch_videos, Stage::Videos),
            (options.fetch_comments, Stage::Comments),
        ]
        .into_iter()
        .filter(|(enabled, _)| *enabled)
        .map(|(_, stage)| self.estimate_stage(stage, options, known_videos))
        .sum()
    }

    /// Expected cost of one stage, using the known video count if any.
    pub fn estimate_stage(
        &self,
        stage: Stage,
        options: &CollectOptions,
        known_videos: Option<usize>,
    ) -> u64 {
        let videos = planned_videos(options.max_videos, known_videos);
        self.stage_cost(stage, options, videos)
    }

    /// Expected cost of one stage over `videos` videos.
    ///
    /// Reply pages beyond the replies embedded in comment threads are not
    /// part of the estimate; they are charged as they happen.
    pub fn stage_cost(&self, stage: Stage, options: &CollectOptions, videos: usize) -> u64 {
        match stage {
            Stage::Channel => self.costs.channel_info,
            Stage::Videos => {
                let listing = videos.div_ceil(MAX_PAGE_SIZE as usize).max(1) as u64;
                let details = videos.div_ceil(MAX_BATCH_IDS) as u64;
                listing * self.costs.video_page + details * self.costs.video_details
            }
            Stage::Comments => {
                let pages = match options.max_top_level_comments {
                    0 => 1,
                    cap => cap.div_ceil(COMMENT_THREADS_PER_PAGE),
                };
                (videos * pages) as u64 * self.costs.comment_page
            }
        }
    }

    /// Reserve a stage's estimate up front.
    pub fn open(&self, stage: Stage, estimate: u64) -> Result<Reservation<'_>> {
        let label = format!("stage:{stage}");
        self.reserve(&label, estimate)?;
        Ok(Reservation {
            ledger: self,
            label,
            held: estimate,
        })
    }
}

/// Number of videos a call is expected to touch; one page when unknown.
fn planned_videos(max_videos: usize, known: Option<usize>) -> usize {
    match (max_videos, known) {
        (0, Some(known)) => known,
        (0, None) => MAX_PAGE_SIZE as usize,
        (cap, Some(known)) => cap.min(known),
        (cap, None) => cap,
    }
}

/// Units held for one stage.
///
/// Calls draw from the held units first and reserve their own cost once
/// those run out. Whatever is left goes back to the ledger on drop.
#[derive(Debug)]
pub struct Reservation<'a> {
    ledger: &'a QuotaLedger,
    label: String,
    held: u64,
}

impl Reservation<'_> {
    /// Pay for one call.
    pub fn spend(&mut self, operation: Operation) -> Result<()> {
        let cost = self.ledger.costs.cost(operation);
        if cost <= self.held {
            self.held -= cost;
            return Ok(());
        }
        self.ledger.reserve(operation.name(), cost)
    }

    pub fn held(&self) -> u64 {
        self.held
    }
}

impl Drop for Reservation<'_> {
    fn drop(&mut self) {
        if self.held > 0 {
            log::debug!("Releasing {} unused units of {}", self.held, self.label);
            self.ledger.release(&self.label, self.held);
        }
    }
}
