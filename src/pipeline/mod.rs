//! Collection pipeline.
//!
//! - `CollectionOrchestrator`: runs the channel, video and comment stages
//! - `DeltaCalculator`: diffs two snapshots of a channel
//! - `run_collect`: loads the stored snapshot, collects and saves

pub mod collect;
pub mod diff;
pub mod progress;
pub mod queue;
pub mod run;

pub use collect::{CollectContext, CollectionOrchestrator};
pub use diff::DeltaCalculator;
pub use progress::{CollectProgress, ProgressCallback};
pub use queue::{InFlightQueue, PendingItem};
pub use run::{CollectOutcome, run_collect};
