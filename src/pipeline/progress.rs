//! Progress reporting for a collection call.

use crate::error::ErrorKind;
use crate::models::Stage;

/// Events emitted while a collection runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CollectProgress {
    StageStarted { stage: Stage },
    StageSkipped { stage: Stage, reason: ErrorKind },
    VideosListed { count: usize },
    DetailsFetched { batch: usize, batches: usize },
    CommentsFetched { video_id: String, count: usize },
    StageFailed { stage: Stage, kind: ErrorKind },
    StageCompleted { stage: Stage },
}

/// Callback invoked for every [`CollectProgress`] event.
pub type ProgressCallback = Box<dyn Fn(&CollectProgress) + Send + Sync>;

/// Deliver an event to the callback, if any, and to the log.
pub fn emit(callback: Option<&ProgressCallback>, event: CollectProgress) {
    log::trace!("{:?}", event);
    if let Some(callback) = callback {
        callback(&event);
    }
}
