//! Service layer for the collector.
//!
//! This module contains the building blocks the orchestrator composes:
//! - Record normalization (`ShapeNormalizer`)
//! - Paged list traversal (`PaginationDriver`)
//! - Quota accounting (`QuotaLedger`)

mod normalizer;
mod pagination;
mod quota;

pub use normalizer::{CommentThread, ShapeNormalizer};
pub use pagination::{Paged, PaginationDriver};
pub use quota::{QuotaLedger, Reservation};
