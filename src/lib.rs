// src/lib.rs

//! Incremental channel collector library.
//!
//! Collects a channel's metadata, its videos and their comments from the
//! YouTube Data API in independently requestable stages, merges every call
//! into the previous snapshot, and reports what changed.

pub mod api;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod services;
pub mod storage;
pub mod utils;

pub use error::{AppError, ErrorKind, Result};
