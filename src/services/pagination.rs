// src/services/pagination.rs

//! Continuation-token traversal with retry.

use crate::error::{AppError, Result};
use crate::models::{Page, RetryConfig, within_cap};

/// Items gathered by [`PaginationDriver::fetch_all`].
///
/// `error` is set when pagination stopped early; `items` then holds
/// everything fetched before the failure.
#[derive(Debug)]
pub struct Paged<T> {
    pub items: Vec<T>,
    pub error: Option<AppError>,
    /// Pages successfully fetched
    pub pages: usize,
}

impl<T> Paged<T> {
    pub fn is_complete(&self) -> bool {
        self.error.is_none()
    }
}

/// Drives any paged list operation to completion or to a cap.
#[derive(Debug, Clone, Default)]
pub struct PaginationDriver {
    retry: RetryConfig,
}

impl PaginationDriver {
    pub fn new(retry: RetryConfig) -> Self {
        Self { retry }
    }

    pub fn retry(&self) -> &RetryConfig {
        &self.retry
    }

    /// Request pages until the continuation token runs out or `cap` items
    /// have been gathered (`0` gathers everything).
    ///
    /// The first call receives `None`; each following call receives the
    /// previous page's token. The page that crosses the cap is truncated.
    pub fn fetch_all<T, F>(&self, mut list: F, cap: usize) -> Paged<T>
    where
        F: FnMut(Option<&str>) -> Result<Page<T>>,
    {
        let mut items: Vec<T> = Vec::new();
        let mut token: Option<String> = None;
        let mut pages = 0;

        loop {
            let page = match self.call(|| list(token.as_deref())) {
                Ok(page) => page,
                Err(e) => {
                    log::warn!(
                        "Pagination stopped after {} pages ({} items): {}",
                        pages,
                        items.len(),
                        e
                    );
                    return Paged {
                        items,
                        error: Some(e),
                        pages,
                    };
                }
            };
            pages += 1;

            let next = page.continuation().map(str::to_string);
            for item in page.items {
                if !within_cap(items.len(), cap) {
                    break;
                }
                items.push(item);
            }

            if next.is_none() || !within_cap(items.len(), cap) {
                break;
            }
            if next == token {
                log::warn!("Continuation token repeated; stopping after {} pages", pages);
                break;
            }
            token = next;
        }

        Paged {
            items,
            error: None,
            pages,
        }
    }

    /// Run a single request, retrying transient failures with backoff.
    pub fn call<T, F>(&self, mut request: F) -> Result<T>
    where
        F: FnMut() -> Result<T>,
    {
        let attempts = self.retry.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            match request() {
                Ok(value) => return Ok(value),
                Err(e) if e.is_retryable() && attempt < attempts => {
                    let delay = self.retry.backoff(attempt);
                    log::debug!(
                        "Attempt {}/{} failed ({}); retrying in {:?}",
                        attempt,
                        attempts,
                        e,
                        delay
                    );
                    std::thread::sleep(delay);
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
