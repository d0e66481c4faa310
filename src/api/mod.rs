//! Transport contract to the external video API.
//!
//! The collector only talks to the remote service through [`Transport`].
//! Records come back as raw JSON so that the normalizer, not the transport,
//! decides how to read each of their shapes.

pub mod youtube;

use serde_json::Value;

use crate::error::Result;
use crate::models::Page;

pub use youtube::YouTubeClient;

/// Largest id batch accepted by [`Transport::get_batch_details`].
pub const MAX_BATCH_IDS: usize = 50;

/// Largest page size accepted by [`Transport::list_children`].
pub const MAX_PAGE_SIZE: u32 = 50;

/// Typed request methods of the remote API.
///
/// Errors are [`crate::error::AppError`] values; their `kind()` tells
/// not-found, quota and transient failures apart.
pub trait Transport {
    /// Fetch the raw record of a channel.
    fn get_entity_info(&self, id: &str) -> Result<Value>;

    /// One page of a container's children (the uploads of a channel).
    fn list_children(
        &self,
        container_id: &str,
        continuation_token: Option<&str>,
        page_size: u32,
    ) -> Result<Page<Value>>;

    /// Full records for up to [`MAX_BATCH_IDS`] videos.
    ///
    /// Ids that no longer resolve are simply absent from the result.
    fn get_batch_details(&self, ids: &[String]) -> Result<Vec<Value>>;

    /// One page of comment threads under a video.
    fn list_comments(
        &self,
        container_id: &str,
        continuation_token: Option<&str>,
    ) -> Result<Page<Value>>;

    /// One page of replies under a top-level comment.
    ///
    /// Transports that only deliver the replies embedded in comment threads
    /// keep the default.
    fn list_replies(
        &self,
        _parent_id: &str,
        _continuation_token: Option<&str>,
    ) -> Result<Page<Value>> {
        Ok(Page::empty())
    }
}

impl<T: Transport + ?Sized> Transport for &T {
    fn get_entity_info(&self, id: &str) -> Result<Value> {
        (**self).get_entity_info(id)
    }

    fn list_children(
        &self,
        container_id: &str,
        continuation_token: Option<&str>,
        page_size: u32,
    ) -> Result<Page<Value>> {
        (**self).list_children(container_id, continuation_token, page_size)
    }

    fn get_batch_details(&self, ids: &[String]) -> Result<Vec<Value>> {
        (**self).get_batch_details(ids)
    }

    fn list_comments(
        &self,
        container_id: &str,
        continuation_token: Option<&str>,
    ) -> Result<Page<Value>> {
        (**self).list_comments(container_id, continuation_token)
    }

    fn list_replies(
        &self,
        parent_id: &str,
        continuation_token: Option<&str>,
    ) -> Result<Page<Value>> {
        (**self).list_replies(parent_id, continuation_token)
    }
}
