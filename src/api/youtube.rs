//! Blocking client for the YouTube Data API v3.

use std::time::Duration;

use reqwest::StatusCode;
use reqwest::blocking::Client;
use serde::Deserialize;
use serde_json::Value;

use crate::api::{MAX_BATCH_IDS, MAX_PAGE_SIZE, Transport};
use crate::error::{AppError, Result};
use crate::models::{ApiConfig, Page};

/// Comment threads per page (the API maximum).
const COMMENT_PAGE_SIZE: &str = "100";

#[derive(Debug, Deserialize)]
struct ListResponse {
    #[serde(default)]
    items: Vec<Value>,
    #[serde(rename = "nextPageToken")]
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
    #[serde(default)]
    errors: Vec<ErrorReason>,
}

#[derive(Debug, Deserialize)]
struct ErrorReason {
    #[serde(default)]
    reason: String,
}

/// Transport backed by the public Data API, authenticated with an API key.
pub struct YouTubeClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl YouTubeClient {
    /// Create a client with the given API settings and key.
    pub fn new(config: &ApiConfig, api_key: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        })
    }

    fn get(&self, resource: &str, params: &[(&str, &str)]) -> Result<ListResponse> {
        let url = format!("{}/{}", self.base_url, resource);
        log::debug!("GET {} {:?}", resource, params);

        let response = self
            .client
            .get(&url)
            .query(params)
            .query(&[("key", self.api_key.as_str())])
            .send()
            .map_err(|e| {
                if e.is_timeout() || e.is_connect() {
                    AppError::transient(format!("{resource}: {e}"))
                } else {
                    AppError::Http(e)
                }
            })?;

        let status = response.status();
        let body = response.text()?;
        if !status.is_success() {
            return Err(classify_failure(status, &body));
        }
        Ok(serde_json::from_str(&body)?)
    }
}

impl Transport for YouTubeClient {
    fn get_entity_info(&self, id: &str) -> Result<Value> {
        let response = self.get(
            "channels",
            &[("part", "snippet,statistics,contentDetails"), ("id", id)],
        )?;
        response
            .items
            .into_iter()
            .next()
            .ok_or_else(|| AppError::not_found(id))
    }

    fn list_children(
        &self,
        container_id: &str,
        continuation_token: Option<&str>,
        page_size: u32,
    ) -> Result<Page<Value>> {
        let page_size = page_size.clamp(1, MAX_PAGE_SIZE).to_string();
        let mut params = vec![
            ("part", "snippet,contentDetails"),
            ("playlistId", container_id),
            ("maxResults", page_size.as_str()),
        ];
        if let Some(token) = continuation_token {
            params.push(("pageToken", token));
        }

        let response = self.get("playlistItems", &params)?;
        Ok(Page::new(response.items, response.next_page_token))
    }

    fn get_batch_details(&self, ids: &[String]) -> Result<Vec<Value>> {
        if ids.len() > MAX_BATCH_IDS {
            return Err(AppError::validation(format!(
                "videos.list accepts at most {MAX_BATCH_IDS} ids, got {}",
                ids.len()
            )));
        }
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let joined = ids.join(",");
        let response = self.get(
            "videos",
            &[
                ("part", "snippet,statistics,contentDetails,status"),
                ("id", joined.as_str()),
            ],
        )?;
        Ok(response.items)
    }

    fn list_comments(
        &self,
        container_id: &str,
        continuation_token: Option<&str>,
    ) -> Result<Page<Value>> {
        let mut params = vec![
            ("part", "snippet,replies"),
            ("videoId", container_id),
            ("maxResults", COMMENT_PAGE_SIZE),
            ("textFormat", "plainText"),
        ];
        if let Some(token) = continuation_token {
            params.push(("pageToken", token));
        }

        match self.get("commentThreads", &params) {
            Ok(response) => Ok(Page::new(response.items, response.next_page_token)),
            Err(AppError::Api { status: 403, message }) if message.contains("commentsDisabled") => {
                log::debug!("Comments disabled for video {}", container_id);
                Ok(Page::empty())
            }
            Err(e) => Err(e),
        }
    }

    fn list_replies(
        &self,
        parent_id: &str,
        continuation_token: Option<&str>,
    ) -> Result<Page<Value>> {
        let mut params = vec![
            ("part", "snippet"),
            ("parentId", parent_id),
            ("maxResults", COMMENT_PAGE_SIZE),
            ("textFormat", "plainText"),
        ];
        if let Some(token) = continuation_token {
            params.push(("pageToken", token));
        }

        let response = self.get("comments", &params)?;
        Ok(Page::new(response.items, response.next_page_token))
    }
}

/// Map an unsuccessful HTTP response onto the error taxonomy.
///
/// Reasons are appended to the message of [`AppError::Api`] so callers can
/// still match on them.
pub fn classify_failure(status: StatusCode, body: &str) -> AppError {
    let (message, reasons) = match serde_json::from_str::<ErrorResponse>(body) {
        Ok(parsed) => (
            parsed.error.message,
            parsed
                .error
                .errors
                .into_iter()
                .map(|e| e.reason)
                .collect::<Vec<_>>(),
        ),
        Err(_) => (body.chars().take(200).collect(), Vec::new()),
    };
    let has_reason = |wanted: &[&str]| reasons.iter().any(|r| wanted.contains(&r.as_str()));

    match status {
        StatusCode::FORBIDDEN if has_reason(&["quotaExceeded", "dailyLimitExceeded"]) => {
            AppError::quota_exceeded("remote", 0, 0)
        }
        StatusCode::FORBIDDEN if has_reason(&["rateLimitExceeded", "userRateLimitExceeded"]) => {
            AppError::transient(message)
        }
        StatusCode::NOT_FOUND => AppError::not_found(message),
        StatusCode::TOO_MANY_REQUESTS => AppError::transient(message),
        s if s.is_server_error() => AppError::transient(format!("{}: {}", s.as_u16(), message)),
        s => {
            let message = if reasons.is_empty() {
                message
            } else {
                format!("{} [{}]", message, reasons.join(","))
            };
            AppError::api(s.as_u16(), message)
        }
    }
}
