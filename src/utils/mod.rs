//! Utility functions and helpers.

use std::sync::LazyLock;

use regex::Regex;
use url::Url;

use crate::error::{AppError, Result};

static CHANNEL_ID: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^UC[A-Za-z0-9_-]{22}$").ok());

fn is_channel_id(s: &str) -> bool {
    CHANNEL_ID.as_ref().is_some_and(|re| re.is_match(s))
}

/// Hosts whose `/channel/<id>` paths are accepted.
const YOUTUBE_HOSTS: [&str; 3] = ["youtube.com", "www.youtube.com", "m.youtube.com"];

/// Whether `id` can be sent to the remote API as an entity id.
///
/// This is a shape check only (non-empty, URL-safe characters); whether the
/// entity exists is for the transport to find out.
pub fn is_valid_entity_id(id: &str) -> bool {
    !id.is_empty()
        && id.len() <= 64
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

/// Extract a channel id from a raw `UC…` id or a channel URL.
///
/// # Examples
/// ```
/// use collector::utils::parse_channel_id;
///
/// assert_eq!(
///     parse_channel_id("https://www.youtube.com/channel/UCBR8-60-B28hp2BmDPdntcQ").unwrap(),
///     "UCBR8-60-B28hp2BmDPdntcQ"
/// );
/// ```
pub fn parse_channel_id(input: &str) -> Result<String> {
    let input = input.trim();
    if is_channel_id(input) {
        return Ok(input.to_string());
    }

    let with_scheme = if input.starts_with("http://") || input.starts_with("https://") {
        input.to_string()
    } else {
        format!("https://{input}")
    };
    let url = Url::parse(&with_scheme).map_err(|_| AppError::invalid_identifier(input))?;

    let host_ok = url
        .host_str()
        .is_some_and(|host| YOUTUBE_HOSTS.contains(&host));
    if !host_ok {
        return Err(AppError::invalid_identifier(input));
    }

    let mut segments = url.path_segments().into_iter().flatten();
    match (segments.next(), segments.next()) {
        (Some("channel"), Some(id)) if is_channel_id(id) => Ok(id.to_string()),
        _ => Err(AppError::invalid_identifier(input)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    const ID: &str = "UCBR8-60-B28hp2BmDPdntcQ";

    #[test]
    fn test_raw_id() {
        assert_eq!(parse_channel_id(ID).unwrap(), ID);
        assert_eq!(parse_channel_id(&format!("  {ID}\n")).unwrap(), ID);
    }

    #[test]
    fn test_channel_urls() {
        for input in [
            format!("https://www.youtube.com/channel/{ID}"),
            format!("https://youtube.com/channel/{ID}/videos"),
            format!("m.youtube.com/channel/{ID}?view=0"),
        ] {
            assert_eq!(parse_channel_id(&input).unwrap(), ID, "{input}");
        }
    }

    #[test]
    fn test_rejects_other_inputs() {
        for input in [
            "",
            "UCshort",
            "https://example.com/channel/UCBR8-60-B28hp2BmDPdntcQ",
            "https://www.youtube.com/@handle",
            "https://www.youtube.com/watch?v=dQw4w9WgXcQ",
        ] {
            let err = parse_channel_id(input).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidIdentifier, "{input}");
        }
    }

    #[test]
    fn test_entity_id_shape() {
        assert!(is_valid_entity_id("UCtest"));
        assert!(is_valid_entity_id(ID));
        assert!(!is_valid_entity_id(""));
        assert!(!is_valid_entity_id("UC bad"));
        assert!(!is_valid_entity_id("../etc/passwd"));
    }
}
