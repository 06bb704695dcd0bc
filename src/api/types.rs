//! Wire types for the posts endpoint.
//!
//! The server is loosely typed: identifiers are sometimes numbers, pagination
//! may be reported as a total count or as page numbers, and `posts` can be
//! missing entirely. Decoding here is lenient so a single odd record never
//! costs the whole page.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

use super::ApiError;

/// A single post record as returned by the API.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ApiPost {
    /// Primary database identifier (`_id`).
    #[serde(rename = "_id", default, deserialize_with = "lenient_string")]
    pub object_id: Option<String>,
    /// Secondary identifier used by some deployments.
    #[serde(default, deserialize_with = "lenient_string")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub text: Option<String>,
    #[serde(default)]
    pub owner: Option<Owner>,
    #[serde(default)]
    pub urls: Option<Vec<MediaUrl>>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Owner {
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: Option<String>,
}

/// A media attachment. Only the first attachment of a post is displayed.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct MediaUrl {
    #[serde(default, deserialize_with = "lenient_string")]
    pub url: Option<String>,
    #[serde(rename = "thumbnailUrl", default, deserialize_with = "lenient_string")]
    pub thumbnail_url: Option<String>,
}

/// Server-reported pagination. Either shape may be present.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct Pagination {
    #[serde(default, deserialize_with = "lenient_u64")]
    pub total: Option<u64>,
    #[serde(rename = "currentPage", default, deserialize_with = "lenient_u64")]
    pub current_page: Option<u64>,
    #[serde(rename = "totalPages", default, deserialize_with = "lenient_u64")]
    pub total_pages: Option<u64>,
}

/// One decoded page of the feed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeedPage {
    pub posts: Vec<ApiPost>,
    pub pagination: Option<Pagination>,
}

impl FeedPage {
    /// Decode a response body.
    ///
    /// - Body that is not JSON → [`ApiError::Malformed`]
    /// - `posts` missing or not an array → empty page
    /// - Entries that fail to decode (e.g. bare strings) are skipped
    pub fn from_json(bytes: &[u8]) -> Result<Self, ApiError> {
        let value: Value =
            serde_json::from_slice(bytes).map_err(|e| ApiError::Malformed(e.to_string()))?;

        let posts = match value.get("posts").and_then(Value::as_array) {
            Some(items) => {
                let mut posts = Vec::with_capacity(items.len());
                for (index, item) in items.iter().enumerate() {
                    match ApiPost::deserialize(item) {
                        Ok(post) => posts.push(post),
                        Err(e) => {
                            tracing::warn!(index, error = %e, "Skipping undecodable post");
                        }
                    }
                }
                posts
            }
            None => {
                tracing::warn!("Response has no posts array, treating as empty page");
                Vec::new()
            }
        };

        let pagination = value
            .get("pagination")
            .and_then(|p| Pagination::deserialize(p).ok());

        Ok(Self { posts, pagination })
    }
}

/// Accept strings and numbers; anything else (null, objects, empty strings) is `None`.
fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) if !s.is_empty() => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

/// Accept non-negative integers and integral floats (`25.0`).
fn lenient_u64<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Number(n)) => n.as_u64().or_else(|| {
            n.as_f64()
                .filter(|f| f.is_finite() && *f >= 0.0 && f.fract() == 0.0)
                .map(|f| f as u64)
        }),
        _ => None,
    })
}
