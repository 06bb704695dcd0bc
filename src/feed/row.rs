//! Mapping from API records to display rows.

use crate::api::{ApiPost, Pagination};

/// Title used when a post has no owner name.
pub const DEFAULT_TITLE: &str = "Post";

/// One feed entry as displayed in the list.
///
/// `id` is unique within the current row collection and stable across
/// refetches of the same post; the list host keys row lifecycle on it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Row {
    pub id: String,
    pub title: String,
    pub subtitle: String,
    /// Media URI. Empty means the card renders without media.
    pub image: String,
}

impl Row {
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        subtitle: impl Into<String>,
        image: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            subtitle: subtitle.into(),
            image: image.into(),
        }
    }

    pub fn has_image(&self) -> bool {
        !self.image.is_empty()
    }
}

fn non_empty(s: Option<&str>) -> Option<&str> {
    s.filter(|s| !s.is_empty())
}

/// Map one record. `base_offset` and `index` build the positional fallback id.
pub fn map_post(post: &ApiPost, base_offset: usize, index: usize) -> Row {
    let media = post.urls.as_deref().and_then(<[_]>::first);
    let image = media
        .and_then(|m| {
            non_empty(m.thumbnail_url.as_deref()).or_else(|| non_empty(m.url.as_deref()))
        })
        .unwrap_or_default()
        .to_string();

    // Preference: _id, id, image, then position. The positional key includes
    // the cursor so it stays unique across pages.
    let id = non_empty(post.object_id.as_deref())
        .or_else(|| non_empty(post.id.as_deref()))
        .map(str::to_string)
        .or_else(|| (!image.is_empty()).then(|| image.clone()))
        .unwrap_or_else(|| format!("{}-{}", base_offset, index));

    let title = post
        .owner
        .as_ref()
        .and_then(|o| non_empty(o.name.as_deref()))
        .unwrap_or(DEFAULT_TITLE)
        .to_string();

    let subtitle = non_empty(post.text.as_deref()).unwrap_or_default().to_string();

    Row {
        id,
        title,
        subtitle,
        image,
    }
}

/// Map a page of records fetched at `base_offset`.
pub fn map_posts(posts: &[ApiPost], base_offset: usize) -> Vec<Row> {
    posts
        .iter()
        .enumerate()
        .map(|(index, post)| map_post(post, base_offset, index))
        .collect()
}

/// Decide whether another page exists after one fetched at `offset`.
///
/// Prefers an explicit total, then page counters. Without either, a full
/// page is taken to mean more data. That heuristic reports one extra
/// (empty) page when the remaining count is an exact multiple of `limit`.
pub fn derive_has_more(
    pagination: Option<&Pagination>,
    offset: usize,
    received: usize,
    limit: usize,
) -> bool {
    if let Some(p) = pagination {
        if let Some(total) = p.total {
            return ((offset + received) as u64) < total;
        }
        if let (Some(current), Some(pages)) = (p.current_page, p.total_pages) {
            return current < pages;
        }
    }
    received == limit
}
