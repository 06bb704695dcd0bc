//! HTTP access to the posts endpoint.
//!
//! - [`client`] - request building, timeouts, size limits, error mapping
//! - [`types`] - lenient wire types for the JSON body

mod client;
mod types;

pub use client::{
    build_http_client, ApiError, FeedClient, PageQuery, PaginationMode, GENERIC_FAILURE,
};
pub use types::{ApiPost, FeedPage, MediaUrl, Owner, Pagination};
