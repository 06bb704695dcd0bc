//! Home feed: pagination state and record mapping.
//!
//! - [`row`] - `Row` and the API record → row mapping
//! - [`controller`] - the refresh / load-more state machine

mod controller;
mod row;

pub use controller::{
    Completion, Cursor, FeedController, FetchRequest, FetchState, FetchTicket, DEFAULT_PAGE_SIZE,
};
pub use row::{derive_has_more, map_post, map_posts, Row, DEFAULT_TITLE};
