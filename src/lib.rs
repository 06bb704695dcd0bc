//! haiyvee: a terminal social feed with infinite scroll.
//!
//! The core is two cooperating pieces that only talk through a small
//! prop/event contract:
//!
//! - [`feed::FeedController`] owns pagination and fetch state
//! - [`list::ListHost`] renders rows into recycling slots and raises
//!   refresh / end-reached / item-press events
//!
//! [`app`] and [`ui`] wire them to the network and a `ratatui` terminal.

pub mod api;
pub mod app;
pub mod config;
pub mod feed;
pub mod list;
pub mod ui;
pub mod util;
