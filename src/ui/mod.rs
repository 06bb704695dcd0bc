//! Terminal user interface for the home feed.
//!
//! - `loop_runner` - main event loop and terminal management
//! - `input` - keyboard input → list gestures
//! - `events` - background task results and signals
//! - `helpers` - fetch spawning and list event dispatch
//! - `cards` - the `CellRenderer` that lays out one card per slot
//! - `render` / `status` - drawing

mod cards;
mod events;
mod helpers;
mod input;
mod loop_runner;
mod render;
mod status;

pub use cards::{Card, CardRenderer, CARD_HEIGHT};
pub use helpers::{dispatch_list_events, spawn_fetch, start_refresh};
pub use loop_runner::{run, Action};
