//! Recycling list host for the feed.
//!
//! - [`host`] - props/events contract, scrolling, end-reached latch
//! - [`slot`] - per-slot mount lifecycle and the [`CellRenderer`] boundary

mod host;
mod slot;

pub use host::{ContentPadding, ListEvent, ListHost, DEFAULT_END_REACHED_THRESHOLD, SLOT_CACHE};
pub use slot::{CellProps, CellRenderer, RecycleKey, SlotId, SlotState};
