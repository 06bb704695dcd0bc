//! The list host: rows in, gestures in, events out.
//!
//! The host knows nothing about HTTP or pagination. It receives the full row
//! collection on every change, binds visible rows to recycling slots, and
//! raises [`ListEvent`]s when the user pulls to refresh, scrolls past the
//! end-reached threshold, or presses a row.

use std::ops::Range;

use crate::feed::Row;

use super::slot::{CellProps, CellRenderer, RecycleKey, SlotId, SlotState, SlotTable};

/// Default fraction of the list that must be visible before `EndReached`.
pub const DEFAULT_END_REACHED_THRESHOLD: f32 = 0.7;

/// Slots kept beyond the viewport so small scrolls don't remount rows.
pub const SLOT_CACHE: usize = 2;

/// Signals raised by the host for its owner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListEvent {
    /// The user pulled to refresh. The owner should reload and eventually
    /// push new data (which clears `refreshing`).
    Refresh,
    /// The visible window crossed the threshold. Fires once per crossing.
    EndReached,
    ItemPress { id: String },
}

/// Space reserved above and below the rows for host chrome.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ContentPadding {
    pub top: u16,
    pub bottom: u16,
}

pub struct ListHost<R: CellRenderer> {
    rows: Vec<Row>,
    refreshing: bool,
    threshold: f32,
    padding: ContentPadding,
    has_more: Option<bool>,
    /// Latch: set when `EndReached` fires, cleared by the next `set_data`.
    loading_footer_visible: bool,
    runtime_ready: bool,
    first_visible: usize,
    viewport: usize,
    selected: usize,
    slots: SlotTable,
    /// Which list position each slot currently holds.
    slot_positions: Vec<Option<usize>>,
    renderer: R,
    events: Vec<ListEvent>,
}

impl<R: CellRenderer> ListHost<R> {
    /// Create a host whose render runtime is not yet ready.
    pub fn new(renderer: R) -> Self {
        Self {
            rows: Vec::new(),
            refreshing: false,
            threshold: DEFAULT_END_REACHED_THRESHOLD,
            padding: ContentPadding::default(),
            has_more: None,
            loading_footer_visible: false,
            runtime_ready: false,
            first_visible: 0,
            viewport: 0,
            selected: 0,
            slots: SlotTable::default(),
            slot_positions: Vec::new(),
            renderer,
            events: Vec::new(),
        }
    }

    // ------------------------------------------------------------------
    // Properties
    // ------------------------------------------------------------------

    /// Replace the row collection.
    ///
    /// Clears the end-reached latch and the refreshing indicator, then
    /// re-evaluates every slot binding.
    pub fn set_data(&mut self, rows: Vec<Row>) {
        tracing::debug!(rows = rows.len(), "List data replaced");
        self.rows = rows;
        self.loading_footer_visible = false;
        self.refreshing = false;
        self.first_visible = self.first_visible.min(self.max_first_visible());
        self.selected = self.selected.min(self.rows.len().saturating_sub(1));
        self.keep_selection_visible();
        self.rebind();
    }

    pub fn set_refreshing(&mut self, refreshing: bool) {
        self.refreshing = refreshing;
    }

    /// Threshold in `[0, 1]`; out-of-range values are clamped, NaN ignored.
    pub fn set_end_reached_threshold(&mut self, threshold: f32) {
        if threshold.is_nan() {
            tracing::warn!("Ignoring NaN end-reached threshold");
            return;
        }
        self.threshold = threshold.clamp(0.0, 1.0);
    }

    /// `None` keeps the current value for that edge.
    pub fn set_content_padding(&mut self, top: Option<u16>, bottom: Option<u16>) {
        if let Some(top) = top {
            self.padding.top = top;
        }
        if let Some(bottom) = bottom {
            self.padding.bottom = bottom;
        }
    }

    /// When `Some(false)`, `EndReached` is suppressed.
    pub fn set_has_more(&mut self, has_more: Option<bool>) {
        self.has_more = has_more;
    }

    /// Number of rows visible at once. Resizes the slot pool.
    pub fn set_viewport(&mut self, rows: usize) {
        if rows == self.viewport {
            return;
        }
        tracing::debug!(from = self.viewport, to = rows, "List viewport resized");
        self.viewport = rows;

        let count = if rows == 0 { 0 } else { rows + SLOT_CACHE };
        if count != self.slots.len() {
            // Position → slot mapping changes with the pool size; start over
            for index in 0..self.slots.len() {
                self.slots.release(SlotId(index), &mut self.renderer);
            }
            self.slots.resize(count, &mut self.renderer);
            self.slot_positions = vec![None; count];
        }

        self.first_visible = self.first_visible.min(self.max_first_visible());
        self.keep_selection_visible();
        self.rebind();
    }

    /// External signal that the render runtime can now mount cells.
    ///
    /// Every pending slot is mounted with its stored props. Later calls are
    /// no-ops.
    pub fn mark_runtime_ready(&mut self) {
        if self.runtime_ready {
            return;
        }
        self.runtime_ready = true;
        self.rebind();
        let mounted = self.slots.flush_all(&mut self.renderer);
        tracing::info!(mounted, "Render runtime ready, pending cells mounted");
    }

    // ------------------------------------------------------------------
    // Gestures
    // ------------------------------------------------------------------

    /// Scroll the viewport by `delta` rows. Positive is down.
    pub fn scroll_by(&mut self, delta: isize) {
        if delta == 0 {
            return;
        }
        let target = if delta > 0 {
            self.first_visible.saturating_add(delta.unsigned_abs())
        } else {
            self.first_visible.saturating_sub(delta.unsigned_abs())
        };
        self.first_visible = target.min(self.max_first_visible());

        let range = self.visible_range();
        if !range.is_empty() {
            self.selected = self.selected.clamp(range.start, range.end - 1);
        }
        self.rebind();

        if delta > 0 {
            self.check_end_reached();
        }
    }

    pub fn page_down(&mut self) {
        self.scroll_by(self.viewport.max(1) as isize);
    }

    pub fn page_up(&mut self) {
        self.scroll_by(-(self.viewport.max(1) as isize));
    }

    pub fn select_next(&mut self) {
        if self.rows.is_empty() {
            return;
        }
        self.selected = (self.selected + 1).min(self.rows.len() - 1);
        self.keep_selection_visible();
        self.rebind();
        self.check_end_reached();
    }

    pub fn select_prev(&mut self) {
        self.selected = self.selected.saturating_sub(1);
        self.keep_selection_visible();
        self.rebind();
    }

    pub fn select_first(&mut self) {
        self.selected = 0;
        self.keep_selection_visible();
        self.rebind();
    }

    pub fn select_last(&mut self) {
        if self.rows.is_empty() {
            return;
        }
        self.selected = self.rows.len() - 1;
        self.keep_selection_visible();
        self.rebind();
        self.check_end_reached();
    }

    /// Pull-to-refresh gesture.
    pub fn pull_to_refresh(&mut self) {
        if self.refreshing {
            return;
        }
        self.refreshing = true;
        self.events.push(ListEvent::Refresh);
    }

    /// Press the row at `position`.
    pub fn press(&mut self, position: usize) {
        if let Some(row) = self.rows.get(position) {
            let id = CellProps::from_row(row, position).id;
            self.events.push(ListEvent::ItemPress { id });
        }
    }

    pub fn press_selected(&mut self) {
        self.press(self.selected);
    }

    /// Take all events raised since the last drain.
    pub fn drain_events(&mut self) -> Vec<ListEvent> {
        std::mem::take(&mut self.events)
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn selected(&self) -> usize {
        self.selected
    }

    pub fn selected_row(&self) -> Option<&Row> {
        self.rows.get(self.selected)
    }

    pub fn is_refreshing(&self) -> bool {
        self.refreshing
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    pub fn padding(&self) -> ContentPadding {
        self.padding
    }

    pub fn has_more(&self) -> Option<bool> {
        self.has_more
    }

    pub fn loading_footer_visible(&self) -> bool {
        self.loading_footer_visible
    }

    pub fn viewport(&self) -> usize {
        self.viewport
    }

    /// Positions currently on screen.
    pub fn visible_range(&self) -> Range<usize> {
        let end = self
            .first_visible
            .saturating_add(self.viewport)
            .min(self.rows.len());
        self.first_visible.min(end)..end
    }

    /// Slot that renders `position`, if the pool has any slots.
    pub fn slot_for(&self, position: usize) -> Option<SlotId> {
        match self.slots.len() {
            0 => None,
            count => Some(SlotId(position % count)),
        }
    }

    pub fn slot_state(&self, slot: SlotId) -> Option<&SlotState> {
        self.slots.get(slot)
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn renderer_mut(&mut self) -> &mut R {
        &mut self.renderer
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    fn max_first_visible(&self) -> usize {
        self.rows.len().saturating_sub(self.viewport)
    }

    fn keep_selection_visible(&mut self) {
        if self.viewport == 0 {
            return;
        }
        if self.selected < self.first_visible {
            self.first_visible = self.selected;
        } else if self.selected >= self.first_visible + self.viewport {
            self.first_visible = self.selected + 1 - self.viewport;
        }
        self.first_visible = self.first_visible.min(self.max_first_visible());
    }

    fn check_end_reached(&mut self) {
        let total = self.rows.len();
        let range = self.visible_range();
        if total == 0 || range.is_empty() {
            return;
        }
        let ratio = range.end as f32 / total as f32;
        if ratio >= self.threshold
            && !self.loading_footer_visible
            && !self.refreshing
            && self.has_more != Some(false)
        {
            tracing::debug!(ratio, threshold = self.threshold, "End reached");
            self.loading_footer_visible = true;
            self.events.push(ListEvent::EndReached);
        }
    }

    /// Bind visible rows to their slots and drop bindings that went stale.
    fn rebind(&mut self) {
        if self.slots.is_empty() {
            return;
        }
        let range = self.visible_range();
        let mut touched = vec![false; self.slots.len()];

        for position in range {
            let Some(slot) = self.slot_for(position) else {
                continue;
            };
            let row = &self.rows[position];
            let key = RecycleKey::for_row(row, position);
            let props = CellProps::from_row(row, position);
            self.slots
                .bind(slot, key, props, self.runtime_ready, &mut self.renderer);
            self.slot_positions[slot.0] = Some(position);
            touched[slot.0] = true;
        }

        // Off-screen slots stay cached unless their row is gone or replaced
        for (index, was_touched) in touched.into_iter().enumerate() {
            if was_touched {
                continue;
            }
            let Some(position) = self.slot_positions[index] else {
                continue;
            };
            let slot = SlotId(index);
            let still_valid = self.rows.get(position).is_some_and(|row| {
                self.slots.get(slot).and_then(SlotState::key)
                    == Some(RecycleKey::for_row(row, position))
            });
            if !still_valid {
                self.slots.release(slot, &mut self.renderer);
                self.slot_positions[index] = None;
            }
        }
    }
}
