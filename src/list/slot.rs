//! Per-slot row lifecycle records.
//!
//! A slot is a reusable rendering position. Its record moves through
//! `Unmounted → MountPending → Mounted → (update)* → Unmounted`, with the
//! pending → mounted step taken only when the render runtime is ready.

use sha2::{Digest, Sha256};

use crate::feed::Row;

/// Index of a recycling slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SlotId(pub usize);

/// Recycling identity of a row. Equal ids give equal keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RecycleKey(pub u64);

impl RecycleKey {
    /// Hash of the row id, falling back to its position when the id is empty.
    pub fn for_row(row: &Row, position: usize) -> Self {
        let digest = if row.id.is_empty() {
            Sha256::digest(position.to_string().as_bytes())
        } else {
            Sha256::digest(row.id.as_bytes())
        };
        let mut head = [0u8; 8];
        head.copy_from_slice(&digest[..8]);
        Self(u64::from_be_bytes(head))
    }
}

/// Properties handed to the cell renderer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellProps {
    pub id: String,
    pub title: String,
    pub subtitle: String,
    /// `None` when the row has no image; media is never mounted then.
    pub image: Option<String>,
}

impl CellProps {
    pub fn from_row(row: &Row, position: usize) -> Self {
        let id = if row.id.is_empty() {
            position.to_string()
        } else {
            row.id.clone()
        };
        Self {
            id,
            title: row.title.clone(),
            subtitle: row.subtitle.clone(),
            image: row.has_image().then(|| row.image.clone()),
        }
    }
}

/// Lifecycle record for one slot.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SlotState {
    #[default]
    Unmounted,
    /// Bound to a row but the runtime was not ready; props wait here.
    MountPending { key: RecycleKey, props: CellProps },
    Mounted { key: RecycleKey, props: CellProps },
}

impl SlotState {
    pub fn key(&self) -> Option<RecycleKey> {
        match self {
            SlotState::Unmounted => None,
            SlotState::MountPending { key, .. } | SlotState::Mounted { key, .. } => Some(*key),
        }
    }

    pub fn props(&self) -> Option<&CellProps> {
        match self {
            SlotState::Unmounted => None,
            SlotState::MountPending { props, .. } | SlotState::Mounted { props, .. } => {
                Some(props)
            }
        }
    }

    pub fn is_mounted(&self) -> bool {
        matches!(self, SlotState::Mounted { .. })
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, SlotState::MountPending { .. })
    }
}

/// Row rendering collaborator.
///
/// Implementations build and tear down the visual subtree for a slot. They
/// are only called from the thread that owns the list host.
pub trait CellRenderer {
    fn mount(&mut self, slot: SlotId, props: &CellProps);
    fn update(&mut self, slot: SlotId, props: &CellProps);
    fn unmount(&mut self, slot: SlotId);
}

/// All slot records, indexed by [`SlotId`].
#[derive(Debug, Default)]
pub(super) struct SlotTable {
    slots: Vec<SlotState>,
}

impl SlotTable {
    pub(super) fn len(&self) -> usize {
        self.slots.len()
    }

    pub(super) fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub(super) fn get(&self, slot: SlotId) -> Option<&SlotState> {
        self.slots.get(slot.0)
    }

    /// Grow to `count` slots, or shrink by unmounting the excess.
    pub(super) fn resize<R: CellRenderer>(&mut self, count: usize, renderer: &mut R) {
        while self.slots.len() > count {
            let index = self.slots.len() - 1;
            self.release(SlotId(index), renderer);
            self.slots.pop();
        }
        self.slots.resize(count, SlotState::Unmounted);
    }

    /// Bind `props` (identified by `key`) to `slot`.
    pub(super) fn bind<R: CellRenderer>(
        &mut self,
        slot: SlotId,
        key: RecycleKey,
        props: CellProps,
        ready: bool,
        renderer: &mut R,
    ) {
        let Some(state) = self.slots.get_mut(slot.0) else {
            return;
        };

        match state {
            SlotState::Mounted {
                key: bound,
                props: current,
            } if *bound == key => {
                if *current != props {
                    renderer.update(slot, &props);
                    *current = props;
                }
                return;
            }
            SlotState::MountPending {
                key: bound,
                props: pending,
            } if *bound == key => {
                *pending = props;
                if ready {
                    self.flush(slot, renderer);
                }
                return;
            }
            _ => {}
        }

        // Different row: recycle before rebinding
        self.release(slot, renderer);
        self.slots[slot.0] = SlotState::MountPending { key, props };
        if ready {
            self.flush(slot, renderer);
        }
    }

    /// Mount a pending slot with its stored props.
    pub(super) fn flush<R: CellRenderer>(&mut self, slot: SlotId, renderer: &mut R) {
        let Some(state) = self.slots.get_mut(slot.0) else {
            return;
        };
        if !state.is_pending() {
            return;
        }
        if let SlotState::MountPending { key, props } = std::mem::take(state) {
            renderer.mount(slot, &props);
            *state = SlotState::Mounted { key, props };
        }
    }

    /// Mount every pending slot. Returns how many were mounted.
    pub(super) fn flush_all<R: CellRenderer>(&mut self, renderer: &mut R) -> usize {
        let pending: Vec<SlotId> = self
            .slots
            .iter()
            .enumerate()
            .filter(|(_, s)| s.is_pending())
            .map(|(i, _)| SlotId(i))
            .collect();
        for slot in &pending {
            self.flush(*slot, renderer);
        }
        pending.len()
    }

    /// Unmount (if mounted) and clear pending props.
    pub(super) fn release<R: CellRenderer>(&mut self, slot: SlotId, renderer: &mut R) {
        let Some(state) = self.slots.get_mut(slot.0) else {
            return;
        };
        if state.is_mounted() {
            renderer.unmount(slot);
        }
        *state = SlotState::Unmounted;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_equal_ids_equal_keys() {
        let a = Row::new("post-1", "A", "", "");
        let b = Row::new("post-1", "B", "changed", "img");
        assert_eq!(RecycleKey::for_row(&a, 0), RecycleKey::for_row(&b, 7));
        assert_ne!(
            RecycleKey::for_row(&a, 0),
            RecycleKey::for_row(&Row::new("post-2", "A", "", ""), 0)
        );
    }

    #[test]
    fn test_empty_id_falls_back_to_position() {
        let row = Row::new("", "A", "", "");
        assert_eq!(RecycleKey::for_row(&row, 3), RecycleKey::for_row(&row, 3));
        assert_ne!(RecycleKey::for_row(&row, 3), RecycleKey::for_row(&row, 4));
        assert_eq!(CellProps::from_row(&row, 3).id, "3");
    }

    #[test]
    fn test_props_without_image_have_no_media() {
        let props = CellProps::from_row(&Row::new("a", "t", "s", ""), 0);
        assert_eq!(props.image, None);
        let props = CellProps::from_row(&Row::new("a", "t", "s", "https://x/y.jpg"), 0);
        assert_eq!(props.image.as_deref(), Some("https://x/y.jpg"));
    }
}
