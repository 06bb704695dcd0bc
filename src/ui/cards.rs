//! Terminal cell renderer: one card per mounted slot.
//!
//! Cards are laid out when mounted or updated, and again when the terminal
//! width changes. Drawing only copies the prepared lines.

use crate::list::{CellProps, CellRenderer, SlotId};
use crate::util::{sanitize, truncate_to_width, wrap_to_width};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use std::collections::HashMap;

/// Rows a card occupies on screen, borders included.
pub const CARD_HEIGHT: u16 = 6;

/// Lines available for the post text.
const SUBTITLE_LINES: usize = 2;

/// Columns taken by the card border and inner margin.
const CARD_CHROME: u16 = 4;

/// A laid-out card.
#[derive(Debug, Clone)]
pub struct Card {
    pub props: CellProps,
    pub lines: Vec<Line<'static>>,
}

#[derive(Debug, Default)]
pub struct CardRenderer {
    width: u16,
    cards: HashMap<SlotId, Card>,
    mounts: usize,
}

impl CardRenderer {
    /// Re-lay out every mounted card for a new terminal width.
    pub fn set_width(&mut self, width: u16) {
        if width == self.width {
            return;
        }
        self.width = width;
        for card in self.cards.values_mut() {
            card.lines = layout(&card.props, width);
        }
    }

    pub fn card(&self, slot: SlotId) -> Option<&Card> {
        self.cards.get(&slot)
    }

    /// Total mounts performed since start.
    pub fn mount_count(&self) -> usize {
        self.mounts
    }
}

impl CellRenderer for CardRenderer {
    fn mount(&mut self, slot: SlotId, props: &CellProps) {
        self.mounts += 1;
        tracing::trace!(slot = slot.0, id = %props.id, "Mounting card");
        self.cards.insert(
            slot,
            Card {
                props: props.clone(),
                lines: layout(props, self.width),
            },
        );
    }

    fn update(&mut self, slot: SlotId, props: &CellProps) {
        match self.cards.get_mut(&slot) {
            Some(card) => {
                card.props = props.clone();
                card.lines = layout(props, self.width);
            }
            None => {
                tracing::warn!(slot = slot.0, "Update for unmounted card, mounting instead");
                self.mount(slot, props);
            }
        }
    }

    fn unmount(&mut self, slot: SlotId) {
        tracing::trace!(slot = slot.0, "Unmounting card");
        self.cards.remove(&slot);
    }
}

/// Build the lines for a card of total width `width`.
fn layout(props: &CellProps, width: u16) -> Vec<Line<'static>> {
    let inner = width.saturating_sub(CARD_CHROME) as usize;
    let mut lines = Vec::with_capacity(SUBTITLE_LINES + 2);

    let title = sanitize(&props.title);
    lines.push(Line::from(Span::styled(
        truncate_to_width(&title, inner).into_owned(),
        Style::default()
            .fg(Color::White)
            .add_modifier(Modifier::BOLD),
    )));

    let subtitle = sanitize(&props.subtitle);
    if !subtitle.trim().is_empty() {
        for text in wrap_to_width(&subtitle, inner, SUBTITLE_LINES) {
            lines.push(Line::from(Span::styled(
                text,
                Style::default().fg(Color::Gray),
            )));
        }
    }

    if let Some(image) = &props.image {
        let label = format!("▣ {}", sanitize(image));
        lines.push(Line::from(Span::styled(
            truncate_to_width(&label, inner).into_owned(),
            Style::default().fg(Color::Cyan),
        )));
    }

    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    fn props(subtitle: &str, image: Option<&str>) -> CellProps {
        CellProps {
            id: "a".into(),
            title: "Ana".into(),
            subtitle: subtitle.into(),
            image: image.map(String::from),
        }
    }

    fn text(line: &Line<'_>) -> String {
        line.spans.iter().map(|s| s.content.as_ref()).collect()
    }

    #[test]
    fn test_card_without_media_has_no_media_line() {
        let lines = layout(&props("hello", None), 40);
        assert_eq!(lines.len(), 2);
        assert!(!lines.iter().any(|l| text(l).starts_with('▣')));
    }

    #[test]
    fn test_card_with_media() {
        let lines = layout(&props("", Some("https://cdn.example.com/a.jpg")), 60);
        assert_eq!(lines.len(), 2);
        assert!(text(&lines[1]).contains("cdn.example.com"));
    }

    #[test]
    fn test_card_fits_height() {
        let long = "word ".repeat(200);
        let lines = layout(&props(&long, Some("https://x.example.com/i.png")), 30);
        assert!(lines.len() as u16 <= CARD_HEIGHT - 2);
    }

    #[test]
    fn test_resize_relayouts_mounted_cards() {
        let mut renderer = CardRenderer::default();
        renderer.set_width(20);
        renderer.mount(SlotId(0), &props("a fairly long line of post text", None));
        let narrow = renderer.card(SlotId(0)).unwrap().lines.len();

        renderer.set_width(200);
        let wide = renderer.card(SlotId(0)).unwrap().lines.len();
        assert!(wide < narrow);
    }

    #[test]
    fn test_unmount_drops_card() {
        let mut renderer = CardRenderer::default();
        renderer.mount(SlotId(1), &props("x", None));
        renderer.unmount(SlotId(1));
        assert!(renderer.card(SlotId(1)).is_none());
        assert_eq!(renderer.mount_count(), 1);
    }
}
