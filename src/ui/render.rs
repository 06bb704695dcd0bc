//! Render functions for the home feed.

use crate::app::App;
use crate::list::{ContentPadding, SlotState};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Paragraph},
    Frame,
};

use super::cards::CARD_HEIGHT;
use super::status;

/// Minimum terminal dimensions required for normal operation.
pub(super) const MIN_WIDTH: u16 = 30;
/// Header, status bar and one card, before content padding.
pub(super) const MIN_HEIGHT: u16 = CARD_HEIGHT + 2;

const SPINNER: [&str; 10] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

/// Number of frames in the loading spinner animation.
pub(super) const SPINNER_FRAMES: usize = SPINNER.len();

/// Split the screen into header, list and status bar.
pub(super) fn screen_layout(area: Rect) -> [Rect; 3] {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(area);
    [chunks[0], chunks[1], chunks[2]]
}

/// The part of the list area left after content padding.
pub(super) fn padded(area: Rect, top: u16, bottom: u16) -> Rect {
    let top = top.min(area.height);
    let bottom = bottom.min(area.height - top);
    Rect {
        x: area.x,
        y: area.y + top,
        width: area.width,
        height: area.height - top - bottom,
    }
}

/// Smallest height that still fits one card inside the padding.
pub(super) fn min_height(padding: ContentPadding) -> u16 {
    MIN_HEIGHT
        .saturating_add(padding.top)
        .saturating_add(padding.bottom)
}

/// Cards that fit in the list area.
pub(super) fn viewport_rows(list_area: Rect) -> usize {
    (list_area.height / CARD_HEIGHT) as usize
}

pub(super) fn render(f: &mut Frame, app: &App) {
    let area = f.area();
    if area.width < 1 || area.height < 1 {
        return;
    }

    let required_height = min_height(app.list.padding());
    if area.width < MIN_WIDTH || area.height < required_height {
        let msg = if area.height < 3 || area.width < 20 {
            Paragraph::new("Too small")
        } else {
            Paragraph::new(format!(
                "Terminal too small\n\nMinimum: {}x{}\nCurrent: {}x{}",
                MIN_WIDTH, required_height, area.width, area.height
            ))
            .alignment(Alignment::Center)
        };
        f.render_widget(msg, area);
        return;
    }

    let [header, list_area, status_area] = screen_layout(area);
    render_header(f, app, header);

    let padding = app.list.padding();
    let body = padded(list_area, padding.top, padding.bottom);
    render_cards(f, app, body);
    render_overlay(f, app, list_area);

    if app.controller.is_loading_more() {
        render_footer_loader(f, app, list_area);
    }

    status::render(f, app, status_area);
}

fn spinner(app: &App) -> &'static str {
    SPINNER[app.spinner_frame % SPINNER_FRAMES]
}

fn render_header(f: &mut Frame, app: &App, area: Rect) {
    let mut spans = vec![Span::styled(
        " Home ",
        Style::default()
            .fg(Color::Black)
            .bg(Color::White)
            .add_modifier(Modifier::BOLD),
    )];
    if app.list.is_refreshing() {
        spans.push(Span::styled(
            format!(" {} refreshing", spinner(app)),
            Style::default().fg(Color::Cyan),
        ));
    }
    let count = app.list.rows().len();
    if count > 0 {
        spans.push(Span::styled(
            format!("  {} posts", count),
            Style::default().fg(Color::DarkGray),
        ));
    }
    f.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn render_cards(f: &mut Frame, app: &App, area: Rect) {
    let selected = app.list.selected();
    let renderer = app.list.renderer();

    for (i, position) in app.list.visible_range().enumerate() {
        let y = area.y + i as u16 * CARD_HEIGHT;
        if y + CARD_HEIGHT > area.y + area.height {
            break;
        }
        let rect = Rect {
            x: area.x,
            y,
            width: area.width,
            height: CARD_HEIGHT,
        };

        let border_style = if position == selected {
            Style::default().fg(Color::Cyan)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        let block = Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(border_style);

        let slot = app.list.slot_for(position);
        let mounted = slot
            .and_then(|s| app.list.slot_state(s))
            .is_some_and(SlotState::is_mounted);
        let card = slot.filter(|_| mounted).and_then(|s| renderer.card(s));

        let body = match card {
            Some(card) => Paragraph::new(card.lines.clone()),
            // Runtime not ready yet: the row is bound but not mounted
            None => Paragraph::new(Line::from(Span::styled(
                "…",
                Style::default().fg(Color::DarkGray),
            ))),
        };
        f.render_widget(body.block(block), rect);
    }
}

/// Centered message over the list, if the list has nothing to show.
fn overlay_text(app: &App) -> Option<String> {
    if !app.list.rows().is_empty() {
        // Rows exist but no card fits between the paddings
        return (app.list.viewport() == 0).then(|| "Window too short to show posts".to_string());
    }
    let text = if app.controller.is_loading_initial() {
        format!("{} Loading feed…", spinner(app))
    } else if let Some(error) = app.controller.error() {
        error.to_string()
    } else {
        "No posts yet.".to_string()
    };
    Some(text)
}

fn render_overlay(f: &mut Frame, app: &App, area: Rect) {
    let Some(text) = overlay_text(app) else {
        return;
    };

    let y = area.y + area.height / 2;
    let rect = Rect {
        x: area.x,
        y: y.min(area.y + area.height.saturating_sub(1)),
        width: area.width,
        height: 1,
    };
    f.render_widget(
        Paragraph::new(text)
            .alignment(Alignment::Center)
            .style(Style::default().fg(Color::Gray)),
        rect,
    );
}

fn render_footer_loader(f: &mut Frame, app: &App, area: Rect) {
    if area.height == 0 {
        return;
    }
    let rect = Rect {
        x: area.x,
        y: area.y + area.height - 1,
        width: area.width,
        height: 1,
    };
    f.render_widget(
        Paragraph::new(spinner(app))
            .alignment(Alignment::Center)
            .style(Style::default().fg(Color::White)),
        rect,
    );
}
