use crate::app::App;
use ratatui::{
    layout::Rect,
    style::{Color, Style},
    widgets::Paragraph,
    Frame,
};
use std::borrow::Cow;

const KEY_HINTS: &str = "[j/k]move [g/G]top/bottom [r]efresh [Enter]press [o]pen media [q]uit";

/// Render the status bar
pub fn render(f: &mut Frame, app: &App, area: Rect) {
    if area.width < 1 || area.height < 1 {
        return;
    }

    let text: Cow<'_, str> = if let Some((msg, _)) = &app.status_message {
        Cow::Borrowed(msg.as_str())
    } else if app.list.is_refreshing() {
        Cow::Borrowed("Refreshing...")
    } else if app.controller.is_loading_more() {
        Cow::Owned(format!(
            "Loading more... ({} posts)",
            app.controller.rows().len()
        ))
    } else {
        Cow::Borrowed(KEY_HINTS)
    };

    let style = Style::default().bg(Color::DarkGray).fg(Color::White);
    f.render_widget(Paragraph::new(text).style(style), area);
}
