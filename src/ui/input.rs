//! Keyboard input handling.

use crate::app::{App, AppEvent};
use crate::util::validate_url_for_open;
use crossterm::event::{KeyCode, KeyModifiers};
use tokio::sync::mpsc;

use super::helpers::dispatch_list_events;
use super::Action;

/// Map a key press to list gestures, then forward whatever the list raised.
pub(super) fn handle_input(
    app: &mut App,
    code: KeyCode,
    modifiers: KeyModifiers,
    event_tx: &mpsc::Sender<AppEvent>,
) -> Action {
    match (code, modifiers) {
        (KeyCode::Char('q'), _) | (KeyCode::Esc, _) => return Action::Quit,
        (KeyCode::Char('c'), KeyModifiers::CONTROL) => return Action::Quit,
        (KeyCode::Char('j'), _) | (KeyCode::Down, _) => app.list.select_next(),
        (KeyCode::Char('k'), _) | (KeyCode::Up, _) => app.list.select_prev(),
        (KeyCode::Char('g'), _) | (KeyCode::Home, _) => app.list.select_first(),
        (KeyCode::Char('G'), _) | (KeyCode::End, _) => app.list.select_last(),
        (KeyCode::Char('d'), KeyModifiers::CONTROL) | (KeyCode::PageDown, _) => {
            app.list.page_down()
        }
        (KeyCode::Char('u'), KeyModifiers::CONTROL) | (KeyCode::PageUp, _) => app.list.page_up(),
        (KeyCode::Char('r'), _) => app.list.pull_to_refresh(),
        (KeyCode::Enter, _) => app.list.press_selected(),
        (KeyCode::Char('o'), _) => open_selected_media(app),
        _ => {}
    }

    dispatch_list_events(app, event_tx);
    Action::Continue
}

fn open_selected_media(app: &mut App) {
    let Some(row) = app.list.selected_row() else {
        return;
    };
    if !row.has_image() {
        app.set_status("Post has no media");
        return;
    }
    let image = row.image.clone();
    // Validate before open::that(): the URL comes from another user's post
    match validate_url_for_open(&image) {
        Ok(url) => {
            if let Err(e) = open::that(url.as_str()) {
                app.set_status(format!("Failed to open media: {}", e));
            }
        }
        Err(e) => app.set_status(format!("Refusing to open media: {}", e)),
    }
}
