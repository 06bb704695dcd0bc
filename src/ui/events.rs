//! Application event handling.
//!
//! Applies background task results and external signals to the app.

use crate::app::{App, AppEvent};
use tokio::sync::mpsc;

use super::helpers::start_refresh;

/// Handle one event from a background task or signal.
pub(super) fn handle_app_event(app: &mut App, event: AppEvent, event_tx: &mpsc::Sender<AppEvent>) {
    app.needs_redraw = true;
    match event {
        AppEvent::PageLoaded { ticket, result } => {
            app.apply_page(ticket, result);
        }
        AppEvent::TaskPanicked { ticket, error } => {
            app.abort_fetch(ticket, &error);
        }
        AppEvent::RendererReady => {
            app.list.mark_runtime_ready();
        }
        AppEvent::ExternalRefresh => {
            tracing::info!("External refresh requested");
            start_refresh(app, event_tx);
        }
    }
}
