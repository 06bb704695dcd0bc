//! Helpers shared by input and event handling: spawning fetches and
//! wiring list events back to the feed controller.

use crate::app::{App, AppEvent};
use crate::feed::FetchRequest;
use crate::list::ListEvent;
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use tokio::sync::mpsc;

/// Wraps a future to catch panics and convert them to errors.
pub(super) async fn catch_task_panic<F, T>(future: F) -> Result<T, String>
where
    F: std::future::Future<Output = T>,
{
    AssertUnwindSafe(future)
        .catch_unwind()
        .await
        .map_err(|panic| {
            if let Some(s) = panic.downcast_ref::<&'static str>() {
                s.to_string()
            } else if let Some(s) = panic.downcast_ref::<String>() {
                s.clone()
            } else {
                "Unknown panic".to_string()
            }
        })
}

/// Run `request` in the background; the result comes back as
/// [`AppEvent::PageLoaded`].
pub fn spawn_fetch(app: &mut App, request: FetchRequest, event_tx: &mpsc::Sender<AppEvent>) {
    let client = app.client.clone();
    let tx = event_tx.clone();
    let ticket = request.ticket;

    tracing::debug!(
        offset = request.query.offset,
        reset = request.reset,
        "Spawning feed fetch"
    );

    app.fetch_handle = Some(tokio::spawn(async move {
        let event = match catch_task_panic(client.fetch_page(request.query)).await {
            Ok(result) => AppEvent::PageLoaded { ticket, result },
            Err(error) => AppEvent::TaskPanicked { ticket, error },
        };
        // Receiver gone means the screen was torn down; drop the result
        if tx.send(event).await.is_err() {
            tracing::debug!("Fetch finished after shutdown, result discarded");
        }
    }));
}

/// Start a reload from the top, if none is running.
pub fn start_refresh(app: &mut App, event_tx: &mpsc::Sender<AppEvent>) {
    match app.controller.refresh() {
        Some(request) => {
            app.list.set_refreshing(true);
            spawn_fetch(app, request, event_tx);
        }
        None => {
            // The host may have raised its indicator for a gesture we ignore
            if !app.controller.is_refreshing() {
                app.list.set_refreshing(false);
            }
        }
    }
}

/// Forward everything the list raised since the last call.
pub fn dispatch_list_events(app: &mut App, event_tx: &mpsc::Sender<AppEvent>) {
    for event in app.list.drain_events() {
        app.needs_redraw = true;
        match event {
            ListEvent::Refresh => start_refresh(app, event_tx),
            ListEvent::EndReached => {
                if let Some(request) = app.controller.load_more() {
                    spawn_fetch(app, request, event_tx);
                }
            }
            ListEvent::ItemPress { id } => {
                tracing::info!(id = %id, "Item pressed");
                app.set_status(format!("Pressed {}", id));
                app.last_pressed = Some(id);
            }
        }
    }
}
