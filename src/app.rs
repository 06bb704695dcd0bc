//! Application state for the home feed screen.
//!
//! `App` owns both halves of the feed list: the [`FeedController`] (pagination
//! and fetch state) and the [`ListHost`] (rows on screen). Neither knows
//! about the other; the UI layer moves rows down and events up between them.

use crate::api::{ApiError, FeedClient, FeedPage};
use crate::config::Config;
use crate::feed::{Completion, FeedController, FetchTicket};
use crate::list::ListHost;
use crate::ui::CardRenderer;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::Instant;

/// How long a status message stays in the status bar.
const STATUS_TTL: Duration = Duration::from_secs(4);

/// Messages from background tasks and OS signals to the UI loop.
#[derive(Debug)]
pub enum AppEvent {
    /// A page fetch finished.
    PageLoaded {
        ticket: FetchTicket,
        result: Result<FeedPage, ApiError>,
    },
    /// The task running a fetch panicked.
    TaskPanicked { ticket: FetchTicket, error: String },
    /// The terminal is set up and cells can be mounted.
    RendererReady,
    /// Reload requested from outside the UI (SIGUSR1).
    ExternalRefresh,
}

pub struct App {
    pub controller: FeedController,
    pub list: ListHost<CardRenderer>,
    pub client: FeedClient,
    /// Background task running the in-flight fetch.
    pub fetch_handle: Option<JoinHandle<()>>,
    /// Id of the last pressed row.
    pub last_pressed: Option<String>,
    pub status_message: Option<(String, Instant)>,
    pub needs_redraw: bool,
    pub spinner_frame: usize,
}

impl App {
    pub fn new(config: &Config, client: FeedClient) -> Self {
        let mut list = ListHost::new(CardRenderer::default());
        list.set_end_reached_threshold(config.end_reached_threshold);
        list.set_content_padding(
            Some(config.content_padding_top),
            Some(config.content_padding_bottom),
        );

        Self {
            controller: FeedController::new(config.page_size),
            list,
            client,
            fetch_handle: None,
            last_pressed: None,
            status_message: None,
            needs_redraw: true,
            spinner_frame: 0,
        }
    }

    pub fn set_status(&mut self, msg: impl Into<String>) {
        self.status_message = Some((msg.into(), Instant::now()));
        self.needs_redraw = true;
    }

    /// Drop the status message once it has expired. Returns `true` if cleared.
    pub fn clear_expired_status(&mut self) -> bool {
        if let Some((_, at)) = &self.status_message {
            if at.elapsed() >= STATUS_TTL {
                self.status_message = None;
                return true;
            }
        }
        false
    }

    /// Apply a finished fetch and push the result down to the list.
    pub fn apply_page(&mut self, ticket: FetchTicket, result: Result<FeedPage, ApiError>) {
        let outcome = self.controller.complete(ticket, result);
        self.after_completion(outcome);
    }

    /// A fetch task died without reporting a result.
    pub fn abort_fetch(&mut self, ticket: FetchTicket, error: &str) {
        tracing::error!(error = %error, "Feed fetch task panicked");
        let outcome = self
            .controller
            .abort(ticket, crate::api::GENERIC_FAILURE);
        self.after_completion(outcome);
    }

    fn after_completion(&mut self, outcome: Completion) {
        match outcome {
            Completion::Applied { .. } => {
                self.fetch_handle = None;
                self.list.set_has_more(Some(self.controller.has_more()));
                self.list.set_data(self.controller.rows().to_vec());
            }
            Completion::Failed { message } => {
                self.fetch_handle = None;
                self.list.set_refreshing(false);
                // With rows on screen the failure is only a status line; an
                // empty feed shows it inline instead
                if !self.controller.rows().is_empty() {
                    self.set_status(format!("Error: {}", message));
                }
            }
            Completion::Stale => {}
        }
    }

    /// Cancel the in-flight fetch so a late completion is discarded.
    pub fn shutdown(&mut self) {
        self.controller.cancel();
        if let Some(handle) = self.fetch_handle.take() {
            handle.abort();
        }
    }
}
