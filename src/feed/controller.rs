//! Pagination and fetch state for the home feed.
//!
//! The controller never performs I/O. Each operation that needs the network
//! returns a [`FetchRequest`]; the caller runs it and hands the outcome back
//! through [`FeedController::complete`]. A single in-flight ticket guards
//! against overlapping fetches, so completions can never arrive out of order.

use crate::api::{ApiError, FeedPage, PageQuery};

use super::row::{derive_has_more, map_posts, Row};

/// Default page size requested from the server.
pub const DEFAULT_PAGE_SIZE: usize = 10;

/// Fetch activity. `Resetting` counts as both refreshing and loading-initial.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FetchState {
    #[default]
    Idle,
    Resetting,
    LoadingMore,
}

/// Pagination position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Cursor {
    pub offset: usize,
}

/// Identifies one issued fetch. Completions carrying any other ticket are stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FetchTicket(u64);

/// A fetch the caller must perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchRequest {
    pub ticket: FetchTicket,
    pub query: PageQuery,
    /// `true` for refresh (replace rows), `false` for load-more (append).
    pub reset: bool,
}

/// What [`FeedController::complete`] did with an outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Completion {
    /// Rows were replaced or appended. Carries the number of rows received.
    Applied { received: usize },
    /// The fetch failed; rows were kept.
    Failed { message: String },
    /// Not the in-flight fetch (or the controller was cancelled). Ignored.
    Stale,
}

/// Owns the row collection and the pagination state machine.
#[derive(Debug)]
pub struct FeedController {
    rows: Vec<Row>,
    cursor: Cursor,
    has_more: bool,
    state: FetchState,
    error: Option<String>,
    page_size: usize,
    in_flight: Option<FetchTicket>,
    generation: u64,
}

impl Default for FeedController {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}

impl FeedController {
    pub fn new(page_size: usize) -> Self {
        Self {
            rows: Vec::new(),
            cursor: Cursor::default(),
            has_more: true,
            state: FetchState::Idle,
            error: None,
            page_size: page_size.max(1),
            in_flight: None,
            generation: 0,
        }
    }

    /// First load when the screen appears. Same as [`refresh`](Self::refresh).
    pub fn initial_load(&mut self) -> Option<FetchRequest> {
        self.refresh()
    }

    /// Reload from the start. `None` if a fetch is already in flight.
    pub fn refresh(&mut self) -> Option<FetchRequest> {
        if self.in_flight.is_some() {
            tracing::debug!(state = ?self.state, "Refresh ignored, fetch in flight");
            return None;
        }
        self.state = FetchState::Resetting;
        Some(self.issue(0, true))
    }

    /// Fetch the next page. `None` when there is nothing more to load or a
    /// fetch is already running.
    pub fn load_more(&mut self) -> Option<FetchRequest> {
        if !self.has_more || self.in_flight.is_some() || self.state == FetchState::LoadingMore {
            tracing::debug!(
                has_more = self.has_more,
                state = ?self.state,
                "Load-more ignored"
            );
            return None;
        }
        self.state = FetchState::LoadingMore;
        Some(self.issue(self.cursor.offset, false))
    }

    fn issue(&mut self, offset: usize, reset: bool) -> FetchRequest {
        self.error = None;
        self.generation = self.generation.wrapping_add(1);
        let ticket = FetchTicket(self.generation);
        self.in_flight = Some(ticket);
        tracing::debug!(offset, limit = self.page_size, reset, "Issuing feed fetch");
        FetchRequest {
            ticket,
            query: PageQuery {
                offset,
                limit: self.page_size,
            },
            reset,
        }
    }

    /// Apply the outcome of a fetch issued by this controller.
    pub fn complete(
        &mut self,
        ticket: FetchTicket,
        result: Result<FeedPage, ApiError>,
    ) -> Completion {
        if self.in_flight != Some(ticket) {
            tracing::debug!(?ticket, "Discarding stale fetch completion");
            return Completion::Stale;
        }
        let reset = self.state == FetchState::Resetting;
        self.in_flight = None;
        self.state = FetchState::Idle;

        match result {
            Ok(page) => {
                let offset = if reset { 0 } else { self.cursor.offset };
                let received = page.posts.len();
                let mapped = map_posts(&page.posts, offset);

                if reset {
                    self.rows = mapped;
                } else {
                    self.rows.extend(mapped);
                }
                self.has_more =
                    derive_has_more(page.pagination.as_ref(), offset, received, self.page_size);
                self.cursor.offset = offset + received;

                tracing::info!(
                    received,
                    rows = self.rows.len(),
                    offset = self.cursor.offset,
                    has_more = self.has_more,
                    "Feed page applied"
                );
                Completion::Applied { received }
            }
            Err(e) => {
                let message = e.user_message();
                tracing::warn!(error = %e, reset, "Feed fetch failed");
                self.error = Some(message.clone());
                Completion::Failed { message }
            }
        }
    }

    /// Forget the in-flight fetch. Its completion will be treated as stale.
    pub fn cancel(&mut self) {
        if let Some(ticket) = self.in_flight.take() {
            tracing::debug!(?ticket, "Cancelled in-flight fetch");
        }
        self.state = FetchState::Idle;
    }

    /// Mark the in-flight fetch as failed without a server outcome (e.g. the
    /// task running it died).
    pub fn abort(&mut self, ticket: FetchTicket, message: impl Into<String>) -> Completion {
        if self.in_flight != Some(ticket) {
            return Completion::Stale;
        }
        self.cancel();
        let message = message.into();
        self.error = Some(message.clone());
        Completion::Failed { message }
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn has_more(&self) -> bool {
        self.has_more
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn state(&self) -> FetchState {
        self.state
    }

    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn in_flight(&self) -> Option<FetchTicket> {
        self.in_flight
    }

    pub fn is_refreshing(&self) -> bool {
        self.state == FetchState::Resetting
    }

    pub fn is_loading_initial(&self) -> bool {
        self.state == FetchState::Resetting
    }

    pub fn is_loading_more(&self) -> bool {
        self.state == FetchState::LoadingMore
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{ApiPost, Pagination};
    use pretty_assertions::assert_eq;

    fn page(ids: std::ops::Range<usize>, total: Option<u64>) -> FeedPage {
        FeedPage {
            posts: ids
                .map(|i| ApiPost {
                    object_id: Some(format!("p{}", i)),
                    ..Default::default()
                })
                .collect(),
            pagination: total.map(|t| Pagination {
                total: Some(t),
                ..Default::default()
            }),
        }
    }

    fn ids(c: &FeedController) -> Vec<&str> {
        c.rows().iter().map(|r| r.id.as_str()).collect()
    }

    #[test]
    fn test_initial_load_requests_first_page() {
        let mut c = FeedController::default();
        let req = c.initial_load().unwrap();
        assert_eq!(req.query, PageQuery { offset: 0, limit: 10 });
        assert!(req.reset);
        assert!(c.is_refreshing());
        assert!(c.is_loading_initial());
    }

    #[test]
    fn test_first_page_with_total() {
        let mut c = FeedController::default();
        let req = c.initial_load().unwrap();
        let done = c.complete(req.ticket, Ok(page(0..10, Some(25))));

        assert_eq!(done, Completion::Applied { received: 10 });
        assert!(c.has_more());
        assert_eq!(c.cursor().offset, 10);
        assert_eq!(c.state(), FetchState::Idle);
    }

    #[test]
    fn test_short_page_without_total_ends_feed() {
        let mut c = FeedController::default();
        let req = c.initial_load().unwrap();
        c.complete(req.ticket, Ok(page(0..3, None)));

        assert!(!c.has_more());
        assert!(c.load_more().is_none());
    }

    #[test]
    fn test_refresh_replaces_rows() {
        let mut c = FeedController::default();
        let req = c.refresh().unwrap();
        c.complete(req.ticket, Ok(page(0..10, None)));
        let req = c.load_more().unwrap();
        c.complete(req.ticket, Ok(page(10..20, None)));
        assert_eq!(c.rows().len(), 20);

        let req = c.refresh().unwrap();
        assert_eq!(req.query.offset, 0);
        c.complete(req.ticket, Ok(page(100..104, None)));
        assert_eq!(ids(&c), vec!["p100", "p101", "p102", "p103"]);
        assert_eq!(c.cursor().offset, 4);
    }

    #[test]
    fn test_load_more_appends_in_order() {
        let mut c = FeedController::default();
        let req = c.refresh().unwrap();
        c.complete(req.ticket, Ok(page(0..10, Some(13))));

        let req = c.load_more().unwrap();
        assert_eq!(req.query.offset, 10);
        assert!(!req.reset);
        assert!(c.is_loading_more());
        c.complete(req.ticket, Ok(page(10..13, Some(13))));

        let expected: Vec<String> = (0..13).map(|i| format!("p{}", i)).collect();
        assert_eq!(ids(&c), expected.iter().map(String::as_str).collect::<Vec<_>>());
        assert_eq!(c.cursor().offset, 13);
        assert!(!c.has_more());
    }

    #[test]
    fn test_cursor_advances_by_received_not_page_size() {
        let mut c = FeedController::default();
        let req = c.refresh().unwrap();
        c.complete(req.ticket, Ok(page(0..10, Some(100))));
        let req = c.load_more().unwrap();
        c.complete(req.ticket, Ok(page(10..17, Some(100))));
        assert_eq!(c.cursor().offset, 17);
        assert_eq!(c.load_more().unwrap().query.offset, 17);
    }

    #[test]
    fn test_second_load_more_is_noop_while_pending() {
        let mut c = FeedController::default();
        let req = c.refresh().unwrap();
        c.complete(req.ticket, Ok(page(0..10, None)));

        let first = c.load_more().unwrap();
        assert!(c.load_more().is_none());
        assert!(c.refresh().is_none());
        assert_eq!(c.rows().len(), 10);

        c.complete(first.ticket, Ok(page(10..20, None)));
        assert_eq!(c.rows().len(), 20);
    }

    #[test]
    fn test_failed_load_more_keeps_rows() {
        let mut c = FeedController::default();
        let req = c.refresh().unwrap();
        c.complete(req.ticket, Ok(page(0..10, None)));

        let req = c.load_more().unwrap();
        let done = c.complete(
            req.ticket,
            Err(ApiError::Server {
                status: 500,
                message: Some("boom".into()),
            }),
        );
        assert_eq!(done, Completion::Failed { message: "boom".into() });
        assert_eq!(c.error(), Some("boom"));
        assert_eq!(c.rows().len(), 10);
        assert_eq!(c.cursor().offset, 10);
        assert!(c.has_more());
        assert_eq!(c.state(), FetchState::Idle);
    }

    #[test]
    fn test_error_cleared_on_next_attempt() {
        let mut c = FeedController::default();
        let req = c.refresh().unwrap();
        c.complete(req.ticket, Err(ApiError::Timeout));
        assert_eq!(c.error(), Some("Request timed out"));

        c.refresh().unwrap();
        assert_eq!(c.error(), None);
    }

    #[test]
    fn test_failed_refresh_keeps_cursor_and_has_more() {
        let mut c = FeedController::default();
        let req = c.refresh().unwrap();
        c.complete(req.ticket, Ok(page(0..4, None)));
        assert!(!c.has_more());

        let req = c.refresh().unwrap();
        c.complete(req.ticket, Err(ApiError::Malformed("eof".into())));
        assert!(!c.has_more());
        assert_eq!(c.cursor().offset, 4);
        assert_eq!(c.rows().len(), 4);
    }

    #[test]
    fn test_stale_completion_ignored() {
        let mut c = FeedController::default();
        let req = c.refresh().unwrap();
        c.cancel();

        assert_eq!(c.complete(req.ticket, Ok(page(0..10, None))), Completion::Stale);
        assert!(c.rows().is_empty());
        assert_eq!(c.cursor().offset, 0);
    }

    #[test]
    fn test_abort_releases_guard() {
        let mut c = FeedController::default();
        let req = c.refresh().unwrap();
        c.abort(req.ticket, "task panicked");
        assert_eq!(c.error(), Some("task panicked"));
        assert!(c.refresh().is_some());
    }

    #[test]
    fn test_positional_ids_unique_across_pages() {
        let mut c = FeedController::default();
        let req = c.refresh().unwrap();
        let blank = FeedPage {
            posts: vec![ApiPost::default(); 10],
            pagination: None,
        };
        c.complete(req.ticket, Ok(blank.clone()));
        let req = c.load_more().unwrap();
        c.complete(req.ticket, Ok(blank));

        let mut all = ids(&c);
        all.sort();
        all.dedup();
        assert_eq!(all.len(), 20);
    }
}
