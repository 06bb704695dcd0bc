use super::types::FeedPage;
use futures::StreamExt;
use reqwest::redirect::Policy;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;
use url::Url;

const MAX_BODY_SIZE: usize = 10 * 1024 * 1024; // 10MB
const MAX_REDIRECTS: usize = 3;

/// Fallback message when an error carries nothing better to show.
pub const GENERIC_FAILURE: &str = "Failed to load feed";

/// Errors that can occur while fetching a page of posts.
///
/// None of these are fatal: the feed controller turns them into a
/// user-facing message and keeps whatever rows it already has.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Network-level error (DNS, connection, TLS, etc.)
    #[error("Request failed: {0}")]
    Network(#[from] reqwest::Error),
    /// Request exceeded the configured timeout
    #[error("Request timed out")]
    Timeout,
    /// Non-2xx response, with the server's `message` field when it sent one
    #[error("Server error: status {status}")]
    Server {
        status: u16,
        message: Option<String>,
    },
    /// Body was not JSON
    #[error("Malformed response: {0}")]
    Malformed(String),
    /// Body exceeded the 10MB size limit
    #[error("Response too large")]
    ResponseTooLarge,
}

impl ApiError {
    /// The client-wide deadline surfaces as a reqwest error; report it the
    /// same way as our own.
    fn from_reqwest(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ApiError::Timeout
        } else {
            ApiError::Network(e)
        }
    }

    /// Message suitable for the inline error shown on an empty feed.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Server {
                message: Some(msg), ..
            } if !msg.trim().is_empty() => msg.clone(),
            other => {
                let text = other.to_string();
                if text.is_empty() {
                    GENERIC_FAILURE.to_string()
                } else {
                    text
                }
            }
        }
    }
}

/// How the page position is sent to the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaginationMode {
    /// `offset` and `limit` only.
    #[default]
    Offset,
    /// `offset` and `limit` plus a 1-based `page`.
    Page,
}

/// Query for a single page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageQuery {
    pub offset: usize,
    pub limit: usize,
}

impl PageQuery {
    /// 1-based page number for servers that paginate by page.
    pub fn page(&self) -> usize {
        if self.limit == 0 {
            1
        } else {
            self.offset / self.limit + 1
        }
    }
}

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

/// Build the shared HTTP client.
///
/// - Limits redirects to 3 hops and detects loops
/// - Applies `timeout` to every request, body included
/// - Sends a `haiyvee/<version>` user agent
pub fn build_http_client(timeout: Duration) -> Result<reqwest::Client, ApiError> {
    let policy = Policy::custom(|attempt| {
        // `previous` includes the original request, so N hops means N entries
        if attempt.previous().len() > MAX_REDIRECTS {
            return attempt.error("Too many redirects (max 3)");
        }

        let url = attempt.url();
        if attempt.previous().iter().any(|prev| prev.as_str() == url.as_str()) {
            return attempt.error("Redirect loop detected");
        }

        tracing::debug!(
            to = %url,
            hop = attempt.previous().len() + 1,
            "Following redirect"
        );
        attempt.follow()
    });

    let client = reqwest::Client::builder()
        .redirect(policy)
        .pool_idle_timeout(Duration::from_secs(30))
        .tcp_keepalive(Duration::from_secs(60))
        .timeout(timeout)
        .user_agent(concat!("haiyvee/", env!("CARGO_PKG_VERSION")))
        .build()?;
    Ok(client)
}

/// Client for the posts endpoint.
///
/// Cheap to clone: the underlying `reqwest::Client` is reference counted.
#[derive(Debug, Clone)]
pub struct FeedClient {
    http: reqwest::Client,
    endpoint: Url,
    mode: PaginationMode,
    timeout: Duration,
}

impl FeedClient {
    pub fn new(http: reqwest::Client, endpoint: Url, mode: PaginationMode, timeout: Duration) -> Self {
        Self {
            http,
            endpoint,
            mode,
            timeout,
        }
    }

    /// Fetch one page of posts.
    ///
    /// No retries: a failed page is reported and the caller decides whether
    /// to ask again.
    ///
    /// # Errors
    ///
    /// - [`ApiError::Timeout`] - request exceeded the configured timeout
    /// - [`ApiError::Network`] - connection or TLS errors
    /// - [`ApiError::Server`] - non-2xx response
    /// - [`ApiError::ResponseTooLarge`] - body exceeded 10MB
    /// - [`ApiError::Malformed`] - body was not JSON
    pub async fn fetch_page(&self, query: PageQuery) -> Result<FeedPage, ApiError> {
        let mut url = self.endpoint.clone();
        {
            let mut pairs = url.query_pairs_mut();
            pairs
                .append_pair("offset", &query.offset.to_string())
                .append_pair("limit", &query.limit.to_string());
            if self.mode == PaginationMode::Page {
                pairs.append_pair("page", &query.page().to_string());
            }
        }

        tracing::debug!(
            endpoint = %self.endpoint,
            offset = query.offset,
            limit = query.limit,
            "Fetching feed page"
        );

        // One deadline for headers and body: a server that stalls mid-body
        // must not keep the fetch in flight
        let bytes = tokio::time::timeout(self.timeout, self.request_body(url))
            .await
            .map_err(|_| ApiError::Timeout)??;

        let page = FeedPage::from_json(&bytes)?;
        tracing::debug!(
            posts = page.posts.len(),
            total = ?page.pagination.and_then(|p| p.total),
            "Feed page decoded"
        );
        Ok(page)
    }

    /// Send the request and read the body of a 2xx response.
    async fn request_body(&self, url: Url) -> Result<Vec<u8>, ApiError> {
        let response = self.http.get(url).send().await.map_err(ApiError::from_reqwest)?;

        let status = response.status();
        if !status.is_success() {
            // Best effort: the message is nice to have, the status is what matters
            let message = read_limited_bytes(response, MAX_BODY_SIZE)
                .await
                .ok()
                .and_then(|bytes| serde_json::from_slice::<ErrorBody>(&bytes).ok())
                .and_then(|body| body.message);
            tracing::warn!(status = status.as_u16(), message = ?message, "Feed request failed");
            return Err(ApiError::Server {
                status: status.as_u16(),
                message,
            });
        }

        read_limited_bytes(response, MAX_BODY_SIZE).await
    }
}

async fn read_limited_bytes(response: reqwest::Response, limit: usize) -> Result<Vec<u8>, ApiError> {
    if let Some(len) = response.content_length() {
        if len as usize > limit {
            return Err(ApiError::ResponseTooLarge);
        }
    }

    let mut bytes = Vec::new();
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(ApiError::from_reqwest)?;
        if bytes.len().saturating_add(chunk.len()) > limit {
            return Err(ApiError::ResponseTooLarge);
        }
        bytes.extend_from_slice(&chunk);
    }

    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer, mode: PaginationMode) -> FeedClient {
        let endpoint = Url::parse(&format!("{}/api/posts/", server.uri())).unwrap();
        FeedClient::new(reqwest::Client::new(), endpoint, mode, Duration::from_secs(5))
    }

    #[tokio::test]
    async fn test_fetch_sends_offset_and_limit() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(query_param("offset", "20"))
            .and(query_param("limit", "10"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(r#"{"posts":[{"_id":"a"}],"pagination":{"total":21}}"#),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server, PaginationMode::Offset);
        let page = client
            .fetch_page(PageQuery {
                offset: 20,
                limit: 10,
            })
            .await
            .unwrap();
        assert_eq!(page.posts.len(), 1);
        assert_eq!(page.pagination.unwrap().total, Some(21));
    }

    #[tokio::test]
    async fn test_page_mode_sends_page_param() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(query_param("page", "3"))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"posts":[]}"#))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server, PaginationMode::Page);
        let page = client
            .fetch_page(PageQuery {
                offset: 20,
                limit: 10,
            })
            .await
            .unwrap();
        assert!(page.posts.is_empty());
    }

    #[tokio::test]
    async fn test_server_error_carries_message() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(503).set_body_string(r#"{"message":"Maintenance window"}"#),
            )
            .expect(1) // No retries
            .mount(&server)
            .await;

        let client = client_for(&server, PaginationMode::Offset);
        let err = client
            .fetch_page(PageQuery {
                offset: 0,
                limit: 10,
            })
            .await
            .unwrap_err();
        match &err {
            ApiError::Server { status: 503, .. } => {}
            e => panic!("Expected Server(503), got {:?}", e),
        }
        assert_eq!(err.user_message(), "Maintenance window");
    }

    #[tokio::test]
    async fn test_server_error_without_message_uses_display() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let client = client_for(&server, PaginationMode::Offset);
        let err = client
            .fetch_page(PageQuery {
                offset: 0,
                limit: 10,
            })
            .await
            .unwrap_err();
        assert_eq!(err.user_message(), "Server error: status 404");
    }

    #[tokio::test]
    async fn test_timeout() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(r#"{"posts":[]}"#)
                    .set_delay(Duration::from_millis(500)),
            )
            .mount(&server)
            .await;

        let endpoint = Url::parse(&server.uri()).unwrap();
        let client = FeedClient::new(
            reqwest::Client::new(),
            endpoint,
            PaginationMode::Offset,
            Duration::from_millis(50),
        );
        let err = client
            .fetch_page(PageQuery {
                offset: 0,
                limit: 10,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Timeout));
    }

    /// Accept one connection, send headers and half a body, then stall.
    async fn stalled_server() -> Url {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = [0u8; 1024];
            let _ = socket.read(&mut request).await;
            socket
                .write_all(
                    b"HTTP/1.1 200 OK\r\nContent-Type: application/json\r\n\
                      Content-Length: 1000\r\n\r\n{\"posts\":[",
                )
                .await
                .unwrap();
            tokio::time::sleep(Duration::from_secs(30)).await;
        });
        Url::parse(&format!("http://{}/api/posts/", addr)).unwrap()
    }

    #[tokio::test]
    async fn test_stalled_body_times_out() {
        let endpoint = stalled_server().await;
        let client = FeedClient::new(
            reqwest::Client::new(),
            endpoint,
            PaginationMode::Offset,
            Duration::from_millis(300),
        );

        let result = tokio::time::timeout(
            Duration::from_secs(3),
            client.fetch_page(PageQuery {
                offset: 0,
                limit: 10,
            }),
        )
        .await
        .expect("fetch should give up on its own");
        assert!(matches!(result, Err(ApiError::Timeout)));
    }

    #[tokio::test]
    async fn test_shared_client_deadline_reports_timeout() {
        let endpoint = stalled_server().await;
        let http = build_http_client(Duration::from_millis(300)).unwrap();
        let client = FeedClient::new(http, endpoint, PaginationMode::Offset, Duration::from_secs(10));

        let result = tokio::time::timeout(
            Duration::from_secs(3),
            client.fetch_page(PageQuery {
                offset: 0,
                limit: 10,
            }),
        )
        .await
        .expect("client deadline should end the fetch");
        assert!(matches!(result, Err(ApiError::Timeout)));
    }

    #[tokio::test]
    async fn test_oversized_body_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![b' '; MAX_BODY_SIZE + 1]))
            .mount(&server)
            .await;

        let client = client_for(&server, PaginationMode::Offset);
        let err = client
            .fetch_page(PageQuery {
                offset: 0,
                limit: 10,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::ResponseTooLarge));
    }

    // ========================================================================
    // Redirects
    // ========================================================================

    async fn redirect(server: &MockServer, from: &str, to: &str) {
        Mock::given(method("GET"))
            .and(path(from))
            .respond_with(ResponseTemplate::new(302).insert_header("Location", to))
            .mount(server)
            .await;
    }

    async fn posts_at(server: &MockServer, at: &str) {
        Mock::given(method("GET"))
            .and(path(at))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"posts":[{"_id":"a"}]}"#))
            .mount(server)
            .await;
    }

    fn redirecting_client(server: &MockServer, start: &str) -> FeedClient {
        let http = build_http_client(Duration::from_secs(5)).unwrap();
        let endpoint = Url::parse(&format!("{}{}", server.uri(), start)).unwrap();
        FeedClient::new(http, endpoint, PaginationMode::Offset, Duration::from_secs(5))
    }

    fn error_chain(err: &dyn std::error::Error) -> String {
        let mut text = err.to_string();
        let mut source = err.source();
        while let Some(e) = source {
            text.push_str(": ");
            text.push_str(&e.to_string());
            source = e.source();
        }
        text
    }

    #[tokio::test]
    async fn test_follows_three_redirects() {
        let server = MockServer::start().await;
        let uri = server.uri();
        redirect(&server, "/start", &format!("{}/hop1", uri)).await;
        redirect(&server, "/hop1", &format!("{}/hop2", uri)).await;
        redirect(&server, "/hop2", &format!("{}/posts", uri)).await;
        posts_at(&server, "/posts").await;

        let page = redirecting_client(&server, "/start")
            .fetch_page(PageQuery {
                offset: 0,
                limit: 10,
            })
            .await
            .unwrap();
        assert_eq!(page.posts.len(), 1);
    }

    #[tokio::test]
    async fn test_fourth_redirect_rejected() {
        let server = MockServer::start().await;
        let uri = server.uri();
        redirect(&server, "/start", &format!("{}/hop1", uri)).await;
        redirect(&server, "/hop1", &format!("{}/hop2", uri)).await;
        redirect(&server, "/hop2", &format!("{}/hop3", uri)).await;
        redirect(&server, "/hop3", &format!("{}/posts", uri)).await;
        posts_at(&server, "/posts").await;

        let err = redirecting_client(&server, "/start")
            .fetch_page(PageQuery {
                offset: 0,
                limit: 10,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Network(_)));
        assert!(error_chain(&err).contains("Too many redirects"));
    }

    #[tokio::test]
    async fn test_redirect_loop_detected() {
        let server = MockServer::start().await;
        let uri = server.uri();
        redirect(&server, "/loop-a", &format!("{}/loop-b", uri)).await;
        // Back to the exact URL first requested, query included
        redirect(&server, "/loop-b", &format!("{}/loop-a?offset=0&limit=10", uri)).await;

        let err = redirecting_client(&server, "/loop-a")
            .fetch_page(PageQuery {
                offset: 0,
                limit: 10,
            })
            .await
            .unwrap_err();
        assert!(error_chain(&err).contains("Redirect loop detected"));
    }

    #[test]
    fn test_page_number() {
        assert_eq!(PageQuery { offset: 0, limit: 10 }.page(), 1);
        assert_eq!(PageQuery { offset: 10, limit: 10 }.page(), 2);
        assert_eq!(PageQuery { offset: 15, limit: 10 }.page(), 2);
        assert_eq!(PageQuery { offset: 5, limit: 0 }.page(), 1);
    }
}
