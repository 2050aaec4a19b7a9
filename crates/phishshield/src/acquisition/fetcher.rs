//! Single-attempt page fetcher.
//!
//! One logical GET per analysis, with a browser-like `User-Agent`. Redirects
//! are followed by hand (the client's own redirect policy is disabled) so the
//! number of hops can be reported. The whole exchange, every hop and the body
//! download included, is bounded by one timeout. Failures are never retried
//! and never propagate: they become [`FetchOutcome::Failed`] and the pipeline
//! carries on with zero-valued content features.

use reqwest::header::{HeaderMap, LOCATION};
use reqwest::StatusCode;
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};
use url::Url;

/// Default `User-Agent` header sent with every fetch.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0";

/// Fetcher settings.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Upper bound on the whole fetch, redirects and body included.
    pub timeout: Duration,
    /// Value of the `User-Agent` request header.
    pub user_agent: String,
    /// Maximum number of redirect hops to follow before giving up.
    pub max_redirects: usize,
    /// Bodies are read up to this many bytes; the rest is discarded.
    pub max_body_bytes: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            max_redirects: 30,
            max_body_bytes: 10 * 1024 * 1024,
        }
    }
}

/// Errors raised while fetching. They never leave this module except as the
/// `reason` string of a failed outcome, or from [`ContentFetcher::new`].
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("timed out after {0:?}")]
    Timeout(Duration),
    #[error("exceeded {0} redirects")]
    TooManyRedirects(usize),
}

/// A successfully fetched page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FetchedPage {
    /// Decoded response body.
    pub body: String,
    /// URL of the last hop.
    pub final_url: String,
    /// HTTP status of the last hop. Error statuses are still a fetched page.
    pub status: u16,
    /// Number of redirect hops actually followed.
    pub redirect_count: usize,
    /// The body was cut at `max_body_bytes`.
    pub truncated: bool,
}

/// Result of a fetch: exactly one of success or failure.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    Fetched(FetchedPage),
    Failed { reason: String },
}

impl FetchOutcome {
    /// Body text when the fetch succeeded.
    pub fn body(&self) -> Option<&str> {
        match self {
            FetchOutcome::Fetched(page) => Some(&page.body),
            FetchOutcome::Failed { .. } => None,
        }
    }

    /// Failure reason when the fetch failed.
    pub fn failure_reason(&self) -> Option<&str> {
        match self {
            FetchOutcome::Fetched(_) => None,
            FetchOutcome::Failed { reason } => Some(reason),
        }
    }

    /// Three-way redirect state derived from this outcome.
    pub fn redirect_state(&self) -> RedirectState {
        match self {
            FetchOutcome::Failed { .. } => RedirectState::NoResponse,
            FetchOutcome::Fetched(page) if page.redirect_count == 0 => RedirectState::NoRedirects,
            FetchOutcome::Fetched(_) => RedirectState::HadRedirects,
        }
    }
}

/// Redirect accounting for a fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RedirectState {
    /// The fetch failed entirely.
    NoResponse,
    /// A response was obtained without any redirect.
    NoRedirects,
    /// A response was obtained after one or more redirects.
    HadRedirects,
}

/// Fetches pages for analysis. Cheap to clone; the underlying client pools
/// connections.
#[derive(Debug, Clone)]
pub struct ContentFetcher {
    client: reqwest::Client,
    config: FetchConfig,
}

impl ContentFetcher {
    /// Build a fetcher with the given settings.
    pub fn new(config: FetchConfig) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .user_agent(&config.user_agent)
            .build()
            .map_err(FetchError::Client)?;
        Ok(Self { client, config })
    }

    /// Settings this fetcher was built with.
    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    /// Fetch `url` bounded by the configured timeout.
    pub async fn fetch(&self, url: &str) -> FetchOutcome {
        self.fetch_with_timeout(url, self.config.timeout).await
    }

    /// Fetch `url` bounded by `timeout`.
    pub async fn fetch_with_timeout(&self, url: &str, timeout: Duration) -> FetchOutcome {
        let result = match tokio::time::timeout(timeout, self.follow(url, timeout)).await {
            Ok(result) => result,
            Err(_) => Err(FetchError::Timeout(timeout)),
        };

        match result {
            Ok(page) => {
                debug!(
                    url,
                    final_url = %page.final_url,
                    status = page.status,
                    redirects = page.redirect_count,
                    bytes = page.body.len(),
                    "fetched page"
                );
                FetchOutcome::Fetched(page)
            }
            Err(e) => {
                warn!(url, error = %e, "fetch failed, continuing without page content");
                FetchOutcome::Failed {
                    reason: e.to_string(),
                }
            }
        }
    }

    async fn follow(&self, url: &str, timeout: Duration) -> Result<FetchedPage, FetchError> {
        let mut current = Url::parse(url)?;
        let mut redirect_count = 0;

        loop {
            let response = self
                .client
                .get(current.clone())
                .timeout(timeout)
                .send()
                .await?;
            let status = response.status();

            if is_redirect(status) {
                if let Some(next) = redirect_target(&current, response.headers()) {
                    if redirect_count >= self.config.max_redirects {
                        return Err(FetchError::TooManyRedirects(self.config.max_redirects));
                    }
                    debug!(from = %current, to = %next, status = status.as_u16(), "following redirect");
                    redirect_count += 1;
                    current = next;
                    continue;
                }
            }

            let (body, truncated) = self.read_body(response).await?;
            if truncated {
                debug!(url = %current, limit = self.config.max_body_bytes, "body truncated");
            }

            return Ok(FetchedPage {
                body,
                final_url: current.to_string(),
                status: status.as_u16(),
                redirect_count,
                truncated,
            });
        }
    }

    /// Stream the body, keeping at most `max_body_bytes`. Invalid UTF-8 is
    /// replaced rather than rejected.
    async fn read_body(
        &self,
        mut response: reqwest::Response,
    ) -> Result<(String, bool), FetchError> {
        let limit = self.config.max_body_bytes;
        let mut buf: Vec<u8> = Vec::new();
        let mut truncated = false;

        while let Some(chunk) = response.chunk().await? {
            let room = limit - buf.len();
            if chunk.len() > room {
                buf.extend_from_slice(&chunk[..room]);
                truncated = true;
                break;
            }
            buf.extend_from_slice(&chunk);
        }
        Ok((String::from_utf8_lossy(&buf).into_owned(), truncated))
    }
}

fn is_redirect(status: StatusCode) -> bool {
    matches!(
        status,
        StatusCode::MOVED_PERMANENTLY
            | StatusCode::FOUND
            | StatusCode::SEE_OTHER
            | StatusCode::TEMPORARY_REDIRECT
            | StatusCode::PERMANENT_REDIRECT
    )
}

/// Resolve the `Location` header of a redirect against the current URL.
/// A redirect without a usable `Location` is treated as the final response.
fn redirect_target(current: &Url, headers: &HeaderMap) -> Option<Url> {
    let location = headers.get(LOCATION)?.to_str().ok()?;
    current.join(location).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn fetcher_with(config: FetchConfig) -> ContentFetcher {
        ContentFetcher::new(config).unwrap()
    }

    #[tokio::test]
    async fn test_fetch_without_redirects() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/page"))
            .and(header("user-agent", DEFAULT_USER_AGENT))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>hi</html>"))
            .mount(&server)
            .await;

        let fetcher = fetcher_with(FetchConfig::default());
        let outcome = fetcher.fetch(&format!("{}/page", server.uri())).await;

        assert_eq!(outcome.body(), Some("<html>hi</html>"));
        assert_eq!(outcome.redirect_state(), RedirectState::NoRedirects);
        assert!(outcome.failure_reason().is_none());
    }

    #[tokio::test]
    async fn test_fetch_counts_redirect_hops() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/a"))
            .respond_with(ResponseTemplate::new(301).insert_header("location", "/b"))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/b"))
            .respond_with(ResponseTemplate::new(302).insert_header("location", "/c"))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/c"))
            .respond_with(ResponseTemplate::new(200).set_body_string("landed"))
            .mount(&server)
            .await;

        let fetcher = fetcher_with(FetchConfig::default());
        let outcome = fetcher.fetch(&format!("{}/a", server.uri())).await;

        match &outcome {
            FetchOutcome::Fetched(page) => {
                assert_eq!(page.redirect_count, 2);
                assert_eq!(page.body, "landed");
                assert!(page.final_url.ends_with("/c"));
            }
            other => panic!("expected fetched page, got {other:?}"),
        }
        assert_eq!(outcome.redirect_state(), RedirectState::HadRedirects);
    }

    #[tokio::test]
    async fn test_error_status_is_still_a_response() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404).set_body_string("not here"))
            .mount(&server)
            .await;

        let fetcher = fetcher_with(FetchConfig::default());
        let outcome = fetcher.fetch(&server.uri()).await;

        assert_eq!(outcome.body(), Some("not here"));
        assert_eq!(outcome.redirect_state(), RedirectState::NoRedirects);
    }

    #[tokio::test]
    async fn test_redirect_loop_fails() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/loop"))
            .respond_with(ResponseTemplate::new(302).insert_header("location", "/loop"))
            .mount(&server)
            .await;

        let fetcher = fetcher_with(FetchConfig {
            max_redirects: 3,
            ..FetchConfig::default()
        });
        let outcome = fetcher.fetch(&format!("{}/loop", server.uri())).await;

        assert_eq!(outcome.redirect_state(), RedirectState::NoResponse);
        assert!(outcome.failure_reason().unwrap().contains("redirects"));
    }

    #[tokio::test]
    async fn test_timeout_returns_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
            .mount(&server)
            .await;

        let fetcher = fetcher_with(FetchConfig::default());
        let started = std::time::Instant::now();
        let outcome = fetcher
            .fetch_with_timeout(&server.uri(), Duration::from_millis(200))
            .await;

        assert!(started.elapsed() < Duration::from_secs(4));
        assert_eq!(outcome.redirect_state(), RedirectState::NoResponse);
        assert!(outcome.body().is_none());
    }

    #[tokio::test]
    async fn test_invalid_url_fails_without_request() {
        let fetcher = fetcher_with(FetchConfig::default());
        let outcome = fetcher.fetch("not a url").await;
        assert!(outcome.failure_reason().unwrap().starts_with("invalid URL"));
    }

    #[tokio::test]
    async fn test_oversized_body_is_truncated_not_failed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/big"))
            .respond_with(ResponseTemplate::new(200).set_body_string("x".repeat(64)))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/moved"))
            .respond_with(ResponseTemplate::new(301).insert_header("location", "/big"))
            .mount(&server)
            .await;

        let fetcher = fetcher_with(FetchConfig {
            max_body_bytes: 16,
            ..FetchConfig::default()
        });

        let outcome = fetcher.fetch(&format!("{}/big", server.uri())).await;
        match &outcome {
            FetchOutcome::Fetched(page) => {
                assert_eq!(page.body, "x".repeat(16));
                assert!(page.truncated);
            }
            other => panic!("expected fetched page, got {other:?}"),
        }
        assert_eq!(outcome.redirect_state(), RedirectState::NoRedirects);

        let outcome = fetcher.fetch(&format!("{}/moved", server.uri())).await;
        assert_eq!(outcome.body().map(str::len), Some(16));
        assert_eq!(outcome.redirect_state(), RedirectState::HadRedirects);
    }

    #[tokio::test]
    async fn test_body_within_limit_is_not_truncated() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("x".repeat(16)))
            .mount(&server)
            .await;

        let fetcher = fetcher_with(FetchConfig {
            max_body_bytes: 16,
            ..FetchConfig::default()
        });
        match fetcher.fetch(&server.uri()).await {
            FetchOutcome::Fetched(page) => assert!(!page.truncated),
            other => panic!("expected fetched page, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_redirect_without_location_is_final() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/nowhere"))
            .respond_with(ResponseTemplate::new(302).set_body_string("no location"))
            .mount(&server)
            .await;

        let fetcher = fetcher_with(FetchConfig::default());
        let outcome = fetcher.fetch(&format!("{}/nowhere", server.uri())).await;

        match &outcome {
            FetchOutcome::Fetched(page) => {
                assert_eq!(page.status, 302);
                assert_eq!(page.redirect_count, 0);
                assert_eq!(page.body, "no location");
            }
            other => panic!("expected fetched page, got {other:?}"),
        }
        assert_eq!(outcome.redirect_state(), RedirectState::NoRedirects);
    }
}
