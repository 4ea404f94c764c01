//! HTTP fetch client for upstream legislative sources.
//!
//! The harvest loop talks to the network only through the [`Fetcher`] trait,
//! so tests can substitute scripted responses. [`HttpFetcher`] is the
//! reqwest-backed implementation: one client, a fixed User-Agent, a
//! per-request timeout, and no retries.

use std::future::Future;
use std::time::Duration;

use legisharvest_shared::{HarvestError, Result};
use reqwest::Client;
use tracing::debug;
use url::Url;

/// Maximum number of redirects followed per request.
const MAX_REDIRECTS: usize = 5;

/// Default per-request timeout in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Fallback User-Agent when none is configured.
const DEFAULT_USER_AGENT: &str = concat!("legisharvest/", env!("CARGO_PKG_VERSION"));

// ---------------------------------------------------------------------------
// FetchResponse
// ---------------------------------------------------------------------------

/// Raw outcome of one GET request.
#[derive(Debug, Clone)]
pub struct FetchResponse {
    /// Final URL after redirects.
    pub url: Url,
    /// HTTP status code.
    pub status: u16,
    /// Response body decoded as text.
    pub body: String,
}

impl FetchResponse {
    /// Whether the status is 2xx.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Turn a non-2xx response into a [`HarvestError::Network`].
    pub fn error_for_status(self) -> Result<Self> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(HarvestError::Network(format!(
                "{}: HTTP {}",
                self.url, self.status
            )))
        }
    }
}

// ---------------------------------------------------------------------------
// Fetcher
// ---------------------------------------------------------------------------

/// Source of raw response bodies.
///
/// `Err` means the request never produced a response (DNS, connect, timeout,
/// body read). A response with a non-2xx status is still `Ok`; callers decide
/// whether to skip it.
pub trait Fetcher: Send + Sync {
    fn get(&self, url: &Url) -> impl Future<Output = Result<FetchResponse>> + Send;
}

/// Options for building an [`HttpFetcher`].
#[derive(Debug, Clone)]
pub struct FetchOptions {
    /// User-Agent header sent with every request.
    pub user_agent: String,
    /// Timeout for a whole request, in seconds.
    pub timeout_secs: u64,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

/// reqwest-backed [`Fetcher`]. Cheap to share; holds one connection pool.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    /// Build a fetcher with the given identity and timeout.
    pub fn new(opts: &FetchOptions) -> Result<Self> {
        let client = Client::builder()
            .user_agent(opts.user_agent.as_str())
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .timeout(Duration::from_secs(opts.timeout_secs))
            .build()
            .map_err(|e| HarvestError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { client })
    }
}

impl Fetcher for HttpFetcher {
    async fn get(&self, url: &Url) -> Result<FetchResponse> {
        debug!(%url, "fetching");

        let response = self
            .client
            .get(url.as_str())
            .send()
            .await
            .map_err(|e| HarvestError::Network(format!("{url}: {e}")))?;

        let status = response.status().as_u16();
        let final_url = response.url().clone();

        let body = response
            .text()
            .await
            .map_err(|e| HarvestError::Network(format!("{url}: body read failed: {e}")))?;

        debug!(%url, status, len = body.len(), "fetched");

        Ok(FetchResponse {
            url: final_url,
            status,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn fetcher() -> HttpFetcher {
        HttpFetcher::new(&FetchOptions {
            user_agent: "legisharvest-test".into(),
            timeout_secs: 5,
        })
        .unwrap()
    }

    #[test]
    fn success_range() {
        let url = Url::parse("https://www.govinfo.gov/").unwrap();
        let ok = FetchResponse {
            url: url.clone(),
            status: 204,
            body: String::new(),
        };
        assert!(ok.is_success());

        let missing = FetchResponse {
            url,
            status: 404,
            body: String::new(),
        };
        assert!(!missing.is_success());
        let err = missing.error_for_status().unwrap_err();
        assert!(err.to_string().contains("HTTP 404"));
    }

    #[tokio::test]
    async fn sends_user_agent_and_returns_body() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/browse/committee"))
            .and(header("user-agent", "legisharvest-test"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>catalog</html>"))
            .mount(&server)
            .await;

        let url = Url::parse(&format!("{}/browse/committee", server.uri())).unwrap();
        let response = fetcher().get(&url).await.unwrap();

        assert_eq!(response.status, 200);
        assert!(response.is_success());
        assert_eq!(response.body, "<html>catalog</html>");
    }

    #[tokio::test]
    async fn non_success_status_is_not_an_error() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500).set_body_string("upstream down"))
            .mount(&server)
            .await;

        let url = Url::parse(&server.uri()).unwrap();
        let response = fetcher().get(&url).await.unwrap();

        assert_eq!(response.status, 500);
        assert!(!response.is_success());
    }

    #[tokio::test]
    async fn connection_failure_is_network_error() {
        // Bind and drop a listener to get a port nothing listens on.
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let url = Url::parse(&format!("http://127.0.0.1:{port}/")).unwrap();

        let err = fetcher().get(&url).await.unwrap_err();
        assert!(matches!(err, HarvestError::Network(_)));
    }
}
