//! Page fetching for the pipeline.
//!
//! This crate provides:
//! - [`PageFetcher`] — the seam the pipeline fetches through
//! - [`HttpFetcher`] — the `reqwest` implementation (redirects, timeout, status check)

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, instrument};
use url::Url;

use linkprompt_shared::{FetchSettings, LinkPromptError, Result};

/// Source of raw page bodies.
///
/// Any failure, transport or HTTP status, comes back as an `Err`; the
/// pipeline treats all of them the same way.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<String>;
}

// ---------------------------------------------------------------------------
// HttpFetcher
// ---------------------------------------------------------------------------

/// Plain HTTP(S) GET with redirect following and a whole-request timeout.
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    /// Build a fetcher from the `[fetch]` settings.
    pub fn new(settings: &FetchSettings) -> Result<Self> {
        let client = Client::builder()
            .user_agent(settings.user_agent.as_str())
            .redirect(reqwest::redirect::Policy::limited(settings.max_redirects))
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .map_err(|e| LinkPromptError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { client })
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    #[instrument(skip(self))]
    async fn fetch(&self, url: &str) -> Result<String> {
        let parsed = Url::parse(url)
            .map_err(|e| LinkPromptError::Network(format!("{url}: invalid URL: {e}")))?;

        match parsed.scheme() {
            "http" | "https" => {}
            other => {
                return Err(LinkPromptError::Network(format!(
                    "{url}: unsupported scheme '{other}'"
                )));
            }
        }

        let response = self
            .client
            .get(parsed)
            .send()
            .await
            .map_err(|e| LinkPromptError::Network(format!("{url}: {e}")))?;

        let status = response.status();
        if status.is_client_error() || status.is_server_error() {
            return Err(LinkPromptError::Network(format!("{url}: HTTP {status}")));
        }

        let body = response
            .text()
            .await
            .map_err(|e| LinkPromptError::Network(format!("{url}: body read failed: {e}")))?;

        debug!(status = status.as_u16(), len = body.len(), "page fetched");
        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn fetcher() -> HttpFetcher {
        HttpFetcher::new(&FetchSettings::default()).unwrap()
    }

    #[tokio::test]
    async fn returns_body_on_success() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/page"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<p>Hi</p>"))
            .mount(&server)
            .await;

        let body = fetcher()
            .fetch(&format!("{}/page", server.uri()))
            .await
            .unwrap();
        assert_eq!(body, "<p>Hi</p>");
    }

    #[tokio::test]
    async fn client_and_server_errors_fail() {
        let server = MockServer::start().await;
        Mock::given(path("/missing"))
            .respond_with(ResponseTemplate::new(404).set_body_string("not here"))
            .mount(&server)
            .await;
        Mock::given(path("/broken"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let f = fetcher();
        let err = f
            .fetch(&format!("{}/missing", server.uri()))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("404"));
        assert!(f.fetch(&format!("{}/broken", server.uri())).await.is_err());
    }

    #[tokio::test]
    async fn follows_redirects() {
        let server = MockServer::start().await;
        Mock::given(path("/old"))
            .respond_with(
                ResponseTemplate::new(301)
                    .insert_header("Location", format!("{}/new", server.uri()).as_str()),
            )
            .mount(&server)
            .await;
        Mock::given(path("/new"))
            .respond_with(ResponseTemplate::new(200).set_body_string("moved here"))
            .mount(&server)
            .await;

        let body = fetcher()
            .fetch(&format!("{}/old", server.uri()))
            .await
            .unwrap();
        assert_eq!(body, "moved here");
    }

    #[tokio::test]
    async fn slow_server_times_out() {
        let server = MockServer::start().await;
        Mock::given(path("/slow"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string("late")
                    .set_delay(Duration::from_secs(3)),
            )
            .mount(&server)
            .await;

        let settings = FetchSettings {
            timeout_secs: 1,
            ..FetchSettings::default()
        };
        let f = HttpFetcher::new(&settings).unwrap();
        assert!(f.fetch(&format!("{}/slow", server.uri())).await.is_err());
    }

    #[tokio::test]
    async fn rejects_malformed_and_non_http_links() {
        let f = fetcher();
        assert!(f.fetch("not a url").await.is_err());

        let err = f.fetch("file:///etc/passwd").await.unwrap_err();
        assert!(err.to_string().contains("unsupported scheme"));
    }

    #[tokio::test]
    async fn unreachable_host_fails() {
        // Port 9 on loopback is the discard service; nothing listens there in CI.
        let err = fetcher().fetch("http://127.0.0.1:9/").await.unwrap_err();
        assert!(matches!(err, LinkPromptError::Network(_)));
    }
}
