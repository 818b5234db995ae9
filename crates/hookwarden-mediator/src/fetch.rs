use async_trait::async_trait;
use hookwarden_core::{HookwardenError, HookwardenResult};
use std::time::Duration;
use tracing::debug;

/// Appended to web text cut at the length limit.
pub const TRUNCATION_MARKER: &str = "\n[TRUNCATED]";

/// Retrieves a page body for the web pre-check.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetches `url` and returns the body as text.
    async fn fetch(&self, url: &str) -> HookwardenResult<String>;
}

/// [`PageFetcher`] over a `reqwest` client with a fixed timeout and user agent.
pub struct HttpPageFetcher {
    client: reqwest::Client,
}

impl HttpPageFetcher {
    /// Builds the HTTP client.
    pub fn new(timeout: Duration, user_agent: &str) -> HookwardenResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .map_err(|e| HookwardenError::Fetch(format!("client setup failed: {e}")))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl PageFetcher for HttpPageFetcher {
    async fn fetch(&self, url: &str) -> HookwardenResult<String> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| HookwardenError::Fetch(format!("request failed: {e}")))?;
        debug!(url = %url, status = response.status().as_u16(), "Fetched page");
        // Error pages are scanned too.
        let body = response
            .bytes()
            .await
            .map_err(|e| HookwardenError::Fetch(format!("body read failed: {e}")))?;
        Ok(String::from_utf8_lossy(&body).into_owned())
    }
}

/// Cuts `text` to at most `max_chars` characters, appending
/// [`TRUNCATION_MARKER`] when anything was dropped.
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}{TRUNCATION_MARKER}", &text[..cut]),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_truncate_chars() {
        assert_eq!(truncate_chars("abc", 3), "abc");
        assert_eq!(truncate_chars("abcd", 3), "abc\n[TRUNCATED]");
        assert_eq!(truncate_chars("ééé", 2), "éé\n[TRUNCATED]");
        assert_eq!(truncate_chars("", 0), "");
    }

    #[tokio::test]
    async fn test_fetch_sends_user_agent() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/page"))
            .and(header("user-agent", "test-agent"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<p>hi</p>"))
            .mount(&server)
            .await;

        let fetcher = HttpPageFetcher::new(Duration::from_secs(5), "test-agent").unwrap();
        let body = fetcher
            .fetch(&format!("{}/page", server.uri()))
            .await
            .unwrap();
        assert_eq!(body, "<p>hi</p>");
    }

    #[tokio::test]
    async fn test_fetch_reads_error_bodies() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404).set_body_string("missing"))
            .mount(&server)
            .await;

        let fetcher = HttpPageFetcher::new(Duration::from_secs(5), "ua").unwrap();
        assert_eq!(fetcher.fetch(&server.uri()).await.unwrap(), "missing");
    }

    #[tokio::test]
    async fn test_fetch_invalid_url_is_error() {
        let fetcher = HttpPageFetcher::new(Duration::from_secs(1), "ua").unwrap();
        let err = fetcher.fetch("not a url").await.unwrap_err();
        assert!(matches!(err, HookwardenError::Fetch(_)));
    }
}
