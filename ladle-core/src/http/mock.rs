use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use crate::error::FetchError;

use super::client::ContentFetcher;

/// Canned outcome for one URL.
#[derive(Clone, Debug)]
pub enum MockResponse {
    Html(String),
    Status(u16),
    NetworkError(String),
}

/// In-memory fetcher for tests. Counts every call, including failing ones.
#[derive(Default)]
pub struct MockFetcher {
    responses: HashMap<String, MockResponse>,
    delay: Option<Duration>,
    calls: AtomicUsize,
}

impl MockFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_response(mut self, url: &str, response: MockResponse) -> Self {
        self.responses.insert(url.to_string(), response);
        self
    }

    pub fn with_html(self, url: &str, html: &str) -> Self {
        self.with_response(url, MockResponse::Html(html.to_string()))
    }

    pub fn with_status(self, url: &str, status: u16) -> Self {
        self.with_response(url, MockResponse::Status(status))
    }

    pub fn with_network_error(self, url: &str, message: &str) -> Self {
        self.with_response(url, MockResponse::NetworkError(message.to_string()))
    }

    /// Sleep this long inside every fetch, to widen race windows in tests.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ContentFetcher for MockFetcher {
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        match self.responses.get(url) {
            Some(MockResponse::Html(html)) => Ok(html.clone()),
            Some(MockResponse::Status(status)) => Err(FetchError::HttpStatus { status: *status }),
            Some(MockResponse::NetworkError(message)) => Err(FetchError::Network(message.clone())),
            None => Err(FetchError::Network(format!(
                "No mock response for URL: {}",
                url
            ))),
        }
    }
}
