//! Page fetcher trait and the reqwest-backed implementation.

use async_trait::async_trait;
use std::time::Duration;

use crate::error::FetchError;

use super::charset;
use super::throttle::HostThrottle;

pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (compatible; Ladle/0.1; recipe importer)";

/// Retrieves raw page content for a URL.
#[async_trait]
pub trait ContentFetcher: Send + Sync {
    /// Fetch the page at `url` and return its body decoded to UTF-8.
    ///
    /// Non-2xx responses are errors; the body of an error response is never returned.
    async fn fetch(&self, url: &str) -> Result<String, FetchError>;
}

/// Configuration for [`HttpFetcher`].
#[derive(Clone, Debug)]
pub struct HttpFetcherBuilder {
    timeout: Duration,
    user_agent: String,
    host_interval: Duration,
}

impl Default for HttpFetcherBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpFetcherBuilder {
    /// Create a builder from the process environment.
    ///
    /// Environment variables:
    /// - `LADLE_FETCH_TIMEOUT_SECS`: whole-request timeout (default 30)
    /// - `LADLE_FETCH_USER_AGENT`: User-Agent header
    /// - `LADLE_FETCH_HOST_INTERVAL_MS`: minimum gap between requests to one host (default 0)
    pub fn new() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Like [`HttpFetcherBuilder::new`], reading settings through `lookup`.
    /// Unparseable numbers fall back to the defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let timeout_secs = lookup("LADLE_FETCH_TIMEOUT_SECS")
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(DEFAULT_TIMEOUT_SECS);
        let host_interval_ms = lookup("LADLE_FETCH_HOST_INTERVAL_MS")
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(0);
        let user_agent = lookup("LADLE_FETCH_USER_AGENT")
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_USER_AGENT.to_string());

        Self {
            timeout: Duration::from_secs(timeout_secs),
            user_agent,
            host_interval: Duration::from_millis(host_interval_ms),
        }
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Minimum delay between requests to the same host. Zero disables throttling.
    pub fn host_interval(mut self, interval: Duration) -> Self {
        self.host_interval = interval;
        self
    }

    pub fn build(self) -> Result<HttpFetcher, reqwest::Error> {
        let inner = reqwest::Client::builder()
            .timeout(self.timeout)
            .user_agent(&self.user_agent)
            .build()?;

        Ok(HttpFetcher {
            inner,
            throttle: HostThrottle::new(self.host_interval),
        })
    }
}

/// Production fetcher: plain GET with a timeout, redirects followed, charset decoded.
pub struct HttpFetcher {
    inner: reqwest::Client,
    throttle: HostThrottle,
}

impl HttpFetcher {
    pub fn builder() -> HttpFetcherBuilder {
        HttpFetcherBuilder::new()
    }
}

#[async_trait]
impl ContentFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        let parsed = reqwest::Url::parse(url).map_err(|e| FetchError::InvalidUrl(e.to_string()))?;

        if let Some(host) = parsed.host_str() {
            self.throttle.wait(host).await;
        }

        tracing::debug!(url, "network: fetching");
        let response = self.inner.get(parsed).send().await?;

        let status = response.status();
        if !status.is_success() {
            tracing::debug!(url, status = %status, "network: request failed");
            return Err(FetchError::HttpStatus {
                status: status.as_u16(),
            });
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());

        let bytes = response.bytes().await?;
        tracing::debug!(url, status = %status, bytes = bytes.len(), "network: fetched");

        Ok(charset::decode_bytes_to_utf8(&bytes, content_type.as_deref()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn builder_defaults() {
        let builder = HttpFetcherBuilder::from_lookup(lookup(&[]));
        assert_eq!(builder.timeout, Duration::from_secs(DEFAULT_TIMEOUT_SECS));
        assert_eq!(builder.user_agent, DEFAULT_USER_AGENT);
        assert_eq!(builder.host_interval, Duration::ZERO);
    }

    #[test]
    fn builder_reads_settings() {
        let builder = HttpFetcherBuilder::from_lookup(lookup(&[
            ("LADLE_FETCH_TIMEOUT_SECS", "5"),
            ("LADLE_FETCH_USER_AGENT", "test-agent"),
            ("LADLE_FETCH_HOST_INTERVAL_MS", "250"),
        ]));
        assert_eq!(builder.timeout, Duration::from_secs(5));
        assert_eq!(builder.user_agent, "test-agent");
        assert_eq!(builder.host_interval, Duration::from_millis(250));
    }

    #[test]
    fn builder_ignores_garbage_numbers() {
        let builder =
            HttpFetcherBuilder::from_lookup(lookup(&[("LADLE_FETCH_TIMEOUT_SECS", "soon")]));
        assert_eq!(builder.timeout, Duration::from_secs(DEFAULT_TIMEOUT_SECS));
    }

    #[tokio::test]
    async fn invalid_url_is_rejected_before_any_request() {
        let fetcher = HttpFetcherBuilder::from_lookup(lookup(&[])).build().unwrap();
        let err = fetcher.fetch("not a url").await.unwrap_err();
        assert!(matches!(err, FetchError::InvalidUrl(_)));
    }
}
