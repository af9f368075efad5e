//! Outgoing HTTP for page retrieval.
//!
//! Every page fetch goes through a [`ContentFetcher`] so the pipeline can be driven
//! by [`MockFetcher`] in tests and by [`HttpFetcher`] in production.

pub(crate) mod charset;
mod client;
mod mock;
mod throttle;

pub use client::{ContentFetcher, HttpFetcher, HttpFetcherBuilder};
pub use mock::{MockFetcher, MockResponse};

use url::Url;

/// Parse `raw` as an absolute http(s) URL with a host.
///
/// The caller keeps using its original string; the parsed value is only for inspection.
pub fn parse_http_url(raw: &str) -> Result<Url, String> {
    let parsed = Url::parse(raw.trim()).map_err(|e| format!("{raw:?} is not a valid URL: {e}"))?;
    match parsed.scheme() {
        "http" | "https" => {}
        other => return Err(format!("unsupported URL scheme {other:?}")),
    }
    if parsed.host_str().map_or(true, str::is_empty) {
        return Err(format!("{raw:?} has no host"));
    }
    Ok(parsed)
}
