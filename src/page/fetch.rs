//! Plain HTTP page acquisition

use super::{PageSnapshot, PageTiming, SnapshotSource};
use crate::config::FetchConfig;
use crate::error::{Error, Result};
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::Client;
use std::time::{Duration, Instant};
use tracing::debug;

/// HTTP fetcher shared by snapshot acquisition and raw-HTML comparison
#[derive(Debug, Clone)]
pub struct PageFetcher {
    client: Client,
}

impl PageFetcher {
    /// Create a fetcher with the configured user agent and timeout
    pub fn new(config: &FetchConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(Duration::from_secs(config.timeout_secs))
            .gzip(true)
            .brotli(true)
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()
            .map_err(|e| Error::Fetch(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client })
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    /// GET `url` as HTML, returning the body and the time to response headers
    pub async fn fetch_html(&self, url: &str) -> Result<(String, Duration)> {
        let start = Instant::now();
        let response = self
            .client
            .get(url)
            .header(ACCEPT, "text/html,application/xhtml+xml")
            .send()
            .await?;
        let ttfb = start.elapsed();

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Fetch(format!("HTTP {}: {}", status, url)));
        }

        if let Some(ct) = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
        {
            let ct = ct.to_lowercase();
            if !ct.contains("html") && !ct.contains("text/plain") {
                return Err(Error::Fetch(format!(
                    "Unexpected content type {} for {}",
                    ct, url
                )));
            }
        }

        let body = response.text().await?;
        debug!("Fetched {} ({} bytes, ttfb {:?})", url, body.len(), ttfb);
        Ok((body, ttfb))
    }

    /// Snapshot of the page as the server sent it; no script runs, so the
    /// rendered DOM is the raw HTML and paint timings are unknown.
    pub async fn snapshot(&self, url: &str) -> Result<PageSnapshot> {
        let (html, ttfb) = self.fetch_html(url).await?;
        let timing = PageTiming {
            time_to_first_byte: Some(ttfb.as_secs_f64() * 1000.0),
            ..Default::default()
        };
        Ok(PageSnapshot::from_html(url, &html, SnapshotSource::Http).with_timing(timing))
    }
}
