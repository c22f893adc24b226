//! Raw HTML vs rendered DOM comparison
//!
//! Refetches the page exactly as the server sends it and compares its
//! visible text with the rendered DOM's. This measures what the server
//! actually shipped instead of inferring it from markers.

use super::ContentComparison;
use crate::config::Thresholds;
use crate::page::{PageFetcher, PageSnapshot, SnapshotSource};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Outcome of a raw/rendered text comparison
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonResult {
    pub raw_length: usize,
    pub rendered_length: usize,
    pub content_ratio: f64,
    #[serde(rename = "isLikelyCSR")]
    pub is_likely_csr: bool,
    #[serde(rename = "isLikelySSR")]
    pub is_likely_ssr: bool,
}

impl ComparisonResult {
    /// Classify a pair of text lengths. The 0.2-0.7 band is left unflagged.
    pub fn from_lengths(raw_length: usize, rendered_length: usize, t: &Thresholds) -> Self {
        let content_ratio = raw_length as f64 / rendered_length.max(1) as f64;
        let is_likely_csr =
            content_ratio < t.csr_ratio && rendered_length > t.min_rendered_length;
        let is_likely_ssr = content_ratio > t.ssr_ratio;

        Self {
            raw_length,
            rendered_length,
            content_ratio,
            is_likely_csr,
            is_likely_ssr,
        }
    }
}

/// Fetches raw HTML over HTTP and compares it with the rendered text
pub struct ComparisonDetector {
    fetcher: PageFetcher,
}

impl ComparisonDetector {
    pub fn new(fetcher: PageFetcher) -> Self {
        Self { fetcher }
    }
}

#[async_trait]
impl ContentComparison for ComparisonDetector {
    async fn compare(
        &self,
        url: &str,
        rendered_length: usize,
        thresholds: &Thresholds,
    ) -> Option<ComparisonResult> {
        let raw_html = match self.fetcher.fetch_html(url).await {
            Ok((html, _)) => html,
            Err(e) => {
                debug!("Raw HTML comparison unavailable for {}: {}", url, e);
                return None;
            }
        };

        let raw_length = raw_text_length(url, &raw_html);
        let result = ComparisonResult::from_lengths(raw_length, rendered_length, thresholds);
        debug!(
            "Raw/rendered text for {}: {}/{} (ratio {:.2})",
            url, raw_length, rendered_length, result.content_ratio
        );
        Some(result)
    }
}

/// Visible text length of an unexecuted HTML document
fn raw_text_length(url: &str, html: &str) -> usize {
    PageSnapshot::from_html(url, html, SnapshotSource::Http).text_length()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FetchConfig;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn detector() -> ComparisonDetector {
        let config = FetchConfig {
            timeout_secs: 5,
            ..Default::default()
        };
        ComparisonDetector::new(PageFetcher::new(&config).unwrap())
    }

    #[test]
    fn test_ratio_bands() {
        let t = Thresholds::default();

        let csr = ComparisonResult::from_lengths(10, 1000, &t);
        assert!(csr.is_likely_csr);
        assert!(!csr.is_likely_ssr);
        assert_eq!(csr.content_ratio, 0.01);

        let ssr = ComparisonResult::from_lengths(950, 1000, &t);
        assert!(ssr.is_likely_ssr);
        assert!(!ssr.is_likely_csr);

        let ambiguous = ComparisonResult::from_lengths(400, 1000, &t);
        assert!(!ambiguous.is_likely_csr);
        assert!(!ambiguous.is_likely_ssr);
    }

    #[test]
    fn test_thresholds_are_strict() {
        let t = Thresholds::default();

        let at_csr_ratio = ComparisonResult::from_lengths(200, 1000, &t);
        assert_eq!(at_csr_ratio.content_ratio, 0.2);
        assert!(!at_csr_ratio.is_likely_csr);
        assert!(!at_csr_ratio.is_likely_ssr);

        let at_ssr_ratio = ComparisonResult::from_lengths(700, 1000, &t);
        assert_eq!(at_ssr_ratio.content_ratio, 0.7);
        assert!(!at_ssr_ratio.is_likely_csr);
        assert!(!at_ssr_ratio.is_likely_ssr);

        let at_min_length = ComparisonResult::from_lengths(10, 200, &t);
        assert!(!at_min_length.is_likely_csr);
        assert!(!at_min_length.is_likely_ssr);
    }

    #[test]
    fn test_small_rendered_page_is_not_csr() {
        let result = ComparisonResult::from_lengths(0, 150, &Thresholds::default());
        assert!(!result.is_likely_csr);
    }

    #[test]
    fn test_zero_rendered_length_does_not_divide_by_zero() {
        let result = ComparisonResult::from_lengths(0, 0, &Thresholds::default());
        assert_eq!(result.content_ratio, 0.0);
        assert!(!result.is_likely_csr);
        assert!(!result.is_likely_ssr);
    }

    #[test]
    fn test_serialized_field_names() {
        let json = serde_json::to_value(ComparisonResult::from_lengths(
            1,
            2,
            &Thresholds::default(),
        ))
        .unwrap();
        assert!(json.get("isLikelyCSR").is_some());
        assert!(json.get("isLikelySSR").is_some());
        assert!(json.get("contentRatio").is_some());
    }

    #[tokio::test]
    async fn test_empty_shell_against_rendered_content() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/app"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(
                "<html><body><div id=\"root\"></div><script src=\"/main.js\"></script></body></html>",
                "text/html",
            ))
            .mount(&server)
            .await;

        let result = detector()
            .compare(&format!("{}/app", server.uri()), 1200, &Thresholds::default())
            .await
            .expect("comparison should succeed");
        assert_eq!(result.raw_length, 0);
        assert!(result.is_likely_csr);
    }

    #[tokio::test]
    async fn test_http_error_yields_none() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;

        let result = detector()
            .compare(&server.uri(), 500, &Thresholds::default())
            .await;
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_unreachable_host_yields_none() {
        // Nothing listens on the discard port
        let result = detector()
            .compare("http://127.0.0.1:9/", 500, &Thresholds::default())
            .await;
        assert!(result.is_none());
    }
}
