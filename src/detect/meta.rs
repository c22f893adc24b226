//! SEO meta tags and structured data

use super::{Detector, DetectorResult, Signals};
use crate::config::DetectionConfig;
use crate::error::Result;
use crate::page::PageSnapshot;

const SSR_META_NAMES: [&str; 4] = ["next", "nuxt", "gatsby", "remix"];

/// Rich metadata is evidence of server rendering; its absence says nothing.
pub struct MetaDetector;

impl Detector for MetaDetector {
    fn name(&self) -> &'static str {
        "meta"
    }

    fn detect(&self, page: &PageSnapshot, config: &DetectionConfig) -> Result<DetectorResult> {
        let w = &config.weights;
        let min_len = config.thresholds.min_rich_meta_length;
        let mut signals = Signals::new();

        let mut has_ssr_meta = false;
        let mut has_rich_meta = false;
        let mut meta_count = 0usize;

        for meta in page.select_all("meta").unwrap_or_default() {
            meta_count += 1;
            let el = meta.value();
            let name = el
                .attr("name")
                .or_else(|| el.attr("property"))
                .unwrap_or("")
                .to_lowercase();
            let content = el.attr("content").unwrap_or("");
            let content_lower = content.to_lowercase();

            if SSR_META_NAMES.iter().any(|n| name.contains(n)) || content_lower.contains("next.js")
            {
                has_ssr_meta = true;
            }

            if (name.contains("description") || name.starts_with("og:") || name.starts_with("twitter:"))
                && content.chars().count() > min_len
            {
                has_rich_meta = true;
            }
        }

        if has_ssr_meta {
            signals.ssr(w.ssr_framework_meta, "SSR framework meta tags");
        }
        if has_rich_meta {
            signals.ssr(w.rich_meta, "Rich SEO meta tags");
        }

        let structured_data = page.count("script[type=\"application/ld+json\"]");
        if structured_data > 0 {
            signals.ssr(
                w.structured_data,
                format!("Structured data (JSON-LD x{})", structured_data),
            );
        }

        signals.detail("metaTags", meta_count);
        signals.detail("hasSSRMeta", has_ssr_meta);
        signals.detail("hasRichMeta", has_rich_meta);
        signals.detail("hasStructuredData", structured_data > 0);

        Ok(signals.finish())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::fixtures::page;

    fn detect(html: &str) -> DetectorResult {
        MetaDetector
            .detect(&page(html), &DetectionConfig::default())
            .unwrap()
    }

    #[test]
    fn test_no_meta_no_signal() {
        let result = detect("<html><head><title>x</title></head><body></body></html>");
        assert_eq!(result.ssr_score, 0.0);
        assert_eq!(result.csr_score, 0.0);
        assert!(result.indicators.is_empty());
    }

    #[test]
    fn test_rich_meta_and_json_ld() {
        let result = detect(
            r#"<html><head>
            <meta name="description" content="A long description of the page that is rich">
            <meta property="og:title" content="Short">
            <script type="application/ld+json">{"@type": "Article"}</script>
            </head><body></body></html>"#,
        );
        assert_eq!(result.ssr_score, 25.0);
        assert_eq!(result.details["hasRichMeta"], true);
        assert_eq!(result.details["hasSSRMeta"], false);
        assert_eq!(result.details["hasStructuredData"], true);
    }

    #[test]
    fn test_short_description_is_not_rich() {
        let result = detect(r#"<html><head><meta name="description" content="Too short"></head></html>"#);
        assert_eq!(result.details["hasRichMeta"], false);
    }

    #[test]
    fn test_framework_meta() {
        let result = detect(
            r#"<html><head><meta name="generator" content="Next.js"></head><body></body></html>"#,
        );
        assert_eq!(result.ssr_score, 20.0);
        assert_eq!(result.indicators, vec!["SSR framework meta tags"]);

        let result = detect(
            r#"<html><head><meta name="next-head-count" content="3"></head><body></body></html>"#,
        );
        assert_eq!(result.details["hasSSRMeta"], true);
    }
}
