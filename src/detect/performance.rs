//! Navigation and paint timing signals

use super::{Detector, DetectorResult, Signals};
use crate::config::DetectionConfig;
use crate::error::Result;
use crate::page::PageSnapshot;
use serde_json::Value;

/// Derives SSR/CSR evidence from DOM-ready and First Contentful Paint.
///
/// Fast DOM-ready alone is ambiguous; it only counts towards CSR combined
/// with a slow first paint, i.e. the server sent almost nothing and the
/// content arrived later through script.
pub struct PerformanceDetector;

impl Detector for PerformanceDetector {
    fn name(&self) -> &'static str {
        "performance"
    }

    fn detect(&self, page: &PageSnapshot, config: &DetectionConfig) -> Result<DetectorResult> {
        let w = &config.weights;
        let t = &config.thresholds;
        let mut signals = Signals::new();

        let timing = page.timing();
        let dom_ready = timing.dom_content_loaded.filter(|v| v.is_finite() && *v >= 0.0);
        let fcp = timing
            .first_contentful_paint
            .filter(|v| v.is_finite() && *v >= 0.0);

        let fast_dom = dom_ready.is_some_and(|d| d < t.fast_dom_ready_ms);
        let slow_dom = dom_ready.is_some_and(|d| d > t.slow_dom_ready_ms);
        let fast_fcp = fcp.is_some_and(|f| f < t.fast_fcp_ms);
        let slow_fcp = fcp.is_some_and(|f| f > t.slow_fcp_ms);

        if fast_dom && slow_fcp {
            signals.csr(
                w.fast_dom_slow_fcp,
                format!(
                    "Fast DOM ready ({:.0}ms) but slow first paint ({:.0}ms)",
                    dom_ready.unwrap_or_default(),
                    fcp.unwrap_or_default()
                ),
            );
        } else if fast_fcp {
            signals.ssr(
                w.fast_fcp,
                format!("Fast first contentful paint ({:.0}ms)", fcp.unwrap_or_default()),
            );
        }

        if slow_dom && fast_fcp {
            signals.ssr(
                w.slow_dom_fast_fcp,
                "Slow DOM processing with prompt first paint",
            );
        }

        signals.detail("domContentLoaded", rounded(dom_ready));
        signals.detail("firstContentfulPaint", rounded(fcp));

        Ok(signals.finish())
    }
}

fn rounded(value: Option<f64>) -> Value {
    value.map(|v| Value::from(v.round() as i64)).unwrap_or(Value::Null)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::fixtures::page;
    use crate::page::PageTiming;

    fn detect(dom: Option<f64>, fcp: Option<f64>) -> DetectorResult {
        let snapshot = page("<p>x</p>").with_timing(PageTiming {
            dom_content_loaded: dom,
            first_contentful_paint: fcp,
            ..Default::default()
        });
        PerformanceDetector
            .detect(&snapshot, &DetectionConfig::default())
            .unwrap()
    }

    #[test]
    fn test_fast_dom_slow_fcp_is_csr() {
        let result = detect(Some(12.0), Some(1500.0));
        assert_eq!(result.csr_score, 30.0);
        assert_eq!(result.ssr_score, 0.0);
        assert_eq!(result.details["domContentLoaded"], 12);
        assert_eq!(result.details["firstContentfulPaint"], 1500);
    }

    #[test]
    fn test_fast_fcp_is_ssr() {
        let result = detect(Some(100.0), Some(420.0));
        assert_eq!(result.ssr_score, 15.0);
        assert_eq!(result.csr_score, 0.0);
    }

    #[test]
    fn test_fast_dom_alone_is_not_csr() {
        let result = detect(Some(5.0), Some(900.0));
        assert_eq!(result.ssr_score, 0.0);
        assert_eq!(result.csr_score, 0.0);
        assert!(result.indicators.is_empty());
    }

    #[test]
    fn test_slow_dom_fast_fcp_bonus() {
        let result = detect(Some(750.0), Some(300.0));
        assert_eq!(result.ssr_score, 20.0);
        assert_eq!(result.indicators.len(), 2);
    }

    #[test]
    fn test_missing_timings() {
        let result = detect(None, None);
        assert!(result.indicators.is_empty());
        assert!(result.details["domContentLoaded"].is_null());
        assert!(result.details["firstContentfulPaint"].is_null());

        let result = detect(None, Some(500.0));
        assert_eq!(result.ssr_score, 15.0);
    }
}
