//! Analysis orchestrator
//!
//! Runs the registered detectors against one snapshot, merges their
//! evidence and classifies the result. Invocation order is fixed:
//! 1. synchronous detectors, in registration order
//! 2. hybrid detector
//! 3. raw/rendered comparison, if installed
//! 4. Core Web Vitals, if installed, bounded by a timeout
//! 5. page type and device info, if telemetry collectors are installed
//!
//! Details are merged in that order, so a later detector overwrites an
//! earlier detector's key.

use crate::config::{Config, DetectionConfig};
use crate::detect::Detectors;
use crate::error::{Error, Result};
use crate::models::AnalysisResult;
use crate::page::PageSnapshot;
use crate::scoring::classify;
use crate::telemetry::{CoreWebVitals, VitalsCollector};
use chrono::Utc;
use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, warn};

/// Default bound on Core Web Vitals collection
pub const DEFAULT_VITALS_TIMEOUT: Duration = Duration::from_millis(500);

pub struct Analyzer {
    config: Arc<DetectionConfig>,
    detectors: Detectors,
    vitals_timeout: Duration,
}

impl Analyzer {
    pub fn new(config: Arc<DetectionConfig>, detectors: Detectors) -> Self {
        Self {
            config,
            detectors,
            vitals_timeout: DEFAULT_VITALS_TIMEOUT,
        }
    }

    /// Analyzer using the detection settings and vitals timeout of `config`
    pub fn from_config(config: &Config, detectors: Detectors) -> Self {
        Self::new(Arc::new(config.detection.clone()), detectors)
            .with_vitals_timeout(Duration::from_millis(config.telemetry.vitals_timeout_ms))
    }

    pub fn with_vitals_timeout(mut self, vitals_timeout: Duration) -> Self {
        self.vitals_timeout = vitals_timeout;
        self
    }

    pub fn config(&self) -> &DetectionConfig {
        &self.config
    }

    /// Classify one page. Never fails: a detector error becomes an
    /// "Analysis Error" result carrying the message.
    pub async fn analyze(&self, page: &PageSnapshot) -> AnalysisResult {
        match self.run(page).await {
            Ok(result) => result,
            Err(e) => {
                warn!("Analysis of {} failed: {}", page.url(), e);
                AnalysisResult::error(page.url(), e.to_string())
            }
        }
    }

    async fn run(&self, page: &PageSnapshot) -> Result<AnalysisResult> {
        let weights = &self.config.weights;
        let mut ssr_score = 0.0;
        let mut csr_score = 0.0;
        let mut indicators = Vec::new();
        let mut details = Map::new();

        for detector in &self.detectors.signals {
            let result = detector
                .detect(page, &self.config)
                .map_err(|e| Error::Detection(format!("{} detector: {}", detector.name(), e)))?;
            debug!(
                "{}: ssr +{}, csr +{}, {} indicators",
                detector.name(),
                result.ssr_score,
                result.csr_score,
                result.indicators.len()
            );
            ssr_score += result.ssr_score;
            csr_score += result.csr_score;
            indicators.extend(result.indicators);
            details.extend(result.details);
        }

        let hybrid = self
            .detectors
            .hybrid
            .detect(page, &self.config)
            .map_err(|e| Error::Detection(format!("hybrid detector: {}", e)))?;
        debug!("hybrid: +{}", hybrid.hybrid_score);
        indicators.extend(hybrid.indicators);
        details.extend(hybrid.details);

        if let Some(comparison) = &self.detectors.comparison {
            let rendered_length = page.text_length();
            if let Some(result) = comparison
                .compare(page.url(), rendered_length, &self.config.thresholds)
                .await
            {
                let percent = result.content_ratio * 100.0;
                if result.is_likely_csr {
                    csr_score += weights.raw_vs_rendered_csr;
                    indicators.push(format!(
                        "Server HTML carries only {:.0}% of the rendered text",
                        percent
                    ));
                } else if result.is_likely_ssr {
                    ssr_score += weights.raw_vs_rendered_ssr;
                    indicators.push(format!(
                        "Server HTML already carries {:.0}% of the rendered text",
                        percent
                    ));
                }
                details.insert("contentComparison".to_string(), serde_json::to_value(&result)?);
            }
        }

        let core_web_vitals = match &self.detectors.vitals {
            Some(collector) => self.collect_vitals(collector.as_ref(), page).await,
            None => None,
        };

        let (page_type, device_info) = match &self.detectors.telemetry {
            Some(telemetry) => (
                Some(telemetry.page_type(page)),
                Some(telemetry.device_info(page)),
            ),
            None => (None, None),
        };

        let classification = classify(ssr_score, csr_score, hybrid.hybrid_score, &indicators);
        debug!(
            "{}: ssr {} / csr {} / hybrid {} -> {} ({}%)",
            page.url(),
            ssr_score,
            csr_score,
            hybrid.hybrid_score,
            classification.render_type,
            classification.confidence
        );

        let mut detailed_info = Map::new();
        detailed_info.insert("ssrScore".to_string(), Value::from(ssr_score));
        detailed_info.insert("csrScore".to_string(), Value::from(csr_score));
        detailed_info.insert(
            "ssrPercentage".to_string(),
            Value::from(classification.ssr_percentage),
        );
        detailed_info.insert("hybridScore".to_string(), Value::from(hybrid.hybrid_score));
        detailed_info.insert(
            "totalIndicators".to_string(),
            Value::from(classification.indicator_count),
        );
        detailed_info.extend(details);

        Ok(AnalysisResult {
            url: page.url().to_string(),
            timestamp: Utc::now(),
            render_type: classification.render_type,
            confidence: classification.confidence,
            indicators,
            core_web_vitals,
            page_type,
            device_info,
            detailed_info,
        })
    }

    /// Race the collector against the timeout; on timeout, disconnect it
    async fn collect_vitals(
        &self,
        collector: &dyn VitalsCollector,
        page: &PageSnapshot,
    ) -> Option<CoreWebVitals> {
        match timeout(
            self.vitals_timeout,
            collector.collect(page.vitals(), page.timing()),
        )
        .await
        {
            Ok(vitals) => vitals,
            Err(_) => {
                debug!(
                    "Core Web Vitals not reported within {:?}",
                    self.vitals_timeout
                );
                collector.disconnect().await;
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Thresholds;
    use crate::detect::fixtures::{page, rich_article};
    use crate::detect::{
        ComparisonResult, ContentComparison, Detector, DetectorResult, HybridDetection,
        HybridResult, Signals,
    };
    use crate::page::{PageTiming, VitalsSample};
    use crate::scoring::RenderType;
    use crate::telemetry::{SnapshotVitals, TelemetryCollectors};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, Ordering};

    fn analyzer(detectors: Detectors) -> Analyzer {
        Analyzer::new(Arc::new(DetectionConfig::default()), detectors)
    }

    struct Fixed {
        name: &'static str,
        ssr: f64,
        csr: f64,
        detail: (&'static str, i64),
    }

    impl Detector for Fixed {
        fn name(&self) -> &'static str {
            self.name
        }

        fn detect(&self, _: &PageSnapshot, _: &DetectionConfig) -> Result<DetectorResult> {
            let mut signals = Signals::new();
            if self.ssr > 0.0 {
                signals.ssr(self.ssr, format!("{} ssr", self.name));
            }
            if self.csr > 0.0 {
                signals.csr(self.csr, format!("{} csr", self.name));
            }
            signals.detail(self.detail.0, self.detail.1);
            Ok(signals.finish())
        }
    }

    struct Failing;

    impl Detector for Failing {
        fn name(&self) -> &'static str {
            "failing"
        }

        fn detect(&self, _: &PageSnapshot, _: &DetectionConfig) -> Result<DetectorResult> {
            Err(Error::Other("selector engine exploded".to_string()))
        }
    }

    struct NoHybrid;

    impl HybridDetection for NoHybrid {
        fn detect(&self, _: &PageSnapshot, _: &DetectionConfig) -> Result<HybridResult> {
            Ok(HybridResult::default())
        }
    }

    struct CannedComparison(Option<(usize, usize)>);

    #[async_trait]
    impl ContentComparison for CannedComparison {
        async fn compare(
            &self,
            _url: &str,
            _rendered_length: usize,
            thresholds: &Thresholds,
        ) -> Option<ComparisonResult> {
            self.0
                .map(|(raw, rendered)| ComparisonResult::from_lengths(raw, rendered, thresholds))
        }
    }

    struct StalledVitals {
        disconnected: Arc<AtomicBool>,
    }

    #[async_trait]
    impl VitalsCollector for StalledVitals {
        async fn collect(&self, _: &VitalsSample, _: &PageTiming) -> Option<CoreWebVitals> {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Some(CoreWebVitals::default())
        }

        async fn disconnect(&self) {
            self.disconnected.store(true, Ordering::SeqCst);
        }
    }

    fn fixed_set(detectors: Vec<Box<dyn Detector>>) -> Detectors {
        Detectors {
            signals: detectors,
            hybrid: Box::new(NoHybrid),
            comparison: None,
            vitals: None,
            telemetry: None,
        }
    }

    #[tokio::test]
    async fn test_detector_error_becomes_analysis_error() {
        let detectors = fixed_set(vec![
            Box::new(Fixed {
                name: "first",
                ssr: 50.0,
                csr: 0.0,
                detail: ("a", 1),
            }),
            Box::new(Failing),
        ]);
        let result = analyzer(detectors).analyze(&page(rich_article())).await;

        assert_eq!(result.render_type, RenderType::Error);
        assert_eq!(result.confidence, 0);
        assert_eq!(result.indicators.len(), 1);
        assert!(result.indicators[0].contains("selector engine exploded"));
        assert!(result.indicators[0].contains("failing"));
        assert_eq!(
            result.detailed_info["error"].as_str(),
            Some(result.indicators[0].as_str())
        );
    }

    #[tokio::test]
    async fn test_scores_sum_and_details_merge_last_writer_wins() {
        let detectors = fixed_set(vec![
            Box::new(Fixed {
                name: "one",
                ssr: 20.0,
                csr: 5.0,
                detail: ("shared", 1),
            }),
            Box::new(Fixed {
                name: "two",
                ssr: 0.0,
                csr: 15.0,
                detail: ("shared", 2),
            }),
        ]);
        let result = analyzer(detectors).analyze(&page("<p>x</p>")).await;

        assert_eq!(result.detail_f64("ssrScore"), Some(20.0));
        assert_eq!(result.detail_f64("csrScore"), Some(20.0));
        assert_eq!(result.detailed_info["shared"], 2);
        assert_eq!(result.detailed_info["totalIndicators"], 3);
        assert_eq!(result.indicators, vec!["one ssr", "one csr", "two csr"]);
    }

    #[tokio::test]
    async fn test_duplicate_indicators_are_kept() {
        let twin = || Fixed {
            name: "twin",
            ssr: 10.0,
            csr: 0.0,
            detail: ("k", 0),
        };
        let detectors = fixed_set(vec![Box::new(twin()), Box::new(twin())]);
        let result = analyzer(detectors).analyze(&page("<p>x</p>")).await;
        assert_eq!(result.indicators, vec!["twin ssr", "twin ssr"]);
    }

    #[tokio::test]
    async fn test_standard_totals_equal_detector_sum() {
        let snapshot = page(rich_article());
        let config = DetectionConfig::default();
        let detectors = Detectors::standard();

        let (mut ssr, mut csr) = (0.0, 0.0);
        for d in &detectors.signals {
            let r = d.detect(&snapshot, &config).unwrap();
            ssr += r.ssr_score;
            csr += r.csr_score;
        }

        let result = analyzer(detectors).analyze(&snapshot).await;
        assert_eq!(result.detail_f64("ssrScore"), Some(ssr));
        assert_eq!(result.detail_f64("csrScore"), Some(csr));
        assert!(result.detailed_info.get("contentComparison").is_none());
    }

    #[tokio::test]
    async fn test_failed_comparison_adds_nothing() {
        let snapshot = page(rich_article());
        let baseline = analyzer(Detectors::standard()).analyze(&snapshot).await;
        let result = analyzer(Detectors::standard().with_comparison(CannedComparison(None)))
            .analyze(&snapshot)
            .await;

        assert_ne!(result.render_type, RenderType::Error);
        assert!(result.detailed_info.get("contentComparison").is_none());
        assert_eq!(result.detailed_info["ssrScore"], baseline.detailed_info["ssrScore"]);
        assert_eq!(result.detailed_info["csrScore"], baseline.detailed_info["csrScore"]);
    }

    #[tokio::test]
    async fn test_comparison_csr_evidence() {
        let detectors = fixed_set(vec![]).with_comparison(CannedComparison(Some((0, 1500))));
        let result = analyzer(detectors).analyze(&page("<p>x</p>")).await;

        assert_eq!(result.detail_f64("csrScore"), Some(40.0));
        assert_eq!(
            result.detailed_info["contentComparison"]["isLikelyCSR"],
            true
        );
        assert_eq!(result.render_type, RenderType::Csr);
    }

    #[tokio::test]
    async fn test_comparison_ssr_evidence() {
        let detectors = fixed_set(vec![]).with_comparison(CannedComparison(Some((900, 1000))));
        let result = analyzer(detectors).analyze(&page("<p>x</p>")).await;
        assert_eq!(result.detail_f64("ssrScore"), Some(40.0));
        assert_eq!(result.render_type, RenderType::Ssr);
    }

    #[tokio::test]
    async fn test_vitals_timeout_disconnects() {
        let disconnected = Arc::new(AtomicBool::new(false));
        let detectors = Detectors::standard().with_vitals(StalledVitals {
            disconnected: disconnected.clone(),
        });
        let result = analyzer(detectors)
            .with_vitals_timeout(Duration::from_millis(20))
            .analyze(&page(rich_article()))
            .await;

        assert!(result.core_web_vitals.is_none());
        assert!(disconnected.load(Ordering::SeqCst));
        assert_ne!(result.render_type, RenderType::Error);
    }

    #[tokio::test]
    async fn test_vitals_from_snapshot() {
        let snapshot = page(rich_article()).with_vitals(VitalsSample {
            largest_contentful_paint: Some(1800.0),
            ..Default::default()
        });
        let result = analyzer(Detectors::standard().with_vitals(SnapshotVitals))
            .analyze(&snapshot)
            .await;
        assert_eq!(result.core_web_vitals.and_then(|v| v.lcp), Some(1800.0));
    }

    #[tokio::test]
    async fn test_telemetry_fields_only_when_installed() {
        let snapshot = page(rich_article());

        let without = analyzer(Detectors::standard()).analyze(&snapshot).await;
        assert!(without.page_type.is_none());
        assert!(without.device_info.is_none());

        let collectors = TelemetryCollectors::new("renderlens-test", Default::default());
        let with = analyzer(Detectors::standard().with_telemetry(collectors))
            .analyze(&snapshot)
            .await;
        assert!(with.page_type.is_some());
        assert_eq!(
            with.device_info.map(|d| d.user_agent).as_deref(),
            Some("renderlens-test")
        );
        assert_eq!(with.render_type, without.render_type);
        assert_eq!(with.confidence, without.confidence);
    }

    #[test]
    fn test_analysis_is_idempotent() {
        let snapshot = page(rich_article());
        let analyzer = analyzer(Detectors::standard());

        let first = tokio_test::block_on(analyzer.analyze(&snapshot));
        let second = tokio_test::block_on(analyzer.analyze(&snapshot));
        assert_eq!(first.render_type, second.render_type);
        assert_eq!(first.confidence, second.confidence);
        assert_eq!(first.indicators, second.indicators);
        assert_eq!(first.detailed_info, second.detailed_info);
    }

    #[tokio::test]
    async fn test_empty_spa_shell_leans_csr() {
        let result = analyzer(Detectors::standard())
            .analyze(&page("<html><body><div id=\"root\"></div></body></html>"))
            .await;

        assert_eq!(result.render_type, RenderType::Csr);
        assert!(result.indicators.iter().any(|i| i.contains("Minimal content")));
        assert_eq!(result.detailed_info["spaRoot"], false);
        assert_eq!(result.detail_f64("csrScore"), Some(30.0));
    }

    #[tokio::test]
    async fn test_hugo_site_is_ssr() {
        let html = r#"<!DOCTYPE html><html><head>
            <meta name="generator" content="Hugo 0.121.1">
            <title>Notes</title></head>
            <body><p>A short note about static sites and why they load quickly.</p></body></html>"#;
        let result = analyzer(Detectors::standard()).analyze(&page(html)).await;

        assert!(matches!(
            result.render_type,
            RenderType::Ssr | RenderType::LikelySsr
        ));
        assert_eq!(result.detailed_info["staticGenerator"], "Hugo");
        assert!(result.detail_f64("ssrScore").unwrap_or_default() >= 40.0);
    }

    #[tokio::test]
    async fn test_from_config_uses_vitals_timeout() {
        let mut config = Config::default();
        config.telemetry.vitals_timeout_ms = 1234;
        let analyzer = Analyzer::from_config(&config, Detectors::standard());
        assert_eq!(analyzer.vitals_timeout, Duration::from_millis(1234));
    }
}
