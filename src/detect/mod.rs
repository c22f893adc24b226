//! Rendering-strategy signal detectors
//!
//! Each detector reads a [`PageSnapshot`] and the shared
//! [`DetectionConfig`] and reports how strongly the page looks server- or
//! client-rendered:
//! - content structure ([`ContentDetector`])
//! - framework markers ([`FrameworkDetector`])
//! - meta/SEO tags ([`MetaDetector`])
//! - navigation/paint timing ([`PerformanceDetector`])
//! - SPA shell patterns ([`CsrPatternDetector`])
//! - islands/partial hydration ([`HybridDetector`], separate hybrid score)
//! - raw HTML vs rendered DOM ([`ComparisonDetector`], async, network)

mod comparison;
mod content;
mod csr_pattern;
mod framework;
mod hybrid;
mod meta;
mod performance;

pub use comparison::*;
pub use content::*;
pub use csr_pattern::*;
pub use framework::*;
pub use hybrid::*;
pub use meta::*;
pub use performance::*;

use crate::config::{DetectionConfig, Thresholds};
use crate::error::Result;
use crate::page::PageSnapshot;
use crate::telemetry::{TelemetryCollectors, VitalsCollector};
use async_trait::async_trait;
use serde::Serialize;
use serde_json::{Map, Value};

/// Scores and evidence from one detector
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectorResult {
    pub ssr_score: f64,
    pub csr_score: f64,
    pub indicators: Vec<String>,
    pub details: Map<String, Value>,
}

/// Hybrid score and evidence; applied as an override, never summed into
/// the SSR/CSR totals
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HybridResult {
    pub hybrid_score: f64,
    pub indicators: Vec<String>,
    pub details: Map<String, Value>,
}

/// Accumulates one detector's signals before freezing them into a result
#[derive(Debug, Default)]
pub struct Signals {
    ssr: f64,
    csr: f64,
    indicators: Vec<String>,
    details: Map<String, Value>,
}

impl Signals {
    pub fn new() -> Self {
        Self::default()
    }

    /// Evidence for server rendering
    pub fn ssr(&mut self, weight: f64, indicator: impl Into<String>) {
        self.ssr += weight;
        self.indicators.push(indicator.into());
    }

    /// Evidence for client rendering
    pub fn csr(&mut self, weight: f64, indicator: impl Into<String>) {
        self.csr += weight;
        self.indicators.push(indicator.into());
    }

    pub fn detail(&mut self, key: &str, value: impl Into<Value>) {
        self.details.insert(key.to_string(), value.into());
    }

    pub fn finish(self) -> DetectorResult {
        DetectorResult {
            ssr_score: self.ssr,
            csr_score: self.csr,
            indicators: self.indicators,
            details: self.details,
        }
    }
}

/// A synchronous SSR/CSR signal detector
pub trait Detector: Send + Sync {
    /// Short identifier used in logs
    fn name(&self) -> &'static str;

    fn detect(&self, page: &PageSnapshot, config: &DetectionConfig) -> Result<DetectorResult>;
}

/// Produces the hybrid score
pub trait HybridDetection: Send + Sync {
    fn detect(&self, page: &PageSnapshot, config: &DetectionConfig) -> Result<HybridResult>;
}

/// Compares the server's raw HTML against the rendered DOM.
///
/// Returns `None` whenever the raw HTML cannot be obtained; callers treat
/// that as absence of evidence.
#[async_trait]
pub trait ContentComparison: Send + Sync {
    async fn compare(
        &self,
        url: &str,
        rendered_length: usize,
        thresholds: &Thresholds,
    ) -> Option<ComparisonResult>;
}

/// The detector set an analyzer runs, in invocation order.
///
/// Optional capabilities are `None` when unavailable rather than probed for
/// at run time.
pub struct Detectors {
    pub signals: Vec<Box<dyn Detector>>,
    pub hybrid: Box<dyn HybridDetection>,
    pub comparison: Option<Box<dyn ContentComparison>>,
    pub vitals: Option<Box<dyn VitalsCollector>>,
    pub telemetry: Option<TelemetryCollectors>,
}

impl Detectors {
    /// The five synchronous detectors plus the hybrid detector, no optional
    /// capabilities
    pub fn standard() -> Self {
        Self {
            signals: vec![
                Box::new(ContentDetector),
                Box::new(FrameworkDetector),
                Box::new(MetaDetector),
                Box::new(PerformanceDetector),
                Box::new(CsrPatternDetector),
            ],
            hybrid: Box::new(HybridDetector),
            comparison: None,
            vitals: None,
            telemetry: None,
        }
    }

    pub fn with_comparison(mut self, comparison: impl ContentComparison + 'static) -> Self {
        self.comparison = Some(Box::new(comparison));
        self
    }

    pub fn with_vitals(mut self, vitals: impl VitalsCollector + 'static) -> Self {
        self.vitals = Some(Box::new(vitals));
        self
    }

    pub fn with_telemetry(mut self, telemetry: TelemetryCollectors) -> Self {
        self.telemetry = Some(telemetry);
        self
    }
}

impl Default for Detectors {
    fn default() -> Self {
        Self::standard()
    }
}

/// Round to two decimals for display
pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
pub(crate) mod fixtures {
    use crate::page::{PageSnapshot, SnapshotSource};

    pub fn page(html: &str) -> PageSnapshot {
        PageSnapshot::from_html("https://example.com/", html, SnapshotSource::File)
    }

    /// A server-rendered article with enough structure to count as rich
    pub fn rich_article() -> &'static str {
        r#"<!DOCTYPE html>
        <html lang="en">
        <head><title>Guide</title></head>
        <body>
          <header><nav><a href="/">Home</a><a href="/docs">Docs</a></nav></header>
          <main>
            <article>
              <h1>Getting started with the toolkit</h1>
              <p>This guide walks through installation, configuration and the first
              project. Every step is explained with examples you can copy.</p>
              <h2>Installation</h2>
              <p>Install the package with your favourite package manager, then verify
              the installation by running the version command in a terminal.</p>
              <h2>Configuration</h2>
              <p>The configuration file supports several formats. Pick the one that
              matches the rest of your project and keep it under version control.</p>
            </article>
          </main>
          <aside><p>Related reading</p></aside>
          <footer><p>Copyright</p></footer>
        </body>
        </html>"#
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signals_accumulate_in_order() {
        let mut signals = Signals::new();
        signals.ssr(10.0, "a");
        signals.csr(5.0, "b");
        signals.ssr(2.5, "c");
        signals.detail("k", 1);
        let result = signals.finish();

        assert_eq!(result.ssr_score, 12.5);
        assert_eq!(result.csr_score, 5.0);
        assert_eq!(result.indicators, vec!["a", "b", "c"]);
        assert_eq!(result.details["k"], 1);
    }

    #[test]
    fn test_standard_detectors_order() {
        let detectors = Detectors::standard();
        let names: Vec<_> = detectors.signals.iter().map(|d| d.name()).collect();
        assert_eq!(
            names,
            vec!["content", "framework", "meta", "performance", "csrPatterns"]
        );
        assert!(detectors.comparison.is_none());
        assert!(detectors.vitals.is_none());
    }

    #[test]
    fn test_round2() {
        assert_eq!(round2(0.14285), 0.14);
        assert_eq!(round2(0.125), 0.13);
    }
}
