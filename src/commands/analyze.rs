//! Analyze command implementation

use crate::analyzer::Analyzer;
use crate::config::Config;
use crate::detect::{ComparisonDetector, ComparisonResult, Detectors};
use crate::error::{Error, Result};
use crate::models::AnalysisResult;
use crate::page::{HeadlessRenderer, PageFetcher, PageSnapshot, RendererConfig, SnapshotSource};
use crate::progress::spinner;
use crate::telemetry::{
    SnapshotVitals, TelemetryClient, TelemetryCollectors, TelemetryPayload, TelemetryReport,
};
use serde::Serialize;
use std::path::PathBuf;
use tracing::{info, warn};
use url::Url;

#[derive(Debug, Clone, Default)]
pub struct AnalyzeOptions {
    pub url: String,
    /// Rendered DOM saved from a browser, analyzed in place of a live page
    pub rendered_html: Option<PathBuf>,
    /// Render the page in headless Chrome
    pub render: bool,
    /// Refetch the raw HTML and compare it with the rendered DOM
    pub compare: bool,
    /// Collect the telemetry suite regardless of config
    pub telemetry: bool,
    /// POST the telemetry payload to the configured endpoint
    pub submit: bool,
}

/// What `analyze` prints
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisReport {
    #[serde(flatten)]
    pub analysis: AnalysisResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub telemetry: Option<TelemetryReport>,
    pub source: SnapshotSource,
    pub submitted: bool,
}

/// Acquire a snapshot of the page, classify it and optionally submit
/// telemetry
pub async fn cmd_analyze(config: &Config, options: AnalyzeOptions) -> Result<AnalysisReport> {
    let url = Url::parse(&options.url)?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(Error::Fetch(format!(
            "Only http and https URLs can be analyzed: {}",
            url
        )));
    }

    let telemetry_enabled = options.telemetry || config.telemetry.enabled;
    if options.submit && !telemetry_enabled {
        return Err(Error::Config(
            "Submitting requires telemetry; pass --telemetry or set telemetry.enabled = true"
                .to_string(),
        ));
    }
    let endpoint = if options.submit {
        let endpoint = config.telemetry.endpoint.clone().ok_or_else(|| {
            Error::Config("No telemetry endpoint configured ([telemetry] endpoint)".to_string())
        })?;
        Some(endpoint)
    } else {
        None
    };

    let fetcher = PageFetcher::new(&config.fetch)?;
    let progress = spinner(format!("Loading {}", url));
    let snapshot = acquire(config, &options, &fetcher, url.as_str()).await;
    let snapshot = match snapshot {
        Ok(s) => s,
        Err(e) => {
            progress.finish_and_clear();
            return Err(e);
        }
    };
    info!(
        "Snapshot of {} ({:?}, {} chars of text)",
        snapshot.url(),
        snapshot.source(),
        snapshot.text_length()
    );

    let mut detectors = Detectors::standard();
    // A plain fetch is already the raw HTML; comparing it with itself proves nothing
    let compare = options.compare
        && config.fetch.compare_raw_html
        && snapshot.source() != SnapshotSource::Http;
    if compare {
        detectors = detectors.with_comparison(ComparisonDetector::new(fetcher.clone()));
    }

    let collectors = telemetry_enabled.then(|| {
        TelemetryCollectors::new(
            config.fetch.user_agent.clone(),
            config.detection.signatures.clone(),
        )
    });
    if let Some(collectors) = &collectors {
        detectors = detectors
            .with_vitals(SnapshotVitals)
            .with_telemetry(collectors.clone());
    }

    progress.set_message(format!("Analyzing {}", snapshot.url()));
    let analysis = Analyzer::from_config(config, detectors)
        .analyze(&snapshot)
        .await;
    let telemetry = collectors.map(|c| c.collect(&snapshot));
    progress.finish_and_clear();

    let mut submitted = false;
    if let Some(endpoint) = endpoint {
        if analysis.is_error() {
            warn!("Not submitting telemetry for a failed analysis");
        } else {
            let mut payload =
                TelemetryPayload::from_analysis(&analysis)?.with_timing(snapshot.timing());
            if let Some(report) = telemetry.clone() {
                payload = payload.with_report(report);
            }
            TelemetryClient::new(fetcher.client().clone(), &endpoint)?
                .submit(&payload)
                .await?;
            submitted = true;
        }
    }

    Ok(AnalysisReport {
        analysis,
        telemetry,
        source: snapshot.source(),
        submitted,
    })
}

async fn acquire(
    config: &Config,
    options: &AnalyzeOptions,
    fetcher: &PageFetcher,
    url: &str,
) -> Result<PageSnapshot> {
    if let Some(path) = &options.rendered_html {
        let html = tokio::fs::read_to_string(path).await.map_err(|e| {
            Error::Fetch(format!("Cannot read rendered HTML {}: {}", path.display(), e))
        })?;
        return Ok(PageSnapshot::from_html(url, &html, SnapshotSource::File));
    }

    if options.render || config.fetch.js_rendering {
        let renderer = HeadlessRenderer::new(RendererConfig::from(&config.fetch));
        let rendered = renderer.render(url).await;
        if let Err(e) = renderer.close().await {
            warn!("Failed to close browser: {}", e);
        }
        return rendered;
    }

    fetcher.snapshot(url).await
}

/// Print an analysis report to the terminal
pub fn print_analysis(report: &AnalysisReport) {
    let a = &report.analysis;

    if a.is_error() {
        println!("\n✗ Analysis Error for {}\n", a.url);
        for message in &a.indicators {
            println!("  {}", message);
        }
        return;
    }

    println!("\n🔍 Rendering analysis: {}\n", a.url);
    println!("Verdict: {} ({}% confidence)", a.render_type, a.confidence);
    println!(
        "Scores: SSR {} / CSR {} ({}% SSR), hybrid {}",
        a.detail_f64("ssrScore").unwrap_or_default(),
        a.detail_f64("csrScore").unwrap_or_default(),
        a.detail_f64("ssrPercentage").unwrap_or(50.0),
        a.detail_f64("hybridScore").unwrap_or_default()
    );

    let frameworks = a.frameworks();
    if !frameworks.is_empty() {
        println!("Frameworks: {}", frameworks.join(", "));
    }
    if let Some(generator) = a.detailed_info.get("staticGenerator").and_then(|g| g.as_str()) {
        println!("Static generator: {}", generator);
    }

    if let Some(comparison) = a
        .detailed_info
        .get("contentComparison")
        .and_then(|c| serde_json::from_value::<ComparisonResult>(c.clone()).ok())
    {
        println!(
            "Raw vs rendered text: {} / {} chars ({:.0}%)",
            comparison.raw_length,
            comparison.rendered_length,
            comparison.content_ratio * 100.0
        );
    }

    println!("\nIndicators:");
    if a.indicators.is_empty() {
        println!("  (none)");
    }
    for indicator in &a.indicators {
        println!("  • {}", indicator);
    }

    if let Some(vitals) = &a.core_web_vitals {
        println!("\nCore Web Vitals:");
        for (label, value, unit, rating) in vitals.rated() {
            println!("  {:<5} {}{} ({})", label, value, unit, rating);
        }
    }

    if a.page_type.is_some() || a.device_info.is_some() {
        println!();
    }
    if let Some(page_type) = a.page_type {
        println!("Page type: {}", page_type);
    }
    if let Some(device) = &a.device_info {
        println!(
            "Observed with: {} on {} ({:?})",
            device.browser, device.os, device.device_type
        );
    }

    if let Some(t) = &report.telemetry {
        println!("\nTechnology:");
        print_list("Frameworks", &t.tech_stack.frameworks);
        print_list("CMS", &t.tech_stack.cms);
        print_list("Analytics", &t.tech_stack.analytics);
        print_list("CDN", &t.tech_stack.cdn);
        print_list("CSS", &t.tech_stack.css_frameworks);

        println!("\nSEO & accessibility: {}/100", t.seo.score);
        println!(
            "  title: {}",
            t.seo.title.as_deref().unwrap_or("✗ missing")
        );
        println!("  h1 count: {}", t.seo.h1_count);
        println!("  images without alt: {}", t.seo.images_missing_alt);
        println!("  unlabeled form controls: {}", t.seo.unlabeled_inputs);

        if t.hydration.error_count > 0 || !t.hydration.mismatch_markers.is_empty() {
            println!("\n⚠ Hydration problems:");
            for e in t.hydration.errors.iter().chain(&t.hydration.mismatch_markers) {
                println!("  • {}", e);
            }
        }

        println!(
            "\nNavigation: {} internal links, {} router links{}",
            t.navigation.internal_links,
            t.navigation.router_links,
            if t.navigation.client_side_routing {
                ", client-side routing"
            } else {
                ""
            }
        );
        if t.navigation.hash_routing {
            println!("  hash routes: {}", t.navigation.hash_routes.join(", "));
        }
    }

    if report.submitted {
        println!("\n✓ Telemetry submitted");
    }
}

fn print_list(label: &str, items: &[String]) {
    if !items.is_empty() {
        println!("  {}: {}", label, items.join(", "));
    }
}
