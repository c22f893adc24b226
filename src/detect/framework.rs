//! Framework, generator and router fingerprints

use super::{Detector, DetectorResult, Signals};
use crate::config::DetectionConfig;
use crate::error::Result;
use crate::page::PageSnapshot;
use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;
use tracing::debug;

static STATE_ASSIGNMENT: OnceLock<Regex> = OnceLock::new();

fn state_assignment() -> &'static Regex {
    STATE_ASSIGNMENT.get_or_init(|| Regex::new(r"window\.__\w+__\s*=").expect("valid regex"))
}

/// Matches the page against the framework, generator and router tables
pub struct FrameworkDetector;

impl Detector for FrameworkDetector {
    fn name(&self) -> &'static str {
        "framework"
    }

    fn detect(&self, page: &PageSnapshot, config: &DetectionConfig) -> Result<DetectorResult> {
        let w = &config.weights;
        let sigs = &config.signatures;
        let mut signals = Signals::new();

        // Hydration markers: every framework is checked on its own, a page
        // can carry several (mixed islands).
        let mut frameworks: Vec<String> = Vec::new();
        for signature in &sigs.frameworks {
            match page.select_all(&signature.selector) {
                Some(matches) if !matches.is_empty() => {
                    debug!(
                        "{} markers matched {} elements",
                        signature.name,
                        matches.len()
                    );
                    signals.ssr(
                        w.framework_markers,
                        format!("{} hydration markers", signature.name),
                    );
                    frameworks.push(signature.name.clone());
                }
                _ => {}
            }
        }

        if !frameworks.iter().any(|f| f == "React") && page.probes().react_root_container {
            signals.ssr(w.framework_markers, "React root container");
            frameworks.push("React".to_string());
        }

        let body = page.body_html();
        let serialized = sigs
            .serialized_state
            .iter()
            .find(|global| body.contains(global.as_str()))
            .map(|g| g.to_string())
            .or_else(|| {
                state_assignment()
                    .find(body)
                    .map(|m| m.as_str().trim_end_matches('=').trim_end().to_string())
            });
        if let Some(global) = &serialized {
            signals.ssr(
                w.serialized_data,
                format!("Serialized server state ({})", global),
            );
        }

        let framework_scripts: Vec<String> = page
            .select_all("script[src]")
            .unwrap_or_default()
            .into_iter()
            .filter_map(|s| s.value().attr("src"))
            .map(|src| src.to_lowercase())
            .filter(|src| sigs.framework_scripts.iter().any(|name| src.contains(name.as_str())))
            .collect();

        if !framework_scripts.is_empty() {
            let hydrating = framework_scripts.iter().any(|src| {
                sigs.hydration_script_hints
                    .iter()
                    .any(|hint| src.contains(hint.as_str()))
            });
            if hydrating {
                signals.ssr(
                    w.ssr_hydration_scripts,
                    format!(
                        "Chunked hydration bundles ({} framework scripts)",
                        framework_scripts.len()
                    ),
                );
            } else {
                signals.csr(
                    w.csr_framework_scripts,
                    format!(
                        "Client-side framework bundles ({} framework scripts)",
                        framework_scripts.len()
                    ),
                );
            }
        }

        let generator = sigs
            .generators
            .iter()
            .find(|signature| page.exists(&signature.selector))
            .map(|signature| signature.name.clone());
        if let Some(name) = &generator {
            signals.ssr(w.static_generator, format!("Static site generator: {}", name));
        }

        let routers: Vec<String> = sigs
            .routers
            .iter()
            .filter(|signature| page.exists(&signature.selector))
            .map(|signature| signature.name.clone())
            .collect();
        if !routers.is_empty() {
            signals.csr(
                w.client_routing,
                format!("Client-side router outlet ({})", routers.join(", ")),
            );
        }

        signals.detail(
            "frameworks",
            Value::from(frameworks.into_iter().map(Value::from).collect::<Vec<_>>()),
        );
        signals.detail("hasSerializedData", serialized.is_some());
        signals.detail("frameworkScripts", framework_scripts.len());
        signals.detail("staticGenerator", generator.map(Value::from).unwrap_or(Value::Null));
        signals.detail(
            "clientRouters",
            Value::from(routers.into_iter().map(Value::from).collect::<Vec<_>>()),
        );

        Ok(signals.finish())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Signature;
    use crate::detect::fixtures::page;
    use crate::page::RuntimeProbes;

    fn detect(html: &str) -> DetectorResult {
        FrameworkDetector
            .detect(&page(html), &DetectionConfig::default())
            .unwrap()
    }

    #[test]
    fn test_hugo_generator() {
        let result = detect(
            r#"<html><head><meta name="generator" content="Hugo 0.100.0"></head>
            <body><p>Hello</p></body></html>"#,
        );
        assert_eq!(result.ssr_score, 40.0);
        assert_eq!(result.csr_score, 0.0);
        assert_eq!(result.details["staticGenerator"], "Hugo");
        assert_eq!(result.indicators, vec!["Static site generator: Hugo"]);
    }

    #[test]
    fn test_next_data_and_chunks() {
        let result = detect(
            r#"<html><body><div id="__next"><h1>Shop</h1></div>
            <script id="__NEXT_DATA__" type="application/json">{"props":{}}</script>
            <script src="/_next/static/chunks/main-abc.js"></script>
            </body></html>"#,
        );
        assert_eq!(result.details["frameworks"], serde_json::json!(["Next.js"]));
        assert_eq!(result.details["hasSerializedData"], true);
        // markers 15 + serialized 35 + hydration scripts 20
        assert_eq!(result.ssr_score, 70.0);
        assert_eq!(result.csr_score, 0.0);
    }

    #[test]
    fn test_multiple_frameworks_match_independently() {
        let result = detect(
            r#"<html><body>
            <div data-reactroot=""><p>react island</p></div>
            <div class="svelte-1xyz"><p>svelte island</p></div>
            </body></html>"#,
        );
        assert_eq!(
            result.details["frameworks"],
            serde_json::json!(["React", "Svelte"])
        );
        assert_eq!(result.ssr_score, 30.0);
    }

    #[test]
    fn test_bare_framework_bundle_is_csr() {
        let result = detect(
            r#"<html><body><div id="root"></div>
            <script src="https://unpkg.com/react@18/umd/react.production.min.js"></script>
            </body></html>"#,
        );
        assert_eq!(result.csr_score, 20.0);
        assert_eq!(result.details["frameworkScripts"], 1);
    }

    #[test]
    fn test_window_state_regex() {
        let result = detect(
            r#"<html><body><p>x</p><script>window.__MY_STORE__ = {"a":1};</script></body></html>"#,
        );
        assert_eq!(result.details["hasSerializedData"], true);
        assert!(result.indicators[0].contains("window.__MY_STORE__"));
    }

    #[test]
    fn test_window_state_indicator_drops_trailing_whitespace() {
        let result = detect(
            "<html><body><p>x</p><script>window.__APP_STATE__\t\n= {};</script></body></html>",
        );
        assert_eq!(
            result.indicators[0],
            "Serialized server state (window.__APP_STATE__)"
        );
    }

    #[test]
    fn test_client_router() {
        let result = detect("<html><body><app-root><router-outlet></router-outlet></app-root></body></html>");
        assert_eq!(result.csr_score, 15.0);
        assert_eq!(
            result.details["clientRouters"],
            serde_json::json!(["Angular Router"])
        );
    }

    #[test]
    fn test_react_root_container_fallback() {
        let snapshot = page("<html><body><div id=\"root\"><p>x</p></div></body></html>")
            .with_probes(RuntimeProbes {
                react_root_container: true,
                ..Default::default()
            });
        let result = FrameworkDetector
            .detect(&snapshot, &DetectionConfig::default())
            .unwrap();
        assert_eq!(result.details["frameworks"], serde_json::json!(["React"]));
        assert_eq!(result.indicators, vec!["React root container"]);
    }

    #[test]
    fn test_invalid_signature_does_not_abort_others() {
        let mut config = DetectionConfig::default();
        config.signatures.frameworks.insert(
            0,
            Signature {
                name: "Broken".to_string(),
                selector: "div[[[".to_string(),
            },
        );
        let result = FrameworkDetector
            .detect(&page("<div id=\"___gatsby\"><p>x</p></div>"), &config)
            .unwrap();
        assert_eq!(result.details["frameworks"], serde_json::json!(["Gatsby"]));
    }
}
