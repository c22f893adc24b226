//! SPA shell fingerprints

use super::{Detector, DetectorResult, Signals};
use crate::config::DetectionConfig;
use crate::error::Result;
use crate::page::{parse_selector, PageSnapshot};
use scraper::ElementRef;

const NOSCRIPT_PHRASES: [&str; 3] = ["javascript", "enable js", "requires javascript"];
const BOOTSTRAP_CLASSES: [&str; 3] = ["js-loaded", "app-loaded", "hydrated"];

/// Looks for the canonical SPA shell: a `#root`/`#app` container owned by a
/// client framework instance. Fires even when the generic framework markers
/// are stripped by a minified build.
pub struct CsrPatternDetector;

impl Detector for CsrPatternDetector {
    fn name(&self) -> &'static str {
        "csrPatterns"
    }

    fn detect(&self, page: &PageSnapshot, config: &DetectionConfig) -> Result<DetectorResult> {
        let w = &config.weights;
        let mut signals = Signals::new();

        let root = ["#root", "#app"].into_iter().find_map(|selector| {
            page.select_all(selector)
                .and_then(|roots| roots.into_iter().next())
        });
        let root_marker = root.and_then(|el| instance_marker(page, el));
        if let Some(marker) = root_marker {
            let id = root.and_then(|el| el.value().id()).unwrap_or("root");
            signals.csr(
                w.spa_root_pattern,
                format!("SPA root #{} owned by {}", id, marker),
            );
        }

        let mut noscript_fallback = false;
        for noscript in page.select_all("noscript").unwrap_or_default() {
            let text = noscript.text().collect::<String>().to_lowercase();
            if NOSCRIPT_PHRASES.iter().any(|p| text.contains(p)) {
                signals.csr(w.noscript_fallback, "Noscript fallback asks for JavaScript");
                noscript_fallback = true;
                break;
            }
        }

        let body_classes: Vec<&str> = page
            .body()
            .map(|b| {
                b.value()
                    .classes()
                    .filter(|c| BOOTSTRAP_CLASSES.contains(c))
                    .collect()
            })
            .unwrap_or_default();
        if !body_classes.is_empty() {
            signals.csr(
                w.dynamic_body_classes,
                format!("Body marked after bootstrap ({})", body_classes.join(", ")),
            );
        }

        signals.detail("spaRoot", root_marker.is_some());
        signals.detail("noscriptFallback", noscript_fallback);
        signals.detail("dynamicBodyClasses", body_classes.len());

        Ok(signals.finish())
    }
}

/// Which framework instance, if any, owns the root container
fn instance_marker(page: &PageSnapshot, root: ElementRef<'_>) -> Option<&'static str> {
    let probes = page.probes();
    if probes.react_root_container {
        return Some("React");
    }
    if probes.vue_instance {
        return Some("Vue");
    }

    let el = root.value();
    if el.attr("data-v-app").is_some() {
        return Some("Vue");
    }
    if el.attr("data-reactroot").is_some() {
        return Some("React");
    }
    let react_child = parse_selector("[data-reactroot]")
        .map(|s| root.select(&s).next().is_some())
        .unwrap_or(false);
    if react_child {
        return Some("React");
    }
    None
}
