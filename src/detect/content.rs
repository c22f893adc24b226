//! DOM richness, loading placeholders and script density

use super::{round2, Detector, DetectorResult, Signals};
use crate::config::DetectionConfig;
use crate::error::Result;
use crate::page::PageSnapshot;

const LOADING_WORDS: [&str; 3] = ["loading", "spinner", "skeleton"];
const LOADING_CLASS_SELECTOR: &str =
    "[class*=\"loading\"], [class*=\"spinner\"], [class*=\"skeleton\"]";

/// Scores how much content the DOM already carries
pub struct ContentDetector;

impl Detector for ContentDetector {
    fn name(&self) -> &'static str {
        "content"
    }

    fn detect(&self, page: &PageSnapshot, config: &DetectionConfig) -> Result<DetectorResult> {
        let w = &config.weights;
        let t = &config.thresholds;
        let mut signals = Signals::new();

        let text_length = page.text_length();
        let children = page.body().map(|b| b.child_elements().count()).unwrap_or(0);
        let semantic = page.count(&config.signatures.semantic_elements);

        if children > t.min_children
            && text_length > t.min_text_length
            && semantic > t.min_semantic_elements
        {
            signals.ssr(
                w.rich_content,
                format!(
                    "Rich initial content ({} chars, {} semantic elements)",
                    text_length, semantic
                ),
            );
        } else if text_length < t.minimal_text_length {
            signals.csr(
                w.minimal_content,
                format!("Minimal content ({} chars), likely CSR shell", text_length),
            );
        }

        let body_lower = page.body_html().to_lowercase();
        let has_loading_markup = LOADING_WORDS.iter().any(|word| body_lower.contains(word))
            || page.exists(LOADING_CLASS_SELECTOR);
        if has_loading_markup && text_length < t.min_loading_state_text {
            signals.csr(w.loading_states, "Loading placeholders with little content");
        }

        let scripts = page.count("script");
        let total = page.element_count();
        let script_ratio = if total > 0 {
            scripts as f64 / total as f64
        } else {
            0.0
        };

        if script_ratio > t.high_script_ratio {
            signals.csr(
                w.high_script_ratio,
                format!("High script-to-element ratio ({:.2})", script_ratio),
            );
        } else if script_ratio < t.low_script_ratio {
            signals.ssr(
                w.low_script_ratio,
                format!("Low script-to-element ratio ({:.2})", script_ratio),
            );
        }

        signals.detail("contentLength", text_length);
        signals.detail("childrenCount", children);
        signals.detail("scriptRatio", round2(script_ratio));

        Ok(signals.finish())
    }
}
