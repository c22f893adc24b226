//! Islands, partial hydration, streaming and resumability

use super::{HybridDetection, HybridResult};
use crate::config::DetectionConfig;
use crate::error::Result;
use crate::page::PageSnapshot;
use serde_json::{Map, Value};
use std::collections::HashSet;

const ISLAND_SELECTORS: [&str; 4] = ["astro-island", "is-land", "[data-island]", "[data-astro-island]"];

const PARTIAL_HYDRATION_SELECTORS: [&str; 6] = [
    "[data-hydrate]",
    "[data-partial-hydrate]",
    "[data-hydration-target]",
    "[client\\:load]",
    "[client\\:visible]",
    "[client\\:idle]",
];

const RSC_MARKERS: [&str; 3] = ["self.__next_f", "__RSC_PAYLOAD", "__rsc_payload"];
const RSC_SELECTORS: [&str; 1] = ["[data-rsc]"];

const STREAMING_COMMENTS: [&str; 3] = ["<!--$-->", "<!--/$-->", "<!--$?-->"];
const STREAMING_SELECTORS: [&str; 2] = ["[data-suspense-boundary]", "template[id^=\"B:\"]"];

const ENHANCEMENT_SELECTORS: [&str; 6] = [
    "[data-enhance]",
    "form[data-turbo]",
    "[data-turbo-frame]",
    "turbo-frame",
    "[hx-get]",
    "[hx-post]",
];

const QWIK_SELECTORS: [&str; 2] = ["[q\\:container]", "[q\\:base]"];

/// Scores structural evidence of hybrid rendering
pub struct HybridDetector;

impl HybridDetection for HybridDetector {
    fn detect(&self, page: &PageSnapshot, config: &DetectionConfig) -> Result<HybridResult> {
        let w = &config.weights.hybrid;
        let t = &config.thresholds;
        let mut score = 0.0;
        let mut indicators = Vec::new();
        let mut details = Map::new();
        let body = page.body_html();

        let islands = count_all(page, &ISLAND_SELECTORS);
        if islands >= 1 {
            score += w.islands;
            indicators.push(format!("Islands architecture ({} islands)", islands));
        }

        let targets = count_all(page, &PARTIAL_HYDRATION_SELECTORS);
        if targets > 1 {
            score += w.partial_hydration;
            indicators.push(format!("Partial hydration ({} targets)", targets));
        }

        let server_components = RSC_MARKERS.iter().any(|m| body.contains(m))
            || count_all(page, &RSC_SELECTORS) > 0;
        if server_components {
            score += w.server_components;
            indicators.push("React Server Components payload".to_string());
        }

        let streaming = STREAMING_COMMENTS.iter().any(|m| body.contains(m))
            || count_all(page, &STREAMING_SELECTORS) > 0;
        if streaming {
            score += w.streaming;
            indicators.push("Streaming/Suspense boundaries".to_string());
        }

        let enhancement = count_all(page, &ENHANCEMENT_SELECTORS) > 0;
        if enhancement {
            score += w.progressive_enhancement;
            indicators.push("Progressive enhancement attributes".to_string());
        }

        let resumable = count_all(page, &QWIK_SELECTORS) > 0
            || page
                .document()
                .root_element()
                .value()
                .attr("q:container")
                .is_some();
        if resumable {
            score += w.resumability;
            indicators.push("Qwik resumable container".to_string());
        }

        let semantic = page.count(&config.signatures.semantic_elements);
        let interactive = page.count(&config.signatures.interactive_elements);
        let rich = semantic > t.min_semantic_elements && page.text_length() > t.min_text_length;
        if rich && interactive > t.min_interactive_elements {
            score += w.interactive_content;
            indicators.push(format!(
                "Server content with client interactivity ({} interactive elements)",
                interactive
            ));
        }

        details.insert("islands".to_string(), Value::from(islands));
        details.insert("partialHydrationTargets".to_string(), Value::from(targets));
        details.insert("serverComponents".to_string(), Value::from(server_components));
        details.insert("streaming".to_string(), Value::from(streaming));
        details.insert("progressiveEnhancement".to_string(), Value::from(enhancement));
        details.insert("resumable".to_string(), Value::from(resumable));
        details.insert("interactiveElements".to_string(), Value::from(interactive));

        Ok(HybridResult {
            hybrid_score: score,
            indicators,
            details,
        })
    }
}

/// Distinct elements matching any of the selectors. Each selector is
/// parsed on its own so one invalid entry does not hide the rest.
fn count_all(page: &PageSnapshot, selectors: &[&str]) -> usize {
    let mut matched = HashSet::new();
    for selector in selectors {
        if let Some(elements) = page.select_all(selector) {
            matched.extend(elements.into_iter().map(|el| el.id()));
        }
    }
    matched.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::fixtures::{page, rich_article};

    fn detect(html: &str) -> HybridResult {
        HybridDetector
            .detect(&page(html), &DetectionConfig::default())
            .unwrap()
    }

    #[test]
    fn test_plain_page_has_no_hybrid_score() {
        let result = detect(rich_article());
        assert_eq!(result.hybrid_score, 0.0);
        assert!(result.indicators.is_empty());
    }

    #[test]
    fn test_astro_islands() {
        let result = detect(
            r#"<html><body><h1>Blog</h1>
            <astro-island uid="1" component-url="/c.js"><button>Like</button></astro-island>
            </body></html>"#,
        );
        assert_eq!(result.hybrid_score, 30.0);
        assert_eq!(result.details["islands"], 1);
    }

    #[test]
    fn test_single_hydration_target_is_not_partial() {
        let one = detect(r#"<div data-hydrate="a"></div>"#);
        assert_eq!(one.hybrid_score, 0.0);

        let two = detect(r#"<div data-hydrate="a"></div><div data-hydrate="b"></div>"#);
        assert_eq!(two.hybrid_score, 25.0);
    }

    #[test]
    fn test_element_with_two_hydration_attributes_is_one_target() {
        let result = detect(r#"<div data-hydrate="x" data-partial-hydrate="x"></div>"#);
        assert_eq!(result.details["partialHydrationTargets"], 1);
        assert_eq!(result.hybrid_score, 0.0);
    }

    #[test]
    fn test_island_matching_two_selectors_counts_once() {
        let result = detect(r#"<astro-island data-island="1"><button>Go</button></astro-island>"#);
        assert_eq!(result.details["islands"], 1);
    }

    #[test]
    fn test_streaming_and_rsc() {
        let result = detect(
            r#"<html><body><!--$--><p>done</p><!--/$-->
            <script>(self.__next_f=self.__next_f||[]).push([0])</script></body></html>"#,
        );
        assert_eq!(result.hybrid_score, 35.0);
        assert_eq!(result.details["streaming"], true);
        assert_eq!(result.details["serverComponents"], true);
    }

    #[test]
    fn test_qwik_container() {
        let result = detect(
            r#"<html q:container="paused" q:version="1.2"><body><p>hi</p></body></html>"#,
        );
        assert_eq!(result.details["resumable"], true);
        assert_eq!(result.hybrid_score, 25.0);
    }

    #[test]
    fn test_interactive_rich_content() {
        let html = rich_article().replace(
            "<footer>",
            "<form><input name=\"q\"><select></select><textarea></textarea><button>Go</button></form><footer>",
        );
        let result = detect(&html);
        assert_eq!(result.hybrid_score, 10.0);
        assert_eq!(result.details["interactiveElements"], 4);
    }
}
