//! SEO and accessibility audit

use crate::page::{collapse_whitespace, parse_selector, PageSnapshot};
use scraper::ElementRef;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeoAudit {
    pub title: Option<String>,
    pub meta_description: Option<String>,
    pub h1_count: usize,
    pub canonical: Option<String>,
    pub lang: Option<String>,
    pub viewport: bool,
    pub images_missing_alt: usize,
    pub landmarks: usize,
    pub unlabeled_inputs: usize,
    /// 0-100, higher is better
    pub score: u8,
}

const LANDMARKS: &str = "main, nav, header, footer, aside, [role=\"main\"], [role=\"navigation\"], [role=\"banner\"], [role=\"contentinfo\"], [role=\"complementary\"]";

/// Inputs a user fills in; hidden and button-like inputs need no label
const LABELLED_INPUT_EXEMPT: [&str; 5] = ["hidden", "submit", "button", "reset", "image"];

pub fn seo_audit(page: &PageSnapshot) -> SeoAudit {
    let title = first_text(page, "head > title, title");
    let meta_description = first_attr(page, "meta[name=\"description\"]", "content");
    let canonical = first_attr(page, "link[rel=\"canonical\"]", "href");
    let lang = page
        .document()
        .root_element()
        .value()
        .attr("lang")
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(String::from);
    let viewport = page.exists("meta[name=\"viewport\"]");
    let h1_count = page.count("h1");
    let images_missing_alt = page
        .select_all("img")
        .unwrap_or_default()
        .into_iter()
        .filter(|img| img.value().attr("alt").is_none())
        .count();
    let landmarks = page.count(LANDMARKS);
    let unlabeled_inputs = unlabeled_inputs(page);

    let mut audit = SeoAudit {
        title,
        meta_description,
        h1_count,
        canonical,
        lang,
        viewport,
        images_missing_alt,
        landmarks,
        unlabeled_inputs,
        score: 0,
    };
    audit.score = score(&audit);
    audit
}

fn score(a: &SeoAudit) -> u8 {
    let mut penalty = 0usize;
    if a.title.is_none() {
        penalty += 15;
    }
    if a.meta_description.is_none() {
        penalty += 10;
    }
    if a.h1_count != 1 {
        penalty += 10;
    }
    if a.canonical.is_none() {
        penalty += 5;
    }
    if a.lang.is_none() {
        penalty += 10;
    }
    if !a.viewport {
        penalty += 10;
    }
    if a.landmarks == 0 {
        penalty += 10;
    }
    penalty += (a.images_missing_alt * 2).min(20);
    penalty += (a.unlabeled_inputs * 5).min(15);
    100usize.saturating_sub(penalty) as u8
}

/// Form controls with no accessible name
fn unlabeled_inputs(page: &PageSnapshot) -> usize {
    let label_targets: HashSet<&str> = page
        .select_all("label[for]")
        .unwrap_or_default()
        .into_iter()
        .filter_map(|l| l.value().attr("for"))
        .collect();
    let Some(label) = parse_selector("label") else {
        return 0;
    };
    let labelled_ancestor = |el: &ElementRef<'_>| {
        el.ancestors()
            .filter_map(ElementRef::wrap)
            .any(|a| label.matches(&a))
    };

    page.select_all("input, select, textarea")
        .unwrap_or_default()
        .into_iter()
        .filter(|el| {
            let v = el.value();
            let exempt = v.name() == "input"
                && v.attr("type")
                    .is_some_and(|t| LABELLED_INPUT_EXEMPT.contains(&t.to_lowercase().as_str()));
            if exempt {
                return false;
            }
            let named = v.attr("aria-label").is_some_and(|l| !l.trim().is_empty())
                || v.attr("aria-labelledby").is_some()
                || v.attr("title").is_some()
                || v.id().is_some_and(|id| label_targets.contains(id));
            !named && !labelled_ancestor(el)
        })
        .count()
}

fn first_text(page: &PageSnapshot, selector: &str) -> Option<String> {
    page.select_all(selector)?
        .into_iter()
        .map(|el| collapse_whitespace(&el.text().collect::<String>()))
        .find(|t| !t.is_empty())
}

fn first_attr(page: &PageSnapshot, selector: &str, attr: &str) -> Option<String> {
    page.select_all(selector)?
        .into_iter()
        .filter_map(|el| el.value().attr(attr))
        .map(str::trim)
        .find(|v| !v.is_empty())
        .map(String::from)
}
