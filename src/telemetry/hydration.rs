//! Hydration error probe

use crate::page::PageSnapshot;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HydrationData {
    pub error_count: usize,
    pub errors: Vec<String>,
    /// Error overlays and mismatch messages left in the DOM
    pub mismatch_markers: Vec<String>,
}

const OVERLAY_SELECTORS: [(&str, &str); 3] = [
    ("nextjs-portal", "Next.js error overlay"),
    ("[data-nextjs-dialog]", "Next.js error dialog"),
    ("vite-error-overlay", "Vite error overlay"),
];

const MISMATCH_PHRASES: [&str; 4] = [
    "hydration failed",
    "did not match",
    "text content does not match server-rendered html",
    "hydration mismatch",
];

/// Keep stored console messages to a readable size
const MAX_ERROR_LEN: usize = 300;

pub fn hydration_data(page: &PageSnapshot) -> HydrationData {
    let errors: Vec<String> = page
        .probes()
        .hydration_errors
        .iter()
        .map(|e| truncate(e, MAX_ERROR_LEN))
        .collect();

    let mut mismatch_markers: Vec<String> = OVERLAY_SELECTORS
        .iter()
        .filter(|(selector, _)| page.exists(selector))
        .map(|(_, label)| label.to_string())
        .collect();

    let text = page.body_text().to_lowercase();
    mismatch_markers.extend(
        MISMATCH_PHRASES
            .iter()
            .filter(|p| text.contains(*p))
            .map(|p| format!("Page text mentions \"{}\"", p)),
    );

    HydrationData {
        error_count: errors.len(),
        errors,
        mismatch_markers,
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max).collect();
    out.push('…');
    out
}
