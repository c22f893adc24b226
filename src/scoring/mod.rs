//! Verdicts from accumulated scores
//!
//! The classifier is a pure function of the SSR, CSR and hybrid scores and
//! the number of indicators. Category selection is an ordered ladder:
//! 1. hybrid override (strong islands evidence, or a balanced mix)
//! 2. percentage thresholds, outermost first
//! 3. confidence floor

use serde::{Deserialize, Serialize};
use std::fmt;

/// Hybrid score at which the islands verdict overrides the percentage
pub const HYBRID_OVERRIDE_SCORE: f64 = 30.0;
/// Both sides need this much evidence for the balanced-mix override
pub const BALANCED_MIN_SCORE: f64 = 20.0;
pub const BALANCED_PERCENT_LOW: u8 = 35;
pub const BALANCED_PERCENT_HIGH: u8 = 65;

pub const SSR_PERCENT: u8 = 75;
pub const CSR_PERCENT: u8 = 25;
pub const LIKELY_SSR_PERCENT: u8 = 60;
pub const LIKELY_CSR_PERCENT: u8 = 40;

pub const MIN_CONFIDENCE: u8 = 30;
pub const INDICATOR_BONUS_PER: f64 = 3.0;
pub const INDICATOR_BONUS_MAX: f64 = 20.0;

/// Rendering strategy verdict
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RenderType {
    #[serde(rename = "Server-Side Rendered (SSR)")]
    Ssr,
    #[serde(rename = "Client-Side Rendered (CSR)")]
    Csr,
    #[serde(rename = "Likely SSR with Hydration")]
    LikelySsr,
    #[serde(rename = "Likely CSR/SPA")]
    LikelyCsr,
    #[serde(rename = "Hybrid/Mixed Rendering")]
    Mixed,
    #[serde(rename = "Hybrid/Islands Architecture")]
    Islands,
    #[serde(rename = "Analysis Error")]
    Error,
}

impl RenderType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RenderType::Ssr => "Server-Side Rendered (SSR)",
            RenderType::Csr => "Client-Side Rendered (CSR)",
            RenderType::LikelySsr => "Likely SSR with Hydration",
            RenderType::LikelyCsr => "Likely CSR/SPA",
            RenderType::Mixed => "Hybrid/Mixed Rendering",
            RenderType::Islands => "Hybrid/Islands Architecture",
            RenderType::Error => "Analysis Error",
        }
    }

    /// Highest confidence this verdict can report
    pub fn max_confidence(&self) -> u8 {
        match self {
            RenderType::Ssr | RenderType::Csr => 95,
            RenderType::LikelySsr | RenderType::LikelyCsr => 85,
            RenderType::Islands => 80,
            RenderType::Mixed => 70,
            RenderType::Error => 0,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, RenderType::Error)
    }
}

impl fmt::Display for RenderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A verdict and the numbers behind it
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Classification {
    pub render_type: RenderType,
    pub confidence: u8,
    pub ssr_percentage: u8,
    pub hybrid_score: f64,
    pub indicator_count: usize,
}

/// Share of the evidence pointing at SSR, 50 when there is none
pub fn ssr_percentage(ssr_score: f64, csr_score: f64) -> u8 {
    let total = ssr_score + csr_score;
    if total <= 0.0 {
        return 50;
    }
    (100.0 * ssr_score / total).round().clamp(0.0, 100.0) as u8
}

/// Classify accumulated scores
pub fn classify(
    ssr_score: f64,
    csr_score: f64,
    hybrid_score: f64,
    indicators: &[String],
) -> Classification {
    let pct = ssr_percentage(ssr_score, csr_score);
    let indicator_bonus = (indicators.len() as f64 * INDICATOR_BONUS_PER).min(INDICATOR_BONUS_MAX);
    let base = (f64::from(pct) - 50.0).abs() * 2.0;

    let balanced = ssr_score >= BALANCED_MIN_SCORE
        && csr_score >= BALANCED_MIN_SCORE
        && (BALANCED_PERCENT_LOW..=BALANCED_PERCENT_HIGH).contains(&pct);

    let (render_type, raw_confidence) = if hybrid_score >= HYBRID_OVERRIDE_SCORE || balanced {
        (RenderType::Islands, 50.0 + hybrid_score + indicator_bonus)
    } else if pct >= SSR_PERCENT {
        (RenderType::Ssr, base + indicator_bonus)
    } else if pct <= CSR_PERCENT {
        (RenderType::Csr, base + indicator_bonus)
    } else if pct >= LIKELY_SSR_PERCENT {
        (RenderType::LikelySsr, base + indicator_bonus)
    } else if pct <= LIKELY_CSR_PERCENT {
        (RenderType::LikelyCsr, base + indicator_bonus)
    } else {
        (RenderType::Mixed, base + 10.0 + hybrid_score / 2.0)
    };

    let capped = raw_confidence.min(f64::from(render_type.max_confidence()));
    let confidence = capped.round().max(f64::from(MIN_CONFIDENCE)) as u8;

    Classification {
        render_type,
        confidence,
        ssr_percentage: pct,
        hybrid_score,
        indicator_count: indicators.len(),
    }
}
