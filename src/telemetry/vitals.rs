//! Core Web Vitals

use crate::page::{PageTiming, VitalsSample};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Core Web Vitals in milliseconds, except the unitless layout shift
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CoreWebVitals {
    pub lcp: Option<f64>,
    pub cls: Option<f64>,
    pub fid: Option<f64>,
    pub ttfb: Option<f64>,
    pub tbt: Option<f64>,
}

impl CoreWebVitals {
    pub fn is_empty(&self) -> bool {
        self.lcp.is_none()
            && self.cls.is_none()
            && self.fid.is_none()
            && self.ttfb.is_none()
            && self.tbt.is_none()
    }

    /// `(label, value, unit, rating)` for every metric present
    pub fn rated(&self) -> Vec<(&'static str, f64, &'static str, VitalRating)> {
        let metrics = [
            ("LCP", self.lcp, "ms", (2500.0, 4000.0)),
            ("CLS", self.cls, "", (0.1, 0.25)),
            ("FID", self.fid, "ms", (100.0, 300.0)),
            ("TTFB", self.ttfb, "ms", (800.0, 1800.0)),
            ("TBT", self.tbt, "ms", (200.0, 600.0)),
        ];
        metrics
            .into_iter()
            .filter_map(|(label, value, unit, (good, poor))| {
                value.map(|v| (label, v, unit, VitalRating::from_bounds(v, good, poor)))
            })
            .collect()
    }
}

/// web.dev rating bands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VitalRating {
    Good,
    NeedsImprovement,
    Poor,
}

impl VitalRating {
    fn from_bounds(value: f64, good: f64, poor: f64) -> Self {
        if value <= good {
            VitalRating::Good
        } else if value <= poor {
            VitalRating::NeedsImprovement
        } else {
            VitalRating::Poor
        }
    }
}

impl fmt::Display for VitalRating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VitalRating::Good => write!(f, "good"),
            VitalRating::NeedsImprovement => write!(f, "needs improvement"),
            VitalRating::Poor => write!(f, "poor"),
        }
    }
}

/// Source of Core Web Vitals.
///
/// Collection may wait on the page; the analyzer bounds it with a timeout
/// and then calls [`VitalsCollector::disconnect`] so nothing keeps
/// observing after the analysis returns.
#[async_trait]
pub trait VitalsCollector: Send + Sync {
    async fn collect(&self, sample: &VitalsSample, timing: &PageTiming) -> Option<CoreWebVitals>;

    /// Release observers. Called after a timeout.
    async fn disconnect(&self) {}
}

/// Reads the vitals the page recorded before it was captured
pub struct SnapshotVitals;

#[async_trait]
impl VitalsCollector for SnapshotVitals {
    async fn collect(&self, sample: &VitalsSample, timing: &PageTiming) -> Option<CoreWebVitals> {
        let vitals = CoreWebVitals {
            lcp: sample.largest_contentful_paint.map(round1),
            cls: sample.cumulative_layout_shift.map(round3),
            fid: sample.first_input_delay.map(round1),
            ttfb: timing.time_to_first_byte.map(round1),
            tbt: sample.total_blocking_time.map(round1),
        };
        (!vitals.is_empty()).then_some(vitals)
    }
}

fn round1(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}

fn round3(v: f64) -> f64 {
    (v * 1000.0).round() / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_snapshot_vitals() {
        let sample = VitalsSample {
            largest_contentful_paint: Some(1234.56),
            cumulative_layout_shift: Some(0.04321),
            ..Default::default()
        };
        let timing = PageTiming {
            time_to_first_byte: Some(88.0),
            ..Default::default()
        };
        let vitals = SnapshotVitals.collect(&sample, &timing).await.unwrap();
        assert_eq!(vitals.lcp, Some(1234.6));
        assert_eq!(vitals.cls, Some(0.043));
        assert_eq!(vitals.ttfb, Some(88.0));
        assert_eq!(vitals.fid, None);
    }

    #[test]
    fn test_nothing_recorded_is_none() {
        let vitals = tokio_test::block_on(
            SnapshotVitals.collect(&VitalsSample::default(), &PageTiming::default()),
        );
        assert!(vitals.is_none());
    }

    #[test]
    fn test_ratings() {
        let vitals = CoreWebVitals {
            lcp: Some(2000.0),
            cls: Some(0.2),
            tbt: Some(900.0),
            ..Default::default()
        };
        let rated = vitals.rated();
        assert_eq!(rated.len(), 3);
        assert_eq!(rated[0].3, VitalRating::Good);
        assert_eq!(rated[1].3, VitalRating::NeedsImprovement);
        assert_eq!(rated[2].3, VitalRating::Poor);
    }
}
