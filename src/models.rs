//! Analysis result shared by the analyzer, the report and the telemetry payload.

use crate::scoring::RenderType;
use crate::telemetry::{CoreWebVitals, DeviceInfo, PageType};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Verdict for one page plus the evidence behind it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub url: String,
    pub timestamp: DateTime<Utc>,
    pub render_type: RenderType,
    /// 0-100
    pub confidence: u8,
    /// In detector invocation order; duplicates are kept
    pub indicators: Vec<String>,
    pub core_web_vitals: Option<CoreWebVitals>,
    pub page_type: Option<PageType>,
    pub device_info: Option<DeviceInfo>,
    /// Score totals plus every detector's details
    pub detailed_info: Map<String, Value>,
}

impl AnalysisResult {
    /// The result of an analysis that could not complete
    pub fn error(url: &str, message: impl Into<String>) -> Self {
        let message = message.into();
        let mut detailed_info = Map::new();
        detailed_info.insert("error".to_string(), Value::from(message.clone()));

        Self {
            url: url.to_string(),
            timestamp: Utc::now(),
            render_type: RenderType::Error,
            confidence: 0,
            indicators: vec![message],
            core_web_vitals: None,
            page_type: None,
            device_info: None,
            detailed_info,
        }
    }

    pub fn is_error(&self) -> bool {
        self.render_type.is_error()
    }

    /// Numeric detail by key
    pub fn detail_f64(&self, key: &str) -> Option<f64> {
        self.detailed_info.get(key).and_then(Value::as_f64)
    }

    /// Framework names recorded by the framework detector
    pub fn frameworks(&self) -> Vec<String> {
        self.detailed_info
            .get("frameworks")
            .and_then(Value::as_array)
            .map(|names| {
                names
                    .iter()
                    .filter_map(|n| n.as_str().map(String::from))
                    .collect()
            })
            .unwrap_or_default()
    }
}
