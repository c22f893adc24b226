//! Ingestion payload and submission client

use super::{
    CoreWebVitals, DeviceInfo, HydrationData, NavigationData, PageType, SeoAudit, TechStack,
    TelemetryReport,
};
use crate::error::{Error, Result};
use crate::models::AnalysisResult;
use crate::page::PageTiming;
use crate::scoring::RenderType;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use url::Url;

/// Payload schema version
pub const PAYLOAD_VERSION: &str = env!("CARGO_PKG_VERSION");

/// One analysis as submitted to the ingestion endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TelemetryPayload {
    pub url: String,
    pub domain: String,
    pub render_type: RenderType,
    pub confidence: u8,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frameworks: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub performance_metrics: Option<PageTiming>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub indicators: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub core_web_vitals: Option<CoreWebVitals>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_type: Option<PageType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_info: Option<DeviceInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tech_stack: Option<TechStack>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seo_accessibility: Option<SeoAudit>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hydration_data: Option<HydrationData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub navigation_data: Option<NavigationData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

impl TelemetryPayload {
    /// Required fields and whatever the analysis itself carries
    pub fn from_analysis(result: &AnalysisResult) -> Result<Self> {
        let domain = Url::parse(&result.url)?
            .host_str()
            .map(String::from)
            .ok_or_else(|| Error::Telemetry(format!("URL has no host: {}", result.url)))?;
        let frameworks = result.frameworks();

        Ok(Self {
            url: result.url.clone(),
            domain,
            render_type: result.render_type,
            confidence: result.confidence,
            frameworks: (!frameworks.is_empty()).then_some(frameworks),
            performance_metrics: None,
            indicators: (!result.indicators.is_empty()).then(|| result.indicators.clone()),
            core_web_vitals: result.core_web_vitals.clone(),
            page_type: result.page_type,
            device_info: result.device_info.clone(),
            tech_stack: None,
            seo_accessibility: None,
            hydration_data: None,
            navigation_data: None,
            version: Some(PAYLOAD_VERSION.to_string()),
        })
    }

    pub fn with_timing(mut self, timing: &PageTiming) -> Self {
        if *timing != PageTiming::default() {
            self.performance_metrics = Some(timing.clone());
        }
        self
    }

    pub fn with_report(mut self, report: TelemetryReport) -> Self {
        self.tech_stack = Some(report.tech_stack);
        self.seo_accessibility = Some(report.seo);
        self.hydration_data = Some(report.hydration);
        self.navigation_data = Some(report.navigation);
        self
    }
}

/// Posts payloads to the ingestion endpoint
pub struct TelemetryClient {
    client: Client,
    endpoint: Url,
}

impl TelemetryClient {
    pub fn new(client: Client, endpoint: &str) -> Result<Self> {
        let endpoint = Url::parse(endpoint)
            .map_err(|e| Error::Config(format!("Invalid telemetry endpoint {}: {}", endpoint, e)))?;
        Ok(Self { client, endpoint })
    }

    pub async fn submit(&self, payload: &TelemetryPayload) -> Result<()> {
        debug!("Submitting telemetry for {} to {}", payload.url, self.endpoint);

        let response = self
            .client
            .post(self.endpoint.clone())
            .json(payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Telemetry(format!(
                "Endpoint rejected payload: HTTP {} {}",
                status,
                body.trim()
            )));
        }

        info!("Telemetry submitted for {}", payload.domain);
        Ok(())
    }
}
