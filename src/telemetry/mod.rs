//! Opt-in telemetry collectors
//!
//! Everything here describes the page without influencing its render-type
//! classification. The analyzer asks for page type, device info and Core
//! Web Vitals; the CLI gathers the rest into a [`TelemetryReport`] for the
//! ingestion payload.

mod device;
mod hydration;
mod navigation;
mod page_type;
mod payload;
mod seo;
mod tech_stack;
mod vitals;

pub use device::*;
pub use hydration::*;
pub use navigation::*;
pub use page_type::*;
pub use payload::*;
pub use seo::*;
pub use tech_stack::*;
pub use vitals::*;

use crate::config::Signatures;
use crate::page::PageSnapshot;
use serde::{Deserialize, Serialize};

/// Collectors beyond Core Web Vitals
#[derive(Debug, Clone)]
pub struct TelemetryCollectors {
    fallback_user_agent: String,
    signatures: Signatures,
}

/// Full telemetry for one page
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TelemetryReport {
    pub tech_stack: TechStack,
    pub seo: SeoAudit,
    pub hydration: HydrationData,
    pub navigation: NavigationData,
}

impl TelemetryCollectors {
    /// `fallback_user_agent` describes the client when the snapshot was not
    /// taken in a browser
    pub fn new(fallback_user_agent: impl Into<String>, signatures: Signatures) -> Self {
        Self {
            fallback_user_agent: fallback_user_agent.into(),
            signatures,
        }
    }

    pub fn page_type(&self, page: &PageSnapshot) -> PageType {
        page_type(page)
    }

    pub fn device_info(&self, page: &PageSnapshot) -> DeviceInfo {
        device_info(page.environment(), &self.fallback_user_agent)
    }

    pub fn collect(&self, page: &PageSnapshot) -> TelemetryReport {
        TelemetryReport {
            tech_stack: tech_stack(page, &self.signatures),
            seo: seo_audit(page),
            hydration: hydration_data(page),
            navigation: navigation_data(page, &self.signatures),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::fixtures::{page, rich_article};

    #[test]
    fn test_collect_on_article() {
        let collectors = TelemetryCollectors::new("renderlens-test", Signatures::default());
        let snapshot = page(rich_article());

        assert_eq!(collectors.page_type(&snapshot), PageType::Homepage);
        assert_eq!(collectors.device_info(&snapshot).user_agent, "renderlens-test");

        let report = collectors.collect(&snapshot);
        assert_eq!(report.seo.h1_count, 1);
        assert_eq!(report.seo.title.as_deref(), Some("Guide"));
        assert!(report.seo.landmarks >= 4);
        assert_eq!(report.hydration.error_count, 0);
        assert_eq!(report.navigation.internal_links, 2);
        assert!(!report.navigation.client_side_routing);
    }
}
