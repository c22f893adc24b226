//! Configuration management for renderlens
//!
//! Handles loading, saving, and validating configuration from TOML files.
//! The detection tables (weights, thresholds, selector signatures) default to
//! the values the classifier is calibrated against; overriding them changes
//! the verdicts.

mod defaults;

pub use defaults::*;

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Detector weights, thresholds and signatures
    #[serde(default)]
    pub detection: DetectionConfig,

    /// How pages are fetched and rendered
    #[serde(default)]
    pub fetch: FetchConfig,

    /// Opt-in telemetry collection and submission
    #[serde(default)]
    pub telemetry: TelemetryConfig,

    /// Paths configuration (internal, not user-editable)
    #[serde(skip)]
    pub paths: PathsConfig,
}

/// Everything the detectors read. Shared read-only for the whole run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DetectionConfig {
    #[serde(default)]
    pub weights: Weights,

    #[serde(default)]
    pub thresholds: Thresholds,

    #[serde(default)]
    pub signatures: Signatures,
}

/// Score contributed by each signal
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Weights {
    // content
    pub rich_content: f64,
    pub minimal_content: f64,
    pub loading_states: f64,
    pub high_script_ratio: f64,
    pub low_script_ratio: f64,

    // framework
    pub framework_markers: f64,
    pub serialized_data: f64,
    pub ssr_hydration_scripts: f64,
    pub csr_framework_scripts: f64,
    pub static_generator: f64,
    pub client_routing: f64,

    // meta
    pub ssr_framework_meta: f64,
    pub rich_meta: f64,
    pub structured_data: f64,

    // performance
    pub fast_dom_slow_fcp: f64,
    pub fast_fcp: f64,
    pub slow_dom_fast_fcp: f64,

    // csr patterns
    pub spa_root_pattern: f64,
    pub noscript_fallback: f64,
    pub dynamic_body_classes: f64,

    // raw vs rendered comparison
    pub raw_vs_rendered_csr: f64,
    pub raw_vs_rendered_ssr: f64,

    pub hybrid: HybridWeights,
}

impl Default for Weights {
    fn default() -> Self {
        Self {
            rich_content: 25.0,
            minimal_content: 30.0,
            loading_states: 20.0,
            high_script_ratio: 15.0,
            low_script_ratio: 10.0,
            framework_markers: 15.0,
            serialized_data: 35.0,
            ssr_hydration_scripts: 20.0,
            csr_framework_scripts: 20.0,
            static_generator: 40.0,
            client_routing: 15.0,
            ssr_framework_meta: 20.0,
            rich_meta: 10.0,
            structured_data: 15.0,
            fast_dom_slow_fcp: 30.0,
            fast_fcp: 15.0,
            slow_dom_fast_fcp: 5.0,
            spa_root_pattern: 25.0,
            noscript_fallback: 20.0,
            dynamic_body_classes: 10.0,
            raw_vs_rendered_csr: 40.0,
            raw_vs_rendered_ssr: 40.0,
            hybrid: HybridWeights::default(),
        }
    }
}

/// Hybrid score contributions. These never enter the SSR/CSR totals.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HybridWeights {
    pub islands: f64,
    pub partial_hydration: f64,
    pub server_components: f64,
    pub streaming: f64,
    pub progressive_enhancement: f64,
    pub resumability: f64,
    pub interactive_content: f64,
}

impl Default for HybridWeights {
    fn default() -> Self {
        Self {
            islands: 30.0,
            partial_hydration: 25.0,
            server_components: 20.0,
            streaming: 15.0,
            progressive_enhancement: 15.0,
            resumability: 25.0,
            interactive_content: 10.0,
        }
    }
}

/// Numeric cutoffs used by the detectors
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    pub min_children: usize,
    pub min_text_length: usize,
    pub min_semantic_elements: usize,
    pub minimal_text_length: usize,
    pub min_loading_state_text: usize,
    pub high_script_ratio: f64,
    pub low_script_ratio: f64,
    pub min_rich_meta_length: usize,
    pub fast_dom_ready_ms: f64,
    pub slow_dom_ready_ms: f64,
    pub fast_fcp_ms: f64,
    pub slow_fcp_ms: f64,
    pub csr_ratio: f64,
    pub ssr_ratio: f64,
    pub min_rendered_length: usize,
    pub min_interactive_elements: usize,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            min_children: 3,
            min_text_length: 200,
            min_semantic_elements: 5,
            minimal_text_length: 50,
            min_loading_state_text: 100,
            high_script_ratio: 0.15,
            low_script_ratio: 0.05,
            min_rich_meta_length: 20,
            fast_dom_ready_ms: 30.0,
            slow_dom_ready_ms: 500.0,
            fast_fcp_ms: 800.0,
            slow_fcp_ms: 1000.0,
            csr_ratio: 0.2,
            ssr_ratio: 0.7,
            min_rendered_length: 200,
            min_interactive_elements: 3,
        }
    }
}

/// A named CSS selector
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature {
    pub name: String,
    pub selector: String,
}

/// Selector and pattern tables
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Signatures {
    #[serde(default = "default_framework_signatures")]
    pub frameworks: Vec<Signature>,

    #[serde(default = "default_generator_signatures")]
    pub generators: Vec<Signature>,

    #[serde(default = "default_router_signatures")]
    pub routers: Vec<Signature>,

    #[serde(default = "default_serialized_state_globals")]
    pub serialized_state: Vec<String>,

    #[serde(default = "default_framework_script_names")]
    pub framework_scripts: Vec<String>,

    #[serde(default = "default_hydration_script_hints")]
    pub hydration_script_hints: Vec<String>,

    #[serde(default = "default_semantic_selector")]
    pub semantic_elements: String,

    #[serde(default = "default_interactive_selector")]
    pub interactive_elements: String,
}

impl Default for Signatures {
    fn default() -> Self {
        Self {
            frameworks: default_framework_signatures(),
            generators: default_generator_signatures(),
            routers: default_router_signatures(),
            serialized_state: default_serialized_state_globals(),
            framework_scripts: default_framework_script_names(),
            hydration_script_hints: default_hydration_script_hints(),
            semantic_elements: default_semantic_selector(),
            interactive_elements: default_interactive_selector(),
        }
    }
}

/// Page acquisition configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    /// User agent string
    #[serde(default = "default_fetch_user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds
    #[serde(default = "default_fetch_timeout")]
    pub timeout_secs: u64,

    /// Refetch the raw HTML and compare it with the rendered DOM
    #[serde(default = "default_compare_raw_html")]
    pub compare_raw_html: bool,

    /// Render pages in headless Chrome (needs the js-rendering feature)
    #[serde(default = "default_js_rendering")]
    pub js_rendering: bool,

    /// Time to wait for page load when JS rendering (milliseconds)
    #[serde(default = "default_js_page_load_timeout")]
    pub js_page_load_timeout_ms: u64,

    /// Time to wait after load for dynamic content (milliseconds)
    #[serde(default = "default_js_render_wait")]
    pub js_render_wait_ms: u64,

    /// Disable browser sandbox (required in some Docker/CI environments)
    #[serde(default)]
    pub js_no_sandbox: bool,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: default_fetch_user_agent(),
            timeout_secs: default_fetch_timeout(),
            compare_raw_html: default_compare_raw_html(),
            js_rendering: default_js_rendering(),
            js_page_load_timeout_ms: default_js_page_load_timeout(),
            js_render_wait_ms: default_js_render_wait(),
            js_no_sandbox: false,
        }
    }
}

/// Telemetry configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryConfig {
    /// Collect the telemetry suite alongside the classification
    #[serde(default = "default_telemetry_enabled")]
    pub enabled: bool,

    /// Ingestion endpoint for `--submit`
    #[serde(default)]
    pub endpoint: Option<String>,

    /// Upper bound on Core Web Vitals collection (milliseconds)
    #[serde(default = "default_vitals_timeout")]
    pub vitals_timeout_ms: u64,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            enabled: default_telemetry_enabled(),
            endpoint: None,
            vitals_timeout_ms: default_vitals_timeout(),
        }
    }
}

/// Internal paths configuration
#[derive(Debug, Clone, Default)]
pub struct PathsConfig {
    /// Base directory for renderlens data
    pub base_dir: PathBuf,

    /// Path to config file
    pub config_file: PathBuf,
}

impl Config {
    /// Get the default base directory for renderlens (~/.renderlens)
    pub fn default_base_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".renderlens")
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        Self::default_base_dir().join("config.toml")
    }

    /// Initialize paths configuration
    pub fn init_paths(&mut self, base_dir: Option<PathBuf>) {
        let base = base_dir.unwrap_or_else(Self::default_base_dir);
        self.paths = PathsConfig {
            config_file: base.join("config.toml"),
            base_dir: base,
        };
    }

    /// Load configuration from a specific file path
    pub fn load(config_path: &Path) -> Result<Self> {
        debug!("Loading config from {:?}", config_path);

        if !config_path.exists() {
            return Err(Error::Config(format!(
                "Config file not found: {}",
                config_path.display()
            )));
        }

        let content = std::fs::read_to_string(config_path)?;
        let mut config: Config = toml::from_str(&content)?;

        let base = config_path.parent().unwrap_or(Path::new(".")).to_path_buf();
        config.paths = PathsConfig {
            config_file: config_path.to_path_buf(),
            base_dir: base,
        };

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a base directory, falling back to defaults
    pub fn load_from(base_dir: Option<PathBuf>) -> Result<Self> {
        let mut config = Config::default();
        config.init_paths(base_dir);

        if config.paths.config_file.exists() {
            debug!("Loading config from {:?}", config.paths.config_file);
            let content = std::fs::read_to_string(&config.paths.config_file)?;
            let mut loaded: Config = toml::from_str(&content)?;
            loaded.paths = config.paths;
            config = loaded;
        } else {
            debug!("No config file found, using defaults");
        }

        config.validate()?;
        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.paths.config_file.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(&self.paths.config_file, content)?;
        info!("Saved config to {:?}", self.paths.config_file);
        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        let t = &self.detection.thresholds;

        for (name, ratio) in [
            ("csr_ratio", t.csr_ratio),
            ("ssr_ratio", t.ssr_ratio),
            ("high_script_ratio", t.high_script_ratio),
            ("low_script_ratio", t.low_script_ratio),
        ] {
            if !(0.0..=1.0).contains(&ratio) {
                return Err(Error::Config(format!(
                    "detection.thresholds.{} must be between 0.0 and 1.0",
                    name
                )));
            }
        }

        if t.csr_ratio >= t.ssr_ratio {
            return Err(Error::Config(
                "detection.thresholds.csr_ratio must be < ssr_ratio".to_string(),
            ));
        }

        if t.low_script_ratio >= t.high_script_ratio {
            return Err(Error::Config(
                "detection.thresholds.low_script_ratio must be < high_script_ratio".to_string(),
            ));
        }

        if t.fast_fcp_ms > t.slow_fcp_ms {
            return Err(Error::Config(
                "detection.thresholds.fast_fcp_ms must be <= slow_fcp_ms".to_string(),
            ));
        }

        if t.fast_dom_ready_ms > t.slow_dom_ready_ms {
            return Err(Error::Config(
                "detection.thresholds.fast_dom_ready_ms must be <= slow_dom_ready_ms".to_string(),
            ));
        }

        let w = &self.detection.weights;
        let negative = [
            w.rich_content,
            w.minimal_content,
            w.loading_states,
            w.high_script_ratio,
            w.low_script_ratio,
            w.framework_markers,
            w.serialized_data,
            w.ssr_hydration_scripts,
            w.csr_framework_scripts,
            w.static_generator,
            w.client_routing,
            w.ssr_framework_meta,
            w.rich_meta,
            w.structured_data,
            w.fast_dom_slow_fcp,
            w.fast_fcp,
            w.slow_dom_fast_fcp,
            w.spa_root_pattern,
            w.noscript_fallback,
            w.dynamic_body_classes,
            w.raw_vs_rendered_csr,
            w.raw_vs_rendered_ssr,
            w.hybrid.islands,
            w.hybrid.partial_hydration,
            w.hybrid.server_components,
            w.hybrid.streaming,
            w.hybrid.progressive_enhancement,
            w.hybrid.resumability,
            w.hybrid.interactive_content,
        ]
        .iter()
        .any(|v| *v < 0.0 || !v.is_finite());
        if negative {
            return Err(Error::Config(
                "detection.weights must be finite and non-negative".to_string(),
            ));
        }

        if self.fetch.timeout_secs == 0 {
            return Err(Error::Config("fetch.timeout_secs must be positive".to_string()));
        }

        if self.telemetry.vitals_timeout_ms == 0 {
            return Err(Error::Config(
                "telemetry.vitals_timeout_ms must be positive".to_string(),
            ));
        }

        if let Some(endpoint) = &self.telemetry.endpoint {
            url::Url::parse(endpoint).map_err(|e| {
                Error::Config(format!("telemetry.endpoint is not a valid URL: {}", e))
            })?;
        }

        Ok(())
    }
}
