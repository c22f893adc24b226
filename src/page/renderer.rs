//! Headless browser snapshots
//!
//! Uses Chrome DevTools Protocol via chromiumoxide to load a page, let its
//! scripts run, and capture the rendered DOM together with timing entries,
//! runtime probes and Web Vitals samples.

use super::{ClientEnvironment, PageTiming, RuntimeProbes, VitalsSample};
use crate::error::{Error, Result};
use serde::Deserialize;

/// Configuration for the headless browser renderer
#[derive(Debug, Clone)]
pub struct RendererConfig {
    /// Time to wait for page load (milliseconds)
    pub page_load_timeout_ms: u64,
    /// Time to wait after load for dynamic content (milliseconds)
    pub render_wait_ms: u64,
    /// Enable sandbox (disable for Docker/CI environments)
    pub sandbox: bool,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            page_load_timeout_ms: 30000,
            render_wait_ms: 2000,
            sandbox: true,
        }
    }
}

impl From<&crate::config::FetchConfig> for RendererConfig {
    fn from(config: &crate::config::FetchConfig) -> Self {
        Self {
            page_load_timeout_ms: config.js_page_load_timeout_ms,
            render_wait_ms: config.js_render_wait_ms,
            sandbox: !config.js_no_sandbox,
        }
    }
}

/// Installed before any page script runs. Records hydration console errors
/// and pushState calls, and buffers Web Vitals observers so they can be
/// read and disconnected by the capture script.
pub const INSTRUMENT_SCRIPT: &str = r#"
(() => {
  const w = window;
  w.__renderlens = { hydrationErrors: [], pushes: 0, lcp: null, cls: 0, fid: null, tbt: 0, observers: [] };
  const state = w.__renderlens;
  const origError = console.error;
  console.error = function (...args) {
    const msg = args.map(String).join(' ');
    if (/hydrat|did not match|server-rendered/i.test(msg)) state.hydrationErrors.push(msg.slice(0, 300));
    return origError.apply(this, args);
  };
  const origPush = history.pushState;
  history.pushState = function (...args) { state.pushes += 1; return origPush.apply(this, args); };
  const observe = (type, cb) => {
    try {
      const o = new PerformanceObserver((list) => list.getEntries().forEach(cb));
      o.observe({ type, buffered: true });
      state.observers.push(o);
    } catch (_) {}
  };
  observe('largest-contentful-paint', (e) => { state.lcp = e.startTime; });
  observe('layout-shift', (e) => { if (!e.hadRecentInput) state.cls += e.value; });
  observe('first-input', (e) => { state.fid = e.processingStart - e.startTime; });
  observe('longtask', (e) => { state.tbt += Math.max(0, e.duration - 50); });
})();
"#;

/// Reads everything the detectors need and disconnects the observers.
pub const CAPTURE_SCRIPT: &str = r#"
(() => {
  const nav = performance.getEntriesByType('navigation')[0];
  const fcp = performance.getEntriesByName('first-contentful-paint')[0];
  const state = window.__renderlens || { hydrationErrors: [], pushes: 0, observers: [] };
  (state.observers || []).forEach((o) => { try { o.disconnect(); } catch (_) {} });
  const root = document.getElementById('root') || document.getElementById('app');
  const keys = root ? Object.keys(root) : [];
  const conn = navigator.connection || {};
  return JSON.stringify({
    html: document.documentElement.outerHTML,
    timing: {
      domContentLoaded: nav ? nav.domContentLoadedEventEnd - nav.domContentLoadedEventStart : null,
      firstContentfulPaint: fcp ? fcp.startTime : null,
      timeToFirstByte: nav ? nav.responseStart - nav.requestStart : null,
      loadComplete: nav && nav.loadEventEnd > 0 ? nav.loadEventEnd - nav.startTime : null,
    },
    probes: {
      reactRootContainer: !!root && (!!root._reactRootContainer || keys.some((k) => k.startsWith('__reactContainer'))),
      vueInstance: !!root && (!!root.__vue__ || !!root.__vue_app__),
      hydrationErrors: state.hydrationErrors || [],
      historyNavigations: state.pushes || 0,
    },
    vitals: {
      largestContentfulPaint: state.lcp ?? null,
      cumulativeLayoutShift: typeof state.cls === 'number' ? state.cls : null,
      firstInputDelay: state.fid ?? null,
      totalBlockingTime: typeof state.tbt === 'number' ? state.tbt : null,
    },
    environment: {
      userAgent: navigator.userAgent,
      viewportWidth: window.innerWidth,
      viewportHeight: window.innerHeight,
      devicePixelRatio: window.devicePixelRatio,
      connectionType: conn.effectiveType || null,
    },
  });
})()
"#;

/// Shape of [`CAPTURE_SCRIPT`]'s JSON output
#[derive(Debug, Deserialize)]
pub struct BrowserCapture {
    pub html: String,
    #[serde(default)]
    pub timing: PageTiming,
    #[serde(default)]
    pub probes: RuntimeProbes,
    #[serde(default)]
    pub vitals: VitalsSample,
    #[serde(default)]
    pub environment: ClientEnvironment,
}

impl BrowserCapture {
    /// Parse the capture script's JSON
    pub fn parse(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| Error::Render(format!("Malformed page capture: {}", e)))
    }

    /// Turn the capture into a snapshot of `url`
    pub fn into_snapshot(self, url: &str) -> super::PageSnapshot {
        super::PageSnapshot::from_html(url, &self.html, super::SnapshotSource::Browser)
            .with_timing(self.timing)
            .with_probes(self.probes)
            .with_vitals(self.vitals)
            .with_environment(self.environment)
    }
}

#[cfg(feature = "js-rendering")]
mod browser_impl {
    use super::*;
    use crate::page::PageSnapshot;
    use chromiumoxide::browser::{Browser, BrowserConfig};
    use chromiumoxide::cdp::browser_protocol::page::AddScriptToEvaluateOnNewDocumentParams;
    use futures::StreamExt;
    use std::time::Duration;
    use tokio::sync::Mutex;
    use tokio::time::{timeout, Instant};
    use tracing::{debug, info, warn};

    /// Headless browser renderer
    pub struct HeadlessRenderer {
        config: RendererConfig,
        browser: Mutex<Option<Browser>>,
        handler_handle: Mutex<Option<tokio::task::JoinHandle<()>>>,
    }

    impl HeadlessRenderer {
        /// Create a new headless renderer
        pub fn new(config: RendererConfig) -> Self {
            Self {
                config,
                browser: Mutex::new(None),
                handler_handle: Mutex::new(None),
            }
        }

        /// Initialize the browser (lazy initialization)
        async fn ensure_browser(&self) -> Result<()> {
            let mut browser_guard = self.browser.lock().await;
            if browser_guard.is_some() {
                return Ok(());
            }

            info!("Launching headless Chrome browser...");

            let mut builder = BrowserConfig::builder();
            if !self.config.sandbox {
                builder = builder.no_sandbox();
            }

            builder = builder
                .arg("--disable-gpu")
                .arg("--disable-dev-shm-usage")
                .arg("--no-first-run")
                .arg("--disable-extensions");

            let browser_config = builder
                .build()
                .map_err(|e| Error::Render(format!("Failed to build browser config: {}", e)))?;

            let (browser, mut handler) = Browser::launch(browser_config)
                .await
                .map_err(|e| Error::Render(format!("Failed to launch browser: {}", e)))?;

            let handle = tokio::spawn(async move {
                while let Some(result) = handler.next().await {
                    if result.is_err() {
                        break;
                    }
                }
            });

            *browser_guard = Some(browser);
            *self.handler_handle.lock().await = Some(handle);

            info!("Headless browser launched successfully");
            Ok(())
        }

        /// Load `url`, let it settle, and capture a snapshot
        pub async fn render(&self, url: &str) -> Result<PageSnapshot> {
            self.ensure_browser().await?;

            let start = Instant::now();
            debug!("Rendering page with headless browser: {}", url);

            let browser_guard = self.browser.lock().await;
            let browser = browser_guard
                .as_ref()
                .ok_or_else(|| Error::Render("Browser not initialized".to_string()))?;

            let page = browser
                .new_page("about:blank")
                .await
                .map_err(|e| Error::Render(format!("Failed to create page: {}", e)))?;

            page.evaluate_on_new_document(AddScriptToEvaluateOnNewDocumentParams::new(
                INSTRUMENT_SCRIPT,
            ))
            .await
            .map_err(|e| Error::Render(format!("Failed to install instrumentation: {}", e)))?;

            let load_timeout = Duration::from_millis(self.config.page_load_timeout_ms);
            timeout(load_timeout, async {
                page.goto(url).await?;
                page.wait_for_navigation().await.map(|_| ())
            })
            .await
            .map_err(|_| Error::Render(format!("Page load timeout: {}", url)))?
            .map_err(|e| Error::Render(format!("Navigation failed: {}", e)))?;

            if self.config.render_wait_ms > 0 {
                tokio::time::sleep(Duration::from_millis(self.config.render_wait_ms)).await;
            }

            let final_url = page
                .url()
                .await
                .map_err(|e| Error::Render(format!("Failed to get URL: {}", e)))?
                .unwrap_or_else(|| url.to_string());

            let capture_json: String = page
                .evaluate(CAPTURE_SCRIPT)
                .await
                .map_err(|e| Error::Render(format!("Failed to capture page: {}", e)))?
                .into_value()
                .map_err(|e| Error::Render(format!("Capture returned no string: {}", e)))?;

            if let Err(e) = page.close().await {
                warn!("Failed to close page: {}", e);
            }

            debug!("Rendered {} in {}ms", url, start.elapsed().as_millis());

            let capture = BrowserCapture::parse(&capture_json)?;
            Ok(capture.into_snapshot(&final_url))
        }

        /// Close the browser
        pub async fn close(&self) -> Result<()> {
            let mut browser_guard = self.browser.lock().await;
            if let Some(mut browser) = browser_guard.take() {
                browser
                    .close()
                    .await
                    .map_err(|e| Error::Render(format!("Failed to close browser: {}", e)))?;
            }

            if let Some(handle) = self.handler_handle.lock().await.take() {
                handle.abort();
            }

            Ok(())
        }
    }
}

#[cfg(feature = "js-rendering")]
pub use browser_impl::HeadlessRenderer;

/// Stub renderer when js-rendering feature is disabled
#[cfg(not(feature = "js-rendering"))]
pub struct HeadlessRenderer {
    _config: RendererConfig,
}

#[cfg(not(feature = "js-rendering"))]
impl HeadlessRenderer {
    pub fn new(config: RendererConfig) -> Self {
        Self { _config: config }
    }

    pub async fn render(&self, url: &str) -> Result<super::PageSnapshot> {
        Err(Error::Render(format!(
            "JavaScript rendering not available for {}. \
             Compile with --features js-rendering to enable headless browser support.",
            url
        )))
    }

    pub async fn close(&self) -> Result<()> {
        Ok(())
    }
}

/// Check if JS rendering feature is available
pub fn is_js_rendering_available() -> bool {
    cfg!(feature = "js-rendering")
}
