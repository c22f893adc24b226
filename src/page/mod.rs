//! Page snapshots
//!
//! A [`PageSnapshot`] is the read-only view every detector works against:
//! the rendered document, its navigation/paint timings, and the handful of
//! runtime facts that can only be read from a live JavaScript heap.
//!
//! Snapshots come from three places:
//! - a headless browser session (`js-rendering` feature)
//! - a saved rendered DOM plus the page URL
//! - a plain HTTP fetch, where the rendered DOM is the raw HTML

mod fetch;
mod renderer;

pub use fetch::*;
pub use renderer::*;

use scraper::{ElementRef, Html, Node, Selector};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Where a snapshot's DOM came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SnapshotSource {
    /// Plain HTTP response body, no script executed
    Http,
    /// Rendered DOM saved to disk
    File,
    /// Headless browser after scripts ran
    Browser,
}

/// Navigation and paint timing, in milliseconds
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageTiming {
    /// `domContentLoadedEventEnd - domContentLoadedEventStart`
    pub dom_content_loaded: Option<f64>,
    /// First Contentful Paint
    pub first_contentful_paint: Option<f64>,
    /// `responseStart - requestStart`
    pub time_to_first_byte: Option<f64>,
    /// `loadEventEnd - startTime`
    pub load_complete: Option<f64>,
}

/// Facts read from the page's JavaScript heap
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuntimeProbes {
    /// `#root`/`#app` carries `_reactRootContainer` or a `__reactContainer$` key
    pub react_root_container: bool,
    /// `#root`/`#app` carries `__vue__` or `__vue_app__`
    pub vue_instance: bool,
    /// Console errors mentioning hydration
    pub hydration_errors: Vec<String>,
    /// `history.pushState` calls observed while the page settled
    pub history_navigations: u32,
}

/// Core Web Vitals samples gathered by the page itself
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VitalsSample {
    pub largest_contentful_paint: Option<f64>,
    pub cumulative_layout_shift: Option<f64>,
    pub first_input_delay: Option<f64>,
    pub total_blocking_time: Option<f64>,
}

/// Browser and connection the page was observed in
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientEnvironment {
    pub user_agent: Option<String>,
    pub viewport_width: Option<u32>,
    pub viewport_height: Option<u32>,
    pub device_pixel_ratio: Option<f64>,
    pub connection_type: Option<String>,
}

/// Read-only view of one page
#[derive(Debug, Clone)]
pub struct PageSnapshot {
    url: String,
    source: SnapshotSource,
    document: Html,
    body_html: String,
    body_text: String,
    timing: PageTiming,
    probes: RuntimeProbes,
    vitals: VitalsSample,
    environment: ClientEnvironment,
}

impl PageSnapshot {
    /// Parse an HTML document into a snapshot
    pub fn from_html(url: &str, html: &str, source: SnapshotSource) -> Self {
        let document = Html::parse_document(html);

        let (body_html, body_text) = match body_of(&document) {
            Some(body) => (body.inner_html(), visible_text(body)),
            None => (String::new(), String::new()),
        };

        debug!(
            "Snapshot for {}: {} bytes of body HTML, {} chars of text",
            url,
            body_html.len(),
            body_text.chars().count()
        );

        Self {
            url: url.to_string(),
            source,
            document,
            body_html,
            body_text,
            timing: PageTiming::default(),
            probes: RuntimeProbes::default(),
            vitals: VitalsSample::default(),
            environment: ClientEnvironment::default(),
        }
    }

    pub fn with_timing(mut self, timing: PageTiming) -> Self {
        self.timing = timing;
        self
    }

    pub fn with_probes(mut self, probes: RuntimeProbes) -> Self {
        self.probes = probes;
        self
    }

    pub fn with_vitals(mut self, vitals: VitalsSample) -> Self {
        self.vitals = vitals;
        self
    }

    pub fn with_environment(mut self, environment: ClientEnvironment) -> Self {
        self.environment = environment;
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn source(&self) -> SnapshotSource {
        self.source
    }

    pub fn document(&self) -> &Html {
        &self.document
    }

    /// The `<body>` element, if the document has one
    pub fn body(&self) -> Option<ElementRef<'_>> {
        body_of(&self.document)
    }

    /// Serialized inner HTML of `<body>`, comments included
    pub fn body_html(&self) -> &str {
        &self.body_html
    }

    /// Visible body text with whitespace collapsed
    pub fn body_text(&self) -> &str {
        &self.body_text
    }

    /// Length of the visible body text in characters
    pub fn text_length(&self) -> usize {
        self.body_text.chars().count()
    }

    pub fn timing(&self) -> &PageTiming {
        &self.timing
    }

    pub fn probes(&self) -> &RuntimeProbes {
        &self.probes
    }

    pub fn vitals(&self) -> &VitalsSample {
        &self.vitals
    }

    pub fn environment(&self) -> &ClientEnvironment {
        &self.environment
    }

    /// Elements matching `selector`, or `None` if the selector does not parse
    pub fn select_all(&self, selector: &str) -> Option<Vec<ElementRef<'_>>> {
        let selector = parse_selector(selector)?;
        Some(self.document.select(&selector).collect())
    }

    /// Number of elements matching `selector`; an unparsable selector counts zero
    pub fn count(&self, selector: &str) -> usize {
        parse_selector(selector)
            .map(|s| self.document.select(&s).count())
            .unwrap_or(0)
    }

    /// Whether any element matches `selector`
    pub fn exists(&self, selector: &str) -> bool {
        parse_selector(selector)
            .map(|s| self.document.select(&s).next().is_some())
            .unwrap_or(false)
    }

    /// Total number of elements in the document
    pub fn element_count(&self) -> usize {
        self.document
            .tree
            .nodes()
            .filter(|n| n.value().is_element())
            .count()
    }
}

/// Parse a CSS selector, logging and discarding it when invalid
pub fn parse_selector(selector: &str) -> Option<Selector> {
    match Selector::parse(selector) {
        Ok(s) => Some(s),
        Err(e) => {
            debug!("Skipping invalid selector {:?}: {:?}", selector, e);
            None
        }
    }
}

fn body_of(document: &Html) -> Option<ElementRef<'_>> {
    let selector = parse_selector("body")?;
    document.select(&selector).next()
}

/// Text a user would see inside `element`: script, style, noscript and
/// template contents are skipped and whitespace runs collapse to one space.
pub fn visible_text(element: ElementRef<'_>) -> String {
    let mut raw = String::new();
    collect_visible_text(element, &mut raw);
    collapse_whitespace(&raw)
}

fn collect_visible_text(element: ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => out.push_str(text),
            Node::Element(el) => {
                if matches!(el.name(), "script" | "style" | "noscript" | "template") {
                    continue;
                }
                if let Some(child_el) = ElementRef::wrap(child) {
                    if is_block(el.name()) {
                        out.push(' ');
                    }
                    collect_visible_text(child_el, out);
                    if is_block(el.name()) {
                        out.push(' ');
                    }
                }
            }
            _ => {}
        }
    }
}

fn is_block(name: &str) -> bool {
    matches!(
        name,
        "p" | "div"
            | "section"
            | "article"
            | "main"
            | "header"
            | "footer"
            | "nav"
            | "aside"
            | "li"
            | "ul"
            | "ol"
            | "tr"
            | "td"
            | "th"
            | "br"
            | "h1"
            | "h2"
            | "h3"
            | "h4"
            | "h5"
            | "h6"
            | "pre"
            | "blockquote"
    )
}

/// Collapse whitespace runs to single spaces and trim
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_visible_text_skips_scripts_and_styles() {
        let html = r#"
            <html><head><title>T</title><style>.a { color: red }</style></head>
            <body>
                <h1>Hello</h1>
                <script>window.__STATE__ = {"big": "blob"};</script>
                <p>World  of   text</p>
                <noscript>Enable JavaScript</noscript>
            </body></html>
        "#;
        let page = PageSnapshot::from_html("https://example.com", html, SnapshotSource::Http);
        assert_eq!(page.body_text(), "Hello World of text");
        assert_eq!(page.text_length(), "Hello World of text".len());
    }

    #[test]
    fn test_block_elements_do_not_glue_words() {
        let html = "<html><body><p>one</p><p>two</p><span>th</span><b>ree</b></body></html>";
        let page = PageSnapshot::from_html("https://example.com", html, SnapshotSource::Http);
        assert_eq!(page.body_text(), "one two three");
    }

    #[test]
    fn test_invalid_selector_is_isolated() {
        let html = "<html><body><div id=\"root\"></div></body></html>";
        let page = PageSnapshot::from_html("https://example.com", html, SnapshotSource::Http);
        assert_eq!(page.count("div[[["), 0);
        assert!(!page.exists("div[[["));
        assert!(page.select_all("div[[[").is_none());
        assert!(page.exists("#root"));
    }

    #[test]
    fn test_element_count_includes_implied_elements() {
        let page = PageSnapshot::from_html(
            "https://example.com",
            "<div id=\"root\"></div>",
            SnapshotSource::File,
        );
        // html, head, body, div
        assert_eq!(page.element_count(), 4);
    }

    #[test]
    fn test_body_html_keeps_comments() {
        let page = PageSnapshot::from_html(
            "https://example.com",
            "<html><body><!--$--><p>streamed</p><!--/$--></body></html>",
            SnapshotSource::Browser,
        );
        assert!(page.body_html().contains("<!--$-->"));
        assert!(page.body_html().contains("<!--/$-->"));
    }
}
