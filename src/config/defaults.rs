//! Default values for configuration

use super::Signature;

/// Default user agent
pub fn default_fetch_user_agent() -> String {
    format!(
        "Mozilla/5.0 (compatible; renderlens/{}; +https://github.com/sealad886/renderlens)",
        env!("CARGO_PKG_VERSION")
    )
}

/// Default request timeout in seconds
pub fn default_fetch_timeout() -> u64 {
    30
}

/// Default: compare raw HTML against the rendered DOM
pub fn default_compare_raw_html() -> bool {
    true
}

/// Default: plain HTTP snapshots, no headless browser
pub fn default_js_rendering() -> bool {
    false
}

/// Default page load timeout for JS rendering (30 seconds)
pub fn default_js_page_load_timeout() -> u64 {
    30000
}

/// Default wait time after page load for dynamic content (2 seconds)
pub fn default_js_render_wait() -> u64 {
    2000
}

/// Default: telemetry is opt-in
pub fn default_telemetry_enabled() -> bool {
    false
}

/// Default Core Web Vitals race budget (milliseconds)
pub fn default_vitals_timeout() -> u64 {
    500
}

fn sig(name: &str, selector: &str) -> Signature {
    Signature {
        name: name.to_string(),
        selector: selector.to_string(),
    }
}

/// Hydration markers left in the DOM by each framework
pub fn default_framework_signatures() -> Vec<Signature> {
    vec![
        sig("React", "[data-reactroot], [data-reactid]"),
        sig("Next.js", "#__next, script#__NEXT_DATA__"),
        sig("Vue", "[data-server-rendered], [data-v-app]"),
        sig("Nuxt", "#__nuxt, #__layout"),
        sig("Gatsby", "#___gatsby"),
        sig("Remix", "script[data-remix-run], [data-remix-run]"),
        sig("SvelteKit", "[data-sveltekit-hydrate], [data-sveltekit-preload-data]"),
        sig("Svelte", "[class*=\"svelte-\"]"),
        sig("Angular", "[ng-version], [ng-server-context]"),
        sig("Astro", "astro-island, [data-astro-cid]"),
        sig("Ember", ".ember-view, [data-ember-action]"),
        sig("Drupal", "[data-drupal-selector], [data-drupal-link-system-path]"),
        sig("WordPress", "link[href*=\"wp-content\"], [class*=\"wp-block\"]"),
    ]
}

/// Static site generators, matched against `<meta name="generator">`
pub fn default_generator_signatures() -> Vec<Signature> {
    vec![
        sig("Hugo", "meta[name=\"generator\"][content*=\"Hugo\"]"),
        sig("Jekyll", "meta[name=\"generator\"][content*=\"Jekyll\"]"),
        sig("Gatsby", "meta[name=\"generator\"][content*=\"Gatsby\"]"),
        sig("Eleventy", "meta[name=\"generator\"][content*=\"Eleventy\"]"),
        sig("Hexo", "meta[name=\"generator\"][content*=\"Hexo\"]"),
        sig("Docusaurus", "meta[name=\"generator\"][content*=\"Docusaurus\"]"),
        sig("VuePress", "meta[name=\"generator\"][content*=\"VuePress\"]"),
        sig("VitePress", "meta[name=\"generator\"][content*=\"VitePress\"]"),
        sig("Astro", "meta[name=\"generator\"][content*=\"Astro\"]"),
        sig("Pelican", "meta[name=\"generator\"][content*=\"Pelican\"]"),
        sig("MkDocs", "meta[name=\"generator\"][content*=\"mkdocs\"]"),
    ]
}

/// Router outlets that only exist in client-routed applications
pub fn default_router_signatures() -> Vec<Signature> {
    vec![
        sig("Angular Router", "router-outlet"),
        sig("AngularJS Router", "[ng-view], [ui-view]"),
        sig("Vue Router", "router-view, [data-router-view]"),
        sig("React Router", "[data-react-router], [data-discover]"),
        sig("Ember Router", "[data-ember-router]"),
    ]
}

/// Global variables that carry server-computed state into the page
pub fn default_serialized_state_globals() -> Vec<String> {
    [
        "__NEXT_DATA__",
        "__NUXT__",
        "__INITIAL_STATE__",
        "__PRELOADED_STATE__",
        "__APOLLO_STATE__",
        "__remixContext",
        "__staticRouterHydrationData",
        "__SVELTEKIT_DATA__",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

/// Framework names looked for in `<script src>` URLs
pub fn default_framework_script_names() -> Vec<String> {
    [
        "react", "preact", "vue", "angular", "svelte", "next", "nuxt", "gatsby", "remix",
        "ember", "solid", "qwik", "astro",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

/// URL fragments that mark chunked, hydrating bundles
pub fn default_hydration_script_hints() -> Vec<String> {
    ["chunk", "_next/static", "_nuxt/", "hydrat", "client"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

/// Semantic content elements counted by the richness check
pub fn default_semantic_selector() -> String {
    "article, section, main, header, footer, nav, aside, h1, h2, h3, h4, h5, h6, p".to_string()
}

/// Elements a user can interact with
pub fn default_interactive_selector() -> String {
    "button, input, select, textarea, [onclick], [role=\"button\"], [tabindex]".to_string()
}
