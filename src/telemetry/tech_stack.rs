//! Technology fingerprint: frameworks, CMS, analytics, CDN, CSS frameworks

use crate::config::Signatures;
use crate::page::PageSnapshot;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TechStack {
    pub frameworks: Vec<String>,
    pub cms: Vec<String>,
    pub analytics: Vec<String>,
    pub cdn: Vec<String>,
    pub css_frameworks: Vec<String>,
}

/// A technology and the needles that reveal it in asset URLs or markup
struct Fingerprint {
    name: &'static str,
    needles: &'static [&'static str],
}

const CMS: &[Fingerprint] = &[
    Fingerprint { name: "WordPress", needles: &["/wp-content/", "/wp-includes/"] },
    Fingerprint { name: "Drupal", needles: &["/sites/default/files/", "drupal-settings-json"] },
    Fingerprint { name: "Shopify", needles: &["cdn.shopify.com", "shopify.theme"] },
    Fingerprint { name: "Squarespace", needles: &["static1.squarespace.com", "squarespace-cdn.com"] },
    Fingerprint { name: "Wix", needles: &["static.wixstatic.com", "static.parastorage.com"] },
    Fingerprint { name: "Ghost", needles: &["/ghost/", "ghost-portal"] },
    Fingerprint { name: "Joomla", needles: &["/media/jui/", "/components/com_"] },
    Fingerprint { name: "Webflow", needles: &["assets.website-files.com", "data-wf-page"] },
];

const ANALYTICS: &[Fingerprint] = &[
    Fingerprint { name: "Google Analytics", needles: &["google-analytics.com", "googletagmanager.com/gtag/js"] },
    Fingerprint { name: "Google Tag Manager", needles: &["googletagmanager.com/gtm.js"] },
    Fingerprint { name: "Plausible", needles: &["plausible.io/js"] },
    Fingerprint { name: "Fathom", needles: &["cdn.usefathom.com"] },
    Fingerprint { name: "Segment", needles: &["cdn.segment.com"] },
    Fingerprint { name: "Hotjar", needles: &["static.hotjar.com"] },
    Fingerprint { name: "Matomo", needles: &["matomo.js", "piwik.js"] },
    Fingerprint { name: "Mixpanel", needles: &["cdn.mxpnl.com", "mixpanel"] },
    Fingerprint { name: "Vercel Analytics", needles: &["/_vercel/insights"] },
];

const CDN: &[Fingerprint] = &[
    Fingerprint { name: "Cloudflare", needles: &["cdnjs.cloudflare.com", "/cdn-cgi/"] },
    Fingerprint { name: "jsDelivr", needles: &["cdn.jsdelivr.net"] },
    Fingerprint { name: "unpkg", needles: &["unpkg.com"] },
    Fingerprint { name: "Amazon CloudFront", needles: &["cloudfront.net"] },
    Fingerprint { name: "Akamai", needles: &["akamaihd.net", "akamaized.net"] },
    Fingerprint { name: "Fastly", needles: &["fastly.net"] },
    Fingerprint { name: "Vercel", needles: &["/_vercel/", "vercel.app"] },
    Fingerprint { name: "Netlify", needles: &["netlify.app", "netlify.com"] },
    Fingerprint { name: "Google Hosted Libraries", needles: &["ajax.googleapis.com"] },
];

/// Matched against stylesheet URLs only
const CSS_FRAMEWORK_ASSETS: &[Fingerprint] = &[
    Fingerprint { name: "Bootstrap", needles: &["bootstrap"] },
    Fingerprint { name: "Tailwind CSS", needles: &["tailwind"] },
    Fingerprint { name: "Bulma", needles: &["bulma"] },
    Fingerprint { name: "Foundation", needles: &["foundation.min.css", "foundation.css"] },
];

/// Class-based CSS framework markers
const CSS_FRAMEWORK_SELECTORS: [(&str, &str); 5] = [
    ("Bootstrap", ".container .row > [class*=\"col-\"]"),
    ("Tailwind CSS", "[class*=\"px-\"][class*=\"py-\"], [class*=\"text-gray-\"], [class*=\"bg-slate-\"]"),
    ("Material UI", "[class*=\"MuiBox-\"], [class*=\"MuiButton-\"]"),
    ("Chakra UI", "[class*=\"chakra-\"]"),
    ("Bulma", ".columns > .column"),
];

/// Fingerprint the page. Frameworks come from the same signature table the
/// framework detector uses.
pub fn tech_stack(page: &PageSnapshot, signatures: &Signatures) -> TechStack {
    let assets = asset_urls(page);
    let stylesheets: Vec<&String> = assets.iter().filter(|a| a.ends_with(".css") || a.contains(".css?")).collect();
    let markup = page.document().root_element().html().to_lowercase();

    let frameworks = signatures
        .frameworks
        .iter()
        .filter(|sig| page.exists(&sig.selector))
        .map(|sig| sig.name.clone())
        .collect();

    let mut css_frameworks: Vec<String> = CSS_FRAMEWORK_ASSETS
        .iter()
        .filter(|fp| stylesheets.iter().any(|s| fp.needles.iter().any(|n| s.contains(n))))
        .map(|fp| fp.name.to_string())
        .collect();
    for (name, selector) in CSS_FRAMEWORK_SELECTORS {
        if page.exists(selector) && !css_frameworks.iter().any(|c| c == name) {
            css_frameworks.push(name.to_string());
        }
    }

    TechStack {
        frameworks,
        cms: matches(CMS, &assets, &markup),
        analytics: matches(ANALYTICS, &assets, &markup),
        cdn: matches(CDN, &assets, ""),
        css_frameworks,
    }
}

/// Names of fingerprints whose needles appear in an asset URL or the markup
fn matches(fingerprints: &[Fingerprint], assets: &[String], markup: &str) -> Vec<String> {
    fingerprints
        .iter()
        .filter(|fp| {
            fp.needles.iter().any(|n| {
                assets.iter().any(|a| a.contains(n)) || (!markup.is_empty() && markup.contains(n))
            })
        })
        .map(|fp| fp.name.to_string())
        .collect()
}

/// Lowercased script, stylesheet and image URLs
fn asset_urls(page: &PageSnapshot) -> Vec<String> {
    let mut urls = Vec::new();
    for (selector, attr) in [("script[src]", "src"), ("link[href]", "href"), ("img[src]", "src")] {
        for el in page.select_all(selector).unwrap_or_default() {
            if let Some(value) = el.value().attr(attr) {
                urls.push(value.to_lowercase());
            }
        }
    }
    urls
}
