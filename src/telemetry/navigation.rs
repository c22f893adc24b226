//! Client-side navigation probe

use crate::config::Signatures;
use crate::page::PageSnapshot;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use url::Url;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NavigationData {
    pub client_side_routing: bool,
    pub hash_routing: bool,
    pub hash_routes: Vec<String>,
    pub internal_links: usize,
    /// Links owned by a client router (`routerLink`, `data-discover`, ...)
    pub router_links: usize,
}

const ROUTER_LINK_SELECTORS: &str =
    "a[routerlink], a[ng-href], a[data-discover], a[data-router-link], a[to], router-link, a[data-sveltekit-preload-data]";

pub fn navigation_data(page: &PageSnapshot, signatures: &Signatures) -> NavigationData {
    let base = Url::parse(page.url()).ok();
    let hrefs: Vec<&str> = page
        .select_all("a[href]")
        .unwrap_or_default()
        .into_iter()
        .filter_map(|a| a.value().attr("href"))
        .collect();

    let hash_routes = hash_routes(&hrefs, base.as_ref());
    let internal_links = hrefs
        .iter()
        .filter(|h| is_internal(h, base.as_ref()))
        .count();
    let router_links = page.count(ROUTER_LINK_SELECTORS);

    let router_present = signatures.routers.iter().any(|r| page.exists(&r.selector));
    let client_side_routing =
        page.probes().history_navigations > 0 || router_links > 0 || router_present;

    NavigationData {
        client_side_routing,
        hash_routing: !hash_routes.is_empty(),
        hash_routes,
        internal_links,
        router_links,
    }
}

/// Distinct `#/route` fragments on the page's own host, sorted
fn hash_routes(hrefs: &[&str], base: Option<&Url>) -> Vec<String> {
    let mut routes = BTreeSet::new();
    for href in hrefs {
        if let Some(route) = href.strip_prefix('#') {
            if route.starts_with('/') && route != "/" {
                routes.insert(route.to_string());
            }
            continue;
        }
        let Some(base) = base else { continue };
        let Ok(full) = base.join(href) else { continue };
        if full.host() != base.host() {
            continue;
        }
        if let Some(fragment) = full.fragment() {
            if fragment.starts_with('/') && fragment != "/" {
                routes.insert(fragment.to_string());
            }
        }
    }
    routes.into_iter().collect()
}

fn is_internal(href: &str, base: Option<&Url>) -> bool {
    let lower = href.trim().to_lowercase();
    if lower.starts_with("mailto:") || lower.starts_with("tel:") || lower.starts_with("javascript:") {
        return false;
    }
    match base {
        Some(base) => base
            .join(href)
            .map(|u| u.host() == base.host())
            .unwrap_or(false),
        None => !lower.starts_with("http://") && !lower.starts_with("https://"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::{RuntimeProbes, SnapshotSource};

    fn probe(url: &str, html: &str) -> NavigationData {
        let page = PageSnapshot::from_html(url, html, SnapshotSource::File);
        navigation_data(&page, &Signatures::default())
    }

    #[test]
    fn test_hash_routes() {
        let data = probe(
            "https://app.example.com/",
            r##"<nav>
            <a href="#/settings">Settings</a>
            <a href="#/">Home</a>
            <a href="#top">Top</a>
            <a href="/#/users">Users</a>
            <a href="https://other.example.org/#/elsewhere">Other</a>
            <a href="#/settings">Again</a>
            </nav>"##,
        );
        assert!(data.hash_routing);
        assert_eq!(data.hash_routes, vec!["/settings", "/users"]);
    }

    #[test]
    fn test_internal_links() {
        let data = probe(
            "https://example.com/docs/",
            r#"<a href="intro">Intro</a><a href="/api">API</a>
            <a href="https://example.com/blog">Blog</a>
            <a href="https://github.com/x">GitHub</a>
            <a href="mailto:hi@example.com">Mail</a>"#,
        );
        assert_eq!(data.internal_links, 3);
        assert!(!data.client_side_routing);
    }

    #[test]
    fn test_router_links_and_history() {
        let data = probe(
            "https://example.com/",
            r#"<a href="/a" data-discover="true">A</a><router-outlet></router-outlet>"#,
        );
        assert_eq!(data.router_links, 1);
        assert!(data.client_side_routing);

        let page = PageSnapshot::from_html("https://example.com/", "<p>x</p>", SnapshotSource::Browser)
            .with_probes(RuntimeProbes {
                history_navigations: 2,
                ..Default::default()
            });
        assert!(navigation_data(&page, &Signatures::default()).client_side_routing);
    }
}
