//! What kind of page this is

use crate::page::PageSnapshot;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use url::Url;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageType {
    Homepage,
    Article,
    Product,
    Docs,
    Search,
    Category,
    Checkout,
    Contact,
    Login,
    Other,
}

impl fmt::Display for PageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PageType::Homepage => "homepage",
            PageType::Article => "article",
            PageType::Product => "product",
            PageType::Docs => "docs",
            PageType::Search => "search",
            PageType::Category => "category",
            PageType::Checkout => "checkout",
            PageType::Contact => "contact",
            PageType::Login => "login",
            PageType::Other => "other",
        };
        f.write_str(s)
    }
}

/// schema.org types mapped to page types
const SCHEMA_TYPES: [(&str, PageType); 12] = [
    ("Product", PageType::Product),
    ("Offer", PageType::Product),
    ("Article", PageType::Article),
    ("NewsArticle", PageType::Article),
    ("BlogPosting", PageType::Article),
    ("TechArticle", PageType::Docs),
    ("APIReference", PageType::Docs),
    ("SearchResultsPage", PageType::Search),
    ("CollectionPage", PageType::Category),
    ("CheckoutPage", PageType::Checkout),
    ("ContactPage", PageType::Contact),
    ("WebSite", PageType::Homepage),
];

/// Path segments mapped to page types, first match wins
const PATH_HINTS: [(&[&str], PageType); 8] = [
    (&["cart", "checkout", "basket"], PageType::Checkout),
    (&["login", "signin", "sign-in", "auth", "register", "signup"], PageType::Login),
    (&["search"], PageType::Search),
    (&["contact", "contact-us", "support"], PageType::Contact),
    (&["product", "products", "p", "item", "dp"], PageType::Product),
    (&["docs", "documentation", "guide", "guides", "reference", "api", "manual"], PageType::Docs),
    (&["category", "categories", "collections", "shop", "tag", "tags"], PageType::Category),
    (&["blog", "news", "article", "articles", "posts", "post"], PageType::Article),
];

/// Classify the page from structured data, then the URL, then the DOM
pub fn page_type(page: &PageSnapshot) -> PageType {
    let url = Url::parse(page.url()).ok();
    let at_root = url
        .as_ref()
        .map(|u| u.path() == "/" && u.query().is_none())
        .unwrap_or(false);

    // WebSite is declared on every page of many sites; only trust it at the root
    let from_schema = json_ld_types(page).iter().find_map(|t| {
        SCHEMA_TYPES
            .iter()
            .find(|(name, pt)| *name == t.as_str() && (at_root || *pt != PageType::Homepage))
            .map(|(_, pt)| *pt)
    });
    if let Some(pt) = from_schema {
        return pt;
    }

    if at_root {
        return PageType::Homepage;
    }
    if let Some(pt) = url.as_ref().and_then(from_url) {
        return pt;
    }
    from_dom(page)
}

fn from_url(url: &Url) -> Option<PageType> {
    if url.query_pairs().any(|(k, _)| k == "q" || k == "query" || k == "search") {
        return Some(PageType::Search);
    }
    let segments: Vec<String> = url
        .path_segments()
        .map(|s| s.filter(|s| !s.is_empty()).map(|s| s.to_lowercase()).collect())
        .unwrap_or_default();

    PATH_HINTS
        .iter()
        .find(|(hints, _)| segments.iter().any(|s| hints.contains(&s.as_str())))
        .map(|(_, pt)| *pt)
}

fn from_dom(page: &PageSnapshot) -> PageType {
    if page.exists("input[type=\"password\"]") {
        return PageType::Login;
    }
    if page.exists("[itemtype*=\"schema.org/Product\"], [class*=\"add-to-cart\"], [data-product-id]") {
        return PageType::Product;
    }
    if page.exists("input[type=\"search\"]") && page.count("[class*=\"result\"]") > 2 {
        return PageType::Search;
    }
    if page.exists("article h1, article time, [itemprop=\"articleBody\"]") {
        return PageType::Article;
    }
    PageType::Other
}

/// Every `@type` declared in JSON-LD blocks, including `@graph` members
pub fn json_ld_types(page: &PageSnapshot) -> Vec<String> {
    let mut types = Vec::new();
    for script in page
        .select_all("script[type=\"application/ld+json\"]")
        .unwrap_or_default()
    {
        let raw = script.text().collect::<String>();
        if let Ok(value) = serde_json::from_str::<Value>(&raw) {
            collect_types(&value, &mut types);
        }
    }
    types
}

fn collect_types(value: &Value, out: &mut Vec<String>) {
    match value {
        Value::Array(items) => items.iter().for_each(|v| collect_types(v, out)),
        Value::Object(map) => {
            match map.get("@type") {
                Some(Value::String(t)) => out.push(t.clone()),
                Some(Value::Array(ts)) => {
                    out.extend(ts.iter().filter_map(|t| t.as_str().map(String::from)))
                }
                _ => {}
            }
            if let Some(graph) = map.get("@graph") {
                collect_types(graph, out);
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::SnapshotSource;

    fn snapshot(url: &str, html: &str) -> PageSnapshot {
        PageSnapshot::from_html(url, html, SnapshotSource::File)
    }

    #[test]
    fn test_json_ld_wins() {
        let page = snapshot(
            "https://shop.example.com/blog/sale",
            r#"<html><head><script type="application/ld+json">
            {"@context":"https://schema.org","@type":"Product","name":"Lamp"}
            </script></head><body></body></html>"#,
        );
        assert_eq!(page_type(&page), PageType::Product);
    }

    #[test]
    fn test_json_ld_graph() {
        let page = snapshot(
            "https://example.com/x",
            r#"<script type="application/ld+json">
            {"@graph":[{"@type":"WebSite"},{"@type":["BlogPosting"]}]}
            </script>"#,
        );
        assert_eq!(json_ld_types(&page), vec!["WebSite", "BlogPosting"]);
        assert_eq!(page_type(&page), PageType::Article);
    }

    #[test]
    fn test_root_is_homepage() {
        assert_eq!(page_type(&snapshot("https://example.com/", "<p>hi</p>")), PageType::Homepage);
    }

    #[test]
    fn test_url_hints() {
        let cases = [
            ("https://example.com/docs/getting-started", PageType::Docs),
            ("https://example.com/cart", PageType::Checkout),
            ("https://example.com/users/sign-in", PageType::Login),
            ("https://example.com/find?q=lamps", PageType::Search),
            ("https://example.com/collections/lamps", PageType::Category),
            ("https://example.com/blog/2024/launch", PageType::Article),
        ];
        for (url, expected) in cases {
            assert_eq!(page_type(&snapshot(url, "<p>x</p>")), expected, "{}", url);
        }
    }

    #[test]
    fn test_dom_hints() {
        let login = snapshot(
            "https://example.com/account",
            r#"<form><input type="email"><input type="password"></form>"#,
        );
        assert_eq!(page_type(&login), PageType::Login);

        let article = snapshot(
            "https://example.com/2024/launch",
            "<article><h1>Launch</h1><p>Text</p></article>",
        );
        assert_eq!(page_type(&article), PageType::Article);

        assert_eq!(
            page_type(&snapshot("https://example.com/about", "<p>x</p>")),
            PageType::Other
        );
    }

    #[test]
    fn test_malformed_json_ld_is_ignored() {
        let page = snapshot(
            "https://example.com/about",
            r#"<script type="application/ld+json">{not json</script>"#,
        );
        assert!(json_ld_types(&page).is_empty());
        assert_eq!(page_type(&page), PageType::Other);
    }
}
