//! Link discovery for fetched pages
//!
//! Only the raw `href` values are collected here. Resolution, scoping and deduplication are the
//! frontier's job, so that every rejection rule lives in one place.

use scraper::{Html, Selector};
use std::sync::OnceLock;

fn anchor_selector() -> &'static Selector {
    static SELECTOR: OnceLock<Selector> = OnceLock::new();
    SELECTOR.get_or_init(|| Selector::parse("a[href]").expect("static selector"))
}

/// Returns the `href` of every `<a>` element in document order
///
/// **Excluded:** anchors carrying the `download` attribute and anchors whose `href` is blank.
///
/// **Note:** `rel="nofollow"` links ARE returned
///
/// # Example
///
/// ```
/// use page_harvest::crawler::extract_links;
/// use scraper::Html;
///
/// let html = Html::parse_document(r#"<body><a href="/a">A</a><a href="b">B</a></body>"#);
/// assert_eq!(extract_links(&html), vec!["/a", "b"]);
/// ```
pub fn extract_links(document: &Html) -> Vec<String> {
    document
        .select(anchor_selector())
        .filter(|element| element.value().attr("download").is_none())
        .filter_map(|element| element.value().attr("href"))
        .map(str::trim)
        .filter(|href| !href.is_empty())
        .map(str::to_string)
        .collect()
}

/// Returns the trimmed text of the first `<title>` element, if it has any
pub fn extract_title(document: &Html) -> Option<String> {
    static SELECTOR: OnceLock<Selector> = OnceLock::new();
    let selector = SELECTOR.get_or_init(|| Selector::parse("title").expect("static selector"));

    document
        .select(selector)
        .next()
        .map(|element| element.text().collect::<String>().trim().to_string())
        .filter(|s| !s.is_empty())
}
