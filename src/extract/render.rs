//! Plain-text rendering of structured elements
//!
//! Tables become one `"cell - cell;"` line per row, lists one `"- item"` line per item and
//! anchors `[text](url)`, so the structure survives in chunked text.

use regex::Regex;
use scraper::{ElementRef, Selector};
use std::sync::OnceLock;
use url::Url;

fn selector(cell: &'static OnceLock<Selector>, css: &'static str) -> &'static Selector {
    cell.get_or_init(|| Selector::parse(css).expect("static selector"))
}

/// Collapses runs of 3+ newlines to one newline and runs of 3+ spaces to one space
pub fn clean_text(text: &str) -> String {
    static NEWLINES: OnceLock<Regex> = OnceLock::new();
    static SPACES: OnceLock<Regex> = OnceLock::new();

    let newlines = NEWLINES.get_or_init(|| Regex::new(r"\n{3,}").expect("static regex"));
    let spaces = SPACES.get_or_init(|| Regex::new(r" {3,}").expect("static regex"));

    let cleaned = newlines.replace_all(text, "\n");
    spaces.replace_all(&cleaned, " ").into_owned()
}

fn element_text(element: &ElementRef) -> String {
    clean_text(&element.text().collect::<String>())
        .trim()
        .to_string()
}

/// Renders a `<table>` as one `"c1 - c2;\n"` line per row
pub fn render_table(table: &ElementRef) -> String {
    static ROWS: OnceLock<Selector> = OnceLock::new();
    static CELLS: OnceLock<Selector> = OnceLock::new();

    let mut out = String::new();
    for row in table.select(selector(&ROWS, "tr")) {
        let cells: Vec<String> = row
            .select(selector(&CELLS, "td, th"))
            .map(|cell| element_text(&cell))
            .collect();
        out.push_str(&cells.join(" - "));
        out.push_str(";\n");
    }
    out
}

/// Renders a `<ul>`/`<ol>` as one `"- item\n"` line per `<li>`
pub fn render_list(list: &ElementRef) -> String {
    static ITEMS: OnceLock<Selector> = OnceLock::new();

    list.select(selector(&ITEMS, "li"))
        .map(|item| format!("- {}\n", element_text(&item)))
        .collect()
}

/// Renders an `<a>` as `[text](url)`, resolving relative hrefs against `base`
///
/// Anchors without an `href` render as their text.
pub fn render_link(anchor: &ElementRef, base: &Url) -> String {
    let text = element_text(anchor);
    let Some(href) = anchor.value().attr("href").map(str::trim) else {
        return text;
    };

    let target = if href.starts_with("http") {
        href.to_string()
    } else {
        base.join(href)
            .map(|u| u.to_string())
            .unwrap_or_else(|_| href.to_string())
    };

    format!("[{}]({})", text, target)
}

/// Renders any kept element according to its tag
pub fn render_element(element: &ElementRef, base: &Url) -> String {
    match element.value().name() {
        "table" => render_table(element),
        "ul" | "ol" => render_list(element),
        "a" => render_link(element, base),
        _ => element.text().collect::<String>(),
    }
}
