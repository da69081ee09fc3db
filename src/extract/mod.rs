//! Content extraction
//!
//! Turns a parsed HTML page into a [`PageDocument`]: title, joined text of the selected
//! elements, and a best-effort "last updated" date.

pub mod render;

use crate::config::{ExtractConfig, JoinMode};
use crate::crawler::extract_title;
use crate::ExtractError;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;
use std::sync::OnceLock;
use url::Url;

/// Date format used in output records
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Where a document's date came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateSource {
    /// Read from the page itself
    Page,
    /// The page had no date; the crawl date was used
    CrawlTime,
}

/// Extracted content of one page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageDocument {
    pub url: String,
    pub title: String,
    pub raw_text: String,
    pub extracted_date: String,
    pub date_source: DateSource,
}

/// Today's date in output format
pub fn crawl_date() -> String {
    chrono::Local::now().format(DATE_FORMAT).to_string()
}

/// Newline-joined text of `p`, `h1` and `h2` elements, used as the language detection sample
///
/// Independent of the configured extraction tags so the gate behaves the same on every site.
pub fn language_sample(document: &Html) -> String {
    static SELECTOR: OnceLock<Selector> = OnceLock::new();
    let selector = SELECTOR.get_or_init(|| Selector::parse("p, h1, h2").expect("static selector"));

    document
        .select(selector)
        .map(|e| e.text().collect::<String>().trim().to_string())
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Selective DOM extractor built from `[extract]`
#[derive(Debug)]
pub struct Extractor {
    tags: Selector,
    scope: Option<Selector>,
    date: Selector,
    special_tags: Vec<String>,
    class_name: Option<String>,
    join: JoinMode,
}

fn compile(css: &str) -> Result<Selector, ExtractError> {
    Selector::parse(css).map_err(|e| ExtractError::Selector {
        selector: css.to_string(),
        message: format!("{:?}", e),
    })
}

impl Extractor {
    pub fn new(config: &ExtractConfig) -> Result<Self, ExtractError> {
        Ok(Self {
            tags: compile(&config.tags.join(", "))?,
            scope: config.scope_selector.as_deref().map(compile).transpose()?,
            date: compile(&config.date_selector)?,
            special_tags: config
                .special_tags
                .iter()
                .map(|t| t.to_lowercase())
                .collect(),
            class_name: config.class_name.clone(),
            join: config.join,
        })
    }

    /// Extracts a page
    ///
    /// Links are rendered against `link_base` when given, else against the page URL.
    ///
    /// # Errors
    ///
    /// `ExtractError::MissingElement("title")` when the page has no non-blank `<title>`.
    pub fn extract(
        &self,
        document: &Html,
        page_url: &Url,
        link_base: Option<&Url>,
    ) -> Result<PageDocument, ExtractError> {
        let title =
            extract_title(document).ok_or_else(|| ExtractError::MissingElement("title".into()))?;

        let base = link_base.unwrap_or(page_url);
        let raw_text = self
            .kept_elements(document)
            .iter()
            .map(|e| render::render_element(e, base).trim().to_string())
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join(self.join.separator());

        let (extracted_date, date_source) = match self.page_date(document) {
            Some(date) => (date, DateSource::Page),
            None => (crawl_date(), DateSource::CrawlTime),
        };

        Ok(PageDocument {
            url: page_url.to_string(),
            title,
            raw_text,
            extracted_date,
            date_source,
        })
    }

    /// Matching elements in document order, outermost only
    fn kept_elements<'a>(&self, document: &'a Html) -> Vec<ElementRef<'a>> {
        let roots: Vec<ElementRef<'a>> = match &self.scope {
            Some(scope) => document.select(scope).collect(),
            None => vec![document.root_element()],
        };

        let mut kept_ids = HashSet::new();
        let mut kept = Vec::new();

        for root in roots {
            for element in root.select(&self.tags) {
                if kept_ids.contains(&element.id()) || !self.passes_class_filter(&element) {
                    continue;
                }
                let nested = element
                    .ancestors()
                    .any(|ancestor| kept_ids.contains(&ancestor.id()));
                if nested {
                    continue;
                }
                kept_ids.insert(element.id());
                kept.push(element);
            }
        }

        kept
    }

    /// Special tags are kept only when their class list is exactly the configured class
    fn passes_class_filter(&self, element: &ElementRef) -> bool {
        let Some(class_name) = &self.class_name else {
            return true;
        };
        if !self.special_tags.iter().any(|t| t == element.value().name()) {
            return true;
        }

        let classes: Vec<&str> = element.value().classes().collect();
        classes == [class_name.as_str()]
    }

    fn page_date(&self, document: &Html) -> Option<String> {
        let element = document.select(&self.date).next()?;
        let text = element.text().collect::<String>().trim().to_string();
        if !text.is_empty() {
            return Some(text);
        }
        element
            .value()
            .attr("datetime")
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty())
    }
}
