//! Paginated JSON feed harvesting
//!
//! Reads WordPress-style post APIs (`/wp-json/wp/v2/posts?page={}`) page by page and turns
//! each post into a [`PageDocument`].

use crate::crawler::fetcher::Fetcher;
use crate::extract::{crawl_date, DateSource, PageDocument, DATE_FORMAT};
use chrono::NaiveDateTime;
use scraper::Html;
use serde::Deserialize;
use url::Url;

const FEED_DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

#[derive(Debug, Clone, Deserialize)]
pub struct Rendered {
    pub rendered: String,
}

/// One post of a feed page
#[derive(Debug, Clone, Deserialize)]
pub struct FeedPost {
    pub link: String,
    pub title: Rendered,
    #[serde(default)]
    pub content: Option<Rendered>,
    #[serde(default)]
    pub date: Option<String>,
}

impl FeedPost {
    /// Converts the post into a document ready for chunking
    ///
    /// Markup is stripped from title and content; line breaks in the content become spaces.
    pub fn into_document(self) -> PageDocument {
        let raw_text = self
            .content
            .map(|c| {
                strip_markup(&c.rendered)
                    .replace('\n', " ")
                    .replace('\r', "")
                    .trim()
                    .to_string()
            })
            .unwrap_or_default();

        let (extracted_date, date_source) = match self.date.as_deref().and_then(reformat_date) {
            Some(date) => (date, DateSource::Page),
            None => (crawl_date(), DateSource::CrawlTime),
        };

        PageDocument {
            url: self.link,
            title: strip_markup(&self.title.rendered).trim().to_string(),
            raw_text,
            extracted_date,
            date_source,
        }
    }
}

fn strip_markup(html: &str) -> String {
    Html::parse_fragment(html).root_element().text().collect()
}

fn reformat_date(date: &str) -> Option<String> {
    NaiveDateTime::parse_from_str(date, FEED_DATE_FORMAT)
        .ok()
        .map(|d| d.format(DATE_FORMAT).to_string())
}

/// Builds the URL of a feed page from a template containing `{}`
pub fn feed_page_url(template: &str, page: u32) -> Result<Url, url::ParseError> {
    Url::parse(&template.replacen("{}", &page.to_string(), 1))
}

/// Walks a feed's pages from 1 until the feed runs dry
///
/// Stops at the first non-success status, fetch error, unparseable page or empty page.
#[derive(Debug)]
pub struct FeedPager {
    template: String,
    next_page: u32,
    done: bool,
}

impl FeedPager {
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
            next_page: 1,
            done: false,
        }
    }

    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Fetches the next page of posts, or `None` once the feed is exhausted
    pub async fn next_batch(&mut self, fetcher: &Fetcher) -> Option<Vec<FeedPost>> {
        if self.done {
            return None;
        }

        let page = self.next_page;
        let posts = self.fetch_page(fetcher, page).await;
        match posts {
            Some(posts) if !posts.is_empty() => {
                self.next_page += 1;
                Some(posts)
            }
            _ => {
                tracing::info!("Feed {} ended at page {}", self.template, page);
                self.done = true;
                None
            }
        }
    }

    async fn fetch_page(&self, fetcher: &Fetcher, page: u32) -> Option<Vec<FeedPost>> {
        let url = match feed_page_url(&self.template, page) {
            Ok(url) => url,
            Err(e) => {
                tracing::warn!("Invalid feed URL from {}: {}", self.template, e);
                return None;
            }
        };

        let fetched = match fetcher.fetch(&url).await {
            Ok(fetched) => fetched,
            Err(e) => {
                tracing::debug!("Feed page {} unavailable: {}", url, e);
                return None;
            }
        };

        match serde_json::from_str::<Vec<FeedPost>>(&fetched.body) {
            Ok(posts) => Some(posts),
            Err(e) => {
                tracing::warn!("Unexpected feed body at {}: {}", url, e);
                None
            }
        }
    }
}
