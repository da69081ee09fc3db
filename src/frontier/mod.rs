//! URL frontier and deduplication
//!
//! The frontier decides which discovered links are worth visiting and remembers every URL
//! claimed during the run. Traversal order lives in [`Worklist`].

mod visited;
mod worklist;

pub use visited::VisitedSet;
pub use worklist::{CrawlTarget, Worklist};

use crate::url::{normalize_parsed, site_key};
use url::Url;

const IGNORED_SCHEMES: &[&str] = &["javascript:", "mailto:", "tel:", "data:"];

/// A link accepted by the frontier
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdmittedLink {
    /// Normalized form, used as the visited-set key
    pub url: Url,

    /// The resolved href without its fragment; this is what gets requested
    pub location: Url,
}

/// Link admission rules plus the run's visited set
#[derive(Debug)]
pub struct Frontier {
    visited: VisitedSet,

    /// Lowercase, dot-prefixed extensions
    excluded_extensions: Vec<String>,

    /// Prefixes of the site currently being crawled
    exclude_prefixes: Vec<String>,
}

impl Frontier {
    pub fn new(excluded_extensions: &[String]) -> Self {
        Self {
            visited: VisitedSet::new(),
            excluded_extensions: excluded_extensions
                .iter()
                .map(|e| e.to_lowercase())
                .collect(),
            exclude_prefixes: Vec::new(),
        }
    }

    /// Replaces the excluded URL prefixes; called when the crawl moves to another site
    pub fn set_exclude_prefixes(&mut self, prefixes: &[String]) {
        self.exclude_prefixes = prefixes.to_vec();
    }

    /// Decides whether a link found on `page_url` should be visited
    ///
    /// # Rules (in order)
    ///
    /// 1. Empty hrefs, pure fragments and `javascript:`/`mailto:`/`tel:`/`data:` are rejected
    /// 2. Hrefs ending with an excluded extension are rejected, whatever their domain
    /// 3. The href is resolved against `base_override` (or the page URL) and normalized;
    ///    non-http(s) results are rejected
    /// 4. URLs already visited this run are rejected
    /// 5. URLs whose site key differs from `origin_domain` are rejected
    /// 6. URLs starting with an excluded prefix are rejected
    ///
    /// # Returns
    ///
    /// The accepted link, or `None` when it is rejected. The URL is not claimed; claiming
    /// happens when the target is popped.
    pub fn should_visit(
        &self,
        href: &str,
        page_url: &Url,
        base_override: Option<&Url>,
        origin_domain: &str,
    ) -> Option<AdmittedLink> {
        let href = href.trim();
        if href.is_empty() || href.starts_with('#') {
            return None;
        }
        let lower = href.to_lowercase();
        if IGNORED_SCHEMES.iter().any(|s| lower.starts_with(s)) {
            return None;
        }

        let href_path = lower.split(['?', '#']).next().unwrap_or_default();
        if self.has_excluded_extension(href_path) {
            tracing::trace!("Skipping {} (excluded extension)", href);
            return None;
        }

        let base = base_override.unwrap_or(page_url);
        let mut location = base.join(href).ok()?;
        location.set_fragment(None);
        let url = normalize_parsed(location.clone()).ok()?;

        if self.has_excluded_extension(&url.path().to_lowercase()) {
            return None;
        }

        if self.visited.contains(&url) {
            return None;
        }

        if site_key(&url).as_deref() != Some(origin_domain) {
            tracing::trace!("Skipping {} (off-site)", url);
            return None;
        }

        if self
            .exclude_prefixes
            .iter()
            .any(|prefix| url.as_str().starts_with(prefix.as_str()))
        {
            tracing::trace!("Skipping {} (excluded prefix)", url);
            return None;
        }

        Some(AdmittedLink { url, location })
    }

    /// Marks a URL as visited, returning false if it already was
    pub fn record_visited(&mut self, url: &Url) -> bool {
        self.visited.claim(url)
    }

    pub fn visited(&self) -> &VisitedSet {
        &self.visited
    }

    fn has_excluded_extension(&self, path: &str) -> bool {
        self.excluded_extensions
            .iter()
            .any(|ext| path.ends_with(ext.as_str()))
    }
}
