use std::collections::HashSet;
use url::Url;

/// Normalized URLs seen during one run
///
/// Grows monotonically. Insertion order is kept so the visited-URL file lists pages in crawl
/// order.
#[derive(Debug, Default)]
pub struct VisitedSet {
    seen: HashSet<String>,
    order: Vec<Url>,
}

impl VisitedSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts the URL, returning false if it was already present
    pub fn claim(&mut self, url: &Url) -> bool {
        if !self.seen.insert(url.as_str().to_string()) {
            return false;
        }
        self.order.push(url.clone());
        true
    }

    pub fn contains(&self, url: &Url) -> bool {
        self.seen.contains(url.as_str())
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// URLs in the order they were claimed
    pub fn iter(&self) -> impl Iterator<Item = &Url> {
        self.order.iter()
    }
}
