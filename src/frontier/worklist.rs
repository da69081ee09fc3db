use url::Url;

/// A page waiting to be processed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlTarget {
    /// Normalized URL, the visited-set key
    pub url: Url,

    /// URL as linked (fragment dropped); requested instead of `url` so relative links on
    /// directory pages keep resolving below the directory
    pub location: Url,

    /// Site key of the seed this target was reached from
    pub domain: String,

    /// Remaining depth budget; 0 means the page is never fetched
    pub depth_remaining: u32,
}

/// Depth-first worklist
///
/// A LIFO stack replacing recursion. Children are pushed in reverse so they are popped in
/// document order, which keeps the traversal identical to a recursive depth-first walk.
#[derive(Debug, Default)]
pub struct Worklist {
    stack: Vec<CrawlTarget>,
}

impl Worklist {
    /// Starts a worklist at a seed page
    pub fn seeded(seed: CrawlTarget) -> Self {
        Self { stack: vec![seed] }
    }

    pub fn pop(&mut self) -> Option<CrawlTarget> {
        self.stack.pop()
    }

    /// Pushes the children of a page given in document order
    pub fn push_children(&mut self, children: Vec<CrawlTarget>) {
        self.stack.extend(children.into_iter().rev());
    }

    pub fn len(&self) -> usize {
        self.stack.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }
}
