/// Page state definitions for tracking crawl progress
///
/// This module defines all possible states a page can be in while it moves through
/// fetch, extraction, chunking, translation and persistence.
use crate::HarvestError;
use std::fmt;

/// Why a page was not processed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SkipReason {
    /// No depth budget left; never fetched
    DepthExhausted,

    /// URL already claimed earlier in this run
    AlreadyVisited,

    /// Detected language is not in the supported set, or could not be detected
    UnsupportedLanguage,

    /// Content-Type is present and not HTML
    ContentMismatch,

    /// The response was redirected to another site
    OffSite,

    /// The emission ledger already holds this page from an earlier run
    AlreadyEmitted,
}

impl SkipReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DepthExhausted => "depth_exhausted",
            Self::AlreadyVisited => "already_visited",
            Self::UnsupportedLanguage => "unsupported_language",
            Self::ContentMismatch => "content_mismatch",
            Self::OffSite => "off_site",
            Self::AlreadyEmitted => "already_emitted",
        }
    }

    /// Skips after which the page's links are still worth following
    pub fn allows_link_discovery(&self) -> bool {
        matches!(self, Self::UnsupportedLanguage | Self::AlreadyEmitted)
    }
}

/// Which stage a page failed in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FailureKind {
    Fetch,
    Parse,
    Write,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fetch => "fetch",
            Self::Parse => "parse",
            Self::Write => "write",
        }
    }
}

/// Represents the current state of a page in the crawl process
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PageState {
    // ===== Pipeline Stages =====
    /// Page has been popped from the worklist but not yet fetched
    Pending,

    /// Page is currently being fetched
    Fetching,

    /// Title, text and date have been extracted
    Extracted,

    /// Text has been split into chunks
    Chunked,

    /// Chunks have been translated (or passed through)
    Translated,

    /// Records have been flushed to the output file
    Persisted,

    /// Links of the page are being discovered; the page itself is done
    LinkDiscovery,

    // ===== Early Exits =====
    /// Left the pipeline; some reasons still allow link discovery
    Skipped(SkipReason),

    Failed(FailureKind),
}

impl PageState {
    /// Returns true if no further transition is allowed from this state
    ///
    /// Skips that still allow link discovery are not terminal.
    pub fn is_terminal(&self) -> bool {
        match self {
            Self::LinkDiscovery | Self::Failed(_) => true,
            Self::Skipped(reason) => !reason.allows_link_discovery(),
            _ => false,
        }
    }

    /// Whether `self -> next` is a legal transition
    pub fn can_advance_to(&self, next: PageState) -> bool {
        use PageState::*;
        use SkipReason::*;

        match (*self, next) {
            (Pending, Fetching) => true,
            (Pending, Skipped(DepthExhausted | AlreadyVisited | OffSite)) => true,

            (Fetching, Extracted) => true,
            (
                Fetching,
                Skipped(
                    AlreadyVisited | ContentMismatch | OffSite | UnsupportedLanguage
                    | AlreadyEmitted,
                ),
            ) => true,
            (Fetching, Failed(FailureKind::Fetch | FailureKind::Parse)) => true,

            (Extracted, Chunked) => true,
            (Extracted, Failed(FailureKind::Parse)) => true,
            (Chunked, Translated) => true,
            (Translated, Persisted) => true,
            (Translated, Failed(FailureKind::Write)) => true,
            (Persisted, LinkDiscovery) => true,

            (Skipped(reason), LinkDiscovery) => reason.allows_link_discovery(),

            _ => false,
        }
    }

    /// Moves to `next`, rejecting transitions the pipeline does not allow
    pub fn advance(&mut self, next: PageState) -> Result<(), HarvestError> {
        if !self.can_advance_to(next) {
            return Err(HarvestError::InvalidTransition {
                from: *self,
                to: next,
            });
        }
        *self = next;
        Ok(())
    }
}

impl fmt::Display for PageState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Fetching => write!(f, "fetching"),
            Self::Extracted => write!(f, "extracted"),
            Self::Chunked => write!(f, "chunked"),
            Self::Translated => write!(f, "translated"),
            Self::Persisted => write!(f, "persisted"),
            Self::LinkDiscovery => write!(f, "link_discovery"),
            Self::Skipped(reason) => write!(f, "skipped({})", reason.as_str()),
            Self::Failed(kind) => write!(f, "failed({})", kind.as_str()),
        }
    }
}
