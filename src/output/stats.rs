//! Crawl statistics
//!
//! Counters are collected in memory while the crawl runs and printed once at the end.

use crate::state::{FailureKind, PageState, SkipReason};
use std::collections::BTreeMap;

/// Crawl statistics summary
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrawlStats {
    /// Pages that returned a successful response
    pub pages_fetched: u64,

    /// Pages whose records were written
    pub pages_persisted: u64,

    /// Feed items processed
    pub feed_items: u64,

    pub chunks_written: u64,

    /// Chunks dropped by the translation fallback
    pub chunks_dropped: u64,

    /// Chunks kept in their original language after a translation failure
    pub chunks_untranslated: u64,

    /// Links accepted by the frontier
    pub links_queued: u64,

    pub skipped: BTreeMap<SkipReason, u64>,

    pub failed: BTreeMap<FailureKind, u64>,
}

impl CrawlStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Counts a page that reached a terminal or skip state
    pub fn record_state(&mut self, state: PageState) {
        match state {
            PageState::Skipped(reason) => *self.skipped.entry(reason).or_insert(0) += 1,
            PageState::Failed(kind) => *self.failed.entry(kind).or_insert(0) += 1,
            PageState::Persisted => self.pages_persisted += 1,
            _ => {}
        }
    }

    pub fn skipped_for(&self, reason: SkipReason) -> u64 {
        self.skipped.get(&reason).copied().unwrap_or(0)
    }

    pub fn failed_for(&self, kind: FailureKind) -> u64 {
        self.failed.get(&kind).copied().unwrap_or(0)
    }

    pub fn total_skipped(&self) -> u64 {
        self.skipped.values().sum()
    }

    pub fn total_failed(&self) -> u64 {
        self.failed.values().sum()
    }
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(stats: &CrawlStats) {
    println!("=== Crawl Statistics ===\n");

    println!("Overview:");
    println!("  Pages fetched: {}", stats.pages_fetched);
    println!("  Pages persisted: {}", stats.pages_persisted);
    println!("  Feed items: {}", stats.feed_items);
    println!("  Links queued: {}", stats.links_queued);
    println!();

    println!("Chunks:");
    println!("  Written: {}", stats.chunks_written);
    println!("  Kept untranslated: {}", stats.chunks_untranslated);
    println!("  Dropped: {}", stats.chunks_dropped);
    println!();

    if !stats.skipped.is_empty() {
        println!("Skipped Pages ({}):", stats.total_skipped());
        let mut counts: Vec<_> = stats.skipped.iter().collect();
        counts.sort_by(|a, b| b.1.cmp(a.1));
        for (reason, count) in counts {
            println!("  {}: {}", reason.as_str(), count);
        }
        println!();
    }

    if !stats.failed.is_empty() {
        println!("Failed Pages ({}):", stats.total_failed());
        let mut counts: Vec<_> = stats.failed.iter().collect();
        counts.sort_by(|a, b| b.1.cmp(a.1));
        for (kind, count) in counts {
            println!("  {}: {}", kind.as_str(), count);
        }
        println!();
    }

    let attempted = stats.pages_persisted + stats.total_failed();
    let success_rate = if attempted > 0 {
        (stats.pages_persisted as f64 / attempted as f64) * 100.0
    } else {
        0.0
    };

    println!(
        "Success Rate: {:.1}% ({} / {} pages persisted)",
        success_rate, stats.pages_persisted, attempted
    );
}
