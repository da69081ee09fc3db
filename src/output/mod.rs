//! Output module
//!
//! This module handles:
//! - Appending chunk records to the line-delimited JSON records file
//! - Writing the visited-URL list
//! - The optional SQLite emission ledger
//! - Recording and printing crawl statistics

pub mod ledger;
mod record;
pub mod stats;
mod writer;

pub use ledger::{EmissionLedger, RunStatus};
pub use record::{truncate_output, OutputRecord, RecordBuffer};
pub use stats::{print_statistics, CrawlStats};
pub use writer::write_visited_urls;

pub(crate) use record::ensure_parent_dir;
