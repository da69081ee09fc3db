//! Crawler module for web page fetching and processing
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching with retry logic
//! - HTML link and title extraction
//! - Paginated JSON feed harvesting
//! - Overall crawl coordination

mod coordinator;
pub mod feed;
mod fetcher;
mod parser;
pub mod retry;

pub use coordinator::{run_crawl, Coordinator};
pub use feed::{FeedPager, FeedPost};
pub use fetcher::{build_http_client, FetchedPage, Fetcher};
pub use parser::{extract_links, extract_title};
pub use retry::{Backoff, RetryPolicy};
