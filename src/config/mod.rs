//! Configuration module for page-harvest
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use page_harvest::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("harvest.toml")).unwrap();
//! println!("Crawler will use max depth: {}", config.crawler.max_depth);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    ChunkConfig, ChunkPolicy, Config, CrawlerConfig, ExtractConfig, FeedEntry, HttpConfig,
    JoinMode, LanguageConfig, OutputConfig, SiteEntry, TranslateConfig, TranslationFallback,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
pub use validation::validate;
