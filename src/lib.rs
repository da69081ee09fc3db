//! page-harvest: crawl, extract, chunk and persist informational websites
//!
//! This crate crawls a bounded set of sites depth-first, extracts text from selected DOM
//! elements, detects the page language, translates chunks to English and appends the chunks as
//! line-delimited JSON records for a downstream retrieval pipeline.

pub mod chunk;
pub mod config;
pub mod crawler;
pub mod extract;
pub mod frontier;
pub mod language;
pub mod output;
pub mod state;
pub mod translate;
pub mod url;

use thiserror::Error;

/// Main error type for page-harvest operations
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Extraction error: {0}")]
    Extract(#[from] ExtractError),

    #[error("Chunking error: {0}")]
    Chunk(#[from] ChunkError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Ledger error: {0}")]
    Ledger(#[from] rusqlite::Error),

    #[error("Invalid state transition: {from} -> {to}")]
    InvalidTransition {
        from: state::PageState,
        to: state::PageState,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid CSS selector in config: {0}")]
    InvalidSelector(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing domain in URL")]
    MissingDomain,
}

/// Broad classes of fetch failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FetchErrorKind {
    Timeout,
    HttpError,
    ConnectionError,
    Other,
}

impl FetchErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Timeout => "timeout",
            Self::HttpError => "http_error",
            Self::ConnectionError => "connection_error",
            Self::Other => "other",
        }
    }
}

/// Errors returned by the HTTP fetcher once its retry budget is spent
#[derive(Debug, Clone, Error)]
pub enum FetchError {
    #[error("Request timeout for {url}")]
    Timeout { url: String },

    #[error("HTTP {status} for {url}")]
    Http { url: String, status: u16 },

    #[error("Connection failed for {url}: {message}")]
    Connection { url: String, message: String },

    #[error("Request failed for {url}: {message}")]
    Other { url: String, message: String },
}

impl FetchError {
    pub fn kind(&self) -> FetchErrorKind {
        match self {
            Self::Timeout { .. } => FetchErrorKind::Timeout,
            Self::Http { .. } => FetchErrorKind::HttpError,
            Self::Connection { .. } => FetchErrorKind::ConnectionError,
            Self::Other { .. } => FetchErrorKind::Other,
        }
    }
}

/// Page parsing and extraction errors
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("Missing <{0}> element")]
    MissingElement(String),

    #[error("Invalid selector '{selector}': {message}")]
    Selector { selector: String, message: String },
}

/// Translation errors
#[derive(Debug, Error)]
pub enum TranslationError {
    /// Network failure, timeout, HTTP 429 or 5xx; worth retrying
    #[error("Transient translation failure: {0}")]
    Transient(String),

    #[error("Translation rejected with HTTP {status}: {message}")]
    Rejected { status: u16, message: String },

    #[error("Malformed translation response: {0}")]
    Malformed(String),

    #[error("Translation failed after {attempts} attempts: {last}")]
    Exhausted { attempts: u32, last: String },
}

impl TranslationError {
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transient(_))
    }
}

/// Language detection errors; callers treat them as "unsupported"
#[derive(Debug, Error)]
pub enum LanguageDetectionError {
    #[error("No text to detect language from")]
    EmptySample,

    #[error("Language could not be determined")]
    Undetermined,
}

/// Chunker construction errors
#[derive(Debug, Error)]
pub enum ChunkError {
    #[error("Chunk size must be greater than zero")]
    ZeroSize,

    #[error("Chunk overlap ({overlap}) must be smaller than chunk size ({size})")]
    InvalidOverlap { size: usize, overlap: usize },
}

/// Result type alias for page-harvest operations
pub type Result<T> = std::result::Result<T, HarvestError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::Coordinator;
pub use state::PageState;
pub use url::{extract_domain, normalize_url, site_key};
