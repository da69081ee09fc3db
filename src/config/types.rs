use serde::Deserialize;

/// Main configuration structure for page-harvest
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub language: LanguageConfig,
    #[serde(default)]
    pub extract: ExtractConfig,
    #[serde(default)]
    pub chunk: ChunkConfig,
    #[serde(default)]
    pub translate: TranslateConfig,
    pub output: OutputConfig,
    #[serde(default, rename = "site")]
    pub sites: Vec<SiteEntry>,
    #[serde(default, rename = "feed")]
    pub feeds: Vec<FeedEntry>,
}

impl Config {
    /// Builds a configuration with every optional section at its default
    pub fn with_output(records_path: impl Into<String>) -> Self {
        Self {
            crawler: CrawlerConfig::default(),
            http: HttpConfig::default(),
            language: LanguageConfig::default(),
            extract: ExtractConfig::default(),
            chunk: ChunkConfig::default(),
            translate: TranslateConfig::default(),
            output: OutputConfig {
                records_path: records_path.into(),
                visited_path: None,
                ledger_path: None,
            },
            sites: Vec::new(),
            feeds: Vec::new(),
        }
    }

    /// Total number of seed URLs across all sites
    pub fn seed_count(&self) -> usize {
        self.sites.iter().map(|s| s.seeds.len()).sum()
    }
}

/// Traversal behavior
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct CrawlerConfig {
    /// Depth budget of a seed page; pages at depth 0 are never fetched
    #[serde(default = "default_max_depth")]
    pub max_depth: u32,

    /// Upper bound of the random delay before each fetch (milliseconds)
    #[serde(default = "default_politeness_jitter_ms")]
    pub politeness_jitter_ms: u64,

    /// Whether pages failing the language gate are also excluded from link discovery
    #[serde(default = "default_true")]
    pub gate_link_discovery: bool,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            max_depth: default_max_depth(),
            politeness_jitter_ms: default_politeness_jitter_ms(),
            gate_link_discovery: true,
        }
    }
}

/// HTTP client and retry configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct HttpConfig {
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,

    /// Retries after the first attempt
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// First backoff delay; doubles on each further retry (milliseconds)
    #[serde(default = "default_backoff_factor_ms")]
    pub backoff_factor_ms: u64,

    #[serde(default = "default_retry_statuses")]
    pub retry_statuses: Vec<u16>,

    #[serde(default = "default_excluded_extensions")]
    pub excluded_extensions: Vec<String>,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            timeout_secs: default_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
            max_retries: default_max_retries(),
            backoff_factor_ms: default_backoff_factor_ms(),
            retry_statuses: default_retry_statuses(),
            excluded_extensions: default_excluded_extensions(),
        }
    }
}

/// Language admission gate
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct LanguageConfig {
    /// ISO 639-1 codes; an empty list admits every page
    #[serde(default = "default_supported_languages")]
    pub supported: Vec<String>,

    #[serde(default = "default_sample_chars")]
    pub sample_chars: usize,
}

impl Default for LanguageConfig {
    fn default() -> Self {
        Self {
            supported: default_supported_languages(),
            sample_chars: default_sample_chars(),
        }
    }
}

/// How extracted element texts are joined
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum JoinMode {
    Newline,
    Space,
}

impl JoinMode {
    pub fn separator(&self) -> &'static str {
        match self {
            Self::Newline => "\n",
            Self::Space => " ",
        }
    }
}

/// DOM extraction rules
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ExtractConfig {
    #[serde(default = "default_tags")]
    pub tags: Vec<String>,

    /// Tags kept only when their class list is exactly `class_name`
    #[serde(default)]
    pub special_tags: Vec<String>,

    #[serde(default)]
    pub class_name: Option<String>,

    /// Restricts extraction to the subtrees matching this selector
    #[serde(default)]
    pub scope_selector: Option<String>,

    #[serde(default = "default_date_selector")]
    pub date_selector: String,

    #[serde(default = "default_join")]
    pub join: JoinMode,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            tags: default_tags(),
            special_tags: Vec::new(),
            class_name: None,
            scope_selector: None,
            date_selector: default_date_selector(),
            join: default_join(),
        }
    }
}

/// Chunk boundary policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ChunkPolicy {
    /// Fixed character windows; may cut mid-sentence
    Fixed,
    /// Window ends snap back to the nearest preceding sentence boundary
    Sentence,
}

/// Chunking parameters
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ChunkConfig {
    #[serde(default = "default_chunk_size")]
    pub size: usize,

    #[serde(default = "default_chunk_overlap")]
    pub overlap: usize,

    #[serde(default = "default_chunk_policy")]
    pub policy: ChunkPolicy,
}

impl Default for ChunkConfig {
    fn default() -> Self {
        Self {
            size: default_chunk_size(),
            overlap: default_chunk_overlap(),
            policy: default_chunk_policy(),
        }
    }
}

/// What to do with a chunk whose translation failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TranslationFallback {
    KeepOriginal,
    DropChunk,
}

/// Translation service configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct TranslateConfig {
    #[serde(default)]
    pub enabled: bool,

    /// LibreTranslate-compatible `/translate` endpoint
    #[serde(default)]
    pub endpoint: Option<String>,

    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    #[serde(default = "default_translate_retry_delay_ms")]
    pub retry_delay_ms: u64,

    #[serde(default = "default_on_failure")]
    pub on_failure: TranslationFallback,
}

impl Default for TranslateConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            endpoint: None,
            api_key: None,
            max_retries: default_max_retries(),
            retry_delay_ms: default_translate_retry_delay_ms(),
            on_failure: default_on_failure(),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct OutputConfig {
    /// Line-delimited JSON records file (append-only)
    pub records_path: String,

    /// Plain-text list of visited URLs, rewritten at the end of a run
    #[serde(default)]
    pub visited_path: Option<String>,

    /// SQLite ledger of emitted pages; enables cross-run deduplication
    #[serde(default)]
    pub ledger_path: Option<String>,
}

/// A site to crawl from one or more seed URLs
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SiteEntry {
    pub seeds: Vec<String>,

    /// Base used instead of the page URL when resolving relative links
    #[serde(default)]
    pub base_url: Option<String>,

    /// URL prefixes never visited
    #[serde(default)]
    pub exclude_urls: Vec<String>,
}

/// A paginated JSON posts API (WordPress REST style)
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct FeedEntry {
    /// URL with `{}` where the page number goes
    pub url_template: String,
}

fn default_max_depth() -> u32 {
    10
}

fn default_politeness_jitter_ms() -> u64 {
    100
}

fn default_true() -> bool {
    true
}

fn default_user_agent() -> String {
    format!("page-harvest/{}", env!("CARGO_PKG_VERSION"))
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_connect_timeout_secs() -> u64 {
    10
}

fn default_max_retries() -> u32 {
    3
}

fn default_backoff_factor_ms() -> u64 {
    100
}

fn default_retry_statuses() -> Vec<u16> {
    vec![429, 500, 502, 503, 504]
}

pub(crate) fn default_excluded_extensions() -> Vec<String> {
    [
        ".xml", ".pdf", ".jpg", ".jpeg", ".png", ".gif", ".svg", ".webp", ".ico", ".zip", ".gz",
        ".tar", ".rar", ".7z", ".doc", ".docx", ".xls", ".xlsx", ".ppt", ".pptx", ".odt",
        ".csv", ".mp3", ".mp4", ".avi", ".mov", ".wav", ".css", ".js", ".json", ".rss",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_supported_languages() -> Vec<String> {
    vec!["sv".to_string(), "en".to_string()]
}

fn default_sample_chars() -> usize {
    1000
}

fn default_tags() -> Vec<String> {
    vec!["p".to_string(), "h1".to_string(), "h2".to_string()]
}

fn default_date_selector() -> String {
    "p.ahjalpfunktioner time".to_string()
}

fn default_join() -> JoinMode {
    JoinMode::Newline
}

fn default_chunk_size() -> usize {
    1000
}

fn default_chunk_overlap() -> usize {
    200
}

fn default_chunk_policy() -> ChunkPolicy {
    ChunkPolicy::Fixed
}

fn default_translate_retry_delay_ms() -> u64 {
    2000
}

fn default_on_failure() -> TranslationFallback {
    TranslationFallback::KeepOriginal
}
