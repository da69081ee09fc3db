use crate::config::types::Config;
use crate::config::validation::validate;
use crate::ConfigError;
use sha2::{Digest, Sha256};
use std::path::Path;

/// Loads and parses a configuration file from the given path
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok(Config)` - Successfully loaded and validated configuration
/// * `Err(ConfigError)` - Failed to load, parse, or validate the configuration
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    parse_config(&content)
}

/// Parses and validates configuration from TOML text
pub fn parse_config(content: &str) -> Result<Config, ConfigError> {
    let config: Config = toml::from_str(content)?;
    validate(&config)?;
    Ok(config)
}

/// Computes a SHA-256 hash of the configuration file content
///
/// Recorded with each run in the emission ledger so runs made with different settings can be
/// told apart.
pub fn compute_config_hash(path: &Path) -> Result<String, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    Ok(hex::encode(hasher.finalize()))
}

/// Loads a configuration and returns both the config and its hash
pub fn load_config_with_hash(path: &Path) -> Result<(Config, String), ConfigError> {
    let config = load_config(path)?;
    let hash = compute_config_hash(path)?;
    Ok((config, hash))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ChunkPolicy, JoinMode, TranslationFallback};
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    const FULL_CONFIG: &str = r#"
[crawler]
max-depth = 5
politeness-jitter-ms = 0
gate-link-discovery = false

[http]
user-agent = "TestHarvester/1.0"
max-retries = 2
backoff-factor-ms = 50

[language]
supported = ["sv"]

[extract]
tags = ["p", "h1", "h2", "h3", "ul"]
special-tags = ["ul"]
class-name = "normal"
scope-selector = "body > main"
join = "space"

[chunk]
size = 500
overlap = 50
policy = "sentence"

[translate]
enabled = true
endpoint = "http://localhost:5000/translate"
on-failure = "drop-chunk"

[output]
records-path = "./data/records.jsonl"
visited-path = "./data/visited.txt"

[[site]]
seeds = ["https://www.migrationsverket.se/"]
exclude-urls = ["https://www.migrationsverket.se/search"]

[[feed]]
url-template = "https://cms.example.se/wp-json/wp/v2/posts?page={}&per_page=12"
"#;

    #[test]
    fn test_load_full_config() {
        let file = create_temp_config(FULL_CONFIG);
        let config = load_config(file.path()).unwrap();

        assert_eq!(config.crawler.max_depth, 5);
        assert!(!config.crawler.gate_link_discovery);
        assert_eq!(config.http.user_agent, "TestHarvester/1.0");
        assert_eq!(config.http.max_retries, 2);
        assert_eq!(config.http.retry_statuses, vec![429, 500, 502, 503, 504]);
        assert_eq!(config.language.supported, vec!["sv"]);
        assert_eq!(config.extract.class_name.as_deref(), Some("normal"));
        assert_eq!(config.extract.join, JoinMode::Space);
        assert_eq!(config.chunk.policy, ChunkPolicy::Sentence);
        assert_eq!(config.translate.on_failure, TranslationFallback::DropChunk);
        assert_eq!(config.sites.len(), 1);
        assert_eq!(config.sites[0].exclude_urls.len(), 1);
        assert_eq!(config.feeds.len(), 1);
    }

    #[test]
    fn test_defaults_applied() {
        let config = parse_config(
            r#"
[output]
records-path = "out.jsonl"

[[site]]
seeds = ["https://example.com/"]
"#,
        )
        .unwrap();

        assert_eq!(config.crawler.max_depth, 10);
        assert_eq!(config.http.max_retries, 3);
        assert_eq!(config.http.backoff_factor_ms, 100);
        assert_eq!(config.language.supported, vec!["sv", "en"]);
        assert_eq!(config.language.sample_chars, 1000);
        assert_eq!(config.extract.tags, vec!["p", "h1", "h2"]);
        assert_eq!(config.extract.join, JoinMode::Newline);
        assert_eq!(config.chunk.size, 1000);
        assert_eq!(config.chunk.overlap, 200);
        assert_eq!(config.chunk.policy, ChunkPolicy::Fixed);
        assert!(!config.translate.enabled);
        assert_eq!(config.translate.retry_delay_ms, 2000);
        assert_eq!(
            config.translate.on_failure,
            TranslationFallback::KeepOriginal
        );
        assert!(config.output.ledger_path.is_none());
    }

    #[test]
    fn test_load_config_with_invalid_path() {
        let result = load_config(Path::new("/nonexistent/harvest.toml"));
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }

    #[test]
    fn test_load_config_with_invalid_toml() {
        let file = create_temp_config("this is not valid TOML {{{");
        let result = load_config(file.path());
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_load_config_with_validation_error() {
        let file = create_temp_config(
            r#"
[chunk]
size = 100
overlap = 100

[output]
records-path = "out.jsonl"

[[site]]
seeds = ["https://example.com/"]
"#,
        );
        let result = load_config(file.path());
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_compute_config_hash() {
        let file = create_temp_config("test content");

        let hash1 = compute_config_hash(file.path()).unwrap();
        let hash2 = compute_config_hash(file.path()).unwrap();

        assert_eq!(hash1, hash2);
        assert_eq!(hash1.len(), 64);
    }

    #[test]
    fn test_different_content_different_hash() {
        let file1 = create_temp_config("content 1");
        let file2 = create_temp_config("content 2");

        let hash1 = compute_config_hash(file1.path()).unwrap();
        let hash2 = compute_config_hash(file2.path()).unwrap();

        assert_ne!(hash1, hash2);
    }
}
