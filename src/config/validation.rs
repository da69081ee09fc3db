use crate::config::types::{
    ChunkConfig, Config, ExtractConfig, FeedEntry, HttpConfig, OutputConfig, SiteEntry,
    TranslateConfig,
};
use crate::ConfigError;
use scraper::Selector;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_http_config(&config.http)?;
    validate_extract_config(&config.extract)?;
    validate_chunk_config(&config.chunk)?;
    validate_translate_config(&config.translate)?;
    validate_output_config(&config.output)?;
    validate_sites(&config.sites)?;
    validate_feeds(&config.feeds)?;

    if config.sites.is_empty() && config.feeds.is_empty() {
        return Err(ConfigError::Validation(
            "at least one [[site]] or [[feed]] entry is required".to_string(),
        ));
    }

    Ok(())
}

/// Validates HTTP client configuration
fn validate_http_config(config: &HttpConfig) -> Result<(), ConfigError> {
    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user_agent cannot be empty".to_string(),
        ));
    }

    if config.timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "timeout_secs must be >= 1".to_string(),
        ));
    }

    for status in &config.retry_statuses {
        if !(100..=599).contains(status) {
            return Err(ConfigError::Validation(format!(
                "retry_statuses must be HTTP status codes, got {}",
                status
            )));
        }
    }

    for ext in &config.excluded_extensions {
        if !ext.starts_with('.') || ext.len() < 2 {
            return Err(ConfigError::Validation(format!(
                "excluded_extensions entries must look like '.pdf', got '{}'",
                ext
            )));
        }
    }

    Ok(())
}

/// Validates extraction rules
fn validate_extract_config(config: &ExtractConfig) -> Result<(), ConfigError> {
    if config.tags.is_empty() {
        return Err(ConfigError::Validation("tags cannot be empty".to_string()));
    }

    validate_selector(&config.tags.join(", "))?;
    validate_selector(&config.date_selector)?;
    if let Some(scope) = &config.scope_selector {
        validate_selector(scope)?;
    }

    match (config.special_tags.is_empty(), &config.class_name) {
        (true, Some(_)) => Err(ConfigError::Validation(
            "class_name requires special_tags".to_string(),
        )),
        (false, None) => Err(ConfigError::Validation(
            "special_tags requires class_name".to_string(),
        )),
        _ => Ok(()),
    }
}

fn validate_selector(selector: &str) -> Result<(), ConfigError> {
    Selector::parse(selector)
        .map(|_| ())
        .map_err(|e| ConfigError::InvalidSelector(format!("'{}': {:?}", selector, e)))
}

/// Validates chunking parameters
fn validate_chunk_config(config: &ChunkConfig) -> Result<(), ConfigError> {
    if config.size == 0 {
        return Err(ConfigError::Validation(
            "chunk size must be greater than zero".to_string(),
        ));
    }

    if config.overlap >= config.size {
        return Err(ConfigError::Validation(format!(
            "chunk overlap ({}) must be smaller than chunk size ({})",
            config.overlap, config.size
        )));
    }

    Ok(())
}

/// Validates translation service configuration
fn validate_translate_config(config: &TranslateConfig) -> Result<(), ConfigError> {
    if !config.enabled {
        return Ok(());
    }

    let endpoint = config.endpoint.as_deref().ok_or_else(|| {
        ConfigError::Validation("translate.endpoint is required when enabled".to_string())
    })?;
    parse_http_url(endpoint, "translate endpoint")?;

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.records_path.is_empty() {
        return Err(ConfigError::Validation(
            "records_path cannot be empty".to_string(),
        ));
    }

    if matches!(config.visited_path.as_deref(), Some("")) {
        return Err(ConfigError::Validation(
            "visited_path cannot be empty".to_string(),
        ));
    }

    if matches!(config.ledger_path.as_deref(), Some("")) {
        return Err(ConfigError::Validation(
            "ledger_path cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates site entries
fn validate_sites(sites: &[SiteEntry]) -> Result<(), ConfigError> {
    for site in sites {
        if site.seeds.is_empty() {
            return Err(ConfigError::Validation(
                "each [[site]] must have at least one seed URL".to_string(),
            ));
        }

        for seed in &site.seeds {
            parse_http_url(seed, "seed URL")?;
        }

        if let Some(base) = &site.base_url {
            parse_http_url(base, "base URL")?;
        }
    }

    Ok(())
}

/// Validates feed entries
fn validate_feeds(feeds: &[FeedEntry]) -> Result<(), ConfigError> {
    for feed in feeds {
        if !feed.url_template.contains("{}") {
            return Err(ConfigError::Validation(format!(
                "feed url_template '{}' must contain '{{}}' for the page number",
                feed.url_template
            )));
        }

        parse_http_url(&feed.url_template.replace("{}", "1"), "feed URL")?;
    }

    Ok(())
}

fn parse_http_url(raw: &str, what: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid {} '{}': {}", what, raw, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::Validation(format!(
            "{} '{}' must use http or https",
            what, raw
        )));
    }

    Ok(url)
}
