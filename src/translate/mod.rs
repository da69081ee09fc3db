//! Translation to English
//!
//! [`Translator`] is the seam to the external translation service; [`TranslationPipeline`]
//! adds local language detection, retries and the per-chunk fallback policy on top of it.

mod http;

pub use http::HttpTranslator;

use crate::config::{TranslateConfig, TranslationFallback};
use crate::crawler::retry::RetryPolicy;
use crate::language::LanguageDetector;
use crate::{ConfigError, TranslationError};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use url::Url;

/// Characters inspected when detecting the source language
const DETECTION_SAMPLE_CHARS: usize = 1000;

/// A text translation service
#[async_trait]
pub trait Translator: Send + Sync {
    /// Translates `text` from `source` (ISO 639-1, or `auto`) to English
    async fn translate(&self, text: &str, source: &str) -> Result<String, TranslationError>;
}

/// Result of translating the chunks of one page
#[derive(Debug, Default, PartialEq, Eq)]
pub struct TranslatedChunks {
    pub chunks: Vec<String>,
    /// Chunks that failed to translate and were dropped
    pub dropped: usize,
    /// Chunks that failed to translate and were kept untranslated
    pub kept_original: usize,
}

/// Detection, retries and fallback around a [`Translator`]
pub struct TranslationPipeline {
    translator: Option<Box<dyn Translator>>,
    detector: LanguageDetector,
    policy: RetryPolicy,
    on_failure: TranslationFallback,
}

impl TranslationPipeline {
    pub fn new(
        translator: Option<Box<dyn Translator>>,
        policy: RetryPolicy,
        on_failure: TranslationFallback,
    ) -> Self {
        Self {
            translator,
            detector: LanguageDetector::new(Vec::new(), DETECTION_SAMPLE_CHARS),
            policy,
            on_failure,
        }
    }

    /// A pipeline that passes every text through unchanged
    pub fn disabled() -> Self {
        Self::new(None, RetryPolicy::none(), TranslationFallback::KeepOriginal)
    }

    /// Builds the pipeline from `[translate]`, sharing the crawl's HTTP client
    pub fn from_config(config: &TranslateConfig, client: Client) -> Result<Self, ConfigError> {
        if !config.enabled {
            return Ok(Self::disabled());
        }

        let endpoint = config.endpoint.as_deref().ok_or_else(|| {
            ConfigError::Validation("translate.endpoint is required when enabled".to_string())
        })?;
        let endpoint = Url::parse(endpoint)
            .map_err(|e| ConfigError::InvalidUrl(format!("{}: {}", endpoint, e)))?;

        let translator = HttpTranslator::new(client, endpoint, config.api_key.clone());
        Ok(Self::new(
            Some(Box::new(translator)),
            RetryPolicy::fixed(
                config.max_retries,
                Duration::from_millis(config.retry_delay_ms),
            ),
            config.on_failure,
        ))
    }

    pub fn is_enabled(&self) -> bool {
        self.translator.is_some()
    }

    /// Translates `text` to English
    ///
    /// English text and blank text are returned unchanged without calling the service. Text
    /// whose language cannot be detected is sent with `source = "auto"`.
    pub async fn to_english(&self, text: &str) -> Result<String, TranslationError> {
        let Some(translator) = &self.translator else {
            return Ok(text.to_string());
        };
        if text.trim().is_empty() {
            return Ok(text.to_string());
        }

        let source = match self.detector.detect(text) {
            Ok(lang) if lang == "en" => return Ok(text.to_string()),
            Ok(lang) => lang,
            Err(_) => "auto".to_string(),
        };

        let translator = translator.as_ref();
        let source = source.as_str();
        self.policy
            .run(
                move |_| translator.translate(text, source),
                TranslationError::is_transient,
            )
            .await
            .map_err(|e| {
                if e.is_transient() {
                    TranslationError::Exhausted {
                        attempts: self.policy.max_attempts(),
                        last: e.to_string(),
                    }
                } else {
                    e
                }
            })
    }

    /// Translates a title, keeping the original when translation fails
    pub async fn translate_title(&self, title: &str) -> String {
        match self.to_english(title).await {
            Ok(translated) => translated,
            Err(e) => {
                tracing::warn!("Keeping untranslated title '{}': {}", title, e);
                title.to_string()
            }
        }
    }

    /// Translates chunks in order, applying the fallback policy to failures
    pub async fn translate_chunks(&self, chunks: Vec<String>) -> TranslatedChunks {
        let mut out = TranslatedChunks::default();

        for chunk in chunks {
            match self.to_english(&chunk).await {
                Ok(translated) => out.chunks.push(translated),
                Err(e) => match self.on_failure {
                    TranslationFallback::KeepOriginal => {
                        tracing::warn!("Keeping untranslated chunk: {}", e);
                        out.kept_original += 1;
                        out.chunks.push(chunk);
                    }
                    TranslationFallback::DropChunk => {
                        tracing::warn!("Dropping chunk: {}", e);
                        out.dropped += 1;
                    }
                },
            }
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    const SWEDISH: &str = "Kommunen erbjuder många olika tjänster för familjer som nyligen har \
        flyttat hit. Här kan du läsa mer om skolor, sjukvård och boende på de följande sidorna, \
        och du är välkommen att kontakta oss om du har frågor om din situation.";

    const ENGLISH: &str = "The municipality offers a wide range of services for families who \
        have recently moved here. You can read more about schools and housing.";

    /// Answers with a canned result and counts calls
    struct MockTranslator {
        calls: Arc<AtomicU32>,
        fail_first: u32,
        error: fn() -> TranslationError,
    }

    impl MockTranslator {
        fn new(fail_first: u32, error: fn() -> TranslationError) -> (Self, Arc<AtomicU32>) {
            let calls = Arc::new(AtomicU32::new(0));
            let mock = Self {
                calls: Arc::clone(&calls),
                fail_first,
                error,
            };
            (mock, calls)
        }
    }

    #[async_trait]
    impl Translator for MockTranslator {
        async fn translate(&self, text: &str, source: &str) -> Result<String, TranslationError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if call <= self.fail_first {
                return Err((self.error)());
            }
            Ok(format!("[{}] {}", source, text.len()))
        }
    }

    fn transient() -> TranslationError {
        TranslationError::Transient("HTTP 503".to_string())
    }

    fn rejected() -> TranslationError {
        TranslationError::Rejected {
            status: 400,
            message: "bad request".to_string(),
        }
    }

    fn pipeline(mock: MockTranslator, retries: u32, on_failure: TranslationFallback) -> TranslationPipeline {
        TranslationPipeline::new(
            Some(Box::new(mock)),
            RetryPolicy::fixed(retries, Duration::ZERO),
            on_failure,
        )
    }

    #[tokio::test]
    async fn test_disabled_passes_through() {
        let p = TranslationPipeline::disabled();
        assert!(!p.is_enabled());
        assert_eq!(p.to_english(SWEDISH).await.unwrap(), SWEDISH);
    }

    #[tokio::test]
    async fn test_english_skips_the_service() {
        let (mock, calls) = MockTranslator::new(0, transient);
        let p = pipeline(mock, 3, TranslationFallback::KeepOriginal);

        assert_eq!(p.to_english(ENGLISH).await.unwrap(), ENGLISH);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_translates_with_detected_source() {
        let (mock, calls) = MockTranslator::new(0, transient);
        let p = pipeline(mock, 3, TranslationFallback::KeepOriginal);

        let out = p.to_english(SWEDISH).await.unwrap();
        assert!(out.starts_with("[sv]"));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_transient_failures_are_retried() {
        let (mock, calls) = MockTranslator::new(2, transient);
        let p = pipeline(mock, 3, TranslationFallback::KeepOriginal);

        assert!(p.to_english(SWEDISH).await.is_ok());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_exhaustion() {
        let (mock, calls) = MockTranslator::new(u32::MAX, transient);
        let p = pipeline(mock, 3, TranslationFallback::KeepOriginal);

        let err = p.to_english(SWEDISH).await.unwrap_err();
        assert!(matches!(err, TranslationError::Exhausted { attempts: 4, .. }));
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn test_rejection_is_not_retried() {
        let (mock, calls) = MockTranslator::new(u32::MAX, rejected);
        let p = pipeline(mock, 3, TranslationFallback::KeepOriginal);

        let err = p.to_english(SWEDISH).await.unwrap_err();
        assert!(matches!(err, TranslationError::Rejected { status: 400, .. }));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_keep_original_fallback() {
        let (mock, _) = MockTranslator::new(u32::MAX, transient);
        let p = pipeline(mock, 1, TranslationFallback::KeepOriginal);

        let out = p
            .translate_chunks(vec![SWEDISH.to_string(), ENGLISH.to_string()])
            .await;
        assert_eq!(out.chunks, vec![SWEDISH.to_string(), ENGLISH.to_string()]);
        assert_eq!(out.kept_original, 1);
        assert_eq!(out.dropped, 0);
    }

    #[tokio::test]
    async fn test_drop_chunk_fallback() {
        let (mock, _) = MockTranslator::new(u32::MAX, transient);
        let p = pipeline(mock, 1, TranslationFallback::DropChunk);

        let out = p
            .translate_chunks(vec![SWEDISH.to_string(), ENGLISH.to_string()])
            .await;
        assert_eq!(out.chunks, vec![ENGLISH.to_string()]);
        assert_eq!(out.dropped, 1);
    }

    #[tokio::test]
    async fn test_title_always_falls_back() {
        let (mock, _) = MockTranslator::new(u32::MAX, rejected);
        let p = pipeline(mock, 0, TranslationFallback::DropChunk);

        assert_eq!(p.translate_title("Välkommen till kommunen").await, "Välkommen till kommunen");
    }

    #[test]
    fn test_from_config_disabled() {
        let p = TranslationPipeline::from_config(&TranslateConfig::default(), Client::new()).unwrap();
        assert!(!p.is_enabled());
    }

    #[test]
    fn test_from_config_requires_endpoint() {
        let config = TranslateConfig {
            enabled: true,
            ..TranslateConfig::default()
        };
        assert!(TranslationPipeline::from_config(&config, Client::new()).is_err());
    }
}
