//! Language detection and the language admission gate
//!
//! Detection uses `whatlang` and reports ISO 639-1 codes where one is known, falling back to the
//! ISO 639-3 code otherwise.

use crate::config::LanguageConfig;
use crate::LanguageDetectionError;
use whatlang::Lang;

/// Language gate for fetched pages
#[derive(Debug, Clone)]
pub struct LanguageDetector {
    supported: Vec<String>,
    sample_chars: usize,
}

impl LanguageDetector {
    pub fn new(supported: Vec<String>, sample_chars: usize) -> Self {
        Self {
            supported: supported.into_iter().map(|l| l.to_lowercase()).collect(),
            sample_chars,
        }
    }

    pub fn from_config(config: &LanguageConfig) -> Self {
        Self::new(config.supported.clone(), config.sample_chars)
    }

    /// Detects the language of `text`
    ///
    /// Only the first `sample_chars` characters are inspected.
    pub fn detect(&self, text: &str) -> Result<String, LanguageDetectionError> {
        let sample = self.sample(text);
        if sample.trim().is_empty() {
            return Err(LanguageDetectionError::EmptySample);
        }

        let info = whatlang::detect(sample).ok_or(LanguageDetectionError::Undetermined)?;
        Ok(iso639_1(info.lang())
            .map(str::to_string)
            .unwrap_or_else(|| info.lang().code().to_string()))
    }

    /// Returns true when the sample's language is admitted
    ///
    /// An empty supported list admits everything without running detection. A failed detection
    /// counts as unsupported.
    pub fn is_supported(&self, sample: &str) -> bool {
        if self.supported.is_empty() {
            return true;
        }

        match self.detect(sample) {
            Ok(lang) => self.supported.iter().any(|s| *s == lang),
            Err(e) => {
                tracing::warn!("Language detection failed: {}", e);
                false
            }
        }
    }

    fn sample<'a>(&self, text: &'a str) -> &'a str {
        match text.char_indices().nth(self.sample_chars) {
            Some((end, _)) => &text[..end],
            None => text,
        }
    }
}

/// Maps a detected language to its two-letter code
fn iso639_1(lang: Lang) -> Option<&'static str> {
    let code = match lang {
        Lang::Eng => "en",
        Lang::Swe => "sv",
        Lang::Deu => "de",
        Lang::Fra => "fr",
        Lang::Spa => "es",
        Lang::Ita => "it",
        Lang::Por => "pt",
        Lang::Nld => "nl",
        Lang::Dan => "da",
        Lang::Nob => "no",
        Lang::Fin => "fi",
        Lang::Pol => "pl",
        Lang::Rus => "ru",
        Lang::Ukr => "uk",
        Lang::Ara => "ar",
        Lang::Tur => "tr",
        Lang::Cmn => "zh",
        Lang::Jpn => "ja",
        Lang::Kor => "ko",
        Lang::Vie => "vi",
        Lang::Hin => "hi",
        Lang::Pes => "fa",
        Lang::Est => "et",
        Lang::Lit => "lt",
        Lang::Lav => "lv",
        Lang::Ces => "cs",
        Lang::Slk => "sk",
        Lang::Hun => "hu",
        Lang::Ron => "ro",
        Lang::Ell => "el",
        Lang::Heb => "he",
        Lang::Tha => "th",
        Lang::Ind => "id",
        _ => return None,
    };
    Some(code)
}
