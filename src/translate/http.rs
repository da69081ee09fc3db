//! LibreTranslate-compatible HTTP translator
//!
//! `POST {endpoint}` with `{q, source, target, format, api_key?}`, answered by
//! `{"translatedText": "..."}`.

use super::Translator;
use crate::TranslationError;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use url::Url;

#[derive(Debug, Serialize)]
struct TranslateRequest<'a> {
    q: &'a str,
    source: &'a str,
    target: &'a str,
    format: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    api_key: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct TranslateResponse {
    #[serde(rename = "translatedText")]
    translated_text: String,
}

/// Translator backed by a LibreTranslate server
pub struct HttpTranslator {
    client: Client,
    endpoint: Url,
    api_key: Option<String>,
}

impl HttpTranslator {
    pub fn new(client: Client, endpoint: Url, api_key: Option<String>) -> Self {
        Self {
            client,
            endpoint,
            api_key,
        }
    }
}

#[async_trait]
impl Translator for HttpTranslator {
    async fn translate(&self, text: &str, source: &str) -> Result<String, TranslationError> {
        let request = TranslateRequest {
            q: text,
            source,
            target: "en",
            format: "text",
            api_key: self.api_key.as_deref(),
        };

        let response = self
            .client
            .post(self.endpoint.clone())
            .json(&request)
            .send()
            .await
            .map_err(|e| TranslationError::Transient(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| TranslationError::Transient(e.to_string()))?;

        if status.as_u16() == 429 || status.is_server_error() {
            return Err(TranslationError::Transient(format!("HTTP {}", status.as_u16())));
        }
        if !status.is_success() {
            return Err(TranslationError::Rejected {
                status: status.as_u16(),
                message: body,
            });
        }

        let parsed: TranslateResponse = serde_json::from_str(&body)
            .map_err(|e| TranslationError::Malformed(e.to_string()))?;
        Ok(parsed.translated_text)
    }
}
