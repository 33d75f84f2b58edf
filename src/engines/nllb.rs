use async_trait::async_trait;
use log::debug;
use once_cell::sync::Lazy;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

use crate::app_config::EngineConfig;
use crate::engines::Translator;
use crate::errors::TranslationError;

// ISO 639-1 to NLLB-200 language codes
static LANGUAGE_MAP: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("en", "eng_Latn"),
        ("es", "spa_Latn"),
        ("fr", "fra_Latn"),
        ("de", "deu_Latn"),
        ("pt", "por_Latn"),
        ("it", "ita_Latn"),
        ("nl", "nld_Latn"),
        ("pl", "pol_Latn"),
        ("tr", "tur_Latn"),
        ("ru", "rus_Cyrl"),
        ("uk", "ukr_Cyrl"),
        ("ar", "arb_Arab"),
        ("hi", "hin_Deva"),
        ("bn", "ben_Beng"),
        ("zh", "zho_Hans"),
        ("ja", "jpn_Jpan"),
        ("ko", "kor_Hang"),
        ("vi", "vie_Latn"),
        ("id", "ind_Latn"),
        ("th", "tha_Thai"),
        ("sw", "swh_Latn"),
        ("ro", "ron_Latn"),
        ("cs", "ces_Latn"),
        ("hu", "hun_Latn"),
        ("el", "ell_Grek"),
        ("sv", "swe_Latn"),
        ("da", "dan_Latn"),
        ("fi", "fin_Latn"),
        ("no", "nob_Latn"),
        ("he", "heb_Hebr"),
        ("fa", "pes_Arab"),
        ("ur", "urd_Arab"),
        ("tl", "tgl_Latn"),
        ("ms", "zsm_Latn"),
    ])
});

/// HTTP client for an NLLB-compatible translation server
#[derive(Debug)]
pub struct NllbEngine {
    /// Base URL of the translation server
    base_url: String,
    /// Model name to request
    model: String,
    /// HTTP client for making requests
    client: Client,
}

/// Translation request for the server
#[derive(Debug, Serialize, Deserialize)]
struct TranslateRequest {
    /// Model name
    model: String,
    /// Texts to translate, order-preserving
    texts: Vec<String>,
    /// NLLB source language code
    source: String,
    /// NLLB target language code
    target: String,
}

/// Translation response from the server
#[derive(Debug, Serialize, Deserialize)]
struct TranslateResponse {
    /// Translated texts, parallel to the request
    translations: Vec<String>,
}

impl NllbEngine {
    /// Create a new engine client from config
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            base_url: config.endpoint.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            client: Client::builder()
                .timeout(Duration::from_secs(config.timeout_secs))
                .build()
                .unwrap_or_default(),
        }
    }

    /// Resolve an ISO 639-1 code to its NLLB-200 code
    pub fn nllb_code(language: &str) -> Result<&'static str, TranslationError> {
        LANGUAGE_MAP.get(language).copied().ok_or_else(|| {
            TranslationError::EngineFailed(format!("No NLLB code for language: {}", language))
        })
    }
}

#[async_trait]
impl Translator for NllbEngine {
    async fn translate_batch(
        &self,
        texts: &[String],
        source_language: &str,
        target_language: &str,
    ) -> Result<Vec<String>, TranslationError> {
        let url = format!("{}/translate", self.base_url);
        debug!(
            "Translating {} texts {} -> {}",
            texts.len(),
            source_language,
            target_language
        );

        let request = TranslateRequest {
            model: self.model.clone(),
            texts: texts.to_vec(),
            source: Self::nllb_code(source_language)?.to_string(),
            target: Self::nllb_code(target_language)?.to_string(),
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| TranslationError::EngineFailed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to get error response text".to_string());
            return Err(TranslationError::EngineFailed(format!(
                "Translation server error ({}): {}",
                status, body
            )));
        }

        let parsed: TranslateResponse = response
            .json()
            .await
            .map_err(|e| TranslationError::EngineFailed(format!("Invalid response: {}", e)))?;

        Ok(parsed.translations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nllbCode_withKnownLanguages_shouldResolve() {
        assert_eq!(NllbEngine::nllb_code("en").unwrap(), "eng_Latn");
        assert_eq!(NllbEngine::nllb_code("es").unwrap(), "spa_Latn");
        assert_eq!(NllbEngine::nllb_code("zh").unwrap(), "zho_Hans");
        assert_eq!(NllbEngine::nllb_code("ru").unwrap(), "rus_Cyrl");
    }

    #[test]
    fn test_nllbCode_withUnknownLanguage_shouldFail() {
        assert!(NllbEngine::nllb_code("zz").is_err());
        assert!(NllbEngine::nllb_code("").is_err());
    }
}
