//! Translation broker: source-language detection plus an ordered provider chain.

mod detect;
pub mod providers;

pub use detect::{DetectByUnicodeRange, LanguageDetector};
pub use providers::{GoogleGtx, LibreTranslate, MyMemory, TranslationProvider};

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("provider returned status {0}")]
    Status(u16),
}

/// Body of `POST /api/translate`. Both fields are checked for presence by the handler.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslationRequest {
    pub text: Option<String>,
    pub target_lang: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslationResult {
    pub translated_text: String,
}

/// Base URLs of the built-in providers.
#[derive(Debug, Clone)]
pub struct ProviderEndpoints {
    pub libretranslate: String,
    pub mymemory: String,
    pub google: String,
}

impl Default for ProviderEndpoints {
    fn default() -> Self {
        Self {
            libretranslate: providers::LIBRETRANSLATE_URL.to_string(),
            mymemory: providers::MYMEMORY_URL.to_string(),
            google: providers::GOOGLE_TRANSLATE_URL.to_string(),
        }
    }
}

/// The production provider order: LibreTranslate, MyMemory, then Google gtx.
pub fn default_providers(
    http: &Client,
    endpoints: &ProviderEndpoints,
) -> Vec<Box<dyn TranslationProvider>> {
    vec![
        Box::new(LibreTranslate::new(http.clone(), &endpoints.libretranslate)),
        Box::new(MyMemory::new(http.clone(), &endpoints.mymemory)),
        Box::new(GoogleGtx::new(http.clone(), &endpoints.google)),
    ]
}

pub struct TranslationBroker {
    detector: Box<dyn LanguageDetector>,
    providers: Vec<Box<dyn TranslationProvider>>,
}

impl TranslationBroker {
    pub fn new(
        detector: Box<dyn LanguageDetector>,
        providers: Vec<Box<dyn TranslationProvider>>,
    ) -> Self {
        Self {
            detector,
            providers,
        }
    }

    pub fn from_endpoints(http: &Client, endpoints: &ProviderEndpoints) -> Self {
        Self::new(
            Box::new(DetectByUnicodeRange),
            default_providers(http, endpoints),
        )
    }

    pub fn detect(&self, text: &str) -> String {
        self.detector.detect(text)
    }

    /// Try each provider in order and return the first non-empty translation.
    ///
    /// Returns an empty string when every provider fails; callers decide
    /// whether to substitute the original text.
    pub async fn translate(&self, text: &str, target: &str) -> String {
        let source = self.detect(text);
        debug!(source = %source, target, chars = text.chars().count(), "translating");

        for provider in &self.providers {
            match provider.translate(text, &source, target).await {
                Ok(Some(translated)) => {
                    info!(provider = provider.name(), "translation complete");
                    return translated;
                }
                Ok(None) => debug!(provider = provider.name(), "provider returned no text"),
                Err(e) => warn!(provider = provider.name(), error = %e, "translation provider failed"),
            }
        }

        warn!(providers = self.providers.len(), "all translation providers failed");
        String::new()
    }
}
