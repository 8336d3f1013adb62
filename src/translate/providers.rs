use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::ProviderError;

pub const LIBRETRANSLATE_URL: &str = "https://libretranslate.com";
pub const MYMEMORY_URL: &str = "https://api.mymemory.translated.net";
pub const GOOGLE_TRANSLATE_URL: &str = "https://translate.googleapis.com";

/// One external translation backend.
///
/// `Ok(None)` means the provider answered but had nothing usable; the broker
/// treats it the same as an error and moves on.
#[async_trait]
pub trait TranslationProvider: Send + Sync {
    fn name(&self) -> &'static str;

    async fn translate(
        &self,
        text: &str,
        source: &str,
        target: &str,
    ) -> Result<Option<String>, ProviderError>;
}

fn non_empty(text: Option<String>) -> Option<String> {
    text.filter(|t| !t.trim().is_empty())
}

fn ensure_success(response: Response) -> Result<Response, ProviderError> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        Err(ProviderError::Status(status.as_u16()))
    }
}

/// LibreTranslate: JSON POST to `/translate`.
pub struct LibreTranslate {
    http: Client,
    base_url: String,
}

impl LibreTranslate {
    pub fn new(http: Client, base_url: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[derive(Serialize)]
struct LibreRequest<'a> {
    q: &'a str,
    source: &'a str,
    target: &'a str,
    format: &'static str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LibreResponse {
    translated_text: Option<String>,
}

#[async_trait]
impl TranslationProvider for LibreTranslate {
    fn name(&self) -> &'static str {
        "libretranslate"
    }

    async fn translate(
        &self,
        text: &str,
        source: &str,
        target: &str,
    ) -> Result<Option<String>, ProviderError> {
        let request = LibreRequest {
            q: text,
            source,
            target,
            format: "text",
        };
        let response = self
            .http
            .post(format!("{}/translate", self.base_url))
            .header("User-Agent", crate::USER_AGENT)
            .json(&request)
            .send()
            .await?;

        let body: LibreResponse = ensure_success(response)?.json().await?;
        Ok(non_empty(body.translated_text))
    }
}

/// MyMemory: GET `/get?q=..&langpair=src|tgt`.
pub struct MyMemory {
    http: Client,
    base_url: String,
}

impl MyMemory {
    pub fn new(http: Client, base_url: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct MyMemoryResponse {
    response_data: Option<MyMemoryData>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct MyMemoryData {
    translated_text: Option<String>,
}

#[async_trait]
impl TranslationProvider for MyMemory {
    fn name(&self) -> &'static str {
        "mymemory"
    }

    async fn translate(
        &self,
        text: &str,
        source: &str,
        target: &str,
    ) -> Result<Option<String>, ProviderError> {
        let langpair = format!("{source}|{target}");
        let response = self
            .http
            .get(format!("{}/get", self.base_url))
            .header("User-Agent", crate::USER_AGENT)
            .query(&[("q", text), ("langpair", langpair.as_str())])
            .send()
            .await?;

        let body: MyMemoryResponse = ensure_success(response)?.json().await?;
        Ok(non_empty(body.response_data.and_then(|d| d.translated_text)))
    }
}

/// Google's unofficial `translate_a/single` endpoint (`client=gtx`).
pub struct GoogleGtx {
    http: Client,
    base_url: String,
}

impl GoogleGtx {
    pub fn new(http: Client, base_url: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl TranslationProvider for GoogleGtx {
    fn name(&self) -> &'static str {
        "google-gtx"
    }

    async fn translate(
        &self,
        text: &str,
        source: &str,
        target: &str,
    ) -> Result<Option<String>, ProviderError> {
        let response = self
            .http
            .get(format!("{}/translate_a/single", self.base_url))
            .header("User-Agent", crate::USER_AGENT)
            .query(&[
                ("client", "gtx"),
                ("sl", source),
                ("tl", target),
                ("dt", "t"),
                ("q", text),
            ])
            .send()
            .await?;

        let body: Value = ensure_success(response)?.json().await?;
        Ok(non_empty(join_gtx_chunks(&body)))
    }
}

/// `data[0]` is a list of `[translated, original, ...]` chunks.
fn join_gtx_chunks(body: &Value) -> Option<String> {
    let chunks = body.get(0)?.as_array()?;
    let joined = chunks
        .iter()
        .map(|chunk| match chunk.get(0) {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Null) | None => String::new(),
            Some(other) => other.to_string(),
        })
        .collect::<Vec<_>>()
        .join(" ");
    Some(joined.trim().to_string())
}
