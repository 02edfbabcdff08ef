use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use shadow_core::Lang;
use tracing::debug;
use url::Url;

use crate::{non_empty, LookupError, LookupResult, Translator};

pub const DEFAULT_TRANSLATE_URL: &str = "https://api.mymemory.translated.net/get";

#[derive(Debug, Deserialize)]
struct MyMemoryResponse {
    #[serde(rename = "responseData")]
    response_data: Option<MyMemoryData>,
    #[serde(rename = "responseStatus")]
    response_status: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct MyMemoryData {
    #[serde(rename = "translatedText")]
    translated_text: Option<String>,
}

/// Client for a MyMemory-style `GET ?q=..&langpair=from|to` endpoint.
#[derive(Debug, Clone)]
pub struct MyMemoryTranslator {
    client: Client,
    endpoint: Url,
}

impl MyMemoryTranslator {
    pub fn new(client: Client, endpoint: Url) -> Self {
        Self { client, endpoint }
    }
}

impl Translator for MyMemoryTranslator {
    async fn translate(&self, text: &str, from: Lang, to: Lang) -> LookupResult {
        let langpair = format!("{}|{}", from.as_code(), to.as_code());
        let mut url = self.endpoint.clone();
        url.query_pairs_mut()
            .append_pair("q", text)
            .append_pair("langpair", &langpair);

        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(LookupError::Status(status.as_u16()));
        }

        let body = response.text().await?;
        let parsed: MyMemoryResponse = serde_json::from_str(&body)
            .map_err(|err| LookupError::Malformed(err.to_string()))?;

        // the provider reports quota and pair errors in-band with HTTP 200
        if let Some(code) = parsed.response_status.as_ref().and_then(status_code) {
            if code != 200 {
                return Err(LookupError::Status(code));
            }
        }

        let data = parsed
            .response_data
            .ok_or_else(|| LookupError::Malformed("missing responseData".to_string()))?;
        let translated = non_empty(data.translated_text.as_deref());

        debug!(langpair = %langpair, found = translated.is_some(), "translation provider answered");
        Ok(translated)
    }
}

fn status_code(value: &Value) -> Option<u16> {
    match value {
        Value::Number(number) => number.as_u64().and_then(|code| u16::try_from(code).ok()),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}
