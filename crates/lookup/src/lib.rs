//! Outbound collaborators: a translation provider and a definition/search
//! provider. Clients report failures as [`LookupError`]; deciding to swallow
//! them is the caller's job.

mod search;
mod translate;

use std::time::Duration;

use reqwest::Client;
use shadow_core::Lang;
use thiserror::Error;

pub use search::{DuckDuckGoSearcher, DEFAULT_SEARCH_URL};
pub use translate::{MyMemoryTranslator, DEFAULT_TRANSLATE_URL};

#[derive(Debug, Error)]
pub enum LookupError {
    #[error("provider request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("provider answered with status {0}")]
    Status(u16),
    #[error("provider response was malformed: {0}")]
    Malformed(String),
}

pub type LookupResult = Result<Option<String>, LookupError>;

/// `Ok(None)` means the provider answered but had nothing usable.
pub trait Translator: Send + Sync {
    async fn translate(&self, text: &str, from: Lang, to: Lang) -> LookupResult;
}

pub trait Searcher: Send + Sync {
    async fn search(&self, query: &str) -> LookupResult;
}

pub fn build_http_client(timeout: Option<Duration>) -> Result<Client, LookupError> {
    let mut builder =
        Client::builder().user_agent(concat!("shadow-brain/", env!("CARGO_PKG_VERSION")));
    if let Some(timeout) = timeout {
        builder = builder.timeout(timeout);
    }
    Ok(builder.build()?)
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(ToString::to_string)
}
