use reqwest::Client;
use serde::Deserialize;
use tracing::debug;
use url::Url;

use crate::{non_empty, LookupError, LookupResult, Searcher};

pub const DEFAULT_SEARCH_URL: &str = "https://api.duckduckgo.com/";

#[derive(Debug, Deserialize)]
struct InstantAnswer {
    #[serde(rename = "AbstractText", default)]
    abstract_text: Option<String>,
    #[serde(rename = "RelatedTopics", default)]
    related_topics: Vec<RelatedTopic>,
}

// Topic groups carry `Name`/`Topics` instead of `Text`.
#[derive(Debug, Deserialize)]
struct RelatedTopic {
    #[serde(rename = "Text", default)]
    text: Option<String>,
}

/// Client for a DuckDuckGo instant-answer style endpoint.
#[derive(Debug, Clone)]
pub struct DuckDuckGoSearcher {
    client: Client,
    endpoint: Url,
}

impl DuckDuckGoSearcher {
    pub fn new(client: Client, endpoint: Url) -> Self {
        Self { client, endpoint }
    }
}

impl Searcher for DuckDuckGoSearcher {
    async fn search(&self, query: &str) -> LookupResult {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut()
            .append_pair("q", query)
            .append_pair("format", "json")
            .append_pair("no_html", "1")
            .append_pair("skip_disambig", "1");

        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(LookupError::Status(status.as_u16()));
        }

        let body = response.text().await?;
        let answer: InstantAnswer = serde_json::from_str(&body)
            .map_err(|err| LookupError::Malformed(err.to_string()))?;

        let from_abstract = non_empty(answer.abstract_text.as_deref());
        let found = from_abstract.or_else(|| {
            answer
                .related_topics
                .first()
                .and_then(|topic| non_empty(topic.text.as_deref()))
        });

        debug!(found = found.is_some(), "search provider answered");
        Ok(found)
    }
}
