use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use shadow_core::{
    classify_intent, compose_reply, detect_lang, empty_message_reply, resolve_lang,
    strip_translate_triggers, Intent, Payload, QueryRequest, ShadowReply,
};
use shadow_lookup::{
    build_http_client, DuckDuckGoSearcher, LookupResult, MyMemoryTranslator, Searcher, Translator,
};
use shadow_observability::{AppMetrics, Counter};
use tracing::{debug, info, instrument, warn};
use url::Url;

pub type HttpShadowAgent = ShadowAgent<MyMemoryTranslator, DuckDuckGoSearcher>;

#[derive(Clone)]
pub struct ShadowAgent<T, S>
where
    T: Translator,
    S: Searcher,
{
    translator: Arc<T>,
    searcher: Arc<S>,
    metrics: Arc<AppMetrics>,
}

impl<T, S> ShadowAgent<T, S>
where
    T: Translator,
    S: Searcher,
{
    pub fn new(translator: Arc<T>, searcher: Arc<S>, metrics: Arc<AppMetrics>) -> Self {
        Self {
            translator,
            searcher,
            metrics,
        }
    }

    /// Runs one message through detection, classification, the optional
    /// provider call and templating. Provider failures are absorbed into the
    /// fallback wording, so there is always a reply.
    #[instrument(skip(self, request))]
    pub async fn answer(&self, request: QueryRequest) -> ShadowReply {
        let started = Instant::now();
        self.metrics.record(Counter::Request);

        let message = request.message.trim();
        if message.is_empty() {
            self.metrics.observe_latency(started.elapsed());
            debug!("empty message, skipping classification");
            return empty_message_reply();
        }

        let lang = resolve_lang(request.lang.as_deref(), message);
        let intent = classify_intent(message);

        let mut payload: Option<Payload> = None;

        if intent == Intent::Translate {
            let text = strip_translate_triggers(message);
            if !text.is_empty() {
                payload = self.translate(&text).await.map(Payload::Translation);
                if payload.is_some() {
                    self.metrics.record(Counter::Translation);
                } else {
                    self.metrics.record(Counter::Fallback);
                }
            }
        }

        // Translate and lookup never share an intent, but the guard keeps a
        // payload from being overwritten if that ever changes.
        if intent.wants_lookup() && payload.is_none() {
            payload = self.lookup(message).await.map(Payload::Lookup);
            if payload.is_some() {
                self.metrics.record(Counter::Lookup);
            } else {
                self.metrics.record(Counter::Fallback);
            }
        }

        let reply = compose_reply(intent, lang, message, payload.as_ref());

        self.metrics.observe_latency(started.elapsed());
        info!(
            lang = %lang.as_code(),
            intent = %intent.as_str(),
            source = %reply.source.as_str(),
            confidence = reply.confidence,
            "query handled"
        );

        reply
    }

    async fn translate(&self, text: &str) -> Option<String> {
        let from = detect_lang(text);
        let to = from.opposite();
        let result = self.translator.translate(text, from, to).await;
        absorb("translation", result)
    }

    async fn lookup(&self, query: &str) -> Option<String> {
        let result = self.searcher.search(query).await;
        absorb("search", result)
    }
}

/// Builds an agent backed by the real translation and search providers,
/// sharing one HTTP client between them.
pub fn build_http_agent(
    translate_url: Url,
    search_url: Url,
    timeout: Option<Duration>,
    metrics: Arc<AppMetrics>,
) -> Result<HttpShadowAgent> {
    let client = build_http_client(timeout).context("failed to build HTTP client")?;

    Ok(ShadowAgent::new(
        Arc::new(MyMemoryTranslator::new(client.clone(), translate_url)),
        Arc::new(DuckDuckGoSearcher::new(client, search_url)),
        metrics,
    ))
}

fn absorb(provider: &str, result: LookupResult) -> Option<String> {
    match result {
        Ok(Some(text)) => Some(text),
        Ok(None) => {
            debug!(provider, "provider had no usable answer");
            None
        }
        Err(err) => {
            warn!(provider, error = %err, "provider call failed, using fallback wording");
            None
        }
    }
}
