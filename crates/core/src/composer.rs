use crate::models::{
    Intent, Lang, Payload, ReplySource, ShadowReply, BASE_CONFIDENCE, LOOKUP_CONFIDENCE,
    NO_CONFIDENCE, TRANSLATION_CONFIDENCE,
};

const EMPTY_MESSAGE_ANSWER: &str = "لم يصلني أي نص.. No text received.";
const ERROR_ANSWER: &str = "عذراً، حدث تداخل في التفكير السحابي.";
const THROTTLED_ANSWER: &str = "اهداً قليلاً.. الظل يحتاج وقتاً للتفكير.";

/// Picks the language- and intent-specific template for a reply.
///
/// Greeting, emotion and statement replies are canned and ignore any payload.
/// Translate, search and question replies lead with the payload when one was
/// obtained and fall back to apologetic wording otherwise. Confidence and
/// source follow the payload that was actually used.
pub fn compose_reply(
    intent: Intent,
    lang: Lang,
    message: &str,
    payload: Option<&Payload>,
) -> ShadowReply {
    let answer = match (intent, lang) {
        (Intent::Greeting, Lang::Ar) => "أهلاً، أنا هنا. تفضل.".to_string(),
        (Intent::Greeting, Lang::En) => "Hey, I'm here. Go ahead.".to_string(),
        (Intent::Emotion, Lang::Ar) => "أشعر بك. احكِ لي أكثر، أنا أسمعك.".to_string(),
        (Intent::Emotion, Lang::En) => "I feel you. Tell me more, I'm listening.".to_string(),
        (Intent::Translate, lang) => match (translation_text(payload), lang) {
            (Some(text), Lang::Ar) => format!("ترجمت لك:\n{text}"),
            (Some(text), Lang::En) => format!("Here is your translation:\n{text}"),
            (None, Lang::Ar) => "لم أستطع الترجمة الآن، جرّب صياغة أخرى.".to_string(),
            (None, Lang::En) => "I couldn't translate that right now. Try rephrasing it.".to_string(),
        },
        (Intent::Search, lang) => match (lookup_text(payload), lang) {
            (Some(text), Lang::Ar) => format!("هذا ما وجدته:\n{text}"),
            (Some(text), Lang::En) => format!("Here's what I found:\n{text}"),
            (None, Lang::Ar) => format!("بحثت عن \"{message}\" ولم أجد نتيجة واضحة، جرّب كلمات أخرى."),
            (None, Lang::En) => {
                format!("I searched for \"{message}\" but found nothing clear. Try other keywords.")
            }
        },
        (Intent::Question, lang) => match (lookup_text(payload), lang) {
            (Some(text), Lang::Ar) => format!("{text}\n\nهذا ما أعرفه عن سؤالك."),
            (Some(text), Lang::En) => format!("{text}\n\nThat's what I know about it."),
            (None, Lang::Ar) => "سؤال جيد، لكن لا أملك إجابة مؤكدة عنه الآن.".to_string(),
            (None, Lang::En) => "Good question. I don't have a solid answer for it yet.".to_string(),
        },
        (Intent::Statement, Lang::Ar) => "فهمت كلامك.. أنا الظل، كيف أساعدك؟".to_string(),
        (Intent::Statement, Lang::En) => "I hear you.. I am Shadow, how can I help?".to_string(),
    };

    let (confidence, source) = match (intent, payload) {
        (Intent::Translate, Some(Payload::Translation(_))) => {
            (TRANSLATION_CONFIDENCE, ReplySource::TranslationApi)
        }
        (Intent::Search | Intent::Question, Some(Payload::Lookup(_))) => {
            (LOOKUP_CONFIDENCE, ReplySource::DuckDuckGo)
        }
        _ => (BASE_CONFIDENCE, ReplySource::ShadowBrain),
    };

    ShadowReply {
        answer,
        confidence,
        source,
        error: None,
    }
}

pub fn empty_message_reply() -> ShadowReply {
    ShadowReply {
        answer: EMPTY_MESSAGE_ANSWER.to_string(),
        confidence: NO_CONFIDENCE,
        source: ReplySource::ShadowBrain,
        error: None,
    }
}

pub fn error_reply(detail: impl Into<String>) -> ShadowReply {
    let detail = detail.into();
    ShadowReply {
        answer: ERROR_ANSWER.to_string(),
        confidence: NO_CONFIDENCE,
        source: ReplySource::ShadowBrainError,
        error: (!detail.trim().is_empty()).then_some(detail),
    }
}

pub fn throttled_reply() -> ShadowReply {
    ShadowReply {
        answer: THROTTLED_ANSWER.to_string(),
        confidence: NO_CONFIDENCE,
        source: ReplySource::ShadowBrain,
        error: None,
    }
}

fn translation_text(payload: Option<&Payload>) -> Option<&str> {
    match payload {
        Some(Payload::Translation(text)) => Some(text.as_str()),
        _ => None,
    }
}

fn lookup_text(payload: Option<&Payload>) -> Option<&str> {
    match payload {
        Some(Payload::Lookup(text)) => Some(text.as_str()),
        _ => None,
    }
}
