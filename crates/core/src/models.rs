use serde::{Deserialize, Serialize};

pub const BASE_CONFIDENCE: f64 = 0.5;
pub const TRANSLATION_CONFIDENCE: f64 = 0.9;
pub const LOOKUP_CONFIDENCE: f64 = 0.85;
pub const NO_CONFIDENCE: f64 = 0.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Lang {
    Ar,
    En,
}

impl Lang {
    /// Parses a caller-supplied language hint. Empty or unrecognised hints
    /// yield `None` so auto-detection stays in charge.
    pub fn from_hint(value: Option<&str>) -> Option<Self> {
        match value.map(|v| v.trim().to_lowercase()) {
            Some(v) if v == "ar" || v.starts_with("ar-") || v == "arabic" => Some(Self::Ar),
            Some(v) if v == "en" || v.starts_with("en-") || v == "english" => Some(Self::En),
            _ => None,
        }
    }

    pub fn as_code(self) -> &'static str {
        match self {
            Self::Ar => "ar",
            Self::En => "en",
        }
    }

    pub fn opposite(self) -> Self {
        match self {
            Self::Ar => Self::En,
            Self::En => Self::Ar,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    Question,
    Translate,
    Search,
    Greeting,
    Emotion,
    Statement,
}

impl Intent {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Question => "question",
            Self::Translate => "translate",
            Self::Search => "search",
            Self::Greeting => "greeting",
            Self::Emotion => "emotion",
            Self::Statement => "statement",
        }
    }

    /// Intents that go out to the definition/search provider.
    pub fn wants_lookup(self) -> bool {
        matches!(self, Self::Question | Self::Search)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReplySource {
    #[serde(rename = "shadow-brain")]
    ShadowBrain,
    #[serde(rename = "translation-api")]
    TranslationApi,
    #[serde(rename = "duckduckgo")]
    DuckDuckGo,
    #[serde(rename = "shadow-brain-error")]
    ShadowBrainError,
}

impl ReplySource {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ShadowBrain => "shadow-brain",
            Self::TranslationApi => "translation-api",
            Self::DuckDuckGo => "duckduckgo",
            Self::ShadowBrainError => "shadow-brain-error",
        }
    }
}

/// Text obtained from an outbound provider, tagged with where it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    Translation(String),
    Lookup(String),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QueryRequest {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub lang: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShadowReply {
    pub answer: String,
    pub confidence: f64,
    pub source: ReplySource,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Classification {
    pub lang: Lang,
    pub intent: Intent,
}
