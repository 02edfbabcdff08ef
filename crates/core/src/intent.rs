use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::{Classification, Intent, Lang};

/// Ordered rule table. The first rule with a matching needle wins, so the
/// order here is the tie-break order.
const INTENT_RULES: &[(Intent, &[&str])] = &[
    (Intent::Question, &["?", "؟"]),
    (Intent::Translate, &["ترجم", "translate"]),
    (Intent::Search, &["ابحث", "search"]),
    (Intent::Greeting, &["مرحبا", "hello", "hi"]),
    (Intent::Emotion, &["أحب", "love", "حزين", "sad"]),
];

// `\b` is Unicode-aware, so "ترجمة" and "translated" are left intact.
static TRANSLATE_TRIGGERS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(?:ترجم|translate)\b").expect("valid trigger regex"));

pub fn detect_lang(text: &str) -> Lang {
    if text
        .chars()
        .any(|ch| (0x0600..=0x06FF).contains(&(ch as u32)))
    {
        Lang::Ar
    } else {
        Lang::En
    }
}

pub fn resolve_lang(hint: Option<&str>, text: &str) -> Lang {
    Lang::from_hint(hint).unwrap_or_else(|| detect_lang(text))
}

pub fn classify_intent(text: &str) -> Intent {
    let lower = text.to_lowercase();

    INTENT_RULES
        .iter()
        .find(|(_, needles)| contains_any(&lower, needles))
        .map(|(intent, _)| *intent)
        .unwrap_or(Intent::Statement)
}

pub fn classify(hint: Option<&str>, text: &str) -> Classification {
    Classification {
        lang: resolve_lang(hint, text),
        intent: classify_intent(text),
    }
}

/// Removes the translate trigger words so only the text to translate is sent
/// to the provider.
pub fn strip_translate_triggers(message: &str) -> String {
    let stripped = TRANSLATE_TRIGGERS.replace_all(message, " ");

    stripped
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .trim_start_matches(|ch: char| ch == ':' || ch == '-' || ch.is_whitespace())
        .trim()
        .to_string()
}

fn contains_any(input: &str, needles: &[&str]) -> bool {
    needles.iter().any(|needle| input.contains(needle))
}
