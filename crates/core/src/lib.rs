pub mod composer;
pub mod intent;
pub mod models;

pub use composer::{compose_reply, empty_message_reply, error_reply, throttled_reply};
pub use intent::{classify, classify_intent, detect_lang, resolve_lang, strip_translate_triggers};
pub use models::*;
