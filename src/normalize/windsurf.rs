//! Windsurf records: conversation payloads nested under `chat_data` or
//! `session_data`, either as a message array directly or as an object
//! wrapping one.

use serde_json::{Map, Value};

use crate::model::NormalizedConversation;
use crate::sources::SourceKind;

use super::{ExtractLimits, collect_messages, extract_id, extract_metadata, extract_title, generic};

pub fn normalize_object(obj: &Map<String, Value>, limits: &ExtractLimits) -> NormalizedConversation {
    let payload = obj.get("chat_data").or_else(|| obj.get("session_data"));
    let items = match payload {
        Some(Value::Array(items)) => Some(items.as_slice()),
        Some(Value::Object(inner)) => inner
            .get("messages")
            .and_then(Value::as_array)
            .map(|v| v.as_slice()),
        _ => None,
    };

    let Some(items) = items else {
        let mut conv = generic::normalize_object(obj, limits);
        conv.source = SourceKind::Windsurf;
        return conv;
    };

    let (messages, content) = collect_messages(items, limits);
    let mut metadata = extract_metadata(obj);
    // Nested payloads can carry their own identifiers.
    if let Some(Value::Object(inner)) = payload {
        for (key, value) in extract_metadata(inner) {
            metadata.entry(key).or_insert(value);
        }
    }
    metadata.insert("message_count".to_string(), Value::from(messages.len()));

    NormalizedConversation {
        id: extract_id(obj),
        title: extract_title(obj),
        content,
        messages,
        metadata,
        source: SourceKind::Windsurf,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
