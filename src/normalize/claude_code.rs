//! Claude Code session records: a `messages` array of role/content
//! entries, where content may itself be a content-block array.

use serde_json::{Map, Value};

use crate::model::NormalizedConversation;
use crate::sources::SourceKind;

use super::{ExtractLimits, collect_messages, extract_id, extract_metadata, extract_title, generic};

pub fn normalize_object(obj: &Map<String, Value>, limits: &ExtractLimits) -> NormalizedConversation {
    let Some(items) = obj.get("messages").and_then(Value::as_array) else {
        let mut conv = generic::normalize_object(obj, limits);
        conv.source = SourceKind::ClaudeCode;
        return conv;
    };

    let (messages, content) = collect_messages(items, limits);
    let mut metadata = extract_metadata(obj);
    metadata.insert("message_count".to_string(), Value::from(messages.len()));

    NormalizedConversation {
        id: extract_id(obj),
        title: extract_title(obj),
        content,
        messages,
        metadata,
        source: SourceKind::ClaudeCode,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
