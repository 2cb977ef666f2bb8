//! Last-rung normalizer: `messages` arrays, flat `content`/`text` strings,
//! bare message lists, and bare strings.

use serde_json::{Map, Value};

use crate::model::{NormalizedConversation, default_title};
use crate::sources::SourceKind;

use super::{
    ContentBudget, ExtractLimits, collect_messages, extract_id, extract_metadata, extract_title,
};

pub fn normalize_object(obj: &Map<String, Value>, limits: &ExtractLimits) -> NormalizedConversation {
    if let Some(items) = obj.get("messages").and_then(Value::as_array) {
        let (messages, content) = collect_messages(items, limits);
        let mut metadata = extract_metadata(obj);
        metadata.insert("message_count".to_string(), Value::from(messages.len()));
        return NormalizedConversation {
            id: extract_id(obj),
            title: extract_title(obj),
            content,
            messages,
            metadata,
            source: SourceKind::Unknown,
        };
    }

    let mut budget = ContentBudget::new(limits.max_chars);
    for field in ["content", "text", "body"] {
        if let Some(text) = obj.get(field).and_then(Value::as_str) {
            budget.push(text);
            break;
        }
    }

    NormalizedConversation {
        id: extract_id(obj),
        title: extract_title(obj),
        content: budget.finish(),
        messages: Vec::new(),
        metadata: extract_metadata(obj),
        source: SourceKind::Unknown,
    }
}

/// A bare list is treated as a message array directly.
pub fn from_message_array(
    items: &[Value],
    limits: &ExtractLimits,
    source: SourceKind,
) -> NormalizedConversation {
    let (messages, content) = collect_messages(items, limits);
    let mut conv = NormalizedConversation::empty(source);
    conv.content = content;
    conv.messages = messages;
    conv
}

/// A bare string is already-extracted content, hard-truncated to the cap.
pub fn from_text(text: &str, limits: &ExtractLimits, source: SourceKind) -> NormalizedConversation {
    let mut budget = ContentBudget::new(limits.max_chars);
    budget.push(text);
    NormalizedConversation {
        id: String::new(),
        title: default_title(),
        content: budget.finish(),
        messages: Vec::new(),
        metadata: Default::default(),
        source,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
