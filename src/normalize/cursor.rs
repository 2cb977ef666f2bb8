//! Cursor composer records: `composerSteps` arrays, with the older
//! tabs/bubbles layout as a fallback shape.

use serde_json::{Map, Value};

use crate::model::{MessageRole, NormalizedConversation, NormalizedMessage};
use crate::sources::SourceKind;

use super::{ContentBudget, ExtractLimits, extract_id, extract_metadata, extract_title, generic};

pub fn normalize_object(obj: &Map<String, Value>, limits: &ExtractLimits) -> NormalizedConversation {
    if let Some(steps) = obj.get("composerSteps").and_then(Value::as_array) {
        return from_steps(obj, steps, limits);
    }
    if let Some(tabs) = obj.get("tabs").and_then(Value::as_array) {
        return from_tabs(obj, tabs, limits);
    }
    let mut conv = generic::normalize_object(obj, limits);
    conv.source = SourceKind::Cursor;
    conv
}

fn from_steps(
    obj: &Map<String, Value>,
    steps: &[Value],
    limits: &ExtractLimits,
) -> NormalizedConversation {
    let mut messages = Vec::with_capacity(steps.len());
    let mut budget = ContentBudget::new(limits.max_chars);
    for step in steps {
        let text = step
            .get("content")
            .or_else(|| step.get("text"))
            .map(super::flatten_content)
            .unwrap_or_default();
        if text.trim().is_empty() {
            continue;
        }
        let role = step
            .get("type")
            .or_else(|| step.get("role"))
            .and_then(Value::as_str)
            .map(MessageRole::from_raw)
            .unwrap_or(MessageRole::User);
        if !budget.exhausted() {
            budget.push(&text);
        }
        messages.push(NormalizedMessage {
            role,
            content: text,
        });
    }

    let mut metadata = extract_metadata(obj);
    metadata.insert("step_count".to_string(), Value::from(messages.len()));

    NormalizedConversation {
        id: extract_id(obj),
        title: extract_title(obj),
        content: budget.finish(),
        messages,
        metadata,
        source: SourceKind::Cursor,
    }
}

/// Older composer layout: `tabs[].bubbles[]` with `type` user/ai (or the
/// numeric codes newer builds write).
fn from_tabs(
    obj: &Map<String, Value>,
    tabs: &[Value],
    limits: &ExtractLimits,
) -> NormalizedConversation {
    let mut messages = Vec::new();
    let mut budget = ContentBudget::new(limits.max_chars);
    for tab in tabs {
        let Some(bubbles) = tab.get("bubbles").and_then(Value::as_array) else {
            continue;
        };
        for bubble in bubbles {
            let text = bubble
                .get("text")
                .or_else(|| bubble.get("content"))
                .map(super::flatten_content)
                .unwrap_or_default();
            if text.trim().is_empty() {
                continue;
            }
            let role = bubble_role(bubble);
            if !budget.exhausted() {
                budget.push(&text);
            }
            messages.push(NormalizedMessage {
                role,
                content: text,
            });
        }
    }

    let mut metadata = extract_metadata(obj);
    metadata.insert("message_count".to_string(), Value::from(messages.len()));

    NormalizedConversation {
        id: extract_id(obj),
        title: extract_title(obj),
        content: budget.finish(),
        messages,
        metadata,
        source: SourceKind::Cursor,
    }
}

fn bubble_role(bubble: &Value) -> MessageRole {
    match bubble.get("type") {
        Some(Value::String(s)) => MessageRole::from_raw(s),
        // Numeric bubble types: 1 = user, 2 = ai.
        Some(Value::Number(n)) => match n.as_i64() {
            Some(1) => MessageRole::User,
            Some(2) => MessageRole::Assistant,
            _ => MessageRole::User,
        },
        _ => MessageRole::User,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
