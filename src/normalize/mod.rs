//! Content normalization: heterogeneous per-tool records in, one canonical
//! shape out.
//!
//! `normalize` is total. Whatever the input shape — mapping, list, bare
//! string, null, or a mapping missing every expected field — it returns a
//! usable `NormalizedConversation`; extraction failures degrade to empty
//! defaults. Each supported source shape has its own normalizer, dispatched
//! through an explicit per-kind table; unknown records are shape-sniffed
//! down the same fallback chain.

pub mod claude_code;
pub mod cursor;
pub mod generic;
pub mod windsurf;

use std::collections::BTreeMap;

use serde_json::{Map, Value};
use smallvec::SmallVec;

use crate::model::{NormalizedConversation, NormalizedMessage, MessageRole, default_title};
use crate::sources::SourceKind;

/// Extraction caps applied while concatenating content.
#[derive(Debug, Clone, Copy)]
pub struct ExtractLimits {
    /// Hard character cap on extracted `content`.
    pub max_chars: usize,
}

impl Default for ExtractLimits {
    fn default() -> Self {
        Self { max_chars: 8_000 }
    }
}

type NormalizeFn = fn(&Map<String, Value>, &ExtractLimits) -> NormalizedConversation;

fn normalizer_for(kind: SourceKind) -> NormalizeFn {
    match kind {
        SourceKind::Cursor => cursor::normalize_object,
        SourceKind::ClaudeCode => claude_code::normalize_object,
        SourceKind::Windsurf => windsurf::normalize_object,
        SourceKind::Unknown => generic::normalize_object,
    }
}

fn sniff_object(obj: &Map<String, Value>) -> SourceKind {
    if obj.contains_key("composerSteps") || obj.contains_key("tabs") {
        SourceKind::Cursor
    } else if obj.contains_key("messages") {
        SourceKind::ClaudeCode
    } else if obj.contains_key("chat_data") || obj.contains_key("session_data") {
        SourceKind::Windsurf
    } else {
        SourceKind::Unknown
    }
}

/// Normalize a raw record of any shape into the canonical form.
pub fn normalize(raw: &Value, kind: SourceKind, limits: &ExtractLimits) -> NormalizedConversation {
    match raw {
        Value::Object(obj) => {
            let resolved = if kind == SourceKind::Unknown {
                sniff_object(obj)
            } else {
                kind
            };
            let mut conv = normalizer_for(resolved)(obj, limits);
            if kind != SourceKind::Unknown {
                conv.source = kind;
            }
            conv
        }
        // A bare list is treated as a message array.
        Value::Array(items) => generic::from_message_array(items, limits, kind),
        // A bare string is already-extracted content.
        Value::String(text) => generic::from_text(text, limits, kind),
        _ => NormalizedConversation::empty(kind),
    }
}

// ---------------------------------------------------------------------------
// Shared extraction helpers
// ---------------------------------------------------------------------------

/// Incremental content accumulator with a hard character cutoff. Parts are
/// separated by a newline (which counts toward the budget); a part that
/// does not fit is truncated to fit exactly.
pub(crate) struct ContentBudget {
    buf: String,
    remaining: usize,
}

impl ContentBudget {
    pub(crate) fn new(max_chars: usize) -> Self {
        Self {
            buf: String::with_capacity(max_chars.min(4096)),
            remaining: max_chars,
        }
    }

    pub(crate) fn exhausted(&self) -> bool {
        self.remaining == 0
    }

    /// Append a part, hard-truncating to the remaining budget. Returns
    /// false once the budget is exhausted so callers can stop early.
    pub(crate) fn push(&mut self, part: &str) -> bool {
        if self.remaining == 0 {
            return false;
        }
        let part = part.trim();
        if part.is_empty() {
            return true;
        }
        if !self.buf.is_empty() {
            self.buf.push('\n');
            self.remaining -= 1;
            if self.remaining == 0 {
                return false;
            }
        }
        for ch in part.chars().take(self.remaining) {
            self.buf.push(ch);
        }
        self.remaining -= part.chars().count().min(self.remaining);
        self.remaining > 0
    }

    pub(crate) fn finish(self) -> String {
        self.buf
    }
}

/// Flatten message content that may be a plain string, a content-block
/// array, or a single block object.
pub(crate) fn flatten_content(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Array(blocks) => {
            let mut parts: SmallVec<[&str; 4]> = SmallVec::new();
            for block in blocks {
                match block {
                    Value::String(s) => parts.push(s),
                    Value::Object(obj) => {
                        if let Some(text) = obj.get("text").and_then(Value::as_str) {
                            parts.push(text);
                        } else if let Some(text) = obj.get("content").and_then(Value::as_str) {
                            parts.push(text);
                        }
                    }
                    _ => {}
                }
            }
            parts.join("\n")
        }
        Value::Object(obj) => obj
            .get("text")
            .or_else(|| obj.get("content"))
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        _ => String::new(),
    }
}

/// Field names scanned into `metadata`, best-effort.
const METADATA_FIELDS: &[&str] = &[
    "id",
    "name",
    "created_at",
    "createdAt",
    "updated_at",
    "lastUpdatedAt",
    "timestamp",
    "sessionId",
    "workspaceId",
    "composerId",
    "cwd",
    "model",
];

pub(crate) fn extract_metadata(obj: &Map<String, Value>) -> BTreeMap<String, Value> {
    let mut meta = BTreeMap::new();
    for field in METADATA_FIELDS {
        if let Some(value) = obj.get(*field) {
            if !value.is_null() {
                meta.insert((*field).to_string(), value.clone());
            }
        }
    }
    meta
}

pub(crate) fn extract_id(obj: &Map<String, Value>) -> String {
    for field in ["id", "composerId", "sessionId", "conversation_id", "uuid"] {
        match obj.get(field) {
            Some(Value::String(s)) if !s.is_empty() => return s.clone(),
            Some(Value::Number(n)) => return n.to_string(),
            _ => {}
        }
    }
    String::new()
}

/// Title from `title`/`name`, skipping the "Untitled" placeholder some
/// stores write.
pub(crate) fn extract_title(obj: &Map<String, Value>) -> String {
    for field in ["title", "name"] {
        if let Some(s) = obj.get(field).and_then(Value::as_str) {
            let s = s.trim();
            if !s.is_empty() && !s.starts_with("Untitled") {
                return s.to_string();
            }
        }
    }
    default_title()
}

/// Build messages plus capped content from an array of message-like values
/// (role/content mappings or plain strings). The content budget is applied
/// incrementally; trailing messages past the cap still appear in
/// `messages` but contribute nothing to `content`.
pub(crate) fn collect_messages(
    items: &[Value],
    limits: &ExtractLimits,
) -> (Vec<NormalizedMessage>, String) {
    let mut messages = Vec::with_capacity(items.len());
    let mut budget = ContentBudget::new(limits.max_chars);
    for item in items {
        let (role, text) = match item {
            Value::String(s) => (MessageRole::User, s.clone()),
            Value::Object(obj) => {
                let role = obj
                    .get("role")
                    .or_else(|| obj.get("type"))
                    .and_then(Value::as_str)
                    .map(MessageRole::from_raw)
                    .unwrap_or(MessageRole::User);
                let text = obj
                    .get("content")
                    .or_else(|| obj.get("text"))
                    .map(flatten_content)
                    .unwrap_or_default();
                (role, text)
            }
            _ => continue,
        };
        if text.trim().is_empty() {
            continue;
        }
        if !budget.exhausted() {
            budget.push(&text);
        }
        messages.push(NormalizedMessage {
            role,
            content: text,
        });
    }
    (messages, budget.finish())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
