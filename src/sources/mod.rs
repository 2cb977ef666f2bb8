//! Raw conversation record boundary.
//!
//! Database discovery and connection handling live outside the engine; all
//! the pipeline sees is a [`ConversationSource`] that yields opaque JSON
//! records. Source failures degrade to "no data" and are never fatal.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Which tool's history store a record came from. Drives the normalizer
/// dispatch table.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    Cursor,
    ClaudeCode,
    Windsurf,
    Unknown,
}

impl SourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::Cursor => "cursor",
            SourceKind::ClaudeCode => "claude_code",
            SourceKind::Windsurf => "windsurf",
            SourceKind::Unknown => "unknown",
        }
    }

    /// Parse a source tag; anything unrecognized maps to `Unknown` so the
    /// shape-sniffing normalizer handles it.
    pub fn from_tag(tag: &str) -> Self {
        match tag.to_ascii_lowercase().as_str() {
            "cursor" => SourceKind::Cursor,
            "claude_code" | "claude-code" | "claude" => SourceKind::ClaudeCode,
            "windsurf" => SourceKind::Windsurf,
            _ => SourceKind::Unknown,
        }
    }

    /// Guess a kind from a path, e.g. `cursor-sessions.jsonl`.
    pub fn sniff_from_path(path: &Path) -> Self {
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();
        if name.contains("cursor") {
            SourceKind::Cursor
        } else if name.contains("claude") {
            SourceKind::ClaudeCode
        } else if name.contains("windsurf") {
            SourceKind::Windsurf
        } else {
            SourceKind::Unknown
        }
    }
}

impl std::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Yields raw, source-specific JSON records. Implementations swallow their
/// own failures: absence or corruption means empty results, never an error.
pub trait ConversationSource {
    fn kind(&self) -> SourceKind;

    /// All records this source currently holds.
    fn records(&self) -> Vec<Value>;

    /// A single record by source-assigned key, if present.
    fn record(&self, key: &str) -> Option<Value> {
        self.records().into_iter().find(|r| {
            ["id", "composerId", "sessionId", "conversation_id"]
                .iter()
                .any(|f| r.get(f).and_then(Value::as_str) == Some(key))
        })
    }
}

/// File-backed source: a `.json` document or a `.jsonl` stream of records.
///
/// Stands in for the out-of-scope database layer; export files from the
/// various IDE stores are read as-is. Malformed lines are skipped.
pub struct JsonFileSource {
    path: PathBuf,
    kind: SourceKind,
}

impl JsonFileSource {
    pub fn new(path: impl Into<PathBuf>, kind: SourceKind) -> Self {
        Self {
            path: path.into(),
            kind,
        }
    }

    /// Construct with the kind sniffed from the file name.
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let kind = SourceKind::sniff_from_path(&path);
        Self { path, kind }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_jsonl(&self) -> Vec<Value> {
        let file = match File::open(&self.path) {
            Ok(f) => f,
            Err(err) => {
                tracing::debug!(path = %self.path.display(), error = %err, "source unreadable");
                return Vec::new();
            }
        };
        let reader = BufReader::new(file);
        let mut records = Vec::new();
        for line in reader.lines() {
            let line = match line {
                Ok(l) => l,
                Err(_) => continue,
            };
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<Value>(&line) {
                Ok(value) => records.push(value),
                Err(err) => {
                    tracing::debug!(path = %self.path.display(), error = %err, "skipping malformed line");
                }
            }
        }
        records
    }

    fn read_json(&self) -> Vec<Value> {
        let text = match std::fs::read_to_string(&self.path) {
            Ok(t) => t,
            Err(err) => {
                tracing::debug!(path = %self.path.display(), error = %err, "source unreadable");
                return Vec::new();
            }
        };
        let value: Value = match serde_json::from_str(&text) {
            Ok(v) => v,
            Err(err) => {
                tracing::debug!(path = %self.path.display(), error = %err, "skipping malformed JSON");
                return Vec::new();
            }
        };
        match value {
            Value::Array(items) => items,
            Value::Object(ref obj) => {
                // Some exports wrap records in a container key.
                for key in ["conversations", "records", "sessions"] {
                    if let Some(Value::Array(items)) = obj.get(key) {
                        return items.clone();
                    }
                }
                vec![value]
            }
            other => vec![other],
        }
    }
}

impl ConversationSource for JsonFileSource {
    fn kind(&self) -> SourceKind {
        self.kind
    }

    fn records(&self) -> Vec<Value> {
        let ext = self
            .path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default();
        if ext.eq_ignore_ascii_case("jsonl") {
            self.read_jsonl()
        } else {
            self.read_json()
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
