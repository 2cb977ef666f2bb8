//! Normalized entity structs.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::sources::SourceKind;
use crate::weights::FileWeights;

/// Roles seen across source agents.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MessageRole {
    User,
    Assistant,
    System,
    Other(String),
}

impl MessageRole {
    /// Map the loose role strings found in raw records onto the canonical
    /// vocabulary. Unknown roles are preserved verbatim.
    pub fn from_raw(raw: &str) -> Self {
        match raw.to_ascii_lowercase().as_str() {
            "user" | "human" => MessageRole::User,
            "assistant" | "ai" | "agent" | "model" => MessageRole::Assistant,
            "system" => MessageRole::System,
            _ => MessageRole::Other(raw.to_string()),
        }
    }
}

impl std::fmt::Display for MessageRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MessageRole::User => write!(f, "user"),
            MessageRole::Assistant => write!(f, "assistant"),
            MessageRole::System => write!(f, "system"),
            MessageRole::Other(s) => write!(f, "{}", s),
        }
    }
}

/// A single message inside a normalized conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalizedMessage {
    pub role: MessageRole,
    pub content: String,
}

/// The canonical conversation record every source shape normalizes into.
///
/// `content` is the concatenated, length-capped extract used for scoring;
/// `messages` preserves the per-turn structure where the source had one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalizedConversation {
    /// Source-assigned identifier; empty when the source lacks one.
    #[serde(default)]
    pub id: String,
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub messages: Vec<NormalizedMessage>,
    /// Best-effort scan of known metadata fields; heterogeneous encodings
    /// are kept as-is and interpreted lazily at scoring time.
    #[serde(default)]
    pub metadata: BTreeMap<String, Value>,
    pub source: SourceKind,
}

impl NormalizedConversation {
    /// An empty record tagged with the given source. Returned when nothing
    /// at all could be extracted; still usable downstream.
    pub fn empty(source: SourceKind) -> Self {
        Self {
            id: String::new(),
            title: default_title(),
            content: String::new(),
            messages: Vec::new(),
            metadata: BTreeMap::new(),
            source,
        }
    }
}

/// Placeholder title for sources that do not carry one.
pub fn default_title() -> String {
    "Untitled Conversation".to_string()
}

/// Fixed category vocabulary assigned by the classifier.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ConversationKind {
    Architecture,
    Debugging,
    ProblemSolving,
    Technical,
    CodeDiscussion,
    General,
}

impl ConversationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConversationKind::Architecture => "architecture",
            ConversationKind::Debugging => "debugging",
            ConversationKind::ProblemSolving => "problem_solving",
            ConversationKind::Technical => "technical",
            ConversationKind::CodeDiscussion => "code_discussion",
            ConversationKind::General => "general",
        }
    }
}

impl std::fmt::Display for ConversationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-conversation scoring breakdown, recomputed on every scoring call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelevanceAnalysis {
    pub keyword_score: f64,
    pub recency_score: f64,
    pub file_score: f64,
    pub pattern_score: f64,
    pub detected_keywords: Vec<String>,
    /// Deduplicated paths found in the text that exist under the project
    /// root, in first-seen order.
    pub file_references: Vec<String>,
    pub conversation_type: ConversationKind,
    /// Weighted composite, floor-clamped at the configured minimum.
    pub relevance_score: f64,
}

/// A paired (or unpaired) prompt/generation exchange produced by threading.
///
/// At least one side is always present; `unpaired` is true iff exactly one
/// side is `None`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationThread {
    pub prompt: Option<Value>,
    pub generation: Option<Value>,
    /// Epoch milliseconds; `None` sorts as oldest.
    pub timestamp: Option<i64>,
    pub unpaired: bool,
}

impl ConversationThread {
    pub fn paired(prompt: Value, generation: Value, timestamp: Option<i64>) -> Self {
        Self {
            prompt: Some(prompt),
            generation: Some(generation),
            timestamp,
            unpaired: false,
        }
    }

    pub fn prompt_only(prompt: Value, timestamp: Option<i64>) -> Self {
        Self {
            prompt: Some(prompt),
            generation: None,
            timestamp,
            unpaired: true,
        }
    }

    pub fn generation_only(generation: Value, timestamp: Option<i64>) -> Self {
        Self {
            prompt: None,
            generation: Some(generation),
            timestamp,
            unpaired: true,
        }
    }
}

/// A project file with its composite relevance score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredFile {
    pub path: PathBuf,
    pub score: f64,
}

/// Parameters a file-ranking pass ran with, echoed in the output for
/// debuggability of the ranking decision.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankingParams {
    pub weights: FileWeights,
    pub high_threshold: f64,
    pub medium_threshold: f64,
    pub top_limit: usize,
}

/// Ranked project files bucketed into priority tiers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankedFiles {
    pub high_priority_files: Vec<ScoredFile>,
    pub medium_priority_files: Vec<ScoredFile>,
    pub low_priority_files: Vec<ScoredFile>,
    pub top_files: Vec<PathBuf>,
    pub params: RankingParams,
}

/// One ranked conversation in the engine's output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecallItem {
    pub id: String,
    pub title: String,
    pub source: SourceKind,
    pub timestamp: Option<i64>,
    pub relevance_score: f64,
    pub conversation_type: ConversationKind,
    /// Omitted in lightweight mode.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default)]
    pub detected_keywords: Vec<String>,
    #[serde(default)]
    pub file_references: Vec<String>,
}

/// Final engine output handed back to the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecallResult {
    pub items: Vec<RecallItem>,
    /// How many conversations were scored before ranking/truncation.
    pub total_scored: usize,
    /// True when the size optimizer dropped ranked items to fit the budget.
    pub truncated: bool,
    pub summary_mode_recommended: bool,
    pub fast_mode_recommended: bool,
    pub context_keywords: Vec<String>,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{from_value, json, to_value};

    #[test]
    fn message_role_from_raw_canonical() {
        assert_eq!(MessageRole::from_raw("USER"), MessageRole::User);
        assert_eq!(MessageRole::from_raw("ai"), MessageRole::Assistant);
        assert_eq!(MessageRole::from_raw("human"), MessageRole::User);
        assert_eq!(MessageRole::from_raw("system"), MessageRole::System);
        assert_eq!(
            MessageRole::from_raw("tool"),
            MessageRole::Other("tool".to_string())
        );
    }

    #[test]
    fn conversation_kind_serializes_snake_case() {
        assert_eq!(
            to_value(ConversationKind::ProblemSolving).unwrap(),
            json!("problem_solving")
        );
        let kind: ConversationKind = from_value(json!("code_discussion")).unwrap();
        assert_eq!(kind, ConversationKind::CodeDiscussion);
    }

    #[test]
    fn empty_conversation_is_usable() {
        let conv = NormalizedConversation::empty(SourceKind::Cursor);
        assert_eq!(conv.title, "Untitled Conversation");
        assert!(conv.content.is_empty());
        assert_eq!(conv.source, SourceKind::Cursor);
    }

    #[test]
    fn thread_constructors_set_unpaired() {
        let paired = ConversationThread::paired(json!({"a": 1}), json!({"b": 2}), Some(5));
        assert!(!paired.unpaired);
        let lone = ConversationThread::prompt_only(json!({"a": 1}), None);
        assert!(lone.unpaired);
        assert!(lone.generation.is_none());
        let lone = ConversationThread::generation_only(json!({"b": 2}), Some(9));
        assert!(lone.unpaired);
        assert!(lone.prompt.is_none());
    }

    #[test]
    fn recall_item_roundtrip() {
        let item = RecallItem {
            id: "conv-1".to_string(),
            title: "Fixing the build".to_string(),
            source: SourceKind::ClaudeCode,
            timestamp: Some(1_700_000_000_000),
            relevance_score: 0.72,
            conversation_type: ConversationKind::Debugging,
            content: None,
            detected_keywords: vec!["rust".to_string()],
            file_references: vec!["src/main.rs".to_string()],
        };
        let value = to_value(&item).unwrap();
        // Lightweight items omit content entirely.
        assert!(value.get("content").is_none());
        let back: RecallItem = from_value(value).unwrap();
        assert_eq!(back.id, "conv-1");
        assert_eq!(back.conversation_type, ConversationKind::Debugging);
    }
}
