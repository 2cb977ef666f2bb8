//! Canonical data model shared by the scoring pipeline.

pub mod types;

pub use types::{
    ConversationKind, ConversationThread, MessageRole, NormalizedConversation, NormalizedMessage,
    RankedFiles, RankingParams, RecallItem, RecallResult, RelevanceAnalysis, ScoredFile,
    default_title,
};
