//! Relevance-ranked recall of local coding agent chat histories.
//!
//! The core pipeline normalizes heterogeneous per-tool conversation
//! records into one canonical shape, derives a bounded context-keyword
//! vocabulary from the current project, classifies and scores each
//! conversation by weighted heuristic signals, threads split
//! prompt/generation stores, and assembles a ranked, size-bounded result
//! set. A companion engine scores project files with the same
//! weights-and-thresholds design.
//!
//! Database discovery, transport, and configuration loading live outside
//! this crate; they appear here only as the [`sources::ConversationSource`],
//! [`git::GitActivityProvider`], and [`weights::WeightsProvider`] seams.

pub mod assemble;
pub mod cache;
pub mod classify;
pub mod cli;
pub mod engine;
pub mod files;
pub mod git;
pub mod keywords;
pub mod model;
pub mod normalize;
pub mod score;
pub mod sources;
pub mod threading;
pub mod util;
pub mod weights;

pub use engine::{ContextEngine, EngineOptions};
pub use model::{
    ConversationKind, ConversationThread, NormalizedConversation, NormalizedMessage, RankedFiles,
    RecallItem, RecallResult, RelevanceAnalysis, ScoredFile,
};
pub use sources::{ConversationSource, JsonFileSource, SourceKind};
pub use weights::{StaticWeights, WeightsProvider};
