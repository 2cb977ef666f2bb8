//! Conversation relevance scoring.
//!
//! Combines keyword-match, recency, file-reference, and category signals
//! into one composite score per conversation. Every sub-step degrades
//! instead of failing: a missing timestamp contributes the neutral 0.5, an
//! unreadable path contributes zero. The degradation policy is an explicit
//! mapping from [`Unscoreable`] at the scoring boundary, not a catch-all.

use std::path::Path;

use chrono::Utc;
use itertools::Itertools;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::classify;
use crate::model::{ConversationKind, NormalizedConversation, RelevanceAnalysis};
use crate::util::time::{TIMESTAMP_FIELDS, days_between_millis, parse_timestamp};
use crate::weights::{ConversationWeights, EngineLimits};

/// Recency contribution when no timestamp is resolvable. Deliberately
/// mid-scale so conversations without timestamps are not penalized to the
/// bottom of the ranking.
pub const NEUTRAL_RECENCY: f64 = 0.5;

/// Score contributed per existing file reference, capped at 1.0 total.
const FILE_REF_POINTS: f64 = 0.2;

/// Upper bound on reference candidates checked against the filesystem per
/// conversation.
const MAX_REF_CANDIDATES: usize = 64;

/// Why a sub-score could not be computed. Converted to a neutral or zero
/// contribution at the boundary; never surfaced to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Unscoreable {
    MissingTimestamp,
}

/// Fraction of context keywords present in the content, with the detected
/// keywords themselves. Case-insensitive substring match; empty content or
/// an empty vocabulary scores 0.0.
pub fn keyword_score(content: &str, keywords: &[String]) -> (f64, Vec<String>) {
    if content.is_empty() || keywords.is_empty() {
        return (0.0, Vec::new());
    }
    let lowered = content.to_lowercase();
    let mut detected = Vec::new();
    for keyword in keywords {
        if lowered.contains(&keyword.to_lowercase()) {
            detected.push(keyword.clone());
        }
    }
    let score = detected.len() as f64 / keywords.len() as f64;
    (score, detected)
}

/// Resolve a conversation timestamp from its metadata, trying each known
/// field name in priority order.
pub fn conversation_timestamp(conv: &NormalizedConversation) -> Option<i64> {
    for field in TIMESTAMP_FIELDS {
        if let Some(ts) = conv.metadata.get(*field).and_then(parse_timestamp) {
            return Some(ts);
        }
    }
    None
}

fn try_recency(
    conv: &NormalizedConversation,
    now_ms: i64,
    decay_rate: f64,
) -> Result<f64, Unscoreable> {
    let ts = conversation_timestamp(conv).ok_or(Unscoreable::MissingTimestamp)?;
    let days = days_between_millis(ts, now_ms);
    Ok((1.0 / (1.0 + decay_rate * days)).clamp(0.0, 1.0))
}

/// Recency score at an explicit "now", for deterministic callers.
pub fn recency_score_at(conv: &NormalizedConversation, now_ms: i64, decay_rate: f64) -> f64 {
    match try_recency(conv, now_ms, decay_rate) {
        Ok(score) => score,
        Err(Unscoreable::MissingTimestamp) => NEUTRAL_RECENCY,
    }
}

// Filename-like substrings: `dir/file` sequences or `word.ext` with an
// alphabetic extension start (so bare decimals do not match).
static FILE_REF_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[\w.-]+(?:/[\w.-]+)+|\b[\w-]+\.[A-Za-z][A-Za-z0-9]{0,7}\b")
        .expect("static file-reference pattern")
});

/// Scan content for file references and keep the ones that exist under the
/// project root, in first-seen order. Score is proportional to the count
/// of existing references; nonexistent mentions are noise, not signal.
pub fn file_reference_score(content: &str, project_root: &Path) -> (f64, Vec<String>) {
    if content.is_empty() {
        return (0.0, Vec::new());
    }
    let mut existing = Vec::new();
    for candidate in FILE_REF_RE
        .find_iter(content)
        .take(MAX_REF_CANDIDATES)
        .map(|m| m.as_str().trim_matches('.'))
        .filter(|c| !c.is_empty())
        .unique()
    {
        let rel = candidate.trim_start_matches('/');
        if project_root.join(rel).exists() {
            existing.push(candidate.to_string());
        }
    }
    let score = (existing.len() as f64 * FILE_REF_POINTS).min(1.0);
    (score, existing)
}

/// Flat additive bonus for the assigned category, independent of the
/// pattern-match strength.
pub fn type_bonus(kind: ConversationKind) -> f64 {
    match kind {
        ConversationKind::Debugging => 0.15,
        ConversationKind::Architecture => 0.12,
        ConversationKind::ProblemSolving => 0.10,
        ConversationKind::Technical => 0.08,
        ConversationKind::CodeDiscussion => 0.05,
        ConversationKind::General => 0.0,
    }
}

/// Per-pass conversation scorer; weights are fixed for its lifetime.
pub struct RelevanceScorer<'a> {
    weights: &'a ConversationWeights,
    limits: &'a EngineLimits,
    project_root: &'a Path,
}

impl<'a> RelevanceScorer<'a> {
    pub fn new(
        weights: &'a ConversationWeights,
        limits: &'a EngineLimits,
        project_root: &'a Path,
    ) -> Self {
        Self {
            weights,
            limits,
            project_root,
        }
    }

    /// Score against the current wall clock.
    pub fn score(
        &self,
        conv: &NormalizedConversation,
        context_keywords: &[String],
    ) -> RelevanceAnalysis {
        self.score_at(conv, context_keywords, Utc::now().timestamp_millis())
    }

    /// Score with an explicit "now" for deterministic tests.
    pub fn score_at(
        &self,
        conv: &NormalizedConversation,
        context_keywords: &[String],
        now_ms: i64,
    ) -> RelevanceAnalysis {
        let (kw_score, detected_keywords) = keyword_score(&conv.content, context_keywords);
        let recency_score = recency_score_at(conv, now_ms, self.limits.decay_rate);
        let (file_score, file_references) =
            file_reference_score(&conv.content, self.project_root);
        let classification = classify::classify(&conv.content, self.weights);

        let composite = kw_score * self.weights.keyword_match
            + recency_score * self.weights.recency
            + file_score * self.weights.file_reference
            + classification.pattern_score
            + type_bonus(classification.kind);
        let relevance_score = composite.max(self.limits.min_relevance);

        RelevanceAnalysis {
            keyword_score: kw_score,
            recency_score,
            file_score,
            pattern_score: classification.pattern_score,
            detected_keywords,
            file_references,
            conversation_type: classification.kind,
            relevance_score,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::SourceKind;
    use serde_json::json;

    const NOW_MS: i64 = 1_700_000_000_000;

    fn conv_with(content: &str) -> NormalizedConversation {
        let mut conv = NormalizedConversation::empty(SourceKind::Unknown);
        conv.content = content.to_string();
        conv
    }

    fn conv_at(content: &str, ts: serde_json::Value) -> NormalizedConversation {
        let mut conv = conv_with(content);
        conv.metadata.insert("created_at".to_string(), ts);
        conv
    }

    fn keywords(words: &[&str]) -> Vec<String> {
        words.iter().map(|w| w.to_string()).collect()
    }

    #[test]
    fn keyword_score_full_match_is_one() {
        let (score, detected) =
            keyword_score("We wrote a Python test", &keywords(&["python", "test"]));
        assert_eq!(score, 1.0);
        assert_eq!(detected.len(), 2);
    }

    #[test]
    fn keyword_score_bounds() {
        let (score, _) = keyword_score("only python here", &keywords(&["python", "test"]));
        assert_eq!(score, 0.5);
        assert_eq!(keyword_score("", &keywords(&["x"])).0, 0.0);
        assert_eq!(keyword_score("text", &[]).0, 0.0);
    }

    #[test]
    fn recency_is_monotonic() {
        let day = 86_400_000_i64;
        let newer = conv_at("x", json!(NOW_MS - day));
        let middle = conv_at("x", json!(NOW_MS - 10 * day));
        let older = conv_at("x", json!(NOW_MS - 100 * day));
        let s1 = recency_score_at(&newer, NOW_MS, 0.1);
        let s2 = recency_score_at(&middle, NOW_MS, 0.1);
        let s3 = recency_score_at(&older, NOW_MS, 0.1);
        assert!(s1 > s2 && s2 > s3);
        assert!(s1 <= 1.0 && s3 >= 0.0);
    }

    #[test]
    fn missing_timestamp_is_neutral() {
        let conv = conv_with("no dates here");
        assert_eq!(recency_score_at(&conv, NOW_MS, 0.1), 0.5);
    }

    #[test]
    fn timestamp_fallback_chain_reads_iso_strings() {
        let conv = conv_at("x", json!("2023-11-14T22:13:20Z"));
        let score = recency_score_at(&conv, NOW_MS, 0.1);
        // Exactly "now": full recency.
        assert!((score - 1.0).abs() < 1e-9);
    }

    #[test]
    fn file_references_count_only_existing_paths() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("src")).unwrap();
        std::fs::write(dir.path().join("src/main.rs"), "fn main() {}").unwrap();

        let content = "look at src/main.rs and also ghost/missing.py";
        let (score, refs) = file_reference_score(content, dir.path());
        assert_eq!(refs, vec!["src/main.rs".to_string()]);
        assert!((score - FILE_REF_POINTS).abs() < 1e-9);
    }

    #[test]
    fn file_reference_dedup_preserves_order() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.rs"), "").unwrap();
        std::fs::write(dir.path().join("b.rs"), "").unwrap();
        let (_, refs) = file_reference_score("b.rs then a.rs then b.rs again", dir.path());
        assert_eq!(refs, vec!["b.rs".to_string(), "a.rs".to_string()]);
    }

    #[test]
    fn composite_never_below_floor() {
        let limits = EngineLimits::default();
        let weights = ConversationWeights::default();
        let scorer = RelevanceScorer::new(&weights, &limits, Path::new("/nonexistent"));
        let mut conv = conv_with("");
        // Pin a very old timestamp so recency is near zero too.
        conv.metadata
            .insert("created_at".to_string(), json!(1_000_000));
        let analysis = scorer.score_at(&conv, &[], NOW_MS);
        assert!(analysis.relevance_score >= limits.min_relevance);
    }

    #[test]
    fn debugging_conversation_gets_type_bonus() {
        let limits = EngineLimits::default();
        let weights = ConversationWeights::default();
        let scorer = RelevanceScorer::new(&weights, &limits, Path::new("/nonexistent"));
        let debug_conv = conv_at("debug the error and fix the crash", json!(NOW_MS));
        let plain_conv = conv_at("lunch plans for tuesday", json!(NOW_MS));
        let debug_analysis = scorer.score_at(&debug_conv, &[], NOW_MS);
        let plain_analysis = scorer.score_at(&plain_conv, &[], NOW_MS);
        assert_eq!(
            debug_analysis.conversation_type,
            ConversationKind::Debugging
        );
        assert_eq!(plain_analysis.conversation_type, ConversationKind::General);
        assert!(debug_analysis.relevance_score > plain_analysis.relevance_score);
    }
}
