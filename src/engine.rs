//! Pipeline orchestration.
//!
//! `ContextEngine` wires the stages together: normalize raw records,
//! derive the project's context keywords, classify and score each
//! conversation, rank, then shrink to the size budget. Each call runs
//! synchronously to completion; the keyword and analysis caches are the
//! only state shared between calls, and each sits behind its own lock.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;

use crate::assemble;
use crate::cache::MemoryCache;
use crate::files::{self, FileScoreContext};
use crate::git::{CliGitActivity, GitActivityProvider, NullGitActivity};
use crate::keywords;
use crate::model::{
    ConversationThread, NormalizedConversation, RankedFiles, RecallItem, RecallResult,
    RelevanceAnalysis,
};
use crate::normalize::{self, ExtractLimits};
use crate::score::{self, RelevanceScorer};
use crate::sources::ConversationSource;
use crate::threading;
use crate::util::{combine_keys, hash_key};
use crate::weights::{StaticWeights, WeightsProvider};

/// Per-call knobs.
#[derive(Debug, Clone)]
pub struct EngineOptions {
    /// Maximum ranked conversations returned.
    pub limit: usize,
    /// Drop content from items, keeping id/title/source/timestamp/score.
    pub lightweight: bool,
    /// Serialized-size budget for the result set, when the caller has one.
    pub target_bytes: Option<usize>,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            limit: 20,
            lightweight: false,
            target_bytes: None,
        }
    }
}

pub struct ContextEngine {
    project_root: PathBuf,
    weights: Arc<dyn WeightsProvider>,
    git: Arc<dyn GitActivityProvider>,
    keyword_cache: MemoryCache<Vec<String>>,
    analysis_cache: MemoryCache<RelevanceAnalysis>,
}

impl ContextEngine {
    /// Engine with default weights; git activity is enabled only when the
    /// project root is a repository.
    pub fn new(project_root: impl Into<PathBuf>) -> Self {
        let root = project_root.into();
        let git: Arc<dyn GitActivityProvider> = if root.join(".git").exists() {
            Arc::new(CliGitActivity::new(&root))
        } else {
            Arc::new(NullGitActivity)
        };
        Self::with_providers(root, Arc::new(StaticWeights::default()), git)
    }

    pub fn with_providers(
        project_root: impl Into<PathBuf>,
        weights: Arc<dyn WeightsProvider>,
        git: Arc<dyn GitActivityProvider>,
    ) -> Self {
        let limits = weights.limits();
        let ttl = Duration::from_secs(limits.cache_ttl_secs);
        Self {
            project_root: project_root.into(),
            keyword_cache: MemoryCache::new(limits.cache_capacity, ttl),
            analysis_cache: MemoryCache::new(limits.cache_capacity, ttl),
            weights,
            git,
        }
    }

    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    /// The project's context keyword vocabulary, cached per manifest
    /// fingerprint so edits invalidate it.
    pub fn context_keywords(&self) -> Vec<String> {
        let key = keywords::keyword_cache_key(&self.project_root);
        if let Some(cached) = self.keyword_cache.get_hashed(key) {
            return cached;
        }
        let limits = self.weights.limits();
        let generated = keywords::generate_context_keywords(&self.project_root, &limits);
        self.keyword_cache.put_hashed(key, generated.clone());
        generated
    }

    /// Normalize, score, rank, and size-bound conversations from the given
    /// sources. Source failures surface as empty record sets, never errors.
    pub fn recall_conversations(
        &self,
        sources: &[Box<dyn ConversationSource>],
        options: &EngineOptions,
    ) -> RecallResult {
        let limits = self.weights.limits();
        let conv_weights = self.weights.conversation_weights();
        let extract = ExtractLimits {
            max_chars: limits.max_content_chars,
        };
        let context_keywords = self.context_keywords();
        let keyword_fingerprint = hash_key(&context_keywords.join("\u{1f}"));
        let scorer = RelevanceScorer::new(&conv_weights, &limits, &self.project_root);

        let mut items: Vec<RecallItem> = Vec::new();
        let mut total_scored = 0usize;
        for source in sources {
            for raw in source.records() {
                let conv = normalize::normalize(&raw, source.kind(), &extract);
                total_scored += 1;
                let cache_key = combine_keys(hash_key(&conv.content), keyword_fingerprint);
                let analysis = match self.analysis_cache.get_hashed(cache_key) {
                    Some(cached) => cached,
                    None => {
                        let fresh = scorer.score(&conv, &context_keywords);
                        self.analysis_cache.put_hashed(cache_key, fresh.clone());
                        fresh
                    }
                };
                items.push(build_item(conv, analysis, options.lightweight));
            }
        }

        tracing::debug!(scored = total_scored, "conversation scoring pass complete");

        // Stable: equal scores keep source order.
        items.sort_by(|a, b| {
            b.relevance_score
                .partial_cmp(&a.relevance_score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        items.truncate(options.limit);

        let estimated = assemble::estimated_response_bytes(&items, &limits);
        let summary_mode_recommended = assemble::recommend_summary_mode(estimated, &limits);
        let fast_mode_recommended = assemble::recommend_fast_mode(total_scored, &limits);

        let (items, truncated) = match options.target_bytes {
            Some(budget) => assemble::optimize_items_for_size(&items, budget, &limits),
            None => (items, false),
        };

        RecallResult {
            items,
            total_scored,
            truncated,
            summary_mode_recommended,
            fast_mode_recommended,
            context_keywords,
        }
    }

    /// Score and tier candidate files (paths relative to the project root).
    pub fn rank_project_files(
        &self,
        candidates: &[PathBuf],
        active_files: &[PathBuf],
        conversation_mentions: &[String],
    ) -> RankedFiles {
        let limits = self.weights.limits();
        let file_weights = self.weights.file_weights();
        let extension_priorities = self.weights.extension_priorities();
        let directory_importance = self.weights.directory_importance();
        let ctx = FileScoreContext {
            weights: &file_weights,
            limits: &limits,
            extension_priorities: &extension_priorities,
            directory_importance: &directory_importance,
            git: self.git.as_ref(),
            active_files,
            conversation_mentions,
            now_ms: files::now_ms(),
        };
        let scored = candidates
            .iter()
            .map(|path| files::score_file(&self.project_root, path, &ctx))
            .collect();
        files::bucket_files(files::rank_files(scored), &file_weights, &limits)
    }

    /// Walk the project for candidate files, bounded and with the usual
    /// vendored directories skipped. Paths come back root-relative.
    pub fn collect_project_files(&self, max_files: usize) -> Vec<PathBuf> {
        let mut found = Vec::new();
        for entry in walkdir::WalkDir::new(&self.project_root)
            .max_depth(6)
            .into_iter()
            .filter_entry(|e| {
                let name = e.file_name().to_str().unwrap_or("");
                !(name.starts_with('.') && e.depth() > 0)
                    && name != "node_modules"
                    && name != "target"
                    && name != "__pycache__"
            })
            .flatten()
        {
            if found.len() >= max_files {
                break;
            }
            if !entry.file_type().is_file() {
                continue;
            }
            if let Ok(rel) = entry.path().strip_prefix(&self.project_root) {
                found.push(rel.to_path_buf());
            }
        }
        found
    }

    /// Thread Cursor-style split prompt/generation records.
    pub fn thread_split_records(
        &self,
        prompts: &[Value],
        generations: &[Value],
    ) -> Vec<ConversationThread> {
        threading::thread_entries(prompts, generations)
    }
}

fn build_item(
    conv: NormalizedConversation,
    analysis: RelevanceAnalysis,
    lightweight: bool,
) -> RecallItem {
    let timestamp = score::conversation_timestamp(&conv);
    let mut item = RecallItem {
        id: conv.id,
        title: conv.title,
        source: conv.source,
        timestamp,
        relevance_score: analysis.relevance_score,
        conversation_type: analysis.conversation_type,
        content: Some(conv.content),
        detected_keywords: analysis.detected_keywords,
        file_references: analysis.file_references,
    };
    if lightweight {
        item.content = None;
        item.detected_keywords.clear();
        item.file_references.clear();
    }
    item
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
