//! File relevance scoring and ranking.
//!
//! The companion engine to conversation scoring: the same
//! weighted-components-plus-floor design, over filesystem paths. Fact
//! gathering (`FileFacts::gather`) is split from the pure scoring math so
//! rankings can be tested without manufacturing mtimes on disk.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use chrono::Utc;

use crate::git::GitActivityProvider;
use crate::model::{RankedFiles, RankingParams, ScoredFile};
use crate::weights::{EngineLimits, FileWeights};

/// Recency thresholds, widest last, with their multipliers on the
/// `recent_modification` weight. Older than the widest scores zero.
const RECENCY_TIERS: &[(f64, f64)] = &[(1.0, 1.0), (24.0, 0.6), (168.0, 0.25)];

/// Size banding in bytes.
const SIZE_OPTIMAL: std::ops::RangeInclusive<u64> = 1_000..=50_000;
const SIZE_ACCEPTABLE_MAX: u64 = 200_000;
const SIZE_ACCEPTABLE_MULT: f64 = 0.5;
const SIZE_OUTLIER_MULT: f64 = 0.15;

/// Observable facts about one candidate file.
#[derive(Debug, Clone)]
pub struct FileFacts {
    /// Path relative to the project root, as given by the caller.
    pub rel_path: PathBuf,
    pub size_bytes: u64,
    /// Epoch milliseconds; `None` when the filesystem would not say.
    pub modified_ms: Option<i64>,
    pub extension: Option<String>,
    /// Directory segments above the file, project-root relative.
    pub ancestors: Vec<String>,
}

impl FileFacts {
    /// Gather facts for `rel_path` under `root`. Returns `None` when the
    /// file cannot be stat'ed; the caller scores it at the floor.
    pub fn gather(root: &Path, rel_path: &Path) -> Option<Self> {
        let meta = std::fs::metadata(root.join(rel_path)).ok()?;
        let modified_ms = meta
            .modified()
            .ok()
            .and_then(|t| t.duration_since(std::time::UNIX_EPOCH).ok())
            .map(|d| d.as_millis() as i64);
        Some(Self {
            rel_path: rel_path.to_path_buf(),
            size_bytes: meta.len(),
            modified_ms,
            extension: rel_path
                .extension()
                .and_then(|e| e.to_str())
                .map(str::to_lowercase),
            ancestors: ancestor_segments(rel_path),
        })
    }
}

fn ancestor_segments(rel_path: &Path) -> Vec<String> {
    let mut segments: Vec<String> = rel_path
        .components()
        .filter_map(|c| match c {
            std::path::Component::Normal(s) => s.to_str().map(str::to_string),
            _ => None,
        })
        .collect();
    // The filename itself is not a directory segment.
    segments.pop();
    segments
}

/// Everything a file-scoring pass needs besides the facts themselves.
pub struct FileScoreContext<'a> {
    pub weights: &'a FileWeights,
    pub limits: &'a EngineLimits,
    pub extension_priorities: &'a HashMap<String, f64>,
    pub directory_importance: &'a HashMap<String, f64>,
    pub git: &'a dyn GitActivityProvider,
    /// Files the assistant currently has open or recently touched.
    pub active_files: &'a [PathBuf],
    /// Paths referenced by recalled conversations.
    pub conversation_mentions: &'a [String],
    pub now_ms: i64,
}

fn recency_component(facts: &FileFacts, ctx: &FileScoreContext) -> f64 {
    let Some(modified) = facts.modified_ms else {
        return 0.0;
    };
    let age_hours = (ctx.now_ms - modified).max(0) as f64 / 3_600_000.0;
    for (threshold, mult) in RECENCY_TIERS {
        if age_hours <= *threshold {
            return ctx.weights.recent_modification * mult;
        }
    }
    0.0
}

fn size_component(facts: &FileFacts, ctx: &FileScoreContext) -> f64 {
    let w = ctx.weights.file_size_optimal;
    if SIZE_OPTIMAL.contains(&facts.size_bytes) {
        w
    } else if facts.size_bytes <= SIZE_ACCEPTABLE_MAX {
        w * SIZE_ACCEPTABLE_MULT
    } else {
        w * SIZE_OUTLIER_MULT
    }
}

fn extension_component(facts: &FileFacts, ctx: &FileScoreContext) -> f64 {
    let Some(ext) = &facts.extension else {
        return 0.0;
    };
    ctx.extension_priorities
        .get(ext)
        .map(|priority| priority * ctx.weights.file_type_priority)
        .unwrap_or(0.0)
}

/// Every ancestor segment contributes, not just the immediate parent.
fn directory_component(facts: &FileFacts, ctx: &FileScoreContext) -> f64 {
    facts
        .ancestors
        .iter()
        .filter_map(|segment| ctx.directory_importance.get(segment))
        .sum::<f64>()
        * ctx.weights.directory_importance
}

fn git_component(facts: &FileFacts, ctx: &FileScoreContext) -> f64 {
    ctx.git.activity_score(&facts.rel_path).clamp(0.0, 1.0) * ctx.weights.git_activity
}

/// Naive import heuristic: shared filename-stem substrings or a shared
/// parent directory with an active file. No real import graph is parsed.
fn import_component(facts: &FileFacts, ctx: &FileScoreContext) -> f64 {
    let w = ctx.weights.import_relationship;
    let stem = match facts.rel_path.file_stem().and_then(|s| s.to_str()) {
        Some(s) => s.to_lowercase(),
        None => return 0.0,
    };
    let parent = facts.rel_path.parent();
    let mut total = 0.0_f64;
    for active in ctx.active_files {
        if total >= w {
            break;
        }
        let active_stem = active
            .file_stem()
            .and_then(|s| s.to_str())
            .map(str::to_lowercase)
            .unwrap_or_default();
        if !active_stem.is_empty()
            && active_stem != stem
            && (stem.contains(&active_stem) || active_stem.contains(&stem))
        {
            total += w * 0.5;
        } else if parent.is_some() && active.parent() == parent {
            total += w * 0.25;
        }
    }
    total.min(w)
}

fn mention_component(facts: &FileFacts, ctx: &FileScoreContext) -> f64 {
    let rel = facts.rel_path.to_string_lossy();
    let name = facts
        .rel_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let mentioned = ctx
        .conversation_mentions
        .iter()
        .any(|m| m == rel.as_ref() || (!name.is_empty() && m.ends_with(&name)));
    if mentioned {
        ctx.weights.conversation_mention
    } else {
        0.0
    }
}

/// Sum all components, floor-clamped at the configured minimum.
pub fn score_facts(facts: &FileFacts, ctx: &FileScoreContext) -> f64 {
    let total = recency_component(facts, ctx)
        + size_component(facts, ctx)
        + extension_component(facts, ctx)
        + directory_component(facts, ctx)
        + git_component(facts, ctx)
        + import_component(facts, ctx)
        + mention_component(facts, ctx);
    total.max(ctx.limits.min_file_score)
}

/// Score one file by path. Unreadable files score at the floor.
pub fn score_file(root: &Path, rel_path: &Path, ctx: &FileScoreContext) -> ScoredFile {
    let score = match FileFacts::gather(root, rel_path) {
        Some(facts) => score_facts(&facts, ctx),
        None => ctx.limits.min_file_score,
    };
    ScoredFile {
        path: rel_path.to_path_buf(),
        score,
    }
}

/// Sort descending by score. The sort is stable, so equal scores keep
/// their input order.
pub fn rank_files(mut files: Vec<ScoredFile>) -> Vec<ScoredFile> {
    files.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    files
}

/// Bucket ranked files into priority tiers and echo the parameters used.
pub fn bucket_files(
    ranked: Vec<ScoredFile>,
    weights: &FileWeights,
    limits: &EngineLimits,
) -> RankedFiles {
    let mut high = Vec::new();
    let mut medium = Vec::new();
    let mut low = Vec::new();
    let top_files = ranked
        .iter()
        .take(limits.top_files_limit)
        .map(|f| f.path.clone())
        .collect();
    for file in ranked {
        if file.score >= limits.file_high_threshold {
            high.push(file);
        } else if file.score >= limits.file_medium_threshold {
            medium.push(file);
        } else {
            low.push(file);
        }
    }
    RankedFiles {
        high_priority_files: high,
        medium_priority_files: medium,
        low_priority_files: low,
        top_files,
        params: RankingParams {
            weights: weights.clone(),
            high_threshold: limits.file_high_threshold,
            medium_threshold: limits.file_medium_threshold,
            top_limit: limits.top_files_limit,
        },
    }
}

/// Current wall clock in epoch milliseconds, for callers assembling a
/// [`FileScoreContext`].
pub fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::NullGitActivity;
    use crate::weights::{StaticWeights, WeightsProvider};

    const NOW: i64 = 1_700_000_000_000;

    struct Fixture {
        weights: FileWeights,
        limits: EngineLimits,
        extensions: HashMap<String, f64>,
        directories: HashMap<String, f64>,
    }

    impl Fixture {
        fn new() -> Self {
            let provider = StaticWeights::default();
            Self {
                weights: provider.file_weights(),
                limits: provider.limits(),
                extensions: provider.extension_priorities(),
                directories: provider.directory_importance(),
            }
        }

        fn ctx<'a>(&'a self, git: &'a NullGitActivity) -> FileScoreContext<'a> {
            FileScoreContext {
                weights: &self.weights,
                limits: &self.limits,
                extension_priorities: &self.extensions,
                directory_importance: &self.directories,
                git,
                active_files: &[],
                conversation_mentions: &[],
                now_ms: NOW,
            }
        }
    }

    fn facts(rel: &str, size: u64, modified: Option<i64>) -> FileFacts {
        let rel_path = PathBuf::from(rel);
        FileFacts {
            extension: rel_path
                .extension()
                .and_then(|e| e.to_str())
                .map(str::to_lowercase),
            ancestors: ancestor_segments(&rel_path),
            rel_path,
            size_bytes: size,
            modified_ms: modified,
        }
    }

    #[test]
    fn fresh_optimal_file_beats_stale_twin() {
        let fixture = Fixture::new();
        let git = NullGitActivity;
        let ctx = fixture.ctx(&git);
        let thirty_min_ago = NOW - 30 * 60 * 1000;
        let ten_days_ago = NOW - 10 * 24 * 3_600_000;
        let fresh = facts("src/module.py", 5_000, Some(thirty_min_ago));
        let stale = facts("src/module.py", 5_000, Some(ten_days_ago));
        assert!(score_facts(&fresh, &ctx) > score_facts(&stale, &ctx));
    }

    #[test]
    fn score_never_below_floor() {
        let fixture = Fixture::new();
        let git = NullGitActivity;
        let ctx = fixture.ctx(&git);
        let worthless = facts("blob.xyz", 10_000_000, None);
        assert!(score_facts(&worthless, &ctx) >= fixture.limits.min_file_score);
    }

    #[test]
    fn unreadable_file_scores_at_floor() {
        let fixture = Fixture::new();
        let git = NullGitActivity;
        let ctx = fixture.ctx(&git);
        let scored = score_file(Path::new("/nonexistent"), Path::new("ghost.rs"), &ctx);
        assert_eq!(scored.score, fixture.limits.min_file_score);
    }

    #[test]
    fn directory_importance_accumulates_over_ancestors() {
        let fixture = Fixture::new();
        let git = NullGitActivity;
        let ctx = fixture.ctx(&git);
        let nested = facts("src/core/thing.rs", 5_000, None);
        let shallow = facts("src/thing.rs", 5_000, None);
        assert!(score_facts(&nested, &ctx) > score_facts(&shallow, &ctx));
    }

    #[test]
    fn ranking_is_stable_for_equal_scores() {
        let files = vec![
            ScoredFile {
                path: PathBuf::from("a.rs"),
                score: 0.5,
            },
            ScoredFile {
                path: PathBuf::from("b.rs"),
                score: 0.9,
            },
            ScoredFile {
                path: PathBuf::from("c.rs"),
                score: 0.5,
            },
        ];
        let ranked = rank_files(files);
        assert_eq!(ranked[0].path, PathBuf::from("b.rs"));
        assert_eq!(ranked[1].path, PathBuf::from("a.rs"));
        assert_eq!(ranked[2].path, PathBuf::from("c.rs"));
    }

    #[test]
    fn bucketing_respects_thresholds() {
        let fixture = Fixture::new();
        let files = vec![
            ScoredFile {
                path: PathBuf::from("hot.rs"),
                score: 0.9,
            },
            ScoredFile {
                path: PathBuf::from("warm.rs"),
                score: 0.4,
            },
            ScoredFile {
                path: PathBuf::from("cold.rs"),
                score: 0.1,
            },
        ];
        let ranked = bucket_files(files, &fixture.weights, &fixture.limits);
        assert_eq!(ranked.high_priority_files.len(), 1);
        assert_eq!(ranked.medium_priority_files.len(), 1);
        assert_eq!(ranked.low_priority_files.len(), 1);
        assert_eq!(ranked.top_files.len(), 3);
        assert_eq!(ranked.params.high_threshold, fixture.limits.file_high_threshold);
    }

    #[test]
    fn import_heuristic_rewards_related_stems() {
        let fixture = Fixture::new();
        let git = NullGitActivity;
        let mut ctx = fixture.ctx(&git);
        let active = vec![PathBuf::from("src/parser.rs")];
        ctx.active_files = &active;
        let related = facts("src/parser_tests.rs", 5_000, None);
        let unrelated = facts("assets/logo.svg", 5_000, None);
        assert!(score_facts(&related, &ctx) > score_facts(&unrelated, &ctx));
    }

    #[test]
    fn conversation_mentions_add_weight() {
        let fixture = Fixture::new();
        let git = NullGitActivity;
        let mut ctx = fixture.ctx(&git);
        let mentions = vec!["src/engine.rs".to_string()];
        ctx.conversation_mentions = &mentions;
        let mentioned = facts("src/engine.rs", 5_000, None);
        let ignored = facts("src/other.rs", 5_000, None);
        let diff = score_facts(&mentioned, &ctx) - score_facts(&ignored, &ctx);
        assert!((diff - fixture.weights.conversation_mention).abs() < 1e-9);
    }
}
