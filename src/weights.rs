//! Weight and threshold configuration.
//!
//! All scoring knobs are externally supplied as a flat named-key table with
//! per-key fallback to hardcoded defaults, so a partial TOML file (or none
//! at all) always yields a complete configuration. Weights are immutable
//! for the duration of a scoring pass and reloadable between passes.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur when loading a weights file.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read weights file: {0}")]
    Read(#[from] std::io::Error),

    #[error("Failed to parse weights file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Weights applied to conversation scoring components. The category keys
/// double as the classifier group weights.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ConversationWeights {
    pub keyword_match: f64,
    pub file_reference: f64,
    pub recency: f64,
    pub technical_content: f64,
    pub problem_solving: f64,
    pub architecture: f64,
    pub debugging: f64,
    pub code_discussion: f64,
}

impl Default for ConversationWeights {
    fn default() -> Self {
        Self {
            keyword_match: 0.3,
            file_reference: 0.2,
            recency: 0.25,
            technical_content: 0.1,
            problem_solving: 0.15,
            architecture: 0.2,
            debugging: 0.25,
            code_discussion: 0.1,
        }
    }
}

/// Weights applied to file scoring components.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FileWeights {
    pub recent_modification: f64,
    pub file_size_optimal: f64,
    pub import_relationship: f64,
    pub conversation_mention: f64,
    pub git_activity: f64,
    pub file_type_priority: f64,
    pub directory_importance: f64,
}

impl Default for FileWeights {
    fn default() -> Self {
        Self {
            recent_modification: 0.3,
            file_size_optimal: 0.15,
            import_relationship: 0.2,
            conversation_mention: 0.25,
            git_activity: 0.25,
            file_type_priority: 0.15,
            directory_importance: 0.1,
        }
    }
}

/// Engine thresholds and extraction caps.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EngineLimits {
    /// Hard cap on extracted conversation content, in characters.
    pub max_content_chars: usize,
    /// Maximum context keywords produced per project.
    pub max_keywords: usize,
    /// Characters read from each manifest file.
    pub manifest_read_cap: usize,
    /// Upper bound on files visited while sampling extensions.
    pub max_files_checked: usize,
    /// Descend one directory level only when fewer distinct extensions
    /// than this were seen at the top level.
    pub extension_diversity_threshold: usize,
    /// Floor for composite conversation relevance.
    pub min_relevance: f64,
    /// Floor for composite file scores.
    pub min_file_score: f64,
    /// Exponential recency decay rate, per day.
    pub decay_rate: f64,
    /// File tier cutoffs.
    pub file_high_threshold: f64,
    pub file_medium_threshold: f64,
    /// Files echoed in the `top_files` list.
    pub top_files_limit: usize,
    /// Content cap applied by the size optimizer's slimming transform.
    pub slim_content_chars: usize,
    /// Response sizes above this recommend summary mode.
    pub summary_mode_threshold_bytes: usize,
    /// Crude per-item processing cost model for the fast-mode policy.
    pub per_item_cost_ms: f64,
    /// Wall-clock budget the fast-mode policy guards.
    pub time_budget_ms: f64,
    /// TTL for the keyword and analysis caches, in seconds.
    pub cache_ttl_secs: u64,
    /// Entry capacity of each cache instance.
    pub cache_capacity: usize,
}

impl Default for EngineLimits {
    fn default() -> Self {
        Self {
            max_content_chars: 8_000,
            max_keywords: 15,
            manifest_read_cap: 2_000,
            max_files_checked: 200,
            extension_diversity_threshold: 3,
            min_relevance: 0.05,
            min_file_score: 0.05,
            decay_rate: 0.1,
            file_high_threshold: 0.6,
            file_medium_threshold: 0.3,
            top_files_limit: 10,
            slim_content_chars: 600,
            summary_mode_threshold_bytes: 20_000,
            per_item_cost_ms: 2.0,
            time_budget_ms: 1_500.0,
            cache_ttl_secs: 300,
            cache_capacity: 512,
        }
    }
}

fn default_extension_priorities() -> HashMap<String, f64> {
    let table: &[(&str, f64)] = &[
        ("rs", 1.0),
        ("py", 0.9),
        ("ts", 0.9),
        ("tsx", 0.85),
        ("go", 0.85),
        ("js", 0.8),
        ("jsx", 0.75),
        ("java", 0.7),
        ("rb", 0.7),
        ("c", 0.7),
        ("h", 0.65),
        ("cpp", 0.7),
        ("sql", 0.6),
        ("sh", 0.5),
        ("toml", 0.5),
        ("yaml", 0.5),
        ("yml", 0.5),
        ("json", 0.45),
        ("md", 0.4),
        ("html", 0.35),
        ("css", 0.35),
        ("lock", 0.1),
    ];
    table
        .iter()
        .map(|(ext, p)| (ext.to_string(), *p))
        .collect()
}

fn default_directory_importance() -> HashMap<String, f64> {
    let table: &[(&str, f64)] = &[
        ("src", 0.3),
        ("lib", 0.25),
        ("core", 0.25),
        ("api", 0.2),
        ("app", 0.2),
        ("server", 0.2),
        ("engine", 0.2),
        ("config", 0.15),
        ("utils", 0.15),
        ("scripts", 0.1),
        ("tests", 0.1),
        ("test", 0.1),
        ("docs", 0.05),
        ("examples", 0.05),
    ];
    table
        .iter()
        .map(|(dir, p)| (dir.to_string(), *p))
        .collect()
}

/// Supplies a fixed set of named weights plus the extension-priority and
/// directory-importance tables, all with per-key defaults.
pub trait WeightsProvider: Send + Sync {
    fn conversation_weights(&self) -> ConversationWeights;
    fn file_weights(&self) -> FileWeights;
    fn extension_priorities(&self) -> HashMap<String, f64>;
    fn directory_importance(&self) -> HashMap<String, f64>;
    fn limits(&self) -> EngineLimits;
}

/// In-memory provider, loadable from TOML.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct StaticWeights {
    pub conversation: ConversationWeights,
    pub file: FileWeights,
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    pub extension_priorities: HashMap<String, f64>,
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    pub directory_importance: HashMap<String, f64>,
    pub limits: EngineLimits,
}

impl StaticWeights {
    /// Load from a TOML file. Missing keys fall back to their defaults;
    /// the extension and directory tables fall back as whole maps.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        let weights: StaticWeights = toml::from_str(&text)?;
        Ok(weights)
    }

    fn extensions_or_default(&self) -> HashMap<String, f64> {
        if self.extension_priorities.is_empty() {
            default_extension_priorities()
        } else {
            self.extension_priorities.clone()
        }
    }

    fn directories_or_default(&self) -> HashMap<String, f64> {
        if self.directory_importance.is_empty() {
            default_directory_importance()
        } else {
            self.directory_importance.clone()
        }
    }
}

impl WeightsProvider for StaticWeights {
    fn conversation_weights(&self) -> ConversationWeights {
        self.conversation.clone()
    }

    fn file_weights(&self) -> FileWeights {
        self.file.clone()
    }

    fn extension_priorities(&self) -> HashMap<String, f64> {
        self.extensions_or_default()
    }

    fn directory_importance(&self) -> HashMap<String, f64> {
        self.directories_or_default()
    }

    fn limits(&self) -> EngineLimits {
        self.limits.clone()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_complete() {
        let w = StaticWeights::default();
        assert!(w.conversation_weights().keyword_match > 0.0);
        assert!(w.file_weights().recent_modification > 0.0);
        assert!(w.extension_priorities().contains_key("rs"));
        assert!(w.directory_importance().contains_key("src"));
    }

    #[test]
    fn partial_toml_falls_back_per_key() {
        let parsed: StaticWeights = toml::from_str(
            r#"
            [conversation]
            keyword_match = 0.9

            [limits]
            max_keywords = 5
            "#,
        )
        .unwrap();
        assert_eq!(parsed.conversation.keyword_match, 0.9);
        // Untouched keys keep their defaults.
        assert_eq!(
            parsed.conversation.recency,
            ConversationWeights::default().recency
        );
        assert_eq!(parsed.limits.max_keywords, 5);
        assert_eq!(
            parsed.limits.max_content_chars,
            EngineLimits::default().max_content_chars
        );
        assert!(parsed.extension_priorities().contains_key("py"));
    }

    #[test]
    fn explicit_tables_replace_defaults() {
        let parsed: StaticWeights = toml::from_str(
            r#"
            [extension_priorities]
            zig = 1.0
            "#,
        )
        .unwrap();
        let exts = parsed.extension_priorities();
        assert_eq!(exts.get("zig"), Some(&1.0));
        assert!(!exts.contains_key("rs"));
    }

    #[test]
    fn load_missing_file_is_an_error() {
        assert!(StaticWeights::load(Path::new("/nonexistent/weights.toml")).is_err());
    }

    #[test]
    fn classifier_group_weights_match_documented_defaults() {
        let w = ConversationWeights::default();
        assert_eq!(w.debugging, 0.25);
        assert_eq!(w.architecture, 0.2);
        assert_eq!(w.problem_solving, 0.15);
        assert_eq!(w.technical_content, 0.1);
        assert_eq!(w.code_discussion, 0.1);
    }
}
