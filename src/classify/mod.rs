//! Pattern/category classification of conversation content.
//!
//! Five fixed category groups are scanned in declaration order; each group
//! carries a static keyword list and a set of compiled case-insensitive
//! patterns. The assigned category is the one with the highest combined
//! match count; ties keep the first group that reached the maximum. A
//! conversation matching nothing is `general`.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::model::ConversationKind;
use crate::weights::ConversationWeights;

pub struct CategoryDef {
    pub kind: ConversationKind,
    keywords: &'static [&'static str],
    patterns: Vec<Regex>,
}

const ARCHITECTURE_KEYWORDS: &[&str] = &[
    "architecture",
    "design",
    "structure",
    "refactor",
    "module",
    "component",
    "interface",
    "abstraction",
    "dependency",
    "coupling",
];

const DEBUGGING_KEYWORDS: &[&str] = &[
    "debug",
    "error",
    "bug",
    "fix",
    "crash",
    "stack trace",
    "exception",
    "panic",
    "fails",
    "broken",
];

const PROBLEM_SOLVING_KEYWORDS: &[&str] = &[
    "how to",
    "solve",
    "problem",
    "approach",
    "solution",
    "implement",
    "figure out",
    "workaround",
    "optimize",
];

const TECHNICAL_KEYWORDS: &[&str] = &[
    "function",
    "class",
    "method",
    "api",
    "database",
    "query",
    "algorithm",
    "performance",
    "config",
    "deploy",
];

const CODE_DISCUSSION_KEYWORDS: &[&str] = &[
    "code",
    "review",
    "snippet",
    "diff",
    "commit",
    "branch",
    "merge",
    "pull request",
    "refactoring",
];

fn compile(patterns: &[&str]) -> Vec<Regex> {
    // Static patterns; a failed compile is a programmer error.
    patterns
        .iter()
        .map(|p| Regex::new(p).expect("static classifier pattern"))
        .collect()
}

static CATEGORIES: Lazy<Vec<CategoryDef>> = Lazy::new(|| {
    vec![
        CategoryDef {
            kind: ConversationKind::Architecture,
            keywords: ARCHITECTURE_KEYWORDS,
            patterns: compile(&[
                r"(?i)\b(micro)?services?\b",
                r"(?i)\bdesign\s+pattern",
                r"(?i)\blayer(ing|ed)?\b",
                r"(?i)\b(mono|multi)repo\b",
            ]),
        },
        CategoryDef {
            kind: ConversationKind::Debugging,
            keywords: DEBUGGING_KEYWORDS,
            patterns: compile(&[
                r"(?i)\b(stack\s*trace|backtrace)\b",
                r"(?i)\b(error|exception)\s*:\s*\S",
                r"(?i)\bpanicked at\b",
                r"(?i)\bsegfault\b",
                r"(?i)\b(undefined|null)\s+(reference|pointer)\b",
            ]),
        },
        CategoryDef {
            kind: ConversationKind::ProblemSolving,
            keywords: PROBLEM_SOLVING_KEYWORDS,
            patterns: compile(&[
                r"(?i)\bhow\s+(do|can|should)\s+(i|we)\b",
                r"(?i)\bwhat('s| is)\s+the\s+best\s+way\b",
                r"(?i)\btrade[- ]?offs?\b",
            ]),
        },
        CategoryDef {
            kind: ConversationKind::Technical,
            keywords: TECHNICAL_KEYWORDS,
            patterns: compile(&[
                r"(?i)\b(fn|def|func|impl|class)\s+\w+",
                r"(?i)\bselect\s+.+\s+from\b",
                r"O\((?:[a-z0-9^ *+]+)\)",
            ]),
        },
        CategoryDef {
            kind: ConversationKind::CodeDiscussion,
            keywords: CODE_DISCUSSION_KEYWORDS,
            patterns: compile(&[r"```", r"(?i)\b(lgtm|nit)\b", r"(?i)\bdiff --git\b"]),
        },
    ]
});

/// Outcome of a classification pass.
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    pub kind: ConversationKind,
    /// Match count times the category's configured weight; zero for
    /// `general`.
    pub pattern_score: f64,
    pub match_count: usize,
}

fn group_weight(kind: ConversationKind, weights: &ConversationWeights) -> f64 {
    match kind {
        ConversationKind::Architecture => weights.architecture,
        ConversationKind::Debugging => weights.debugging,
        ConversationKind::ProblemSolving => weights.problem_solving,
        ConversationKind::Technical => weights.technical_content,
        ConversationKind::CodeDiscussion => weights.code_discussion,
        ConversationKind::General => 0.0,
    }
}

fn category_matches(def: &CategoryDef, content: &str, lowered: &str) -> usize {
    let keyword_hits = def
        .keywords
        .iter()
        .filter(|kw| lowered.contains(*kw))
        .count();
    let pattern_hits = def
        .patterns
        .iter()
        .filter(|re| re.is_match(content))
        .count();
    keyword_hits + pattern_hits
}

/// Classify content into a conversation category with a pattern score.
pub fn classify(content: &str, weights: &ConversationWeights) -> Classification {
    if content.is_empty() {
        return Classification {
            kind: ConversationKind::General,
            pattern_score: 0.0,
            match_count: 0,
        };
    }
    let lowered = content.to_lowercase();

    let mut best_kind = ConversationKind::General;
    let mut best_count = 0usize;
    for def in CATEGORIES.iter() {
        let count = category_matches(def, content, &lowered);
        // Strictly greater: ties keep the earlier group.
        if count > best_count {
            best_count = count;
            best_kind = def.kind;
        }
    }

    if best_count == 0 {
        return Classification {
            kind: ConversationKind::General,
            pattern_score: 0.0,
            match_count: 0,
        };
    }

    Classification {
        kind: best_kind,
        pattern_score: best_count as f64 * group_weight(best_kind, weights),
        match_count: best_count,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
