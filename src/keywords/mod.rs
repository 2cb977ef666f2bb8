//! Context keyword generation: a bounded relevance vocabulary derived from
//! the current project.
//!
//! The scan is deliberately shallow — a fixed set of manifests read with a
//! character cap, plus a bounded extension sample that only descends one
//! directory level when the top level is not diverse enough. Latency is
//! traded for completeness; the cap keeps the vocabulary small either way.

use std::path::Path;

use once_cell::sync::Lazy;
use rustc_hash::FxHashSet;
use serde_json::Value;
use walkdir::WalkDir;

use crate::util::hash_key;
use crate::weights::EngineLimits;

/// Manifest files consulted, in read order. Their mtimes also form the
/// cache fingerprint.
pub const WATCHED_MANIFESTS: &[&str] = &[
    "package.json",
    "pyproject.toml",
    "Cargo.toml",
    "requirements.txt",
    "README.md",
];

/// Marker files mapped straight to a technology token.
static SPECIAL_FILES: Lazy<Vec<(&'static str, &'static str)>> = Lazy::new(|| {
    vec![
        ("Dockerfile", "docker"),
        ("docker-compose.yml", "docker"),
        ("docker-compose.yaml", "docker"),
        ("Makefile", "make"),
        ("CMakeLists.txt", "cmake"),
        ("go.mod", "go"),
        ("Gemfile", "ruby"),
        ("build.gradle", "gradle"),
        ("pom.xml", "maven"),
        ("tsconfig.json", "typescript"),
    ]
});

/// Extension to technology token table.
static EXTENSION_KEYWORDS: Lazy<Vec<(&'static str, &'static [&'static str])>> = Lazy::new(|| {
    vec![
        ("rs", &["rust"] as &[&str]),
        ("py", &["python"]),
        ("ts", &["typescript"]),
        ("tsx", &["typescript", "react"]),
        ("js", &["javascript"]),
        ("jsx", &["javascript", "react"]),
        ("go", &["go"]),
        ("java", &["java"]),
        ("rb", &["ruby"]),
        ("cpp", &["cpp"]),
        ("cc", &["cpp"]),
        ("c", &["c"]),
        ("cs", &["csharp"]),
        ("php", &["php"]),
        ("swift", &["swift"]),
        ("kt", &["kotlin"]),
        ("sql", &["sql"]),
        ("sh", &["shell"]),
        ("tf", &["terraform"]),
    ]
});

/// Dependency names promoted to keywords when seen in a manifest.
static KNOWN_FRAMEWORKS: Lazy<Vec<&'static str>> = Lazy::new(|| {
    vec![
        "react", "vue", "angular", "svelte", "next", "nuxt", "express", "fastify", "electron",
        "webpack", "vite", "jest", "vitest", "typescript", "tailwindcss", "django", "flask",
        "fastapi", "pytest", "numpy", "pandas", "pytorch", "tensorflow", "tokio", "serde", "axum",
        "actix-web", "clap", "rayon", "sqlx", "rusqlite",
    ]
});

/// Technology vocabulary scanned for in README prose.
static TECH_VOCABULARY: Lazy<Vec<&'static str>> = Lazy::new(|| {
    vec![
        "rust", "python", "javascript", "typescript", "react", "docker", "kubernetes", "postgres",
        "postgresql", "mysql", "sqlite", "redis", "graphql", "grpc", "wasm", "webassembly", "cli",
        "api", "async", "terraform", "aws", "linux", "macos", "windows",
    ]
});

/// Derive a bounded, ordered list of context keywords for a project.
///
/// The seed (lower-cased project directory name) is always first. On any
/// filesystem error the seed alone is returned.
pub fn generate_context_keywords(root: &Path, limits: &EngineLimits) -> Vec<String> {
    let seed = project_seed(root);
    let mut keywords = KeywordSet::new(limits.max_keywords);
    keywords.push(&seed);

    if let Err(err) = collect(root, limits, &mut keywords) {
        tracing::debug!(root = %root.display(), error = %err, "keyword scan failed");
        return vec![seed];
    }
    keywords.finish()
}

/// Cache key for a project's keyword list: root path plus the latest mtime
/// of any watched manifest, so edits invalidate the entry.
pub fn keyword_cache_key(root: &Path) -> u64 {
    let mut latest: u128 = 0;
    for name in WATCHED_MANIFESTS {
        if let Ok(meta) = std::fs::metadata(root.join(name)) {
            if let Ok(modified) = meta.modified() {
                if let Ok(age) = modified.duration_since(std::time::UNIX_EPOCH) {
                    latest = latest.max(age.as_millis());
                }
            }
        }
    }
    hash_key(&format!("{}|{latest}", root.display()))
}

fn project_seed(root: &Path) -> String {
    root.file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("project")
        .to_lowercase()
}

/// Ordered, deduplicated keyword accumulator. Membership is tracked in a
/// hash set; output order is first-seen. Single-character tokens are
/// dropped.
struct KeywordSet {
    ordered: Vec<String>,
    seen: FxHashSet<String>,
    cap: usize,
}

impl KeywordSet {
    fn new(cap: usize) -> Self {
        Self {
            ordered: Vec::with_capacity(cap),
            seen: FxHashSet::default(),
            cap,
        }
    }

    fn push(&mut self, token: &str) {
        let token = token.trim().to_lowercase();
        if token.chars().count() <= 1 {
            return;
        }
        if self.seen.insert(token.clone()) {
            self.ordered.push(token);
        }
    }

    fn finish(mut self) -> Vec<String> {
        self.ordered.truncate(self.cap);
        self.ordered
    }
}

fn collect(root: &Path, limits: &EngineLimits, keywords: &mut KeywordSet) -> std::io::Result<()> {
    for name in WATCHED_MANIFESTS {
        let path = root.join(name);
        if !path.is_file() {
            continue;
        }
        let text = match read_capped(&path, limits.manifest_read_cap) {
            Ok(t) => t,
            Err(_) => continue,
        };
        match *name {
            "package.json" => package_json_keywords(&text, keywords),
            "pyproject.toml" => pyproject_keywords(&text, keywords),
            "Cargo.toml" => cargo_toml_keywords(&text, keywords),
            "requirements.txt" => requirements_keywords(&text, keywords),
            "README.md" => readme_keywords(&text, keywords),
            _ => {}
        }
    }

    let extensions = sample_extensions(root, limits)?;
    for ext in &extensions {
        for (known, tokens) in EXTENSION_KEYWORDS.iter() {
            if *known == ext.as_str() {
                for token in *tokens {
                    keywords.push(token);
                }
            }
        }
    }

    for (file, token) in SPECIAL_FILES.iter() {
        if root.join(file).is_file() {
            keywords.push(token);
        }
    }

    Ok(())
}

fn read_capped(path: &Path, cap: usize) -> std::io::Result<String> {
    let text = std::fs::read_to_string(path)?;
    Ok(text.chars().take(cap).collect())
}

fn package_json_keywords(text: &str, keywords: &mut KeywordSet) {
    let Ok(value) = serde_json::from_str::<Value>(text) else {
        return;
    };
    if let Some(name) = value.get("name").and_then(Value::as_str) {
        // Scoped names keep only the package part.
        keywords.push(name.rsplit('/').next().unwrap_or(name));
    }
    if let Some(listed) = value.get("keywords").and_then(Value::as_array) {
        for kw in listed.iter().filter_map(Value::as_str).take(5) {
            keywords.push(kw);
        }
    }
    for table in ["dependencies", "devDependencies"] {
        let Some(deps) = value.get(table).and_then(Value::as_object) else {
            continue;
        };
        for dep in deps.keys() {
            if KNOWN_FRAMEWORKS.contains(&dep.as_str()) {
                keywords.push(dep);
            }
        }
    }
}

fn pyproject_keywords(text: &str, keywords: &mut KeywordSet) {
    let Ok(value) = text.parse::<toml::Value>() else {
        return;
    };
    let project = value.get("project");
    if let Some(name) = project
        .and_then(|p| p.get("name"))
        .and_then(toml::Value::as_str)
    {
        keywords.push(name);
    }
    if let Some(deps) = project
        .and_then(|p| p.get("dependencies"))
        .and_then(toml::Value::as_array)
    {
        for dep in deps.iter().filter_map(toml::Value::as_str) {
            keywords.push(strip_requirement(dep));
        }
    }
}

fn cargo_toml_keywords(text: &str, keywords: &mut KeywordSet) {
    let Ok(value) = text.parse::<toml::Value>() else {
        return;
    };
    if let Some(name) = value
        .get("package")
        .and_then(|p| p.get("name"))
        .and_then(toml::Value::as_str)
    {
        keywords.push(name);
    }
    keywords.push("rust");
    if let Some(deps) = value.get("dependencies").and_then(toml::Value::as_table) {
        for dep in deps.keys() {
            if KNOWN_FRAMEWORKS.contains(&dep.as_str()) {
                keywords.push(dep);
            }
        }
    }
}

fn requirements_keywords(text: &str, keywords: &mut KeywordSet) {
    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with('-') {
            continue;
        }
        keywords.push(strip_requirement(line));
    }
}

/// Strip version specifiers and extras from a requirement line.
fn strip_requirement(line: &str) -> &str {
    let end = line
        .find(|c: char| "=<>!~;[ ".contains(c))
        .unwrap_or(line.len());
    &line[..end]
}

fn readme_keywords(text: &str, keywords: &mut KeywordSet) {
    let lowered = text.to_lowercase();
    for tech in TECH_VOCABULARY.iter() {
        if lowered.contains(tech) {
            keywords.push(tech);
        }
    }
}

/// Sample file extensions: top level first, then one level deeper only
/// when diversity is low, always bounded by `max_files_checked`.
fn sample_extensions(root: &Path, limits: &EngineLimits) -> std::io::Result<FxHashSet<String>> {
    let mut extensions = FxHashSet::default();
    let mut checked = 0usize;

    for entry in std::fs::read_dir(root)? {
        let entry = match entry {
            Ok(e) => e,
            Err(_) => continue,
        };
        if checked >= limits.max_files_checked {
            return Ok(extensions);
        }
        checked += 1;
        record_extension(&entry.path(), &mut extensions);
    }

    if extensions.len() >= limits.extension_diversity_threshold {
        return Ok(extensions);
    }

    // Not diverse enough at the top: one level deeper, still bounded.
    for entry in WalkDir::new(root)
        .min_depth(2)
        .max_depth(2)
        .into_iter()
        .filter_entry(|e| {
            e.depth() == 0 || !is_hidden_or_vendored(e.file_name().to_str().unwrap_or(""))
        })
        .flatten()
    {
        if checked >= limits.max_files_checked {
            break;
        }
        if !entry.file_type().is_file() {
            continue;
        }
        checked += 1;
        record_extension(entry.path(), &mut extensions);
    }

    Ok(extensions)
}

fn record_extension(path: &Path, extensions: &mut FxHashSet<String>) {
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        extensions.insert(ext.to_lowercase());
    }
}

fn is_hidden_or_vendored(name: &str) -> bool {
    name.starts_with('.') || name == "node_modules" || name == "target" || name == "__pycache__"
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
