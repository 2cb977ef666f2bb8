//! Git activity signal.
//!
//! The engine only consumes `activity_score(path) -> [0,1]`. The CLI
//! implementation shells out to `git log` synchronously with an explicit
//! timeout; a non-zero exit, a missing binary, or a timeout all yield
//! zero scores and a log line, never an error.

use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use rustc_hash::FxHashMap;

/// Per-path activity in `[0, 1]`.
pub trait GitActivityProvider: Send + Sync {
    fn activity_score(&self, rel_path: &Path) -> f64;
}

/// Always zero; used in tests and when the project is not a repository.
pub struct NullGitActivity;

impl GitActivityProvider for NullGitActivity {
    fn activity_score(&self, _rel_path: &Path) -> f64 {
        0.0
    }
}

struct CachedScores {
    fetched_at: Instant,
    scores: FxHashMap<String, f64>,
}

/// Shells out to `git log --since=<N days> --name-only` and normalizes
/// per-file touch counts by the maximum seen. One scan per TTL window.
pub struct CliGitActivity {
    repo_root: PathBuf,
    since_days: u32,
    timeout: Duration,
    cache_ttl: Duration,
    state: Mutex<Option<CachedScores>>,
}

impl CliGitActivity {
    pub fn new(repo_root: impl Into<PathBuf>) -> Self {
        Self {
            repo_root: repo_root.into(),
            since_days: 14,
            timeout: Duration::from_secs(5),
            cache_ttl: Duration::from_secs(300),
            state: Mutex::new(None),
        }
    }

    pub fn with_since_days(mut self, days: u32) -> Self {
        self.since_days = days;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn scores(&self) -> FxHashMap<String, f64> {
        let mut state = self.state.lock();
        let stale = match state.as_ref() {
            Some(cached) => cached.fetched_at.elapsed() > self.cache_ttl,
            None => true,
        };
        if stale {
            *state = Some(CachedScores {
                fetched_at: Instant::now(),
                scores: self.scan(),
            });
        }
        state.as_ref().map(|c| c.scores.clone()).unwrap_or_default()
    }

    fn scan(&self) -> FxHashMap<String, f64> {
        let output = match self.run_git_log() {
            Some(out) => out,
            None => return FxHashMap::default(),
        };

        let mut counts: FxHashMap<String, u32> = FxHashMap::default();
        for line in output.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            *counts.entry(line.to_string()).or_insert(0) += 1;
        }
        let max = counts.values().copied().max().unwrap_or(0);
        if max == 0 {
            return FxHashMap::default();
        }
        counts
            .into_iter()
            .map(|(path, count)| (path, count as f64 / max as f64))
            .collect()
    }

    /// Run `git log` with a kill-on-timeout. Stdout is captured through a
    /// temp file so a chatty log cannot deadlock the pipe while we poll.
    fn run_git_log(&self) -> Option<String> {
        let git = match which::which("git") {
            Ok(path) => path,
            Err(_) => {
                tracing::debug!("git binary not found; activity scores disabled");
                return None;
            }
        };

        let mut capture = match tempfile::tempfile() {
            Ok(f) => f,
            Err(_) => return None,
        };
        let stdout = capture.try_clone().ok()?;

        let mut child = Command::new(git)
            .current_dir(&self.repo_root)
            .args([
                "log",
                &format!("--since={}.days", self.since_days),
                "--name-only",
                "--pretty=format:",
            ])
            .stdout(Stdio::from(stdout))
            .stderr(Stdio::null())
            .stdin(Stdio::null())
            .spawn()
            .ok()?;

        let deadline = Instant::now() + self.timeout;
        loop {
            match child.try_wait() {
                Ok(Some(status)) => {
                    if !status.success() {
                        tracing::warn!(code = ?status.code(), "git log failed");
                        return None;
                    }
                    break;
                }
                Ok(None) => {
                    if Instant::now() >= deadline {
                        tracing::warn!(timeout_ms = self.timeout.as_millis() as u64, "git log timed out");
                        let _ = child.kill();
                        let _ = child.wait();
                        return None;
                    }
                    std::thread::sleep(Duration::from_millis(25));
                }
                Err(_) => return None,
            }
        }

        capture.seek(SeekFrom::Start(0)).ok()?;
        let mut text = String::new();
        capture.read_to_string(&mut text).ok()?;
        Some(text)
    }
}

impl GitActivityProvider for CliGitActivity {
    fn activity_score(&self, rel_path: &Path) -> f64 {
        let key = rel_path.to_string_lossy().replace('\\', "/");
        self.scores().get(&key).copied().unwrap_or(0.0)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
