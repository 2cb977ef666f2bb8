//! Prompt/generation threading for stores that keep the two sides in
//! separate tables (Cursor-style).
//!
//! Pairing is greedy: each prompt, in input order, claims the best still
//! unused generation by sequence proximity plus a timestamp-window bonus.
//! No backtracking reassigns an earlier match. This trades matching
//! optimality for a single linear pass over small inputs.

use serde_json::Value;

use crate::model::ConversationThread;
use crate::util::time::parse_timestamp;

/// Two entries within this window earn the timestamp pairing bonus.
pub const PAIRING_WINDOW_MS: i64 = 5 * 60 * 1000;

/// A candidate below this score leaves the prompt unpaired.
const MIN_PAIR_SCORE: f64 = 0.5;

/// Timestamp fields tried on raw prompt/generation entries.
const ENTRY_TIMESTAMP_FIELDS: &[&str] = &["timestamp", "unixMs", "createdAt", "created_at", "time"];

fn entry_timestamp(entry: &Value) -> Option<i64> {
    for field in ENTRY_TIMESTAMP_FIELDS {
        if let Some(ts) = entry.get(*field).and_then(parse_timestamp) {
            return Some(ts);
        }
    }
    None
}

/// Sequence-proximity component of the pairing score.
fn proximity_score(prompt_idx: usize, generation_idx: usize) -> f64 {
    if generation_idx == prompt_idx {
        2.0
    } else if generation_idx == prompt_idx + 1 {
        1.5
    } else if prompt_idx.abs_diff(generation_idx) <= 2 {
        1.0
    } else {
        0.5 / prompt_idx.abs_diff(generation_idx) as f64
    }
}

/// Thread prompts and generations into conversational exchanges.
///
/// Inputs are taken in stored order (assumed chronological). Every input
/// entry appears in exactly one output thread; generations left unclaimed
/// become unpaired threads. The result is sorted descending by resolved
/// timestamp with timestamp-less threads last.
pub fn thread_entries(prompts: &[Value], generations: &[Value]) -> Vec<ConversationThread> {
    let generation_ts: Vec<Option<i64>> = generations.iter().map(entry_timestamp).collect();
    let mut used = vec![false; generations.len()];
    let mut threads = Vec::with_capacity(prompts.len().max(generations.len()));

    for (i, prompt) in prompts.iter().enumerate() {
        let prompt_ts = entry_timestamp(prompt);
        let mut best: Option<(usize, f64)> = None;
        for j in 0..generations.len() {
            if used[j] {
                continue;
            }
            let mut score = proximity_score(i, j);
            if let (Some(p), Some(g)) = (prompt_ts, generation_ts[j]) {
                if (p - g).abs() <= PAIRING_WINDOW_MS {
                    score += 1.0;
                }
            }
            let better = match best {
                Some((_, best_score)) => score > best_score,
                None => true,
            };
            if better {
                best = Some((j, score));
            }
        }

        match best {
            Some((j, score)) if score > MIN_PAIR_SCORE => {
                used[j] = true;
                let ts = prompt_ts.or(generation_ts[j]);
                threads.push(ConversationThread::paired(
                    prompt.clone(),
                    generations[j].clone(),
                    ts,
                ));
            }
            _ => threads.push(ConversationThread::prompt_only(prompt.clone(), prompt_ts)),
        }
    }

    for (j, generation) in generations.iter().enumerate() {
        if !used[j] {
            threads.push(ConversationThread::generation_only(
                generation.clone(),
                generation_ts[j],
            ));
        }
    }

    // Stable sort: equal timestamps keep pairing order; missing timestamps
    // sort as oldest.
    threads.sort_by_key(|t| std::cmp::Reverse(t.timestamp.unwrap_or(i64::MIN)));
    threads
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
