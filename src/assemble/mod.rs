//! Result assembly under a serialized-size budget.
//!
//! Ranked items are accumulated greedily; each candidate is slimmed
//! (verbose fields dropped, long strings truncated) before its serialized
//! size is measured, and accumulation stops before the first item that
//! would push the running total past the budget. An item is never
//! partially serialized.

use crate::model::RecallItem;
use crate::weights::EngineLimits;

/// Serialized overhead of the surrounding JSON array per element.
const ARRAY_OVERHEAD_BYTES: usize = 2;

fn truncate_chars(s: &str, cap: usize) -> String {
    s.chars().take(cap).collect()
}

/// The size-reducing transform applied to each item before measurement:
/// content truncated to the slim cap, reference lists bounded.
fn slim(item: &RecallItem, limits: &EngineLimits) -> RecallItem {
    let mut slimmed = item.clone();
    if let Some(content) = &slimmed.content {
        if content.chars().count() > limits.slim_content_chars {
            slimmed.content = Some(truncate_chars(content, limits.slim_content_chars));
        }
    }
    slimmed.file_references.truncate(5);
    slimmed.detected_keywords.truncate(10);
    slimmed
}

fn serialized_len(item: &RecallItem) -> usize {
    serde_json::to_string(item).map(|s| s.len()).unwrap_or(0)
}

/// Greedily keep a prefix of the ranked items whose combined serialized
/// size stays within `target_bytes`. Returns the kept (slimmed) items and
/// whether anything was dropped.
pub fn optimize_items_for_size(
    items: &[RecallItem],
    target_bytes: usize,
    limits: &EngineLimits,
) -> (Vec<RecallItem>, bool) {
    let mut kept = Vec::with_capacity(items.len());
    let mut used = ARRAY_OVERHEAD_BYTES;
    for item in items {
        let slimmed = slim(item, limits);
        let cost = serialized_len(&slimmed) + 1;
        if used + cost > target_bytes {
            return (kept, true);
        }
        used += cost;
        kept.push(slimmed);
    }
    (kept, false)
}

/// Estimate the serialized size of a full result set, post-slimming.
pub fn estimated_response_bytes(items: &[RecallItem], limits: &EngineLimits) -> usize {
    items
        .iter()
        .map(|item| serialized_len(&slim(item, limits)) + 1)
        .sum::<usize>()
        + ARRAY_OVERHEAD_BYTES
}

/// Summary mode is recommended once the projected response exceeds the
/// configured byte threshold.
pub fn recommend_summary_mode(response_bytes: usize, limits: &EngineLimits) -> bool {
    response_bytes > limits.summary_mode_threshold_bytes
}

/// Fast mode is recommended when the per-item cost model projects the
/// total past the wall-clock budget.
pub fn recommend_fast_mode(item_count: usize, limits: &EngineLimits) -> bool {
    item_count as f64 * limits.per_item_cost_ms > limits.time_budget_ms
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
