use agent_recall::assemble::{
    estimated_response_bytes, optimize_items_for_size, recommend_fast_mode,
    recommend_summary_mode,
};
use agent_recall::model::{ConversationKind, RecallItem};
use agent_recall::sources::SourceKind;
use agent_recall::weights::EngineLimits;
use proptest::prelude::*;

// ============================================================================
// Helpers
// ============================================================================

fn item(id: usize, content_len: usize) -> RecallItem {
    RecallItem {
        id: format!("conv-{id}"),
        title: format!("conversation {id}"),
        source: SourceKind::ClaudeCode,
        timestamp: Some(1_700_000_000_000),
        relevance_score: 1.0 - id as f64 * 0.01,
        conversation_type: ConversationKind::General,
        content: Some("x".repeat(content_len)),
        detected_keywords: Vec::new(),
        file_references: Vec::new(),
    }
}

fn serialized_size(items: &[RecallItem]) -> usize {
    serde_json::to_string(items).unwrap().len()
}

// ============================================================================
// Size bound
// ============================================================================

#[test]
fn kept_set_serializes_within_budget() {
    let limits = EngineLimits::default();
    let items: Vec<RecallItem> = (0..30).map(|i| item(i, 300)).collect();
    let target = 3_000;
    let (kept, truncated) = optimize_items_for_size(&items, target, &limits);
    assert!(truncated);
    assert!(serialized_size(&kept) <= target);
}

#[test]
fn fitting_set_is_returned_whole() {
    let limits = EngineLimits::default();
    let items: Vec<RecallItem> = (0..3).map(|i| item(i, 50)).collect();
    let (kept, truncated) = optimize_items_for_size(&items, 100_000, &limits);
    assert_eq!(kept.len(), 3);
    assert!(!truncated);
}

#[test]
fn result_is_a_prefix_of_the_ranked_input() {
    let limits = EngineLimits::default();
    let items: Vec<RecallItem> = (0..20).map(|i| item(i, 200)).collect();
    let (kept, _) = optimize_items_for_size(&items, 2_500, &limits);
    for (idx, kept_item) in kept.iter().enumerate() {
        assert_eq!(kept_item.id, items[idx].id);
    }
}

#[test]
fn impossible_budget_keeps_nothing_rather_than_a_partial_item() {
    let limits = EngineLimits::default();
    let items = vec![item(0, 1_000)];
    let (kept, truncated) = optimize_items_for_size(&items, 5, &limits);
    assert!(kept.is_empty());
    assert!(truncated);
}

proptest! {
    #[test]
    fn budget_is_never_exceeded(
        count in 0usize..15,
        content_len in 0usize..400,
        target in 10usize..5_000,
    ) {
        let limits = EngineLimits::default();
        let items: Vec<RecallItem> = (0..count).map(|i| item(i, content_len)).collect();
        let (kept, _) = optimize_items_for_size(&items, target, &limits);
        prop_assert!(kept.len() <= items.len());
        if !kept.is_empty() {
            prop_assert!(serialized_size(&kept) <= target);
        }
    }
}

// ============================================================================
// Mode policies
// ============================================================================

#[test]
fn summary_mode_tracks_projected_size() {
    let limits = EngineLimits::default();
    let small: Vec<RecallItem> = (0..2).map(|i| item(i, 20)).collect();
    let estimated = estimated_response_bytes(&small, &limits);
    assert!(!recommend_summary_mode(estimated, &limits));
    assert!(recommend_summary_mode(
        limits.summary_mode_threshold_bytes + 1,
        &limits
    ));
}

#[test]
fn fast_mode_tracks_item_count() {
    let limits = EngineLimits::default();
    let under = (limits.time_budget_ms / limits.per_item_cost_ms) as usize;
    assert!(!recommend_fast_mode(under.saturating_sub(1), &limits));
    assert!(recommend_fast_mode(under * 2, &limits));
}
