use agent_recall::threading::thread_entries;
use proptest::prelude::*;
use serde_json::{Value, json};

const T: i64 = 1_700_000_000_000;

// ============================================================================
// End-to-end pairing scenario
// ============================================================================

#[test]
fn two_aligned_exchanges_pair_and_sort_newest_first() {
    let prompts = vec![
        json!({"text": "Q1", "timestamp": T}),
        json!({"text": "Q2", "timestamp": T + 100}),
    ];
    let generations = vec![
        json!({"textDescription": "A1", "timestamp": T + 10}),
        json!({"textDescription": "A2", "timestamp": T + 110}),
    ];
    let threads = thread_entries(&prompts, &generations);
    assert_eq!(threads.len(), 2);
    assert!(threads.iter().all(|t| !t.unpaired));
    assert_eq!(threads[0].prompt.as_ref().unwrap()["text"], "Q2");
    assert_eq!(threads[0].generation.as_ref().unwrap()["textDescription"], "A2");
    assert_eq!(threads[1].prompt.as_ref().unwrap()["text"], "Q1");
}

// ============================================================================
// Completeness and exclusivity invariants
// ============================================================================

fn prompt_records(n: usize) -> Vec<Value> {
    (0..n)
        .map(|i| json!({"text": format!("p{i}"), "timestamp": T + i as i64 * 1_000}))
        .collect()
}

fn generation_records(n: usize) -> Vec<Value> {
    (0..n)
        .map(|i| json!({"textDescription": format!("g{i}"), "timestamp": T + i as i64 * 1_000 + 10}))
        .collect()
}

#[test]
fn output_covers_every_input_exactly_once() {
    for (p, g) in [(0, 0), (1, 0), (0, 1), (3, 3), (5, 2), (2, 5)] {
        let prompts = prompt_records(p);
        let generations = generation_records(g);
        let threads = thread_entries(&prompts, &generations);

        assert!(threads.len() >= p.max(g), "p={p} g={g}");
        let prompt_count = threads.iter().filter(|t| t.prompt.is_some()).count();
        let generation_count = threads.iter().filter(|t| t.generation.is_some()).count();
        assert_eq!(prompt_count, p, "every prompt appears once");
        assert_eq!(generation_count, g, "every generation appears once");
    }
}

#[test]
fn unpaired_flag_matches_missing_side() {
    let threads = thread_entries(&prompt_records(4), &generation_records(2));
    for thread in &threads {
        let present =
            thread.prompt.is_some() as usize + thread.generation.is_some() as usize;
        assert!(present >= 1, "at least one side is always present");
        assert_eq!(thread.unpaired, present == 1);
    }
}

proptest! {
    #[test]
    fn completeness_holds_for_arbitrary_sizes(p in 0usize..12, g in 0usize..12) {
        let prompts = prompt_records(p);
        let generations = generation_records(g);
        let threads = thread_entries(&prompts, &generations);
        prop_assert!(threads.len() >= p.max(g));
        let prompt_count = threads.iter().filter(|t| t.prompt.is_some()).count();
        let generation_count = threads.iter().filter(|t| t.generation.is_some()).count();
        prop_assert_eq!(prompt_count, p);
        prop_assert_eq!(generation_count, g);
        for t in &threads {
            let present = t.prompt.is_some() as usize + t.generation.is_some() as usize;
            prop_assert!(present >= 1);
            prop_assert_eq!(t.unpaired, present == 1);
        }
    }
}

// ============================================================================
// Ordering
// ============================================================================

#[test]
fn sorted_descending_with_missing_timestamps_last() {
    let prompts = vec![
        json!({"text": "old", "timestamp": T - 1_000_000}),
        json!({"text": "undated"}),
        json!({"text": "new", "timestamp": T}),
    ];
    let threads = thread_entries(&prompts, &[]);
    assert_eq!(threads[0].prompt.as_ref().unwrap()["text"], "new");
    assert_eq!(threads[1].prompt.as_ref().unwrap()["text"], "old");
    assert_eq!(threads[2].prompt.as_ref().unwrap()["text"], "undated");
    assert!(threads[2].timestamp.is_none());
}
