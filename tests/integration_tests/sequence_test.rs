//! Sequence allocation tests
//!
//! Uniqueness per category must hold at every quiescent point, including
//! under concurrent saves into the same category.

use std::collections::HashSet;
use std::sync::{Arc, Barrier};
use std::thread;

use proptest::prelude::*;

use seqlink::models::{CategoryId, ItemId, SaveRequest};
use seqlink::storage::{ContentRepository, MockContentRepository, SharedContentRepository};

use crate::common::{create_post, create_state, create_test_repos, test_config};

fn sequences_in(repo: &dyn ContentRepository, category: CategoryId) -> Vec<u64> {
    repo.get_items_with_meta_key(&format!("cat_seq_{}", category.0))
        .unwrap()
        .into_iter()
        .map(|(_, seq)| seq)
        .collect()
}

fn assert_unique(values: &[u64]) {
    let distinct: HashSet<_> = values.iter().collect();
    assert_eq!(distinct.len(), values.len(), "duplicate sequences: {values:?}");
}

// ============================================================================
// Concurrency
// ============================================================================

#[test]
fn test_two_racing_saves_get_distinct_sequences() {
    for repo in create_test_repos() {
        let state = create_state(test_config(), repo.clone());
        repo.put_item(&create_post(10, &[1])).unwrap();
        repo.put_item(&create_post(11, &[1])).unwrap();

        let barrier = Arc::new(Barrier::new(2));
        let handles: Vec<_> = [10u64, 11]
            .into_iter()
            .map(|id| {
                let lifecycle = state.lifecycle.clone();
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    lifecycle
                        .on_item_saved(ItemId(id), &SaveRequest::none())
                        .unwrap()
                        .unwrap()
                        .sequence
                        .unwrap()
                })
            })
            .collect();

        let mut got: Vec<u64> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        got.sort_unstable();
        assert_eq!(got, vec![1, 2]);
    }
}

#[test]
fn test_many_racing_saves_mixed_manual_and_auto() {
    for repo in create_test_repos() {
        let state = create_state(test_config(), repo.clone());
        for id in 100..132 {
            repo.put_item(&create_post(id, &[1])).unwrap();
        }

        let barrier = Arc::new(Barrier::new(32));
        let handles: Vec<_> = (100u64..132)
            .map(|id| {
                let lifecycle = state.lifecycle.clone();
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    // Every third save asks for slot 3
                    let request = if id % 3 == 0 {
                        SaveRequest::none().with_sequence(3)
                    } else {
                        SaveRequest::none()
                    };
                    barrier.wait();
                    lifecycle.on_item_saved(ItemId(id), &request).unwrap();
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        let values = sequences_in(repo.as_ref(), CategoryId(1));
        assert_eq!(values.len(), 32);
        assert_unique(&values);
    }
}

#[test]
fn test_categories_are_independent() {
    for repo in create_test_repos() {
        let state = create_state(test_config(), repo.clone());
        repo.put_item(&create_post(10, &[1])).unwrap();
        repo.put_item(&create_post(11, &[2])).unwrap();

        let a = state.lifecycle.on_item_saved(ItemId(10), &SaveRequest::none()).unwrap();
        let b = state.lifecycle.on_item_saved(ItemId(11), &SaveRequest::none()).unwrap();
        assert_eq!(a.unwrap().sequence, Some(1));
        assert_eq!(b.unwrap().sequence, Some(1));
    }
}

// ============================================================================
// Properties
// ============================================================================

#[derive(Debug, Clone)]
enum Op {
    Save { item: u64, manual: Option<i64> },
    Delete { item: u64 },
    SwitchPrimary { item: u64 },
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => (0u64..8, proptest::option::of(-2i64..12))
            .prop_map(|(item, manual)| Op::Save { item, manual }),
        1 => (0u64..8).prop_map(|item| Op::Delete { item }),
        1 => (0u64..8).prop_map(|item| Op::SwitchPrimary { item }),
    ]
}

fn apply(state: &seqlink::http::AppState, repo: &SharedContentRepository, op: &Op) {
    match op {
        Op::Save { item, manual } => {
            let id = 100 + item;
            if repo.get_item(ItemId(id)).unwrap().is_none() {
                repo.put_item(&create_post(id, &[1, 2])).unwrap();
            }
            let request = SaveRequest {
                primary_category: None,
                manual_sequence: *manual,
            };
            state.lifecycle.on_item_saved(ItemId(id), &request).unwrap();
        }
        Op::Delete { item } => {
            state.lifecycle.delete_item(ItemId(100 + item)).unwrap();
        }
        Op::SwitchPrimary { item } => {
            let id = ItemId(100 + item);
            if repo.get_item(id).unwrap().is_some() {
                let request = SaveRequest::none().with_primary(CategoryId(2));
                state.lifecycle.on_item_saved(id, &request).unwrap();
            }
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_sequences_stay_unique(ops in proptest::collection::vec(op_strategy(), 1..40)) {
        let repo: SharedContentRepository = Arc::new(MockContentRepository::new());
        let state = create_state(test_config(), repo.clone());

        for op in &ops {
            apply(&state, &repo, op);

            for category in [CategoryId(1), CategoryId(2)] {
                let values = sequences_in(repo.as_ref(), category);
                let distinct: HashSet<_> = values.iter().collect();
                prop_assert_eq!(distinct.len(), values.len());
                prop_assert!(values.iter().all(|v| *v >= 1));
            }
        }
    }

    #[test]
    fn prop_auto_never_backfills(existing in proptest::collection::btree_set(1u64..50, 0..10)) {
        let repo: SharedContentRepository = Arc::new(MockContentRepository::new());
        let state = create_state(test_config(), repo.clone());

        for (i, seq) in existing.iter().enumerate() {
            let item = create_post(i as u64 + 1, &[1]).with_meta("cat_seq_1", seq.to_string());
            repo.put_item(&item).unwrap();
        }
        repo.put_item(&create_post(999, &[1])).unwrap();

        let outcome = state
            .lifecycle
            .on_item_saved(ItemId(999), &SaveRequest::none())
            .unwrap()
            .unwrap();
        let expected = existing.iter().max().map_or(1, |m| m + 1);
        prop_assert_eq!(outcome.sequence, Some(expected));
    }
}
