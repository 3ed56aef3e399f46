//! Lifecycle handler tests over imported content

use seqlink::models::{CategoryId, ItemId, SaveRequest};
use seqlink::routing::RequestContext;
use seqlink::storage::{ContentRepository, ImportData};

use crate::common::{create_state, create_test_repos, test_config};

use super::fixtures::{SAMPLE_IMPORT_JSON, SAMPLE_POSTS};

#[test]
fn test_import_then_save_assigns_per_primary_category() {
    for repo in create_test_repos() {
        let state = create_state(test_config(), repo.clone());
        state
            .lifecycle
            .import(&ImportData::from_json(SAMPLE_IMPORT_JSON).unwrap())
            .unwrap();

        let mut permalinks = Vec::new();
        for id in SAMPLE_POSTS {
            let outcome = state
                .lifecycle
                .on_item_saved(ItemId(id), &SaveRequest::none())
                .unwrap()
                .unwrap();
            permalinks.push(outcome.permalink.unwrap());
        }

        assert_eq!(
            permalinks,
            vec![
                "https://example.com/news/1/".to_string(),
                "https://example.com/news/2/".to_string(),
                "https://example.com/column/1/".to_string(),
            ]
        );

        // Pages are not target items
        assert!(state
            .lifecycle
            .on_item_saved(ItemId(20), &SaveRequest::none())
            .unwrap()
            .is_none());
    }
}

#[test]
fn test_switching_primary_keeps_history_and_assigns_new() {
    for repo in create_test_repos() {
        let state = create_state(test_config(), repo.clone());
        state
            .lifecycle
            .import(&ImportData::from_json(SAMPLE_IMPORT_JSON).unwrap())
            .unwrap();

        state
            .lifecycle
            .on_item_saved(ItemId(12), &SaveRequest::none())
            .unwrap();
        let outcome = state
            .lifecycle
            .on_item_saved(ItemId(11), &SaveRequest::none().with_primary(CategoryId(2)))
            .unwrap()
            .unwrap();

        assert_eq!(outcome.primary, Some(CategoryId(2)));
        assert_eq!(outcome.sequence, Some(2));
        assert_eq!(outcome.permalink.as_deref(), Some("https://example.com/column/2/"));
    }
}

#[test]
fn test_item_deletion_removes_every_assignment() {
    for repo in create_test_repos() {
        let state = create_state(test_config(), repo.clone());
        state
            .lifecycle
            .import(&ImportData::from_json(SAMPLE_IMPORT_JSON).unwrap())
            .unwrap();

        // Sequence in news, then in column after switching primary
        state
            .lifecycle
            .on_item_saved(ItemId(11), &SaveRequest::none())
            .unwrap();
        state
            .lifecycle
            .on_item_saved(ItemId(11), &SaveRequest::none().with_primary(CategoryId(2)))
            .unwrap();
        assert_eq!(
            repo.item_meta_keys(ItemId(11)).unwrap(),
            vec![
                "_csp_primary_cat".to_string(),
                "cat_seq_1".to_string(),
                "cat_seq_2".to_string(),
            ]
        );

        assert_eq!(state.lifecycle.on_item_deleted(ItemId(11)).unwrap(), 2);
        assert_eq!(
            repo.item_meta_keys(ItemId(11)).unwrap(),
            vec!["_csp_primary_cat".to_string()]
        );

        // Safe against already-clean state
        assert_eq!(state.lifecycle.on_item_deleted(ItemId(11)).unwrap(), 0);
        assert_eq!(state.lifecycle.on_item_deleted(ItemId(999)).unwrap(), 0);
    }
}

#[test]
fn test_category_deletion_removes_assignments_across_items() {
    for repo in create_test_repos() {
        let state = create_state(test_config(), repo.clone());
        state
            .lifecycle
            .import(&ImportData::from_json(SAMPLE_IMPORT_JSON).unwrap())
            .unwrap();

        for id in SAMPLE_POSTS {
            state
                .lifecycle
                .on_item_saved(ItemId(id), &SaveRequest::none())
                .unwrap();
        }
        // A detached item still holding a news number
        repo.update_item_meta(ItemId(12), "cat_seq_1", "9").unwrap();

        assert!(state.lifecycle.delete_category(CategoryId(1)).unwrap());
        assert!(repo.get_items_with_meta_key("cat_seq_1").unwrap().is_empty());
        assert_eq!(repo.get_items_with_meta_key("cat_seq_2").unwrap().len(), 1);

        // Item 11 falls back to column and gets a fresh number there
        let outcome = state
            .lifecycle
            .on_item_saved(ItemId(11), &SaveRequest::none())
            .unwrap()
            .unwrap();
        assert_eq!(outcome.primary, Some(CategoryId(2)));
        assert_eq!(outcome.sequence, Some(2));

        assert!(!state.lifecycle.delete_category(CategoryId(1)).unwrap());
    }
}

#[test]
fn test_reimport_keeps_assigned_sequences() {
    for repo in create_test_repos() {
        let state = create_state(test_config(), repo.clone());
        let data = ImportData::from_json(SAMPLE_IMPORT_JSON).unwrap();
        state.lifecycle.import(&data).unwrap();
        state
            .lifecycle
            .on_item_saved(ItemId(10), &SaveRequest::none())
            .unwrap();

        // Same file again, no sequence meta in it
        let summary = state.lifecycle.import(&data).unwrap();
        assert_eq!(summary.reassigned, 0);
        assert_eq!(
            repo.get_item_meta(ItemId(10), "cat_seq_1").unwrap().as_deref(),
            Some("1")
        );

        let ctx = RequestContext::parse("/news/1/", state.base_path());
        let outcome = state.resolver.resolve(&ctx).unwrap();
        assert_eq!(outcome.item().map(|item| item.id), Some(ItemId(10)));
    }
}

#[test]
fn test_imported_sequences_never_collide() {
    const DUPLICATED: &str = r#"{
        "items": [
            { "id": 10, "item_type": "post", "slug": "a", "title": "A", "categories": [1], "meta": { "cat_seq_1": "3" } },
            { "id": 11, "item_type": "post", "slug": "b", "title": "B", "categories": [1], "meta": { "cat_seq_1": "3" } }
        ]
    }"#;

    for repo in create_test_repos() {
        let state = create_state(test_config(), repo.clone());
        let summary = state
            .lifecycle
            .import(&ImportData::from_json(DUPLICATED).unwrap())
            .unwrap();
        assert_eq!(summary.items, vec![ItemId(10), ItemId(11)]);
        assert_eq!(summary.reassigned, 1);

        assert_eq!(repo.get_items_by_meta_value("cat_seq_1", 3).unwrap(), vec![ItemId(10)]);
        assert_eq!(
            repo.get_item_meta(ItemId(11), "cat_seq_1").unwrap().as_deref(),
            Some("4")
        );

        // Auto allocation continues after the imported maximum
        repo.put_item(&crate::common::create_post(12, &[1])).unwrap();
        let outcome = state
            .lifecycle
            .on_item_saved(ItemId(12), &SaveRequest::none())
            .unwrap()
            .unwrap();
        assert_eq!(outcome.sequence, Some(5));
    }
}
