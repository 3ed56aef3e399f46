//! Error scenario integration tests
//!
//! Failure modes surfaced through the router and the storage layer:
//! exhausted probes, malformed requests, invalid configuration and
//! on-disk databases shared or reopened.

use std::collections::BTreeSet;
use std::sync::{Arc, Barrier};
use std::thread;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use tempfile::TempDir;
use tower::ServiceExt;

use seqlink::http::{create_router, AppState, PermalinkServer, ServerError};
use seqlink::models::{ItemId, SaveRequest};
use seqlink::storage::{ContentRepository, SharedContentRepository, SqliteContentRepository};

use crate::common::{create_news_post, create_post, create_state, create_test_repos, test_config};

async fn post_json(state: AppState, uri: &str, body: &str) -> StatusCode {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    create_router(state).oneshot(request).await.unwrap().status()
}

// ============================================================================
// Allocation
// ============================================================================

#[tokio::test]
async fn test_probe_exhaustion_is_server_error() {
    for repo in create_test_repos() {
        let mut config = test_config();
        config.permalink = config.permalink.with_max_probe(2);
        let state = create_state(config, repo.clone());
        repo.put_item(&create_news_post(10, 1)).unwrap();
        repo.put_item(&create_news_post(11, 2)).unwrap();
        repo.put_item(&create_post(12, &[1])).unwrap();

        let status = post_json(state, "/api/items/12/save", r#"{"manual_sequence": 1}"#).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);

        // Nothing was written for the failed save
        assert!(repo.get_item_meta(ItemId(12), "cat_seq_1").unwrap().is_none());
    }
}

// ============================================================================
// Malformed requests
// ============================================================================

#[tokio::test]
async fn test_malformed_save_body_is_rejected() {
    for repo in create_test_repos() {
        let state = create_state(test_config(), repo.clone());
        repo.put_item(&create_post(10, &[1])).unwrap();

        for body in ["{not json", r#"{"manual_sequence": "seven"}"#] {
            let status = post_json(state.clone(), "/api/items/10/save", body).await;
            assert!(status.is_client_error(), "{body}: got {status}");
        }
        assert!(repo.get_item_meta(ItemId(10), "cat_seq_1").unwrap().is_none());
    }
}

#[tokio::test]
async fn test_non_numeric_item_id_is_rejected() {
    for repo in create_test_repos() {
        let state = create_state(test_config(), repo);
        let status = post_json(state, "/api/items/abc/save", "{}").await;
        assert!(status.is_client_error());
    }
}

// ============================================================================
// Configuration
// ============================================================================

#[test]
fn test_invalid_config_is_rejected_by_server() {
    let repo: SharedContentRepository = Arc::new(SqliteContentRepository::in_memory().unwrap());

    let mut config = test_config();
    config.site.base_url = "not a url".to_string();
    assert!(matches!(
        PermalinkServer::new(config, repo.clone()),
        Err(ServerError::ConfigError(_))
    ));

    let mut config = test_config();
    config.permalink.max_probe = 0;
    assert!(matches!(
        PermalinkServer::new(config, repo),
        Err(ServerError::ConfigError(_))
    ));
}

// ============================================================================
// Persistence
// ============================================================================

#[test]
fn test_sequences_survive_reopen() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("data").join("seqlink.db");

    {
        let repo: SharedContentRepository = Arc::new(SqliteContentRepository::new(&path).unwrap());
        let state = create_state(test_config(), repo.clone());
        repo.put_item(&create_post(10, &[1])).unwrap();
        let outcome = state
            .lifecycle
            .on_item_saved(ItemId(10), &SaveRequest::none())
            .unwrap()
            .unwrap();
        assert_eq!(outcome.sequence, Some(1));
    }

    let repo: SharedContentRepository = Arc::new(SqliteContentRepository::new(&path).unwrap());
    let state = create_state(test_config(), repo.clone());
    assert_eq!(
        repo.get_item_meta(ItemId(10), "cat_seq_1").unwrap().as_deref(),
        Some("1")
    );

    // A new item continues after the persisted maximum
    repo.put_item(&create_post(11, &[1])).unwrap();
    let outcome = state
        .lifecycle
        .on_item_saved(ItemId(11), &SaveRequest::none())
        .unwrap()
        .unwrap();
    assert_eq!(outcome.sequence, Some(2));
}

#[test]
fn test_connections_sharing_a_file_never_duplicate_sequences() {
    const ROUNDS: u64 = 40;

    let dir = TempDir::new().unwrap();
    let path = dir.path().join("seqlink.db");
    let first: SharedContentRepository = Arc::new(SqliteContentRepository::new(&path).unwrap());
    let second: SharedContentRepository = Arc::new(SqliteContentRepository::new(&path).unwrap());

    // Separate states share no in-process locks, like the CLI beside a server
    let states = [
        create_state(test_config(), first.clone()),
        create_state(test_config(), second),
    ];

    for round in 0..ROUNDS {
        let ids = [100 + round * 2, 101 + round * 2];
        for id in ids {
            first.put_item(&create_post(id, &[1])).unwrap();
        }

        let barrier = Arc::new(Barrier::new(2));
        let handles: Vec<_> = states
            .iter()
            .cloned()
            .zip(ids)
            .map(|(state, id)| {
                let barrier = barrier.clone();
                thread::spawn(move || {
                    barrier.wait();
                    state
                        .lifecycle
                        .on_item_saved(ItemId(id), &SaveRequest::none())
                        .unwrap()
                        .unwrap()
                        .sequence
                })
            })
            .collect();

        let mut assigned: Vec<u64> = handles
            .into_iter()
            .map(|handle| handle.join().unwrap().unwrap())
            .collect();
        assigned.sort_unstable();
        assert_eq!(assigned, vec![round * 2 + 1, round * 2 + 2], "round {round}");
    }

    let holders = first.get_items_with_meta_key("cat_seq_1").unwrap();
    let numbers: BTreeSet<u64> = holders.iter().map(|(_, n)| *n).collect();
    assert_eq!(holders.len() as u64, ROUNDS * 2);
    assert_eq!(numbers, (1..=ROUNDS * 2).collect());
}
