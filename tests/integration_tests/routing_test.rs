//! Route resolution tests

use seqlink::http::AppState;
use seqlink::models::{CategoryId, ItemId};
use seqlink::routing::{RequestContext, RouteError, RouteOutcome};
use seqlink::storage::ContentRepository;

use crate::common::{create_news_post, create_post, create_state, create_test_repos, test_config};

fn resolve(state: &AppState, target: &str) -> RouteOutcome {
    let ctx = RequestContext::parse(target, state.base_path());
    state.resolver.resolve(&ctx).unwrap()
}

fn served_id(outcome: &RouteOutcome) -> Option<ItemId> {
    outcome.item().map(|item| item.id)
}

#[test]
fn test_sequence_route_serves_holder() {
    for repo in create_test_repos() {
        let state = create_state(test_config(), repo.clone());
        repo.put_item(&create_news_post(10, 7)).unwrap();

        assert_eq!(served_id(&resolve(&state, "/news/7/")), Some(ItemId(10)));
        assert_eq!(served_id(&resolve(&state, "/news/7")), Some(ItemId(10)));
    }
}

#[test]
fn test_sequence_route_404s() {
    for repo in create_test_repos() {
        let state = create_state(test_config(), repo.clone());
        repo.put_item(&create_news_post(10, 7)).unwrap();

        assert_eq!(
            resolve(&state, "/news/8/"),
            RouteOutcome::Terminal(RouteError::ItemNotFoundForSequence {
                category: CategoryId(1),
                sequence: 8,
            })
        );
        assert_eq!(
            resolve(&state, "/sports/7/"),
            RouteOutcome::Terminal(RouteError::CategoryNotFound {
                slug: "sports".to_string()
            })
        );
    }
}

#[test]
fn test_detached_holder_is_not_served() {
    for repo in create_test_repos() {
        let state = create_state(test_config(), repo.clone());
        // Holds news sequence 4 but is no longer attached to news
        let item = create_post(10, &[2]).with_meta("cat_seq_1", "4");
        repo.put_item(&item).unwrap();

        assert!(matches!(
            resolve(&state, "/news/4/"),
            RouteOutcome::Terminal(RouteError::ItemNotFoundForSequence { .. })
        ));
    }
}

#[test]
fn test_slug_override_resolves_and_is_canonical() {
    for repo in create_test_repos() {
        let mut config = test_config();
        config.permalink = config.permalink.with_slug_override("news", "topics");
        let state = create_state(config, repo.clone());
        repo.put_item(&create_news_post(10, 7)).unwrap();

        assert_eq!(served_id(&resolve(&state, "/topics/7/")), Some(ItemId(10)));
        assert_eq!(
            state.permalinks.build_for(ItemId(10)).unwrap().unwrap().as_str(),
            "https://example.com/topics/7/"
        );

        // The real slug still finds the item, then moves to the alias
        assert_eq!(
            resolve(&state, "/news/7/?utm=x"),
            RouteOutcome::Terminal(RouteError::CanonicalRedirect {
                location: "https://example.com/topics/7/?utm=x".to_string()
            })
        );
    }
}

#[test]
fn test_canonical_url_never_redirects_to_itself() {
    for repo in create_test_repos() {
        let state = create_state(test_config(), repo.clone());
        repo.put_item(&create_news_post(10, 7)).unwrap();

        for _ in 0..3 {
            assert_eq!(served_id(&resolve(&state, "/news/7/?utm=x")), Some(ItemId(10)));
        }
        assert_eq!(served_id(&resolve(&state, "/News/7/")), Some(ItemId(10)));
    }
}

#[test]
fn test_non_primary_sequence_redirects_to_primary_permalink() {
    for repo in create_test_repos() {
        let state = create_state(test_config(), repo.clone());
        // Primary is news (smallest id); column 3 is a historical assignment
        let item = create_post(10, &[1, 2])
            .with_meta("cat_seq_1", "5")
            .with_meta("cat_seq_2", "3");
        repo.put_item(&item).unwrap();

        assert_eq!(
            resolve(&state, "/column/3/"),
            RouteOutcome::Terminal(RouteError::CanonicalRedirect {
                location: "https://example.com/news/5/".to_string()
            })
        );
    }
}

#[test]
fn test_legacy_slug_url_redirects_to_canonical() {
    for repo in create_test_repos() {
        let state = create_state(test_config(), repo.clone());
        repo.put_item(&create_news_post(10, 7)).unwrap();

        assert_eq!(
            resolve(&state, "/post-10/?ref=feed"),
            RouteOutcome::Terminal(RouteError::CanonicalRedirect {
                location: "https://example.com/news/7/?ref=feed".to_string()
            })
        );
    }
}

#[test]
fn test_retired_paths_are_gone() {
    for repo in create_test_repos() {
        let state = create_state(test_config(), repo);

        for target in ["/tag/rust/page/2/", "/category/news/page/3/"] {
            match resolve(&state, target) {
                RouteOutcome::Terminal(RouteError::RetiredPath { message, .. }) => {
                    assert!(message.contains("permanently removed"));
                }
                other => panic!("{target}: expected 410, got {other:?}"),
            }
        }
    }
}

#[test]
fn test_stale_category_outside_allowed_set_redirects_home() {
    for repo in create_test_repos() {
        let mut config = test_config();
        config.permalink = config.permalink.with_allowed_category("news");
        let state = create_state(config, repo.clone());

        assert_eq!(
            resolve(&state, "/discontinued/12/"),
            RouteOutcome::Terminal(RouteError::LegacyPathRedirect {
                location: "https://example.com/".to_string()
            })
        );

        // Existing but disallowed category is left alone
        assert_eq!(resolve(&state, "/column/12/"), RouteOutcome::PassThrough);
    }
}

#[test]
fn test_allowlist_entries_match_regardless_of_case() {
    for repo in create_test_repos() {
        let mut config = test_config();
        config.permalink = config.permalink.with_allowed_category("News");
        let state = create_state(config, repo.clone());
        repo.put_item(&create_news_post(10, 7)).unwrap();

        assert_eq!(served_id(&resolve(&state, "/news/7/")), Some(ItemId(10)));
        assert_eq!(
            state.permalinks.build_for(ItemId(10)).unwrap().unwrap().as_str(),
            "https://example.com/news/7/"
        );
    }
}

#[test]
fn test_sequence_shaped_paths_never_reach_redirect_rules() {
    for repo in create_test_repos() {
        let state = create_state(test_config(), repo);

        assert_eq!(
            resolve(&state, "/search/2/"),
            RouteOutcome::Terminal(RouteError::CategoryNotFound {
                slug: "search".to_string()
            })
        );
        assert_eq!(
            resolve(&state, "/search/rust/"),
            RouteOutcome::Terminal(RouteError::LegacyPathRedirect {
                location: "https://example.com/".to_string()
            })
        );
    }
}

#[test]
fn test_computed_category_redirect() {
    for repo in create_test_repos() {
        let state = create_state(test_config(), repo);

        assert_eq!(
            resolve(&state, "/category-column/4/some-title/"),
            RouteOutcome::Terminal(RouteError::LegacyPathRedirect {
                location: "https://example.com/category/column/".to_string()
            })
        );
        // With every category allowed, any `<slug>/<n>` is a sequence route
        assert!(matches!(
            resolve(&state, "/category-column/4/"),
            RouteOutcome::Terminal(RouteError::CategoryNotFound { .. })
        ));
    }
}

#[test]
fn test_legacy_numbered_category_path_with_allowed_set() {
    for repo in create_test_repos() {
        let mut config = test_config();
        config.permalink = config.permalink.with_allowed_category("news");
        let state = create_state(config, repo);

        assert_eq!(
            resolve(&state, "/category-column/4/"),
            RouteOutcome::Terminal(RouteError::LegacyPathRedirect {
                location: "https://example.com/".to_string()
            })
        );
    }
}

#[test]
fn test_subdirectory_install() {
    for repo in create_test_repos() {
        let mut config = test_config();
        config.site.base_url = "https://example.com/blog/".to_string();
        let state = create_state(config, repo.clone());
        repo.put_item(&create_news_post(10, 7)).unwrap();

        assert_eq!(served_id(&resolve(&state, "/blog/news/7/")), Some(ItemId(10)));
        assert_eq!(
            resolve(&state, "/blog/nothing-here/"),
            RouteOutcome::Terminal(RouteError::LegacyPathRedirect {
                location: "https://example.com/blog/".to_string()
            })
        );
    }
}
