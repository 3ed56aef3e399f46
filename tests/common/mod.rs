//! Common test utilities

#![allow(dead_code)]

use std::sync::Arc;

use seqlink::config::Config;
use seqlink::http::AppState;
use seqlink::models::{Category, CategoryId, Item};
use seqlink::storage::{
    ContentRepository, MockContentRepository, SharedContentRepository, SqliteContentRepository,
};

pub const BASE_URL: &str = "https://example.com/";

/// Both repository backends, fresh and empty
pub fn create_test_repos() -> Vec<SharedContentRepository> {
    vec![
        Arc::new(SqliteContentRepository::in_memory().unwrap()),
        Arc::new(MockContentRepository::new()),
    ]
}

/// Default configuration pointed at [`BASE_URL`]
pub fn test_config() -> Config {
    let mut config = Config::default();
    config.site.base_url = BASE_URL.to_string();
    config
}

/// Categories 1 `news` and 2 `column`
pub fn seed_categories(repo: &dyn ContentRepository) {
    repo.put_category(&Category::new(1, "news", "News")).unwrap();
    repo.put_category(&Category::new(2, "column", "Column")).unwrap();
}

/// A post attached to the given categories
pub fn create_post(id: u64, categories: &[u64]) -> Item {
    categories
        .iter()
        .fold(Item::new(id, "post", format!("post-{id}")), |item, c| {
            item.with_category(CategoryId(*c))
        })
}

/// A post in `news` already holding `sequence`
pub fn create_news_post(id: u64, sequence: u64) -> Item {
    create_post(id, &[1]).with_meta("cat_seq_1", sequence.to_string())
}

/// Application state over a seeded repository
pub fn create_state(config: Config, repo: SharedContentRepository) -> AppState {
    seed_categories(repo.as_ref());
    AppState::new(config, repo).unwrap()
}
