//! Test fixtures for integration tests
//!
//! Provides a sample content import used across the HTTP and routing tests

#![allow(dead_code)]

/// Categories `news` (1), `column` (2), `legacy` (3) and a handful of items
///
/// - 10: post in news
/// - 11: post in news and column
/// - 12: post in column
/// - 20: page `about`
pub const SAMPLE_IMPORT_JSON: &str = r#"{
    "categories": [
        { "id": 1, "slug": "news", "name": "News" },
        { "id": 2, "slug": "column", "name": "Column" },
        { "id": 3, "slug": "legacy", "name": "Legacy" }
    ],
    "items": [
        { "id": 10, "item_type": "post", "slug": "first-story", "title": "First story", "categories": [1] },
        { "id": 11, "item_type": "post", "slug": "second-story", "title": "Second story", "categories": [2, 1] },
        { "id": 12, "item_type": "post", "slug": "opinion", "title": "Opinion", "categories": [2] },
        { "id": 20, "item_type": "page", "slug": "about", "title": "About", "categories": [] }
    ]
}"#;

/// Item IDs of the posts in [`SAMPLE_IMPORT_JSON`]
pub const SAMPLE_POSTS: [u64; 3] = [10, 11, 12];
