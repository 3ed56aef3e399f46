//! Seed the content store from a JSON document
//!
//! ```json
//! {
//!   "categories": [{ "id": 1, "slug": "news", "name": "News" }],
//!   "items": [{ "id": 10, "item_type": "post", "slug": "hello", "title": "Hello", "categories": [1] }]
//! }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::models::{Category, Item, ItemId};

/// Categories and items to load
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImportData {
    #[serde(default)]
    pub categories: Vec<Category>,
    #[serde(default)]
    pub items: Vec<Item>,
}

/// What an import wrote
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub categories: usize,
    pub items: Vec<ItemId>,
    /// Imported sequences that were taken and slid to the next free slot
    pub reassigned: usize,
}

impl ImportData {
    /// Parse from a JSON string
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read and parse a JSON import file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }
}
