//! Primary category resolution
//!
//! The primary category is derived on every call. A stored override wins only
//! while it still names an attached category; otherwise the attached category
//! with the smallest identifier is used.

use crate::error::Result;
use crate::models::{Category, CategoryId, Item};
use crate::storage::SharedContentRepository;

/// Primary category identifier for an item, without touching storage
pub fn primary_category_id(item: &Item, override_key: &str) -> Option<CategoryId> {
    if let Some(stored) = item.meta_u64(override_key).map(CategoryId) {
        if item.has_category(stored) {
            return Some(stored);
        }
        tracing::debug!(
            item_id = %item.id,
            category_id = %stored,
            "Stale primary category override, falling back"
        );
    }

    item.categories.iter().min().copied()
}

/// Resolves an item's primary category to a stored [`Category`]
#[derive(Clone)]
pub struct PrimaryCategoryResolver {
    repo: SharedContentRepository,
    override_key: String,
}

impl PrimaryCategoryResolver {
    /// Create a resolver reading overrides from `override_key`
    pub fn new(repo: SharedContentRepository, override_key: impl Into<String>) -> Self {
        Self {
            repo,
            override_key: override_key.into(),
        }
    }

    /// Metadata key holding the override
    pub fn override_key(&self) -> &str {
        &self.override_key
    }

    /// Primary category of `item`, or `None` when it has no categories
    pub fn resolve(&self, item: &Item) -> Result<Option<Category>> {
        match primary_category_id(item, &self.override_key) {
            Some(id) => self.repo.get_category(id),
            None => Ok(None),
        }
    }
}
