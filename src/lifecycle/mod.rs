//! Save and delete event handlers
//!
//! The content system calls these after its own write has committed
//! (autosaves and revisions already filtered out). Delete handlers are
//! idempotent and safe to run against already-clean state.

use std::sync::Arc;

use crate::config::PermalinkConfig;
use crate::error::Result;
use crate::models::{CategoryId, ItemId, SaveOutcome, SaveRequest};
use crate::permalink::PermalinkBuilder;
use crate::sequence::{SequenceAllocator, SequenceError};
use crate::storage::{ImportData, ImportSummary, SharedContentRepository};

/// Reacts to item and category lifecycle events
pub struct LifecycleHandler {
    repo: SharedContentRepository,
    config: PermalinkConfig,
    allocator: Arc<SequenceAllocator>,
    permalinks: Arc<PermalinkBuilder>,
}

impl LifecycleHandler {
    /// Create a handler
    pub fn new(
        repo: SharedContentRepository,
        config: &PermalinkConfig,
        allocator: Arc<SequenceAllocator>,
        permalinks: Arc<PermalinkBuilder>,
    ) -> Self {
        Self {
            repo,
            config: config.clone(),
            allocator,
            permalinks,
        }
    }

    /// Sequence allocator
    pub fn allocator(&self) -> &SequenceAllocator {
        &self.allocator
    }

    /// Apply manual overrides and make sure the item holds a sequence
    ///
    /// Returns `None` for item types that do not receive sequences.
    pub fn on_item_saved(&self, id: ItemId, request: &SaveRequest) -> Result<Option<SaveOutcome>> {
        let Some(item) = self.repo.get_item(id)? else {
            return Err(SequenceError::ItemNotFound(id).into());
        };

        if !self.config.is_target_type(&item.item_type) {
            tracing::debug!(item_id = %id, item_type = %item.item_type, "Not a target type, skipping");
            return Ok(None);
        }

        if let Some(primary) = request.primary_category {
            if item.has_category(primary) {
                self.repo
                    .update_item_meta(id, &self.config.primary_meta_key, &primary.to_string())?;
                tracing::info!(item_id = %id, category_id = %primary, "Stored primary category");
            } else {
                tracing::debug!(
                    item_id = %id,
                    category_id = %primary,
                    "Requested primary category is not attached, ignoring"
                );
            }
        }

        // Reload so the resolver sees the override just written
        let Some(item) = self.repo.get_item(id)? else {
            return Err(SequenceError::ItemNotFound(id).into());
        };

        let Some(category) = self.permalinks.primary().resolve(&item)? else {
            return Ok(Some(SaveOutcome::default()));
        };

        if !self.config.is_allowed_slug(&category.slug) {
            tracing::debug!(item_id = %id, slug = %category.slug, "Primary category not allowed");
            return Ok(Some(SaveOutcome {
                primary: Some(category.id),
                ..SaveOutcome::default()
            }));
        }

        let sequence = match request.manual_sequence.filter(|n| *n > 0) {
            Some(preferred) => self.allocator.claim_manual(category.id, id, preferred)?,
            None => self.allocator.claim_auto(category.id, id)?,
        };

        let permalink = self.permalinks.build_for(id)?.map(|url| url.to_string());

        Ok(Some(SaveOutcome {
            primary: Some(category.id),
            sequence: Some(sequence),
            permalink,
        }))
    }

    /// Load categories and items without breaking sequence uniqueness
    ///
    /// Sequence metadata an item already holds survives unless the import
    /// names that category. Imported sequence values are claimed like a
    /// manual override, so one held by another item slides upward.
    pub fn import(&self, data: &ImportData) -> Result<ImportSummary> {
        for category in &data.categories {
            self.repo.put_category(category)?;
        }

        let keys = self.allocator.keys();
        let mut summary = ImportSummary {
            categories: data.categories.len(),
            ..ImportSummary::default()
        };

        for incoming in &data.items {
            let mut item = incoming.clone();
            let id = item.id;
            let mut requested = Vec::new();
            item.meta.retain(|key, value| match keys.parse(key) {
                Some(category) => {
                    match value.trim().parse::<i64>() {
                        Ok(n) if n > 0 => requested.push((category, n)),
                        _ => tracing::warn!(
                            item_id = %id,
                            key = %key,
                            value = %value,
                            "Ignoring invalid imported sequence"
                        ),
                    }
                    false
                }
                None => true,
            });

            if let Some(existing) = self.repo.get_item(item.id)? {
                for (key, value) in existing.meta {
                    if keys.parse(&key).is_some() {
                        item.meta.entry(key).or_insert(value);
                    }
                }
            }
            self.repo.put_item(&item)?;

            for (category, preferred) in requested {
                let sequence = self.allocator.claim_manual(category, item.id, preferred)?;
                if sequence as i64 != preferred {
                    summary.reassigned += 1;
                    tracing::warn!(
                        item_id = %item.id,
                        category_id = %category,
                        preferred,
                        sequence,
                        "Imported sequence already held, reassigned"
                    );
                }
            }
            summary.items.push(item.id);
        }

        tracing::info!(
            categories = summary.categories,
            items = summary.items.len(),
            reassigned = summary.reassigned,
            "Imported content"
        );
        Ok(summary)
    }

    /// Remove every sequence the item holds, across all categories
    pub fn on_item_deleted(&self, id: ItemId) -> Result<usize> {
        self.allocator.release_item(id)
    }

    /// Remove every sequence scoped to the category, across all items
    pub fn on_category_deleted(&self, id: CategoryId) -> Result<usize> {
        self.allocator.release_category(id)
    }

    /// Release an item's sequences, then delete it; returns whether it existed
    pub fn delete_item(&self, id: ItemId) -> Result<bool> {
        let released = self.on_item_deleted(id)?;
        let existed = self.repo.delete_item(id)?;
        tracing::info!(item_id = %id, released, existed, "Deleted item");
        Ok(existed)
    }

    /// Delete a category, then release its sequences; returns whether it existed
    pub fn delete_category(&self, id: CategoryId) -> Result<bool> {
        let existed = self.repo.delete_category(id)?;
        let released = self.on_category_deleted(id)?;
        tracing::info!(category_id = %id, released, existed, "Deleted category");
        Ok(existed)
    }
}
