//! Per-category sequence allocation
//!
//! Sequences are stored as item metadata under `{prefix}{category_id}`.
//! Every read and write runs inside a [`ContentRepository::sequence_span`],
//! which holds the store's write lock, so a read-max-then-write (auto) or
//! probe-then-write (manual) is never interleaved with another writer, even
//! one in a different process. The per-category lock additionally keeps
//! threads of this process queued per category instead of contending on the
//! store lock.
//!
//! [`ContentRepository::sequence_span`]: crate::storage::ContentRepository::sequence_span

use std::collections::BTreeSet;

use crate::config::PermalinkConfig;
use crate::error::{Error, Result};
use crate::models::{CategoryId, ItemId};
use crate::storage::{SequenceTxn, SharedContentRepository};

use super::error::SequenceError;
use super::locks::{CategoryGuard, CategoryLocks};

/// Largest sequence the SQLite backend can store
const MAX_SEQUENCE: u64 = i64::MAX as u64;

// ============================================================================
// Sequence Keys
// ============================================================================

/// Builds and parses sequence metadata keys
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequenceKeys {
    prefix: String,
}

impl SequenceKeys {
    /// Create with a key prefix (e.g. `cat_seq_`)
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// Metadata key holding an item's sequence in `category`
    pub fn key_for(&self, category: CategoryId) -> String {
        format!("{}{}", self.prefix, category.0)
    }

    /// Category a sequence key belongs to, if `key` is one
    pub fn parse(&self, key: &str) -> Option<CategoryId> {
        key.strip_prefix(&self.prefix)?
            .parse::<u64>()
            .ok()
            .map(CategoryId)
    }

    /// Key prefix
    pub fn prefix(&self) -> &str {
        &self.prefix
    }
}

// ============================================================================
// Sequence Allocator
// ============================================================================

/// Assigns, validates and releases per-category sequence numbers
pub struct SequenceAllocator {
    repo: SharedContentRepository,
    keys: SequenceKeys,
    max_probe: u32,
    locks: CategoryLocks,
}

impl SequenceAllocator {
    /// Create an allocator over a content repository
    pub fn new(repo: SharedContentRepository, config: &PermalinkConfig) -> Self {
        Self {
            repo,
            keys: SequenceKeys::new(config.sequence_meta_prefix.clone()),
            max_probe: config.max_probe,
            locks: CategoryLocks::new(),
        }
    }

    /// Sequence key helper
    pub fn keys(&self) -> &SequenceKeys {
        &self.keys
    }

    /// `max(existing) + 1` for the category, or 1 when nothing is assigned
    ///
    /// Numbers freed by deletion are never reused. Every holder of the key
    /// counts, including items no longer attached to the category, so a
    /// re-attached item cannot collide with a fresh allocation.
    pub fn next_auto_sequence(&self, category: CategoryId) -> Result<u64> {
        self.span(|txn| self.next_auto_in(txn, category))
    }

    /// First slot at or above `max(1, preferred)` that is free or held only by `exclude`
    pub fn find_available_sequence(
        &self,
        category: CategoryId,
        preferred: i64,
        exclude: Option<ItemId>,
    ) -> Result<u64> {
        self.span(|txn| self.find_available_in(txn, category, preferred, exclude))
    }

    /// Sequence currently held by `item` in `category`
    pub fn current_sequence(&self, category: CategoryId, item: ItemId) -> Result<Option<u64>> {
        self.span(|txn| self.current_in(txn, category, item))
    }

    /// Give `item` a sequence in `category` unless it already holds one
    ///
    /// Returns the sequence the item holds afterwards.
    pub fn claim_auto(&self, category: CategoryId, item: ItemId) -> Result<u64> {
        let _guard = self.locks.acquire(category);

        let (sequence, assigned) = self.span(|txn| {
            if let Some(existing) = self.current_in(txn, category, item)? {
                return Ok((existing, false));
            }
            let sequence = self.next_auto_in(txn, category)?;
            self.write(txn, category, item, sequence)?;
            Ok((sequence, true))
        })?;

        if assigned {
            tracing::info!(
                category_id = %category,
                item_id = %item,
                sequence,
                "Assigned sequence"
            );
        }
        Ok(sequence)
    }

    /// Give `item` the first free sequence at or above `preferred`
    pub fn claim_manual(&self, category: CategoryId, item: ItemId, preferred: i64) -> Result<u64> {
        let _guard = self.locks.acquire(category);

        let sequence = self.span(|txn| {
            let sequence = self.find_available_in(txn, category, preferred, Some(item))?;
            self.write(txn, category, item, sequence)?;
            Ok(sequence)
        })?;

        if sequence as i64 != preferred {
            tracing::info!(
                category_id = %category,
                item_id = %item,
                preferred,
                sequence,
                "Requested sequence taken, slid to next free slot"
            );
        } else {
            tracing::info!(category_id = %category, item_id = %item, sequence, "Set manual sequence");
        }
        Ok(sequence)
    }

    /// Delete the (category, item) assignment if present
    pub fn release_sequence(&self, category: CategoryId, item: ItemId) -> Result<()> {
        let _guard = self.locks.acquire(category);
        let key = self.keys.key_for(category);
        self.span(|txn| txn.delete_meta(item, &key))
    }

    /// Delete every assignment scoped to `category`; returns how many were removed
    pub fn release_category(&self, category: CategoryId) -> Result<usize> {
        let _guard = self.locks.acquire(category);
        let key = self.keys.key_for(category);

        let removed = self.span(|txn| {
            let holders = txn.items_with_meta_key(&key)?;
            for (item, _) in &holders {
                txn.delete_meta(*item, &key)?;
            }
            Ok(holders.len())
        })?;

        tracing::info!(category_id = %category, removed, "Released category sequences");
        Ok(removed)
    }

    /// Delete every sequence key `item` holds, across all categories
    pub fn release_item(&self, item: ItemId) -> Result<usize> {
        let categories: BTreeSet<CategoryId> = self
            .repo
            .item_meta_keys(item)?
            .iter()
            .filter_map(|key| self.keys.parse(key))
            .collect();
        // Ascending order, same as every other multi-category holder
        let _guards: Vec<CategoryGuard> =
            categories.iter().map(|c| self.locks.acquire(*c)).collect();

        let removed = self.span(|txn| {
            let mut removed = 0;
            for key in txn.meta_keys(item)? {
                if self.keys.parse(&key).is_some() {
                    txn.delete_meta(item, &key)?;
                    removed += 1;
                }
            }
            Ok(removed)
        })?;

        tracing::info!(item_id = %item, removed, "Released item sequences");
        Ok(removed)
    }

    /// Run `body` inside one exclusive repository span and hand back its value
    fn span<T>(&self, mut body: impl FnMut(&mut dyn SequenceTxn) -> Result<T>) -> Result<T> {
        let mut out = None;
        self.repo.sequence_span(&mut |txn| {
            out = Some(body(txn)?);
            Ok(())
        })?;
        out.ok_or_else(|| Error::Other("sequence span returned without running".to_string()))
    }

    fn next_auto_in(&self, txn: &dyn SequenceTxn, category: CategoryId) -> Result<u64> {
        let key = self.keys.key_for(category);
        let max = txn
            .items_with_meta_key(&key)?
            .into_iter()
            .map(|(_, seq)| seq)
            .max()
            .unwrap_or(0);

        let next = max.checked_add(1).filter(|n| *n <= MAX_SEQUENCE);
        Ok(next.ok_or(SequenceError::Overflow { category })?)
    }

    fn find_available_in(
        &self,
        txn: &dyn SequenceTxn,
        category: CategoryId,
        preferred: i64,
        exclude: Option<ItemId>,
    ) -> Result<u64> {
        let key = self.keys.key_for(category);
        let start = preferred.max(1) as u64;
        let mut candidate = start;

        for _ in 0..self.max_probe {
            let holders = txn.items_by_meta_value(&key, candidate)?;
            let free = match exclude {
                Some(item) => holders.iter().all(|h| *h == item),
                None => holders.is_empty(),
            };
            if free {
                return Ok(candidate);
            }

            candidate = candidate
                .checked_add(1)
                .filter(|n| *n <= MAX_SEQUENCE)
                .ok_or(SequenceError::Overflow { category })?;
        }

        tracing::error!(
            category_id = %category,
            preferred = start,
            attempts = self.max_probe,
            "Sequence probe exhausted"
        );

        Err(SequenceError::ProbeExhausted {
            category,
            preferred: start,
            attempts: self.max_probe,
        }
        .into())
    }

    fn current_in(
        &self,
        txn: &dyn SequenceTxn,
        category: CategoryId,
        item: ItemId,
    ) -> Result<Option<u64>> {
        let key = self.keys.key_for(category);
        Ok(txn
            .get_meta(item, &key)?
            .and_then(|v| v.trim().parse::<u64>().ok())
            .filter(|v| *v > 0))
    }

    fn write(
        &self,
        txn: &mut dyn SequenceTxn,
        category: CategoryId,
        item: ItemId,
        sequence: u64,
    ) -> Result<()> {
        if !txn.item_exists(item)? {
            return Err(SequenceError::ItemNotFound(item).into());
        }
        txn.set_meta(item, &self.keys.key_for(category), &sequence.to_string())
    }
}

// ============================================================================
// Tests
// ============================================================================
