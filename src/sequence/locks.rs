//! Per-category allocation locks
//!
//! Threads of one process take the category's lock before opening a store
//! span for it. Spans touching several categories take the locks in
//! ascending category order.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::lock_api::ArcMutexGuard;
use parking_lot::{Mutex, RawMutex};

use crate::models::CategoryId;

/// Lock table keyed by category
#[derive(Default)]
pub struct CategoryLocks {
    locks: Mutex<HashMap<CategoryId, Arc<Mutex<()>>>>,
}

/// Held lock for one category; released on drop
pub struct CategoryGuard {
    category: CategoryId,
    _guard: ArcMutexGuard<RawMutex, ()>,
}

impl CategoryGuard {
    /// Category this guard serializes
    pub fn category(&self) -> CategoryId {
        self.category
    }
}

impl CategoryLocks {
    /// Create an empty lock table
    pub fn new() -> Self {
        Self::default()
    }

    /// Block until the category's lock is held
    pub fn acquire(&self, category: CategoryId) -> CategoryGuard {
        let lock = {
            let mut locks = self.locks.lock();
            Arc::clone(locks.entry(category).or_default())
        };

        CategoryGuard {
            category,
            _guard: lock.lock_arc(),
        }
    }

    /// Number of categories that have been locked at least once
    pub fn len(&self) -> usize {
        self.locks.lock().len()
    }

    /// Check if no category has been locked yet
    pub fn is_empty(&self) -> bool {
        self.locks.lock().is_empty()
    }
}
