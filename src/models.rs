// Core data structures for seqlink

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Category (taxonomy term) identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CategoryId(pub u64);

/// Content item identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(pub u64);

impl fmt::Display for CategoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for CategoryId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(Self)
    }
}

impl FromStr for ItemId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(Self)
    }
}

/// A classification node with a unique slug
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub slug: String,
    pub name: String,
}

impl Category {
    /// Create a category
    pub fn new(id: u64, slug: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: CategoryId(id),
            slug: slug.into(),
            name: name.into(),
        }
    }
}

/// A content unit attached to zero or more categories
///
/// `meta` holds the item's key/value metadata as stored by the content
/// repository, including the primary-category override and the per-category
/// sequence assignments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    /// Item type (e.g. `post`, `page`)
    pub item_type: String,
    /// Path slug used by generic (non-sequence) resolution
    pub slug: String,
    pub title: String,
    #[serde(default)]
    pub categories: Vec<CategoryId>,
    #[serde(default)]
    pub meta: BTreeMap<String, String>,
}

impl Item {
    /// Create an item of the given type with no categories
    pub fn new(id: u64, item_type: impl Into<String>, slug: impl Into<String>) -> Self {
        let slug = slug.into();
        Self {
            id: ItemId(id),
            item_type: item_type.into(),
            title: slug.clone(),
            slug,
            categories: Vec::new(),
            meta: BTreeMap::new(),
        }
    }

    /// Attach a category
    pub fn with_category(mut self, category: CategoryId) -> Self {
        if !self.categories.contains(&category) {
            self.categories.push(category);
        }
        self
    }

    /// Set the title
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Set a metadata entry
    pub fn with_meta(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.meta.insert(key.into(), value.into());
        self
    }

    /// Check whether a category is attached
    pub fn has_category(&self, category: CategoryId) -> bool {
        self.categories.contains(&category)
    }

    /// Read a metadata value as a positive integer
    ///
    /// Missing, empty, non-numeric and zero values all read as `None`.
    pub fn meta_u64(&self, key: &str) -> Option<u64> {
        self.meta
            .get(key)
            .and_then(|v| v.trim().parse::<u64>().ok())
            .filter(|v| *v > 0)
    }
}

/// Manual overrides submitted with an item save
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveRequest {
    /// Requested primary category (ignored unless attached to the item)
    #[serde(default)]
    pub primary_category: Option<CategoryId>,

    /// Requested sequence number; collisions slide upward
    #[serde(default)]
    pub manual_sequence: Option<i64>,
}

impl SaveRequest {
    /// Save with no manual overrides
    pub fn none() -> Self {
        Self::default()
    }

    /// Request a primary category
    pub fn with_primary(mut self, category: CategoryId) -> Self {
        self.primary_category = Some(category);
        self
    }

    /// Request a manual sequence
    pub fn with_sequence(mut self, sequence: i64) -> Self {
        self.manual_sequence = Some(sequence);
        self
    }
}

/// Result of processing an item save
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveOutcome {
    pub primary: Option<CategoryId>,
    pub sequence: Option<u64>,
    pub permalink: Option<String>,
}
