//! Canonical URL construction
//!
//! `{base_url}{display-slug}/{sequence}/`, where the display slug is the
//! primary category's alias when one is configured.

use url::Url;

use crate::config::PermalinkConfig;
use crate::error::Result;
use crate::models::{Category, Item, ItemId};
use crate::sequence::SequenceKeys;
use crate::storage::SharedContentRepository;

use super::primary::PrimaryCategoryResolver;
use super::slug::SlugMap;

/// Builds canonical permalinks for target items
pub struct PermalinkBuilder {
    repo: SharedContentRepository,
    config: PermalinkConfig,
    base_url: Url,
    slugs: SlugMap,
    keys: SequenceKeys,
    primary: PrimaryCategoryResolver,
}

impl PermalinkBuilder {
    /// Create a builder; `base_url` must already end with `/`
    pub fn new(repo: SharedContentRepository, config: &PermalinkConfig, base_url: Url) -> Self {
        Self {
            primary: PrimaryCategoryResolver::new(repo.clone(), config.primary_meta_key.clone()),
            slugs: SlugMap::from_config(config),
            keys: SequenceKeys::new(config.sequence_meta_prefix.clone()),
            config: config.clone(),
            base_url,
            repo,
        }
    }

    /// Site base URL
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Slug alias table
    pub fn slugs(&self) -> &SlugMap {
        &self.slugs
    }

    /// Sequence key helper
    pub fn keys(&self) -> &SequenceKeys {
        &self.keys
    }

    /// Primary category resolver
    pub fn primary(&self) -> &PrimaryCategoryResolver {
        &self.primary
    }

    /// Permalink configuration
    pub fn config(&self) -> &PermalinkConfig {
        &self.config
    }

    /// Site-relative path for a category and sequence
    pub fn path_for(&self, category: &Category, sequence: u64) -> String {
        let segment = self.slugs.display_slug(&category.slug).trim_matches('/');
        format!("{segment}/{sequence}/")
    }

    /// Canonical URL of an item, or `None` when it does not qualify
    ///
    /// An item qualifies when its type is a target type, its primary category
    /// is allowed and it holds a sequence in that category.
    pub fn build(&self, item: &Item) -> Result<Option<Url>> {
        if !self.config.is_target_type(&item.item_type) {
            return Ok(None);
        }

        let Some(category) = self.primary.resolve(item)? else {
            return Ok(None);
        };
        if !self.config.is_allowed_slug(&category.slug) {
            return Ok(None);
        }

        let Some(sequence) = item.meta_u64(&self.keys.key_for(category.id)) else {
            return Ok(None);
        };

        Ok(Some(self.base_url.join(&self.path_for(&category, sequence))?))
    }

    /// Load an item and build its permalink
    pub fn build_for(&self, id: ItemId) -> Result<Option<Url>> {
        match self.repo.get_item(id)? {
            Some(item) => self.build(&item),
            None => Ok(None),
        }
    }
}
