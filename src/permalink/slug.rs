//! Category slug aliases
//!
//! A slug override exposes a category under a different URL segment
//! (`news` -> `topics`). Outbound links use the alias; inbound lookups try the
//! real slug first and then the reverse alias table.

use std::collections::BTreeMap;

use crate::config::PermalinkConfig;
use crate::error::Result;
use crate::models::Category;
use crate::storage::ContentRepository;

/// Bidirectional slug <-> alias table
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SlugMap {
    aliases: BTreeMap<String, String>,
    reverse: BTreeMap<String, String>,
}

impl SlugMap {
    /// Build from `real slug -> alias` pairs; empty entries are skipped
    pub fn new<'a>(overrides: impl IntoIterator<Item = (&'a String, &'a String)>) -> Self {
        let mut map = Self::default();
        for (slug, alias) in overrides {
            let slug = sanitize_slug(slug);
            let alias = sanitize_slug(alias);
            if slug.is_empty() || alias.is_empty() {
                continue;
            }
            map.reverse.insert(alias.clone(), slug.clone());
            map.aliases.insert(slug, alias);
        }
        map
    }

    /// Build from the permalink configuration
    pub fn from_config(config: &PermalinkConfig) -> Self {
        Self::new(&config.slug_overrides)
    }

    /// URL-facing segment for a real slug
    pub fn display_slug<'a>(&'a self, slug: &'a str) -> &'a str {
        self.aliases.get(slug).map(String::as_str).unwrap_or(slug)
    }

    /// Real slug behind an alias
    pub fn real_slug(&self, alias: &str) -> Option<&str> {
        self.reverse.get(alias).map(String::as_str)
    }

    /// Whether a URL segment names an allowed category, directly or through its alias
    pub fn is_allowed_segment(&self, config: &PermalinkConfig, segment: &str) -> bool {
        config.is_allowed_slug(segment)
            || self
                .real_slug(segment)
                .is_some_and(|slug| config.is_allowed_slug(slug))
    }

    /// Resolve a URL segment to a category: direct slug first, then alias
    pub fn resolve_category(
        &self,
        repo: &dyn ContentRepository,
        segment: &str,
    ) -> Result<Option<Category>> {
        let segment = sanitize_slug(segment);
        if segment.is_empty() {
            return Ok(None);
        }

        if let Some(category) = repo.get_category_by_slug(&segment)? {
            return Ok(Some(category));
        }

        match self.real_slug(&segment) {
            Some(slug) => repo.get_category_by_slug(slug),
            None => Ok(None),
        }
    }

    /// Number of configured aliases
    pub fn len(&self) -> usize {
        self.aliases.len()
    }

    /// Check if there are no aliases
    pub fn is_empty(&self) -> bool {
        self.aliases.is_empty()
    }
}

/// Trim surrounding slashes and whitespace, lowercase
pub fn sanitize_slug(raw: &str) -> String {
    raw.trim().trim_matches('/').trim().to_lowercase()
}
