//! Configuration management for seqlink
//!
//! The configuration is loaded once at startup (from a TOML file, the
//! environment, or both) and handed to each component constructor. Nothing in
//! the crate reads configuration from global state.

use anyhow::{Context, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use url::Url;

use crate::permalink::sanitize_slug;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Site configuration
    pub site: SiteConfig,

    /// Permalink and sequence configuration
    pub permalink: PermalinkConfig,

    /// Retired-path and legacy redirect rules
    pub routing: RoutingConfig,

    /// Database configuration
    pub database: DatabaseConfig,

    /// HTTP server configuration
    pub server: ServerConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Site-wide settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    /// Absolute base URL every permalink is resolved against
    pub base_url: String,
}

/// Permalink and sequence allocation settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PermalinkConfig {
    /// Item types that receive sequential permalinks
    pub target_types: Vec<String>,

    /// Category slugs eligible for sequences (empty means all categories)
    pub allowed_categories: Vec<String>,

    /// Real category slug -> URL-facing alias
    pub slug_overrides: BTreeMap<String, String>,

    /// Metadata key holding the explicit primary-category override
    pub primary_meta_key: String,

    /// Metadata key prefix for sequence assignments (`{prefix}{category_id}`)
    pub sequence_meta_prefix: String,

    /// Maximum number of slots probed when resolving a manual sequence
    pub max_probe: u32,
}

/// A retired path pattern served as 410 Gone
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoneRuleConfig {
    pub pattern: String,
    pub message: String,
}

/// A literal legacy redirect
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedirectRuleConfig {
    pub pattern: String,
    /// Absolute URL or site-relative path
    pub destination: String,
}

/// Routing rule configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RoutingConfig {
    /// Ordered retired-path rules (first match wins)
    pub gone: Vec<GoneRuleConfig>,

    /// Ordered literal redirect rules, evaluated when a path does not resolve
    pub redirects: Vec<RedirectRuleConfig>,

    /// Append the built-in computed redirect rules after the literal ones
    pub builtin_redirects: bool,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// SQLite database path
    pub sqlite_path: PathBuf,
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Server bind address
    pub bind_address: SocketAddr,

    /// Enable CORS for the admin API
    pub enable_cors: bool,

    /// Enable request logging
    pub enable_request_logging: bool,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Log format (text, json)
    pub format: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            base_url: String::from("http://localhost:8080/"),
        }
    }
}

impl Default for PermalinkConfig {
    fn default() -> Self {
        Self {
            target_types: vec![String::from("post")],
            allowed_categories: Vec::new(),
            slug_overrides: BTreeMap::new(),
            primary_meta_key: String::from("_csp_primary_cat"),
            sequence_meta_prefix: String::from("cat_seq_"),
            max_probe: 10_000,
        }
    }
}

impl Default for RoutingConfig {
    fn default() -> Self {
        let gone = |pattern: &str, message: &str| GoneRuleConfig {
            pattern: pattern.to_string(),
            message: message.to_string(),
        };
        let home = |pattern: &str| RedirectRuleConfig {
            pattern: pattern.to_string(),
            destination: String::from("/"),
        };

        Self {
            gone: vec![
                gone(
                    r"^tag/[^/]+/.+$",
                    "Tag pages deeper than one level have been permanently removed",
                ),
                gone(
                    r"^category/[^/]+/.+$",
                    "Category pages deeper than one level have been permanently removed",
                ),
            ],
            redirects: vec![
                home(r"^tag/[^/]+/.*$"),
                home(r"^search/.*$"),
                home(r"^.*/feed/?$"),
                home(r"^[a-zA-Z0-9\-_]{20,}/.*$"),
            ],
            builtin_redirects: true,
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            sqlite_path: PathBuf::from("data/seqlink.db"),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: SocketAddr::from(([0, 0, 0, 0], 8080)),
            enable_cors: true,
            enable_request_logging: true,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: String::from("info"),
            format: String::from("text"),
        }
    }
}

impl PermalinkConfig {
    /// Add a target item type
    pub fn with_target_type(mut self, item_type: impl Into<String>) -> Self {
        let item_type = item_type.into();
        if !self.target_types.contains(&item_type) {
            self.target_types.push(item_type);
        }
        self
    }

    /// Restrict sequences to an additional category slug
    pub fn with_allowed_category(mut self, slug: impl Into<String>) -> Self {
        let slug = slug.into();
        if !self.allowed_categories.contains(&slug) {
            self.allowed_categories.push(slug);
        }
        self
    }

    /// Expose a category under a different URL slug
    pub fn with_slug_override(mut self, slug: impl Into<String>, alias: impl Into<String>) -> Self {
        self.slug_overrides.insert(slug.into(), alias.into());
        self
    }

    /// Set the probe cap
    pub fn with_max_probe(mut self, max_probe: u32) -> Self {
        self.max_probe = max_probe;
        self
    }

    /// Check whether an item type receives sequential permalinks
    pub fn is_target_type(&self, item_type: &str) -> bool {
        self.target_types.iter().any(|t| t == item_type)
    }

    /// Check whether a category slug is eligible for sequences
    ///
    /// Both sides are compared as sanitized slugs, so `News` allows `news`.
    pub fn is_allowed_slug(&self, slug: &str) -> bool {
        if self.allowed_categories.is_empty() {
            return true;
        }
        let slug = sanitize_slug(slug);
        self.allowed_categories
            .iter()
            .any(|allowed| sanitize_slug(allowed) == slug)
    }
}

impl Config {
    /// Load configuration from defaults overridden by environment variables
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.apply_env()?;
        Ok(config)
    }

    /// Load configuration from a file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse TOML config file: {}", path.display()))?;

        Ok(config)
    }

    /// Apply `SEQLINK_*` environment overrides on top of the current values
    pub fn apply_env(&mut self) -> Result<()> {
        if let Ok(base_url) = std::env::var("SEQLINK_BASE_URL") {
            self.site.base_url = base_url;
        }

        if let Ok(path) = std::env::var("SEQLINK_SQLITE_PATH") {
            self.database.sqlite_path = PathBuf::from(path);
        }

        if let Ok(addr) = std::env::var("SEQLINK_BIND_ADDRESS") {
            self.server.bind_address = addr
                .parse()
                .with_context(|| format!("Invalid SEQLINK_BIND_ADDRESS: {addr}"))?;
        }

        if let Ok(list) = std::env::var("SEQLINK_ALLOWED_CATEGORIES") {
            self.permalink.allowed_categories = split_list(&list);
        }

        if let Ok(list) = std::env::var("SEQLINK_TARGET_TYPES") {
            self.permalink.target_types = split_list(&list);
        }

        if let Ok(level) = std::env::var("SEQLINK_LOG_LEVEL") {
            self.logging.level = level;
        }

        if let Ok(format) = std::env::var("SEQLINK_LOG_FORMAT") {
            self.logging.format = format;
        }

        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        let base = Url::parse(&self.site.base_url)
            .with_context(|| format!("site.base_url is not an absolute URL: {}", self.site.base_url))?;
        if base.cannot_be_a_base() {
            anyhow::bail!("site.base_url cannot be used as a base: {}", self.site.base_url);
        }

        if self.permalink.target_types.is_empty() {
            anyhow::bail!("permalink.target_types must not be empty");
        }

        if self.permalink.primary_meta_key.trim().is_empty() {
            anyhow::bail!("permalink.primary_meta_key must not be empty");
        }

        if self.permalink.sequence_meta_prefix.trim().is_empty() {
            anyhow::bail!("permalink.sequence_meta_prefix must not be empty");
        }

        if self.permalink.max_probe == 0 {
            anyhow::bail!("permalink.max_probe must be greater than 0");
        }

        // An alias that equals another category's real slug would make
        // `/<alias>/<n>/` ambiguous.
        let real: HashSet<&str> = self.permalink.slug_overrides.keys().map(String::as_str).collect();
        for (slug, alias) in &self.permalink.slug_overrides {
            if alias.trim().is_empty() {
                anyhow::bail!("slug override for '{slug}' must not be empty");
            }
            if alias != slug && real.contains(alias.as_str()) {
                anyhow::bail!("slug override '{slug}' -> '{alias}' collides with a real slug");
            }
        }

        for rule in &self.routing.gone {
            Regex::new(&rule.pattern)
                .with_context(|| format!("Invalid gone pattern: {}", rule.pattern))?;
        }

        for rule in &self.routing.redirects {
            Regex::new(&rule.pattern)
                .with_context(|| format!("Invalid redirect pattern: {}", rule.pattern))?;
        }

        Ok(())
    }

    /// Parsed base URL, always ending in `/`
    pub fn base_url(&self) -> Result<Url> {
        normalize_base_url(&self.site.base_url)
    }
}

/// Parse a base URL and make sure its path ends with `/` so joins stay below it
pub fn normalize_base_url(raw: &str) -> Result<Url> {
    let mut url = Url::parse(raw).with_context(|| format!("Invalid base URL: {raw}"))?;
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url.set_query(None);
    url.set_fragment(None);
    Ok(url)
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}
