//! Retired-path and legacy-redirect rule sets
//!
//! Rules are evaluated in order against the relative request path; the first
//! gone rule that matches wins, and the first redirect rule that matches and
//! yields a destination wins.

use std::fmt;
use std::sync::Arc;

use regex::{Captures, Regex};

use crate::config::RoutingConfig;
use crate::error::Result;
use crate::storage::ContentRepository;

/// Computes a redirect destination from the pattern captures; `None` declines
pub type RedirectFn =
    Arc<dyn Fn(&Captures<'_>, &dyn ContentRepository) -> Result<Option<String>> + Send + Sync>;

// ============================================================================
// Rules
// ============================================================================

/// A permanently retired path shape
#[derive(Debug, Clone)]
pub struct GoneRule {
    pub pattern: Regex,
    pub message: String,
}

impl GoneRule {
    /// Compile a gone rule
    pub fn new(pattern: &str, message: impl Into<String>) -> Result<Self> {
        Ok(Self {
            pattern: Regex::new(pattern)?,
            message: message.into(),
        })
    }
}

/// A legacy path shape that redirects elsewhere
#[derive(Clone)]
pub enum RedirectRule {
    /// Fixed destination
    Literal { pattern: Regex, destination: String },

    /// Destination computed from the captures, possibly consulting storage
    Computed { pattern: Regex, resolver: RedirectFn },
}

impl fmt::Debug for RedirectRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal {
                pattern,
                destination,
            } => f
                .debug_struct("Literal")
                .field("pattern", &pattern.as_str())
                .field("destination", destination)
                .finish(),
            Self::Computed { pattern, .. } => f
                .debug_struct("Computed")
                .field("pattern", &pattern.as_str())
                .finish_non_exhaustive(),
        }
    }
}

impl RedirectRule {
    /// Compile a literal rule
    pub fn literal(pattern: &str, destination: impl Into<String>) -> Result<Self> {
        Ok(Self::Literal {
            pattern: Regex::new(pattern)?,
            destination: destination.into(),
        })
    }

    /// Compile a computed rule
    pub fn computed<F>(pattern: &str, resolver: F) -> Result<Self>
    where
        F: Fn(&Captures<'_>, &dyn ContentRepository) -> Result<Option<String>>
            + Send
            + Sync
            + 'static,
    {
        Ok(Self::Computed {
            pattern: Regex::new(pattern)?,
            resolver: Arc::new(resolver),
        })
    }

    /// Rule pattern
    pub fn pattern(&self) -> &Regex {
        match self {
            Self::Literal { pattern, .. } | Self::Computed { pattern, .. } => pattern,
        }
    }

    /// Destination for `path`, or `None` when the rule does not match or declines
    pub fn destination(&self, path: &str, repo: &dyn ContentRepository) -> Result<Option<String>> {
        match self {
            Self::Literal {
                pattern,
                destination,
            } => Ok(pattern.is_match(path).then(|| destination.clone())),
            Self::Computed { pattern, resolver } => match pattern.captures(path) {
                Some(caps) => resolver(&caps, repo),
                None => Ok(None),
            },
        }
    }
}

// ============================================================================
// Built-in computed rules
// ============================================================================

/// Computed rules appended after the configured literal redirects
pub fn builtin_redirects() -> Result<Vec<RedirectRule>> {
    Ok(vec![
        // category-{slug}/{n}/{anything}: category archive, or home when the category is gone
        RedirectRule::computed(r"^category-([^/]+)/([0-9]+)/([^/]+)/?$", |caps, repo| {
            let slug = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
            let link = match repo.get_category_by_slug(slug)? {
                Some(category) => repo.get_category_link(category.id)?,
                None => None,
            };
            Ok(Some(link.unwrap_or_else(|| String::from("/"))))
        })?,
        // Single segment: home, unless something is published there
        RedirectRule::computed(r"^([^/]+)/?$", |caps, repo| {
            let segment = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
            if repo.get_item_by_path(segment)?.is_some() {
                return Ok(None);
            }
            Ok(Some(String::from("/")))
        })?,
    ])
}

// ============================================================================
// Rule Set
// ============================================================================

/// Ordered gone and redirect rules
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    gone: Vec<GoneRule>,
    redirects: Vec<RedirectRule>,
}

impl RuleSet {
    /// Rule set with no rules
    pub fn empty() -> Self {
        Self::default()
    }

    /// Compile the configured rules, followed by the built-ins when enabled
    pub fn from_config(config: &RoutingConfig) -> Result<Self> {
        let mut rules = Self::empty();
        for rule in &config.gone {
            rules = rules.with_gone(GoneRule::new(&rule.pattern, rule.message.clone())?);
        }
        for rule in &config.redirects {
            rules = rules.with_redirect(RedirectRule::literal(&rule.pattern, rule.destination.clone())?);
        }
        if config.builtin_redirects {
            for rule in builtin_redirects()? {
                rules = rules.with_redirect(rule);
            }
        }
        Ok(rules)
    }

    /// Append a gone rule
    pub fn with_gone(mut self, rule: GoneRule) -> Self {
        self.gone.push(rule);
        self
    }

    /// Append a redirect rule
    pub fn with_redirect(mut self, rule: RedirectRule) -> Self {
        self.redirects.push(rule);
        self
    }

    /// First gone rule matching `path`
    pub fn match_gone(&self, path: &str) -> Option<&GoneRule> {
        self.gone.iter().find(|rule| rule.pattern.is_match(path))
    }

    /// First redirect destination for `path`
    pub fn match_redirect(
        &self,
        path: &str,
        repo: &dyn ContentRepository,
    ) -> Result<Option<String>> {
        for rule in &self.redirects {
            if let Some(destination) = rule.destination(path, repo)? {
                tracing::debug!(path, pattern = rule.pattern().as_str(), %destination, "Redirect rule matched");
                return Ok(Some(destination));
            }
        }
        Ok(None)
    }

    /// Number of gone rules
    pub fn gone_len(&self) -> usize {
        self.gone.len()
    }

    /// Number of redirect rules
    pub fn redirect_len(&self) -> usize {
        self.redirects.len()
    }
}
