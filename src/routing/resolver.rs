//! Inbound path resolution
//!
//! Evaluation order, first match wins:
//!
//! 1. Sequence route `<slug-or-alias>/<n>[/]` for allowed segments: serve the
//!    item, or 404 when the category or the item is missing.
//! 2. Gone rules: 410.
//! 3. Generic resolution (`?p=<id>` or a published path): serve the item.
//! 4. Stale category probe: a sequence-shaped path whose category does not
//!    exist redirects to the site root.
//! 5. Redirect rules: 301.
//! 6. Otherwise pass through.
//!
//! Every served item of a target type is checked against its permalink and
//! redirected when requested at another URL.

use std::sync::Arc;

use regex::Regex;
use url::Url;

use crate::config::Config;
use crate::error::Result;
use crate::models::{Item, ItemId};
use crate::permalink::PermalinkBuilder;
use crate::storage::SharedContentRepository;

use super::canonical::canonical_redirect;
use super::error::RouteError;
use super::request::RequestContext;
use super::rules::RuleSet;

/// Result of resolving one request
#[derive(Debug, Clone, PartialEq)]
pub enum RouteOutcome {
    /// Serve this item
    Serve(Item),

    /// Stop with a non-200 outcome
    Terminal(RouteError),

    /// Nothing matched; default handling applies
    PassThrough,
}

impl RouteOutcome {
    /// Served item, if any
    pub fn item(&self) -> Option<&Item> {
        match self {
            Self::Serve(item) => Some(item),
            _ => None,
        }
    }

    /// Terminal outcome, if any
    pub fn terminal(&self) -> Option<&RouteError> {
        match self {
            Self::Terminal(err) => Some(err),
            _ => None,
        }
    }
}

/// Maps request paths to items or terminal outcomes
pub struct RouteResolver {
    repo: SharedContentRepository,
    permalinks: Arc<PermalinkBuilder>,
    rules: RuleSet,
    sequence_route: Regex,
}

impl RouteResolver {
    /// Create a resolver with the configured rule set
    pub fn new(
        repo: SharedContentRepository,
        permalinks: Arc<PermalinkBuilder>,
        config: &Config,
    ) -> Result<Self> {
        Ok(Self {
            repo,
            permalinks,
            rules: RuleSet::from_config(&config.routing)?,
            sequence_route: Regex::new(r"^([^/]+)/([0-9]+)/?$")?,
        })
    }

    /// Active rule set
    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    /// Site base URL
    pub fn base_url(&self) -> &Url {
        self.permalinks.base_url()
    }

    /// Resolve a request
    pub fn resolve(&self, ctx: &RequestContext) -> Result<RouteOutcome> {
        let path = ctx.path();
        let shape = self.sequence_shape(path);

        // 1. Sequence route
        if let Some((segment, sequence)) = &shape {
            let config = self.permalinks.config();
            if self.permalinks.slugs().is_allowed_segment(config, segment) {
                return self.resolve_sequence_route(ctx, segment, *sequence);
            }
        }

        // 2. Retired paths
        if let Some(rule) = self.rules.match_gone(path) {
            tracing::info!(path, pattern = rule.pattern.as_str(), "Retired path requested");
            return Ok(RouteOutcome::Terminal(RouteError::RetiredPath {
                pattern: Some(rule.pattern.as_str().to_string()),
                message: rule.message.clone(),
            }));
        }

        // 3. Generic resolution
        if let Some((item, ctx)) = self.resolve_generic(ctx)? {
            return self.enforce_canonical(&ctx, item);
        }

        // 4. Stale category probe
        if let Some((segment, _)) = &shape {
            let exists = self
                .permalinks
                .slugs()
                .resolve_category(self.repo.as_ref(), segment)?
                .is_some();
            if !exists {
                tracing::info!(path, segment = %segment, "Stale category path, redirecting home");
                return self.redirect("/");
            }
        }

        // 5. Legacy redirects
        if let Some(destination) = self.rules.match_redirect(path, self.repo.as_ref())? {
            return self.redirect(&destination);
        }

        Ok(RouteOutcome::PassThrough)
    }

    fn sequence_shape(&self, path: &str) -> Option<(String, u64)> {
        let caps = self.sequence_route.captures(path)?;
        let segment = caps.get(1)?.as_str().to_lowercase();
        let sequence = caps.get(2)?.as_str().parse::<u64>().ok()?;
        (sequence > 0).then_some((segment, sequence))
    }

    fn resolve_sequence_route(
        &self,
        ctx: &RequestContext,
        segment: &str,
        sequence: u64,
    ) -> Result<RouteOutcome> {
        let Some(category) = self
            .permalinks
            .slugs()
            .resolve_category(self.repo.as_ref(), segment)?
        else {
            tracing::info!(path = ctx.path(), segment, "404: unknown category");
            return Ok(RouteOutcome::Terminal(RouteError::CategoryNotFound {
                slug: segment.to_string(),
            }));
        };

        let key = self.permalinks.keys().key_for(category.id);
        let holders = self
            .repo
            .get_items_by_category_and_sequence(category.id, &key, sequence)?;

        if holders.len() > 1 {
            tracing::warn!(
                category_id = %category.id,
                sequence,
                holders = holders.len(),
                "Duplicate sequence holders, serving the first"
            );
        }

        let item = match holders.first() {
            Some(id) => self.repo.get_item(*id)?,
            None => None,
        };

        match item {
            Some(item) => self.enforce_canonical(ctx, item),
            None => {
                tracing::info!(
                    path = ctx.path(),
                    category_id = %category.id,
                    sequence,
                    "404: no item holds sequence"
                );
                Ok(RouteOutcome::Terminal(RouteError::ItemNotFoundForSequence {
                    category: category.id,
                    sequence,
                }))
            }
        }
    }

    /// `?p=<id>` or a published path; the returned context drops `p`
    fn resolve_generic(&self, ctx: &RequestContext) -> Result<Option<(Item, RequestContext)>> {
        if let Some(id) = ctx.query_value("p").and_then(|p| p.parse::<ItemId>().ok()) {
            if let Some(item) = self.repo.get_item(id)? {
                return Ok(Some((item, ctx.without_query_param("p"))));
            }
        }

        let path = ctx.path().trim_matches('/');
        if path.is_empty() {
            return Ok(None);
        }
        Ok(self.repo.get_item_by_path(path)?.map(|item| (item, ctx.clone())))
    }

    fn enforce_canonical(&self, ctx: &RequestContext, item: Item) -> Result<RouteOutcome> {
        let Some(canonical) = self.permalinks.build(&item)? else {
            return Ok(RouteOutcome::Serve(item));
        };

        match canonical_redirect(self.base_url(), ctx, &canonical) {
            Some(location) => {
                tracing::debug!(item_id = %item.id, %location, "Redirecting to canonical URL");
                Ok(RouteOutcome::Terminal(RouteError::CanonicalRedirect { location }))
            }
            None => Ok(RouteOutcome::Serve(item)),
        }
    }

    fn redirect(&self, destination: &str) -> Result<RouteOutcome> {
        let location = absolute_destination(self.base_url(), destination)?;
        Ok(RouteOutcome::Terminal(RouteError::LegacyPathRedirect { location }))
    }
}

/// Absolute URLs pass through; anything else is resolved below the base URL
pub fn absolute_destination(base_url: &Url, destination: &str) -> Result<String> {
    if let Ok(url) = Url::parse(destination) {
        return Ok(url.to_string());
    }
    Ok(base_url.join(destination.trim_start_matches('/'))?.to_string())
}
