//! seqlink - Per-category sequential permalinks
//!
//! Every item of a target type gets a stable sequence number within its
//! primary category and is served at `/<category-slug>/<sequence>/`. Legacy
//! URLs are redirected to that canonical form, and retired URL structures
//! answer with 410 Gone.
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - [`config`] - Configuration loaded once and passed to constructors
//! - [`models`] - Items, categories and save requests
//! - [`storage`] - Content repository trait with SQLite and in-memory backends
//! - [`sequence`] - Per-category sequence allocation under category locks
//! - [`permalink`] - Primary category resolution, slug aliases, canonical URLs
//! - [`routing`] - Request path to item, redirect, 404 or 410
//! - [`lifecycle`] - Save and delete event handlers
//! - [`http`] - axum server, admin API and resolver fallback
//!
//! # Example
//!
//! ```no_run
//! use seqlink::config::Config;
//! use seqlink::http::AppState;
//! use seqlink::routing::RequestContext;
//! use seqlink::storage::open_repository;
//!
//! fn main() -> anyhow::Result<()> {
//!     let config = Config::from_env()?;
//!     let repo = open_repository(&config.database)?;
//!     let state = AppState::new(config, repo)?;
//!
//!     let ctx = RequestContext::parse("/news/7/", state.base_path());
//!     let outcome = state.resolver.resolve(&ctx)?;
//!     println!("{outcome:?}");
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod models;
pub mod permalink;
pub mod routing;
pub mod sequence;
pub mod storage;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::Config;
    pub use crate::error::{Error, ErrorCategory, Result, SeqlinkErrorTrait};
    pub use crate::lifecycle::LifecycleHandler;
    pub use crate::models::{Category, CategoryId, Item, ItemId, SaveOutcome, SaveRequest};
    pub use crate::permalink::PermalinkBuilder;
    pub use crate::routing::{RequestContext, RouteError, RouteOutcome, RouteResolver};
    pub use crate::sequence::{SequenceAllocator, SequenceError};
    pub use crate::storage::{ContentRepository, SharedContentRepository};
}

// Direct re-exports for convenience
pub use models::{Category, CategoryId, Item, ItemId};
