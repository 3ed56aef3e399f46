//! Primary categories, slug aliases and canonical permalinks

pub mod builder;
pub mod primary;
pub mod slug;

pub use builder::PermalinkBuilder;
pub use primary::{primary_category_id, PrimaryCategoryResolver};
pub use slug::{sanitize_slug, SlugMap};
