pub mod content;
pub mod serve;

// Re-export command functions for convenience
pub use content::{delete_category, delete_item, import, permalink, resolve, save};
pub use serve::serve;
