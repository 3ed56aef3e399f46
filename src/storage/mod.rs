//! Content storage
//!
//! The permalink core only talks to storage through [`ContentRepository`].
//! SQLite backs the running service; the mock backs unit tests.

pub mod import;
pub mod repository;

pub use import::{ImportData, ImportSummary};
pub use repository::{
    create_mock_repository, create_sqlite_repository, ContentRepository, MockContentRepository,
    SequenceTxn, SharedContentRepository, SqliteContentRepository,
};

use crate::config::DatabaseConfig;
use crate::error::Result;

/// Open the configured SQLite repository
pub fn open_repository(config: &DatabaseConfig) -> Result<SharedContentRepository> {
    create_sqlite_repository(&config.sqlite_path)
}
