//! Per-category sequence numbers
//!
//! # Components
//!
//! - [`SequenceAllocator`] - next-auto / probe / claim / release operations
//! - [`CategoryLocks`] - one mutex per category, queues threads of this process
//! - [`SequenceKeys`] - `{prefix}{category_id}` metadata keys
//!
//! Each read-then-write span also runs inside the store's write lock
//! ([`ContentRepository::sequence_span`]), which holds across processes
//! sharing one database.
//!
//! [`ContentRepository::sequence_span`]: crate::storage::ContentRepository::sequence_span

pub mod allocator;
pub mod error;
pub mod locks;

pub use allocator::{SequenceAllocator, SequenceKeys};
pub use error::SequenceError;
pub use locks::{CategoryGuard, CategoryLocks};
