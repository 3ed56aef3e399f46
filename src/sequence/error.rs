//! Error types for the sequence allocator

use thiserror::Error;

use crate::error::{ErrorCategory, SeqlinkErrorTrait};
use crate::models::{CategoryId, ItemId};

/// Sequence allocation errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SequenceError {
    /// Upward probing for a free slot ran past the configured bound
    #[error("no free sequence in category {category} after probing {attempts} slots from {preferred}")]
    ProbeExhausted {
        category: CategoryId,
        preferred: u64,
        attempts: u32,
    },

    /// The next sequence would not fit the storage integer range
    #[error("sequence space exhausted in category {category}")]
    Overflow { category: CategoryId },

    /// An item that must exist for the operation is gone
    #[error("item {0} not found")]
    ItemNotFound(ItemId),
}

impl SeqlinkErrorTrait for SequenceError {
    fn is_recoverable(&self) -> bool {
        false
    }

    fn category(&self) -> ErrorCategory {
        match self {
            Self::ProbeExhausted { .. } | Self::Overflow { .. } => ErrorCategory::Allocation,
            Self::ItemNotFound(_) => ErrorCategory::NotFound,
        }
    }
}
