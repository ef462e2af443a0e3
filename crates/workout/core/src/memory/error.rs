use super::MemoryId;
use crate::error::{ErrorSeverity, WorkoutError};
use crate::types::BlockKey;

/// Failed writes. Reads never fail; they return `None`.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum MemoryError {
    #[error("memory location {id:?} was released")]
    Released { id: MemoryId },

    #[error("{writer} may not write memory location {id:?} owned by {owner}")]
    NotOwner {
        id: MemoryId,
        owner: BlockKey,
        writer: BlockKey,
    },
}

impl WorkoutError for MemoryError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::Released { .. } => ErrorSeverity::Recoverable,
            Self::NotOwner { .. } => ErrorSeverity::Internal,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::Released { .. } => "MEMORY_RELEASED",
            Self::NotOwner { .. } => "MEMORY_NOT_OWNER",
        }
    }
}
