//! Unified error type surfaced by the runtime API.
//!
//! Wraps failures from the compiler seam and the composition validator so
//! hosts can bubble them up with consistent context. Hook failures never
//! appear here; they are absorbed and reported through diagnostics.
use thiserror::Error;
use workout_core::{BlockKey, ErrorSeverity, WorkoutError};

use crate::behavior::CompositionError;
use crate::compiler::CompileError;

pub type Result<T> = std::result::Result<T, RuntimeError>;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error(transparent)]
    Composition(#[from] CompositionError),

    #[error(transparent)]
    Compile(#[from] CompileError),

    #[error("block {0} is not on the stack")]
    BlockNotFound(BlockKey),

    #[error("stack depth limit of {limit} reached")]
    StackOverflow { limit: usize },

    #[error("session has no script compiler configured")]
    MissingCompiler,

    #[error("failed to serialize runtime snapshot")]
    Serialization(#[from] serde_json::Error),
}

impl WorkoutError for RuntimeError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::Composition(_) | Self::Compile(_) => ErrorSeverity::Validation,
            Self::BlockNotFound(_) => ErrorSeverity::Recoverable,
            Self::StackOverflow { .. } => ErrorSeverity::Fatal,
            Self::MissingCompiler | Self::Serialization(_) => ErrorSeverity::Internal,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::Composition(_) => "RUNTIME_COMPOSITION",
            Self::Compile(_) => "RUNTIME_COMPILE",
            Self::BlockNotFound(_) => "RUNTIME_BLOCK_NOT_FOUND",
            Self::StackOverflow { .. } => "RUNTIME_STACK_OVERFLOW",
            Self::MissingCompiler => "RUNTIME_MISSING_COMPILER",
            Self::Serialization(_) => "RUNTIME_SERIALIZATION",
        }
    }
}
