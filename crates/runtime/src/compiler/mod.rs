//! Seam between the runtime and the statement compiler.
//!
//! The runtime never parses scripts. It hands opaque statement-id groups to a
//! [`BlockCompiler`] and receives a [`Block`] whose behaviors must pass the
//! composition validator. [`StrategyCompiler`] is the reference provider used
//! by the CLI host and the scenario tests.
mod strategies;

pub use strategies::{
    AmrapStrategy, BlockStrategy, CompiledStatement, EffortStrategy, GroupStrategy,
    IntervalStrategy, RoundsStrategy, StrategyCompiler, TimerStrategy,
};

use std::fmt;

use thiserror::Error;
use workout_core::{
    BlockKey, ConfigError, ErrorSeverity, Fragment, MemoryStore, MemoryTag, Timestamp,
    WorkoutError,
};

use crate::block::Block;

/// Opaque identifier of a compiled statement.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StatementId(pub u32);

impl fmt::Display for StatementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "stmt:{}", self.0)
    }
}

#[derive(Debug, Error)]
pub enum CompileError {
    #[error("unknown statement {0}")]
    UnknownStatement(StatementId),

    #[error("statement group is empty")]
    EmptyGroup,

    #[error("no strategy accepts statement {0}")]
    NoStrategy(StatementId),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl WorkoutError for CompileError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::Config(err) => err.severity(),
            _ => ErrorSeverity::Validation,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::UnknownStatement(_) => "COMPILE_UNKNOWN_STATEMENT",
            Self::EmptyGroup => "COMPILE_EMPTY_GROUP",
            Self::NoStrategy(_) => "COMPILE_NO_STRATEGY",
            Self::Config(err) => err.error_code(),
        }
    }
}

/// What the compiler may know about where the new block lands.
pub struct CompileContext<'a> {
    pub parent: Option<BlockKey>,
    /// Depth the new block will have (root = 0).
    pub depth: usize,
    pub now: Timestamp,
    /// Keys of every frame that will sit below the new block, root first.
    pub lineage: &'a [BlockKey],
    memory: &'a MemoryStore,
}

impl<'a> CompileContext<'a> {
    pub fn new(
        parent: Option<BlockKey>,
        depth: usize,
        now: Timestamp,
        lineage: &'a [BlockKey],
        memory: &'a MemoryStore,
    ) -> Self {
        Self {
            parent,
            depth,
            now,
            lineage,
            memory,
        }
    }

    /// Context for a root block.
    pub fn root(now: Timestamp, memory: &'a MemoryStore) -> Self {
        Self::new(None, 0, now, &[], memory)
    }

    /// Nearest public or inherited value of `tag` the new block will see.
    pub fn read_inherited(&self, tag: MemoryTag) -> Option<&'a [Fragment]> {
        self.memory.read_visible(BlockKey::HOST, self.lineage, tag)
    }
}

/// Turns a statement-id group into a block ready for validation.
pub trait BlockCompiler: Send {
    fn compile(
        &mut self,
        statements: &[StatementId],
        ctx: &CompileContext<'_>,
    ) -> Result<Block, CompileError>;
}
