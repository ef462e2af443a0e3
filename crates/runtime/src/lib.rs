//! Execution core for interval workout scripts.
//!
//! A script is executed as a stack of [`Block`]s. Each block is a bundle of
//! small [`Behavior`]s that cooperate through block-scoped memory and a scoped
//! event bus, never through direct references to each other. The
//! [`ScriptRuntime`] owns the stack and drives every block through the
//! `mount → next* → unmount → dispose` lifecycle, draining an action queue
//! after each external event and sweeping completed frames.
//!
//! Modules are organized by responsibility:
//! - [`runtime`] hosts the session orchestrator and builder
//! - [`api`] exposes errors and snapshots handed to hosts
//! - [`actions`] defines the action contract and the LIFO queue
//! - [`events`] provides the scoped event bus
//! - [`behavior`] defines the behavior contract, hook context and validator
//! - [`behaviors`] is the canonical behavior library (timer, rounds, children...)
//! - [`block`] and [`stack`] implement frames and their lifecycle
//! - [`presets`] assembles behavior lists for the common block shapes
//! - [`compiler`] is the seam to the statement compiler, plus a strategy-based
//!   reference provider
pub mod actions;
pub mod api;
pub mod behavior;
pub mod behaviors;
pub mod block;
pub mod clock;
pub mod compiler;
pub mod diagnostics;
pub mod events;
pub mod presets;
pub mod runtime;
pub mod stack;

mod services;

pub use actions::{Action, ActionQueue, BoxedAction};
pub use api::{FrameSnapshot, Result, RuntimeError, RuntimeSnapshot};
pub use behavior::{
    Behavior, BehaviorContext, BehaviorError, Capability, CompositionError, CompositionValidator,
    ExclusiveGroup, HookKind, HookResult, NextOptions, NextTrigger, Requirement, ValidationIssue,
    ValidationResult,
};
pub use block::{Block, BlockBuilder, BlockPhase, BlockTiming, Completion};
pub use clock::{Clock, ManualClock, SystemClock};
pub use compiler::{
    BlockCompiler, BlockStrategy, CompileContext, CompileError, CompiledStatement, StatementId,
    StrategyCompiler,
};
pub use diagnostics::{Diagnostic, DiagnosticSink, RecordingDiagnostics, TracingDiagnostics};
pub use events::{EventBus, HandlerScope, SubscriptionId};
pub use runtime::{RuntimeBuilder, RuntimeConfig, ScriptRuntime};
pub use stack::RuntimeStack;
