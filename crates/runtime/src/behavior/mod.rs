//! Behavior contract for composing blocks out of small capability units.
//!
//! A block owns an ordered list of behaviors. Every lifecycle call walks the
//! list in order and concatenates the actions each hook returns. Behaviors
//! never reference each other; they cooperate through block memory, the event
//! bus, or by checking which capabilities are co-located on the block.
//!
//! # Execution Order
//!
//! Behaviors are stable-sorted by [`Behavior::priority`] (lower runs first).
//! The [`stage`] constants name the conventional bands:
//!
//! - `INIT`: allocate memory, start timers
//! - `ADVANCE`: move round counters
//! - `COMPLETION`: decide whether the block is done
//! - `PROMOTION`: publish derived values (rep targets) for children
//! - `CHILDREN`: push the next child group
//! - `OUTPUT`: display memory and output statements
//!
//! Data dependencies inside one hook call are declared with
//! [`Behavior::produces`] / [`Behavior::consumes`] and checked by the
//! [`CompositionValidator`].
mod context;
mod validation;

pub use context::BehaviorContext;
pub(crate) use context::HookEnv;
pub use validation::{
    CompositionError, CompositionValidator, ExclusiveGroup, ValidationIssue, ValidationResult,
};

use thiserror::Error;
use workout_core::{BlockKey, ErrorSeverity, Event, MemoryError, MemoryTag, Timestamp, WorkoutError};

use crate::actions::BoxedAction;

/// Conventional priority bands. Lower values run first.
pub mod stage {
    pub const INIT: i32 = -100;
    pub const ADVANCE: i32 = -50;
    pub const COMPLETION: i32 = -25;
    pub const PROMOTION: i32 = 0;
    pub const CHILDREN: i32 = 50;
    pub const OUTPUT: i32 = 100;
}

/// What a behavior contributes to its block.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, strum::Display, strum::AsRefStr,
)]
#[strum(serialize_all = "snake_case")]
pub enum Capability {
    Timer,
    TimerTick,
    TimerPause,
    TimerCompletion,
    RoundSource,
    RoundAdvance,
    RoundCompletion,
    RepScheme,
    Interval,
    ChildRunner,
    ChildLoop,
    ChildrenCompletion,
    LeafCompletion,
    EventCompletion,
    Display,
    Controls,
    SegmentOutput,
    MilestoneOutput,
}

impl Capability {
    /// Capabilities that can end a block on their own.
    pub const COMPLETING: &'static [Capability] = &[
        Capability::TimerCompletion,
        Capability::RoundCompletion,
        Capability::Interval,
        Capability::ChildrenCompletion,
        Capability::LeafCompletion,
        Capability::EventCompletion,
    ];

    pub fn is_completing(self) -> bool {
        Self::COMPLETING.contains(&self)
    }
}

/// A dependency on at least one co-located capability.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Requirement {
    /// Short description used in validation messages.
    pub name: &'static str,
    pub any_of: &'static [Capability],
}

impl Requirement {
    pub const fn new(name: &'static str, any_of: &'static [Capability]) -> Self {
        Self { name, any_of }
    }
}

/// Lifecycle hook identifier, for logging and diagnostics.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display, strum::AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum HookKind {
    Mount,
    Next,
    Unmount,
    Dispose,
    Event,
}

/// Why `next` was called.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NextTrigger {
    /// A child block was popped.
    ChildCompleted { child: BlockKey, at: Timestamp },
    /// An interval boundary passed (EMOM style).
    Interval { at: Timestamp },
    /// The host pressed `next`.
    External,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NextOptions {
    pub now: Timestamp,
    pub trigger: NextTrigger,
}

impl NextOptions {
    pub const fn new(now: Timestamp, trigger: NextTrigger) -> Self {
        Self { now, trigger }
    }

    pub const fn is_interval(&self) -> bool {
        matches!(self.trigger, NextTrigger::Interval { .. })
    }

    pub const fn is_child_completion(&self) -> bool {
        matches!(self.trigger, NextTrigger::ChildCompleted { .. })
    }
}

/// Failure inside a behavior hook. Absorbed by the block.
#[derive(Debug, Error)]
pub enum BehaviorError {
    #[error(transparent)]
    Memory(#[from] MemoryError),

    #[error("memory `{tag}` is not allocated")]
    MissingMemory { tag: MemoryTag },

    #[error("memory `{tag}` does not hold the expected value")]
    UnexpectedValue { tag: MemoryTag },

    #[error("{behavior}: {message}")]
    Failed {
        behavior: &'static str,
        message: String,
    },
}

impl BehaviorError {
    pub fn failed(behavior: &'static str, message: impl Into<String>) -> Self {
        Self::Failed {
            behavior,
            message: message.into(),
        }
    }
}

impl WorkoutError for BehaviorError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::Memory(err) => err.severity(),
            Self::MissingMemory { .. } | Self::UnexpectedValue { .. } | Self::Failed { .. } => {
                ErrorSeverity::Recoverable
            }
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::Memory(err) => err.error_code(),
            Self::MissingMemory { .. } => "BEHAVIOR_MISSING_MEMORY",
            Self::UnexpectedValue { .. } => "BEHAVIOR_UNEXPECTED_VALUE",
            Self::Failed { .. } => "BEHAVIOR_FAILED",
        }
    }
}

/// Actions produced by one hook, or the reason it produced none.
pub type HookResult = Result<Vec<BoxedAction>, BehaviorError>;

/// One capability unit composed onto a block.
///
/// Every hook is optional. A behavior may keep private state for the one
/// block instance it belongs to; it is never shared across blocks.
///
/// Hooks return actions instead of acting on the stack. Side effects allowed
/// inline are the ones exposed by [`BehaviorContext`]: memory, subscriptions,
/// output statements and the block's own completion flag.
pub trait Behavior: Send {
    /// Returns a human-readable name (used in logging and diagnostics).
    fn name(&self) -> &'static str;

    fn capabilities(&self) -> &'static [Capability] {
        &[]
    }

    fn requirements(&self) -> &'static [Requirement] {
        &[]
    }

    /// Position within the block's behavior list. See [`stage`].
    fn priority(&self) -> i32 {
        stage::PROMOTION
    }

    /// Memory tags written during a hook call.
    fn produces(&self) -> &'static [MemoryTag] {
        &[]
    }

    /// Memory tags read during a hook call, after their producers ran.
    fn consumes(&self) -> &'static [MemoryTag] {
        &[]
    }

    fn on_mount(&mut self, _ctx: &mut BehaviorContext<'_>) -> HookResult {
        Ok(Vec::new())
    }

    fn on_next(&mut self, _ctx: &mut BehaviorContext<'_>, _options: &NextOptions) -> HookResult {
        Ok(Vec::new())
    }

    fn on_unmount(&mut self, _ctx: &mut BehaviorContext<'_>) -> HookResult {
        Ok(Vec::new())
    }

    /// Final cleanup after the block left the stack. No actions can follow.
    fn on_dispose(&mut self, _ctx: &mut BehaviorContext<'_>) -> Result<(), BehaviorError> {
        Ok(())
    }

    /// Called for events this behavior subscribed to.
    fn on_event(&mut self, _event: &Event, _ctx: &mut BehaviorContext<'_>) -> HookResult {
        Ok(Vec::new())
    }
}
