//! Deferred commands and the queue that drains them.
//!
//! Hooks and event handlers never mutate the stack directly. They return
//! actions, which the runtime pushes onto a LIFO [`ActionQueue`] and drains
//! before handing control back to the host. An action may return follow-ups;
//! those run before the action's remaining siblings (depth-first).
mod builtin;

pub use builtin::{
    AdvanceInnermostAction, CompileChildAction, EmitEventAction, MarkCompleteAction,
    NextBlockAction, PushBlockAction, SkipInnermostAction,
};

use std::fmt;

use crate::api::Result;
use crate::runtime::ScriptRuntime;

/// A deferred command executed against the runtime.
pub trait Action: Send + fmt::Debug {
    /// Name used in logs and diagnostics.
    fn name(&self) -> &'static str;

    /// Runs the command and returns follow-up actions.
    ///
    /// Implementations must not touch the queue; follow-ups are returned.
    fn execute(self: Box<Self>, runtime: &mut ScriptRuntime) -> Result<Vec<BoxedAction>>;
}

pub type BoxedAction = Box<dyn Action>;

/// Last-in, first-out action queue.
#[derive(Debug, Default)]
pub struct ActionQueue {
    pending: Vec<BoxedAction>,
}

impl ActionQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, action: BoxedAction) {
        self.pending.push(action);
    }

    /// Pushes a list so that its first element is popped first.
    pub fn push_all(&mut self, actions: Vec<BoxedAction>) {
        self.pending.extend(actions.into_iter().rev());
    }

    pub fn pop(&mut self) -> Option<BoxedAction> {
        self.pending.pop()
    }

    /// Drops everything still pending; returns how many were dropped.
    pub fn clear(&mut self) -> usize {
        let dropped = self.pending.len();
        self.pending.clear();
        dropped
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
