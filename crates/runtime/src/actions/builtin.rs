//! Actions the runtime and the behavior library rely on.
use workout_core::{BlockKey, Event};

use super::{Action, BoxedAction};
use crate::api::Result;
use crate::behavior::NextTrigger;
use crate::block::Block;
use crate::compiler::StatementId;
use crate::runtime::ScriptRuntime;

/// Validates and pushes an already built block.
#[derive(Debug)]
pub struct PushBlockAction {
    pub block: Block,
}

impl Action for PushBlockAction {
    fn name(&self) -> &'static str {
        "push_block"
    }

    fn execute(self: Box<Self>, runtime: &mut ScriptRuntime) -> Result<Vec<BoxedAction>> {
        runtime.activate(self.block)?;
        Ok(Vec::new())
    }
}

/// Compiles a child statement group under `parent` and pushes the result.
#[derive(Debug)]
pub struct CompileChildAction {
    pub parent: BlockKey,
    pub statements: Vec<StatementId>,
}

impl Action for CompileChildAction {
    fn name(&self) -> &'static str {
        "compile_child"
    }

    fn execute(self: Box<Self>, runtime: &mut ScriptRuntime) -> Result<Vec<BoxedAction>> {
        runtime.compile_child(self.parent, &self.statements)?;
        Ok(Vec::new())
    }
}

/// Calls `next` on a block that is still on the stack and not complete.
#[derive(Debug)]
pub struct NextBlockAction {
    pub key: BlockKey,
    pub trigger: NextTrigger,
}

impl Action for NextBlockAction {
    fn name(&self) -> &'static str {
        "next_block"
    }

    fn execute(self: Box<Self>, runtime: &mut ScriptRuntime) -> Result<Vec<BoxedAction>> {
        runtime.next_block(self.key, self.trigger)
    }
}

/// Marks a block complete; the sweep pops it at the end of the cycle.
#[derive(Debug)]
pub struct MarkCompleteAction {
    pub key: BlockKey,
    pub reason: String,
}

impl Action for MarkCompleteAction {
    fn name(&self) -> &'static str {
        "mark_complete"
    }

    fn execute(self: Box<Self>, runtime: &mut ScriptRuntime) -> Result<Vec<BoxedAction>> {
        runtime.mark_block_complete(self.key, self.reason)?;
        Ok(Vec::new())
    }
}

/// Routes an event through the bus; handler actions become follow-ups.
#[derive(Debug)]
pub struct EmitEventAction {
    pub event: Event,
}

impl Action for EmitEventAction {
    fn name(&self) -> &'static str {
        "emit_event"
    }

    fn execute(self: Box<Self>, runtime: &mut ScriptRuntime) -> Result<Vec<BoxedAction>> {
        Ok(runtime.dispatch(&self.event))
    }
}

/// The external `next` control: advances whatever block is innermost.
#[derive(Debug, Default)]
pub struct AdvanceInnermostAction;

impl Action for AdvanceInnermostAction {
    fn name(&self) -> &'static str {
        "advance_innermost"
    }

    fn execute(self: Box<Self>, runtime: &mut ScriptRuntime) -> Result<Vec<BoxedAction>> {
        match runtime.current().map(Block::key) {
            Some(key) => runtime.next_block(key, NextTrigger::External),
            None => Ok(Vec::new()),
        }
    }
}

/// The external `skip` control: abandons the innermost block.
#[derive(Debug, Default)]
pub struct SkipInnermostAction;

impl Action for SkipInnermostAction {
    fn name(&self) -> &'static str {
        "skip_innermost"
    }

    fn execute(self: Box<Self>, runtime: &mut ScriptRuntime) -> Result<Vec<BoxedAction>> {
        if let Some(key) = runtime.current().map(Block::key) {
            runtime.mark_block_complete(key, crate::block::reason::SKIPPED.to_owned())?;
        }
        Ok(Vec::new())
    }
}
