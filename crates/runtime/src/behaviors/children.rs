//! Child aspect: pushing child groups, looping them, and completing a group
//! block once every child ran.
use workout_core::{ChildCursor, Fragment, FragmentValue, MemoryTag, Visibility};

use super::{read_cursor, write_cursor};
use crate::actions::{BoxedAction, CompileChildAction};
use crate::behavior::{
    Behavior, BehaviorContext, BehaviorError, Capability, HookResult, NextOptions, Requirement,
    stage,
};
use crate::block::reason;
use crate::compiler::StatementId;

const NEEDS_RUNNER: &[Requirement] =
    &[Requirement::new("a child runner", &[Capability::ChildRunner])];

/// Pushes child statement groups one at a time.
///
/// The cursor lives in private `children` memory so round and loop behaviors
/// can inspect and rewind it. A group is only pushed while this block is the
/// innermost frame and not complete.
#[derive(Debug, Clone, Default)]
pub struct ChildRunner {
    groups: Vec<Vec<StatementId>>,
}

impl ChildRunner {
    pub fn new(groups: Vec<Vec<StatementId>>) -> Self {
        Self { groups }
    }

    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    fn push_next(&self, ctx: &mut BehaviorContext<'_>) -> Result<Vec<BoxedAction>, BehaviorError> {
        if ctx.is_complete() || !ctx.is_active() {
            return Ok(Vec::new());
        }
        let mut cursor = read_cursor(ctx).ok_or(BehaviorError::MissingMemory {
            tag: MemoryTag::CHILDREN,
        })?;
        let Some(index) = cursor.advance() else {
            return Ok(Vec::new());
        };
        write_cursor(ctx, cursor)?;

        let Some(statements) = self.groups.get(index) else {
            return Err(BehaviorError::failed(
                "child_runner",
                format!("cursor index {index} out of {} groups", self.groups.len()),
            ));
        };
        Ok(vec![Box::new(CompileChildAction {
            parent: ctx.key(),
            statements: statements.clone(),
        })])
    }
}

impl Behavior for ChildRunner {
    fn name(&self) -> &'static str {
        "child_runner"
    }

    fn capabilities(&self) -> &'static [Capability] {
        &[Capability::ChildRunner]
    }

    fn priority(&self) -> i32 {
        stage::CHILDREN
    }

    fn produces(&self) -> &'static [MemoryTag] {
        &[MemoryTag::CHILDREN]
    }

    fn on_mount(&mut self, ctx: &mut BehaviorContext<'_>) -> HookResult {
        let cursor = ChildCursor::new(self.groups.len());
        let fragment = Fragment::runtime(FragmentValue::Children(cursor), ctx.key(), ctx.now());
        ctx.allocate(MemoryTag::CHILDREN, vec![fragment], Visibility::Private);
        self.push_next(ctx)
    }

    fn on_next(&mut self, ctx: &mut BehaviorContext<'_>, _options: &NextOptions) -> HookResult {
        self.push_next(ctx)
    }
}

/// Rewinds an exhausted child cursor so the groups run again next round.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChildLoop;

impl Behavior for ChildLoop {
    fn name(&self) -> &'static str {
        "child_loop"
    }

    fn capabilities(&self) -> &'static [Capability] {
        &[Capability::ChildLoop]
    }

    fn requirements(&self) -> &'static [Requirement] {
        NEEDS_RUNNER
    }

    fn priority(&self) -> i32 {
        stage::PROMOTION
    }

    fn produces(&self) -> &'static [MemoryTag] {
        &[MemoryTag::CHILDREN]
    }

    fn on_next(&mut self, ctx: &mut BehaviorContext<'_>, _options: &NextOptions) -> HookResult {
        if ctx.is_complete() {
            return Ok(Vec::new());
        }
        if let Some(mut cursor) = read_cursor(ctx)
            && cursor.is_exhausted()
        {
            cursor.rewind();
            write_cursor(ctx, cursor)?;
        }
        Ok(Vec::new())
    }
}

/// Completes a plain group once each of its child groups has popped.
/// A group with no children completes at mount.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChildrenCompletion {
    groups: usize,
    finished: usize,
}

impl ChildrenCompletion {
    pub const fn new(groups: usize) -> Self {
        Self {
            groups,
            finished: 0,
        }
    }
}

impl Behavior for ChildrenCompletion {
    fn name(&self) -> &'static str {
        "children_completion"
    }

    fn capabilities(&self) -> &'static [Capability] {
        &[Capability::ChildrenCompletion]
    }

    fn requirements(&self) -> &'static [Requirement] {
        NEEDS_RUNNER
    }

    fn priority(&self) -> i32 {
        stage::COMPLETION
    }

    fn on_mount(&mut self, ctx: &mut BehaviorContext<'_>) -> HookResult {
        if self.groups == 0 {
            ctx.mark_complete(reason::CHILDREN_COMPLETE);
        }
        Ok(Vec::new())
    }

    fn on_next(&mut self, ctx: &mut BehaviorContext<'_>, options: &NextOptions) -> HookResult {
        if options.is_child_completion() {
            self.finished += 1;
        }
        if self.finished >= self.groups {
            ctx.mark_complete(reason::CHILDREN_COMPLETE);
        }
        Ok(Vec::new())
    }
}
