//! Interval aspect (EMOM): a fixed timer that restarts every round.
use workout_core::{Event, EventName, MemoryTag};

use super::{advance_round, read_cursor, read_rounds, read_timer, write_cursor, write_timer};
use crate::actions::NextBlockAction;
use crate::behavior::{
    Behavior, BehaviorContext, Capability, HookResult, NextOptions, NextTrigger, Requirement,
    stage,
};
use crate::block::reason;
use crate::events::HandlerScope;

const NEEDS_TIMER_AND_ROUNDS: &[Requirement] = &[
    Requirement::new("a timer", &[Capability::Timer]),
    Requirement::new("a timer tick source", &[Capability::TimerTick]),
    Requirement::new("a round source", &[Capability::RoundSource]),
];

/// On its own `timer:complete`, requests an interval `next`. On that `next`
/// it advances the round, completes past the bound, and otherwise restarts
/// the timer at the boundary and rewinds the child cycle.
///
/// A child still running at a boundary is not interrupted; the next group is
/// pushed when it pops. A bound of zero completes the block at mount, before
/// any child is pushed.
#[derive(Debug, Clone, Copy, Default)]
pub struct IntervalReset;

impl Behavior for IntervalReset {
    fn name(&self) -> &'static str {
        "interval_reset"
    }

    fn capabilities(&self) -> &'static [Capability] {
        &[Capability::Interval]
    }

    fn requirements(&self) -> &'static [Requirement] {
        NEEDS_TIMER_AND_ROUNDS
    }

    fn priority(&self) -> i32 {
        stage::ADVANCE
    }

    fn produces(&self) -> &'static [MemoryTag] {
        &[MemoryTag::ROUNDS, MemoryTag::TIMER, MemoryTag::CHILDREN]
    }

    fn on_mount(&mut self, ctx: &mut BehaviorContext<'_>) -> HookResult {
        if read_rounds(ctx).is_some_and(|rounds| rounds.is_exhausted()) {
            ctx.mark_complete(reason::INTERVALS_COMPLETE);
            return Ok(Vec::new());
        }
        ctx.subscribe(EventName::TIMER_COMPLETE, HandlerScope::Bubble);
        Ok(Vec::new())
    }

    fn on_event(&mut self, event: &Event, ctx: &mut BehaviorContext<'_>) -> HookResult {
        if !event.is_about(ctx.key()) || ctx.is_complete() {
            return Ok(Vec::new());
        }
        Ok(vec![Box::new(NextBlockAction {
            key: ctx.key(),
            trigger: NextTrigger::Interval {
                at: event.timestamp,
            },
        })])
    }

    fn on_next(&mut self, ctx: &mut BehaviorContext<'_>, options: &NextOptions) -> HookResult {
        let NextTrigger::Interval { at } = options.trigger else {
            return Ok(Vec::new());
        };

        let rounds = advance_round(ctx)?;
        if rounds.is_exhausted() {
            ctx.mark_complete(reason::INTERVALS_COMPLETE);
            return Ok(Vec::new());
        }

        if let Some(mut timer) = read_timer(ctx) {
            timer.restart(at);
            write_timer(ctx, timer)?;
        }
        if let Some(mut cursor) = read_cursor(ctx) {
            cursor.rewind();
            write_cursor(ctx, cursor)?;
        }
        Ok(Vec::new())
    }
}
