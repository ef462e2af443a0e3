//! Output statements for the presentation layer and workout history.
use workout_core::{
    Event, EventData, EventName, Fragment, FragmentValue, MemoryTag, OutputKind, RoundsValue,
    TimeSpan, Timestamp, merge_fragments,
};

use super::{read_rounds, read_timer};
use crate::behavior::{Behavior, BehaviorContext, Capability, HookResult, Requirement, stage};
use crate::events::HandlerScope;

const NEEDS_ROUND_DRIVER: &[Requirement] = &[Requirement::new(
    "a round driver",
    &[Capability::RoundAdvance, Capability::Interval],
)];

/// Emits a segment when the block mounts and a completion when it unmounts.
///
/// The completion carries elapsed time (from the block's own timer if it has
/// a non-interval one, wall span otherwise) and the round counter when
/// present.
#[derive(Debug, Clone, Copy, Default)]
pub struct SegmentOutput;

impl Behavior for SegmentOutput {
    fn name(&self) -> &'static str {
        "segment_output"
    }

    fn capabilities(&self) -> &'static [Capability] {
        &[Capability::SegmentOutput]
    }

    fn priority(&self) -> i32 {
        stage::OUTPUT
    }

    fn consumes(&self) -> &'static [MemoryTag] {
        &[MemoryTag::TIMER, MemoryTag::ROUNDS]
    }

    fn on_mount(&mut self, ctx: &mut BehaviorContext<'_>) -> HookResult {
        let fragments = ctx.fragments().to_vec();
        ctx.output(OutputKind::Segment, TimeSpan::open(ctx.now()), fragments);
        Ok(Vec::new())
    }

    fn on_unmount(&mut self, ctx: &mut BehaviorContext<'_>) -> HookResult {
        let (key, now) = (ctx.key(), ctx.now());
        let start = ctx.started_at().unwrap_or(now);
        // Interval timers restart every round, so they only know the last one.
        let wall = now.saturating_since(start);
        let elapsed = match read_timer(ctx) {
            Some(timer) if !ctx.has_capability(Capability::Interval) => timer.elapsed(now),
            _ => wall,
        };

        let mut recorded = vec![Fragment::recorded(FragmentValue::Elapsed(elapsed), key, now)];
        if let Some(rounds) = read_rounds(ctx) {
            recorded.push(Fragment::recorded(FragmentValue::Rounds(rounds), key, now));
        }

        let fragments = merge_fragments(ctx.fragments(), &recorded);
        ctx.output(OutputKind::Completion, TimeSpan::closed(start, now), fragments);
        Ok(Vec::new())
    }
}

/// Emits a milestone each time this block's round counter moves.
#[derive(Debug, Clone, Copy, Default)]
pub struct MilestoneOutput {
    last: Option<Timestamp>,
}

impl Behavior for MilestoneOutput {
    fn name(&self) -> &'static str {
        "milestone_output"
    }

    fn capabilities(&self) -> &'static [Capability] {
        &[Capability::MilestoneOutput]
    }

    fn requirements(&self) -> &'static [Requirement] {
        NEEDS_ROUND_DRIVER
    }

    fn priority(&self) -> i32 {
        stage::OUTPUT
    }

    fn on_mount(&mut self, ctx: &mut BehaviorContext<'_>) -> HookResult {
        ctx.subscribe(EventName::ROUNDS_CHANGED, HandlerScope::Bubble);
        Ok(Vec::new())
    }

    fn on_event(&mut self, event: &Event, ctx: &mut BehaviorContext<'_>) -> HookResult {
        let EventData::Rounds { owner, round, total } = event.data else {
            return Ok(Vec::new());
        };
        if owner != ctx.key() {
            return Ok(Vec::new());
        }

        let at = event.timestamp;
        let start = self.last.or(ctx.started_at()).unwrap_or(at);
        self.last = Some(at);

        let value = FragmentValue::Rounds(RoundsValue {
            current: round,
            total,
        });
        let fragments = vec![Fragment::recorded(value, owner, at)];
        ctx.output(OutputKind::Milestone, TimeSpan::closed(start, at), fragments);
        Ok(Vec::new())
    }
}
