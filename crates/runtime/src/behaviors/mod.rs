//! Built-in behavior library.
//!
//! One canonical implementation per capability. Behaviors on the same block
//! share state only through tagged memory:
//!
//! | Tag          | Written by                                  | Visibility |
//! |--------------|---------------------------------------------|------------|
//! | `timer`      | [`TimerInit`], [`TimerPause`], [`IntervalReset`] | public     |
//! | `rounds`     | [`RoundInit`], [`RoundAdvance`], [`IntervalReset`] | inherited  |
//! | `rep-target` | [`RepScheme`]                               | inherited  |
//! | `children`   | [`ChildRunner`], [`ChildLoop`], [`IntervalReset`] | private    |
//! | `display`    | [`Display`]                                 | public     |
//! | `controls`   | [`Controls`]                                | public     |
mod children;
mod completion;
mod display;
mod interval;
mod output;
mod rounds;
mod timer;

pub use children::{ChildLoop, ChildRunner, ChildrenCompletion};
pub use completion::{CompleteOnEvent, CompleteOnNext};
pub use display::{Controls, Display};
pub use interval::IntervalReset;
pub use output::{MilestoneOutput, SegmentOutput};
pub use rounds::{RepScheme, RoundAdvance, RoundCompletion, RoundInit};
pub use timer::{TimerCompletion, TimerInit, TimerPause, TimerTick};

use workout_core::{
    ChildCursor, Event, EventData, EventName, Fragment, FragmentValue, MemoryTag, RoundsValue,
    TimerValue,
};

use crate::behavior::{BehaviorContext, BehaviorError};

fn first_value<T>(
    fragments: Option<&[Fragment]>,
    extract: impl Fn(&FragmentValue) -> Option<T>,
) -> Option<T> {
    fragments?.iter().find_map(|fragment| extract(&fragment.value))
}

fn write(
    ctx: &mut BehaviorContext<'_>,
    tag: MemoryTag,
    value: FragmentValue,
) -> Result<(), BehaviorError> {
    let fragment = Fragment::runtime(value, ctx.key(), ctx.now());
    ctx.update_memory(tag, vec![fragment])
        .map(|_| ())
        .ok_or(BehaviorError::MissingMemory { tag })
}

pub(crate) fn read_timer(ctx: &BehaviorContext<'_>) -> Option<TimerValue> {
    first_value(ctx.read_memory(MemoryTag::TIMER), |v| v.as_timer().cloned())
}

pub(crate) fn write_timer(ctx: &mut BehaviorContext<'_>, timer: TimerValue) -> Result<(), BehaviorError> {
    write(ctx, MemoryTag::TIMER, FragmentValue::Timer(timer))
}

pub(crate) fn read_rounds(ctx: &BehaviorContext<'_>) -> Option<RoundsValue> {
    first_value(ctx.read_memory(MemoryTag::ROUNDS), |v| v.as_rounds().copied())
}

pub(crate) fn write_rounds(ctx: &mut BehaviorContext<'_>, rounds: RoundsValue) -> Result<(), BehaviorError> {
    write(ctx, MemoryTag::ROUNDS, FragmentValue::Rounds(rounds))
}

pub(crate) fn read_cursor(ctx: &BehaviorContext<'_>) -> Option<ChildCursor> {
    first_value(ctx.read_memory(MemoryTag::CHILDREN), |v| v.as_children().copied())
}

pub(crate) fn write_cursor(ctx: &mut BehaviorContext<'_>, cursor: ChildCursor) -> Result<(), BehaviorError> {
    write(ctx, MemoryTag::CHILDREN, FragmentValue::Children(cursor))
}

/// Moves the round counter forward and announces it.
pub(crate) fn advance_round(ctx: &mut BehaviorContext<'_>) -> Result<RoundsValue, BehaviorError> {
    let mut rounds = read_rounds(ctx).ok_or(BehaviorError::MissingMemory {
        tag: MemoryTag::ROUNDS,
    })?;
    rounds.current = rounds.current.saturating_add(1);
    write_rounds(ctx, rounds)?;

    let event = Event::new(EventName::ROUNDS_CHANGED, ctx.now()).with_data(EventData::Rounds {
        owner: ctx.key(),
        round: rounds.current,
        total: rounds.total,
    });
    ctx.emit(event);
    Ok(rounds)
}
