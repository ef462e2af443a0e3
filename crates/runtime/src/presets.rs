//! Behavior lists for the common block shapes.
//!
//! Each preset assembles the canonical behaviors for one kind of block and
//! returns a block that passes the default composition validator. Parameter
//! errors surface as [`ConfigError`] before anything is built.
use workout_core::{ConfigError, Fragment};

use crate::behaviors::{
    ChildLoop, ChildRunner, ChildrenCompletion, CompleteOnNext, Controls, Display, IntervalReset,
    MilestoneOutput, RepScheme, RoundAdvance, RoundCompletion, RoundInit, SegmentOutput,
    TimerCompletion, TimerInit, TimerPause, TimerTick,
};
use crate::block::{Block, BlockBuilder};
use crate::compiler::StatementId;

pub type ChildGroups = Vec<Vec<StatementId>>;

/// A single movement finished by the athlete pressing `next`.
pub fn effort(label: impl Into<String>, fragments: Vec<Fragment>) -> Block {
    effort_builder(label, fragments).build()
}

/// [`effort`] before it is built, for callers that pin the block key.
pub fn effort_builder(label: impl Into<String>, fragments: Vec<Fragment>) -> BlockBuilder {
    Block::builder(label)
        .fragments(fragments)
        .behavior(CompleteOnNext)
        .behavior(Display)
        .behavior(Controls::leaf())
        .behavior(SegmentOutput)
}

/// Runs its children once each, in order.
pub fn group(label: impl Into<String>, fragments: Vec<Fragment>, children: ChildGroups) -> Block {
    let count = children.len();
    Block::builder(label)
        .fragments(fragments)
        .behavior(ChildrenCompletion::new(count))
        .behavior(ChildRunner::new(children))
        .behavior(Display)
        .behavior(Controls::leaf())
        .behavior(SegmentOutput)
        .build()
}

/// A countdown (or stopwatch when `duration_ms` is `None`) around its
/// children. Without children it also completes on `next`.
pub fn timer(
    label: impl Into<String>,
    fragments: Vec<Fragment>,
    duration_ms: Option<u64>,
    children: ChildGroups,
) -> Result<Block, ConfigError> {
    let mut builder = timed(label, fragments, duration_ms)?;
    if children.is_empty() {
        builder.push(CompleteOnNext);
    } else {
        builder.push(ChildrenCompletion::new(children.len()));
        builder.push(ChildRunner::new(children));
    }
    Ok(presentation(builder, Controls::timer()).build())
}

/// A fixed number of rounds over its children, optionally with a rep
/// scheme. When `rounds` is `None` the scheme length is the round count.
pub fn rounds(
    label: impl Into<String>,
    fragments: Vec<Fragment>,
    rounds: Option<u32>,
    scheme: Option<Vec<u32>>,
    children: ChildGroups,
) -> Result<Block, ConfigError> {
    let scheme = scheme.map(RepScheme::new).transpose()?;
    let total = match (&scheme, rounds) {
        (Some(scheme), Some(rounds)) if scheme.reps().len() > 1 && scheme.reps().len() != rounds as usize => {
            return Err(ConfigError::RepSchemeLengthMismatch {
                scheme: scheme.reps().len(),
                rounds,
            });
        }
        (_, Some(rounds)) => rounds,
        (Some(scheme), None) => u32::try_from(scheme.reps().len()).unwrap_or(u32::MAX),
        (None, None) => 1,
    };

    let mut builder = Block::builder(label)
        .fragments(fragments)
        .behavior(RoundInit::new(Some(total)))
        .behavior(RoundAdvance)
        .behavior(RoundCompletion);
    if let Some(scheme) = scheme {
        builder.push(scheme);
    }
    push_looping_children(&mut builder, children);
    builder.push(MilestoneOutput::default());
    Ok(presentation(builder, Controls::leaf()).build())
}

/// As many rounds as possible before the countdown runs out.
pub fn amrap(
    label: impl Into<String>,
    fragments: Vec<Fragment>,
    duration_ms: u64,
    children: ChildGroups,
) -> Result<Block, ConfigError> {
    let mut builder = timed(label, fragments, Some(duration_ms))?
        .behavior(RoundInit::new(None))
        .behavior(RoundAdvance);
    push_looping_children(&mut builder, children);
    builder.push(MilestoneOutput::default());
    Ok(presentation(builder, Controls::timer()).build())
}

/// Every minute on the minute: `rounds` intervals of `interval_ms`.
///
/// With `rounds` of `None` the intervals repeat until the block is skipped.
/// Zero rounds complete the block at mount.
pub fn emom(
    label: impl Into<String>,
    fragments: Vec<Fragment>,
    rounds: Option<u32>,
    interval_ms: u64,
    children: ChildGroups,
) -> Result<Block, ConfigError> {
    let builder = Block::builder(label)
        .fragments(fragments)
        .behavior(TimerInit::countdown(interval_ms)?)
        .behavior(TimerTick::default())
        .behavior(TimerPause)
        .behavior(RoundInit::new(rounds))
        .behavior(IntervalReset)
        .behavior(ChildRunner::new(children))
        .behavior(MilestoneOutput::default());
    Ok(presentation(builder, Controls::timer()).build())
}

fn timed(
    label: impl Into<String>,
    fragments: Vec<Fragment>,
    duration_ms: Option<u64>,
) -> Result<BlockBuilder, ConfigError> {
    let timer = match duration_ms {
        Some(duration) => TimerInit::countdown(duration)?,
        None => TimerInit::count_up(None)?,
    };
    let mut builder = Block::builder(label)
        .fragments(fragments)
        .behavior(timer)
        .behavior(TimerTick::default())
        .behavior(TimerPause);
    if duration_ms.is_some() {
        builder.push(TimerCompletion);
    }
    Ok(builder)
}

fn push_looping_children(builder: &mut BlockBuilder, children: ChildGroups) {
    if !children.is_empty() {
        builder.push(ChildLoop);
        builder.push(ChildRunner::new(children));
    }
}

fn presentation(builder: BlockBuilder, controls: Controls) -> BlockBuilder {
    builder
        .behavior(Display)
        .behavior(controls)
        .behavior(SegmentOutput)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::behavior::CompositionValidator;

    fn assert_valid(block: &Block) {
        let result = CompositionValidator::default().validate(block.behaviors());
        assert!(result.valid, "{}: {:?}", block.label(), result.errors);
    }

    fn children() -> ChildGroups {
        vec![vec![StatementId(1)], vec![StatementId(2)]]
    }

    #[test]
    fn every_preset_passes_validation() {
        assert_valid(&effort("Pushups", vec![]));
        assert_valid(&group("Warmup", vec![], children()));
        assert_valid(&timer("For Time", vec![], None, children()).unwrap());
        assert_valid(&timer("Plank", vec![], Some(60_000), vec![]).unwrap());
        assert_valid(&rounds("Fran", vec![], None, Some(vec![21, 15, 9]), children()).unwrap());
        assert_valid(&rounds("5 Rounds", vec![], Some(5), None, vec![]).unwrap());
        assert_valid(&amrap("Cindy", vec![], 1_200_000, children()).unwrap());
        assert_valid(&emom("EMOM 10", vec![], Some(10), 60_000, children()).unwrap());
    }

    #[test]
    fn scheme_length_must_match_bounded_rounds() {
        let err = rounds("Bad", vec![], Some(4), Some(vec![21, 15, 9]), vec![]).err();
        assert_eq!(
            err,
            Some(ConfigError::RepSchemeLengthMismatch {
                scheme: 3,
                rounds: 4
            })
        );
        assert!(rounds("Single", vec![], Some(4), Some(vec![10]), vec![]).is_ok());
    }

    #[test]
    fn zero_duration_is_a_config_error() {
        assert!(amrap("Nope", vec![], 0, vec![]).is_err());
        assert!(emom("Nope", vec![], Some(10), 0, vec![]).is_err());
    }

    #[test]
    fn behaviors_are_ordered_by_stage() {
        let block = amrap("Cindy", vec![], 1_200_000, children()).unwrap();
        assert_eq!(
            block.behavior_names(),
            [
                "timer_init",
                "timer_pause",
                "round_init",
                "round_advance",
                "timer_tick",
                "timer_completion",
                "child_loop",
                "child_runner",
                "milestone_output",
                "display",
                "controls",
                "segment_output",
            ]
        );
    }
}
