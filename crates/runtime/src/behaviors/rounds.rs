//! Round aspect: counter, advancement, bounded completion and rep schemes.
use workout_core::{ConfigError, Fragment, FragmentValue, MemoryTag, RoundsValue, Visibility};

use super::{advance_round, read_cursor, read_rounds};
use crate::behavior::{
    Behavior, BehaviorContext, Capability, HookResult, NextOptions, Requirement, stage,
};
use crate::block::reason;

const NEEDS_ROUNDS: &[Requirement] =
    &[Requirement::new("a round source", &[Capability::RoundSource])];

/// Allocates the inherited round counter, starting at round 1.
///
/// A bound of zero is allowed; the block completes as soon as a
/// [`RoundCompletion`] sees the counter.
#[derive(Debug, Clone, Copy, Default)]
pub struct RoundInit {
    total: Option<u32>,
}

impl RoundInit {
    pub const fn new(total: Option<u32>) -> Self {
        Self { total }
    }

    pub const fn total(&self) -> Option<u32> {
        self.total
    }
}

impl Behavior for RoundInit {
    fn name(&self) -> &'static str {
        "round_init"
    }

    fn capabilities(&self) -> &'static [Capability] {
        &[Capability::RoundSource]
    }

    fn priority(&self) -> i32 {
        stage::INIT
    }

    fn produces(&self) -> &'static [MemoryTag] {
        &[MemoryTag::ROUNDS]
    }

    fn on_mount(&mut self, ctx: &mut BehaviorContext<'_>) -> HookResult {
        let value = FragmentValue::Rounds(RoundsValue::new(self.total));
        let fragment = Fragment::runtime(value, ctx.key(), ctx.now());
        ctx.allocate(MemoryTag::ROUNDS, vec![fragment], Visibility::Inherited);
        Ok(Vec::new())
    }
}

/// Advances the round on `next` once the child cycle is exhausted, or on
/// every `next` when the block has no children.
#[derive(Debug, Clone, Copy, Default)]
pub struct RoundAdvance;

impl Behavior for RoundAdvance {
    fn name(&self) -> &'static str {
        "round_advance"
    }

    fn capabilities(&self) -> &'static [Capability] {
        &[Capability::RoundAdvance]
    }

    fn requirements(&self) -> &'static [Requirement] {
        NEEDS_ROUNDS
    }

    fn priority(&self) -> i32 {
        stage::ADVANCE
    }

    fn produces(&self) -> &'static [MemoryTag] {
        &[MemoryTag::ROUNDS]
    }

    fn on_next(&mut self, ctx: &mut BehaviorContext<'_>, options: &NextOptions) -> HookResult {
        if options.is_interval() || ctx.is_complete() {
            return Ok(Vec::new());
        }
        if read_cursor(ctx).is_none_or(|cursor| cursor.is_exhausted()) {
            advance_round(ctx)?;
        }
        Ok(Vec::new())
    }
}

/// Completes the block once a bounded round counter moves past its total.
#[derive(Debug, Clone, Copy, Default)]
pub struct RoundCompletion;

impl RoundCompletion {
    fn check(ctx: &mut BehaviorContext<'_>) {
        if read_rounds(ctx).is_some_and(|rounds| rounds.is_exhausted()) {
            ctx.mark_complete(reason::ROUNDS_COMPLETE);
        }
    }
}

impl Behavior for RoundCompletion {
    fn name(&self) -> &'static str {
        "round_completion"
    }

    fn capabilities(&self) -> &'static [Capability] {
        &[Capability::RoundCompletion]
    }

    fn requirements(&self) -> &'static [Requirement] {
        NEEDS_ROUNDS
    }

    fn priority(&self) -> i32 {
        stage::COMPLETION
    }

    fn consumes(&self) -> &'static [MemoryTag] {
        &[MemoryTag::ROUNDS]
    }

    fn on_mount(&mut self, ctx: &mut BehaviorContext<'_>) -> HookResult {
        Self::check(ctx);
        Ok(Vec::new())
    }

    fn on_next(&mut self, ctx: &mut BehaviorContext<'_>, _options: &NextOptions) -> HookResult {
        Self::check(ctx);
        Ok(Vec::new())
    }
}

/// Publishes the rep target of the current round as inherited memory.
///
/// Targets cycle round-robin: `[21, 15, 9]` yields 21, 15, 9, 21, ...
#[derive(Debug, Clone)]
pub struct RepScheme {
    reps: Vec<u32>,
}

impl RepScheme {
    pub fn new(reps: Vec<u32>) -> Result<Self, ConfigError> {
        if reps.is_empty() {
            return Err(ConfigError::EmptyRepScheme);
        }
        if let Some(index) = reps.iter().position(|&count| count == 0) {
            return Err(ConfigError::ZeroRepCount { index });
        }
        Ok(Self { reps })
    }

    pub fn reps(&self) -> &[u32] {
        &self.reps
    }

    /// Target for a 1-based round number.
    pub fn target_for(&self, round: u32) -> u32 {
        let index = round.saturating_sub(1) as usize % self.reps.len();
        self.reps[index]
    }

    fn promote(&self, ctx: &mut BehaviorContext<'_>) {
        if ctx.is_complete() {
            return;
        }
        let round = read_rounds(ctx).map_or(1, |rounds| rounds.current);
        let fragment = Fragment::runtime(
            FragmentValue::Rep(self.target_for(round)),
            ctx.key(),
            ctx.now(),
        );
        ctx.upsert_memory(MemoryTag::REP_TARGET, vec![fragment], Visibility::Inherited);
    }
}

impl Behavior for RepScheme {
    fn name(&self) -> &'static str {
        "rep_scheme"
    }

    fn capabilities(&self) -> &'static [Capability] {
        &[Capability::RepScheme]
    }

    fn requirements(&self) -> &'static [Requirement] {
        NEEDS_ROUNDS
    }

    fn priority(&self) -> i32 {
        stage::PROMOTION
    }

    fn produces(&self) -> &'static [MemoryTag] {
        &[MemoryTag::REP_TARGET]
    }

    fn consumes(&self) -> &'static [MemoryTag] {
        &[MemoryTag::ROUNDS]
    }

    fn on_mount(&mut self, ctx: &mut BehaviorContext<'_>) -> HookResult {
        self.promote(ctx);
        Ok(Vec::new())
    }

    fn on_next(&mut self, ctx: &mut BehaviorContext<'_>, _options: &NextOptions) -> HookResult {
        self.promote(ctx);
        Ok(Vec::new())
    }
}
