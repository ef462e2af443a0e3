//! Stack frames and their lifecycle.
//!
//! A [`Block`] unites an identity, source fragments and an ordered behavior
//! list. The runtime drives it through
//!
//! ```text
//! Created ──mount──▶ Mounted ──next*──▶ Mounted ──unmount──▶ Unmounted ──dispose──▶ Disposed
//! ```
//!
//! Calls that do not match the current phase are ignored and reported as
//! [`Diagnostic::LifecycleViolation`]; hooks never run twice. Completion is a
//! separate, monotonic flag: once set it is never cleared and its first
//! reason sticks.
mod builder;

pub use builder::BlockBuilder;

use std::fmt;

use tracing::debug;
use workout_core::{BlockKey, Event, Fragment, Timestamp};

use crate::actions::BoxedAction;
use crate::behavior::{
    Behavior, BehaviorContext, Capability, HookEnv, HookKind, HookResult, NextOptions,
};
use crate::diagnostics::Diagnostic;

/// Completion reasons used by the runtime and the built-in behaviors.
pub mod reason {
    pub const SKIPPED: &str = "skipped";
    pub const PARENT_COMPLETED: &str = "parent-completed";
    pub const TIMER_EXPIRED: &str = "timer-expired";
    pub const ROUNDS_COMPLETE: &str = "rounds-complete";
    pub const INTERVALS_COMPLETE: &str = "intervals-complete";
    pub const CHILDREN_COMPLETE: &str = "children-complete";
    pub const ADVANCED: &str = "advanced";
}

#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, strum::Display, strum::AsRefStr,
)]
#[strum(serialize_all = "snake_case")]
pub enum BlockPhase {
    #[default]
    Created,
    Mounted,
    Unmounted,
    Disposed,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Completion {
    pub reason: String,
    pub at: Timestamp,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BlockTiming {
    pub started_at: Option<Timestamp>,
    pub completed_at: Option<Timestamp>,
}

/// Mutable part of a block that behaviors may touch through their context.
#[derive(Debug, Default)]
pub(crate) struct BlockState {
    pub phase: BlockPhase,
    pub completion: Option<Completion>,
    pub timing: BlockTiming,
}

impl BlockState {
    pub fn mark_complete(&mut self, reason: String, at: Timestamp) -> bool {
        if self.completion.is_some() {
            return false;
        }
        self.completion = Some(Completion { reason, at });
        true
    }
}

pub struct Block {
    key: BlockKey,
    label: String,
    fragments: Vec<Fragment>,
    behaviors: Vec<Box<dyn Behavior>>,
    capabilities: Vec<Capability>,
    state: BlockState,
}

impl Block {
    pub fn builder(label: impl Into<String>) -> BlockBuilder {
        BlockBuilder::new(label)
    }

    pub(crate) fn from_parts(
        key: BlockKey,
        label: String,
        fragments: Vec<Fragment>,
        behaviors: Vec<Box<dyn Behavior>>,
    ) -> Self {
        let mut capabilities: Vec<Capability> = behaviors
            .iter()
            .flat_map(|behavior| behavior.capabilities().iter().copied())
            .collect();
        capabilities.sort();
        capabilities.dedup();

        Self {
            key,
            label,
            fragments,
            behaviors,
            capabilities,
            state: BlockState::default(),
        }
    }

    pub fn key(&self) -> BlockKey {
        self.key
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn fragments(&self) -> &[Fragment] {
        &self.fragments
    }

    pub fn behaviors(&self) -> &[Box<dyn Behavior>] {
        &self.behaviors
    }

    /// Behavior names in execution order.
    pub fn behavior_names(&self) -> Vec<&'static str> {
        self.behaviors.iter().map(|b| b.name()).collect()
    }

    pub fn has_capability(&self, capability: Capability) -> bool {
        self.capabilities.binary_search(&capability).is_ok()
    }

    /// First co-located behavior providing `capability`.
    pub fn behavior(&self, capability: Capability) -> Option<&dyn Behavior> {
        self.behaviors
            .iter()
            .find(|b| b.capabilities().contains(&capability))
            .map(|b| b.as_ref())
    }

    pub fn phase(&self) -> BlockPhase {
        self.state.phase
    }

    pub fn is_complete(&self) -> bool {
        self.state.completion.is_some()
    }

    pub fn completion(&self) -> Option<&Completion> {
        self.state.completion.as_ref()
    }

    pub fn timing(&self) -> BlockTiming {
        self.state.timing
    }

    pub(crate) fn mark_complete(&mut self, reason: impl Into<String>, at: Timestamp) -> bool {
        let reason = reason.into();
        if !self.state.mark_complete(reason.clone(), at) {
            return false;
        }
        debug!(
            target: "runtime::block",
            block = %self.key,
            label = %self.label,
            reason = %reason,
            "Block complete"
        );
        true
    }

    // ------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------

    pub(crate) fn mount(&mut self, env: &mut HookEnv<'_>) -> Vec<BoxedAction> {
        if !self.enter(env, HookKind::Mount, BlockPhase::Created, BlockPhase::Mounted) {
            return Vec::new();
        }
        self.state.timing.started_at = Some(env.now);
        self.run(env, HookKind::Mount, None, |b, ctx| b.on_mount(ctx))
    }

    pub(crate) fn next(&mut self, env: &mut HookEnv<'_>, options: &NextOptions) -> Vec<BoxedAction> {
        if !self.expect(env, HookKind::Next, BlockPhase::Mounted) {
            return Vec::new();
        }
        self.run(env, HookKind::Next, None, |b, ctx| b.on_next(ctx, options))
    }

    pub(crate) fn unmount(&mut self, env: &mut HookEnv<'_>) -> Vec<BoxedAction> {
        if !self.enter(env, HookKind::Unmount, BlockPhase::Mounted, BlockPhase::Unmounted) {
            return Vec::new();
        }
        let completed_at = self.state.completion.as_ref().map_or(env.now, |c| c.at);
        self.state.timing.completed_at = Some(completed_at);
        self.run(env, HookKind::Unmount, None, |b, ctx| b.on_unmount(ctx))
    }

    pub(crate) fn dispose(&mut self, env: &mut HookEnv<'_>) {
        if !self.enter(env, HookKind::Dispose, BlockPhase::Unmounted, BlockPhase::Disposed) {
            return;
        }
        // Anything a dispose hook queues has no frame left to act on.
        let dropped = self.run(env, HookKind::Dispose, None, |b, ctx| {
            b.on_dispose(ctx).map(|()| Vec::new())
        });
        if !dropped.is_empty() {
            debug!(
                target: "runtime::block",
                block = %self.key,
                label = %self.label,
                dropped = dropped.len(),
                "Discarded actions queued during dispose"
            );
        }
    }

    /// Routes an event to the behavior at `index`.
    pub(crate) fn handle_event(
        &mut self,
        index: usize,
        event: &Event,
        env: &mut HookEnv<'_>,
    ) -> Vec<BoxedAction> {
        if !self.expect(env, HookKind::Event, BlockPhase::Mounted) {
            return Vec::new();
        }
        self.run(env, HookKind::Event, Some(index), |b, ctx| b.on_event(event, ctx))
    }

    fn expect(&self, env: &mut HookEnv<'_>, attempted: HookKind, phase: BlockPhase) -> bool {
        if self.state.phase == phase {
            return true;
        }
        env.services.diagnostics.report(&Diagnostic::LifecycleViolation {
            block: self.key,
            phase: self.state.phase,
            attempted,
        });
        false
    }

    fn enter(
        &mut self,
        env: &mut HookEnv<'_>,
        attempted: HookKind,
        from: BlockPhase,
        to: BlockPhase,
    ) -> bool {
        if !self.expect(env, attempted, from) {
            return false;
        }
        self.state.phase = to;
        true
    }

    fn run<F>(
        &mut self,
        env: &mut HookEnv<'_>,
        hook: HookKind,
        only: Option<usize>,
        mut call: F,
    ) -> Vec<BoxedAction>
    where
        F: FnMut(&mut dyn Behavior, &mut BehaviorContext<'_>) -> HookResult,
    {
        let Self {
            key,
            label,
            fragments,
            behaviors,
            capabilities,
            state,
        } = self;

        let mut actions = Vec::new();
        for (index, behavior) in behaviors.iter_mut().enumerate() {
            if only.is_some_and(|target| target != index) {
                continue;
            }

            let mut ctx = BehaviorContext::new(
                *key,
                label.as_str(),
                fragments.as_slice(),
                capabilities.as_slice(),
                index,
                state,
                env.services,
                env.lineage,
                env.depth,
                env.is_active,
                env.now,
            );
            let result = call(behavior.as_mut(), &mut ctx);
            let pending = ctx.into_actions();

            match result {
                Ok(returned) => {
                    actions.extend(pending);
                    actions.extend(returned);
                }
                Err(error) => env.services.diagnostics.report(&Diagnostic::HookFailed {
                    block: *key,
                    label: label.clone(),
                    behavior: behavior.name(),
                    hook,
                    error: error.to_string(),
                }),
            }
        }
        actions
    }
}

impl fmt::Debug for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Block")
            .field("key", &self.key)
            .field("label", &self.label)
            .field("behaviors", &self.behavior_names())
            .field("phase", &self.state.phase)
            .field("completion", &self.state.completion)
            .finish()
    }
}
