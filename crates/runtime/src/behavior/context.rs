//! Capability surface handed to behavior hooks.
use workout_core::{
    BlockKey, Event, Fragment, MemoryRef, MemoryTag, OutputKind, SearchCriteria, TimeSpan,
    Timestamp, Visibility,
};

use super::{BehaviorError, Capability};
use crate::actions::{BoxedAction, EmitEventAction};
use crate::block::{BlockState, Completion};
use crate::events::{HandlerScope, HandlerTarget, SubscriptionId};
use crate::services::Services;

/// Per-call environment the runtime passes into a block.
pub(crate) struct HookEnv<'a> {
    pub services: &'a mut Services,
    /// Keys of the blocks below this one, root first.
    pub lineage: &'a [BlockKey],
    pub depth: usize,
    pub is_active: bool,
    pub now: Timestamp,
}

/// What a behavior may see and do during one hook call.
///
/// Behaviors never get the block, the stack or the bus. Stack changes are
/// requested through returned actions; everything else goes through here.
pub struct BehaviorContext<'a> {
    key: BlockKey,
    label: &'a str,
    fragments: &'a [Fragment],
    capabilities: &'a [Capability],
    behavior: usize,
    state: &'a mut BlockState,
    services: &'a mut Services,
    lineage: &'a [BlockKey],
    depth: usize,
    is_active: bool,
    now: Timestamp,
    pending: Vec<BoxedAction>,
}

impl<'a> BehaviorContext<'a> {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        key: BlockKey,
        label: &'a str,
        fragments: &'a [Fragment],
        capabilities: &'a [Capability],
        behavior: usize,
        state: &'a mut BlockState,
        services: &'a mut Services,
        lineage: &'a [BlockKey],
        depth: usize,
        is_active: bool,
        now: Timestamp,
    ) -> Self {
        Self {
            key,
            label,
            fragments,
            capabilities,
            behavior,
            state,
            services,
            lineage,
            depth,
            is_active,
            now,
            pending: Vec::new(),
        }
    }

    pub(crate) fn into_actions(self) -> Vec<BoxedAction> {
        self.pending
    }

    pub fn key(&self) -> BlockKey {
        self.key
    }

    pub fn label(&self) -> &str {
        self.label
    }

    /// Source fragments the block was compiled from.
    pub fn fragments(&self) -> &[Fragment] {
        self.fragments
    }

    pub fn now(&self) -> Timestamp {
        self.now
    }

    /// Stack depth of the block (root = 0).
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// True when the block is the innermost frame.
    pub fn is_active(&self) -> bool {
        self.is_active
    }

    /// Keys of the blocks below this one, root first.
    pub fn lineage(&self) -> &[BlockKey] {
        self.lineage
    }

    pub fn parent(&self) -> Option<BlockKey> {
        self.lineage.last().copied()
    }

    /// Whether a co-located behavior provides `capability`.
    pub fn has_capability(&self, capability: Capability) -> bool {
        self.capabilities.contains(&capability)
    }

    pub fn started_at(&self) -> Option<Timestamp> {
        self.state.timing.started_at
    }

    // ------------------------------------------------------------------
    // Completion
    // ------------------------------------------------------------------

    pub fn is_complete(&self) -> bool {
        self.state.completion.is_some()
    }

    pub fn completion(&self) -> Option<&Completion> {
        self.state.completion.as_ref()
    }

    /// Marks the block complete at the current time. Returns `false` if it
    /// already was; the first reason sticks.
    pub fn mark_complete(&mut self, reason: impl Into<String>) -> bool {
        self.state.mark_complete(reason.into(), self.now)
    }

    // ------------------------------------------------------------------
    // Memory
    // ------------------------------------------------------------------

    /// Allocates a location owned by this block.
    pub fn allocate(
        &mut self,
        tag: MemoryTag,
        initial: Vec<Fragment>,
        visibility: Visibility,
    ) -> MemoryRef {
        self.services
            .memory
            .allocate(tag, self.key, initial, visibility)
    }

    /// Reads through a handle, honoring visibility. `None` once released.
    pub fn get(&self, reference: &MemoryRef) -> Option<&[Fragment]> {
        if !self
            .services
            .memory
            .can_read(self.key, self.lineage, reference)
        {
            return None;
        }
        self.services.memory.get(reference)
    }

    /// Writes through a handle this block owns.
    pub fn set(&mut self, reference: &MemoryRef, value: Vec<Fragment>) -> Result<(), BehaviorError> {
        self.services.memory.set(reference, self.key, value)?;
        Ok(())
    }

    /// Appends another location under `tag`.
    pub fn push_memory(
        &mut self,
        tag: MemoryTag,
        fragments: Vec<Fragment>,
        visibility: Visibility,
    ) -> MemoryRef {
        self.services
            .memory
            .push(self.key, tag, fragments, visibility)
    }

    /// Replaces the first location of `tag` owned by this block.
    pub fn update_memory(&mut self, tag: MemoryTag, fragments: Vec<Fragment>) -> Option<MemoryRef> {
        self.services.memory.update(self.key, tag, fragments)
    }

    /// Updates the first location of `tag`, allocating it if missing.
    pub fn upsert_memory(
        &mut self,
        tag: MemoryTag,
        fragments: Vec<Fragment>,
        visibility: Visibility,
    ) -> MemoryRef {
        match self.services.memory.update(self.key, tag, fragments.clone()) {
            Some(reference) => reference,
            None => self.allocate(tag, fragments, visibility),
        }
    }

    /// First location of `tag` owned by this block.
    pub fn read_memory(&self, tag: MemoryTag) -> Option<&[Fragment]> {
        self.services.memory.read_tag(self.key, tag)
    }

    /// Nearest `tag` visible from this block: its own, then ancestors'.
    pub fn read_visible(&self, tag: MemoryTag) -> Option<&[Fragment]> {
        self.services
            .memory
            .read_visible(self.key, self.lineage, tag)
    }

    /// Handles matching `criteria` that this block may read.
    pub fn search(&self, criteria: &SearchCriteria) -> Vec<MemoryRef> {
        self.services
            .memory
            .search(criteria)
            .into_iter()
            .filter(|reference| {
                self.services
                    .memory
                    .can_read(self.key, self.lineage, reference)
            })
            .collect()
    }

    // ------------------------------------------------------------------
    // Events
    // ------------------------------------------------------------------

    /// Routes `event` to this behavior's `on_event` hook. Revoked
    /// automatically when the block unmounts.
    pub fn subscribe(&mut self, event: impl Into<String>, scope: HandlerScope) -> SubscriptionId {
        self.services.bus.register(
            event,
            self.key,
            scope,
            HandlerTarget::Behavior {
                index: self.behavior,
            },
        )
    }

    /// Drops one of this block's subscriptions.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        if self.services.bus.owner_of(id) != Some(self.key) {
            return false;
        }
        self.services.bus.unregister(id)
    }

    /// Queues `event` for dispatch after this hook returns.
    pub fn emit(&mut self, event: Event) {
        self.pending.push(Box::new(EmitEventAction { event }));
    }

    pub fn do_action(&mut self, action: BoxedAction) {
        self.pending.push(action);
    }

    // ------------------------------------------------------------------
    // Output
    // ------------------------------------------------------------------

    /// Appends an output statement owned by this block; returns its sequence.
    pub fn output(&mut self, kind: OutputKind, span: TimeSpan, fragments: Vec<Fragment>) -> u64 {
        self.services
            .output
            .append(kind, self.key, self.label, self.depth, span, fragments)
            .sequence
    }
}
