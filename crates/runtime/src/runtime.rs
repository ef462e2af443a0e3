//! Session orchestrator.
//!
//! [`ScriptRuntime`] owns the stack, the event bus, the action queue, block
//! memory, the output log, the clock and the compiler seam. Every external
//! entry point (`handle`, `tick`, `advance`, `skip`, `push`, ...) runs one
//! processing cycle:
//!
//! 1. turn the input into actions (event dispatch, lifecycle call)
//! 2. drain the action queue depth-first
//! 3. sweep: pop completed frames innermost first, calling `next` on each
//!    parent that is still running, and drain again
//!
//! Control returns to the host only when the queue is empty and no frame on
//! the stack is complete.
use std::sync::Arc;

use tracing::{debug, info, trace};
use workout_core::{
    BlockKey, Event, EventName, MemorySnapshot, MemoryStore, OutputStatement, Timestamp,
};

use crate::actions::{AdvanceInnermostAction, ActionQueue, BoxedAction, SkipInnermostAction};
use crate::api::{FrameSnapshot, Result, RuntimeError, RuntimeSnapshot};
use crate::behavior::{CompositionError, CompositionValidator, HookEnv, NextOptions, NextTrigger};
use crate::block::{Block, reason};
use crate::clock::{Clock, SystemClock};
use crate::compiler::{BlockCompiler, CompileContext, StatementId};
use crate::diagnostics::{Diagnostic, DiagnosticSink, TracingDiagnostics};
use crate::events::SubscriptionId;
use crate::services::Services;
use crate::stack::RuntimeStack;

/// Runtime configuration.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// Actions one processing cycle may execute before the rest are dropped.
    pub max_actions_per_cycle: usize,
    /// Frames the stack may hold.
    pub max_stack_depth: usize,
    /// Suggested spacing of host `tick` events, in milliseconds.
    pub tick_interval_ms: u64,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            max_actions_per_cycle: 10_000,
            max_stack_depth: 64,
            tick_interval_ms: 100,
        }
    }
}

#[derive(Debug, Default)]
struct CycleBudget {
    executed: usize,
    exceeded: bool,
}

/// One executing workout session.
pub struct ScriptRuntime {
    config: RuntimeConfig,
    stack: RuntimeStack,
    services: Services,
    queue: ActionQueue,
    compiler: Option<Box<dyn BlockCompiler>>,
    validator: CompositionValidator,
    budget: CycleBudget,
    /// Time of the cycle in progress.
    now: Timestamp,
    started: bool,
}

impl ScriptRuntime {
    pub fn builder() -> RuntimeBuilder {
        RuntimeBuilder::new()
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    /// Current clock time.
    pub fn now(&self) -> Timestamp {
        self.services.clock.now()
    }

    // ------------------------------------------------------------------
    // Host entry points
    // ------------------------------------------------------------------

    /// Compiles the root statement group and pushes it.
    pub fn start(&mut self, statements: &[StatementId]) -> Result<BlockKey> {
        let now = self.now();
        let compiler = self
            .compiler
            .as_mut()
            .ok_or(RuntimeError::MissingCompiler)?;
        let ctx = CompileContext::root(now, &self.services.memory);
        let block = compiler.compile(statements, &ctx)?;
        info!(
            target: "runtime::session",
            label = %block.label(),
            statements = statements.len(),
            "Starting session"
        );
        self.push(block)
    }

    /// Validates and pushes a block as the new innermost frame.
    pub fn push(&mut self, block: Block) -> Result<BlockKey> {
        self.begin_cycle(self.now());
        let key = self.activate(block)?;
        self.process();
        Ok(key)
    }

    /// Routes an external event through the bus.
    pub fn handle(&mut self, event: Event) {
        self.begin_cycle(event.timestamp);
        trace!(target: "runtime::events", event = %event.name, at = %event.timestamp, "Handling event");
        let actions = self.dispatch(&event);
        self.queue.push_all(actions);
        self.process();
    }

    /// Delivers a `tick` stamped with the clock's current time.
    pub fn tick(&mut self) {
        let now = self.now();
        self.handle(Event::tick(now));
    }

    /// The `next` control: advances the innermost block.
    pub fn advance(&mut self) {
        self.do_action(Box::new(AdvanceInnermostAction));
    }

    /// Abandons the innermost block.
    pub fn skip(&mut self) {
        self.do_action(Box::new(SkipInnermostAction));
    }

    pub fn pause(&mut self) {
        let now = self.now();
        self.handle(Event::new(EventName::TIMER_PAUSE, now));
    }

    pub fn resume(&mut self) {
        let now = self.now();
        self.handle(Event::new(EventName::TIMER_RESUME, now));
    }

    pub fn do_action(&mut self, action: BoxedAction) {
        self.do_all(vec![action]);
    }

    /// Runs `actions` in list order, then sweeps.
    pub fn do_all(&mut self, actions: Vec<BoxedAction>) {
        self.begin_cycle(self.now());
        self.queue.push_all(actions);
        self.process();
    }

    /// Registers a host callback; it fires for every matching event.
    pub fn subscribe(
        &mut self,
        event: impl Into<String>,
        callback: impl FnMut(&Event) -> Vec<BoxedAction> + Send + 'static,
    ) -> SubscriptionId {
        self.services.bus.register_callback(event, callback)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.services.bus.unregister(id)
    }

    // ------------------------------------------------------------------
    // Read-only views
    // ------------------------------------------------------------------

    pub fn stack(&self) -> &RuntimeStack {
        &self.stack
    }

    pub fn current(&self) -> Option<&Block> {
        self.stack.current()
    }

    pub fn memory(&self) -> &MemoryStore {
        &self.services.memory
    }

    /// Public and inherited memory, for presentation.
    pub fn visible_memory(&self) -> Vec<MemorySnapshot> {
        self.services.memory.visible_snapshot()
    }

    pub fn outputs(&self) -> &[OutputStatement] {
        self.services.output.all()
    }

    pub fn outputs_since(&self, cursor: usize) -> &[OutputStatement] {
        self.services.output.since(cursor)
    }

    pub fn snapshot(&self) -> RuntimeSnapshot {
        RuntimeSnapshot {
            now: self.now(),
            stack: self
                .stack
                .iter()
                .enumerate()
                .map(|(depth, block)| FrameSnapshot::of(block, depth))
                .collect(),
            memory: self.visible_memory(),
            outputs: self.services.output.len(),
        }
    }

    /// True once something was pushed and the stack has emptied.
    pub fn is_finished(&self) -> bool {
        self.started && self.stack.is_empty()
    }

    // ------------------------------------------------------------------
    // Operations used by actions
    // ------------------------------------------------------------------

    /// Validates `block`, pushes it and runs its mount hooks.
    pub(crate) fn activate(&mut self, block: Block) -> Result<BlockKey> {
        let validation = self.validator.validate(block.behaviors());
        for warning in &validation.warnings {
            debug!(
                target: "runtime::validation",
                label = %block.label(),
                warning = %warning,
                "Composition warning"
            );
        }
        if !validation.valid {
            let errors = validation.errors;
            self.report(Diagnostic::CompositionRejected {
                label: block.label().to_owned(),
                errors: errors.iter().map(ToString::to_string).collect(),
            });
            return Err(CompositionError {
                label: block.label().to_owned(),
                errors,
            }
            .into());
        }

        if self.stack.len() >= self.config.max_stack_depth {
            return Err(RuntimeError::StackOverflow {
                limit: self.config.max_stack_depth,
            });
        }

        let key = block.key();
        debug!(
            target: "runtime::stack",
            block = %key,
            label = %block.label(),
            depth = self.stack.len(),
            behaviors = ?block.behavior_names(),
            "Pushing block"
        );
        self.stack.push(block);
        self.started = true;

        let position = self.stack.len() - 1;
        let now = self.now;
        let actions = self.invoke(position, now, |block, env| block.mount(env));
        self.queue.push_all(actions);
        Ok(key)
    }

    /// Compiles `statements` as a child of `parent` and pushes the result.
    pub(crate) fn compile_child(&mut self, parent: BlockKey, statements: &[StatementId]) -> Result<()> {
        let Some(block) = self.stack.find(parent) else {
            return Err(RuntimeError::BlockNotFound(parent));
        };
        if block.is_complete() {
            return Ok(());
        }

        let lineage = self.stack.keys();
        let Some(compiler) = self.compiler.as_mut() else {
            return Err(RuntimeError::MissingCompiler);
        };
        let ctx = CompileContext::new(
            Some(parent),
            lineage.len(),
            self.now,
            &lineage,
            &self.services.memory,
        );
        match compiler.compile(statements, &ctx) {
            Ok(child) => self.activate(child).map(|_| ()),
            Err(error) => {
                self.report(Diagnostic::CompileFailed {
                    parent: Some(parent),
                    error: error.to_string(),
                });
                Ok(())
            }
        }
    }

    /// Calls `next` on a running block.
    pub(crate) fn next_block(&mut self, key: BlockKey, trigger: NextTrigger) -> Result<Vec<BoxedAction>> {
        let position = self
            .stack
            .position(key)
            .ok_or(RuntimeError::BlockNotFound(key))?;
        if self.stack.get(position).is_some_and(Block::is_complete) {
            return Ok(Vec::new());
        }

        let now = match trigger {
            NextTrigger::ChildCompleted { at, .. } | NextTrigger::Interval { at } => at,
            NextTrigger::External => self.now,
        };
        let options = NextOptions::new(now, trigger);
        Ok(self.invoke(position, now, |block, env| block.next(env, &options)))
    }

    pub(crate) fn mark_block_complete(&mut self, key: BlockKey, reason: String) -> Result<()> {
        let now = self.now;
        let block = self
            .stack
            .find_mut(key)
            .ok_or(RuntimeError::BlockNotFound(key))?;
        block.mark_complete(reason, now);
        Ok(())
    }

    /// Delivers `event` to every matching subscription, in registration
    /// order, and collects the actions they return.
    pub(crate) fn dispatch(&mut self, event: &Event) -> Vec<BoxedAction> {
        let keys = self.stack.keys();
        let deliveries = self.services.bus.deliveries(&event.name, &keys);

        let mut actions = Vec::new();
        for delivery in deliveries {
            // An earlier handler in this dispatch may have unsubscribed it.
            if !self.services.bus.is_registered(delivery.id) {
                continue;
            }
            match delivery.behavior {
                Some(index) => {
                    let Some(position) = self.stack.position(delivery.owner) else {
                        continue;
                    };
                    actions.extend(self.invoke(position, event.timestamp, |block, env| {
                        block.handle_event(index, event, env)
                    }));
                }
                None => actions.extend(self.services.bus.invoke_callback(delivery.id, event)),
            }
        }
        actions
    }

    // ------------------------------------------------------------------
    // Processing cycle
    // ------------------------------------------------------------------

    fn begin_cycle(&mut self, now: Timestamp) {
        self.now = now;
        self.budget = CycleBudget::default();
    }

    fn process(&mut self) {
        loop {
            self.drain();
            if !self.sweep_step() {
                break;
            }
        }
    }

    fn drain(&mut self) {
        while let Some(action) = self.queue.pop() {
            if self.budget.executed >= self.config.max_actions_per_cycle {
                self.queue.clear();
                if !self.budget.exceeded {
                    self.budget.exceeded = true;
                    self.report(Diagnostic::DrainBudgetExceeded {
                        executed: self.budget.executed,
                    });
                }
                return;
            }
            self.budget.executed += 1;

            let name = action.name();
            trace!(target: "runtime::actions", action = name, "Executing action");
            match action.execute(self) {
                Ok(follow_ups) => self.queue.push_all(follow_ups),
                Err(error) => self.report(Diagnostic::ActionFailed {
                    action: name,
                    error: error.to_string(),
                }),
            }
        }
    }

    /// Pops one completed frame. Returns `false` when nothing is complete.
    fn sweep_step(&mut self) -> bool {
        let Some(index) = self.stack.first_complete_index() else {
            return false;
        };

        let at = self
            .stack
            .get(index)
            .and_then(Block::completion)
            .map_or(self.now, |completion| completion.at);
        for position in index + 1..self.stack.len() {
            if let Some(block) = self.stack.get_mut(position) {
                block.mark_complete(reason::PARENT_COMPLETED, at);
            }
        }

        self.pop_innermost();
        true
    }

    fn pop_innermost(&mut self) {
        let Some(block) = self.stack.current() else {
            return;
        };
        let key = block.key();
        let at = block.completion().map_or(self.now, |completion| completion.at);
        let position = self.stack.len() - 1;

        let actions = self.invoke(position, at, |block, env| block.unmount(env));
        let revoked = self.services.bus.unregister_owner(key);
        self.queue.push_all(actions);
        self.drain();

        let Some((position, mut block)) = self.stack.remove(key) else {
            return;
        };
        let lineage = self.stack.lineage(position);
        let mut env = HookEnv {
            services: &mut self.services,
            lineage: &lineage,
            depth: position,
            is_active: false,
            now: at,
        };
        block.dispose(&mut env);
        let released = self.services.memory.release(key);
        debug!(
            target: "runtime::stack",
            block = %key,
            label = %block.label(),
            reason = block.completion().map_or("", |c| c.reason.as_str()),
            revoked,
            released,
            "Popped block"
        );

        if let Some(parent) = self.stack.current()
            && !parent.is_complete()
        {
            let parent_position = self.stack.len() - 1;
            let options = NextOptions::new(at, NextTrigger::ChildCompleted { child: key, at });
            let actions = self.invoke(parent_position, at, |block, env| block.next(env, &options));
            self.queue.push_all(actions);
        }

        if self.stack.is_empty() {
            info!(target: "runtime::session", at = %at, "Session finished");
        }
    }

    fn invoke<F>(&mut self, position: usize, now: Timestamp, call: F) -> Vec<BoxedAction>
    where
        F: FnOnce(&mut Block, &mut HookEnv<'_>) -> Vec<BoxedAction>,
    {
        let lineage = self.stack.lineage(position);
        let is_active = position + 1 == self.stack.len();
        let Some(block) = self.stack.get_mut(position) else {
            return Vec::new();
        };
        let mut env = HookEnv {
            services: &mut self.services,
            lineage: &lineage,
            depth: position,
            is_active,
            now,
        };
        call(block, &mut env)
    }

    fn report(&self, diagnostic: Diagnostic) {
        self.services.diagnostics.report(&diagnostic);
    }
}

/// Builder for [`ScriptRuntime`].
pub struct RuntimeBuilder {
    config: RuntimeConfig,
    clock: Option<Box<dyn Clock>>,
    diagnostics: Option<Arc<dyn DiagnosticSink>>,
    compiler: Option<Box<dyn BlockCompiler>>,
    validator: Option<CompositionValidator>,
    default_controls: bool,
}

impl RuntimeBuilder {
    fn new() -> Self {
        Self {
            config: RuntimeConfig::default(),
            clock: None,
            diagnostics: None,
            compiler: None,
            validator: None,
            default_controls: true,
        }
    }

    /// Override runtime configuration
    pub fn config(mut self, config: RuntimeConfig) -> Self {
        self.config = config;
        self
    }

    /// Time source (default: [`SystemClock`])
    pub fn clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Some(Box::new(clock));
        self
    }

    /// Diagnostics sink (default: [`TracingDiagnostics`])
    pub fn diagnostics(mut self, sink: Arc<dyn DiagnosticSink>) -> Self {
        self.diagnostics = Some(sink);
        self
    }

    /// Statement compiler used by `start` and by child runners
    pub fn compiler(mut self, compiler: impl BlockCompiler + 'static) -> Self {
        self.compiler = Some(Box::new(compiler));
        self
    }

    /// Replace the default composition validator
    pub fn validator(mut self, validator: CompositionValidator) -> Self {
        self.validator = Some(validator);
        self
    }

    /// Skip registering the global `next` / `skip` handlers.
    pub fn without_default_controls(mut self) -> Self {
        self.default_controls = false;
        self
    }

    pub fn build(self) -> ScriptRuntime {
        let clock = self.clock.unwrap_or_else(|| Box::new(SystemClock::new()));
        let diagnostics = self
            .diagnostics
            .unwrap_or_else(|| Arc::new(TracingDiagnostics));
        let now = clock.now();
        let mut services = Services::new(clock, diagnostics);

        if self.default_controls {
            services.bus.register_callback(EventName::NEXT, |_| {
                vec![Box::new(AdvanceInnermostAction) as BoxedAction]
            });
            services.bus.register_callback(EventName::SKIP, |_| {
                vec![Box::new(SkipInnermostAction) as BoxedAction]
            });
        }

        ScriptRuntime {
            config: self.config,
            stack: RuntimeStack::new(),
            services,
            queue: ActionQueue::new(),
            compiler: self.compiler,
            validator: self.validator.unwrap_or_default(),
            budget: CycleBudget::default(),
            now,
            started: false,
        }
    }
}
