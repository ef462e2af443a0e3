//! Shared fixtures for the runtime integration tests.
#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use workout_core::{BlockKey, Event, Fragment, FragmentValue, MemoryTag, Timestamp, Visibility};
use workout_runtime::actions::MarkCompleteAction;
use workout_runtime::{
    Behavior, BehaviorContext, BehaviorError, HandlerScope, HookResult, ManualClock, NextOptions,
    RecordingDiagnostics, ScriptRuntime, StrategyCompiler,
};

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("workout_runtime=debug,runtime=debug")
        .with_test_writer()
        .try_init();
}

/// Runtime on a manual clock at zero, recording diagnostics.
pub struct Harness {
    pub runtime: ScriptRuntime,
    pub clock: ManualClock,
    pub diagnostics: Arc<RecordingDiagnostics>,
}

impl Harness {
    pub fn new() -> Self {
        Self::build(None)
    }

    pub fn with_compiler(compiler: StrategyCompiler) -> Self {
        Self::build(Some(compiler))
    }

    fn build(compiler: Option<StrategyCompiler>) -> Self {
        init_tracing();
        let clock = ManualClock::new(Timestamp::ZERO);
        let diagnostics = Arc::new(RecordingDiagnostics::new());
        let mut builder = ScriptRuntime::builder()
            .clock(clock.clone())
            .diagnostics(diagnostics.clone());
        if let Some(compiler) = compiler {
            builder = builder.compiler(compiler);
        }
        Self {
            runtime: builder.build(),
            clock,
            diagnostics,
        }
    }

    /// Moves the clock to `ms` and delivers a tick.
    pub fn tick_at(&mut self, ms: u64) {
        self.clock.set(Timestamp(ms));
        self.runtime.tick();
    }

    pub fn labels(&self) -> Vec<String> {
        self.runtime
            .stack()
            .iter()
            .map(|block| block.label().to_owned())
            .collect()
    }
}

pub type Journal = Arc<Mutex<Vec<String>>>;

pub fn journal() -> Journal {
    Arc::new(Mutex::new(Vec::new()))
}

pub fn entries(journal: &Journal) -> Vec<String> {
    journal.lock().unwrap().clone()
}

/// Writes `<label>:<hook>` for every lifecycle hook it sees. Unmount entries
/// carry the completion reason.
pub struct Recorder {
    journal: Journal,
    listen: Option<(&'static str, HandlerScope)>,
}

impl Recorder {
    pub fn new(journal: &Journal) -> Self {
        Self {
            journal: journal.clone(),
            listen: None,
        }
    }

    /// Also records `<label>:event:<name>` for `event` delivered in `scope`.
    pub fn listening(mut self, event: &'static str, scope: HandlerScope) -> Self {
        self.listen = Some((event, scope));
        self
    }

    fn log(&self, line: String) {
        self.journal.lock().unwrap().push(line);
    }
}

impl Behavior for Recorder {
    fn name(&self) -> &'static str {
        "recorder"
    }

    fn on_mount(&mut self, ctx: &mut BehaviorContext<'_>) -> HookResult {
        self.log(format!("{}:mount", ctx.label()));
        if let Some((event, scope)) = self.listen {
            ctx.subscribe(event, scope);
        }
        Ok(Vec::new())
    }

    fn on_next(&mut self, ctx: &mut BehaviorContext<'_>, _options: &NextOptions) -> HookResult {
        self.log(format!("{}:next", ctx.label()));
        Ok(Vec::new())
    }

    fn on_unmount(&mut self, ctx: &mut BehaviorContext<'_>) -> HookResult {
        let reason = ctx.completion().map_or("none", |c| c.reason.as_str()).to_owned();
        self.log(format!("{}:unmount:{reason}", ctx.label()));
        Ok(Vec::new())
    }

    fn on_dispose(&mut self, ctx: &mut BehaviorContext<'_>) -> Result<(), BehaviorError> {
        self.log(format!("{}:dispose", ctx.label()));
        Ok(())
    }

    fn on_event(&mut self, event: &Event, ctx: &mut BehaviorContext<'_>) -> HookResult {
        self.log(format!("{}:event:{}", ctx.label(), event.name));
        Ok(Vec::new())
    }
}

/// Queues a completion for its own block, then fails the mount hook.
pub struct FaultyMount;

impl Behavior for FaultyMount {
    fn name(&self) -> &'static str {
        "faulty_mount"
    }

    fn on_mount(&mut self, ctx: &mut BehaviorContext<'_>) -> HookResult {
        ctx.do_action(Box::new(MarkCompleteAction {
            key: ctx.key(),
            reason: "should-not-happen".into(),
        }));
        Err(BehaviorError::failed("faulty_mount", "boom"))
    }
}

/// Tries to complete `target` from its dispose hook.
pub struct LateCompleter {
    pub target: BlockKey,
}

impl Behavior for LateCompleter {
    fn name(&self) -> &'static str {
        "late_completer"
    }

    fn on_dispose(&mut self, ctx: &mut BehaviorContext<'_>) -> Result<(), BehaviorError> {
        ctx.do_action(Box::new(MarkCompleteAction {
            key: self.target,
            reason: "from-dispose".into(),
        }));
        Ok(())
    }
}

pub const SECRET: MemoryTag = MemoryTag("secret");
pub const SHARED: MemoryTag = MemoryTag("shared");

/// Allocates one private and one inherited location on mount.
pub struct Publisher;

impl Behavior for Publisher {
    fn name(&self) -> &'static str {
        "publisher"
    }

    fn on_mount(&mut self, ctx: &mut BehaviorContext<'_>) -> HookResult {
        let (key, now) = (ctx.key(), ctx.now());
        ctx.allocate(
            SECRET,
            vec![Fragment::runtime(FragmentValue::Text("hidden".into()), key, now)],
            Visibility::Private,
        );
        ctx.allocate(
            SHARED,
            vec![Fragment::runtime(FragmentValue::Rep(12), key, now)],
            Visibility::Inherited,
        );
        Ok(Vec::new())
    }
}

/// Records what a child can see of [`Publisher`]'s memory.
pub struct Peeker {
    journal: Journal,
}

impl Peeker {
    pub fn new(journal: &Journal) -> Self {
        Self {
            journal: journal.clone(),
        }
    }
}

impl Behavior for Peeker {
    fn name(&self) -> &'static str {
        "peeker"
    }

    fn on_mount(&mut self, ctx: &mut BehaviorContext<'_>) -> HookResult {
        let secret = ctx.read_visible(SECRET).is_some();
        let shared = ctx
            .read_visible(SHARED)
            .and_then(|fragments| fragments.first())
            .and_then(|fragment| fragment.value.as_rep());
        self.journal
            .lock()
            .unwrap()
            .push(format!("secret={secret} shared={shared:?}"));
        Ok(Vec::new())
    }
}
