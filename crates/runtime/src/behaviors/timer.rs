//! Timer aspect: start/stop spans, expiry detection, pause and completion.
use workout_core::{
    ConfigError, Event, EventData, EventName, Fragment, FragmentValue, MemoryTag, TimerValue,
    Timestamp, Visibility,
};

use super::{read_timer, write_timer};
use crate::behavior::{Behavior, BehaviorContext, Capability, HookResult, Requirement, stage};
use crate::block::reason;
use crate::events::HandlerScope;

const NEEDS_TIMER: &[Requirement] = &[Requirement::new("a timer", &[Capability::Timer])];
const NEEDS_TICK: &[Requirement] =
    &[Requirement::new("a timer tick source", &[Capability::TimerTick])];

/// Allocates the block's public timer and runs it while the block is mounted.
#[derive(Debug, Clone)]
pub struct TimerInit {
    timer: TimerValue,
}

impl TimerInit {
    pub fn countdown(duration_ms: u64) -> Result<Self, ConfigError> {
        if duration_ms == 0 {
            return Err(ConfigError::NonPositiveDuration {
                behavior: "timer_init",
            });
        }
        Ok(Self {
            timer: TimerValue::countdown(duration_ms),
        })
    }

    /// A stopwatch, optionally capped.
    pub fn count_up(cap_ms: Option<u64>) -> Result<Self, ConfigError> {
        if cap_ms == Some(0) {
            return Err(ConfigError::NonPositiveDuration {
                behavior: "timer_init",
            });
        }
        Ok(Self {
            timer: TimerValue::count_up(cap_ms),
        })
    }

    pub fn duration_ms(&self) -> Option<u64> {
        self.timer.duration_ms
    }
}

impl Behavior for TimerInit {
    fn name(&self) -> &'static str {
        "timer_init"
    }

    fn capabilities(&self) -> &'static [Capability] {
        &[Capability::Timer]
    }

    fn priority(&self) -> i32 {
        stage::INIT
    }

    fn produces(&self) -> &'static [MemoryTag] {
        &[MemoryTag::TIMER]
    }

    fn on_mount(&mut self, ctx: &mut BehaviorContext<'_>) -> HookResult {
        let mut timer = self.timer.clone();
        timer.start(ctx.now());
        let fragment = Fragment::runtime(FragmentValue::Timer(timer), ctx.key(), ctx.now());
        ctx.allocate(MemoryTag::TIMER, vec![fragment], Visibility::Public);
        Ok(Vec::new())
    }

    fn on_unmount(&mut self, ctx: &mut BehaviorContext<'_>) -> HookResult {
        if let Some(mut timer) = read_timer(ctx)
            && timer.is_running()
        {
            timer.stop(ctx.now());
            write_timer(ctx, timer)?;
        }
        Ok(Vec::new())
    }
}

/// Watches `tick` and announces `timer:complete` once per timer run.
#[derive(Debug, Clone, Default)]
pub struct TimerTick {
    fired_for: Option<Timestamp>,
}

impl Behavior for TimerTick {
    fn name(&self) -> &'static str {
        "timer_tick"
    }

    fn capabilities(&self) -> &'static [Capability] {
        &[Capability::TimerTick]
    }

    fn requirements(&self) -> &'static [Requirement] {
        NEEDS_TIMER
    }

    fn priority(&self) -> i32 {
        stage::COMPLETION
    }

    fn consumes(&self) -> &'static [MemoryTag] {
        &[MemoryTag::TIMER]
    }

    fn on_mount(&mut self, ctx: &mut BehaviorContext<'_>) -> HookResult {
        ctx.subscribe(EventName::TICK, HandlerScope::Bubble);
        Ok(Vec::new())
    }

    fn on_event(&mut self, event: &Event, ctx: &mut BehaviorContext<'_>) -> HookResult {
        if ctx.is_complete() {
            return Ok(Vec::new());
        }
        let Some(timer) = read_timer(ctx) else {
            return Ok(Vec::new());
        };
        if !timer.is_expired(event.timestamp) {
            return Ok(Vec::new());
        }

        // A restart opens a new first span, which re-arms the announcement.
        let run = timer.first_span_start();
        if run.is_some() && self.fired_for == run {
            return Ok(Vec::new());
        }
        self.fired_for = run;

        let owner = ctx.key();
        ctx.emit(
            Event::new(EventName::TIMER_COMPLETE, event.timestamp)
                .with_data(EventData::Timer { owner }),
        );
        Ok(Vec::new())
    }
}

/// Closes the running span on `timer:pause` and opens one on `timer:resume`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TimerPause;

impl Behavior for TimerPause {
    fn name(&self) -> &'static str {
        "timer_pause"
    }

    fn capabilities(&self) -> &'static [Capability] {
        &[Capability::TimerPause]
    }

    fn requirements(&self) -> &'static [Requirement] {
        NEEDS_TIMER
    }

    fn priority(&self) -> i32 {
        stage::INIT
    }

    fn produces(&self) -> &'static [MemoryTag] {
        &[MemoryTag::TIMER]
    }

    fn on_mount(&mut self, ctx: &mut BehaviorContext<'_>) -> HookResult {
        ctx.subscribe(EventName::TIMER_PAUSE, HandlerScope::Bubble);
        ctx.subscribe(EventName::TIMER_RESUME, HandlerScope::Bubble);
        Ok(Vec::new())
    }

    fn on_event(&mut self, event: &Event, ctx: &mut BehaviorContext<'_>) -> HookResult {
        if ctx.is_complete() {
            return Ok(Vec::new());
        }
        let Some(mut timer) = read_timer(ctx) else {
            return Ok(Vec::new());
        };

        match event.name.as_str() {
            EventName::TIMER_PAUSE if timer.is_running() => timer.stop(event.timestamp),
            EventName::TIMER_RESUME if !timer.is_running() && !timer.is_expired(event.timestamp) => {
                timer.start(event.timestamp)
            }
            _ => return Ok(Vec::new()),
        }
        write_timer(ctx, timer)?;
        Ok(Vec::new())
    }
}

/// Completes the block when its own timer runs out.
#[derive(Debug, Clone, Copy, Default)]
pub struct TimerCompletion;

impl Behavior for TimerCompletion {
    fn name(&self) -> &'static str {
        "timer_completion"
    }

    fn capabilities(&self) -> &'static [Capability] {
        &[Capability::TimerCompletion]
    }

    fn requirements(&self) -> &'static [Requirement] {
        NEEDS_TICK
    }

    fn priority(&self) -> i32 {
        stage::COMPLETION
    }

    fn on_mount(&mut self, ctx: &mut BehaviorContext<'_>) -> HookResult {
        ctx.subscribe(EventName::TIMER_COMPLETE, HandlerScope::Bubble);
        Ok(Vec::new())
    }

    fn on_event(&mut self, event: &Event, ctx: &mut BehaviorContext<'_>) -> HookResult {
        if event.is_about(ctx.key()) {
            ctx.mark_complete(reason::TIMER_EXPIRED);
        }
        Ok(Vec::new())
    }
}
