//! Presentation memory: what the block shows and which buttons it offers.
use workout_core::{
    Event, EventName, Fragment, FragmentKind, FragmentValue, MemoryTag, Visibility,
    merge_fragments,
};

use super::read_rounds;
use crate::behavior::{Behavior, BehaviorContext, Capability, HookResult, NextOptions, stage};
use crate::events::HandlerScope;

/// Publishes the block label and its fragments, overlaid with the inherited
/// rep target and the block's own round counter.
#[derive(Debug, Clone, Copy, Default)]
pub struct Display;

impl Display {
    fn render(ctx: &BehaviorContext<'_>) -> Vec<Fragment> {
        let (key, now) = (ctx.key(), ctx.now());
        let mut overlay = Vec::new();

        let rep = ctx.read_visible(MemoryTag::REP_TARGET).and_then(|fragments| {
            fragments
                .iter()
                .find(|f| f.kind() == FragmentKind::Rep)
                .cloned()
        });
        if let Some(rep) = rep {
            overlay.push(Fragment::runtime(rep.value, key, now));
        }
        if let Some(rounds) = read_rounds(ctx) {
            overlay.push(Fragment::runtime(FragmentValue::Rounds(rounds), key, now));
        }

        let label = Fragment::runtime(FragmentValue::Label(ctx.label().to_owned()), key, now);
        let mut rendered = vec![label];
        rendered.extend(
            merge_fragments(ctx.fragments(), &overlay)
                .into_iter()
                .filter(|f| f.kind() != FragmentKind::Label),
        );
        rendered
    }
}

impl Behavior for Display {
    fn name(&self) -> &'static str {
        "display"
    }

    fn capabilities(&self) -> &'static [Capability] {
        &[Capability::Display]
    }

    fn priority(&self) -> i32 {
        stage::OUTPUT
    }

    fn produces(&self) -> &'static [MemoryTag] {
        &[MemoryTag::DISPLAY]
    }

    fn consumes(&self) -> &'static [MemoryTag] {
        &[MemoryTag::REP_TARGET, MemoryTag::ROUNDS]
    }

    fn on_mount(&mut self, ctx: &mut BehaviorContext<'_>) -> HookResult {
        let rendered = Self::render(ctx);
        ctx.allocate(MemoryTag::DISPLAY, rendered, Visibility::Public);
        Ok(Vec::new())
    }

    fn on_next(&mut self, ctx: &mut BehaviorContext<'_>, _options: &NextOptions) -> HookResult {
        let rendered = Self::render(ctx);
        ctx.update_memory(MemoryTag::DISPLAY, rendered);
        Ok(Vec::new())
    }
}

/// Publishes the buttons a presentation layer should offer.
///
/// With pause swapping enabled, the `pause` button becomes `resume` while
/// timers are paused.
#[derive(Debug, Clone)]
pub struct Controls {
    buttons: Vec<&'static str>,
    swap_pause: bool,
}

impl Controls {
    pub const PAUSE: &'static str = "pause";
    pub const RESUME: &'static str = "resume";
    pub const NEXT: &'static str = "next";
    pub const SKIP: &'static str = "skip";

    pub fn new(buttons: Vec<&'static str>) -> Self {
        let swap_pause = buttons.contains(&Self::PAUSE);
        Self {
            buttons,
            swap_pause,
        }
    }

    /// Buttons for a timed block.
    pub fn timer() -> Self {
        Self::new(vec![Self::PAUSE, Self::NEXT, Self::SKIP])
    }

    /// Buttons for an effort leaf.
    pub fn leaf() -> Self {
        Self::new(vec![Self::NEXT, Self::SKIP])
    }

    pub fn buttons(&self) -> &[&'static str] {
        &self.buttons
    }

    fn publish(&self, ctx: &mut BehaviorContext<'_>) -> Vec<Fragment> {
        self.buttons
            .iter()
            .map(|button| {
                Fragment::runtime(FragmentValue::Action((*button).to_owned()), ctx.key(), ctx.now())
            })
            .collect()
    }

    fn swap(&mut self, from: &'static str, to: &'static str) -> bool {
        let mut swapped = false;
        for button in self.buttons.iter_mut().filter(|button| **button == from) {
            *button = to;
            swapped = true;
        }
        swapped
    }
}

impl Default for Controls {
    fn default() -> Self {
        Self::leaf()
    }
}

impl Behavior for Controls {
    fn name(&self) -> &'static str {
        "controls"
    }

    fn capabilities(&self) -> &'static [Capability] {
        &[Capability::Controls]
    }

    fn priority(&self) -> i32 {
        stage::OUTPUT
    }

    fn produces(&self) -> &'static [MemoryTag] {
        &[MemoryTag::CONTROLS]
    }

    fn on_mount(&mut self, ctx: &mut BehaviorContext<'_>) -> HookResult {
        let buttons = self.publish(ctx);
        ctx.allocate(MemoryTag::CONTROLS, buttons, Visibility::Public);
        if self.swap_pause {
            ctx.subscribe(EventName::TIMER_PAUSE, HandlerScope::Bubble);
            ctx.subscribe(EventName::TIMER_RESUME, HandlerScope::Bubble);
        }
        Ok(Vec::new())
    }

    fn on_event(&mut self, event: &Event, ctx: &mut BehaviorContext<'_>) -> HookResult {
        let swapped = match event.name.as_str() {
            EventName::TIMER_PAUSE => self.swap(Self::PAUSE, Self::RESUME),
            EventName::TIMER_RESUME => self.swap(Self::RESUME, Self::PAUSE),
            _ => false,
        };
        if swapped {
            let buttons = self.publish(ctx);
            ctx.update_memory(MemoryTag::CONTROLS, buttons);
        }
        Ok(Vec::new())
    }
}
