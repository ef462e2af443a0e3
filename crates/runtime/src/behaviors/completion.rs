use workout_core::{ConfigError, Event};

use crate::behavior::{Behavior, BehaviorContext, Capability, HookResult, NextOptions, stage};
use crate::block::reason;
use crate::events::HandlerScope;

/// Leaf completion: any `next` finishes the block.
#[derive(Debug, Clone, Copy, Default)]
pub struct CompleteOnNext;

impl Behavior for CompleteOnNext {
    fn name(&self) -> &'static str {
        "complete_on_next"
    }

    fn capabilities(&self) -> &'static [Capability] {
        &[Capability::LeafCompletion]
    }

    fn priority(&self) -> i32 {
        stage::COMPLETION
    }

    fn on_next(&mut self, ctx: &mut BehaviorContext<'_>, _options: &NextOptions) -> HookResult {
        ctx.mark_complete(reason::ADVANCED);
        Ok(Vec::new())
    }
}

/// Completes the block when a named event arrives.
#[derive(Debug, Clone)]
pub struct CompleteOnEvent {
    event: String,
    scope: HandlerScope,
}

impl CompleteOnEvent {
    pub fn new(event: impl Into<String>) -> Result<Self, ConfigError> {
        let event = event.into();
        if event.trim().is_empty() {
            return Err(ConfigError::EmptyEventName {
                behavior: "complete_on_event",
            });
        }
        Ok(Self {
            event,
            scope: HandlerScope::Active,
        })
    }

    /// Listen with a wider scope than the default `Active`.
    #[must_use]
    pub fn with_scope(mut self, scope: HandlerScope) -> Self {
        self.scope = scope;
        self
    }
}

impl Behavior for CompleteOnEvent {
    fn name(&self) -> &'static str {
        "complete_on_event"
    }

    fn capabilities(&self) -> &'static [Capability] {
        &[Capability::EventCompletion]
    }

    fn priority(&self) -> i32 {
        stage::COMPLETION
    }

    fn on_mount(&mut self, ctx: &mut BehaviorContext<'_>) -> HookResult {
        ctx.subscribe(self.event.clone(), self.scope);
        Ok(Vec::new())
    }

    fn on_event(&mut self, event: &Event, ctx: &mut BehaviorContext<'_>) -> HookResult {
        ctx.mark_complete(format!("event:{}", event.name));
        Ok(Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_event_names_are_rejected() {
        assert!(matches!(
            CompleteOnEvent::new("  "),
            Err(ConfigError::EmptyEventName { .. })
        ));
        assert!(CompleteOnEvent::new("button").is_ok());
    }
}
