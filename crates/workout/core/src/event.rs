//! Ephemeral events routed through the event bus.

use crate::types::{BlockKey, Timestamp};

/// Event names understood by the built-in behaviors and the runtime.
pub struct EventName;

impl EventName {
    /// Recurring time-advance event from the host.
    pub const TICK: &'static str = "tick";
    /// Session start requested by the host.
    pub const START: &'static str = "start";
    /// Advance the innermost block.
    pub const NEXT: &'static str = "next";
    /// Abandon the innermost block.
    pub const SKIP: &'static str = "skip";
    pub const TIMER_PAUSE: &'static str = "timer:pause";
    pub const TIMER_RESUME: &'static str = "timer:resume";
    /// A countdown owned by the block in [`EventData::Timer`] ran out.
    pub const TIMER_COMPLETE: &'static str = "timer:complete";
    /// The round counter of the block in [`EventData::Rounds`] moved.
    pub const ROUNDS_CHANGED: &'static str = "rounds:changed";
    /// A presentation-layer button was pressed.
    pub const BUTTON: &'static str = "button";
}

/// Closed set of event payloads.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EventData {
    #[default]
    None,
    Tick,
    Button {
        action: String,
    },
    Timer {
        owner: BlockKey,
    },
    Rounds {
        owner: BlockKey,
        round: u32,
        total: Option<u32>,
    },
    Text(String),
}

impl EventData {
    /// The block an event is about, for block-addressed events.
    pub fn subject(&self) -> Option<BlockKey> {
        match self {
            Self::Timer { owner } | Self::Rounds { owner, .. } => Some(*owner),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Event {
    pub name: String,
    pub timestamp: Timestamp,
    pub data: EventData,
}

impl Event {
    pub fn new(name: impl Into<String>, timestamp: Timestamp) -> Self {
        Self {
            name: name.into(),
            timestamp,
            data: EventData::None,
        }
    }

    #[must_use]
    pub fn with_data(mut self, data: EventData) -> Self {
        self.data = data;
        self
    }

    pub fn tick(timestamp: Timestamp) -> Self {
        Self::new(EventName::TICK, timestamp).with_data(EventData::Tick)
    }

    /// A button press routed as the button's own event name.
    pub fn button(event: impl Into<String>, action: impl Into<String>, timestamp: Timestamp) -> Self {
        Self::new(event, timestamp).with_data(EventData::Button {
            action: action.into(),
        })
    }

    /// Whether this event is about `key` (block-addressed events only).
    pub fn is_about(&self, key: BlockKey) -> bool {
        self.data.subject() == Some(key)
    }
}
