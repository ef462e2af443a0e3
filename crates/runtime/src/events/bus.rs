//! Scope-aware event bus.
//!
//! Subscriptions are keyed by event name and owned by a block (or by the host
//! through [`BlockKey::HOST`]). Whether a subscription fires depends on its
//! [`HandlerScope`] and on the stack shape at dispatch time:
//!
//! | Scope    | Fires when                               |
//! |----------|------------------------------------------|
//! | `Active` | the owner is the innermost block         |
//! | `Bubble` | the owner is anywhere on the stack       |
//! | `Global` | always                                   |
//!
//! The bus only decides *who* receives an event. Invoking block behaviors is
//! left to the runtime, which owns the stack; handlers return actions that are
//! queued rather than executed inline.
use std::collections::BTreeMap;
use std::fmt;

use tracing::trace;
use workout_core::{BlockKey, Event};

use crate::actions::BoxedAction;

/// Dispatch scope of one subscription.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, strum::Display, strum::AsRefStr,
)]
#[strum(serialize_all = "snake_case")]
pub enum HandlerScope {
    #[default]
    Active,
    Bubble,
    Global,
}

/// Token returned by registration; unregisters exactly one subscription.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubscriptionId(u64);

/// Host-side handler invoked with the event.
pub type EventCallback = Box<dyn FnMut(&Event) -> Vec<BoxedAction> + Send>;

/// Where a matching event goes.
pub enum HandlerTarget {
    /// The behavior at `index` in the owner block's behavior list.
    Behavior { index: usize },
    Callback(EventCallback),
}

impl fmt::Debug for HandlerTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Behavior { index } => f.debug_struct("Behavior").field("index", index).finish(),
            Self::Callback(_) => f.write_str("Callback(..)"),
        }
    }
}

#[derive(Debug)]
struct Subscription {
    event: String,
    owner: BlockKey,
    scope: HandlerScope,
    target: HandlerTarget,
}

/// One subscription selected for an event.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Delivery {
    pub id: SubscriptionId,
    pub owner: BlockKey,
    /// `Some(index)` for behavior subscriptions, `None` for callbacks.
    pub behavior: Option<usize>,
}

#[derive(Debug, Default)]
pub struct EventBus {
    next_id: u64,
    // Ids grow monotonically, so map order is registration order.
    subscriptions: BTreeMap<SubscriptionId, Subscription>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(
        &mut self,
        event: impl Into<String>,
        owner: BlockKey,
        scope: HandlerScope,
        target: HandlerTarget,
    ) -> SubscriptionId {
        self.next_id += 1;
        let id = SubscriptionId(self.next_id);
        let event = event.into();
        trace!(target: "runtime::events", event = %event, %owner, scope = %scope, "Registered handler");
        self.subscriptions.insert(
            id,
            Subscription {
                event,
                owner,
                scope,
                target,
            },
        );
        id
    }

    /// Registers a host callback that fires for every matching event.
    pub fn register_callback(
        &mut self,
        event: impl Into<String>,
        callback: impl FnMut(&Event) -> Vec<BoxedAction> + Send + 'static,
    ) -> SubscriptionId {
        self.register(
            event,
            BlockKey::HOST,
            HandlerScope::Global,
            HandlerTarget::Callback(Box::new(callback)),
        )
    }

    /// Removes one subscription; returns whether it existed.
    pub fn unregister(&mut self, id: SubscriptionId) -> bool {
        self.subscriptions.remove(&id).is_some()
    }

    /// Removes every subscription owned by `owner`; returns how many.
    pub fn unregister_owner(&mut self, owner: BlockKey) -> usize {
        let before = self.subscriptions.len();
        self.subscriptions.retain(|_, sub| sub.owner != owner);
        before - self.subscriptions.len()
    }

    pub fn owner_of(&self, id: SubscriptionId) -> Option<BlockKey> {
        self.subscriptions.get(&id).map(|sub| sub.owner)
    }

    pub fn is_registered(&self, id: SubscriptionId) -> bool {
        self.subscriptions.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.subscriptions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscriptions.is_empty()
    }

    /// Subscriptions that should receive an event named `event`, given the
    /// stack keys (root first), in registration order.
    pub fn deliveries(&self, event: &str, stack: &[BlockKey]) -> Vec<Delivery> {
        let innermost = stack.last().copied();
        self.subscriptions
            .iter()
            .filter(|(_, sub)| sub.event == event)
            .filter(|(_, sub)| match sub.scope {
                HandlerScope::Active => innermost == Some(sub.owner),
                HandlerScope::Bubble => stack.contains(&sub.owner),
                HandlerScope::Global => true,
            })
            .map(|(id, sub)| Delivery {
                id: *id,
                owner: sub.owner,
                behavior: match sub.target {
                    HandlerTarget::Behavior { index } => Some(index),
                    HandlerTarget::Callback(_) => None,
                },
            })
            .collect()
    }

    /// Runs a callback subscription. Returns nothing if `id` is gone or is a
    /// behavior subscription.
    pub fn invoke_callback(&mut self, id: SubscriptionId, event: &Event) -> Vec<BoxedAction> {
        match self.subscriptions.get_mut(&id) {
            Some(Subscription {
                target: HandlerTarget::Callback(callback),
                ..
            }) => callback(event),
            _ => Vec::new(),
        }
    }
}
