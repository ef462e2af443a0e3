//! Scoped publish/subscribe routing for runtime events.
mod bus;

pub use bus::{Delivery, EventBus, EventCallback, HandlerScope, HandlerTarget, SubscriptionId};
