//! Identity and time primitives.
mod key;
mod time;

pub use key::BlockKey;
pub use time::{TimeSpan, Timestamp};
