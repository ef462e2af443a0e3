//! Data model shared by the workout runtime and its hosts.
//!
//! `workout-core` defines the values that flow between blocks and behaviors:
//! block identity, session time, typed fragments, the block-scoped memory
//! store, the append-only output log and the ephemeral event record. It holds
//! no execution machinery; the `workout-runtime` crate drives these types.
pub mod error;
pub mod event;
pub mod fragment;
pub mod memory;
pub mod output;
pub mod types;

pub use error::{ConfigError, ErrorSeverity, WorkoutError};
pub use event::{Event, EventData, EventName};
pub use fragment::{
    ChildCursor, Fragment, FragmentKind, FragmentOrigin, FragmentValue, Measure, RoundsValue,
    TimerDirection, TimerValue, find_kind, merge_fragments,
};
pub use memory::{
    MemoryError, MemoryId, MemoryRef, MemorySnapshot, MemoryStore, MemoryTag, SearchCriteria,
    Visibility,
};
pub use output::{OutputKind, OutputLog, OutputStatement};
pub use types::{BlockKey, TimeSpan, Timestamp};
