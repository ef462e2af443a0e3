//! Public surface shared by hosts: errors and read-only snapshots.
mod errors;
mod snapshot;

pub use errors::{Result, RuntimeError};
pub use snapshot::{FrameSnapshot, RuntimeSnapshot};
