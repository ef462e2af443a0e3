//! Read-only view of a session for presentation layers.
use serde::Serialize;
use workout_core::{BlockKey, MemorySnapshot, Timestamp};

use crate::block::Block;

/// One stack frame as seen from outside.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FrameSnapshot {
    pub key: BlockKey,
    pub label: String,
    pub depth: usize,
    pub complete: bool,
    pub completion_reason: Option<String>,
    pub started_at: Option<Timestamp>,
}

impl FrameSnapshot {
    pub(crate) fn of(block: &Block, depth: usize) -> Self {
        Self {
            key: block.key(),
            label: block.label().to_owned(),
            depth,
            complete: block.is_complete(),
            completion_reason: block.completion().map(|c| c.reason.clone()),
            started_at: block.timing().started_at,
        }
    }
}

/// Stack shape plus every public or inherited memory location.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RuntimeSnapshot {
    pub now: Timestamp,
    /// Root first.
    pub stack: Vec<FrameSnapshot>,
    pub memory: Vec<MemorySnapshot>,
    pub outputs: usize,
}

impl RuntimeSnapshot {
    pub fn to_json(&self) -> crate::api::Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn innermost(&self) -> Option<&FrameSnapshot> {
        self.stack.last()
    }
}
