use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_BLOCK_KEY: AtomicU64 = AtomicU64::new(1);

/// Unique identifier of a block for its whole life.
///
/// The key doubles as the owner tag of memory locations and as the scope key
/// of event subscriptions. Keys come from a process-wide counter and are
/// never reused, so a stale key can never alias a newer block.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BlockKey(pub u64);

impl BlockKey {
    /// Reserved key for subscriptions and memory owned by the host rather
    /// than by a block on the stack.
    pub const HOST: Self = Self(0);

    /// Allocates a fresh key.
    pub fn new() -> Self {
        Self(NEXT_BLOCK_KEY.fetch_add(1, Ordering::Relaxed))
    }

    #[inline]
    pub const fn is_host(self) -> bool {
        self.0 == Self::HOST.0
    }
}

impl Default for BlockKey {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for BlockKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_host() {
            write!(f, "block:host")
        } else {
            write!(f, "block:{}", self.0)
        }
    }
}
