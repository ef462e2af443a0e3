use std::fmt;

/// Name of a memory location. Several locations may share a tag.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MemoryTag(pub &'static str);

impl MemoryTag {
    /// Timer configuration and spans (public).
    pub const TIMER: Self = Self("timer");
    /// Round counter (inherited).
    pub const ROUNDS: Self = Self("rounds");
    /// Rep target promoted for the current round (inherited).
    pub const REP_TARGET: Self = Self("rep-target");
    /// Child runner cursor (private).
    pub const CHILDREN: Self = Self("children");
    /// Label and source fragments shown by the presentation layer (public).
    pub const DISPLAY: Self = Self("display");
    /// Buttons offered to the presentation layer (public).
    pub const CONTROLS: Self = Self("controls");

    pub const fn as_str(&self) -> &'static str {
        self.0
    }
}

impl fmt::Display for MemoryTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}
