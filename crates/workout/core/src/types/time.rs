use std::fmt;

/// Milliseconds on the session clock.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Timestamp(pub u64);

impl Timestamp {
    pub const ZERO: Self = Self(0);

    pub const fn from_millis(ms: u64) -> Self {
        Self(ms)
    }

    pub const fn as_millis(self) -> u64 {
        self.0
    }

    /// Milliseconds from `earlier` to `self`, zero if `earlier` is later.
    pub const fn saturating_since(self, earlier: Timestamp) -> u64 {
        self.0.saturating_sub(earlier.0)
    }
}

impl std::ops::Add<u64> for Timestamp {
    type Output = Timestamp;
    fn add(self, rhs: u64) -> Timestamp {
        Timestamp(self.0.saturating_add(rhs))
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}ms", self.0)
    }
}

/// A start/end pair; an open span has no end yet.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TimeSpan {
    pub start: Timestamp,
    pub end: Option<Timestamp>,
}

impl TimeSpan {
    pub const fn open(start: Timestamp) -> Self {
        Self { start, end: None }
    }

    pub const fn closed(start: Timestamp, end: Timestamp) -> Self {
        Self {
            start,
            end: Some(end),
        }
    }

    #[inline]
    pub const fn is_open(&self) -> bool {
        self.end.is_none()
    }

    /// Closes an open span. A closed span keeps its original end.
    pub fn close(&mut self, at: Timestamp) {
        if self.end.is_none() {
            self.end = Some(at.max(self.start));
        }
    }

    /// Duration of the span, measuring open spans up to `now`.
    pub fn duration(&self, now: Timestamp) -> u64 {
        self.end.unwrap_or(now).saturating_since(self.start)
    }
}
