use std::fmt;

use super::FragmentKind;
use crate::types::{TimeSpan, Timestamp};

/// Direction a timer counts in.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, strum::Display, strum::AsRefStr,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case")]
pub enum TimerDirection {
    #[default]
    Up,
    Down,
}

/// Timer configuration plus the spans it has run for.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TimerValue {
    pub direction: TimerDirection,
    pub duration_ms: Option<u64>,
    pub spans: Vec<TimeSpan>,
}

impl TimerValue {
    pub fn countdown(duration_ms: u64) -> Self {
        Self {
            direction: TimerDirection::Down,
            duration_ms: Some(duration_ms),
            spans: Vec::new(),
        }
    }

    pub fn count_up(cap_ms: Option<u64>) -> Self {
        Self {
            direction: TimerDirection::Up,
            duration_ms: cap_ms,
            spans: Vec::new(),
        }
    }

    pub fn is_running(&self) -> bool {
        self.spans.last().is_some_and(TimeSpan::is_open)
    }

    /// Total running time across all spans, measuring an open span to `now`.
    pub fn elapsed(&self, now: Timestamp) -> u64 {
        self.spans.iter().map(|span| span.duration(now)).sum()
    }

    /// Time left on a bounded timer.
    pub fn remaining(&self, now: Timestamp) -> Option<u64> {
        self.duration_ms
            .map(|duration| duration.saturating_sub(self.elapsed(now)))
    }

    /// True once a bounded timer has run for its full duration.
    pub fn is_expired(&self, now: Timestamp) -> bool {
        self.duration_ms
            .is_some_and(|duration| self.elapsed(now) >= duration)
    }

    /// Start of the first span; changes only when the timer is restarted.
    pub fn first_span_start(&self) -> Option<Timestamp> {
        self.spans.first().map(|span| span.start)
    }

    /// Opens a new span unless one is already open.
    pub fn start(&mut self, at: Timestamp) {
        if !self.is_running() {
            self.spans.push(TimeSpan::open(at));
        }
    }

    /// Closes the open span, if any.
    pub fn stop(&mut self, at: Timestamp) {
        if let Some(span) = self.spans.last_mut() {
            span.close(at);
        }
    }

    /// Discards history and opens a fresh span at `at`.
    pub fn restart(&mut self, at: Timestamp) {
        self.spans.clear();
        self.spans.push(TimeSpan::open(at));
    }
}

/// Round counter; `current` is 1-based, `total` is `None` when unbounded.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RoundsValue {
    pub current: u32,
    pub total: Option<u32>,
}

impl RoundsValue {
    pub const fn new(total: Option<u32>) -> Self {
        Self { current: 1, total }
    }

    /// Rounds fully finished before the current one.
    pub const fn completed(&self) -> u32 {
        self.current.saturating_sub(1)
    }

    /// True once the counter has moved past a bounded total.
    pub fn is_exhausted(&self) -> bool {
        self.total.is_some_and(|total| self.current > total)
    }
}

/// An amount with a unit, e.g. `400 m` or `43 kg`.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Measure {
    pub amount: f64,
    pub unit: String,
}

/// Position of a block's child runner within its child groups.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ChildCursor {
    /// Index of the next group to push.
    pub next: usize,
    /// Number of child groups.
    pub groups: usize,
    /// Groups pushed over the block's whole life.
    pub pushed: usize,
}

impl ChildCursor {
    pub const fn new(groups: usize) -> Self {
        Self {
            next: 0,
            groups,
            pushed: 0,
        }
    }

    /// Every group of the current cycle has been pushed.
    pub const fn is_exhausted(&self) -> bool {
        self.next >= self.groups
    }

    /// Claims the next group index, or `None` when the cycle is exhausted.
    pub fn advance(&mut self) -> Option<usize> {
        if self.is_exhausted() {
            return None;
        }
        let index = self.next;
        self.next += 1;
        self.pushed += 1;
        Some(index)
    }

    /// Starts a new cycle over the same groups.
    pub fn rewind(&mut self) {
        self.next = 0;
    }
}

/// Closed set of fragment payloads, one shape per kind.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FragmentValue {
    Timer(TimerValue),
    Rounds(RoundsValue),
    RepScheme(Vec<u32>),
    Rep(u32),
    Effort(String),
    Distance(Measure),
    Resistance(Measure),
    Text(String),
    Label(String),
    /// A named control or structural keyword (`AMRAP`, `EMOM`, `pause`).
    Action(String),
    /// Measured running time in milliseconds.
    Elapsed(u64),
    Children(ChildCursor),
    System(String),
}

impl FragmentValue {
    pub fn kind(&self) -> FragmentKind {
        match self {
            Self::Timer(_) => FragmentKind::Timer,
            Self::Rounds(_) => FragmentKind::Rounds,
            Self::RepScheme(_) => FragmentKind::RepScheme,
            Self::Rep(_) => FragmentKind::Rep,
            Self::Effort(_) => FragmentKind::Effort,
            Self::Distance(_) => FragmentKind::Distance,
            Self::Resistance(_) => FragmentKind::Resistance,
            Self::Text(_) => FragmentKind::Text,
            Self::Label(_) => FragmentKind::Label,
            Self::Action(_) => FragmentKind::Action,
            Self::Elapsed(_) => FragmentKind::Elapsed,
            Self::Children(_) => FragmentKind::Children,
            Self::System(_) => FragmentKind::System,
        }
    }

    pub fn as_timer(&self) -> Option<&TimerValue> {
        match self {
            Self::Timer(timer) => Some(timer),
            _ => None,
        }
    }

    pub fn as_rounds(&self) -> Option<&RoundsValue> {
        match self {
            Self::Rounds(rounds) => Some(rounds),
            _ => None,
        }
    }

    pub fn as_rep(&self) -> Option<u32> {
        match self {
            Self::Rep(reps) => Some(*reps),
            _ => None,
        }
    }

    pub fn as_children(&self) -> Option<&ChildCursor> {
        match self {
            Self::Children(cursor) => Some(cursor),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Effort(text)
            | Self::Text(text)
            | Self::Label(text)
            | Self::Action(text)
            | Self::System(text) => Some(text),
            _ => None,
        }
    }
}

fn write_clock(f: &mut fmt::Formatter<'_>, ms: u64) -> fmt::Result {
    let seconds = ms / 1_000;
    write!(f, "{}:{:02}", seconds / 60, seconds % 60)
}

impl fmt::Display for FragmentValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Timer(timer) => match timer.duration_ms {
                Some(ms) => write_clock(f, ms),
                None => write!(f, "timer"),
            },
            Self::Rounds(rounds) => match rounds.total {
                Some(total) => write!(f, "round {}/{}", rounds.current, total),
                None => write!(f, "round {}", rounds.current),
            },
            Self::RepScheme(reps) => {
                let parts: Vec<String> = reps.iter().map(u32::to_string).collect();
                write!(f, "{}", parts.join("-"))
            }
            Self::Rep(reps) => write!(f, "{reps}"),
            Self::Distance(m) | Self::Resistance(m) => write!(f, "{}{}", m.amount, m.unit),
            Self::Elapsed(ms) => write_clock(f, *ms),
            Self::Children(cursor) => write!(f, "child {}/{}", cursor.next, cursor.groups),
            Self::Effort(text)
            | Self::Text(text)
            | Self::Label(text)
            | Self::Action(text)
            | Self::System(text) => write!(f, "{text}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timer_elapsed_sums_spans() {
        let mut timer = TimerValue::countdown(60_000);
        timer.start(Timestamp(0));
        timer.stop(Timestamp(10_000));
        timer.start(Timestamp(20_000));

        assert_eq!(timer.elapsed(Timestamp(30_000)), 20_000);
        assert_eq!(timer.remaining(Timestamp(30_000)), Some(40_000));
        assert!(!timer.is_expired(Timestamp(30_000)));
        assert!(timer.is_expired(Timestamp(70_000)));
    }

    #[test]
    fn restart_discards_history() {
        let mut timer = TimerValue::countdown(60_000);
        timer.start(Timestamp(0));
        timer.restart(Timestamp(60_000));

        assert_eq!(timer.spans.len(), 1);
        assert_eq!(timer.elapsed(Timestamp(60_005)), 5);
    }

    #[test]
    fn rounds_exhaustion_only_applies_to_bounded_counts() {
        let unbounded = RoundsValue {
            current: 40,
            total: None,
        };
        assert!(!unbounded.is_exhausted());

        let bounded = RoundsValue {
            current: 4,
            total: Some(3),
        };
        assert!(bounded.is_exhausted());
        assert_eq!(bounded.completed(), 3);
    }

    #[test]
    fn cursor_cycles_through_groups() {
        let mut cursor = ChildCursor::new(2);
        assert_eq!(cursor.advance(), Some(0));
        assert_eq!(cursor.advance(), Some(1));
        assert_eq!(cursor.advance(), None);

        cursor.rewind();
        assert_eq!(cursor.advance(), Some(0));
        assert_eq!(cursor.pushed, 3);
    }

    #[test]
    fn display_formats_clock_values() {
        let value = FragmentValue::Timer(TimerValue::countdown(1_200_000));
        assert_eq!(value.to_string(), "20:00");
        assert_eq!(FragmentValue::RepScheme(vec![21, 15, 9]).to_string(), "21-15-9");
    }
}
