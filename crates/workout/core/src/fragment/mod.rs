//! Typed fragments describing one aspect of block state or output.
//!
//! A fragment is a closed tagged union ([`FragmentValue`]) plus provenance:
//! the [`FragmentOrigin`] decides which of two same-kind fragments wins when a
//! parser-derived list is merged with runtime state.
mod value;

pub use value::{ChildCursor, FragmentValue, Measure, RoundsValue, TimerDirection, TimerValue};

use crate::types::{BlockKey, Timestamp};

/// Discriminant of [`FragmentValue`].
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum FragmentKind {
    Timer,
    Rounds,
    RepScheme,
    Rep,
    Effort,
    Distance,
    Resistance,
    Text,
    Label,
    Action,
    Elapsed,
    Children,
    System,
}

/// Where a fragment came from. Later variants take precedence on merge.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    strum::Display,
    strum::AsRefStr,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case")]
pub enum FragmentOrigin {
    /// Produced by the script compiler from source text.
    #[default]
    Parser,
    /// Written by a behavior while the block runs.
    Runtime,
    /// Recorded from what the athlete actually did.
    Execution,
}

/// One typed datum with provenance.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Fragment {
    pub value: FragmentValue,
    pub origin: FragmentOrigin,
    pub timestamp: Option<Timestamp>,
    pub owner: Option<BlockKey>,
}

impl Fragment {
    /// A parser-origin fragment with no owner yet.
    pub fn parsed(value: FragmentValue) -> Self {
        Self {
            value,
            origin: FragmentOrigin::Parser,
            timestamp: None,
            owner: None,
        }
    }

    /// A runtime-origin fragment written by `owner` at `at`.
    pub fn runtime(value: FragmentValue, owner: BlockKey, at: Timestamp) -> Self {
        Self {
            value,
            origin: FragmentOrigin::Runtime,
            timestamp: Some(at),
            owner: Some(owner),
        }
    }

    /// An execution-origin fragment recording what actually happened.
    pub fn recorded(value: FragmentValue, owner: BlockKey, at: Timestamp) -> Self {
        Self {
            value,
            origin: FragmentOrigin::Execution,
            timestamp: Some(at),
            owner: Some(owner),
        }
    }

    #[inline]
    pub fn kind(&self) -> FragmentKind {
        self.value.kind()
    }

    /// Re-tags the fragment as owned by `owner`.
    #[must_use]
    pub fn owned_by(mut self, owner: BlockKey) -> Self {
        self.owner = Some(owner);
        self
    }
}

/// Merges `overlay` onto `base`, resolving same-kind conflicts by origin.
///
/// For each kind present in both lists, the group with the higher maximum
/// origin wins as a whole; on a tie the overlay wins. Kinds present in only
/// one list are kept. Result order follows `base`, with overlay-only kinds
/// appended in overlay order.
pub fn merge_fragments(base: &[Fragment], overlay: &[Fragment]) -> Vec<Fragment> {
    let max_origin = |list: &[Fragment], kind: FragmentKind| {
        list.iter()
            .filter(|f| f.kind() == kind)
            .map(|f| f.origin)
            .max()
    };

    let mut result = Vec::with_capacity(base.len() + overlay.len());
    let mut emitted: Vec<FragmentKind> = Vec::new();

    for fragment in base {
        let kind = fragment.kind();
        if emitted.contains(&kind) {
            continue;
        }
        emitted.push(kind);

        let overlay_wins = match (max_origin(overlay, kind), max_origin(base, kind)) {
            (Some(over), Some(under)) => over >= under,
            (Some(_), None) => true,
            _ => false,
        };
        let source = if overlay_wins { overlay } else { base };
        result.extend(source.iter().filter(|f| f.kind() == kind).cloned());
    }

    for fragment in overlay {
        let kind = fragment.kind();
        if emitted.contains(&kind) {
            continue;
        }
        emitted.push(kind);
        result.extend(overlay.iter().filter(|f| f.kind() == kind).cloned());
    }

    result
}

/// Returns the first fragment of `kind` in `fragments`.
pub fn find_kind(fragments: &[Fragment], kind: FragmentKind) -> Option<&Fragment> {
    fragments.iter().find(|f| f.kind() == kind)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rep(n: u32, origin: FragmentOrigin) -> Fragment {
        Fragment {
            value: FragmentValue::Rep(n),
            origin,
            timestamp: None,
            owner: None,
        }
    }

    #[test]
    fn runtime_origin_overrides_parser_origin() {
        let base = vec![
            rep(10, FragmentOrigin::Parser),
            Fragment::parsed(FragmentValue::Effort("thrusters".into())),
        ];
        let overlay = vec![rep(21, FragmentOrigin::Runtime)];

        let merged = merge_fragments(&base, &overlay);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].value, FragmentValue::Rep(21));
        assert_eq!(merged[1].value, FragmentValue::Effort("thrusters".into()));
    }

    #[test]
    fn parser_overlay_does_not_replace_runtime_value() {
        let base = vec![rep(21, FragmentOrigin::Runtime)];
        let overlay = vec![rep(10, FragmentOrigin::Parser)];

        let merged = merge_fragments(&base, &overlay);
        assert_eq!(merged, vec![rep(21, FragmentOrigin::Runtime)]);
    }

    #[test]
    fn overlay_only_kinds_are_appended() {
        let base = vec![Fragment::parsed(FragmentValue::Label("Fran".into()))];
        let overlay = vec![rep(15, FragmentOrigin::Runtime)];

        let merged = merge_fragments(&base, &overlay);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[1].kind(), FragmentKind::Rep);
    }

    #[test]
    fn kind_names_round_trip_through_strum() {
        use std::str::FromStr;
        assert_eq!(FragmentKind::RepScheme.as_ref(), "rep_scheme");
        assert_eq!(FragmentKind::from_str("TIMER"), Ok(FragmentKind::Timer));
    }
}
