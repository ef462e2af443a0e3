//! Append-only output stream consumed by the presentation layer.

use crate::fragment::Fragment;
use crate::types::{BlockKey, TimeSpan};

/// What an output statement reports.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display, strum::AsRefStr,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case")]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum OutputKind {
    /// A block started.
    Segment,
    /// Something notable happened inside a running block (a round ended).
    Milestone,
    /// A block finished.
    Completion,
}

/// Immutable record of one reported moment.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OutputStatement {
    /// Position in the log, starting at zero.
    pub sequence: u64,
    pub kind: OutputKind,
    pub owner: BlockKey,
    pub label: String,
    /// Stack depth of the owner when the statement was emitted (root = 0).
    pub depth: usize,
    pub span: TimeSpan,
    pub fragments: Vec<Fragment>,
}

/// Append-only log of output statements.
///
/// Statements are never mutated or removed after emission; consumers keep a
/// cursor and read with [`OutputLog::since`].
#[derive(Clone, Debug, Default)]
pub struct OutputLog {
    statements: Vec<OutputStatement>,
}

impl OutputLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a statement and returns it with its assigned sequence number.
    pub fn append(
        &mut self,
        kind: OutputKind,
        owner: BlockKey,
        label: impl Into<String>,
        depth: usize,
        span: TimeSpan,
        fragments: Vec<Fragment>,
    ) -> &OutputStatement {
        let sequence = self.statements.len() as u64;
        self.statements.push(OutputStatement {
            sequence,
            kind,
            owner,
            label: label.into(),
            depth,
            span,
            fragments,
        });
        &self.statements[self.statements.len() - 1]
    }

    pub fn all(&self) -> &[OutputStatement] {
        &self.statements
    }

    /// Statements appended at or after `cursor`.
    pub fn since(&self, cursor: usize) -> &[OutputStatement] {
        self.statements.get(cursor..).unwrap_or(&[])
    }

    pub fn last(&self) -> Option<&OutputStatement> {
        self.statements.last()
    }

    pub fn of_kind(&self, kind: OutputKind) -> impl Iterator<Item = &OutputStatement> + '_ {
        self.statements.iter().filter(move |s| s.kind == kind)
    }

    pub fn by_owner(&self, owner: BlockKey) -> impl Iterator<Item = &OutputStatement> + '_ {
        self.statements.iter().filter(move |s| s.owner == owner)
    }

    pub fn len(&self) -> usize {
        self.statements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Timestamp;

    #[test]
    fn sequences_follow_append_order() {
        let mut log = OutputLog::new();
        let owner = BlockKey::new();
        log.append(
            OutputKind::Segment,
            owner,
            "warmup",
            0,
            TimeSpan::open(Timestamp(0)),
            vec![],
        );
        let second = log
            .append(
                OutputKind::Completion,
                owner,
                "warmup",
                0,
                TimeSpan::closed(Timestamp(0), Timestamp(5)),
                vec![],
            )
            .sequence;

        assert_eq!(second, 1);
        assert_eq!(log.since(1).len(), 1);
        assert!(log.since(7).is_empty());
        assert_eq!(log.of_kind(OutputKind::Completion).count(), 1);
    }
}
