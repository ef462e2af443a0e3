use workout_core::{BlockKey, Fragment};

use super::Block;
use crate::behavior::Behavior;

/// Assembles a [`Block`]; behaviors are stable-sorted by priority on build.
///
/// # Examples
///
/// ```
/// use workout_runtime::Block;
/// use workout_runtime::behaviors::{CompleteOnNext, Display, SegmentOutput};
///
/// let block = Block::builder("Pushups")
///     .behavior(SegmentOutput)
///     .behavior(Display::default())
///     .behavior(CompleteOnNext)
///     .build();
///
/// assert_eq!(block.behavior_names(), ["complete_on_next", "segment_output", "display"]);
/// ```
pub struct BlockBuilder {
    key: Option<BlockKey>,
    label: String,
    fragments: Vec<Fragment>,
    behaviors: Vec<Box<dyn Behavior>>,
}

impl BlockBuilder {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            key: None,
            label: label.into(),
            fragments: Vec::new(),
            behaviors: Vec::new(),
        }
    }

    /// Uses a specific key instead of allocating a fresh one.
    #[must_use]
    pub fn key(mut self, key: BlockKey) -> Self {
        self.key = Some(key);
        self
    }

    #[must_use]
    pub fn fragments(mut self, fragments: impl IntoIterator<Item = Fragment>) -> Self {
        self.fragments.extend(fragments);
        self
    }

    #[must_use]
    pub fn fragment(mut self, fragment: Fragment) -> Self {
        self.fragments.push(fragment);
        self
    }

    #[must_use]
    pub fn behavior(mut self, behavior: impl Behavior + 'static) -> Self {
        self.behaviors.push(Box::new(behavior));
        self
    }

    #[must_use]
    pub fn boxed(mut self, behavior: Box<dyn Behavior>) -> Self {
        self.behaviors.push(behavior);
        self
    }

    pub fn push(&mut self, behavior: impl Behavior + 'static) {
        self.behaviors.push(Box::new(behavior));
    }

    pub fn build(self) -> Block {
        let key = self.key.unwrap_or_default();
        let mut behaviors = self.behaviors;
        behaviors.sort_by_key(|behavior| behavior.priority());

        let fragments = self
            .fragments
            .into_iter()
            .map(|fragment| match fragment.owner {
                Some(_) => fragment,
                None => fragment.owned_by(key),
            })
            .collect();

        Block::from_parts(key, self.label, fragments, behaviors)
    }
}
