//! Ordered list of active blocks, innermost last.
use workout_core::BlockKey;

use crate::block::Block;

#[derive(Debug, Default)]
pub struct RuntimeStack {
    frames: Vec<Block>,
}

impl RuntimeStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, block: Block) {
        self.frames.push(block);
    }

    /// Removes the frame holding `key`, returning its former position.
    pub(crate) fn remove(&mut self, key: BlockKey) -> Option<(usize, Block)> {
        let position = self.position(key)?;
        Some((position, self.frames.remove(position)))
    }

    pub(crate) fn get_mut(&mut self, position: usize) -> Option<&mut Block> {
        self.frames.get_mut(position)
    }

    pub(crate) fn find_mut(&mut self, key: BlockKey) -> Option<&mut Block> {
        self.frames.iter_mut().find(|block| block.key() == key)
    }

    pub fn get(&self, position: usize) -> Option<&Block> {
        self.frames.get(position)
    }

    pub fn find(&self, key: BlockKey) -> Option<&Block> {
        self.frames.iter().find(|block| block.key() == key)
    }

    /// The innermost block.
    pub fn current(&self) -> Option<&Block> {
        self.frames.last()
    }

    pub fn root(&self) -> Option<&Block> {
        self.frames.first()
    }

    pub fn position(&self, key: BlockKey) -> Option<usize> {
        self.frames.iter().position(|block| block.key() == key)
    }

    pub fn contains(&self, key: BlockKey) -> bool {
        self.position(key).is_some()
    }

    /// Keys root first.
    pub fn keys(&self) -> Vec<BlockKey> {
        self.frames.iter().map(Block::key).collect()
    }

    /// Keys of the frames below `position`, root first.
    pub fn lineage(&self, position: usize) -> Vec<BlockKey> {
        self.frames
            .iter()
            .take(position)
            .map(Block::key)
            .collect()
    }

    /// Outermost frame whose completion flag is set.
    pub fn first_complete_index(&self) -> Option<usize> {
        self.frames.iter().position(Block::is_complete)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Block> + '_ {
        self.frames.iter()
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use workout_core::Timestamp;

    use super::*;

    #[test]
    fn lineage_and_completion_lookup() {
        let mut stack = RuntimeStack::new();
        let root = Block::builder("root").build();
        let child = Block::builder("child").build();
        let (root_key, child_key) = (root.key(), child.key());
        stack.push(root);
        stack.push(child);

        assert_eq!(stack.lineage(1), vec![root_key]);
        assert_eq!(stack.current().map(Block::key), Some(child_key));
        assert_eq!(stack.first_complete_index(), None);

        if let Some(block) = stack.find_mut(root_key) {
            block.mark_complete("done", Timestamp(5));
        }
        assert_eq!(stack.first_complete_index(), Some(0));

        let removed = stack.remove(child_key).map(|(position, _)| position);
        assert_eq!(removed, Some(1));
        assert_eq!(stack.keys(), vec![root_key]);
    }
}
