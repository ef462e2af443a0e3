//! Block-scoped memory store.
//!
//! Every location is owned by one block and carries a [`Visibility`]:
//!
//! - [`Visibility::Private`]: readable only by the owner's behaviors.
//! - [`Visibility::Inherited`]: readable by the owner and every descendant on
//!   the stack. Used to cascade round numbers and rep targets downward.
//! - [`Visibility::Public`]: readable by any block and by presentation
//!   snapshots.
//!
//! Writes always require the owner. Locations are released in one sweep when
//! their owner is disposed; handles that outlive the release read as absent.
//!
//! Two addressing schemes share the arena. Handles ([`MemoryRef`]) address one
//! location exactly. Tag addressing (`push`/`update`/`read_tag`) addresses the
//! first location of a tag owned by a block, which is enough for the common
//! "producer writes, consumers read latest" pattern.
mod error;
mod tag;

pub use error::MemoryError;
pub use tag::MemoryTag;

use std::collections::BTreeMap;

use crate::fragment::{Fragment, FragmentKind};
use crate::types::BlockKey;

/// Cross-block read scope of a memory location.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, strum::Display, strum::AsRefStr,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case")]
pub enum Visibility {
    #[default]
    Private,
    Public,
    Inherited,
}

impl Visibility {
    /// Visible to presentation snapshots.
    #[inline]
    pub const fn is_visible(self) -> bool {
        matches!(self, Self::Public | Self::Inherited)
    }
}

/// Arena-unique location identifier. Never reused.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MemoryId(pub u64);

/// Handle to one memory location.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MemoryRef {
    pub id: MemoryId,
    pub tag: MemoryTag,
    pub owner: BlockKey,
    pub visibility: Visibility,
}

#[derive(Clone, Debug)]
struct Location {
    tag: MemoryTag,
    owner: BlockKey,
    visibility: Visibility,
    fragments: Vec<Fragment>,
}

impl Location {
    fn reference(&self, id: MemoryId) -> MemoryRef {
        MemoryRef {
            id,
            tag: self.tag,
            owner: self.owner,
            visibility: self.visibility,
        }
    }
}

/// Filter for [`MemoryStore::search`]. Unset fields match everything.
#[derive(Clone, Debug, Default)]
pub struct SearchCriteria {
    pub tag: Option<MemoryTag>,
    pub owner: Option<BlockKey>,
    pub visibility: Option<Visibility>,
    pub kind: Option<FragmentKind>,
}

impl SearchCriteria {
    pub fn tag(mut self, tag: MemoryTag) -> Self {
        self.tag = Some(tag);
        self
    }

    pub fn owner(mut self, owner: BlockKey) -> Self {
        self.owner = Some(owner);
        self
    }

    pub fn visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = Some(visibility);
        self
    }

    /// Match locations holding at least one fragment of `kind`.
    pub fn kind(mut self, kind: FragmentKind) -> Self {
        self.kind = Some(kind);
        self
    }

    fn matches(&self, location: &Location) -> bool {
        self.tag.is_none_or(|tag| tag == location.tag)
            && self.owner.is_none_or(|owner| owner == location.owner)
            && self
                .visibility
                .is_none_or(|visibility| visibility == location.visibility)
            && self
                .kind
                .is_none_or(|kind| location.fragments.iter().any(|f| f.kind() == kind))
    }
}

/// Read-only copy of a visible location, for presentation snapshots.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MemorySnapshot {
    pub tag: String,
    pub owner: BlockKey,
    pub visibility: Visibility,
    pub fragments: Vec<Fragment>,
}

/// Arena of tagged fragment lists owned by blocks.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    next_id: u64,
    locations: BTreeMap<MemoryId, Location>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocates a location and returns its handle.
    pub fn allocate(
        &mut self,
        tag: MemoryTag,
        owner: BlockKey,
        initial: Vec<Fragment>,
        visibility: Visibility,
    ) -> MemoryRef {
        self.next_id += 1;
        let id = MemoryId(self.next_id);
        let location = Location {
            tag,
            owner,
            visibility,
            fragments: initial,
        };
        let reference = location.reference(id);
        self.locations.insert(id, location);
        reference
    }

    /// Current value behind a handle, `None` once released.
    pub fn get(&self, reference: &MemoryRef) -> Option<&[Fragment]> {
        self.locations
            .get(&reference.id)
            .map(|location| location.fragments.as_slice())
    }

    /// Replaces the value behind a handle. Only the owner may write.
    pub fn set(
        &mut self,
        reference: &MemoryRef,
        writer: BlockKey,
        value: Vec<Fragment>,
    ) -> Result<(), MemoryError> {
        let location = self
            .locations
            .get_mut(&reference.id)
            .ok_or(MemoryError::Released { id: reference.id })?;

        if location.owner != writer {
            return Err(MemoryError::NotOwner {
                id: reference.id,
                owner: location.owner,
                writer,
            });
        }

        location.fragments = value;
        Ok(())
    }

    /// True while the handle still addresses a live location.
    pub fn contains(&self, reference: &MemoryRef) -> bool {
        self.locations.contains_key(&reference.id)
    }

    /// Handles of every live location matching `criteria`, in allocation order.
    pub fn search(&self, criteria: &SearchCriteria) -> Vec<MemoryRef> {
        self.locations
            .iter()
            .filter(|(_, location)| criteria.matches(location))
            .map(|(id, location)| location.reference(*id))
            .collect()
    }

    /// Frees every location owned by `owner`; returns how many were freed.
    pub fn release(&mut self, owner: BlockKey) -> usize {
        let before = self.locations.len();
        self.locations.retain(|_, location| location.owner != owner);
        before - self.locations.len()
    }

    /// Appends a new location under `tag` for `owner`.
    pub fn push(
        &mut self,
        owner: BlockKey,
        tag: MemoryTag,
        fragments: Vec<Fragment>,
        visibility: Visibility,
    ) -> MemoryRef {
        self.allocate(tag, owner, fragments, visibility)
    }

    /// Replaces the value of the first location of `tag` owned by `owner`.
    ///
    /// Returns the handle that was updated, or `None` when no such location
    /// exists.
    pub fn update(
        &mut self,
        owner: BlockKey,
        tag: MemoryTag,
        fragments: Vec<Fragment>,
    ) -> Option<MemoryRef> {
        let (id, location) = self
            .locations
            .iter_mut()
            .find(|(_, location)| location.owner == owner && location.tag == tag)?;
        location.fragments = fragments;
        Some(location.reference(*id))
    }

    /// Value of the first location of `tag` owned by `owner`.
    pub fn read_tag(&self, owner: BlockKey, tag: MemoryTag) -> Option<&[Fragment]> {
        self.locations
            .values()
            .find(|location| location.owner == owner && location.tag == tag)
            .map(|location| location.fragments.as_slice())
    }

    /// Whether `reader`, whose ancestors are `lineage` (root first), may read
    /// the location behind `reference`.
    pub fn can_read(&self, reader: BlockKey, lineage: &[BlockKey], reference: &MemoryRef) -> bool {
        self.locations
            .get(&reference.id)
            .is_some_and(|location| Self::readable(location, reader, lineage))
    }

    /// Nearest value of `tag` visible to `reader`.
    ///
    /// Lookup order: the reader's own locations, then ancestors from the
    /// nearest outward (public or inherited only), then any public location.
    pub fn read_visible(
        &self,
        reader: BlockKey,
        lineage: &[BlockKey],
        tag: MemoryTag,
    ) -> Option<&[Fragment]> {
        if let Some(own) = self.read_tag(reader, tag) {
            return Some(own);
        }

        for ancestor in lineage.iter().rev() {
            let found = self.locations.values().find(|location| {
                location.owner == *ancestor && location.tag == tag && location.visibility.is_visible()
            });
            if let Some(location) = found {
                return Some(location.fragments.as_slice());
            }
        }

        self.locations
            .values()
            .find(|location| location.tag == tag && location.visibility == Visibility::Public)
            .map(|location| location.fragments.as_slice())
    }

    /// Copies of every public or inherited location, in allocation order.
    pub fn visible_snapshot(&self) -> Vec<MemorySnapshot> {
        self.locations
            .values()
            .filter(|location| location.visibility.is_visible())
            .map(|location| MemorySnapshot {
                tag: location.tag.as_str().to_owned(),
                owner: location.owner,
                visibility: location.visibility,
                fragments: location.fragments.clone(),
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.locations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }

    fn readable(location: &Location, reader: BlockKey, lineage: &[BlockKey]) -> bool {
        if location.owner == reader {
            return true;
        }
        match location.visibility {
            Visibility::Private => false,
            Visibility::Public => true,
            Visibility::Inherited => lineage.contains(&location.owner),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fragment::FragmentValue;

    fn reps(n: u32) -> Vec<Fragment> {
        vec![Fragment::parsed(FragmentValue::Rep(n))]
    }

    #[test]
    fn set_requires_owner() {
        let mut store = MemoryStore::new();
        let owner = BlockKey::new();
        let intruder = BlockKey::new();
        let handle = store.allocate(MemoryTag::REP_TARGET, owner, reps(21), Visibility::Public);

        let err = store.set(&handle, intruder, reps(1)).unwrap_err();
        assert!(matches!(err, MemoryError::NotOwner { .. }));

        store.set(&handle, owner, reps(15)).unwrap();
        assert_eq!(store.get(&handle), Some(reps(15).as_slice()));
    }

    #[test]
    fn release_frees_every_owned_location_and_stale_handles_read_absent() {
        let mut store = MemoryStore::new();
        let owner = BlockKey::new();
        let other = BlockKey::new();
        let a = store.allocate(MemoryTag::TIMER, owner, vec![], Visibility::Public);
        let b = store.allocate(MemoryTag::ROUNDS, owner, vec![], Visibility::Private);
        let c = store.allocate(MemoryTag::ROUNDS, other, vec![], Visibility::Private);

        assert_eq!(store.release(owner), 2);
        assert_eq!(store.get(&a), None);
        assert_eq!(store.get(&b), None);
        assert!(store.get(&c).is_some());
        assert_eq!(store.set(&a, owner, reps(1)), Err(MemoryError::Released { id: a.id }));

        // A later allocation never resurrects the released value.
        let d = store.allocate(MemoryTag::TIMER, owner, reps(3), Visibility::Public);
        assert_ne!(a.id, d.id);
        assert_eq!(store.get(&a), None);
    }

    #[test]
    fn update_by_tag_touches_first_match_only() {
        let mut store = MemoryStore::new();
        let owner = BlockKey::new();
        let first = store.push(owner, MemoryTag::DISPLAY, reps(1), Visibility::Public);
        let second = store.push(owner, MemoryTag::DISPLAY, reps(2), Visibility::Public);

        let updated = store.update(owner, MemoryTag::DISPLAY, reps(9)).unwrap();
        assert_eq!(updated.id, first.id);
        assert_eq!(store.get(&first), Some(reps(9).as_slice()));
        assert_eq!(store.get(&second), Some(reps(2).as_slice()));
        assert_eq!(store.read_tag(owner, MemoryTag::DISPLAY), Some(reps(9).as_slice()));
    }

    #[test]
    fn private_locations_are_unreadable_outside_owner() {
        let mut store = MemoryStore::new();
        let parent = BlockKey::new();
        let child = BlockKey::new();
        let hidden = store.allocate(MemoryTag::CHILDREN, parent, vec![], Visibility::Private);

        assert!(store.can_read(parent, &[], &hidden));
        assert!(!store.can_read(child, &[parent], &hidden));
        assert_eq!(store.read_visible(child, &[parent], MemoryTag::CHILDREN), None);
    }

    #[test]
    fn inherited_locations_cascade_to_descendants_only() {
        let mut store = MemoryStore::new();
        let parent = BlockKey::new();
        let child = BlockKey::new();
        let stranger = BlockKey::new();
        let target = store.allocate(MemoryTag::REP_TARGET, parent, reps(21), Visibility::Inherited);

        assert!(store.can_read(child, &[parent], &target));
        assert!(!store.can_read(stranger, &[], &target));
        assert_eq!(
            store.read_visible(child, &[parent], MemoryTag::REP_TARGET),
            Some(reps(21).as_slice())
        );
    }

    #[test]
    fn nearest_ancestor_wins() {
        let mut store = MemoryStore::new();
        let root = BlockKey::new();
        let middle = BlockKey::new();
        let leaf = BlockKey::new();
        store.allocate(MemoryTag::REP_TARGET, root, reps(21), Visibility::Inherited);
        store.allocate(MemoryTag::REP_TARGET, middle, reps(5), Visibility::Inherited);

        assert_eq!(
            store.read_visible(leaf, &[root, middle], MemoryTag::REP_TARGET),
            Some(reps(5).as_slice())
        );
    }

    #[test]
    fn search_filters_by_owner_visibility_and_kind() {
        let mut store = MemoryStore::new();
        let a = BlockKey::new();
        let b = BlockKey::new();
        store.allocate(MemoryTag::REP_TARGET, a, reps(1), Visibility::Public);
        store.allocate(MemoryTag::DISPLAY, a, vec![], Visibility::Private);
        store.allocate(MemoryTag::REP_TARGET, b, reps(2), Visibility::Inherited);

        let public_of_a = store.search(&SearchCriteria::default().owner(a).visibility(Visibility::Public));
        assert_eq!(public_of_a.len(), 1);

        let with_reps = store.search(&SearchCriteria::default().kind(FragmentKind::Rep));
        assert_eq!(with_reps.len(), 2);

        assert_eq!(store.visible_snapshot().len(), 2);
    }
}
