//! Trails: ordered tracks of placed clips.
//!
//! A trail keeps its items in a Vec sorted by begin index (stable among equal
//! begins) and hands out `ItemId` handles that stay valid across re-sorting.
//! Neighbour links are derived from the ordering rather than stored.

use serde::Serialize;

use crate::data::WeightedAnimation;
use crate::error::BlendError;
use crate::ids::{IdAllocator, ItemId, TrailId};

/// Which crossfade a synthetic shadow item realizes.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize)]
pub enum ShadowKind {
    MixIn,
    MixOut,
}

/// Placement of one clip on the shared frame timeline.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TrailItem {
    name: String,
    begin_index: i64,
    mix_in: u32,
    mix_out: u32,
    shadow: Option<ShadowKind>,
    animation: WeightedAnimation,
}

impl TrailItem {
    /// A real (authored) item starting at `begin_index`.
    pub fn new(name: impl Into<String>, animation: WeightedAnimation, begin_index: i64) -> Self {
        Self {
            name: name.into(),
            begin_index,
            mix_in: 0,
            mix_out: 0,
            shadow: None,
            animation,
        }
    }

    /// Builder-style mix durations.
    pub fn with_mix(mut self, mix_in: u32, mix_out: u32) -> Self {
        self.mix_in = mix_in;
        self.mix_out = mix_out;
        self
    }

    pub(crate) fn shadow(kind: ShadowKind, animation: WeightedAnimation, begin_index: i64) -> Self {
        let name = match kind {
            ShadowKind::MixIn => "shadow (mix-in)",
            ShadowKind::MixOut => "shadow (mix-out)",
        };
        Self {
            name: name.to_string(),
            begin_index,
            mix_in: 0,
            mix_out: 0,
            shadow: Some(kind),
            animation,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn begin_index(&self) -> i64 {
        self.begin_index
    }

    /// Inclusive last frame; `end - begin + 1 == frame_count`.
    #[inline]
    pub fn end_index(&self) -> i64 {
        self.begin_index + self.animation.frame_count() as i64 - 1
    }

    #[inline]
    pub fn frame_count(&self) -> usize {
        self.animation.frame_count()
    }

    #[inline]
    pub fn mix_in(&self) -> u32 {
        self.mix_in
    }

    #[inline]
    pub fn mix_out(&self) -> u32 {
        self.mix_out
    }

    pub fn set_mix_in(&mut self, frames: u32) {
        self.mix_in = frames;
    }

    pub fn set_mix_out(&mut self, frames: u32) {
        self.mix_out = frames;
    }

    #[inline]
    pub fn is_shadow(&self) -> bool {
        self.shadow.is_some()
    }

    pub fn shadow_kind(&self) -> Option<ShadowKind> {
        self.shadow
    }

    pub fn animation(&self) -> &WeightedAnimation {
        &self.animation
    }

    /// Whether timeline frame `frame` falls inside this item.
    #[inline]
    pub fn contains(&self, frame: i64) -> bool {
        frame >= self.begin_index && frame <= self.end_index()
    }

    /// Clip-local frame for a timeline frame, if covered.
    #[inline]
    pub fn local_frame(&self, frame: i64) -> Option<usize> {
        if self.contains(frame) {
            Some((frame - self.begin_index) as usize)
        } else {
            None
        }
    }

    /// Effective weight at timeline frame `frame` (0 when not covered).
    pub fn weight_at(&self, frame: i64) -> f32 {
        self.local_frame(frame)
            .map(|f| self.animation.frame_weight(f))
            .unwrap_or(0.0)
    }
}

/// One track of the timeline.
#[derive(Clone, Debug)]
pub struct Trail {
    id: TrailId,
    name: String,
    ids: IdAllocator,
    items: Vec<(ItemId, TrailItem)>,
}

impl Trail {
    pub fn new(id: TrailId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            ids: IdAllocator::new(),
            items: Vec::new(),
        }
    }

    pub fn id(&self) -> TrailId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Items in begin-index order.
    pub fn items(&self) -> impl Iterator<Item = &TrailItem> {
        self.items.iter().map(|(_, item)| item)
    }

    pub fn item_ids(&self) -> Vec<ItemId> {
        self.items.iter().map(|(id, _)| *id).collect()
    }

    pub fn get(&self, id: ItemId) -> Option<&TrailItem> {
        self.position(id).map(|pos| &self.items[pos].1)
    }

    /// Mutable access for mix edits. Begin index changes go through `move_item`.
    pub fn get_mut(&mut self, id: ItemId) -> Option<&mut TrailItem> {
        let pos = self.position(id)?;
        Some(&mut self.items[pos].1)
    }

    /// Place `item`, keeping begin-index order. Items with an equal begin
    /// index keep their insertion order. Overlap is allowed; crossfades are
    /// built on it.
    pub fn insert(&mut self, item: TrailItem) -> Result<ItemId, BlendError> {
        validate_placement(&item)?;
        log::debug!(
            "trail '{}': placing '{}' at [{}, {}]",
            self.name,
            item.name,
            item.begin_index,
            item.end_index()
        );
        let id = self.ids.alloc_item();
        self.insert_sorted(id, item);
        Ok(id)
    }

    /// Remove an item and hand it back. Its former neighbours become adjacent.
    pub fn detach(&mut self, id: ItemId) -> Result<TrailItem, BlendError> {
        let pos = self
            .position(id)
            .ok_or(BlendError::UnknownItem { item: id })?;
        Ok(self.items.remove(pos).1)
    }

    /// Re-key an item to a new begin index; the handle is preserved.
    pub fn move_item(&mut self, id: ItemId, begin_index: i64) -> Result<(), BlendError> {
        let pos = self
            .position(id)
            .ok_or(BlendError::UnknownItem { item: id })?;
        if begin_index < 0 {
            return Err(BlendError::placement(format!(
                "begin index {begin_index} is before the timeline start"
            )));
        }
        let (_, mut item) = self.items.remove(pos);
        item.begin_index = begin_index;
        self.insert_sorted(id, item);
        Ok(())
    }

    /// Item placed immediately before `id` in trail order.
    pub fn previous(&self, id: ItemId) -> Option<(ItemId, &TrailItem)> {
        let pos = self.position(id)?;
        let prev = pos.checked_sub(1)?;
        self.items.get(prev).map(|(i, item)| (*i, item))
    }

    /// Item placed immediately after `id` in trail order.
    pub fn next(&self, id: ItemId) -> Option<(ItemId, &TrailItem)> {
        let pos = self.position(id)?;
        self.items.get(pos + 1).map(|(i, item)| (*i, item))
    }

    /// Remove every item, returning them in trail order.
    pub fn take_items(&mut self) -> Vec<TrailItem> {
        self.items.drain(..).map(|(_, item)| item).collect()
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    fn position(&self, id: ItemId) -> Option<usize> {
        self.items.iter().position(|(i, _)| *i == id)
    }

    fn insert_sorted(&mut self, id: ItemId, item: TrailItem) {
        let at = self
            .items
            .partition_point(|(_, existing)| existing.begin_index <= item.begin_index);
        self.items.insert(at, (id, item));
    }
}

fn validate_placement(item: &TrailItem) -> Result<(), BlendError> {
    if item.is_shadow() {
        return Err(BlendError::placement(format!(
            "'{}' is a shadow item; shadows live only inside a compositing pass",
            item.name
        )));
    }
    if item.begin_index < 0 {
        return Err(BlendError::placement(format!(
            "'{}' begins at {}, before the timeline start",
            item.name, item.begin_index
        )));
    }
    Ok(())
}

/// Empty every trail, moving all items into one flat collection.
///
/// Items from earlier trails come first; within a trail, trail order is kept.
pub fn drain_trails(trails: &mut [Trail]) -> Vec<TrailItem> {
    let total = trails.iter().map(Trail::len).sum();
    let mut out = Vec::with_capacity(total);
    for trail in trails.iter_mut() {
        out.extend(trail.take_items());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pose::Pose;

    fn clip(name: &str, frames: usize) -> WeightedAnimation {
        WeightedAnimation::new(name, vec![Pose::rest(1); frames]).unwrap()
    }

    fn begins(trail: &Trail) -> Vec<i64> {
        trail.items().map(TrailItem::begin_index).collect()
    }

    #[test]
    fn end_index_follows_frame_count() {
        let item = TrailItem::new("a", clip("a", 11), 0);
        assert_eq!(item.end_index(), 10);
        assert!(item.contains(10));
        assert!(!item.contains(11));
        assert_eq!(item.local_frame(4), Some(4));
    }

    #[test]
    fn insert_keeps_begin_order_and_ties_stable() {
        let mut t = Trail::new(TrailId(0), "t");
        let a = t.insert(TrailItem::new("a", clip("a", 5), 10)).unwrap();
        let b = t.insert(TrailItem::new("b", clip("b", 5), 0)).unwrap();
        let c = t.insert(TrailItem::new("c", clip("c", 5), 10)).unwrap();
        assert_eq!(begins(&t), vec![0, 10, 10]);
        assert_eq!(t.item_ids(), vec![b, a, c]);
    }

    #[test]
    fn neighbours_are_consistent() {
        let mut t = Trail::new(TrailId(0), "t");
        let a = t.insert(TrailItem::new("a", clip("a", 5), 0)).unwrap();
        let b = t.insert(TrailItem::new("b", clip("b", 5), 5)).unwrap();
        let c = t.insert(TrailItem::new("c", clip("c", 5), 10)).unwrap();

        assert!(t.previous(a).is_none());
        assert_eq!(t.next(a).map(|(id, _)| id), Some(b));
        assert_eq!(t.previous(b).map(|(id, _)| id), Some(a));
        assert_eq!(t.next(b).map(|(id, _)| id), Some(c));
        assert!(t.next(c).is_none());
    }

    #[test]
    fn detach_relinks_neighbours() {
        let mut t = Trail::new(TrailId(0), "t");
        let a = t.insert(TrailItem::new("a", clip("a", 5), 0)).unwrap();
        let b = t.insert(TrailItem::new("b", clip("b", 5), 5)).unwrap();
        let c = t.insert(TrailItem::new("c", clip("c", 5), 10)).unwrap();

        let taken = t.detach(b).unwrap();
        assert_eq!(taken.name(), "b");
        assert_eq!(t.next(a).map(|(id, _)| id), Some(c));
        assert_eq!(t.previous(c).map(|(id, _)| id), Some(a));
        assert_eq!(t.detach(b), Err(BlendError::UnknownItem { item: b }));
    }

    #[test]
    fn move_item_resorts_and_keeps_handle() {
        let mut t = Trail::new(TrailId(0), "t");
        let a = t.insert(TrailItem::new("a", clip("a", 5), 0)).unwrap();
        let b = t.insert(TrailItem::new("b", clip("b", 5), 5)).unwrap();
        t.move_item(a, 20).unwrap();
        assert_eq!(t.item_ids(), vec![b, a]);
        assert_eq!(t.get(a).unwrap().begin_index(), 20);
        assert!(t.move_item(a, -1).is_err());
    }

    #[test]
    fn insert_rejects_negative_begin_and_shadows() {
        let mut t = Trail::new(TrailId(0), "t");
        assert!(matches!(
            t.insert(TrailItem::new("a", clip("a", 5), -3)),
            Err(BlendError::PlacementConflict { .. })
        ));
        let shadow = TrailItem::shadow(ShadowKind::MixIn, clip("s", 2), 0);
        assert!(matches!(
            t.insert(shadow),
            Err(BlendError::PlacementConflict { .. })
        ));
        assert!(t.is_empty());
    }

    #[test]
    fn drain_trails_empties_every_trail() {
        let mut t1 = Trail::new(TrailId(0), "t1");
        let mut t2 = Trail::new(TrailId(1), "t2");
        t1.insert(TrailItem::new("a", clip("a", 5), 0)).unwrap();
        t1.insert(TrailItem::new("b", clip("b", 5), 8)).unwrap();
        t2.insert(TrailItem::new("c", clip("c", 5), 3)).unwrap();

        let mut trails = vec![t1, t2];
        let flat = drain_trails(&mut trails);
        assert_eq!(flat.len(), 3);
        assert!(trails.iter().all(Trail::is_empty));
        let names: Vec<&str> = flat.iter().map(TrailItem::name).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
    }
}
