//! Identifiers and simple allocators for trails and placed items.

use serde::{Deserialize, Serialize};

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct TrailId(pub u32);

/// Stable handle of an item within its trail. Survives re-sorting.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct ItemId(pub u32);

/// Monotonic allocator for TrailId and ItemId.
/// Handles are never reused, so a detached item's id cannot alias a newer one.
#[derive(Default, Debug, Clone)]
pub struct IdAllocator {
    next_trail: u32,
    next_item: u32,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn alloc_trail(&mut self) -> TrailId {
        let id = TrailId(self.next_trail);
        self.next_trail = self.next_trail.wrapping_add(1);
        id
    }

    #[inline]
    pub fn alloc_item(&mut self) -> ItemId {
        let id = ItemId(self.next_item);
        self.next_item = self.next_item.wrapping_add(1);
        id
    }
}
