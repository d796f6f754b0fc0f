//! Timeline: document-level owner of trails and the blend entry point.
//!
//! Methods:
//! - new, add_animation (one new trail per imported clip), place (extra item on an existing trail)
//! - move_item / detach / remove_trail / clear (editing)
//! - blend (flatten → shadows → composite)

use serde::Serialize;

use crate::blender::{BlendOutput, Blender};
use crate::config::BlendConfig;
use crate::data::WeightedAnimation;
use crate::error::BlendError;
use crate::ids::{IdAllocator, ItemId, TrailId};
use crate::pose_source::PoseSource;
use crate::trail::{Trail, TrailItem};

/// Where a clip landed after `add_animation`.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
pub struct Placement {
    pub trail: TrailId,
    pub item: ItemId,
    /// Frame 0 of the clip is a T-pose. Hosts usually offer to cut it
    /// before joining clips.
    pub first_frame_t_pose: bool,
}

#[derive(Debug, Default)]
pub struct Timeline {
    cfg: BlendConfig,
    ids: IdAllocator,
    trails: Vec<Trail>,
}

impl Timeline {
    pub fn new(cfg: BlendConfig) -> Self {
        Self {
            cfg,
            ids: IdAllocator::new(),
            trails: Vec::new(),
        }
    }

    pub fn config(&self) -> &BlendConfig {
        &self.cfg
    }

    pub fn trails(&self) -> &[Trail] {
        &self.trails
    }

    pub fn trail(&self, id: TrailId) -> Option<&Trail> {
        self.trails.iter().find(|t| t.id() == id)
    }

    pub fn trail_mut(&mut self, id: TrailId) -> Option<&mut Trail> {
        self.trails.iter_mut().find(|t| t.id() == id)
    }

    pub fn item(&self, trail: TrailId, item: ItemId) -> Option<&TrailItem> {
        self.trail(trail).and_then(|t| t.get(item))
    }

    /// Total items across all trails.
    pub fn item_count(&self) -> usize {
        self.trails.iter().map(Trail::len).sum()
    }

    /// Import a decoded clip as a new trail holding one item at frame 0.
    pub fn add_animation(
        &mut self,
        animation: WeightedAnimation,
        name: &str,
    ) -> Result<Placement, BlendError> {
        self.check_capacity(0, animation.frame_count())?;
        let first_frame_t_pose = animation.is_first_frame_t_pose(self.cfg.t_pose_tolerance);
        if first_frame_t_pose {
            log::warn!("'{name}' starts with a T-pose frame");
        }

        let mut trail = Trail::new(self.ids.alloc_trail(), name);
        let item = trail.insert(TrailItem::new(name, animation, 0))?;
        let placement = Placement {
            trail: trail.id(),
            item,
            first_frame_t_pose,
        };
        self.trails.push(trail);
        Ok(placement)
    }

    /// Place an additional item on an existing trail.
    pub fn place(&mut self, trail: TrailId, item: TrailItem) -> Result<ItemId, BlendError> {
        self.check_capacity(item.begin_index(), item.frame_count())?;
        self.trail_mut(trail)
            .ok_or(BlendError::UnknownTrail { trail })?
            .insert(item)
    }

    pub fn move_item(
        &mut self,
        trail: TrailId,
        item: ItemId,
        begin_index: i64,
    ) -> Result<(), BlendError> {
        let frames = self
            .trail(trail)
            .ok_or(BlendError::UnknownTrail { trail })?
            .get(item)
            .ok_or(BlendError::UnknownItem { item })?
            .frame_count();
        self.check_capacity(begin_index, frames)?;
        self.trail_mut(trail)
            .ok_or(BlendError::UnknownTrail { trail })?
            .move_item(item, begin_index)
    }

    pub fn set_mix(
        &mut self,
        trail: TrailId,
        item: ItemId,
        mix_in: u32,
        mix_out: u32,
    ) -> Result<(), BlendError> {
        let entry = self
            .trail_mut(trail)
            .ok_or(BlendError::UnknownTrail { trail })?
            .get_mut(item)
            .ok_or(BlendError::UnknownItem { item })?;
        entry.set_mix_in(mix_in);
        entry.set_mix_out(mix_out);
        Ok(())
    }

    pub fn detach(&mut self, trail: TrailId, item: ItemId) -> Result<TrailItem, BlendError> {
        self.trail_mut(trail)
            .ok_or(BlendError::UnknownTrail { trail })?
            .detach(item)
    }

    pub fn remove_trail(&mut self, trail: TrailId) -> Result<Trail, BlendError> {
        let pos = self
            .trails
            .iter()
            .position(|t| t.id() == trail)
            .ok_or(BlendError::UnknownTrail { trail })?;
        Ok(self.trails.remove(pos))
    }

    /// Drop every trail. Ids keep counting, so handles from before the
    /// clear never resolve again.
    pub fn clear(&mut self) {
        self.trails.clear();
    }

    /// Composite every trail into one animation.
    pub fn blend(&self, poses: &dyn PoseSource) -> Result<BlendOutput, BlendError> {
        Blender::new(self.cfg.clone()).blend_trails(&self.trails, poses)
    }

    fn check_capacity(&self, begin_index: i64, frames: usize) -> Result<(), BlendError> {
        if let Some(capacity) = self.cfg.timeline_frames {
            let needed = begin_index + frames as i64;
            if needed > i64::from(capacity) {
                return Err(BlendError::NotEnoughSpace {
                    frames: needed,
                    capacity,
                });
            }
        }
        Ok(())
    }
}
