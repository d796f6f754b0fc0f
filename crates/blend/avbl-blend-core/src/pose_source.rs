//! Pose source capability used when a shadow item borrows a posture.
//!
//! Shadow items carry a weight ramp; their posture comes from the real clip
//! they sit next to. Hosts that decode skeletons lazily can implement
//! `PoseSource` themselves and pass it into shadow generation.

use crate::pose::Pose;
use crate::trail::TrailItem;

/// Which end of a neighbouring clip a shadow borrows from.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum PoseEdge {
    /// Frame 0 of the clip (mix-in shadows lead into it).
    First,
    /// Last frame of the clip (mix-out shadows trail off it).
    Last,
}

/// Provides postures for shadow items.
pub trait PoseSource {
    fn borrow_pose(&self, neighbor: &TrailItem, edge: PoseEdge) -> Option<Pose>;
}

/// Reads the posture straight from the neighbouring clip's frames.
#[derive(Copy, Clone, Debug, Default)]
pub struct NeighborPoseSource;

impl PoseSource for NeighborPoseSource {
    fn borrow_pose(&self, neighbor: &TrailItem, edge: PoseEdge) -> Option<Pose> {
        let anim = neighbor.animation();
        let pose = match edge {
            PoseEdge::First => anim.first_pose(),
            PoseEdge::Last => anim.last_pose(),
        };
        Some(pose.clone())
    }
}

/// Never provides a posture. Shadow generation fails with
/// `UnsupportedPoseSource` the moment a shadow is needed.
#[derive(Copy, Clone, Debug, Default)]
pub struct NoPoseSource;

impl PoseSource for NoPoseSource {
    fn borrow_pose(&self, _neighbor: &TrailItem, _edge: PoseEdge) -> Option<Pose> {
        None
    }
}
