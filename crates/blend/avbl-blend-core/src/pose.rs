//! Skeleton pose: root position plus per-joint rotation channels.
//!
//! Joint order is owned by the skeleton the clip was decoded against; the
//! engine only relies on index `i` meaning the same joint across clips.

use serde::{Deserialize, Serialize};

/// Euler rotation channels of one joint, in degrees.
pub type Rotation = [f32; 3];

/// One frame's full skeleton posture.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    pub root_position: [f32; 3],
    pub rotations: Vec<Rotation>,
}

impl Pose {
    pub fn new(root_position: [f32; 3], rotations: Vec<Rotation>) -> Self {
        Self {
            root_position,
            rotations,
        }
    }

    /// Rest posture (all rotations zero, root at origin).
    pub fn rest(joint_count: usize) -> Self {
        Self {
            root_position: [0.0; 3],
            rotations: vec![[0.0; 3]; joint_count],
        }
    }

    #[inline]
    pub fn joint_count(&self) -> usize {
        self.rotations.len()
    }

    /// True when every joint rotation is within `tolerance` degrees of zero.
    /// Root position is ignored; a T-pose may stand anywhere.
    pub fn is_t_pose(&self, tolerance: f32) -> bool {
        self.rotations
            .iter()
            .flat_map(|r| r.iter())
            .all(|c| c.abs() <= tolerance)
    }

    pub(crate) fn is_finite(&self) -> bool {
        self.root_position.iter().all(|c| c.is_finite())
            && self.rotations.iter().flatten().all(|c| c.is_finite())
    }
}
