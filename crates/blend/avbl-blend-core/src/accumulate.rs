//! Accumulation of weighted pose contributions into one blended Pose.
//!
//! Rotation channels are blended as a weighted linear sum of Euler angles.
//! That is a small-angle approximation, not spherical interpolation.

use crate::pose::Pose;

/// Normalize `weights` to sum to 1. When the sum is zero (or no weight is
/// positive) every entry gets the same share.
pub fn normalize_weights(weights: &[f32]) -> Vec<f32> {
    if weights.is_empty() {
        return Vec::new();
    }
    let total: f32 = weights.iter().map(|w| w.max(0.0)).sum();
    if total > 0.0 {
        weights.iter().map(|w| w.max(0.0) / total).collect()
    } else {
        let share = 1.0 / weights.len() as f32;
        vec![share; weights.len()]
    }
}

#[derive(Clone, Copy, Debug, Default)]
struct ChannelSum {
    sum: [f32; 3],
    w: f32,
}

impl ChannelSum {
    #[inline]
    fn add(&mut self, v: &[f32; 3], w: f32) {
        self.sum[0] += v[0] * w;
        self.sum[1] += v[1] * w;
        self.sum[2] += v[2] * w;
        self.w += w;
    }

    #[inline]
    fn finalize(self) -> Option<[f32; 3]> {
        if self.w > 0.0 {
            Some([self.sum[0] / self.w, self.sum[1] / self.w, self.sum[2] / self.w])
        } else {
            None
        }
    }
}

/// Accumulates per-joint weighted sums across the contributors of one frame.
///
/// Each joint keeps its own weight total, so a contributor with fewer joints
/// than the others only influences the joints it has.
#[derive(Default, Debug)]
pub struct PoseAccumulator {
    root: ChannelSum,
    joints: Vec<ChannelSum>,
}

impl PoseAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, pose: &Pose, weight: f32) {
        if weight <= 0.0 {
            return;
        }
        self.root.add(&pose.root_position, weight);
        if self.joints.len() < pose.rotations.len() {
            self.joints.resize(pose.rotations.len(), ChannelSum::default());
        }
        for (acc, rot) in self.joints.iter_mut().zip(&pose.rotations) {
            acc.add(rot, weight);
        }
    }

    /// Blended pose, or None when nothing positive was added.
    pub fn finalize(self) -> Option<Pose> {
        let root_position = self.root.finalize()?;
        let rotations = self
            .joints
            .into_iter()
            .map(|j| j.finalize().unwrap_or([0.0; 3]))
            .collect();
        Some(Pose {
            root_position,
            rotations,
        })
    }
}
