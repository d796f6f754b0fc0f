//! Weighted animation clip: per-frame poses plus per-frame blend weight.

use serde::{Deserialize, Serialize};

use crate::error::BlendError;
use crate::pose::Pose;

/// A skeletal animation clip with a scalar blend weight per frame.
///
/// Frames are 0-indexed and there is always at least one; `frame_weights`
/// has exactly one entry per frame, each clamped to [0,1].
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct WeightedAnimation {
    name: String,
    frames: Vec<Pose>,
    frame_weights: Vec<f32>,
}

impl WeightedAnimation {
    /// Build a clip with every frame at full weight.
    pub fn new(name: impl Into<String>, frames: Vec<Pose>) -> Result<Self, BlendError> {
        let weights = vec![1.0; frames.len()];
        Self::with_weights(name, frames, weights)
    }

    /// Build a clip with explicit frame weights (clamped to [0,1]).
    pub fn with_weights(
        name: impl Into<String>,
        frames: Vec<Pose>,
        frame_weights: Vec<f32>,
    ) -> Result<Self, BlendError> {
        let anim = Self {
            name: name.into(),
            frames,
            frame_weights: frame_weights.into_iter().map(clamp_weight).collect(),
        };
        anim.validate_basic()?;
        Ok(anim)
    }

    /// A clip that holds one posture for `weights.len()` frames.
    pub fn held(
        name: impl Into<String>,
        pose: Pose,
        frame_weights: Vec<f32>,
    ) -> Result<Self, BlendError> {
        let frames = vec![pose; frame_weights.len()];
        Self::with_weights(name, frames, frame_weights)
    }

    /// Validate invariants: non-empty, weights match frames, finite
    /// channels, consistent joint count.
    pub fn validate_basic(&self) -> Result<(), BlendError> {
        let first = self
            .frames
            .first()
            .ok_or_else(|| BlendError::invalid(format!("'{}' has no frames", self.name)))?;
        if self.frame_weights.len() != self.frames.len() {
            return Err(BlendError::invalid(format!(
                "'{}' has {} frame weights for {} frames",
                self.name,
                self.frame_weights.len(),
                self.frames.len()
            )));
        }
        let joints = first.joint_count();
        for (idx, pose) in self.frames.iter().enumerate() {
            if pose.joint_count() != joints {
                return Err(BlendError::invalid(format!(
                    "'{}' frame {idx} has {} joints, expected {joints}",
                    self.name,
                    pose.joint_count()
                )));
            }
            if !pose.is_finite() {
                return Err(BlendError::invalid(format!(
                    "'{}' frame {idx} has non-finite channels",
                    self.name
                )));
            }
        }
        if self.frame_weights.iter().any(|w| !w.is_finite()) {
            return Err(BlendError::invalid(format!(
                "'{}' has non-finite frame weights",
                self.name
            )));
        }
        Ok(())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    #[inline]
    pub fn joint_count(&self) -> usize {
        self.frames[0].joint_count()
    }

    pub fn frames(&self) -> &[Pose] {
        &self.frames
    }

    pub fn pose(&self, frame: usize) -> Option<&Pose> {
        self.frames.get(frame)
    }

    pub fn first_pose(&self) -> &Pose {
        &self.frames[0]
    }

    pub fn last_pose(&self) -> &Pose {
        &self.frames[self.frames.len() - 1]
    }

    pub fn frame_weights(&self) -> &[f32] {
        &self.frame_weights
    }

    /// Weight at `frame`, 0 outside the clip.
    #[inline]
    pub fn frame_weight(&self, frame: usize) -> f32 {
        self.frame_weights.get(frame).copied().unwrap_or(0.0)
    }

    /// Set a frame weight (clamped). Returns false when `frame` is out of
    /// range or the weight is NaN.
    pub fn set_frame_weight(&mut self, frame: usize, weight: f32) -> bool {
        if weight.is_nan() {
            return false;
        }
        match self.frame_weights.get_mut(frame) {
            Some(slot) => {
                *slot = clamp_weight(weight);
                true
            }
            None => false,
        }
    }

    /// Whether frame 0 is a T-pose reference frame.
    pub fn is_first_frame_t_pose(&self, tolerance: f32) -> bool {
        self.first_pose().is_t_pose(tolerance)
    }

    /// Remove the leading frame (typically an initial T-pose).
    pub fn cut_initial_frame(&mut self) -> Result<(), BlendError> {
        if self.frames.len() < 2 {
            return Err(BlendError::invalid(format!(
                "'{}' cannot drop its only frame",
                self.name
            )));
        }
        self.frames.remove(0);
        self.frame_weights.remove(0);
        Ok(())
    }
}

#[inline]
fn clamp_weight(w: f32) -> f32 {
    if w.is_nan() {
        w
    } else {
        w.clamp(0.0, 1.0)
    }
}

#[derive(Debug, Deserialize)]
struct StoredClip {
    name: String,
    frames: Vec<Pose>,
    #[serde(default)]
    frame_weights: Option<Vec<f32>>,
}

/// Decode a JSON clip into a validated WeightedAnimation.
///
/// `frame_weights` is optional and defaults to full weight on every frame.
pub fn parse_clip_json(s: &str) -> Result<WeightedAnimation, BlendError> {
    let clip: StoredClip = serde_json::from_str(s).map_err(|e| BlendError::ClipFormat {
        reason: format!("parse error: {e}"),
    })?;
    match clip.frame_weights {
        Some(weights) => WeightedAnimation::with_weights(clip.name, clip.frames, weights),
        None => WeightedAnimation::new(clip.name, clip.frames),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frames(n: usize) -> Vec<Pose> {
        (0..n)
            .map(|i| Pose::new([i as f32, 0.0, 0.0], vec![[i as f32; 3]]))
            .collect()
    }

    #[test]
    fn new_defaults_to_full_weight() {
        let a = WeightedAnimation::new("a", frames(3)).unwrap();
        assert_eq!(a.frame_count(), 3);
        assert_eq!(a.frame_weights(), &[1.0, 1.0, 1.0]);
        assert_eq!(a.frame_weight(7), 0.0);
    }

    #[test]
    fn rejects_empty_and_mismatched_weights() {
        assert!(matches!(
            WeightedAnimation::new("a", vec![]),
            Err(BlendError::InvalidAnimation { .. })
        ));
        assert!(matches!(
            WeightedAnimation::with_weights("a", frames(2), vec![1.0]),
            Err(BlendError::InvalidAnimation { .. })
        ));
    }

    #[test]
    fn weights_are_clamped() {
        let mut a = WeightedAnimation::with_weights("a", frames(2), vec![-1.0, 3.0]).unwrap();
        assert_eq!(a.frame_weights(), &[0.0, 1.0]);
        assert!(a.set_frame_weight(0, 0.25));
        assert!(!a.set_frame_weight(2, 0.25));
        assert_eq!(a.frame_weight(0), 0.25);
    }

    #[test]
    fn cut_initial_frame_keeps_weights_aligned() {
        let mut a = WeightedAnimation::with_weights("a", frames(3), vec![0.1, 0.5, 0.9]).unwrap();
        a.cut_initial_frame().unwrap();
        assert_eq!(a.frame_count(), 2);
        assert_eq!(a.frame_weights(), &[0.5, 0.9]);
        assert_eq!(a.first_pose().root_position[0], 1.0);

        let mut single = WeightedAnimation::new("s", frames(1)).unwrap();
        assert!(single.cut_initial_frame().is_err());
    }

    #[test]
    fn parse_clip_json_defaults_weights() {
        let json = r#"{
            "name": "nod",
            "frames": [
                { "root_position": [0, 1, 0], "rotations": [[0, 0, 0]] },
                { "root_position": [0, 1, 0], "rotations": [[10, 0, 0]] }
            ]
        }"#;
        let a = parse_clip_json(json).unwrap();
        assert_eq!(a.name(), "nod");
        assert_eq!(a.frame_weights(), &[1.0, 1.0]);
        assert!(a.is_first_frame_t_pose(0.5));
    }

    #[test]
    fn parse_clip_json_reports_format_errors() {
        assert!(matches!(
            parse_clip_json("{ \"name\": 3 }"),
            Err(BlendError::ClipFormat { .. })
        ));
    }
}
