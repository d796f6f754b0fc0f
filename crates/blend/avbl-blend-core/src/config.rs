//! Configuration for the blending pipeline and timeline.

use serde::{Deserialize, Serialize};

/// Blending and placement options.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlendConfig {
    /// Generate mix-in shadow items during `blend_trails`.
    pub mix_in_shadows: bool,
    /// Generate mix-out shadow items during `blend_trails`.
    pub mix_out_shadows: bool,
    /// Max absolute joint rotation (degrees) for a frame to count as a T-pose.
    pub t_pose_tolerance: f32,
    /// Timeline capacity in frames; `None` means unbounded.
    pub timeline_frames: Option<u32>,
}

impl Default for BlendConfig {
    fn default() -> Self {
        Self {
            mix_in_shadows: true,
            mix_out_shadows: true,
            t_pose_tolerance: 0.5,
            timeline_frames: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_fills_defaults() {
        let cfg: BlendConfig = serde_json::from_str(r#"{ "timeline_frames": 240 }"#).unwrap();
        assert_eq!(cfg.timeline_frames, Some(240));
        assert!(cfg.mix_in_shadows);
        assert!(cfg.mix_out_shadows);
        assert_eq!(cfg.t_pose_tolerance, 0.5);
    }
}
