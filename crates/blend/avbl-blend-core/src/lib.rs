//! avbl blend core
//!
//! Timeline blending engine for skeletal animation clips. Clips are placed
//! on trails with declared mix-in/mix-out durations; a blending pass turns
//! those durations into synthetic "shadow" weight ramps and composites every
//! active clip into one continuous WeightedAnimation.
//!
//! The engine is single-threaded and synchronous. Compositing is a pure
//! function of the placed items, so identical timelines always produce
//! identical output.

pub mod accumulate;
pub mod blender;
pub mod config;
pub mod data;
pub mod error;
pub mod ids;
pub mod pose;
pub mod pose_source;
pub mod shadow;
pub mod timeline;
pub mod trail;

// Re-exports for consumers (presentation and persistence layers)
pub use accumulate::{normalize_weights, PoseAccumulator};
pub use blender::{flatten, output_range, sort_by_begin_index, BlendOutput, Blender, FrameRange};
pub use config::BlendConfig;
pub use data::{parse_clip_json, WeightedAnimation};
pub use error::BlendError;
pub use ids::{IdAllocator, ItemId, TrailId};
pub use pose::{Pose, Rotation};
pub use pose_source::{NeighborPoseSource, NoPoseSource, PoseEdge, PoseSource};
pub use shadow::{mix_in_ramp, mix_out_gap_ramp, mix_out_overlap_ramp, ShadowItemGenerator};
pub use timeline::{Placement, Timeline};
pub use trail::{drain_trails, ShadowKind, Trail, TrailItem};
