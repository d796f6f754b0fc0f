//! Error types for the blending engine.

use serde::{Deserialize, Serialize};

use crate::ids::{ItemId, TrailId};

/// Errors reported by trail editing, shadow generation and compositing.
///
/// All variants describe caller misuse or malformed timeline state.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum BlendError {
    /// The item cannot be placed on a trail (bad interval, shadow item, ...).
    #[error("Placement conflict: {reason}")]
    PlacementConflict { reason: String },

    /// Shadow generation needs at least two sorted items.
    #[error("Insufficient items: shadow generation needs at least 2 items, got {count}")]
    InsufficientItems { count: usize },

    /// Nothing to composite.
    #[error("Empty input: no real items to composite")]
    EmptyInput,

    /// A shadow item needed a borrowed posture but the pose source had none.
    #[error("Unsupported pose source: no posture available for '{item}'")]
    UnsupportedPoseSource { item: String },

    /// Animation data violates its invariants.
    #[error("Invalid animation: {reason}")]
    InvalidAnimation { reason: String },

    /// Clip JSON could not be decoded.
    #[error("Clip format error: {reason}")]
    ClipFormat { reason: String },

    #[error("Trail not found: {trail:?}")]
    UnknownTrail { trail: TrailId },

    #[error("Item not found: {item:?}")]
    UnknownItem { item: ItemId },

    /// The timeline capacity cannot hold the placement.
    #[error("Not enough space: placement needs {frames} frames, timeline holds {capacity}")]
    NotEnoughSpace { frames: i64, capacity: u32 },
}

impl BlendError {
    pub(crate) fn placement(reason: impl Into<String>) -> Self {
        BlendError::PlacementConflict {
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid(reason: impl Into<String>) -> Self {
        BlendError::InvalidAnimation {
            reason: reason.into(),
        }
    }
}
