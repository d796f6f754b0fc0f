//! Blender: flatten trails, synthesize crossfade shadows, composite.
//!
//! Pipeline: trails → `flatten` → `sort_by_begin_index` → shadow generation
//! → `Blender::composite` over real ∪ shadow items → one WeightedAnimation.
//! Every step is a pure function of its inputs; trails are only read.

use serde::Serialize;

use crate::accumulate::{normalize_weights, PoseAccumulator};
use crate::config::BlendConfig;
use crate::data::WeightedAnimation;
use crate::error::BlendError;
use crate::pose::Pose;
use crate::pose_source::PoseSource;
use crate::shadow::ShadowItemGenerator;
use crate::trail::{ShadowKind, Trail, TrailItem};

/// Inclusive timeline frame range.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
pub struct FrameRange {
    pub begin_index: i64,
    pub end_index: i64,
}

impl FrameRange {
    #[inline]
    pub fn frame_count(&self) -> usize {
        (self.end_index - self.begin_index + 1) as usize
    }

    pub fn frames(&self) -> impl Iterator<Item = i64> {
        self.begin_index..=self.end_index
    }
}

/// Ordered snapshot of every item of every trail.
///
/// Trail order first, then begin order within a trail. The trails are not
/// modified; see `trail::drain_trails` for the consuming variant.
pub fn flatten(trails: &[Trail]) -> Vec<&TrailItem> {
    let items: Vec<&TrailItem> = trails.iter().flat_map(|trail| trail.items()).collect();
    log::debug!("flattened {} trail(s) into {} item(s)", trails.len(), items.len());
    items
}

/// Stable sort by begin index; equal begins keep their input order.
pub fn sort_by_begin_index<'a>(mut items: Vec<&'a TrailItem>) -> Vec<&'a TrailItem> {
    items.sort_by_key(|item| item.begin_index());
    items
}

/// Output extent spanned by the real (non-shadow) items.
pub fn output_range(items: &[&TrailItem]) -> Result<FrameRange, BlendError> {
    let mut real = items.iter().filter(|item| !item.is_shadow());
    let first = real.next().ok_or(BlendError::EmptyInput)?;
    let init = FrameRange {
        begin_index: first.begin_index(),
        end_index: first.end_index(),
    };
    Ok(real.fold(init, |range, item| FrameRange {
        begin_index: range.begin_index.min(item.begin_index()),
        end_index: range.end_index.max(item.end_index()),
    }))
}

/// Result of a full blending pass.
#[derive(Clone, Debug, Serialize)]
pub struct BlendOutput {
    /// Composite clip; its frame 0 is timeline frame `range.begin_index`.
    pub animation: WeightedAnimation,
    pub range: FrameRange,
    /// Shadow items synthesized for this pass (mix-in first, then mix-out).
    pub shadows: Vec<TrailItem>,
}

impl BlendOutput {
    pub fn mix_in_shadow_count(&self) -> usize {
        self.count_shadows(ShadowKind::MixIn)
    }

    pub fn mix_out_shadow_count(&self) -> usize {
        self.count_shadows(ShadowKind::MixOut)
    }

    fn count_shadows(&self, kind: ShadowKind) -> usize {
        self.shadows
            .iter()
            .filter(|s| s.shadow_kind() == Some(kind))
            .count()
    }
}

/// Compositor over placed items.
#[derive(Clone, Debug, Default)]
pub struct Blender {
    cfg: BlendConfig,
}

impl Blender {
    pub fn new(cfg: BlendConfig) -> Self {
        Self { cfg }
    }

    /// Blend every active item (real and shadow) into one animation spanning
    /// `output_range(items)`.
    ///
    /// Per output frame: contributors are the items covering it; their frame
    /// weights are normalized to sum to 1 (uniform if all are zero) and their
    /// poses averaged with those weights. Frames with no contributor hold the
    /// previous pose at weight 0. The output frame weight is the clamped sum
    /// of raw contributor weights.
    pub fn composite(&self, items: &[&TrailItem]) -> Result<WeightedAnimation, BlendError> {
        let range = output_range(items)?;
        let joint_count = items
            .iter()
            .map(|item| item.animation().joint_count())
            .max()
            .unwrap_or(0);

        let mut frames = Vec::with_capacity(range.frame_count());
        let mut weights = Vec::with_capacity(range.frame_count());
        let mut held: Option<Pose> = None;
        let mut uniform_fallbacks = 0usize;

        let mut poses: Vec<&Pose> = Vec::with_capacity(items.len());
        let mut raw: Vec<f32> = Vec::with_capacity(items.len());
        for frame in range.frames() {
            poses.clear();
            raw.clear();
            for item in items {
                if let Some(local) = item.local_frame(frame) {
                    if let Some(pose) = item.animation().pose(local) {
                        poses.push(pose);
                        raw.push(item.animation().frame_weight(local));
                    }
                }
            }

            if poses.is_empty() {
                let pose = held.clone().unwrap_or_else(|| Pose::rest(joint_count));
                frames.push(pose);
                weights.push(0.0);
                continue;
            }

            let raw_total: f32 = raw.iter().sum();
            if raw_total <= 0.0 {
                uniform_fallbacks += 1;
            }
            let mut acc = PoseAccumulator::new();
            for (pose, w) in poses.iter().zip(normalize_weights(&raw)) {
                acc.add(pose, w);
            }
            let mut pose = acc
                .finalize()
                .unwrap_or_else(|| held.clone().unwrap_or_else(|| Pose::rest(joint_count)));
            pose.rotations.resize(joint_count, [0.0; 3]);

            held = Some(pose.clone());
            frames.push(pose);
            weights.push(raw_total.min(1.0));
        }

        if uniform_fallbacks > 0 {
            log::warn!(
                "{uniform_fallbacks} frame(s) had only zero-weight contributors; blended uniformly"
            );
        }
        log::debug!(
            "composited {} item(s) over frames [{}, {}]",
            items.len(),
            range.begin_index,
            range.end_index
        );
        WeightedAnimation::with_weights("composite", frames, weights)
    }

    /// Full pass over the caller's trails. Trails are read, never modified.
    pub fn blend_trails(
        &self,
        trails: &[Trail],
        poses: &dyn PoseSource,
    ) -> Result<BlendOutput, BlendError> {
        let sorted = sort_by_begin_index(flatten(trails));
        if sorted.is_empty() {
            return Err(BlendError::EmptyInput);
        }

        let mut shadows = Vec::new();
        if sorted.len() >= 2 {
            let generator = ShadowItemGenerator::new(poses);
            if self.cfg.mix_in_shadows {
                shadows.extend(generator.create_mix_in_shadows(&sorted)?);
            }
            if self.cfg.mix_out_shadows {
                shadows.extend(generator.create_mix_out_shadows(&sorted)?);
            }
        }

        let mut active: Vec<&TrailItem> = Vec::with_capacity(sorted.len() + shadows.len());
        active.extend(sorted.iter().copied());
        active.extend(shadows.iter());

        let range = output_range(&active)?;
        let animation = self.composite(&active)?;
        Ok(BlendOutput {
            animation,
            range,
            shadows,
        })
    }
}
