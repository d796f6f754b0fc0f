//! Shadow items: synthetic weight ramps that realize crossfades.
//!
//! For each ordered pair (earlier, later) of sorted items where `later` ends
//! after `earlier`, the declared mix durations decide whether a ramp must be
//! materialized:
//!
//! - mix-in (driven by `earlier.mix_in`): `later`'s first posture ramps up
//!   towards full weight, either right before `later` begins (touching or
//!   overlapping pair) or across the tail of `earlier` (gap shorter than
//!   the mix).
//! - mix-out (driven by `later.mix_out`): `earlier`'s last posture ramps down,
//!   either right after `earlier` ends (touching or overlapping pair) or in
//!   the frames just before `later` begins (gap shorter than the mix).
//!
//! All weights are computed in f32; none are truncated to 0/1 steps.
//! Shadows are cut to the span of the real items before any frame is built.

use crate::blender::{output_range, FrameRange};
use crate::data::WeightedAnimation;
use crate::error::BlendError;
use crate::pose_source::{PoseEdge, PoseSource};
use crate::trail::{ShadowKind, TrailItem};

/// Linear mix-in ramp: frame `n` of `frames` has weight `(n+1)/frames`.
pub fn mix_in_ramp(frames: usize) -> Vec<f32> {
    Ramp::MixIn { frames: frames as i64 }.sample(0..frames as i64)
}

/// Mix-out ramp for touching/overlapping items: starts at 1.0 and drops by
/// `1/mix_out` per frame, stopping after `frames` frames.
pub fn mix_out_overlap_ramp(frames: usize, mix_out: u32) -> Vec<f32> {
    Ramp::MixOutOverlap { mix: mix_out }.sample(0..frames as i64)
}

/// Mix-out ramp across a gap: the last `frames` steps of a `mix_out`-long
/// fade, ending at `1/mix_out`.
pub fn mix_out_gap_ramp(frames: usize, mix_out: u32) -> Vec<f32> {
    Ramp::MixOutGap {
        frames: frames as i64,
        mix: mix_out,
    }
    .sample(0..frames as i64)
}

/// Weight of shadow frame `n`, evaluated lazily so a plan can be windowed
/// before anything is allocated.
#[derive(Copy, Clone, Debug, PartialEq)]
enum Ramp {
    MixIn { frames: i64 },
    MixOutOverlap { mix: u32 },
    MixOutGap { frames: i64, mix: u32 },
}

impl Ramp {
    #[inline]
    fn weight(self, n: i64) -> f32 {
        match self {
            Ramp::MixIn { frames } => (n + 1) as f32 / frames as f32,
            Ramp::MixOutOverlap { mix } => (mix as f32 - n as f32) / mix as f32,
            Ramp::MixOutGap { frames, mix } => (frames - n) as f32 / mix as f32,
        }
    }

    fn sample(self, frames: std::ops::Range<i64>) -> Vec<f32> {
        frames.map(|n| self.weight(n)).collect()
    }
}

/// Where a shadow goes and how its weights ramp.
#[derive(Clone, Debug, PartialEq)]
struct ShadowPlan {
    begin_index: i64,
    frames: i64,
    ramp: Ramp,
}

impl ShadowPlan {
    #[inline]
    fn end_index(&self) -> i64 {
        self.begin_index + self.frames - 1
    }

    /// Begin index and weights of the part of the shadow inside `range`.
    /// Frames outside it can never reach the composite.
    fn window(&self, range: FrameRange) -> Option<(i64, Vec<f32>)> {
        let begin = self.begin_index.max(range.begin_index);
        let end = self.end_index().min(range.end_index);
        if begin > end {
            return None;
        }
        let first = begin - self.begin_index;
        let last = end - self.begin_index;
        Some((begin, self.ramp.sample(first..last + 1)))
    }
}

#[inline]
fn touches_or_overlaps(earlier: &TrailItem, later: &TrailItem) -> bool {
    earlier.end_index() + 1 >= later.begin_index()
}

#[inline]
fn gap_between(earlier: &TrailItem, later: &TrailItem) -> i64 {
    later.begin_index() - earlier.end_index() - 1
}

fn plan_mix_in(earlier: &TrailItem, later: &TrailItem) -> Option<ShadowPlan> {
    let mix = i64::from(earlier.mix_in());
    if mix == 0 {
        return None;
    }
    if touches_or_overlaps(earlier, later) {
        let begins_diff = later.begin_index() - earlier.begin_index();
        let frames = mix.min(begins_diff);
        if frames <= 0 {
            return None;
        }
        Some(ShadowPlan {
            begin_index: later.begin_index() - frames,
            frames,
            ramp: Ramp::MixIn { frames },
        })
    } else {
        let gap = gap_between(earlier, later);
        if mix <= gap {
            return None;
        }
        let frames = mix - gap;
        Some(ShadowPlan {
            begin_index: earlier.end_index() - frames + 1,
            frames,
            ramp: Ramp::MixIn { frames },
        })
    }
}

fn plan_mix_out(earlier: &TrailItem, later: &TrailItem) -> Option<ShadowPlan> {
    let mix = i64::from(later.mix_out());
    if mix == 0 {
        return None;
    }
    if touches_or_overlaps(earlier, later) {
        let ends_diff = later.end_index() - earlier.end_index();
        let frames = mix.min(ends_diff);
        if frames <= 0 {
            return None;
        }
        Some(ShadowPlan {
            begin_index: earlier.end_index() + 1,
            frames,
            ramp: Ramp::MixOutOverlap {
                mix: later.mix_out(),
            },
        })
    } else {
        let gap = gap_between(earlier, later);
        if mix <= gap {
            return None;
        }
        let frames = mix - gap;
        Some(ShadowPlan {
            begin_index: later.begin_index() - frames,
            frames,
            ramp: Ramp::MixOutGap {
                frames,
                mix: later.mix_out(),
            },
        })
    }
}

/// Ordered pairs `(earlier, later)` in valid overlap order.
fn overlap_pairs<'s, 'a>(
    sorted: &'s [&'a TrailItem],
) -> impl Iterator<Item = (&'a TrailItem, &'a TrailItem)> + 's {
    (1..sorted.len()).flat_map(move |later_idx| {
        let later = sorted[later_idx];
        sorted[..later_idx]
            .iter()
            .copied()
            .filter(move |earlier| later.end_index() > earlier.end_index())
            .map(move |earlier| (earlier, later))
    })
}

/// Builds shadow items from a begin-sorted item sequence.
pub struct ShadowItemGenerator<'p> {
    poses: &'p dyn PoseSource,
}

impl<'p> ShadowItemGenerator<'p> {
    pub fn new(poses: &'p dyn PoseSource) -> Self {
        Self { poses }
    }

    /// Mix-in shadows for every qualifying pair of `sorted`.
    pub fn create_mix_in_shadows(
        &self,
        sorted: &[&TrailItem],
    ) -> Result<Vec<TrailItem>, BlendError> {
        ensure_pairs(sorted)?;
        let range = output_range(sorted)?;
        let mut out = Vec::new();
        for (earlier, later) in overlap_pairs(sorted) {
            if let Some(plan) = plan_mix_in(earlier, later) {
                if let Some(shadow) =
                    self.materialize(ShadowKind::MixIn, later, PoseEdge::First, &plan, range)?
                {
                    out.push(shadow);
                }
            }
        }
        log::debug!("created {} mix-in shadow(s)", out.len());
        Ok(out)
    }

    /// Mix-out shadows for every qualifying pair of `sorted`.
    pub fn create_mix_out_shadows(
        &self,
        sorted: &[&TrailItem],
    ) -> Result<Vec<TrailItem>, BlendError> {
        ensure_pairs(sorted)?;
        let range = output_range(sorted)?;
        let mut out = Vec::new();
        for (earlier, later) in overlap_pairs(sorted) {
            if let Some(plan) = plan_mix_out(earlier, later) {
                if let Some(shadow) =
                    self.materialize(ShadowKind::MixOut, earlier, PoseEdge::Last, &plan, range)?
                {
                    out.push(shadow);
                }
            }
        }
        log::debug!("created {} mix-out shadow(s)", out.len());
        Ok(out)
    }

    /// Build the shadow for `plan`, windowed to the real-item `range`.
    /// `None` when no frame of the plan falls inside it.
    fn materialize(
        &self,
        kind: ShadowKind,
        neighbor: &TrailItem,
        edge: PoseEdge,
        plan: &ShadowPlan,
        range: FrameRange,
    ) -> Result<Option<TrailItem>, BlendError> {
        let Some((begin_index, weights)) = plan.window(range) else {
            return Ok(None);
        };
        let pose = self.poses.borrow_pose(neighbor, edge).ok_or_else(|| {
            BlendError::UnsupportedPoseSource {
                item: neighbor.name().to_string(),
            }
        })?;
        let anim =
            WeightedAnimation::held(format!("shadow of '{}'", neighbor.name()), pose, weights)?;
        Ok(Some(TrailItem::shadow(kind, anim, begin_index)))
    }
}

fn ensure_pairs(sorted: &[&TrailItem]) -> Result<(), BlendError> {
    if sorted.len() < 2 {
        return Err(BlendError::InsufficientItems {
            count: sorted.len(),
        });
    }
    Ok(())
}
