use avbl_blend_core::{
    parse_clip_json, BlendConfig, BlendError, ItemId, NeighborPoseSource, Timeline, TrailId,
    TrailItem, WeightedAnimation,
};
use avbl_test_fixtures::{clips, timelines};

fn approx(a: f32, b: f32, eps: f32) {
    assert!((a - b).abs() <= eps, "left={a} right={b} eps={eps}");
}

fn load_clip(name: &str) -> WeightedAnimation {
    let json = clips::json(name).expect("clip fixture");
    parse_clip_json(&json).expect("clip should decode")
}

/// Build a Timeline from a timeline fixture: one trail per fixture trail.
fn load_timeline(name: &str) -> Timeline {
    let fixture = timelines::load(name).expect("timeline fixture");
    let mut timeline = Timeline::new(BlendConfig::default());
    for trail in &fixture.trails {
        let mut items = trail.items.iter();
        let Some(first) = items.next() else { continue };

        let placement = timeline
            .add_animation(load_clip(&first.clip), &trail.name)
            .unwrap();
        timeline
            .move_item(placement.trail, placement.item, first.begin)
            .unwrap();
        timeline
            .set_mix(placement.trail, placement.item, first.mix_in, first.mix_out)
            .unwrap();

        for item in items {
            let placed = TrailItem::new(item.clip.as_str(), load_clip(&item.clip), item.begin)
                .with_mix(item.mix_in, item.mix_out);
            timeline.place(placement.trail, placed).unwrap();
        }
    }
    timeline
}

#[test]
fn every_clip_fixture_decodes() {
    for key in clips::keys() {
        let clip = load_clip(&key);
        assert!(clip.frame_count() > 0, "{key} has no frames");
        assert_eq!(clip.frame_weights().len(), clip.frame_count());
    }
}

#[test]
fn crossfade_fixture_builds_one_mix_in_shadow() {
    let timeline = load_timeline("crossfade");
    assert_eq!(timeline.trails().len(), 2);

    let out = timeline.blend(&NeighborPoseSource).unwrap();
    assert_eq!(out.mix_in_shadow_count(), 1);
    assert_eq!(out.mix_out_shadow_count(), 0);
    let shadow = &out.shadows[0];
    assert_eq!((shadow.begin_index(), shadow.end_index()), (1, 5));

    // reach [0,10], wave [6,15]
    assert_eq!(out.range.begin_index, 0);
    assert_eq!(out.range.end_index, 15);
    assert_eq!(out.animation.frame_count(), 16);

    let reach = load_clip("reach");
    assert_eq!(out.animation.pose(0), Some(reach.first_pose()));
}

#[test]
fn gap_fade_fixture_bridges_the_gap_with_reach_posture() {
    let timeline = load_timeline("gap_fade");
    let out = timeline.blend(&NeighborPoseSource).unwrap();
    assert_eq!(out.mix_out_shadow_count(), 1);
    assert_eq!(out.range.end_index, 22);

    let reach = load_clip("reach");
    let last = reach.last_pose();
    for frame in 10..=12usize {
        let pose = out.animation.pose(frame).unwrap();
        approx(pose.root_position[2], last.root_position[2], 1e-4);
        approx(pose.rotations[0][0], last.rotations[0][0], 1e-4);
    }
    // Inside the gap only the shadow contributes, so its ramp is the output weight.
    approx(out.animation.frame_weight(11), 0.4, 1e-6);
    approx(out.animation.frame_weight(12), 0.2, 1e-6);
    approx(out.animation.frame_weight(10), 1.0, 1e-6);
}

#[test]
fn sequence_fixture_holds_across_the_empty_stretch() {
    let timeline = load_timeline("sequence");
    assert_eq!(timeline.trails().len(), 1);
    assert_eq!(timeline.item_count(), 3);

    let out = timeline.blend(&NeighborPoseSource).unwrap();
    assert!(out.shadows.is_empty());
    assert_eq!(out.animation.frame_count(), 31);

    let wave = load_clip("wave");
    for frame in 21..=24usize {
        assert_eq!(out.animation.pose(frame), Some(wave.last_pose()));
        assert_eq!(out.animation.frame_weight(frame), 0.0);
    }
}

#[test]
fn add_animation_flags_initial_t_pose() {
    let mut timeline = Timeline::default();
    let walk = timeline
        .add_animation(load_clip("tpose_walk"), "tpose_walk")
        .unwrap();
    let reach = timeline.add_animation(load_clip("reach"), "reach").unwrap();
    assert!(walk.first_frame_t_pose);
    assert!(!reach.first_frame_t_pose);
    assert_ne!(walk.trail, reach.trail);

    let mut clip = load_clip("tpose_walk");
    clip.cut_initial_frame().unwrap();
    assert!(!clip.is_first_frame_t_pose(timeline.config().t_pose_tolerance));
}

#[test]
fn full_timeline_reports_not_enough_space() {
    let mut timeline = Timeline::new(BlendConfig {
        timeline_frames: Some(12),
        ..BlendConfig::default()
    });
    let placement = timeline.add_animation(load_clip("reach"), "reach").unwrap();
    assert_eq!(
        timeline.add_animation(load_clip("tpose_walk"), "walk").map(|_| ()),
        Ok(())
    );
    assert_eq!(
        timeline.move_item(placement.trail, placement.item, 5),
        Err(BlendError::NotEnoughSpace {
            frames: 16,
            capacity: 12
        })
    );
    let wave = load_clip("wave");
    assert!(matches!(timeline.add_animation(wave, "wave"), Ok(_)));
    let too_long = WeightedAnimation::new(
        "long",
        vec![load_clip("reach").first_pose().clone(); 13],
    )
    .unwrap();
    assert!(matches!(
        timeline.add_animation(too_long, "long"),
        Err(BlendError::NotEnoughSpace { .. })
    ));
}

#[test]
fn editing_round_trip_keeps_trails_consistent() {
    let mut timeline = load_timeline("sequence");
    let trail_id = timeline.trails()[0].id();
    let ids = timeline.trail(trail_id).unwrap().item_ids();

    let removed = timeline.detach(trail_id, ids[1]).unwrap();
    assert_eq!(removed.name(), "wave");
    let trail = timeline.trail(trail_id).unwrap();
    assert_eq!(trail.next(ids[0]).map(|(id, _)| id), Some(ids[2]));

    let removed_trail = timeline.remove_trail(trail_id).unwrap();
    assert_eq!(removed_trail.len(), 2);
    assert_eq!(
        timeline.blend(&NeighborPoseSource).unwrap_err(),
        BlendError::EmptyInput
    );
    assert_eq!(
        timeline.detach(trail_id, ids[0]).unwrap_err(),
        BlendError::UnknownTrail { trail: trail_id }
    );
}

#[test]
fn cleared_timeline_never_reuses_handles() {
    let mut timeline = Timeline::default();
    let stale = timeline.add_animation(load_clip("reach"), "reach").unwrap();
    timeline.clear();
    assert_eq!(timeline.item_count(), 0);

    let fresh = timeline.add_animation(load_clip("wave"), "wave").unwrap();
    assert_ne!(fresh.trail, stale.trail);
    assert!(timeline.trail(stale.trail).is_none());
    assert!(timeline.item(stale.trail, stale.item).is_none());
    assert_eq!(timeline.trail(fresh.trail).unwrap().name(), "wave");
}

#[test]
fn move_item_on_unknown_trail_names_the_trail() {
    let mut timeline = Timeline::default();
    let placement = timeline.add_animation(load_clip("reach"), "reach").unwrap();
    let missing = TrailId(99);
    assert_eq!(
        timeline.move_item(missing, placement.item, 3),
        Err(BlendError::UnknownTrail { trail: missing })
    );
    assert_eq!(
        timeline.move_item(placement.trail, ItemId(42), 3),
        Err(BlendError::UnknownItem { item: ItemId(42) })
    );
}
