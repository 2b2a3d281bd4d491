use std::collections::BTreeSet;

use crowdflow::config::{TrackerKind, TrackerSettings};
use crowdflow::tracker::{
    CentroidConfig, CentroidTracker, Detection, MotionModelTracker, Rect, TrackerConfig, associate,
    build_tracker,
};

fn centered(cx: f32, cy: f32) -> Detection {
    Detection::new(cx - 5.0, cy - 5.0, cx + 5.0, cy + 5.0, 0.9)
}

#[test]
fn test_basic_tracking() {
    let mut tracker = MotionModelTracker::new(TrackerConfig::default());

    // Frame 1: one detection is reported straight away
    let tracks1 = tracker.update(&[Detection::new(100.0, 100.0, 200.0, 200.0, 0.9)]);
    assert_eq!(tracks1.len(), 1);
    let id1 = *tracks1.keys().next().unwrap();

    // Frames 2..5: same object drifting right keeps its id
    for step in 1..5 {
        let dx = step as f32 * 5.0;
        let tracks = tracker.update(&[Detection::new(100.0 + dx, 100.0, 200.0 + dx, 200.0, 0.9)]);
        assert_eq!(tracks.keys().copied().collect::<Vec<_>>(), vec![id1]);
    }

    // Empty frame: a confirmed track coasts and is still reported
    let coasting = tracker.update(&[]);
    assert!(coasting.contains_key(&id1));
    assert_eq!(tracker.track(id1).unwrap().time_since_update, 1);
}

#[test]
fn test_separate_objects_get_distinct_ids() {
    let mut tracker = MotionModelTracker::new(TrackerConfig::default());
    for step in 0..6 {
        let dx = step as f32 * 3.0;
        let tracks = tracker.update(&[
            Detection::new(dx, 0.0, 40.0 + dx, 80.0, 0.9),
            Detection::new(300.0 - dx, 0.0, 340.0 - dx, 80.0, 0.9),
        ]);
        assert_eq!(tracks.len(), 2);
        assert_eq!(tracks.keys().copied().collect::<Vec<_>>(), vec![0, 1]);
    }
}

#[test]
fn test_removed_ids_are_never_reused() {
    let mut tracker = MotionModelTracker::new(TrackerConfig {
        max_age: 1,
        ..TrackerConfig::default()
    });

    tracker.update(&[Detection::new(0.0, 0.0, 50.0, 50.0, 0.9)]);
    tracker.update(&[]);
    tracker.update(&[]);
    assert!(tracker.track(0).is_none());

    // Same place, new object
    let tracks = tracker.update(&[Detection::new(0.0, 0.0, 50.0, 50.0, 0.9)]);
    assert_eq!(tracks.keys().copied().collect::<Vec<_>>(), vec![1]);
}

#[test]
fn test_ids_unique_and_monotonic_over_long_sequence() {
    let mut tracker = MotionModelTracker::new(TrackerConfig {
        max_age: 2,
        min_hits: 1,
        iou_threshold: 0.3,
    });

    // Deterministic pseudo-random appearances
    let mut seed: u32 = 12345;
    let mut next = move || {
        seed = seed.wrapping_mul(1_103_515_245).wrapping_add(12345);
        (seed >> 16) & 0x7fff
    };

    let mut dead: BTreeSet<u64> = BTreeSet::new();
    let mut live: BTreeSet<u64> = BTreeSet::new();

    for frame in 0..200 {
        let mut detections = Vec::new();
        for lane in 0..4 {
            if next() % 3 != 0 {
                let x = lane as f32 * 200.0 + (frame % 20) as f32 * 2.0;
                detections.push(Detection::new(x, 0.0, x + 60.0, 120.0, 0.9));
            }
        }
        let reported = tracker.update(&detections);

        let now_live: BTreeSet<u64> = tracker.tracks().map(|t| t.track_id).collect();
        for id in reported.keys() {
            assert!(now_live.contains(id));
            assert!(!dead.contains(id), "id {id} reused after removal");
        }
        for id in now_live.iter() {
            assert!(!dead.contains(id), "id {id} reused after removal");
        }
        dead.extend(live.difference(&now_live).copied());
        live = now_live;
    }
}

#[test]
fn test_track_removed_after_max_age_misses() {
    let max_age = 3;
    let mut tracker = MotionModelTracker::new(TrackerConfig {
        max_age,
        min_hits: 1,
        iou_threshold: 0.3,
    });

    assert!(tracker.update(&[Detection::new(10.0, 10.0, 60.0, 110.0, 0.9)]).contains_key(&0));

    for _ in 0..max_age {
        assert!(tracker.update(&[]).contains_key(&0));
    }
    // Unmatched for max_age + 1 frames
    assert!(!tracker.update(&[]).contains_key(&0));
    assert!(tracker.track(0).is_none());
    assert!(tracker.update(&[]).is_empty());
}

#[test]
fn test_association_rejects_pairs_at_or_below_threshold() {
    let track = [Rect::from_tlbr(0.0, 0.0, 10.0, 10.0)];

    // IoU = 1/3
    let shifted = [Rect::from_tlbr(5.0, 0.0, 15.0, 10.0)];
    assert_eq!(associate(&track, &shifted, 0.3).matches, vec![(0, 0)]);
    let rejected = associate(&track, &shifted, 0.5);
    assert!(rejected.matches.is_empty());
    assert_eq!(rejected.unmatched_tracks, vec![0]);
    assert_eq!(rejected.unmatched_detections, vec![0]);

    // IoU exactly 0.5 is not accepted at threshold 0.5
    let half = [Rect::from_tlbr(0.0, 0.0, 10.0, 5.0)];
    assert!(associate(&track, &half, 0.5).matches.is_empty());
}

#[test]
fn test_centroid_single_track_matches_nearby_detection() {
    let mut tracker = CentroidTracker::new(CentroidConfig::default());
    tracker.update(&[centered(10.0, 10.0)]);

    let tracks = tracker.update(&[centered(60.0, 10.0)]);
    assert_eq!(tracks.len(), 1);
    let position = tracks[&0];
    assert_eq!((position.x, position.y), (60.0, 10.0));
}

#[test]
fn test_centroid_far_detection_spawns_new_track() {
    let mut tracker = CentroidTracker::new(CentroidConfig {
        max_disappeared: 30,
        max_distance: 80.0,
    });
    tracker.update(&[centered(10.0, 10.0)]);

    let tracks = tracker.update(&[centered(500.0, 500.0)]);
    assert_eq!(tracker.disappeared(0), Some(1));
    assert_eq!(tracker.disappeared(1), Some(0));
    assert_eq!(tracks.keys().copied().collect::<Vec<_>>(), vec![0, 1]);
    assert_eq!((tracks[&1].x, tracks[&1].y), (500.0, 500.0));
}

#[test]
fn test_strategies_are_interchangeable() {
    for kind in [TrackerKind::MotionModel, TrackerKind::Centroid] {
        let mut tracker = build_tracker(&TrackerSettings {
            kind,
            ..TrackerSettings::default()
        });
        let first = tracker.update(&[Detection::new(0.0, 0.0, 40.0, 80.0, 0.9)]);
        let second = tracker.update(&[Detection::new(2.0, 0.0, 42.0, 80.0, 0.9)]);
        assert_eq!(first.keys().collect::<Vec<_>>(), second.keys().collect::<Vec<_>>());
        assert_eq!(tracker.live_tracks(), 1);
    }
}
