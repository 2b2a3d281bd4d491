//! Kalman-predicted, IoU-associated multi-object tracker.

use tracing::debug;

use crate::tracker::arena::{IdAllocator, TrackArena, TrackId};
use crate::tracker::kalman_filter::KalmanFilter;
use crate::tracker::kalman_track::KalmanTrack;
use crate::tracker::matching::{self, AssignmentResult, Detection};
use crate::tracker::rect::Rect;
use crate::tracker::{TrackPositions, Tracker};

/// Configuration for the [`MotionModelTracker`].
#[derive(Debug, Clone, PartialEq)]
pub struct TrackerConfig {
    /// Frames a track may go unmatched before it is removed
    pub max_age: u32,
    /// Matches required before an unmatched-this-frame track is reported
    pub min_hits: u32,
    /// Minimum IoU (exclusive) for a track/detection pair to match
    pub iou_threshold: f32,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            max_age: 30,
            min_hits: 3,
            iou_threshold: 0.3,
        }
    }
}

pub struct MotionModelTracker {
    tracks: TrackArena<KalmanTrack>,
    ids: IdAllocator,
    frame_count: u64,
    config: TrackerConfig,
    kalman_filter: KalmanFilter,
}

impl MotionModelTracker {
    pub fn new(config: TrackerConfig) -> Self {
        Self {
            tracks: TrackArena::new(),
            ids: IdAllocator::new(),
            frame_count: 0,
            config,
            kalman_filter: KalmanFilter::default(),
        }
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Every live track, reported or not, in id order.
    pub fn tracks(&self) -> impl Iterator<Item = &KalmanTrack> {
        self.tracks.iter().map(|(_, track)| track)
    }

    pub fn track(&self, id: TrackId) -> Option<&KalmanTrack> {
        self.tracks.get(id)
    }

    fn spawn(&mut self, detection: &Detection) {
        let id = self.ids.next_id();
        let track = KalmanTrack::new(id, &detection.bbox, detection.class_id, &self.kalman_filter);
        self.tracks.insert(id, track);
        debug!(track_id = id, frame = self.frame_count, "track created");
    }

    /// Confirmed tracks plus any track matched on this frame.
    fn report(&self) -> TrackPositions {
        self.tracks
            .iter()
            .filter(|(_, t)| t.hits >= self.config.min_hits || t.time_since_update == 0)
            .map(|(id, t)| (id, t.position()))
            .collect()
    }

    pub fn update(&mut self, detections: &[Detection]) -> TrackPositions {
        self.frame_count += 1;

        let detections: Vec<&Detection> =
            detections.iter().filter(|d| d.bbox.is_finite()).collect();

        // Step 1: Predict every live track
        let ids = self.tracks.ids();
        let mut predicted: Vec<Rect> = Vec::with_capacity(ids.len());
        for &id in &ids {
            if let Some(track) = self.tracks.get_mut(id) {
                predicted.push(track.predict(&self.kalman_filter));
            }
        }

        // Step 2: Nothing to associate against
        if ids.is_empty() {
            for det in detections {
                self.spawn(det);
            }
            return self.report();
        }

        // Step 3: Associate predictions with detections
        let det_rects: Vec<Rect> = detections.iter().map(|d| d.bbox).collect();
        let AssignmentResult {
            matches,
            unmatched_detections,
            ..
        } = matching::associate(&predicted, &det_rects, self.config.iou_threshold);

        // Step 4: Correct matched tracks
        for (itrack, idet) in matches {
            let det = detections[idet];
            if let Some(track) = self.tracks.get_mut(ids[itrack]) {
                track.update(&det.bbox, det.class_id, &self.kalman_filter);
            }
        }

        // Step 5: Init new tracks
        for idet in unmatched_detections {
            self.spawn(detections[idet]);
        }

        // Step 6: Drop stale tracks
        let max_age = self.config.max_age;
        for id in self.tracks.retain(|_, t| t.time_since_update <= max_age) {
            debug!(track_id = id, frame = self.frame_count, "track removed");
        }

        self.report()
    }
}

impl Tracker for MotionModelTracker {
    fn update(&mut self, detections: &[Detection]) -> TrackPositions {
        MotionModelTracker::update(self, detections)
    }

    fn live_tracks(&self) -> usize {
        self.tracks.len()
    }
}
