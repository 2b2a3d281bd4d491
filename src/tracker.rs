//! Multi-object tracking: two interchangeable strategies behind [`Tracker`].

mod arena;
mod centroid_tracker;
mod kalman_filter;
mod kalman_track;
mod matching;
mod motion_tracker;
mod rect;
mod track_state;

use std::collections::BTreeMap;

pub use arena::{IdAllocator, TrackArena, TrackId};
pub use centroid_tracker::{CentroidConfig, CentroidTracker};
pub use kalman_filter::KalmanFilter;
pub use kalman_track::KalmanTrack;
pub use matching::{AssignmentResult, Detection, associate};
pub use motion_tracker::{MotionModelTracker, TrackerConfig};
pub use rect::{Point, Rect, iou_batch};
pub use track_state::TrackState;

use crate::config::{TrackerKind, TrackerSettings};

/// Reported track centers keyed by track id.
pub type TrackPositions = BTreeMap<TrackId, Point>;

/// Per-frame tracking step shared by every strategy.
///
/// Frames must be fed in arrival order; the returned ids are unique among the
/// live tracks and never reused once a track is dropped.
pub trait Tracker: Send {
    fn update(&mut self, detections: &[Detection]) -> TrackPositions;

    /// Tracks currently held, including ones not reported this frame.
    fn live_tracks(&self) -> usize;
}

/// Build the strategy selected in the configuration.
pub fn build_tracker(settings: &TrackerSettings) -> Box<dyn Tracker> {
    match settings.kind {
        TrackerKind::MotionModel => Box::new(MotionModelTracker::new(TrackerConfig {
            max_age: settings.max_age,
            min_hits: settings.min_hits,
            iou_threshold: settings.iou_threshold,
        })),
        TrackerKind::Centroid => Box::new(CentroidTracker::new(CentroidConfig {
            max_disappeared: settings.max_disappeared,
            max_distance: settings.max_distance,
        })),
    }
}
