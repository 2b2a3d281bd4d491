//! Single object track driven by the constant-velocity Kalman filter.

use crate::tracker::arena::TrackId;
use crate::tracker::kalman_filter::{KalmanFilter, StateCovariance, StateMean};
use crate::tracker::rect::{Point, Rect};
use crate::tracker::track_state::TrackState;

#[derive(Debug, Clone)]
pub struct KalmanTrack {
    /// Unique track identifier
    pub track_id: TrackId,
    /// Frames since creation
    pub age: u32,
    /// Total successful matches
    pub hits: u32,
    /// Consecutive successful matches
    pub hit_streak: u32,
    /// Frames since the last successful match
    pub time_since_update: u32,
    /// Class id of the most recently matched detection
    pub class_id: u32,
    mean: StateMean,
    covariance: StateCovariance,
}

impl KalmanTrack {
    /// Start a tentative track from a detection box.
    pub fn new(
        track_id: TrackId,
        bbox: &Rect,
        class_id: u32,
        kalman_filter: &KalmanFilter,
    ) -> Self {
        let (mean, covariance) = kalman_filter.initiate(bbox.to_xysr());
        Self {
            track_id,
            age: 0,
            hits: 1,
            hit_streak: 1,
            time_since_update: 0,
            class_id,
            mean,
            covariance,
        }
    }

    /// Advance one frame on the motion model alone.
    pub fn predict(&mut self, kalman_filter: &KalmanFilter) -> Rect {
        let (mean, covariance) = kalman_filter.predict(&self.mean, &self.covariance);
        self.mean = mean;
        self.covariance = covariance;

        self.age += 1;
        if self.time_since_update > 0 {
            self.hit_streak = 0;
        }
        self.time_since_update += 1;
        self.rect()
    }

    /// Apply a matched detection.
    pub fn update(&mut self, bbox: &Rect, class_id: u32, kalman_filter: &KalmanFilter) {
        match kalman_filter.update(&self.mean, &self.covariance, bbox.to_xysr()) {
            Some((mean, covariance)) => {
                self.mean = mean;
                self.covariance = covariance;
            }
            None => {
                tracing::warn!(
                    track_id = self.track_id,
                    "singular innovation covariance, keeping prediction"
                );
            }
        }
        self.time_since_update = 0;
        self.hits += 1;
        self.hit_streak += 1;
        self.class_id = class_id;
    }

    /// Current bounding box estimate.
    pub fn rect(&self) -> Rect {
        Rect::from_xysr(self.mean[0], self.mean[1], self.mean[2], self.mean[3])
    }

    /// Current center estimate.
    pub fn position(&self) -> Point {
        Point::new(self.mean[0] as f32, self.mean[1] as f32)
    }

    pub fn state(&self, min_hits: u32, max_age: u32) -> TrackState {
        TrackState::classify(self.hits, self.time_since_update, min_hits, max_age)
    }

    pub fn covariance_trace(&self) -> f64 {
        self.covariance.trace()
    }
}
