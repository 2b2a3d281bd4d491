//! Greedy nearest-centroid tracker without a motion model.

use ndarray::Array2;
use tracing::debug;

use crate::tracker::arena::{IdAllocator, TrackArena, TrackId};
use crate::tracker::matching::Detection;
use crate::tracker::rect::Point;
use crate::tracker::{TrackPositions, Tracker};

#[derive(Debug, Clone, PartialEq)]
pub struct CentroidConfig {
    /// Consecutive misses tolerated before a track is dropped
    pub max_disappeared: u32,
    /// Largest centroid displacement (pixels) accepted as the same object
    pub max_distance: f32,
}

impl Default for CentroidConfig {
    fn default() -> Self {
        Self {
            max_disappeared: 30,
            max_distance: 80.0,
        }
    }
}

#[derive(Debug, Clone)]
struct CentroidEntry {
    centroid: Point,
    disappeared: u32,
}

pub struct CentroidTracker {
    tracks: TrackArena<CentroidEntry>,
    ids: IdAllocator,
    config: CentroidConfig,
}

impl CentroidTracker {
    pub fn new(config: CentroidConfig) -> Self {
        Self {
            tracks: TrackArena::new(),
            ids: IdAllocator::new(),
            config,
        }
    }

    pub fn config(&self) -> &CentroidConfig {
        &self.config
    }

    /// Consecutive misses of a live track.
    pub fn disappeared(&self, id: TrackId) -> Option<u32> {
        self.tracks.get(id).map(|entry| entry.disappeared)
    }

    fn register(&mut self, centroid: Point) {
        let id = self.ids.next_id();
        self.tracks.insert(
            id,
            CentroidEntry {
                centroid,
                disappeared: 0,
            },
        );
        debug!(track_id = id, "centroid track registered");
    }

    fn mark_missing(&mut self, id: TrackId) {
        let max_disappeared = self.config.max_disappeared;
        let expired = match self.tracks.get_mut(id) {
            Some(entry) => {
                entry.disappeared += 1;
                entry.disappeared > max_disappeared
            }
            None => false,
        };
        if expired {
            self.tracks.remove(id);
            debug!(track_id = id, "centroid track deregistered");
        }
    }

    fn report(&self) -> TrackPositions {
        self.tracks
            .iter()
            .map(|(id, entry)| (id, entry.centroid))
            .collect()
    }

    pub fn update(&mut self, detections: &[Detection]) -> TrackPositions {
        let centroids: Vec<Point> = detections
            .iter()
            .filter(|d| d.bbox.is_finite())
            .map(|d| d.bbox.centroid())
            .collect();

        if centroids.is_empty() {
            for id in self.tracks.ids() {
                self.mark_missing(id);
            }
            return self.report();
        }

        if self.tracks.is_empty() {
            for centroid in centroids {
                self.register(centroid);
            }
            return self.report();
        }

        let ids = self.tracks.ids();
        let existing: Vec<Point> = self.tracks.iter().map(|(_, e)| e.centroid).collect();

        let mut distances = Array2::<f32>::zeros((existing.len(), centroids.len()));
        for (r, a) in existing.iter().enumerate() {
            for (c, b) in centroids.iter().enumerate() {
                distances[[r, c]] = a.distance(b);
            }
        }

        // Each row's nearest column, rows visited closest-first.
        let nearest: Vec<(usize, f32)> = distances
            .rows()
            .into_iter()
            .map(|row| {
                row.iter()
                    .enumerate()
                    .fold((0, f32::INFINITY), |best, (c, &d)| {
                        if d < best.1 { (c, d) } else { best }
                    })
            })
            .collect();
        let mut order: Vec<usize> = (0..existing.len()).collect();
        order.sort_by(|&a, &b| nearest[a].1.total_cmp(&nearest[b].1));

        let mut used_rows = vec![false; existing.len()];
        let mut used_cols = vec![false; centroids.len()];

        for row in order {
            let (col, distance) = nearest[row];
            if used_rows[row] || used_cols[col] || distance > self.config.max_distance {
                continue;
            }
            if let Some(entry) = self.tracks.get_mut(ids[row]) {
                entry.centroid = centroids[col];
                entry.disappeared = 0;
            }
            used_rows[row] = true;
            used_cols[col] = true;
        }

        for (row, used) in used_rows.into_iter().enumerate() {
            if !used {
                self.mark_missing(ids[row]);
            }
        }

        for (col, used) in used_cols.into_iter().enumerate() {
            if !used {
                self.register(centroids[col]);
            }
        }

        self.report()
    }
}

impl Tracker for CentroidTracker {
    fn update(&mut self, detections: &[Detection]) -> TrackPositions {
        CentroidTracker::update(self, detections)
    }

    fn live_tracks(&self) -> usize {
        self.tracks.len()
    }
}
