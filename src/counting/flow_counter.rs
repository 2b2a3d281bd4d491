//! Directional ROI crossing counter.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::counting::Roi;
use crate::tracker::{Point, TrackId, TrackPositions};

/// Cumulative crossing counts; both counters only ever grow.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowCounts {
    pub in_count: u64,
    pub out_count: u64,
}

impl FlowCounts {
    /// Entries minus exits.
    pub fn net(&self) -> i64 {
        self.in_count as i64 - self.out_count as i64
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Crossing {
    Entered,
    Exited,
}

/// Counts outside→inside and inside→outside transitions of tracked objects.
///
/// Membership is remembered per track id and is never reclaimed, so memory
/// grows with the number of distinct ids observed.
#[derive(Debug, Clone)]
pub struct FlowCounter {
    roi: Roi,
    membership: HashMap<TrackId, bool>,
    counts: FlowCounts,
}

impl FlowCounter {
    pub fn new(roi: Roi) -> Self {
        Self {
            roi,
            membership: HashMap::new(),
            counts: FlowCounts::default(),
        }
    }

    pub fn roi(&self) -> &Roi {
        &self.roi
    }

    pub fn counts(&self) -> FlowCounts {
        self.counts
    }

    /// Number of track ids with a remembered membership.
    pub fn known_tracks(&self) -> usize {
        self.membership.len()
    }

    /// Last known membership of a track, `None` before its first observation.
    pub fn is_inside(&self, id: TrackId) -> Option<bool> {
        self.membership.get(&id).copied()
    }

    /// Record one track position; the first observation only sets the baseline.
    pub fn observe(&mut self, id: TrackId, position: &Point) -> Option<Crossing> {
        let now_inside = self.roi.contains(position);
        let previous = self.membership.insert(id, now_inside);
        match (previous, now_inside) {
            (Some(false), true) => {
                self.counts.in_count += 1;
                Some(Crossing::Entered)
            }
            (Some(true), false) => {
                self.counts.out_count += 1;
                Some(Crossing::Exited)
            }
            _ => None,
        }
    }

    pub fn update(&mut self, tracks: &TrackPositions) -> FlowCounts {
        for (&id, position) in tracks {
            if let Some(crossing) = self.observe(id, position) {
                tracing::debug!(track_id = id, ?crossing, "ROI crossing");
            }
        }
        self.counts
    }
}
