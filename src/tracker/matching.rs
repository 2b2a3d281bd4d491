//! Detection input and track/detection association.

use ndarray::{Array2, s};

use crate::tracker::rect::{Rect, iou_batch};

const PADDING_COST: f64 = 1e6;

/// Detection input for the tracker.
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    /// Bounding box, built from TLBR (x1, y1, x2, y2) image-pixel coordinates
    pub bbox: Rect,
    /// Detection confidence score
    pub score: f32,
    /// Detector class id
    pub class_id: u32,
}

impl Detection {
    pub fn new(x1: f32, y1: f32, x2: f32, y2: f32, score: f32) -> Self {
        Self {
            bbox: Rect::from_tlbr(x1, y1, x2, y2),
            score,
            class_id: 0,
        }
    }

    pub fn from_rect(bbox: Rect, score: f32, class_id: u32) -> Self {
        Self {
            bbox,
            score,
            class_id,
        }
    }
}

/// Cost matrix for the assignment solver: `-IoU` per (track, detection) pair.
pub fn iou_cost(ious: &Array2<f64>) -> Array2<f64> {
    ious.mapv(|iou| -iou)
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AssignmentResult {
    pub matches: Vec<(usize, usize)>,
    pub unmatched_tracks: Vec<usize>,
    pub unmatched_detections: Vec<usize>,
}

/// Optimal one-to-one association of predicted track boxes with detections.
///
/// Candidate pairs from the solver are accepted only when their IoU is
/// strictly above `iou_threshold`; rejected members of a pair fall into the
/// unmatched sets. The three outputs are disjoint and cover every input.
pub fn associate(track_boxes: &[Rect], det_boxes: &[Rect], iou_threshold: f32) -> AssignmentResult {
    let num_tracks = track_boxes.len();
    let num_dets = det_boxes.len();

    if num_tracks == 0 || num_dets == 0 {
        return AssignmentResult {
            matches: vec![],
            unmatched_tracks: (0..num_tracks).collect(),
            unmatched_detections: (0..num_dets).collect(),
        };
    }

    let ious = iou_batch(track_boxes, det_boxes);
    let cost = iou_cost(&ious);

    // lapjv wants a square matrix; padded cells are never preferred.
    let size = num_tracks.max(num_dets);
    let mut padded = Array2::<f64>::from_elem((size, size), PADDING_COST);
    padded.slice_mut(s![..num_tracks, ..num_dets]).assign(&cost);

    let mut matches = vec![];
    let mut unmatched_tracks = vec![];
    let mut unmatched_detections_mask = vec![true; num_dets];

    match lapjv::lapjv(&padded) {
        Ok((row_to_col, _)) => {
            for (row, &col) in row_to_col.iter().enumerate() {
                if row >= num_tracks {
                    continue;
                }
                if col < num_dets && ious[[row, col]] > iou_threshold as f64 {
                    matches.push((row, col));
                    unmatched_detections_mask[col] = false;
                } else {
                    unmatched_tracks.push(row);
                }
            }
        }
        Err(err) => {
            tracing::warn!(?err, "assignment solver failed, leaving all tracks unmatched");
            unmatched_tracks = (0..num_tracks).collect();
        }
    }

    let unmatched_detections = unmatched_detections_mask
        .iter()
        .enumerate()
        .filter_map(|(i, &u)| if u { Some(i) } else { None })
        .collect();

    AssignmentResult {
        matches,
        unmatched_tracks,
        unmatched_detections,
    }
}
