//! Accuracy of emitted `active` counts against a ground-truth log.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::metrics::MetricsRecord;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CountAccuracy {
    /// Records present in both logs
    pub samples: usize,
    pub mae: f64,
    pub rmse: f64,
}

/// Compare `active` between records that share a timestamp and camera.
///
/// Returns `None` when no record pairs up.
pub fn evaluate_counts(
    ground_truth: &[MetricsRecord],
    predicted: &[MetricsRecord],
) -> Option<CountAccuracy> {
    let truth: HashMap<(DateTime<Utc>, &str), usize> = ground_truth
        .iter()
        .map(|r| ((r.timestamp, r.camera_id.as_str()), r.active))
        .collect();

    let errors: Vec<f64> = predicted
        .iter()
        .filter_map(|r| {
            truth
                .get(&(r.timestamp, r.camera_id.as_str()))
                .map(|&gt| r.active as f64 - gt as f64)
        })
        .collect();

    if errors.is_empty() {
        return None;
    }

    let n = errors.len() as f64;
    let mae = errors.iter().map(|e| e.abs()).sum::<f64>() / n;
    let rmse = (errors.iter().map(|e| e * e).sum::<f64>() / n).sqrt();
    Some(CountAccuracy {
        samples: errors.len(),
        mae,
        rmse,
    })
}
