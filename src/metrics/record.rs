use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::counting::FlowCounts;

/// One periodic snapshot of a camera's counts.
///
/// `in`, `out` and `net` are cumulative since the pipeline started; `active`
/// is the number of objects reported on the latest frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsRecord {
    pub timestamp: DateTime<Utc>,
    pub camera_id: String,
    #[serde(rename = "in")]
    pub in_count: u64,
    #[serde(rename = "out")]
    pub out_count: u64,
    pub active: usize,
    pub net: i64,
}

impl MetricsRecord {
    pub fn new(
        timestamp: DateTime<Utc>,
        camera_id: impl Into<String>,
        counts: FlowCounts,
        active: usize,
    ) -> Self {
        Self {
            timestamp,
            camera_id: camera_id.into(),
            in_count: counts.in_count,
            out_count: counts.out_count,
            active,
            net: counts.net(),
        }
    }
}
