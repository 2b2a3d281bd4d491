//! Multi-object tracking and region-of-interest flow counting.
//!
//! Per-frame detections go through a [`Tracker`] that assigns persistent ids, a
//! [`FlowCounter`] that counts ROI entries and exits, and a [`MetricsEmitter`]
//! that periodically appends the counts to a [`MetricsSink`]. Each camera owns
//! its own [`FlowEngine`]; cameras share nothing but, optionally, a sink.

pub mod config;
pub mod counting;
pub mod error;
pub mod integration;
pub mod metrics;
pub mod tracker;

pub use config::{CameraConfig, Config, TrackerKind, TrackerSettings};
pub use counting::{FlowCounter, FlowCounts, Roi};
pub use error::{ConfigError, ReplayError, RoiError, SinkError};
pub use integration::{
    CameraPipeline, CancellationToken, DetectionBuilder, DetectionSource, FlowEngine, FrameSource,
    PipelineSummary,
};
pub use metrics::{MetricsEmitter, MetricsRecord, MetricsSink};
pub use tracker::{
    CentroidTracker, Detection, MotionModelTracker, Point, Rect, TrackId, TrackPositions, Tracker,
};
