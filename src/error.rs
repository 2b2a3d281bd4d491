//! Error types for configuration, metrics sinks and detection replay.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Invalid region-of-interest polygon.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RoiError {
    #[error("ROI needs at least 3 points, got {0}")]
    TooFewPoints(usize),
    #[error("ROI vertex {0} is not finite")]
    NonFinite(usize),
    #[error("ROI has zero area")]
    ZeroArea,
}

/// Fatal startup error: the configuration cannot be used as given.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("no cameras configured")]
    NoCameras,
    #[error("duplicate camera id `{0}`")]
    DuplicateCamera(String),
    #[error("camera `{camera}`: {source}")]
    InvalidRoi {
        camera: String,
        #[source]
        source: RoiError,
    },
    #[error("`{name}` must be positive, got {value}")]
    NonPositive { name: &'static str, value: String },
    #[error("`iou_threshold` must be in (0, 1], got {0}")]
    IouThreshold(f32),
}

impl ConfigError {
    pub(crate) fn non_positive(name: &'static str, value: impl ToString) -> Self {
        ConfigError::NonPositive {
            name,
            value: value.to_string(),
        }
    }
}

/// Failure to append to or read from a metrics sink.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("metrics sink I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("metrics record encoding error: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("metrics record decoding error at line {line}: {source}")]
    Decode {
        line: usize,
        #[source]
        source: serde_json::Error,
    },
    #[error("metrics sink lock poisoned")]
    Poisoned,
}

/// A replayed frame whose detections could not be decoded.
#[derive(Debug, Error)]
pub enum ReplayError {
    #[error("frame {frame}: malformed detection record: {source}")]
    Malformed {
        frame: u64,
        #[source]
        source: serde_json::Error,
    },
    #[error("frame {frame}: detection {index} has a non-finite box")]
    NonFiniteBox { frame: u64, index: usize },
    #[error("failed to read detections: {0}")]
    Io(#[from] io::Error),
}
