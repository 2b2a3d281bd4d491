use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::counting::Roi;
use crate::error::{ConfigError, RoiError};

/// Which [`Tracker`](crate::tracker::Tracker) implementation a pipeline uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackerKind {
    #[default]
    #[serde(alias = "ocsort")]
    MotionModel,
    Centroid,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerSettings {
    pub kind: TrackerKind,
    pub max_age: u32,
    pub min_hits: u32,
    pub iou_threshold: f32,
    pub max_disappeared: u32,
    pub max_distance: f32,
}

impl Default for TrackerSettings {
    fn default() -> Self {
        Self {
            kind: TrackerKind::MotionModel,
            max_age: 30,
            min_hits: 3,
            iou_threshold: 0.3,
            max_disappeared: 30,
            max_distance: 80.0,
        }
    }
}

impl TrackerSettings {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_age == 0 {
            return Err(ConfigError::non_positive("max_age", self.max_age));
        }
        if self.min_hits == 0 {
            return Err(ConfigError::non_positive("min_hits", self.min_hits));
        }
        if !(self.iou_threshold > 0.0 && self.iou_threshold <= 1.0) {
            return Err(ConfigError::IouThreshold(self.iou_threshold));
        }
        if self.max_disappeared == 0 {
            return Err(ConfigError::non_positive("max_disappeared", self.max_disappeared));
        }
        if !(self.max_distance > 0.0 && self.max_distance.is_finite()) {
            return Err(ConfigError::non_positive("max_distance", self.max_distance));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CameraConfig {
    pub id: String,
    /// Closed polygon, `[x, y]` image-pixel vertices in order
    pub roi: Vec<[f32; 2]>,
    /// JSON-lines detection stream replayed by the binary
    #[serde(default)]
    pub source: Option<PathBuf>,
}

impl CameraConfig {
    pub fn roi(&self) -> Result<Roi, RoiError> {
        Roi::new(self.roi.iter().copied().map(Into::into).collect())
    }
}

fn default_log_interval() -> f64 {
    5.0
}

fn default_metrics_path() -> PathBuf {
    PathBuf::from("data/outputs/metrics.jsonl")
}

fn default_queue_capacity() -> usize {
    8
}

fn default_read_timeout_ms() -> u64 {
    1000
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub cameras: Vec<CameraConfig>,
    #[serde(default)]
    pub tracker: TrackerSettings,
    #[serde(default = "default_log_interval")]
    pub log_interval_seconds: f64,
    #[serde(default = "default_metrics_path")]
    pub metrics_path: PathBuf,
    /// Detected frames buffered between the detection and tracking stages
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
    /// Longest wait for the next detected frame before re-checking shutdown
    #[serde(default = "default_read_timeout_ms")]
    pub read_timeout_ms: u64,
}

impl Config {
    /// Load and validate from a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let data = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&data)
    }

    /// Parse and validate a JSON document.
    pub fn from_json(data: &str) -> Result<Self, ConfigError> {
        let cfg: Config = serde_json::from_str(data)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cameras.is_empty() {
            return Err(ConfigError::NoCameras);
        }
        let mut seen = HashSet::new();
        for camera in &self.cameras {
            if !seen.insert(camera.id.as_str()) {
                return Err(ConfigError::DuplicateCamera(camera.id.clone()));
            }
            camera.roi().map_err(|source| ConfigError::InvalidRoi {
                camera: camera.id.clone(),
                source,
            })?;
        }
        self.tracker.validate()?;
        if !(self.log_interval_seconds > 0.0 && self.log_interval_seconds.is_finite()) {
            return Err(ConfigError::non_positive(
                "log_interval_seconds",
                self.log_interval_seconds,
            ));
        }
        if self.queue_capacity == 0 {
            return Err(ConfigError::non_positive("queue_capacity", self.queue_capacity));
        }
        if self.read_timeout_ms == 0 {
            return Err(ConfigError::non_positive("read_timeout_ms", self.read_timeout_ms));
        }
        Ok(())
    }

    pub fn log_interval(&self) -> Duration {
        Duration::try_from_secs_f64(self.log_interval_seconds).unwrap_or(Duration::from_secs(5))
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SQUARE: &str = r#"[[0,0],[100,0],[100,100],[0,100]]"#;

    fn config_with(tracker: &str, roi: &str) -> String {
        format!(r#"{{"cameras": [{{"id": "cam0", "roi": {roi}}}], "tracker": {tracker}}}"#)
    }

    #[test]
    fn test_defaults() {
        let cfg = Config::from_json(&config_with("{}", SQUARE)).unwrap();
        assert_eq!(cfg.tracker, TrackerSettings::default());
        assert_eq!(cfg.log_interval(), Duration::from_secs(5));
        assert_eq!(cfg.queue_capacity, 8);
        assert!(cfg.cameras[0].source.is_none());
    }

    #[test]
    fn test_tracker_kind_names() {
        let cfg = Config::from_json(&config_with(r#"{"kind": "centroid"}"#, SQUARE)).unwrap();
        assert_eq!(cfg.tracker.kind, TrackerKind::Centroid);
        let cfg = Config::from_json(&config_with(r#"{"kind": "ocsort"}"#, SQUARE)).unwrap();
        assert_eq!(cfg.tracker.kind, TrackerKind::MotionModel);
    }

    #[test]
    fn test_rejects_small_roi() {
        let err = Config::from_json(&config_with("{}", "[[0,0],[1,1]]")).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidRoi {
                source: RoiError::TooFewPoints(2),
                ..
            }
        ));
    }

    #[test]
    fn test_rejects_non_positive_thresholds() {
        let err = Config::from_json(&config_with(r#"{"max_age": 0}"#, SQUARE)).unwrap_err();
        assert!(matches!(err, ConfigError::NonPositive { name: "max_age", .. }));

        let err = Config::from_json(&config_with(r#"{"iou_threshold": 0.0}"#, SQUARE)).unwrap_err();
        assert!(matches!(err, ConfigError::IouThreshold(_)));

        let err = Config::from_json(&config_with(r#"{"max_distance": -1.0}"#, SQUARE)).unwrap_err();
        assert!(matches!(err, ConfigError::NonPositive { name: "max_distance", .. }));
    }

    #[test]
    fn test_rejects_bad_interval_and_cameras() {
        let json = format!(
            r#"{{"cameras": [{{"id": "a", "roi": {SQUARE}}}], "log_interval_seconds": 0}}"#
        );
        assert!(matches!(
            Config::from_json(&json).unwrap_err(),
            ConfigError::NonPositive { name: "log_interval_seconds", .. }
        ));

        let json = format!(
            r#"{{"cameras": [{{"id": "a", "roi": {SQUARE}}}, {{"id": "a", "roi": {SQUARE}}}]}}"#
        );
        assert!(matches!(
            Config::from_json(&json).unwrap_err(),
            ConfigError::DuplicateCamera(_)
        ));

        assert!(matches!(
            Config::from_json(r#"{"cameras": []}"#).unwrap_err(),
            ConfigError::NoCameras
        ));
    }

    #[test]
    fn test_missing_file() {
        let err = Config::from_file("/nonexistent/crowdflow.json").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
