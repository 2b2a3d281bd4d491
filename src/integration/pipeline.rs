//! Per-camera pipeline: detection, tracking, counting and metrics in strict
//! frame order.

use std::fmt::Display;
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, RecvTimeoutError};
use tracing::{debug, info, warn};

use crate::config::{CameraConfig, Config};
use crate::counting::{FlowCounter, FlowCounts};
use crate::error::{ConfigError, SinkError};
use crate::integration::{CancellationToken, DetectedFrame, DetectionSource, FrameSource};
use crate::metrics::{MetricsEmitter, MetricsSink};
use crate::tracker::{Detection, TrackPositions, Tracker, build_tracker};

/// What one processed frame produced.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameReport {
    pub frame_index: u64,
    pub tracks: TrackPositions,
    pub counts: FlowCounts,
}

/// Totals for a finished pipeline run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PipelineSummary {
    /// Frames that reached the tracker
    pub frames: u64,
    /// Frames dropped because detection failed
    pub skipped_frames: u64,
    pub counts: FlowCounts,
    pub records_emitted: u64,
    pub sink_failures: u64,
}

/// Tracking, counting and metrics state owned by a single camera.
pub struct FlowEngine<S> {
    tracker: Box<dyn Tracker>,
    counter: FlowCounter,
    emitter: MetricsEmitter<S>,
    frames_seen: u64,
    frames: u64,
    skipped_frames: u64,
    sink_failures: u64,
    active: usize,
}

impl<S: MetricsSink> FlowEngine<S> {
    pub fn new(
        tracker: Box<dyn Tracker>,
        counter: FlowCounter,
        emitter: MetricsEmitter<S>,
    ) -> Self {
        Self {
            tracker,
            counter,
            emitter,
            frames_seen: 0,
            frames: 0,
            skipped_frames: 0,
            sink_failures: 0,
            active: 0,
        }
    }

    /// Build the engine for one configured camera.
    pub fn from_config(
        camera: &CameraConfig,
        config: &Config,
        sink: S,
    ) -> Result<Self, ConfigError> {
        let roi = camera.roi().map_err(|source| ConfigError::InvalidRoi {
            camera: camera.id.clone(),
            source,
        })?;
        config.tracker.validate()?;
        Ok(Self::new(
            build_tracker(&config.tracker),
            FlowCounter::new(roi),
            MetricsEmitter::new(camera.id.clone(), config.log_interval(), sink),
        ))
    }

    pub fn camera_id(&self) -> &str {
        self.emitter.camera_id()
    }

    pub fn tracker(&self) -> &dyn Tracker {
        self.tracker.as_ref()
    }

    pub fn counter(&self) -> &FlowCounter {
        &self.counter
    }

    pub fn emitter(&self) -> &MetricsEmitter<S> {
        &self.emitter
    }

    pub fn counts(&self) -> FlowCounts {
        self.counter.counts()
    }

    /// Run one frame's detections through the tracker and counter, emitting a
    /// metrics record when the interval has elapsed at `now`.
    pub fn step(&mut self, detections: &[Detection], now: Instant) -> FrameReport {
        let frame_index = self.frames_seen;
        self.frames_seen += 1;
        self.frames += 1;

        let tracks = self.tracker.update(detections);
        let counts = self.counter.update(&tracks);
        self.active = tracks.len();

        if let Err(err) = self.emitter.tick(now, counts, self.active) {
            self.record_sink_failure(&err);
        }

        FrameReport {
            frame_index,
            tracks,
            counts,
        }
    }

    /// Account for a frame whose detection failed. Tracker state is left untouched.
    pub fn skip_frame(&mut self) {
        self.frames_seen += 1;
        self.skipped_frames += 1;
    }

    /// Consume detected frames until the queue closes or `cancel` fires, then
    /// flush a final record.
    ///
    /// Waits at most `read_timeout` per frame before re-checking cancellation.
    pub fn run_queue(
        &mut self,
        frames: Receiver<DetectedFrame>,
        cancel: &CancellationToken,
        read_timeout: Duration,
    ) -> PipelineSummary {
        info!(camera = self.camera_id(), "pipeline started");
        while !cancel.is_cancelled() {
            match frames.recv_timeout(read_timeout) {
                Ok(DetectedFrame {
                    detections: Some(detections),
                    ..
                }) => {
                    self.step(&detections, Instant::now());
                }
                Ok(DetectedFrame { index, detections: None }) => {
                    debug!(camera = self.camera_id(), frame = index, "skipping frame");
                    self.skip_frame();
                }
                Err(RecvTimeoutError::Timeout) => {
                    debug!(camera = self.camera_id(), "no frame within read timeout");
                    let counts = self.counter.counts();
                    if let Err(err) = self.emitter.tick(Instant::now(), counts, self.active) {
                        self.record_sink_failure(&err);
                    }
                }
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }
        self.finish()
    }

    /// Flush a final record with the current counts and summarize the run.
    pub fn finish(&mut self) -> PipelineSummary {
        if let Err(err) = self.emitter.flush(self.counter.counts(), self.active) {
            self.record_sink_failure(&err);
        }
        let summary = self.summary();
        info!(
            camera = self.camera_id(),
            frames = summary.frames,
            skipped = summary.skipped_frames,
            in_count = summary.counts.in_count,
            out_count = summary.counts.out_count,
            "pipeline finished"
        );
        summary
    }

    pub fn summary(&self) -> PipelineSummary {
        PipelineSummary {
            frames: self.frames,
            skipped_frames: self.skipped_frames,
            counts: self.counter.counts(),
            records_emitted: self.emitter.emitted(),
            sink_failures: self.sink_failures,
        }
    }

    fn record_sink_failure(&mut self, err: &SinkError) {
        self.sink_failures += 1;
        warn!(camera = self.camera_id(), %err, "failed to write metrics record");
    }
}

/// A detector bundled with the camera's [`FlowEngine`], run synchronously on
/// the calling thread.
pub struct CameraPipeline<D, S> {
    detector: D,
    engine: FlowEngine<S>,
}

impl<D, S> CameraPipeline<D, S>
where
    D: DetectionSource,
    D::Error: Display,
    S: MetricsSink,
{
    pub fn new(detector: D, engine: FlowEngine<S>) -> Self {
        Self { detector, engine }
    }

    /// Detect and track a single frame.
    ///
    /// On a detection error the frame is counted as skipped and the tracker is
    /// not advanced.
    pub fn process_frame(&mut self, frame: &D::Frame) -> Result<FrameReport, D::Error> {
        match self.detector.infer(frame) {
            Ok(detections) => Ok(self.engine.step(&detections, Instant::now())),
            Err(err) => {
                self.engine.skip_frame();
                Err(err)
            }
        }
    }

    /// Process every frame from `source` until it ends or `cancel` fires.
    ///
    /// A final metrics record is flushed in every case, including when the
    /// source fails.
    pub fn run<F>(
        &mut self,
        source: &mut F,
        cancel: &CancellationToken,
    ) -> Result<PipelineSummary, F::Error>
    where
        F: FrameSource<Frame = D::Frame>,
    {
        info!(camera = self.engine.camera_id(), "pipeline started");
        while !cancel.is_cancelled() {
            let frame = match source.next_frame() {
                Ok(Some(frame)) => frame,
                Ok(None) => break,
                Err(err) => {
                    self.engine.finish();
                    return Err(err);
                }
            };
            if let Err(err) = self.process_frame(&frame) {
                warn!(camera = self.engine.camera_id(), %err, "detection failed, skipping frame");
            }
        }
        Ok(self.engine.finish())
    }

    pub fn detector(&self) -> &D {
        &self.detector
    }

    pub fn detector_mut(&mut self) -> &mut D {
        &mut self.detector
    }

    pub fn engine(&self) -> &FlowEngine<S> {
        &self.engine
    }
}
