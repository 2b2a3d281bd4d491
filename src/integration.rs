//! Connects detection backends and frame streams to the tracking and counting
//! engine.

mod builder;
mod cancel;
mod detector;
mod pipeline;
mod replay;
mod source;
mod worker;

pub use builder::DetectionBuilder;
pub use cancel::CancellationToken;
pub use detector::DetectionSource;
pub use pipeline::{CameraPipeline, FlowEngine, FrameReport, PipelineSummary};
pub use replay::{ReplayDetector, ReplayFrame, ReplaySource};
pub use source::{FrameSource, IterFrames};
pub use worker::{DetectedFrame, spawn_detection_worker};
