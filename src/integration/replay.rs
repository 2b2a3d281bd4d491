//! Replay of recorded detections from a JSON-lines file.
//!
//! Each non-blank line holds one frame:
//!
//! ```json
//! {"frame": 0, "detections": [{"bbox": [10, 20, 50, 80], "score": 0.9, "class_id": 0}]}
//! ```

use std::fs::File;
use std::io::{self, BufRead, BufReader, Lines};
use std::path::Path;

use serde::Deserialize;

use crate::error::ReplayError;
use crate::integration::{DetectionBuilder, DetectionSource, FrameSource};
use crate::tracker::Detection;

/// One undecoded line of a replay file.
#[derive(Debug, Clone, PartialEq)]
pub struct ReplayFrame {
    /// Position in the stream, counting non-blank lines from 0
    pub index: u64,
    pub line: String,
}

/// Reads replay lines without decoding them, so a corrupt line only costs its own frame.
pub struct ReplaySource<R> {
    lines: Lines<R>,
    next_index: u64,
}

impl<R: BufRead> ReplaySource<R> {
    pub fn new(reader: R) -> Self {
        Self {
            lines: reader.lines(),
            next_index: 0,
        }
    }
}

impl ReplaySource<BufReader<File>> {
    pub fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        Ok(Self::new(BufReader::new(File::open(path)?)))
    }
}

impl<R: BufRead> FrameSource for ReplaySource<R> {
    type Frame = ReplayFrame;
    type Error = io::Error;

    fn next_frame(&mut self) -> Result<Option<ReplayFrame>, io::Error> {
        for line in self.lines.by_ref() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let index = self.next_index;
            self.next_index += 1;
            return Ok(Some(ReplayFrame { index, line }));
        }
        Ok(None)
    }
}

#[derive(Debug, Deserialize)]
struct RecordedFrame {
    #[serde(default)]
    detections: Vec<RecordedDetection>,
}

#[derive(Debug, Deserialize)]
struct RecordedDetection {
    bbox: [f32; 4],
    #[serde(default = "default_score")]
    score: f32,
    #[serde(default)]
    class_id: u32,
}

fn default_score() -> f32 {
    1.0
}

/// Decodes [`ReplayFrame`]s into detections.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReplayDetector;

impl DetectionSource for ReplayDetector {
    type Frame = ReplayFrame;
    type Error = ReplayError;

    fn infer(&mut self, frame: &ReplayFrame) -> Result<Vec<Detection>, ReplayError> {
        let recorded: RecordedFrame =
            serde_json::from_str(&frame.line).map_err(|source| ReplayError::Malformed {
                frame: frame.index,
                source,
            })?;

        recorded
            .detections
            .into_iter()
            .enumerate()
            .map(|(index, det)| {
                let [x1, y1, x2, y2] = det.bbox;
                if !det.bbox.iter().all(|v| v.is_finite()) {
                    return Err(ReplayError::NonFiniteBox {
                        frame: frame.index,
                        index,
                    });
                }
                Ok(DetectionBuilder::new()
                    .tlbr(x1, y1, x2, y2)
                    .score(det.score)
                    .class_id(det.class_id)
                    .build())
            })
            .collect()
    }
}
