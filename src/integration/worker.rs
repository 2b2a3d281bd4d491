//! Detection stage on its own thread, feeding the tracking stage through a
//! bounded queue. One worker per camera keeps frames in arrival order.

use std::fmt::Display;
use std::thread::{self, JoinHandle};

use crossbeam_channel::{Receiver, bounded};
use tracing::{debug, warn};

use crate::integration::{CancellationToken, DetectionSource, FrameSource};
use crate::tracker::Detection;

/// Output of the detection stage for one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectedFrame {
    pub index: u64,
    /// `None` when detection failed; the frame is skipped downstream
    pub detections: Option<Vec<Detection>>,
}

/// Start a thread that reads `source`, runs `detector` on every frame and sends
/// the results into a queue of `capacity` frames.
///
/// The queue closes when the source ends, the token is cancelled or the
/// receiver is dropped. The handle yields the number of frames read, or the
/// source error that stopped the stream.
pub fn spawn_detection_worker<F, D>(
    mut source: F,
    mut detector: D,
    capacity: usize,
    cancel: CancellationToken,
) -> (Receiver<DetectedFrame>, JoinHandle<Result<u64, F::Error>>)
where
    F: FrameSource + Send + 'static,
    F::Error: Send + 'static,
    D: DetectionSource<Frame = F::Frame> + Send + 'static,
    D::Error: Display,
{
    let (tx, rx) = bounded(capacity);
    let handle = thread::spawn(move || {
        let mut index = 0u64;
        while !cancel.is_cancelled() {
            let Some(frame) = source.next_frame()? else {
                break;
            };
            let detections = match detector.infer(&frame) {
                Ok(detections) => Some(detections),
                Err(err) => {
                    warn!(frame = index, %err, "detection failed, frame will be skipped");
                    None
                }
            };
            if tx.send(DetectedFrame { index, detections }).is_err() {
                debug!(frame = index, "tracking stage gone, stopping detection");
                break;
            }
            index += 1;
        }
        Ok(index)
    });
    (rx, handle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::integration::IterFrames;
    use std::convert::Infallible;

    struct Boxes;

    impl DetectionSource for Boxes {
        type Frame = u32;
        type Error = String;

        fn infer(&mut self, frame: &u32) -> Result<Vec<Detection>, String> {
            if *frame == 2 {
                return Err("corrupt".to_string());
            }
            let x = *frame as f32 * 10.0;
            Ok(vec![Detection::new(x, 0.0, x + 10.0, 10.0, 0.9)])
        }
    }

    #[test]
    fn test_frames_arrive_in_order() {
        let (rx, handle) =
            spawn_detection_worker(IterFrames::new(0..5u32), Boxes, 2, CancellationToken::new());
        let frames: Vec<DetectedFrame> = rx.iter().collect();
        let read: Result<u64, Infallible> = handle.join().unwrap();

        assert_eq!(read.unwrap(), 5);
        let indices: Vec<u64> = frames.iter().map(|f| f.index).collect();
        assert_eq!(indices, vec![0, 1, 2, 3, 4]);
        assert!(frames[2].detections.is_none());
        assert_eq!(frames[4].detections.as_ref().unwrap().len(), 1);
    }

    #[test]
    fn test_cancelled_worker_reads_nothing() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let (rx, handle) = spawn_detection_worker(IterFrames::new(0..5u32), Boxes, 2, cancel);
        assert_eq!(rx.iter().count(), 0);
        assert_eq!(handle.join().unwrap().unwrap(), 0);
    }
}
