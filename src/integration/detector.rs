//! Detection adapter contract.

use crate::tracker::Detection;

/// Anything that turns a frame into detections.
///
/// Boxes must be `(x1, y1, x2, y2)` in image-pixel coordinates, the same frame
/// of reference as the camera's ROI. The pipeline never looks inside `Frame`.
///
/// # Example
///
/// ```ignore
/// use crowdflow::{Detection, DetectionSource};
///
/// struct MyDetector;
///
/// impl DetectionSource for MyDetector {
///     type Frame = Vec<u8>;
///     type Error = std::io::Error;
///
///     fn infer(&mut self, frame: &Vec<u8>) -> Result<Vec<Detection>, Self::Error> {
///         Ok(vec![])
///     }
/// }
/// ```
pub trait DetectionSource {
    type Frame;
    /// A failure on one frame; the pipeline skips that frame and keeps going.
    type Error;

    fn infer(&mut self, frame: &Self::Frame) -> Result<Vec<Detection>, Self::Error>;
}

impl<D: DetectionSource + ?Sized> DetectionSource for Box<D> {
    type Frame = D::Frame;
    type Error = D::Error;

    fn infer(&mut self, frame: &Self::Frame) -> Result<Vec<Detection>, Self::Error> {
        (**self).infer(frame)
    }
}
