/// Produces frames in arrival order.
pub trait FrameSource {
    type Frame;
    type Error;

    /// The next frame, or `None` once the stream has ended.
    fn next_frame(&mut self) -> Result<Option<Self::Frame>, Self::Error>;
}

/// Wraps an iterator of already-decoded frames.
#[derive(Debug, Clone)]
pub struct IterFrames<I> {
    frames: I,
}

impl<I: Iterator> IterFrames<I> {
    pub fn new(frames: impl IntoIterator<IntoIter = I>) -> Self {
        Self {
            frames: frames.into_iter(),
        }
    }
}

impl<I: Iterator> FrameSource for IterFrames<I> {
    type Frame = I::Item;
    type Error = std::convert::Infallible;

    fn next_frame(&mut self) -> Result<Option<Self::Frame>, Self::Error> {
        Ok(self.frames.next())
    }
}
