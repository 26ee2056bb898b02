use crate::foundation::core::{Frame, FrameShape};
use crate::foundation::error::{CassetteError, CassetteResult};

/// Consumer of frames in call order.
///
/// Contract: `write` zero or more times, then `release` exactly once. Every frame must match
/// [`FrameSink::shape`]; writes after `release` fail with [`CassetteError::WriterClosed`].
pub trait FrameSink {
    /// Shape every written frame must have.
    fn shape(&self) -> FrameShape;
    /// Append one frame.
    fn write(&mut self, frame: &Frame) -> CassetteResult<()>;
    /// Flush and close the sink.
    fn release(&mut self) -> CassetteResult<()>;
}

/// Validate `frame` against `expected`.
pub fn check_frame_shape(frame: &Frame, expected: FrameShape) -> CassetteResult<()> {
    let got = FrameShape::of(frame);
    if got != expected {
        return Err(CassetteError::FrameShapeMismatch { got, expected });
    }
    Ok(())
}

/// In-memory sink for tests and debugging.
#[derive(Debug)]
pub struct InMemorySink {
    shape: FrameShape,
    frames: Vec<Frame>,
    released: bool,
}

impl InMemorySink {
    pub fn new(shape: FrameShape) -> Self {
        Self {
            shape,
            frames: Vec::new(),
            released: false,
        }
    }

    /// Frames in write order.
    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    pub fn is_released(&self) -> bool {
        self.released
    }
}

impl FrameSink for InMemorySink {
    fn shape(&self) -> FrameShape {
        self.shape
    }

    fn write(&mut self, frame: &Frame) -> CassetteResult<()> {
        if self.released {
            return Err(CassetteError::WriterClosed);
        }
        check_frame_shape(frame, self.shape)?;
        self.frames.push(frame.clone());
        Ok(())
    }

    fn release(&mut self) -> CassetteResult<()> {
        if self.released {
            return Err(CassetteError::WriterClosed);
        }
        self.released = true;
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/encode/sink.rs"]
mod tests;
