use crate::config::Config;
use crate::foundation::core::{Frame, FrameShape};
use crate::foundation::error::{CassetteError, CassetteResult};
use crate::render::background::Background;
use crate::render::backend::CodeRasterizer;
use crate::render::canvas::{clip_width, pad, superimpose};

/// Produces fixed-shape frames from text snapshots.
///
/// Pipeline per snapshot:
/// 1. rasterize (only the rows and columns that can be visible)
/// 2. pad to the canvas width, pad or crop to the canvas height
/// 3. center over the background, if any
///
/// Every returned frame has exactly [`FrameRenderer::frame_shape`].
pub struct FrameRenderer<'a> {
    config: &'a Config,
    rasterizer: &'a dyn CodeRasterizer,
    background: Option<&'a Background>,
}

impl<'a> FrameRenderer<'a> {
    pub fn new(
        config: &'a Config,
        rasterizer: &'a dyn CodeRasterizer,
        background: Option<&'a Background>,
    ) -> Self {
        Self {
            config,
            rasterizer,
            background,
        }
    }

    pub fn config(&self) -> &Config {
        self.config
    }

    /// Shape of every frame this renderer produces: the background size when compositing, the
    /// code canvas otherwise.
    pub fn frame_shape(&self) -> FrameShape {
        match self.background {
            Some(bg) => FrameShape::of(bg.opaque()),
            None => self.config.em_shape(),
        }
    }

    /// Widest code image that can still show up in a frame: the canvas alone, or the background
    /// when it is wider.
    fn visible_width(&self) -> u32 {
        let canvas_w = self.config.em_size().0;
        match self.background {
            Some(bg) => canvas_w.max(bg.opaque().width()),
            None => canvas_w,
        }
    }

    pub fn render(&self, snapshot: &str) -> CassetteResult<Frame> {
        let canvas = self.config.em_size();
        let code = self
            .rasterizer
            .rasterize_viewport(snapshot, self.visible_width(), canvas.1)?;
        let code = pad(code, canvas);

        let frame = match self.background {
            Some(bg) => superimpose(bg.opaque(), &code),
            None => clip_width(code, canvas.0),
        };

        let got = FrameShape::of(&frame);
        let expected = self.frame_shape();
        if got != expected {
            return Err(CassetteError::FrameShapeMismatch { got, expected });
        }
        Ok(frame)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/frame.rs"]
mod tests;
