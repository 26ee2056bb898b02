use image::GenericImageView;

/// A rendered video frame: tightly packed RGB8, row-major.
pub type Frame = image::RgbImage;

/// Row-major frame dimensions (`height` rows by `width` columns).
///
/// Frames are validated against a `FrameShape` before they reach an encoder. The `Display` form is
/// `HxW`, matching the row-major order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FrameShape {
    pub height: u32,
    pub width: u32,
}

impl FrameShape {
    pub fn new(height: u32, width: u32) -> Self {
        Self { height, width }
    }

    /// Shape of any image buffer.
    pub fn of<I: GenericImageView>(img: &I) -> Self {
        let (width, height) = img.dimensions();
        Self { height, width }
    }

    /// Number of RGB8 bytes a frame of this shape occupies.
    pub fn rgb_len(self) -> usize {
        self.height as usize * self.width as usize * 3
    }

    pub fn is_even(self) -> bool {
        self.width.is_multiple_of(2) && self.height.is_multiple_of(2)
    }
}

impl std::fmt::Display for FrameShape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.height, self.width)
    }
}
