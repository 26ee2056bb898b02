use image::{RgbImage, imageops};

use crate::foundation::error::CassetteResult;

/// Turns a text snapshot into a raster image.
///
/// Implementations must be deterministic: the same text always produces the same pixels, and the
/// image size depends only on the text.
pub trait CodeRasterizer {
    /// Rasterize the whole snapshot.
    fn rasterize(&self, code: &str) -> CassetteResult<RgbImage>;

    /// Rasterize the snapshot, keeping at most the leftmost `max_width` columns and the bottom
    /// `max_height` rows.
    ///
    /// The result must equal cropping [`CodeRasterizer::rasterize`] to that window.
    /// Implementations override this to avoid drawing pixels that would be cropped.
    fn rasterize_viewport(
        &self,
        code: &str,
        max_width: u32,
        max_height: u32,
    ) -> CassetteResult<RgbImage> {
        let img = self.rasterize(code)?;
        let (w, h) = img.dimensions();
        if w <= max_width && h <= max_height {
            return Ok(img);
        }
        let (vw, vh) = (w.min(max_width), h.min(max_height));
        Ok(imageops::crop_imm(&img, 0, h - vh, vw, vh).to_image())
    }
}
