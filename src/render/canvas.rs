//! Fitting highlighted images onto the fixed code canvas.
//!
//! Padding always uses the image's top-left pixel, which is the highlighter's background color.
//! When a snapshot is taller than the canvas only its bottom rows are kept, so the newest lines
//! stay visible like in a scrolling editor.

use image::{RgbImage, imageops};

fn fill_color(img: &RgbImage) -> image::Rgb<u8> {
    *img.get_pixel(0, 0)
}

/// Extend `img` on the right to at least `canvas_width` columns. Never shrinks.
pub fn pad_width(img: RgbImage, canvas_width: u32) -> RgbImage {
    let (w, h) = img.dimensions();
    if w >= canvas_width || h == 0 {
        return img;
    }
    let mut out = RgbImage::from_pixel(canvas_width, h, fill_color(&img));
    imageops::replace(&mut out, &img, 0, 0);
    out
}

/// Make `img` exactly `canvas_height` rows tall.
///
/// Shorter images are extended downward; taller images lose rows from the top.
pub fn pad_height(img: RgbImage, canvas_height: u32) -> RgbImage {
    let (w, h) = img.dimensions();
    if h < canvas_height && w > 0 {
        let mut out = RgbImage::from_pixel(w, canvas_height, fill_color(&img));
        imageops::replace(&mut out, &img, 0, 0);
        out
    } else if h > canvas_height {
        imageops::crop_imm(&img, 0, h - canvas_height, w, canvas_height).to_image()
    } else {
        img
    }
}

/// Pad to the canvas width, then pad or crop to the canvas height.
pub fn pad(img: RgbImage, canvas: (u32, u32)) -> RgbImage {
    let (cw, ch) = canvas;
    pad_height(pad_width(img, cw), ch)
}

/// Keep at most `canvas_width` columns, dropping the rightmost ones.
pub fn clip_width(img: RgbImage, canvas_width: u32) -> RgbImage {
    let (w, h) = img.dimensions();
    if w <= canvas_width {
        return img;
    }
    imageops::crop_imm(&img, 0, 0, canvas_width, h).to_image()
}

/// Paste `top` centered over a copy of `bottom`. Parts of `top` outside `bottom` are clipped.
pub fn superimpose(bottom: &RgbImage, top: &RgbImage) -> RgbImage {
    let mut out = bottom.clone();
    let x = (i64::from(bottom.width()) - i64::from(top.width())).div_euclid(2);
    let y = (i64::from(bottom.height()) - i64::from(top.height())).div_euclid(2);
    imageops::replace(&mut out, top, x, y);
    out
}

#[cfg(test)]
#[path = "../../tests/unit/render/canvas.rs"]
mod tests;
