use image::{Rgb, RgbImage, Rgba, RgbaImage, imageops};
use rand::{Rng, SeedableRng, rngs::StdRng};
use rand_distr::StandardNormal;

use crate::config::BackgroundSpec;
use crate::foundation::error::{CassetteError, CassetteResult};

/// Static backdrop shared by every frame of a run.
///
/// Generated once from a 2x2 corner gradient, upscaled with bilinear filtering, plus additive
/// gaussian noise drawn from a generator seeded with [`BackgroundSpec::seed`].
#[derive(Clone, Debug)]
pub struct Background {
    rgba: RgbaImage,
    opaque: RgbImage,
}

impl Background {
    pub fn generate(spec: &BackgroundSpec, width: u32, height: u32) -> CassetteResult<Self> {
        if width == 0 || height == 0 {
            return Err(CassetteError::render(
                "background width/height must be non-zero",
            ));
        }

        let mut seed_img = RgbaImage::new(2, 2);
        for (i, [r, g, b]) in spec.colors.iter().copied().enumerate() {
            seed_img.put_pixel(i as u32 % 2, i as u32 / 2, Rgba([r, g, b, 255]));
        }
        let mut rgba = imageops::resize(&seed_img, width, height, imageops::FilterType::Triangle);

        if spec.noise > 0.0 {
            let mut rng = StdRng::seed_from_u64(spec.seed);
            let sigma = f64::from(spec.noise);
            for px in rgba.pixels_mut() {
                for c in &mut px.0[..3] {
                    let z: f64 = rng.sample(StandardNormal);
                    let v = f64::from(*c) + z * sigma;
                    *c = v.round().clamp(0.0, 255.0) as u8;
                }
            }
        }

        let opaque = RgbImage::from_fn(width, height, |x, y| {
            let Rgba([r, g, b, _]) = *rgba.get_pixel(x, y);
            Rgb([r, g, b])
        });

        tracing::debug!(width, height, seed = spec.seed, "generated background");
        Ok(Self { rgba, opaque })
    }

    pub fn rgba(&self) -> &RgbaImage {
        &self.rgba
    }

    /// The background without its alpha channel, ready to composite frames onto.
    pub fn opaque(&self) -> &RgbImage {
        &self.opaque
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.rgba.dimensions()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/background.rs"]
mod tests;
