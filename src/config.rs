//! Rendering configuration loaded from YAML.
//!
//! A [`Config`] is built once at startup and passed by reference to every component; nothing
//! mutates it afterwards. Missing keys take the defaults below and unknown keys are rejected.

use std::path::{Path, PathBuf};

use crate::foundation::core::FrameShape;
use crate::foundation::error::{CassetteError, CassetteResult};

/// Monospace advance width as a fraction (`3/5`) of the font size.
const ADVANCE_NUM: u32 = 3;
const ADVANCE_DEN: u32 = 5;
/// Baseline offset from the top of a line as a fraction of the font size.
const ASCENT_EM: f32 = 0.8;

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// FourCC of the video codec (`avc1`, `mp4v`, ...).
    pub codec: String,
    /// Container extension including the dot (`.mp4`).
    #[serde(rename = "format")]
    pub output_format: String,
    pub fps: u32,
    /// Video frame size as `(width, height)`.
    pub size: (u32, u32),
    pub font_name: String,
    pub font_size: u32,
    /// Extra directory of `.ttf`/`.otf`/`.ttc` files loaded next to the system fonts.
    pub font_dir: Option<PathBuf>,
    /// syntect theme name.
    pub theme: String,
    /// Code canvas width in character cells.
    pub em_width: u32,
    /// Code canvas height in lines.
    pub em_height: u32,
    /// Generated backdrop the code canvas is centered on. `None` renders the canvas directly.
    pub background: Option<BackgroundSpec>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            codec: "avc1".to_string(),
            output_format: ".mp4".to_string(),
            fps: 60,
            size: (3840, 2160),
            font_name: "Menlo".to_string(),
            font_size: 14,
            font_dir: None,
            theme: "base16-ocean.dark".to_string(),
            em_width: 80,
            em_height: 24,
            background: None,
        }
    }
}

/// Seed for the generated background: a 2x2 corner gradient plus gaussian noise.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BackgroundSpec {
    /// Corner colors in top-left, top-right, bottom-left, bottom-right order.
    pub colors: [[u8; 3]; 4],
    /// Standard deviation of the additive noise, in 8-bit channel units.
    pub noise: f32,
    pub seed: u64,
}

impl Default for BackgroundSpec {
    fn default() -> Self {
        Self {
            colors: [[40, 44, 92], [92, 40, 88], [24, 64, 96], [56, 28, 60]],
            noise: 6.0,
            seed: 0,
        }
    }
}

/// Pixel geometry derived from the font size.
///
/// Lines are laid out on a fixed pitch with `pad` pixels around the whole block, so the size of a
/// highlighted snapshot depends only on its line and column counts.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FontMetrics {
    pub font_size: u32,
    /// Padding around the text block.
    pub pad: u32,
    /// Distance between consecutive baselines.
    pub line_pitch: u32,
    /// Horizontal advance of one monospace cell.
    pub advance: f32,
    /// Baseline offset from the top of a line.
    pub ascent: f32,
}

impl FontMetrics {
    pub fn for_font_size(font_size: u32) -> Self {
        Self {
            font_size,
            pad: font_size,
            line_pitch: font_size + font_size * 2 / 3,
            advance: (font_size * ADVANCE_NUM) as f32 / ADVANCE_DEN as f32,
            ascent: font_size as f32 * ASCENT_EM,
        }
    }

    /// Width in pixels of a block `cols` cells wide (at least one cell).
    pub fn block_width(&self, cols: usize) -> u32 {
        let cells = cols.max(1) as u32 * self.font_size * ADVANCE_NUM;
        2 * self.pad + cells.div_ceil(ADVANCE_DEN)
    }

    /// Height in pixels of a block `rows` lines tall (at least one line).
    pub fn block_height(&self, rows: usize) -> u32 {
        2 * self.pad + rows.max(1) as u32 * self.line_pitch
    }
}

impl Config {
    /// Parse and validate a YAML document.
    pub fn from_yaml_str(src: &str) -> CassetteResult<Self> {
        let config: Config = serde_yaml::from_str(src)
            .map_err(|e| CassetteError::config(format!("invalid config yaml: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> CassetteResult<()> {
        if self.fps == 0 {
            return Err(CassetteError::config("fps must be non-zero"));
        }
        if self.size.0 == 0 || self.size.1 == 0 {
            return Err(CassetteError::config("size width/height must be non-zero"));
        }
        if self.font_size == 0 {
            return Err(CassetteError::config("font_size must be non-zero"));
        }
        if self.em_width == 0 || self.em_height == 0 {
            return Err(CassetteError::config("em_width/em_height must be non-zero"));
        }
        if self.codec.chars().count() != 4 {
            return Err(CassetteError::config(format!(
                "codec must be a four-character code, got '{}'",
                self.codec
            )));
        }
        if !self.output_format.starts_with('.') || self.output_format.len() < 2 {
            return Err(CassetteError::config(format!(
                "format must be an extension starting with '.', got '{}'",
                self.output_format
            )));
        }
        if let Some(bg) = &self.background
            && (!bg.noise.is_finite() || bg.noise < 0.0)
        {
            return Err(CassetteError::config(
                "background noise must be a finite, non-negative number",
            ));
        }
        Ok(())
    }

    /// Row-major shape of the video frame size.
    pub fn shape(&self) -> FrameShape {
        let (w, h) = self.size;
        FrameShape::new(h, w)
    }

    /// Half of the video frame size, rounded down.
    pub fn half_size(&self) -> (u32, u32) {
        let (w, h) = self.size;
        (w / 2, h / 2)
    }

    pub fn metrics(&self) -> FontMetrics {
        FontMetrics::for_font_size(self.font_size)
    }

    /// Code canvas size `(width, height)` in pixels, derived from the em grid.
    ///
    /// Both dimensions are rounded up to even values so the canvas can be encoded as yuv420p.
    pub fn em_size(&self) -> (u32, u32) {
        let m = self.metrics();
        let w = m.block_width(self.em_width as usize);
        let h = m.block_height(self.em_height as usize);
        (w.next_multiple_of(2), h.next_multiple_of(2))
    }

    pub fn em_shape(&self) -> FrameShape {
        let (w, h) = self.em_size();
        FrameShape::new(h, w)
    }

    pub fn with_background(mut self, background: Option<BackgroundSpec>) -> Self {
        self.background = background;
        self
    }
}

/// Read and validate a YAML config file.
pub fn load_config(path: impl AsRef<Path>) -> CassetteResult<Config> {
    let path = path.as_ref();
    let src = std::fs::read_to_string(path).map_err(|e| CassetteError::file_read(path, e))?;
    let config = Config::from_yaml_str(&src)?;
    tracing::debug!(path = %path.display(), ?config, "loaded config");
    Ok(config)
}

#[cfg(test)]
#[path = "../tests/unit/config.rs"]
mod tests;
