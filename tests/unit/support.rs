//! Shared fixtures: a font-free rasterizer with exactly predictable pixels.
#![allow(dead_code)]

use std::cell::Cell;

use image::{Rgb, RgbImage};

use cassette::{CassetteResult, CodeRasterizer, Config};

pub const GRID_BG: Rgb<u8> = Rgb([12, 34, 56]);
pub const GRID_PAD: u32 = 1;
pub const CELL_W: u32 = 2;
pub const CELL_H: u32 = 3;

/// Draws every non-whitespace character as a `CELL_W x CELL_H` block colored by its row and
/// column; everything else is `GRID_BG`.
#[derive(Debug, Default)]
pub struct GridRasterizer {
    calls: Cell<usize>,
}

impl GridRasterizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> usize {
        self.calls.get()
    }
}

impl CodeRasterizer for GridRasterizer {
    fn rasterize(&self, code: &str) -> CassetteResult<RgbImage> {
        self.calls.set(self.calls.get() + 1);
        let lines: Vec<Vec<char>> = code.split('\n').map(|l| l.chars().collect()).collect();
        let cols = lines.iter().map(Vec::len).max().unwrap_or(0).max(1) as u32;
        let w = 2 * GRID_PAD + cols * CELL_W;
        let h = 2 * GRID_PAD + lines.len() as u32 * CELL_H;
        Ok(RgbImage::from_fn(w, h, |x, y| {
            if x < GRID_PAD || y < GRID_PAD {
                return GRID_BG;
            }
            let row = ((y - GRID_PAD) / CELL_H) as usize;
            let col = ((x - GRID_PAD) / CELL_W) as usize;
            match lines.get(row).and_then(|l| l.get(col)) {
                Some(c) if !c.is_whitespace() => Rgb([row as u8, col as u8, 200]),
                _ => GRID_BG,
            }
        }))
    }
}

/// Small canvas: 140x84 pixels (20 cells by 4 lines at font size 10).
pub fn small_config() -> Config {
    Config {
        size: (200, 120),
        fps: 10,
        font_size: 10,
        em_width: 20,
        em_height: 4,
        ..Config::default()
    }
}
