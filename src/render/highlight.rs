//! Syntax highlighting to pixels.
//!
//! Highlighting is done by `syntect` with its bundled grammars and themes. Each highlighted line
//! becomes an SVG `<text>` element on a fixed monospace grid ([`FontMetrics`]), and the document
//! is rasterized with `usvg`/`resvg` against the system font database.

use std::path::Path;
use std::sync::Arc;

use image::RgbImage;
use syntect::easy::HighlightLines;
use syntect::highlighting::{Color, FontStyle, Style, Theme, ThemeSet};
use syntect::parsing::{SyntaxReference, SyntaxSet};
use syntect::util::LinesWithEndings;

use crate::config::{Config, FontMetrics};
use crate::foundation::error::{CassetteError, CassetteResult};
use crate::render::backend::CodeRasterizer;

/// Grammar used for every snapshot, looked up by file extension.
pub const LANGUAGE_EXTENSION: &str = "py";

const TAB_WIDTH: usize = 4;

// Avoid pathological allocations for huge snapshots.
const MAX_DIM: u32 = 16_384;

const FALLBACK_BACKGROUND: [u8; 3] = [255, 255, 255];
const FALLBACK_FOREGROUND: [u8; 3] = [0, 0, 0];

/// A run of text sharing one highlight style.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StyledSpan {
    pub fg: [u8; 3],
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    /// Text with tabs expanded and line endings removed.
    pub text: String,
}

impl StyledSpan {
    fn from_syntect(style: Style, text: &str) -> Self {
        let text = text
            .trim_end_matches(['\n', '\r'])
            .chars()
            .flat_map(|c| match c {
                '\t' => std::iter::repeat_n(' ', TAB_WIDTH),
                c if c.is_control() => std::iter::repeat_n(' ', 1),
                c => std::iter::repeat_n(c, 1),
            })
            .collect();
        Self {
            fg: rgb(style.foreground),
            bold: style.font_style.contains(FontStyle::BOLD),
            italic: style.font_style.contains(FontStyle::ITALIC),
            underline: style.font_style.contains(FontStyle::UNDERLINE),
            text,
        }
    }

    fn cols(&self) -> usize {
        self.text.chars().count()
    }

    fn is_blank(&self) -> bool {
        !self.underline && self.text.chars().all(char::is_whitespace)
    }
}

/// One highlighted line.
pub type StyledLine = Vec<StyledSpan>;

/// [`CodeRasterizer`] backed by syntect and resvg.
pub struct SyntaxHighlighter {
    syntax_set: SyntaxSet,
    theme: Theme,
    metrics: FontMetrics,
    font_family: String,
    svg_opts: usvg::Options<'static>,
}

impl std::fmt::Debug for SyntaxHighlighter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyntaxHighlighter")
            .field("theme", &self.theme.name)
            .field("metrics", &self.metrics)
            .field("font_family", &self.font_family)
            .finish_non_exhaustive()
    }
}

impl SyntaxHighlighter {
    /// Load grammars, the configured theme and the system fonts.
    ///
    /// This is expensive; build one highlighter per run and share it.
    #[tracing::instrument(skip(config), fields(theme = %config.theme, font = %config.font_name))]
    pub fn new(config: &Config) -> CassetteResult<Self> {
        let syntax_set = SyntaxSet::load_defaults_newlines();
        if syntax_set
            .find_syntax_by_extension(LANGUAGE_EXTENSION)
            .is_none()
        {
            return Err(CassetteError::render(format!(
                "no bundled grammar for '.{LANGUAGE_EXTENSION}' files"
            )));
        }

        let mut themes = ThemeSet::load_defaults();
        let theme = themes.themes.remove(&config.theme).ok_or_else(|| {
            let available = themes.themes.keys().cloned().collect::<Vec<_>>().join(", ");
            CassetteError::config(format!(
                "unknown theme '{}' (available: {available})",
                config.theme
            ))
        })?;

        let svg_opts = usvg::Options {
            font_family: config.font_name.clone(),
            fontdb: build_fontdb(config.font_dir.as_deref())?,
            ..Default::default()
        };
        tracing::debug!(faces = svg_opts.fontdb.len(), "loaded font database");

        Ok(Self {
            syntax_set,
            theme,
            metrics: config.metrics(),
            font_family: config.font_name.clone(),
            svg_opts,
        })
    }

    pub fn metrics(&self) -> FontMetrics {
        self.metrics
    }

    /// Theme background, used as the image fill.
    pub fn background_color(&self) -> [u8; 3] {
        self.theme
            .settings
            .background
            .map(rgb)
            .unwrap_or(FALLBACK_BACKGROUND)
    }

    pub fn foreground_color(&self) -> [u8; 3] {
        self.theme
            .settings
            .foreground
            .map(rgb)
            .unwrap_or(FALLBACK_FOREGROUND)
    }

    fn syntax(&self) -> CassetteResult<&SyntaxReference> {
        self.syntax_set
            .find_syntax_by_extension(LANGUAGE_EXTENSION)
            .ok_or_else(|| CassetteError::render("grammar disappeared from syntax set"))
    }

    /// Highlight `code` into one [`StyledLine`] per `\n`-separated line.
    pub fn highlight_lines(&self, code: &str) -> CassetteResult<Vec<StyledLine>> {
        let mut highlighter = HighlightLines::new(self.syntax()?, &self.theme);
        let mut lines = Vec::new();
        for line in LinesWithEndings::from(code) {
            let ranges = highlighter
                .highlight_line(line, &self.syntax_set)
                .map_err(|e| CassetteError::render(format!("syntax highlighting failed: {e}")))?;
            lines.push(
                ranges
                    .into_iter()
                    .map(|(style, text)| StyledSpan::from_syntect(style, text))
                    .filter(|span| !span.text.is_empty())
                    .collect(),
            );
        }
        // A trailing newline opens one more (empty) line.
        lines.resize_with(code.split('\n').count(), Vec::new);
        Ok(lines)
    }

    /// Draw `code`, limited to the leftmost `max_width` columns and bottom `max_height` rows of
    /// the full block when a window is given.
    fn draw(&self, code: &str, window: Option<(u32, u32)>) -> CassetteResult<RgbImage> {
        let lines = self.highlight_lines(code)?;
        let cols = lines
            .iter()
            .map(|l| l.iter().map(StyledSpan::cols).sum::<usize>())
            .max()
            .unwrap_or(0);

        let full_width = self.metrics.block_width(cols);
        let full_height = self.metrics.block_height(lines.len());
        let (width, top, height) = match window {
            Some((w, h)) => (
                full_width.min(w),
                full_height.saturating_sub(h),
                full_height.min(h),
            ),
            None => (full_width, 0, full_height),
        };

        if width > MAX_DIM || height > MAX_DIM {
            return Err(CassetteError::render(format!(
                "highlighted image too large: {width}x{height} (max {MAX_DIM}x{MAX_DIM})"
            )));
        }

        let svg = self.build_svg(&lines, width, top, height);
        self.render_svg(&svg, width, height)
    }

    /// SVG document showing rows `top..top + height` and columns `0..width` of the full
    /// highlighted block.
    fn build_svg(&self, lines: &[StyledLine], width: u32, top: u32, height: u32) -> String {
        let m = self.metrics;
        let mut svg = format!(
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{width}" height="{height}">"#
        );
        svg.push_str(&format!(
            r#"<rect width="{width}" height="{height}" fill="{}"/>"#,
            hex(self.background_color())
        ));
        svg.push_str(&format!(
            r#"<g transform="translate(0,-{top})" font-family="{}" font-size="{}">"#,
            escape_xml(&format!("'{}', monospace", self.font_family)),
            m.font_size
        ));

        // One extra line above the window so descenders/ascenders crossing into it still draw.
        let visible_from = top.saturating_sub(m.line_pitch);
        let visible_to = top + height;
        // Cells starting left of the right edge, plus one for glyphs overhanging it.
        let max_cols = (width.saturating_sub(m.pad) as f32 / m.advance).ceil() as usize + 1;
        for (i, line) in lines.iter().enumerate() {
            let line_top = m.pad + i as u32 * m.line_pitch;
            if line_top + m.line_pitch <= visible_from || line_top >= visible_to {
                continue;
            }
            if line.iter().all(StyledSpan::is_blank) {
                continue;
            }

            let baseline = line_top as f32 + m.ascent;
            svg.push_str(&format!(
                r#"<text xml:space="preserve" x="{}" y="{baseline:.2}">"#,
                m.pad
            ));
            let mut col = 0usize;
            for span in line {
                if col >= max_cols {
                    break;
                }
                if !span.is_blank() {
                    push_tspan(&mut svg, span, col, max_cols - col, &m);
                }
                col += span.cols();
            }
            svg.push_str("</text>");
        }
        svg.push_str("</g></svg>");
        svg
    }

    fn render_svg(&self, svg: &str, width: u32, height: u32) -> CassetteResult<RgbImage> {
        let tree = usvg::Tree::from_str(svg, &self.svg_opts)
            .map_err(|e| CassetteError::render(format!("parse highlighted svg: {e}")))?;

        let mut pixmap = resvg::tiny_skia::Pixmap::new(width, height)
            .ok_or_else(|| CassetteError::render("failed to allocate highlight pixmap"))?;
        let [r, g, b] = self.background_color();
        pixmap.fill(resvg::tiny_skia::Color::from_rgba8(r, g, b, 255));
        resvg::render(
            &tree,
            resvg::tiny_skia::Transform::identity(),
            &mut pixmap.as_mut(),
        );

        // The background is opaque, so premultiplied RGBA is plain RGB plus alpha 255.
        let rgb = pixmap
            .data()
            .chunks_exact(4)
            .flat_map(|px| [px[0], px[1], px[2]])
            .collect();
        RgbImage::from_raw(width, height, rgb)
            .ok_or_else(|| CassetteError::render("highlight pixmap has unexpected size"))
    }
}

impl CodeRasterizer for SyntaxHighlighter {
    fn rasterize(&self, code: &str) -> CassetteResult<RgbImage> {
        self.draw(code, None)
    }

    fn rasterize_viewport(
        &self,
        code: &str,
        max_width: u32,
        max_height: u32,
    ) -> CassetteResult<RgbImage> {
        self.draw(code, Some((max_width, max_height)))
    }
}

/// Each character gets an explicit x so text stays on the cell grid whatever the font's advance.
/// At most `limit` characters of the span are emitted.
fn push_tspan(svg: &mut String, span: &StyledSpan, col: usize, limit: usize, m: &FontMetrics) {
    let n = span.cols().min(limit);
    let xs = (0..n)
        .map(|i| format!("{:.2}", m.pad as f32 + (col + i) as f32 * m.advance))
        .collect::<Vec<_>>()
        .join(" ");
    svg.push_str(&format!(r#"<tspan x="{xs}" fill="{}""#, hex(span.fg)));
    if span.bold {
        svg.push_str(r#" font-weight="bold""#);
    }
    if span.italic {
        svg.push_str(r#" font-style="italic""#);
    }
    if span.underline {
        svg.push_str(r#" text-decoration="underline""#);
    }
    svg.push('>');
    if n < span.cols() {
        let text: String = span.text.chars().take(n).collect();
        svg.push_str(&escape_xml(&text));
    } else {
        svg.push_str(&escape_xml(&span.text));
    }
    svg.push_str("</tspan>");
}

fn build_fontdb(extra_dir: Option<&Path>) -> CassetteResult<Arc<usvg::fontdb::Database>> {
    let mut db = usvg::fontdb::Database::new();
    db.load_system_fonts();
    if let Some(dir) = extra_dir {
        load_fonts_from_dir(&mut db, dir)?;
    }
    Ok(Arc::new(db))
}

fn load_fonts_from_dir(db: &mut usvg::fontdb::Database, dir: &Path) -> CassetteResult<()> {
    let rd = std::fs::read_dir(dir).map_err(|e| {
        CassetteError::config(format!("font_dir '{}' is not readable: {e}", dir.display()))
    })?;

    for entry in rd.flatten() {
        let path = entry.path();
        let Some(ext) = path.extension().and_then(|s| s.to_str()) else {
            continue;
        };
        let ext = ext.to_ascii_lowercase();
        if !path.is_file() || !matches!(ext.as_str(), "ttf" | "otf" | "ttc") {
            continue;
        }
        if let Err(e) = db.load_font_file(&path) {
            tracing::warn!(path = %path.display(), error = %e, "skipping unreadable font");
        }
    }
    Ok(())
}

fn rgb(c: Color) -> [u8; 3] {
    [c.r, c.g, c.b]
}

fn hex([r, g, b]: [u8; 3]) -> String {
    format!("#{r:02x}{g:02x}{b:02x}")
}

fn escape_xml(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
#[path = "../../tests/unit/render/highlight.rs"]
mod tests;
