//! Source preprocessing: turns a raw code file into a [`CodeBuffer`].
//!
//! The first line of a file is reserved for metadata and never rendered. It may carry the
//! directive marker followed by a render mode (`# !!animate`). Later lines carrying the marker are
//! directives and are dropped from the code:
//!
//! - `# !!ignore` drops the line.
//! - `# !!start` drops the line and starts the animation at the text that follows it.

use std::path::Path;
use std::str::FromStr;

use crate::foundation::error::{CassetteError, CassetteResult};

/// Marker that introduces an inline directive.
pub const DIRECTIVE_MARKER: &str = "# !!";

/// Appended after the last real character so iteration always has a safe upper bound.
pub const SENTINEL: char = '\u{a0}';

/// How a code file is turned into output.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RenderMode {
    /// A single still image of the final text.
    #[default]
    Image,
    /// A video that types the text out character by character.
    Animate,
}

impl RenderMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Animate => "animate",
        }
    }
}

impl FromStr for RenderMode {
    type Err = CassetteError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "image" => Ok(Self::Image),
            "animate" => Ok(Self::Animate),
            other => Err(CassetteError::directive(format!(
                "unknown render mode '{other}' (expected 'image' or 'animate')"
            ))),
        }
    }
}

impl std::fmt::Display for RenderMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
enum Directive<'a> {
    Ignore,
    Start,
    Unknown(&'a str),
}

impl<'a> Directive<'a> {
    /// Directive carried by `line`, if it has the marker.
    fn parse(line: &'a str) -> Option<Self> {
        let (_, token) = line.split_once(DIRECTIVE_MARKER)?;
        Some(match token.trim() {
            "ignore" => Self::Ignore,
            "start" => Self::Start,
            other => Self::Unknown(other),
        })
    }
}

/// Preprocessed code ready for rendering.
///
/// Offsets and lengths are counted in characters, not bytes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CodeBuffer {
    code: String,
    render_mode: RenderMode,
    start_offset: usize,
    // Byte offset of every char boundary, including the end of the string.
    boundaries: Vec<usize>,
}

impl CodeBuffer {
    /// Parse raw file contents.
    pub fn parse(raw: &str) -> CassetteResult<Self> {
        let raw = raw.replace("\r\n", "\n");
        let mut lines = raw.split('\n');

        let header = lines.next().unwrap_or_default();
        let render_mode = match header.split_once(DIRECTIVE_MARKER) {
            Some((_, token)) => token.trim().parse()?,
            None => RenderMode::default(),
        };

        let mut kept = Vec::new();
        let mut start_offset = 0usize;
        let mut n_chars = 0usize;
        for line in lines {
            match Directive::parse(line) {
                None => {
                    n_chars += line.chars().count() + 1;
                    kept.push(line);
                }
                Some(Directive::Ignore) => {}
                Some(Directive::Start) => start_offset = n_chars,
                Some(Directive::Unknown(token)) => {
                    tracing::warn!(token, "dropping line with unknown directive");
                }
            }
        }

        let mut code = kept.join("\n");
        code.push(SENTINEL);
        Ok(Self::from_parts(code, render_mode, start_offset))
    }

    /// Build a buffer from already-processed parts. `code` is used as-is.
    pub fn from_parts(code: String, render_mode: RenderMode, start_offset: usize) -> Self {
        let boundaries = code
            .char_indices()
            .map(|(i, _)| i)
            .chain(std::iter::once(code.len()))
            .collect();
        Self {
            code,
            render_mode,
            start_offset,
            boundaries,
        }
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn render_mode(&self) -> RenderMode {
        self.render_mode
    }

    pub fn start_offset(&self) -> usize {
        self.start_offset
    }

    /// Length of the code in characters, sentinel included.
    pub fn char_len(&self) -> usize {
        self.boundaries.len() - 1
    }

    /// The first `n` characters of the code (clamped to the whole string).
    pub fn prefix(&self, n: usize) -> &str {
        let end = self.boundaries[n.min(self.char_len())];
        &self.code[..end]
    }
}

/// Read and preprocess a code file.
#[tracing::instrument]
pub fn read_code_file(path: &Path) -> CassetteResult<CodeBuffer> {
    let raw = std::fs::read_to_string(path).map_err(|e| CassetteError::file_read(path, e))?;
    let buffer = CodeBuffer::parse(&raw)?;
    tracing::info!(
        chars = buffer.char_len(),
        mode = %buffer.render_mode(),
        start = buffer.start_offset(),
        "preprocessed code file"
    );
    Ok(buffer)
}

#[cfg(test)]
#[path = "../../tests/unit/text/preprocess.rs"]
mod tests;
