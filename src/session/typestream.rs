use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::encode::ffmpeg::{VideoWriter, ensure_parent_dir};
use crate::encode::sink::FrameSink;
use crate::foundation::error::{CassetteError, CassetteResult};
use crate::render::background::Background;
use crate::render::backend::CodeRasterizer;
use crate::render::frame::FrameRenderer;
use crate::text::preprocess::{CodeBuffer, RenderMode, read_code_file};

/// Cursor drawn after the typed text in every animation frame.
pub const CARET: char = '\u{258C}';

const PROGRESS_EVERY: usize = 100;

/// Counters from one animation pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AnimationStats {
    /// Prefixes visited (`char_len - start_offset`).
    pub steps: usize,
    pub frames_written: usize,
    /// Prefixes skipped because the cursor sat inside indentation.
    pub frames_skipped: usize,
}

/// What a [`TypeStream::run`] produced.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RunOutcome {
    Image { path: PathBuf },
    Video { path: PathBuf, stats: AnimationStats },
}

impl RunOutcome {
    pub fn path(&self) -> &Path {
        match self {
            Self::Image { path } | Self::Video { path, .. } => path,
        }
    }
}

/// Types one code file out into a video, or renders it as a still.
#[derive(Debug)]
pub struct TypeStream<'a> {
    in_path: PathBuf,
    stem: PathBuf,
    config: &'a Config,
    code: CodeBuffer,
}

impl<'a> TypeStream<'a> {
    /// Read and preprocess `in_path`; outputs go to `out_dir/<basename with '.' as '_'>`.
    pub fn new(in_path: &Path, out_dir: &Path, config: &'a Config) -> CassetteResult<Self> {
        let code = read_code_file(in_path)?;
        let stem = out_dir.join(output_name(in_path)?);
        Ok(Self {
            in_path: in_path.to_path_buf(),
            stem,
            config,
            code,
        })
    }

    /// Build from an already-parsed buffer.
    pub fn from_buffer(code: CodeBuffer, stem: PathBuf, config: &'a Config) -> Self {
        Self {
            in_path: PathBuf::new(),
            stem,
            config,
            code,
        }
    }

    pub fn code(&self) -> &CodeBuffer {
        &self.code
    }

    /// Output path without extension.
    pub fn stem(&self) -> &Path {
        &self.stem
    }

    #[tracing::instrument(skip_all, fields(input = %self.in_path.display(), mode = %self.code.render_mode()))]
    pub fn run(
        &self,
        rasterizer: &dyn CodeRasterizer,
        background: Option<&Background>,
    ) -> CassetteResult<RunOutcome> {
        let renderer = FrameRenderer::new(self.config, rasterizer, background);
        match self.code.render_mode() {
            RenderMode::Image => self.final_frame(&renderer),
            RenderMode::Animate => self.animate(&renderer),
        }
    }

    /// Render the whole text once, without a caret, to `<stem>.png`.
    pub fn final_frame(&self, renderer: &FrameRenderer<'_>) -> CassetteResult<RunOutcome> {
        let mut path = self.stem.clone().into_os_string();
        path.push(".png");
        let path = PathBuf::from(path);

        let frame = renderer.render(self.code.code())?;
        ensure_parent_dir(&path)?;
        frame.save(&path).map_err(|e| {
            CassetteError::encode(format!("failed to save image '{}': {e}", path.display()))
        })?;
        tracing::info!(path = %path.display(), "wrote image");
        Ok(RunOutcome::Image { path })
    }

    /// Encode the typing animation into a video next to the stem.
    pub fn animate(&self, renderer: &FrameRenderer<'_>) -> CassetteResult<RunOutcome> {
        let mut writer = VideoWriter::open(&self.stem, self.config, renderer.frame_shape())?;
        let stats = self.animate_into(renderer, &mut writer)?;
        Ok(RunOutcome::Video {
            path: writer.path().to_path_buf(),
            stats,
        })
    }

    /// Write one frame per visible prefix into `sink`, then release it.
    pub fn animate_into(
        &self,
        renderer: &FrameRenderer<'_>,
        sink: &mut dyn FrameSink,
    ) -> CassetteResult<AnimationStats> {
        let mut stats = AnimationStats::default();
        let mut snapshot = String::new();
        for idx in self.code.start_offset()..self.code.char_len() {
            stats.steps += 1;
            let prefix = self.code.prefix(idx);
            if is_indent_only_tail(prefix) {
                stats.frames_skipped += 1;
                continue;
            }

            snapshot.clear();
            snapshot.push_str(prefix);
            snapshot.push(CARET);
            let frame = renderer.render(&snapshot)?;
            sink.write(&frame)?;
            stats.frames_written += 1;

            if stats.frames_written % PROGRESS_EVERY == 0 {
                tracing::debug!(
                    idx,
                    total = self.code.char_len(),
                    written = stats.frames_written,
                    "animation progress"
                );
            }
        }
        sink.release()?;

        tracing::info!(
            steps = stats.steps,
            written = stats.frames_written,
            skipped = stats.frames_skipped,
            "animation finished"
        );
        Ok(stats)
    }
}

/// True when the cursor sits in leading indentation: the last line is non-empty and all spaces.
pub fn is_indent_only_tail(prefix: &str) -> bool {
    let tail = prefix.rsplit('\n').next().unwrap_or_default();
    !tail.is_empty() && tail.chars().all(|c| c == ' ')
}

fn output_name(in_path: &Path) -> CassetteResult<String> {
    let name = in_path.file_name().ok_or_else(|| {
        CassetteError::config(format!("input path '{}' has no file name", in_path.display()))
    })?;
    Ok(name.to_string_lossy().replace('.', "_"))
}

#[cfg(test)]
#[path = "../../tests/unit/session/typestream.rs"]
mod tests;
