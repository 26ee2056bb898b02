//! Cassette renders Python source files as animated "typing" videos.
//!
//! Each prefix of a file is syntax highlighted, rasterized onto a fixed-size canvas, optionally
//! composited over a gradient background, and streamed into an `ffmpeg` encoder:
//!
//! - Preprocess the file into a [`CodeBuffer`] ([`read_code_file`])
//! - Build a [`SyntaxHighlighter`] and an optional [`Background`] from a [`Config`]
//! - Drive a [`TypeStream`] that writes frames into a [`FrameSink`]
#![forbid(unsafe_code)]

mod foundation;

/// YAML configuration and derived geometry.
pub mod config;
/// Frame sinks, including the `ffmpeg` video writer.
pub mod encode;
/// Video probing and snapshot extraction.
pub mod media;
/// Highlighting, rasterization, and frame composition.
pub mod render;
/// The typing animation driver.
pub mod session;
/// Input preprocessing.
pub mod text;

pub use crate::foundation::core::{Frame, FrameShape};
pub use crate::foundation::error::{CassetteError, CassetteResult};

pub use crate::config::{BackgroundSpec, Config, FontMetrics, load_config};
pub use crate::encode::ffmpeg::{VideoWriter, encoder_for_fourcc, is_ffmpeg_on_path};
pub use crate::encode::sink::{FrameSink, InMemorySink};
pub use crate::media::snapshot::{
    SnapshotPaths, VideoInfo, first_and_last_frames, probe_video, snapshot_dir, write_snapshots,
};
pub use crate::render::background::Background;
pub use crate::render::backend::CodeRasterizer;
pub use crate::render::canvas::{clip_width, pad, pad_height, pad_width, superimpose};
pub use crate::render::frame::FrameRenderer;
pub use crate::render::highlight::{StyledLine, StyledSpan, SyntaxHighlighter};
pub use crate::session::typestream::{AnimationStats, CARET, RunOutcome, TypeStream};
pub use crate::text::preprocess::{
    CodeBuffer, DIRECTIVE_MARKER, RenderMode, SENTINEL, read_code_file,
};

#[cfg(test)]
extern crate self as cassette;

#[cfg(test)]
#[path = "../tests/unit/support.rs"]
pub(crate) mod test_support;
