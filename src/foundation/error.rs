use std::path::PathBuf;

use crate::foundation::core::FrameShape;

/// Convenience result type used across cassette.
pub type CassetteResult<T> = Result<T, CassetteError>;

/// Top-level error taxonomy. Every variant is fatal for a run; nothing is retried.
#[derive(thiserror::Error, Debug)]
pub enum CassetteError {
    /// The input file could not be opened or is not valid UTF-8 text.
    #[error("failed to read '{}': {source}", path.display())]
    FileRead {
        /// Path that failed to read.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// A frame did not match the shape its consumer expects.
    #[error("frame shape mismatch: got {got}, expected {expected}")]
    FrameShapeMismatch {
        /// Shape of the offending frame.
        got: FrameShape,
        /// Shape the consumer was opened with.
        expected: FrameShape,
    },

    /// The video writer could not be opened (unsupported codec/container, no encoder).
    #[error("failed to open video writer: {0}")]
    WriterOpen(String),

    /// A frame was written after the writer was released.
    #[error("video writer is already released")]
    WriterClosed,

    /// Invalid configuration values or configuration file.
    #[error("configuration error: {0}")]
    Config(String),

    /// Malformed inline directive in the input file.
    #[error("directive error: {0}")]
    Directive(String),

    /// Highlighting or rasterization failed.
    #[error("render error: {0}")]
    Render(String),

    /// The encoder failed while streaming or finalizing.
    #[error("encode error: {0}")]
    Encode(String),

    /// Probing or decoding an existing video failed.
    #[error("media error: {0}")]
    Media(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl CassetteError {
    /// Build a [`CassetteError::FileRead`] value.
    pub fn file_read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::FileRead {
            path: path.into(),
            source,
        }
    }

    /// Build a [`CassetteError::WriterOpen`] value.
    pub fn writer_open(msg: impl Into<String>) -> Self {
        Self::WriterOpen(msg.into())
    }

    /// Build a [`CassetteError::Config`] value.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Build a [`CassetteError::Directive`] value.
    pub fn directive(msg: impl Into<String>) -> Self {
        Self::Directive(msg.into())
    }

    /// Build a [`CassetteError::Render`] value.
    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }

    /// Build a [`CassetteError::Encode`] value.
    pub fn encode(msg: impl Into<String>) -> Self {
        Self::Encode(msg.into())
    }

    /// Build a [`CassetteError::Media`] value.
    pub fn media(msg: impl Into<String>) -> Self {
        Self::Media(msg.into())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
