use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while opening a recording or reading frames from it.
///
/// Decoder failures are carried through unchanged so callers see the
/// underlying library's message.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum RecordingError {
    #[error("unsupported file format '{extension}' for {path}")]
    UnsupportedFormat { path: PathBuf, extension: String },

    #[error("unsupported header format for {0}")]
    UnsupportedHeaderFormat(PathBuf),

    #[error("header is missing mandatory field '{0}'")]
    MissingMetadataField(String),

    #[error("malformed header {path}: {reason}")]
    MalformedHeader { path: PathBuf, reason: String },

    #[error("frame {index} is out of range (recording has {frame_count} frames)")]
    FrameIndexOutOfRange { index: usize, frame_count: usize },

    #[error("unsupported channel '{0}', expected one of R, G, B, Y or RAW")]
    UnsupportedChannel(String),

    #[error("failed to probe {path}: {reason}")]
    ProbeFailed { path: PathBuf, reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Image(#[from] image::ImageError),

    #[error(transparent)]
    Tiff(#[from] tiff::TiffError),

    #[error(transparent)]
    Ffmpeg(#[from] ffmpeg_next::Error),

    #[error("decoded pixel buffer does not match frame geometry: {0}")]
    Shape(#[from] ndarray::ShapeError),
}

impl RecordingError {
    pub(crate) fn malformed(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::MalformedHeader {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn probe_failed(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::ProbeFailed {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

pub type RecordingResult<T> = Result<T, RecordingError>;
