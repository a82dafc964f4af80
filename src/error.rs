//! Error taxonomy for the import pipeline

use std::path::PathBuf;

use thiserror::Error;

/// Terminal failure of a single import request.
///
/// Errors travel inside [`crate::reader::ImageReadResult`] through the normal
/// completion path; they never cross the worker boundary as panics and never
/// abort the worker loop.
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("image does not exist: {0}")]
    MissingFile(PathBuf),

    #[error("image i/o error: {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("image file size {size} exceeds the {limit} byte limit: {path}")]
    OversizeFile { path: PathBuf, size: u64, limit: u64 },

    /// No codec claimed the buffer.
    #[error("unrecognized or unsupported image format")]
    UnsupportedFormat,

    /// A codec claimed the buffer but its bit depth or channel layout is
    /// outside the supported set.
    #[error("{format} file contains data in an unsupported layout: {detail}")]
    UnsupportedLayout {
        format: &'static str,
        detail: String,
    },

    /// A codec claimed the buffer and then failed mid-decode.
    #[error("failed to decode {format}: {reason}")]
    DecodeFailed {
        format: &'static str,
        reason: String,
    },

    #[error("texture resolution is not supported: {width} x {height}")]
    ResolutionRejected { width: u32, height: u32 },

    /// Reported by an external artifact builder, surfaced unchanged.
    #[error("failed to create resource: {0}")]
    ResourceCreation(String),
}

impl ImportError {
    pub(crate) fn decode_failed(format: &'static str, err: impl std::fmt::Display) -> Self {
        ImportError::DecodeFailed {
            format,
            reason: err.to_string(),
        }
    }

    pub(crate) fn io(path: &std::path::Path, source: std::io::Error) -> Self {
        ImportError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}
