//! Error types for the `rawdump` crate.
//!
//! [`RawDumpError`] is the single error type returned by every fallible
//! operation. Each setup step of the dump (open input, find stream, open
//! decoder, size the buffer, create the output) has its own variant so a
//! caller can tell exactly where the pipeline stopped.

use std::{io::Error as IoError, path::PathBuf};

use ffmpeg_next::Error as FfmpegError;
use image::ImageError;
use thiserror::Error;

use crate::raw_frame::RawVideoGeometry;

/// The unified error type for all `rawdump` operations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum RawDumpError {
    /// The media input could not be opened or its streams could not be read.
    #[error("Could not open source {path}: {reason}")]
    InputOpen {
        /// Path or device name that was passed to [`crate::MediaInput::open`].
        path: PathBuf,
        /// Underlying reason the open failed.
        reason: String,
    },

    /// A forced input format or device name is not known to FFmpeg.
    #[error("Unknown input format: {0}")]
    UnknownInputFormat(String),

    /// The input has no (usable) video stream.
    #[error("Could not find video stream in the input")]
    NoVideoStream,

    /// No decoder is registered for the stream's codec.
    #[error("Failed to find video decoder for codec {0}")]
    DecoderNotFound(String),

    /// The decoder was found but could not be opened.
    #[error("Failed to open video decoder: {0}")]
    DecoderOpen(String),

    /// The destination file could not be created.
    #[error("Could not open destination file {path}: {reason}")]
    OutputOpen {
        /// Requested output path.
        path: PathBuf,
        /// Underlying reason the create failed.
        reason: String,
    },

    /// The packed frame buffer could not be sized or allocated.
    #[error("Could not allocate raw video buffer: {0}")]
    BufferAllocation(String),

    /// A decoded frame does not match the geometry of the raw video output.
    #[error(
        "Width, height and pixel format have to be constant in a rawvideo file, \
         but the input video changed: old {expected}, new {actual}"
    )]
    GeometryChanged {
        /// Geometry the output was sized for.
        expected: RawVideoGeometry,
        /// Geometry of the offending frame.
        actual: RawVideoGeometry,
    },

    /// Decoding a video packet failed.
    #[error("Error decoding video frame: {0}")]
    VideoDecodeError(String),

    /// A demuxer option was not of the form `KEY=VALUE`.
    #[error("Invalid input option {0:?} (expected KEY=VALUE)")]
    InvalidOption(String),

    /// Any other error reported by the FFmpeg libraries.
    #[error("FFmpeg error: {0}")]
    FfmpegError(String),

    /// An I/O error occurred while writing output.
    #[error("I/O error: {0}")]
    IoError(#[from] IoError),

    /// An error from the `image` crate while building a snapshot.
    #[error("Image processing error: {0}")]
    ImageError(#[from] ImageError),

    /// The operation was cancelled via a [`CancellationToken`](crate::CancellationToken).
    #[error("Operation cancelled")]
    Cancelled,
}

impl From<FfmpegError> for RawDumpError {
    fn from(error: FfmpegError) -> Self {
        RawDumpError::FfmpegError(error.to_string())
    }
}
