//! Input and dump configuration.
//!
//! [`InputOptions`] describes how the input is opened (a forced demuxer or
//! capture device plus `KEY=VALUE` options handed to it). [`DumpOptions`]
//! threads limits, stream selection, progress callbacks, and cancellation
//! through [`FrameDumper`](crate::FrameDumper) without growing its
//! signature.
//!
//! # Example
//!
//! ```no_run
//! use rawdump::{DumpOptions, InputOptions};
//!
//! // A webcam on macOS, opened the way `ffmpeg -f avfoundation` would.
//! let input = InputOptions::new()
//!     .with_format("avfoundation")
//!     .with_option("pixel_format", "uyvy422")
//!     .with_option("framerate", "30.000030")
//!     .with_option("video_size", "1280x720");
//!
//! // Read the whole input instead of the first few packets.
//! let dump = DumpOptions::new().with_packet_limit(None);
//! ```

use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::sync::Arc;

use crate::error::RawDumpError;
use crate::progress::{CancellationToken, NoOpProgress, ProgressCallback};

/// Number of demuxed packets read before the dump loop stops by default.
pub const DEFAULT_PACKET_LIMIT: u64 = 6;

/// How to open a media input.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InputOptions {
    /// Demuxer or device name (`avfoundation`, `v4l2`, `dshow`, ...).
    /// `None` lets FFmpeg probe the input.
    pub format: Option<String>,
    /// Options passed to the demuxer when opening, in insertion order.
    pub options: Vec<(String, String)>,
}

impl InputOptions {
    /// Probe the format, no options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Force a specific demuxer or capture device.
    #[must_use]
    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }

    /// Add a demuxer option. A repeated key replaces the earlier value.
    #[must_use]
    pub fn with_option(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let key = key.into();
        let value = value.into();
        match self.options.iter_mut().find(|(existing, _)| *existing == key) {
            Some(entry) => entry.1 = value,
            None => self.options.push((key, value)),
        }
        self
    }

    /// Parse and add a `KEY=VALUE` demuxer option.
    ///
    /// # Errors
    ///
    /// Returns [`RawDumpError::InvalidOption`] if `text` has no `=` or an
    /// empty key.
    pub fn with_option_str(self, text: &str) -> Result<Self, RawDumpError> {
        let (key, value) = parse_option(text)?;
        Ok(self.with_option(key, value))
    }

    /// `true` when the input can be opened with plain probing.
    pub(crate) fn is_plain(&self) -> bool {
        self.format.is_none() && self.options.is_empty()
    }
}

/// Split `KEY=VALUE` into its parts. The value may be empty or contain `=`.
///
/// # Errors
///
/// Returns [`RawDumpError::InvalidOption`] if there is no `=` or the key is
/// empty.
pub fn parse_option(text: &str) -> Result<(String, String), RawDumpError> {
    let (key, value) = text
        .split_once('=')
        .ok_or_else(|| RawDumpError::InvalidOption(text.to_string()))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(RawDumpError::InvalidOption(text.to_string()));
    }
    Ok((key.to_string(), value.trim().to_string()))
}

/// Settings for a [`FrameDumper`](crate::FrameDumper) run.
///
/// Defaults: stop after [`DEFAULT_PACKET_LIMIT`] packets, no frame limit,
/// FFmpeg's best video stream, no progress callback, no cancellation.
#[derive(Clone)]
pub struct DumpOptions {
    pub(crate) packet_limit: Option<u64>,
    pub(crate) frame_limit: Option<u64>,
    pub(crate) stream_index: Option<usize>,
    pub(crate) progress: Arc<dyn ProgressCallback>,
    pub(crate) cancellation: Option<CancellationToken>,
    pub(crate) batch_size: u64,
}

impl Debug for DumpOptions {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("DumpOptions")
            .field("packet_limit", &self.packet_limit)
            .field("frame_limit", &self.frame_limit)
            .field("stream_index", &self.stream_index)
            .field("has_cancellation", &self.cancellation.is_some())
            .field("batch_size", &self.batch_size)
            .finish_non_exhaustive()
    }
}

impl Default for DumpOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl DumpOptions {
    /// Default settings.
    pub fn new() -> Self {
        Self {
            packet_limit: Some(DEFAULT_PACKET_LIMIT),
            frame_limit: None,
            stream_index: None,
            progress: Arc::new(NoOpProgress),
            cancellation: None,
            batch_size: 1,
        }
    }

    /// Stop reading after `limit` demuxed packets (of any stream).
    /// `None` reads until the end of the input.
    #[must_use]
    pub fn with_packet_limit(mut self, limit: Option<u64>) -> Self {
        self.packet_limit = limit;
        self
    }

    /// Stop after `limit` frames have been written. `None` means no limit.
    #[must_use]
    pub fn with_frame_limit(mut self, limit: Option<u64>) -> Self {
        self.frame_limit = limit;
        self
    }

    /// Decode this stream instead of FFmpeg's best video stream.
    #[must_use]
    pub fn with_stream_index(mut self, index: usize) -> Self {
        self.stream_index = Some(index);
        self
    }

    /// Attach a progress callback.
    #[must_use]
    pub fn with_progress(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress = callback;
        self
    }

    /// Attach a cancellation token, checked before every packet.
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    /// Report progress every `size` frames (minimum 1).
    #[must_use]
    pub fn with_batch_size(mut self, size: u64) -> Self {
        self.batch_size = size.max(1);
        self
    }

    pub(crate) fn is_cancelled(&self) -> bool {
        self.cancellation
            .as_ref()
            .is_some_and(|token| token.is_cancelled())
    }
}
