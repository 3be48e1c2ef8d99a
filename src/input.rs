//! Opening a media input.
//!
//! [`MediaInput`] owns the FFmpeg demuxer context for a file, URL, or
//! capture device, together with the metadata read when it was opened.
//! Plain files are probed; capture devices need the demuxer forced by name
//! and usually a few device options:
//!
//! ```no_run
//! use rawdump::{InputOptions, MediaInput, RawDumpError};
//!
//! let options = InputOptions::new()
//!     .with_format("v4l2")
//!     .with_option("video_size", "1280x720");
//! let input = MediaInput::open_with_options("/dev/video0", &options)?;
//! for (key, value) in input.rejected_options() {
//!     eprintln!("device ignored {key}={value}");
//! }
//! # Ok::<(), RawDumpError>(())
//! ```

use std::{
    ffi::CString,
    fmt::{Debug, Formatter, Result as FmtResult},
    path::{Path, PathBuf},
    ptr,
};

use ffmpeg_next::{Dictionary, Error as FfmpegError, format::context::Input, media::Type};
use ffmpeg_sys_next::{AVFormatContext, AVInputFormat};

use crate::{
    configuration::InputOptions,
    error::RawDumpError,
    metadata::{InputMetadata, read_metadata},
};

/// An opened media input.
pub struct MediaInput {
    pub(crate) input_context: Input,
    metadata: InputMetadata,
    rejected_options: Vec<(String, String)>,
    path: PathBuf,
}

impl Debug for MediaInput {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("MediaInput")
            .field("path", &self.path)
            .field("metadata", &self.metadata)
            .field("rejected_options", &self.rejected_options)
            .finish_non_exhaustive()
    }
}

impl MediaInput {
    /// Open a file or URL, letting FFmpeg probe the format.
    ///
    /// # Errors
    ///
    /// Returns [`RawDumpError::InputOpen`] if the input cannot be opened or
    /// its stream information cannot be read.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, RawDumpError> {
        Self::open_with_options(path, &InputOptions::new())
    }

    /// Open an input with a forced demuxer and/or demuxer options.
    ///
    /// Options the demuxer does not consume are not an error; they are
    /// logged and kept in [`rejected_options`](MediaInput::rejected_options).
    ///
    /// # Errors
    ///
    /// - [`RawDumpError::UnknownInputFormat`] if `options.format` names no
    ///   registered demuxer or device.
    /// - [`RawDumpError::InputOpen`] if opening or stream probing fails.
    pub fn open_with_options<P: AsRef<Path>>(
        path: P,
        options: &InputOptions,
    ) -> Result<Self, RawDumpError> {
        let path = path.as_ref().to_path_buf();
        log::debug!("Opening media input: {}", path.display());

        // Also registers capture devices.
        ffmpeg_next::init().map_err(|error| RawDumpError::InputOpen {
            path: path.clone(),
            reason: format!("FFmpeg initialisation failed: {error}"),
        })?;

        let (input_context, rejected_options) = if options.is_plain() {
            let input_context =
                ffmpeg_next::format::input(&path).map_err(|error| RawDumpError::InputOpen {
                    path: path.clone(),
                    reason: error.to_string(),
                })?;
            (input_context, Vec::new())
        } else {
            open_with_demuxer(&path, options)?
        };

        for (key, value) in &rejected_options {
            log::warn!("Input option {key}={value} was not used by the demuxer");
        }

        let metadata = read_metadata(&input_context);

        log::info!(
            "Opened media input: {} (format={}, duration={:.2}s, streams={})",
            path.display(),
            metadata.format,
            metadata.duration.as_secs_f64(),
            metadata.streams.len(),
        );
        if let Some(video) = &metadata.video {
            log::debug!(
                "Best video stream: index={}, {}x{}, {:.2} fps, codec={}",
                video.stream_index,
                video.width,
                video.height,
                video.frames_per_second,
                video.codec,
            );
        }

        Ok(Self {
            input_context,
            metadata,
            rejected_options,
            path,
        })
    }

    /// Metadata read at open time.
    pub fn metadata(&self) -> &InputMetadata {
        &self.metadata
    }

    /// Options passed at open time that the demuxer did not recognise.
    pub fn rejected_options(&self) -> &[(String, String)] {
        &self.rejected_options
    }

    /// Path, URL, or device name this input was opened from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Index of the stream FFmpeg considers the best video stream.
    pub fn best_video_stream(&self) -> Option<usize> {
        self.input_context
            .streams()
            .best(Type::Video)
            .map(|stream| stream.index())
    }

    /// Print FFmpeg's description of the input (streams, codecs, durations)
    /// to stderr, through FFmpeg's logger at info level.
    pub fn dump_format(&self) {
        let url = self.path.to_string_lossy();
        ffmpeg_next::format::context::input::dump(&self.input_context, 0, Some(&url));
    }
}

fn open_with_demuxer(
    path: &Path,
    options: &InputOptions,
) -> Result<(Input, Vec<(String, String)>), RawDumpError> {
    let open_error = |reason: String| RawDumpError::InputOpen {
        path: path.to_path_buf(),
        reason,
    };

    let url = CString::new(path.to_string_lossy().as_bytes())
        .map_err(|_| open_error("path contains a NUL byte".to_string()))?;

    let input_format: *const AVInputFormat = match &options.format {
        Some(name) => {
            let format_name = CString::new(name.as_str())
                .map_err(|_| RawDumpError::UnknownInputFormat(name.clone()))?;
            let found = unsafe { ffmpeg_sys_next::av_find_input_format(format_name.as_ptr()) };
            if found.is_null() {
                return Err(RawDumpError::UnknownInputFormat(name.clone()));
            }
            log::debug!("Forcing input format: {name}");
            found
        }
        None => ptr::null(),
    };

    let mut dictionary = Dictionary::new();
    for (key, value) in &options.options {
        dictionary.set(key, value);
    }

    unsafe {
        let mut context: *mut AVFormatContext = ptr::null_mut();
        let mut raw_options = dictionary.disown();

        let status = ffmpeg_sys_next::avformat_open_input(
            &mut context,
            url.as_ptr(),
            input_format,
            &mut raw_options,
        );

        // Whatever is left in the dictionary was not consumed.
        let leftover = Dictionary::own(raw_options);
        let rejected = leftover
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();

        if status < 0 {
            return Err(open_error(FfmpegError::from(status).to_string()));
        }

        let status = ffmpeg_sys_next::avformat_find_stream_info(context, ptr::null_mut());
        if status < 0 {
            ffmpeg_sys_next::avformat_close_input(&mut context);
            return Err(open_error(format!(
                "could not find stream information: {}",
                FfmpegError::from(status)
            )));
        }

        Ok((Input::wrap(context), rejected))
    }
}
