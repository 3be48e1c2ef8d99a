//! Decoding a video stream into a raw video file.
//!
//! [`FrameDumper`] is the read → decode → pack → write loop. Setup picks
//! the video stream, finds and opens its decoder, and sizes a packed
//! [`RawFrameBuffer`] from the decoder's width, height, and pixel format.
//! [`FrameDumper::run`] then pulls packets from the demuxer, feeds the
//! selected stream's packets to the decoder, and writes every decoded frame
//! to the output. Once reading stops the decoder is drained so frames it
//! still holds (reordering delay) are written too.
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//!
//! use rawdump::{DumpOptions, MediaInput, RawDumpError};
//!
//! let mut input = MediaInput::open("input.mp4")?;
//! let options = DumpOptions::new().with_packet_limit(None);
//! let summary = rawdump::dump_to_file(&mut input, Path::new("out.yuv"), &options, true)?;
//! println!("{}", summary.geometry.playback_command(Path::new("out.yuv")));
//! # Ok::<(), RawDumpError>(())
//! ```

use std::{
    fs::{File, OpenOptions},
    io::{BufWriter, Write},
    path::Path,
    thread,
    time::Duration,
};

use ffmpeg_next::{
    Error as FfmpegError, Packet, Rational,
    codec::context::Context as CodecContext,
    decoder::Video as VideoDecoder,
    frame::Video as VideoFrame,
    media::Type,
    util::error::EAGAIN,
};

use crate::{
    configuration::DumpOptions,
    error::RawDumpError,
    input::MediaInput,
    progress::ProgressTracker,
    raw_frame::{RawFrameBuffer, RawVideoGeometry},
};

/// Wait before retrying a read on a source with no packet ready.
pub(crate) const RETRY_DELAY: Duration = Duration::from_millis(10);

/// Outcome of a completed dump.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DumpSummary {
    /// Frames written to the output, cached ones included.
    pub frames_written: u64,
    /// Frames that only came out of the decoder while flushing it.
    pub cached_frames: u64,
    /// Packets read from the input, across all streams.
    pub packets_read: u64,
    /// Bytes written to the output.
    pub bytes_written: u64,
    /// Geometry of every written frame.
    pub geometry: RawVideoGeometry,
}

/// Decodes one video stream of a [`MediaInput`] into packed raw frames.
pub struct FrameDumper<'a> {
    input: &'a mut MediaInput,
    decoder: VideoDecoder,
    stream_index: usize,
    time_base: Rational,
    buffer: RawFrameBuffer,
    options: DumpOptions,
}

struct RunState {
    frames_written: u64,
    cached_frames: u64,
    packets_read: u64,
    bytes_written: u64,
    tracker: ProgressTracker,
}

impl<'a> FrameDumper<'a> {
    /// Select the video stream, open its decoder, and allocate the packed
    /// frame buffer.
    ///
    /// # Errors
    ///
    /// - [`RawDumpError::NoVideoStream`] if the input has no video stream,
    ///   or the stream chosen in `options` does not exist or is not video.
    /// - [`RawDumpError::DecoderNotFound`] if FFmpeg has no decoder for the
    ///   stream's codec.
    /// - [`RawDumpError::DecoderOpen`] if the decoder fails to open.
    /// - [`RawDumpError::BufferAllocation`] if the decoder reports a geometry
    ///   FFmpeg cannot size.
    pub fn new(input: &'a mut MediaInput, options: &DumpOptions) -> Result<Self, RawDumpError> {
        let (stream_index, time_base, decoder) = open_video_decoder(input, options.stream_index)?;

        let geometry = RawVideoGeometry {
            width: decoder.width(),
            height: decoder.height(),
            pixel_format: decoder.format(),
        };
        let buffer = RawFrameBuffer::allocate(geometry)?;

        Ok(Self {
            input,
            decoder,
            stream_index,
            time_base,
            buffer,
            options: options.clone(),
        })
    }

    /// Geometry of the frames this dumper writes.
    pub fn geometry(&self) -> RawVideoGeometry {
        self.buffer.geometry()
    }

    /// Index of the stream being decoded.
    pub fn stream_index(&self) -> usize {
        self.stream_index
    }

    /// Read, decode, and write until the input ends or a limit is reached,
    /// then flush the decoder.
    ///
    /// Every packet read counts towards the packet limit, whatever stream
    /// it belongs to. Each frame is written as exactly
    /// [`RawVideoGeometry::frame_size`] bytes.
    ///
    /// # Errors
    ///
    /// - [`RawDumpError::Cancelled`] if the cancellation token fires.
    /// - [`RawDumpError::VideoDecodeError`] if the decoder rejects a packet.
    /// - [`RawDumpError::GeometryChanged`] if a frame's geometry differs
    ///   from the first one.
    /// - [`RawDumpError::IoError`] if writing fails.
    pub fn run<W: Write>(mut self, writer: &mut W) -> Result<DumpSummary, RawDumpError> {
        let mut state = RunState {
            frames_written: 0,
            cached_frames: 0,
            packets_read: 0,
            bytes_written: 0,
            tracker: ProgressTracker::new(
                self.options.progress.clone(),
                self.options.packet_limit,
                self.options.batch_size,
            ),
        };
        let mut decoded = VideoFrame::empty();

        loop {
            if self.options.is_cancelled() {
                log::debug!("Dump cancelled after {} packets", state.packets_read);
                return Err(RawDumpError::Cancelled);
            }
            if self
                .options
                .packet_limit
                .is_some_and(|limit| state.packets_read >= limit)
            {
                log::debug!("Packet limit reached ({} packets)", state.packets_read);
                break;
            }
            if self.frame_limit_reached(&state) {
                break;
            }

            let mut packet = Packet::empty();
            match packet.read(&mut self.input.input_context) {
                Ok(()) => {}
                Err(FfmpegError::Eof) => break,
                // Live devices have nothing ready yet.
                Err(FfmpegError::Other { errno }) if errno == EAGAIN => {
                    thread::sleep(RETRY_DELAY);
                    continue;
                }
                Err(error) => return Err(error.into()),
            }
            state.packets_read += 1;

            if packet.stream() != self.stream_index {
                continue;
            }

            self.decoder
                .send_packet(&packet)
                .map_err(|error| RawDumpError::VideoDecodeError(error.to_string()))?;
            self.receive_frames(writer, &mut decoded, &mut state, false)?;
        }

        if !self.frame_limit_reached(&state) {
            self.decoder
                .send_eof()
                .map_err(|error| RawDumpError::VideoDecodeError(error.to_string()))?;
            self.receive_frames(writer, &mut decoded, &mut state, true)?;
        }

        state.tracker.finish(state.frames_written, state.packets_read);

        let summary = DumpSummary {
            frames_written: state.frames_written,
            cached_frames: state.cached_frames,
            packets_read: state.packets_read,
            bytes_written: state.bytes_written,
            geometry: self.geometry(),
        };
        log::debug!("Dump finished: {summary:?}");
        Ok(summary)
    }

    /// Create `output` and [`run`](FrameDumper::run) into it through a
    /// buffered writer.
    ///
    /// # Errors
    ///
    /// Everything [`FrameDumper::run`] returns, plus
    /// [`RawDumpError::OutputOpen`] if `output` cannot be created or already
    /// exists while `overwrite` is `false`.
    pub fn write_to_file(self, output: &Path, overwrite: bool) -> Result<DumpSummary, RawDumpError> {
        let file = if overwrite {
            File::create(output)
        } else {
            OpenOptions::new().write(true).create_new(true).open(output)
        }
        .map_err(|error| RawDumpError::OutputOpen {
            path: output.to_path_buf(),
            reason: error.to_string(),
        })?;

        log::debug!(
            "Writing {} raw video to {}",
            self.geometry(),
            output.display()
        );

        let mut writer = BufWriter::new(file);
        let summary = self.run(&mut writer)?;
        writer.flush()?;
        Ok(summary)
    }

    fn frame_limit_reached(&self, state: &RunState) -> bool {
        self.options
            .frame_limit
            .is_some_and(|limit| state.frames_written >= limit)
    }

    fn receive_frames<W: Write>(
        &mut self,
        writer: &mut W,
        decoded: &mut VideoFrame,
        state: &mut RunState,
        cached: bool,
    ) -> Result<(), RawDumpError> {
        while !self.frame_limit_reached(state) {
            match self.decoder.receive_frame(decoded) {
                Ok(()) => self.write_frame(writer, decoded, state, cached)?,
                Err(FfmpegError::Eof) => break,
                Err(FfmpegError::Other { errno }) if errno == EAGAIN => break,
                Err(error) => return Err(RawDumpError::VideoDecodeError(error.to_string())),
            }
        }
        Ok(())
    }

    fn write_frame<W: Write>(
        &mut self,
        writer: &mut W,
        decoded: &VideoFrame,
        state: &mut RunState,
        cached: bool,
    ) -> Result<(), RawDumpError> {
        self.buffer.copy_from(decoded)?;
        writer.write_all(self.buffer.as_bytes())?;

        let seconds = decoded
            .timestamp()
            .or_else(|| decoded.pts())
            .map(|pts| pts_to_seconds(pts, self.time_base));
        log::info!(
            "video_frame{} n:{} pts:{}",
            if cached { "(cached)" } else { "" },
            state.frames_written,
            seconds.map_or_else(|| "NOPTS".to_string(), |value| format!("{value:.6}")),
        );

        state.frames_written += 1;
        state.bytes_written += self.buffer.len() as u64;
        if cached {
            state.cached_frames += 1;
        }
        state.tracker.frame_written(
            state.frames_written,
            state.packets_read,
            seconds
                .filter(|value| value.is_finite() && *value >= 0.0)
                .map(Duration::from_secs_f64),
        );
        Ok(())
    }
}

/// Find the video stream (`requested` or FFmpeg's best) and open a
/// decoder for it. Returns the stream index, its time base, and the decoder.
pub(crate) fn open_video_decoder(
    input: &MediaInput,
    requested: Option<usize>,
) -> Result<(usize, Rational, VideoDecoder), RawDumpError> {
    let stream_index = match requested {
        Some(index) => index,
        None => input
            .best_video_stream()
            .ok_or(RawDumpError::NoVideoStream)?,
    };

    let stream = input
        .input_context
        .stream(stream_index)
        .ok_or(RawDumpError::NoVideoStream)?;
    let parameters = stream.parameters();
    if parameters.medium() != Type::Video {
        return Err(RawDumpError::NoVideoStream);
    }

    let codec_id = parameters.id();
    let codec = ffmpeg_next::decoder::find(codec_id)
        .ok_or_else(|| RawDumpError::DecoderNotFound(codec_id.name().to_string()))?;
    log::debug!(
        "Video stream {stream_index}: decoder {} ({})",
        codec.name(),
        codec.description()
    );

    let decoder = CodecContext::from_parameters(parameters)
        .and_then(|context| context.decoder().open_as(codec))
        .and_then(|opened| opened.video())
        .map_err(|error| RawDumpError::DecoderOpen(error.to_string()))?;

    Ok((stream_index, stream.time_base(), decoder))
}

fn pts_to_seconds(pts: i64, time_base: Rational) -> f64 {
    pts as f64 * f64::from(time_base.numerator()) / f64::from(time_base.denominator().max(1))
}

/// Dump the video of `input` into a new raw video file at `output`.
///
/// The decoder is opened before the file is created, so a missing stream
/// or decoder leaves no empty output behind.
///
/// # Errors
///
/// Everything [`FrameDumper::new`] and [`FrameDumper::write_to_file`]
/// return.
pub fn dump_to_file(
    input: &mut MediaInput,
    output: &Path,
    options: &DumpOptions,
    overwrite: bool,
) -> Result<DumpSummary, RawDumpError> {
    FrameDumper::new(input, options)?.write_to_file(output, overwrite)
}
