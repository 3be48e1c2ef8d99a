//! Input metadata.
//!
//! [`InputMetadata`] is read once when a [`MediaInput`](crate::MediaInput)
//! is opened: container format, duration, one [`StreamMetadata`] per
//! stream, and a [`VideoMetadata`] for the stream FFmpeg ranks as the best
//! video stream.

use std::time::Duration;

use ffmpeg_next::{
    Rational, codec::context::Context as CodecContext, format::context::Input, media::Type,
};

/// Container-level description of an opened input.
#[derive(Debug, Clone)]
#[must_use]
pub struct InputMetadata {
    /// Demuxer name (e.g. `"mov,mp4,m4a,3gp,3g2,mj2"`, `"yuv4mpegpipe"`,
    /// `"avfoundation"`).
    pub format: String,
    /// Container duration. Zero for live sources and unknown durations.
    pub duration: Duration,
    /// Overall bit rate in bits per second, `0` if unknown.
    pub bit_rate: i64,
    /// Every stream of the input, in stream-index order.
    pub streams: Vec<StreamMetadata>,
    /// The best video stream, if the input has one.
    pub video: Option<VideoMetadata>,
}

/// One elementary stream.
#[derive(Debug, Clone)]
pub struct StreamMetadata {
    /// Stream index within the container.
    pub index: usize,
    /// Media type name: `video`, `audio`, `subtitle`, `data`, `attachment`,
    /// or `unknown`.
    pub medium: &'static str,
    /// Codec name (e.g. `"h264"`, `"rawvideo"`, `"pcm_s16le"`).
    pub codec: String,
    /// Time base of the stream's timestamps.
    pub time_base: Rational,
}

/// The video stream that will be decoded by default.
#[derive(Debug, Clone)]
pub struct VideoMetadata {
    /// Stream index within the container.
    pub stream_index: usize,
    /// Coded width in pixels.
    pub width: u32,
    /// Coded height in pixels.
    pub height: u32,
    /// Decoder output pixel format name, `None` if no decoder is available
    /// or the format is not known before decoding.
    pub pixel_format: Option<String>,
    /// Average frame rate, `0.0` when the container does not say.
    pub frames_per_second: f64,
    /// Codec name.
    pub codec: String,
}

pub(crate) fn media_type_name(medium: Type) -> &'static str {
    match medium {
        Type::Video => "video",
        Type::Audio => "audio",
        Type::Subtitle => "subtitle",
        Type::Data => "data",
        Type::Attachment => "attachment",
        Type::Unknown => "unknown",
    }
}

pub(crate) fn read_metadata(input_context: &Input) -> InputMetadata {
    let duration_microseconds = input_context.duration();
    let duration = if duration_microseconds > 0 {
        Duration::from_micros(duration_microseconds as u64)
    } else {
        Duration::ZERO
    };

    let streams = input_context
        .streams()
        .map(|stream| {
            let parameters = stream.parameters();
            StreamMetadata {
                index: stream.index(),
                medium: media_type_name(parameters.medium()),
                codec: parameters.id().name().to_string(),
                time_base: stream.time_base(),
            }
        })
        .collect();

    let video = input_context
        .streams()
        .best(Type::Video)
        .map(|stream| {
            let frame_rate = stream.avg_frame_rate();
            let frames_per_second = if frame_rate.denominator() != 0 {
                f64::from(frame_rate)
            } else {
                let rate = stream.rate();
                if rate.denominator() != 0 { f64::from(rate) } else { 0.0 }
            };

            let codec = stream.parameters().id().name().to_string();
            let (width, height, pixel_format) = CodecContext::from_parameters(stream.parameters())
                .and_then(|context| context.decoder().video())
                .map(|decoder| {
                    let name = decoder
                        .format()
                        .descriptor()
                        .map(|descriptor| descriptor.name().to_string());
                    (decoder.width(), decoder.height(), name)
                })
                .unwrap_or_else(|error| {
                    log::debug!("No decoder for {codec}: {error}");
                    let raw = unsafe { *stream.parameters().as_ptr() };
                    (raw.width.max(0) as u32, raw.height.max(0) as u32, None)
                });

            VideoMetadata {
                stream_index: stream.index(),
                width,
                height,
                pixel_format,
                frames_per_second,
                codec,
            }
        });

    InputMetadata {
        format: input_context.format().name().to_string(),
        duration,
        bit_rate: input_context.bit_rate(),
        streams,
        video,
    }
}
