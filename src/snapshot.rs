//! Single-frame snapshots as RGB images.
//!
//! The raw dump keeps frames in the decoder's native pixel format, which
//! most image viewers cannot open. A snapshot decodes one frame, converts
//! it to RGB24 with swscale, and returns it as an [`image::DynamicImage`]
//! that can be saved as PNG, JPEG, PPM, and so on.
//!
//! ```no_run
//! use rawdump::{MediaInput, RawDumpError};
//!
//! let mut input = MediaInput::open("input.mp4")?;
//! // Skip a few frames so a camera has time to settle its exposure.
//! let image = rawdump::capture_snapshot(&mut input, 3)?;
//! image.save("snapshot.png")?;
//! # Ok::<(), RawDumpError>(())
//! ```

use std::thread;

use ffmpeg_next::{
    Error as FfmpegError, Packet,
    decoder::Video as VideoDecoder,
    format::Pixel,
    frame::Video as VideoFrame,
    software::scaling::{Context as ScalingContext, Flags as ScalingFlags},
    util::error::EAGAIN,
};
use image::{DynamicImage, RgbImage};

use crate::{
    dump::{RETRY_DELAY, open_video_decoder},
    error::RawDumpError,
    input::MediaInput,
};

/// Decode the best video stream of `input`, skip `skip_frames` frames, and
/// return the next one as an RGB image.
///
/// # Errors
///
/// - [`RawDumpError::NoVideoStream`], [`RawDumpError::DecoderNotFound`], or
///   [`RawDumpError::DecoderOpen`] as for [`FrameDumper::new`](crate::FrameDumper::new).
/// - [`RawDumpError::VideoDecodeError`] if decoding fails or the stream
///   ends before the requested frame.
pub fn capture_snapshot(
    input: &mut MediaInput,
    skip_frames: u64,
) -> Result<DynamicImage, RawDumpError> {
    let (stream_index, _, mut decoder) = open_video_decoder(input, None)?;

    let mut decoded = VideoFrame::empty();
    let mut remaining = skip_frames;

    loop {
        let mut packet = Packet::empty();
        match packet.read(&mut input.input_context) {
            Ok(()) => {}
            Err(FfmpegError::Eof) => break,
            Err(FfmpegError::Other { errno }) if errno == EAGAIN => {
                thread::sleep(RETRY_DELAY);
                continue;
            }
            Err(error) => return Err(error.into()),
        }
        if packet.stream() != stream_index {
            continue;
        }

        decoder
            .send_packet(&packet)
            .map_err(|error| RawDumpError::VideoDecodeError(error.to_string()))?;
        if next_wanted_frame(&mut decoder, &mut decoded, &mut remaining)? {
            return frame_to_image(&decoded);
        }
    }

    decoder
        .send_eof()
        .map_err(|error| RawDumpError::VideoDecodeError(error.to_string()))?;
    if next_wanted_frame(&mut decoder, &mut decoded, &mut remaining)? {
        return frame_to_image(&decoded);
    }

    Err(RawDumpError::VideoDecodeError(format!(
        "stream ended before frame {skip_frames}"
    )))
}

/// Drain decoded frames, counting down `remaining`. Returns `true` with the
/// wanted frame in `decoded` once the count is exhausted.
fn next_wanted_frame(
    decoder: &mut VideoDecoder,
    decoded: &mut VideoFrame,
    remaining: &mut u64,
) -> Result<bool, RawDumpError> {
    loop {
        match decoder.receive_frame(decoded) {
            Ok(()) if *remaining == 0 => return Ok(true),
            Ok(()) => *remaining -= 1,
            Err(FfmpegError::Eof) => return Ok(false),
            Err(FfmpegError::Other { errno }) if errno == EAGAIN => return Ok(false),
            Err(error) => return Err(RawDumpError::VideoDecodeError(error.to_string())),
        }
    }
}

/// Convert a decoded frame of any pixel format to an RGB image of the same
/// size.
pub fn frame_to_image(frame: &VideoFrame) -> Result<DynamicImage, RawDumpError> {
    let width = frame.width();
    let height = frame.height();

    let mut scaler = ScalingContext::get(
        frame.format(),
        width,
        height,
        Pixel::RGB24,
        width,
        height,
        ScalingFlags::BILINEAR,
    )?;
    let mut rgb_frame = VideoFrame::empty();
    scaler.run(frame, &mut rgb_frame)?;

    // swscale pads rows; the image wants them tight.
    let row_bytes = width as usize * 3;
    let stride = rgb_frame.stride(0);
    let data = rgb_frame.data(0);
    let mut buffer = Vec::with_capacity(row_bytes * height as usize);
    for row in 0..height as usize {
        let start = row * stride;
        buffer.extend_from_slice(&data[start..start + row_bytes]);
    }

    let image = RgbImage::from_raw(width, height, buffer).ok_or_else(|| {
        RawDumpError::VideoDecodeError("RGB buffer does not match frame size".to_string())
    })?;
    Ok(DynamicImage::ImageRgb8(image))
}
