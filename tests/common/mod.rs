//! Fixture generation shared by the integration tests.
//!
//! Fixtures are written into a temporary directory at test time instead of
//! being checked in. YUV4MPEG2 carries uncompressed yuv420p frames, so the
//! bytes a correct dump produces are known exactly: the frame payloads
//! concatenated.

#![allow(dead_code)]

use std::path::{Path, PathBuf};

use ffmpeg_next::{
    Packet, Rational,
    codec::{Id, context::Context as CodecContext},
    format::{Flags as FormatFlags, Pixel},
    frame::Video as VideoFrame,
};

/// Bytes of one packed yuv420p frame.
pub fn yuv420p_frame_size(width: u32, height: u32) -> usize {
    let luma = (width * height) as usize;
    let chroma = (width.div_ceil(2) * height.div_ceil(2)) as usize;
    luma + 2 * chroma
}

/// Payload of frame `index`: every byte distinct enough to catch reordering
/// or row padding leaking into the output.
pub fn frame_payload(width: u32, height: u32, index: usize) -> Vec<u8> {
    (0..yuv420p_frame_size(width, height))
        .map(|offset| ((offset * 3 + index * 29) % 251) as u8)
        .collect()
}

/// Write a 25 fps yuv420p `.y4m` file with `frames` frames built by
/// `payload`.
pub fn write_y4m_with<F>(
    directory: &Path,
    name: &str,
    width: u32,
    height: u32,
    frames: usize,
    payload: F,
) -> PathBuf
where
    F: Fn(usize) -> Vec<u8>,
{
    let mut bytes = format!("YUV4MPEG2 W{width} H{height} F25:1 Ip A1:1 C420jpeg\n").into_bytes();
    for index in 0..frames {
        bytes.extend_from_slice(b"FRAME\n");
        bytes.extend_from_slice(&payload(index));
    }
    let path = directory.join(name);
    std::fs::write(&path, bytes).expect("Failed to write y4m fixture");
    path
}

/// Write a `.y4m` fixture using [`frame_payload`].
pub fn write_y4m(directory: &Path, width: u32, height: u32, frames: usize) -> PathBuf {
    write_y4m_with(directory, "sample.y4m", width, height, frames, |index| {
        frame_payload(width, height, index)
    })
}

/// Expected raw dump of the first `frames` frames of [`write_y4m`].
pub fn expected_dump(width: u32, height: u32, frames: usize) -> Vec<u8> {
    (0..frames)
        .flat_map(|index| frame_payload(width, height, index))
        .collect()
}

/// Write a short mono 16-bit PCM `.wav` file (no video stream).
pub fn write_wav(directory: &Path) -> PathBuf {
    write_wav_named(directory, "audio_only.wav", 8_000 / 10)
}

/// Write a mono 16-bit PCM `.wav` file of `sample_count` samples at 8 kHz.
pub fn write_wav_named(directory: &Path, name: &str, sample_count: u32) -> PathBuf {
    let sample_rate: u32 = 8_000;
    let samples: Vec<i16> = (0..sample_count)
        .map(|n| ((n % 40) as i16 - 20) * 500)
        .collect();
    let data_len = (samples.len() * 2) as u32;

    let mut bytes = Vec::with_capacity(44 + data_len as usize);
    bytes.extend_from_slice(b"RIFF");
    bytes.extend_from_slice(&(36 + data_len).to_le_bytes());
    bytes.extend_from_slice(b"WAVE");
    bytes.extend_from_slice(b"fmt ");
    bytes.extend_from_slice(&16u32.to_le_bytes());
    bytes.extend_from_slice(&1u16.to_le_bytes()); // PCM
    bytes.extend_from_slice(&1u16.to_le_bytes()); // mono
    bytes.extend_from_slice(&sample_rate.to_le_bytes());
    bytes.extend_from_slice(&(sample_rate * 2).to_le_bytes());
    bytes.extend_from_slice(&2u16.to_le_bytes());
    bytes.extend_from_slice(&16u16.to_le_bytes());
    bytes.extend_from_slice(b"data");
    bytes.extend_from_slice(&data_len.to_le_bytes());
    for sample in samples {
        bytes.extend_from_slice(&sample.to_le_bytes());
    }

    let path = directory.join(name);
    std::fs::write(&path, bytes).expect("Failed to write wav fixture");
    path
}

/// Mux a 16x16 [`write_y4m`] video (`frames` frames, stream 0) and a PCM
/// track of `audio_samples` samples (stream 1) into one `.nut` file.
///
/// Packets are written in timestamp order, so the two streams interleave.
pub fn write_video_with_audio(directory: &Path, frames: usize, audio_samples: u32) -> PathBuf {
    let video = write_y4m(directory, 16, 16, frames);
    let audio = write_wav_named(directory, "track.wav", audio_samples);
    let path = directory.join("mixed.nut");

    let mut inputs = [
        ffmpeg_next::format::input(&video).expect("Failed to open y4m fixture"),
        ffmpeg_next::format::input(&audio).expect("Failed to open wav fixture"),
    ];
    let mut output = ffmpeg_next::format::output(&path).expect("Failed to create nut output");

    for (index, input) in inputs.iter().enumerate() {
        let source = input.stream(0).expect("Fixture has no stream");
        let mut stream = output
            .add_stream(ffmpeg_next::encoder::find(Id::None))
            .expect("Failed to add stream");
        stream.set_parameters(source.parameters());
        stream.set_time_base(source.time_base());
        // rawvideo needs its pixel format spelled out as a fourcc.
        let codec_tag = if index == 0 {
            u32::from_le_bytes(*b"I420")
        } else {
            0
        };
        unsafe {
            (*stream.parameters().as_mut_ptr()).codec_tag = codec_tag;
        }
    }
    output.write_header().expect("Failed to write nut header");

    let mut queued: Vec<(f64, Packet)> = Vec::new();
    for (index, input) in inputs.iter_mut().enumerate() {
        let time_base = output
            .stream(index)
            .expect("Output stream missing")
            .time_base();
        for (stream, mut packet) in input.packets() {
            packet.rescale_ts(stream.time_base(), time_base);
            packet.set_stream(index);
            packet.set_position(-1);
            let timestamp = packet.dts().or(packet.pts()).unwrap_or(0);
            queued.push((timestamp as f64 * f64::from(time_base), packet));
        }
    }
    queued.sort_by(|left, right| left.0.total_cmp(&right.0));

    for (_, packet) in queued {
        packet
            .write_interleaved(&mut output)
            .expect("Failed to write packet");
    }
    output.write_trailer().expect("Failed to write nut trailer");
    path
}

/// Encode `frames` 16x16 frames with MPEG-4 Part 2 using B-frames, so the
/// decoder holds frames back until it is flushed. Returns `None` when the
/// linked FFmpeg has no `mpeg4` encoder.
pub fn write_mpeg4_with_b_frames(directory: &Path, frames: usize) -> Option<PathBuf> {
    let codec = ffmpeg_next::encoder::find(Id::MPEG4)?;
    let path = directory.join("b_frames.mkv");
    let time_base = Rational::new(1, 25);

    let mut output = ffmpeg_next::format::output(&path).expect("Failed to create mkv output");
    let needs_global_header = output.format().flags().contains(FormatFlags::GLOBAL_HEADER);

    let mut stream = output.add_stream(codec).expect("Failed to add stream");
    let stream_index = stream.index();

    let mut encoder = CodecContext::from_parameters(stream.parameters())
        .and_then(|context| context.encoder().video())
        .expect("Failed to create encoder context");
    encoder.set_width(16);
    encoder.set_height(16);
    encoder.set_format(Pixel::YUV420P);
    encoder.set_time_base(time_base);
    encoder.set_frame_rate(Some(Rational::new(25, 1)));
    encoder.set_gop(12);
    encoder.set_max_b_frames(2);
    if needs_global_header {
        unsafe {
            (*encoder.as_mut_ptr()).flags |= ffmpeg_sys_next::AV_CODEC_FLAG_GLOBAL_HEADER as i32;
        }
    }
    let mut encoder = encoder.open_as(codec).expect("Failed to open mpeg4 encoder");
    stream.set_parameters(&encoder);
    output.write_header().expect("Failed to write mkv header");

    let stream_time_base = output
        .stream(stream_index)
        .expect("Output stream missing")
        .time_base();
    let write_pending = |encoder: &mut ffmpeg_next::encoder::video::Encoder,
                         output: &mut ffmpeg_next::format::context::Output| {
        let mut packet = Packet::empty();
        while encoder.receive_packet(&mut packet).is_ok() {
            packet.set_stream(stream_index);
            packet.rescale_ts(time_base, stream_time_base);
            packet
                .write_interleaved(output)
                .expect("Failed to write packet");
        }
    };

    for index in 0..frames {
        let mut frame = VideoFrame::new(Pixel::YUV420P, 16, 16);
        for plane in 0..3 {
            let level = if plane == 0 { (index * 20 + 16) as u8 } else { 128 };
            frame.data_mut(plane).fill(level);
        }
        frame.set_pts(Some(index as i64));
        encoder.send_frame(&frame).expect("Failed to send frame");
        write_pending(&mut encoder, &mut output);
    }
    encoder.send_eof().expect("Failed to flush encoder");
    write_pending(&mut encoder, &mut output);

    output.write_trailer().expect("Failed to write mkv trailer");
    Some(path)
}
