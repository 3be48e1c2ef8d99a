//! Raw frame geometry and packing tests.

use std::path::Path;

use ffmpeg_next::{format::Pixel, frame::Video as VideoFrame};
use rawdump::{RawDumpError, RawFrameBuffer, RawVideoGeometry};

fn geometry(width: u32, height: u32, pixel_format: Pixel) -> RawVideoGeometry {
    RawVideoGeometry {
        width,
        height,
        pixel_format,
    }
}

// ── Frame sizes ────────────────────────────────────────────────────

#[test]
fn packed_frame_sizes() {
    assert_eq!(geometry(4, 2, Pixel::GRAY8).frame_size().unwrap(), 8);
    assert_eq!(geometry(16, 16, Pixel::YUV420P).frame_size().unwrap(), 384);
    assert_eq!(geometry(6, 4, Pixel::YUV420P).frame_size().unwrap(), 36);
    assert_eq!(geometry(3, 3, Pixel::RGB24).frame_size().unwrap(), 27);
    assert_eq!(
        geometry(1280, 720, Pixel::UYVY422).frame_size().unwrap(),
        1_843_200
    );
}

#[test]
fn unknown_pixel_format_cannot_be_sized() {
    let result = geometry(16, 16, Pixel::None).frame_size();
    assert!(matches!(result, Err(RawDumpError::BufferAllocation(_))));

    let result = RawFrameBuffer::allocate(geometry(16, 16, Pixel::None));
    assert!(matches!(result, Err(RawDumpError::BufferAllocation(_))));
}

#[test]
fn zero_dimensions_cannot_be_sized() {
    let result = geometry(0, 16, Pixel::YUV420P).frame_size();
    assert!(matches!(result, Err(RawDumpError::BufferAllocation(_))));
}

// ── Naming ─────────────────────────────────────────────────────────

#[test]
fn display_and_playback_command() {
    let geometry = geometry(1280, 720, Pixel::UYVY422);
    assert_eq!(geometry.to_string(), "1280x720 uyvy422");
    assert_eq!(
        geometry.playback_command(Path::new("/tmp/out.raw")),
        "ffplay -f rawvideo -pix_fmt uyvy422 -video_size 1280x720 /tmp/out.raw"
    );
}

#[test]
fn pixel_format_name_falls_back_to_none() {
    assert_eq!(geometry(1, 1, Pixel::None).pixel_format_name(), "none");
    assert_eq!(geometry(1, 1, Pixel::YUV420P).pixel_format_name(), "yuv420p");
}

// ── Packing ────────────────────────────────────────────────────────

fn gray_frame(width: u32, height: u32) -> VideoFrame {
    let mut frame = VideoFrame::new(Pixel::GRAY8, width, height);
    let stride = frame.stride(0);
    let data = frame.data_mut(0);
    for row in 0..height as usize {
        for column in 0..width as usize {
            data[row * stride + column] = (row * 10 + column) as u8;
        }
    }
    frame
}

#[test]
fn copy_drops_row_padding() {
    let frame = gray_frame(5, 3);
    let mut buffer =
        RawFrameBuffer::allocate(geometry(5, 3, Pixel::GRAY8)).expect("Failed to allocate");

    buffer.copy_from(&frame).expect("Copy failed");

    assert_eq!(buffer.len(), 15);
    assert!(!buffer.is_empty());
    assert_eq!(
        buffer.as_bytes(),
        &[0, 1, 2, 3, 4, 10, 11, 12, 13, 14, 20, 21, 22, 23, 24]
    );
}

#[test]
fn copy_rejects_a_different_geometry() {
    let frame = gray_frame(5, 3);
    let expected = geometry(4, 3, Pixel::GRAY8);
    let mut buffer = RawFrameBuffer::allocate(expected).expect("Failed to allocate");

    match buffer.copy_from(&frame) {
        Err(RawDumpError::GeometryChanged {
            expected: old,
            actual,
        }) => {
            assert_eq!(old, expected);
            assert_eq!(actual, geometry(5, 3, Pixel::GRAY8));
        }
        other => panic!("Expected GeometryChanged, got {other:?}"),
    }
}

#[test]
fn copy_rejects_a_different_pixel_format() {
    let frame = VideoFrame::new(Pixel::RGB24, 4, 4);
    let mut buffer =
        RawFrameBuffer::allocate(geometry(4, 4, Pixel::GRAY8)).expect("Failed to allocate");

    let error = buffer.copy_from(&frame).unwrap_err();
    assert!(
        error
            .to_string()
            .contains("have to be constant in a rawvideo file")
    );
}
