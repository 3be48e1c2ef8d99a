//! Snapshot integration tests.

mod common;

use rawdump::{MediaInput, RawDumpError};

fn flat_frame(luma: u8, width: u32, height: u32) -> Vec<u8> {
    let luma_size = (width * height) as usize;
    let mut payload = vec![luma; luma_size];
    payload.resize(common::yuv420p_frame_size(width, height), 128);
    payload
}

#[test]
fn snapshot_converts_to_rgb() {
    let directory = tempfile::tempdir().expect("Failed to create temp dir");
    let path = common::write_y4m_with(directory.path(), "white.y4m", 16, 16, 2, |_| {
        flat_frame(235, 16, 16)
    });

    let mut input = MediaInput::open(&path).expect("Failed to open fixture");
    let image = rawdump::capture_snapshot(&mut input, 0).expect("Snapshot failed");
    let rgb = image.to_rgb8();

    assert_eq!(rgb.dimensions(), (16, 16));
    for pixel in rgb.pixels() {
        assert!(pixel.0.iter().all(|&channel| channel > 220), "{pixel:?}");
    }
}

#[test]
fn snapshot_skips_frames() {
    let directory = tempfile::tempdir().expect("Failed to create temp dir");
    // Dark frames first, then a bright one.
    let path = common::write_y4m_with(directory.path(), "fade.y4m", 16, 16, 4, |index| {
        flat_frame(if index < 3 { 16 } else { 235 }, 16, 16)
    });

    let mut input = MediaInput::open(&path).expect("Failed to open fixture");
    let dark = rawdump::capture_snapshot(&mut input, 0)
        .expect("Snapshot failed")
        .to_rgb8();
    assert!(dark.get_pixel(8, 8).0.iter().all(|&channel| channel < 30));

    let mut input = MediaInput::open(&path).expect("Failed to open fixture");
    let bright = rawdump::capture_snapshot(&mut input, 3)
        .expect("Snapshot failed")
        .to_rgb8();
    assert!(bright.get_pixel(8, 8).0.iter().all(|&channel| channel > 220));
}

#[test]
fn snapshot_can_be_saved() {
    let directory = tempfile::tempdir().expect("Failed to create temp dir");
    let path = common::write_y4m(directory.path(), 16, 16, 1);
    let output = directory.path().join("frame.png");

    let mut input = MediaInput::open(&path).expect("Failed to open fixture");
    rawdump::capture_snapshot(&mut input, 0)
        .expect("Snapshot failed")
        .save(&output)
        .expect("Failed to save snapshot");

    let reloaded = image::open(&output).expect("Failed to reload snapshot");
    assert_eq!(reloaded.width(), 16);
    assert_eq!(reloaded.height(), 16);
}

#[test]
fn skipping_past_the_end_fails() {
    let directory = tempfile::tempdir().expect("Failed to create temp dir");
    let path = common::write_y4m(directory.path(), 16, 16, 2);

    let mut input = MediaInput::open(&path).expect("Failed to open fixture");
    let result = rawdump::capture_snapshot(&mut input, 5);
    assert!(matches!(result, Err(RawDumpError::VideoDecodeError(_))));
}

#[test]
fn snapshot_needs_video() {
    let directory = tempfile::tempdir().expect("Failed to create temp dir");
    let path = common::write_wav(directory.path());

    let mut input = MediaInput::open(&path).expect("Failed to open fixture");
    let result = rawdump::capture_snapshot(&mut input, 0);
    assert!(matches!(result, Err(RawDumpError::NoVideoStream)));
}
