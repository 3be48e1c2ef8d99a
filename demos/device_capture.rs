//! Capture a few frames from a webcam into a raw video file.
//!
//! Usage:
//!   cargo run --example device_capture -- [device] [output_file]
//!
//! The device defaults to the first camera of the platform's capture
//! backend: `avfoundation` on macOS, `v4l2` on Linux, `dshow` on Windows.

use std::{error::Error, path::PathBuf, sync::Arc};

use rawdump::{DumpOptions, InputOptions, MediaInput, ProgressCallback, ProgressInfo};

struct PrintProgress;

impl ProgressCallback for PrintProgress {
    fn on_progress(&self, info: &ProgressInfo) {
        print!(
            "\r{} frames from {} packets in {:.1}s",
            info.frames_written,
            info.packets_read,
            info.elapsed.as_secs_f64(),
        );
        if info.finished {
            println!();
        }
    }
}

fn platform_device() -> (&'static str, &'static str) {
    if cfg!(target_os = "macos") {
        ("avfoundation", "0")
    } else if cfg!(target_os = "windows") {
        ("dshow", "video=Integrated Camera")
    } else {
        ("v4l2", "/dev/video0")
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();

    let (format, default_device) = platform_device();
    let mut arguments = std::env::args().skip(1);
    let device = arguments.next().unwrap_or_else(|| default_device.to_string());
    let output_path = PathBuf::from(arguments.next().unwrap_or_else(|| "camera.raw".to_string()));

    let input_options = InputOptions::new()
        .with_format(format)
        .with_option("framerate", "30")
        .with_option("video_size", "1280x720");

    println!("Opening {format} device '{device}'...");
    let mut input = MediaInput::open_with_options(&device, &input_options)?;
    for (key, value) in input.rejected_options() {
        println!("Device ignored option {key}={value}");
    }

    // Live sources never end; stop after a fixed number of frames.
    let options = DumpOptions::new()
        .with_packet_limit(None)
        .with_frame_limit(Some(60))
        .with_progress(Arc::new(PrintProgress))
        .with_batch_size(10);

    let summary = rawdump::dump_to_file(&mut input, &output_path, &options, true)?;

    println!("Captured {} frames of {}", summary.frames_written, summary.geometry);
    println!("{}", summary.geometry.playback_command(&output_path));
    Ok(())
}
