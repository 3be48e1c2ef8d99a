//! Dump the video of a media file to a raw video file.
//!
//! Usage:
//!   cargo run --example dump_frames -- <input_file> [output_file]

use std::{error::Error, path::PathBuf};

use rawdump::{DumpOptions, MediaInput};

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();

    let mut arguments = std::env::args().skip(1);
    let input_path = arguments.next().unwrap_or_else(|| "input.mp4".to_string());
    let output_path = PathBuf::from(arguments.next().unwrap_or_else(|| "video.raw".to_string()));

    let mut input = MediaInput::open(&input_path)?;
    input.dump_format();

    // --- Whole input, not just the first few packets -------------------------
    let options = DumpOptions::new().with_packet_limit(None);

    println!(
        "Demuxing video from file '{input_path}' into '{}'",
        output_path.display()
    );
    let summary = rawdump::dump_to_file(&mut input, &output_path, &options, true)?;

    println!(
        "Wrote {} frames ({} flushed from the decoder), {} bytes",
        summary.frames_written, summary.cached_frames, summary.bytes_written,
    );
    println!("Play the output video file with the command:");
    println!("{}", summary.geometry.playback_command(&output_path));
    Ok(())
}
