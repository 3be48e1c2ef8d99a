//! # rawdump
//!
//! Open a media input, locate its video stream, decode it, and write the
//! decoded frames to disk as raw video, powered by FFmpeg via the
//! [`ffmpeg-next`](https://crates.io/crates/ffmpeg-next) crate.
//!
//! The output carries no container or header: frames are stored back to
//! back, each plane packed without row padding, in the decoder's native
//! pixel format. Play it back with the command returned by
//! [`RawVideoGeometry::playback_command`].
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::path::Path;
//!
//! use rawdump::{DumpOptions, MediaInput};
//!
//! let mut input = MediaInput::open("input.mp4").unwrap();
//! input.dump_format();
//!
//! let output = Path::new("video.raw");
//! let summary = rawdump::dump_to_file(&mut input, output, &DumpOptions::new(), true).unwrap();
//! println!("{} frames", summary.frames_written);
//! println!("{}", summary.geometry.playback_command(output));
//! ```
//!
//! ## Capture devices
//!
//! Webcams and screen grabbers are FFmpeg input devices. Force the device
//! demuxer with [`InputOptions::with_format`] and pass device options such
//! as `pixel_format`, `framerate`, or `video_size` with
//! [`InputOptions::with_option`].
//!
//! ## Requirements
//!
//! FFmpeg development libraries (libavformat, libavcodec, libavdevice,
//! libswscale, libavutil) must be installed.

pub mod configuration;
pub mod dump;
pub mod error;
pub mod ffmpeg;
pub mod input;
pub mod metadata;
pub mod progress;
pub mod raw_frame;
pub mod snapshot;

pub use configuration::{DEFAULT_PACKET_LIMIT, DumpOptions, InputOptions, parse_option};
pub use dump::{DumpSummary, FrameDumper, dump_to_file};
pub use error::RawDumpError;
pub use ffmpeg::{FfmpegLogLevel, get_ffmpeg_log_level, set_ffmpeg_log_level};
pub use input::MediaInput;
pub use metadata::{InputMetadata, StreamMetadata, VideoMetadata};
pub use progress::{CancellationToken, ProgressCallback, ProgressInfo};
pub use raw_frame::{RawFrameBuffer, RawVideoGeometry};
pub use snapshot::{capture_snapshot, frame_to_image};
