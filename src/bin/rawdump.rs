use std::{
    io::Write,
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};

use clap::{Args, CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use rawdump::{
    DEFAULT_PACKET_LIMIT, DumpOptions, DumpSummary, FfmpegLogLevel, FrameDumper, InputMetadata,
    InputOptions, MediaInput, ProgressCallback, ProgressInfo,
};
use serde_json::json;

const CLI_AFTER_HELP: &str = "Examples:\n  rawdump dump input.mp4 video.raw\n  rawdump dump input.mkv video.raw --all --progress\n  rawdump dump \"HD Pro Webcam C920:\" cam.raw --input-format avfoundation --option pixel_format=uyvy422 --option framerate=30.000030 --option video_size=1280x720\n  rawdump probe input.mp4 --json\n  rawdump snapshot input.mp4 --out frame.png --skip 10\n  rawdump completions zsh > _rawdump";

#[derive(Debug, Parser)]
#[command(
    name = "rawdump",
    version,
    about = "Decode the video stream of a media input into a raw video file",
    after_help = CLI_AFTER_HELP
)]
struct Cli {
    #[command(flatten)]
    global: GlobalOptions,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Parser, Clone, Default)]
struct GlobalOptions {
    /// Show debug logging instead of per-frame lines only (RUST_LOG overrides).
    #[arg(long, global = true)]
    verbose: bool,

    /// Show a progress spinner while dumping.
    #[arg(long, global = true)]
    progress: bool,

    /// Allow overwriting existing output files.
    #[arg(long, global = true)]
    overwrite: bool,

    /// FFmpeg log level (quiet, panic, fatal, error, warning, info, verbose, debug, trace).
    #[arg(long, global = true)]
    log_level: Option<String>,
}

#[derive(Debug, Args, Clone, Default)]
struct InputArgs {
    /// Force a demuxer or capture device (avfoundation, v4l2, dshow, ...).
    #[arg(long = "input-format", short = 'f')]
    format: Option<String>,

    /// Demuxer option as KEY=VALUE (repeatable), e.g. video_size=1280x720.
    #[arg(long = "option", short = 'o', value_name = "KEY=VALUE")]
    options: Vec<String>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Decode video frames into a raw video file.
    #[command(
        about = "Dump decoded video frames to a rawvideo file",
        after_help = "Examples:\n  rawdump dump input.mp4 video.raw\n  rawdump dump input.mp4 video.raw --max-packets 100 --max-frames 25"
    )]
    Dump {
        /// Input media path, URL, or device name.
        input: String,
        /// Raw video output file.
        output: PathBuf,
        #[command(flatten)]
        input_args: InputArgs,
        /// Stop after this many demuxed packets (all streams count).
        #[arg(long, default_value_t = DEFAULT_PACKET_LIMIT, conflicts_with = "all")]
        max_packets: u64,
        /// Read the whole input instead of stopping after --max-packets.
        #[arg(long)]
        all: bool,
        /// Stop after this many frames have been written.
        #[arg(long)]
        max_frames: Option<u64>,
        /// Decode this stream index instead of the best video stream.
        #[arg(long)]
        stream: Option<usize>,
        /// Do not print FFmpeg's description of the input.
        #[arg(long)]
        no_dump_format: bool,
    },

    /// Print stream information for an input.
    #[command(about = "Print input metadata", visible_alias = "info")]
    Probe {
        /// Input media path, URL, or device name.
        input: String,
        #[command(flatten)]
        input_args: InputArgs,
        /// Output metadata as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Save one decoded frame as an image.
    #[command(
        about = "Save a decoded frame as an image",
        after_help = "Examples:\n  rawdump snapshot input.mp4 --out frame.png\n  rawdump snapshot /dev/video0 -f v4l2 --out cam.jpg --skip 5"
    )]
    Snapshot {
        /// Input media path, URL, or device name.
        input: String,
        #[command(flatten)]
        input_args: InputArgs,
        /// Output image path; the extension picks the format.
        #[arg(long)]
        out: PathBuf,
        /// Number of frames to skip before the saved one.
        #[arg(long, default_value_t = 0)]
        skip: u64,
    },

    /// Generate shell completion scripts.
    #[command(about = "Generate shell completions")]
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn input_options(args: &InputArgs) -> Result<InputOptions, rawdump::RawDumpError> {
    let mut options = InputOptions::new();
    if let Some(format) = &args.format {
        options = options.with_format(format);
    }
    for text in &args.options {
        options = options.with_option_str(text)?;
    }
    Ok(options)
}

fn open_input(input: &str, args: &InputArgs) -> Result<MediaInput, Box<dyn std::error::Error>> {
    let options = input_options(args)?;
    let media = MediaInput::open_with_options(input, &options)?;
    for (key, value) in media.rejected_options() {
        eprintln!(
            "{} {}",
            "warning:".yellow().bold(),
            format!("option {key}={value} was not used by the demuxer").yellow()
        );
    }
    Ok(media)
}

fn init_logging(global: &GlobalOptions) {
    let default_filter = if global.verbose { "debug" } else { "rawdump=info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp(None)
        .init();
}

fn apply_global_options(global: &GlobalOptions) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(level) = &global.log_level {
        let parsed: FfmpegLogLevel = level.parse()?;
        rawdump::set_ffmpeg_log_level(parsed);
    }
    Ok(())
}

fn packet_limit(max_packets: u64, all: bool) -> Option<u64> {
    if all { None } else { Some(max_packets) }
}

struct TerminalProgress {
    bar: ProgressBar,
}

impl TerminalProgress {
    fn new() -> Result<Self, Box<dyn std::error::Error>> {
        let bar = ProgressBar::new_spinner();
        bar.set_style(ProgressStyle::with_template(
            "{spinner:.green} {pos} frames [{elapsed_precise}] {msg}",
        )?);
        bar.enable_steady_tick(Duration::from_millis(100));
        Ok(Self { bar })
    }
}

impl ProgressCallback for TerminalProgress {
    fn on_progress(&self, info: &ProgressInfo) {
        self.bar.set_position(info.frames_written);
        let packets = match info.packet_limit {
            Some(limit) => format!("{}/{limit} packets", info.packets_read),
            None => format!("{} packets", info.packets_read),
        };
        self.bar.set_message(packets);
        if info.finished {
            self.bar.finish_and_clear();
        }
    }
}

fn metadata_json(metadata: &InputMetadata) -> serde_json::Value {
    json!({
        "format": metadata.format,
        "duration_seconds": metadata.duration.as_secs_f64(),
        "bit_rate": metadata.bit_rate,
        "streams": metadata.streams.iter().map(|stream| json!({
            "index": stream.index,
            "type": stream.medium,
            "codec": stream.codec,
            "time_base": format!("{}/{}", stream.time_base.numerator(), stream.time_base.denominator()),
        })).collect::<Vec<_>>(),
        "video": metadata.video.as_ref().map(|video| json!({
            "stream_index": video.stream_index,
            "width": video.width,
            "height": video.height,
            "pixel_format": video.pixel_format,
            "fps": video.frames_per_second,
            "codec": video.codec,
        })),
    })
}

fn print_metadata(metadata: &InputMetadata) {
    println!("Format: {}", metadata.format);
    println!("Duration: {:?}", metadata.duration);
    for stream in &metadata.streams {
        println!(
            "Stream #{}: {} [{}]",
            stream.index, stream.medium, stream.codec
        );
    }
    if let Some(video) = &metadata.video {
        println!(
            "Video: stream #{} {}x{} {} @ {:.2} fps [{}]",
            video.stream_index,
            video.width,
            video.height,
            video.pixel_format.as_deref().unwrap_or("unknown"),
            video.frames_per_second,
            video.codec,
        );
    } else {
        println!("Video: none");
    }
}

/// Set up the decoder, announce the dump on `console`, then write the file.
/// Nothing is announced when the input has no usable video stream.
fn dump_command<W: Write>(
    media: &mut MediaInput,
    input: &str,
    output: &Path,
    options: &DumpOptions,
    overwrite: bool,
    console: &mut W,
) -> Result<DumpSummary, Box<dyn std::error::Error>> {
    let dumper = FrameDumper::new(media, options)?;
    writeln!(
        console,
        "Demuxing video from file '{}' into '{}'",
        input,
        output.display()
    )?;
    console.flush()?;
    Ok(dumper.write_to_file(output, overwrite)?)
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(&cli.global);
    apply_global_options(&cli.global)?;

    match cli.command {
        Commands::Dump {
            input,
            output,
            input_args,
            max_packets,
            all,
            max_frames,
            stream,
            no_dump_format,
        } => {
            let mut media = open_input(&input, &input_args)?;
            if !no_dump_format {
                media.dump_format();
            }

            let mut options = DumpOptions::new()
                .with_packet_limit(packet_limit(max_packets, all))
                .with_frame_limit(max_frames);
            if let Some(index) = stream {
                options = options.with_stream_index(index);
            }
            if cli.global.progress {
                options = options.with_progress(Arc::new(TerminalProgress::new()?));
            }

            if output.exists() && cli.global.overwrite {
                eprintln!(
                    "{} {}",
                    "warning:".yellow().bold(),
                    format!("overwriting {}", output.display()).yellow()
                );
            }

            let summary = dump_command(
                &mut media,
                &input,
                &output,
                &options,
                cli.global.overwrite,
                &mut std::io::stdout(),
            )?;

            println!("{}", "Demuxing succeeded.".green().bold());
            if cli.global.verbose {
                eprintln!(
                    "{} frame(s) ({} cached), {} packet(s), {} byte(s)",
                    summary.frames_written,
                    summary.cached_frames,
                    summary.packets_read,
                    summary.bytes_written
                );
            }
            println!("Play the output video file with the command:");
            println!("{}", summary.geometry.playback_command(&output));
        }
        Commands::Probe {
            input,
            input_args,
            json,
        } => {
            let media = open_input(&input, &input_args)?;
            if json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&metadata_json(media.metadata()))?
                );
            } else {
                print_metadata(media.metadata());
            }
        }
        Commands::Snapshot {
            input,
            input_args,
            out,
            skip,
        } => {
            if out.exists() && !cli.global.overwrite {
                return Err(format!(
                    "output already exists: {} (use --overwrite to replace)",
                    out.display()
                )
                .into());
            }
            let mut media = open_input(&input, &input_args)?;
            let image = rawdump::capture_snapshot(&mut media, skip)?;
            image.save(&out)?;
            println!("{} {}", "saved".green().bold(), out.display());
        }
        Commands::Completions { shell } => {
            let mut command = Cli::command();
            clap_complete::generate(shell, &mut command, "rawdump", &mut std::io::stdout());
        }
    }

    Ok(())
}

fn main() {
    if let Err(error) = run() {
        eprintln!("{} {error}", "error:".red().bold());
        std::process::exit(1);
    }
}
