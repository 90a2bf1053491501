use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand};

use framescope_core::recording::frame_accessor::Recording;
use framescope_core::shared::channel_selector::ChannelSelector;
use framescope_core::shared::frame::Frame;
use framescope_core::shared::recording_metadata::RecordingMetadata;

/// Frame-indexed access to high-speed camera recordings.
#[derive(Parser)]
#[command(name = "framescope", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the resolved metadata of a recording.
    Info {
        /// Header (.cih/.cihx), image, or video file.
        path: PathBuf,

        /// Print metadata as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Decode one frame and print its shape and value range.
    Frame {
        /// Header (.cih/.cihx), image, or video file.
        path: PathBuf,

        /// Zero-based frame index.
        index: usize,

        /// Channel: R, G, B, Y (luma) or RAW.
        #[arg(long, default_value = "Y")]
        channel: String,
    },
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    match cli.command {
        Command::Info { path, json } => run_info(&path, json),
        Command::Frame {
            path,
            index,
            channel,
        } => run_frame(&path, index, &channel),
    }
}

fn run_info(path: &Path, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let recording = Recording::open(path)?;
    let metadata = recording.metadata();

    if json {
        println!("{}", serde_json::to_string_pretty(metadata)?);
    } else {
        print_metadata(metadata);
    }
    Ok(())
}

fn print_metadata(metadata: &RecordingMetadata) {
    println!("source:      {}", metadata.source_path.display());
    println!("format:      {:?}", metadata.format_kind);
    println!("frames:      {}", metadata.frame_count);
    println!("size:        {}x{}", metadata.width, metadata.height);
    println!("bit depth:   {}", metadata.bit_depth.bits());
    if let Some(rate) = metadata.frame_rate {
        println!("frame rate:  {rate} fps");
    }
    if let Some(header) = &metadata.header {
        println!("header:");
        for (key, value) in header.fields() {
            println!("  {key}: {value}");
        }
    }
}

fn run_frame(path: &Path, index: usize, channel: &str) -> Result<(), Box<dyn std::error::Error>> {
    let channel: ChannelSelector = channel.parse()?;
    let mut recording = Recording::open(path)?;
    log::info!(
        "Reading frame {index} of {} ({channel})",
        recording.frame_count()
    );

    let frame = recording.get_frame(index, channel)?;
    let stats = frame.statistics();
    println!("shape: {:?}", frame.shape());
    println!("dtype: {}", element_type(&frame));
    println!("min:   {}", stats.min);
    println!("max:   {}", stats.max);
    println!("mean:  {:.3}", stats.mean);
    Ok(())
}

fn element_type(frame: &Frame) -> &'static str {
    match frame {
        Frame::Mono8(_) | Frame::Color8(_) => "u8",
        Frame::Mono16(_) | Frame::Color16(_) => "u16",
    }
}
