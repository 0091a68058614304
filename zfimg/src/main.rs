//! zfimg: inspect and decode images with zenframe.
//!
//! Set `RUST_LOG=debug` (or `trace`) to see what the decoder does.

mod decode;
mod info;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "zfimg", version, about = "Inspect and decode PNG and JPEG images")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Probe and display image metadata without decoding pixels.
    Info(InfoArgs),

    /// Decode the first frame to a PNG or raw BGRA file.
    Decode(DecodeArgs),

    /// Report whether the accelerated decode paths are available.
    Cpu,
}

/// Arguments for the `info` subcommand.
#[derive(Parser, Debug)]
pub struct InfoArgs {
    /// Input files.
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Output as JSON.
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `decode` subcommand.
#[derive(Parser, Debug)]
pub struct DecodeArgs {
    /// Input file.
    pub file: PathBuf,

    /// Output file. `.png` re-encodes as RGBA PNG, `.bgra` writes raw pixels.
    #[arg(short, long)]
    pub output: PathBuf,

    /// Frame to decode. Only 0 is supported.
    #[arg(long, default_value_t = 0)]
    pub frame: u32,

    /// Refuse images wider than this.
    #[arg(long, env = "ZFIMG_MAX_WIDTH")]
    pub max_width: Option<u32>,

    /// Refuse images taller than this.
    #[arg(long, env = "ZFIMG_MAX_HEIGHT")]
    pub max_height: Option<u32>,

    /// Allow overwriting an existing output file.
    #[arg(long)]
    pub force: bool,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Command::Info(args) => info::run(args),
        Command::Decode(args) => decode::run(args),
        Command::Cpu => {
            let avx2 = zenframe::supports_accelerated_path();
            println!("avx2: {}", if avx2 { "yes" } else { "no" });
            Ok(())
        }
    }
}

/// Format a byte size into a human-readable string.
pub fn format_size(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}
