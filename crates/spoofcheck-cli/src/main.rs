use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use spoofcheck_core::{BoundingBox, DEFAULT_FRAME_SIDE};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "spoofcheck", version, about = "Detect spoof devices in face images")]
struct Cli {
    /// TOML configuration file. Defaults to SPOOFCHECK_* environment variables.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args)]
struct ImageArgs {
    /// Image file (PNG, JPEG, ...).
    image: PathBuf,

    /// EXIF orientation of the stored pixels (1-8).
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u8).range(1..=8))]
    orientation: u8,
}

#[derive(Subcommand)]
enum Command {
    /// List detected spoof devices in original image coordinates.
    Detect {
        #[command(flatten)]
        input: ImageArgs,

        /// Mirror boxes about the vertical centreline (front camera previews).
        #[arg(long)]
        mirror: bool,

        /// Print detections as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Print the spoof score. Exits with status 2 when the image is a spoof.
    Score {
        #[command(flatten)]
        input: ImageArgs,

        /// Region of interest as X,Y,WIDTH,HEIGHT, e.g. a face bounding box.
        #[arg(long, value_parser = parse_roi)]
        roi: Option<BoundingBox>,
    },
    /// Write the letterboxed canonical frame without contacting the service.
    Normalize {
        #[command(flatten)]
        input: ImageArgs,

        /// Output PNG path.
        output: PathBuf,

        /// Canonical frame side length.
        #[arg(long, default_value_t = DEFAULT_FRAME_SIDE)]
        side: u32,
    },
}

fn parse_roi(s: &str) -> Result<BoundingBox, String> {
    let parts = s
        .split(',')
        .map(|p| p.trim().parse::<f64>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| format!("invalid number in ROI: {e}"))?;
    let [x, y, width, height] = parts[..] else {
        return Err(format!("expected X,Y,WIDTH,HEIGHT, got {} values", parts.len()));
    };
    if width < 0.0 || height < 0.0 {
        return Err("ROI width and height must not be negative".to_string());
    }
    Ok(BoundingBox::from_origin_size(x, y, width, height))
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Detect {
            input,
            mirror,
            json,
        } => commands::detect(cli.config, input, mirror, json).await,
        Command::Score { input, roi } => commands::score(cli.config, input, roi).await,
        Command::Normalize {
            input,
            output,
            side,
        } => commands::normalize(input, &output, side),
    }
}
