//! Replay Recorder CLI
//!
//! A thin glue layer for converting a replay into a video file.

use anyhow::Context;
use clap::Parser;
use replay_recorder::{convert, ConvertOptions, RecorderConfig};
use std::path::PathBuf;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(name = "replay-recorder")]
#[command(version, about = "Record a battle replay to a video file", long_about = None)]
struct Cli {
    /// Replay id or replay URL
    source: String,

    /// Output video file
    #[arg(default_value = "output.mp4")]
    destination: PathBuf,

    /// Config file (defaults to ./replay-recorder.config.json if present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Output frame rate
    #[arg(long)]
    fps: Option<u32>,

    /// Hard cap on the video duration, in seconds
    #[arg(long)]
    max_seconds: Option<u32>,

    /// JPEG quality of captured frames (0-100)
    #[arg(long)]
    quality: Option<u8>,

    /// Frames captured before the end-of-replay signal is trusted
    #[arg(long)]
    grace_frames: Option<u32>,

    /// Write a JSON conversion report to this path
    #[arg(long)]
    report: Option<PathBuf>,

    /// Show the browser window. Frames are still clipped to the configured
    /// viewport.
    #[arg(long)]
    headed: bool,
}

impl Cli {
    fn apply_overrides(&self, config: &mut RecorderConfig) {
        if let Some(fps) = self.fps {
            config.capture.frame_rate = fps;
        }
        if let Some(max_seconds) = self.max_seconds {
            config.capture.max_duration_seconds = max_seconds;
        }
        if let Some(quality) = self.quality {
            config.capture.image_quality = quality;
        }
        if let Some(grace_frames) = self.grace_frames {
            config.capture.min_grace_frames = Some(grace_frames);
        }
    }
}

fn main() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(&cli) {
        error!("❌ Conversion failed: {:#}", e);
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    let cwd = std::env::current_dir().context("failed to read working directory")?;

    let mut config = RecorderConfig::load(cli.config.as_deref(), &cwd)?;
    cli.apply_overrides(&mut config);

    let options = ConvertOptions {
        headless: !cli.headed,
    };

    let report = convert(&cli.source, &cli.destination, &config, &options)
        .map_err(|e| anyhow::anyhow!("{} stage: {}", e.stage(), e))?;

    info!(
        "Recorded {} frames ({:.1}s of video) in {:.1}s, {}",
        report.frames,
        report.video_seconds(),
        report.capture_seconds,
        report.stop_reason
    );

    if let Some(path) = &cli.report {
        report
            .write(path)
            .with_context(|| format!("failed to write report to {}", path.display()))?;
        info!("Report: {}", path.display());
    }

    Ok(())
}
