//! # Replay Recorder
//!
//! Turns a browser-rendered battle replay into a standalone video file.
//!
//! The replay page is loaded in headless Chrome, switched to its fastest
//! playback speed and started. Frames are captured as fast as Chrome can
//! produce them, staged as a numbered JPEG sequence and handed to ffmpeg,
//! which assembles them at a fixed frame rate. The result plays back at
//! the nominal speed no matter how long capture took.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use replay_recorder::{convert, ConvertOptions, RecorderConfig};
//! use std::path::Path;
//!
//! let config = RecorderConfig::default();
//! let report = convert(
//!     "gen9ou-2000000000",
//!     Path::new("battle.mp4"),
//!     &config,
//!     &ConvertOptions::default(),
//! )
//! .unwrap();
//!
//! println!("Wrote {} frames to {}", report.frames, report.output.display());
//! ```

mod browser;
mod config;
mod encoder;
mod pipeline;
mod source;

pub use browser::ChromeSurface;
pub use config::{
    AccelerationConfig, ControlSelectors, EncoderConfig, RecorderConfig, Viewport,
    DEFAULT_CONFIG_NAME,
};
pub use encoder::{EncodeError, FfmpegEncoder, SequenceEncoder, SequenceInput};
pub use pipeline::{convert, convert_with, Conversion, ConversionReport, ConvertOptions};
pub use source::ReplaySource;

use replay_capture::CaptureError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RecorderError {
    #[error("Invalid replay source: {0}")]
    InvalidSource(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Browser error: {0}")]
    Browser(String),

    #[error("Capture error: {0}")]
    Capture(#[from] CaptureError),

    #[error("Encode error: {0}")]
    Encode(#[from] EncodeError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl RecorderError {
    /// Name of the conversion stage that failed
    pub fn stage(&self) -> &'static str {
        match self {
            RecorderError::InvalidSource(_) => "source",
            RecorderError::Config(_) => "config",
            RecorderError::Browser(_) => "launch",
            RecorderError::Capture(CaptureError::SurfaceUnready(_)) => "load",
            RecorderError::Capture(_) => "capture",
            RecorderError::Encode(_) => "encode",
            RecorderError::Io(_) => "io",
        }
    }
}

pub type Result<T> = std::result::Result<T, RecorderError>;
