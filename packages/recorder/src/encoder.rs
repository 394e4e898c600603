//! Image-sequence encoding via an external ffmpeg process

use crate::config::EncoderConfig;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum EncodeError {
    #[error("no frames to encode")]
    EmptySequence,

    #[error("failed to start encoder: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("encoder failed ({status}): {stderr}")]
    Status {
        code: Option<i32>,
        status: String,
        stderr: String,
    },
}

/// A dense, zero-based, numbered image sequence on disk
#[derive(Debug, Clone)]
pub struct SequenceInput {
    /// printf-style path pattern, e.g. `/tmp/x/frame_%05d.jpg`
    pub pattern: PathBuf,
    pub frame_rate: u32,
    pub frame_count: u32,
}

/// Assembles an image sequence into a single video file
pub trait SequenceEncoder {
    fn encode(&self, input: &SequenceInput, output: &Path) -> Result<(), EncodeError>;
}

#[derive(Debug, Clone)]
pub struct FfmpegEncoder {
    program: String,
    codec: String,
    pixel_format: String,
}

impl FfmpegEncoder {
    pub fn new(config: &EncoderConfig) -> Self {
        Self {
            program: config.program.clone(),
            codec: config.codec.clone(),
            pixel_format: config.pixel_format.clone(),
        }
    }

    pub fn command(&self, input: &SequenceInput, output: &Path) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.arg("-y")
            .arg("-hide_banner")
            .arg("-loglevel")
            .arg("error")
            .arg("-framerate")
            .arg(input.frame_rate.to_string())
            .arg("-start_number")
            .arg("0")
            .arg("-i")
            .arg(&input.pattern)
            .arg("-c:v")
            .arg(&self.codec)
            .arg("-pix_fmt")
            .arg(&self.pixel_format)
            .arg(output);
        cmd
    }
}

impl Default for FfmpegEncoder {
    fn default() -> Self {
        Self::new(&EncoderConfig::default())
    }
}

impl SequenceEncoder for FfmpegEncoder {
    fn encode(&self, input: &SequenceInput, output: &Path) -> Result<(), EncodeError> {
        if input.frame_count == 0 {
            return Err(EncodeError::EmptySequence);
        }

        info!(
            "🎬 Encoding {} frames at {} fps ({})...",
            input.frame_count, input.frame_rate, self.program
        );

        let mut cmd = self.command(input, output);
        cmd.stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped());
        debug!("Running {:?}", cmd);

        let result = cmd.output().map_err(EncodeError::Spawn)?;

        if !result.status.success() {
            return Err(EncodeError::Status {
                code: result.status.code(),
                status: result.status.to_string(),
                stderr: String::from_utf8_lossy(&result.stderr).trim().to_string(),
            });
        }

        Ok(())
    }
}
