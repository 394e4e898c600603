//! Replay-to-video conversion
//!
//! load → accelerate → play → capture → close browser → encode.
//! The staging area is torn down whether or not any stage fails.

use crate::browser::ChromeSurface;
use crate::config::RecorderConfig;
use crate::encoder::{FfmpegEncoder, SequenceEncoder, SequenceInput};
use crate::source::ReplaySource;
use crate::{RecorderError, Result};
use replay_capture::{
    prepare, run_capture, CaptureOutcome, RenderSurface, StagingArea, StopReason,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

#[derive(Debug, Clone)]
pub struct ConvertOptions {
    /// Run Chrome without a window
    pub headless: bool,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self { headless: true }
    }
}

/// Summary of a finished conversion
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversionReport {
    pub replay_id: String,
    pub url: String,
    pub output: PathBuf,
    pub frames: u32,
    pub frame_rate: u32,
    pub stop_reason: StopReason,
    pub capture_seconds: f64,
    pub generated_at: String,
}

impl ConversionReport {
    pub fn new(
        source: &ReplaySource,
        output: &Path,
        frame_rate: u32,
        outcome: &CaptureOutcome,
    ) -> Self {
        Self {
            replay_id: source.id.clone(),
            url: source.url.clone(),
            output: output.to_path_buf(),
            frames: outcome.frames.len() as u32,
            frame_rate,
            stop_reason: outcome.stop_reason,
            capture_seconds: outcome.elapsed.as_secs_f64(),
            generated_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// Nominal duration of the encoded video
    pub fn video_seconds(&self) -> f64 {
        if self.frame_rate == 0 {
            return 0.0;
        }
        self.frames as f64 / self.frame_rate as f64
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).map_err(|e| {
            RecorderError::Io(std::io::Error::new(
                std::io::ErrorKind::Other,
                e.to_string(),
            ))
        })?;

        std::fs::write(path, json)?;
        Ok(())
    }
}

/// One replay-to-video run over a given surface and encoder
pub struct Conversion<'a> {
    config: &'a RecorderConfig,
}

impl<'a> Conversion<'a> {
    pub fn new(config: &'a RecorderConfig) -> Self {
        Self { config }
    }

    /// Capture `surface` into `staging` and encode the result to `output`.
    ///
    /// The surface is consumed and released before encoding starts. The
    /// video is encoded next to `output` and only moved into place once the
    /// encoder succeeds, so a failed run leaves any existing `output` alone.
    /// Tearing down `staging` is left to the caller.
    pub fn run<S, E>(
        &self,
        mut surface: S,
        encoder: &E,
        staging: &mut StagingArea,
        output: &Path,
    ) -> Result<CaptureOutcome>
    where
        S: RenderSurface,
        E: SequenceEncoder + ?Sized,
    {
        let capture = &self.config.capture;

        // Load, accelerate, play
        prepare(
            &mut surface,
            self.config.ready_timeout(),
            self.config.acceleration.clicks,
        )?;

        // Capture
        let outcome = run_capture(&mut surface, capture, &mut *staging)?;
        drop(surface);

        // Encode
        let input = SequenceInput {
            pattern: staging.input_pattern(),
            frame_rate: capture.frame_rate,
            frame_count: outcome.frames.len() as u32,
        };
        encode_into_place(encoder, &input, output)?;

        Ok(outcome)
    }
}

/// Encode to a scratch path beside `output`, then rename it over `output`.
/// The scratch file is removed if the encoder fails.
fn encode_into_place<E>(encoder: &E, input: &SequenceInput, output: &Path) -> Result<()>
where
    E: SequenceEncoder + ?Sized,
{
    let dir = match output.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    // Keep the extension, ffmpeg picks the container from it
    let suffix = output
        .extension()
        .map(|ext| format!(".{}", ext.to_string_lossy()))
        .unwrap_or_default();

    let scratch = tempfile::Builder::new()
        .prefix(".replay-")
        .suffix(&suffix)
        .tempfile_in(dir)?
        .into_temp_path();
    // Let the encoder create the file itself
    std::fs::remove_file(&scratch)?;

    debug!("Encoding into {}", scratch.display());
    encoder.encode(input, &scratch)?;

    scratch.persist(output).map_err(|e| e.error)?;
    Ok(())
}

/// Convert a replay id or URL into a video file at `output` using headless
/// Chrome and ffmpeg.
pub fn convert(
    input: &str,
    output: &Path,
    config: &RecorderConfig,
    options: &ConvertOptions,
) -> Result<ConversionReport> {
    let encoder = FfmpegEncoder::new(&config.encoder);

    convert_with(
        input,
        output,
        config,
        |source| ChromeSurface::launch(config, source, options.headless),
        &encoder,
    )
}

/// [`convert`] with the surface and encoder supplied by the caller.
///
/// `launch` opens the surface for the parsed source. The staging area is
/// provisioned under the configured root and torn down on every path.
pub fn convert_with<S, E, F>(
    input: &str,
    output: &Path,
    config: &RecorderConfig,
    launch: F,
    encoder: &E,
) -> Result<ConversionReport>
where
    S: RenderSurface,
    E: SequenceEncoder + ?Sized,
    F: FnOnce(&ReplaySource) -> Result<S>,
{
    config.validate()?;
    let source = ReplaySource::parse(input, &config.replay_host)?;

    let mut staging =
        StagingArea::provision(&config.staging_root(), config.capture.max_frames())?;
    let conversion = Conversion::new(config);

    let result =
        launch(&source).and_then(|surface| conversion.run(surface, encoder, &mut staging, output));

    // Cleanup
    staging.teardown();
    let outcome = result?;

    info!("✅ Done: {}", output.display());
    Ok(ConversionReport::new(
        &source,
        output,
        config.capture.frame_rate,
        &outcome,
    ))
}
