//! Render surface abstraction
//!
//! A render surface is a live, self-animating page. The scheduler only needs
//! to know whether the animation has finished and to freeze its current
//! state into an image.

use crate::{CaptureError, Result};
use std::time::Duration;
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum SurfaceError {
    #[error("Timed out after {timeout:?} waiting for {what}")]
    Timeout { what: String, timeout: Duration },

    #[error("Control not found: {0}")]
    MissingControl(String),

    #[error("Script error: {0}")]
    Script(String),

    #[error("Snapshot error: {0}")]
    Snapshot(String),

    #[error("Browser error: {0}")]
    Browser(String),
}

/// A live animating surface that can be probed and snapshotted
pub trait RenderSurface {
    /// Block until the surface shows its interactive controls
    fn wait_ready(&mut self, timeout: Duration) -> std::result::Result<(), SurfaceError>;

    /// Issue the acceleration command `clicks` times. A surface without an
    /// acceleration control plays at its natural speed.
    fn accelerate(&mut self, clicks: u32) -> std::result::Result<(), SurfaceError>;

    /// Start the animation
    fn start_playback(&mut self) -> std::result::Result<(), SurfaceError>;

    /// Whether the animation has reached a state that will produce no
    /// further distinct frames
    fn probe_terminal(&mut self) -> std::result::Result<bool, SurfaceError>;

    /// Freeze the current visual state into an encoded image
    fn capture_snapshot(&mut self, quality: u8) -> std::result::Result<Vec<u8>, SurfaceError>;
}

/// Bring a freshly loaded surface to the playing state.
///
/// Any failure here means the surface never became usable and is reported
/// as [`CaptureError::SurfaceUnready`]. Nothing is retried.
pub fn prepare<S: RenderSurface + ?Sized>(
    surface: &mut S,
    timeout: Duration,
    acceleration_clicks: u32,
) -> Result<()> {
    info!("⏳ Waiting for render surface...");
    surface
        .wait_ready(timeout)
        .map_err(CaptureError::SurfaceUnready)?;

    if acceleration_clicks > 0 {
        info!("⚡ Accelerating playback ({} clicks)", acceleration_clicks);
        surface
            .accelerate(acceleration_clicks)
            .map_err(CaptureError::SurfaceUnready)?;
    }

    surface
        .start_playback()
        .map_err(CaptureError::SurfaceUnready)?;

    Ok(())
}

type ProbeScript = Box<dyn FnMut(u32) -> bool + Send>;

/// In-memory surface driven by a script, for tests and dry runs.
///
/// Probe results come from a closure over the probe call number (starting
/// at 0); snapshots return small synthetic payloads.
pub struct ScriptedSurface {
    probe: ProbeScript,
    ready: bool,
    has_play_control: bool,
    fail_probe_at: Option<u32>,
    fail_snapshot_at: Option<u32>,

    pub probe_calls: u32,
    pub snapshot_calls: u32,
    pub acceleration_clicks: u32,
    pub playback_started: bool,
    pub last_quality: Option<u8>,
}

impl ScriptedSurface {
    /// A surface that never reports end of content
    pub fn new() -> Self {
        Self {
            probe: Box::new(|_| false),
            ready: true,
            has_play_control: true,
            fail_probe_at: None,
            fail_snapshot_at: None,
            probe_calls: 0,
            snapshot_calls: 0,
            acceleration_clicks: 0,
            playback_started: false,
            last_quality: None,
        }
    }

    /// Probe reports terminal from probe call `call` onward
    pub fn end_after(self, call: u32) -> Self {
        self.with_probe(move |n| n >= call)
    }

    pub fn with_probe<F>(mut self, probe: F) -> Self
    where
        F: FnMut(u32) -> bool + Send + 'static,
    {
        self.probe = Box::new(probe);
        self
    }

    pub fn never_ready(mut self) -> Self {
        self.ready = false;
        self
    }

    pub fn without_play_control(mut self) -> Self {
        self.has_play_control = false;
        self
    }

    pub fn fail_probe_at(mut self, call: u32) -> Self {
        self.fail_probe_at = Some(call);
        self
    }

    pub fn fail_snapshot_at(mut self, call: u32) -> Self {
        self.fail_snapshot_at = Some(call);
        self
    }
}

impl Default for ScriptedSurface {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderSurface for ScriptedSurface {
    fn wait_ready(&mut self, timeout: Duration) -> std::result::Result<(), SurfaceError> {
        if self.ready {
            Ok(())
        } else {
            Err(SurfaceError::Timeout {
                what: "scripted surface".to_string(),
                timeout,
            })
        }
    }

    fn accelerate(&mut self, clicks: u32) -> std::result::Result<(), SurfaceError> {
        self.acceleration_clicks += clicks;
        Ok(())
    }

    fn start_playback(&mut self) -> std::result::Result<(), SurfaceError> {
        if !self.has_play_control {
            return Err(SurfaceError::MissingControl("play".to_string()));
        }
        self.playback_started = true;
        Ok(())
    }

    fn probe_terminal(&mut self) -> std::result::Result<bool, SurfaceError> {
        let call = self.probe_calls;
        self.probe_calls += 1;

        if self.fail_probe_at == Some(call) {
            return Err(SurfaceError::Script(format!("probe {} failed", call)));
        }
        Ok((self.probe)(call))
    }

    fn capture_snapshot(&mut self, quality: u8) -> std::result::Result<Vec<u8>, SurfaceError> {
        let call = self.snapshot_calls;
        self.snapshot_calls += 1;
        self.last_quality = Some(quality);

        if self.fail_snapshot_at == Some(call) {
            return Err(SurfaceError::Snapshot(format!("snapshot {} failed", call)));
        }
        Ok(format!("frame-{}", call).into_bytes())
    }
}
