//! # Replay Capture
//!
//! Frame-capture scheduling for self-animating render surfaces.
//!
//! The scheduler drives a surface that is already loaded and playing,
//! snapshots it as fast as the surface allows, stages every frame to disk
//! under a dense zero-padded index, and stops when the animation reports
//! that it has finished or when the frame ceiling is reached.
//!
//! ## Core Principles
//!
//! - Capture is time-compressed: the loop never sleeps to pace itself
//! - Frame numbering is dense and gap-free, or the run fails
//! - Early end-of-content signals are ignored during a grace window
//! - Staged frames are released on every exit path
//!
//! ## Usage
//!
//! ```rust,no_run
//! use replay_capture::{prepare, run_capture, CaptureConfig, ScriptedSurface, StagingArea};
//! use std::time::Duration;
//!
//! let config = CaptureConfig::default();
//! let mut surface = ScriptedSurface::new().end_after(120);
//! let mut staging = StagingArea::provision(&std::env::temp_dir(), config.max_frames()).unwrap();
//!
//! prepare(&mut surface, Duration::from_secs(60), 6).unwrap();
//! let outcome = run_capture(&mut surface, &config, &mut staging).unwrap();
//! println!("captured {} frames ({})", outcome.frames.len(), outcome.stop_reason);
//!
//! staging.teardown();
//! ```

mod detector;
mod progress;
mod scheduler;
mod staging;
mod surface;
mod types;

pub use detector::{EndDetector, Phase};
pub use progress::{format_clock, ProgressReporter, ProgressSnapshot};
pub use scheduler::{run_capture, CaptureSession};
pub use staging::{FrameSink, StagingArea};
pub use surface::{prepare, RenderSurface, ScriptedSurface, SurfaceError};
pub use types::{
    CaptureConfig, CaptureOutcome, Frame, SessionState, StagedFrame, StopReason,
};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CaptureError {
    #[error("Invalid capture config: {0}")]
    InvalidConfig(String),

    #[error("Render surface not ready: {0}")]
    SurfaceUnready(#[source] SurfaceError),

    #[error("Termination probe failed at frame {index}: {source}")]
    ProbeFailure {
        index: u32,
        #[source]
        source: SurfaceError,
    },

    #[error("Snapshot failed at frame {index}: {source}")]
    SnapshotFailure {
        index: u32,
        #[source]
        source: SurfaceError,
    },

    #[error("Staging error: {0}")]
    Staging(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, CaptureError>;
