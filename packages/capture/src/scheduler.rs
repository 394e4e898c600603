//! Frame-capture scheduler
//!
//! Each iteration probes the surface for end-of-content, takes one snapshot,
//! stages it, and updates progress. The loop runs flat out: between
//! iterations it only yields the thread, it never sleeps to match the
//! nominal frame rate, so the resulting capture is time-compressed.

use crate::detector::{EndDetector, Phase};
use crate::progress::{ProgressReporter, ProgressSnapshot};
use crate::staging::FrameSink;
use crate::surface::RenderSurface;
use crate::types::{CaptureConfig, CaptureOutcome, Frame, SessionState, StagedFrame, StopReason};
use crate::{CaptureError, Result};
use chrono::Utc;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Run state of one capture. Drive it with [`CaptureSession::step`] or let
/// [`run_capture`] do it.
#[derive(Debug)]
pub struct CaptureSession {
    frame_index: u32,
    frame_rate: u32,
    max_frames: u32,
    image_quality: u8,
    started_at: Option<Instant>,
    elapsed: Duration,
    detector: EndDetector,
    reporter: ProgressReporter,
    progress: Option<ProgressSnapshot>,
    state: SessionState,
    frames: Vec<StagedFrame>,
}

impl CaptureSession {
    pub fn new(config: &CaptureConfig) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            frame_index: 0,
            frame_rate: config.frame_rate,
            max_frames: config.max_frames(),
            image_quality: config.image_quality,
            started_at: None,
            elapsed: Duration::ZERO,
            detector: EndDetector::new(config.grace_frames()),
            reporter: ProgressReporter::new(),
            progress: None,
            state: SessionState::NotStarted,
            frames: Vec::new(),
        })
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn frame_index(&self) -> u32 {
        self.frame_index
    }

    pub fn frame_rate(&self) -> u32 {
        self.frame_rate
    }

    pub fn max_frames(&self) -> u32 {
        self.max_frames
    }

    pub fn detector_phase(&self) -> Phase {
        self.detector.phase()
    }

    /// Progress as of the last captured frame
    pub fn progress(&self) -> Option<ProgressSnapshot> {
        self.progress
    }

    pub fn frames(&self) -> &[StagedFrame] {
        &self.frames
    }

    /// Perform one iteration and return the resulting state.
    ///
    /// A session in a terminal state does nothing. A probe, snapshot or
    /// staging error moves the session to `Failed` and is returned as-is.
    pub fn step<S, K>(&mut self, surface: &mut S, sink: &mut K) -> Result<SessionState>
    where
        S: RenderSurface + ?Sized,
        K: FrameSink + ?Sized,
    {
        if self.state.is_terminal() {
            return Ok(self.state);
        }

        let started_at = match self.started_at {
            Some(started_at) => started_at,
            None => {
                let now = Instant::now();
                self.started_at = Some(now);
                self.state = SessionState::Capturing;
                now
            }
        };

        // Check for end of replay
        let terminal = match surface.probe_terminal() {
            Ok(terminal) => terminal,
            Err(source) => {
                return Err(self.fail(
                    started_at,
                    CaptureError::ProbeFailure {
                        index: self.frame_index,
                        source,
                    },
                ))
            }
        };

        if self.detector.observe(self.frame_index, terminal) == Phase::Terminal {
            self.complete(started_at, StopReason::EndDetected);
            return Ok(self.state);
        }

        // Take snapshot
        let payload = match surface.capture_snapshot(self.image_quality) {
            Ok(payload) => payload,
            Err(source) => {
                return Err(self.fail(
                    started_at,
                    CaptureError::SnapshotFailure {
                        index: self.frame_index,
                        source,
                    },
                ))
            }
        };

        let frame = Frame {
            index: self.frame_index,
            payload,
            captured_at: Utc::now(),
        };

        // Stage frame
        let staged = match sink.stage(&frame) {
            Ok(staged) => staged,
            Err(e) => return Err(self.fail(started_at, CaptureError::Staging(e))),
        };

        self.frames.push(staged);
        self.frame_index += 1;

        // Update progress
        let snapshot =
            ProgressSnapshot::compute(self.frame_index, self.max_frames, started_at.elapsed());
        self.reporter.observe(&snapshot);
        self.progress = Some(snapshot);

        // Ceiling
        if self.frame_index >= self.max_frames {
            self.complete(started_at, StopReason::CeilingReached);
        }

        Ok(self.state)
    }

    /// The captured frames, if the session completed normally
    pub fn into_outcome(self) -> Option<CaptureOutcome> {
        match self.state {
            SessionState::Completed(stop_reason) => Some(CaptureOutcome {
                frames: self.frames,
                stop_reason,
                elapsed: self.elapsed,
            }),
            _ => None,
        }
    }

    fn complete(&mut self, started_at: Instant, reason: StopReason) {
        self.elapsed = started_at.elapsed();
        self.state = SessionState::Completed(reason);
        debug!(
            frames = self.frame_index,
            "Capture session completed: {}", reason
        );
    }

    fn fail(&mut self, started_at: Instant, error: CaptureError) -> CaptureError {
        self.elapsed = started_at.elapsed();
        self.state = SessionState::Failed;
        debug!(frames = self.frame_index, "Capture session failed: {}", error);
        error
    }
}

/// Capture frames from a playing surface until it finishes or the frame
/// ceiling is reached.
///
/// Every returned frame has already been written to `sink`. On error the
/// partial sequence is discarded; releasing whatever the sink holds is the
/// caller's job.
pub fn run_capture<S, K>(
    surface: &mut S,
    config: &CaptureConfig,
    sink: &mut K,
) -> Result<CaptureOutcome>
where
    S: RenderSurface + ?Sized,
    K: FrameSink + ?Sized,
{
    let mut session = CaptureSession::new(config)?;

    info!(
        "🎥 Recording frames at {} fps (ceiling {} frames)",
        session.frame_rate(),
        session.max_frames()
    );

    let stop_reason = loop {
        match session.step(&mut *surface, &mut *sink)? {
            SessionState::Completed(reason) => break reason,
            _ => thread::yield_now(),
        }
    };

    info!(
        "🧩 Captured {} frames in {:.1}s ({})",
        session.frame_index,
        session.elapsed.as_secs_f64(),
        stop_reason
    );

    Ok(CaptureOutcome {
        frames: session.frames,
        stop_reason,
        elapsed: session.elapsed,
    })
}
