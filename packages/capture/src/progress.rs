//! Progress accounting and throttled progress logging

use std::time::Duration;
use tracing::info;

/// Lower bound on the completion fraction used for the ETA estimate
const MIN_FRACTION: f64 = 0.01;

/// Point-in-time view of capture progress. Recomputed every iteration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressSnapshot {
    pub frames: u32,
    pub elapsed: Duration,
    pub fraction_complete: f64,
    pub estimated_remaining: Duration,
}

impl ProgressSnapshot {
    pub fn compute(frame_index: u32, max_frames: u32, elapsed: Duration) -> Self {
        let fraction_complete = if max_frames == 0 {
            1.0
        } else {
            (frame_index as f64 / max_frames as f64).min(1.0)
        };

        let elapsed_secs = elapsed.as_secs_f64();
        let estimated_total = elapsed_secs / fraction_complete.max(MIN_FRACTION);
        let remaining = (estimated_total - elapsed_secs).max(0.0);

        Self {
            frames: frame_index,
            elapsed,
            fraction_complete,
            estimated_remaining: if remaining.is_finite() {
                Duration::from_secs_f64(remaining)
            } else {
                Duration::ZERO
            },
        }
    }

    pub fn percent(&self) -> u32 {
        (self.fraction_complete * 100.0).round() as u32
    }

    /// Human-readable line, e.g. `42% | elapsed 00:12 | remaining ~00:30`
    pub fn render(&self) -> String {
        format!(
            "{}% | elapsed {} | remaining ~{}",
            self.percent(),
            format_clock(self.elapsed),
            format_clock(self.estimated_remaining)
        )
    }
}

/// Format a duration as `MM:SS`
pub fn format_clock(duration: Duration) -> String {
    let secs = duration.as_secs();
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

/// Emits at most one progress event per whole second of elapsed time
#[derive(Debug, Default)]
pub struct ProgressReporter {
    last_second: Option<u64>,
}

impl ProgressReporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Log the snapshot unless one was already logged in the same second.
    /// Returns whether an event was emitted.
    pub fn observe(&mut self, snapshot: &ProgressSnapshot) -> bool {
        let second = snapshot.elapsed.as_secs();
        if self.last_second == Some(second) {
            return false;
        }
        self.last_second = Some(second);

        info!(
            frames = snapshot.frames,
            percent = snapshot.percent(),
            elapsed = %format_clock(snapshot.elapsed),
            remaining = %format_clock(snapshot.estimated_remaining),
            "⚡ {}",
            snapshot.render()
        );
        true
    }
}
