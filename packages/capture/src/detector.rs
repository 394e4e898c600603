//! End-of-content detection
//!
//! A replay signals that it has finished by re-enabling its play control,
//! but the same control can look enabled for a moment while the page is
//! still starting up. The detector only trusts the signal once more than
//! `grace_frames` frames have been captured.

/// Detector phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Inside the grace window; terminal signals are ignored
    Priming,

    /// Grace window elapsed; the next terminal signal ends the capture
    Armed,

    /// End of content observed
    Terminal,
}

#[derive(Debug, Clone)]
pub struct EndDetector {
    grace_frames: u32,
    phase: Phase,
}

impl EndDetector {
    pub fn new(grace_frames: u32) -> Self {
        Self {
            grace_frames,
            phase: Phase::Priming,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Feed one probe result along with the number of frames captured so far.
    ///
    /// Once `Terminal`, the detector stays there.
    pub fn observe(&mut self, frames_captured: u32, terminal: bool) -> Phase {
        if self.phase == Phase::Terminal {
            return self.phase;
        }

        if self.phase == Phase::Priming && frames_captured > self.grace_frames {
            self.phase = Phase::Armed;
        }

        if self.phase == Phase::Armed && terminal {
            self.phase = Phase::Terminal;
        }

        self.phase
    }
}
