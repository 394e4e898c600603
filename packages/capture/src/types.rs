//! Core types for Replay Capture

use crate::{CaptureError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// Capture parameters, fixed for the lifetime of a session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptureConfig {
    /// Frames per nominal second of the output video
    #[serde(default = "default_frame_rate")]
    pub frame_rate: u32,

    /// Hard cap on the nominal duration of the capture
    #[serde(default = "default_max_duration_seconds")]
    pub max_duration_seconds: u32,

    /// JPEG quality (0-100)
    #[serde(default = "default_image_quality")]
    pub image_quality: u8,

    /// Frames during which end-of-content signals are ignored.
    /// Two seconds of frames when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_grace_frames: Option<u32>,
}

fn default_frame_rate() -> u32 {
    15
}

fn default_max_duration_seconds() -> u32 {
    300
}

fn default_image_quality() -> u8 {
    80
}

impl CaptureConfig {
    /// Hard ceiling on the number of frames a session may capture
    pub fn max_frames(&self) -> u32 {
        self.frame_rate.saturating_mul(self.max_duration_seconds)
    }

    /// Effective grace window, in frames
    pub fn grace_frames(&self) -> u32 {
        self.min_grace_frames
            .unwrap_or_else(|| self.frame_rate.saturating_mul(2))
    }

    pub fn validate(&self) -> Result<()> {
        if self.frame_rate == 0 {
            return Err(CaptureError::InvalidConfig(
                "frameRate must be greater than zero".to_string(),
            ));
        }
        if self.max_duration_seconds == 0 {
            return Err(CaptureError::InvalidConfig(
                "maxDurationSeconds must be greater than zero".to_string(),
            ));
        }
        if self.image_quality > 100 {
            return Err(CaptureError::InvalidConfig(format!(
                "imageQuality must be within 0-100, got {}",
                self.image_quality
            )));
        }
        Ok(())
    }
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            frame_rate: default_frame_rate(),
            max_duration_seconds: default_max_duration_seconds(),
            image_quality: default_image_quality(),
            min_grace_frames: None,
        }
    }
}

/// A single captured still, before it is staged
#[derive(Debug, Clone)]
pub struct Frame {
    pub index: u32,
    pub payload: Vec<u8>,
    pub captured_at: DateTime<Utc>,
}

/// A frame that has been durably written to the staging area
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StagedFrame {
    pub index: u32,
    pub path: PathBuf,
    pub bytes: u64,
    pub captured_at: DateTime<Utc>,
}

/// Why a session stopped capturing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StopReason {
    /// The surface reported end-of-content after the grace window
    EndDetected,

    /// `max_frames` frames were captured
    CeilingReached,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopReason::EndDetected => write!(f, "end of replay detected"),
            StopReason::CeilingReached => write!(f, "frame ceiling reached"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    NotStarted,
    Capturing,
    Completed(StopReason),
    Failed,
}

impl SessionState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionState::Completed(_) | SessionState::Failed)
    }
}

/// Result of a successful capture run
#[derive(Debug, Clone)]
pub struct CaptureOutcome {
    /// Staged frames in capture order, indices `0..frames.len()`
    pub frames: Vec<StagedFrame>,
    pub stop_reason: StopReason,
    pub elapsed: Duration,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = CaptureConfig::default();
        assert_eq!(config.frame_rate, 15);
        assert_eq!(config.max_duration_seconds, 300);
        assert_eq!(config.image_quality, 80);
        assert_eq!(config.min_grace_frames, None);
        assert_eq!(config.grace_frames(), 30);
        assert_eq!(config.max_frames(), 4500);
    }

    #[test]
    fn test_parse_partial_config() {
        let json = r#"{ "frameRate": 24, "imageQuality": 90 }"#;

        let config: CaptureConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.frame_rate, 24);
        assert_eq!(config.image_quality, 90);
        assert_eq!(config.max_duration_seconds, 300);
        assert_eq!(config.grace_frames(), 48);
    }

    #[test]
    fn test_grace_window_follows_frame_rate() {
        let config: CaptureConfig = serde_json::from_str(r#"{ "frameRate": 60 }"#).unwrap();
        assert_eq!(config.grace_frames(), 120);

        let config: CaptureConfig = serde_json::from_str(r#"{ "frameRate": 5 }"#).unwrap();
        assert_eq!(config.grace_frames(), 10);
    }

    #[test]
    fn test_explicit_grace_window_wins() {
        let json = r#"{ "frameRate": 60, "minGraceFrames": 7 }"#;

        let config: CaptureConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.min_grace_frames, Some(7));
        assert_eq!(config.grace_frames(), 7);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = CaptureConfig::default();
        config.frame_rate = 0;
        assert!(matches!(config.validate(), Err(CaptureError::InvalidConfig(_))));

        let mut config = CaptureConfig::default();
        config.max_duration_seconds = 0;
        assert!(config.validate().is_err());

        let mut config = CaptureConfig::default();
        config.image_quality = 101;
        assert!(config.validate().is_err());

        assert!(CaptureConfig::default().validate().is_ok());
    }

    #[test]
    fn test_terminal_states() {
        assert!(!SessionState::NotStarted.is_terminal());
        assert!(!SessionState::Capturing.is_terminal());
        assert!(SessionState::Completed(StopReason::EndDetected).is_terminal());
        assert!(SessionState::Failed.is_terminal());
    }
}
