use crate::{RecorderError, Result};
use replay_capture::CaptureConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_CONFIG_NAME: &str = "replay-recorder.config.json";

/// Recorder configuration file format
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecorderConfig {
    /// Frame rate, duration cap, JPEG quality and grace window
    #[serde(default)]
    pub capture: CaptureConfig,

    /// Browser viewport, which is also the output resolution
    #[serde(default)]
    pub viewport: Viewport,

    /// Prefix that turns a replay id into a page URL
    #[serde(default = "default_replay_host")]
    pub replay_host: String,

    /// Bound on page load and on waiting for the battle UI
    #[serde(default = "default_ready_timeout_seconds")]
    pub ready_timeout_seconds: u64,

    #[serde(default)]
    pub controls: ControlSelectors,

    #[serde(default)]
    pub acceleration: AccelerationConfig,

    #[serde(default)]
    pub encoder: EncoderConfig,

    /// Where frame staging directories are created (system temp dir if unset)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub staging_root: Option<PathBuf>,
}

fn default_replay_host() -> String {
    "https://replay.pokemonshowdown.com/".to_string()
}

fn default_ready_timeout_seconds() -> u64 {
    60
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
        }
    }
}

/// CSS selectors for the replay page's controls
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ControlSelectors {
    /// Element whose presence means the battle UI has loaded
    pub ready: String,

    /// Play button; enabled again once the replay has finished
    pub play: String,

    /// Used to start playback when `play` is absent
    pub play_fallback: String,

    /// Playback speed toggle
    pub speed: String,
}

impl Default for ControlSelectors {
    fn default() -> Self {
        Self {
            ready: ".battle".to_string(),
            play: r#"button[name="play"]"#.to_string(),
            play_fallback: ".replay-controls button".to_string(),
            speed: r#"button[name="speed"]"#.to_string(),
        }
    }
}

/// Surface acceleration command, issued once before capture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AccelerationConfig {
    /// Number of speed-toggle clicks. Six cycles the replay to its fastest
    /// speed; 0 disables acceleration.
    pub clicks: u32,
}

impl Default for AccelerationConfig {
    fn default() -> Self {
        Self { clicks: 6 }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EncoderConfig {
    pub program: String,
    pub codec: String,
    pub pixel_format: String,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            program: "ffmpeg".to_string(),
            codec: "libx264".to_string(),
            pixel_format: "yuv420p".to_string(),
        }
    }
}

impl RecorderConfig {
    /// Load config from an explicit file, or from `DEFAULT_CONFIG_NAME` in
    /// `cwd` when present. Falls back to defaults.
    pub fn load(explicit: Option<&Path>, cwd: &Path) -> Result<Self> {
        let config_path = match explicit {
            Some(path) => path.to_path_buf(),
            None => {
                let path = cwd.join(DEFAULT_CONFIG_NAME);
                if !path.exists() {
                    return Ok(Self::default());
                }
                path
            }
        };

        let content = std::fs::read_to_string(&config_path).map_err(|e| {
            RecorderError::Config(format!("{}: {}", config_path.display(), e))
        })?;
        Self::from_json(&content)
            .map_err(|e| RecorderError::Config(format!("{}: {}", config_path.display(), e)))
    }

    pub fn from_json(content: &str) -> Result<Self> {
        let config: RecorderConfig =
            serde_json::from_str(content).map_err(|e| RecorderError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.capture
            .validate()
            .map_err(|e| RecorderError::Config(e.to_string()))?;

        if self.viewport.width == 0 || self.viewport.height == 0 {
            return Err(RecorderError::Config(format!(
                "viewport must be non-empty, got {}x{}",
                self.viewport.width, self.viewport.height
            )));
        }
        // libx264 with yuv420p rejects odd dimensions
        if self.viewport.width % 2 != 0 || self.viewport.height % 2 != 0 {
            return Err(RecorderError::Config(format!(
                "viewport dimensions must be even, got {}x{}",
                self.viewport.width, self.viewport.height
            )));
        }
        if self.replay_host.is_empty() {
            return Err(RecorderError::Config("replayHost must not be empty".to_string()));
        }
        Ok(())
    }

    pub fn ready_timeout(&self) -> Duration {
        Duration::from_secs(self.ready_timeout_seconds)
    }

    pub fn staging_root(&self) -> PathBuf {
        self.staging_root.clone().unwrap_or_else(std::env::temp_dir)
    }
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            capture: CaptureConfig::default(),
            viewport: Viewport::default(),
            replay_host: default_replay_host(),
            ready_timeout_seconds: default_ready_timeout_seconds(),
            controls: ControlSelectors::default(),
            acceleration: AccelerationConfig::default(),
            encoder: EncoderConfig::default(),
            staging_root: None,
        }
    }
}
