//! Configuration for HandType

use crate::cursor::DEFAULT_SMOOTHING;
use crate::error::HandTypeError;
use crate::gesture::GestureParams;
use crate::types::ScreenSize;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::Path;

/// Where landmarks come from
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum SourceConfig {
    /// Scripted synthetic hand, no hardware needed
    #[default]
    Simulated,
    /// Landmark datagrams from an external tracker
    Udp { addr: SocketAddr },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HandTypeConfig {
    pub gesture: GestureParams,
    /// Exponential smoothing factor in (0, 1]; larger is snappier
    pub cursor_smoothing: f32,
    pub screen: ScreenSize,
    /// Target frames per second for simulated sources
    pub target_fps: u32,
    /// Delay before the post-mount layout re-measure
    pub layout_settle_ms: u64,
    /// Upper bound on a single text-service call
    pub text_timeout_ms: u64,
    /// Depth of the frame queue between source and session
    pub frame_queue: usize,
    pub source: SourceConfig,
}

impl Default for HandTypeConfig {
    fn default() -> Self {
        Self {
            gesture: GestureParams::default(),
            cursor_smoothing: DEFAULT_SMOOTHING,
            screen: ScreenSize::default(),
            target_fps: 60,
            layout_settle_ms: 300,
            text_timeout_ms: 8_000,
            frame_queue: 4,
            source: SourceConfig::default(),
        }
    }
}

impl HandTypeConfig {
    pub fn from_toml(content: &str) -> Result<Self, HandTypeError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, HandTypeError> {
        log::info!("Loading config from: {}", path.display());
        let content = std::fs::read_to_string(path).map_err(|source| HandTypeError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    pub fn validate(&self) -> Result<(), HandTypeError> {
        let s = self.cursor_smoothing;
        if !(s > 0.0 && s <= 1.0) {
            return Err(HandTypeError::InvalidConfig(format!(
                "cursor_smoothing must be in (0, 1], got {s}"
            )));
        }
        if !(0.05..=0.95).contains(&s) {
            log::warn!("cursor_smoothing {s} is outside the usual 0.05-0.95 range");
        }

        self.gesture.validate()?;

        if !(self.screen.width > 0.0 && self.screen.height > 0.0) {
            return Err(HandTypeError::InvalidConfig(format!(
                "screen must be non-empty, got {}x{}",
                self.screen.width, self.screen.height
            )));
        }
        if self.target_fps == 0 {
            return Err(HandTypeError::InvalidConfig("target_fps must be > 0".to_string()));
        }
        if self.frame_queue == 0 {
            return Err(HandTypeError::InvalidConfig("frame_queue must be > 0".to_string()));
        }
        Ok(())
    }

    pub fn frame_interval_ms(&self) -> u64 {
        (1000 / self.target_fps.max(1) as u64).max(1)
    }
}
