//! Configuration for milestrack
//!
//! Loaded from `milestrack.toml`. Every field has a default, so a partial
//! file (or none at all) is valid.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

use crate::{DateResolution, SENTINEL_YEAR};

/// Default config file name looked up in the working directory
pub const CONFIG_FILE_NAME: &str = "milestrack.toml";

/// Configuration error
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Could not serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub status: StatusConfig,
    #[serde(default)]
    pub gantt: GanttConfig,
    #[serde(default)]
    pub overlay: OverlayConfig,
}

/// Classification thresholds
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusConfig {
    /// Margins strictly above this many days are green
    #[serde(default = "default_green_threshold")]
    pub green_threshold_days: i64,

    /// Dates in this year are treated as absent
    #[serde(default = "default_sentinel_year")]
    pub sentinel_year: i32,
}

/// Chart data formatting
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GanttConfig {
    /// Emit one row per task instead of one predecessor row per edge
    #[serde(default = "default_true")]
    pub dedupe_predecessors: bool,
}

/// Today-line overlay settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverlayConfig {
    /// Delay between chart polls (milliseconds)
    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,

    /// How long to wait for the chart to paint before giving up (milliseconds)
    #[serde(default = "default_ready_timeout")]
    pub ready_timeout_ms: u64,

    /// Keep checking after drawing and redraw if a re-render removed the line
    #[serde(default = "default_true")]
    pub maintain: bool,

    /// Reserved element id of the line
    #[serde(default = "default_line_id")]
    pub line_id: String,

    /// Stroke color of the line
    #[serde(default = "default_line_color")]
    pub line_color: String,
}

fn default_green_threshold() -> i64 {
    5
}

fn default_sentinel_year() -> i32 {
    SENTINEL_YEAR
}

fn default_true() -> bool {
    true
}

fn default_poll_interval() -> u64 {
    100
}

fn default_ready_timeout() -> u64 {
    5_000
}

fn default_line_id() -> String {
    "today-line".to_string()
}

fn default_line_color() -> String {
    "#d62728".to_string()
}

impl Default for StatusConfig {
    fn default() -> Self {
        Self {
            green_threshold_days: default_green_threshold(),
            sentinel_year: default_sentinel_year(),
        }
    }
}

impl StatusConfig {
    /// Date resolution policy for this configuration
    pub fn resolution(&self) -> DateResolution {
        DateResolution::new(self.sentinel_year)
    }
}

impl Default for GanttConfig {
    fn default() -> Self {
        Self {
            dedupe_predecessors: true,
        }
    }
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval(),
            ready_timeout_ms: default_ready_timeout(),
            maintain: true,
            line_id: default_line_id(),
            line_color: default_line_color(),
        }
    }
}

impl OverlayConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }

    pub fn ready_timeout(&self) -> Duration {
        Duration::from_millis(self.ready_timeout_ms)
    }
}

impl Config {
    /// Load config from file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse config from a TOML string
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Serialize config to TOML
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }
}
