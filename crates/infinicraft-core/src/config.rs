//! Client configuration.

use kurbo::{Size, Vec2};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(String),
    #[error("Parse error: {0}")]
    Parse(String),
}

/// What to do with a combination response that arrives after the workspace
/// was cleared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StaleResponses {
    /// Apply it against whatever the workspace holds now.
    #[default]
    Apply,
    /// Drop it if a clear happened since the attempt started.
    Discard,
}

/// Client configuration. Missing fields take their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Base URL of the combination service.
    pub base_url: String,
    /// How long combination feedback stays visible.
    pub feedback_duration_ms: u64,
    /// Horizontal distance left of the target where a rejected source lands.
    pub rollback_offset: f64,
    /// Grab offset used for touch drags.
    pub touch_offset: Vec2,
    /// Size of an element box on the canvas, used for hit testing.
    pub element_size: Size,
    /// Canvas size.
    pub canvas: Size,
    pub stale_responses: StaleResponses,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8001".to_string(),
            feedback_duration_ms: 2000,
            rollback_offset: 60.0,
            touch_offset: Vec2::new(30.0, 30.0),
            element_size: Size::new(120.0, 44.0),
            canvas: Size::new(1024.0, 768.0),
            stale_responses: StaleResponses::Apply,
        }
    }
}

impl ClientConfig {
    pub fn feedback_duration(&self) -> Duration {
        Duration::from_millis(self.feedback_duration_ms)
    }

    /// Parse a configuration from JSON.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Load a configuration from a JSON file.
    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(format!("Failed to read {}: {}", path.display(), e)))?;
        Self::from_json(&json)
    }
}
