//! Configuration loading using Figment
//!
//! Sources are merged in precedence order (later sources override earlier):
//! 1. Built-in defaults
//! 2. An optional configuration file (TOML, YAML or JSON by extension)
//! 3. Environment variables prefixed with `BOARDKIT_`, nested with `__`
//!    (e.g. `BOARDKIT_DRAG__LONG_PRESS_MS=650`)

use crate::error::{BoardError, Result};
use figment::{
    providers::{Env, Format, Json, Serialized, Toml, Yaml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::debug;

/// Environment variable prefix
pub const ENV_PREFIX: &str = "BOARDKIT_";

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoardkitConfig {
    pub drag: DragConfig,
    pub engine: EngineConfig,
}

/// Gesture recognition thresholds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DragConfig {
    /// Mouse movement (px) that turns a press into a drag
    pub mouse_threshold_px: f64,
    /// Touch movement (px) before the long press fires that turns the gesture into a scroll
    pub touch_slop_px: f64,
    /// Touch hold time before a drag starts
    pub long_press_ms: u64,
}

impl DragConfig {
    pub fn long_press(&self) -> Duration {
        Duration::from_millis(self.long_press_ms)
    }
}

impl Default for DragConfig {
    fn default() -> Self {
        Self {
            mouse_threshold_px: 5.0,
            touch_slop_px: 15.0,
            long_press_ms: 500,
        }
    }
}

/// Optimistic engine behavior
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Refetch the board after every successful write
    pub refresh_on_success: bool,
    /// Active notifications kept before the oldest is dropped
    pub max_notifications: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            refresh_on_success: false,
            max_notifications: 5,
        }
    }
}

impl BoardkitConfig {
    /// Load defaults overlaid with `BOARDKIT_` environment variables
    pub fn load() -> Result<Self> {
        Self::from_figment(Self::figment())
    }

    /// Load defaults, then `path`, then environment variables
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(BoardError::invalid_value(
                "config",
                format!("file not found: {}", path.display()),
            ));
        }

        debug!("Loading configuration from {}", path.display());
        let file = match path.extension().and_then(|e| e.to_str()) {
            Some("yaml") | Some("yml") => Figment::from(Yaml::file(path)),
            Some("json") => Figment::from(Json::file(path)),
            _ => Figment::from(Toml::file(path)),
        };

        let figment = Figment::new()
            .merge(Serialized::defaults(Self::default()))
            .merge(file)
            .merge(Self::env());
        Self::from_figment(figment)
    }

    fn figment() -> Figment {
        Figment::new()
            .merge(Serialized::defaults(Self::default()))
            .merge(Self::env())
    }

    fn env() -> Env {
        Env::prefixed(ENV_PREFIX).split("__")
    }

    fn from_figment(figment: Figment) -> Result<Self> {
        let config: Self = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values that would make gesture recognition impossible
    pub fn validate(&self) -> Result<()> {
        if self.drag.long_press_ms == 0 {
            return Err(BoardError::invalid_value(
                "drag.long_press_ms",
                "must be greater than zero",
            ));
        }
        if self.drag.touch_slop_px.is_nan() || self.drag.touch_slop_px <= 0.0 {
            return Err(BoardError::invalid_value(
                "drag.touch_slop_px",
                "must be greater than zero",
            ));
        }
        if self.drag.mouse_threshold_px.is_nan() || self.drag.mouse_threshold_px <= 0.0 {
            return Err(BoardError::invalid_value(
                "drag.mouse_threshold_px",
                "must be greater than zero",
            ));
        }
        if self.engine.max_notifications == 0 {
            return Err(BoardError::invalid_value(
                "engine.max_notifications",
                "must be at least one",
            ));
        }
        Ok(())
    }
}
