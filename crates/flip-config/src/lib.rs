//! FLIP container configuration
//!
//! This crate provides centralized configuration for the animated container,
//! loading settings from `flip.toml` with environment variable overrides.

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default animation length in milliseconds.
pub const DEFAULT_DURATION_MS: f64 = 250.0;
/// Default easing curve, as CSS text.
pub const DEFAULT_EASING: &str = "ease-in-out";
/// Delay between the snap and the release, roughly one rendered frame.
pub const DEFAULT_SNAP_DELAY_MS: f64 = 10.0;

/// Errors raised while loading a configuration file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Read(#[from] std::io::Error),
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct FlipConfig {
    /// Animation timing settings
    pub animation: AnimationConfig,
    /// Logging settings
    pub log: LogConfig,
}

/// How the rect snapshot is refreshed when an animation settles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResyncPolicy {
    /// Re-seed every element that is not mid-flight and prune detached ones.
    #[default]
    PerElement,
    /// Drop the whole snapshot and re-seed everything, in-flight elements included.
    Global,
}

impl ResyncPolicy {
    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "per_element" | "per-element" | "element" => Some(Self::PerElement),
            "global" => Some(Self::Global),
            _ => None,
        }
    }
}

/// Animation timing configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnimationConfig {
    /// Length of the settle transition in milliseconds
    pub duration_ms: f64,
    /// CSS timing function name (ease, ease-in-out, cubic-bezier(...), steps(...))
    pub easing: String,
    /// Delay before the snapped offset is released
    pub snap_delay_ms: f64,
    /// Snapshot refresh strategy on completion
    pub resync: ResyncPolicy,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct LogConfig {
    /// env_logger style filter, e.g. "flip_engine=debug"
    pub filter: Option<String>,
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self {
            duration_ms: DEFAULT_DURATION_MS,
            easing: DEFAULT_EASING.to_string(),
            snap_delay_ms: DEFAULT_SNAP_DELAY_MS,
            resync: ResyncPolicy::PerElement,
        }
    }
}

impl FlipConfig {
    /// Load configuration from a TOML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration from `flip.toml` in the current directory,
    /// or return the default configuration if the file is missing or invalid
    pub fn load_or_default() -> Self {
        Self::load_from_file("flip.toml").unwrap_or_default()
    }

    /// Merge configuration with environment variables
    ///
    /// Environment variables take precedence over configuration file values.
    /// Unparseable values are ignored.
    pub fn merge_with_env(&mut self) {
        if let Ok(val) = std::env::var("FLIP_DURATION_MS") {
            if let Ok(ms) = val.parse::<f64>() {
                self.animation.duration_ms = ms;
            }
        }
        if let Ok(easing) = std::env::var("FLIP_EASING") {
            self.animation.easing = easing;
        }
        if let Ok(val) = std::env::var("FLIP_SNAP_DELAY_MS") {
            if let Ok(ms) = val.parse::<f64>() {
                self.animation.snap_delay_ms = ms;
            }
        }
        if let Ok(val) = std::env::var("FLIP_RESYNC") {
            if let Some(policy) = ResyncPolicy::parse(&val) {
                self.animation.resync = policy;
            }
        }
        if let Ok(filter) = std::env::var("FLIP_LOG") {
            self.log.filter = Some(filter);
        }
    }

    /// Load configuration with environment variable overrides
    ///
    /// 1. Load from flip.toml (or use defaults if not found)
    /// 2. Override with environment variables if present
    pub fn load() -> Self {
        let mut config = Self::load_or_default();
        config.merge_with_env();
        config
    }
}
