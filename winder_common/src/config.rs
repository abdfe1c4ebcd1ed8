//! Configuration loading and validation.
//!
//! All winder parameters that the reference firmware hard-coded as
//! compile-time constants are run-time configuration here, loaded from a
//! single TOML file and validated before any motion starts.
//!
//! # Usage
//!
//! ```rust,no_run
//! use winder_common::config::{ConfigLoader, WinderConfig};
//! use std::path::Path;
//!
//! let config = WinderConfig::load(Path::new("config/winder.toml")).unwrap();
//! config.validate().unwrap();
//! ```

use crate::consts::{
    DEFAULT_BIG_STEP_DELAY_US, DEFAULT_FEED_ADVANCE_MM, DEFAULT_SMALL_PULSE_WIDTH_US,
    DEFAULT_STEPS_PER_REV,
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Error type for configuration loading operations.
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    /// Configuration file not found at specified path.
    #[error("Configuration file not found")]
    FileNotFound,

    /// TOML parsing failed.
    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    /// Semantic validation failed.
    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

/// Log level for application logging.
///
/// Uses lowercase serde values for TOML compatibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Most verbose, per-pulse tracing information.
    Trace,
    /// Debug information useful during development.
    Debug,
    /// General information about winding progress.
    #[default]
    Info,
    /// Warning messages for potentially problematic situations.
    Warn,
    /// Error messages for serious problems.
    Error,
}

/// Common configuration fields shared across winder applications.
///
/// # TOML Example
///
/// ```toml
/// [shared]
/// log_level = "debug"
/// service_name = "winder-bench-01"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SharedConfig {
    /// Logging verbosity level.
    #[serde(default)]
    pub log_level: LogLevel,

    /// Application instance identifier.
    pub service_name: String,
}

impl SharedConfig {
    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ValidationError` if `service_name` is empty.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.service_name.is_empty() {
            return Err(ConfigError::ValidationError(
                "service_name cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Winding schedule and wire geometry.
///
/// # TOML Example
///
/// ```toml
/// [winding]
/// wire_diameter_mm = 0.15
/// core_diameter_mm = 0.790
/// wiring_distance_mm = 45.0
/// turns_per_layer = 172
/// total_turns = 4040
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WindingConfig {
    /// Wire diameter [mm]. Drives the step-ratio derivation.
    pub wire_diameter_mm: f64,

    /// Core diameter [mm]. Reserved — parsed and sign-checked but not used
    /// by the synchronization algorithm.
    pub core_diameter_mm: f64,

    /// Wiring distance (spool width) [mm]. Reserved — see `core_diameter_mm`.
    pub wiring_distance_mm: f64,

    /// Turns wound per layer.
    pub turns_per_layer: u32,

    /// Target total turns for the whole job.
    pub total_turns: u32,

    /// Hard layer cap. Reserved for spool-bounds checking; the effective
    /// layer count is always derived from `total_turns / turns_per_layer`.
    #[serde(default)]
    pub max_layers: Option<u32>,

    /// Feed advance constant [mm] — numerator of the step-ratio derivation.
    #[serde(default = "default_feed_advance")]
    pub feed_advance_mm: f64,
}

fn default_feed_advance() -> f64 {
    DEFAULT_FEED_ADVANCE_MM
}

impl WindingConfig {
    /// Validate the winding parameters.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ValidationError` for any parameter that would
    /// make the step ratio or layer count meaningless. Motion must never
    /// start from an invalid schedule.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.wire_diameter_mm > 0.0) {
            return Err(ConfigError::ValidationError(format!(
                "wire_diameter_mm must be positive, got {}",
                self.wire_diameter_mm
            )));
        }
        if !(self.core_diameter_mm > 0.0) {
            return Err(ConfigError::ValidationError(format!(
                "core_diameter_mm must be positive, got {}",
                self.core_diameter_mm
            )));
        }
        if !(self.wiring_distance_mm > 0.0) {
            return Err(ConfigError::ValidationError(format!(
                "wiring_distance_mm must be positive, got {}",
                self.wiring_distance_mm
            )));
        }
        if self.turns_per_layer == 0 {
            return Err(ConfigError::ValidationError(
                "turns_per_layer must be positive".to_string(),
            ));
        }
        if self.total_turns == 0 {
            return Err(ConfigError::ValidationError(
                "total_turns must be positive".to_string(),
            ));
        }
        if !(self.feed_advance_mm > 0.0) {
            return Err(ConfigError::ValidationError(format!(
                "feed_advance_mm must be positive, got {}",
                self.feed_advance_mm
            )));
        }
        if self.wire_diameter_mm > self.feed_advance_mm {
            // floor(feed_advance / wire_diameter) would be 0.
            return Err(ConfigError::ValidationError(format!(
                "wire_diameter_mm {} exceeds feed_advance_mm {} (step ratio would be zero)",
                self.wire_diameter_mm, self.feed_advance_mm
            )));
        }
        Ok(())
    }
}

/// Motor step counts and pulse timing.
///
/// # TOML Example
///
/// ```toml
/// [motion]
/// steps_per_rev = 3200
/// big_step_delay_us = 1000
/// small_pulse_width_us = 2
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MotionConfig {
    /// Big-motor full-rotation step count.
    #[serde(default = "default_steps_per_rev")]
    pub steps_per_rev: u32,

    /// Big-motor pulse phase hold [µs] (HIGH phase and LOW phase each).
    #[serde(default = "default_big_step_delay")]
    pub big_step_delay_us: u32,

    /// Small-motor pulse width [µs].
    #[serde(default = "default_small_pulse_width")]
    pub small_pulse_width_us: u32,
}

fn default_steps_per_rev() -> u32 {
    DEFAULT_STEPS_PER_REV
}

fn default_big_step_delay() -> u32 {
    DEFAULT_BIG_STEP_DELAY_US
}

fn default_small_pulse_width() -> u32 {
    DEFAULT_SMALL_PULSE_WIDTH_US
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            steps_per_rev: DEFAULT_STEPS_PER_REV,
            big_step_delay_us: DEFAULT_BIG_STEP_DELAY_US,
            small_pulse_width_us: DEFAULT_SMALL_PULSE_WIDTH_US,
        }
    }
}

impl MotionConfig {
    /// Validate the motion parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.steps_per_rev == 0 {
            return Err(ConfigError::ValidationError(
                "steps_per_rev must be positive".to_string(),
            ));
        }
        if self.big_step_delay_us == 0 {
            return Err(ConfigError::ValidationError(
                "big_step_delay_us must be positive".to_string(),
            ));
        }
        if self.small_pulse_width_us == 0 {
            return Err(ConfigError::ValidationError(
                "small_pulse_width_us must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// HAL backend selection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HalConfig {
    /// Output-line backend name, resolved through the bus registry
    /// (e.g. "simulation").
    #[serde(default = "default_backend")]
    pub backend: String,
}

fn default_backend() -> String {
    "simulation".to_string()
}

impl Default for HalConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
        }
    }
}

/// Top-level winder configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WinderConfig {
    /// Shared service fields.
    pub shared: SharedConfig,
    /// Winding schedule and wire geometry.
    pub winding: WindingConfig,
    /// Step counts and pulse timing.
    #[serde(default)]
    pub motion: MotionConfig,
    /// Backend selection.
    #[serde(default)]
    pub hal: HalConfig,
}

impl WinderConfig {
    /// Validate all sections.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.shared.validate()?;
        self.winding.validate()?;
        self.motion.validate()?;
        if self.hal.backend.is_empty() {
            return Err(ConfigError::ValidationError(
                "hal.backend cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Trait for loading configuration from TOML files.
///
/// # Contract
///
/// - Returns `ConfigError::FileNotFound` if the file does not exist
/// - Returns `ConfigError::ParseError` if TOML syntax is invalid
/// - Semantic validation is a separate `validate()` step on the loaded type
pub trait ConfigLoader: Sized + serde::de::DeserializeOwned {
    /// Load configuration from a TOML file.
    fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::FileNotFound
            } else {
                ConfigError::ParseError(e.to_string())
            }
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }
}

// Blanket implementation for all types that implement DeserializeOwned.
impl<T: serde::de::DeserializeOwned> ConfigLoader for T {}
