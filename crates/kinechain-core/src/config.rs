use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

// ---------------------------------------------------------------------------
// Serde default functions
// ---------------------------------------------------------------------------

const fn default_iteration_factor() -> usize {
    500
}
const fn default_true() -> bool {
    true
}
const fn default_joint_diameter() -> f64 {
    3.0
}

// ---------------------------------------------------------------------------
// EngineConfig
// ---------------------------------------------------------------------------

/// Chain engine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Resolver visit budget per segment (default: 500). The cap on
    /// resolution work is `iteration_factor * segment_count`.
    #[serde(default = "default_iteration_factor")]
    pub iteration_factor: usize,

    /// World position [x, y, z] of every root segment.
    #[serde(default)]
    pub root_position: [f64; 3],

    /// Log a warning when a sample lacks a segment's signal.
    #[serde(default = "default_true")]
    pub warn_missing_signal: bool,

    /// Include the final per-signal orientation map in each pose report.
    #[serde(default = "default_true")]
    pub emit_final_orientations: bool,

    /// Joint marker diameter. Presets also use it as the gap between
    /// neighbouring segments.
    #[serde(default = "default_joint_diameter")]
    pub joint_diameter: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            iteration_factor: default_iteration_factor(),
            root_position: [0.0; 3],
            warn_missing_signal: true,
            emit_final_orientations: true,
            joint_diameter: default_joint_diameter(),
        }
    }
}

impl EngineConfig {
    /// Validate configuration. Returns Err on invalid values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.iteration_factor == 0 {
            return Err(ConfigError::InvalidValue {
                field: "iteration_factor".into(),
                message: "must be > 0".into(),
            });
        }
        if !self.joint_diameter.is_finite() || self.joint_diameter < 0.0 {
            return Err(ConfigError::InvalidValue {
                field: "joint_diameter".into(),
                message: format!("must be finite and >= 0, got {}", self.joint_diameter),
            });
        }
        if !self.root_position.iter().all(|c| c.is_finite()) {
            return Err(ConfigError::InvalidValue {
                field: "root_position".into(),
                message: "components must be finite".into(),
            });
        }
        Ok(())
    }

    /// Resolver budget for a set of `segment_count` segments.
    pub const fn iteration_limit(&self, segment_count: usize) -> usize {
        self.iteration_factor.saturating_mul(segment_count)
    }

    /// Parse and validate a TOML string.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }
}
