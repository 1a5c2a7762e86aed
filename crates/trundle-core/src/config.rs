use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

// ---------------------------------------------------------------------------
// Serde default functions
// ---------------------------------------------------------------------------

const fn default_horizon() -> f64 {
    0.2
}
const fn default_num_stages() -> usize {
    4
}
const fn default_num_steps() -> usize {
    1
}
const fn default_newton_iter() -> usize {
    3
}

// ---------------------------------------------------------------------------
// SimConfig
// ---------------------------------------------------------------------------

/// Simulation solver configuration.
///
/// Fixed at session creation; the integrator is built from these values
/// once and reused across repeated solves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimConfig {
    /// Integration horizon per solve, in seconds (default: 0.2).
    #[serde(default = "default_horizon")]
    pub horizon: f64,

    /// Number of Runge-Kutta stages (default: 4). Supported: 1, 2, 4.
    #[serde(default = "default_num_stages")]
    pub num_stages: usize,

    /// Number of integration steps over the horizon (default: 1).
    #[serde(default = "default_num_steps")]
    pub num_steps: usize,

    /// Newton iterations per stage (default: 3). Only meaningful for
    /// implicit schemes; carried as configuration surface and ignored
    /// by the explicit integrator.
    #[serde(default = "default_newton_iter")]
    pub newton_iter: usize,

    /// Reuse stage Jacobians across Newton iterations (default: false).
    /// Only meaningful for implicit schemes.
    #[serde(default)]
    pub jac_reuse: bool,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            horizon: default_horizon(),
            num_stages: default_num_stages(),
            num_steps: default_num_steps(),
            newton_iter: default_newton_iter(),
            jac_reuse: false,
        }
    }
}

impl SimConfig {
    /// Validate configuration. Returns Err on invalid values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.horizon.is_finite() || self.horizon <= 0.0 {
            return Err(ConfigError::InvalidHorizon(self.horizon));
        }
        if self.num_steps == 0 {
            return Err(ConfigError::InvalidNumSteps);
        }
        if !matches!(self.num_stages, 1 | 2 | 4) {
            return Err(ConfigError::UnsupportedStageCount(self.num_stages));
        }
        Ok(())
    }

    /// Step size of one integration step.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn step_size(&self) -> f64 {
        self.horizon / self.num_steps as f64
    }

    /// Load from TOML file.
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
