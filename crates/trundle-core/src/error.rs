use thiserror::Error;

/// Top-level error type for trundle-core.
#[derive(Debug, Error)]
pub enum TrundleError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Model error: {0}")]
    Model(#[from] ModelError),

    #[error("Simulation error: {0}")]
    Simulation(#[from] SimError),
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid horizon: {0} (must be finite and > 0)")]
    InvalidHorizon(f64),

    #[error("num_steps must be >= 1")]
    InvalidNumSteps,

    #[error("Unsupported stage count: {0} (explicit schemes support 1, 2 or 4)")]
    UnsupportedStageCount(usize),
}

/// Model contract violations.
///
/// Copy + static payloads for cheap propagation in hot paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ModelError {
    #[error("Parameter count mismatch: model has {expected} parameters, got {got}")]
    ParamCountMismatch { expected: usize, got: usize },
}

/// Simulation runtime errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SimError {
    #[error("Integration diverged: non-finite value in state or sensitivities")]
    StateNotFinite,
}
