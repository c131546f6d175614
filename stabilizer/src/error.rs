use thiserror::Error;

/// Configuration validation failures, fatal before the loop starts.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// A full-scale or conversion factor that must be non-zero is not.
    #[error("{name} must be non-zero")]
    ZeroScale { name: &'static str },

    /// A frequency that must be positive is not.
    #[error("{name} must be positive, got {value}")]
    NonPositive { name: &'static str, value: f64 },

    /// A mounting sign that must be exactly +1 or -1 is not.
    #[error("gyro sign for axis {axis} must be +1 or -1, got {value}")]
    BadSign { axis: usize, value: f64 },
}
