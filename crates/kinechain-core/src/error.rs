use thiserror::Error;

/// Invalid input to a rotation constructor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RotationError {
    #[error("degenerate rotation input: zero-length axis")]
    ZeroAxis,

    #[error("degenerate rotation input: zero-length vector")]
    ZeroVector,

    #[error("quaternion has zero norm")]
    ZeroNorm,

    #[error("quaternion has a non-finite component")]
    NonFinite,
}

/// Invalid Euler axis convention.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConventionError {
    #[error("invalid axis identifier: {0:?}")]
    InvalidAxis(char),

    #[error("Euler convention must name exactly 3 axes, got {0:?}")]
    WrongLength(String),

    #[error("consecutive Euler axes must differ: {0:?}")]
    RepeatedAxis(String),
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },
}
