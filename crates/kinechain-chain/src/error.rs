//! Error types for chain construction, calibration and sample decoding.

use kinechain_core::{ConfigError, RotationError};
use kinechain_spec::TopologyError;

/// Errors raised by [`Chain`](crate::Chain) operations.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ChainError {
    /// The segment set cannot be ordered parents-first.
    #[error(transparent)]
    Topology(#[from] TopologyError),

    /// A segment name not present in the chain.
    #[error("unknown segment: {0:?}")]
    UnknownSegment(String),

    /// A calibration value could not be turned into a rotation.
    #[error(transparent)]
    Rotation(#[from] RotationError),

    /// The engine configuration failed validation.
    #[error("invalid engine config: {0}")]
    Config(String),
}

impl From<ConfigError> for ChainError {
    fn from(err: ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}

/// Errors raised while decoding a [`Sample`](crate::Sample).
#[derive(Debug, thiserror::Error)]
pub enum SampleError {
    #[error("sample parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// The top level is not a JSON object.
    #[error("sample must be a JSON object")]
    NotAnObject,

    /// An array leaf that is not four numbers `[w, x, y, z]`.
    #[error("signal {key:?}: expected [w, x, y, z], got {found}")]
    InvalidLeaf { key: String, found: String },

    /// A quaternion leaf has zero norm or non-finite components.
    #[error("signal {key:?}: {source}")]
    Rotation {
        key: String,
        source: RotationError,
    },
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
