// kinechain-core: quaternion algebra, vector helpers, config and errors for kinechain.

/// Version of this crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod config;
pub mod error;
pub mod euler;
pub mod quaternion;
pub mod vector;

pub use config::EngineConfig;
pub use error::{ConfigError, ConventionError, RotationError};
pub use euler::{Axis, EulerConvention, EulerKind};
pub use quaternion::{Projection, Quaternion};
pub use vector::{Vec3, scaled_offset, vec3, wrap_to_pi};

pub mod prelude {
    pub use crate::config::EngineConfig;
    pub use crate::error::{ConfigError, ConventionError, RotationError};
    pub use crate::euler::{Axis, EulerConvention};
    pub use crate::quaternion::Quaternion;
    pub use crate::vector::{Vec3, scaled_offset, vec3};
}
