//! Resolved segment chains and pose propagation for kinechain.
//!
//! A [`Chain`] is built once from a [`SegmentSet`](kinechain_spec::SegmentSet)
//! and then driven by [`Sample`]s. Every sample recomputes each node's world
//! orientation (raw sample composed with the segment's calibration) and world
//! position, parents before children.
//!
//! ```text
//! SegmentSet ──► Chain::build ──► Chain ◄── apply_sample(Sample)
//!                                   │
//!                     CalibrationState (heading, slider)
//! ```

/// Version of this crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod calibration;
pub mod chain;
pub mod error;
pub mod node;
pub mod pose;
pub mod sample;

// ---------------------------------------------------------------------------
// Re-exports
// ---------------------------------------------------------------------------

pub use calibration::{CalibrationState, SegmentCalibration};
pub use chain::Chain;
pub use error::{ChainError, SampleError};
pub use node::{ChainNode, Joint};
pub use pose::PoseReport;
pub use sample::Sample;
