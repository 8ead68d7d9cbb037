//! Shared test fixtures and utilities for kinechain crates.
//!
//! Provides deterministic RNG setup and random rotation / vector inputs
//! for property-style tests. Kept free of workspace dependencies so any
//! crate can use it as a dev-dependency.

pub mod rng;

// ---------------------------------------------------------------------------
// Re-exports for convenience
// ---------------------------------------------------------------------------

pub use rng::{random_quaternion_components, random_vector, seeded_rng};
