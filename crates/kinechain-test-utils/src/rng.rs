//! Deterministic RNG utilities for reproducible tests.

use nalgebra::Vector3;
use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Create a deterministic `ChaCha8Rng` from a seed.
///
/// All test randomization should go through this to ensure reproducibility.
pub fn seeded_rng(seed: u64) -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(seed)
}

/// A vector with each component uniform in `[-scale, scale)`, rejecting
/// near-zero draws so it is always usable as a rotation axis.
pub fn random_vector(rng: &mut impl Rng, scale: f64) -> Vector3<f64> {
    loop {
        let v = Vector3::new(
            rng.gen_range(-scale..scale),
            rng.gen_range(-scale..scale),
            rng.gen_range(-scale..scale),
        );
        if v.norm() > 1e-3 * scale {
            return v;
        }
    }
}

/// Uniformly distributed unit quaternion components `[w, x, y, z]`
/// (Shoemake's method).
pub fn random_quaternion_components(rng: &mut impl Rng) -> [f64; 4] {
    use std::f64::consts::TAU;
    let u1: f64 = rng.r#gen();
    let u2: f64 = rng.r#gen();
    let u3: f64 = rng.r#gen();
    let a = (1.0 - u1).sqrt();
    let b = u1.sqrt();
    [
        b * (TAU * u3).cos(),
        a * (TAU * u2).sin(),
        a * (TAU * u2).cos(),
        b * (TAU * u3).sin(),
    ]
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
