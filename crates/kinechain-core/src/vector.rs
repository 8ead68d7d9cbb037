//! 3-vector helpers shared by the quaternion and chain code.

use std::f64::consts::{PI, TAU};

/// World and local points are plain `f64` 3-vectors.
pub type Vec3 = nalgebra::Vector3<f64>;

/// Shorthand constructor used throughout the workspace.
#[inline]
pub fn vec3(x: f64, y: f64, z: f64) -> Vec3 {
    Vec3::new(x, y, z)
}

/// Point on a box of size `basis`: `basis ∘ rel + abs`, elementwise.
///
/// Used for both a segment's anchor (own dimensions) and a child's
/// attachment point (parent dimensions).
pub fn scaled_offset(basis: &Vec3, rel: &Vec3, abs: &Vec3) -> Vec3 {
    basis.component_mul(rel) + abs
}

/// Wrap an angle into `[-π, π)`.
pub fn wrap_to_pi(angle: f64) -> f64 {
    (angle + PI).rem_euclid(TAU) - PI
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn scaled_offset_is_elementwise() {
        let basis = vec3(3.0, 12.0, 3.0);
        let rel = vec3(0.0, 0.5, -1.0);
        let abs = vec3(1.0, 1.5, 0.0);
        let p = scaled_offset(&basis, &rel, &abs);
        assert_relative_eq!(p.x, 1.0);
        assert_relative_eq!(p.y, 7.5);
        assert_relative_eq!(p.z, -3.0);
    }

    #[test]
    fn wrap_to_pi_range() {
        assert_relative_eq!(wrap_to_pi(0.0), 0.0);
        assert_relative_eq!(wrap_to_pi(3.0 * PI / 2.0), -PI / 2.0, epsilon = 1e-12);
        assert_relative_eq!(wrap_to_pi(-3.0 * PI / 2.0), PI / 2.0, epsilon = 1e-12);
        assert_relative_eq!(wrap_to_pi(PI), -PI, epsilon = 1e-12);
        assert_relative_eq!(wrap_to_pi(5.0 * TAU + 0.25), 0.25, epsilon = 1e-9);
    }
}
