//! Unit quaternion value type.
//!
//! Components are stored as `(w, x, y, z)`; index 0 is the scalar part.
//! Every constructor normalises, so a [`Quaternion`] always has unit norm
//! (up to rounding) and `conj()` is its inverse.
//!
//! Composition order: `a.multiply(b)` (or `a * b`) applied to a vector
//! rotates by `b` first, then by `a`.

use std::ops::Mul;

use serde::{Deserialize, Serialize};

use crate::error::RotationError;
use crate::euler::{Axis, EulerConvention, EulerKind};
use crate::vector::{Vec3, wrap_to_pi};

/// Below this length an axis or vector is treated as zero.
const DEGENERATE_NORM: f64 = 1e-12;

/// A rotation as a unit quaternion.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "[f64; 4]", into = "[f64; 4]")]
pub struct Quaternion {
    w: f64,
    x: f64,
    y: f64,
    z: f64,
}

/// Result of [`Quaternion::project`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projection {
    /// Rotation angle about the projection axis, wrapped to `[-π, π)`.
    pub angle: f64,
    /// Angle of the remaining rotation once the axis part is removed.
    pub residual_angle: f64,
    /// The rotation about the projection axis.
    pub projected: Quaternion,
    /// `projected⁻¹ · q`.
    pub residual: Quaternion,
}

impl Default for Quaternion {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Quaternion {
    pub const IDENTITY: Self = Self {
        w: 1.0,
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    // -----------------------------------------------------------------------
    // Construction
    // -----------------------------------------------------------------------

    /// Build from components, normalising.
    pub fn new(w: f64, x: f64, y: f64, z: f64) -> Result<Self, RotationError> {
        if !(w.is_finite() && x.is_finite() && y.is_finite() && z.is_finite()) {
            return Err(RotationError::NonFinite);
        }
        let norm = (w * w + x * x + y * y + z * z).sqrt();
        if norm < DEGENERATE_NORM {
            return Err(RotationError::ZeroNorm);
        }
        Ok(Self {
            w: w / norm,
            x: x / norm,
            y: y / norm,
            z: z / norm,
        })
    }

    /// Build from a `[w, x, y, z]` array, normalising.
    pub fn from_array(q: [f64; 4]) -> Result<Self, RotationError> {
        Self::new(q[0], q[1], q[2], q[3])
    }

    /// Normalise components produced by our own algebra (never zero-norm
    /// for unit inputs).
    fn from_unit_parts(w: f64, x: f64, y: f64, z: f64) -> Self {
        let norm = (w * w + x * x + y * y + z * z).sqrt();
        Self {
            w: w / norm,
            x: x / norm,
            y: y / norm,
            z: z / norm,
        }
    }

    /// Rotation by `angle` (radians) about `axis`. The axis is normalised
    /// first; a zero-length axis is rejected.
    pub fn from_angle_axis(angle: f64, axis: &Vec3) -> Result<Self, RotationError> {
        if !angle.is_finite() || !axis.iter().all(|c| c.is_finite()) {
            return Err(RotationError::NonFinite);
        }
        let len = axis.norm();
        if len < DEGENERATE_NORM {
            return Err(RotationError::ZeroAxis);
        }
        let (s, c) = (angle / 2.0).sin_cos();
        let k = axis / len;
        Ok(Self::from_unit_parts(c, k.x * s, k.y * s, k.z * s))
    }

    /// Rotation by `angle` about a coordinate axis.
    pub fn about(angle: f64, axis: Axis) -> Result<Self, RotationError> {
        if !angle.is_finite() {
            return Err(RotationError::NonFinite);
        }
        let (s, c) = (angle / 2.0).sin_cos();
        let mut q = [c, 0.0, 0.0, 0.0];
        q[axis.index()] = s;
        Ok(Self::from_unit_parts(q[0], q[1], q[2], q[3]))
    }

    /// Yaw-only rotation about the world z axis.
    pub fn heading(yaw: f64) -> Result<Self, RotationError> {
        Self::about(yaw, Axis::Z)
    }

    /// Compose three single-axis rotations.
    ///
    /// Intrinsic: `q = R(a0) · R(a1) · R(a2)`, each new factor multiplied
    /// on the right of the running product (rotations about the moving
    /// frame). Extrinsic: `q = R(a2) · R(a1) · R(a0)`, each new factor
    /// multiplied on the left (rotations about the fixed frame).
    pub fn from_euler_angles(
        angles: [f64; 3],
        convention: EulerConvention,
        intrinsic: bool,
    ) -> Result<Self, RotationError> {
        let [a, b, c] = convention.axes();
        let first = Self::about(angles[0], a)?;
        let second = Self::about(angles[1], b)?;
        let third = Self::about(angles[2], c)?;
        Ok(if intrinsic {
            first * second * third
        } else {
            third * (second * first)
        })
    }

    /// The rotation `q` with `q.rotate(v1) ≈ v2 / |v2| * |v1|`.
    ///
    /// Parallel inputs yield the identity (axis taken as `v1`). For
    /// anti-parallel inputs the cross product vanishes; the axis is then
    /// any unit vector perpendicular to `v1` and the angle is π.
    pub fn from_two_vectors(v1: &Vec3, v2: &Vec3) -> Result<Self, RotationError> {
        let n1 = v1.norm();
        let n2 = v2.norm();
        if !(n1.is_finite() && n2.is_finite()) {
            return Err(RotationError::NonFinite);
        }
        if n1 < DEGENERATE_NORM || n2 < DEGENERATE_NORM {
            return Err(RotationError::ZeroVector);
        }
        let cos = (v1.dot(v2) / (n1 * n2)).clamp(-1.0, 1.0);
        let angle = cos.acos();
        let cross = v1.cross(v2);
        let axis = if cross.norm() > DEGENERATE_NORM * n1 * n2 {
            cross
        } else if cos > 0.0 {
            *v1
        } else {
            perpendicular(v1)
        };
        Self::from_angle_axis(angle, &axis)
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    pub const fn w(&self) -> f64 {
        self.w
    }

    pub const fn x(&self) -> f64 {
        self.x
    }

    pub const fn y(&self) -> f64 {
        self.y
    }

    pub const fn z(&self) -> f64 {
        self.z
    }

    /// `[w, x, y, z]`.
    pub const fn to_array(&self) -> [f64; 4] {
        [self.w, self.x, self.y, self.z]
    }

    /// Vector part `(x, y, z)`.
    pub fn vector(&self) -> Vec3 {
        Vec3::new(self.x, self.y, self.z)
    }

    pub fn norm(&self) -> f64 {
        (self.w * self.w + self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    // -----------------------------------------------------------------------
    // Algebra
    // -----------------------------------------------------------------------

    /// Hamilton product `self · other`.
    #[must_use]
    pub fn multiply(&self, other: &Self) -> Self {
        let (w1, x1, y1, z1) = (self.w, self.x, self.y, self.z);
        let (w2, x2, y2, z2) = (other.w, other.x, other.y, other.z);
        Self::from_unit_parts(
            w1 * w2 - x1 * x2 - y1 * y2 - z1 * z2,
            w1 * x2 + x1 * w2 + y1 * z2 - z1 * y2,
            w1 * y2 - x1 * z2 + y1 * w2 + z1 * x2,
            w1 * z2 + x1 * y2 - y1 * x2 + z1 * w2,
        )
    }

    /// Conjugate, which is the inverse for a unit quaternion.
    #[must_use]
    pub const fn conj(&self) -> Self {
        Self {
            w: self.w,
            x: -self.x,
            y: -self.y,
            z: -self.z,
        }
    }

    /// Rotate a vector with the closed-form expansion of `q v q*`.
    pub fn rotate(&self, v: &Vec3) -> Vec3 {
        let (w, x, y, z) = (self.w, self.x, self.y, self.z);
        Vec3::new(
            (1.0 - 2.0 * y * y - 2.0 * z * z) * v.x
                + 2.0 * v.y * (y * x - w * z)
                + 2.0 * v.z * (w * y + z * x),
            2.0 * v.x * (w * z + y * x)
                + v.y * (1.0 - 2.0 * x * x - 2.0 * z * z)
                + 2.0 * v.z * (y * z - x * w),
            2.0 * v.x * (z * x - w * y)
                + 2.0 * v.y * (w * x + z * y)
                + v.z * (1.0 - 2.0 * x * x - 2.0 * y * y),
        )
    }

    /// Rotation angle `2·acos(w)`, in `[0, 2π]`.
    pub fn angle(&self) -> f64 {
        2.0 * self.w.clamp(-1.0, 1.0).acos()
    }

    /// Smallest angle between two orientations, in `[0, π]`. `q` and `-q`
    /// are the same orientation.
    pub fn angle_to(&self, other: &Self) -> f64 {
        let d = self.conj().multiply(other);
        2.0 * d.vector().norm().atan2(d.w.abs())
    }

    /// Split into a rotation about `axis` and the residual rotation.
    pub fn project(&self, axis: &Vec3) -> Result<Projection, RotationError> {
        let len = axis.norm();
        if len < DEGENERATE_NORM {
            return Err(RotationError::ZeroAxis);
        }
        let k = axis / len;
        let angle = wrap_to_pi(2.0 * k.dot(&self.vector()).atan2(self.w));
        let projected = Self::from_angle_axis(angle, &k)?;
        let residual = projected.conj().multiply(self);
        Ok(Projection {
            angle,
            residual_angle: residual.angle(),
            projected,
            residual,
        })
    }

    // -----------------------------------------------------------------------
    // Euler angles
    // -----------------------------------------------------------------------

    /// Decompose into three angles for `convention`.
    ///
    /// Proper Euler conventions (`zxz`, …) take the middle angle from an
    /// `acos`, Tait-Bryan conventions (`zyx`, …) from an `asin`. Both
    /// arguments are clamped to `[-1, 1]` so rounding at the gimbal-lock
    /// boundary cannot produce NaN. With `intrinsic` the axis order is
    /// reversed on input and the angle order on output.
    pub fn euler_angles(&self, convention: EulerConvention, intrinsic: bool) -> [f64; 3] {
        let convention = if intrinsic {
            convention.reversed()
        } else {
            convention
        };
        let [a_axis, b_axis, c_axis] = convention.axes();
        let s = convention.sign();
        let q = self.to_array();
        let q0 = q[0];
        let a = q[a_axis.index()];
        let b = q[b_axis.index()];

        let (angle1, angle2, angle3) = match convention.kind() {
            EulerKind::Proper => {
                let d = q[a_axis.remaining(b_axis).index()];
                (
                    (a * b - s * d * q0).atan2(b * q0 + s * a * d),
                    (q0 * q0 + a * a - b * b - d * d).clamp(-1.0, 1.0).acos(),
                    (a * b + s * d * q0).atan2(b * q0 - s * a * d),
                )
            }
            EulerKind::TaitBryan => {
                let c = q[c_axis.index()];
                (
                    (2.0 * (a * q0 + s * b * c)).atan2(q0 * q0 - a * a - b * b + c * c),
                    (2.0 * (b * q0 - s * a * c)).clamp(-1.0, 1.0).asin(),
                    (2.0 * (s * a * b + c * q0)).atan2(q0 * q0 + a * a - b * b - c * c),
                )
            }
        };

        if intrinsic {
            [angle3, angle2, angle1]
        } else {
            [angle1, angle2, angle3]
        }
    }
}

/// A unit vector perpendicular to `v` (assumed non-zero).
fn perpendicular(v: &Vec3) -> Vec3 {
    let (ax, ay, az) = (v.x.abs(), v.y.abs(), v.z.abs());
    let least = if ax <= ay && ax <= az {
        Axis::X
    } else if ay <= az {
        Axis::Y
    } else {
        Axis::Z
    };
    v.cross(&least.unit()).normalize()
}

impl Mul for Quaternion {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self {
        self.multiply(&rhs)
    }
}

impl TryFrom<[f64; 4]> for Quaternion {
    type Error = RotationError;

    fn try_from(q: [f64; 4]) -> Result<Self, Self::Error> {
        Self::from_array(q)
    }
}

impl From<Quaternion> for [f64; 4] {
    fn from(q: Quaternion) -> Self {
        q.to_array()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
