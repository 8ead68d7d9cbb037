//! Axis identifiers and the 12 valid Euler angle conventions.

use std::fmt;
use std::str::FromStr;

use crate::error::ConventionError;
use crate::vector::{Vec3, vec3};

// ---------------------------------------------------------------------------
// Axis
// ---------------------------------------------------------------------------

/// A coordinate axis.
///
/// The discriminant is the quaternion component index that carries this
/// axis (`w` = 0, `x` = 1, `y` = 2, `z` = 3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    X = 1,
    Y = 2,
    Z = 3,
}

impl Axis {
    /// Quaternion component index (1, 2 or 3).
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Unit vector along this axis.
    pub fn unit(self) -> Vec3 {
        match self {
            Self::X => vec3(1.0, 0.0, 0.0),
            Self::Y => vec3(0.0, 1.0, 0.0),
            Self::Z => vec3(0.0, 0.0, 1.0),
        }
    }

    /// The axis following this one in cyclic order x → y → z → x.
    pub const fn next(self) -> Self {
        match self {
            Self::X => Self::Y,
            Self::Y => Self::Z,
            Self::Z => Self::X,
        }
    }

    /// The axis that is neither `self` nor `other`.
    ///
    /// Returns `self` when both are equal.
    pub const fn remaining(self, other: Self) -> Self {
        match (self, other) {
            (Self::X, Self::Y) | (Self::Y, Self::X) => Self::Z,
            (Self::X, Self::Z) | (Self::Z, Self::X) => Self::Y,
            (Self::Y, Self::Z) | (Self::Z, Self::Y) => Self::X,
            _ => self,
        }
    }

    const fn letter(self) -> char {
        match self {
            Self::X => 'x',
            Self::Y => 'y',
            Self::Z => 'z',
        }
    }
}

impl TryFrom<char> for Axis {
    type Error = ConventionError;

    /// Accepts `x`/`y`/`z`, upper case, the quaternion units `i`/`j`/`k`
    /// and the digits `1`/`2`/`3`.
    fn try_from(c: char) -> Result<Self, Self::Error> {
        match c {
            'x' | 'X' | 'i' | '1' => Ok(Self::X),
            'y' | 'Y' | 'j' | '2' => Ok(Self::Y),
            'z' | 'Z' | 'k' | '3' => Ok(Self::Z),
            other => Err(ConventionError::InvalidAxis(other)),
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.letter())
    }
}

// ---------------------------------------------------------------------------
// EulerConvention
// ---------------------------------------------------------------------------

/// Family of a 3-angle decomposition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EulerKind {
    /// First and third axis coincide (e.g. `zxz`).
    Proper,
    /// All three axes distinct (e.g. `zyx`).
    TaitBryan,
}

/// An ordered axis triple such as `"zyx"` or `"zxz"`.
///
/// Only the 12 triples whose consecutive axes differ are representable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EulerConvention {
    axes: [Axis; 3],
}

impl EulerConvention {
    /// Build a convention from three axes.
    pub fn new(a: Axis, b: Axis, c: Axis) -> Result<Self, ConventionError> {
        if a == b || b == c {
            return Err(ConventionError::RepeatedAxis(format!(
                "{}{}{}",
                a.letter(),
                b.letter(),
                c.letter()
            )));
        }
        Ok(Self { axes: [a, b, c] })
    }

    /// The axes in application order.
    pub const fn axes(&self) -> [Axis; 3] {
        self.axes
    }

    pub fn kind(&self) -> EulerKind {
        if self.axes[0] == self.axes[2] {
            EulerKind::Proper
        } else {
            EulerKind::TaitBryan
        }
    }

    /// `+1` if the first two axes are in cyclic order, `-1` otherwise.
    pub fn sign(&self) -> f64 {
        if self.axes[1] == self.axes[0].next() {
            1.0
        } else {
            -1.0
        }
    }

    /// The same triple read back to front.
    #[must_use]
    pub const fn reversed(&self) -> Self {
        Self {
            axes: [self.axes[2], self.axes[1], self.axes[0]],
        }
    }

    /// All 12 valid conventions.
    pub fn all() -> Vec<Self> {
        let axes = [Axis::X, Axis::Y, Axis::Z];
        let mut out = Vec::with_capacity(12);
        for a in axes {
            for b in axes {
                for c in axes {
                    if let Ok(conv) = Self::new(a, b, c) {
                        out.push(conv);
                    }
                }
            }
        }
        out
    }
}

impl FromStr for EulerConvention {
    type Err = ConventionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let chars: Vec<char> = s.chars().collect();
        let [a, b, c] = chars[..] else {
            return Err(ConventionError::WrongLength(s.to_owned()));
        };
        Self::new(Axis::try_from(a)?, Axis::try_from(b)?, Axis::try_from(c)?)
    }
}

impl fmt::Display for EulerConvention {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c] = self.axes;
        write!(f, "{a}{b}{c}")
    }
}
