//! Cyclic corner index of a triangle.
//!
//! A [`Corner`] names both a vertex slot of a triangle and the slot of the
//! neighbor across the opposite edge. Arithmetic wraps modulo 3. Lookups that
//! may fail (a vertex or edge not present in a triangle) return
//! `Option<Corner>` instead of a sentinel value.

use std::fmt;
use std::ops::{Add, Sub};

use serde::{Deserialize, Serialize};

/// Index of a triangle corner, always in `0..=2`.
///
/// # Examples
///
/// ```rust
/// use trimesh2d::core::corner::Corner;
///
/// let c = Corner::new(2).unwrap();
/// assert_eq!(c.next().index(), 0);
/// assert_eq!(c.prev().index(), 1);
/// assert_eq!((c + 4).index(), 0);
/// assert_eq!((c - 5).index(), 0);
/// assert!(Corner::new(3).is_none());
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Corner(u8);

impl Corner {
    /// The three corners in increasing order.
    pub const ALL: [Self; 3] = [Self(0), Self(1), Self(2)];

    /// Creates a corner from an index, or `None` if `index > 2`.
    #[must_use]
    pub const fn new(index: usize) -> Option<Self> {
        match index {
            0 => Some(Self(0)),
            1 => Some(Self(1)),
            2 => Some(Self(2)),
            _ => None,
        }
    }

    /// Position of this corner as an array index.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// The following corner in cyclic order.
    #[must_use]
    pub const fn next(self) -> Self {
        Self((self.0 + 1) % 3)
    }

    /// The preceding corner in cyclic order.
    #[must_use]
    pub const fn prev(self) -> Self {
        Self((self.0 + 2) % 3)
    }

    /// Moves `delta` steps around the triangle (negative steps go backwards).
    #[must_use]
    pub fn offset(self, delta: isize) -> Self {
        self + delta.rem_euclid(3).unsigned_abs()
    }
}

impl Add<usize> for Corner {
    type Output = Self;

    fn add(self, rhs: usize) -> Self {
        Self::ALL[(self.index() + rhs % 3) % 3]
    }
}

impl Sub<usize> for Corner {
    type Output = Self;

    fn sub(self, rhs: usize) -> Self {
        Self::ALL[(self.index() + 3 - rhs % 3) % 3]
    }
}

impl fmt::Display for Corner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<u8> for Corner {
    type Error = InvalidCorner;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(usize::from(value)).ok_or(InvalidCorner { value })
    }
}

impl From<Corner> for u8 {
    fn from(corner: Corner) -> Self {
        corner.0
    }
}

/// Error returned when converting an out-of-range value into a [`Corner`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
#[error("Corner index {value} is out of range 0..=2")]
pub struct InvalidCorner {
    /// The rejected value.
    pub value: u8,
}
