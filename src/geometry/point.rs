//! Three-component point type used for vertex positions.
//!
//! Only `x` and `y` drive the 2D predicates; `z` is carried along as an
//! elevation and participates in the 3D quantities used by
//! [`Mesh::laplacian`](crate::core::mesh::Mesh::laplacian).

use std::ops::{Add, AddAssign, Div, Mul, Neg, Sub, SubAssign};

use serde::{Deserialize, Serialize};

/// A point (or vector) in 3D space.
///
/// # Examples
///
/// ```rust
/// use trimesh2d::geometry::point::Point;
///
/// let a = Point::new(1.0, 0.0, 0.0);
/// let b = Point::new(0.0, 1.0, 0.0);
/// assert_eq!(a.cross(b), Point::new(0.0, 0.0, 1.0));
/// assert_eq!(a.dot(b), 0.0);
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// First coordinate.
    pub x: f64,
    /// Second coordinate.
    pub y: f64,
    /// Elevation.
    pub z: f64,
}

impl Point {
    /// Coordinates stored for the sentinel vertex at infinity.
    pub const INFINITE: Self = Self {
        x: 0.0,
        y: 0.0,
        z: f64::INFINITY,
    };

    /// Origin.
    pub const ORIGIN: Self = Self {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    /// Creates a point from three coordinates.
    #[must_use]
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Creates a point at elevation zero.
    #[must_use]
    pub const fn new_2d(x: f64, y: f64) -> Self {
        Self { x, y, z: 0.0 }
    }

    /// Returns `true` if all three coordinates are finite.
    #[must_use]
    pub const fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }

    /// Returns `true` if the planar coordinates are finite.
    ///
    /// The elevation may still be infinite, which is how the sentinel vertex is stored.
    #[must_use]
    pub const fn is_finite_2d(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    /// Dot product.
    #[must_use]
    pub fn dot(self, other: Self) -> f64 {
        self.z.mul_add(other.z, self.x.mul_add(other.x, self.y * other.y))
    }

    /// Cross product.
    #[must_use]
    pub fn cross(self, other: Self) -> Self {
        Self {
            x: self.y.mul_add(other.z, -(self.z * other.y)),
            y: self.z.mul_add(other.x, -(self.x * other.z)),
            z: self.x.mul_add(other.y, -(self.y * other.x)),
        }
    }

    /// Squared Euclidean norm.
    #[must_use]
    pub fn squared_norm(self) -> f64 {
        self.dot(self)
    }

    /// Euclidean norm.
    #[must_use]
    pub fn norm(self) -> f64 {
        self.squared_norm().sqrt()
    }

    /// Returns the unit vector with the same direction.
    ///
    /// The zero vector has no direction and is returned unchanged.
    #[must_use]
    pub fn normalize(self) -> Self {
        let norm = self.norm();
        if norm > 0.0 { self / norm } else { self }
    }

    /// Projection onto the `z = 0` plane.
    #[must_use]
    pub const fn xy(self) -> [f64; 2] {
        [self.x, self.y]
    }
}

impl Add for Point {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl AddAssign for Point {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl Sub for Point {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl SubAssign for Point {
    fn sub_assign(&mut self, rhs: Self) {
        *self = *self - rhs;
    }
}

impl Neg for Point {
    type Output = Self;

    fn neg(self) -> Self {
        Self::new(-self.x, -self.y, -self.z)
    }
}

impl Mul<f64> for Point {
    type Output = Self;

    fn mul(self, rhs: f64) -> Self {
        Self::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

impl Div<f64> for Point {
    type Output = Self;

    fn div(self, rhs: f64) -> Self {
        Self::new(self.x / rhs, self.y / rhs, self.z / rhs)
    }
}

impl From<[f64; 3]> for Point {
    fn from([x, y, z]: [f64; 3]) -> Self {
        Self::new(x, y, z)
    }
}

impl From<[f64; 2]> for Point {
    fn from([x, y]: [f64; 2]) -> Self {
        Self::new_2d(x, y)
    }
}

impl From<Point> for [f64; 3] {
    fn from(p: Point) -> Self {
        [p.x, p.y, p.z]
    }
}

// =============================================================================
// TESTS
// =============================================================================
