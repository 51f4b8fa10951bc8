//! Geometric predicates for planar triangulations.
//!
//! Both predicates work on the `x`/`y` coordinates only. They evaluate the
//! determinant in plain `f64` and classify it against a tolerance scaled to the
//! magnitude of the products that formed it, so nearly collinear (or nearly
//! cocircular) configurations are reported as degenerate instead of being given
//! an arbitrary sign.

use crate::geometry::point::Point;

/// Multiplier applied to `f64::EPSILON` when forming tolerances.
pub const TOLERANCE_FACTOR: f64 = 16.0;

/// Represents the position of a point relative to a circumcircle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InSphere {
    /// The point is outside the circumcircle
    OUTSIDE,
    /// The point is on the circumcircle (within numerical tolerance)
    BOUNDARY,
    /// The point is inside the circumcircle
    INSIDE,
}

impl std::fmt::Display for InSphere {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::OUTSIDE => write!(f, "OUTSIDE"),
            Self::BOUNDARY => write!(f, "BOUNDARY"),
            Self::INSIDE => write!(f, "INSIDE"),
        }
    }
}

/// Represents the orientation of a point triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    /// Clockwise (determinant < 0)
    NEGATIVE,
    /// Collinear (determinant ≈ 0)
    DEGENERATE,
    /// Counterclockwise (determinant > 0)
    POSITIVE,
}

impl std::fmt::Display for Orientation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NEGATIVE => write!(f, "NEGATIVE"),
            Self::DEGENERATE => write!(f, "DEGENERATE"),
            Self::POSITIVE => write!(f, "POSITIVE"),
        }
    }
}

impl Orientation {
    /// Reverses the orientation.
    #[must_use]
    pub const fn flip(self) -> Self {
        match self {
            Self::NEGATIVE => Self::POSITIVE,
            Self::DEGENERATE => Self::DEGENERATE,
            Self::POSITIVE => Self::NEGATIVE,
        }
    }
}

fn classify(det: f64, tolerance: f64) -> Orientation {
    if det > tolerance {
        Orientation::POSITIVE
    } else if det < -tolerance {
        Orientation::NEGATIVE
    } else {
        Orientation::DEGENERATE
    }
}

/// Twice the signed area of the triangle `(a, b, c)`.
///
/// Positive when `c` lies to the left of the directed line `a → b`.
#[must_use]
pub fn orient2d(a: &Point, b: &Point, c: &Point) -> f64 {
    let (ux, uy) = (b.x - a.x, b.y - a.y);
    let (vx, vy) = (c.x - a.x, c.y - a.y);
    ux.mul_add(vy, -(uy * vx))
}

/// Orientation of the triple `(a, b, c)`.
///
/// The determinant `u.x * v.y - u.y * v.x` (with `u = b - a`, `v = c - a`) is
/// treated as zero when its magnitude does not exceed
/// `16 * EPSILON * (|u.x * v.y| + |u.y * v.x|)`.
///
/// # Examples
///
/// ```rust
/// use trimesh2d::geometry::point::Point;
/// use trimesh2d::geometry::predicates::{Orientation, orientation_2d};
///
/// let a = Point::new_2d(0.0, 0.0);
/// let b = Point::new_2d(1.0, 0.0);
/// assert_eq!(orientation_2d(&a, &b, &Point::new_2d(0.0, 1.0)), Orientation::POSITIVE);
/// assert_eq!(orientation_2d(&a, &b, &Point::new_2d(2.0, 0.0)), Orientation::DEGENERATE);
/// ```
#[must_use]
pub fn orientation_2d(a: &Point, b: &Point, c: &Point) -> Orientation {
    let (ux, uy) = (b.x - a.x, b.y - a.y);
    let (vx, vy) = (c.x - a.x, c.y - a.y);
    let lhs = ux * vy;
    let rhs = uy * vx;
    let tolerance = TOLERANCE_FACTOR * f64::EPSILON * (lhs.abs() + rhs.abs());
    classify(lhs - rhs, tolerance)
}

/// Tests whether `d` lies inside the circumcircle of the triangle `(a, b, c)`.
///
/// The points are lifted onto the paraboloid `z = x² + y²` and the orientation
/// of the lifted tetrahedron is evaluated relative to `d`. The raw determinant is
/// positive for "inside" only when `(a, b, c)` is counterclockwise, so the result
/// is normalized by the triangle's orientation and the predicate is independent
/// of vertex order. A degenerate triangle has no circumcircle and yields
/// [`InSphere::BOUNDARY`].
///
/// # Examples
///
/// ```rust
/// use trimesh2d::geometry::point::Point;
/// use trimesh2d::geometry::predicates::{InSphere, incircle};
///
/// let a = Point::new_2d(0.0, 0.0);
/// let b = Point::new_2d(1.0, 0.0);
/// let c = Point::new_2d(0.0, 1.0);
/// assert_eq!(incircle(&a, &b, &c, &Point::new_2d(0.9, 0.9)), InSphere::INSIDE);
/// assert_eq!(incircle(&a, &b, &c, &Point::new_2d(2.0, 2.0)), InSphere::OUTSIDE);
/// assert_eq!(incircle(&a, &b, &c, &Point::new_2d(1.0, 1.0)), InSphere::BOUNDARY);
/// ```
#[must_use]
pub fn incircle(a: &Point, b: &Point, c: &Point, d: &Point) -> InSphere {
    let orientation = orientation_2d(a, b, c);
    if orientation == Orientation::DEGENERATE {
        return InSphere::BOUNDARY;
    }

    let (adx, ady) = (a.x - d.x, a.y - d.y);
    let (bdx, bdy) = (b.x - d.x, b.y - d.y);
    let (cdx, cdy) = (c.x - d.x, c.y - d.y);

    let alift = adx.mul_add(adx, ady * ady);
    let blift = bdx.mul_add(bdx, bdy * bdy);
    let clift = cdx.mul_add(cdx, cdy * cdy);

    let bc = bdx.mul_add(cdy, -(cdx * bdy));
    let ca = cdx.mul_add(ady, -(adx * cdy));
    let ab = adx.mul_add(bdy, -(bdx * ady));
    let det = clift.mul_add(ab, alift.mul_add(bc, blift * ca));

    let permanent = ((bdx * cdy).abs() + (cdx * bdy).abs()) * alift
        + ((cdx * ady).abs() + (adx * cdy).abs()) * blift
        + ((adx * bdy).abs() + (bdx * ady).abs()) * clift;
    let tolerance = TOLERANCE_FACTOR * f64::EPSILON * permanent;

    let normalized = match classify(det, tolerance) {
        Orientation::DEGENERATE => return InSphere::BOUNDARY,
        side if orientation == Orientation::NEGATIVE => side.flip(),
        side => side,
    };

    match normalized {
        Orientation::POSITIVE => InSphere::INSIDE,
        Orientation::NEGATIVE => InSphere::OUTSIDE,
        Orientation::DEGENERATE => InSphere::BOUNDARY,
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn p(x: f64, y: f64) -> Point {
        Point::new_2d(x, y)
    }

    #[test]
    fn orientation_signs() {
        let a = p(0.0, 0.0);
        let b = p(1.0, 0.0);
        assert_eq!(orientation_2d(&a, &b, &p(0.5, 1.0)), Orientation::POSITIVE);
        assert_eq!(orientation_2d(&a, &b, &p(0.5, -1.0)), Orientation::NEGATIVE);
        assert_eq!(orientation_2d(&a, &b, &p(3.0, 0.0)), Orientation::DEGENERATE);
        assert_eq!(orientation_2d(&a, &a, &b), Orientation::DEGENERATE);
    }

    #[test]
    fn orientation_ignores_elevation() {
        let a = Point::new(0.0, 0.0, 10.0);
        let b = Point::new(1.0, 0.0, -4.0);
        let c = Point::new(0.0, 1.0, 7.0);
        assert_eq!(orientation_2d(&a, &b, &c), Orientation::POSITIVE);
    }

    #[test]
    fn orientation_tolerance_scales_with_magnitude() {
        // Nearly collinear at large magnitude: rounding noise must not produce a sign.
        let a = p(1.0e8, 1.0e8);
        let b = p(2.0e8, 2.0e8);
        let c = p(3.0e8, 3.0e8 + 1.0e-9);
        assert_eq!(orientation_2d(&a, &b, &c), Orientation::DEGENERATE);

        // The same relative offset at small magnitude is still resolved.
        let c = p(3.0, 3.0 + 1.0e-6);
        assert_eq!(
            orientation_2d(&p(1.0, 1.0), &p(2.0, 2.0), &c),
            Orientation::POSITIVE
        );
    }

    #[test]
    fn orient2d_is_twice_signed_area() {
        assert!((orient2d(&p(0.0, 0.0), &p(2.0, 0.0), &p(0.0, 2.0)) - 4.0).abs() < 1e-12);
    }

    #[test]
    fn incircle_sign_is_pinned() {
        let a = p(0.0, 0.0);
        let b = p(1.0, 0.0);
        let c = p(0.0, 1.0);
        assert_eq!(incircle(&a, &b, &c, &p(0.9, 0.9)), InSphere::INSIDE);
        assert_eq!(incircle(&a, &b, &c, &p(2.0, 2.0)), InSphere::OUTSIDE);
        assert_eq!(incircle(&a, &b, &c, &p(1.0, 1.0)), InSphere::BOUNDARY);
    }

    #[test]
    fn incircle_is_independent_of_vertex_order() {
        let a = p(0.0, 0.0);
        let b = p(1.0, 0.0);
        let c = p(0.0, 1.0);
        let inside = p(0.4, 0.4);
        let outside = p(-1.0, -1.0);
        assert_eq!(incircle(&a, &c, &b, &inside), InSphere::INSIDE);
        assert_eq!(incircle(&c, &b, &a, &inside), InSphere::INSIDE);
        assert_eq!(incircle(&a, &c, &b, &outside), InSphere::OUTSIDE);
    }

    #[test]
    fn incircle_on_degenerate_triangle_is_boundary() {
        let a = p(0.0, 0.0);
        let b = p(1.0, 0.0);
        let c = p(2.0, 0.0);
        assert_eq!(incircle(&a, &b, &c, &p(0.5, 0.1)), InSphere::BOUNDARY);
    }

    #[test]
    fn display_impls() {
        assert_eq!(Orientation::POSITIVE.to_string(), "POSITIVE");
        assert_eq!(InSphere::BOUNDARY.to_string(), "BOUNDARY");
        assert_eq!(Orientation::NEGATIVE.flip(), Orientation::POSITIVE);
    }
}
