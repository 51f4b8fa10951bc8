//! Point location by visibility walk.
//!
//! Starting from a finite triangle, the walk evaluates the query point's
//! orientation against each edge and crosses the edge the point is most clearly
//! outside of, until the point is enclosed or a hull edge is crossed.
//! Expected cost is O(√n) steps for points inserted in random order; there is no
//! spatial index, so adversarial orders (sorted or clustered input) degrade
//! towards O(n) steps per query. The walk is bounded by a step limit so that a
//! numerically inconsistent mesh cannot make it loop forever.
//!
//! # References
//!
//! - O. Devillers, S. Pion, and M. Teillaud, "Walking in a Triangulation",
//!   International Journal of Foundations of Computer Science, 2001.

use rand::Rng;

use crate::core::collections::SmallBuffer;
use crate::core::corner::Corner;
use crate::core::mesh::{Mesh, TriangleId, VertexId};
use crate::geometry::point::Point;
use crate::geometry::predicates::{Orientation, orient2d, orientation_2d};

/// Result of point location query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocateResult {
    /// Point is strictly inside the finite triangle
    InsideTriangle(TriangleId),
    /// Point is on the edge opposite the corner of the finite triangle
    OnEdge(TriangleId, Corner),
    /// Point coincides with a vertex
    OnVertex(VertexId),
    /// Point is outside the convex hull, beyond the hull edge of this infinite triangle
    OutsideHull(TriangleId),
}

/// Error during point location.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum LocateError {
    /// The mesh has no finite triangle to start from
    #[error("Cannot locate in an empty triangulation")]
    EmptyTriangulation,

    /// Triangle reference is invalid, or the walk reached an open edge
    #[error("Invalid triangle reference during walk: {triangle}")]
    InvalidTriangle {
        /// The offending triangle
        triangle: TriangleId,
    },

    /// A finite triangle on the walk is degenerate
    #[error("Walk reached degenerate triangle {triangle}")]
    DegenerateTriangle {
        /// The degenerate triangle
        triangle: TriangleId,
    },

    /// The walk did not terminate within the step limit (numerical issues or a cycle)
    #[error("Walk exceeded {steps} steps - possible numerical degeneracy")]
    StepLimitExceeded {
        /// Number of steps taken
        steps: usize,
    },
}

/// Default bound on walk steps for `mesh`.
#[must_use]
pub fn default_step_limit(mesh: &Mesh) -> usize {
    mesh.number_of_triangles() + 16
}

/// Picks a uniformly random triangle and returns it, or its finite neighbor if it is infinite.
#[must_use]
pub fn random_finite_triangle<R: Rng + ?Sized>(mesh: &Mesh, rng: &mut R) -> Option<TriangleId> {
    let count = mesh.number_of_triangles();
    if count == 0 {
        return None;
    }
    let candidate = TriangleId::new(rng.random_range(0..count));
    let triangle = mesh.triangle(candidate)?;
    let finite = match triangle.corner_of(VertexId::INFINITE) {
        None => Some(candidate),
        Some(corner) => triangle
            .neighbor(corner)
            .filter(|&n| mesh.triangle(n).is_some_and(|t| !t.is_infinite())),
    };
    finite.or_else(|| mesh.finite_triangles().next().map(|(id, _)| id))
}

/// Locates `point` by walking from `start`.
///
/// `start` may be infinite, in which case the walk begins at the finite
/// triangle across its hull edge.
///
/// # Errors
///
/// Returns [`LocateError::InvalidTriangle`] for a bad start or an open edge on
/// the way, [`LocateError::DegenerateTriangle`] if a flat triangle is reached,
/// and [`LocateError::StepLimitExceeded`] after `max_steps` steps.
///
/// # Examples
///
/// ```rust
/// use trimesh2d::core::algorithms::locate::{LocateResult, locate};
/// use trimesh2d::core::triangulation::Triangulation;
/// use trimesh2d::geometry::point::Point;
///
/// let tri = Triangulation::from_points(&[
///     Point::new_2d(0.0, 0.0),
///     Point::new_2d(1.0, 0.0),
///     Point::new_2d(0.0, 1.0),
/// ])
/// .unwrap();
/// let mesh = tri.mesh();
/// let (start, _) = mesh.finite_triangles().next().unwrap();
///
/// assert_eq!(
///     locate(mesh, &Point::new_2d(0.2, 0.2), start, 16),
///     Ok(LocateResult::InsideTriangle(start))
/// );
/// assert!(matches!(
///     locate(mesh, &Point::new_2d(2.0, 2.0), start, 16),
///     Ok(LocateResult::OutsideHull(_))
/// ));
/// ```
pub fn locate(
    mesh: &Mesh,
    point: &Point,
    start: TriangleId,
    max_steps: usize,
) -> Result<LocateResult, LocateError> {
    let first = mesh
        .triangle(start)
        .ok_or(LocateError::InvalidTriangle { triangle: start })?;
    let mut current = match first.corner_of(VertexId::INFINITE) {
        None => start,
        Some(corner) => first
            .neighbor(corner)
            .ok_or(LocateError::InvalidTriangle { triangle: start })?,
    };

    for step in 0..max_steps {
        let triangle = mesh.tri(current);
        if triangle.is_infinite() {
            return Err(LocateError::InvalidTriangle { triangle: current });
        }
        let corners = mesh
            .vertices_of(current)
            .ok_or(LocateError::InvalidTriangle { triangle: current })?;

        let mut exit: Option<(Corner, f64)> = None;
        let mut on_line: SmallBuffer<Corner, 3> = SmallBuffer::new();
        for corner in Corner::ALL {
            let a = &corners[corner.next().index()];
            let b = &corners[corner.prev().index()];
            match orientation_2d(a, b, point) {
                Orientation::NEGATIVE => {
                    let det = orient2d(a, b, point);
                    if exit.is_none_or(|(_, best)| det < best) {
                        exit = Some((corner, det));
                    }
                }
                Orientation::DEGENERATE => on_line.push(corner),
                Orientation::POSITIVE => {}
            }
        }

        if let Some((corner, _)) = exit {
            let next = triangle
                .neighbor(corner)
                .ok_or(LocateError::InvalidTriangle { triangle: current })?;
            if mesh.tri(next).is_infinite() {
                tracing::trace!(steps = step + 1, hull = %next, "walk left the hull");
                return Ok(LocateResult::OutsideHull(next));
            }
            current = next;
            continue;
        }

        let result = match on_line.as_slice() {
            [] => LocateResult::InsideTriangle(current),
            [corner] => LocateResult::OnEdge(current, *corner),
            [c1, c2] => {
                let shared = Corner::ALL
                    .into_iter()
                    .find(|c| c != c1 && c != c2)
                    .ok_or(LocateError::DegenerateTriangle { triangle: current })?;
                LocateResult::OnVertex(triangle.vertex(shared))
            }
            _ => return Err(LocateError::DegenerateTriangle { triangle: current }),
        };
        tracing::trace!(steps = step, ?result, "located point");
        return Ok(result);
    }

    tracing::warn!(max_steps, "visibility walk exceeded its step limit");
    Err(LocateError::StepLimitExceeded { steps: max_steps })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::triangulation::Triangulation;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn grid() -> Triangulation {
        let mut points = Vec::new();
        for i in 0..5 {
            for j in 0..5 {
                // Slight jitter keeps the grid free of cocircular quads.
                let jitter = f64::from((i * 7 + j * 3) % 5) * 1e-3;
                points.push(Point::new_2d(f64::from(i) + jitter, f64::from(j) - jitter));
            }
        }
        Triangulation::from_points(&points).unwrap()
    }

    #[test]
    fn every_start_finds_the_same_triangle() {
        let tri = grid();
        let mesh = tri.mesh();
        let query = Point::new_2d(2.31, 1.77);
        let mut found = None;
        for (start, _) in mesh.triangles() {
            let result = locate(mesh, &query, start, default_step_limit(mesh)).unwrap();
            let LocateResult::InsideTriangle(t) = result else {
                panic!("expected an interior hit, got {result:?}");
            };
            assert_eq!(*found.get_or_insert(t), t);
        }
    }

    #[test]
    fn vertices_and_edges_are_detected() {
        let tri = grid();
        let mesh = tri.mesh();
        let start = mesh.finite_triangles().next().unwrap().0;
        let target = VertexId::new(13);
        let at_vertex = *mesh.point(target).unwrap();
        assert_eq!(
            locate(mesh, &at_vertex, start, 1000),
            Ok(LocateResult::OnVertex(target))
        );

        // An edge through the origin has an exactly representable midpoint.
        let origin = VertexId::new(1);
        let (t, tri0) = mesh
            .finite_triangles()
            .find(|(_, t)| t.contains(origin))
            .unwrap();
        let corner = tri0.corner_of(origin).unwrap().next();
        let (a, b) = tri0.edge(corner);
        let midpoint = (*mesh.point(a).unwrap() + *mesh.point(b).unwrap()) / 2.0;
        match locate(mesh, &midpoint, start, 1000).unwrap() {
            LocateResult::OnEdge(found, c) => {
                let (p, q) = mesh.tri(found).edge(c);
                assert!((p == a && q == b) || (p == b && q == a));
                assert!(found == t || mesh.mirror(t, corner).is_some_and(|(m, _)| m == found));
            }
            other => panic!("expected an edge hit, got {other:?}"),
        }
    }

    #[test]
    fn step_limit_is_enforced() {
        let tri = grid();
        let mesh = tri.mesh();
        let far_corner = Point::new_2d(3.9, 3.9);
        let near_origin = mesh
            .finite_triangles()
            .find(|(_, t)| t.contains(VertexId::new(1)))
            .unwrap()
            .0;
        assert_eq!(
            locate(mesh, &far_corner, near_origin, 1),
            Err(LocateError::StepLimitExceeded { steps: 1 })
        );
    }

    #[test]
    fn random_start_is_finite() {
        let tri = grid();
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..50 {
            let t = random_finite_triangle(tri.mesh(), &mut rng).unwrap();
            assert!(!tri.mesh().tri(t).is_infinite());
        }
        assert!(random_finite_triangle(&Mesh::new(), &mut rng).is_none());
    }
}
