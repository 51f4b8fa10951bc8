//! Delaunay empty-circumcircle property checks.
//!
//! These predicates are an oracle for tests and validation, and the edge test
//! also drives the legalizer. An edge is *locally Delaunay* when neither vertex
//! across it lies strictly inside the circumcircle of the triangle on the other
//! side. Edges on the hull (shared with an infinite triangle) and open edges are
//! always considered Delaunay.
//!
//! The in-circle determinant of a quadrilateral is evaluated once per edge, on
//! the triangle whose opposite vertex has the lower id, with its vertices listed
//! from that opposite vertex. Both sides of an edge therefore perform the same
//! floating-point computation and always get the same answer.

use crate::core::collections::{FastHashSet, fast_hash_set_with_capacity};
use crate::core::corner::Corner;
use crate::core::mesh::{Mesh, TriangleId, VertexId};
use crate::core::validation::MeshValidationError;
use crate::geometry::predicates::{InSphere, incircle};

/// Classifies the edge opposite `corner` of `triangle`.
///
/// Returns `None` for missing triangles, infinite triangles, hull edges and
/// open edges.
#[must_use]
pub fn edge_incircle(mesh: &Mesh, triangle: TriangleId, corner: Corner) -> Option<InSphere> {
    let current = mesh.triangle(triangle)?;
    if current.is_infinite() {
        return None;
    }
    let (neighbor, mirrored) = mesh.mirror(triangle, corner)?;
    let across = mesh.triangle(neighbor)?;
    let opposite = across.vertex(mirrored);
    if opposite.is_infinite() {
        return None;
    }

    let here = current.vertex(corner);
    let (fan, apex) = if here < opposite {
        (current.rotated(corner), opposite)
    } else {
        (across.rotated(mirrored), here)
    };
    let [a, b, c] = fan.map(|v| mesh.point(v));
    Some(incircle(a?, b?, c?, mesh.point(apex)?))
}

/// Tests the edge opposite `corner` of `triangle`.
///
/// Returns `true` for missing triangles, infinite triangles, hull edges and
/// open edges. Cocircular quadrilaterals count as Delaunay.
#[must_use]
pub fn is_edge_delaunay(mesh: &Mesh, triangle: TriangleId, corner: Corner) -> bool {
    edge_incircle(mesh, triangle, corner) != Some(InSphere::INSIDE)
}

/// Tests the edge from both sides.
///
/// Both sides evaluate the same canonical predicate, so this agrees with
/// [`is_edge_delaunay`] on every consistent mesh. A disagreement can only come
/// from broken adjacency, in which case the edge is reported as non-Delaunay.
#[must_use]
pub fn is_edge_fully_delaunay(mesh: &Mesh, triangle: TriangleId, corner: Corner) -> bool {
    is_edge_delaunay(mesh, triangle, corner)
        && mesh
            .mirror(triangle, corner)
            .is_none_or(|(neighbor, mirrored)| is_edge_delaunay(mesh, neighbor, mirrored))
}

/// Every non-Delaunay edge, once per undirected edge, as `(triangle, corner)`.
#[must_use]
pub fn find_delaunay_violations(mesh: &Mesh) -> Vec<(TriangleId, Corner)> {
    let mut seen: FastHashSet<(VertexId, VertexId)> =
        fast_hash_set_with_capacity(mesh.number_of_triangles() * 2);
    let mut violations = Vec::new();
    for (id, triangle) in mesh.finite_triangles() {
        for corner in Corner::ALL {
            let (a, b) = triangle.edge(corner);
            if !seen.insert((a.min(b), a.max(b))) {
                continue;
            }
            if !is_edge_fully_delaunay(mesh, id, corner) {
                violations.push((id, corner));
            }
        }
    }
    violations
}

/// Returns `true` if every finite edge is locally Delaunay.
///
/// # Examples
///
/// ```rust
/// use trimesh2d::core::delaunay_triangulation::DelaunayTriangulation;
/// use trimesh2d::core::util::delaunay_validation::is_delaunay;
/// use trimesh2d::geometry::point::Point;
///
/// let dt = DelaunayTriangulation::from_points(&[
///     Point::new_2d(0.0, 0.0),
///     Point::new_2d(4.0, 0.0),
///     Point::new_2d(0.0, 4.0),
///     Point::new_2d(3.0, 3.0),
///     Point::new_2d(1.0, 1.0),
/// ])
/// .unwrap();
/// assert!(is_delaunay(dt.mesh()));
/// ```
#[must_use]
pub fn is_delaunay(mesh: &Mesh) -> bool {
    find_delaunay_violations(mesh).is_empty()
}

/// Like [`is_delaunay`], reporting the first violating edge.
///
/// # Errors
///
/// Returns [`MeshValidationError::DelaunayViolation`] for the first non-Delaunay edge.
pub fn validate_delaunay(mesh: &Mesh) -> Result<(), MeshValidationError> {
    match find_delaunay_violations(mesh).first() {
        Some(&(triangle, corner)) => Err(MeshValidationError::DelaunayViolation { triangle, corner }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::builder::MeshBuilder;
    use crate::geometry::point::Point;

    /// Two triangles over the quad (0,0), (1,0), (0.8,0.8), (0,1) split along
    /// the long diagonal, which is not Delaunay.
    fn non_delaunay_quad() -> Mesh {
        let points = [
            Point::new_2d(0.0, 0.0),
            Point::new_2d(1.0, 0.0),
            Point::new_2d(0.8, 0.8),
            Point::new_2d(0.0, 1.0),
        ];
        MeshBuilder::from_arrays(&points, &[[0, 1, 3], [1, 2, 3]]).unwrap()
    }

    #[test]
    fn long_diagonal_is_flagged() {
        let mesh = non_delaunay_quad();
        let violations = find_delaunay_violations(&mesh);
        assert_eq!(violations.len(), 1);
        let (triangle, corner) = violations[0];
        let (a, b) = mesh.tri(triangle).edge(corner);
        let mut edge = [a.index(), b.index()];
        edge.sort_unstable();
        // Builder ids are input index + 1: the diagonal joins (1,0) and (0,1).
        assert_eq!(edge, [2, 4]);
        assert!(!is_delaunay(&mesh));
        assert!(validate_delaunay(&mesh).is_err());
    }

    #[test]
    fn short_diagonal_is_delaunay() {
        let points = [
            Point::new_2d(0.0, 0.0),
            Point::new_2d(1.0, 0.0),
            Point::new_2d(0.8, 0.8),
            Point::new_2d(0.0, 1.0),
        ];
        let mesh = MeshBuilder::from_arrays(&points, &[[0, 1, 2], [0, 2, 3]]).unwrap();
        assert!(is_delaunay(&mesh));
        assert!(validate_delaunay(&mesh).is_ok());
    }

    #[test]
    fn open_edges_are_delaunay() {
        let mesh = non_delaunay_quad();
        let t = TriangleId::new(0);
        let open = Corner::ALL
            .into_iter()
            .find(|&c| mesh.neighbor(t, c).is_none())
            .unwrap();
        assert!(is_edge_delaunay(&mesh, t, open));
        assert!(is_edge_fully_delaunay(&mesh, t, open));
        assert!(is_edge_delaunay(&mesh, TriangleId::new(99), open));
        assert_eq!(edge_incircle(&mesh, t, open), None);
    }

    #[test]
    fn both_sides_of_an_edge_agree() {
        // A regular 64-gon of radius 10: every quad is cocircular up to rounding.
        let points: Vec<Point> = (0..64)
            .map(|k| {
                let theta = std::f64::consts::TAU * f64::from(k) / 64.0;
                Point::new_2d(10.0 * theta.cos(), 10.0 * theta.sin())
            })
            .collect();
        let fan: Vec<[usize; 3]> = (1..63).map(|k| [0, k, k + 1]).collect();
        let mesh = MeshBuilder::from_arrays(&points, &fan).unwrap();

        let mut interior_edges = 0;
        for (id, triangle) in mesh.finite_triangles() {
            for corner in Corner::ALL {
                let Some((neighbor, mirrored)) = mesh.mirror(id, corner) else {
                    continue;
                };
                interior_edges += 1;
                assert_eq!(
                    edge_incircle(&mesh, id, corner),
                    edge_incircle(&mesh, neighbor, mirrored),
                    "edge {:?} of {id}",
                    triangle.edge(corner)
                );
                assert_eq!(
                    is_edge_delaunay(&mesh, id, corner),
                    is_edge_fully_delaunay(&mesh, id, corner)
                );
            }
        }
        // 61 diagonals, each seen from both sides.
        assert_eq!(interior_edges, 122);
    }
}
