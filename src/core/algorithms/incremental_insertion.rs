//! Incremental insertion on the triangle-adjacency mesh.
//!
//! Insertion is split in two phases. The first three finite points are held
//! back until they span a proper triangle, at which point [`bootstrap`] builds
//! the initial closed mesh: one finite triangle and three infinite triangles,
//! one per hull edge. Every later point is located and then inserted by one of
//! the local rewrites:
//!
//! 1. Strictly inside a finite triangle: 1→3 face split
//! 2. On an edge: 2→4 edge split (the far side may be an infinite triangle)
//! 3. Outside the hull: split the infinite triangle behind the crossed hull
//!    edge, then walk both ways along the hull flipping every further hull
//!    edge the point sees ([`extend_hull`])
//!
//! None of these restore the Delaunay property; see
//! [`crate::core::algorithms::legalize`].

use thiserror::Error;

use crate::core::algorithms::flips::{FlipError, flip_edge, split_edge, split_face};
use crate::core::algorithms::legalize::LegalizationError;
use crate::core::algorithms::locate::{LocateError, LocateResult};
use crate::core::corner::Corner;
use crate::core::mesh::{Mesh, Triangle, TriangleId, VertexId};
use crate::core::operations::{InsertionKind, InsertionStatistics};
use crate::core::validation::MeshValidationError;
use crate::geometry::point::Point;
use crate::geometry::predicates::{Orientation, orientation_2d};

/// Error during incremental insertion.
#[derive(Debug, Clone, PartialEq, Error)]
#[non_exhaustive]
pub enum InsertionError {
    /// The first three points are collinear (or two of them coincide).
    #[error("Cannot bootstrap from collinear points {points:?}")]
    DegenerateBootstrap {
        /// The three points, in insertion order.
        points: [Point; 3],
    },

    /// The point coincides with an existing vertex.
    #[error("Point {point:?} coincides with vertex {vertex}")]
    DuplicatePoint {
        /// The rejected point.
        point: Point,
        /// The vertex already at that position.
        vertex: VertexId,
    },

    /// A vertex id does not name a finite vertex of the mesh.
    #[error("Unknown vertex {vertex}")]
    UnknownVertex {
        /// The offending id.
        vertex: VertexId,
    },

    /// The point has a NaN or infinite coordinate.
    #[error("Point {point:?} has non-finite coordinates")]
    NonFiniteCoordinates {
        /// The rejected point.
        point: Point,
    },

    /// Point location failed
    #[error("Location error: {0}")]
    Location(#[from] LocateError),

    /// A local rewrite found inconsistent adjacency
    #[error("Topology error: {0}")]
    Topology(#[from] FlipError),

    /// Restoring the Delaunay property failed
    #[error("Legalization error: {0}")]
    Legalization(#[from] LegalizationError),

    /// Post-insertion validation failed
    #[error("Validation error: {0}")]
    Validation(#[from] MeshValidationError),

    /// An infinite triangle on the hull walk does not have the expected shape.
    #[error("Hull triangle {triangle} is inconsistent")]
    InconsistentHull {
        /// The offending triangle.
        triangle: TriangleId,
    },

    /// The hull walk did not terminate.
    #[error("Hull extension exceeded {steps} steps")]
    HullWalkExceeded {
        /// Number of steps taken.
        steps: usize,
    },
}

/// Builds the initial mesh over three existing, non-collinear vertices.
///
/// The vertices are reordered to be counterclockwise. The finite triangle gets
/// the next free id; the three infinite triangles follow, the one at offset
/// `1 + i` lying across the edge opposite the finite triangle's corner `i`.
///
/// # Errors
///
/// Returns [`InsertionError::DegenerateBootstrap`] if the points are collinear
/// and [`InsertionError::UnknownVertex`] if a vertex id is unknown. The mesh is not
/// modified on error.
pub fn bootstrap(mesh: &mut Mesh, vertices: [VertexId; 3]) -> Result<TriangleId, InsertionError> {
    let mut points = [Point::ORIGIN; 3];
    for (slot, &vertex) in points.iter_mut().zip(&vertices) {
        *slot = *mesh
            .point(vertex)
            .filter(|_| !vertex.is_infinite())
            .ok_or(InsertionError::UnknownVertex { vertex })?;
    }

    let v = match orientation_2d(&points[0], &points[1], &points[2]) {
        Orientation::POSITIVE => vertices,
        Orientation::NEGATIVE => [vertices[0], vertices[2], vertices[1]],
        Orientation::DEGENERATE => return Err(InsertionError::DegenerateBootstrap { points }),
    };

    let base = mesh.number_of_triangles();
    let finite = TriangleId::new(base);
    let hull = |i: usize| TriangleId::new(base + 1 + i % 3);

    mesh.push_triangle(Triangle::with_neighbors(
        v,
        [Some(hull(0)), Some(hull(1)), Some(hull(2))],
    ));
    for i in 0..3 {
        mesh.push_triangle(Triangle::with_neighbors(
            [VertexId::INFINITE, v[(i + 2) % 3], v[(i + 1) % 3]],
            [Some(finite), Some(hull(i + 2)), Some(hull(i + 1))],
        ));
    }
    for vertex in v {
        mesh.set_anchor(vertex, finite);
    }
    mesh.set_anchor(VertexId::INFINITE, hull(0));

    tracing::debug!(%finite, vertices = ?v, "bootstrapped triangulation");
    Ok(finite)
}

/// Result of [`extend_hull`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HullExtension {
    /// The inserted vertex.
    pub vertex: VertexId,
    /// Number of further hull edges that were flipped away.
    pub flips: usize,
}

/// Finds `apex` in a hull-side triangle `[apex, a, ∞]` (or `[apex, ∞, a]` when
/// `infinite_first`), returning its corner and the finite hull vertex `a`.
fn hull_fan_corner(
    mesh: &Mesh,
    triangle: TriangleId,
    apex: VertexId,
    infinite_first: bool,
) -> Result<(Corner, VertexId), InsertionError> {
    let inconsistent = InsertionError::InconsistentHull { triangle };
    let current = mesh.triangle(triangle).ok_or(inconsistent.clone())?;
    let corner = current.corner_of(apex).ok_or(inconsistent.clone())?;
    let (first, second) = current.edge(corner);
    let (hull_vertex, infinite) = if infinite_first {
        (second, first)
    } else {
        (first, second)
    };
    if !infinite.is_infinite() || hull_vertex.is_infinite() {
        return Err(inconsistent);
    }
    Ok((corner, hull_vertex))
}

/// Inserts `point`, which lies outside the hull beyond the hull edge of
/// `hull_triangle`.
///
/// The infinite triangle `[∞, b, a]` is split around the new vertex `p`,
/// giving the finite triangle `[p, b, a]`. The walk then proceeds along the
/// hull on both sides: while the next hull edge `z → a` (or `b → y`) is
/// strictly visible from `p`, the infinite triangle behind it is flipped with
/// the current side triangle, which turns it finite. Collinear hull edges are
/// kept, so no flat finite triangle is ever created.
///
/// # Errors
///
/// Returns [`InsertionError::InconsistentHull`] if `hull_triangle` is not an
/// infinite triangle, [`InsertionError::Topology`] on inconsistent adjacency
/// and [`InsertionError::HullWalkExceeded`] if the walk does not terminate.
pub fn extend_hull(
    mesh: &mut Mesh,
    hull_triangle: TriangleId,
    point: Point,
) -> Result<HullExtension, InsertionError> {
    let inconsistent = InsertionError::InconsistentHull {
        triangle: hull_triangle,
    };
    let hull = mesh.triangle(hull_triangle).ok_or(inconsistent.clone())?;
    let at_infinity = hull
        .corner_of(VertexId::INFINITE)
        .ok_or(inconsistent.clone())?;
    let b = hull.vertex(at_infinity.next());
    let a = hull.vertex(at_infinity.prev());

    let split = split_face(mesh, hull_triangle, point)?;
    let p = split.vertex;
    let side = |mesh: &Mesh, vertex: VertexId| {
        split.triangles.into_iter().find(|&t| {
            let fan = mesh.tri(t);
            fan.is_infinite() && fan.contains(vertex)
        })
    };
    let mut a_side = side(mesh, a).ok_or(inconsistent.clone())?;
    let mut b_side = side(mesh, b).ok_or(inconsistent)?;

    let limit = mesh.number_of_triangles();
    let Some(&p_point) = mesh.point(p) else {
        return Err(InsertionError::InconsistentHull { triangle: a_side });
    };
    let mut flips = 0;

    // a-side: [p, a, ∞] against the hull triangle [∞, a, z].
    loop {
        let (corner, a) = hull_fan_corner(mesh, a_side, p, false)?;
        let (behind, mirrored) = mesh
            .mirror(a_side, corner)
            .ok_or(InsertionError::InconsistentHull { triangle: a_side })?;
        let z = mesh.tri(behind).vertex(mirrored);
        let (Some(pz), Some(pa)) = (mesh.point(z), mesh.point(a)) else {
            return Err(InsertionError::InconsistentHull { triangle: behind });
        };
        if z.is_infinite() || orientation_2d(pz, pa, &p_point) != Orientation::NEGATIVE {
            break;
        }
        if flips >= limit {
            return Err(InsertionError::HullWalkExceeded { steps: flips });
        }
        let [_, next] = flip_edge(mesh, a_side, corner)?;
        a_side = next;
        flips += 1;
    }

    // b-side: [p, ∞, b] against the hull triangle [∞, y, b].
    loop {
        let (corner, b) = hull_fan_corner(mesh, b_side, p, true)?;
        let (behind, mirrored) = mesh
            .mirror(b_side, corner)
            .ok_or(InsertionError::InconsistentHull { triangle: b_side })?;
        let y = mesh.tri(behind).vertex(mirrored);
        let (Some(pb), Some(py)) = (mesh.point(b), mesh.point(y)) else {
            return Err(InsertionError::InconsistentHull { triangle: behind });
        };
        if y.is_infinite() || orientation_2d(pb, py, &p_point) != Orientation::NEGATIVE {
            break;
        }
        if flips >= limit {
            return Err(InsertionError::HullWalkExceeded { steps: flips });
        }
        let [next, _] = flip_edge(mesh, b_side, corner)?;
        b_side = next;
        flips += 1;
    }

    tracing::debug!(vertex = %p, flips, "extended convex hull");
    Ok(HullExtension { vertex: p, flips })
}

/// Inserts `point` at a location previously returned by
/// [`crate::core::algorithms::locate::locate`] on the same mesh.
///
/// The returned statistics report no legalizing flips; the mesh is a valid
/// triangulation but not necessarily Delaunay.
///
/// # Errors
///
/// Returns [`InsertionError::DuplicatePoint`] for [`LocateResult::OnVertex`]
/// and propagates rewrite failures.
pub fn insert_located(
    mesh: &mut Mesh,
    location: LocateResult,
    point: Point,
) -> Result<InsertionStatistics, InsertionError> {
    let (vertex, kind, hull_flips) = match location {
        LocateResult::InsideTriangle(triangle) => {
            let split = split_face(mesh, triangle, point)?;
            (split.vertex, InsertionKind::Interior, 0)
        }
        LocateResult::OnEdge(triangle, corner) => {
            let split = split_edge(mesh, triangle, corner, point)?;
            (split.vertex, InsertionKind::OnEdge, 0)
        }
        LocateResult::OnVertex(vertex) => {
            return Err(InsertionError::DuplicatePoint { point, vertex });
        }
        LocateResult::OutsideHull(triangle) => {
            let extension = extend_hull(mesh, triangle, point)?;
            (
                extension.vertex,
                InsertionKind::HullExtension,
                extension.flips,
            )
        }
    };
    Ok(InsertionStatistics {
        vertex,
        kind,
        hull_flips,
        legalizing_flips: 0,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::algorithms::locate::{default_step_limit, locate};
    use crate::core::validation::{ValidationOptions, validate};

    fn seeded(points: &[[f64; 2]]) -> (Mesh, TriangleId) {
        let mut mesh = Mesh::new();
        let ids: Vec<_> = points
            .iter()
            .take(3)
            .map(|&p| mesh.add_point(Point::from(p)))
            .collect();
        let finite = bootstrap(&mut mesh, [ids[0], ids[1], ids[2]]).unwrap();
        (mesh, finite)
    }

    fn insert(mesh: &mut Mesh, start: TriangleId, point: Point) -> InsertionStatistics {
        let location = locate(mesh, &point, start, default_step_limit(mesh)).unwrap();
        insert_located(mesh, location, point).unwrap()
    }

    #[test]
    fn bootstrap_layout() {
        let (mesh, finite) = seeded(&[[0.0, 0.0], [0.0, 1.0], [1.0, 0.0]]);
        assert_eq!(mesh.number_of_triangles(), 4);
        assert_eq!(mesh.number_of_finite_triangles(), 1);

        // Clockwise input is reordered.
        let t0 = mesh.tri(finite);
        assert_eq!(
            t0.vertices(),
            [VertexId::new(1), VertexId::new(3), VertexId::new(2)]
        );
        for corner in Corner::ALL {
            let hull = t0.neighbor(corner).unwrap();
            let (a, b) = t0.edge(corner);
            assert_eq!(
                mesh.tri(hull).vertices(),
                [VertexId::INFINITE, b, a],
                "hull triangle across corner {corner}"
            );
        }
        assert!(validate(&mesh, ValidationOptions::default()).is_ok());
    }

    #[test]
    fn collinear_bootstrap_is_rejected() {
        let mut mesh = Mesh::new();
        let ids = [[0.0, 0.0], [1.0, 1.0], [2.0, 2.0]].map(|p| mesh.add_point(Point::from(p)));
        assert!(matches!(
            bootstrap(&mut mesh, ids),
            Err(InsertionError::DegenerateBootstrap { .. })
        ));
        assert_eq!(mesh.number_of_triangles(), 0);
    }

    #[test]
    fn hull_extension_flips_every_visible_edge() {
        let (mut mesh, finite) = seeded(&[[0.0, 0.0], [1.0, 0.0], [0.0, 1.0]]);
        // (3, -1) sees both (0,0)→(1,0) and (1,0)→(0,1).
        let stats = insert(&mut mesh, finite, Point::new_2d(3.0, -1.0));
        assert_eq!(stats.kind, InsertionKind::HullExtension);
        assert_eq!(stats.hull_flips, 1);
        assert_eq!(mesh.number_of_finite_triangles(), 3);
        assert_eq!(mesh.number_of_triangles(), 6);
        assert_eq!(mesh.hull_vertices().len(), 3);
        assert!(validate(&mesh, ValidationOptions::default()).is_ok());
    }

    #[test]
    fn collinear_hull_edges_are_kept() {
        let (mut mesh, finite) = seeded(&[[0.0, 0.0], [1.0, 0.0], [0.0, 1.0]]);
        let stats = insert(&mut mesh, finite, Point::new_2d(2.0, 0.0));
        assert_eq!(stats.kind, InsertionKind::HullExtension);
        assert_eq!(stats.hull_flips, 0);
        assert_eq!(mesh.number_of_finite_triangles(), 2);
        assert_eq!(mesh.hull_vertices().len(), 4);
        assert!(validate(&mesh, ValidationOptions::default()).is_ok());
    }

    #[test]
    fn interior_edge_and_duplicate_points() {
        let (mut mesh, finite) = seeded(&[[0.0, 0.0], [4.0, 0.0], [0.0, 4.0]]);
        let inside = insert(&mut mesh, finite, Point::new_2d(1.0, 1.0));
        assert_eq!(inside.kind, InsertionKind::Interior);
        assert_eq!(mesh.number_of_finite_triangles(), 3);

        let on_edge = insert(&mut mesh, finite, Point::new_2d(2.0, 2.0));
        assert_eq!(on_edge.kind, InsertionKind::OnEdge);
        // The split edge is on the hull: one finite and one infinite triangle are split.
        assert_eq!(mesh.number_of_finite_triangles(), 4);
        assert!(validate(&mesh, ValidationOptions::default()).is_ok());

        let location = LocateResult::OnVertex(inside.vertex);
        assert_eq!(
            insert_located(&mut mesh, location, Point::new_2d(1.0, 1.0)),
            Err(InsertionError::DuplicatePoint {
                point: Point::new_2d(1.0, 1.0),
                vertex: inside.vertex,
            })
        );
    }

    #[test]
    fn extend_hull_rejects_finite_triangles() {
        let (mut mesh, finite) = seeded(&[[0.0, 0.0], [1.0, 0.0], [0.0, 1.0]]);
        assert_eq!(
            extend_hull(&mut mesh, finite, Point::new_2d(5.0, 5.0)),
            Err(InsertionError::InconsistentHull { triangle: finite })
        );
    }
}
