//! Local topology rewrites on the triangle-adjacency mesh.
//!
//! Three constant-size operations that every higher-level algorithm composes:
//!
//! - [`split_face`]: insert a point inside a triangle, fanning it into three (1→3);
//! - [`split_edge`]: insert a point on an edge, splitting each incident
//!   triangle in two (2→4, or 1→2 on an open boundary);
//! - [`flip_edge`]: replace the diagonal of the quadrilateral formed by two
//!   adjacent triangles (2→2).
//!
//! The rewrites are purely combinatorial. Each one validates the adjacency it is
//! about to touch first and returns a [`FlipError`] without modifying the mesh if
//! it is inconsistent. External back-references and anchor triangles are
//! rewired, so the mesh invariants hold again when the call returns. Geometric
//! preconditions (the point lies inside the triangle, on the edge, or the
//! quadrilateral is strictly convex) are the caller's responsibility.
//!
//! Labeling used throughout: the triangle being rewritten is read starting at
//! the given corner as `[o, a, b]`, so the edge of interest is `a → b`; the
//! neighbor across it reads `[q, b, a]`.

use smallvec::smallvec;
use thiserror::Error;

use crate::core::collections::TriangleBuffer;
use crate::core::corner::Corner;
use crate::core::mesh::{Mesh, Triangle, TriangleId, VertexId};
use crate::core::validation::debug_assert_local;
use crate::geometry::point::Point;

/// Errors raised by the local rewrites. The mesh is unchanged when one is returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum FlipError {
    /// The referenced triangle does not exist.
    #[error("Triangle not found: {triangle}")]
    MissingTriangle {
        /// Missing triangle id.
        triangle: TriangleId,
    },
    /// The edge has no triangle on the other side.
    #[error("Edge opposite corner {corner} of triangle {triangle} is on an open boundary")]
    BoundaryEdge {
        /// Triangle owning the edge.
        triangle: TriangleId,
        /// Corner opposite the edge.
        corner: Corner,
    },
    /// The two triangles do not name each other across a shared, oppositely oriented edge.
    #[error("Adjacency mismatch between triangle {triangle} and neighbor {neighbor}")]
    InvalidAdjacency {
        /// Triangle whose neighbor slot was followed.
        triangle: TriangleId,
        /// The neighbor it names.
        neighbor: TriangleId,
    },
    /// The two triangles share all three vertices.
    #[error("Triangles {triangle} and {neighbor} do not span a quadrilateral")]
    DegenerateQuad {
        /// First triangle.
        triangle: TriangleId,
        /// Second triangle.
        neighbor: TriangleId,
    },
}

/// Result of [`split_face`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SplitFace {
    /// The inserted vertex.
    pub vertex: VertexId,
    /// The three triangles around the new vertex; the first reuses the split triangle's id.
    pub triangles: [TriangleId; 3],
}

/// Result of [`split_edge`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitEdge {
    /// The inserted vertex.
    pub vertex: VertexId,
    /// Triangles incident to the new vertex: two on the near side, then two on the far side if present.
    pub triangles: TriangleBuffer,
}

/// Back-reference slot of an outer triangle: `(triangle, corner)` whose neighbor must be rewired.
type Link = Option<(TriangleId, Corner)>;

/// Follows the neighbor across `corner` and checks that it points back across the same edge.
fn outer_link(mesh: &Mesh, triangle: TriangleId, corner: Corner) -> Result<Link, FlipError> {
    let current = mesh.tri(triangle);
    let Some(neighbor) = current.neighbor(corner) else {
        return Ok(None);
    };
    let invalid = FlipError::InvalidAdjacency { triangle, neighbor };
    let (a, b) = current.edge(corner);
    let other = mesh.triangle(neighbor).ok_or(invalid.clone())?;
    match other.find_edge(a, b) {
        Some(mirrored)
            if neighbor != triangle
                && other.neighbor(mirrored) == Some(triangle)
                && other.edge(mirrored) == (b, a) =>
        {
            Ok(Some((neighbor, mirrored)))
        }
        _ => Err(invalid),
    }
}

fn relink(mesh: &mut Mesh, link: Link, to: TriangleId) {
    if let Some((outer, corner)) = link {
        mesh.tri_mut(outer).set_neighbor(corner, Some(to));
    }
}

/// Inserts `point` inside `triangle`, replacing it by three triangles fanned
/// around the new vertex.
///
/// The new triangle at position `i` of the result is
/// `[p, v[i+1], v[i+2]]` and keeps the old neighbor across that edge. The first
/// result reuses `triangle`'s id; the other two are appended.
///
/// # Errors
///
/// Returns [`FlipError::MissingTriangle`] or [`FlipError::InvalidAdjacency`]
/// if `triangle` does not exist or its neighbors are inconsistent.
///
/// # Examples
///
/// ```rust
/// use trimesh2d::core::algorithms::flips::split_face;
/// use trimesh2d::core::triangulation::Triangulation;
/// use trimesh2d::core::validation::{ValidationOptions, validate};
/// use trimesh2d::geometry::point::Point;
///
/// let tri = Triangulation::from_points(&[
///     Point::new_2d(0.0, 0.0),
///     Point::new_2d(1.0, 0.0),
///     Point::new_2d(0.0, 1.0),
/// ])
/// .unwrap();
/// let (inner, _) = tri.mesh().finite_triangles().next().unwrap();
/// let mut mesh = tri.into_mesh();
/// let split = split_face(&mut mesh, inner, Point::new_2d(0.2, 0.2)).unwrap();
/// assert_eq!(split.triangles[0], inner);
/// assert_eq!(mesh.number_of_finite_triangles(), 3);
/// assert!(validate(&mesh, ValidationOptions::default()).is_ok());
/// ```
pub fn split_face(
    mesh: &mut Mesh,
    triangle: TriangleId,
    point: Point,
) -> Result<SplitFace, FlipError> {
    let old = *mesh
        .triangle(triangle)
        .ok_or(FlipError::MissingTriangle { triangle })?;
    let [c0, c1, c2] = Corner::ALL;
    let links = [
        outer_link(mesh, triangle, c0)?,
        outer_link(mesh, triangle, c1)?,
        outer_link(mesh, triangle, c2)?,
    ];

    let vertex = mesh.add_point(point);
    let base = mesh.number_of_triangles();
    let ids = [triangle, TriangleId::new(base), TriangleId::new(base + 1)];

    for corner in Corner::ALL {
        let fan = Triangle::with_neighbors(
            [vertex, old.vertex(corner.next()), old.vertex(corner.prev())],
            [
                old.neighbor(corner),
                Some(ids[corner.next().index()]),
                Some(ids[corner.prev().index()]),
            ],
        );
        if corner == c0 {
            *mesh.tri_mut(triangle) = fan;
        } else {
            mesh.push_triangle(fan);
        }
    }

    for corner in Corner::ALL {
        relink(mesh, links[corner.index()], ids[corner.index()]);
        mesh.set_anchor(old.vertex(corner.next()), ids[corner.index()]);
    }
    mesh.set_anchor(vertex, triangle);

    tracing::trace!(%triangle, %vertex, "split face");
    debug_assert_local(mesh, &ids, "split_face");
    Ok(SplitFace {
        vertex,
        triangles: ids,
    })
}

/// Inserts `point` on the edge opposite `corner` of `triangle`.
///
/// With `triangle = [o, a, b]` (read from `corner`) and neighbor `[q, b, a]`,
/// the result is `[o, a, p]`, `[o, p, b]`, `[q, b, p]`, `[q, p, a]`; the
/// first and third reuse the old ids. When the edge is an open boundary only
/// the near side is rewritten.
///
/// # Errors
///
/// Returns [`FlipError::MissingTriangle`], [`FlipError::InvalidAdjacency`] or
/// [`FlipError::DegenerateQuad`] if the local adjacency is inconsistent.
pub fn split_edge(
    mesh: &mut Mesh,
    triangle: TriangleId,
    corner: Corner,
    point: Point,
) -> Result<SplitEdge, FlipError> {
    let near = *mesh
        .triangle(triangle)
        .ok_or(FlipError::MissingTriangle { triangle })?;
    let [o, a, b] = near.rotated(corner);
    let n_oa = near.neighbor(corner.prev());
    let n_bo = near.neighbor(corner.next());
    let link_bo = outer_link(mesh, triangle, corner.next())?;

    let far = match outer_link(mesh, triangle, corner)? {
        Some((across, mirrored)) => {
            let other = *mesh.tri(across);
            let q = other.vertex(mirrored);
            if q == o {
                return Err(FlipError::DegenerateQuad {
                    triangle,
                    neighbor: across,
                });
            }
            let link_aq = outer_link(mesh, across, mirrored.next())?;
            Some((
                across,
                q,
                other.neighbor(mirrored.next()),
                other.neighbor(mirrored.prev()),
                link_aq,
            ))
        }
        None => None,
    };

    let vertex = mesh.add_point(point);
    let base = mesh.number_of_triangles();
    let t1 = triangle;
    let t2 = TriangleId::new(base);
    let mut triangles: TriangleBuffer = smallvec![t1, t2];

    if let Some((u1, q, n_aq, n_qb, link_aq)) = far {
        let u2 = TriangleId::new(base + 1);
        *mesh.tri_mut(t1) = Triangle::with_neighbors([o, a, vertex], [Some(u2), Some(t2), n_oa]);
        mesh.push_triangle(Triangle::with_neighbors(
            [o, vertex, b],
            [Some(u1), n_bo, Some(t1)],
        ));
        *mesh.tri_mut(u1) = Triangle::with_neighbors([q, b, vertex], [Some(t2), Some(u2), n_qb]);
        mesh.push_triangle(Triangle::with_neighbors(
            [q, vertex, a],
            [Some(t1), n_aq, Some(u1)],
        ));
        relink(mesh, link_aq, u2);
        mesh.set_anchor(q, u1);
        triangles.extend([u1, u2]);
    } else {
        *mesh.tri_mut(t1) = Triangle::with_neighbors([o, a, vertex], [None, Some(t2), n_oa]);
        mesh.push_triangle(Triangle::with_neighbors([o, vertex, b], [None, n_bo, Some(t1)]));
    }
    relink(mesh, link_bo, t2);

    mesh.set_anchor(vertex, t1);
    mesh.set_anchor(o, t1);
    mesh.set_anchor(a, t1);
    mesh.set_anchor(b, t2);

    tracing::trace!(%triangle, %corner, %vertex, sides = triangles.len() / 2, "split edge");
    debug_assert_local(mesh, &triangles, "split_edge");
    Ok(SplitEdge { vertex, triangles })
}

/// Flips the edge opposite `corner` of `triangle`.
///
/// With `triangle = [o, a, b]` and neighbor `[q, b, a]`, the two triangles become
/// `[o, a, q]` (keeping `triangle`'s id) and `[q, b, o]` (keeping the neighbor's
/// id), which are returned in that order. The new diagonal `q → o` is the edge
/// opposite corner 1 of the first result.
///
/// The quadrilateral `o, a, q, b` must be strictly convex for the result to be
/// counterclockwise; this is not checked.
///
/// # Errors
///
/// Returns [`FlipError::BoundaryEdge`] if the edge has no neighbor,
/// [`FlipError::DegenerateQuad`] if both triangles share all three vertices, or
/// [`FlipError::MissingTriangle`] / [`FlipError::InvalidAdjacency`] for an
/// inconsistent mesh.
pub fn flip_edge(
    mesh: &mut Mesh,
    triangle: TriangleId,
    corner: Corner,
) -> Result<[TriangleId; 2], FlipError> {
    let near = *mesh
        .triangle(triangle)
        .ok_or(FlipError::MissingTriangle { triangle })?;
    let (neighbor, mirrored) =
        outer_link(mesh, triangle, corner)?.ok_or(FlipError::BoundaryEdge { triangle, corner })?;
    let far = *mesh.tri(neighbor);

    let [o, a, b] = near.rotated(corner);
    let q = far.vertex(mirrored);
    if q == o {
        return Err(FlipError::DegenerateQuad { triangle, neighbor });
    }

    let link_bo = outer_link(mesh, triangle, corner.next())?;
    let link_aq = outer_link(mesh, neighbor, mirrored.next())?;
    let n_oa = near.neighbor(corner.prev());
    let n_bo = near.neighbor(corner.next());
    let n_aq = far.neighbor(mirrored.next());
    let n_qb = far.neighbor(mirrored.prev());

    *mesh.tri_mut(triangle) = Triangle::with_neighbors([o, a, q], [n_aq, Some(neighbor), n_oa]);
    *mesh.tri_mut(neighbor) = Triangle::with_neighbors([q, b, o], [n_bo, Some(triangle), n_qb]);
    relink(mesh, link_aq, triangle);
    relink(mesh, link_bo, neighbor);

    mesh.set_anchor(o, triangle);
    mesh.set_anchor(a, triangle);
    mesh.set_anchor(q, neighbor);
    mesh.set_anchor(b, neighbor);

    tracing::trace!(%triangle, %neighbor, "flip edge");
    let result = [triangle, neighbor];
    debug_assert_local(mesh, &result, "flip_edge");
    Ok(result)
}

// =============================================================================
// TESTS
// =============================================================================
