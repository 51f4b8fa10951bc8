//! Topology editing operations on a [`Mesh`].
//!
//! This module exposes the local rewrites of
//! [`crate::core::algorithms::flips`] as methods. These operations do **not**
//! restore the Delaunay property; use
//! [`crate::core::delaunay_triangulation::DelaunayTriangulation::insert`] or
//! [`crate::core::algorithms::legalize::repair_delaunay_with_flips`] for that.

pub use crate::core::algorithms::flips::{FlipError, SplitEdge, SplitFace};
pub use crate::core::corner::Corner;
pub use crate::core::mesh::{TriangleId, VertexId};

use crate::core::algorithms::flips::{flip_edge, split_edge, split_face};
use crate::core::mesh::Mesh;
use crate::geometry::point::Point;

/// Local rewrites that keep adjacency, back-references and anchors consistent.
///
/// # Example
///
/// ```rust
/// use trimesh2d::core::triangulation::Triangulation;
/// use trimesh2d::geometry::point::Point;
/// use trimesh2d::topology::edit::TopologyEdit;
///
/// let tri = Triangulation::from_points(&[
///     Point::new_2d(0.0, 0.0),
///     Point::new_2d(2.0, 0.0),
///     Point::new_2d(0.0, 2.0),
/// ])
/// .unwrap();
/// let (inner, _) = tri.mesh().finite_triangles().next().unwrap();
/// let mut mesh = tri.into_mesh();
///
/// let split = mesh.split_face(inner, Point::new_2d(0.5, 0.5)).unwrap();
/// assert_eq!(mesh.number_of_finite_triangles(), 3);
/// assert!(split.triangles.iter().all(|&t| mesh.triangle(t).unwrap().contains(split.vertex)));
/// ```
pub trait TopologyEdit {
    /// Inserts `point` strictly inside `triangle` (1→3 split).
    ///
    /// # Errors
    ///
    /// Returns [`FlipError`] if the triangle is missing or its adjacency is inconsistent.
    fn split_face(&mut self, triangle: TriangleId, point: Point) -> Result<SplitFace, FlipError>;

    /// Inserts `point` on the edge opposite `corner` (2→4, or 1→2 on an open boundary).
    ///
    /// # Errors
    ///
    /// Returns [`FlipError`] if the triangle is missing or its adjacency is inconsistent.
    fn split_edge(
        &mut self,
        triangle: TriangleId,
        corner: Corner,
        point: Point,
    ) -> Result<SplitEdge, FlipError>;

    /// Replaces the edge opposite `corner` by the other diagonal of its quadrilateral (2→2).
    ///
    /// # Errors
    ///
    /// Returns [`FlipError`] if the edge is on an open boundary or the adjacency is inconsistent.
    fn flip_edge(&mut self, triangle: TriangleId, corner: Corner)
    -> Result<[TriangleId; 2], FlipError>;
}

impl TopologyEdit for Mesh {
    fn split_face(&mut self, triangle: TriangleId, point: Point) -> Result<SplitFace, FlipError> {
        split_face(self, triangle, point)
    }

    fn split_edge(
        &mut self,
        triangle: TriangleId,
        corner: Corner,
        point: Point,
    ) -> Result<SplitEdge, FlipError> {
        split_edge(self, triangle, corner, point)
    }

    fn flip_edge(
        &mut self,
        triangle: TriangleId,
        corner: Corner,
    ) -> Result<[TriangleId; 2], FlipError> {
        flip_edge(self, triangle, corner)
    }
}
