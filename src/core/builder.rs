//! Bulk construction of a [`Mesh`] from index arrays.
//!
//! [`MeshBuilder`] assembles a mesh from a vertex list and a list of triangles
//! given as vertex indices, the layout produced by mesh loaders and by
//! [`Mesh::to_index_arrays`]. Adjacency is recovered by matching undirected
//! edges through a hash map. Nothing is flipped or reoriented: the result is
//! exactly the input connectivity, and triangles touching the boundary keep
//! open (`None`) neighbor slots. Use
//! [`crate::core::algorithms::legalize::repair_delaunay_with_flips`] to make
//! such a mesh Delaunay.
//!
//! Input index `i` becomes [`VertexId`] `i + 1`; id 0 is the infinite vertex.

use thiserror::Error;

use crate::core::collections::{
    Entry, FastHashMap, FastHashSet, fast_hash_map_with_capacity, fast_hash_set_with_capacity,
};
use crate::core::corner::Corner;
use crate::core::mesh::{Mesh, Triangle, TriangleId, VertexId};
use crate::geometry::point::Point;

/// Errors raised while assembling a mesh from index arrays.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum BuildError {
    /// A triangle references a vertex index that was never added.
    #[error("Vertex index {index} is out of range (have {vertex_count} vertices)")]
    VertexOutOfRange {
        /// The offending index.
        index: usize,
        /// Number of vertices added so far.
        vertex_count: usize,
    },
    /// A triangle uses the same vertex index more than once.
    #[error("Triangle {triangle:?} repeats a vertex index")]
    RepeatedVertex {
        /// The rejected triangle.
        triangle: [usize; 3],
    },
}

type EdgeKey = (VertexId, VertexId);

const fn edge_key(a: VertexId, b: VertexId) -> EdgeKey {
    if a.index() < b.index() { (a, b) } else { (b, a) }
}

/// Incremental assembler for meshes given as index arrays.
///
/// # Examples
///
/// ```rust
/// use trimesh2d::core::builder::MeshBuilder;
/// use trimesh2d::geometry::point::Point;
///
/// let mut builder = MeshBuilder::new();
/// for (x, y) in [(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)] {
///     builder.add_vertex(Point::new_2d(x, y));
/// }
/// let first = builder.add_triangle([0, 1, 2]).unwrap();
/// let second = builder.add_triangle([0, 2, 3]).unwrap();
/// assert_eq!(builder.open_edge_count(), 4);
///
/// let mesh = builder.build();
/// assert_eq!(mesh.number_of_triangles(), 2);
/// assert!(mesh.triangle(first).unwrap().neighbors().contains(&Some(second)));
/// ```
#[derive(Debug, Clone, Default)]
pub struct MeshBuilder {
    mesh: Mesh,
    open_edges: FastHashMap<EdgeKey, (TriangleId, Corner)>,
    sewn: FastHashSet<EdgeKey>,
}

impl MeshBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a builder with room for the given numbers of vertices and triangles.
    #[must_use]
    pub fn with_capacity(vertices: usize, triangles: usize) -> Self {
        Self {
            mesh: Mesh::with_capacity(vertices, triangles),
            open_edges: fast_hash_map_with_capacity(triangles * 3 / 2),
            sewn: fast_hash_set_with_capacity(triangles * 3 / 2),
        }
    }

    /// Adds a vertex; its input index is the number of vertices added before it.
    pub fn add_vertex(&mut self, point: Point) -> VertexId {
        self.mesh.add_point(point)
    }

    /// Adds a triangle over three vertex indices and sews it to the triangles
    /// already sharing its edges.
    ///
    /// An edge claimed by a third triangle is non-manifold: a warning is
    /// logged and the newest triangle takes over the open entry for that edge.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::VertexOutOfRange`] or [`BuildError::RepeatedVertex`];
    /// the builder is unchanged in that case.
    pub fn add_triangle(&mut self, indices: [usize; 3]) -> Result<TriangleId, BuildError> {
        let vertex_count = self.mesh.number_of_vertices();
        if let Some(&index) = indices.iter().find(|&&i| i >= vertex_count) {
            return Err(BuildError::VertexOutOfRange {
                index,
                vertex_count,
            });
        }
        let [i, j, k] = indices;
        if i == j || j == k || k == i {
            return Err(BuildError::RepeatedVertex { triangle: indices });
        }

        let vertices = indices.map(|index| VertexId::new(index + 1));
        let id = self.mesh.push_triangle(Triangle::new(vertices));

        for corner in Corner::ALL {
            let (a, b) = self.mesh.tri(id).edge(corner);
            let key = edge_key(a, b);
            match self.open_edges.entry(key) {
                Entry::Occupied(entry) if !self.sewn.contains(&key) => {
                    let (other, other_corner) = entry.remove();
                    self.mesh.tri_mut(id).set_neighbor(corner, Some(other));
                    self.mesh
                        .tri_mut(other)
                        .set_neighbor(other_corner, Some(id));
                    self.sewn.insert(key);
                }
                Entry::Occupied(mut entry) => {
                    tracing::warn!(
                        triangle = %id,
                        edge = ?(a, b),
                        "non-manifold edge: claimed by more than two triangles"
                    );
                    entry.insert((id, corner));
                }
                Entry::Vacant(entry) => {
                    if self.sewn.contains(&key) {
                        tracing::warn!(
                            triangle = %id,
                            edge = ?(a, b),
                            "non-manifold edge: claimed by more than two triangles"
                        );
                    }
                    entry.insert((id, corner));
                }
            }
        }

        for vertex in vertices {
            if self.mesh.anchor(vertex).is_none() {
                self.mesh.set_anchor(vertex, id);
            }
        }
        Ok(id)
    }

    /// Number of edges claimed by exactly one triangle so far.
    #[must_use]
    pub fn open_edge_count(&self) -> usize {
        self.open_edges.len()
    }

    /// Finishes the mesh.
    #[must_use]
    pub fn build(self) -> Mesh {
        tracing::debug!(
            vertices = self.mesh.number_of_vertices(),
            triangles = self.mesh.number_of_triangles(),
            open_edges = self.open_edges.len(),
            "built mesh from index arrays"
        );
        self.mesh
    }

    /// Builds a mesh from a vertex list and index triples.
    ///
    /// # Errors
    ///
    /// Returns the first [`BuildError`].
    pub fn from_arrays(points: &[Point], triangles: &[[usize; 3]]) -> Result<Mesh, BuildError> {
        let mut builder = Self::with_capacity(points.len(), triangles.len());
        for &point in points {
            builder.add_vertex(point);
        }
        for &triangle in triangles {
            builder.add_triangle(triangle)?;
        }
        Ok(builder.build())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::validation::{ValidationOptions, validate};

    fn square() -> Vec<Point> {
        [(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)]
            .map(|(x, y)| Point::new_2d(x, y))
            .to_vec()
    }

    #[test]
    fn shared_edges_are_sewn() {
        let mesh = MeshBuilder::from_arrays(&square(), &[[0, 1, 2], [0, 2, 3]]).unwrap();
        let (t0, t1) = (TriangleId::new(0), TriangleId::new(1));
        let c0 = mesh.tri(t0).corner_of(VertexId::new(2)).unwrap();
        let c1 = mesh.tri(t1).corner_of(VertexId::new(4)).unwrap();
        assert_eq!(mesh.neighbor(t0, c0), Some(t1));
        assert_eq!(mesh.neighbor(t1, c1), Some(t0));
        assert_eq!(
            mesh.triangles()
                .flat_map(|(_, t)| t.neighbors())
                .filter(Option::is_none)
                .count(),
            4
        );
        assert_eq!(mesh.anchor(VertexId::new(1)), Some(t0));
        assert_eq!(mesh.anchor(VertexId::new(4)), Some(t1));

        let open = ValidationOptions {
            require_closed: false,
            ..ValidationOptions::default()
        };
        assert!(validate(&mesh, open).is_ok());
    }

    #[test]
    fn bad_indices_are_rejected() {
        let mut builder = MeshBuilder::new();
        for p in square() {
            builder.add_vertex(p);
        }
        assert_eq!(
            builder.add_triangle([0, 1, 4]),
            Err(BuildError::VertexOutOfRange {
                index: 4,
                vertex_count: 4
            })
        );
        assert_eq!(
            builder.add_triangle([0, 2, 0]),
            Err(BuildError::RepeatedVertex { triangle: [0, 2, 0] })
        );
        assert_eq!(builder.build().number_of_triangles(), 0);
    }

    #[test]
    fn third_claim_takes_over_the_edge() {
        let mut points = square();
        points.push(Point::new_2d(0.5, -1.0));
        let mut builder = MeshBuilder::with_capacity(points.len(), 3);
        for p in points {
            builder.add_vertex(p);
        }
        builder.add_triangle([0, 1, 2]).unwrap();
        builder.add_triangle([1, 0, 4]).unwrap();
        // Edge 0-1 is already sewn; a third triangle on it is non-manifold.
        let third = builder.add_triangle([0, 1, 3]).unwrap();
        let mesh = builder.build();
        let corner = mesh.tri(third).corner_of(VertexId::new(4)).unwrap();
        assert_eq!(mesh.neighbor(third, corner), None);
        assert_eq!(mesh.number_of_triangles(), 3);
    }
}
