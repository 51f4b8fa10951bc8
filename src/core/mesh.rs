//! Triangle-adjacency mesh.
//!
//! The [`Mesh`] owns two append-only arenas: vertex positions and triangles.
//! Every triangle stores three vertex ids and, per corner, the id of the triangle
//! across the opposite edge. Vertex `0` is a sentinel "point at infinity"; hull
//! edges are closed against it so that a fully built triangulation has no open
//! boundary. Each vertex additionally records one incident *anchor* triangle,
//! which is where [`FaceCirculator`]s start.
//!
//! # Conventions
//!
//! - Finite triangles are counterclockwise.
//! - The neighbor at corner `i` shares the edge `(v[i+1], v[i+2])`.
//! - For a hull edge `a → b` (interior on the left) the infinite triangle is
//!   `[INF, b, a]`, so adjacent triangles always traverse their shared edge in
//!   opposite directions.
//! - Triangle ids are adjacency slots, not identities: a local rewrite may give
//!   an existing id entirely new contents.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::circulator::FaceCirculator;
use crate::core::corner::Corner;
use crate::geometry::point::Point;

// =============================================================================
// HANDLES
// =============================================================================

/// Index of a vertex in the mesh's vertex arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VertexId(usize);

impl VertexId {
    /// The sentinel vertex at infinity.
    pub const INFINITE: Self = Self(0);

    /// Wraps a raw arena index.
    #[must_use]
    pub const fn new(index: usize) -> Self {
        Self(index)
    }

    /// Raw arena index.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }

    /// Returns `true` for the sentinel vertex.
    #[must_use]
    pub const fn is_infinite(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for VertexId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_infinite() {
            write!(f, "v∞")
        } else {
            write!(f, "v{}", self.0)
        }
    }
}

/// Index of a triangle in the mesh's triangle arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TriangleId(usize);

impl TriangleId {
    /// Wraps a raw arena index.
    #[must_use]
    pub const fn new(index: usize) -> Self {
        Self(index)
    }

    /// Raw arena index.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for TriangleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "t{}", self.0)
    }
}

// =============================================================================
// TRIANGLE
// =============================================================================

/// Three vertex ids plus the neighbor across each corner's opposite edge.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Triangle {
    vertices: [VertexId; 3],
    neighbors: [Option<TriangleId>; 3],
}

impl Triangle {
    /// Creates a triangle without neighbors.
    #[must_use]
    pub const fn new(vertices: [VertexId; 3]) -> Self {
        Self {
            vertices,
            neighbors: [None; 3],
        }
    }

    /// Creates a triangle with the given neighbors.
    #[must_use]
    pub const fn with_neighbors(
        vertices: [VertexId; 3],
        neighbors: [Option<TriangleId>; 3],
    ) -> Self {
        Self {
            vertices,
            neighbors,
        }
    }

    /// The three vertex ids in storage order.
    #[must_use]
    pub const fn vertices(&self) -> [VertexId; 3] {
        self.vertices
    }

    /// The three neighbor slots in storage order.
    #[must_use]
    pub const fn neighbors(&self) -> [Option<TriangleId>; 3] {
        self.neighbors
    }

    /// Vertex at `corner`.
    #[must_use]
    pub const fn vertex(&self, corner: Corner) -> VertexId {
        self.vertices[corner.index()]
    }

    /// Neighbor across the edge opposite `corner`.
    #[must_use]
    pub const fn neighbor(&self, corner: Corner) -> Option<TriangleId> {
        self.neighbors[corner.index()]
    }

    pub(crate) const fn set_neighbor(&mut self, corner: Corner, neighbor: Option<TriangleId>) {
        self.neighbors[corner.index()] = neighbor;
    }

    /// Corner holding `vertex`, if any.
    #[must_use]
    pub fn corner_of(&self, vertex: VertexId) -> Option<Corner> {
        Corner::ALL.into_iter().find(|&c| self.vertex(c) == vertex)
    }

    /// Corner whose opposite edge is shared with `neighbor`, if any.
    #[must_use]
    pub fn corner_of_neighbor(&self, neighbor: TriangleId) -> Option<Corner> {
        Corner::ALL
            .into_iter()
            .find(|&c| self.neighbor(c) == Some(neighbor))
    }

    /// Directed edge opposite `corner`: `(v[corner+1], v[corner+2])`.
    #[must_use]
    pub const fn edge(&self, corner: Corner) -> (VertexId, VertexId) {
        (self.vertex(corner.next()), self.vertex(corner.prev()))
    }

    /// Corner opposite the undirected edge `{a, b}`, if both are vertices of this triangle.
    #[must_use]
    pub fn find_edge(&self, a: VertexId, b: VertexId) -> Option<Corner> {
        Corner::ALL.into_iter().find(|&c| {
            let (p, q) = self.edge(c);
            (p == a && q == b) || (p == b && q == a)
        })
    }

    /// Returns `true` if `vertex` is one of the corners.
    #[must_use]
    pub fn contains(&self, vertex: VertexId) -> bool {
        self.vertices.contains(&vertex)
    }

    /// Returns `true` if the triangle touches the infinite vertex.
    #[must_use]
    pub fn is_infinite(&self) -> bool {
        self.contains(VertexId::INFINITE)
    }

    /// Vertex ids starting at `corner`, preserving cyclic order.
    #[must_use]
    pub const fn rotated(&self, corner: Corner) -> [VertexId; 3] {
        [
            self.vertex(corner),
            self.vertex(corner.next()),
            self.vertex(corner.prev()),
        ]
    }
}

// =============================================================================
// ERRORS
// =============================================================================

/// Errors reported by mesh queries.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum MeshError {
    /// The vertex id is outside the vertex arena.
    #[error("Vertex {vertex} does not exist")]
    VertexNotFound {
        /// The offending vertex.
        vertex: VertexId,
    },
    /// The triangle id is outside the triangle arena.
    #[error("Triangle {triangle} does not exist")]
    TriangleNotFound {
        /// The offending triangle.
        triangle: TriangleId,
    },
    /// The vertex has no anchor triangle.
    #[error("Vertex {vertex} has no incident triangle")]
    NoIncidentTriangle {
        /// The isolated vertex.
        vertex: VertexId,
    },
    /// The vertex's anchor triangle does not contain it.
    #[error("Anchor triangle {triangle} of vertex {vertex} does not contain it")]
    StaleAnchor {
        /// The vertex.
        vertex: VertexId,
        /// Its recorded anchor.
        triangle: TriangleId,
    },
    /// Walking around the vertex hit a missing neighbor.
    #[error("One-ring of vertex {vertex} is not closed")]
    OpenOneRing {
        /// The vertex.
        vertex: VertexId,
    },
    /// The one-ring contains a triangle incident to the infinite vertex.
    #[error("One-ring of vertex {vertex} touches the infinite vertex")]
    InfiniteOneRing {
        /// The vertex.
        vertex: VertexId,
    },
    /// An incident triangle has zero area.
    #[error("Degenerate triangle {triangle} around vertex {vertex}")]
    DegenerateOneRing {
        /// The vertex.
        vertex: VertexId,
        /// The zero-area triangle.
        triangle: TriangleId,
    },
    /// Deserialized data does not describe a consistent arena.
    #[error("Invalid serialized mesh: {message}")]
    InvalidSerializedMesh {
        /// Description of the inconsistency.
        message: String,
    },
}

// =============================================================================
// MESH
// =============================================================================

/// Vertex and triangle arenas with per-vertex anchor triangles.
///
/// # Examples
///
/// ```rust
/// use trimesh2d::core::mesh::{Mesh, VertexId};
/// use trimesh2d::geometry::point::Point;
///
/// let mut mesh = Mesh::new();
/// let v = mesh.add_point(Point::new_2d(1.0, 2.0));
/// assert_eq!(v, VertexId::new(1));
/// assert_eq!(mesh.number_of_vertices(), 1);
/// assert_eq!(mesh.number_of_triangles(), 0);
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "MeshData", into = "MeshData")]
pub struct Mesh {
    points: Vec<Point>,
    anchors: Vec<Option<TriangleId>>,
    triangles: Vec<Triangle>,
}

impl Default for Mesh {
    fn default() -> Self {
        Self::new()
    }
}

impl Mesh {
    /// Creates a mesh containing only the infinite vertex.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(0, 0)
    }

    /// Creates an empty mesh with room for `vertices` finite vertices and `triangles` triangles.
    #[must_use]
    pub fn with_capacity(vertices: usize, triangles: usize) -> Self {
        let mut points = Vec::with_capacity(vertices + 1);
        let mut anchors = Vec::with_capacity(vertices + 1);
        points.push(Point::INFINITE);
        anchors.push(None);
        Self {
            points,
            anchors,
            triangles: Vec::with_capacity(triangles),
        }
    }

    /// Appends a vertex and returns its id. The vertex has no incident triangle yet.
    pub fn add_point(&mut self, point: Point) -> VertexId {
        let id = VertexId(self.points.len());
        self.points.push(point);
        self.anchors.push(None);
        id
    }

    /// Number of finite vertices (the sentinel is not counted).
    #[must_use]
    pub fn number_of_vertices(&self) -> usize {
        self.points.len() - 1
    }

    /// Number of triangles, including infinite ones.
    #[must_use]
    pub fn number_of_triangles(&self) -> usize {
        self.triangles.len()
    }

    /// Number of triangles not incident to the infinite vertex.
    #[must_use]
    pub fn number_of_finite_triangles(&self) -> usize {
        self.triangles.iter().filter(|t| !t.is_infinite()).count()
    }

    /// Position of `vertex`.
    #[must_use]
    pub fn point(&self, vertex: VertexId) -> Option<&Point> {
        self.points.get(vertex.0)
    }

    /// All vertex positions, indexed by [`VertexId::index`] (slot 0 is the sentinel).
    #[must_use]
    pub fn points(&self) -> &[Point] {
        &self.points
    }

    /// Ids of all finite vertices.
    pub fn vertex_ids(&self) -> impl Iterator<Item = VertexId> + '_ {
        (1..self.points.len()).map(VertexId)
    }

    /// Triangle stored at `triangle`.
    #[must_use]
    pub fn triangle(&self, triangle: TriangleId) -> Option<&Triangle> {
        self.triangles.get(triangle.0)
    }

    /// All triangles with their ids.
    pub fn triangles(&self) -> impl Iterator<Item = (TriangleId, &Triangle)> + '_ {
        self.triangles
            .iter()
            .enumerate()
            .map(|(i, t)| (TriangleId(i), t))
    }

    /// Triangles not incident to the infinite vertex.
    pub fn finite_triangles(&self) -> impl Iterator<Item = (TriangleId, &Triangle)> + '_ {
        self.triangles().filter(|(_, t)| !t.is_infinite())
    }

    /// Neighbor of `triangle` across the edge opposite `corner`.
    #[must_use]
    pub fn neighbor(&self, triangle: TriangleId, corner: Corner) -> Option<TriangleId> {
        self.triangle(triangle)?.neighbor(corner)
    }

    /// The edge opposite `corner` seen from the other side: the neighbor across it
    /// and the neighbor's corner opposite the same edge.
    #[must_use]
    pub fn mirror(&self, triangle: TriangleId, corner: Corner) -> Option<(TriangleId, Corner)> {
        let current = self.triangle(triangle)?;
        let neighbor = current.neighbor(corner)?;
        let (a, b) = current.edge(corner);
        let mirrored = self.triangle(neighbor)?.find_edge(a, b)?;
        Some((neighbor, mirrored))
    }

    /// Positions of the three corners of `triangle`, in storage order.
    #[must_use]
    pub fn vertices_of(&self, triangle: TriangleId) -> Option<[Point; 3]> {
        let [a, b, c] = self.triangle(triangle)?.vertices();
        Some([*self.point(a)?, *self.point(b)?, *self.point(c)?])
    }

    /// Anchor triangle of `vertex`.
    #[must_use]
    pub fn anchor(&self, vertex: VertexId) -> Option<TriangleId> {
        self.anchors.get(vertex.0).copied().flatten()
    }

    /// Circulator over the triangles incident to `vertex`, starting at its anchor.
    ///
    /// # Errors
    ///
    /// Returns an error if `vertex` does not exist, has no incident triangle, or
    /// its anchor does not contain it.
    pub fn faces_around(&self, vertex: VertexId) -> Result<FaceCirculator<'_>, MeshError> {
        if vertex.0 >= self.points.len() {
            return Err(MeshError::VertexNotFound { vertex });
        }
        let start = self
            .anchor(vertex)
            .ok_or(MeshError::NoIncidentTriangle { vertex })?;
        let anchored = self
            .triangle(start)
            .ok_or(MeshError::TriangleNotFound { triangle: start })?;
        if !anchored.contains(vertex) {
            return Err(MeshError::StaleAnchor {
                vertex,
                triangle: start,
            });
        }
        Ok(FaceCirculator::new(self, vertex, start))
    }

    /// Cotangent-weighted discrete Laplacian of a scalar field at `vertex`.
    ///
    /// Computes `Σ (cot α + cot β) (f(n) − f(v))` over the edges `(v, n)` of the
    /// one-ring, divided by `(2/3) · A` where `A` is the total area of the
    /// incident triangles. Angles and areas are measured in 3D, so elevations
    /// contribute.
    ///
    /// # Errors
    ///
    /// Returns an error unless `vertex` has a closed one-ring made only of
    /// finite, non-degenerate triangles.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use trimesh2d::core::builder::MeshBuilder;
    /// use trimesh2d::core::mesh::VertexId;
    /// use trimesh2d::geometry::point::Point;
    ///
    /// // A fan of four triangles around the origin.
    /// let points = [
    ///     Point::new_2d(0.0, 0.0),
    ///     Point::new_2d(1.0, 0.0),
    ///     Point::new_2d(0.0, 1.0),
    ///     Point::new_2d(-1.0, 0.0),
    ///     Point::new_2d(0.0, -1.0),
    /// ];
    /// let mesh = MeshBuilder::from_arrays(&points, &[[0, 1, 2], [0, 2, 3], [0, 3, 4], [0, 4, 1]])
    ///     .unwrap();
    /// let center = VertexId::new(1);
    /// let lap = mesh.laplacian(center, |v| mesh.point(v).map_or(0.0, |p| p.x)).unwrap();
    /// assert!(lap.abs() < 1e-12);
    /// ```
    pub fn laplacian<F>(&self, vertex: VertexId, value: F) -> Result<f64, MeshError>
    where
        F: Fn(VertexId) -> f64,
    {
        let circulator = self.faces_around(vertex)?;
        if !circulator.is_closed() {
            return Err(MeshError::OpenOneRing { vertex });
        }

        let center = *self
            .point(vertex)
            .ok_or(MeshError::VertexNotFound { vertex })?;
        let center_value = value(vertex);
        let mut weighted_sum = 0.0;
        let mut area = 0.0;

        for id in circulator.ring() {
            let triangle = self.tri(id);
            if triangle.is_infinite() {
                return Err(MeshError::InfiniteOneRing { vertex });
            }
            let corner = triangle
                .corner_of(vertex)
                .ok_or(MeshError::StaleAnchor {
                    vertex,
                    triangle: id,
                })?;
            let a = triangle.vertex(corner.next());
            let b = triangle.vertex(corner.prev());
            let pa = *self.point(a).ok_or(MeshError::VertexNotFound { vertex: a })?;
            let pb = *self.point(b).ok_or(MeshError::VertexNotFound { vertex: b })?;

            let double_area = (pa - center).cross(pb - center).norm();
            if double_area <= 0.0 {
                return Err(MeshError::DegenerateOneRing {
                    vertex,
                    triangle: id,
                });
            }
            // Angle at b weights edge (v, a); angle at a weights edge (v, b).
            let cot_b = (center - pb).dot(pa - pb) / double_area;
            let cot_a = (center - pa).dot(pb - pa) / double_area;
            weighted_sum += cot_b * (value(a) - center_value);
            weighted_sum += cot_a * (value(b) - center_value);
            area += 0.5 * double_area;
        }

        Ok(weighted_sum / (2.0 / 3.0 * area))
    }

    /// Vertices on the convex hull, in ring order around the infinite vertex.
    ///
    /// Empty until the mesh has been closed against the infinite vertex.
    #[must_use]
    pub fn hull_vertices(&self) -> Vec<VertexId> {
        let Ok(circulator) = self.faces_around(VertexId::INFINITE) else {
            return Vec::new();
        };
        circulator
            .ring()
            .filter_map(|id| {
                let triangle = self.tri(id);
                triangle
                    .corner_of(VertexId::INFINITE)
                    .map(|c| triangle.vertex(c.next()))
            })
            .collect()
    }

    /// Exports finite vertices and finite triangles as plain arrays.
    ///
    /// Vertex `VertexId(i)` becomes index `i - 1`; infinite triangles are dropped.
    /// The result is the input format of
    /// [`MeshBuilder::from_arrays`](crate::core::builder::MeshBuilder::from_arrays).
    #[must_use]
    pub fn to_index_arrays(&self) -> (Vec<Point>, Vec<[usize; 3]>) {
        let points = self.points[1..].to_vec();
        let triangles = self
            .finite_triangles()
            .map(|(_, t)| t.vertices().map(|v| v.0 - 1))
            .collect();
        (points, triangles)
    }

    // -------------------------------------------------------------------------
    // Crate-internal mutation
    // -------------------------------------------------------------------------

    pub(crate) fn push_triangle(&mut self, triangle: Triangle) -> TriangleId {
        let id = TriangleId(self.triangles.len());
        self.triangles.push(triangle);
        id
    }

    /// Triangle at a known-valid id.
    pub(crate) fn tri(&self, triangle: TriangleId) -> &Triangle {
        &self.triangles[triangle.0]
    }

    pub(crate) fn tri_mut(&mut self, triangle: TriangleId) -> &mut Triangle {
        &mut self.triangles[triangle.0]
    }

    pub(crate) fn set_anchor(&mut self, vertex: VertexId, triangle: TriangleId) {
        self.anchors[vertex.0] = Some(triangle);
    }

    pub(crate) fn has_triangle(&self, triangle: TriangleId) -> bool {
        triangle.0 < self.triangles.len()
    }
}

// =============================================================================
// SERIALIZATION
// =============================================================================

/// Wire form of a [`Mesh`]: the sentinel vertex is implicit.
#[derive(Serialize, Deserialize)]
struct MeshData {
    /// Finite vertex positions; `points[i]` is `VertexId(i + 1)`.
    points: Vec<Point>,
    /// One slot per vertex including the sentinel. `anchors[0]` is an infinite
    /// triangle once the hull is closed, and is where
    /// [`Mesh::hull_vertices`] starts its walk.
    anchors: Vec<Option<TriangleId>>,
    triangles: Vec<Triangle>,
}

impl From<Mesh> for MeshData {
    fn from(mesh: Mesh) -> Self {
        let mut points = mesh.points;
        points.remove(0);
        Self {
            points,
            anchors: mesh.anchors,
            triangles: mesh.triangles,
        }
    }
}

impl TryFrom<MeshData> for Mesh {
    type Error = MeshError;

    fn try_from(data: MeshData) -> Result<Self, Self::Error> {
        let vertex_count = data.points.len() + 1;
        let triangle_count = data.triangles.len();
        let invalid = |message: String| MeshError::InvalidSerializedMesh { message };

        if data.anchors.len() != vertex_count {
            return Err(invalid(format!(
                "expected {vertex_count} anchors, found {}",
                data.anchors.len()
            )));
        }
        if let Some(t) = data.anchors.iter().flatten().find(|t| t.0 >= triangle_count) {
            return Err(invalid(format!("anchor {t} is out of range")));
        }
        for (i, triangle) in data.triangles.iter().enumerate() {
            if let Some(v) = triangle.vertices.iter().find(|v| v.0 >= vertex_count) {
                return Err(invalid(format!("triangle t{i} references unknown vertex {v}")));
            }
            if let Some(n) = triangle.neighbors.iter().flatten().find(|n| n.0 >= triangle_count) {
                return Err(invalid(format!("triangle t{i} references unknown neighbor {n}")));
            }
        }

        let mut points = Vec::with_capacity(vertex_count);
        points.push(Point::INFINITE);
        points.extend(data.points);
        Ok(Self {
            points,
            anchors: data.anchors,
            triangles: data.triangles,
        })
    }
}

// =============================================================================
// TESTS
// =============================================================================
