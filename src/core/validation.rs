//! Structural and geometric invariant checks for [`Mesh`].
//!
//! Every check is re-derived from scratch from the arenas, so the validator can
//! serve as an oracle after any sequence of edits. The invariants are:
//!
//! - **references**: every vertex and neighbor id points into its arena;
//! - **distinct corners**: a triangle never repeats a vertex;
//! - **orientation**: finite triangles are strictly counterclockwise;
//! - **adjacency symmetry**: if `A` names `B` across an edge, `B` names `A`
//!   across the same (reversed) edge;
//! - **anchors**: each vertex's anchor contains it, and every vertex with an
//!   incident triangle has an anchor;
//! - **closed one-rings**: circulating around a vertex visits every incident
//!   triangle and returns to the start;
//! - optionally, the **Delaunay** empty-circumcircle property.

use thiserror::Error;

use crate::core::corner::Corner;
use crate::core::mesh::{Mesh, TriangleId, VertexId};
use crate::core::util::delaunay_validation::find_delaunay_violations;
use crate::geometry::predicates::{Orientation, orientation_2d};

// =============================================================================
// ERRORS AND REPORTS
// =============================================================================

/// A violated mesh invariant.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum MeshValidationError {
    /// A triangle references a vertex outside the vertex arena.
    #[error("Triangle {triangle} references unknown vertex {vertex}")]
    UnknownVertex {
        /// The referencing triangle.
        triangle: TriangleId,
        /// The dangling vertex id.
        vertex: VertexId,
    },
    /// A triangle references a neighbor outside the triangle arena.
    #[error("Triangle {triangle} references unknown neighbor {neighbor}")]
    UnknownNeighbor {
        /// The referencing triangle.
        triangle: TriangleId,
        /// The dangling triangle id.
        neighbor: TriangleId,
    },
    /// A triangle uses the same vertex twice.
    #[error("Triangle {triangle} repeats vertex {vertex}")]
    RepeatedVertex {
        /// The malformed triangle.
        triangle: TriangleId,
        /// The repeated vertex.
        vertex: VertexId,
    },
    /// A finite triangle is not counterclockwise.
    #[error("Finite triangle {triangle} has orientation {orientation}, expected POSITIVE")]
    BadOrientation {
        /// The offending triangle.
        triangle: TriangleId,
        /// Its measured orientation.
        orientation: Orientation,
    },
    /// A neighbor slot is empty in a mesh required to be closed.
    #[error("Triangle {triangle} has no neighbor across corner {corner}")]
    MissingNeighbor {
        /// The triangle with the open edge.
        triangle: TriangleId,
        /// Corner opposite the open edge.
        corner: Corner,
    },
    /// The neighbor does not point back, or does not share the edge.
    #[error(
        "Triangle {triangle} names {neighbor} across corner {corner}, but {neighbor} has no matching back-reference"
    )]
    AsymmetricAdjacency {
        /// The referencing triangle.
        triangle: TriangleId,
        /// Corner of the referencing slot.
        corner: Corner,
        /// The neighbor lacking the back-reference.
        neighbor: TriangleId,
    },
    /// A vertex's anchor triangle does not contain it.
    #[error("Vertex {vertex} is anchored to {triangle}, which does not contain it")]
    InvalidAnchor {
        /// The vertex.
        vertex: VertexId,
        /// The recorded anchor.
        triangle: TriangleId,
    },
    /// A vertex with incident triangles has no anchor.
    #[error("Vertex {vertex} has incident triangles but no anchor")]
    MissingAnchor {
        /// The vertex.
        vertex: VertexId,
    },
    /// Circulating around the vertex does not reach all incident triangles.
    #[error("One-ring of vertex {vertex} is not closed: visited {visited} of {incident} incident triangles")]
    OpenOneRing {
        /// The vertex.
        vertex: VertexId,
        /// Triangles reached by circulation.
        visited: usize,
        /// Triangles that contain the vertex.
        incident: usize,
    },
    /// The opposite vertex of a neighbor lies strictly inside the circumcircle.
    #[error("Edge opposite corner {corner} of triangle {triangle} is not locally Delaunay")]
    DelaunayViolation {
        /// Triangle on one side of the edge.
        triangle: TriangleId,
        /// Corner opposite the edge.
        corner: Corner,
    },
}

/// Category of invariant, used to group violations in a report.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum InvariantKind {
    /// Vertex and neighbor ids are in range.
    References,
    /// No triangle repeats a vertex.
    DistinctVertices,
    /// Finite triangles are counterclockwise.
    Orientation,
    /// Neighbor relations are mutual.
    NeighborConsistency,
    /// Anchors are incident to their vertex.
    Anchors,
    /// One-rings are closed.
    OneRings,
    /// Empty circumcircle property.
    Delaunay,
}

/// A single invariant violation recorded during validation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InvariantViolation {
    /// The kind of invariant that failed.
    pub kind: InvariantKind,
    /// The detailed validation error.
    pub error: MeshValidationError,
}

/// Aggregate report of every violated invariant.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MeshValidationReport {
    /// Violations in the order they were found.
    pub violations: Vec<InvariantViolation>,
}

impl MeshValidationReport {
    /// Returns `true` if no violations were recorded.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.violations.is_empty()
    }

    /// Returns `true` if a violation of `kind` was recorded.
    #[must_use]
    pub fn has(&self, kind: InvariantKind) -> bool {
        self.violations.iter().any(|v| v.kind == kind)
    }
}

/// Selects which invariants [`validate`] and [`validation_report`] check.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ValidationOptions {
    /// Require finite triangles to be counterclockwise.
    pub check_orientation: bool,
    /// Require every neighbor slot to be filled and every one-ring to be closed.
    pub require_closed: bool,
    /// Check the Delaunay property of every finite edge.
    pub check_delaunay: bool,
}

impl Default for ValidationOptions {
    fn default() -> Self {
        Self {
            check_orientation: true,
            require_closed: true,
            check_delaunay: false,
        }
    }
}

impl ValidationOptions {
    /// Adjacency, corner and anchor checks only; suitable for open meshes of any orientation.
    #[must_use]
    pub const fn structural() -> Self {
        Self {
            check_orientation: false,
            require_closed: false,
            check_delaunay: false,
        }
    }

    /// Default checks plus the Delaunay property.
    #[must_use]
    pub const fn delaunay() -> Self {
        Self {
            check_orientation: true,
            require_closed: true,
            check_delaunay: true,
        }
    }
}

// =============================================================================
// ENTRY POINTS
// =============================================================================

/// Validates `mesh`, returning the first violated invariant.
///
/// # Errors
///
/// Returns the first [`MeshValidationError`] found.
///
/// # Examples
///
/// ```rust
/// use trimesh2d::core::triangulation::Triangulation;
/// use trimesh2d::core::validation::{ValidationOptions, validate};
/// use trimesh2d::geometry::point::Point;
///
/// let tri = Triangulation::from_points(&[
///     Point::new_2d(0.0, 0.0),
///     Point::new_2d(1.0, 0.0),
///     Point::new_2d(0.0, 1.0),
///     Point::new_2d(0.3, 0.3),
/// ])
/// .unwrap();
/// assert!(validate(tri.mesh(), ValidationOptions::default()).is_ok());
/// ```
pub fn validate(mesh: &Mesh, options: ValidationOptions) -> Result<(), MeshValidationError> {
    match validation_report(mesh, options).violations.into_iter().next() {
        Some(violation) => Err(violation.error),
        None => Ok(()),
    }
}

/// Runs every selected check and collects all violations.
///
/// Reference errors make the remaining checks meaningless, so they end the
/// report early.
#[must_use]
pub fn validation_report(mesh: &Mesh, options: ValidationOptions) -> MeshValidationReport {
    let mut report = MeshValidationReport::default();
    let mut record = |kind, error| report.violations.push(InvariantViolation { kind, error });

    for (id, _) in mesh.triangles() {
        if let Err(error) = check_references(mesh, id) {
            record(InvariantKind::References, error);
        }
    }
    if !report.is_empty() {
        return report;
    }
    let mut record = |kind, error| report.violations.push(InvariantViolation { kind, error });

    for (id, _) in mesh.triangles() {
        if let Err(error) = check_distinct(mesh, id) {
            record(InvariantKind::DistinctVertices, error);
        }
        if let Some(Err(error)) = options.check_orientation.then(|| check_orientation(mesh, id)) {
            record(InvariantKind::Orientation, error);
        }
        for corner in Corner::ALL {
            if let Err(error) = check_adjacency(mesh, id, corner, options.require_closed) {
                record(InvariantKind::NeighborConsistency, error);
            }
        }
    }

    let incident = incident_counts(mesh);
    for vertex in std::iter::once(VertexId::INFINITE).chain(mesh.vertex_ids()) {
        let count = incident[vertex.index()];
        if let Err(error) = check_anchor(mesh, vertex, count) {
            record(InvariantKind::Anchors, error);
            continue;
        }
        let closed =
            (options.require_closed && count > 0).then(|| check_one_ring(mesh, vertex, count));
        if let Some(Err(error)) = closed {
            record(InvariantKind::OneRings, error);
        }
    }

    if options.check_delaunay {
        for (triangle, corner) in find_delaunay_violations(mesh) {
            record(
                InvariantKind::Delaunay,
                MeshValidationError::DelaunayViolation { triangle, corner },
            );
        }
    }

    report
}

/// Checks only the given triangles and the anchors of their corners.
///
/// Used to verify local rewrites without rescanning the whole mesh.
pub(crate) fn check_local(mesh: &Mesh, triangles: &[TriangleId]) -> Result<(), MeshValidationError> {
    for &id in triangles {
        check_references(mesh, id)?;
        check_distinct(mesh, id)?;
        for corner in Corner::ALL {
            check_adjacency(mesh, id, corner, false)?;
        }
        for vertex in mesh.tri(id).vertices() {
            check_anchor(mesh, vertex, 1)?;
        }
    }
    Ok(())
}

/// Panics with a description if a local rewrite left the touched triangles inconsistent.
///
/// Compiled to nothing in release builds.
pub(crate) fn debug_assert_local(mesh: &Mesh, triangles: &[TriangleId], operation: &str) {
    if let Some(Err(error)) = cfg!(debug_assertions).then(|| check_local(mesh, triangles)) {
        panic!("{operation} left the mesh inconsistent: {error}");
    }
}

// =============================================================================
// INDIVIDUAL CHECKS
// =============================================================================

fn check_references(mesh: &Mesh, id: TriangleId) -> Result<(), MeshValidationError> {
    let triangle = mesh.tri(id);
    if let Some(vertex) = triangle
        .vertices()
        .into_iter()
        .find(|&v| mesh.point(v).is_none())
    {
        return Err(MeshValidationError::UnknownVertex {
            triangle: id,
            vertex,
        });
    }
    if let Some(neighbor) = triangle
        .neighbors()
        .into_iter()
        .flatten()
        .find(|&n| !mesh.has_triangle(n))
    {
        return Err(MeshValidationError::UnknownNeighbor {
            triangle: id,
            neighbor,
        });
    }
    Ok(())
}

fn check_distinct(mesh: &Mesh, id: TriangleId) -> Result<(), MeshValidationError> {
    let [a, b, c] = mesh.tri(id).vertices();
    let repeated = if a == b || a == c {
        Some(a)
    } else if b == c {
        Some(b)
    } else {
        None
    };
    repeated.map_or(Ok(()), |vertex| {
        Err(MeshValidationError::RepeatedVertex {
            triangle: id,
            vertex,
        })
    })
}

fn check_orientation(mesh: &Mesh, id: TriangleId) -> Result<(), MeshValidationError> {
    if mesh.tri(id).is_infinite() {
        return Ok(());
    }
    let Some([a, b, c]) = mesh.vertices_of(id) else {
        return Ok(());
    };
    match orientation_2d(&a, &b, &c) {
        Orientation::POSITIVE => Ok(()),
        orientation => Err(MeshValidationError::BadOrientation {
            triangle: id,
            orientation,
        }),
    }
}

fn check_adjacency(
    mesh: &Mesh,
    id: TriangleId,
    corner: Corner,
    require_closed: bool,
) -> Result<(), MeshValidationError> {
    let triangle = mesh.tri(id);
    let Some(neighbor) = triangle.neighbor(corner) else {
        return if require_closed {
            Err(MeshValidationError::MissingNeighbor {
                triangle: id,
                corner,
            })
        } else {
            Ok(())
        };
    };
    let (a, b) = triangle.edge(corner);
    let other = mesh.tri(neighbor);
    let mutual = neighbor != id
        && other
            .find_edge(a, b)
            .is_some_and(|c| other.neighbor(c) == Some(id) && other.edge(c) == (b, a));
    if mutual {
        Ok(())
    } else {
        Err(MeshValidationError::AsymmetricAdjacency {
            triangle: id,
            corner,
            neighbor,
        })
    }
}

fn check_anchor(mesh: &Mesh, vertex: VertexId, incident: usize) -> Result<(), MeshValidationError> {
    match mesh.anchor(vertex) {
        Some(triangle) if mesh.triangle(triangle).is_some_and(|t| t.contains(vertex)) => Ok(()),
        Some(triangle) => Err(MeshValidationError::InvalidAnchor { vertex, triangle }),
        None if incident > 0 => Err(MeshValidationError::MissingAnchor { vertex }),
        None => Ok(()),
    }
}

fn check_one_ring(mesh: &Mesh, vertex: VertexId, incident: usize) -> Result<(), MeshValidationError> {
    let open = |visited| MeshValidationError::OpenOneRing {
        vertex,
        visited,
        incident,
    };
    let circulator = mesh.faces_around(vertex).map_err(|_| open(0))?;
    let visited = circulator.ring().count();
    if circulator.is_closed() && visited == incident {
        Ok(())
    } else {
        Err(open(visited))
    }
}

fn incident_counts(mesh: &Mesh) -> Vec<usize> {
    let mut counts = vec![0; mesh.points().len()];
    for (_, triangle) in mesh.triangles() {
        for vertex in triangle.vertices() {
            counts[vertex.index()] += 1;
        }
    }
    counts
}

// =============================================================================
// TESTS
// =============================================================================
