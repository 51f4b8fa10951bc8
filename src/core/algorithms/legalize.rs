//! Lawson edge flipping to restore the Delaunay property.
//!
//! [`legalize_around`] is the per-insertion step: after a vertex `v` is
//! inserted only the edges opposite `v` in its incident triangles can be
//! illegal, and every flip replaces such an edge by one incident to `v`, so a
//! stack seeded with the one-ring of `v` suffices. [`repair_delaunay_with_flips`]
//! runs the same loop over every finite edge of an arbitrary triangulation.
//!
//! Both loops carry a flip budget; exceeding it reports non-convergence
//! instead of looping on numerically inconsistent predicates.

use thiserror::Error;

use crate::core::algorithms::flips::{FlipError, flip_edge};
use crate::core::collections::EdgeStack;
use crate::core::corner::Corner;
use crate::core::mesh::{Mesh, MeshError, TriangleId, VertexId};
use crate::core::util::delaunay_validation::is_edge_delaunay;
use crate::geometry::predicates::{Orientation, orientation_2d};

/// Statistics for flip-based Delaunay repair.
///
/// # Examples
///
/// ```rust
/// use trimesh2d::core::algorithms::legalize::DelaunayRepairStats;
///
/// let stats = DelaunayRepairStats::default();
/// assert_eq!(stats.flips_performed, 0);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DelaunayRepairStats {
    /// Number of edges tested.
    pub edges_checked: usize,
    /// Number of flips performed.
    pub flips_performed: usize,
    /// Maximum stack length observed.
    pub max_queue_len: usize,
}

/// Error during Delaunay legalization or repair.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum LegalizationError {
    /// The one-ring of the pivot vertex could not be walked.
    #[error(transparent)]
    Mesh(#[from] MeshError),

    /// Underlying flip error.
    #[error(transparent)]
    Flip(#[from] FlipError),

    /// Repair did not converge within the flip budget.
    #[error("Delaunay legalization failed to converge after {max_flips} flips")]
    NonConvergent {
        /// Maximum flips allowed.
        max_flips: usize,
        /// Statistics at the point of failure.
        stats: DelaunayRepairStats,
    },
}

/// Flip budget for a mesh with `triangle_count` triangles.
fn default_max_flips(triangle_count: usize) -> usize {
    triangle_count.saturating_mul(3).saturating_mul(4).max(128)
}

/// Restores the Delaunay property after `vertex` was inserted into a
/// Delaunay triangulation.
///
/// Each finite triangle `[v, a, b]` around the vertex is tested against the
/// vertex `q` across `a → b`; if `q` is strictly inside the circumcircle the
/// edge is flipped and both new triangles, which again contain `v`, are
/// revisited. Cocircular configurations are left alone. Infinite triangles and
/// hull edges are never flipped.
///
/// # Errors
///
/// Returns [`LegalizationError::Mesh`] if `vertex` has no closed one-ring,
/// [`LegalizationError::Flip`] on inconsistent adjacency and
/// [`LegalizationError::NonConvergent`] if the flip budget is exhausted.
pub fn legalize_around(
    mesh: &mut Mesh,
    vertex: VertexId,
) -> Result<DelaunayRepairStats, LegalizationError> {
    let ring = mesh.faces_around(vertex)?;
    if !ring.is_closed() {
        return Err(MeshError::OpenOneRing { vertex }.into());
    }
    let mut stack: Vec<TriangleId> = ring
        .ring()
        .filter(|&t| !mesh.tri(t).is_infinite())
        .collect();
    let max_flips = default_max_flips(mesh.number_of_triangles());
    let mut stats = DelaunayRepairStats {
        max_queue_len: stack.len(),
        ..DelaunayRepairStats::default()
    };

    while let Some(triangle) = stack.pop() {
        let Some(corner) = mesh.triangle(triangle).and_then(|t| t.corner_of(vertex)) else {
            continue;
        };
        stats.edges_checked += 1;
        if is_edge_delaunay(mesh, triangle, corner) {
            continue;
        }
        if stats.flips_performed >= max_flips {
            tracing::warn!(%vertex, max_flips, "legalization did not converge");
            return Err(LegalizationError::NonConvergent { max_flips, stats });
        }
        let [first, second] = flip_edge(mesh, triangle, corner)?;
        stats.flips_performed += 1;
        stack.extend([first, second]);
        stats.max_queue_len = stats.max_queue_len.max(stack.len());
    }

    tracing::trace!(
        %vertex,
        checked = stats.edges_checked,
        flips = stats.flips_performed,
        "legalized one-ring"
    );
    Ok(stats)
}

/// Returns `true` if the quadrilateral `o, a, q, b` around the edge opposite
/// `corner` is strictly convex, so flipping the edge keeps both triangles
/// counterclockwise.
fn is_flippable(mesh: &Mesh, triangle: TriangleId, corner: Corner) -> bool {
    let Some((neighbor, mirrored)) = mesh.mirror(triangle, corner) else {
        return false;
    };
    let q = mesh.tri(neighbor).vertex(mirrored);
    let [o, a, b] = mesh.tri(triangle).rotated(corner);
    let point = |v: VertexId| mesh.point(v).filter(|_| !v.is_infinite());
    let (Some(po), Some(pa), Some(pb), Some(pq)) = (point(o), point(a), point(b), point(q)) else {
        return false;
    };
    orientation_2d(po, pa, pq) == Orientation::POSITIVE
        && orientation_2d(pq, pb, po) == Orientation::POSITIVE
}

/// Flips every non-Delaunay finite edge of `mesh` until none is left.
///
/// The mesh may be any valid triangulation with counterclockwise finite
/// triangles, for instance one imported through
/// [`crate::core::builder::MeshBuilder`]. Edges whose quadrilateral is not
/// strictly convex are skipped.
///
/// # Errors
///
/// Returns [`LegalizationError::Flip`] on inconsistent adjacency and
/// [`LegalizationError::NonConvergent`] if the flip budget is exhausted.
///
/// # Examples
///
/// ```rust
/// use trimesh2d::core::algorithms::legalize::repair_delaunay_with_flips;
/// use trimesh2d::core::builder::MeshBuilder;
/// use trimesh2d::core::util::delaunay_validation::is_delaunay;
/// use trimesh2d::geometry::point::Point;
///
/// let points = [
///     Point::new_2d(0.0, 0.0),
///     Point::new_2d(1.0, 0.0),
///     Point::new_2d(0.8, 0.8),
///     Point::new_2d(0.0, 1.0),
/// ];
/// let mut mesh = MeshBuilder::from_arrays(&points, &[[0, 1, 3], [1, 2, 3]]).unwrap();
/// assert!(!is_delaunay(&mesh));
///
/// let stats = repair_delaunay_with_flips(&mut mesh).unwrap();
/// assert_eq!(stats.flips_performed, 1);
/// assert!(is_delaunay(&mesh));
/// ```
pub fn repair_delaunay_with_flips(mesh: &mut Mesh) -> Result<DelaunayRepairStats, LegalizationError> {
    let mut stack: EdgeStack = mesh
        .finite_triangles()
        .flat_map(|(id, _)| Corner::ALL.map(|corner| (id, corner)))
        .collect();
    let max_flips = default_max_flips(mesh.number_of_triangles());
    let mut stats = DelaunayRepairStats {
        max_queue_len: stack.len(),
        ..DelaunayRepairStats::default()
    };
    tracing::debug!(
        triangles = mesh.number_of_triangles(),
        edges = stack.len(),
        max_flips,
        "starting global Delaunay repair"
    );

    while let Some((triangle, corner)) = stack.pop() {
        if mesh.triangle(triangle).is_none_or(|t| t.is_infinite()) {
            continue;
        }
        stats.edges_checked += 1;
        if is_edge_delaunay(mesh, triangle, corner) || !is_flippable(mesh, triangle, corner) {
            continue;
        }
        if stats.flips_performed >= max_flips {
            tracing::warn!(max_flips, "global Delaunay repair did not converge");
            return Err(LegalizationError::NonConvergent { max_flips, stats });
        }
        let [first, second] = flip_edge(mesh, triangle, corner)?;
        stats.flips_performed += 1;
        // [o, a, q] and [q, b, o]: the outer edges sit opposite corners 0 and 2.
        for id in [first, second] {
            stack.push((id, Corner::ALL[0]));
            stack.push((id, Corner::ALL[2]));
        }
        stats.max_queue_len = stats.max_queue_len.max(stack.len());
    }

    tracing::debug!(
        checked = stats.edges_checked,
        flips = stats.flips_performed,
        "global Delaunay repair finished"
    );
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::algorithms::flips::split_face;
    use crate::core::builder::MeshBuilder;
    use crate::core::triangulation::Triangulation;
    use crate::core::util::delaunay_validation::is_delaunay;
    use crate::core::validation::{ValidationOptions, validate};
    use crate::geometry::point::Point;

    #[test]
    fn legalizing_an_interior_split() {
        // Two triangles over (0,0)-(4,0); both are Delaunay.
        let mut tri = Triangulation::new();
        for p in [[0.0, 0.0], [4.0, 0.0], [2.0, 3.0], [2.0, -3.0]] {
            tri.insert(Point::from(p)).unwrap();
        }
        let mut mesh = tri.into_mesh();
        assert!(is_delaunay(&mesh));

        // A point close to the shared edge puts (2,-3) inside its circumcircle.
        let (target, _) = mesh
            .finite_triangles()
            .find(|(_, t)| t.contains(VertexId::new(3)))
            .unwrap();
        let split = split_face(&mut mesh, target, Point::new_2d(2.0, 0.5)).unwrap();
        assert!(!is_delaunay(&mesh));
        let stats = legalize_around(&mut mesh, split.vertex).unwrap();

        assert_eq!(stats.flips_performed, 1);
        assert!(stats.edges_checked >= 3);
        assert!(is_delaunay(&mesh));
        assert!(validate(&mesh, ValidationOptions::delaunay()).is_ok());
    }

    #[test]
    fn legalize_needs_a_closed_ring() {
        let points = [
            Point::new_2d(0.0, 0.0),
            Point::new_2d(1.0, 0.0),
            Point::new_2d(0.0, 1.0),
        ];
        let mut mesh = MeshBuilder::from_arrays(&points, &[[0, 1, 2]]).unwrap();
        assert!(matches!(
            legalize_around(&mut mesh, VertexId::new(1)),
            Err(LegalizationError::Mesh(MeshError::OpenOneRing { .. }))
        ));
    }

    #[test]
    fn reflex_quads_are_not_flippable() {
        // The quad (0,0), (2,0), (0.5,0.5), (0,2) is reflex at (0.5,0.5).
        let points = [
            Point::new_2d(0.0, 0.0),
            Point::new_2d(2.0, 0.0),
            Point::new_2d(0.5, 0.5),
            Point::new_2d(0.0, 2.0),
        ];
        let mut mesh = MeshBuilder::from_arrays(&points, &[[0, 1, 2], [0, 2, 3]]).unwrap();
        let t = TriangleId::new(0);
        let shared = mesh.tri(t).corner_of(VertexId::new(2)).unwrap();
        assert!(mesh.neighbor(t, shared).is_some());
        assert!(!is_flippable(&mesh, t, shared));
        assert!(!is_flippable(&mesh, t, shared.next()));

        let stats = repair_delaunay_with_flips(&mut mesh).unwrap();
        assert_eq!(stats.flips_performed, 0);
        assert_eq!(stats.edges_checked, 6);
    }

    #[test]
    fn repair_is_idempotent() {
        let points: Vec<_> = (0..40)
            .map(|i| {
                let t = f64::from(i);
                Point::new_2d((t * 0.618_034).fract() * 10.0, (t * 0.414_214).fract() * 10.0)
            })
            .collect();
        let mut tri = Triangulation::new();
        tri.insert_all(&points).unwrap();
        let mut mesh = tri.into_mesh();

        repair_delaunay_with_flips(&mut mesh).unwrap();
        assert!(is_delaunay(&mesh));
        let again = repair_delaunay_with_flips(&mut mesh).unwrap();
        assert_eq!(again.flips_performed, 0);
        assert!(validate(&mesh, ValidationOptions::delaunay()).is_ok());
    }

    #[test]
    fn flip_budget_floor() {
        assert_eq!(default_max_flips(0), 128);
        assert_eq!(default_max_flips(100), 1200);
    }
}
