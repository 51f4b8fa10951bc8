//! Semantic classification and telemetry for insertions.
//!
//! This module does not implement anything; it names what an insertion did so
//! that callers and tests can observe it. The algorithms live under
//! `core::algorithms`.

use crate::core::mesh::VertexId;

/// How a point entered the triangulation.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum InsertionKind {
    /// Stored, but fewer than three non-collinear points exist so no triangle was built yet.
    #[default]
    Pending,
    /// Third point: the initial triangle and its three hull triangles were built.
    Bootstrap,
    /// Strictly inside a finite triangle (1→3 split).
    Interior,
    /// On an existing edge (2→4 split).
    OnEdge,
    /// Outside the convex hull; the hull was extended.
    HullExtension,
}

impl InsertionKind {
    /// Returns `true` if the insertion changed the mesh topology.
    #[must_use]
    pub const fn modified_mesh(self) -> bool {
        !matches!(self, Self::Pending)
    }
}

/// Statistics about a vertex insertion operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InsertionStatistics {
    /// The inserted vertex.
    pub vertex: VertexId,
    /// Which insertion path was taken.
    pub kind: InsertionKind,
    /// Flips performed while extending the hull.
    pub hull_flips: usize,
    /// Flips performed to restore the Delaunay property.
    pub legalizing_flips: usize,
}

impl InsertionStatistics {
    /// Total number of edge flips caused by this insertion.
    #[must_use]
    pub const fn total_flips(&self) -> usize {
        self.hull_flips + self.legalizing_flips
    }

    /// Returns `true` if the point landed outside the previous hull.
    #[must_use]
    pub const fn extended_hull(&self) -> bool {
        matches!(self.kind, InsertionKind::HullExtension)
    }
}
