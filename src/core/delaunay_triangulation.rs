//! Incremental Delaunay triangulation.
//!
//! Every insertion goes through [`Triangulation`] and is followed by Lawson
//! legalization around the new vertex, so the empty-circumcircle property holds
//! after each call returns.

use crate::core::algorithms::incremental_insertion::InsertionError;
use crate::core::algorithms::legalize::legalize_around;
use crate::core::algorithms::locate::{LocateError, LocateResult};
use crate::core::mesh::{Mesh, VertexId};
use crate::core::operations::{InsertionKind, InsertionStatistics};
use crate::core::triangulation::{ConstructionState, Triangulation, TriangulationOptions};
use crate::core::util::delaunay_validation::is_delaunay;
use crate::core::validation::{MeshValidationError, ValidationOptions};
use crate::geometry::point::Point;

/// Delaunay triangulation of a growing point set.
///
/// # Examples
///
/// ```rust
/// use trimesh2d::core::delaunay_triangulation::DelaunayTriangulation;
/// use trimesh2d::geometry::point::Point;
///
/// let mut dt = DelaunayTriangulation::new();
/// for (x, y) in [(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0), (0.5, 0.4)] {
///     dt.insert(Point::new_2d(x, y)).unwrap();
/// }
/// assert_eq!(dt.number_of_vertices(), 5);
/// assert_eq!(dt.mesh().number_of_finite_triangles(), 4);
/// assert!(dt.is_delaunay());
/// ```
#[derive(Debug, Clone, Default)]
pub struct DelaunayTriangulation {
    triangulation: Triangulation,
}

impl DelaunayTriangulation {
    /// Creates an empty triangulation with default options.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty triangulation with the given options.
    #[must_use]
    pub fn with_options(options: TriangulationOptions) -> Self {
        Self {
            triangulation: Triangulation::with_options(options),
        }
    }

    /// Triangulates `points`, inserting them in order.
    ///
    /// # Errors
    ///
    /// Returns the first [`InsertionError`].
    pub fn from_points(points: &[Point]) -> Result<Self, InsertionError> {
        let mut dt = Self::new();
        dt.insert_all(points)?;
        Ok(dt)
    }

    /// Inserts `point`, restores the Delaunay property and returns the new vertex.
    ///
    /// # Errors
    ///
    /// Returns every error of [`Triangulation::insert`], plus
    /// [`InsertionError::Legalization`] if legalization fails and
    /// [`InsertionError::Validation`] if the validation policy is active and
    /// the result is not a valid Delaunay mesh.
    /// Failures after the rewrite roll back under the same conditions as
    /// [`Triangulation::insert`].
    pub fn insert(&mut self, point: Point) -> Result<VertexId, InsertionError> {
        self.insert_with_statistics(point).map(|stats| stats.vertex)
    }

    /// Like [`Self::insert`], reporting the insertion path and flip counts.
    ///
    /// # Errors
    ///
    /// See [`Self::insert`].
    ///
    /// # Examples
    ///
    /// ```rust
    /// use trimesh2d::core::delaunay_triangulation::DelaunayTriangulation;
    /// use trimesh2d::core::operations::InsertionKind;
    /// use trimesh2d::geometry::point::Point;
    ///
    /// let mut dt = DelaunayTriangulation::from_points(&[
    ///     Point::new_2d(0.0, 0.0),
    ///     Point::new_2d(4.0, 0.0),
    ///     Point::new_2d(2.0, 3.0),
    ///     Point::new_2d(2.0, -3.0),
    /// ])
    /// .unwrap();
    /// let stats = dt.insert_with_statistics(Point::new_2d(2.0, 0.5)).unwrap();
    /// assert_eq!(stats.kind, InsertionKind::Interior);
    /// assert_eq!(stats.legalizing_flips, 1);
    /// ```
    pub fn insert_with_statistics(
        &mut self,
        point: Point,
    ) -> Result<InsertionStatistics, InsertionError> {
        let stats = self.triangulation.with_rollback(|tri| {
            let mut stats = tri.insert_unchecked(point)?;
            if matches!(
                stats.kind,
                InsertionKind::Interior | InsertionKind::OnEdge | InsertionKind::HullExtension
            ) {
                let repair = legalize_around(tri.mesh_mut(), stats.vertex)?;
                stats.legalizing_flips = repair.flips_performed;
            }
            tri.validate_if_requested(ValidationOptions::delaunay())?;
            Ok(stats)
        })?;
        tracing::trace!(
            vertex = %stats.vertex,
            hull_flips = stats.hull_flips,
            legalizing_flips = stats.legalizing_flips,
            "inserted Delaunay vertex"
        );
        Ok(stats)
    }

    /// Inserts every point in order, returning their vertex ids.
    ///
    /// # Errors
    ///
    /// Stops at the first [`InsertionError`]; earlier points stay inserted.
    pub fn insert_all(&mut self, points: &[Point]) -> Result<Vec<VertexId>, InsertionError> {
        let ids = points
            .iter()
            .map(|&point| self.insert(point))
            .collect::<Result<Vec<_>, _>>()?;
        tracing::debug!(
            inserted = ids.len(),
            triangles = self.mesh().number_of_finite_triangles(),
            "bulk insertion finished"
        );
        Ok(ids)
    }

    /// Locates `point` in the current mesh.
    ///
    /// # Errors
    ///
    /// See [`Triangulation::locate`].
    pub fn locate(&mut self, point: &Point) -> Result<LocateResult, LocateError> {
        self.triangulation.locate(point)
    }

    /// The underlying mesh.
    #[must_use]
    pub const fn mesh(&self) -> &Mesh {
        self.triangulation.mesh()
    }

    /// Consumes the triangulation, returning its mesh.
    #[must_use]
    pub fn into_mesh(self) -> Mesh {
        self.triangulation.into_mesh()
    }

    /// The wrapped incremental triangulation.
    #[must_use]
    pub const fn triangulation(&self) -> &Triangulation {
        &self.triangulation
    }

    /// Current construction phase.
    #[must_use]
    pub const fn state(&self) -> ConstructionState {
        self.triangulation.state()
    }

    /// Number of finite vertices.
    #[must_use]
    pub fn number_of_vertices(&self) -> usize {
        self.triangulation.number_of_vertices()
    }

    /// Returns `true` if every finite edge is locally Delaunay.
    #[must_use]
    pub fn is_delaunay(&self) -> bool {
        is_delaunay(self.mesh())
    }

    /// Validates structure and the Delaunay property.
    ///
    /// # Errors
    ///
    /// Returns the first violated invariant.
    pub fn validate(&self) -> Result<(), MeshValidationError> {
        self.triangulation.validate(ValidationOptions::delaunay())
    }
}
