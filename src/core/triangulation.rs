//! Incremental (non-Delaunay) triangulation.
//!
//! `Triangulation` owns a [`Mesh`] and inserts points one at a time: the first
//! three finite points bootstrap the mesh, every later point is located with a
//! visibility walk from a random finite triangle and inserted by a local
//! rewrite. The result is a valid triangulation of the convex hull of the
//! inserted points, but not necessarily a Delaunay one; see
//! [`crate::core::delaunay_triangulation::DelaunayTriangulation`].

use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::core::algorithms::incremental_insertion::{InsertionError, bootstrap, insert_located};
use crate::core::algorithms::locate::{
    LocateError, LocateResult, default_step_limit, locate, random_finite_triangle,
};
use crate::core::mesh::{Mesh, VertexId};
use crate::core::operations::{InsertionKind, InsertionStatistics};
use crate::core::validation::{MeshValidationError, ValidationOptions, validate};
use crate::geometry::point::Point;
use crate::geometry::predicates::{Orientation, orientation_2d};

/// Seed used for the random walk starts when [`TriangulationOptions::seed`] is `None`.
pub const DEFAULT_SEED: u64 = 0x5eed_d1ce;

/// When a triangulation re-validates its mesh after an insertion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ValidationPolicy {
    /// Validate after every insertion in debug builds only.
    #[default]
    DebugOnly,
    /// Validate after every insertion.
    EveryInsertion,
    /// Never validate automatically.
    Never,
}

impl ValidationPolicy {
    /// Returns `true` if this policy asks for validation in the current build.
    #[must_use]
    pub const fn should_validate(self) -> bool {
        match self {
            Self::DebugOnly => cfg!(debug_assertions),
            Self::EveryInsertion => true,
            Self::Never => false,
        }
    }
}

/// Configuration of a [`Triangulation`].
///
/// # Examples
///
/// ```rust
/// use trimesh2d::core::triangulation::{TriangulationOptionsBuilder, ValidationPolicy};
///
/// let options = TriangulationOptionsBuilder::default()
///     .seed(42)
///     .validation(ValidationPolicy::EveryInsertion)
///     .build()
///     .unwrap();
/// assert_eq!(options.seed, Some(42));
/// assert_eq!(options.max_walk_steps, None);
/// ```
#[derive(Builder, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[builder(default)]
pub struct TriangulationOptions {
    /// Seed for the random walk starts; `None` uses [`DEFAULT_SEED`].
    #[builder(setter(strip_option))]
    pub seed: Option<u64>,
    /// Bound on visibility walk steps; `None` uses the triangle count plus 16.
    #[builder(setter(strip_option))]
    pub max_walk_steps: Option<usize>,
    /// Post-insertion validation policy.
    pub validation: ValidationPolicy,
}

/// Construction phase of a triangulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstructionState {
    /// This many finite points are stored but no triangle exists yet.
    Bootstrapping(usize),
    /// The mesh is a closed triangulation of the points.
    Ready,
}

/// A 2D triangulation built by incremental insertion.
///
/// # Examples
///
/// ```rust
/// use trimesh2d::core::triangulation::{ConstructionState, Triangulation};
/// use trimesh2d::geometry::point::Point;
///
/// let mut tri = Triangulation::new();
/// tri.insert(Point::new_2d(0.0, 0.0)).unwrap();
/// tri.insert(Point::new_2d(1.0, 0.0)).unwrap();
/// assert_eq!(tri.state(), ConstructionState::Bootstrapping(2));
/// assert_eq!(tri.mesh().number_of_triangles(), 0);
///
/// tri.insert(Point::new_2d(0.0, 1.0)).unwrap();
/// assert_eq!(tri.state(), ConstructionState::Ready);
/// assert_eq!(tri.mesh().number_of_finite_triangles(), 1);
/// assert_eq!(tri.mesh().number_of_triangles(), 4);
/// ```
#[derive(Debug, Clone)]
pub struct Triangulation {
    mesh: Mesh,
    state: ConstructionState,
    rng: StdRng,
    options: TriangulationOptions,
}

impl Default for Triangulation {
    fn default() -> Self {
        Self::new()
    }
}

impl Triangulation {
    /// Creates an empty triangulation with default options.
    #[must_use]
    pub fn new() -> Self {
        Self::with_options(TriangulationOptions::default())
    }

    /// Creates an empty triangulation with the given options.
    #[must_use]
    pub fn with_options(options: TriangulationOptions) -> Self {
        let rng = StdRng::seed_from_u64(options.seed.unwrap_or(DEFAULT_SEED));
        Self {
            mesh: Mesh::new(),
            state: ConstructionState::Bootstrapping(0),
            rng,
            options,
        }
    }

    /// Triangulates `points`, inserting them in order.
    ///
    /// # Errors
    ///
    /// Returns the first [`InsertionError`].
    pub fn from_points(points: &[Point]) -> Result<Self, InsertionError> {
        let mut triangulation = Self::new();
        triangulation.insert_all(points)?;
        Ok(triangulation)
    }

    /// Inserts `point` and returns its vertex id.
    ///
    /// # Errors
    ///
    /// Returns [`InsertionError::NonFiniteCoordinates`],
    /// [`InsertionError::DuplicatePoint`] or
    /// [`InsertionError::DegenerateBootstrap`] for rejected input, and other
    /// variants if location or the mesh rewrite fails. A rejected point leaves
    /// the triangulation unchanged. When the validation policy is active, a
    /// failure after the rewrite (including [`InsertionError::Validation`])
    /// rolls the mesh back to its state before the call; with
    /// [`ValidationPolicy::Never`] such a failure keeps the partial rewrite.
    pub fn insert(&mut self, point: Point) -> Result<VertexId, InsertionError> {
        self.insert_with_statistics(point).map(|stats| stats.vertex)
    }

    /// Like [`Self::insert`], reporting which insertion path was taken.
    ///
    /// # Errors
    ///
    /// See [`Self::insert`].
    pub fn insert_with_statistics(
        &mut self,
        point: Point,
    ) -> Result<InsertionStatistics, InsertionError> {
        self.with_rollback(|tri| {
            let stats = tri.insert_unchecked(point)?;
            tri.validate_if_requested(ValidationOptions::default())?;
            Ok(stats)
        })
    }

    /// Inserts every point in order, returning their vertex ids.
    ///
    /// # Errors
    ///
    /// Stops at the first [`InsertionError`]; earlier points stay inserted.
    pub fn insert_all(&mut self, points: &[Point]) -> Result<Vec<VertexId>, InsertionError> {
        points.iter().map(|&point| self.insert(point)).collect()
    }

    /// Locates `point` with a visibility walk from a random finite triangle.
    ///
    /// # Errors
    ///
    /// Returns [`LocateError::EmptyTriangulation`] before bootstrap, and
    /// [`LocateError::StepLimitExceeded`] if the walk does not terminate.
    pub fn locate(&mut self, point: &Point) -> Result<LocateResult, LocateError> {
        if self.state != ConstructionState::Ready {
            return Err(LocateError::EmptyTriangulation);
        }
        let start = random_finite_triangle(&self.mesh, &mut self.rng)
            .ok_or(LocateError::EmptyTriangulation)?;
        let max_steps = self
            .options
            .max_walk_steps
            .unwrap_or_else(|| default_step_limit(&self.mesh));
        locate(&self.mesh, point, start, max_steps)
    }

    /// The underlying mesh.
    #[must_use]
    pub const fn mesh(&self) -> &Mesh {
        &self.mesh
    }

    /// Consumes the triangulation, returning its mesh.
    #[must_use]
    pub fn into_mesh(self) -> Mesh {
        self.mesh
    }

    /// Current construction phase.
    #[must_use]
    pub const fn state(&self) -> ConstructionState {
        self.state
    }

    /// Options this triangulation was created with.
    #[must_use]
    pub const fn options(&self) -> &TriangulationOptions {
        &self.options
    }

    /// Number of finite vertices.
    #[must_use]
    pub fn number_of_vertices(&self) -> usize {
        self.mesh.number_of_vertices()
    }

    /// Validates the mesh. A triangulation that is still bootstrapping is trivially valid.
    ///
    /// # Errors
    ///
    /// Returns the first violated invariant.
    pub fn validate(&self, options: ValidationOptions) -> Result<(), MeshValidationError> {
        match self.state {
            ConstructionState::Bootstrapping(_) => Ok(()),
            ConstructionState::Ready => validate(&self.mesh, options),
        }
    }

    pub(crate) const fn mesh_mut(&mut self) -> &mut Mesh {
        &mut self.mesh
    }

    /// Runs [`Self::validate`] if the validation policy asks for it.
    pub(crate) fn validate_if_requested(
        &self,
        options: ValidationOptions,
    ) -> Result<(), MeshValidationError> {
        if self.options.validation.should_validate() {
            self.validate(options)
        } else {
            Ok(())
        }
    }

    /// Runs `insertion`, restoring the mesh and construction state if it fails.
    ///
    /// The checkpoint is only taken when the validation policy is active, since
    /// copying the mesh costs as much as validating it.
    pub(crate) fn with_rollback<F>(
        &mut self,
        insertion: F,
    ) -> Result<InsertionStatistics, InsertionError>
    where
        F: FnOnce(&mut Self) -> Result<InsertionStatistics, InsertionError>,
    {
        let checkpoint = self
            .options
            .validation
            .should_validate()
            .then(|| (self.mesh.clone(), self.state));
        let result = insertion(self);
        if let (Err(error), Some((mesh, state))) = (&result, checkpoint) {
            tracing::debug!(%error, "rolling back failed insertion");
            self.mesh = mesh;
            self.state = state;
        }
        result
    }

    /// Inserts without post-insertion validation.
    pub(crate) fn insert_unchecked(
        &mut self,
        point: Point,
    ) -> Result<InsertionStatistics, InsertionError> {
        if !point.is_finite() {
            return Err(InsertionError::NonFiniteCoordinates { point });
        }

        let stats = match self.state {
            ConstructionState::Bootstrapping(placed) => self.insert_bootstrapping(placed, point)?,
            ConstructionState::Ready => {
                let location = self.locate(&point)?;
                insert_located(&mut self.mesh, location, point)?
            }
        };
        tracing::trace!(vertex = %stats.vertex, kind = ?stats.kind, "inserted point");
        Ok(stats)
    }

    fn insert_bootstrapping(
        &mut self,
        placed: usize,
        point: Point,
    ) -> Result<InsertionStatistics, InsertionError> {
        let stored = |mesh: &Mesh, index: usize| {
            let vertex = VertexId::new(index);
            mesh.point(vertex)
                .copied()
                .ok_or(InsertionError::UnknownVertex { vertex })
        };

        let kind = match placed {
            0 => InsertionKind::Pending,
            1 => {
                let first = stored(&self.mesh, 1)?;
                if first.xy() == point.xy() {
                    return Err(InsertionError::DuplicatePoint {
                        point,
                        vertex: VertexId::new(1),
                    });
                }
                InsertionKind::Pending
            }
            _ => {
                let (a, b) = (stored(&self.mesh, 1)?, stored(&self.mesh, 2)?);
                if orientation_2d(&a, &b, &point) == Orientation::DEGENERATE {
                    tracing::debug!(?point, "rejected collinear bootstrap point");
                    return Err(InsertionError::DegenerateBootstrap {
                        points: [a, b, point],
                    });
                }
                InsertionKind::Bootstrap
            }
        };

        let vertex = self.mesh.add_point(point);
        if kind == InsertionKind::Bootstrap {
            bootstrap(
                &mut self.mesh,
                [VertexId::new(1), VertexId::new(2), vertex],
            )?;
            self.state = ConstructionState::Ready;
        } else {
            self.state = ConstructionState::Bootstrapping(placed + 1);
        }
        Ok(InsertionStatistics {
            vertex,
            kind,
            hull_flips: 0,
            legalizing_flips: 0,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::util::delaunay_validation::is_delaunay;
    use crate::core::mesh::TriangleId;
    use rand::Rng;

    fn seeded() -> Triangulation {
        let options = TriangulationOptionsBuilder::default()
            .seed(3)
            .validation(ValidationPolicy::EveryInsertion)
            .build()
            .unwrap();
        Triangulation::with_options(options)
    }

    #[test]
    fn bootstrap_states() {
        let mut tri = seeded();
        assert_eq!(tri.state(), ConstructionState::Bootstrapping(0));
        assert_eq!(
            tri.locate(&Point::ORIGIN),
            Err(LocateError::EmptyTriangulation)
        );

        let kinds: Vec<_> = [[0.0, 0.0], [1.0, 0.0], [0.0, 1.0], [0.2, 0.2]]
            .into_iter()
            .map(|p| tri.insert_with_statistics(Point::from(p)).unwrap().kind)
            .collect();
        assert_eq!(
            kinds,
            [
                InsertionKind::Pending,
                InsertionKind::Pending,
                InsertionKind::Bootstrap,
                InsertionKind::Interior
            ]
        );
        assert_eq!(tri.number_of_vertices(), 4);
        assert_eq!(tri.mesh().number_of_finite_triangles(), 3);
        assert!(tri.validate(ValidationOptions::default()).is_ok());
    }

    #[test]
    fn rejected_points_leave_the_triangulation_unchanged() {
        let mut tri = seeded();
        tri.insert(Point::new_2d(0.0, 0.0)).unwrap();
        assert!(matches!(
            tri.insert(Point::new_2d(0.0, 0.0)),
            Err(InsertionError::DuplicatePoint { .. })
        ));
        tri.insert(Point::new_2d(1.0, 1.0)).unwrap();
        assert!(matches!(
            tri.insert(Point::new_2d(2.0, 2.0)),
            Err(InsertionError::DegenerateBootstrap { .. })
        ));
        assert!(matches!(
            tri.insert(Point::new_2d(f64::NAN, 0.0)),
            Err(InsertionError::NonFiniteCoordinates { .. })
        ));
        assert_eq!(tri.state(), ConstructionState::Bootstrapping(2));
        assert_eq!(tri.number_of_vertices(), 2);

        tri.insert(Point::new_2d(2.0, 0.0)).unwrap();
        assert_eq!(tri.state(), ConstructionState::Ready);
        let duplicate = tri.insert(Point::new_2d(1.0, 1.0));
        assert_eq!(
            duplicate,
            Err(InsertionError::DuplicatePoint {
                point: Point::new_2d(1.0, 1.0),
                vertex: VertexId::new(2),
            })
        );
        assert_eq!(tri.number_of_vertices(), 3);
    }

    #[test]
    fn failures_after_the_rewrite_are_rolled_back() {
        let mut tri = seeded();
        tri.insert_all(&[
            Point::new_2d(0.0, 0.0),
            Point::new_2d(4.0, 0.0),
            Point::new_2d(0.0, 4.0),
        ])
        .unwrap();
        let before = tri.mesh().clone();

        let result = tri.with_rollback(|t| {
            t.insert_unchecked(Point::new_2d(1.0, 1.0))?;
            assert_eq!(t.number_of_vertices(), 4);
            Err(InsertionError::InconsistentHull {
                triangle: TriangleId::new(0),
            })
        });
        assert!(result.is_err());
        assert_eq!(tri.mesh(), &before);
        assert_eq!(tri.state(), ConstructionState::Ready);

        // The same failure during bootstrap restores the bootstrapping state.
        let mut fresh = seeded();
        fresh.insert(Point::new_2d(0.0, 0.0)).unwrap();
        let result = fresh.with_rollback(|t| {
            t.insert_unchecked(Point::new_2d(1.0, 0.0))?;
            Err(InsertionError::HullWalkExceeded { steps: 0 })
        });
        assert!(result.is_err());
        assert_eq!(fresh.state(), ConstructionState::Bootstrapping(1));
        assert_eq!(fresh.number_of_vertices(), 1);
    }

    #[test]
    fn failures_are_kept_without_a_validation_policy() {
        let options = TriangulationOptionsBuilder::default()
            .validation(ValidationPolicy::Never)
            .build()
            .unwrap();
        let mut tri = Triangulation::with_options(options);
        let result = tri.with_rollback(|t| {
            t.insert_unchecked(Point::new_2d(1.0, 0.0))?;
            Err(InsertionError::HullWalkExceeded { steps: 0 })
        });
        assert!(result.is_err());
        assert_eq!(tri.number_of_vertices(), 1);
    }

    #[test]
    fn default_seed_is_reproducible() {
        let points = [
            Point::new_2d(0.0, 0.0),
            Point::new_2d(5.0, 0.0),
            Point::new_2d(0.0, 5.0),
            Point::new_2d(1.0, 1.0),
            Point::new_2d(3.0, 1.0),
        ];
        let mut first = Triangulation::from_points(&points).unwrap();
        let mut second = Triangulation::from_points(&points).unwrap();
        assert_eq!(first.options().seed, None);
        assert_eq!(first.mesh(), second.mesh());
        assert_eq!(first.rng.random::<u64>(), second.rng.random::<u64>());

        let mut explicit = Triangulation::with_options(
            TriangulationOptionsBuilder::default()
                .seed(DEFAULT_SEED)
                .build()
                .unwrap(),
        );
        explicit.insert_all(&points).unwrap();
        let mut implicit = Triangulation::from_points(&points).unwrap();
        assert_eq!(explicit.rng.random::<u64>(), implicit.rng.random::<u64>());
    }

    #[test]
    fn plain_insertion_is_not_delaunay() {
        // (2,-3) lies inside the circumcircle of (0,0), (4,0), (2,0.5), but
        // nothing flips the edge between them.
        let mut tri = seeded();
        tri.insert_all(&[
            Point::new_2d(0.0, 0.0),
            Point::new_2d(4.0, 0.0),
            Point::new_2d(2.0, 3.0),
            Point::new_2d(2.0, -3.0),
            Point::new_2d(2.0, 0.5),
        ])
        .unwrap();
        assert!(!is_delaunay(tri.mesh()));
        assert!(tri.validate(ValidationOptions::structural()).is_ok());
    }

    #[test]
    fn walk_limit_is_configurable() {
        let options = TriangulationOptionsBuilder::default()
            .seed(1)
            .max_walk_steps(0)
            .build()
            .unwrap();
        let mut tri = Triangulation::with_options(options);
        for p in [[0.0, 0.0], [1.0, 0.0], [0.0, 1.0]] {
            tri.insert(Point::from(p)).unwrap();
        }
        assert_eq!(
            tri.insert(Point::new_2d(0.1, 0.1)),
            Err(InsertionError::Location(LocateError::StepLimitExceeded {
                steps: 0
            }))
        );
        assert_eq!(tri.number_of_vertices(), 3);
    }

    #[test]
    fn same_seed_same_mesh() {
        let points: Vec<_> = (0..30)
            .map(|i| {
                let t = f64::from(i);
                Point::new_2d((t * 1.7).sin() * 5.0, (t * 2.3).cos() * 5.0)
            })
            .collect();
        let build = || {
            let mut tri = seeded();
            tri.insert_all(&points).unwrap();
            tri.into_mesh()
        };
        assert_eq!(build(), build());
    }
}
