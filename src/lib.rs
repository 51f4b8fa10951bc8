//! # trimesh2d
//!
//! Incremental 2D Delaunay triangulation on an explicit triangle-adjacency mesh.
//!
//! The mesh stores, for every triangle, its three vertices in counterclockwise
//! order and the three triangles across its edges. A single sentinel vertex at
//! infinity closes the hull: every hull edge is shared with an *infinite*
//! triangle, so every neighbor slot of a triangulation built by insertion is
//! filled and every vertex has a closed ring of incident triangles.
//!
//! # Layers
//!
//! - [`core::mesh`]: the arena of points and triangles, ids, one-ring
//!   circulation and the cotangent Laplacian.
//! - [`core::algorithms`]: local rewrites (face split, edge split, edge flip),
//!   point location, insertion and Lawson legalization.
//! - [`core::triangulation::Triangulation`]: incremental insertion without the
//!   Delaunay guarantee.
//! - [`core::delaunay_triangulation::DelaunayTriangulation`]: the same, followed
//!   by legalization after every insertion.
//! - [`core::builder::MeshBuilder`] and [`core::validation`]: bulk import from
//!   index arrays and invariant checking.
//!
//! # Basic usage
//!
//! ```rust
//! use trimesh2d::prelude::*;
//!
//! let mut dt = DelaunayTriangulation::new();
//! for (x, y) in [(0.0, 0.0), (2.0, 0.0), (1.0, 2.0), (1.0, 0.7), (3.0, 1.5)] {
//!     dt.insert(Point::new_2d(x, y)).unwrap();
//! }
//!
//! assert_eq!(dt.number_of_vertices(), 5);
//! assert!(dt.is_delaunay());
//! assert!(dt.validate().is_ok());
//!
//! // Walk the triangles around a vertex.
//! let ring: Vec<_> = dt.mesh().faces_around(VertexId::new(4)).unwrap().ring().collect();
//! assert!(ring.len() >= 3);
//! ```
//!
//! # Numerical robustness
//!
//! Predicates are evaluated in `f64` with a relative tolerance; there is no
//! exact arithmetic. Walks and flip loops are bounded and report non-convergence
//! as errors instead of looping.
//!
//! # References
//!
//! - C. L. Lawson, "Software for C¹ Surface Interpolation", 1977.
//! - L. J. Guibas and J. Stolfi, "Primitives for the Manipulation of General
//!   Subdivisions and the Computation of Voronoi Diagrams", ACM TOG, 1985.

// Forbid unsafe code throughout the entire crate
#![forbid(unsafe_code)]

#[macro_use]
extern crate derive_builder;

/// The `core` module contains the mesh, its local rewrites and the triangulations built on top.
pub mod core {
    /// Triangulation algorithms for construction, maintenance, and querying
    pub mod algorithms {
        /// Face split, edge split and edge flip
        pub mod flips;
        /// Bootstrap, interior insertion and hull extension
        pub mod incremental_insertion;
        /// Lawson legalization and global flip repair
        pub mod legalize;
        /// Point location by visibility walk
        pub mod locate;
    }
    /// Bulk mesh construction from index arrays
    pub mod builder;
    pub mod circulator;
    /// Hash maps and small buffers used across the crate
    pub mod collections;
    pub mod corner;
    pub mod delaunay_triangulation;
    pub mod mesh;
    pub mod operations;
    pub mod triangulation;
    /// Checks used by tests and validation
    pub mod util {
        pub mod delaunay_validation;
    }
    pub mod validation;
}

/// Points and the orientation and in-circle predicates.
pub mod geometry {
    pub mod point;
    pub mod predicates;
}

/// Topology editing façade over the local rewrites.
pub mod topology {
    pub mod edit;
}

/// A prelude module that re-exports commonly used types.
pub mod prelude {
    pub use crate::core::{
        algorithms::{
            flips::FlipError, incremental_insertion::InsertionError,
            legalize::LegalizationError, locate::LocateError, locate::LocateResult,
        },
        builder::{BuildError, MeshBuilder},
        circulator::FaceCirculator,
        corner::Corner,
        delaunay_triangulation::DelaunayTriangulation,
        mesh::{Mesh, MeshError, Triangle, TriangleId, VertexId},
        operations::{InsertionKind, InsertionStatistics},
        triangulation::{
            ConstructionState, Triangulation, TriangulationOptions, TriangulationOptionsBuilder,
            ValidationPolicy,
        },
        validation::{MeshValidationError, ValidationOptions},
    };

    pub use crate::core::collections::{
        FastHashMap, FastHashSet, SmallBuffer, fast_hash_map_with_capacity,
        fast_hash_set_with_capacity,
    };

    pub use crate::geometry::{
        point::Point,
        predicates::{InSphere, Orientation, incircle, orientation_2d},
    };

    pub use crate::topology::edit::TopologyEdit;
}

/// The function `is_normal` checks that structs implement `auto` traits.
/// Traits are checked at compile time, so this function is only used for
/// testing.
#[must_use]
pub const fn is_normal<T: Sized + Send + Sync + Unpin>() -> bool {
    true
}

// =============================================================================
// TESTS
// =============================================================================
