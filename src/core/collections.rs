//! Collection aliases used across the mesh algorithms.

use rustc_hash::{FxBuildHasher, FxHashMap, FxHashSet};
use smallvec::SmallVec;

use crate::core::corner::Corner;
use crate::core::mesh::TriangleId;

/// Optimized `HashMap` type for performance-critical operations.
/// Uses `rustc_hash::FxHasher` for faster hashing in non-cryptographic contexts.
///
/// # Security Warning
///
/// Not DoS-resistant: use only with trusted, internal keys.
///
/// # Examples
///
/// ```rust
/// use trimesh2d::core::collections::FastHashMap;
///
/// let mut map: FastHashMap<u64, usize> = FastHashMap::default();
/// map.insert(123, 456);
/// assert_eq!(map.get(&123), Some(&456));
/// ```
pub type FastHashMap<K, V> = FxHashMap<K, V>;

/// Optimized `HashSet` type, the set counterpart of [`FastHashMap`].
pub type FastHashSet<T> = FxHashSet<T>;

/// Re-export the Entry enum for `FastHashMap`.
pub use std::collections::hash_map::Entry;

/// Stack-first vector for small, short-lived buffers.
pub type SmallBuffer<T, const N: usize> = SmallVec<[T; N]>;

/// Typical number of triangles touched by a single local rewrite.
pub const LOCAL_REWRITE_SIZE: usize = 4;

/// Buffer of triangle ids produced by a local rewrite.
pub type TriangleBuffer = SmallBuffer<TriangleId, LOCAL_REWRITE_SIZE>;

/// Work stack of `(triangle, corner)` edge references.
pub type EdgeStack = Vec<(TriangleId, Corner)>;

/// Creates a [`FastHashMap`] with pre-allocated capacity.
#[must_use]
pub fn fast_hash_map_with_capacity<K, V>(capacity: usize) -> FastHashMap<K, V> {
    FastHashMap::with_capacity_and_hasher(capacity, FxBuildHasher)
}

/// Creates a [`FastHashSet`] with pre-allocated capacity.
#[must_use]
pub fn fast_hash_set_with_capacity<T>(capacity: usize) -> FastHashSet<T> {
    FastHashSet::with_capacity_and_hasher(capacity, FxBuildHasher)
}
