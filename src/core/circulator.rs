//! Cursor over the triangles incident to a vertex.
//!
//! A [`FaceCirculator`] holds a shared borrow of the [`Mesh`], so the mesh cannot be
//! mutated while a circulator is alive; after any split or flip a new circulator
//! must be obtained from [`Mesh::faces_around`].

use crate::core::mesh::{Mesh, Triangle, TriangleId, VertexId};

/// Cursor `(mesh, current triangle, pivot vertex)` that steps between the
/// triangles sharing the pivot.
///
/// Stepping returns `None` when the next triangle does not exist (an open
/// boundary), leaving the cursor where it was.
///
/// # Examples
///
/// ```rust
/// use trimesh2d::core::triangulation::Triangulation;
/// use trimesh2d::geometry::point::Point;
///
/// let mut tri = Triangulation::new();
/// let a = tri.insert(Point::new_2d(0.0, 0.0)).unwrap();
/// tri.insert(Point::new_2d(1.0, 0.0)).unwrap();
/// tri.insert(Point::new_2d(0.0, 1.0)).unwrap();
///
/// let around = tri.mesh().faces_around(a).unwrap();
/// assert!(around.is_closed());
/// // One finite triangle and two hull triangles touch each bootstrap corner.
/// assert_eq!(around.ring().count(), 3);
/// ```
#[derive(Clone, Copy, Debug)]
pub struct FaceCirculator<'a> {
    mesh: &'a Mesh,
    pivot: VertexId,
    start: TriangleId,
    current: TriangleId,
}

impl<'a> FaceCirculator<'a> {
    pub(crate) const fn new(mesh: &'a Mesh, pivot: VertexId, start: TriangleId) -> Self {
        Self {
            mesh,
            pivot,
            start,
            current: start,
        }
    }

    /// The vertex being circulated around.
    #[must_use]
    pub const fn pivot(&self) -> VertexId {
        self.pivot
    }

    /// The triangle the cursor currently points at.
    #[must_use]
    pub const fn current(&self) -> TriangleId {
        self.current
    }

    /// Contents of the current triangle.
    #[must_use]
    pub fn triangle(&self) -> &'a Triangle {
        self.mesh.tri(self.current)
    }

    /// The triangle that follows the current one counterclockwise, without moving.
    #[must_use]
    pub fn peek_ccw(&self) -> Option<TriangleId> {
        let triangle = self.triangle();
        let corner = triangle.corner_of(self.pivot)?;
        triangle.neighbor(corner.next())
    }

    /// The triangle that precedes the current one (clockwise), without moving.
    #[must_use]
    pub fn peek_cw(&self) -> Option<TriangleId> {
        let triangle = self.triangle();
        let corner = triangle.corner_of(self.pivot)?;
        triangle.neighbor(corner.prev())
    }

    /// Moves counterclockwise around the pivot.
    pub fn ccw(&mut self) -> Option<TriangleId> {
        let next = self.peek_ccw()?;
        self.current = next;
        Some(next)
    }

    /// Moves clockwise around the pivot.
    pub fn cw(&mut self) -> Option<TriangleId> {
        let prev = self.peek_cw()?;
        self.current = prev;
        Some(prev)
    }

    /// Returns to the triangle the circulator was created at.
    pub const fn reset(&mut self) {
        self.current = self.start;
    }

    /// Returns `true` if walking counterclockwise comes back to the current triangle.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        let mut cursor = *self;
        for _ in 0..self.mesh.number_of_triangles() {
            match cursor.ccw() {
                None => return false,
                Some(t) if t == self.current => return true,
                Some(_) => {}
            }
        }
        false
    }

    /// One counterclockwise loop starting at the current triangle.
    ///
    /// Stops early at an open boundary.
    #[must_use]
    pub fn ring(&self) -> OneRing<'a> {
        OneRing {
            cursor: *self,
            first: self.current,
            remaining: self.mesh.number_of_triangles(),
            done: false,
        }
    }
}

/// Iterator over one loop of a [`FaceCirculator`].
#[derive(Clone, Debug)]
pub struct OneRing<'a> {
    cursor: FaceCirculator<'a>,
    first: TriangleId,
    remaining: usize,
    done: bool,
}

impl Iterator for OneRing<'_> {
    type Item = TriangleId;

    fn next(&mut self) -> Option<TriangleId> {
        if self.done || self.remaining == 0 {
            return None;
        }
        let current = self.cursor.current;
        self.remaining -= 1;
        match self.cursor.ccw() {
            Some(next) if next != self.first => {}
            _ => self.done = true,
        }
        Some(current)
    }
}
