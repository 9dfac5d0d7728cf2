//! Circulators: cursors enumerating the local neighborhood of an element
//! by half-edge hops.
//!
//! All eight public iterator types are thin wrappers around two internal
//! circulators: one walking the outgoing half edges around a vertex, one
//! walking the inner half edges around a face. Every iterator yields each
//! neighborhood element exactly once (the closure bound is the local
//! degree) and supports reverse enumeration via `DoubleEndedIterator`,
//! which steps through the neighborhood in the opposite rotation order.
//!
//! The iterators hold a shared borrow of the mesh: while one is alive, the
//! mesh cannot be mutated. They are cheap value types; to restart a
//! traversal, construct a new one.

use crate::{
    handle::{VertexHandle, HalfEdgeHandle, FaceHandle},
    core::Checked,
};
use super::{Config, HalfEdgeMesh};


// ===============================================================================================
// ===== Internal circulators
// ===============================================================================================

/// An iterator that circulates around a vertex in clockwise order, yielding
/// the outgoing half edge.
///
/// The step is `next(twin(current))`; the reverse step is
/// `twin(prev(current))`.
#[derive(Debug)]
pub(super) enum CwVertexCirculator<'a, C: Config> {
    Empty,
    NonEmpty {
        mesh: &'a HalfEdgeMesh<C>,
        front: Checked<HalfEdgeHandle>,
        back: Checked<HalfEdgeHandle>,
    },
}

impl<'a, C: Config> CwVertexCirculator<'a, C> {
    pub(super) fn new(mesh: &'a HalfEdgeMesh<C>, start: Checked<HalfEdgeHandle>) -> Self {
        // The element yielded last is the one whose forward step returns to
        // `start`.
        let back = mesh[start].prev.twin();
        CwVertexCirculator::NonEmpty { mesh, front: start, back }
    }
}

impl<C: Config> Iterator for CwVertexCirculator<'_, C> {
    type Item = Checked<HalfEdgeHandle>;

    #[inline(always)]
    fn next(&mut self) -> Option<Self::Item> {
        match *self {
            CwVertexCirculator::Empty => None,
            CwVertexCirculator::NonEmpty { mesh, ref mut front, back } => {
                let out = *front;
                if out == back {
                    // We just yielded the last element of the cycle.
                    *self = CwVertexCirculator::Empty;
                } else {
                    *front = mesh[out.twin()].next;
                }

                Some(out)
            }
        }
    }
}

impl<C: Config> DoubleEndedIterator for CwVertexCirculator<'_, C> {
    #[inline(always)]
    fn next_back(&mut self) -> Option<Self::Item> {
        match *self {
            CwVertexCirculator::Empty => None,
            CwVertexCirculator::NonEmpty { mesh, front, ref mut back } => {
                let out = *back;
                if out == front {
                    *self = CwVertexCirculator::Empty;
                } else {
                    *back = mesh[out].prev.twin();
                }

                Some(out)
            }
        }
    }
}


/// An iterator that circulates around a face in counter-clockwise order,
/// yielding the inner half edge.
///
/// The step is `next(current)`; the reverse step is `prev(current)`.
#[derive(Debug)]
pub(super) enum FaceCirculator<'a, C: Config> {
    Empty,
    NonEmpty {
        mesh: &'a HalfEdgeMesh<C>,
        front: Checked<HalfEdgeHandle>,
        back: Checked<HalfEdgeHandle>,
    },
}

impl<'a, C: Config> FaceCirculator<'a, C> {
    pub(super) fn new(mesh: &'a HalfEdgeMesh<C>, start: Checked<HalfEdgeHandle>) -> Self {
        let back = mesh[start].prev;
        FaceCirculator::NonEmpty { mesh, front: start, back }
    }
}

impl<C: Config> Iterator for FaceCirculator<'_, C> {
    type Item = Checked<HalfEdgeHandle>;

    #[inline(always)]
    fn next(&mut self) -> Option<Self::Item> {
        match *self {
            FaceCirculator::Empty => None,
            FaceCirculator::NonEmpty { mesh, ref mut front, back } => {
                let out = *front;
                if out == back {
                    *self = FaceCirculator::Empty;
                } else {
                    *front = mesh[out].next;
                }

                Some(out)
            }
        }
    }
}

impl<C: Config> DoubleEndedIterator for FaceCirculator<'_, C> {
    #[inline(always)]
    fn next_back(&mut self) -> Option<Self::Item> {
        match *self {
            FaceCirculator::Empty => None,
            FaceCirculator::NonEmpty { mesh, front, ref mut back } => {
                let out = *back;
                if out == front {
                    *self = FaceCirculator::Empty;
                } else {
                    *back = mesh[out].prev;
                }

                Some(out)
            }
        }
    }
}


// ===============================================================================================
// ===== Public circulator constructors
// ===============================================================================================

impl<C: Config> HalfEdgeMesh<C> {
    /// Returns an iterator over the neighbor vertices of `v`, in clockwise
    /// order. Empty for isolated vertices.
    pub fn vertices_around_vertex(&self, v: VertexHandle) -> VertexToVertexIter<'_, C> {
        let v = self.check_vertex(v);
        VertexToVertexIter { it: self.circulate_around_vertex(v), mesh: self }
    }

    /// Like [`vertices_around_vertex`][Self::vertices_around_vertex], but
    /// pivoting around the origin of the given outgoing half edge and
    /// starting the rotation there.
    pub fn vertices_around_vertex_from(
        &self,
        outgoing: HalfEdgeHandle,
    ) -> VertexToVertexIter<'_, C> {
        let he = self.check_half_edge(outgoing);
        VertexToVertexIter { it: self.circulate_around_vertex_at(he), mesh: self }
    }

    /// Returns an iterator over the outgoing half edges of `v`, in
    /// clockwise order. Empty for isolated vertices.
    pub fn outgoing_half_edges_around_vertex(
        &self,
        v: VertexHandle,
    ) -> VertexToOutgoingHalfEdgeIter<'_, C> {
        let v = self.check_vertex(v);
        VertexToOutgoingHalfEdgeIter { it: self.circulate_around_vertex(v) }
    }

    /// Like
    /// [`outgoing_half_edges_around_vertex`][Self::outgoing_half_edges_around_vertex],
    /// but starting the rotation at the given outgoing half edge.
    pub fn outgoing_half_edges_around_vertex_from(
        &self,
        outgoing: HalfEdgeHandle,
    ) -> VertexToOutgoingHalfEdgeIter<'_, C> {
        let he = self.check_half_edge(outgoing);
        VertexToOutgoingHalfEdgeIter { it: self.circulate_around_vertex_at(he) }
    }

    /// Returns an iterator over the incoming half edges of `v`, in
    /// clockwise order. Empty for isolated vertices.
    pub fn incoming_half_edges_around_vertex(
        &self,
        v: VertexHandle,
    ) -> VertexToIncomingHalfEdgeIter<'_, C> {
        let v = self.check_vertex(v);
        VertexToIncomingHalfEdgeIter { it: self.circulate_around_vertex(v) }
    }

    /// Like
    /// [`incoming_half_edges_around_vertex`][Self::incoming_half_edges_around_vertex],
    /// but starting the rotation at the given incoming half edge.
    pub fn incoming_half_edges_around_vertex_from(
        &self,
        incoming: HalfEdgeHandle,
    ) -> VertexToIncomingHalfEdgeIter<'_, C> {
        let he = self.check_half_edge(incoming);
        VertexToIncomingHalfEdgeIter { it: self.circulate_around_vertex_at(he.twin()) }
    }

    /// Returns an iterator over the faces around `v`, in clockwise order.
    /// Boundary gaps are skipped; in non-manifold meshes a face can appear
    /// more than once.
    pub fn faces_around_vertex(&self, v: VertexHandle) -> VertexToFaceIter<'_, C> {
        let v = self.check_vertex(v);
        VertexToFaceIter { it: self.circulate_around_vertex(v), mesh: self }
    }

    /// Like [`faces_around_vertex`][Self::faces_around_vertex], but
    /// starting the rotation at the given outgoing half edge.
    pub fn faces_around_vertex_from(
        &self,
        outgoing: HalfEdgeHandle,
    ) -> VertexToFaceIter<'_, C> {
        let he = self.check_half_edge(outgoing);
        VertexToFaceIter { it: self.circulate_around_vertex_at(he), mesh: self }
    }

    /// Returns an iterator over the vertices of the given face, in counter
    /// clockwise order. Empty for deleted faces.
    pub fn vertices_around_face(&self, f: FaceHandle) -> FaceToVertexIter<'_, C> {
        let f = self.check_face(f);
        FaceToVertexIter { it: self.circulate_around_face(f), mesh: self }
    }

    /// Like [`vertices_around_face`][Self::vertices_around_face], but
    /// walking the cycle of the given inner half edge, starting there. This
    /// also works for the half edges of a hole.
    pub fn vertices_around_face_from(&self, inner: HalfEdgeHandle) -> FaceToVertexIter<'_, C> {
        let he = self.check_half_edge(inner);
        FaceToVertexIter { it: self.circulate_around_face_at(he), mesh: self }
    }

    /// Returns an iterator over the inner half edges of the given face, in
    /// counter clockwise order. Empty for deleted faces.
    pub fn inner_half_edges_around_face(
        &self,
        f: FaceHandle,
    ) -> FaceToInnerHalfEdgeIter<'_, C> {
        let f = self.check_face(f);
        FaceToInnerHalfEdgeIter { it: self.circulate_around_face(f) }
    }

    /// Like
    /// [`inner_half_edges_around_face`][Self::inner_half_edges_around_face],
    /// but walking the cycle of the given inner half edge, starting there.
    pub fn inner_half_edges_around_face_from(
        &self,
        inner: HalfEdgeHandle,
    ) -> FaceToInnerHalfEdgeIter<'_, C> {
        let he = self.check_half_edge(inner);
        FaceToInnerHalfEdgeIter { it: self.circulate_around_face_at(he) }
    }

    /// Returns an iterator over the outer half edges of the given face (the
    /// twins of the inner cycle), in counter clockwise order. Empty for
    /// deleted faces.
    pub fn outer_half_edges_around_face(
        &self,
        f: FaceHandle,
    ) -> FaceToOuterHalfEdgeIter<'_, C> {
        let f = self.check_face(f);
        FaceToOuterHalfEdgeIter { it: self.circulate_around_face(f) }
    }

    /// Like
    /// [`outer_half_edges_around_face`][Self::outer_half_edges_around_face],
    /// but walking the cycle of the given inner half edge, starting there.
    pub fn outer_half_edges_around_face_from(
        &self,
        inner: HalfEdgeHandle,
    ) -> FaceToOuterHalfEdgeIter<'_, C> {
        let he = self.check_half_edge(inner);
        FaceToOuterHalfEdgeIter { it: self.circulate_around_face_at(he) }
    }

    /// Returns an iterator over the faces sharing an edge with the given
    /// face, in counter clockwise order. Boundary edges are skipped; a
    /// neighbor is yielded once per shared edge. Empty for deleted faces.
    pub fn faces_around_face(&self, f: FaceHandle) -> FaceToFaceIter<'_, C> {
        let f = self.check_face(f);
        FaceToFaceIter { it: self.circulate_around_face(f), mesh: self }
    }

    /// Like [`faces_around_face`][Self::faces_around_face], but walking the
    /// cycle of the given inner half edge, starting there.
    pub fn faces_around_face_from(&self, inner: HalfEdgeHandle) -> FaceToFaceIter<'_, C> {
        let he = self.check_half_edge(inner);
        FaceToFaceIter { it: self.circulate_around_face_at(he), mesh: self }
    }
}


// ===============================================================================================
// ===== Iterators used by the public interface
// ===============================================================================================

/// Iterator over the neighbor vertices of a vertex. Is returned by
/// `vertices_around_vertex`.
#[derive(Debug)]
pub struct VertexToVertexIter<'a, C: Config> {
    it: CwVertexCirculator<'a, C>,
    mesh: &'a HalfEdgeMesh<C>,
}

impl<C: Config> Iterator for VertexToVertexIter<'_, C> {
    type Item = VertexHandle;

    fn next(&mut self) -> Option<Self::Item> {
        let mesh = self.mesh;
        self.it.next().map(|outgoing| *mesh.target_of(outgoing))
    }
}

impl<C: Config> DoubleEndedIterator for VertexToVertexIter<'_, C> {
    fn next_back(&mut self) -> Option<Self::Item> {
        let mesh = self.mesh;
        self.it.next_back().map(|outgoing| *mesh.target_of(outgoing))
    }
}

/// Iterator over the outgoing half edges of a vertex. Is returned by
/// `outgoing_half_edges_around_vertex`.
#[derive(Debug)]
pub struct VertexToOutgoingHalfEdgeIter<'a, C: Config> {
    it: CwVertexCirculator<'a, C>,
}

impl<C: Config> Iterator for VertexToOutgoingHalfEdgeIter<'_, C> {
    type Item = HalfEdgeHandle;

    fn next(&mut self) -> Option<Self::Item> {
        self.it.next().map(|outgoing| *outgoing)
    }
}

impl<C: Config> DoubleEndedIterator for VertexToOutgoingHalfEdgeIter<'_, C> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.it.next_back().map(|outgoing| *outgoing)
    }
}

/// Iterator over the incoming half edges of a vertex. Is returned by
/// `incoming_half_edges_around_vertex`.
#[derive(Debug)]
pub struct VertexToIncomingHalfEdgeIter<'a, C: Config> {
    it: CwVertexCirculator<'a, C>,
}

impl<C: Config> Iterator for VertexToIncomingHalfEdgeIter<'_, C> {
    type Item = HalfEdgeHandle;

    fn next(&mut self) -> Option<Self::Item> {
        self.it.next().map(|outgoing| *outgoing.twin())
    }
}

impl<C: Config> DoubleEndedIterator for VertexToIncomingHalfEdgeIter<'_, C> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.it.next_back().map(|outgoing| *outgoing.twin())
    }
}

/// Iterator over the faces around a vertex. Is returned by
/// `faces_around_vertex`.
#[derive(Debug)]
pub struct VertexToFaceIter<'a, C: Config> {
    it: CwVertexCirculator<'a, C>,
    mesh: &'a HalfEdgeMesh<C>,
}

impl<C: Config> Iterator for VertexToFaceIter<'_, C> {
    type Item = FaceHandle;

    fn next(&mut self) -> Option<Self::Item> {
        // Simply skip the outgoing half edges without a face.
        let mesh = self.mesh;
        self.it.by_ref()
            .filter_map(|outgoing| mesh[outgoing].face.into_option())
            .map(|f| *f)
            .next()
    }
}

impl<C: Config> DoubleEndedIterator for VertexToFaceIter<'_, C> {
    fn next_back(&mut self) -> Option<Self::Item> {
        let mesh = self.mesh;
        while let Some(outgoing) = self.it.next_back() {
            if let Some(f) = mesh[outgoing].face.into_option() {
                return Some(*f);
            }
        }
        None
    }
}

/// Iterator over the vertices of a face. Is returned by
/// `vertices_around_face`.
#[derive(Debug)]
pub struct FaceToVertexIter<'a, C: Config> {
    it: FaceCirculator<'a, C>,
    mesh: &'a HalfEdgeMesh<C>,
}

impl<C: Config> Iterator for FaceToVertexIter<'_, C> {
    type Item = VertexHandle;

    fn next(&mut self) -> Option<Self::Item> {
        let mesh = self.mesh;
        self.it.next().map(|inner| *mesh.target_of(inner))
    }
}

impl<C: Config> DoubleEndedIterator for FaceToVertexIter<'_, C> {
    fn next_back(&mut self) -> Option<Self::Item> {
        let mesh = self.mesh;
        self.it.next_back().map(|inner| *mesh.target_of(inner))
    }
}

/// Iterator over the inner half edges of a face. Is returned by
/// `inner_half_edges_around_face`.
#[derive(Debug)]
pub struct FaceToInnerHalfEdgeIter<'a, C: Config> {
    it: FaceCirculator<'a, C>,
}

impl<C: Config> Iterator for FaceToInnerHalfEdgeIter<'_, C> {
    type Item = HalfEdgeHandle;

    fn next(&mut self) -> Option<Self::Item> {
        self.it.next().map(|inner| *inner)
    }
}

impl<C: Config> DoubleEndedIterator for FaceToInnerHalfEdgeIter<'_, C> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.it.next_back().map(|inner| *inner)
    }
}

/// Iterator over the outer half edges of a face. Is returned by
/// `outer_half_edges_around_face`.
#[derive(Debug)]
pub struct FaceToOuterHalfEdgeIter<'a, C: Config> {
    it: FaceCirculator<'a, C>,
}

impl<C: Config> Iterator for FaceToOuterHalfEdgeIter<'_, C> {
    type Item = HalfEdgeHandle;

    fn next(&mut self) -> Option<Self::Item> {
        self.it.next().map(|inner| *inner.twin())
    }
}

impl<C: Config> DoubleEndedIterator for FaceToOuterHalfEdgeIter<'_, C> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.it.next_back().map(|inner| *inner.twin())
    }
}

/// Iterator over the edge-neighbor faces of a face. Is returned by
/// `faces_around_face`.
#[derive(Debug)]
pub struct FaceToFaceIter<'a, C: Config> {
    it: FaceCirculator<'a, C>,
    mesh: &'a HalfEdgeMesh<C>,
}

impl<C: Config> Iterator for FaceToFaceIter<'_, C> {
    type Item = FaceHandle;

    fn next(&mut self) -> Option<Self::Item> {
        // Simply skip the edges without a face on the other side.
        let mesh = self.mesh;
        self.it.by_ref()
            .filter_map(|inner| mesh[inner.twin()].face.into_option())
            .map(|f| *f)
            .next()
    }
}

impl<C: Config> DoubleEndedIterator for FaceToFaceIter<'_, C> {
    fn next_back(&mut self) -> Option<Self::Item> {
        let mesh = self.mesh;
        while let Some(inner) = self.it.next_back() {
            if let Some(f) = mesh[inner.twin()].face.into_option() {
                return Some(*f);
            }
        }
        None
    }
}
