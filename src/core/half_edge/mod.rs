//! Everything related to the [`HalfEdgeMesh`].

// # Some notes for developers about this implementation
//
// - The two half-edges of an edge are stored next to one another in the
//   underlying vector and thus always have handle indices only one apart.
//   Since we start with the handle index 0, the indices of two twins are
//   always 2k and 2k + 1 where k is an integer. Flipping the last bit of a
//   half-edge index yields the twin, dividing by two yields the edge.
// - Elements are removed in two steps: `delete_*` only tombstones a record
//   by invalidating its sentinel field (`outgoing` for vertices, `target`
//   for half-edges, `inner` for faces). `clean_up` then compacts all arenas
//   and rewrites every stored handle. Until that point, handles stay stable
//   and tombstones are skipped by the queries that care.
// - An isolated vertex and a deleted vertex share the same sentinel state.
//   Topology queries read it as isolated, `clean_up` reads it as deleted.

use std::{
    fmt,
    marker::PhantomData,
    mem,
    ops,
    slice,
};

use optional::Optioned as Opt;
use leer::Empty;
use smallvec::{smallvec, SmallVec};

use crate::{
    hsize, Handle,
    handle::{VertexHandle, HalfEdgeHandle, EdgeHandle, FaceHandle},
    core::{Checked, FaceKind, PolyFaces},
};
use self::adj::{CwVertexCirculator, FaceCirculator};

mod adj;
#[cfg(test)]
mod tests;

pub use self::adj::{
    VertexToVertexIter, VertexToOutgoingHalfEdgeIter, VertexToIncomingHalfEdgeIter,
    VertexToFaceIter, FaceToVertexIter, FaceToInnerHalfEdgeIter,
    FaceToOuterHalfEdgeIter, FaceToFaceIter,
};


// ===============================================================================================
// ===== Compile time configuration of `HalfEdgeMesh`
// ===============================================================================================

/// Compile-time configuration for [`HalfEdgeMesh`].
///
/// To configure a half-edge mesh, either use one of the existing types
/// implementing this trait ([`ManifoldConfig`], [`NonManifoldConfig`]), or
/// create your own (preferably uninhabited) type and implement this trait.
pub trait Config: 'static {
    /// What kind of faces are accepted by `add_face`. Faces with any other
    /// number of vertices are rejected before anything else is checked.
    type FaceKind: FaceKind;

    /// Whether the mesh maintains the *manifold* invariant.
    ///
    /// If `true`, every operation keeps each vertex manifold: its
    /// neighborhood is a single fan (a disk, or a half-disk on the
    /// boundary). `add_face` rejects insertions that would pinch a vertex
    /// and `delete_face` cascades onto neighboring faces when a removal
    /// alone would create a pinch. If `false`, multiple fans may meet in
    /// one vertex and both checks are relaxed accordingly.
    const MANIFOLD: bool;

    /// Payload stored per vertex.
    type VertexData: Clone;
    /// Payload stored per half-edge.
    type HalfEdgeData: Clone;
    /// Payload stored per edge.
    type EdgeData: Clone;
    /// Payload stored per face.
    type FaceData: Clone;

    /// Whether the vertex payload buffer is maintained. If `false`, the
    /// buffer stays empty and vertex payload arguments are dropped.
    const VERTEX_DATA: bool;
    /// Like [`Config::VERTEX_DATA`], for half-edges.
    const HALF_EDGE_DATA: bool;
    /// Like [`Config::VERTEX_DATA`], for edges.
    const EDGE_DATA: bool;
    /// Like [`Config::VERTEX_DATA`], for faces.
    const FACE_DATA: bool;
}

/// Configuration for a mesh that maintains the manifold invariant. Polygon
/// faces, no payloads.
#[allow(missing_debug_implementations)]
pub enum ManifoldConfig {}
impl Config for ManifoldConfig {
    type FaceKind = PolyFaces;
    const MANIFOLD: bool = true;

    type VertexData = ();
    type HalfEdgeData = ();
    type EdgeData = ();
    type FaceData = ();
    const VERTEX_DATA: bool = false;
    const HALF_EDGE_DATA: bool = false;
    const EDGE_DATA: bool = false;
    const FACE_DATA: bool = false;
}

/// Configuration for a mesh that allows non-manifold vertices. Polygon
/// faces, no payloads.
#[allow(missing_debug_implementations)]
pub enum NonManifoldConfig {}
impl Config for NonManifoldConfig {
    type FaceKind = PolyFaces;
    const MANIFOLD: bool = false;

    type VertexData = ();
    type HalfEdgeData = ();
    type EdgeData = ();
    type FaceData = ();
    const VERTEX_DATA: bool = false;
    const HALF_EDGE_DATA: bool = false;
    const EDGE_DATA: bool = false;
    const FACE_DATA: bool = false;
}


// ===============================================================================================
// ===== Definition of types stored inside the data structure
// ===============================================================================================

/// Implementation of the *half edge mesh*. This data structure is widely
/// used in geometry processing due to its many capabilities paired with
/// fairly good speed and memory consumption.
///
/// The mesh can represent polygon meshes where each face can have
/// differently many vertices (restrictable via the configuration) and can
/// answer all local adjacency queries. Deleting elements tombstones them in
/// place; [`clean_up`][HalfEdgeMesh::clean_up] compacts the storage.
///
/// # References
///
/// Introduced in: Mäntylä, Martti. An introduction to solid modeling.
/// Computer science press, 1988.
#[derive(Empty)]
pub struct HalfEdgeMesh<C: Config = ManifoldConfig> {
    vertices: Vec<Vertex>,
    half_edges: Vec<HalfEdge>,
    faces: Vec<Face>,

    vertex_data: Vec<C::VertexData>,
    half_edge_data: Vec<C::HalfEdgeData>,
    edge_data: Vec<C::EdgeData>,
    face_data: Vec<C::FaceData>,

    _config: PhantomData<C>,
}

/// Data stored per `Vertex`.
#[derive(Clone, Copy)]
pub(crate) struct Vertex {
    /// Handle of one outgoing half edge.
    ///
    /// - If the vertex is isolated or deleted, this is `None`.
    /// - If the vertex is a boundary vertex, this stores one of the
    ///   boundary half edges.
    /// - If the vertex is not on the boundary, the half edge is arbitrary.
    outgoing: Opt<Checked<HalfEdgeHandle>>,
}

/// Data stored per half edge.
#[derive(Clone, Copy)]
pub(crate) struct HalfEdge {
    /// The vertex this half edge points to. `None` means the half edge is
    /// deleted.
    target: Opt<Checked<VertexHandle>>,

    /// The adjacent face, if one exists. `None` means the half edge is on
    /// the boundary.
    face: Opt<Checked<FaceHandle>>,

    /// The next half edge around the face or hole this half edge is
    /// adjacent to (going counter clock wise).
    next: Checked<HalfEdgeHandle>,

    /// The previous half edge around the face or hole this half edge is
    /// adjacent to.
    prev: Checked<HalfEdgeHandle>,
}

/// Data stored per `Face`.
#[derive(Clone, Copy)]
pub(crate) struct Face {
    /// Handle of one (arbitrary) inner half edge adjacent to the face.
    /// `None` means the face is deleted.
    inner: Opt<Checked<HalfEdgeHandle>>,
}

impl HalfEdge {
    /// A tombstoned record. The cycle links are dummies that must never be
    /// followed.
    fn tombstone() -> Self {
        Self {
            target: Opt::none(),
            face: Opt::none(),
            next: unsafe { Checked::new(HalfEdgeHandle::new(0)) },
            prev: unsafe { Checked::new(HalfEdgeHandle::new(0)) },
        }
    }
}

impl<C: Config> HalfEdgeMesh<C> {
    /// Creates an empty mesh.
    pub fn new() -> Self {
        Self::empty()
    }
}

impl<C: Config> Default for HalfEdgeMesh<C> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<C: Config> fmt::Debug for HalfEdgeMesh<C> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("HalfEdgeMesh")
            .field("vertices", &self.vertices)
            .field("half_edges", &self.half_edges)
            .field("faces", &self.faces)
            .finish()
    }
}

impl<C: Config> Clone for HalfEdgeMesh<C> {
    fn clone(&self) -> Self {
        Self {
            vertices: self.vertices.clone(),
            half_edges: self.half_edges.clone(),
            faces: self.faces.clone(),
            vertex_data: self.vertex_data.clone(),
            half_edge_data: self.half_edge_data.clone(),
            edge_data: self.edge_data.clone(),
            face_data: self.face_data.clone(),
            _config: PhantomData,
        }
    }
}

impl fmt::Debug for Vertex {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Vertex {{ outgoing: {:?} }}", self.outgoing)
    }
}

impl fmt::Debug for HalfEdge {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "HalfEdge {{ target: {:5} next: {:6} prev: {:6} face: {:?} }}",
            format!("{:?},", self.target),
            format!("{:?},", self.next),
            format!("{:?},", self.prev),
            self.face,
        )
    }
}

impl fmt::Debug for Face {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Face {{ inner: {:?} }}", self.inner)
    }
}

/// Helper macro to set the `next` and `prev` handles in one line. These two
/// handles always have to be set at the same time, so with this macro you
/// cannot forget one.
macro_rules! set_next_prev {
    ($mesh:ident, $prev:tt -> $next:tt) => {{
        $mesh[$prev].next = $next;
        $mesh[$next].prev = $prev;
    }};
}

macro_rules! impl_index {
    ($handle:ident, $field:ident, $out:ty) => {
        impl<C: Config> ops::Index<Checked<$handle>> for HalfEdgeMesh<C> {
            type Output = $out;

            #[inline(always)]
            fn index(&self, idx: Checked<$handle>) -> &Self::Output {
                debug_assert!(idx.to_usize() < self.$field.len());
                unsafe { self.$field.get_unchecked(idx.to_usize()) }
            }
        }

        impl<C: Config> ops::IndexMut<Checked<$handle>> for HalfEdgeMesh<C> {
            #[inline(always)]
            fn index_mut(&mut self, idx: Checked<$handle>) -> &mut Self::Output {
                debug_assert!(idx.to_usize() < self.$field.len());
                unsafe { self.$field.get_unchecked_mut(idx.to_usize()) }
            }
        }
    }
}

impl_index!(VertexHandle, vertices, Vertex);
impl_index!(HalfEdgeHandle, half_edges, HalfEdge);
impl_index!(FaceHandle, faces, Face);

impl Checked<HalfEdgeHandle> {
    /// Returns the handle of the half edge twin (the half edge right next
    /// to this half edge, but pointing in the opposite direction).
    ///
    /// This method only works due to some assumptions about the data
    /// structure, so this is only valid together with the data structure in
    /// this module! In particular, it assumes that two half edge twins are
    /// always stored right next to each other and that the handles start
    /// counting at an even number (0 in our case). Thus, we can simply flip
    /// the last bit of the handle id to get the twin handle.
    #[inline(always)]
    fn twin(self) -> Checked<HalfEdgeHandle> {
        // A pair of twins is always stored together, so the twin of an
        // in-bounds handle is in bounds as well.
        unsafe { Self::new(HalfEdgeHandle::new(self.idx() ^ 1)) }
    }
}


// ===============================================================================================
// ===== Internal helper methods
// ===============================================================================================

/// Scratch state for one edge of a face that is being inserted. The slot at
/// index `i` describes the half-edge from `vertices[i]` to
/// `vertices[(i + 1) % n]`.
#[derive(Clone, Copy)]
struct EdgeSlot {
    /// The inner half-edge of the new face along this edge. `None` until
    /// classification finds a pre-existing half-edge or allocation creates
    /// a new one.
    inner: Option<Checked<HalfEdgeHandle>>,
    /// Whether the half-edge pair for this edge has to be allocated.
    is_new: bool,
    /// Whether the two pre-existing half-edges meeting at the end vertex of
    /// this edge have to be spliced next to each other first.
    make_adjacent: bool,
    /// The boundary half-edge used to re-host the displaced fan segment
    /// when `make_adjacent` is set.
    free: Option<Checked<HalfEdgeHandle>>,
}

impl<C: Config> HalfEdgeMesh<C> {
    /// Makes sure the given handle points into the vertex arena. If that's
    /// not the case, this method panics.
    fn check_vertex(&self, vh: VertexHandle) -> Checked<VertexHandle> {
        if vh.to_usize() < self.vertices.len() {
            // We just checked `vh` is in bounds, so `unsafe` is fine.
            unsafe { Checked::new(vh) }
        } else {
            panic!(
                "{:?} was passed to a half edge mesh, but this vertex does not exist in this mesh",
                vh,
            );
        }
    }

    /// Makes sure the given handle points into the half-edge arena. If
    /// that's not the case, this method panics.
    fn check_half_edge(&self, heh: HalfEdgeHandle) -> Checked<HalfEdgeHandle> {
        if heh.to_usize() < self.half_edges.len() {
            // We just checked `heh` is in bounds, so `unsafe` is fine.
            unsafe { Checked::new(heh) }
        } else {
            panic!(
                "{:?} was passed to a half edge mesh, but this half edge does not exist \
                    in this mesh",
                heh,
            );
        }
    }

    /// Makes sure the given handle points into the face arena. If that's
    /// not the case, this method panics.
    fn check_face(&self, fh: FaceHandle) -> Checked<FaceHandle> {
        if fh.to_usize() < self.faces.len() {
            // We just checked `fh` is in bounds, so `unsafe` is fine.
            unsafe { Checked::new(fh) }
        } else {
            panic!(
                "{:?} was passed to a half edge mesh, but this face does not exist in this mesh",
                fh,
            );
        }
    }

    /// Makes sure the given edge exists in this mesh and returns its half
    /// edge with the lower index. Panics otherwise.
    fn checked_half_of(&self, eh: EdgeHandle) -> Checked<HalfEdgeHandle> {
        let heh = HalfEdgeHandle::lower_half_of(eh);
        if heh.to_usize() < self.half_edges.len() {
            // We just checked `heh` is in bounds, so `unsafe` is fine.
            unsafe { Checked::new(heh) }
        } else {
            panic!(
                "{:?} was passed to a half edge mesh, but this edge does not exist in this mesh",
                eh,
            );
        }
    }

    /// Returns the target vertex of a half edge that is known to be alive.
    #[inline(always)]
    fn target_of(&self, he: Checked<HalfEdgeHandle>) -> Checked<VertexHandle> {
        self[he].target.into_option()
            .expect("internal HEM error: live cycle contains a deleted half edge")
    }

    /// Returns an iterator that circulates around the vertex `center`. The
    /// iterator yields outgoing half edges.
    fn circulate_around_vertex(&self, center: Checked<VertexHandle>) -> CwVertexCirculator<'_, C> {
        match self[center].outgoing.into_option() {
            None => CwVertexCirculator::Empty,
            Some(start_he) => CwVertexCirculator::new(self, start_he),
        }
    }

    /// Returns an iterator that circulates around the vertex the given
    /// outgoing half edge originates at.
    fn circulate_around_vertex_at(
        &self,
        outgoing: Checked<HalfEdgeHandle>,
    ) -> CwVertexCirculator<'_, C> {
        CwVertexCirculator::new(self, outgoing)
    }

    /// Returns an iterator that circulates around the face `center`. The
    /// iterator yields inner half edges. For a deleted face the iterator is
    /// empty.
    fn circulate_around_face(&self, center: Checked<FaceHandle>) -> FaceCirculator<'_, C> {
        match self[center].inner.into_option() {
            None => FaceCirculator::Empty,
            Some(start_he) => FaceCirculator::new(self, start_he),
        }
    }

    /// Returns an iterator that circulates around the face (or hole) the
    /// given half edge belongs to.
    fn circulate_around_face_at(
        &self,
        inner: Checked<HalfEdgeHandle>,
    ) -> FaceCirculator<'_, C> {
        FaceCirculator::new(self, inner)
    }
}


// ===============================================================================================
// ===== Adding vertices and faces
// ===============================================================================================

impl<C: Config> HalfEdgeMesh<C> {
    /// Adds a new, isolated vertex to the mesh and returns its handle.
    ///
    /// If the configuration stores vertex payloads, the buffer receives a
    /// default value; use [`add_vertex_with`][Self::add_vertex_with] to
    /// supply one.
    pub fn add_vertex(&mut self) -> VertexHandle
    where
        C::VertexData: Default,
    {
        self.add_vertex_with(C::VertexData::default())
    }

    /// Adds a new, isolated vertex carrying the given payload and returns
    /// its handle. The payload is dropped if the configuration does not
    /// store vertex payloads.
    pub fn add_vertex_with(&mut self, data: C::VertexData) -> VertexHandle {
        let vh = VertexHandle::from_usize(self.vertices.len());
        self.vertices.push(Vertex { outgoing: Opt::none() });
        if C::VERTEX_DATA {
            self.vertex_data.push(data);
        }
        vh
    }

    /// Adds a face defined by the given vertices (in counter clock wise
    /// order, the last vertex connecting back to the first).
    ///
    /// Returns `None` without touching the mesh if the face cannot be
    /// added:
    ///
    /// - the number of vertices is not accepted by the configured
    ///   [`FaceKind`],
    /// - a vertex handle is out of bounds or listed twice,
    /// - a vertex has no free boundary slot to attach the face to,
    /// - an edge of the face already carries a face on the required side,
    /// - the insertion would violate the manifold invariant (manifold
    ///   configurations only), or
    /// - stitching the face in would require detaching a fan that fully
    ///   surrounds one of the vertices.
    pub fn add_face(&mut self, vertices: &[VertexHandle]) -> Option<FaceHandle>
    where
        C::FaceData: Default,
        C::EdgeData: Default,
        C::HalfEdgeData: Default,
    {
        self.add_face_with(
            vertices,
            C::FaceData::default(),
            C::EdgeData::default(),
            C::HalfEdgeData::default(),
        )
    }

    /// Like [`add_face`][Self::add_face], but also stores the given
    /// payloads: `face_data` for the new face, `edge_data` for every newly
    /// created edge and `half_edge_data` for both halves of every newly
    /// created edge. Payloads of disabled kinds are dropped.
    pub fn add_face_with(
        &mut self,
        vertices: &[VertexHandle],
        face_data: C::FaceData,
        edge_data: C::EdgeData,
        half_edge_data: C::HalfEdgeData,
    ) -> Option<FaceHandle> {
        let n = vertices.len();
        if !C::FaceKind::accepts(n) {
            return None;
        }

        // Reject out-of-bounds and duplicated vertices. Faces are almost
        // always small, where the quadratic scan beats hashing; huge
        // polygons go through a set.
        for &vh in vertices {
            if vh.to_usize() >= self.vertices.len() {
                return None;
            }
        }
        if n <= 32 {
            for i in 1..n {
                if vertices[..i].contains(&vertices[i]) {
                    return None;
                }
            }
        } else {
            let mut seen = std::collections::HashSet::with_capacity(n);
            if !vertices.iter().all(|vh| seen.insert(*vh)) {
                return None;
            }
        }

        // All handles are in bounds now. `VertexHandle` and
        // `Checked<VertexHandle>` have the same layout (`repr(transparent)`),
        // so this cast is sound.
        let vertices: &[Checked<VertexHandle>] = unsafe {
            slice::from_raw_parts(vertices.as_ptr() as *const Checked<VertexHandle>, n)
        };

        // If every corner is isolated, no validation or repair is needed:
        // allocate all edges and stitch them up.
        if vertices.iter().all(|&vh| self[vh].outgoing.is_none()) {
            let mut inner_he: SmallVec<[Checked<HalfEdgeHandle>; 4]> = SmallVec::with_capacity(n);
            for i in 0..n {
                // The dummy cycle links are overwritten by the connect
                // calls right below.
                let he = unsafe {
                    self.add_edge(vertices[i], vertices[(i + 1) % n], &half_edge_data, &edge_data)
                };
                inner_he.push(he);
            }
            for i in 0..n {
                self.connect_new_new(inner_he[i], inner_he[(i + 1) % n], vertices[(i + 1) % n]);
            }
            return Some(self.connect_face(&inner_he, face_data));
        }

        // Classify each edge of the new face and check that the insertion
        // is topologically possible. Nothing is mutated until every check
        // has passed, so a failed insertion leaves the mesh untouched.
        let mut slots: SmallVec<[EdgeSlot; 4]> = smallvec![
            EdgeSlot { inner: None, is_new: true, make_adjacent: false, free: None };
            n
        ];
        for i in 0..n {
            if !self.classify_edge(vertices[i], vertices[(i + 1) % n], &mut slots[i]) {
                return None;
            }
        }
        for i in 0..n {
            let j = (i + 1) % n;
            let b_isolated = self[vertices[j]].outgoing.is_none();
            match self.check_corner(slots[i].inner, slots[j].inner, b_isolated) {
                None => return None,
                Some((make_adjacent, free)) => {
                    slots[i].make_adjacent = make_adjacent;
                    slots[i].free = free;
                }
            }
        }

        // Splice pre-existing half-edges next to each other where the
        // corner check asked for it. This only happens for non-manifold
        // configurations.
        for i in 0..n {
            if slots[i].make_adjacent {
                let j = (i + 1) % n;
                let ab = slots[i].inner.expect("internal HEM error: missing inner half edge");
                let bc = slots[j].inner.expect("internal HEM error: missing inner half edge");
                let free = slots[i].free.expect("internal HEM error: missing free half edge");
                self.make_adjacent(ab, bc, free);
            }
        }

        // Allocate the missing edges.
        for i in 0..n {
            if slots[i].is_new {
                // The dummy cycle links are overwritten by the connect
                // calls right below.
                let he = unsafe {
                    self.add_edge(vertices[i], vertices[(i + 1) % n], &half_edge_data, &edge_data)
                };
                slots[i].inner = Some(he);
            }
        }

        // Stitch the new face in, one corner at a time.
        for i in 0..n {
            let j = (i + 1) % n;
            let ab = slots[i].inner.expect("internal HEM error: missing inner half edge");
            let bc = slots[j].inner.expect("internal HEM error: missing inner half edge");
            let b = vertices[j];

            match (slots[i].is_new, slots[j].is_new) {
                (true, true) => self.connect_new_new(ab, bc, b),
                (true, false) => self.connect_new_old(ab, bc, b),
                (false, true) => self.connect_old_new(ab, bc, b),
                (false, false) => self.connect_old_old(ab, bc, b),
            }
        }

        let inner_he: SmallVec<[Checked<HalfEdgeHandle>; 4]> = slots.iter()
            .map(|slot| slot.inner.expect("internal HEM error: missing inner half edge"))
            .collect();
        Some(self.connect_face(&inner_he, face_data))
    }

    /// Adds two half edges between `from` and `to`. Returns the handle of
    /// the half edge pointing to `to`.
    ///
    /// This function correctly sets the `target` fields, sets both `face`
    /// fields to `None` (boundary) and pushes payloads for the enabled
    /// kinds. The `next` and `prev` fields are dummy values which is why
    /// this function is `unsafe`: the caller has to overwrite them before
    /// they are read.
    unsafe fn add_edge(
        &mut self,
        from: Checked<VertexHandle>,
        to: Checked<VertexHandle>,
        half_edge_data: &C::HalfEdgeData,
        edge_data: &C::EdgeData,
    ) -> Checked<HalfEdgeHandle> {
        let face = Opt::none();
        let dummy = Checked::new(HalfEdgeHandle::new(0));

        self.half_edges.push(HalfEdge {
            target: Opt::some(from),
            face,
            next: dummy,
            prev: dummy,
        });
        let out = HalfEdgeHandle::from_usize(self.half_edges.len());
        self.half_edges.push(HalfEdge {
            target: Opt::some(to),
            face,
            next: dummy,
            prev: dummy,
        });

        if C::HALF_EDGE_DATA {
            self.half_edge_data.push(half_edge_data.clone());
            self.half_edge_data.push(half_edge_data.clone());
        }
        if C::EDGE_DATA {
            self.edge_data.push(edge_data.clone());
        }

        Checked::new(out)
    }

    /// Decides whether the half edge `a -> b` already exists and whether
    /// the edge of the new face can be inserted there at all. On success,
    /// `slot` describes the classification; `false` means the face cannot
    /// be added. Read-only.
    fn classify_edge(
        &self,
        a: Checked<VertexHandle>,
        b: Checked<VertexHandle>,
        slot: &mut EdgeSlot,
    ) -> bool {
        // An isolated vertex accepts any new edge.
        let outgoing = match self[a].outgoing.into_option() {
            None => return true,
            Some(he) => he,
        };

        // A connected vertex needs a boundary slot to attach to. The
        // `outgoing` handle points at a boundary half edge whenever one
        // exists, so this single check settles it.
        if self[outgoing].face.is_some() {
            return false;
        }

        if C::MANIFOLD {
            // In a manifold mesh the only reusable `a -> b` half edge is
            // the boundary one that `outgoing` must already point at.
            if self[outgoing].target == Opt::some(b) {
                slot.is_new = false;
                slot.inner = Some(outgoing);
            }
            true
        } else {
            // With multiple fans possible, all outgoing half edges of `a`
            // have to be walked.
            let mut cur = outgoing;
            loop {
                if self[cur].target == Opt::some(b) {
                    // The existing half edge must not carry a face on this
                    // side already.
                    if self[cur].face.is_some() {
                        return false;
                    }
                    slot.is_new = false;
                    slot.inner = Some(cur);
                    return true;
                }

                cur = self[cur.twin()].next;
                if cur == outgoing {
                    return true;
                }
            }
        }
    }

    /// Checks the corner between the edges `ab` and `bc` of the new face
    /// (meeting in vertex `b`). Returns `None` if inserting the face is
    /// impossible, otherwise `(make_adjacent, free half edge)`. Read-only.
    fn check_corner(
        &self,
        inner_ab: Option<Checked<HalfEdgeHandle>>,
        inner_bc: Option<Checked<HalfEdgeHandle>>,
        b_isolated: bool,
    ) -> Option<(bool, Option<Checked<HalfEdgeHandle>>)> {
        if C::MANIFOLD {
            // Two new edges meeting in a connected vertex would start a
            // second fan there (a pinch point).
            if inner_ab.is_none() && inner_bc.is_none() && !b_isolated {
                return None;
            }
            return Some((false, None));
        }

        // Splicing is only ever needed between two pre-existing half edges.
        let (ab, bc) = match (inner_ab, inner_bc) {
            (Some(ab), Some(bc)) => (ab, bc),
            _ => return Some((false, None)),
        };

        if self[ab].next == bc {
            return Some((false, None));
        }

        // `ab` and `bc` sit in different positions of the cycle around `b`,
        // so a fan segment has to be moved elsewhere. Find a boundary half
        // edge pointing at `b` that can host it, rotating from `cb`
        // onwards. The rotation stops at `ab` at the latest since `ab` is a
        // boundary half edge pointing at `b`.
        let cb = bc.twin();
        let mut cur = cb;
        loop {
            cur = self[cur].next.twin();
            if self[cur].face.is_none() {
                break;
            }
        }

        if cur == ab {
            // The only boundary slot is the one we are about to fill:
            // moving the segment there would detach the fans around `b`.
            None
        } else {
            Some((true, Some(cur)))
        }
    }

    /// Splices the cycle around the common vertex of `ab` and `bc` so that
    /// `bc` becomes the `next` of `ab`. The displaced fan segment is
    /// re-hosted behind the boundary half edge `free`. All faces stay
    /// intact.
    fn make_adjacent(
        &mut self,
        ab: Checked<HalfEdgeHandle>,
        bc: Checked<HalfEdgeHandle>,
        free: Checked<HalfEdgeHandle>,
    ) {
        let ab_next = self[ab].next;
        let bc_prev = self[bc].prev;
        let free_next = self[free].next;

        set_next_prev!(self, ab -> bc);
        set_next_prev!(self, free -> ab_next);
        set_next_prev!(self, bc_prev -> free_next);
    }

    /// Stitches the corner at `b` where both `ab` and `bc` were newly
    /// allocated.
    ///
    ///                (b)
    ///               ^/ ^\
    ///              //   \\
    ///      ab ->  //     \\  <- bc
    ///            //   F   \\
    ///           /v         \v
    ///          (a)         (c)
    ///
    fn connect_new_new(
        &mut self,
        ab: Checked<HalfEdgeHandle>,
        bc: Checked<HalfEdgeHandle>,
        b: Checked<VertexHandle>,
    ) {
        let ba = ab.twin();
        let cb = bc.twin();

        if C::MANIFOLD || self[b].outgoing.is_none() {
            // The new edges are the only ones at `b` (in manifold
            // configurations the corner check already guaranteed that).
            set_next_prev!(self, ab -> bc);
            set_next_prev!(self, cb -> ba);
            self[b].outgoing = Opt::some(ba);
        } else {
            // `b` already carries a fan; insert the new blade between the
            // boundary half edge `outgoing` and its predecessor. The old
            // `outgoing` stays boundary, so it can be kept.
            let b_out = self[b].outgoing.into_option()
                .expect("internal HEM error: missing outgoing half edge");
            let b_out_prev = self[b_out].prev;

            set_next_prev!(self, ab -> bc);
            set_next_prev!(self, cb -> b_out);
            set_next_prev!(self, b_out_prev -> ba);
        }
    }

    /// Stitches the corner at `b` where `ab` is new and `bc` pre-existed.
    fn connect_new_old(
        &mut self,
        ab: Checked<HalfEdgeHandle>,
        bc: Checked<HalfEdgeHandle>,
        b: Checked<VertexHandle>,
    ) {
        let ba = ab.twin();
        let bc_prev = self[bc].prev;

        set_next_prev!(self, ab -> bc);
        set_next_prev!(self, bc_prev -> ba);

        // `bc` becomes an inner half edge of the new face, so it stops
        // being a valid boundary anchor. `ba` is boundary for sure.
        self[b].outgoing = Opt::some(ba);
    }

    /// Stitches the corner at `b` where `ab` pre-existed and `bc` is new.
    fn connect_old_new(
        &mut self,
        ab: Checked<HalfEdgeHandle>,
        bc: Checked<HalfEdgeHandle>,
        b: Checked<VertexHandle>,
    ) {
        let cb = bc.twin();
        let ab_next = self[ab].next;

        set_next_prev!(self, ab -> bc);
        set_next_prev!(self, cb -> ab_next);

        self[b].outgoing = Opt::some(ab_next);
    }

    /// Stitches the corner at `b` where both half edges pre-existed. In
    /// manifold configurations there is nothing to do (the corner check
    /// proved the half edges adjacent). Otherwise the `outgoing` anchor of
    /// `b` may have to be rotated away from `bc`, which is about to become
    /// an interior half edge.
    fn connect_old_old(
        &mut self,
        _ab: Checked<HalfEdgeHandle>,
        bc: Checked<HalfEdgeHandle>,
        b: Checked<VertexHandle>,
    ) {
        if C::MANIFOLD {
            return;
        }

        if self[b].outgoing == Opt::some(bc) {
            let mut cur = self[bc.twin()].next;
            while cur != bc {
                if self[cur].face.is_none() {
                    self[b].outgoing = Opt::some(cur);
                    return;
                }
                cur = self[cur.twin()].next;
            }
            // No other boundary half edge leaves `b`: the vertex becomes
            // interior and the anchor may stay where it is.
        }
    }

    /// Adds the face record, stamps the `face` field of all inner half
    /// edges and pushes the face payload if enabled.
    fn connect_face(
        &mut self,
        inner_he: &[Checked<HalfEdgeHandle>],
        face_data: C::FaceData,
    ) -> FaceHandle {
        let last = *inner_he.last().expect("internal HEM error: face without inner half edges");
        let fh = FaceHandle::from_usize(self.faces.len());
        self.faces.push(Face { inner: Opt::some(last) });
        if C::FACE_DATA {
            self.face_data.push(face_data);
        }

        // The face was just pushed, so the handle is in bounds.
        let f = unsafe { Checked::new(fh) };
        for &he in inner_he {
            self[he].face = Opt::some(f);
        }

        fh
    }
}


// ===============================================================================================
// ===== Deleting elements
// ===============================================================================================

impl<C: Config> HalfEdgeMesh<C> {
    /// Deletes the given vertex together with all faces it is part of.
    ///
    /// Elements are only tombstoned; call [`clean_up`][Self::clean_up] to
    /// compact the storage. Deleting an isolated or already deleted vertex
    /// is a no-op (both states share the same record sentinel and compaction
    /// removes them alike).
    pub fn delete_vertex(&mut self, v: VertexHandle) {
        let v = self.check_vertex(v);
        let start = match self[v].outgoing.into_option() {
            None => return,
            Some(he) => he,
        };

        // Collect the incident faces before deleting anything. The list may
        // contain a face twice in non-manifold meshes, deleting twice is
        // fine.
        let mut faces: SmallVec<[Checked<FaceHandle>; 8]> = SmallVec::new();
        let mut cur = start;
        loop {
            if let Some(f) = self[cur].face.into_option() {
                faces.push(f);
            }
            cur = self[cur.twin()].next;
            if cur == start {
                break;
            }
        }

        for f in faces {
            self.delete_face_checked(f);
        }
    }

    /// Deletes the given edge: both half edges and, where a half edge
    /// carries a face, that face as well.
    pub fn delete_edge(&mut self, e: EdgeHandle) {
        let he = self.checked_half_of(e);
        self.delete_edge_impl(he);
    }

    /// Deletes the edge the given half edge belongs to. Equivalent to
    /// `delete_edge(he.full_edge())`.
    pub fn delete_edge_of(&mut self, he: HalfEdgeHandle) {
        let he = self.check_half_edge(he);
        self.delete_edge_impl(he);
    }

    fn delete_edge_impl(&mut self, he: Checked<HalfEdgeHandle>) {
        if self[he].target.is_none() {
            return;
        }
        let twin = he.twin();

        // The two halves are handled strictly one after the other: deleting
        // the first face may already tombstone the twin.
        match self[he].face.into_option() {
            None => self[he].target = Opt::none(),
            Some(f) => self.delete_face_checked(f),
        }
        match self[twin].face.into_option() {
            None => self[twin].target = Opt::none(),
            Some(f) => self.delete_face_checked(f),
        }
    }

    /// Deletes the given face.
    ///
    /// In manifold configurations, removing a single face can pinch a
    /// vertex whose neighborhood would fall into two fans. In that case the
    /// deletion cascades onto neighboring faces until every touched vertex
    /// is manifold again. Deleting an already deleted face is a no-op.
    pub fn delete_face(&mut self, f: FaceHandle) {
        let f = self.check_face(f);
        self.delete_face_checked(f);
    }

    fn delete_face_checked(&mut self, f: Checked<FaceHandle>) {
        if self[f].inner.is_none() {
            return;
        }

        let mut cascade: SmallVec<[Checked<FaceHandle>; 8]> = SmallVec::new();
        if C::MANIFOLD {
            cascade.push(f);
            while let Some(cur) = cascade.pop() {
                self.delete_face_impl(cur, &mut cascade);
            }
        } else {
            self.delete_face_impl(f, &mut cascade);
            debug_assert!(cascade.is_empty());
        }
    }

    /// Tombstones one face and repairs the cycles around its vertices.
    /// Faces that have to be deleted to keep the mesh manifold are pushed
    /// onto `cascade` (manifold configurations only).
    fn delete_face_impl(
        &mut self,
        f: Checked<FaceHandle>,
        cascade: &mut SmallVec<[Checked<FaceHandle>; 8]>,
    ) {
        // The cascade can reach a face twice.
        let start = match self[f].inner.into_option() {
            None => return,
            Some(he) => he,
        };

        // Record the inner cycle and the boundary-ness of the outer half
        // edges before modifying anything: the repairs below overwrite the
        // links we would otherwise navigate by.
        let mut inner: SmallVec<[(Checked<HalfEdgeHandle>, bool); 8]> = SmallVec::new();
        let mut he = start;
        loop {
            inner.push((he, self[he.twin()].face.is_none()));
            he = self[he].next;
            if he == start {
                break;
            }
        }
        debug_assert!(inner.len() >= 3);

        let n = inner.len();
        for i in 0..n {
            let (ab, ba_is_boundary) = inner[i];
            let (bc, cb_is_boundary) = inner[(i + 1) % n];
            self.reconnect(ab, bc, ba_is_boundary, cb_is_boundary, cascade);
            self[ab].face = Opt::none();
        }

        self[f].inner = Opt::none();
    }

    /// Repairs the cycle at the vertex `b` shared by the consecutive inner
    /// half edges `ab` and `bc` of a face that is being deleted. The
    /// `*_is_boundary` flags describe the outer half edges `ba` and `cb`
    /// and were taken before the deletion started.
    ///
    ///          (a)         (c)
    ///           \^         ^/
    ///       ab   \\       //   bc
    ///             \\  F  //
    ///              \v   /v
    ///               \\ //
    ///                (b)
    ///
    fn reconnect(
        &mut self,
        ab: Checked<HalfEdgeHandle>,
        bc: Checked<HalfEdgeHandle>,
        ba_is_boundary: bool,
        cb_is_boundary: bool,
        cascade: &mut SmallVec<[Checked<FaceHandle>; 8]>,
    ) {
        let ba = ab.twin();
        let cb = bc.twin();
        let b = self.target_of(ab);

        match (ba_is_boundary, cb_is_boundary) {
            // The edge `ab` loses its last face, so it vanishes. If it was
            // the last edge at `b`, the vertex becomes isolated and is
            // tombstoned right away.
            (true, true) => {
                let cb_next = self[cb].next;
                if cb_next == ba {
                    self[b].outgoing = Opt::none();
                } else {
                    let ba_prev = self[ba].prev;
                    set_next_prev!(self, ba_prev -> cb_next);
                    self[b].outgoing = Opt::some(cb_next);
                }

                self[ab].target = Opt::none();
                self[ba].target = Opt::none();
            }

            // `ab` vanishes, `bc` stays and becomes the boundary at `b`.
            (true, false) => {
                let ba_prev = self[ba].prev;
                set_next_prev!(self, ba_prev -> bc);
                self[b].outgoing = Opt::some(bc);

                self[ab].target = Opt::none();
                self[ba].target = Opt::none();
            }

            // `bc` vanishes (its tombstones are written by the neighboring
            // corner), `ab` stays and is linked past it.
            (false, true) => {
                let cb_next = self[cb].next;
                set_next_prev!(self, ab -> cb_next);
                self[b].outgoing = Opt::some(cb_next);
            }

            // Both edges keep their other face. This is the only case in
            // which the deletion can pinch `b`.
            (false, false) => self.reconnect_nb_nb(bc, cb, b, cascade),
        }
    }

    /// Handles the corner repair where neither edge vanishes.
    ///
    /// In a manifold configuration, `b` being a boundary vertex means the
    /// deletion just opened a second hole at `b`: every face of the fan
    /// between `cb` and the old boundary is pushed onto the cascade so the
    /// pinch disappears again. Otherwise `b` simply becomes a boundary
    /// vertex and its anchor is set to the now-boundary `bc`.
    fn reconnect_nb_nb(
        &mut self,
        bc: Checked<HalfEdgeHandle>,
        cb: Checked<HalfEdgeHandle>,
        b: Checked<VertexHandle>,
        cascade: &mut SmallVec<[Checked<FaceHandle>; 8]>,
    ) {
        let b_is_boundary = match self[b].outgoing.into_option() {
            None => true,
            Some(outgoing) => self[outgoing].face.is_none(),
        };

        if C::MANIFOLD {
            if b_is_boundary {
                let mut cur = cb;
                loop {
                    match self[cur].face.into_option() {
                        None => break,
                        Some(f) => {
                            cascade.push(f);
                            cur = self[cur].next.twin();
                        }
                    }
                }
            } else {
                self[b].outgoing = Opt::some(bc);
            }
        } else {
            if !b_is_boundary {
                self[b].outgoing = Opt::some(bc);
            }
        }
    }
}


// ===============================================================================================
// ===== Compaction
// ===============================================================================================

/// Compacts one arena in place: tombstoned records are dropped, surviving
/// records keep their order. The payload buffer is compacted in lock-step
/// when `has_data` is set. Returns the old-to-new index map (`None` entries
/// for dropped records).
fn compact_arena<T, D, H: Handle>(
    elements: &mut Vec<T>,
    data: &mut Vec<D>,
    has_data: bool,
    is_deleted: impl Fn(&T) -> bool,
) -> Vec<Opt<Checked<H>>> {
    if has_data {
        debug_assert_eq!(elements.len(), data.len());
    } else {
        debug_assert!(data.is_empty());
    }

    let mut map = Vec::with_capacity(elements.len());
    let mut new_idx: hsize = 0;
    for element in elements.iter() {
        if is_deleted(element) {
            map.push(Opt::none());
        } else {
            // The new index is a position in the compacted arena, so it is
            // in bounds once `retain` below has run.
            map.push(Opt::some(unsafe { Checked::new(H::new(new_idx)) }));
            new_idx += 1;
        }
    }

    let mut i = 0;
    elements.retain(|_| {
        let keep = map[i].is_some();
        i += 1;
        keep
    });
    if has_data {
        let mut i = 0;
        data.retain(|_| {
            let keep = map[i].is_some();
            i += 1;
            keep
        });
    }

    map
}

/// Applies an old-to-new index map to a handle that must survive.
fn remap<H: Handle>(map: &[Opt<Checked<H>>], old: Checked<H>) -> Checked<H> {
    map[old.to_usize()].into_option()
        .expect("internal HEM error: live record links to a deleted element")
}

impl<C: Config> HalfEdgeMesh<C> {
    /// Removes all tombstoned records (and isolated vertices, which share
    /// their sentinel) from the arenas and rewrites every stored handle.
    ///
    /// Afterwards no tombstones remain and all handles obtained before the
    /// call are stale: they may now refer to different elements or be out
    /// of bounds. Runs in time linear in the arena sizes. Capacity is kept.
    pub fn clean_up(&mut self) {
        debug_assert!(self.half_edges.len() % 2 == 0);

        let vertex_map = compact_arena::<_, _, VertexHandle>(
            &mut self.vertices,
            &mut self.vertex_data,
            C::VERTEX_DATA,
            |v: &Vertex| v.outgoing.is_none(),
        );
        let half_edge_map = compact_arena::<_, _, HalfEdgeHandle>(
            &mut self.half_edges,
            &mut self.half_edge_data,
            C::HALF_EDGE_DATA,
            |he: &HalfEdge| he.target.is_none(),
        );
        let face_map = compact_arena::<_, _, FaceHandle>(
            &mut self.faces,
            &mut self.face_data,
            C::FACE_DATA,
            |f: &Face| f.inner.is_none(),
        );

        // Edge payload is keyed by half-edge pairs: an entry survives iff
        // its pair does. Half edges are only ever tombstoned in pairs, so
        // checking the lower half suffices.
        if C::EDGE_DATA {
            let mut e = 0;
            self.edge_data.retain(|_| {
                let keep = half_edge_map[2 * e].is_some();
                e += 1;
                keep
            });
        }

        // Rewrite the cross references of all surviving records.
        for v in &mut self.vertices {
            let old = v.outgoing.into_option()
                .expect("internal HEM error: surviving vertex without outgoing half edge");
            v.outgoing = half_edge_map[old.to_usize()];
        }
        for he in &mut self.half_edges {
            let old_target = he.target.into_option()
                .expect("internal HEM error: surviving half edge without target");
            he.target = vertex_map[old_target.to_usize()];
            he.next = remap(&half_edge_map, he.next);
            he.prev = remap(&half_edge_map, he.prev);
            if let Some(f) = he.face.into_option() {
                he.face = face_map[f.to_usize()];
            }
        }
        for f in &mut self.faces {
            let old = f.inner.into_option()
                .expect("internal HEM error: surviving face without inner half edge");
            f.inner = half_edge_map[old.to_usize()];
        }
    }

    /// Removes all elements and payloads. Capacity is kept.
    pub fn clear(&mut self) {
        self.vertices.clear();
        self.half_edges.clear();
        self.faces.clear();
        self.vertex_data.clear();
        self.half_edge_data.clear();
        self.edge_data.clear();
        self.face_data.clear();
    }
}


// ===============================================================================================
// ===== Capacity and sizes
// ===============================================================================================

impl<C: Config> HalfEdgeMesh<C> {
    /// Reserves space for `count` additional vertices (payload included if
    /// enabled).
    pub fn reserve_vertices(&mut self, count: usize) {
        self.vertices.reserve(count);
        if C::VERTEX_DATA {
            self.vertex_data.reserve(count);
        }
    }

    /// Reserves space for `count` additional edges, i.e. `2 * count`
    /// half-edges (payloads included if enabled).
    pub fn reserve_edges(&mut self, count: usize) {
        self.half_edges.reserve(2 * count);
        if C::HALF_EDGE_DATA {
            self.half_edge_data.reserve(2 * count);
        }
        if C::EDGE_DATA {
            self.edge_data.reserve(count);
        }
    }

    /// Reserves space for `count` additional faces (payload included if
    /// enabled).
    pub fn reserve_faces(&mut self, count: usize) {
        self.faces.reserve(count);
        if C::FACE_DATA {
            self.face_data.reserve(count);
        }
    }

    /// Resizes the vertex arena to `count` records. New records are
    /// tombstones carrying default payload. Shrinking can leave other
    /// elements with dangling references; it is the caller's responsibility
    /// to avoid that.
    pub fn resize_vertices(&mut self, count: usize)
    where
        C::VertexData: Default,
    {
        self.resize_vertices_with(count, C::VertexData::default())
    }

    /// Like [`resize_vertices`][Self::resize_vertices] with explicit fill
    /// payload.
    pub fn resize_vertices_with(&mut self, count: usize, data: C::VertexData) {
        self.vertices.resize(count, Vertex { outgoing: Opt::none() });
        if C::VERTEX_DATA {
            self.vertex_data.resize(count, data);
        }
    }

    /// Resizes the edge arenas to `count` edges (`2 * count` half-edges).
    /// New records are tombstones carrying default payload.
    pub fn resize_edges(&mut self, count: usize)
    where
        C::HalfEdgeData: Default,
        C::EdgeData: Default,
    {
        self.resize_edges_with(count, C::EdgeData::default(), C::HalfEdgeData::default())
    }

    /// Like [`resize_edges`][Self::resize_edges] with explicit fill
    /// payloads.
    pub fn resize_edges_with(
        &mut self,
        count: usize,
        edge_data: C::EdgeData,
        half_edge_data: C::HalfEdgeData,
    ) {
        self.half_edges.resize(2 * count, HalfEdge::tombstone());
        if C::HALF_EDGE_DATA {
            self.half_edge_data.resize(2 * count, half_edge_data);
        }
        if C::EDGE_DATA {
            self.edge_data.resize(count, edge_data);
        }
    }

    /// Resizes the face arena to `count` records. New records are
    /// tombstones carrying default payload.
    pub fn resize_faces(&mut self, count: usize)
    where
        C::FaceData: Default,
    {
        self.resize_faces_with(count, C::FaceData::default())
    }

    /// Like [`resize_faces`][Self::resize_faces] with explicit fill
    /// payload.
    pub fn resize_faces_with(&mut self, count: usize, data: C::FaceData) {
        self.faces.resize(count, Face { inner: Opt::none() });
        if C::FACE_DATA {
            self.face_data.resize(count, data);
        }
    }

    /// Returns the number of vertex records (tombstones included).
    pub fn num_vertices(&self) -> usize {
        self.vertices.len()
    }

    /// Returns the number of half-edge records (tombstones included).
    /// Always even.
    pub fn num_half_edges(&self) -> usize {
        debug_assert!(self.half_edges.len() % 2 == 0);
        self.half_edges.len()
    }

    /// Returns the number of edge records (tombstones included). There are
    /// always exactly twice as many half edges as there are edges.
    pub fn num_edges(&self) -> usize {
        debug_assert!(self.half_edges.len() % 2 == 0);
        self.half_edges.len() / 2
    }

    /// Returns the number of face records (tombstones included).
    pub fn num_faces(&self) -> usize {
        self.faces.len()
    }

    /// Returns `true` if the mesh contains no records at all.
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty() && self.half_edges.is_empty() && self.faces.is_empty()
    }
}


// ===============================================================================================
// ===== Connectivity queries
// ===============================================================================================

impl<C: Config> HalfEdgeMesh<C> {
    /// Returns an outgoing half edge of `v`, or `None` if the vertex is
    /// isolated (or deleted). If `v` lies on the boundary, the returned
    /// half edge is a boundary half edge.
    pub fn outgoing_half_edge(&self, v: VertexHandle) -> Option<HalfEdgeHandle> {
        let v = self.check_vertex(v);
        self[v].outgoing.into_option().map(|he| *he)
    }

    /// Returns an incoming half edge of `v` (the twin of
    /// [`outgoing_half_edge`][Self::outgoing_half_edge]), or `None` if the
    /// vertex is isolated (or deleted).
    pub fn incoming_half_edge(&self, v: VertexHandle) -> Option<HalfEdgeHandle> {
        let v = self.check_vertex(v);
        self[v].outgoing.into_option().map(|he| *he.twin())
    }

    /// Returns the vertex the given half edge points to, or `None` if the
    /// half edge is deleted.
    pub fn terminating_vertex(&self, he: HalfEdgeHandle) -> Option<VertexHandle> {
        let he = self.check_half_edge(he);
        self[he].target.into_option().map(|v| *v)
    }

    /// Returns the vertex the given half edge originates at, or `None` if
    /// its twin is deleted.
    pub fn originating_vertex(&self, he: HalfEdgeHandle) -> Option<VertexHandle> {
        let he = self.check_half_edge(he);
        self[he.twin()].target.into_option().map(|v| *v)
    }

    /// Returns the twin of the given half edge (the other half of the same
    /// edge, pointing in the opposite direction).
    pub fn opposite(&self, he: HalfEdgeHandle) -> HalfEdgeHandle {
        *self.check_half_edge(he).twin()
    }

    /// Returns the half edge following `he` around its face or hole.
    pub fn next(&self, he: HalfEdgeHandle) -> HalfEdgeHandle {
        let he = self.check_half_edge(he);
        *self[he].next
    }

    /// Returns the half edge preceding `he` around its face or hole.
    pub fn prev(&self, he: HalfEdgeHandle) -> HalfEdgeHandle {
        let he = self.check_half_edge(he);
        *self[he].prev
    }

    /// Returns the face the given half edge belongs to, or `None` for a
    /// boundary half edge.
    pub fn face(&self, he: HalfEdgeHandle) -> Option<FaceHandle> {
        let he = self.check_half_edge(he);
        self[he].face.into_option().map(|f| *f)
    }

    /// Returns the face on the other side of the given half edge's edge, or
    /// `None` if the twin is a boundary half edge.
    pub fn opposite_face(&self, he: HalfEdgeHandle) -> Option<FaceHandle> {
        let he = self.check_half_edge(he);
        self[he.twin()].face.into_option().map(|f| *f)
    }

    /// Returns an inner half edge of the given face, or `None` if the face
    /// is deleted.
    pub fn inner_half_edge(&self, f: FaceHandle) -> Option<HalfEdgeHandle> {
        let f = self.check_face(f);
        self[f].inner.into_option().map(|he| *he)
    }

    /// Returns an outer half edge of the given face (the twin of
    /// [`inner_half_edge`][Self::inner_half_edge]), or `None` if the face
    /// is deleted.
    pub fn outer_half_edge(&self, f: FaceHandle) -> Option<HalfEdgeHandle> {
        let f = self.check_face(f);
        self[f].inner.into_option().map(|he| *he.twin())
    }
}


// ===============================================================================================
// ===== Predicates
// ===============================================================================================

impl<C: Config> HalfEdgeMesh<C> {
    /// Returns `true` if `v` refers into this mesh's vertex arena. The
    /// record may still be a tombstone.
    pub fn contains_vertex(&self, v: VertexHandle) -> bool {
        v.to_usize() < self.vertices.len()
    }

    /// Returns `true` if `he` refers into this mesh's half-edge arena. The
    /// record may still be a tombstone.
    pub fn contains_half_edge(&self, he: HalfEdgeHandle) -> bool {
        he.to_usize() < self.half_edges.len()
    }

    /// Returns `true` if `e` refers into this mesh's edge range. The
    /// records may still be tombstones.
    pub fn contains_edge(&self, e: EdgeHandle) -> bool {
        HalfEdgeHandle::lower_half_of(e).to_usize() < self.half_edges.len()
    }

    /// Returns `true` if `f` refers into this mesh's face arena. The record
    /// may still be a tombstone.
    pub fn contains_face(&self, f: FaceHandle) -> bool {
        f.to_usize() < self.faces.len()
    }

    /// Returns `true` if the vertex is tombstoned. An isolated vertex
    /// answers `true` as well: both states share the same sentinel and are
    /// treated alike by [`clean_up`][Self::clean_up].
    pub fn is_deleted_vertex(&self, v: VertexHandle) -> bool {
        let v = self.check_vertex(v);
        self[v].outgoing.is_none()
    }

    /// Returns `true` if the half edge is tombstoned.
    pub fn is_deleted_half_edge(&self, he: HalfEdgeHandle) -> bool {
        let he = self.check_half_edge(he);
        self[he].target.is_none()
    }

    /// Returns `true` if any half of the edge is tombstoned.
    pub fn is_deleted_edge(&self, e: EdgeHandle) -> bool {
        let lower = self.checked_half_of(e);
        self[lower].target.is_none() || self[lower.twin()].target.is_none()
    }

    /// Returns `true` if the face is tombstoned.
    pub fn is_deleted_face(&self, f: FaceHandle) -> bool {
        let f = self.check_face(f);
        self[f].inner.is_none()
    }

    /// Returns `true` if the vertex is not connected to any edge.
    pub fn is_isolated(&self, v: VertexHandle) -> bool {
        let v = self.check_vertex(v);
        self[v].outgoing.is_none()
    }

    /// Returns `true` if the vertex lies on the boundary. Isolated vertices
    /// count as boundary.
    ///
    /// The mesh keeps an important invariant for exactly this method: the
    /// `outgoing` anchor of a vertex points at a boundary half edge
    /// whenever one exists, so a single lookup answers the question.
    pub fn is_boundary_vertex(&self, v: VertexHandle) -> bool {
        let v = self.check_vertex(v);
        match self[v].outgoing.into_option() {
            None => true,
            Some(outgoing) => self[outgoing].face.is_none(),
        }
    }

    /// Returns `true` if the half edge has no face on its side.
    pub fn is_boundary_half_edge(&self, he: HalfEdgeHandle) -> bool {
        let he = self.check_half_edge(he);
        self[he].face.is_none()
    }

    /// Returns `true` if either half of the edge has no face on its side.
    pub fn is_boundary_edge(&self, e: EdgeHandle) -> bool {
        let lower = self.checked_half_of(e);
        self[lower].face.is_none() || self[lower.twin()].face.is_none()
    }

    /// Returns `true` if any edge of the face lies on the boundary.
    /// Deleted faces answer `false`.
    pub fn is_boundary_face(&self, f: FaceHandle) -> bool {
        let f = self.check_face(f);
        self.circulate_around_face(f).any(|inner| self[inner.twin()].face.is_none())
    }

    /// Returns `true` if any vertex of the face lies on the boundary. This
    /// is a strictly weaker condition than
    /// [`is_boundary_face`][Self::is_boundary_face] having answered `true`.
    /// Deleted faces answer `false`.
    pub fn has_boundary_vertex(&self, f: FaceHandle) -> bool {
        let f = self.check_face(f);
        self.circulate_around_face(f).any(|inner| {
            let v = self.target_of(inner);
            match self[v].outgoing.into_option() {
                None => true,
                Some(outgoing) => self[outgoing].face.is_none(),
            }
        })
    }

    /// Returns `true` if the neighborhood of the vertex is a single fan.
    ///
    /// In manifold configurations this is `true` by construction. Otherwise
    /// the one-ring reachable from the `outgoing` anchor is checked for a
    /// second boundary half edge.
    pub fn is_manifold_vertex(&self, v: VertexHandle) -> bool {
        let v = self.check_vertex(v);
        if C::MANIFOLD {
            return true;
        }

        let start = match self[v].outgoing.into_option() {
            None => return true,
            Some(he) => he,
        };

        // The anchor points at a boundary half edge whenever one exists. If
        // it is interior, the reachable ring is closed.
        if self[start].face.is_some() {
            return true;
        }

        let mut cur = self[start.twin()].next;
        while cur != start {
            if self[cur].face.is_none() {
                return false;
            }
            cur = self[cur.twin()].next;
        }
        true
    }

    /// Returns `true` if every vertex of the mesh is manifold. Constant for
    /// manifold configurations.
    pub fn is_manifold(&self) -> bool {
        if C::MANIFOLD {
            return true;
        }
        (0..self.vertices.len()).all(|i| self.is_manifold_vertex(VertexHandle::from_usize(i)))
    }

    /// Returns whether this mesh maintains the manifold invariant
    /// ([`Config::MANIFOLD`]).
    pub fn is_manifold_config(&self) -> bool {
        C::MANIFOLD
    }
}


// ===============================================================================================
// ===== Payload buffers
// ===============================================================================================

macro_rules! impl_data_buffer {
    (
        $field:ident, $field_mut:ident, $set_fn:ident, $handle_of_fn:ident,
        $ty:ident, $flag:ident, $handle:ty, $kind:literal
    ) => {
        impl<C: Config> HalfEdgeMesh<C> {
            #[doc = concat!("Returns the ", $kind, " payload buffer.")]
            ///
            /// If the configuration does not store this payload kind, the
            /// buffer is empty. Otherwise its length equals the element
            /// count (tombstones included) and the entry at index `i`
            /// belongs to the element with handle index `i`.
            pub fn $field(&self) -> &[C::$ty] {
                &self.$field
            }

            #[doc = concat!("Returns the ", $kind, " payload buffer mutably.")]
            ///
            /// The slice cannot change length, so the lock-step with the
            /// element arena is preserved.
            pub fn $field_mut(&mut self) -> &mut [C::$ty] {
                &mut self.$field
            }

            #[doc = concat!("Replaces the ", $kind, " payload buffer.")]
            ///
            /// The replacement has to have exactly the current length
            /// (contents swap under the existing index mapping). Returns
            /// `false` and leaves the buffer untouched otherwise.
            pub fn $set_fn(&mut self, data: Vec<C::$ty>) -> bool {
                if data.len() == self.$field.len() {
                    self.$field = data;
                    true
                } else {
                    false
                }
            }

            #[doc = concat!(
                "Computes the handle of the ", $kind,
                " the given payload reference belongs to."
            )]
            ///
            /// The reference must point into this mesh's buffer (checked in
            /// debug builds). Returns `None` if the configuration does not
            /// store this payload kind.
            pub fn $handle_of_fn(&self, data: &C::$ty) -> Option<$handle> {
                if !C::$flag || mem::size_of::<C::$ty>() == 0 {
                    return None;
                }

                let base = self.$field.as_ptr() as usize;
                let addr = data as *const C::$ty as usize;
                debug_assert!(
                    addr >= base
                        && addr < base + self.$field.len() * mem::size_of::<C::$ty>(),
                    concat!(
                        "reference passed to `", stringify!($handle_of_fn),
                        "` does not point into this mesh's buffer",
                    ),
                );

                Some(<$handle>::from_usize((addr - base) / mem::size_of::<C::$ty>()))
            }
        }
    };
}

impl_data_buffer!(
    vertex_data, vertex_data_mut, set_vertex_data, vertex_handle_of,
    VertexData, VERTEX_DATA, VertexHandle, "vertex"
);
impl_data_buffer!(
    half_edge_data, half_edge_data_mut, set_half_edge_data, half_edge_handle_of,
    HalfEdgeData, HALF_EDGE_DATA, HalfEdgeHandle, "half-edge"
);
impl_data_buffer!(
    edge_data, edge_data_mut, set_edge_data, edge_handle_of,
    EdgeData, EDGE_DATA, EdgeHandle, "edge"
);
impl_data_buffer!(
    face_data, face_data_mut, set_face_data, face_handle_of,
    FaceData, FACE_DATA, FaceHandle, "face"
);


// ===============================================================================================
// ===== Integrity checking
// ===============================================================================================

impl<C: Config> HalfEdgeMesh<C> {
    /// Checks the internal invariants of the data structure and panics with
    /// a diagnostic if one is violated. A violation is always a bug in this
    /// crate (or memory corruption), never a user error.
    ///
    /// This is linear in the mesh size and intended for tests and
    /// debugging.
    pub fn check_integrity(&self) {
        if self.half_edges.len() % 2 != 0 {
            panic!("bug: odd number of half edges ({})", self.half_edges.len());
        }

        macro_rules! check_data_len {
            ($flag:ident, $field:ident, $expected:expr) => {
                let expected = if C::$flag { $expected } else { 0 };
                if self.$field.len() != expected {
                    panic!(
                        "bug: `{}` has length {} (expected {})",
                        stringify!($field),
                        self.$field.len(),
                        expected,
                    );
                }
            };
        }
        check_data_len!(VERTEX_DATA, vertex_data, self.vertices.len());
        check_data_len!(HALF_EDGE_DATA, half_edge_data, self.half_edges.len());
        check_data_len!(EDGE_DATA, edge_data, self.half_edges.len() / 2);
        check_data_len!(FACE_DATA, face_data, self.faces.len());

        // Check half edges: pairwise deletion, link validity and the
        // next/prev inversion.
        for idx in 0..self.half_edges.len() {
            let heh = HalfEdgeHandle::from_usize(idx);
            let he = &self.half_edges[idx];
            let twin = &self.half_edges[idx ^ 1];

            if he.target.is_none() {
                if twin.target.is_some() {
                    panic!("bug: {:?} is deleted but its twin is not", heh);
                }
                continue;
            }

            if he.target.into_option().map(|v| v.to_usize() >= self.vertices.len()) == Some(true) {
                panic!("bug (broken reference): [{:?}].target does not exist", heh);
            }
            if he.next.to_usize() >= self.half_edges.len() {
                panic!("bug (broken reference): [{:?}].next does not exist", heh);
            }
            if he.prev.to_usize() >= self.half_edges.len() {
                panic!("bug (broken reference): [{:?}].prev does not exist", heh);
            }
            if let Some(f) = he.face.into_option() {
                if f.to_usize() >= self.faces.len() {
                    panic!("bug (broken reference): [{:?}].face does not exist", heh);
                }
            }

            let next = he.next;
            if self.half_edges[next.to_usize()].prev.to_usize() != idx {
                panic!(
                    "bug: [{:?}].next = {:?}, but [{:?}].prev = {:?}",
                    heh,
                    *next,
                    *next,
                    self.half_edges[next.to_usize()].prev,
                );
            }
            let prev = he.prev;
            if self.half_edges[prev.to_usize()].next.to_usize() != idx {
                panic!(
                    "bug: [{:?}].prev = {:?}, but [{:?}].next = {:?}",
                    heh,
                    *prev,
                    *prev,
                    self.half_edges[prev.to_usize()].next,
                );
            }
        }

        // Check faces: `inner` points back and the cycle around the face is
        // closed, consistent and reasonably short.
        for (idx, f) in self.faces.iter().enumerate() {
            let fh = FaceHandle::from_usize(idx);
            let start = match f.inner.into_option() {
                None => continue,
                Some(inner) => inner,
            };
            if start.to_usize() >= self.half_edges.len() {
                panic!("bug (broken reference): [{:?}].inner does not exist", fh);
            }

            let mut steps = 0;
            let mut heh = start;
            loop {
                let he = &self.half_edges[heh.to_usize()];
                if he.target.is_none() {
                    panic!("bug: cycle of {:?} contains deleted {:?}", fh, *heh);
                }
                if he.face.into_option().map(|f| f.to_usize()) != Some(idx) {
                    panic!(
                        "bug: walking the cycle of {:?} reached {:?} with face {:?}",
                        fh,
                        *heh,
                        he.face,
                    );
                }

                steps += 1;
                if steps > self.half_edges.len() {
                    panic!("bug: cycle of {:?} does not close", fh);
                }

                heh = he.next;
                if heh == start {
                    break;
                }
            }
        }

        // Check vertices: the outgoing half edge originates here and, for
        // manifold configurations, the ring has at most one boundary
        // outgoing half edge with the anchor pointing at it.
        for (idx, v) in self.vertices.iter().enumerate() {
            let vh = VertexHandle::from_usize(idx);
            let start = match v.outgoing.into_option() {
                None => continue,
                Some(outgoing) => outgoing,
            };
            if start.to_usize() >= self.half_edges.len() {
                panic!("bug (broken reference): [{:?}].outgoing does not exist", vh);
            }

            let origin = self.half_edges[start.twin().to_usize()].target;
            if origin.into_option().map(|v| v.to_usize()) != Some(idx) {
                panic!(
                    "bug: [{:?}].outgoing = {:?}, but that half edge originates at {:?}",
                    vh,
                    *start,
                    origin,
                );
            }

            if C::MANIFOLD {
                let mut boundary = 0;
                let mut steps = 0;
                let mut heh = start;
                loop {
                    if self.half_edges[heh.to_usize()].face.is_none() {
                        boundary += 1;
                    }

                    steps += 1;
                    if steps > self.half_edges.len() {
                        panic!("bug: ring of {:?} does not close", vh);
                    }

                    heh = self.half_edges[heh.twin().to_usize()].next;
                    if heh == start {
                        break;
                    }
                }

                if boundary > 1 {
                    panic!("bug: {:?} has {} boundary fans in a manifold mesh", vh, boundary);
                }
                if boundary == 1 && self.half_edges[start.to_usize()].face.is_some() {
                    panic!(
                        "bug: [{:?}].outgoing is interior although a boundary half edge exists",
                        vh,
                    );
                }
            }
        }
    }
}
