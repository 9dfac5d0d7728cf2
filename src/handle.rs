//! Typed handles used to refer to mesh elements.
//!
//! All elements of a mesh are stored in contiguous arenas and are referred
//! to by their index in that arena. To avoid accidentally mixing up indices
//! of different element kinds, the index is wrapped in one newtype per
//! kind. The wrappers carry no other information; in particular, a handle
//! does not know which mesh it belongs to.

use std::fmt;


/// The integer type used as index of mesh elements.
#[allow(non_camel_case_types)]
pub type hsize = u32;

/// Types that can be used as handle to a mesh element.
pub trait Handle: 'static + Copy + fmt::Debug + Eq + Ord + std::hash::Hash {
    /// Create a handle from the given index.
    fn new(idx: hsize) -> Self;

    /// Return the index of this handle.
    fn idx(&self) -> hsize;

    /// Create a handle from the given `usize`. Panics if the value does not
    /// fit into `hsize`.
    #[inline(always)]
    fn from_usize(raw: usize) -> Self {
        assert!(raw <= hsize::MAX as usize, "handle index out of `hsize` range");
        Self::new(raw as hsize)
    }

    /// Return the index of this handle as `usize`.
    #[inline(always)]
    fn to_usize(&self) -> usize {
        self.idx() as usize
    }
}

macro_rules! make_handle_type {
    ($(#[$attr:meta])* $name:ident, $short:expr) => {
        $(#[$attr])*
        #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name(hsize);

        impl Handle for $name {
            #[inline(always)]
            fn new(idx: hsize) -> Self {
                $name(idx)
            }

            #[inline(always)]
            fn idx(&self) -> hsize {
                self.0
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
                write!(f, concat!($short, "{}"), self.0)
            }
        }

        // Handles can be stored space-efficiently in `optional::Optioned`:
        // the all-ones index is the niche.
        impl optional::Noned for $name {
            #[inline(always)]
            fn is_none(&self) -> bool {
                self.0 == hsize::MAX
            }
            #[inline(always)]
            fn get_none() -> Self {
                $name(hsize::MAX)
            }
        }

        impl optional::OptEq for $name {
            #[inline(always)]
            fn opt_eq(&self, other: &Self) -> bool {
                self == other
            }
        }
    }
}

make_handle_type!(
    /// A handle referring to a vertex.
    VertexHandle, "V"
);
make_handle_type!(
    /// A handle referring to a face.
    FaceHandle, "F"
);
make_handle_type!(
    /// A handle referring to an edge (the undirected pair of two
    /// half-edges).
    EdgeHandle, "E"
);
make_handle_type!(
    /// A handle referring to a half-edge (one of the two directed halves of
    /// an edge).
    HalfEdgeHandle, "HE"
);

// The two half-edges of an edge are always stored next to one another, at
// the indices `2k` and `2k + 1`. This makes the edge handle space
// contiguous and turns all conversions between the two handle kinds into a
// shift or a bit flip.
impl HalfEdgeHandle {
    /// Returns the half-edge of `edge` with the lower index value.
    ///
    /// This method does not check whether the half-edge actually exists.
    #[inline(always)]
    pub fn lower_half_of(edge: EdgeHandle) -> Self {
        Self(edge.idx() * 2)
    }

    /// Returns the half-edge of `edge` with the higher index value.
    ///
    /// This method does not check whether the half-edge actually exists.
    #[inline(always)]
    pub fn upper_half_of(edge: EdgeHandle) -> Self {
        Self(edge.idx() * 2 + 1)
    }

    /// Returns the full edge this half-edge belongs to.
    #[inline(always)]
    pub fn full_edge(self) -> EdgeHandle {
        EdgeHandle::new(self.0 / 2)
    }
}

impl EdgeHandle {
    /// Returns the handles of the two half-edges of this edge, lower index
    /// first.
    #[inline(always)]
    pub fn half_edges(self) -> [HalfEdgeHandle; 2] {
        [HalfEdgeHandle::lower_half_of(self), HalfEdgeHandle::upper_half_of(self)]
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edge_half_edge_conversion() {
        let e = EdgeHandle::new(3);
        assert_eq!(HalfEdgeHandle::lower_half_of(e).idx(), 6);
        assert_eq!(HalfEdgeHandle::upper_half_of(e).idx(), 7);
        assert_eq!(HalfEdgeHandle::new(6).full_edge(), e);
        assert_eq!(HalfEdgeHandle::new(7).full_edge(), e);
        assert_eq!(e.half_edges(), [HalfEdgeHandle::new(6), HalfEdgeHandle::new(7)]);
    }

    #[test]
    fn debug_repr() {
        assert_eq!(format!("{:?}", VertexHandle::new(5)), "V5");
        assert_eq!(format!("{:?}", FaceHandle::new(0)), "F0");
        assert_eq!(format!("{:?}", EdgeHandle::new(1)), "E1");
        assert_eq!(format!("{:?}", HalfEdgeHandle::new(2)), "HE2");
    }
}
