//! A half-edge mesh data structure for polygon meshes.
//!
//! This crate implements a *half-edge mesh* (also known as doubly connected
//! edge list): a data structure storing the connectivity of a polygon mesh
//! in a way that allows answering all local adjacency queries in time
//! proportional to the size of the answer. Every undirected edge is stored
//! as two oppositely oriented *half-edges*; each half-edge knows the vertex
//! it points to, the face it belongs to (if any) and its successor and
//! predecessor around that face.
//!
//! The mesh is purely topological: it does not store vertex positions or
//! any other geometric quantity. Instead, each element kind (vertex,
//! half-edge, edge, face) can optionally carry a user supplied payload in a
//! buffer parallel to the connectivity arena. See [`Config`] for how to
//! enable payloads and how to choose between the *manifold* and
//! *non-manifold* flavor of the data structure.
//!
//!
//! # Quick example
//!
//! ```
//! use hemesh::{HalfEdgeMesh, ManifoldConfig};
//!
//! let mut mesh = <HalfEdgeMesh<ManifoldConfig>>::new();
//! let va = mesh.add_vertex();
//! let vb = mesh.add_vertex();
//! let vc = mesh.add_vertex();
//!
//! let f = mesh.add_face(&[va, vb, vc]).unwrap();
//! assert_eq!(mesh.num_faces(), 1);
//! assert_eq!(mesh.num_edges(), 3);
//! assert!(mesh.is_boundary_face(f));
//! ```
//!
//!
//! # Elements, handles and deletion
//!
//! Mesh elements live in arenas and are referred to by typed handles
//! ([`VertexHandle`], [`HalfEdgeHandle`], [`EdgeHandle`], [`FaceHandle`]).
//! Handles are stable across all mutations except [`clean_up`]: deleting an
//! element only marks it as deleted in place. `clean_up` then compacts all
//! arenas, which invalidates every handle obtained before the call.
//!
//! [`clean_up`]: HalfEdgeMesh::clean_up

#![warn(missing_debug_implementations)]

pub mod handle;
pub mod core;

pub use leer::Empty;

pub use crate::{
    handle::{hsize, Handle, VertexHandle, HalfEdgeHandle, EdgeHandle, FaceHandle},
    core::{
        FaceKind, TriFaces, QuadFaces, PolyFaces,
        half_edge::{Config, HalfEdgeMesh, ManifoldConfig, NonManifoldConfig},
    },
};


pub(crate) mod sealed {
    pub trait Sealed {}
}
