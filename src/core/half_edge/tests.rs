use crate::{
    Handle,
    handle::{VertexHandle, HalfEdgeHandle, EdgeHandle, FaceHandle},
    core::{TriFaces, QuadFaces, PolyFaces},
};
use super::{Config, HalfEdgeMesh, ManifoldConfig, NonManifoldConfig};


// ===============================================================================================
// ===== Test helpers
// ===============================================================================================

/// Counts the elements that are actually alive (not tombstoned).
fn live_counts<C: Config>(m: &HalfEdgeMesh<C>) -> (usize, usize, usize) {
    let vertices = (0..m.num_vertices())
        .filter(|&i| !m.is_deleted_vertex(VertexHandle::from_usize(i)))
        .count();
    let half_edges = (0..m.num_half_edges())
        .filter(|&i| !m.is_deleted_half_edge(HalfEdgeHandle::from_usize(i)))
        .count();
    let faces = (0..m.num_faces())
        .filter(|&i| !m.is_deleted_face(FaceHandle::from_usize(i)))
        .count();
    (vertices, half_edges, faces)
}

/// Asserts that `actual` is a rotation of `expected` (circulators may start
/// anywhere in the neighborhood).
#[track_caller]
fn assert_rotated_eq<T: PartialEq + Copy + std::fmt::Debug>(actual: Vec<T>, expected: &[T]) {
    assert_eq!(actual.len(), expected.len(), "{:?} vs {:?}", actual, expected);
    if expected.is_empty() {
        return;
    }

    let offset = match actual.iter().position(|x| *x == expected[0]) {
        Some(offset) => offset,
        None => panic!("{:?} is not a rotation of {:?}", actual, expected),
    };
    for i in 0..expected.len() {
        assert_eq!(
            actual[(offset + i) % actual.len()],
            expected[i],
            "{:?} is not a rotation of {:?}",
            actual,
            expected,
        );
    }
}


// ===============================================================================================
// ===== Tests shared by the manifold and the non-manifold configuration
// ===============================================================================================

macro_rules! gen_mesh_tests {
    ($config:ty) => {
        use super::*;

        #[test]
        fn empty_mesh() {
            let m = <HalfEdgeMesh<$config>>::new();

            assert!(m.is_empty());
            assert_eq!(m.num_vertices(), 0);
            assert_eq!(m.num_half_edges(), 0);
            assert_eq!(m.num_edges(), 0);
            assert_eq!(m.num_faces(), 0);
            assert!(m.is_manifold());
            m.check_integrity();
        }

        #[test]
        fn single_vertex() {
            let mut m = <HalfEdgeMesh<$config>>::new();
            let v = m.add_vertex();
            m.check_integrity();

            assert_eq!(m.num_vertices(), 1);
            assert!(m.contains_vertex(v));
            assert!(m.is_isolated(v));
            assert!(m.is_boundary_vertex(v));
            assert_eq!(m.outgoing_half_edge(v), None);
            assert_eq!(m.incoming_half_edge(v), None);
            assert_eq!(m.vertices_around_vertex(v).count(), 0);
            assert_eq!(m.faces_around_vertex(v).count(), 0);
        }

        #[test]
        fn delete_isolated_vertex_then_clean_up() {
            // A deleted isolated vertex must leave no trace behind.
            let mut m = <HalfEdgeMesh<$config>>::new();
            let v = m.add_vertex();
            m.delete_vertex(v);
            m.check_integrity();
            m.clean_up();
            m.check_integrity();

            assert!(m.is_empty());
        }

        #[test]
        fn single_triangle() {
            //
            //         (C)
            //        /   \
            //       /     \
            //      /       \
            //    (A) ----- (B)
            //
            let mut m = <HalfEdgeMesh<$config>>::new();
            let va = m.add_vertex();
            let vb = m.add_vertex();
            let vc = m.add_vertex();
            let f = m.add_face(&[va, vb, vc]).unwrap();
            m.check_integrity();

            assert_eq!(m.num_vertices(), 3);
            assert_eq!(m.num_half_edges(), 6);
            assert_eq!(m.num_edges(), 3);
            assert_eq!(m.num_faces(), 1);
            assert!(m.is_manifold());

            // Everything is on the boundary.
            for &v in &[va, vb, vc] {
                assert!(m.is_boundary_vertex(v));
                assert!(!m.is_isolated(v));
                assert!(m.is_manifold_vertex(v));
            }
            for e in 0..3 {
                assert!(m.is_boundary_edge(EdgeHandle::from_usize(e)));
            }
            assert!(m.is_boundary_face(f));
            assert!(m.has_boundary_vertex(f));

            // Twins are each other's opposite and pair up to full edges.
            for i in 0..6 {
                let he = HalfEdgeHandle::from_usize(i);
                assert_eq!(m.opposite(m.opposite(he)), he);
                assert_eq!(m.opposite(he).idx(), he.idx() ^ 1);
                assert_eq!(m.opposite(he).full_edge(), he.full_edge());
            }

            // Face cycle: three steps of `next` return to the start, `prev`
            // inverts.
            let start = m.inner_half_edge(f).unwrap();
            let mut he = start;
            for _ in 0..3 {
                assert_eq!(m.face(he), Some(f));
                assert_eq!(m.prev(m.next(he)), he);
                he = m.next(he);
            }
            assert_eq!(he, start);

            // Circulators close after the local degree.
            assert_rotated_eq(m.vertices_around_face(f).collect(), &[va, vb, vc]);
            assert_rotated_eq(m.vertices_around_vertex(va).collect(), &[vc, vb]);
            assert_rotated_eq(m.vertices_around_vertex(vb).collect(), &[va, vc]);
            assert_rotated_eq(m.vertices_around_vertex(vc).collect(), &[vb, va]);
            assert_eq!(m.faces_around_vertex(va).collect::<Vec<_>>(), vec![f]);
            assert_eq!(m.inner_half_edges_around_face(f).count(), 3);
            assert_eq!(m.outer_half_edges_around_face(f).count(), 3);
            assert_eq!(m.faces_around_face(f).count(), 0);

            // Reverse iteration steps through the same cycle backwards.
            let forward: Vec<_> = m.vertices_around_vertex(va).collect();
            let mut backward: Vec<_> = m.vertices_around_vertex(va).rev().collect();
            backward.reverse();
            assert_eq!(forward, backward);

            // The from-variants start exactly where they are told.
            let out = m.outgoing_half_edge(va).unwrap();
            assert_eq!(
                m.outgoing_half_edges_around_vertex_from(out).next(),
                Some(out),
            );
            assert_eq!(
                m.vertices_around_face_from(start).next(),
                Some(m.terminating_vertex(start).unwrap()),
            );

            // Connectivity queries are consistent with each other.
            assert_eq!(m.outer_half_edge(f), Some(m.opposite(start)));
            assert_eq!(
                m.originating_vertex(out),
                Some(va),
            );
            assert_eq!(m.opposite_face(m.opposite(start)), Some(f));

            // A no-op clean up keeps everything.
            m.clean_up();
            m.check_integrity();
            assert_eq!(m.num_vertices(), 3);
            assert_eq!(m.num_half_edges(), 6);
            assert_eq!(m.num_faces(), 1);
        }

        #[test]
        fn two_triangles_sharing_an_edge() {
            //
            //         (C) ----- (D)
            //        /   \  Y  /
            //       /  X  \   /
            //      /       \ /
            //    (A) ----- (B)
            //
            let mut m = <HalfEdgeMesh<$config>>::new();
            let va = m.add_vertex();
            let vb = m.add_vertex();
            let vc = m.add_vertex();
            let fx = m.add_face(&[va, vb, vc]).unwrap();
            let vd = m.add_vertex();
            let fy = m.add_face(&[vc, vb, vd]).unwrap();
            m.check_integrity();

            assert_eq!(m.num_vertices(), 4);
            assert_eq!(m.num_half_edges(), 10);
            assert_eq!(m.num_edges(), 5);
            assert_eq!(m.num_faces(), 2);
            assert!(m.is_manifold());

            // The shared edge is the only interior one.
            let shared = m.outgoing_half_edges_around_vertex(vb)
                .find(|&he| m.terminating_vertex(he) == Some(vc))
                .unwrap();
            assert!(!m.is_boundary_edge(shared.full_edge()));
            assert_eq!(
                (0..5).filter(|&e| m.is_boundary_edge(EdgeHandle::from_usize(e))).count(),
                4,
            );

            // `vb` and `vc` have degree 3 now.
            assert_eq!(m.vertices_around_vertex(vb).count(), 3);
            assert_eq!(m.vertices_around_vertex(vc).count(), 3);
            assert_rotated_eq(m.vertices_around_vertex(vb).collect(), &[va, vc, vd]);

            assert_eq!(m.faces_around_face(fx).collect::<Vec<_>>(), vec![fy]);
            assert_eq!(m.faces_around_face(fy).collect::<Vec<_>>(), vec![fx]);
            assert_rotated_eq(m.faces_around_vertex(vb).collect(), &[fy, fx]);

            assert!(m.is_boundary_face(fx));
            assert!(m.is_boundary_face(fy));
        }

        #[test]
        fn add_face_rejects_bad_input() {
            let mut m = <HalfEdgeMesh<$config>>::new();
            let va = m.add_vertex();
            let vb = m.add_vertex();
            let vc = m.add_vertex();
            m.add_face(&[va, vb, vc]).unwrap();
            let before = format!("{:?}", m);

            // Too few vertices.
            assert_eq!(m.add_face(&[va, vb]), None);
            assert_eq!(m.add_face(&[]), None);
            // Duplicated vertex.
            assert_eq!(m.add_face(&[va, vb, va]), None);
            // Out of bounds handle.
            assert_eq!(m.add_face(&[va, vb, VertexHandle::from_usize(80)]), None);

            // A failed insertion leaves no trace.
            assert_eq!(format!("{:?}", m), before);
            m.check_integrity();
        }

        #[test]
        fn add_face_rejects_interior_edge() {
            // Both sides of the edge B -> C already carry a face, so no
            // face can use that edge again, in either direction.
            let mut m = <HalfEdgeMesh<$config>>::new();
            let va = m.add_vertex();
            let vb = m.add_vertex();
            let vc = m.add_vertex();
            m.add_face(&[va, vb, vc]).unwrap();
            let vd = m.add_vertex();
            m.add_face(&[vc, vb, vd]).unwrap();
            let ve = m.add_vertex();
            let before = format!("{:?}", m);

            assert_eq!(m.add_face(&[vb, vc, ve]), None);
            assert_eq!(m.add_face(&[vc, vb, ve]), None);
            assert_eq!(format!("{:?}", m), before);
            m.check_integrity();
        }

        #[test]
        fn tetrahedron() {
            // A closed surface: every edge is interior, Euler characteristic
            // V - E + F = 2.
            let mut m = <HalfEdgeMesh<$config>>::new();
            let v0 = m.add_vertex();
            let v1 = m.add_vertex();
            let v2 = m.add_vertex();
            let v3 = m.add_vertex();
            let f0 = m.add_face(&[v0, v1, v2]).unwrap();
            m.check_integrity();
            let f1 = m.add_face(&[v0, v2, v3]).unwrap();
            m.check_integrity();
            let f2 = m.add_face(&[v0, v3, v1]).unwrap();
            m.check_integrity();
            let f3 = m.add_face(&[v1, v3, v2]).unwrap();
            m.check_integrity();

            assert_eq!(m.num_vertices(), 4);
            assert_eq!(m.num_edges(), 6);
            assert_eq!(m.num_faces(), 4);
            assert!(m.is_manifold());

            for e in 0..6 {
                assert!(!m.is_boundary_edge(EdgeHandle::from_usize(e)));
            }
            for &v in &[v0, v1, v2, v3] {
                assert!(!m.is_boundary_vertex(v));
                assert_eq!(m.vertices_around_vertex(v).count(), 3);
                assert_eq!(m.faces_around_vertex(v).count(), 3);
            }
            for &f in &[f0, f1, f2, f3] {
                assert!(!m.is_boundary_face(f));
                assert!(!m.has_boundary_vertex(f));
                assert_eq!(m.faces_around_face(f).count(), 3);
            }
        }

        #[test]
        fn tetrahedron_deletions() {
            let mut m = <HalfEdgeMesh<$config>>::new();
            let v0 = m.add_vertex();
            let v1 = m.add_vertex();
            let v2 = m.add_vertex();
            let v3 = m.add_vertex();
            let f0 = m.add_face(&[v0, v1, v2]).unwrap();
            let f1 = m.add_face(&[v0, v2, v3]).unwrap();
            let f2 = m.add_face(&[v0, v3, v1]).unwrap();
            let f3 = m.add_face(&[v1, v3, v2]).unwrap();

            // Opening the closed surface does not cascade: the three
            // neighbors stay, the lid's vertices become boundary, the
            // opposite vertex stays interior.
            m.delete_face(f3);
            m.check_integrity();

            assert!(m.is_deleted_face(f3));
            assert_eq!(live_counts(&m).2, 3);
            for &v in &[v1, v2, v3] {
                assert!(m.is_boundary_vertex(v));
            }
            assert!(!m.is_boundary_vertex(v0));
            assert!(m.is_manifold());
            assert_eq!(
                (0..6).filter(|&e| m.is_boundary_edge(EdgeHandle::from_usize(e))).count(),
                3,
            );

            // Deleting a second face eats the shared edge but cannot pinch
            // anything: two triangles sharing one edge remain.
            m.delete_face(f2);
            m.check_integrity();

            assert!(m.is_deleted_face(f2));
            let (vertices, half_edges, faces) = live_counts(&m);
            assert_eq!(vertices, 4);
            assert_eq!(half_edges, 10);
            assert_eq!(faces, 2);
            assert!(m.is_manifold());
            assert!(!m.is_deleted_face(f0));
            assert!(!m.is_deleted_face(f1));
            assert!(m.is_boundary_face(f0));
            assert!(m.is_boundary_face(f1));
            assert_eq!(m.faces_around_face(f0).collect::<Vec<_>>(), vec![f1]);

            m.clean_up();
            m.check_integrity();
            assert_eq!(m.num_vertices(), 4);
            assert_eq!(m.num_edges(), 5);
            assert_eq!(m.num_faces(), 2);
        }

        #[test]
        fn delete_edge_tears_down_faces() {
            let mut m = <HalfEdgeMesh<$config>>::new();
            let va = m.add_vertex();
            let vb = m.add_vertex();
            let vc = m.add_vertex();
            m.add_face(&[va, vb, vc]).unwrap();

            // Any edge of a lone triangle takes the face and, transitively,
            // everything else with it.
            m.delete_edge(EdgeHandle::from_usize(0));
            m.check_integrity();

            let (vertices, half_edges, faces) = live_counts(&m);
            assert_eq!((vertices, half_edges, faces), (0, 0, 0));

            m.clean_up();
            m.check_integrity();
            assert!(m.is_empty());
        }

        #[test]
        fn delete_edge_of_half_edge_matches_delete_edge() {
            let mut m1 = <HalfEdgeMesh<$config>>::new();
            let mut m2 = <HalfEdgeMesh<$config>>::new();
            for m in [&mut m1, &mut m2] {
                let va = m.add_vertex();
                let vb = m.add_vertex();
                let vc = m.add_vertex();
                let vd = m.add_vertex();
                m.add_face(&[va, vb, vc]).unwrap();
                m.add_face(&[vc, vb, vd]).unwrap();
            }

            let e = EdgeHandle::from_usize(1);
            m1.delete_edge(e);
            m2.delete_edge_of(HalfEdgeHandle::lower_half_of(e));
            m1.check_integrity();

            assert_eq!(format!("{:?}", m1), format!("{:?}", m2));
        }

        #[test]
        fn delete_vertex_removes_incident_faces() {
            let mut m = <HalfEdgeMesh<$config>>::new();
            let va = m.add_vertex();
            let vb = m.add_vertex();
            let vc = m.add_vertex();
            let vd = m.add_vertex();
            m.add_face(&[va, vb, vc]).unwrap();
            let fy = m.add_face(&[vc, vb, vd]).unwrap();

            m.delete_vertex(va);
            m.check_integrity();

            assert!(m.is_deleted_vertex(va));
            assert!(!m.is_deleted_face(fy));
            let (vertices, _, faces) = live_counts(&m);
            assert_eq!(vertices, 3);
            assert_eq!(faces, 1);

            // Deleting again is a no-op.
            m.delete_vertex(va);
            m.check_integrity();

            m.clean_up();
            m.check_integrity();
            assert_eq!(m.num_vertices(), 3);
            assert_eq!(m.num_faces(), 1);
        }

        #[test]
        fn clean_up_is_idempotent() {
            let mut m = <HalfEdgeMesh<$config>>::new();
            let va = m.add_vertex();
            let vb = m.add_vertex();
            let vc = m.add_vertex();
            let vd = m.add_vertex();
            let fx = m.add_face(&[va, vb, vc]).unwrap();
            m.add_face(&[vc, vb, vd]).unwrap();
            m.delete_face(fx);

            m.clean_up();
            m.check_integrity();
            let after_first = format!("{:?}", m);

            m.clean_up();
            m.check_integrity();
            assert_eq!(format!("{:?}", m), after_first);
        }

        #[test]
        fn delete_then_clean_up_equals_never_added() {
            // An isolated vertex that is added and deleted again leaves the
            // mesh exactly as if `add_vertex` had never been called.
            let mut m1 = <HalfEdgeMesh<$config>>::new();
            let mut m2 = <HalfEdgeMesh<$config>>::new();
            for m in [&mut m1, &mut m2] {
                let va = m.add_vertex();
                let vb = m.add_vertex();
                let vc = m.add_vertex();
                m.add_face(&[va, vb, vc]).unwrap();
            }

            let extra = m1.add_vertex();
            m1.delete_vertex(extra);
            m1.clean_up();
            m2.clean_up();
            m1.check_integrity();

            assert_eq!(format!("{:?}", m1), format!("{:?}", m2));
        }

        #[test]
        fn clear_removes_everything() {
            let mut m = <HalfEdgeMesh<$config>>::new();
            let va = m.add_vertex();
            let vb = m.add_vertex();
            let vc = m.add_vertex();
            m.add_face(&[va, vb, vc]).unwrap();

            m.clear();
            m.check_integrity();
            assert!(m.is_empty());
            assert_eq!(m.num_half_edges(), 0);
        }

        #[test]
        fn reserve_and_resize() {
            let mut m = <HalfEdgeMesh<$config>>::new();
            m.reserve_vertices(10);
            m.reserve_edges(10);
            m.reserve_faces(10);
            assert!(m.is_empty());

            // Records created by resize are tombstones and vanish at the
            // next clean up.
            m.resize_vertices(4);
            m.resize_edges(2);
            m.resize_faces(1);
            assert_eq!(m.num_vertices(), 4);
            assert_eq!(m.num_half_edges(), 4);
            assert_eq!(m.num_edges(), 2);
            assert_eq!(m.num_faces(), 1);
            assert!(m.is_deleted_vertex(VertexHandle::from_usize(0)));
            assert!(m.is_deleted_edge(EdgeHandle::from_usize(1)));
            assert!(m.is_deleted_face(FaceHandle::from_usize(0)));

            m.clean_up();
            m.check_integrity();
            assert!(m.is_empty());
        }
    };
}

mod manifold {
    gen_mesh_tests!(ManifoldConfig);
}

mod non_manifold {
    gen_mesh_tests!(NonManifoldConfig);
}


// ===============================================================================================
// ===== Manifold-only behavior
// ===============================================================================================

#[test]
fn manifold_rejects_butterfly() {
    // Two triangles sharing only the center vertex would pinch it:
    //
    //    (1)      (3)
    //     | \    / |
    //     |  (0)'  |
    //     | /    \ |
    //    (2)      (4)
    //
    let mut m = <HalfEdgeMesh<ManifoldConfig>>::new();
    let v0 = m.add_vertex();
    let v1 = m.add_vertex();
    let v2 = m.add_vertex();
    let v3 = m.add_vertex();
    let v4 = m.add_vertex();
    m.add_face(&[v0, v1, v2]).unwrap();
    let before = format!("{:?}", m);

    assert_eq!(m.add_face(&[v0, v3, v4]), None);

    assert_eq!(format!("{:?}", m), before);
    m.check_integrity();
    assert!(m.is_manifold());
    assert_eq!(live_counts(&m), (5, 6, 1));
}

#[test]
fn manifold_fan_delete_middle_cascades() {
    // An open fan of three triangles around (0). Deleting the middle face
    // would leave two disconnected fans at (0), so the deletion cascades
    // onto a neighbor until (0) is manifold again.
    //
    //    (1) --- (2) --- (3) --- (4)
    //       \     |       |     /
    //         \   |       |   /
    //           \ |       | /
    //            (0) -----'
    //
    let mut m = <HalfEdgeMesh<ManifoldConfig>>::new();
    let v0 = m.add_vertex();
    let v1 = m.add_vertex();
    let v2 = m.add_vertex();
    let v3 = m.add_vertex();
    let v4 = m.add_vertex();
    let f0 = m.add_face(&[v0, v1, v2]).unwrap();
    let f1 = m.add_face(&[v0, v2, v3]).unwrap();
    let f2 = m.add_face(&[v0, v3, v4]).unwrap();
    m.check_integrity();
    assert!(m.is_boundary_vertex(v0));

    m.delete_face(f1);
    m.check_integrity();

    // The middle face and one neighbor are gone, one triangle survives.
    assert!(m.is_deleted_face(f1));
    assert!(m.is_deleted_face(f0) != m.is_deleted_face(f2));
    let (_, _, faces) = live_counts(&m);
    assert_eq!(faces, 1);
    assert!(m.is_manifold());
    assert!(m.is_boundary_vertex(v0));

    m.clean_up();
    m.check_integrity();
    assert_eq!(m.num_vertices(), 3);
    assert_eq!(m.num_edges(), 3);
    assert_eq!(m.num_faces(), 1);
}

#[test]
fn manifold_fan_delete_end_face_does_not_cascade() {
    let mut m = <HalfEdgeMesh<ManifoldConfig>>::new();
    let v0 = m.add_vertex();
    let v1 = m.add_vertex();
    let v2 = m.add_vertex();
    let v3 = m.add_vertex();
    let v4 = m.add_vertex();
    let f0 = m.add_face(&[v0, v1, v2]).unwrap();
    let f1 = m.add_face(&[v0, v2, v3]).unwrap();
    let f2 = m.add_face(&[v0, v3, v4]).unwrap();

    // The first face of the fan only touches the boundary, its removal
    // cannot pinch anything.
    m.delete_face(f0);
    m.check_integrity();

    assert!(!m.is_deleted_face(f1));
    assert!(!m.is_deleted_face(f2));
    assert_eq!(live_counts(&m).2, 2);
    assert!(m.is_manifold());
    assert!(m.is_boundary_vertex(v0));

    m.clean_up();
    m.check_integrity();
    assert_eq!(m.num_vertices(), 4);
    assert_eq!(m.num_faces(), 2);
}

#[test]
fn manifold_delete_center_vertex_of_fan() {
    let mut m = <HalfEdgeMesh<ManifoldConfig>>::new();
    let v0 = m.add_vertex();
    let v1 = m.add_vertex();
    let v2 = m.add_vertex();
    let v3 = m.add_vertex();
    let v4 = m.add_vertex();
    m.add_face(&[v0, v1, v2]).unwrap();
    m.add_face(&[v0, v2, v3]).unwrap();
    m.add_face(&[v0, v3, v4]).unwrap();

    // All faces touch (0), so everything goes; the rim vertices end up
    // isolated and are collected by the clean up.
    m.delete_vertex(v0);
    m.check_integrity();
    assert_eq!(live_counts(&m), (0, 0, 0));

    m.clean_up();
    m.check_integrity();
    assert!(m.is_empty());
}


// ===============================================================================================
// ===== Non-manifold-only behavior
// ===============================================================================================

#[test]
fn non_manifold_allows_butterfly() {
    let mut m = <HalfEdgeMesh<NonManifoldConfig>>::new();
    let v0 = m.add_vertex();
    let v1 = m.add_vertex();
    let v2 = m.add_vertex();
    let v3 = m.add_vertex();
    let v4 = m.add_vertex();
    let f0 = m.add_face(&[v0, v1, v2]).unwrap();
    let f1 = m.add_face(&[v0, v3, v4]).unwrap();
    m.check_integrity();

    assert_eq!(m.num_vertices(), 5);
    assert_eq!(m.num_edges(), 6);
    assert_eq!(m.num_faces(), 2);

    // The center vertex carries two fans now.
    assert!(!m.is_manifold_vertex(v0));
    assert!(!m.is_manifold());
    for &v in &[v1, v2, v3, v4] {
        assert!(m.is_manifold_vertex(v));
    }

    // The cycle around (0) contains both blades.
    assert_eq!(m.outgoing_half_edges_around_vertex(v0).count(), 4);
    assert_rotated_eq(m.faces_around_vertex(v0).collect(), &[f0, f1]);

    // The edge lookup walks all blades: both existing edges are found and
    // reusing them with a face on the free side works.
    let vx = m.add_vertex();
    assert_eq!(m.add_face(&[v2, v1, vx]).unwrap().idx(), 2);
    m.check_integrity();
}

#[test]
fn non_manifold_fan_delete_middle_keeps_neighbors() {
    // Same fan as in the manifold test, but here the pinch at (0) is
    // allowed: both neighbors survive and (0) stays on the boundary.
    let mut m = <HalfEdgeMesh<NonManifoldConfig>>::new();
    let v0 = m.add_vertex();
    let v1 = m.add_vertex();
    let v2 = m.add_vertex();
    let v3 = m.add_vertex();
    let v4 = m.add_vertex();
    let f0 = m.add_face(&[v0, v1, v2]).unwrap();
    let f1 = m.add_face(&[v0, v2, v3]).unwrap();
    let f2 = m.add_face(&[v0, v3, v4]).unwrap();
    assert!(m.is_boundary_vertex(v0));

    m.delete_face(f1);
    m.check_integrity();

    assert!(m.is_deleted_face(f1));
    assert!(!m.is_deleted_face(f0));
    assert!(!m.is_deleted_face(f2));
    assert!(m.is_boundary_vertex(v0));
    assert!(!m.is_manifold_vertex(v0));

    m.clean_up();
    m.check_integrity();
    assert_eq!(m.num_vertices(), 5);
    assert_eq!(m.num_faces(), 2);
}

#[test]
fn non_manifold_closing_tetrahedron() {
    // Exercises the old-old stitching including the anchor rotation when a
    // vertex becomes interior.
    let mut m = <HalfEdgeMesh<NonManifoldConfig>>::new();
    let v0 = m.add_vertex();
    let v1 = m.add_vertex();
    let v2 = m.add_vertex();
    let v3 = m.add_vertex();
    m.add_face(&[v0, v1, v2]).unwrap();
    m.add_face(&[v0, v2, v3]).unwrap();
    m.add_face(&[v0, v3, v1]).unwrap();
    m.add_face(&[v1, v3, v2]).unwrap();
    m.check_integrity();

    assert_eq!(m.num_edges(), 6);
    assert_eq!(m.num_faces(), 4);
    assert!(m.is_manifold());
    for &v in &[v0, v1, v2, v3] {
        assert!(!m.is_boundary_vertex(v));
    }
}


// ===============================================================================================
// ===== Face kind restrictions
// ===============================================================================================

enum TriOnly {}
impl Config for TriOnly {
    type FaceKind = TriFaces;
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

enum QuadOnly {}
impl Config for QuadOnly {
    type FaceKind = QuadFaces;
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

#[test]
fn face_kind_restricts_valence() {
    let mut tri = <HalfEdgeMesh<TriOnly>>::new();
    let vs: Vec<_> = (0..4).map(|_| tri.add_vertex()).collect();
    assert_eq!(tri.add_face(&[vs[0], vs[1], vs[2], vs[3]]), None);
    assert!(tri.add_face(&[vs[0], vs[1], vs[2]]).is_some());
    tri.check_integrity();

    let mut quad = <HalfEdgeMesh<QuadOnly>>::new();
    let vs: Vec<_> = (0..4).map(|_| quad.add_vertex()).collect();
    assert_eq!(quad.add_face(&[vs[0], vs[1], vs[2]]), None);
    assert!(quad.add_face(&[vs[0], vs[1], vs[2], vs[3]]).is_some());
    quad.check_integrity();
    assert_eq!(quad.num_edges(), 4);
    assert_eq!(quad.vertices_around_face(FaceHandle::from_usize(0)).count(), 4);
}

#[test]
fn polygon_faces() {
    let mut m = <HalfEdgeMesh<ManifoldConfig>>::new();
    let vs: Vec<_> = (0..6).map(|_| m.add_vertex()).collect();
    let f = m.add_face(&vs).unwrap();
    m.check_integrity();

    assert_eq!(m.num_edges(), 6);
    assert_eq!(m.vertices_around_face(f).count(), 6);
    assert!(m.is_boundary_face(f));

    m.delete_face(f);
    m.check_integrity();
    m.clean_up();
    assert!(m.is_empty());
}


// ===============================================================================================
// ===== Payload buffers
// ===============================================================================================

enum WithData {}
impl Config for WithData {
    type FaceKind = PolyFaces;
    const MANIFOLD: bool = true;

    type VertexData = u32;
    type HalfEdgeData = u8;
    type EdgeData = u16;
    type FaceData = i32;
    const VERTEX_DATA: bool = true;
    const HALF_EDGE_DATA: bool = true;
    const EDGE_DATA: bool = true;
    const FACE_DATA: bool = true;
}

#[test]
fn payload_buffers_grow_in_lock_step() {
    let mut m = <HalfEdgeMesh<WithData>>::new();
    let va = m.add_vertex_with(10);
    let vb = m.add_vertex_with(11);
    let vc = m.add_vertex_with(12);
    let f = m.add_face_with(&[va, vb, vc], -1, 7, 3).unwrap();
    m.check_integrity();

    assert_eq!(m.vertex_data(), &[10, 11, 12]);
    assert_eq!(m.half_edge_data(), &[3; 6]);
    assert_eq!(m.edge_data(), &[7, 7, 7]);
    assert_eq!(m.face_data(), &[-1]);

    // Reusing existing edges only adds payload for the new ones.
    let vd = m.add_vertex_with(13);
    m.add_face_with(&[vc, vb, vd], -2, 8, 4).unwrap();
    m.check_integrity();

    assert_eq!(m.edge_data(), &[7, 7, 7, 8, 8]);
    assert_eq!(m.half_edge_data(), &[3, 3, 3, 3, 3, 3, 4, 4, 4, 4]);
    assert_eq!(m.face_data(), &[-1, -2]);
    let _ = f;
}

#[test]
fn payload_compaction_keeps_pairing() {
    let mut m = <HalfEdgeMesh<WithData>>::new();
    let va = m.add_vertex_with(10);
    let vb = m.add_vertex_with(11);
    let vc = m.add_vertex_with(12);
    let fx = m.add_face_with(&[va, vb, vc], -1, 7, 3).unwrap();
    let vd = m.add_vertex_with(13);
    m.add_face_with(&[vc, vb, vd], -2, 8, 4).unwrap();

    // Deleting the first face drops (A) and its two boundary edges; the
    // shared edge stays alive.
    m.delete_face(fx);
    m.check_integrity();
    m.clean_up();
    m.check_integrity();

    assert_eq!(m.num_vertices(), 3);
    assert_eq!(m.num_edges(), 3);
    assert_eq!(m.num_faces(), 1);
    assert_eq!(m.vertex_data(), &[11, 12, 13]);
    // One edge of the first batch survives (the then-shared one).
    assert_eq!(m.edge_data(), &[7, 8, 8]);
    assert_eq!(m.half_edge_data(), &[3, 3, 4, 4, 4, 4]);
    assert_eq!(m.face_data(), &[-2]);
}

#[test]
fn set_payload_requires_equal_length() {
    let mut m = <HalfEdgeMesh<WithData>>::new();
    let va = m.add_vertex_with(1);
    let vb = m.add_vertex_with(2);
    let vc = m.add_vertex_with(3);
    m.add_face_with(&[va, vb, vc], 0, 0, 0).unwrap();

    assert!(!m.set_vertex_data(vec![7, 8]));
    assert_eq!(m.vertex_data(), &[1, 2, 3]);
    assert!(m.set_vertex_data(vec![7, 8, 9]));
    assert_eq!(m.vertex_data(), &[7, 8, 9]);

    assert!(!m.set_edge_data(vec![0; 2]));
    assert!(m.set_edge_data(vec![5, 5, 5]));
    assert!(!m.set_face_data(vec![]));
    assert!(m.set_face_data(vec![42]));
    assert!(m.set_half_edge_data(vec![9; 6]));
    m.check_integrity();

    // Mutable access cannot change the length, only the contents.
    m.vertex_data_mut()[0] = 100;
    assert_eq!(m.vertex_data()[0], 100);
}

#[test]
fn payload_reverse_lookup() {
    let mut m = <HalfEdgeMesh<WithData>>::new();
    let va = m.add_vertex_with(1);
    let vb = m.add_vertex_with(2);
    let vc = m.add_vertex_with(3);
    m.add_face_with(&[va, vb, vc], -5, 7, 3).unwrap();

    assert_eq!(m.vertex_handle_of(&m.vertex_data()[1]), Some(vb));
    assert_eq!(m.vertex_handle_of(&m.vertex_data()[0]), Some(va));
    assert_eq!(m.edge_handle_of(&m.edge_data()[2]), Some(EdgeHandle::from_usize(2)));
    assert_eq!(
        m.half_edge_handle_of(&m.half_edge_data()[5]),
        Some(HalfEdgeHandle::from_usize(5)),
    );
    assert_eq!(m.face_handle_of(&m.face_data()[0]), Some(FaceHandle::from_usize(0)));
}

#[test]
fn disabled_payload_stays_empty() {
    let mut m = <HalfEdgeMesh<ManifoldConfig>>::new();
    let va = m.add_vertex();
    let vb = m.add_vertex();
    let vc = m.add_vertex();
    m.add_face(&[va, vb, vc]).unwrap();
    m.check_integrity();

    assert!(m.vertex_data().is_empty());
    assert!(m.half_edge_data().is_empty());
    assert!(m.edge_data().is_empty());
    assert!(m.face_data().is_empty());

    // Without a buffer there is no index to recover.
    assert_eq!(m.vertex_handle_of(&()), None);
    assert_eq!(m.face_handle_of(&()), None);

    // A size preserving replacement of an empty buffer is the empty
    // buffer.
    assert!(m.set_vertex_data(vec![]));
    assert!(!m.set_vertex_data(vec![(), ()]));
}

#[test]
fn payload_resize() {
    let mut m = <HalfEdgeMesh<WithData>>::new();
    m.resize_vertices_with(3, 9);
    m.resize_edges_with(2, 4, 5);
    m.resize_faces_with(1, -3);
    m.check_integrity();

    assert_eq!(m.vertex_data(), &[9, 9, 9]);
    assert_eq!(m.edge_data(), &[4, 4]);
    assert_eq!(m.half_edge_data(), &[5, 5, 5, 5]);
    assert_eq!(m.face_data(), &[-3]);

    m.resize_vertices(1);
    assert_eq!(m.vertex_data(), &[9]);
}
