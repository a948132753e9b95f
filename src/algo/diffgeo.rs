//! Differential geometry primitives on triangle meshes.
//!
//! These are the per-vertex and per-edge scalars every other operator is
//! built from: face and vertex normals, the mixed Voronoi area of a vertex
//! and the cotangent weight of an edge. Triangle circumcenters and sharp
//! feature edges round out the set.
//!
//! Trigonometric quantities are clamped so that nearly degenerate triangles
//! cannot blow up the results: cotangents to `±COT_BOUND` (angles in
//! `[1°, 89°]` and their supplements) and cosines to `±COS_BOUND` (angles in
//! `[3°, 177°]`).
//!
//! # References
//!
//! - Meyer, M., Desbrun, M., Schröder, P., & Barr, A. H. (2003). "Discrete
//!   Differential-Geometry Operators for Triangulated 2-Manifolds."

use nalgebra::{Point3, Vector3};
use rayon::prelude::*;

use crate::mesh::{EdgeId, HalfEdgeId, HalfEdgeMesh, MeshIndex, VertexId};

/// Largest cotangent magnitude any kernel will use.
pub const COT_BOUND: f64 = 19.1;

/// Largest cosine magnitude fed to `acos`.
pub const COS_BOUND: f64 = 0.9986;

/// Triangles whose doubled area is at most this are ignored by area sums.
pub const DEGENERATE_AREA: f64 = 1e-6;

/// Clamp a cotangent to `[-COT_BOUND, COT_BOUND]`.
#[inline]
pub fn clamp_cot(v: f64) -> f64 {
    v.clamp(-COT_BOUND, COT_BOUND)
}

/// Clamp a cosine to `[-COS_BOUND, COS_BOUND]`.
#[inline]
pub fn clamp_cos(v: f64) -> f64 {
    v.clamp(-COS_BOUND, COS_BOUND)
}

/// Cotangent of the angle between `a` and `b`.
///
/// Parallel vectors have no finite cotangent; they map to the clamp bound
/// with the sign of the dot product, and to zero if either vector vanishes.
pub fn cotan(a: &Vector3<f64>, b: &Vector3<f64>) -> f64 {
    let dot = a.dot(b);
    let cross = a.cross(b).norm();
    if cross > f64::EPSILON * (a.norm() * b.norm()).max(f64::MIN_POSITIVE) {
        clamp_cot(dot / cross)
    } else if dot > 0.0 {
        COT_BOUND
    } else if dot < 0.0 {
        -COT_BOUND
    } else {
        0.0
    }
}

/// Unnormalized normal of triangle `(a, b, c)`: `(b - a) x (c - a)`.
///
/// Its length is twice the triangle area and its direction follows the
/// winding of the corners.
#[inline]
pub fn face_normal(a: &Point3<f64>, b: &Point3<f64>, c: &Point3<f64>) -> Vector3<f64> {
    (b - a).cross(&(c - a))
}

/// Circumcenter of triangle `(a, b, c)`, or `None` if the corners are
/// collinear.
///
/// # Example
///
/// ```
/// use coral::algo::diffgeo::circumcenter;
/// use nalgebra::Point3;
///
/// let o = circumcenter(
///     &Point3::new(0.0, 0.0, 0.0),
///     &Point3::new(2.0, 0.0, 0.0),
///     &Point3::new(0.0, 2.0, 0.0),
/// )
/// .unwrap();
/// assert!((o - Point3::new(1.0, 1.0, 0.0)).norm() < 1e-12);
/// ```
pub fn circumcenter(a: &Point3<f64>, b: &Point3<f64>, c: &Point3<f64>) -> Option<Point3<f64>> {
    let ab = b - a;
    let ac = c - a;
    let n = ab.cross(&ac);
    let denom = 2.0 * n.norm_squared();
    if denom <= 0.0 {
        return None;
    }
    let offset = (n.cross(&ab) * ac.norm_squared() + ac.cross(&n) * ab.norm_squared()) / denom;
    Some(a + offset)
}

/// Flag the sharp edges of a mesh, indexed by edge id.
///
/// An interior edge is a feature when the angle between the normals of its
/// two faces exceeds `angle_deg` degrees. Boundary edges are features exactly
/// when `include_boundary` is set. A degenerate face never makes an edge
/// sharp.
pub fn feature_edges<I: MeshIndex>(
    mesh: &HalfEdgeMesh<I>,
    angle_deg: f64,
    include_boundary: bool,
) -> Vec<bool> {
    let threshold = angle_deg.to_radians().cos();
    (0..mesh.num_edges())
        .into_par_iter()
        .map(|e| {
            let e = EdgeId::new(e);
            if mesh.is_boundary_edge(e) {
                return include_boundary;
            }
            let h = e.halfedge();
            let [n0, n1] = [h, h.twin()].map(|side| {
                let [a, b, c] = mesh.face_positions(mesh.face_of(side));
                face_normal(&a, &b, &c).try_normalize(0.0)
            });
            match (n0, n1) {
                (Some(n0), Some(n1)) => n0.dot(&n1) < threshold,
                _ => false,
            }
        })
        .collect()
}

/// Unit normal of every vertex.
///
/// Sums the cross products of consecutive outgoing edge vectors over the
/// faces around the vertex, which weights each face by its area. Isolated
/// vertices get the zero vector.
pub fn vertex_normals<I: MeshIndex>(mesh: &HalfEdgeMesh<I>) -> Vec<Vector3<f64>> {
    (0..mesh.num_vertices())
        .into_par_iter()
        .map(|i| vertex_normal(mesh, VertexId::new(i)))
        .collect()
}

fn vertex_normal<I: MeshIndex>(mesh: &HalfEdgeMesh<I>, v: VertexId<I>) -> Vector3<f64> {
    let out: Vec<HalfEdgeId<I>> = mesh.vertex_halfedges(v).collect();
    let k = out.len();
    let mut normal = Vector3::zeros();
    for j in 0..k {
        let next = out[(j + 1) % k];
        if mesh.face_of(next).is_valid() {
            normal += mesh.edge_vector(next).cross(&mesh.edge_vector(out[j]));
        }
    }
    normal.try_normalize(0.0).unwrap_or_else(Vector3::zeros)
}

/// Mixed Voronoi area of a vertex.
///
/// Non-obtuse triangles contribute their true Voronoi region,
/// `(|pr|² cot q + |pq|² cot r) / 8`. A triangle obtuse at the vertex
/// contributes half its area, one obtuse elsewhere a quarter. Triangles with
/// (near) zero area are skipped.
pub fn mixed_voronoi_area<I: MeshIndex>(mesh: &HalfEdgeMesh<I>, v: VertexId<I>) -> f64 {
    let mut area = 0.0;

    for h0 in mesh.vertex_halfedges(v) {
        if !mesh.face_of(h0).is_valid() {
            continue;
        }
        let h1 = mesh.next(h0);

        let p = mesh.position(v);
        let q = mesh.position(mesh.dest(h0));
        let r = mesh.position(mesh.dest(h1));

        let pq = q - p;
        let qr = r - q;
        let pr = r - p;

        let double_area = pq.cross(&qr).norm();
        if double_area <= DEGENERATE_AREA {
            continue;
        }

        let dot_p = pq.dot(&pr);
        let dot_q = -qr.dot(&pq);
        let dot_r = qr.dot(&pr);

        if dot_p < 0.0 {
            area += 0.25 * double_area;
        } else if dot_q < 0.0 || dot_r < 0.0 {
            area += 0.125 * double_area;
        } else {
            let cot_q = clamp_cot(dot_q / double_area);
            let cot_r = clamp_cot(dot_r / double_area);
            area += 0.125 * (pr.norm_squared() * cot_q + pq.norm_squared() * cot_r);
        }
    }

    area
}

/// Mixed Voronoi area of every vertex.
pub fn mixed_voronoi_areas<I: MeshIndex>(mesh: &HalfEdgeMesh<I>) -> Vec<f64> {
    (0..mesh.num_vertices())
        .into_par_iter()
        .map(|i| mixed_voronoi_area(mesh, VertexId::new(i)))
        .collect()
}

/// Cotangent Laplace weight of every undirected edge, indexed by [`EdgeId`].
///
/// Each side of the edge that has a face contributes half the clamped
/// cotangent of the angle opposite the edge, so `|w| <= COT_BOUND` and both
/// half-edges of an edge read the same weight.
pub fn cot_edge_weights<I: MeshIndex>(mesh: &HalfEdgeMesh<I>) -> Vec<f64> {
    cot_edge_weights_impl(mesh, true)
}

pub(crate) fn cot_edge_weights_impl<I: MeshIndex>(mesh: &HalfEdgeMesh<I>, parallel: bool) -> Vec<f64> {
    let at = |e: usize| cot_edge_weight(mesh, EdgeId::new(e));
    if parallel {
        (0..mesh.num_edges()).into_par_iter().map(at).collect()
    } else {
        (0..mesh.num_edges()).map(at).collect()
    }
}

fn cot_edge_weight<I: MeshIndex>(mesh: &HalfEdgeMesh<I>, e: EdgeId<I>) -> f64 {
    let h = e.halfedge();
    let a = mesh.position(mesh.origin(h));
    let c = mesh.position(mesh.dest(h));

    let mut weight = 0.0;
    for side in [h, h.twin()] {
        if mesh.face_of(side).is_valid() {
            let opposite = mesh.position(mesh.origin(mesh.prev(side)));
            weight += 0.5 * cotan(&(a - opposite), &(c - opposite));
        }
    }
    weight
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::build_from_triangles;
    use crate::mesh::test_meshes::{flat_grid, icosahedron, unit_square_grid};

    #[test]
    fn test_face_normal_follows_winding() {
        let a = Point3::new(0.0, 0.0, 0.0);
        let b = Point3::new(2.0, 0.0, 0.0);
        let c = Point3::new(0.0, 1.0, 0.0);
        assert_eq!(face_normal(&a, &b, &c), Vector3::new(0.0, 0.0, 2.0));
        assert_eq!(face_normal(&a, &c, &b), Vector3::new(0.0, 0.0, -2.0));
    }

    #[test]
    fn test_circumcenter_equidistant() {
        let a = Point3::new(0.3, -1.0, 0.5);
        let b = Point3::new(2.0, 0.4, -0.2);
        let c = Point3::new(-0.5, 1.5, 1.0);
        let o = circumcenter(&a, &b, &c).unwrap();

        let r = (a - o).norm();
        assert!(((b - o).norm() - r).abs() < 1e-12);
        assert!(((c - o).norm() - r).abs() < 1e-12);
        // In the plane of the triangle.
        assert!((o - a).dot(&face_normal(&a, &b, &c)).abs() < 1e-12);
    }

    #[test]
    fn test_circumcenter_collinear() {
        let a = Point3::new(0.0, 0.0, 0.0);
        let b = Point3::new(1.0, 1.0, 1.0);
        let c = Point3::new(2.0, 2.0, 2.0);
        assert_eq!(circumcenter(&a, &b, &c), None);
        assert_eq!(circumcenter(&a, &a, &b), None);
    }

    #[test]
    fn test_feature_edges_icosahedron() {
        // Adjacent face normals are about 41.8 degrees apart.
        let mesh = icosahedron();
        assert!(feature_edges(&mesh, 30.0, false).iter().all(|&f| f));
        assert!(feature_edges(&mesh, 50.0, true).iter().all(|&f| !f));
    }

    #[test]
    fn test_feature_edges_boundary_switch() {
        let mesh = flat_grid(2);
        assert!(feature_edges(&mesh, 1.0, false).iter().all(|&f| !f));

        let with_boundary = feature_edges(&mesh, 1.0, true);
        for e in mesh.edge_ids() {
            assert_eq!(with_boundary[e.index()], mesh.is_boundary_edge(e));
        }
        assert_eq!(with_boundary.iter().filter(|&&f| f).count(), 8);
    }

    #[test]
    fn test_feature_edges_fold() {
        // Two triangles meeting at a right angle along the x axis.
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.5, 1.0, 0.0),
            Point3::new(0.5, 0.0, 1.0),
        ];
        let mesh: HalfEdgeMesh = build_from_triangles(&vertices, &[[0, 1, 2], [1, 0, 3]]).unwrap();
        let crease = mesh
            .edge_ids()
            .find(|&e| !mesh.is_boundary_edge(e))
            .unwrap();

        assert!(feature_edges(&mesh, 45.0, false)[crease.index()]);
        assert!(!feature_edges(&mesh, 135.0, false)[crease.index()]);
        assert_eq!(feature_edges(&mesh, 45.0, false).iter().filter(|&&f| f).count(), 1);
    }

    #[test]
    fn test_cotan() {
        let x = Vector3::new(1.0, 0.0, 0.0);
        let d = Vector3::new(1.0, 1.0, 0.0);
        assert!((cotan(&x, &d) - 1.0).abs() < 1e-12);
        assert!(cotan(&x, &Vector3::new(0.0, 3.0, 0.0)).abs() < 1e-12);
        assert_eq!(cotan(&x, &x), COT_BOUND);
        assert_eq!(cotan(&x, &-x), -COT_BOUND);
        assert_eq!(cotan(&x, &Vector3::zeros()), 0.0);
    }

    #[test]
    fn test_vertex_normals_flat() {
        let mesh = flat_grid(3);
        for n in vertex_normals(&mesh) {
            assert!((n - Vector3::z()).norm() < 1e-12, "normal {:?}", n);
        }
    }

    #[test]
    fn test_vertex_normals_point_outward() {
        let mesh = icosahedron();
        let normals = vertex_normals(&mesh);
        for v in mesh.vertex_ids() {
            let radial = mesh.position(v).coords.normalize();
            assert!((normals[v.index()] - radial).norm() < 1e-9);
        }
    }

    #[test]
    fn test_isolated_vertex_normal_is_zero() {
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(5.0, 5.0, 5.0),
        ];
        let mesh: HalfEdgeMesh = build_from_triangles(&vertices, &[[0, 1, 2]]).unwrap();
        let normals = vertex_normals(&mesh);
        assert_eq!(normals[3], Vector3::zeros());
        assert_eq!(mixed_voronoi_area(&mesh, VertexId::new(3)), 0.0);
    }

    #[test]
    fn test_mixed_area_partitions_surface() {
        // On a grid of right triangles the mixed areas tile the square.
        let mesh = unit_square_grid(4);
        let total: f64 = mixed_voronoi_areas(&mesh).iter().sum();
        assert!((total - 1.0).abs() < 1e-9, "total area {}", total);
    }

    #[test]
    fn test_mixed_area_icosahedron() {
        let mesh = icosahedron();
        let areas = mixed_voronoi_areas(&mesh);
        let total: f64 = areas.iter().sum();
        assert!((total - mesh.surface_area()).abs() < 1e-9);
        for a in &areas {
            assert!((a - areas[0]).abs() < 1e-12);
        }
    }

    #[test]
    fn test_obtuse_triangle_area() {
        // Obtuse at vertex 2: it receives half, the others a quarter each.
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(4.0, 0.0, 0.0),
            Point3::new(2.0, 0.5, 0.0),
        ];
        let mesh: HalfEdgeMesh = build_from_triangles(&vertices, &[[0, 1, 2]]).unwrap();
        let area = mesh.face_area(crate::mesh::FaceId::new(0));
        assert!((mixed_voronoi_area(&mesh, VertexId::new(2)) - 0.5 * area).abs() < 1e-12);
        assert!((mixed_voronoi_area(&mesh, VertexId::new(0)) - 0.25 * area).abs() < 1e-12);
    }

    #[test]
    fn test_right_grid_weights() {
        // Grid diagonals sit opposite two right angles (cot = 0); axis edges
        // sit opposite 45° angles (cot = 1), weight 1/2 per side.
        let mesh = flat_grid(2);
        let weights = cot_edge_weights(&mesh);
        assert_eq!(weights.len(), mesh.num_edges());
        for e in mesh.edge_ids() {
            let d = mesh.edge_vector(e.halfedge());
            let w = weights[e.index()];
            if d.x != 0.0 && d.y != 0.0 {
                assert!(w.abs() < 1e-12);
            } else if mesh.is_boundary_edge(e) {
                assert!((w - 0.5).abs() < 1e-12);
            } else {
                assert!((w - 1.0).abs() < 1e-12);
            }
        }
    }

    #[test]
    fn test_weights_symmetric() {
        let mesh = icosahedron();
        let weights = cot_edge_weights(&mesh);
        for he in mesh.halfedge_ids() {
            assert_eq!(weights[he.edge().index()], weights[he.twin().edge().index()]);
        }
        // Equilateral: cot 60° on both sides.
        let expected = 1.0 / 3.0_f64.sqrt();
        for w in &weights {
            assert!((w - expected).abs() < 1e-9);
        }
    }

    #[test]
    fn test_weights_clamped_for_slivers() {
        for eps in [1e-2, 1e-5, 1e-9, 1e-14, 0.0] {
            let vertices = vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(0.5, eps, 0.0),
                Point3::new(0.5, -eps, 0.0),
                Point3::new(1e-7, 1.0, 0.0),
            ];
            let faces = vec![[0, 1, 2], [1, 0, 3], [0, 2, 4]];
            let mesh: HalfEdgeMesh = build_from_triangles(&vertices, &faces).unwrap();
            for w in cot_edge_weights(&mesh) {
                assert!(w.is_finite());
                assert!(w.abs() <= COT_BOUND + 1e-12, "weight {} for eps {}", w, eps);
            }
            for a in mixed_voronoi_areas(&mesh) {
                assert!(a.is_finite());
            }
        }
    }
}
