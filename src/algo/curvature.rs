//! Discrete curvature estimation on triangle meshes.
//!
//! # Curvature Types
//!
//! - **Gaussian curvature K**: angle defect over the mixed Voronoi area
//! - **Mean curvature H**: half the length of the cotangent Laplace vector
//!   ([`laplacian_mean_curvature`]), or the average normal variation along
//!   the edges of a vertex ([`normal_mean_curvature`])
//! - **Principal curvatures k1, k2**: `H ± sqrt(H² - K)`
//! - **Principal direction**: a unit vector per vertex pointing towards
//!   where a scalar field (usually k1) grows fastest in its one-ring
//!
//! Boundary vertices have no Laplacian mean curvature and report zero. Their
//! Gaussian curvature keeps the `2π` reference of interior vertices, and the
//! angle sum wraps across the boundary gap.
//!
//! # Example
//!
//! ```
//! use coral::prelude::*;
//! use coral::algo::curvature::compute_curvature;
//! use nalgebra::Point3;
//!
//! let vertices = vec![
//!     Point3::new(0.0, 0.0, 0.0),
//!     Point3::new(1.0, 0.0, 0.0),
//!     Point3::new(0.0, 1.0, 0.0),
//!     Point3::new(0.0, 0.0, 1.0),
//! ];
//! let faces = vec![[0, 2, 1], [0, 1, 3], [0, 3, 2], [1, 2, 3]];
//! let mesh: HalfEdgeMesh = build_from_triangles(&vertices, &faces).unwrap();
//!
//! let result = compute_curvature(&mesh);
//! for v in mesh.vertex_ids() {
//!     let (k1, k2) = result.principal(v);
//!     assert!(k1 >= k2);
//! }
//! ```
//!
//! # References
//!
//! - Meyer, M., et al. (2003). "Discrete Differential-Geometry Operators for
//!   Triangulated 2-Manifolds." Visualization and Mathematics III.

use std::f64::consts::PI;
use std::marker::PhantomData;

use nalgebra::Vector3;
use rayon::prelude::*;

use super::diffgeo::{clamp_cos, mixed_voronoi_area, vertex_normals};
use super::laplace::cotangent_laplace;
use crate::error::{ensure_len, Result};
use crate::mesh::{EdgeId, HalfEdgeMesh, MeshIndex, VertexId};

/// Areas at or below this give zero Gaussian curvature.
const MIN_AREA: f64 = 1e-10;

/// Result of curvature computation.
///
/// Contains per-vertex curvature values for all vertices in the mesh.
#[derive(Debug, Clone)]
pub struct CurvatureResult<I: MeshIndex = u32> {
    /// Gaussian curvature (K) per vertex.
    gaussian: Vec<f64>,
    /// Laplacian mean curvature (H) per vertex.
    mean: Vec<f64>,
    /// Maximum principal curvature (k1) per vertex.
    principal_max: Vec<f64>,
    /// Minimum principal curvature (k2) per vertex.
    principal_min: Vec<f64>,
    _marker: PhantomData<I>,
}

impl<I: MeshIndex> CurvatureResult<I> {
    /// Get Gaussian curvature at a vertex.
    #[inline]
    pub fn gaussian(&self, v: VertexId<I>) -> f64 {
        self.gaussian[v.index()]
    }

    /// Get mean curvature at a vertex.
    #[inline]
    pub fn mean(&self, v: VertexId<I>) -> f64 {
        self.mean[v.index()]
    }

    /// Get principal curvatures at a vertex.
    ///
    /// Returns (k1, k2) where k1 >= k2.
    #[inline]
    pub fn principal(&self, v: VertexId<I>) -> (f64, f64) {
        (self.principal_max[v.index()], self.principal_min[v.index()])
    }

    /// All Gaussian curvatures.
    #[inline]
    pub fn gaussian_values(&self) -> &[f64] {
        &self.gaussian
    }

    /// All mean curvatures.
    #[inline]
    pub fn mean_values(&self) -> &[f64] {
        &self.mean
    }

    /// All maximum principal curvatures.
    #[inline]
    pub fn principal_max_values(&self) -> &[f64] {
        &self.principal_max
    }

    /// All minimum principal curvatures.
    #[inline]
    pub fn principal_min_values(&self) -> &[f64] {
        &self.principal_min
    }

    /// Get the number of vertices.
    #[inline]
    pub fn len(&self) -> usize {
        self.gaussian.len()
    }

    /// Check if empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.gaussian.is_empty()
    }

    /// Compute shape index at a vertex.
    ///
    /// Shape index is a scale-invariant measure: (2/π) * atan((k1+k2)/(k1-k2))
    /// Range: [-1, 1], where -1 = cup, 0 = saddle, 1 = cap
    pub fn shape_index(&self, v: VertexId<I>) -> f64 {
        let (k1, k2) = self.principal(v);
        let diff = k1 - k2;
        if diff.abs() < 1e-10 {
            0.0
        } else {
            (2.0 / PI) * ((k1 + k2) / diff).atan()
        }
    }

    /// Compute curvedness at a vertex: sqrt((k1² + k2²) / 2).
    pub fn curvedness(&self, v: VertexId<I>) -> f64 {
        let (k1, k2) = self.principal(v);
        ((k1 * k1 + k2 * k2) / 2.0).sqrt()
    }
}

/// Sum of the angles between consecutive neighbour vectors, wrapping around.
fn angle_sum<I: MeshIndex>(mesh: &HalfEdgeMesh<I>, v: VertexId<I>) -> f64 {
    let p = mesh.position(v);
    let neighbors: Vec<_> = mesh.vertex_neighbors(v).map(|u| mesh.position(u)).collect();
    let k = neighbors.len();

    (0..k)
        .map(|j| {
            let a = p - neighbors[j];
            let b = p - neighbors[(j + 1) % k];
            let cos = a.dot(&b) / (a.norm() * b.norm());
            if cos.is_finite() {
                clamp_cos(cos).acos()
            } else {
                0.0
            }
        })
        .sum()
}

/// Compute Gaussian curvature for all vertices.
///
/// Uses the angle defect formula `K = (2π - Σθ) / A_mixed`. Vertices with no
/// mixed area get zero.
///
/// # Example
///
/// ```no_run
/// use coral::prelude::*;
/// use coral::algo::curvature::gaussian_curvature;
///
/// let mesh: HalfEdgeMesh = coral::io::load("mesh.obj").unwrap();
/// let curvatures = gaussian_curvature(&mesh);
/// ```
pub fn gaussian_curvature<I: MeshIndex>(mesh: &HalfEdgeMesh<I>) -> Vec<f64> {
    gaussian_curvature_impl(mesh, true)
}

fn gaussian_curvature_impl<I: MeshIndex>(mesh: &HalfEdgeMesh<I>, parallel: bool) -> Vec<f64> {
    // (curvature, skipped for lack of area)
    let compute_vertex = |idx: usize| -> (f64, bool) {
        let v = VertexId::<I>::new(idx);
        let area = mixed_voronoi_area(mesh, v);
        if area > MIN_AREA {
            ((2.0 * PI - angle_sum(mesh, v)) / area, false)
        } else {
            (0.0, mesh.valence(v) > 0)
        }
    };

    let results: Vec<(f64, bool)> = if parallel {
        (0..mesh.num_vertices()).into_par_iter().map(compute_vertex).collect()
    } else {
        (0..mesh.num_vertices()).map(compute_vertex).collect()
    };

    let skipped = results.iter().filter(|(_, s)| *s).count();
    if skipped > 0 {
        log::warn!("{} vertices have no mixed area; Gaussian curvature set to 0", skipped);
    }

    results.into_iter().map(|(k, _)| k).collect()
}

/// Mean curvature from the cotangent Laplace operator: `|L(v)| / 2`.
///
/// Unsigned. Boundary vertices get zero.
pub fn laplacian_mean_curvature<I: MeshIndex>(mesh: &HalfEdgeMesh<I>) -> Vec<f64> {
    cotangent_laplace(mesh).iter().map(|l| l.norm() / 2.0).collect()
}

/// Mean curvature from the variation of vertex normals along edges.
///
/// Each edge `(p0, p1)` with unit normals `(n0, n1)` has curvature
/// `(n1 - n0)·(p1 - p0) / |p1 - p0|²`; a vertex averages its edges.
pub fn normal_mean_curvature<I: MeshIndex>(mesh: &HalfEdgeMesh<I>) -> Vec<f64> {
    let normals = vertex_normals(mesh);

    let edge_curvature: Vec<f64> = (0..mesh.num_edges())
        .into_par_iter()
        .map(|e| {
            let he = EdgeId::<I>::new(e).halfedge();
            let (v0, v1) = (mesh.origin(he), mesh.dest(he));
            let d = mesh.position(v1) - mesh.position(v0);
            let len_sq = d.norm_squared();
            if len_sq > 0.0 {
                (normals[v1.index()] - normals[v0.index()]).dot(&d) / len_sq
            } else {
                0.0
            }
        })
        .collect();

    (0..mesh.num_vertices())
        .into_par_iter()
        .map(|i| {
            let v = VertexId::<I>::new(i);
            let valence = mesh.valence(v);
            if valence == 0 {
                return 0.0;
            }
            let sum: f64 = mesh
                .vertex_halfedges(v)
                .map(|he| edge_curvature[he.edge().index()])
                .sum();
            sum / valence as f64
        })
        .collect()
}

/// `(k1, k2) = H ± sqrt(max(0, H² - K))` per vertex.
fn split_principal(mean: &[f64], gaussian: &[f64]) -> (Vec<f64>, Vec<f64>) {
    mean.par_iter()
        .zip(gaussian.par_iter())
        .map(|(&h, &k)| {
            let delta = (h * h - k).max(0.0).sqrt();
            (h + delta, h - delta)
        })
        .unzip()
}

/// Principal curvatures `(k1, k2)` of every vertex, with `k1 >= k2`.
pub fn principal_curvatures<I: MeshIndex>(mesh: &HalfEdgeMesh<I>) -> (Vec<f64>, Vec<f64>) {
    let mean = laplacian_mean_curvature(mesh);
    let gaussian = gaussian_curvature(mesh);
    split_principal(&mean, &gaussian)
}

/// Compute all curvatures (Gaussian, mean, and principal) for all vertices.
///
/// # Example
///
/// ```no_run
/// use coral::prelude::*;
/// use coral::algo::curvature::compute_curvature;
///
/// let mesh: HalfEdgeMesh = coral::io::load("mesh.obj").unwrap();
/// let result = compute_curvature(&mesh);
///
/// for v in mesh.vertex_ids() {
///     let (k1, k2) = result.principal(v);
///     println!("v{}: K={:.4}, H={:.4}, k1={:.4}, k2={:.4}",
///              v.index(), result.gaussian(v), result.mean(v), k1, k2);
/// }
/// ```
pub fn compute_curvature<I: MeshIndex>(mesh: &HalfEdgeMesh<I>) -> CurvatureResult<I> {
    compute_curvature_impl(mesh, true)
}

/// Compute all curvatures with the Gaussian pass on a single thread.
///
/// Useful for benchmarking.
pub fn compute_curvature_sequential<I: MeshIndex>(mesh: &HalfEdgeMesh<I>) -> CurvatureResult<I> {
    compute_curvature_impl(mesh, false)
}

fn compute_curvature_impl<I: MeshIndex>(mesh: &HalfEdgeMesh<I>, parallel: bool) -> CurvatureResult<I> {
    let gaussian = gaussian_curvature_impl(mesh, parallel);
    let mean = laplacian_mean_curvature(mesh);
    let (principal_max, principal_min) = split_principal(&mean, &gaussian);

    CurvatureResult {
        gaussian,
        mean,
        principal_max,
        principal_min,
        _marker: PhantomData,
    }
}

/// Direction in which `field` increases fastest around each vertex.
///
/// For vertex `v`, the incoming half-edge whose source carries the largest
/// field value is chosen (the last one on ties). The two vertices flanking
/// that source in the one-ring are compared and the larger one becomes the
/// third vertex. The direction points from `v` to the point between source
/// and third vertex, weighted by their field values. Degenerate cases give
/// the zero vector.
///
/// `field` is typically [`CurvatureResult::principal_max_values`].
pub fn principal_directions<I: MeshIndex>(
    mesh: &HalfEdgeMesh<I>,
    field: &[f64],
) -> Result<Vec<Vector3<f64>>> {
    ensure_len("curvature field", mesh.num_vertices(), field.len())?;

    Ok((0..mesh.num_vertices())
        .into_par_iter()
        .map(|i| principal_direction(mesh, VertexId::new(i), field))
        .collect())
}

fn principal_direction<I: MeshIndex>(
    mesh: &HalfEdgeMesh<I>,
    v: VertexId<I>,
    field: &[f64],
) -> Vector3<f64> {
    let mut best = None;
    for he in mesh.incoming_halfedges(v) {
        let value = field[mesh.origin(he).index()];
        match best {
            Some((_, max)) if value < max => {}
            _ => best = Some((he, value)),
        }
    }
    let Some((max_he, _)) = best else {
        return Vector3::zeros();
    };

    let second = mesh.origin(max_he);
    let before = mesh.dest(mesh.next(mesh.twin(max_he)));
    let after = mesh.origin(mesh.prev(max_he));
    let third = if field[before.index()] > field[after.index()] {
        before
    } else {
        after
    };

    let (k2, k3) = (field[second.index()], field[third.index()]);
    let denom = k2 + k3;
    let w = if denom != 0.0 { k3 / denom } else { 0.5 };

    let target = mesh.position(third).coords * w + mesh.position(second).coords * (1.0 - w);
    (target - mesh.position(v).coords)
        .try_normalize(0.0)
        .unwrap_or_else(Vector3::zeros)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algo::diffgeo::mixed_voronoi_areas;
    use crate::error::MeshError;
    use crate::mesh::build_from_triangles;
    use crate::mesh::test_meshes::{disk, flat_grid, grid_index, icosahedron, icosphere};
    use nalgebra::Point3;

    fn total_gaussian(mesh: &HalfEdgeMesh) -> f64 {
        let areas = mixed_voronoi_areas(mesh);
        gaussian_curvature(mesh)
            .iter()
            .zip(&areas)
            .map(|(k, a)| k * a)
            .sum()
    }

    #[test]
    fn test_curvature_flat_plane() {
        let mesh = flat_grid(3);
        let result = compute_curvature(&mesh);

        for (i, j) in [(1, 1), (1, 2), (2, 1), (2, 2)] {
            let v = VertexId::new(grid_index(3, i, j));
            assert!(
                result.gaussian(v).abs() < 1e-9,
                "Gaussian curvature should be ~0 for flat plane, got {}",
                result.gaussian(v)
            );
            assert!(result.mean(v).abs() < 1e-12);
        }
        // Boundary vertices carry no Laplacian mean curvature.
        assert_eq!(result.mean(VertexId::new(0)), 0.0);
    }

    #[test]
    fn test_gauss_bonnet_icosahedron() {
        let total = total_gaussian(&icosahedron());
        assert!(
            (total - 4.0 * PI).abs() < 1e-9,
            "Gauss-Bonnet violated: got {}, expected {}",
            total,
            4.0 * PI
        );
    }

    #[test]
    fn test_gauss_bonnet_icosphere() {
        let total = total_gaussian(&icosphere(2));
        assert!((total - 4.0 * PI).abs() < 1e-6, "got {}", total);
    }

    #[test]
    fn test_icosahedron_uniform() {
        let mesh = icosahedron();
        let result = compute_curvature(&mesh);
        let k0 = result.gaussian(VertexId::new(0));
        let h0 = result.mean(VertexId::new(0));
        assert!(k0 > 0.0);
        assert!(h0 > 0.0);
        for v in mesh.vertex_ids() {
            assert!((result.gaussian(v) - k0).abs() < 1e-9);
            assert!((result.mean(v) - h0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_normal_mean_curvature_unit_sphere() {
        // Normals equal positions on the unit circumsphere, so every edge
        // reads exactly 1.
        let mesh = icosahedron();
        for h in normal_mean_curvature(&mesh) {
            assert!((h - 1.0).abs() < 1e-9, "got {}", h);
        }

        let mesh = flat_grid(2);
        for h in normal_mean_curvature(&mesh) {
            assert!(h.abs() < 1e-12);
        }
    }

    #[test]
    fn test_principal_ordering() {
        for mesh in [icosphere(1), disk(3, 8, 0.4), flat_grid(3)] {
            let (kmax, kmin) = principal_curvatures(&mesh);
            assert_eq!(kmax.len(), mesh.num_vertices());
            for (a, b) in kmax.iter().zip(&kmin) {
                assert!(a.is_finite() && b.is_finite());
                assert!(a >= b, "k1 should be >= k2: {} vs {}", a, b);
            }
        }
    }

    #[test]
    fn test_principal_relation() {
        let mesh = icosphere(1);
        let result = compute_curvature(&mesh);
        for v in mesh.vertex_ids() {
            let (k1, k2) = result.principal(v);
            assert!(((k1 + k2) / 2.0 - result.mean(v)).abs() < 1e-9);
        }
    }

    #[test]
    fn test_shape_index_and_curvedness() {
        let mesh = icosphere(1);
        let result = compute_curvature(&mesh);

        for v in mesh.vertex_ids() {
            let si = result.shape_index(v);
            assert!((-1.0 - 1e-10..=1.0 + 1e-10).contains(&si), "Shape index out of range: {}", si);
            assert!(result.curvedness(v) >= 0.0);
        }
    }

    #[test]
    fn test_sequential_matches_parallel() {
        let mesh = disk(3, 10, 0.3);
        let a = compute_curvature(&mesh);
        let b = compute_curvature_sequential(&mesh);
        assert_eq!(a.gaussian_values(), b.gaussian_values());
        assert_eq!(a.principal_min_values(), b.principal_min_values());
    }

    #[test]
    fn test_curvature_single_triangle() {
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.5, 1.0, 0.0),
        ];
        let mesh: HalfEdgeMesh = build_from_triangles(&vertices, &[[0, 1, 2]]).unwrap();
        let result = compute_curvature(&mesh);
        assert_eq!(result.len(), 3);
        for v in mesh.vertex_ids() {
            assert!(result.gaussian(v).is_finite());
            assert_eq!(result.mean(v), 0.0);
        }
    }

    #[test]
    fn test_principal_direction_follows_field() {
        let mesh = flat_grid(2);
        let field: Vec<f64> = mesh.vertex_ids().map(|v| mesh.position(v).x + 1.0).collect();
        let dirs = principal_directions(&mesh, &field).unwrap();

        let d = dirs[grid_index(2, 1, 1)];
        assert!((d.norm() - 1.0).abs() < 1e-12);
        assert!(d.x > 0.0);
        assert_eq!(d.z, 0.0);
    }

    #[test]
    fn test_principal_direction_zero_field() {
        let mesh = icosahedron();
        let dirs = principal_directions(&mesh, &vec![0.0; 12]).unwrap();
        for (v, d) in mesh.vertex_ids().zip(&dirs) {
            assert!((d.norm() - 1.0).abs() < 1e-9);
            // Neighbours sit below the tangent plane.
            assert!(d.dot(&mesh.position(v).coords) < 0.0);
        }
    }

    #[test]
    fn test_principal_direction_tie_takes_last_neighbour() {
        let mesh = flat_grid(2);
        let center = VertexId::new(grid_index(2, 1, 1));
        let ring: Vec<VertexId> = mesh.incoming_halfedges(center).map(|he| mesh.origin(he)).collect();
        assert_eq!(ring.len(), 6);

        // Two non-adjacent neighbours share the maximum; everything else is zero.
        let (first, last) = (ring[0], ring[3]);
        let mut field = vec![0.0; mesh.num_vertices()];
        field[first.index()] = 1.0;
        field[last.index()] = 1.0;

        let d = principal_directions(&mesh, &field).unwrap()[center.index()];
        let toward = |u: VertexId| (mesh.position(u) - mesh.position(center)).normalize();
        assert!((d - toward(last)).norm() < 1e-12);
        assert!((d - toward(first)).norm() > 1e-3);
    }

    #[test]
    fn test_principal_direction_length_checked() {
        let mesh = icosahedron();
        assert!(matches!(
            principal_directions(&mesh, &[1.0, 2.0]),
            Err(MeshError::DimensionMismatch { expected: 12, actual: 2, .. })
        ));
    }

    #[test]
    fn test_isolated_vertex() {
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(2.0, 2.0, 2.0),
        ];
        let mesh: HalfEdgeMesh = build_from_triangles(&vertices, &[[0, 1, 2]]).unwrap();
        assert_eq!(gaussian_curvature(&mesh)[3], 0.0);
        assert_eq!(normal_mean_curvature(&mesh)[3], 0.0);
        let dirs = principal_directions(&mesh, &[1.0, 2.0, 3.0, 4.0]).unwrap();
        assert_eq!(dirs[3], Vector3::zeros());
    }
}
