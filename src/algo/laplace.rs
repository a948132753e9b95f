//! Discrete Laplace–Beltrami operators as per-vertex vectors.
//!
//! - [`uniform_laplace`]: the centroid of the neighbours reached through
//!   faces, one value per vertex.
//! - [`cotangent_laplace`]: the cotangent-weighted mean of the edge vectors
//!   leaving each interior vertex.
//!
//! The sparse matrix forms of the same operators live in
//! [`crate::algo::matrix`].
//!
//! # Example
//!
//! ```
//! use coral::prelude::*;
//! use coral::algo::laplace::cotangent_laplace;
//! use nalgebra::Point3;
//!
//! let vertices = vec![
//!     Point3::new(0.0, 0.0, 0.0),
//!     Point3::new(1.0, 0.0, 0.0),
//!     Point3::new(0.5, 1.0, 0.0),
//! ];
//! let mesh: HalfEdgeMesh = build_from_triangles(&vertices, &[[0, 1, 2]]).unwrap();
//!
//! // Every vertex of a single triangle is on the boundary.
//! for l in cotangent_laplace(&mesh) {
//!     assert_eq!(l.norm(), 0.0);
//! }
//! ```

use nalgebra::Vector3;
use rayon::prelude::*;

use super::diffgeo::cot_edge_weights;
use crate::error::{ensure_len, Result};
use crate::mesh::{HalfEdgeMesh, MeshIndex, VertexId};

/// Neighbour centroid of every vertex.
///
/// Sums the end positions of the outgoing half-edges that border a face and
/// divides by the valence. Isolated vertices get the zero vector.
pub fn uniform_laplace<I: MeshIndex>(mesh: &HalfEdgeMesh<I>) -> Vec<Vector3<f64>> {
    (0..mesh.num_vertices())
        .into_par_iter()
        .map(|i| {
            let v = VertexId::new(i);
            let valence = mesh.valence(v);
            if valence == 0 {
                return Vector3::zeros();
            }
            let sum: Vector3<f64> = mesh
                .vertex_halfedges(v)
                .filter(|&he| mesh.face_of(he).is_valid())
                .map(|he| mesh.position(mesh.dest(he)).coords)
                .sum();
            sum / valence as f64
        })
        .collect()
}

/// Cotangent Laplace vector of every vertex.
///
/// Boundary vertices and vertices whose weights sum to zero get the zero
/// vector.
pub fn cotangent_laplace<I: MeshIndex>(mesh: &HalfEdgeMesh<I>) -> Vec<Vector3<f64>> {
    let weights = cot_edge_weights(mesh);
    laplace_vectors(mesh, &weights, false, true)
}

/// Cotangent Laplace vectors from precomputed edge weights.
///
/// `weights` must hold one value per undirected edge, as returned by
/// [`cot_edge_weights`].
pub fn cotangent_laplace_with_weights<I: MeshIndex>(
    mesh: &HalfEdgeMesh<I>,
    weights: &[f64],
) -> Result<Vec<Vector3<f64>>> {
    ensure_len("edge weights", mesh.num_edges(), weights.len())?;
    Ok(laplace_vectors(mesh, weights, false, true))
}

/// Weighted Laplace vectors; boundary vertices are included on request.
pub(crate) fn laplace_vectors<I: MeshIndex>(
    mesh: &HalfEdgeMesh<I>,
    weights: &[f64],
    include_boundary: bool,
    parallel: bool,
) -> Vec<Vector3<f64>> {
    let at = |i: usize| {
        let v = VertexId::new(i);
        if !include_boundary && mesh.is_boundary_vertex(v) {
            Vector3::zeros()
        } else {
            weighted_laplace(mesh, v, weights)
        }
    };
    if parallel {
        (0..mesh.num_vertices()).into_par_iter().map(at).collect()
    } else {
        (0..mesh.num_vertices()).map(at).collect()
    }
}

fn weighted_laplace<I: MeshIndex>(
    mesh: &HalfEdgeMesh<I>,
    v: VertexId<I>,
    weights: &[f64],
) -> Vector3<f64> {
    let p = mesh.position(v);
    let mut sum = Vector3::zeros();
    let mut total = 0.0;
    for he in mesh.vertex_halfedges(v) {
        let w = weights[he.edge().index()];
        sum += (mesh.position(mesh.dest(he)) - p) * w;
        total += w;
    }
    if total == 0.0 {
        Vector3::zeros()
    } else {
        sum / total
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MeshError;
    use crate::mesh::test_meshes::{flat_grid, grid_index, icosahedron};

    #[test]
    fn test_uniform_laplace_interior_is_centroid() {
        let mesh = flat_grid(2);
        let centre = VertexId::new(grid_index(2, 1, 1));
        let l = uniform_laplace(&mesh);
        assert!((l[centre.index()] - mesh.position(centre).coords).norm() < 1e-12);
    }

    #[test]
    fn test_uniform_laplace_isolated_vertex() {
        use crate::mesh::build_from_triangles;
        use nalgebra::Point3;

        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(3.0, 3.0, 3.0),
        ];
        let mesh: HalfEdgeMesh = build_from_triangles(&vertices, &[[0, 1, 2]]).unwrap();
        assert_eq!(uniform_laplace(&mesh)[3], Vector3::zeros());
    }

    #[test]
    fn test_cotangent_laplace_flat_grid() {
        let mesh = flat_grid(4);
        let l = cotangent_laplace(&mesh);
        for v in mesh.vertex_ids() {
            assert!(l[v.index()].norm() < 1e-12, "vertex {:?}: {:?}", v, l[v.index()]);
        }
    }

    #[test]
    fn test_cotangent_laplace_points_inward() {
        let mesh = icosahedron();
        for (v, l) in mesh.vertex_ids().zip(cotangent_laplace(&mesh)) {
            let radial = mesh.position(v).coords;
            assert!(l.dot(&radial) < 0.0);
            assert!(l.normalize().cross(&radial.normalize()).norm() < 1e-9);
        }
    }

    #[test]
    fn test_weights_length_checked() {
        let mesh = flat_grid(1);
        let result = cotangent_laplace_with_weights(&mesh, &[1.0, 2.0]);
        assert!(matches!(
            result,
            Err(MeshError::DimensionMismatch { expected: 5, actual: 2, .. })
        ));
    }

    #[test]
    fn test_zero_weights_give_zero() {
        let mesh = flat_grid(2);
        let weights = vec![0.0; mesh.num_edges()];
        for l in cotangent_laplace_with_weights(&mesh, &weights).unwrap() {
            assert_eq!(l, Vector3::zeros());
        }
    }
}
