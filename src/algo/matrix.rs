//! Sparse operator matrices over the vertex space.
//!
//! All builders return a [`TripletMatrix`] with one row and column per
//! vertex, except [`adjacency_fv`] which maps faces to vertices.

use rayon::prelude::*;

use super::diffgeo::{cot_edge_weights, mixed_voronoi_areas};
use crate::mesh::{HalfEdgeMesh, MeshIndex};
use crate::sparse::TripletMatrix;

/// Vertex adjacency: `1` at `(i, j)` for every neighbour `j` of `i`.
pub fn adjacency_vv<I: MeshIndex>(mesh: &HalfEdgeMesh<I>) -> TripletMatrix {
    let n = mesh.num_vertices();
    let mut m = TripletMatrix::with_capacity(n, n, mesh.num_halfedges());
    for v in mesh.vertex_ids() {
        for u in mesh.vertex_neighbors(v) {
            m.push(v.index(), u.index(), 1.0);
        }
    }
    m
}

/// Face-vertex incidence: `1` at `(f, v)` for every corner `v` of face `f`.
pub fn adjacency_fv<I: MeshIndex>(mesh: &HalfEdgeMesh<I>) -> TripletMatrix {
    let mut m = TripletMatrix::with_capacity(mesh.num_faces(), mesh.num_vertices(), 3 * mesh.num_faces());
    for f in mesh.face_ids() {
        for v in mesh.face_triangle(f) {
            m.push(f.index(), v.index(), 1.0);
        }
    }
    m
}

/// Diagonal matrix of vertex valences.
pub fn degree_matrix<I: MeshIndex>(mesh: &HalfEdgeMesh<I>) -> TripletMatrix {
    let n = mesh.num_vertices();
    let mut m = TripletMatrix::with_capacity(n, n, n);
    for v in mesh.vertex_ids() {
        m.push(v.index(), v.index(), mesh.valence(v) as f64);
    }
    m
}

/// Graph Laplacian `D - W`: valence on the diagonal, `-1` per neighbour.
pub fn uniform_laplacian_matrix<I: MeshIndex>(mesh: &HalfEdgeMesh<I>) -> TripletMatrix {
    let n = mesh.num_vertices();
    let mut m = TripletMatrix::with_capacity(n, n, n + mesh.num_halfedges());
    push_uniform_laplacian(mesh, &mut m);
    m
}

pub(crate) fn push_uniform_laplacian<I: MeshIndex>(mesh: &HalfEdgeMesh<I>, m: &mut TripletMatrix) {
    for v in mesh.vertex_ids() {
        let mut valence = 0;
        for u in mesh.vertex_neighbors(v) {
            m.push(v.index(), u.index(), -1.0);
            valence += 1;
        }
        m.push(v.index(), v.index(), valence as f64);
    }
}

/// Tutte Laplacian `D⁻¹ (D - W)`: `1` on the diagonal, `-1/valence` per
/// neighbour. Not symmetric in general.
pub fn tutte_laplacian_matrix<I: MeshIndex>(mesh: &HalfEdgeMesh<I>) -> TripletMatrix {
    let n = mesh.num_vertices();
    let mut m = TripletMatrix::with_capacity(n, n, n + mesh.num_halfedges());
    for v in mesh.vertex_ids() {
        let valence = mesh.valence(v);
        for u in mesh.vertex_neighbors(v) {
            m.push(v.index(), u.index(), -1.0 / valence as f64);
        }
        m.push(v.index(), v.index(), 1.0);
    }
    m
}

/// Cotangent Laplacian scaled by `timestep`.
///
/// Each undirected edge `(i, j)` with weight `w` contributes `t·w` at `(i, j)`
/// and `(j, i)`; the diagonal holds `-t·Σw`, so every row sums to zero.
pub fn cotangent_laplacian_matrix<I: MeshIndex>(mesh: &HalfEdgeMesh<I>, timestep: f64) -> TripletMatrix {
    let n = mesh.num_vertices();
    let weights = cot_edge_weights(mesh);
    let mut diagonal = vec![0.0; n];
    let mut m = TripletMatrix::with_capacity(n, n, n + mesh.num_halfedges());

    for e in mesh.edge_ids() {
        let he = e.halfedge();
        let (i, j) = (mesh.origin(he).index(), mesh.dest(he).index());
        let w = weights[e.index()];
        m.push(i, j, w * timestep);
        m.push(j, i, w * timestep);
        diagonal[i] += w;
        diagonal[j] += w;
    }
    for (i, sum) in diagonal.into_iter().enumerate() {
        m.push(i, i, -timestep * sum);
    }
    m
}

/// Diagonal lumped mass matrix of mixed Voronoi areas.
pub fn mass_matrix<I: MeshIndex>(mesh: &HalfEdgeMesh<I>) -> TripletMatrix {
    let areas = mixed_voronoi_areas(mesh);
    let n = areas.len();
    let mut m = TripletMatrix::with_capacity(n, n, n);
    for (i, a) in areas.into_iter().enumerate() {
        m.push(i, i, a);
    }
    m
}

/// Sum of each row of `m`, duplicates included.
pub fn row_sums(m: &TripletMatrix) -> Vec<f64> {
    let mut sums = vec![0.0; m.nrows()];
    let len = sums.len();
    for t in m.iter().filter(|t| t.row < len) {
        sums[t.row] += t.value;
    }
    sums
}

/// `true` when `m` equals its transpose within `tol`.
pub fn is_symmetric(m: &TripletMatrix, tol: f64) -> bool {
    let dense = match m.to_dense() {
        Ok(d) => d,
        Err(_) => return false,
    };
    if dense.nrows() != dense.ncols() {
        return false;
    }
    (0..dense.nrows())
        .into_par_iter()
        .all(|i| (0..i).all(|j| (dense[(i, j)] - dense[(j, i)]).abs() <= tol))
}
