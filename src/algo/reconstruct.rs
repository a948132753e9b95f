//! Least-squares mesh reconstruction.
//!
//! Recovers vertex positions from connectivity plus a set of anchor
//! vertices by minimising `|L x|² + |C x - p_c|²`, where `L` is the uniform
//! graph Laplacian and `C` selects the anchors. The system is rectangular
//! (`(n + k) × n`) and needs a least-squares solve, which the solver contract
//! does not offer yet. [`least_squares_system`] assembles it;
//! [`least_squares_mesh`] reports [`MeshError::NotImplemented`].
//!
//! # References
//!
//! - Sorkine, O., Cohen-Or, D. (2004). "Least-squares meshes." Shape Modeling
//!   International.

use std::collections::HashSet;

use crate::algo::matrix::push_uniform_laplacian;
use crate::error::{MeshError, Result};
use crate::mesh::{HalfEdgeMesh, MeshIndex, VertexId};
use crate::sparse::{LinearSystem, SparseSolver, TripletMatrix};

/// Anchors of the reconstruction: `constraints` followed by the boundary
/// vertices of an open mesh, first occurrence wins.
fn anchor_vertices<I: MeshIndex>(
    mesh: &HalfEdgeMesh<I>,
    constraints: &[VertexId<I>],
) -> Result<Vec<VertexId<I>>> {
    let n = mesh.num_vertices();
    let mut seen = HashSet::new();
    let mut anchors = Vec::with_capacity(constraints.len());

    for &v in constraints {
        if !v.is_valid() || v.index() >= n {
            return Err(MeshError::invalid_param(
                "constraints",
                format!("{:?}", v),
                "vertex index out of range",
            ));
        }
        if seen.insert(v.index()) {
            anchors.push(v);
        }
    }

    if !mesh.is_closed() {
        for v in mesh.vertex_ids() {
            if mesh.is_boundary_vertex(v) && seen.insert(v.index()) {
                anchors.push(v);
            }
        }
    }
    Ok(anchors)
}

/// Assemble the least-squares reconstruction system.
///
/// Rows `0..n` hold the uniform Laplacian with a zero right-hand side; row
/// `n + k` has a single `1` at anchor `k` and that anchor's current position
/// as its right-hand side.
///
/// # Errors
///
/// [`MeshError::InvalidParameter`] if a constraint is not a vertex of `mesh`.
pub fn least_squares_system<I: MeshIndex>(
    mesh: &HalfEdgeMesh<I>,
    constraints: &[VertexId<I>],
) -> Result<LinearSystem> {
    let anchors = anchor_vertices(mesh, constraints)?;
    let n = mesh.num_vertices();
    let rows = n + anchors.len();

    let mut a = TripletMatrix::with_capacity(rows, n, n + mesh.num_halfedges() + anchors.len());
    push_uniform_laplacian(mesh, &mut a);

    let mut b = TripletMatrix::with_capacity(rows, 3, 3 * anchors.len());
    for (k, &v) in anchors.iter().enumerate() {
        let row = n + k;
        a.push(row, v.index(), 1.0);
        let p = mesh.position(v);
        for c in 0..3 {
            b.push(row, c, p[c]);
        }
    }

    Ok(LinearSystem::new(a, b))
}

/// Reconstruct vertex positions from the anchors.
///
/// The system is assembled and validated, but the rectangular solve is not
/// available, so this always ends in [`MeshError::NotImplemented`] and the
/// mesh is left untouched.
pub fn least_squares_mesh<I: MeshIndex>(
    mesh: &mut HalfEdgeMesh<I>,
    constraints: &[VertexId<I>],
    _solver: &dyn SparseSolver,
) -> Result<()> {
    let system = least_squares_system(mesh, constraints)?;
    log::debug!(
        "least-squares mesh: {} x {} system, {} anchors",
        system.a.nrows(),
        system.n(),
        system.a.nrows() - system.n()
    );
    Err(MeshError::NotImplemented("least-squares mesh reconstruction"))
}
