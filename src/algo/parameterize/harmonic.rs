//! Harmonic (Tutte-style) parameterization with fixed boundary.

use std::f64::consts::TAU;

use nalgebra::Point2;

use super::UVMap;
use crate::algo::diffgeo::cot_edge_weights;
use crate::algo::partition::VertexPartition;
use crate::error::{ensure_len, MeshError, Result};
use crate::mesh::{HalfEdgeId, HalfEdgeMesh, MeshIndex};
use crate::sparse::{LinearSystem, SolverKind, SparseSolver, TripletMatrix};

/// Map the first boundary loop of `mesh` onto the unit circle.
///
/// Boundary vertices are spaced by arc length along the loop, oriented so
/// that counter-clockwise faces stay counter-clockwise in UV space. All other
/// vertices start at the origin.
///
/// # Errors
///
/// [`MeshError::InvalidState`] if the mesh has no boundary.
pub fn circle_boundary_uvs<I: MeshIndex>(mesh: &HalfEdgeMesh<I>) -> Result<UVMap<I>> {
    let start = mesh
        .halfedge_ids()
        .find(|&he| mesh.is_boundary_halfedge(he))
        .ok_or_else(|| MeshError::InvalidState("mesh has no boundary loop".to_string()))?;

    let mut loop_edges: Vec<HalfEdgeId<I>> = Vec::new();
    let mut he = start;
    loop {
        loop_edges.push(he);
        he = mesh.next(he);
        if he == start || loop_edges.len() > mesh.num_halfedges() {
            break;
        }
    }

    let lengths: Vec<f64> = loop_edges.iter().map(|&he| mesh.edge_vector(he).norm()).collect();
    let total: f64 = lengths.iter().sum();

    let boundary_vertices = mesh.vertex_ids().filter(|&v| mesh.is_boundary_vertex(v)).count();
    if boundary_vertices > loop_edges.len() {
        log::warn!(
            "mesh has {} boundary vertices but only {} lie on the mapped loop",
            boundary_vertices,
            loop_edges.len()
        );
    }

    let mut uv = UVMap::zeros(mesh.num_vertices());
    let mut arc = 0.0;
    for (&he, &len) in loop_edges.iter().zip(&lengths) {
        let t = if total > 0.0 {
            arc / total
        } else {
            0.0
        };
        // Boundary half-edges run clockwise around the faces they border.
        let angle = -TAU * t;
        uv.set(mesh.origin(he), Point2::new(angle.cos(), angle.sin()));
        arc += len;
    }

    Ok(uv)
}

/// Assemble the harmonic parameterization system.
///
/// One row per free vertex `i`: `Σ_j w_ij u_i - Σ_{j free} w_ij u_j =
/// Σ_{j fixed} w_ij uv_j`, with cotangent weights floored at zero. `B` has
/// two columns (u, v).
pub fn harmonic_system<I: MeshIndex>(
    mesh: &HalfEdgeMesh<I>,
    uv: &UVMap<I>,
) -> Result<(VertexPartition<I>, LinearSystem)> {
    ensure_len("UV map", mesh.num_vertices(), uv.len())?;

    let partition = VertexPartition::new(mesh, &[])?;
    let n = partition.num_free();
    let weights: Vec<f64> = cot_edge_weights(mesh).into_iter().map(|w| w.max(0.0)).collect();

    let mut a = TripletMatrix::with_capacity(n, n, n * 7);
    let mut b = TripletMatrix::with_capacity(n, 2, n * 2);

    for (row, &v) in partition.free_vertices().iter().enumerate() {
        let mut total = 0.0;
        let mut rhs = nalgebra::Vector2::zeros();
        for he in mesh.vertex_halfedges(v) {
            let u = mesh.dest(he);
            let w = weights[he.edge().index()];
            total += w;
            match partition.compact_index(u) {
                Some(col) => a.push(row, col, -w),
                None => rhs += uv.get(u).coords * w,
            }
        }
        a.push(row, row, total);
        b.push(row, 0, rhs.x);
        b.push(row, 1, rhs.y);
    }

    log::debug!("harmonic parameterization: {} free vertices", n);
    Ok((partition, LinearSystem::new(a, b)))
}

/// Harmonic parameterization of a disk-like mesh.
///
/// `uv` supplies the boundary coordinates (see [`circle_boundary_uvs`]);
/// only the interior entries are overwritten. With a convex boundary
/// polygon and non-negative weights the result has no flipped triangles.
///
/// # Errors
///
/// - [`MeshError::DimensionMismatch`] if `uv` does not have one entry per vertex
/// - [`MeshError::InvalidState`] if the mesh is closed
/// - any error of the solver; `uv` is untouched on failure
///
/// # Example
///
/// ```
/// use coral::prelude::*;
/// use coral::algo::parameterize::{circle_boundary_uvs, harmonic_parameterization};
/// use coral::sparse::DirectSolver;
/// use nalgebra::Point3;
///
/// let vertices = vec![
///     Point3::new(0.0, 0.0, 0.2),
///     Point3::new(1.0, 0.0, 0.0),
///     Point3::new(0.0, 1.0, 0.0),
///     Point3::new(-1.0, 0.0, 0.0),
///     Point3::new(0.0, -1.0, 0.0),
/// ];
/// let faces = vec![[0, 1, 2], [0, 2, 3], [0, 3, 4], [0, 4, 1]];
/// let mesh: HalfEdgeMesh = build_from_triangles(&vertices, &faces).unwrap();
///
/// let mut uv = circle_boundary_uvs(&mesh).unwrap();
/// harmonic_parameterization(&mesh, &mut uv, &DirectSolver).unwrap();
/// assert!(uv.get(VertexId::new(0)).coords.norm() < 1e-9);
/// ```
pub fn harmonic_parameterization<I: MeshIndex>(
    mesh: &HalfEdgeMesh<I>,
    uv: &mut UVMap<I>,
    solver: &dyn SparseSolver,
) -> Result<()> {
    ensure_len("UV map", mesh.num_vertices(), uv.len())?;
    if mesh.is_closed() {
        return Err(MeshError::InvalidState(
            "harmonic parameterization needs a mesh with boundary".to_string(),
        ));
    }

    let (partition, system) = harmonic_system(mesh, uv)?;
    if partition.num_free() == 0 {
        return Ok(());
    }

    let x = system.solve(SolverKind::General, solver)?;
    for (k, &v) in partition.free_vertices().iter().enumerate() {
        uv.set(v, Point2::new(x[(k, 0)], x[(k, 1)]));
    }
    Ok(())
}

/// Convenience wrapper: circle boundary, then harmonic interior.
pub fn harmonic_disk<I: MeshIndex>(mesh: &HalfEdgeMesh<I>, solver: &dyn SparseSolver) -> Result<UVMap<I>> {
    let mut uv = circle_boundary_uvs(mesh)?;
    harmonic_parameterization(mesh, &mut uv, solver)?;
    Ok(uv)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::test_meshes::{disk, icosahedron, unit_square_grid};
    use crate::mesh::VertexId;
    use crate::sparse::DirectSolver;

    #[test]
    fn test_circle_boundary() {
        let mesh = disk(2, 8, 0.0);
        let uv = circle_boundary_uvs(&mesh).unwrap();
        for v in mesh.vertex_ids() {
            let r = uv.get(v).coords.norm();
            if mesh.is_boundary_vertex(v) {
                assert!((r - 1.0).abs() < 1e-12);
            } else {
                assert_eq!(r, 0.0);
            }
        }
    }

    #[test]
    fn test_disk_has_no_flips() {
        for bulge in [0.0, 0.5] {
            let mesh = disk(4, 12, bulge);
            let boundary = circle_boundary_uvs(&mesh).unwrap();
            let mut uv = boundary.clone();
            harmonic_parameterization(&mesh, &mut uv, &DirectSolver).unwrap();

            assert_eq!(uv.flipped_faces(&mesh), 0);
            for v in mesh.vertex_ids() {
                if mesh.is_boundary_vertex(v) {
                    assert_eq!(uv.get(v), boundary.get(v));
                } else {
                    assert!(uv.get(v).coords.norm() < 1.0);
                }
            }
            // Rotational symmetry pins the centre to the origin.
            assert!(uv.get(VertexId::new(0)).coords.norm() < 1e-9);
        }
    }

    #[test]
    fn test_grid_has_no_flips() {
        let mesh = unit_square_grid(5);
        let uv = harmonic_disk(&mesh, &DirectSolver).unwrap();
        assert_eq!(uv.flipped_faces(&mesh), 0);
    }

    #[test]
    fn test_system_shape() {
        let mesh = disk(3, 8, 0.0);
        let uv = circle_boundary_uvs(&mesh).unwrap();
        let (partition, system) = harmonic_system(&mesh, &uv).unwrap();
        assert_eq!(partition.num_free(), 1 + 2 * 8);
        assert_eq!(system.n(), 17);
        assert_eq!(system.m(), 2);
    }

    #[test]
    fn test_closed_mesh_rejected() {
        let mesh = icosahedron();
        let mut uv = UVMap::zeros(mesh.num_vertices());
        assert!(matches!(
            harmonic_parameterization(&mesh, &mut uv, &DirectSolver),
            Err(MeshError::InvalidState(_))
        ));
        assert!(matches!(circle_boundary_uvs(&mesh), Err(MeshError::InvalidState(_))));
    }

    #[test]
    fn test_uv_length_checked() {
        let mesh = disk(2, 6, 0.0);
        let mut uv = UVMap::zeros(3);
        assert!(matches!(
            harmonic_parameterization(&mesh, &mut uv, &DirectSolver),
            Err(MeshError::DimensionMismatch { what: "UV map", .. })
        ));
    }

    #[test]
    fn test_all_boundary_is_noop() {
        use crate::mesh::build_from_triangles;
        use nalgebra::Point3;

        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ];
        let mesh: HalfEdgeMesh = build_from_triangles(&vertices, &[[0, 1, 2]]).unwrap();
        let mut uv = circle_boundary_uvs(&mesh).unwrap();
        let before = uv.clone();
        harmonic_parameterization(&mesh, &mut uv, &DirectSolver).unwrap();
        assert_eq!(uv, before);
        assert_eq!(uv.flipped_faces(&mesh), 0);
    }
}
