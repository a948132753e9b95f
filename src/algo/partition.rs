//! Free/constrained vertex partitions for Dirichlet problems.

use crate::error::{MeshError, Result};
use crate::mesh::{HalfEdgeMesh, MeshIndex, VertexId};

/// Splits the vertices of a mesh into free unknowns and constrained values.
///
/// Boundary vertices and vertices pinned by the caller are constrained; every
/// other vertex is free and receives a compact index `0..num_free()` in
/// vertex order.
#[derive(Debug, Clone)]
pub struct VertexPartition<I: MeshIndex = u32> {
    free: Vec<VertexId<I>>,
    compact: Vec<Option<usize>>,
}

impl<I: MeshIndex> VertexPartition<I> {
    /// Partition `mesh`, additionally constraining `pinned`.
    pub fn new(mesh: &HalfEdgeMesh<I>, pinned: &[VertexId<I>]) -> Result<Self> {
        let n = mesh.num_vertices();
        let mut constrained: Vec<bool> = mesh.vertex_ids().map(|v| mesh.is_boundary_vertex(v)).collect();
        for &v in pinned {
            if !v.is_valid() || v.index() >= n {
                return Err(MeshError::invalid_param(
                    "pinned",
                    format!("{:?}", v),
                    "vertex index out of range",
                ));
            }
            constrained[v.index()] = true;
        }

        let mut free = Vec::new();
        let mut compact = vec![None; n];
        for (i, c) in constrained.into_iter().enumerate() {
            if !c {
                compact[i] = Some(free.len());
                free.push(VertexId::new(i));
            }
        }

        Ok(Self { free, compact })
    }

    /// Number of free vertices.
    #[inline]
    pub fn num_free(&self) -> usize {
        self.free.len()
    }

    /// Free vertices in compact order.
    #[inline]
    pub fn free_vertices(&self) -> &[VertexId<I>] {
        &self.free
    }

    /// Compact index of `v`, or `None` if it is constrained.
    #[inline]
    pub fn compact_index(&self, v: VertexId<I>) -> Option<usize> {
        self.compact[v.index()]
    }

    /// Whether `v` is constrained.
    #[inline]
    pub fn is_constrained(&self, v: VertexId<I>) -> bool {
        self.compact[v.index()].is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::test_meshes::{flat_grid, grid_index, icosahedron};

    #[test]
    fn test_grid_partition() {
        let mesh = flat_grid(3);
        let p = VertexPartition::new(&mesh, &[]).unwrap();
        assert_eq!(p.num_free(), 4);
        for (k, &v) in p.free_vertices().iter().enumerate() {
            assert!(!mesh.is_boundary_vertex(v));
            assert_eq!(p.compact_index(v), Some(k));
        }
        assert!(p.is_constrained(VertexId::new(0)));
    }

    #[test]
    fn test_pinned_vertices() {
        let mesh = flat_grid(3);
        let pinned = VertexId::new(grid_index(3, 1, 1));
        let p = VertexPartition::new(&mesh, &[pinned]).unwrap();
        assert_eq!(p.num_free(), 3);
        assert!(p.is_constrained(pinned));
        assert_eq!(p.compact_index(VertexId::new(grid_index(3, 2, 1))), Some(0));
    }

    #[test]
    fn test_closed_mesh_all_free() {
        let mesh = icosahedron();
        let p = VertexPartition::new(&mesh, &[]).unwrap();
        assert_eq!(p.num_free(), 12);
    }

    #[test]
    fn test_pinned_out_of_range() {
        let mesh = icosahedron();
        assert!(matches!(
            VertexPartition::new(&mesh, &[VertexId::new(99)]),
            Err(MeshError::InvalidParameter { .. })
        ));
    }
}
