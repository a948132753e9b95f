//! # Coral
//!
//! Discrete differential geometry on triangle meshes.
//!
//! Coral estimates per-vertex differential quantities on a half-edge mesh
//! (normals, mean, Gaussian and principal curvature, principal directions),
//! builds discrete Laplace–Beltrami operators as dense vectors and sparse
//! triplet matrices, and uses them for linear-system geometry processing:
//! explicit and implicit smoothing, harmonic parameterization and
//! least-squares reconstruction.
//!
//! ## Features
//!
//! - **Half-edge data structure**: O(1) adjacency queries with type-safe indices
//! - **Flexible indexing**: Support for 16-bit, 32-bit, and 64-bit indices
//! - **Parallel kernels**: per-vertex and per-edge passes run on rayon
//! - **Pluggable solvers**: direct (LU / sparse Cholesky) and conjugate gradient
//!   behind the [`sparse::SparseSolver`] trait
//! - **OBJ I/O** with texture coordinates
//!
//! ## Quick Start
//!
//! ```no_run
//! use coral::prelude::*;
//! use coral::algo::curvature::compute_curvature;
//!
//! let mesh: HalfEdgeMesh = coral::io::load("model.obj").unwrap();
//! let curvature = compute_curvature(&mesh);
//!
//! for v in mesh.vertex_ids() {
//!     println!("{:?}: H={:.4} K={:.4}", v, curvature.mean(v), curvature.gaussian(v));
//! }
//! ```
//!
//! ## Building Meshes Programmatically
//!
//! ```
//! use coral::prelude::*;
//! use nalgebra::Point3;
//!
//! let vertices = vec![
//!     Point3::new(0.0, 0.0, 0.0),
//!     Point3::new(1.0, 0.0, 0.0),
//!     Point3::new(0.5, 1.0, 0.0),
//!     Point3::new(0.5, 0.5, 1.0),
//! ];
//!
//! let faces = vec![
//!     [0, 2, 1],  // bottom
//!     [0, 1, 3],  // front
//!     [1, 2, 3],  // right
//!     [2, 0, 3],  // left
//! ];
//!
//! let mesh: HalfEdgeMesh = build_from_triangles(&vertices, &faces).unwrap();
//! assert_eq!(mesh.num_vertices(), 4);
//! assert!(mesh.is_closed());
//! ```
//!
//! ## Smoothing
//!
//! ```
//! use coral::prelude::*;
//! use coral::algo::smooth::{implicit_smooth, ImplicitSmoothOptions};
//! use coral::sparse::DirectSolver;
//! use nalgebra::Point3;
//!
//! # let vertices = vec![
//! #     Point3::new(0.0, 0.0, 0.3),
//! #     Point3::new(1.0, 0.0, 0.0),
//! #     Point3::new(0.0, 1.0, 0.0),
//! #     Point3::new(-1.0, 0.0, 0.0),
//! #     Point3::new(0.0, -1.0, 0.0),
//! # ];
//! # let faces = vec![[0, 1, 2], [0, 2, 3], [0, 3, 4], [0, 4, 1]];
//! let mut mesh: HalfEdgeMesh = build_from_triangles(&vertices, &faces).unwrap();
//! let options = ImplicitSmoothOptions::default().with_timestep(0.1);
//! implicit_smooth(&mut mesh, &options, &DirectSolver).unwrap();
//!
//! // Boundary vertices stay fixed, the apex moves toward them.
//! assert!(mesh.position(VertexId::new(0)).z < 0.3);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod algo;
pub mod error;
pub mod io;
pub mod mesh;
pub mod sparse;

/// Prelude module for convenient imports.
///
/// This module re-exports the most commonly used types and functions:
///
/// ```
/// use coral::prelude::*;
/// ```
pub mod prelude {
    pub use crate::error::{MeshError, Result};
    pub use crate::mesh::{
        build_from_triangles, to_face_vertex, EdgeId, FaceId, HalfEdgeId, HalfEdgeMesh, MeshIndex,
        VertexId,
    };
}

// Re-export nalgebra types for convenience
pub use nalgebra;

#[cfg(test)]
mod tests {
    use super::prelude::*;
    use nalgebra::Point3;

    #[test]
    fn test_tetrahedron() {
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.5, 1.0, 0.0),
            Point3::new(0.5, 0.5, 1.0),
        ];
        let faces = vec![[0, 2, 1], [0, 1, 3], [1, 2, 3], [2, 0, 3]];

        let mesh: HalfEdgeMesh = build_from_triangles(&vertices, &faces).unwrap();

        assert_eq!(mesh.num_vertices(), 4);
        assert_eq!(mesh.num_edges(), 6);
        assert_eq!(mesh.num_halfedges(), 12);
        assert!(mesh.is_valid());
        assert!(mesh.vertex_ids().all(|v| !mesh.is_boundary_vertex(v)));
        assert!(mesh.vertex_ids().all(|v| mesh.valence(v) == 3));
    }
}
