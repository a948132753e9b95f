//! UV parameterization.
//!
//! Maps a disk-like mesh into the plane by fixing its boundary loop on a
//! convex curve and solving a cotangent-weighted Laplace equation for the
//! interior ([`harmonic_parameterization`]).
//!
//! # Requirements
//!
//! The mesh must have a boundary. Closed meshes must first be cut.
//!
//! # Example
//!
//! ```no_run
//! use coral::prelude::*;
//! use coral::algo::parameterize::harmonic_disk;
//! use coral::sparse::DirectSolver;
//!
//! let mesh: HalfEdgeMesh = coral::io::load("input.obj").unwrap();
//! let uv_map = harmonic_disk(&mesh, &DirectSolver).unwrap();
//!
//! for vid in mesh.vertex_ids() {
//!     let uv = uv_map.get(vid);
//!     println!("Vertex {:?}: u={:.3}, v={:.3}", vid, uv.x, uv.y);
//! }
//! ```
//!
//! # References
//!
//! - Floater, M. S. (1997). "Parametrization and smooth approximation of
//!   surface triangulations." Computer Aided Geometric Design.
//! - Eck, M., et al. (1995). "Multiresolution analysis of arbitrary meshes."
//!   SIGGRAPH.

mod harmonic;
mod uv;

pub use harmonic::{circle_boundary_uvs, harmonic_disk, harmonic_parameterization, harmonic_system};
pub use uv::UVMap;
