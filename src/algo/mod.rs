//! Geometry processing on half-edge meshes.
//!
//! The modules build on each other, leaf-first:
//!
//! - **Differential geometry core** ([`diffgeo`]): clamped cotangents, face
//!   and vertex normals, mixed Voronoi areas, cotangent edge weights
//! - **Laplace operators** ([`laplace`], [`matrix`]): per-vertex Laplace
//!   vectors and sparse operator matrices
//! - **Curvature** ([`curvature`]): mean, Gaussian and principal curvature,
//!   principal direction fields
//! - **Linear-system applications** ([`smooth`], [`parameterize`],
//!   [`reconstruct`]): smoothing, harmonic parameterization, least-squares
//!   reconstruction, all solved through a [`crate::sparse::SparseSolver`]
//!
//! Per-vertex and per-edge kernels run in parallel with rayon over a
//! read-only mesh; position updates are written back in a second phase.

pub mod curvature;
pub mod diffgeo;
pub mod laplace;
pub mod matrix;
pub mod parameterize;
pub mod partition;
pub mod progress;
pub mod reconstruct;
pub mod smooth;

pub use progress::Progress;
