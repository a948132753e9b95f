//! Sparse linear systems.
//!
//! Geometry kernels assemble their systems as [`TripletMatrix`] pairs bundled
//! in a [`LinearSystem`] and hand them to any [`SparseSolver`]. The solver
//! returns a column-major buffer which [`LinearSystem::solve`] wraps into a
//! dense `n x m` matrix for scattering back onto the mesh.
//!
//! # Example
//!
//! ```
//! use coral::sparse::{DirectSolver, LinearSystem, SolverKind, TripletMatrix};
//!
//! let mut a = TripletMatrix::new(2, 2);
//! a.push(0, 0, 2.0);
//! a.push(1, 1, 4.0);
//! let b = TripletMatrix::from_fn(2, 1, |_, _| 2.0);
//!
//! let x = LinearSystem::new(a, b)
//!     .solve(SolverKind::SymmetricPositiveDefinite, &DirectSolver)
//!     .unwrap();
//! assert!((x[(0, 0)] - 1.0).abs() < 1e-12);
//! assert!((x[(1, 0)] - 0.5).abs() < 1e-12);
//! ```

mod solver;
mod triplet;

pub use solver::{ConjugateGradientSolver, DirectSolver, SolverKind, SparseSolver};
pub use triplet::{LinearSystem, Triplet, TripletMatrix};
