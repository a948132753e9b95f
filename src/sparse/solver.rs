//! Sparse linear solvers.
//!
//! Every solver takes a square coefficient matrix `A` and a block of
//! right-hand sides `B` in triplet form (duplicates summed) and returns the
//! solution as one flat, column-major buffer: entry `i` of column `c` lives at
//! `c * n + i`.
//!
//! Two implementations are provided:
//!
//! - [`DirectSolver`]: sparse Cholesky for symmetric positive-definite
//!   systems; general systems use dense LU when small and a sparse
//!   factorization otherwise.
//! - [`ConjugateGradientSolver`]: matrix-free CG on a CSR copy of `A`,
//!   symmetric positive-definite systems only.

use std::collections::HashMap;

use nalgebra::{DMatrix, DVector};
use nalgebra_sparse::factorization::CscCholesky;
use nalgebra_sparse::{CscMatrix, CsrMatrix};
use rayon::prelude::*;

use super::triplet::TripletMatrix;
use crate::error::{MeshError, Result};

/// Factorization requested from a [`SparseSolver`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum SolverKind {
    /// Any invertible square matrix.
    General = 0,
    /// Symmetric positive-definite matrix.
    SymmetricPositiveDefinite = 1,
}

impl SolverKind {
    /// Human-readable name.
    pub fn name(self) -> &'static str {
        match self {
            SolverKind::General => "general",
            SolverKind::SymmetricPositiveDefinite => "symmetric positive definite",
        }
    }
}

/// Solves `A X = B` for square sparse `A`.
pub trait SparseSolver: Send + Sync {
    /// Solve and return `X` column-major, `n * m` values.
    ///
    /// Singular matrices, non-SPD matrices under
    /// [`SolverKind::SymmetricPositiveDefinite`], shape mismatches and
    /// out-of-range triplets are errors.
    fn solve(&self, kind: SolverKind, a: &TripletMatrix, b: &TripletMatrix) -> Result<Vec<f64>>;
}

/// Validate shapes and return `(n, m)`.
fn check_shapes(a: &TripletMatrix, b: &TripletMatrix) -> Result<(usize, usize)> {
    let n = a.nrows();
    if a.ncols() != n {
        return Err(MeshError::dimension("coefficient matrix columns", n, a.ncols()));
    }
    if b.nrows() != n {
        return Err(MeshError::dimension("right-hand side rows", n, b.nrows()));
    }
    a.validate()?;
    b.validate()?;
    Ok((n, b.ncols()))
}

fn is_symmetric(a: &CscMatrix<f64>) -> bool {
    let entries: HashMap<(usize, usize), f64> =
        a.triplet_iter().map(|(i, j, &v)| ((i, j), v)).collect();
    entries.iter().all(|(&(i, j), &v)| {
        let mirrored = entries.get(&(j, i)).copied().unwrap_or(0.0);
        (v - mirrored).abs() <= 1e-12 * v.abs().max(mirrored.abs()).max(1.0)
    })
}

/// General systems up to this size are factored with dense LU.
pub const DENSE_LU_LIMIT: usize = 256;

/// Direct factorization solver.
///
/// SPD systems are factored with a sparse Cholesky factorization. General
/// systems of at most [`DENSE_LU_LIMIT`] unknowns use dense partial-pivoting
/// LU. Larger general systems stay sparse: symmetric ones try Cholesky
/// first, everything else is solved through the normal equations `AᵀA x =
/// Aᵀb` with one step of iterative refinement.
#[derive(Debug, Clone, Copy, Default)]
pub struct DirectSolver;

impl DirectSolver {
    /// Create a direct solver.
    pub fn new() -> Self {
        Self
    }

    fn solve_general(a: &TripletMatrix, rhs: &DMatrix<f64>, n: usize) -> Result<DMatrix<f64>> {
        if n <= DENSE_LU_LIMIT {
            Self::solve_dense_lu(a, rhs, n)
        } else {
            Self::solve_general_sparse(a, rhs, n)
        }
    }

    fn solve_dense_lu(a: &TripletMatrix, rhs: &DMatrix<f64>, n: usize) -> Result<DMatrix<f64>> {
        let lu = a.to_dense()?.lu();
        if !lu.is_invertible() {
            return Err(MeshError::SingularMatrix { dim: n });
        }

        let pivots = lu.u().diagonal();
        let largest = pivots.amax();
        let smallest = pivots.iter().fold(f64::INFINITY, |acc, p| acc.min(p.abs()));
        if smallest <= largest * f64::EPSILON * n as f64 {
            return Err(MeshError::SingularMatrix { dim: n });
        }

        lu.solve(rhs).ok_or(MeshError::SingularMatrix { dim: n })
    }

    fn solve_general_sparse(
        a: &TripletMatrix,
        rhs: &DMatrix<f64>,
        n: usize,
    ) -> Result<DMatrix<f64>> {
        let csc = CscMatrix::from(&a.to_coo()?);

        let symmetric = if is_symmetric(&csc) {
            CscCholesky::factor(&csc).ok().map(|cholesky| cholesky.solve(rhs))
        } else {
            None
        };

        let x = match symmetric {
            Some(x) => {
                log::debug!("general {}x{} system: sparse Cholesky", n, n);
                x
            }
            None => {
                log::debug!("general {}x{} system: sparse normal equations", n, n);
                let at = csc.transpose();
                let normal = &at * &csc;
                let cholesky = CscCholesky::factor(&normal)
                    .map_err(|_| MeshError::SingularMatrix { dim: n })?;
                let mut x = cholesky.solve(&mul_dense(&at, rhs));
                let residual = rhs - mul_dense(&csc, &x);
                x += cholesky.solve(&mul_dense(&at, &residual));
                x
            }
        };

        let residual = (rhs - mul_dense(&csc, &x)).norm();
        if residual.is_nan() || residual > GENERAL_RESIDUAL_TOLERANCE * rhs.norm() {
            return Err(MeshError::SingularMatrix { dim: n });
        }
        Ok(x)
    }
}

/// Relative residual above which a sparse general solve counts as singular.
const GENERAL_RESIDUAL_TOLERANCE: f64 = 1e-6;

/// `Y = A X` for a dense block `X`.
fn mul_dense(a: &CscMatrix<f64>, x: &DMatrix<f64>) -> DMatrix<f64> {
    let mut y = DMatrix::zeros(a.nrows(), x.ncols());
    for (i, j, &v) in a.triplet_iter() {
        for c in 0..x.ncols() {
            y[(i, c)] += v * x[(j, c)];
        }
    }
    y
}

impl SparseSolver for DirectSolver {
    fn solve(&self, kind: SolverKind, a: &TripletMatrix, b: &TripletMatrix) -> Result<Vec<f64>> {
        let (n, m) = check_shapes(a, b)?;
        if n == 0 || m == 0 {
            return Ok(Vec::new());
        }

        let rhs = b.to_dense()?;
        let x = match kind {
            SolverKind::General => Self::solve_general(a, &rhs, n)?,
            SolverKind::SymmetricPositiveDefinite => Self::solve_spd(a, &rhs, n)?,
        };

        if x.iter().any(|v| !v.is_finite()) {
            return Err(MeshError::SingularMatrix { dim: n });
        }
        // DMatrix storage is already column-major.
        Ok(x.as_slice().to_vec())
    }
}

/// Conjugate gradient solver for symmetric positive-definite systems.
///
/// Each right-hand side column is solved independently, in parallel.
#[derive(Debug, Clone, Copy)]
pub struct ConjugateGradientSolver {
    /// Maximum CG iterations per column.
    pub max_iterations: usize,
    /// Convergence tolerance on the relative residual norm.
    pub tolerance: f64,
}

impl Default for ConjugateGradientSolver {
    fn default() -> Self {
        Self {
            max_iterations: 1000,
            tolerance: 1e-10,
        }
    }
}

impl ConjugateGradientSolver {
    /// Create a solver with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the maximum number of iterations.
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Set the convergence tolerance.
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Solve `A x = b` for a single right-hand side.
    pub fn solve_vector(&self, a: &CsrMatrix<f64>, b: &DVector<f64>) -> Result<DVector<f64>> {
        let n = b.len();
        let mut x = DVector::zeros(n);

        let b_norm = b.norm();
        if b_norm < 1e-15 {
            return Ok(x);
        }

        let mut r = b.clone();
        let mut r_norm_sq = r.dot(&r);
        let mut p = r.clone();

        for _ in 0..self.max_iterations {
            let ap = mul_vec(a, &p);

            let p_ap = p.dot(&ap);
            if p_ap <= 0.0 {
                return Err(MeshError::NotPositiveDefinite { dim: n });
            }
            let alpha = r_norm_sq / p_ap;

            x += alpha * &p;
            r -= alpha * &ap;

            let new_r_norm_sq = r.dot(&r);
            if new_r_norm_sq.sqrt() / b_norm < self.tolerance {
                return Ok(x);
            }

            let beta = new_r_norm_sq / r_norm_sq;
            p = &r + beta * &p;
            r_norm_sq = new_r_norm_sq;
        }

        Err(MeshError::ConvergenceFailed {
            iterations: self.max_iterations,
        })
    }
}

/// `y = A x`.
fn mul_vec(a: &CsrMatrix<f64>, x: &DVector<f64>) -> DVector<f64> {
    DVector::from_iterator(
        a.nrows(),
        a.row_iter().map(|row| {
            row.col_indices()
                .iter()
                .zip(row.values())
                .map(|(&j, &v)| v * x[j])
                .sum::<f64>()
        }),
    )
}

impl SparseSolver for ConjugateGradientSolver {
    fn solve(&self, kind: SolverKind, a: &TripletMatrix, b: &TripletMatrix) -> Result<Vec<f64>> {
        if kind != SolverKind::SymmetricPositiveDefinite {
            return Err(MeshError::UnsupportedSolverKind { kind: kind.name() });
        }
        let (n, m) = check_shapes(a, b)?;
        if n == 0 || m == 0 {
            return Ok(Vec::new());
        }

        let csr = CsrMatrix::from(&a.to_coo()?);
        let rhs = b.to_dense()?;

        let columns: Vec<DVector<f64>> = (0..m)
            .into_par_iter()
            .map(|c| self.solve_vector(&csr, &rhs.column(c).into_owned()))
            .collect::<Result<_>>()?;

        Ok(columns.iter().flat_map(|c| c.iter().copied()).collect())
    }
}
