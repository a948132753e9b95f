//! Coordinate-format sparse matrices and linear-system bundles.

use nalgebra::DMatrix;
use nalgebra_sparse::CooMatrix;

use super::solver::{SolverKind, SparseSolver};
use crate::error::{MeshError, Result};

/// One `(row, col, value)` entry of a sparse matrix.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Triplet {
    /// Row index.
    pub row: usize,
    /// Column index.
    pub col: usize,
    /// Entry value.
    pub value: f64,
}

impl Triplet {
    /// Create a triplet.
    #[inline]
    pub fn new(row: usize, col: usize, value: f64) -> Self {
        Self { row, col, value }
    }
}

/// A sparse matrix stored as an append-only list of triplets.
///
/// Duplicate `(row, col)` entries are kept as pushed; every consumer sums
/// them. Entries are not range-checked on push, only when the matrix is
/// converted or solved.
#[derive(Debug, Clone, PartialEq)]
pub struct TripletMatrix {
    nrows: usize,
    ncols: usize,
    triplets: Vec<Triplet>,
}

impl TripletMatrix {
    /// Create an empty `nrows x ncols` matrix.
    pub fn new(nrows: usize, ncols: usize) -> Self {
        Self {
            nrows,
            ncols,
            triplets: Vec::new(),
        }
    }

    /// Create an empty matrix with room for `capacity` triplets.
    pub fn with_capacity(nrows: usize, ncols: usize, capacity: usize) -> Self {
        Self {
            nrows,
            ncols,
            triplets: Vec::with_capacity(capacity),
        }
    }

    /// Dense `nrows x ncols` matrix with one triplet per entry, `value(row, col)`.
    pub fn from_fn<F>(nrows: usize, ncols: usize, mut value: F) -> Self
    where
        F: FnMut(usize, usize) -> f64,
    {
        let mut m = Self::with_capacity(nrows, ncols, nrows * ncols);
        for col in 0..ncols {
            for row in 0..nrows {
                m.push(row, col, value(row, col));
            }
        }
        m
    }

    /// Append an entry.
    #[inline]
    pub fn push(&mut self, row: usize, col: usize, value: f64) {
        self.triplets.push(Triplet::new(row, col, value));
    }

    /// Number of rows.
    #[inline]
    pub fn nrows(&self) -> usize {
        self.nrows
    }

    /// Number of columns.
    #[inline]
    pub fn ncols(&self) -> usize {
        self.ncols
    }

    /// `(nrows, ncols)`.
    #[inline]
    pub fn shape(&self) -> (usize, usize) {
        (self.nrows, self.ncols)
    }

    /// Number of stored triplets, duplicates included.
    #[inline]
    pub fn nnz(&self) -> usize {
        self.triplets.len()
    }

    /// The stored triplets in push order.
    #[inline]
    pub fn triplets(&self) -> &[Triplet] {
        &self.triplets
    }

    /// Iterate over the stored triplets.
    pub fn iter(&self) -> impl Iterator<Item = &Triplet> {
        self.triplets.iter()
    }

    /// Value at `(row, col)`, summing duplicates.
    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.triplets
            .iter()
            .filter(|t| t.row == row && t.col == col)
            .map(|t| t.value)
            .sum()
    }

    /// Check that every triplet lies inside the declared shape.
    pub fn validate(&self) -> Result<()> {
        for t in &self.triplets {
            if t.row >= self.nrows {
                return Err(MeshError::dimension("triplet row bound", self.nrows, t.row + 1));
            }
            if t.col >= self.ncols {
                return Err(MeshError::dimension("triplet column bound", self.ncols, t.col + 1));
            }
        }
        Ok(())
    }

    /// Convert to a `nalgebra_sparse` COO matrix.
    pub fn to_coo(&self) -> Result<CooMatrix<f64>> {
        self.validate()?;
        let mut coo = CooMatrix::new(self.nrows, self.ncols);
        for t in &self.triplets {
            coo.push(t.row, t.col, t.value);
        }
        Ok(coo)
    }

    /// Convert to a dense matrix, summing duplicates.
    pub fn to_dense(&self) -> Result<DMatrix<f64>> {
        self.validate()?;
        let mut dense = DMatrix::zeros(self.nrows, self.ncols);
        for t in &self.triplets {
            dense[(t.row, t.col)] += t.value;
        }
        Ok(dense)
    }
}

impl<'a> IntoIterator for &'a TripletMatrix {
    type Item = &'a Triplet;
    type IntoIter = std::slice::Iter<'a, Triplet>;

    fn into_iter(self) -> Self::IntoIter {
        self.triplets.iter()
    }
}

/// A linear system `A X = B` in triplet form.
///
/// `A` is `n x n` for the square systems, or `rows x n` for overdetermined
/// ones; `B` has one column per right-hand side.
#[derive(Debug, Clone, PartialEq)]
pub struct LinearSystem {
    /// Coefficient matrix.
    pub a: TripletMatrix,
    /// Right-hand sides.
    pub b: TripletMatrix,
}

impl LinearSystem {
    /// Bundle a coefficient matrix and its right-hand sides.
    pub fn new(a: TripletMatrix, b: TripletMatrix) -> Self {
        Self { a, b }
    }

    /// Number of unknowns per right-hand side.
    #[inline]
    pub fn n(&self) -> usize {
        self.a.ncols()
    }

    /// Number of right-hand sides.
    #[inline]
    pub fn m(&self) -> usize {
        self.b.ncols()
    }

    /// Solve with `solver` and return the `n x m` solution.
    pub fn solve(&self, kind: SolverKind, solver: &dyn SparseSolver) -> Result<DMatrix<f64>> {
        let (n, m) = (self.n(), self.m());
        log::debug!(
            "solving {}x{} system ({} nonzeros, {} rhs, {:?})",
            self.a.nrows(),
            n,
            self.a.nnz(),
            m,
            kind
        );
        let data = solver.solve(kind, &self.a, &self.b)?;
        if data.len() != n * m {
            return Err(MeshError::dimension("solver output", n * m, data.len()));
        }
        Ok(DMatrix::from_vec(n, m, data))
    }
}
