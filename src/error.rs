//! Error types for coral.
//!
//! Degenerate geometry is never an error: the numeric kernels clamp or skip
//! such contributions locally. Errors are reserved for invalid input shapes,
//! solver failures and paths that are not available.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using [`MeshError`].
pub type Result<T> = std::result::Result<T, MeshError>;

/// Errors that can occur during mesh operations.
#[derive(Error, Debug)]
pub enum MeshError {
    /// The mesh has no faces.
    #[error("mesh has no faces")]
    EmptyMesh,

    /// A face references an invalid vertex index.
    #[error("face {face} references invalid vertex index {vertex}")]
    InvalidVertexIndex {
        /// The face index.
        face: usize,
        /// The invalid vertex index.
        vertex: usize,
    },

    /// A face has duplicate vertex indices.
    #[error("face {face} is degenerate (has duplicate vertices)")]
    DegenerateFace {
        /// The face index.
        face: usize,
    },

    /// The mesh has non-manifold topology.
    #[error("mesh has non-manifold topology: {details}")]
    NonManifold {
        /// Description of the non-manifold condition.
        details: String,
    },

    /// A directed edge is used by more than one face.
    #[error("edge ({v0}, {v1}) has more than two incident faces or inconsistent winding")]
    NonManifoldEdge {
        /// First vertex of the edge.
        v0: usize,
        /// Second vertex of the edge.
        v1: usize,
    },

    /// Two sequences that must agree in length do not.
    #[error("dimension mismatch for {what}: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// What was being checked.
        what: &'static str,
        /// The expected size.
        expected: usize,
        /// The size that was supplied.
        actual: usize,
    },

    /// The coefficient matrix of a linear system is singular.
    #[error("linear system of dimension {dim} is singular")]
    SingularMatrix {
        /// Dimension of the system.
        dim: usize,
    },

    /// A symmetric positive-definite solve was requested on a matrix that is not.
    #[error("matrix of dimension {dim} is not symmetric positive definite")]
    NotPositiveDefinite {
        /// Dimension of the system.
        dim: usize,
    },

    /// The solver does not implement the requested factorization kind.
    #[error("solver does not support {kind}")]
    UnsupportedSolverKind {
        /// Name of the requested kind.
        kind: &'static str,
    },

    /// The requested operation has no working implementation.
    #[error("{0} is not implemented")]
    NotImplemented(&'static str),

    /// File I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Error loading mesh from file.
    #[error("failed to load mesh from {path}: {message}")]
    LoadError {
        /// The file path.
        path: PathBuf,
        /// Error message.
        message: String,
    },

    /// Error saving mesh to file.
    #[error("failed to save mesh to {path}: {message}")]
    SaveError {
        /// The file path.
        path: PathBuf,
        /// Error message.
        message: String,
    },

    /// Unsupported file format.
    #[error("unsupported file format: {extension}")]
    UnsupportedFormat {
        /// The file extension.
        extension: String,
    },

    /// Invalid mesh state for the requested operation.
    #[error("invalid mesh state: {0}")]
    InvalidState(String),

    /// Iterative solver failed to converge.
    #[error("solver failed to converge after {iterations} iterations")]
    ConvergenceFailed {
        /// Number of iterations attempted.
        iterations: usize,
    },

    /// Invalid parameter value.
    #[error("invalid parameter: {name} = {value} ({reason})")]
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// The invalid value (as string).
        value: String,
        /// Reason the value is invalid.
        reason: &'static str,
    },
}

impl MeshError {
    /// Create an invalid parameter error.
    pub fn invalid_param<T: std::fmt::Display>(
        name: &'static str,
        value: T,
        reason: &'static str,
    ) -> Self {
        MeshError::InvalidParameter {
            name,
            value: value.to_string(),
            reason,
        }
    }

    /// Create a dimension mismatch error.
    pub fn dimension(what: &'static str, expected: usize, actual: usize) -> Self {
        MeshError::DimensionMismatch {
            what,
            expected,
            actual,
        }
    }
}

/// Fail with [`MeshError::DimensionMismatch`] unless `actual == expected`.
pub(crate) fn ensure_len(what: &'static str, expected: usize, actual: usize) -> Result<()> {
    if expected == actual {
        Ok(())
    } else {
        Err(MeshError::dimension(what, expected, actual))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ensure_len() {
        assert!(ensure_len("field", 3, 3).is_ok());
        match ensure_len("field", 3, 2) {
            Err(MeshError::DimensionMismatch {
                what,
                expected,
                actual,
            }) => {
                assert_eq!(what, "field");
                assert_eq!(expected, 3);
                assert_eq!(actual, 2);
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_error_messages() {
        let e = MeshError::NotImplemented("least-squares mesh reconstruction");
        assert_eq!(e.to_string(), "least-squares mesh reconstruction is not implemented");

        let e = MeshError::invalid_param("timestep", -1.0, "must be non-negative");
        assert_eq!(
            e.to_string(),
            "invalid parameter: timestep = -1 (must be non-negative)"
        );
    }
}
