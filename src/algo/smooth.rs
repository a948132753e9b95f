//! Laplacian mesh smoothing.
//!
//! # Algorithms
//!
//! - [`explicit_smooth`]: repeated forward steps `p += λ·L(p)` along the
//!   cotangent Laplace vector; edge weights come from the input shape, the
//!   Laplace vectors are recomputed each round
//! - [`implicit_smooth`]: one backward-Euler diffusion step over the interior
//!   vertices, with boundary and pinned vertices held as Dirichlet values
//! - [`implicit_smooth_full`]: the same diffusion step posed over every
//!   vertex, with identity rows holding the boundary
//!
//! The implicit variants are unconditionally stable and take large time steps;
//! they need a [`SparseSolver`].
//!
//! # Example
//!
//! ```
//! use coral::prelude::*;
//! use coral::algo::smooth::{implicit_smooth, ImplicitSmoothOptions};
//! use coral::sparse::DirectSolver;
//! use nalgebra::Point3;
//!
//! let mut vertices = Vec::new();
//! for j in 0..4 {
//!     for i in 0..4 {
//!         vertices.push(Point3::new(i as f64, j as f64, 0.0));
//!     }
//! }
//! vertices[5].z = 0.5;
//! let mut faces = Vec::new();
//! for j in 0..3 {
//!     for i in 0..3 {
//!         let v = j * 4 + i;
//!         faces.push([v, v + 1, v + 5]);
//!         faces.push([v, v + 5, v + 4]);
//!     }
//! }
//! let mut mesh: HalfEdgeMesh = build_from_triangles(&vertices, &faces).unwrap();
//!
//! let options = ImplicitSmoothOptions::default().with_timestep(0.5);
//! implicit_smooth(&mut mesh, &options, &DirectSolver).unwrap();
//! assert!(mesh.position(VertexId::new(5)).z < 0.5);
//! ```
//!
//! # References
//!
//! - Desbrun, M., Meyer, M., Schröder, P., & Barr, A. H. (1999). "Implicit
//!   Fairing of Irregular Meshes using Diffusion and Curvature Flow."

use nalgebra::{DMatrix, Point3};

use super::diffgeo::{cot_edge_weights, cot_edge_weights_impl, mixed_voronoi_areas};
use super::laplace::laplace_vectors;
use super::partition::VertexPartition;
use super::Progress;
use crate::error::{MeshError, Result};
use crate::mesh::{HalfEdgeMesh, MeshIndex, VertexId};
use crate::sparse::{LinearSystem, SolverKind, SparseSolver, TripletMatrix};

/// Options for explicit smoothing.
#[derive(Debug, Clone)]
pub struct SmoothOptions {
    /// Number of smoothing iterations.
    pub iterations: usize,

    /// Step size along the Laplace vector.
    pub lambda: f64,

    /// Whether to preserve boundary vertices (don't move them).
    pub preserve_boundary: bool,

    /// Whether to use parallel execution (default: true).
    pub parallel: bool,
}

impl Default for SmoothOptions {
    fn default() -> Self {
        Self {
            iterations: 1,
            lambda: 0.5,
            preserve_boundary: true,
            parallel: true,
        }
    }
}

impl SmoothOptions {
    /// Set the number of iterations.
    pub fn with_iterations(mut self, iterations: usize) -> Self {
        self.iterations = iterations;
        self
    }

    /// Set the step size.
    pub fn with_lambda(mut self, lambda: f64) -> Self {
        self.lambda = lambda;
        self
    }

    /// Let boundary vertices move along their own Laplace vectors.
    pub fn allow_boundary_movement(mut self) -> Self {
        self.preserve_boundary = false;
        self
    }

    /// Set whether to use parallel execution.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Run single-threaded.
    pub fn sequential(mut self) -> Self {
        self.parallel = false;
        self
    }
}

/// Explicit cotangent-Laplacian smoothing.
///
/// The cotangent edge weights are computed once from the input positions.
/// Each iteration recomputes the Laplace vectors with those weights, then
/// moves every vertex by `λ·L(p)`. Boundary vertices stay put unless
/// [`SmoothOptions::allow_boundary_movement`] is set.
///
/// # Errors
///
/// [`MeshError::InvalidParameter`] if `lambda` is not finite.
///
/// # Example
///
/// ```
/// use coral::prelude::*;
/// use coral::algo::smooth::{explicit_smooth, SmoothOptions};
/// use nalgebra::Point3;
///
/// let vertices = vec![
///     Point3::new(0.0, 0.0, 0.0),
///     Point3::new(1.0, 0.0, 0.0),
///     Point3::new(0.5, 1.0, 0.0),
/// ];
/// let mut mesh: HalfEdgeMesh = build_from_triangles(&vertices, &[[0, 1, 2]]).unwrap();
///
/// let options = SmoothOptions::default().with_iterations(5).with_lambda(0.3);
/// explicit_smooth(&mut mesh, &options).unwrap();
/// ```
pub fn explicit_smooth<I: MeshIndex>(mesh: &mut HalfEdgeMesh<I>, options: &SmoothOptions) -> Result<()> {
    explicit_smooth_with_progress(mesh, options, &Progress::none())
}

/// Explicit smoothing with progress reporting, one report per iteration.
pub fn explicit_smooth_with_progress<I: MeshIndex>(
    mesh: &mut HalfEdgeMesh<I>,
    options: &SmoothOptions,
    progress: &Progress,
) -> Result<()> {
    if !options.lambda.is_finite() {
        return Err(MeshError::invalid_param("lambda", options.lambda, "must be finite"));
    }
    if options.iterations == 0 || mesh.num_vertices() == 0 {
        return Ok(());
    }

    let weights = cot_edge_weights_impl(mesh, options.parallel);
    for iter in 0..options.iterations {
        progress.report(iter, options.iterations, "Explicit smoothing");

        let laplace = laplace_vectors(mesh, &weights, !options.preserve_boundary, options.parallel);

        for (i, l) in laplace.into_iter().enumerate() {
            let v = VertexId::new(i);
            let p = mesh.position(v) + l * options.lambda;
            mesh.set_position(v, p);
        }
    }
    progress.report(options.iterations, options.iterations, "Explicit smoothing");

    Ok(())
}

/// Options for implicit smoothing.
#[derive(Debug, Clone)]
pub struct ImplicitSmoothOptions<I: MeshIndex = u32> {
    /// Diffusion time step; larger values smooth more.
    pub timestep: f64,

    /// Extra vertices held fixed in addition to the boundary.
    pub pinned: Vec<VertexId<I>>,
}

impl<I: MeshIndex> Default for ImplicitSmoothOptions<I> {
    fn default() -> Self {
        Self {
            timestep: 1e-3,
            pinned: Vec::new(),
        }
    }
}

impl<I: MeshIndex> ImplicitSmoothOptions<I> {
    /// Set the time step.
    pub fn with_timestep(mut self, timestep: f64) -> Self {
        self.timestep = timestep;
        self
    }

    /// Replace the pinned vertex set.
    pub fn with_pinned(mut self, pinned: Vec<VertexId<I>>) -> Self {
        self.pinned = pinned;
        self
    }

    /// Pin one more vertex.
    pub fn pin(mut self, v: VertexId<I>) -> Self {
        self.pinned.push(v);
        self
    }
}

fn check_timestep(timestep: f64) -> Result<()> {
    if !timestep.is_finite() {
        return Err(MeshError::invalid_param("timestep", timestep, "must be finite"));
    }
    if timestep < 0.0 {
        return Err(MeshError::invalid_param("timestep", timestep, "must be non-negative"));
    }
    Ok(())
}

/// Assemble the reduced implicit smoothing system.
///
/// Row `k` belongs to the `k`-th free vertex `i`:
///
/// ```text
/// (2·A_i + t·Σ_j w_ij) x_i - t·Σ_{j free} w_ij x_j = 2·A_i p_i + t·Σ_{j fixed} w_ij p_j
/// ```
///
/// with cotangent weights floored at zero, so the matrix is symmetric
/// positive definite. `B` has three columns (x, y, z).
pub fn implicit_smooth_system<I: MeshIndex>(
    mesh: &HalfEdgeMesh<I>,
    options: &ImplicitSmoothOptions<I>,
) -> Result<(VertexPartition<I>, LinearSystem)> {
    check_timestep(options.timestep)?;
    let t = options.timestep;

    let partition = VertexPartition::new(mesh, &options.pinned)?;
    let n = partition.num_free();
    let weights: Vec<f64> = cot_edge_weights(mesh).into_iter().map(|w| w.max(0.0)).collect();
    let areas = mixed_voronoi_areas(mesh);

    let mut a = TripletMatrix::with_capacity(n, n, n * 7);
    let mut b = TripletMatrix::with_capacity(n, 3, n * 3);

    for (row, &v) in partition.free_vertices().iter().enumerate() {
        let mass = 2.0 * areas[v.index()];
        let mut rhs = mesh.position(v).coords * mass;
        let mut total = 0.0;

        for he in mesh.vertex_halfedges(v) {
            let u = mesh.dest(he);
            let w = weights[he.edge().index()];
            total += w;
            match partition.compact_index(u) {
                Some(col) => a.push(row, col, -t * w),
                None => rhs += mesh.position(u).coords * (t * w),
            }
        }

        a.push(row, row, mass + t * total);
        for c in 0..3 {
            b.push(row, c, rhs[c]);
        }
    }

    log::debug!("implicit smoothing: {} free of {} vertices", n, mesh.num_vertices());
    Ok((partition, LinearSystem::new(a, b)))
}

/// Implicit smoothing over the interior vertices.
///
/// Boundary vertices and [`ImplicitSmoothOptions::pinned`] vertices keep
/// their positions. A time step of zero leaves the mesh unchanged.
///
/// # Errors
///
/// - [`MeshError::InvalidParameter`] for a negative or non-finite time step
///   or an out-of-range pinned vertex
/// - any error of the solver; positions are untouched on failure
pub fn implicit_smooth<I: MeshIndex>(
    mesh: &mut HalfEdgeMesh<I>,
    options: &ImplicitSmoothOptions<I>,
    solver: &dyn SparseSolver,
) -> Result<()> {
    let (partition, system) = implicit_smooth_system(mesh, options)?;
    if partition.num_free() == 0 || options.timestep == 0.0 {
        return Ok(());
    }

    let x = system.solve(SolverKind::SymmetricPositiveDefinite, solver)?;
    scatter(mesh, partition.free_vertices().iter().copied(), &x);
    Ok(())
}

/// Assemble the implicit smoothing system over all vertices.
///
/// Boundary vertices get identity rows with their current position on the
/// right; interior rows carry the diffusion step of
/// [`implicit_smooth_system`] with unfloored weights. The matrix is not
/// symmetric.
pub fn implicit_smooth_full_system<I: MeshIndex>(
    mesh: &HalfEdgeMesh<I>,
    timestep: f64,
) -> Result<LinearSystem> {
    check_timestep(timestep)?;
    let t = timestep;
    let n = mesh.num_vertices();
    let weights = cot_edge_weights(mesh);
    let areas = mixed_voronoi_areas(mesh);

    let mut a = TripletMatrix::with_capacity(n, n, n * 7);
    let mut b = TripletMatrix::with_capacity(n, 3, n * 3);

    for v in mesh.vertex_ids() {
        let i = v.index();
        let p = mesh.position(v);
        if mesh.is_boundary_vertex(v) {
            a.push(i, i, 1.0);
            for c in 0..3 {
                b.push(i, c, p[c]);
            }
            continue;
        }

        let mass = 2.0 * areas[i];
        let mut total = 0.0;
        for he in mesh.vertex_halfedges(v) {
            let w = weights[he.edge().index()];
            total += w;
            a.push(i, mesh.dest(he).index(), -t * w);
        }
        a.push(i, i, mass + t * total);
        for c in 0..3 {
            b.push(i, c, mass * p[c]);
        }
    }

    log::debug!("full implicit smoothing: {} vertices", n);
    Ok(LinearSystem::new(a, b))
}

/// Implicit smoothing posed over every vertex, solved with a general solver.
///
/// A time step of zero leaves the mesh unchanged.
///
/// # Errors
///
/// [`MeshError::InvalidParameter`] for a negative or non-finite time step,
/// and any error of the solver.
pub fn implicit_smooth_full<I: MeshIndex>(
    mesh: &mut HalfEdgeMesh<I>,
    timestep: f64,
    solver: &dyn SparseSolver,
) -> Result<()> {
    if mesh.num_vertices() == 0 {
        return Ok(());
    }
    let system = implicit_smooth_full_system(mesh, timestep)?;
    if timestep == 0.0 {
        return Ok(());
    }
    let x = system.solve(SolverKind::General, solver)?;
    let all: Vec<VertexId<I>> = mesh.vertex_ids().collect();
    scatter(mesh, all.into_iter(), &x);
    Ok(())
}

/// Write row `k` of `x` to the `k`-th vertex of `targets`.
fn scatter<I: MeshIndex>(
    mesh: &mut HalfEdgeMesh<I>,
    targets: impl Iterator<Item = VertexId<I>>,
    x: &DMatrix<f64>,
) {
    for (k, v) in targets.enumerate() {
        mesh.set_position(v, Point3::new(x[(k, 0)], x[(k, 1)], x[(k, 2)]));
    }
}
