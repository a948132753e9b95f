//! Coral CLI - curvature, smoothing and parameterization from the command line.
//!
//! Usage: coral <COMMAND> [OPTIONS] <INPUT> [OUTPUT]
//!
//! Run `coral --help` for available commands. Set `RUST_LOG=debug` for
//! system sizes and solver details.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;

use clap::{Parser, Subcommand, ValueEnum};

use coral::algo::{curvature, diffgeo, parameterize, smooth, Progress};
use coral::io;
use coral::mesh::HalfEdgeMesh;
use coral::sparse::{ConjugateGradientSolver, DirectSolver, SparseSolver};

#[derive(Parser)]
#[command(name = "coral")]
#[command(author, version, about = "Discrete differential geometry CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Display mesh information
    Info {
        /// Input mesh file
        input: PathBuf,

        /// Show curvature statistics
        #[arg(long)]
        curvature: bool,

        /// Count feature edges sharper than this dihedral angle (degrees)
        #[arg(long)]
        feature_angle: Option<f64>,
    },

    /// Smooth a mesh
    Smooth {
        /// Input mesh file
        input: PathBuf,

        /// Output mesh file
        output: PathBuf,

        /// Smoothing method
        #[arg(short, long, value_enum, default_value = "explicit")]
        method: SmoothMethod,

        /// Number of iterations (explicit only)
        #[arg(short, long, default_value = "1")]
        iterations: usize,

        /// Step size along the Laplace vector (explicit only)
        #[arg(short, long, default_value = "0.5")]
        lambda: f64,

        /// Diffusion time step (implicit methods)
        #[arg(short, long, default_value = "0.001")]
        timestep: f64,

        /// Allow boundary vertices to move (explicit only)
        #[arg(long)]
        allow_boundary: bool,

        /// Linear solver for the implicit methods
        #[arg(long, value_enum, default_value = "direct")]
        solver: SolverChoice,

        /// Use single-threaded execution (for benchmarking)
        #[arg(long)]
        sequential: bool,
    },

    /// Flatten a disk-like mesh into the unit circle
    Parameterize {
        /// Input mesh file
        input: PathBuf,

        /// Output OBJ file with texture coordinates
        output: PathBuf,

        /// Parameterization method
        #[arg(short, long, value_enum, default_value = "harmonic")]
        method: ParameterizeMethod,
    },
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum SmoothMethod {
    /// Cotangent Laplace steps, boundary fixed by default
    Explicit,
    /// Backward-Euler diffusion over the interior vertices
    Implicit,
    /// Backward-Euler diffusion over all vertices with identity boundary rows
    ImplicitFull,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum SolverChoice {
    /// LU for general systems, sparse Cholesky for SPD systems
    Direct,
    /// Conjugate gradient (SPD systems only)
    Cg,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum ParameterizeMethod {
    /// Cotangent-weighted harmonic map with the boundary on a circle
    Harmonic,
}

impl SolverChoice {
    fn build(self) -> Box<dyn SparseSolver> {
        match self {
            SolverChoice::Direct => Box::new(DirectSolver),
            SolverChoice::Cg => Box::new(ConjugateGradientSolver::new()),
        }
    }
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Info {
            input,
            curvature: show_curvature,
            feature_angle,
        } => {
            cmd_info(&input, show_curvature, feature_angle)?;
        }

        Commands::Smooth {
            input,
            output,
            method,
            iterations,
            lambda,
            timestep,
            allow_boundary,
            solver,
            sequential,
        } => {
            let options = smooth::SmoothOptions {
                iterations,
                lambda,
                preserve_boundary: !allow_boundary,
                parallel: !sequential,
            };
            cmd_smooth(&input, &output, method, &options, timestep, solver)?;
        }

        Commands::Parameterize { input, output, method } => {
            cmd_parameterize(&input, &output, method)?;
        }
    }

    Ok(())
}

/// Create a progress reporter that displays a progress bar on the terminal.
fn create_progress() -> Progress {
    let last_percent = Arc::new(AtomicUsize::new(usize::MAX));

    Progress::new(move |current, total, message| {
        if total == 0 {
            return;
        }

        let percent = (current.min(total) * 100) / total;
        if last_percent.swap(percent, Ordering::Relaxed) == percent {
            return;
        }

        let bar_width = 30;
        let filled = (percent * bar_width) / 100;
        eprint!(
            "\r[{}{}] {:3}% {}",
            "=".repeat(filled),
            " ".repeat(bar_width - filled),
            percent,
            message
        );
        let _ = std::io::stderr().flush();

        if current >= total {
            eprintln!();
        }
    })
}

fn summarize(name: &str, values: &[f64]) {
    if values.is_empty() {
        return;
    }
    let min = values.iter().cloned().fold(f64::INFINITY, f64::min);
    let max = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let avg = values.iter().sum::<f64>() / values.len() as f64;
    println!("  {:<9} min={:.4}, max={:.4}, avg={:.4}", name, min, max, avg);
}

fn cmd_info(
    input: &Path,
    show_curvature: bool,
    feature_angle: Option<f64>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mesh: HalfEdgeMesh = io::load(input)?;

    println!("File: {}", input.display());
    println!("Vertices: {}", mesh.num_vertices());
    println!("Faces: {}", mesh.num_faces());
    println!("Edges: {}", mesh.num_edges());
    println!("Surface area: {:.6}", mesh.surface_area());

    if let Some((min, max)) = mesh.bounding_box() {
        println!(
            "Bounding box: ({:.3}, {:.3}, {:.3}) to ({:.3}, {:.3}, {:.3})",
            min.x, min.y, min.z, max.x, max.y, max.z
        );
    }

    if mesh.num_edges() > 0 {
        let total: f64 = mesh
            .edge_ids()
            .map(|e| mesh.edge_vector(e.halfedge()).norm())
            .sum();
        println!("Average edge length: {:.6}", total / mesh.num_edges() as f64);
    }

    let boundary = mesh.vertex_ids().filter(|&v| mesh.is_boundary_vertex(v)).count();
    if boundary == 0 {
        println!("Topology: Closed (no boundary)");
    } else {
        println!("Topology: Open ({} boundary vertices)", boundary);
    }

    if let Some(angle) = feature_angle {
        let sharp = diffgeo::feature_edges(&mesh, angle, false)
            .into_iter()
            .filter(|&f| f)
            .count();
        println!("Feature edges (> {} deg): {}", angle, sharp);
    }

    if show_curvature {
        println!("\nCurvature:");
        let start = Instant::now();
        let curv = curvature::compute_curvature(&mesh);
        log::info!("curvature computed in {:.2?}", start.elapsed());

        summarize("Gaussian:", curv.gaussian_values());
        summarize("Mean:", curv.mean_values());
        summarize("k_max:", curv.principal_max_values());
        summarize("k_min:", curv.principal_min_values());

        let areas = diffgeo::mixed_voronoi_areas(&mesh);
        let total_gaussian: f64 = curv
            .gaussian_values()
            .iter()
            .zip(&areas)
            .map(|(k, a)| k * a)
            .sum();
        println!(
            "  Gauss-Bonnet Euler characteristic: {:.2}",
            total_gaussian / (2.0 * std::f64::consts::PI)
        );
    }

    Ok(())
}

fn cmd_smooth(
    input: &Path,
    output: &Path,
    method: SmoothMethod,
    options: &smooth::SmoothOptions,
    timestep: f64,
    solver: SolverChoice,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut mesh: HalfEdgeMesh = io::load(input)?;
    log::info!("loaded {}: {} vertices, {} faces", input.display(), mesh.num_vertices(), mesh.num_faces());

    let start = Instant::now();
    match method {
        SmoothMethod::Explicit => {
            let mode = if options.parallel { "parallel" } else { "sequential" };
            println!(
                "Applying explicit smoothing ({} iterations, lambda={}, {})...",
                options.iterations, options.lambda, mode
            );
            smooth::explicit_smooth_with_progress(&mut mesh, options, &create_progress())?;
        }
        SmoothMethod::Implicit => {
            println!("Applying implicit smoothing (timestep={})...", timestep);
            let implicit = smooth::ImplicitSmoothOptions::default().with_timestep(timestep);
            smooth::implicit_smooth(&mut mesh, &implicit, &*solver.build())?;
        }
        SmoothMethod::ImplicitFull => {
            println!("Applying full implicit smoothing (timestep={})...", timestep);
            smooth::implicit_smooth_full(&mut mesh, timestep, &*solver.build())?;
        }
    }
    let elapsed = start.elapsed();

    io::save(&mesh, output)?;
    println!("Saved: {} ({:.2?})", output.display(), elapsed);

    Ok(())
}

fn cmd_parameterize(
    input: &Path,
    output: &Path,
    method: ParameterizeMethod,
) -> Result<(), Box<dyn std::error::Error>> {
    let mesh: HalfEdgeMesh = io::load(input)?;
    log::info!("loaded {}: {} vertices, {} faces", input.display(), mesh.num_vertices(), mesh.num_faces());

    let start = Instant::now();
    let mut uv = match method {
        ParameterizeMethod::Harmonic => {
            println!("Computing harmonic parameterization...");
            parameterize::harmonic_disk(&mesh, &DirectSolver)?
        }
    };
    let elapsed = start.elapsed();

    let flipped = uv.flipped_faces(&mesh);
    if flipped > 0 {
        log::warn!("{} faces are flipped in UV space", flipped);
    }

    uv.normalize();
    io::obj::save_with_uvs(&mesh, &uv, output)?;
    println!("Saved: {} ({:.2?})", output.display(), elapsed);

    Ok(())
}
