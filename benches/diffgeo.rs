//! Benchmarks for the differential geometry kernels and solvers.

use criterion::{criterion_group, criterion_main, Criterion};
use coral::algo::{curvature, diffgeo, laplace, smooth};
use coral::prelude::*;
use coral::sparse::{ConjugateGradientSolver, DirectSolver};
use nalgebra::Point3;

/// Wavy height field over an `n x n` grid.
fn create_wavy_grid(n: usize) -> HalfEdgeMesh {
    let mut vertices = Vec::with_capacity((n + 1) * (n + 1));
    let mut faces = Vec::with_capacity(n * n * 2);

    let h = 1.0 / n as f64;
    for j in 0..=n {
        for i in 0..=n {
            let (x, y) = (i as f64 * h, j as f64 * h);
            let z = 0.1 * (6.0 * x).sin() * (4.0 * y).cos();
            vertices.push(Point3::new(x, y, z));
        }
    }

    for j in 0..n {
        for i in 0..n {
            let v00 = j * (n + 1) + i;
            let v10 = v00 + 1;
            let v01 = v00 + (n + 1);
            let v11 = v01 + 1;

            faces.push([v00, v10, v11]);
            faces.push([v00, v11, v01]);
        }
    }

    build_from_triangles(&vertices, &faces).unwrap()
}

fn bench_kernels(c: &mut Criterion) {
    let mesh = create_wavy_grid(100);

    c.bench_function("cot_edge_weights_100", |b| {
        b.iter(|| diffgeo::cot_edge_weights(&mesh))
    });

    c.bench_function("mixed_voronoi_areas_100", |b| {
        b.iter(|| diffgeo::mixed_voronoi_areas(&mesh))
    });

    c.bench_function("cotangent_laplace_100", |b| {
        b.iter(|| laplace::cotangent_laplace(&mesh))
    });
}

fn bench_curvature(c: &mut Criterion) {
    let mesh = create_wavy_grid(100);

    c.bench_function("curvature_parallel_100", |b| {
        b.iter(|| curvature::compute_curvature(&mesh))
    });

    c.bench_function("curvature_sequential_100", |b| {
        b.iter(|| curvature::compute_curvature_sequential(&mesh))
    });
}

fn bench_smoothing(c: &mut Criterion) {
    let mesh = create_wavy_grid(30);

    c.bench_function("explicit_smooth_10_iterations", |b| {
        let options = smooth::SmoothOptions::default().with_iterations(10);
        b.iter(|| {
            let mut m = mesh.clone();
            smooth::explicit_smooth(&mut m, &options).unwrap();
            m
        })
    });

    let options = smooth::ImplicitSmoothOptions::default().with_timestep(1e-3);

    c.bench_function("implicit_smooth_direct", |b| {
        b.iter(|| {
            let mut m = mesh.clone();
            smooth::implicit_smooth(&mut m, &options, &DirectSolver).unwrap();
            m
        })
    });

    c.bench_function("implicit_smooth_cg", |b| {
        let solver = ConjugateGradientSolver::new();
        b.iter(|| {
            let mut m = mesh.clone();
            smooth::implicit_smooth(&mut m, &options, &solver).unwrap();
            m
        })
    });
}

criterion_group!(benches, bench_kernels, bench_curvature, bench_smoothing);
criterion_main!(benches);
