//! Benchmarks for edge-loop operations.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use edgeflow::algo::path::{find_path, PathOptions};
use edgeflow::prelude::*;
use nalgebra::Point3;

/// Quad grid with a bump, so the operators have curvature to follow.
fn create_grid_mesh(n: usize) -> HalfEdgeMesh {
    let mut vertices = Vec::with_capacity((n + 1) * (n + 1));
    let mut faces = Vec::with_capacity(n * n);

    let center = n as f64 / 2.0;
    for j in 0..=n {
        for i in 0..=n {
            let (x, y) = (i as f64, j as f64);
            let r2 = ((x - center).powi(2) + (y - center).powi(2)) / (center * center);
            vertices.push(Point3::new(x, y, (-2.0 * r2).exp() * center * 0.5));
        }
    }

    for j in 0..n {
        for i in 0..n {
            let v00 = j * (n + 1) + i;
            faces.push([v00, v00 + 1, v00 + n + 2, v00 + n + 1]);
        }
    }

    build_from_quads(&vertices, &faces).unwrap()
}

/// Every interior horizontal row of edges, trimmed by one column at each side.
fn interior_rows(mesh: &HalfEdgeMesh, n: usize) -> Selection {
    let mut pairs = Vec::new();
    for j in 1..n {
        for i in 1..n - 1 {
            let v = j * (n + 1) + i;
            pairs.push((v, v + 1));
        }
    }
    Selection::from_vertex_pairs(mesh, &pairs).unwrap()
}

fn bench_loop_building(c: &mut Criterion) {
    let n = 100;
    let mesh = create_grid_mesh(n);
    let selection = interior_rows(&mesh, n);

    c.bench_function("build_loops_100x100", |b| {
        b.iter(|| build_loops(&mesh, black_box(selection.edges())).unwrap());
    });
}

fn bench_operators(c: &mut Criterion) {
    let n = 100;
    let mesh = create_grid_mesh(n);
    let selection = interior_rows(&mesh, n);
    let loops = build_loops(&mesh, selection.edges()).unwrap();

    c.bench_function("apply_flow_100x100", |b| {
        let options = FlowOptions::default();
        b.iter(|| {
            let mut work = mesh.clone();
            loops.apply_flow(&mut work, &options)
        });
    });

    c.bench_function("apply_curve_100x100", |b| {
        let options = CurveOptions::default().with_rails(Rails::both());
        b.iter(|| {
            let mut work = mesh.clone();
            loops.apply_curve(&mut work, &options)
        });
    });

    c.bench_function("session_mix_only_100x100", |b| {
        let mut work = mesh.clone();
        let mut session = EdgeSession::begin(&work, &selection).unwrap();
        let operation = EdgeOperation::Flow(FlowOptions::default());
        session.apply(&mut work, &operation, 1.0).unwrap();
        b.iter(|| session.apply(&mut work, &operation, black_box(0.5)).unwrap());
    });
}

fn bench_vertex_curve(c: &mut Criterion) {
    let n = 100;
    let mesh = create_grid_mesh(n);
    let picks = [VertexId::new(0), VertexId::new(n / 2), VertexId::new(n * (n + 1) + n)];

    c.bench_function("shortest_path_corner_to_corner", |b| {
        let options = PathOptions::default().with_target(picks[2].index());
        b.iter(|| find_path(&mesh, black_box(picks[0]), &options).path_to(picks[2]));
    });

    c.bench_function("vertex_curve_three_points", |b| {
        let chain = VertexChain::build(&mesh, &picks, DistanceMode::EdgeLength).unwrap();
        let options = VertexCurveOptions::default();
        b.iter(|| {
            let mut work = mesh.clone();
            chain.fit(&mut work, &options)
        });
    });
}

criterion_group!(benches, bench_loop_building, bench_operators, bench_vertex_curve);
criterion_main!(benches);
