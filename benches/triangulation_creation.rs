//! Triangulation creation benchmarks.
//!
//! Measures incremental construction of plain and Delaunay triangulations
//! from seeded random points, the global flip repair of a plain
//! triangulation, and point location on a finished mesh.
//!
//! ```bash
//! cargo bench --bench triangulation_creation
//! ```

#![allow(missing_docs)]

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use trimesh2d::core::algorithms::legalize::repair_delaunay_with_flips;
use trimesh2d::prelude::*;

const COUNTS: &[usize] = &[100, 1_000, 10_000];

/// Fixed seed so runs are comparable.
const SEED: u64 = 0x5eed;

fn random_points(count: usize, seed: u64) -> Vec<Point> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..count)
        .map(|_| {
            Point::new_2d(
                rng.random_range(-100.0..100.0),
                rng.random_range(-100.0..100.0),
            )
        })
        .collect()
}

fn options() -> TriangulationOptions {
    TriangulationOptionsBuilder::default()
        .seed(SEED)
        .validation(ValidationPolicy::Never)
        .build()
        .expect("default options are valid")
}

fn bench_construction(c: &mut Criterion) {
    let mut group = c.benchmark_group("construction");
    for &count in COUNTS {
        let points = random_points(count, SEED.wrapping_add(count as u64));
        group.throughput(Throughput::Elements(count as u64));

        group.bench_with_input(BenchmarkId::new("delaunay", count), &points, |b, points| {
            b.iter(|| {
                let mut dt = DelaunayTriangulation::with_options(options());
                dt.insert_all(black_box(points)).expect("insertion failed");
                dt
            });
        });

        group.bench_with_input(BenchmarkId::new("plain", count), &points, |b, points| {
            b.iter(|| {
                let mut tri = Triangulation::with_options(options());
                tri.insert_all(black_box(points)).expect("insertion failed");
                tri
            });
        });
    }
    group.finish();
}

fn bench_repair(c: &mut Criterion) {
    let mut group = c.benchmark_group("repair");
    group.sample_size(20);
    for &count in &COUNTS[..2] {
        let points = random_points(count, SEED ^ count as u64);
        let mut tri = Triangulation::with_options(options());
        tri.insert_all(&points).expect("insertion failed");
        let mesh = tri.into_mesh();

        group.bench_with_input(BenchmarkId::new("global_flips", count), &mesh, |b, mesh| {
            b.iter_batched(
                || mesh.clone(),
                |mut mesh| repair_delaunay_with_flips(&mut mesh).expect("repair failed"),
                criterion::BatchSize::LargeInput,
            );
        });
    }
    group.finish();
}

fn bench_locate(c: &mut Criterion) {
    let points = random_points(10_000, SEED);
    let mut dt = DelaunayTriangulation::with_options(options());
    dt.insert_all(&points).expect("insertion failed");
    let queries = random_points(256, SEED + 1);

    c.bench_function("locate/10000", |b| {
        b.iter(|| {
            for query in &queries {
                black_box(dt.locate(black_box(query)).expect("locate failed"));
            }
        });
    });
}

criterion_group!(benches, bench_construction, bench_repair, bench_locate);
criterion_main!(benches);
