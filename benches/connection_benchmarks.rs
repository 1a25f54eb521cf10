//! Connection-formation hot paths: enumerative candidate
//! generation and KD-tree nearest-neighbor queries over growing endpoint
//! population sizes.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use n2a_core::connection_planner::{KdTree, Point3};
use n2a_core::runtime::connect::{enumerate_candidates, ConnectPopulation};

fn bench_enumerate_candidates(c: &mut Criterion) {
    let mut group = c.benchmark_group("enumerate_candidates");
    for size in [10usize, 100, 500] {
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, &size| {
            let a = ConnectPopulation::new(size, size);
            let b_pop = ConnectPopulation::new(size, size);
            b.iter(|| enumerate_candidates(&[a.clone(), b_pop.clone()], Some(5)));
        });
    }
    group.finish();
}

fn bench_kdtree_query(c: &mut Criterion) {
    let mut group = c.benchmark_group("kdtree_query");
    for size in [100usize, 1_000, 10_000] {
        let points: Vec<(Point3, usize)> = (0..size)
            .map(|i| (Point3 { x: i as f64, y: (i * 2) as f64, z: (i % 7) as f64 }, i))
            .collect();
        let tree = KdTree::build(&points);
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            b.iter(|| tree.query(Point3 { x: 0.0, y: 0.0, z: 0.0 }, Some(10), None));
        });
    }
    group.finish();
}

criterion_group!(benches, bench_enumerate_candidates, bench_kdtree_query);
criterion_main!(benches);
