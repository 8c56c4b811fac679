//! Benchmarks for the clustering engine at the guard ceiling.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rand::{Rng, SeedableRng};

use competency_rollup::cluster::{self, ClusterConfig, DistanceMatrix};

/// 300 rows of 20 binary-ish features, the largest roster that is clustered.
fn synthetic_rows(seed: u64) -> Vec<Vec<f64>> {
    let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
    (0..300)
        .map(|_| {
            (0..20)
                .map(|_| if rng.gen_bool(0.6) { 1.0 } else { 0.0 })
                .collect()
        })
        .collect()
}

fn bench_distance_matrix(c: &mut Criterion) {
    let rows = synthetic_rows(0);
    c.bench_function("distance_matrix_300x20", |bench| {
        bench.iter(|| black_box(DistanceMatrix::compute(&rows)))
    });
}

fn bench_kmeans(c: &mut Criterion) {
    let rows = synthetic_rows(0);
    c.bench_function("kmeans_k6_300x20", |bench| {
        bench.iter(|| black_box(cluster::kmeans(&rows, 6, 10).unwrap()))
    });
}

fn bench_auto_cluster(c: &mut Criterion) {
    let rows = synthetic_rows(0);
    let config = ClusterConfig::default();
    c.bench_function("auto_cluster_300x20", |bench| {
        bench.iter(|| black_box(cluster::auto_cluster(&rows, &config).unwrap()))
    });
}

criterion_group!(benches, bench_distance_matrix, bench_kmeans, bench_auto_cluster);
criterion_main!(benches);
