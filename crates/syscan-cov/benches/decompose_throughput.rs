use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use syscan_cov::{
    ArtificialSystematicsDecomposer, CholeskyDecomposer, CovarianceMatrix, EigenDecomposer,
};

fn banded(n: usize) -> CovarianceMatrix {
    CovarianceMatrix::from_lower_fn(n, |i, j| {
        let distance = (i - j) as f64;
        (-0.3 * distance).exp() * (1.0 + 0.01 * (i + j) as f64)
    })
}

fn bench_decompose(c: &mut Criterion) {
    let mut group = c.benchmark_group("decompose");
    for n in [16usize, 64, 133] {
        let cov = banded(n);
        group.bench_with_input(BenchmarkId::new("eigen", n), &cov, |b, cov| {
            b.iter(|| EigenDecomposer::default().decompose(cov).unwrap())
        });
        group.bench_with_input(BenchmarkId::new("cholesky", n), &cov, |b, cov| {
            b.iter(|| CholeskyDecomposer.decompose(cov).unwrap())
        });
    }
    group.finish();
}

criterion_group!(benches, bench_decompose);
criterion_main!(benches);
