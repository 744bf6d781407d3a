//! Criterion benchmarks for the statistical hot paths.
//!
//! Benchmarks:
//! 1. ADF with AIC lag search
//! 2. KPSS with automatic bandwidth
//! 3. Zivot-Andrews break search (one regression per candidate break)
//! 4. Johansen trace test
//! 5. OLS with HAC covariance

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use cointlab_core::domain::TrendSpec;
use cointlab_core::stats::ols::{self, CovarianceType};
use cointlab_core::stats::{
    adf_test, johansen, kpss_test, zivot_andrews_test, AdfOptions, ZivotAndrewsOptions,
};
use cointlab_core::SyntheticGenerator;

const SIZES: [usize; 3] = [100, 500, 2000];

fn bench_unit_root(c: &mut Criterion) {
    let mut group = c.benchmark_group("adf");
    for n in SIZES {
        let x = SyntheticGenerator::new(1).random_walk(n, 1.0, 0.0);
        group.bench_with_input(BenchmarkId::from_parameter(n), &x, |b, x| {
            b.iter(|| adf_test(black_box(x), AdfOptions::with_regression(TrendSpec::Constant)));
        });
    }
    group.finish();
}

fn bench_kpss(c: &mut Criterion) {
    let mut group = c.benchmark_group("kpss");
    for n in SIZES {
        let x = SyntheticGenerator::new(2).ar1(n, 0.5, 1.0);
        group.bench_with_input(BenchmarkId::from_parameter(n), &x, |b, x| {
            b.iter(|| kpss_test(black_box(x), TrendSpec::Constant));
        });
    }
    group.finish();
}

fn bench_break_search(c: &mut Criterion) {
    let mut group = c.benchmark_group("zivot_andrews");
    group.sample_size(20);
    for n in [100, 500] {
        let x = SyntheticGenerator::new(3).level_shift(n, n / 2, 3.0, 1.0);
        group.bench_with_input(BenchmarkId::from_parameter(n), &x, |b, x| {
            b.iter(|| zivot_andrews_test(black_box(x), ZivotAndrewsOptions::default()));
        });
    }
    group.finish();
}

fn bench_johansen(c: &mut Criterion) {
    let mut g = SyntheticGenerator::new(4);
    let a = g.random_walk(500, 1.0, 0.0);
    let b: Vec<f64> = a.iter().zip(g.white_noise(500, 0.5)).map(|(a, e)| a + e).collect();
    let d = g.random_walk(500, 1.0, 0.0);
    let series: [&[f64]; 3] = [&a, &b, &d];

    c.bench_function("johansen_3x500_lag2", |bench| {
        bench.iter(|| johansen(black_box(&series), TrendSpec::Constant, 2));
    });
}

fn bench_hac_ols(c: &mut Criterion) {
    let mut g = SyntheticGenerator::new(5);
    let x1 = g.white_noise(1000, 1.0);
    let x2 = g.white_noise(1000, 1.0);
    let u = g.ar1(1000, 0.7, 1.0);
    let y: Vec<f64> = (0..1000).map(|i| 1.0 + x1[i] - x2[i] + u[i]).collect();

    c.bench_function("ols_hac_1000x3", |b| {
        b.iter(|| {
            ols::fit(
                black_box(&y),
                &[&x1, &x2],
                true,
                CovarianceType::Hac { max_lags: None },
            )
        });
    });
}

criterion_group!(
    benches,
    bench_unit_root,
    bench_kpss,
    bench_break_search,
    bench_johansen,
    bench_hac_ols
);
criterion_main!(benches);
