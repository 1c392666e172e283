use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use ql_math::integrals::gaussianquadratures::{GaussLaguerreIntegration, GaussLegendreIntegration};
use ql_math::integrals::{GaussKronrodAdaptive, GaussLobattoIntegral, Integrator};
use std::hint::black_box;

fn bench_rule_construction(c: &mut Criterion) {
    let mut group = c.benchmark_group("rule_construction");
    for order in [32_usize, 128, 256] {
        group.bench_with_input(BenchmarkId::new("laguerre", order), &order, |b, &n| {
            b.iter(|| black_box(GaussLaguerreIntegration::new(black_box(n))))
        });
        group.bench_with_input(BenchmarkId::new("legendre", order), &order, |b, &n| {
            b.iter(|| black_box(GaussLegendreIntegration::new(black_box(n))))
        });
    }
    group.finish();
}

fn bench_adaptive(c: &mut Criterion) {
    let f = |x: f64| (-0.3 * x).exp() * (2.0 * x).cos() / (1.0 + x * x);
    let kronrod = GaussKronrodAdaptive::new(1e-10, 100_000);
    let lobatto = GaussLobattoIntegral::new(1e-10, 100_000);

    c.bench_function("gauss_kronrod_oscillatory", |b| {
        b.iter(|| black_box(kronrod.integrate(f, 0.0, black_box(60.0))))
    });
    c.bench_function("gauss_lobatto_oscillatory", |b| {
        b.iter(|| black_box(lobatto.integrate(f, 0.0, black_box(60.0))))
    });
}

criterion_group!(benches, bench_rule_construction, bench_adaptive);
criterion_main!(benches);
