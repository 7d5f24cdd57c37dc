use std::hint::black_box;

use criterion::{criterion_group, criterion_main, Criterion};
use nalgebra::Point2;
use quad_rectify::core::Quad2;
use quad_rectify::{analytical_jacobian, error_distance, is_rectangle, numerical_jacobian};

fn page_quad() -> Quad2 {
    Quad2::new(
        Point2::new(-212.0, -151.5),
        Point2::new(198.0, -170.0),
        Point2::new(236.5, 149.0),
        Point2::new(-185.0, 128.0),
    )
}

fn bench_verifier(c: &mut Criterion) {
    let q = page_quad();
    c.bench_function("is_rectangle", |b| {
        b.iter(|| is_rectangle(black_box(&q), 620.0, 1.41, 2.0))
    });
    c.bench_function("error_distance", |b| {
        b.iter(|| error_distance(black_box(&q), 620.0, 1.41))
    });
}

fn bench_jacobian(c: &mut Criterion) {
    let q = page_quad();
    c.bench_function("jacobian_analytical", |b| {
        b.iter(|| analytical_jacobian(black_box(&q), 620.0))
    });
    c.bench_function("jacobian_numerical", |b| {
        b.iter(|| numerical_jacobian(black_box(&q), 620.0))
    });
}

criterion_group!(benches, bench_verifier, bench_jacobian);
criterion_main!(benches);
