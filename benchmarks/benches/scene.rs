//! Scene tick benchmarks (criterion - wall-clock time).
//!
//! Run all:    cargo bench --manifest-path benchmarks/Cargo.toml --bench scene
//! Filter:     cargo bench --manifest-path benchmarks/Cargo.toml --bench scene -- tick

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use glam::Vec2;
use rein_scene2d::math::Transform2d;
use rein_scene2d::physics::narrowphase::shapes_overlap;
use rein_scene2d::{Aabb2d, CollisionShape, SceneObject};
use rein_scene2d_bench::*;

// ---------------------------------------------------------------------------
// Narrowphase
// ---------------------------------------------------------------------------

fn bench_narrowphase(c: &mut Criterion) {
    let mut group = c.benchmark_group("narrowphase");
    let circle = CollisionShape::circle(0.5, Vec2::ZERO).unwrap();
    let square = CollisionShape::polygon_box(1.0, 1.0, Vec2::ZERO, 0.0).unwrap();
    let chain = CollisionShape::chain(&scatter(16, 4.0), None, None).unwrap();
    let origin = Transform2d::IDENTITY;
    let near = Transform2d::new(Vec2::new(0.8, 0.2), 0.4);

    group.bench_function("circle_circle", |b| {
        b.iter(|| shapes_overlap(&circle, &origin, &circle, &near));
    });
    group.bench_function("box_box", |b| {
        b.iter(|| shapes_overlap(&square, &origin, &square, &near));
    });
    group.bench_function("chain_box", |b| {
        b.iter(|| shapes_overlap(&chain, &origin, &square, &near));
    });
    group.finish();
}

// ---------------------------------------------------------------------------
// Full tick
// ---------------------------------------------------------------------------

fn bench_tick(c: &mut Criterion) {
    {
        let mut group = c.benchmark_group("tick/moving");
        for &n in &[100, 500, 1000] {
            group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, &n| {
                b.iter_batched(
                    || setup_moving_scene(n).0,
                    |mut scene| scene.process_tick(),
                    criterion::BatchSize::LargeInput,
                );
            });
        }
        group.finish();
    }

    {
        let mut group = c.benchmark_group("tick/resting");
        for &n in &[100, 500, 1000] {
            let mut scene = setup_resting_scene(n);
            group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, _| {
                b.iter(|| scene.process_tick());
            });
        }
        group.finish();
    }
}

// ---------------------------------------------------------------------------
// Interpolation and picking
// ---------------------------------------------------------------------------

fn bench_interpolate(c: &mut Criterion) {
    let mut group = c.benchmark_group("interpolate");
    for &n in &[100, 1000] {
        let (mut scene, _) = setup_moving_scene(n);
        scene.process_tick();
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, _| {
            b.iter(|| scene.interpolate_tick(0.5));
        });
    }
    group.finish();
}

fn bench_pick(c: &mut Criterion) {
    let mut group = c.benchmark_group("pick_area");
    for &n in &[100, 1000] {
        let (scene, _) = setup_moving_scene(n);
        let area = Aabb2d::new(Vec2::splat(-3.0), Vec2::splat(3.0));
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, _| {
            b.iter(|| scene.pick_area(&area));
        });
    }
    group.finish();
}

// ---------------------------------------------------------------------------
// Attach / detach
// ---------------------------------------------------------------------------

fn bench_attach_detach(c: &mut Criterion) {
    let mut group = c.benchmark_group("attach_detach");
    let (mut scene, _) = setup_moving_scene(100);
    let mut object = Some(shaped_object(1, Vec2::ZERO, Vec2::ZERO));
    group.bench_function("box_object", |b| {
        b.iter(|| {
            let id = scene.add_object(object.take().unwrap_or_else(SceneObject::new));
            object = scene.remove_object(id);
        });
    });
    group.finish();
}

criterion_group!(
    benches,
    bench_narrowphase,
    bench_tick,
    bench_interpolate,
    bench_pick,
    bench_attach_detach,
);
criterion_main!(benches);
