//! Benchmarks for the contact pipeline.
//!
//! Run with: cargo bench

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use rigid_physics::{BodyShape, RigidBody, Simulation, SimulationConfig, Vector3};

const DT: f32 = 1.0 / 60.0;

fn box_stack(height: usize) -> Simulation {
    let mut sim = Simulation::new(SimulationConfig::default());
    sim.add_body(RigidBody::new_static(
        BodyShape::Box { half_extents: Vector3::new(20.0, 0.5, 20.0) },
        Vector3::new(0.0, -0.5, 0.0),
    ))
    .expect("floor");

    for i in 0..height {
        let position = Vector3::new(0.0, 0.5 + i as f32 * 1.001, 0.0);
        sim.add_body(RigidBody::dynamic_box(Vector3::splat(0.5), position, 1.0))
            .expect("box");
    }
    sim
}

fn sphere_pile(count: usize) -> Simulation {
    let mut rng = StdRng::seed_from_u64(42);
    let mut sim = Simulation::new(SimulationConfig::default());
    sim.add_body(RigidBody::new_static(
        BodyShape::Box { half_extents: Vector3::new(20.0, 0.5, 20.0) },
        Vector3::new(0.0, -0.5, 0.0),
    ))
    .expect("floor");

    for _ in 0..count {
        let position = Vector3::new(
            rng.gen_range(-3.0..3.0),
            rng.gen_range(0.5..8.0),
            rng.gen_range(-3.0..3.0),
        );
        sim.add_body(RigidBody::dynamic_sphere(0.3, position, 1.0))
            .expect("sphere");
    }
    sim
}

fn bench_box_stack(c: &mut Criterion) {
    let mut group = c.benchmark_group("box_stack_step");
    for height in [4, 8, 16] {
        group.bench_with_input(BenchmarkId::from_parameter(height), &height, |b, &height| {
            let mut sim = box_stack(height);
            b.iter(|| {
                sim.step(black_box(DT));
            });
        });
    }
    group.finish();
}

fn bench_sphere_pile(c: &mut Criterion) {
    c.bench_function("sphere_pile_60_steps", |b| {
        b.iter(|| {
            let mut sim = sphere_pile(32);
            for _ in 0..60 {
                sim.step(DT);
            }
            black_box(sim.substep_count())
        });
    });
}

criterion_group!(benches, bench_box_stack, bench_sphere_pile);
criterion_main!(benches);
