use criterion::*;
use std::hint::black_box;

mod common;
use common::*;

fn iterate_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("iterate");

    group.bench_function("run_integrate_positions_100k", |b| {
        let mut world = setup_world(AGENTS_MED);
        b.iter(|| {
            world.run::<(&mut Position, &Velocity)>(|(positions, velocities)| {
                for (p, v) in positions.iter_mut().zip(velocities.iter()) {
                    p.x += v.x;
                    p.y += v.y;
                }
            });
        });
        black_box(&world);
    });

    group.bench_function("run_each_integrate_positions_100k", |b| {
        let mut world = setup_world(AGENTS_MED);
        b.iter(|| {
            world.run_each::<_, (&mut Position, &Velocity)>(&mut (), |_, (p, v)| {
                p.x += v.x;
                p.y += v.y;
            });
        });
        black_box(&world);
    });

    group.bench_function("run_with_sum_health_100k", |b| {
        let mut world = setup_world(AGENTS_MED);
        b.iter(|| {
            let mut total = 0.0f32;
            world.run_with::<_, (&Health,)>(&mut total, |total, (healths,)| {
                *total += healths.iter().map(|h| h.value).sum::<f32>();
            });
            black_box(total)
        });
    });

    group.finish();
}

criterion_group!(benches, iterate_benchmark);
criterion_main!(benches);
