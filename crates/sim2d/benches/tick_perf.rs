//! Benchmark: cost of one solver tick at the reference grid size.
//!
//! `iter_batched` rebuilds the simulation before every iteration so the
//! measured tick always starts from the same zero state, float and fixed
//! alike.

use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use sim2d::{FieldGrid, Fixed32, SimConfig, Simulation};

/// Walled box with the bottom half fluid, top half air.
fn reference_field(rows: usize, cols: usize) -> FieldGrid {
    let lines: Vec<String> = (0..rows)
        .map(|x| {
            (0..cols)
                .map(|y| {
                    if x == 0 || x == rows - 1 || y == 0 || y == cols - 1 {
                        '#'
                    } else if x >= rows / 2 {
                        '.'
                    } else {
                        ' '
                    }
                })
                .collect()
        })
        .collect();
    FieldGrid::from_lines(&lines, cols).unwrap()
}

fn bench_tick_float(c: &mut Criterion) {
    c.bench_function("tick_float_36x84", |b| {
        b.iter_batched(
            || Simulation::<f32, f32, f32>::new(reference_field(36, 84), SimConfig::default()),
            |mut sim| {
                sim.tick();
                black_box(sim.generation());
            },
            BatchSize::SmallInput,
        );
    });
}

fn bench_tick_fixed(c: &mut Criterion) {
    c.bench_function("tick_fixed_36x84", |b| {
        b.iter_batched(
            || {
                Simulation::<f32, Fixed32<16>, Fixed32<15>>::new(
                    reference_field(36, 84),
                    SimConfig::default(),
                )
            },
            |mut sim| {
                sim.tick();
                black_box(sim.generation());
            },
            BatchSize::SmallInput,
        );
    });
}

criterion_group!(benches, bench_tick_float, bench_tick_fixed);
criterion_main!(benches);
