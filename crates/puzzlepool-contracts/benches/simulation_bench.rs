//! Criterion benchmarks for the game simulation.
//!
//! Two benchmark groups:
//! - `physics`: a single frame and a full 150-frame game, computed directly.
//! - `on_chain`: the same game played through manager transactions.

use criterion::{Criterion, criterion_group, criterion_main};
use puzzlepool_contracts::physics::{PhysicsParams, euler_forward, simulate};
use puzzlepool_contracts::puzzle::{MAX_FRAMES, PUZZLES};
use puzzlepool_contracts::test_utils::*;

fn bench_physics(c: &mut Criterion) {
    let params = PhysicsParams::default();
    let initial = PUZZLES[0]
        .layout(SCALE)
        .initial_state()
        .with_player_velocity(190 * SCALE, 240 * SCALE);

    let mut group = c.benchmark_group("physics");
    group.bench_function("euler_forward", |b| {
        b.iter(|| euler_forward(&initial, &params));
    });
    group.bench_function("simulate_full_game", |b| {
        b.iter(|| simulate(&initial, &params, MAX_FRAMES));
    });
    group.finish();
}

fn bench_on_chain(c: &mut Criterion) {
    let mut group = c.benchmark_group("on_chain");
    group.bench_function("reference_game", |b| {
        b.iter_batched(
            || {
                let mut game = wired_game();
                game.next_puzzle();
                game
            },
            |mut game| {
                game.make_move(190, 240).unwrap();
                game.finish_game();
            },
            criterion::BatchSize::LargeInput,
        );
    });
    group.finish();
}

criterion_group!(benches, bench_physics, bench_on_chain);
criterion_main!(benches);
