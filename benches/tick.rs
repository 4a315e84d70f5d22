//! Tick cost at various enemy counts
//!
//! Run with: cargo bench --bench tick

use criterion::{black_box, criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion, Throughput};
use rand::rngs::StdRng;
use rand::SeedableRng;
use spellfire_arena::game::game_loop::{GameLoop, GameLoopConfig, Surfaces};
use spellfire_arena::game::state::SpellKind;
use spellfire_arena::game::systems::{ai, waves};
use spellfire_arena::persistence::MemoryStore;
use spellfire_arena::surface::headless::{HeadlessRenderer, InstantAssets, LogUi};
use spellfire_arena::surface::{InputEvent, VisualQueue};

/// A running session with `count` enemies on the spawn ring
fn create_game_with_enemies(count: usize, spell: SpellKind) -> GameLoop {
    let visuals = VisualQueue::new();
    let surfaces = Surfaces {
        renderer: Box::new(HeadlessRenderer::new()),
        ui: Box::new(LogUi::default()),
        assets: Box::new(InstantAssets::new(visuals.sender())),
        visuals,
        store: Box::new(MemoryStore::new()),
    };
    let config = GameLoopConfig {
        seed: Some(42),
        ..GameLoopConfig::default()
    };
    let mut game = GameLoop::new(config, surfaces);
    game.handle_input(InputEvent::NewGame, 0);
    game.handle_input(InputEvent::SelectSpell(spell), 0);

    let mut rng = StdRng::seed_from_u64(7);
    let state = game.state_mut();
    state.wave.spawn_queue.clear();
    state.wave.required = count as u32 + 1;
    for _ in 0..count {
        waves::spawn_enemy(state, &mut rng);
    }
    // attach visuals so the renderer sync does real work
    game.tick(0);
    game
}

fn bench_tick(c: &mut Criterion) {
    let mut group = c.benchmark_group("tick");
    group.sample_size(50);

    for count in [10, 50, 200] {
        group.throughput(Throughput::Elements(count as u64));
        group.bench_with_input(BenchmarkId::new("fireball", count), &count, |b, &count| {
            b.iter_batched(
                || create_game_with_enemies(count, SpellKind::Fireball),
                |mut game| {
                    game.handle_input(InputEvent::CastRequested, 16);
                    black_box(game.tick(16))
                },
                BatchSize::LargeInput,
            );
        });
        group.bench_with_input(BenchmarkId::new("laser", count), &count, |b, &count| {
            b.iter_batched(
                || {
                    let mut game = create_game_with_enemies(count, SpellKind::Laser);
                    game.handle_input(InputEvent::CastRequested, 0);
                    game
                },
                |mut game| black_box(game.tick(16)),
                BatchSize::LargeInput,
            );
        });
    }

    group.finish();
}

fn bench_separation(c: &mut Criterion) {
    let mut group = c.benchmark_group("separation");

    for count in [10, 50, 200] {
        let mut game = create_game_with_enemies(count, SpellKind::Fireball);
        group.throughput(Throughput::Elements(count as u64));
        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, _| {
            b.iter(|| ai::separate(black_box(&mut game.state_mut().enemies)));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_tick, bench_separation);
criterion_main!(benches);
