use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rand::SeedableRng;
use rand::rngs::StdRng;
use tells_bot::{BeliefStore, BotContext, DecisionPlanner, Personality};
use tells_core::model::board::{BOARD_SLOTS, BoardSnapshot, SlotView};
use tells_core::model::seat::Seat;
use tells_core::model::stone::Stone;

fn crowded_line() -> (BoardSnapshot, BeliefStore) {
    let mut slots = [SlotView::FaceDown; BOARD_SLOTS];
    slots[0] = SlotView::FaceUp(Stone::Corona);
    slots[6] = SlotView::FaceUp(Stone::Balanza);
    let snapshot = BoardSnapshot::new(slots, Vec::new(), true);
    let mut beliefs = BeliefStore::default();
    for (slot, stone) in [(1, Stone::Escudo), (2, Stone::Espada), (3, Stone::Bandera)] {
        beliefs.set(slot, stone, 0.6);
    }
    (snapshot, beliefs)
}

fn decide_bench(c: &mut Criterion) {
    let (snapshot, beliefs) = crowded_line();
    let mut group = c.benchmark_group("decide");
    for personality in [Personality::cautious(), Personality::balanced(), Personality::shuffler()] {
        let ctx = BotContext::new(Seat::North, &snapshot, &beliefs, &personality);
        let mut rng = StdRng::seed_from_u64(2024);
        group.bench_function(format!("planner_{}", personality.name), |b| {
            b.iter(|| black_box(DecisionPlanner::choose(&ctx, &mut rng)))
        });
    }
    group.finish();
}

criterion_group!(benches, decide_bench);
criterion_main!(benches);
