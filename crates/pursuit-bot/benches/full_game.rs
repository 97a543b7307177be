use criterion::{Criterion, black_box, criterion_group, criterion_main};
use pursuit_bot::bot::AgentVariant;
use pursuit_bot::engine::{GameSetup, TurnEngine};
use pursuit_core::GameConfig;
use pursuit_core::model::graph::Graph;
use rand::SeedableRng;
use rand::rngs::StdRng;

fn play(variant: AgentVariant, seed: u64) {
    let config = GameConfig::default();
    let mut rng = StdRng::seed_from_u64(seed);
    let graph = Graph::generate(&config, &mut rng);
    let mut engine = TurnEngine::new(graph, GameSetup::new(config, variant, seed))
        .expect("default configuration is valid");
    let _ = black_box(engine.run());
}

fn full_game_bench(c: &mut Criterion) {
    let mut group = c.benchmark_group("full_game");
    for raw in ["agent1", "agent3", "agent5", "agent7", "agent8-defective"] {
        let variant: AgentVariant = raw.parse().expect("roster variant");
        group.bench_function(raw, |b| b.iter(|| play(variant, 2024)));
    }
    group.finish();
}

criterion_group!(benches, full_game_bench);
criterion_main!(benches);
