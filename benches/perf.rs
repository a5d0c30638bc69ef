use criterion::{Criterion, criterion_group, criterion_main};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::hint::black_box;

use quiniela::persist::{decode_predictions, encode_predictions};
use quiniela::schedule::GroupId;
use quiniela::simulate::simulate;
use quiniela::state::TournamentState;

fn simulated_state(users: usize) -> TournamentState {
    let names: Vec<String> = (0..users).map(|i| format!("user{i:04}")).collect();
    let refs: Vec<&str> = names.iter().map(String::as_str).collect();
    let mut state = TournamentState::world_cup_2022();
    let mut rng = StdRng::seed_from_u64(7);
    simulate(&mut state, &mut rng, &refs, 1.0).expect("simulation should succeed");
    state
}

fn bench_standings(c: &mut Criterion) {
    let state = simulated_state(0);
    c.bench_function("standings_all_groups", |b| {
        b.iter(|| {
            for group in GroupId::ALL {
                let table = state.standings(black_box(group)).unwrap();
                black_box(table.len());
            }
        })
    });
}

fn bench_global_ranking(c: &mut Criterion) {
    let state = simulated_state(2_000);
    c.bench_function("global_ranking_2000_users", |b| {
        b.iter(|| {
            let ranking = black_box(&state).global_ranking();
            black_box(ranking.len());
        })
    });
}

fn bench_predictions_snapshot(c: &mut Criterion) {
    let state = simulated_state(500);
    let raw = encode_predictions(&state.predictions).unwrap();
    c.bench_function("predictions_decode_500_users", |b| {
        b.iter(|| {
            let store = decode_predictions(black_box(&raw)).unwrap();
            black_box(store.len());
        })
    });
}

criterion_group!(
    perf,
    bench_standings,
    bench_global_ranking,
    bench_predictions_snapshot
);
criterion_main!(perf);
