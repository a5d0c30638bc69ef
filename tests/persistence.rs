use std::sync::Arc;

use quiniela::EngineError;
use quiniela::kv::{KeyValueStore, MemoryStore, SqliteStore};
use quiniela::persist::{PersistKeys, load_state, save_state};
use quiniela::schedule::{GroupId, Schedule};
use quiniela::state::TournamentState;

fn populated_state() -> TournamentState {
    let mut state = TournamentState::world_cup_2022();
    state.schedule.set_result(GroupId::A, 1, 0, 0u32, 2u32).unwrap();
    state.schedule.set_result(GroupId::H, 3, 1, 7u32, 0u32).unwrap();
    state
        .predictions
        .set_prediction("zoe", "A-J1-1".parse().unwrap(), 0u32, 2u32)
        .unwrap();
    state
        .predictions
        .set_prediction("adam", "H-J3-2".parse().unwrap(), 1u32, 1u32)
        .unwrap();
    state.predictions.ensure_partition("empty");
    // A stored placeholder pick with no goals.
    state
        .predictions
        .ensure_partition("adam")
        .picks
        .insert("B-J1-1".parse().unwrap(), None);
    state
}

async fn round_trip(store: Arc<dyn KeyValueStore>) {
    let keys = PersistKeys::default();
    let state = populated_state();
    save_state(store.as_ref(), &keys, &state.schedule, &state.predictions)
        .await
        .expect("save should succeed");

    let restored = load_state(store.as_ref(), &keys, Schedule::world_cup_2022()).await;
    assert_eq!(restored, state);
    let users: Vec<_> = restored.predictions.users().map(|p| p.user.clone()).collect();
    assert_eq!(users, ["zoe", "adam", "empty"]);
    assert_eq!(restored.global_ranking(), state.global_ranking());
}

#[tokio::test]
async fn memory_round_trip() {
    round_trip(Arc::new(MemoryStore::new())).await;
}

#[tokio::test]
async fn sqlite_round_trip() {
    round_trip(Arc::new(SqliteStore::open_in_memory().unwrap())).await;
}

#[tokio::test]
async fn missing_keys_give_defaults() {
    let store = MemoryStore::new();
    let state = load_state(&store, &PersistKeys::default(), Schedule::world_cup_2022()).await;
    assert_eq!(state, TournamentState::world_cup_2022());
}

#[tokio::test]
async fn corrupt_snapshots_fall_back() {
    let store = MemoryStore::new();
    let keys = PersistKeys::default();
    store.set(&keys.schedule, "{not json").await.unwrap();
    store
        .set(&keys.predictions, r#"{"version":1,"users":{"ana":{"A-J1-1":{"home":1.5,"away":0}}}}"#)
        .await
        .unwrap();
    let state = load_state(&store, &keys, Schedule::world_cup_2022()).await;
    assert_eq!(state, TournamentState::world_cup_2022());
}

#[tokio::test]
async fn one_bad_key_does_not_discard_the_other() {
    let store = MemoryStore::new();
    let keys = PersistKeys::default();
    let good = populated_state();
    save_state(&store, &keys, &good.schedule, &good.predictions)
        .await
        .unwrap();
    store.set(&keys.predictions, "garbage").await.unwrap();

    let state = load_state(&store, &keys, Schedule::world_cup_2022()).await;
    assert_eq!(state.schedule, good.schedule);
    assert!(state.predictions.is_empty());
}

#[tokio::test]
async fn failed_save_is_reported() {
    let store = MemoryStore::new();
    store.set_fail_writes(true);
    let state = populated_state();
    let err = save_state(&store, &PersistKeys::default(), &state.schedule, &state.predictions)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Persistence(_)));
}

#[tokio::test]
async fn custom_keys_are_respected() {
    let store = MemoryStore::new();
    let keys = PersistKeys {
        schedule: "wc_schedule".to_string(),
        predictions: "wc_picks".to_string(),
    };
    let state = populated_state();
    save_state(&store, &keys, &state.schedule, &state.predictions)
        .await
        .unwrap();
    assert!(store.get("wc_schedule").await.is_ok());
    assert!(store.get("wc_picks").await.is_ok());
    assert!(store.get("schedule").await.is_err());
}
