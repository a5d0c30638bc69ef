use std::sync::Arc;

use rand::SeedableRng;
use rand::rngs::StdRng;

use quiniela::auth::{Credentials, KvCredentials};
use quiniela::kv::{KeyValueStore, MemoryStore};
use quiniela::persist::PersistKeys;
use quiniela::schedule::{GroupId, default_roster};
use quiniela::score::Score;
use quiniela::{Engine, EngineError};

async fn engine_with(store: Arc<MemoryStore>) -> Engine {
    let kv: Arc<dyn KeyValueStore> = store;
    let credentials = Arc::new(KvCredentials::new(Arc::clone(&kv)));
    Engine::load(kv, credentials, PersistKeys::default(), default_roster())
        .await
        .expect("default roster is valid")
}

#[tokio::test]
async fn register_login_and_predict() {
    let store = Arc::new(MemoryStore::new());
    let mut engine = engine_with(Arc::clone(&store)).await;

    let save = engine.register("ana", "secret").await.unwrap();
    save.await.unwrap().unwrap();
    assert_eq!(engine.current_user(), Some("ana"));
    assert_eq!(engine.global_ranking().len(), 1);

    engine.logout();
    assert!(matches!(
        engine.submit_prediction("A-J1-1", 2u32, 0u32),
        Err(EngineError::AuthFailure(_))
    ));
    assert!(matches!(
        engine.login("ana", "wrong").await,
        Err(EngineError::AuthFailure(_))
    ));
    assert!(matches!(
        engine.register("ana", "other").await,
        Err(EngineError::AlreadyExists(_))
    ));
    assert!(matches!(
        engine.register("", "pw").await,
        Err(EngineError::InvalidInput(_))
    ));

    engine.login("ana", "secret").await.unwrap();
    engine
        .submit_prediction("A-J1-1", "2", "0")
        .unwrap()
        .await
        .unwrap()
        .unwrap();
    engine
        .set_result(GroupId::A, 1, 0, 1u32, 0u32)
        .unwrap()
        .await
        .unwrap()
        .unwrap();

    let ranking = engine.global_ranking();
    assert_eq!(ranking[0].user, "ana");
    assert_eq!(ranking[0].points, 3);

    let view = engine.my_match_day_points(GroupId::A, 1).unwrap();
    assert_eq!(view[0].points, Some(3));
    assert_eq!(view[1].points, None);

    // A fresh engine on the same store sees everything that was saved.
    let reloaded = engine_with(store).await;
    assert_eq!(reloaded.state(), engine.state());
}

#[tokio::test]
async fn scoring_through_the_engine() {
    for (result, expected) in [((2, 0), 5), ((1, 0), 3), ((0, 1), 0)] {
        let mut engine = engine_with(Arc::new(MemoryStore::new())).await;
        engine.set_prediction("ana", "A-J1-1", 2u32, 0u32).unwrap();
        engine
            .set_result(GroupId::A, 1, 0, result.0 as u32, result.1 as u32)
            .unwrap();
        assert_eq!(engine.global_ranking()[0].points, expected);
    }
}

#[tokio::test]
async fn invalid_input_leaves_state_untouched() {
    let mut engine = engine_with(Arc::new(MemoryStore::new())).await;
    engine.set_result(GroupId::B, 2, 1, 3u32, 1u32).unwrap();
    engine.set_prediction("ana", "B-J2-2", 1u32, 0u32).unwrap();
    let before = engine.state().clone();

    for (home, away) in [("2.5", "1"), ("-1", "0"), ("x", "0"), ("", "0")] {
        assert!(matches!(
            engine.set_result(GroupId::B, 2, 1, home, away),
            Err(EngineError::InvalidInput(_))
        ));
        assert!(matches!(
            engine.set_prediction("ana", "B-J2-2", home, away),
            Err(EngineError::InvalidInput(_))
        ));
    }
    assert!(matches!(
        engine.set_result(GroupId::B, 2, 1, 1.5f64, 0u32),
        Err(EngineError::InvalidInput(_))
    ));
    assert!(matches!(
        engine.set_result(GroupId::B, 4, 0, 1u32, 0u32),
        Err(EngineError::NotFound(_))
    ));
    assert!(matches!(
        engine.set_prediction("ana", "B-J4-1", 1u32, 0u32),
        Err(EngineError::NotFound(_))
    ));
    assert!(matches!(
        engine.set_prediction("ana", "nonsense", 1u32, 0u32),
        Err(EngineError::InvalidInput(_))
    ));
    assert_eq!(engine.state(), &before);
    assert_eq!(
        engine
            .state()
            .predictions
            .prediction("ana", &"B-J2-2".parse().unwrap()),
        Some(&Score::new(1, 0))
    );
}

#[tokio::test]
async fn failed_save_keeps_the_mutation() {
    let store = Arc::new(MemoryStore::new());
    let mut engine = engine_with(Arc::clone(&store)).await;
    store.set_fail_writes(true);

    let save = engine.set_result(GroupId::C, 1, 0, 1u32, 2u32).unwrap();
    let outcome = save.await.expect("save task should not panic");
    assert!(matches!(outcome, Err(EngineError::Persistence(_))));

    let fixture = engine.schedule().fixture_at(GroupId::C, 1, 0).unwrap();
    assert_eq!(fixture.result, Some(Score::new(1, 2)));
    assert_eq!(engine.standings(GroupId::C).unwrap()[0].team, "Saudi Arabia");
}

#[tokio::test]
async fn registered_users_without_partition_are_not_ranked() {
    let store = Arc::new(MemoryStore::new());
    let kv: Arc<dyn KeyValueStore> = store.clone();
    KvCredentials::new(Arc::clone(&kv))
        .create("ghost", "pw")
        .await
        .unwrap();

    let mut engine = engine_with(store).await;
    engine.login("ghost", "pw").await.unwrap();
    assert!(engine.global_ranking().is_empty());

    engine.set_prediction("bea", "D-J1-1", 0u32, 0u32).unwrap();
    let users: Vec<_> = engine.global_ranking().into_iter().map(|r| r.user).collect();
    assert_eq!(users, ["bea"]);
}

#[tokio::test]
async fn reset_clears_storage() {
    let store = Arc::new(MemoryStore::new());
    let mut engine = engine_with(Arc::clone(&store)).await;
    engine
        .set_result(GroupId::E, 1, 0, 1u32, 7u32)
        .unwrap()
        .await
        .unwrap()
        .unwrap();
    assert!(store.get("schedule").await.is_ok());

    engine.reset().await.unwrap();
    assert!(store.get("schedule").await.is_err());
    assert!(engine.schedule().fixtures().all(|f| f.result.is_none()));
}

#[tokio::test]
async fn simulation_is_reproducible() {
    let mut a = engine_with(Arc::new(MemoryStore::new())).await;
    let mut b = engine_with(Arc::new(MemoryStore::new())).await;
    let (sa, _) = a
        .simulate(&mut StdRng::seed_from_u64(42), &["ana", "ben", "cai"], 0.5)
        .unwrap();
    let (sb, _) = b
        .simulate(&mut StdRng::seed_from_u64(42), &["ana", "ben", "cai"], 0.5)
        .unwrap();
    assert_eq!(sa, sb);
    assert_eq!(a.state(), b.state());
    assert_eq!(a.global_ranking().len(), 3);
}

#[test]
fn mutations_without_runtime_are_rejected() {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let mut engine = rt.block_on(engine_with(Arc::new(MemoryStore::new())));
    let before = engine.state().clone();

    assert!(matches!(
        engine.set_result(GroupId::A, 1, 0, 1u32, 0u32),
        Err(EngineError::Persistence(_))
    ));
    assert!(matches!(
        engine.set_prediction("ana", "A-J1-1", 1u32, 0u32),
        Err(EngineError::Persistence(_))
    ));
    assert!(matches!(
        engine.simulate(&mut StdRng::seed_from_u64(1), &["ana"], 1.0),
        Err(EngineError::Persistence(_))
    ));
    assert_eq!(engine.state(), &before);

    let _guard = rt.enter();
    assert!(engine.set_result(GroupId::A, 1, 0, 1u32, 0u32).is_ok());
}

#[tokio::test]
async fn non_canonical_fixture_ids_are_invalid() {
    let mut engine = engine_with(Arc::new(MemoryStore::new())).await;
    for raw in ["A-J01-1", "A-J1-+1", " A-J1-1"] {
        assert!(matches!(
            engine.set_prediction("ana", raw, 1u32, 0u32),
            Err(EngineError::InvalidInput(_))
        ));
    }
    assert!(engine.state().predictions.is_empty());
}
