use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{EngineError, Result};
use crate::kv::KeyValueStore;
use crate::predictions::PredictionStore;
use crate::schedule::Schedule;
use crate::state::TournamentState;

const SNAPSHOT_VERSION: u32 = 1;

pub const DEFAULT_SCHEDULE_KEY: &str = "schedule";
pub const DEFAULT_PREDICTIONS_KEY: &str = "predictions";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistKeys {
    pub schedule: String,
    pub predictions: String,
}

impl Default for PersistKeys {
    fn default() -> Self {
        Self {
            schedule: DEFAULT_SCHEDULE_KEY.to_string(),
            predictions: DEFAULT_PREDICTIONS_KEY.to_string(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct ScheduleFile {
    version: u32,
    groups: Schedule,
}

#[derive(Debug, Serialize, Deserialize)]
struct PredictionsFile {
    version: u32,
    users: PredictionStore,
}

pub fn encode_schedule(schedule: &Schedule) -> Result<String> {
    let file = ScheduleFile {
        version: SNAPSHOT_VERSION,
        groups: schedule.clone(),
    };
    serde_json::to_string(&file)
        .map_err(|err| EngineError::persistence(format!("serialize schedule: {err}")))
}

pub fn decode_schedule(raw: &str) -> Result<Schedule> {
    let file = serde_json::from_str::<ScheduleFile>(raw)
        .map_err(|err| EngineError::persistence(format!("parse schedule: {err}")))?;
    if file.version != SNAPSHOT_VERSION {
        return Err(EngineError::persistence(format!(
            "schedule snapshot version {} (expected {SNAPSHOT_VERSION})",
            file.version
        )));
    }
    file.groups
        .validate()
        .map_err(|err| EngineError::persistence(format!("schedule snapshot rejected: {err}")))?;
    Ok(file.groups)
}

pub fn encode_predictions(predictions: &PredictionStore) -> Result<String> {
    let file = PredictionsFile {
        version: SNAPSHOT_VERSION,
        users: predictions.clone(),
    };
    serde_json::to_string(&file)
        .map_err(|err| EngineError::persistence(format!("serialize predictions: {err}")))
}

pub fn decode_predictions(raw: &str) -> Result<PredictionStore> {
    let file = serde_json::from_str::<PredictionsFile>(raw)
        .map_err(|err| EngineError::persistence(format!("parse predictions: {err}")))?;
    if file.version != SNAPSHOT_VERSION {
        return Err(EngineError::persistence(format!(
            "predictions snapshot version {} (expected {SNAPSHOT_VERSION})",
            file.version
        )));
    }
    Ok(file.users)
}

pub async fn load_state(
    store: &dyn KeyValueStore,
    keys: &PersistKeys,
    default_schedule: Schedule,
) -> TournamentState {
    let (schedule_res, predictions_res) =
        tokio::join!(store.get(&keys.schedule), store.get(&keys.predictions));

    let schedule = match schedule_res.and_then(|stored| decode_schedule(&stored.value)) {
        Ok(schedule) => {
            info!(key = %keys.schedule, "schedule restored");
            schedule
        }
        Err(EngineError::NotFound(_)) => {
            info!(key = %keys.schedule, "no stored schedule, starting from defaults");
            default_schedule
        }
        Err(err) => {
            warn!(key = %keys.schedule, error = %err, "schedule load failed, using defaults");
            default_schedule
        }
    };

    let predictions = match predictions_res.and_then(|stored| decode_predictions(&stored.value)) {
        Ok(predictions) => {
            info!(key = %keys.predictions, users = predictions.len(), "predictions restored");
            predictions
        }
        Err(EngineError::NotFound(_)) => PredictionStore::new(),
        Err(err) => {
            warn!(key = %keys.predictions, error = %err, "predictions load failed, starting empty");
            PredictionStore::new()
        }
    };

    TournamentState {
        schedule,
        predictions,
    }
}

pub async fn save_state(
    store: &dyn KeyValueStore,
    keys: &PersistKeys,
    schedule: &Schedule,
    predictions: &PredictionStore,
) -> Result<()> {
    let schedule_json = encode_schedule(schedule)?;
    let predictions_json = encode_predictions(predictions)?;
    let (a, b) = tokio::join!(
        store.set(&keys.schedule, &schedule_json),
        store.set(&keys.predictions, &predictions_json)
    );
    let failures: Vec<String> = [a.err(), b.err()]
        .into_iter()
        .flatten()
        .map(|err| err.to_string())
        .collect();
    if !failures.is_empty() {
        let msg = failures.join("; ");
        warn!(error = %msg, "snapshot save failed");
        return Err(EngineError::persistence(msg));
    }
    Ok(())
}

pub async fn clear_state(store: &dyn KeyValueStore, keys: &PersistKeys) -> Result<()> {
    let (a, b) = tokio::join!(store.delete(&keys.schedule), store.delete(&keys.predictions));
    a?;
    b?;
    Ok(())
}
