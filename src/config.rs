use std::env;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::warn;

use crate::kv::{KeyValueStore, MemoryStore, SqliteStore};
use crate::persist::PersistKeys;

const APP_DIR: &str = "quiniela";
const DB_FILE: &str = "store.sqlite";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreKind {
    Sqlite,
    Memory,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub store: StoreKind,
    pub db_path: Option<PathBuf>,
    pub keys: PersistKeys,
}

impl Config {
    pub fn from_env() -> Self {
        let store = match env::var("QUINIELA_STORE")
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase()
            .as_str()
        {
            "" | "sqlite" => StoreKind::Sqlite,
            "memory" => StoreKind::Memory,
            other => {
                warn!(value = other, "unknown QUINIELA_STORE, using sqlite");
                StoreKind::Sqlite
            }
        };

        let db_path = non_empty_var("QUINIELA_DB")
            .map(PathBuf::from)
            .or_else(default_db_path);

        let defaults = PersistKeys::default();
        let keys = PersistKeys {
            schedule: non_empty_var("QUINIELA_SCHEDULE_KEY").unwrap_or(defaults.schedule),
            predictions: non_empty_var("QUINIELA_PREDICTIONS_KEY")
                .unwrap_or(defaults.predictions),
        };

        Self {
            store,
            db_path,
            keys,
        }
    }

    pub fn open_store(&self) -> Result<Arc<dyn KeyValueStore>> {
        match self.store {
            StoreKind::Memory => Ok(Arc::new(MemoryStore::new())),
            StoreKind::Sqlite => {
                let path = self
                    .db_path
                    .as_ref()
                    .context("unable to resolve sqlite path (set QUINIELA_DB)")?;
                Ok(Arc::new(SqliteStore::open(path)?))
            }
        }
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

pub fn app_data_dir() -> Option<PathBuf> {
    if let Some(base) = non_empty_var("XDG_CACHE_HOME") {
        return Some(PathBuf::from(base).join(APP_DIR));
    }
    let home = non_empty_var("HOME")?;
    Some(PathBuf::from(home).join(".cache").join(APP_DIR))
}

pub fn default_db_path() -> Option<PathBuf> {
    app_data_dir().map(|dir| dir.join(DB_FILE))
}
