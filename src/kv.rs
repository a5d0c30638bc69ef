use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::Context;
use async_trait::async_trait;
use chrono::Utc;
use rusqlite::{Connection, OptionalExtension, params};
use tokio::sync::RwLock;

use crate::error::{EngineError, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredValue {
    pub key: String,
    pub value: String,
    pub shared: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Deleted {
    pub key: String,
    pub deleted: bool,
    pub shared: bool,
}

#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<StoredValue>;
    async fn set(&self, key: &str, value: &str) -> Result<StoredValue>;
    async fn delete(&self, key: &str) -> Result<Deleted>;
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, String>>,
    fail_writes: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    fn check_writable(&self, key: &str) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(EngineError::persistence(format!("write to {key} rejected")));
        }
        Ok(())
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<StoredValue> {
        let entries = self.entries.read().await;
        let value = entries
            .get(key)
            .cloned()
            .ok_or_else(|| EngineError::not_found(format!("key {key}")))?;
        Ok(StoredValue {
            key: key.to_string(),
            value,
            shared: false,
        })
    }

    async fn set(&self, key: &str, value: &str) -> Result<StoredValue> {
        self.check_writable(key)?;
        self.entries
            .write()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(StoredValue {
            key: key.to_string(),
            value: value.to_string(),
            shared: false,
        })
    }

    async fn delete(&self, key: &str) -> Result<Deleted> {
        self.check_writable(key)?;
        let removed = self.entries.write().await.remove(key);
        Ok(Deleted {
            key: key.to_string(),
            deleted: removed.is_some(),
            shared: false,
        })
    }
}

#[derive(Debug, Clone)]
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    pub fn open(path: &Path) -> anyhow::Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).ok();
        }
        let conn =
            Connection::open(path).with_context(|| format!("open sqlite db {}", path.display()))?;
        Self::from_connection(conn)
    }

    pub fn open_in_memory() -> anyhow::Result<Self> {
        let conn = Connection::open_in_memory().context("open in-memory sqlite db")?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> anyhow::Result<Self> {
        init_schema(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    async fn run<T, F>(&self, op: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> rusqlite::Result<T> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let guard = conn
                .lock()
                .map_err(|_| EngineError::persistence("sqlite connection lock poisoned"))?;
            op(&guard).map_err(|err| EngineError::persistence(err.to_string()))
        })
        .await
        .map_err(|err| EngineError::persistence(format!("sqlite task failed: {err}")))?
    }
}

pub fn init_schema(conn: &Connection) -> anyhow::Result<()> {
    conn.execute_batch(
        r#"
        PRAGMA journal_mode = WAL;
        CREATE TABLE IF NOT EXISTS kv (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );
        "#,
    )
    .context("create sqlite schema")?;
    Ok(())
}

#[async_trait]
impl KeyValueStore for SqliteStore {
    async fn get(&self, key: &str) -> Result<StoredValue> {
        let owned = key.to_string();
        let value = self
            .run(move |conn| {
                conn.query_row(
                    "SELECT value FROM kv WHERE key = ?1",
                    params![owned],
                    |row| row.get::<_, String>(0),
                )
                .optional()
            })
            .await?
            .ok_or_else(|| EngineError::not_found(format!("key {key}")))?;
        Ok(StoredValue {
            key: key.to_string(),
            value,
            shared: false,
        })
    }

    async fn set(&self, key: &str, value: &str) -> Result<StoredValue> {
        let (k, v) = (key.to_string(), value.to_string());
        self.run(move |conn| {
            conn.execute(
                r#"
                INSERT INTO kv (key, value, updated_at) VALUES (?1, ?2, ?3)
                ON CONFLICT(key) DO UPDATE SET
                    value = excluded.value,
                    updated_at = excluded.updated_at
                "#,
                params![k, v, Utc::now().to_rfc3339()],
            )
        })
        .await?;
        Ok(StoredValue {
            key: key.to_string(),
            value: value.to_string(),
            shared: false,
        })
    }

    async fn delete(&self, key: &str) -> Result<Deleted> {
        let owned = key.to_string();
        let removed = self
            .run(move |conn| conn.execute("DELETE FROM kv WHERE key = ?1", params![owned]))
            .await?;
        Ok(Deleted {
            key: key.to_string(),
            deleted: removed > 0,
            shared: false,
        })
    }
}
