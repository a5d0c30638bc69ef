use std::sync::Arc;

use async_trait::async_trait;

use crate::error::{EngineError, Result};
use crate::kv::KeyValueStore;

#[async_trait]
pub trait Credentials: Send + Sync {
    async fn exists(&self, user: &str) -> Result<bool>;
    async fn verify(&self, user: &str, secret: &str) -> Result<bool>;
    async fn create(&self, user: &str, secret: &str) -> Result<()>;
}

pub struct KvCredentials {
    store: Arc<dyn KeyValueStore>,
}

impl KvCredentials {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    fn key(user: &str) -> String {
        format!("user_{user}")
    }

    async fn lookup(&self, user: &str) -> Result<Option<String>> {
        match self.store.get(&Self::key(user)).await {
            Ok(stored) => Ok(Some(stored.value)),
            Err(EngineError::NotFound(_)) => Ok(None),
            Err(err) => Err(err),
        }
    }
}

#[async_trait]
impl Credentials for KvCredentials {
    async fn exists(&self, user: &str) -> Result<bool> {
        Ok(self.lookup(user).await?.is_some())
    }

    async fn verify(&self, user: &str, secret: &str) -> Result<bool> {
        Ok(self.lookup(user).await?.is_some_and(|stored| stored == secret))
    }

    async fn create(&self, user: &str, secret: &str) -> Result<()> {
        if self.exists(user).await? {
            return Err(EngineError::AlreadyExists(format!("user {user}")));
        }
        self.store.set(&Self::key(user), secret).await?;
        Ok(())
    }
}
