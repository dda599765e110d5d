//! Settings persisted in Redis as JSON strings.

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use tracing::{debug, info};

use super::{Scope, SettingsStore};
use crate::error::SettingsError;

/// Settings store over a Redis connection manager, which reconnects on its
/// own after connection loss.
#[derive(Clone)]
pub struct RedisSettings {
    connection: ConnectionManager,
}

impl RedisSettings {
    pub async fn connect(redis_url: &str) -> Result<Self, SettingsError> {
        let client = redis::Client::open(redis_url)?;
        let connection = ConnectionManager::new(client).await?;
        info!("Connected to Redis settings store");
        Ok(Self { connection })
    }
}

#[async_trait]
impl SettingsStore for RedisSettings {
    async fn load(&self, scope: Scope) -> Result<Option<String>, SettingsError> {
        let mut connection = self.connection.clone();
        let value: Option<String> = connection.get(scope.key()).await?;
        Ok(value)
    }

    async fn store(&self, scope: Scope, value: String) -> Result<(), SettingsError> {
        let mut connection = self.connection.clone();
        debug!(key = %scope, "Saving settings");
        let _: () = connection.set(scope.key(), value).await?;
        Ok(())
    }
}
