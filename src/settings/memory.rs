//! In-process settings, lost on restart

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

use super::{Scope, SettingsStore};
use crate::error::SettingsError;

#[derive(Debug, Default)]
pub struct MemorySettings {
    values: RwLock<HashMap<Scope, String>>,
}

impl MemorySettings {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SettingsStore for MemorySettings {
    async fn load(&self, scope: Scope) -> Result<Option<String>, SettingsError> {
        Ok(self.values.read().await.get(&scope).cloned())
    }

    async fn store(&self, scope: Scope, value: String) -> Result<(), SettingsError> {
        self.values.write().await.insert(scope, value);
        Ok(())
    }
}
