//! Shared service wiring for the binaries

use std::sync::Arc;
use tracing::{info, warn};

use crate::commands::CommandDispatcher;
use crate::config;
use crate::metrics::Metrics;
use crate::services::{EbirdClient, INatClient};
use crate::settings::{MemorySettings, RedisSettings, SettingsStore};

/// Configuration for the runtime
#[derive(Clone, Debug)]
pub struct RuntimeConfig {
    pub prefix: String,
    pub inat_api_url: String,
    pub ebird_api_url: String,
    pub ebird_api_key: Option<String>,
    pub redis_url: Option<String>,
}

impl RuntimeConfig {
    pub fn from_env() -> Self {
        Self {
            prefix: config::bot_prefix(),
            inat_api_url: config::inat_api_url(),
            ebird_api_url: config::ebird_api_url(),
            ebird_api_key: config::ebird_api_key(),
            redis_url: config::redis_url(),
        }
    }
}

/// API clients, settings store and metrics behind one dispatcher
pub struct Runtime {
    pub metrics: Arc<Metrics>,
    pub dispatcher: Arc<CommandDispatcher>,
}

impl Runtime {
    pub async fn new(config: RuntimeConfig) -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        let metrics = Arc::new(Metrics::new()?);

        let settings: Arc<dyn SettingsStore> = match &config.redis_url {
            Some(url) => Arc::new(RedisSettings::connect(url).await?),
            None => {
                warn!("REDIS_URL not set - settings are kept in memory and lost on restart");
                Arc::new(MemorySettings::new())
            }
        };

        if config.ebird_api_key.is_none() {
            warn!("EBIRD_API_KEY not set - eBird commands will explain how to set it");
        }

        let inat = Arc::new(INatClient::new(&config.inat_api_url).with_metrics(metrics.clone()));
        let ebird = Arc::new(
            EbirdClient::new(&config.ebird_api_url, config.ebird_api_key.clone())
                .with_metrics(metrics.clone()),
        );
        let dispatcher = Arc::new(
            CommandDispatcher::new(config.prefix.clone(), inat, ebird, settings)
                .with_metrics(metrics.clone()),
        );

        info!(
            prefix = %config.prefix,
            inat_api_url = %config.inat_api_url,
            ebird_api_url = %config.ebird_api_url,
            "Runtime initialized"
        );
        Ok(Self {
            metrics,
            dispatcher,
        })
    }
}
