//! Bot settings at global, guild, channel and user scope.
//!
//! Each scope is a serde struct stored as one JSON value. Missing values
//! deserialize to their defaults, so a fresh store behaves like one holding
//! all-default settings.

pub mod memory;
pub mod redis_store;

pub use self::memory::MemorySettings;
pub use self::redis_store::RedisSettings;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::error::SettingsError;
use crate::format::ebird::DEFAULT_DATETIME_FORMAT;

pub const DEFAULT_EBIRD_REGION: &str = "CA-NS";
pub const DEFAULT_EBIRD_DAYS: u32 = 30;
pub const MAX_EBIRD_DAYS: u32 = 30;

/// Where a settings value lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scope {
    Global,
    Guild(u64),
    Channel(u64),
    User(u64),
}

impl Scope {
    /// Storage key, e.g. `fieldnotes:guild:1234`.
    pub fn key(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::Global => write!(f, "fieldnotes:global"),
            Scope::Guild(id) => write!(f, "fieldnotes:guild:{id}"),
            Scope::Channel(id) => write!(f, "fieldnotes:channel:{id}"),
            Scope::User(id) => write!(f, "fieldnotes:user:{id}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GlobalSettings {
    pub ebird_region: String,
    pub ebird_days: u32,
    pub datetime_format: String,
    pub home: Option<u64>,
    /// Channel the scheduled hybrids report is posted to.
    pub report_channel: Option<u64>,
}

impl Default for GlobalSettings {
    fn default() -> Self {
        Self {
            ebird_region: DEFAULT_EBIRD_REGION.to_string(),
            ebird_days: DEFAULT_EBIRD_DAYS,
            datetime_format: DEFAULT_DATETIME_FORMAT.to_string(),
            home: None,
            report_channel: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GuildSettings {
    pub home: Option<u64>,
    /// Lowercase abbreviation → place id.
    pub places: BTreeMap<String, u64>,
    /// Lowercase abbreviation → project id.
    pub projects: BTreeMap<String, u64>,
    /// Command name → URL template.
    pub links: BTreeMap<String, String>,
    pub autoobs: bool,
    pub dot_taxon: bool,
    pub listen: bool,
    /// Prefixes of other bots; messages starting with one are ignored.
    pub bot_prefixes: Vec<String>,
}

impl Default for GuildSettings {
    fn default() -> Self {
        Self {
            home: None,
            places: BTreeMap::new(),
            projects: BTreeMap::new(),
            links: BTreeMap::new(),
            autoobs: false,
            dot_taxon: false,
            listen: true,
            bot_prefixes: Vec::new(),
        }
    }
}

/// `None` inherits the guild value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelSettings {
    pub autoobs: Option<bool>,
    pub dot_taxon: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserSettings {
    pub inat_user_id: Option<u64>,
    pub home: Option<u64>,
}

/// Raw JSON storage with typed accessors per scope.
#[async_trait]
pub trait SettingsStore: Send + Sync {
    async fn load(&self, scope: Scope) -> Result<Option<String>, SettingsError>;

    async fn store(&self, scope: Scope, value: String) -> Result<(), SettingsError>;

    async fn global(&self) -> Result<GlobalSettings, SettingsError> {
        decode(self.load(Scope::Global).await?)
    }

    async fn set_global(&self, settings: &GlobalSettings) -> Result<(), SettingsError> {
        self.store(Scope::Global, serde_json::to_string(settings)?).await
    }

    async fn guild(&self, guild_id: u64) -> Result<GuildSettings, SettingsError> {
        decode(self.load(Scope::Guild(guild_id)).await?)
    }

    async fn set_guild(&self, guild_id: u64, settings: &GuildSettings) -> Result<(), SettingsError> {
        self.store(Scope::Guild(guild_id), serde_json::to_string(settings)?)
            .await
    }

    async fn channel(&self, channel_id: u64) -> Result<ChannelSettings, SettingsError> {
        decode(self.load(Scope::Channel(channel_id)).await?)
    }

    async fn set_channel(
        &self,
        channel_id: u64,
        settings: &ChannelSettings,
    ) -> Result<(), SettingsError> {
        self.store(Scope::Channel(channel_id), serde_json::to_string(settings)?)
            .await
    }

    async fn user(&self, user_id: u64) -> Result<UserSettings, SettingsError> {
        decode(self.load(Scope::User(user_id)).await?)
    }

    async fn set_user(&self, user_id: u64, settings: &UserSettings) -> Result<(), SettingsError> {
        self.store(Scope::User(user_id), serde_json::to_string(settings)?)
            .await
    }
}

fn decode<T: DeserializeOwned + Default>(raw: Option<String>) -> Result<T, SettingsError> {
    match raw {
        Some(raw) => Ok(serde_json::from_str(&raw)?),
        None => Ok(T::default()),
    }
}

/// Listener switches after channel overrides are applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListenerSettings {
    pub listen: bool,
    pub autoobs: bool,
    pub dot_taxon: bool,
    pub bot_prefixes: Vec<String>,
}

/// Effective listener settings for a message. Direct messages have every
/// listener on.
pub async fn listener_settings(
    store: &dyn SettingsStore,
    guild_id: Option<u64>,
    channel_id: u64,
) -> Result<ListenerSettings, SettingsError> {
    let Some(guild_id) = guild_id else {
        return Ok(ListenerSettings {
            listen: true,
            autoobs: true,
            dot_taxon: true,
            bot_prefixes: Vec::new(),
        });
    };
    let guild = store.guild(guild_id).await?;
    let channel = store.channel(channel_id).await?;
    Ok(ListenerSettings {
        listen: guild.listen,
        autoobs: channel.autoobs.unwrap_or(guild.autoobs),
        dot_taxon: channel.dot_taxon.unwrap_or(guild.dot_taxon),
        bot_prefixes: guild.bot_prefixes,
    })
}

/// Home place: the user's, else the guild's, else the global one.
pub async fn home_place(
    store: &dyn SettingsStore,
    guild_id: Option<u64>,
    user_id: u64,
) -> Result<Option<u64>, SettingsError> {
    if let Some(home) = store.user(user_id).await?.home {
        return Ok(Some(home));
    }
    if let Some(guild_id) = guild_id {
        if let Some(home) = store.guild(guild_id).await?.home {
            return Ok(Some(home));
        }
    }
    Ok(store.global().await?.home)
}
