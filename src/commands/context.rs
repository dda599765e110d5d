//! Who asked, where, and what they get back

use serde::{Deserialize, Serialize};

use crate::format::Embed;

/// The message a command or listener is answering.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandContext {
    /// `None` in direct messages.
    #[serde(default)]
    pub guild_id: Option<u64>,
    #[serde(default)]
    pub channel_id: u64,
    #[serde(default)]
    pub author_id: u64,
    /// Bot owners may change global settings.
    #[serde(default)]
    pub is_owner: bool,
    /// Guild managers may change guild and channel settings.
    #[serde(default)]
    pub is_admin: bool,
    /// Recent channel messages, newest first. Only filled in for `last`.
    #[serde(default)]
    pub history: Vec<String>,
}

impl CommandContext {
    pub fn can_manage_guild(&self) -> bool {
        self.is_owner || self.is_admin
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "content", rename_all = "snake_case")]
pub enum Reply {
    Text(String),
    Embed(Embed),
}

impl Reply {
    pub fn text(text: impl Into<String>) -> Self {
        Reply::Text(text.into())
    }
}

impl From<Embed> for Reply {
    fn from(embed: Embed) -> Self {
        Reply::Embed(embed)
    }
}
