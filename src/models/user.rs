use serde::{Deserialize, Serialize};

use super::{escape_markdown, WWW_BASE_URL};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: u64,
    #[serde(default)]
    pub login: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub observations_count: u64,
    #[serde(default)]
    pub identifications_count: u64,
    #[serde(default)]
    pub species_count: u64,
}

impl User {
    /// `Name (login)` or just the login, markdown-escaped.
    pub fn display_name(&self) -> String {
        match self.name.as_deref().filter(|n| !n.is_empty()) {
            Some(name) => format!("{} ({})", escape_markdown(name), escape_markdown(&self.login)),
            None => escape_markdown(&self.login),
        }
    }

    pub fn profile_url(&self) -> String {
        format!("{WWW_BASE_URL}/people/{}", self.login)
    }

    pub fn profile_link(&self) -> String {
        format!("[{}]({})", self.display_name(), self.profile_url())
    }
}
