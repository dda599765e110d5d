use serde::{Deserialize, Serialize};

use super::WWW_BASE_URL;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: u64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
}

impl Project {
    pub fn url(&self) -> String {
        format!("{WWW_BASE_URL}/projects/{}", self.id)
    }
}
