use serde::{Deserialize, Serialize};

use super::WWW_BASE_URL;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Place {
    pub id: u64,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub slug: Option<String>,
}

impl Place {
    pub fn url(&self) -> String {
        format!("{WWW_BASE_URL}/places/{}", self.id)
    }
}
