use serde::{Deserialize, Serialize};

use super::{Taxon, User, WWW_BASE_URL};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ObservationPhoto {
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub id: u64,
    #[serde(default)]
    pub taxon: Option<Taxon>,
    #[serde(default)]
    pub user: Option<User>,
    #[serde(default)]
    pub observed_on_string: Option<String>,
    #[serde(default)]
    pub observed_on: Option<String>,
    #[serde(default)]
    pub place_guess: Option<String>,
    #[serde(default)]
    pub quality_grade: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub photos: Vec<ObservationPhoto>,
    #[serde(default)]
    pub identifications_count: u64,
    #[serde(default)]
    pub faves_count: u64,
    #[serde(default)]
    pub comments_count: u64,
}

impl Observation {
    pub fn url(&self) -> String {
        format!("{WWW_BASE_URL}/observations/{}", self.id)
    }

    /// First photo at medium size; the API returns square thumbnails.
    pub fn image(&self) -> Option<String> {
        self.photos
            .first()
            .and_then(|p| p.url.as_deref())
            .map(|url| url.replace("/square", "/medium"))
    }

    pub fn quality_grade_label(&self) -> &str {
        match self.quality_grade.as_deref() {
            Some("research") => "Research Grade",
            Some("needs_id") => "Needs ID",
            Some("casual") => "Casual",
            _ => "",
        }
    }
}
