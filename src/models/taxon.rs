//! iNaturalist taxon records

use serde::{Deserialize, Serialize};

use super::WWW_BASE_URL;

/// Id of the root of the tree of life.
pub const TAXON_ID_LIFE: u64 = 48460;

fn default_true() -> bool {
    true
}

/// One of the names a taxon is known by.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaxonName {
    pub name: String,
    #[serde(default)]
    pub locale: String,
    #[serde(default)]
    pub lexicon: Option<String>,
    #[serde(default = "default_true")]
    pub is_valid: bool,
    #[serde(default)]
    pub position: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Photo {
    #[serde(default)]
    pub square_url: Option<String>,
    #[serde(default)]
    pub medium_url: Option<String>,
    #[serde(default)]
    pub attribution: Option<String>,
}

/// A taxon as returned by `/v1/taxa` and `/v1/taxa/autocomplete`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Taxon {
    pub id: u64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub rank: String,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub matched_term: Option<String>,
    #[serde(default)]
    pub preferred_common_name: Option<String>,
    #[serde(default)]
    pub observations_count: u64,
    #[serde(default)]
    pub ancestor_ids: Vec<u64>,
    #[serde(default)]
    pub ancestors: Vec<Taxon>,
    #[serde(default)]
    pub names: Vec<TaxonName>,
    #[serde(default)]
    pub default_photo: Option<Photo>,
}

impl Default for Taxon {
    fn default() -> Self {
        Self {
            id: 0,
            name: String::new(),
            rank: String::new(),
            is_active: true,
            matched_term: None,
            preferred_common_name: None,
            observations_count: 0,
            ancestor_ids: Vec::new(),
            ancestors: Vec::new(),
            names: Vec::new(),
            default_photo: None,
        }
    }
}

impl Taxon {
    pub fn url(&self) -> String {
        format!("{WWW_BASE_URL}/taxa/{}", self.id)
    }

    /// The name the search matched, falling back to the common name and then
    /// the scientific name.
    pub fn term(&self) -> &str {
        self.matched_term
            .as_deref()
            .or(self.preferred_common_name.as_deref())
            .unwrap_or(&self.name)
    }

    /// Ranks aligned with `ancestor_ids`. Empty when the record carries no
    /// ancestors (autocomplete results).
    pub fn ancestor_ranks(&self) -> Vec<String> {
        if self.ancestors.is_empty() {
            return Vec::new();
        }
        std::iter::once("stateofmatter".to_string())
            .chain(self.ancestors.iter().map(|a| a.rank.clone()))
            .collect()
    }

    /// Common name in `locale`, else the preferred common name.
    pub fn common_name(&self, locale: Option<&str>) -> Option<&str> {
        locale
            .and_then(|lang| self.names.iter().find(|n| n.locale == lang))
            .map(|n| n.name.as_str())
            .or(self.preferred_common_name.as_deref())
    }

    pub fn thumbnail(&self) -> Option<&str> {
        self.default_photo
            .as_ref()
            .and_then(|p| p.square_url.as_deref())
    }

    pub fn image(&self) -> Option<&str> {
        self.default_photo
            .as_ref()
            .and_then(|p| p.medium_url.as_deref().or(p.square_url.as_deref()))
    }
}
