//! Records returned by the iNaturalist and eBird web APIs.

pub mod controlled_term;
pub mod ebird;
pub mod observation;
pub mod place;
pub mod project;
pub mod search;
pub mod taxon;
pub mod user;

pub use controlled_term::{ControlledTerm, ControlledTermValue};
pub use ebird::EbirdObservation;
pub use observation::Observation;
pub use place::Place;
pub use project::Project;
pub use search::{Bounds, BoundsResponse, SearchResult};
pub use taxon::{Photo, Taxon, TaxonName, TAXON_ID_LIFE};
pub use user::User;

use serde::{Deserialize, Serialize};

pub const WWW_BASE_URL: &str = "https://www.inaturalist.org";

/// One page of an iNaturalist v1 search response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    #[serde(default)]
    pub total_results: u64,
    #[serde(default)]
    pub page: u64,
    #[serde(default)]
    pub per_page: u64,
    #[serde(default = "Vec::new")]
    pub results: Vec<T>,
}

impl<T> Default for Page<T> {
    fn default() -> Self {
        Self {
            total_results: 0,
            page: 0,
            per_page: 0,
            results: Vec::new(),
        }
    }
}

/// Escape characters that Discord treats as markdown.
pub fn escape_markdown(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        if matches!(ch, '*' | '_' | '`' | '~' | '|' | '>') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}
