use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One `/v1/search` result. `record` is a taxon, place, project or user
/// depending on `kind`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub record: Value,
}

/// Bounding box of an observation search.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub swlat: f64,
    pub swlng: f64,
    pub nelat: f64,
    pub nelng: f64,
}

/// `/v1/observations?return_bounds=true&per_page=0`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BoundsResponse {
    #[serde(default)]
    pub total_results: u64,
    #[serde(default)]
    pub total_bounds: Option<Bounds>,
}
