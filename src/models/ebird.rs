use chrono::format::{Item, StrftimeItems};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt::Write;

/// Date format of `obsDt`.
pub const EBIRD_DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M";

/// A record from `/v2/data/obs/{region}/recent` with `detail=simple`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EbirdObservation {
    pub species_code: String,
    pub com_name: String,
    pub sci_name: String,
    #[serde(default)]
    pub loc_name: String,
    pub obs_dt: String,
    #[serde(default)]
    pub how_many: Option<u32>,
}

impl EbirdObservation {
    /// `obsDt` reformatted with `format`. Dates without a time, and formats
    /// chrono can't render for a naive date, are passed through unchanged.
    pub fn observed_at(&self, format: &str) -> String {
        let Ok(dt) = NaiveDateTime::parse_from_str(&self.obs_dt, EBIRD_DATETIME_FORMAT) else {
            return self.obs_dt.clone();
        };
        let mut out = String::new();
        match write!(out, "{}", dt.format(format)) {
            Ok(()) => out,
            Err(_) => self.obs_dt.clone(),
        }
    }
}

/// Whether every specifier in a strftime `format` is one chrono knows.
pub fn is_valid_datetime_format(format: &str) -> bool {
    !StrftimeItems::new(format).any(|item| matches!(item, Item::Error))
}
