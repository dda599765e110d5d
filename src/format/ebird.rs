//! eBird hybrid report lines

use crate::models::EbirdObservation;

pub const DEFAULT_DATETIME_FORMAT: &str = "%H:%M, %d %b";

/// `{comName} ({sciName}); {howMany} observed at {obsDt}, from {locName}`
pub fn hybrid_line(record: &EbirdObservation, datetime_format: &str) -> String {
    let how_many = record
        .how_many
        .map(|n| n.to_string())
        .unwrap_or_else(|| "X".to_string());
    format!(
        "{} ({}); {} observed at {}, from {}",
        record.com_name,
        record.sci_name,
        how_many,
        record.observed_at(datetime_format),
        record.loc_name
    )
}

/// One line per record, or a note that there were none.
pub fn hybrids_report(records: &[EbirdObservation], days: u32, datetime_format: &str) -> Vec<String> {
    if records.is_empty() {
        return vec![format!("No hybrids observed in the past {days} days.")];
    }
    records
        .iter()
        .map(|record| hybrid_line(record, datetime_format))
        .collect()
}
