//! Resolving taxon queries to a single best-matching taxon

pub mod lookup;
pub mod matching;

pub use lookup::{MatchOptions, TaxonLookup};
pub use matching::{match_taxon, MatchScope};
