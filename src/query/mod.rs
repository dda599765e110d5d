//! Taxon query grammar

pub mod dates;
pub mod macros;
pub mod model;
pub mod natural;
pub mod ranks;
pub mod tokenizer;
pub mod urls;

pub use model::{ControlledTermQuery, DateArg, Query, TaxonQuery};
pub use natural::NaturalParser;
