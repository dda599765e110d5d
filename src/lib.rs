//! Discord commands for iNaturalist and eBird.
//!
//! The centre of the crate is [`query`], a small natural-language grammar
//! for taxon queries (`taxon genus prunella in animals`), and [`taxa`],
//! which resolves a parsed query to the single best-matching taxon through
//! the iNaturalist API. [`commands`] and [`listeners`] turn chat messages
//! into replies; the binaries connect them to Discord and to HTTP.

pub mod commands;
pub mod config;
pub mod core;
pub mod error;
pub mod format;
pub mod listeners;
pub mod logging;
pub mod metrics;
pub mod models;
pub mod query;
pub mod resolver;
pub mod services;
pub mod settings;
pub mod taxa;

pub use error::{ApiError, CommandError, QueryError, SettingsError};
