//! iNaturalist web API access

pub mod client;

pub use client::{param, INatClient, Params, API_BASE_URL};
