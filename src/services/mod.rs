//! Web API clients

pub mod ebird;
pub mod inaturalist;
pub mod rate_limit;
pub mod request;

pub use ebird::EbirdClient;
pub use inaturalist::INatClient;
pub use rate_limit::RateLimiter;
