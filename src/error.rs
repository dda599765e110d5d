//! Error types shared across the library.
//!
//! Every error here ends up as a chat reply, so the `Display` text is written
//! for the person who typed the command.

use thiserror::Error;

/// Errors from parsing a query.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    #[error("No closing quotation")]
    UnclosedQuote,

    #[error("Nothing to look up. Try e.g. `genus prunella in animals`.")]
    Empty,

    #[error("Missing argument for `{0}`.")]
    MissingArgument(String),

    #[error("Taxon IDs are unique. Retry without any ranks: `sp`, `genus`, etc.")]
    IdWithRanks,

    #[error("Taxon IDs are unique. Retry without `in <taxon2>`.")]
    IdWithAncestor,

    #[error("Missing `<ranks>` or `<taxon1>` for `in <taxon2>` search.")]
    AncestorWithoutMain,

    #[error("Date not understood: `{0}`")]
    InvalidDate(String),
}

/// Errors from the iNaturalist and eBird web APIs and lookups built on them.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Lookup failed: {0}")]
    LookupFailed(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{service} not responding after {attempts} attempts. Please try again later.")]
    Unavailable {
        service: &'static str,
        attempts: usize,
    },

    #[error("Temporary failure: {0}")]
    Transient(String),

    #[error("Unexpected response: {0}")]
    Decode(String),

    #[error(
        "The eBird API key is not set yet.\n\
         1. Get one here:\n   https://ebird.org/api/keygen\n\
         2. Set `EBIRD_API_KEY` in the bot's environment."
    )]
    MissingApiKey,

    #[error("Request error: {0}")]
    Http(#[from] reqwest::Error),
}

impl ApiError {
    /// Whether the request is worth retrying.
    pub fn is_transient(&self) -> bool {
        matches!(self, ApiError::Transient(_))
    }
}

/// Errors from the settings store.
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Settings storage error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Settings are corrupt: {0}")]
    Serde(#[from] serde_json::Error),
}

/// Errors a command handler can return.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error(transparent)]
    Query(#[from] QueryError),

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Settings(#[from] SettingsError),

    #[error("Usage: `{0}`")]
    Usage(String),

    #[error("{0}")]
    Invalid(String),

    #[error("You don't have permission to do that: {0}")]
    Permission(String),
}

pub type CommandResult<T> = Result<T, CommandError>;
