//! Environment configuration.
//!
//! Values come from the process environment, after `.env` has been loaded
//! by the binary with `dotenvy`.

use std::env;

use crate::commands::DEFAULT_PREFIX;
use crate::services::ebird::EBIRD_BASE_URL;
use crate::services::inaturalist::API_BASE_URL;

pub const DEFAULT_PORT: u16 = 8080;
/// Every day at 05:00 UTC (seconds field first).
pub const DEFAULT_HYBRIDS_REPORT_CRON: &str = "0 0 5 * * *";

/// Deployment environment: `production`/`prod` or anything else.
pub fn get_environment() -> String {
    env::var("ENVIRONMENT").unwrap_or_else(|_| "sandbox".to_string())
}

fn non_empty(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

pub fn discord_token() -> Option<String> {
    non_empty("DISCORD_TOKEN")
}

pub fn bot_prefix() -> String {
    non_empty("BOT_PREFIX").unwrap_or_else(|| DEFAULT_PREFIX.to_string())
}

/// Discord user ids allowed to change global settings, comma separated.
pub fn bot_owner_ids() -> Vec<u64> {
    non_empty("BOT_OWNER_IDS")
        .map(|ids| parse_ids(&ids))
        .unwrap_or_default()
}

fn parse_ids(ids: &str) -> Vec<u64> {
    ids.split(',')
        .filter_map(|id| id.trim().parse().ok())
        .collect()
}

pub fn ebird_api_key() -> Option<String> {
    non_empty("EBIRD_API_KEY")
}

pub fn inat_api_url() -> String {
    non_empty("INAT_API_URL").unwrap_or_else(|| API_BASE_URL.to_string())
}

pub fn ebird_api_url() -> String {
    non_empty("EBIRD_API_URL").unwrap_or_else(|| EBIRD_BASE_URL.to_string())
}

/// Bearer token for owner and admin requests to the HTTP API.
pub fn api_token() -> Option<String> {
    non_empty("API_TOKEN")
}

/// Settings are kept in memory when this is unset.
pub fn redis_url() -> Option<String> {
    non_empty("REDIS_URL")
}

pub fn port() -> u16 {
    env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(DEFAULT_PORT)
}

pub fn hybrids_report_cron() -> String {
    non_empty("HYBRIDS_REPORT_CRON").unwrap_or_else(|| DEFAULT_HYBRIDS_REPORT_CRON.to_string())
}
