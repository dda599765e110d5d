//! eBird API v2 client

use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::StatusCode;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::error::ApiError;
use crate::metrics::Metrics;
use crate::models::EbirdObservation;
use crate::services::request::{read_json, send_error, with_retries};

pub const EBIRD_BASE_URL: &str = "https://api.ebird.org";

/// Country, subnational1 or subnational2 code, e.g. `CA`, `CA-NS`, `US-NY-109`.
static REGION_CODE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z]{2}(-[A-Za-z0-9]{1,3}(-[A-Za-z0-9]{1,3})?)?$").expect("valid regex")
});

pub fn is_valid_region(region: &str) -> bool {
    REGION_CODE.is_match(region)
}

pub struct EbirdClient {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    metrics: Option<Arc<Metrics>>,
}

impl EbirdClient {
    pub fn new(base_url: impl Into<String>, api_key: Option<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_default();
        Self::with_client(base_url, api_key, client)
    }

    pub fn with_client(
        base_url: impl Into<String>,
        api_key: Option<String>,
        client: reqwest::Client,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.filter(|k| !k.is_empty()),
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<Metrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// Recent observations in `region` over the past `back` days, including
    /// provisional records. `category` narrows by taxonomic category, e.g.
    /// `hybrid`.
    pub async fn recent_observations(
        &self,
        region: &str,
        back: u32,
        category: &str,
    ) -> Result<Vec<EbirdObservation>, ApiError> {
        let api_key = self.api_key.as_deref().ok_or(ApiError::MissingApiKey)?;
        if !is_valid_region(region) {
            return Err(ApiError::LookupFailed(format!(
                "`{region}` is not a valid eBird region code."
            )));
        }

        let url = format!("{}/v2/data/obs/{}/recent", self.base_url, region);
        let params = [
            ("back", back.to_string()),
            ("cat", category.to_string()),
            ("detail", "simple".to_string()),
            ("includeProvisional", "true".to_string()),
        ];
        debug!(url = %url, back, category, "eBird request");

        let url = url.as_str();
        let params = &params;
        let value = with_retries("eBird", url, self.metrics.as_deref(), || async move {
            self.get_once(url, params, api_key).await
        })
        .await?;
        serde_json::from_value(value).map_err(|e| ApiError::Decode(e.to_string()))
    }

    async fn get_once(
        &self,
        url: &str,
        params: &[(&str, String)],
        api_key: &str,
    ) -> Result<Value, ApiError> {
        let response = self
            .client
            .get(url)
            .header("X-eBirdApiToken", api_key)
            .query(params)
            .send()
            .await
            .map_err(send_error)?;
        read_json("eBird", url, response, describe_error).await
    }
}

/// `{"errors": [{"status": "400 BAD_REQUEST", "title": "..."}]}`
fn describe_error(body: &Value, status: StatusCode) -> Option<String> {
    let title = body
        .get("errors")?
        .as_array()?
        .first()?
        .get("title")?
        .as_str()?;
    Some(format!("{title} ({})", status.as_u16()))
}
