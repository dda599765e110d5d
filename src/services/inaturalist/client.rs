//! iNaturalist API v1 client

use moka::future::Cache;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::error::ApiError;
use crate::metrics::Metrics;
use crate::models::{
    Bounds, BoundsResponse, ControlledTerm, Observation, Page, Place, Project, SearchResult, Taxon,
    User,
};
use crate::services::rate_limit::RateLimiter;
use crate::services::request::{read_json, send_error, with_retries};

pub use crate::services::request::MAX_ATTEMPTS;

pub const API_BASE_URL: &str = "https://api.inaturalist.org";

/// Entries per cache.
pub const CACHE_CAPACITY: u64 = 1_000;
/// How long a cached place, project, user or term list is trusted.
pub const CACHE_TTL: Duration = Duration::from_secs(60 * 60);

/// An id, login or slug that is safe to use as a URL path segment.
static PATH_KEY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9][A-Za-z0-9_-]*$").expect("valid regex"));

/// Query string parameters.
pub type Params = Vec<(String, String)>;

pub fn param(key: &str, value: impl ToString) -> (String, String) {
    (key.to_string(), value.to_string())
}

fn has_param(params: &Params, key: &str) -> bool {
    params.iter().any(|(k, _)| k == key)
}

/// `{"error": "Not Found", "status": 404}`
fn describe_error(body: &Value, status: reqwest::StatusCode) -> Option<String> {
    let error = body
        .get("error")
        .and_then(Value::as_str)
        .unwrap_or("Unknown error");
    let status = body
        .get("status")
        .map(|s| s.to_string().trim_matches('"').to_string())
        .unwrap_or_else(|| status.as_u16().to_string());
    Some(format!("{error} ({status})"))
}

fn is_not_found(err: &ApiError) -> bool {
    matches!(err, ApiError::LookupFailed(msg) if msg.contains("(404)"))
}

fn cache<K, V>(ttl: Duration) -> Cache<K, V>
where
    K: std::hash::Hash + Eq + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    Cache::builder()
        .max_capacity(CACHE_CAPACITY)
        .time_to_live(ttl)
        .build()
}

pub struct INatClient {
    client: reqwest::Client,
    base_url: String,
    limiter: RateLimiter,
    metrics: Option<Arc<Metrics>>,
    places: Cache<u64, Place>,
    projects: Cache<u64, Project>,
    users: Cache<u64, User>,
    user_logins: Cache<String, u64>,
    controlled_terms: Cache<(), Vec<ControlledTerm>>,
}

impl INatClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(concat!("fieldnotes/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_default();
        Self::with_client(base_url, client)
    }

    pub fn with_client(base_url: impl Into<String>, client: reqwest::Client) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            limiter: RateLimiter::per_minute(60),
            metrics: None,
            places: cache(CACHE_TTL),
            projects: cache(CACHE_TTL),
            users: cache(CACHE_TTL),
            user_logins: cache(CACHE_TTL),
            controlled_terms: cache(CACHE_TTL),
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<Metrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Replace the caches with ones whose entries expire after `ttl`.
    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.places = cache(ttl);
        self.projects = cache(ttl);
        self.users = cache(ttl);
        self.user_logins = cache(ttl);
        self.controlled_terms = cache(ttl);
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn get_once(&self, url: &str, params: &Params) -> Result<Value, ApiError> {
        self.limiter.acquire().await;
        let response = self
            .client
            .get(url)
            .query(params)
            .send()
            .await
            .map_err(send_error)?;
        read_json("iNat", url, response, describe_error).await
    }

    /// GET `path` with retries, decoding the body as `T`.
    pub async fn get<T: DeserializeOwned>(&self, path: &str, params: &Params) -> Result<T, ApiError> {
        let url = format!("{}{}", self.base_url, path);
        debug!(url = %url, ?params, "iNat request");

        let url = url.as_str();
        let value = with_retries("iNat", url, self.metrics.as_deref(), || async move {
            self.get_once(url, params).await
        })
        .await?;
        serde_json::from_value(value).map_err(|e| ApiError::Decode(e.to_string()))
    }

    /// GET `/v1/{collection}/{key}`, the first result or `None` if there is
    /// no such record. Keys that aren't plain ids, logins or slugs are never
    /// sent.
    async fn get_by_key<T: DeserializeOwned>(
        &self,
        collection: &str,
        key: &str,
    ) -> Result<Option<T>, ApiError> {
        if !PATH_KEY.is_match(key) {
            debug!(collection, key, "Not a valid lookup key");
            return Ok(None);
        }
        match self
            .get::<Page<T>>(&format!("/v1/{collection}/{key}"), &Params::new())
            .await
        {
            Ok(page) => Ok(page.results.into_iter().next()),
            Err(e) if is_not_found(&e) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Search taxa. Text queries on the first page go to the autocomplete
    /// endpoint, which ranks results like the website's taxon search.
    pub async fn search_taxa(&self, params: &Params) -> Result<Page<Taxon>, ApiError> {
        let endpoint = if has_param(params, "q") && !has_param(params, "page") {
            "/v1/taxa/autocomplete"
        } else {
            "/v1/taxa"
        };
        let mut params = params.clone();
        params.insert(0, param("all_names", "true"));
        self.get(endpoint, &params).await
    }

    pub async fn get_taxon(&self, taxon_id: u64, params: &Params) -> Result<Option<Taxon>, ApiError> {
        let mut params = params.clone();
        params.insert(0, param("all_names", "true"));
        let page: Page<Taxon> = self.get(&format!("/v1/taxa/{taxon_id}"), &params).await?;
        Ok(page.results.into_iter().next())
    }

    pub async fn get_observations(&self, params: &Params) -> Result<Page<Observation>, ApiError> {
        self.get("/v1/observations", params).await
    }

    pub async fn get_observation(&self, obs_id: u64) -> Result<Option<Observation>, ApiError> {
        let page: Page<Observation> = self
            .get(&format!("/v1/observations/{obs_id}"), &Params::new())
            .await?;
        Ok(page.results.into_iter().next())
    }

    /// Bounding box of verifiable observations of any of `taxon_ids`.
    pub async fn get_observation_bounds(&self, taxon_ids: &[u64]) -> Result<Option<Bounds>, ApiError> {
        let ids: Vec<String> = taxon_ids.iter().map(u64::to_string).collect();
        let params = vec![
            param("return_bounds", "true"),
            param("verifiable", "true"),
            param("taxon_id", ids.join(",")),
            param("per_page", 0),
        ];
        let response: BoundsResponse = self.get("/v1/observations", &params).await?;
        Ok(response.total_bounds)
    }

    /// Site search: taxa, places, projects and users matching `q`.
    pub async fn site_search(&self, params: &Params) -> Result<Page<SearchResult>, ApiError> {
        self.get("/v1/search", params).await
    }

    /// Only `total_results` of the species counts is used.
    pub async fn get_species_counts(&self, params: &Params) -> Result<Page<Value>, ApiError> {
        self.get("/v1/observations/species_counts", params).await
    }

    /// Total observations and species for the parameters.
    pub async fn get_counts(&self, params: &Params) -> Result<(u64, u64), ApiError> {
        let mut params = params.clone();
        params.push(param("per_page", 0));
        let observations = self.get_observations(&params).await?;
        let species = self.get_species_counts(&params).await?;
        Ok((observations.total_results, species.total_results))
    }

    /// User by numeric id or exact login.
    pub async fn get_user(&self, key: &str) -> Result<Option<User>, ApiError> {
        let cached_id = match key.parse::<u64>() {
            Ok(id) => Some(id),
            Err(_) => self.user_logins.get(&key.to_lowercase()).await,
        };
        if let Some(id) = cached_id {
            if let Some(user) = self.users.get(&id).await {
                return Ok(Some(user));
            }
        }

        let user: Option<User> = self.get_by_key("users", key).await?;
        if let Some(user) = &user {
            self.cache_user(user).await;
        }
        Ok(user)
    }

    pub async fn search_users(&self, query: &str) -> Result<Vec<User>, ApiError> {
        let page: Page<User> = self
            .get("/v1/users/autocomplete", &vec![param("q", query)])
            .await?;
        for user in &page.results {
            self.cache_user(user).await;
        }
        Ok(page.results)
    }

    async fn cache_user(&self, user: &User) {
        self.user_logins
            .insert(user.login.to_lowercase(), user.id)
            .await;
        self.users.insert(user.id, user.clone()).await;
    }

    /// Place by id or slug. Places rarely change, so lookups by id are cached.
    pub async fn get_place(&self, key: &str) -> Result<Option<Place>, ApiError> {
        if let Ok(id) = key.parse::<u64>() {
            if let Some(place) = self.places.get(&id).await {
                return Ok(Some(place));
            }
        }
        let place: Option<Place> = self.get_by_key("places", key).await?;
        if let Some(place) = &place {
            self.places.insert(place.id, place.clone()).await;
        }
        Ok(place)
    }

    pub async fn search_places(&self, query: &str) -> Result<Vec<Place>, ApiError> {
        let page: Page<Place> = self
            .get("/v1/places/autocomplete", &vec![param("q", query)])
            .await?;
        Ok(page.results)
    }

    /// Project by id or slug; cached like places.
    pub async fn get_project(&self, key: &str) -> Result<Option<Project>, ApiError> {
        if let Ok(id) = key.parse::<u64>() {
            if let Some(project) = self.projects.get(&id).await {
                return Ok(Some(project));
            }
        }
        let project: Option<Project> = self.get_by_key("projects", key).await?;
        if let Some(project) = &project {
            self.projects.insert(project.id, project.clone()).await;
        }
        Ok(project)
    }

    pub async fn search_projects(&self, query: &str) -> Result<Vec<Project>, ApiError> {
        let page: Page<Project> = self
            .get("/v1/projects/autocomplete", &vec![param("q", query)])
            .await?;
        Ok(page.results)
    }

    /// All controlled terms, fetched at most once per cache lifetime.
    pub async fn get_controlled_terms(&self) -> Result<Vec<ControlledTerm>, ApiError> {
        if let Some(terms) = self.controlled_terms.get(&()).await {
            return Ok(terms);
        }
        let page: Page<ControlledTerm> = self.get("/v1/controlled_terms", &Params::new()).await?;
        self.controlled_terms.insert((), page.results.clone()).await;
        Ok(page.results)
    }
}
