//! Taxon lookups against the iNaturalist API

use std::collections::HashSet;
use std::sync::Arc;
use tracing::debug;

use super::matching::{match_taxon, MatchScope};
use crate::error::ApiError;
use crate::format::taxon::{format_name, NameOptions};
use crate::models::{Taxon, TAXON_ID_LIFE};
use crate::query::ranks::{normalize_rank, rank_level};
use crate::query::{NaturalParser, Query, TaxonQuery};
use crate::services::inaturalist::{param, INatClient, Params};

/// Records per page from the autocomplete endpoint (first page only).
const AUTOCOMPLETE_PER_PAGE: usize = 30;
/// Records per page from `/v1/taxa` for every later page.
const SEARCH_PER_PAGE: usize = 200;
const MAX_PAGE: usize = 10;

const ANCESTOR_HINT: &str =
    "Perhaps instead of `in` (ancestor), you meant\n`from` (place) or `in prj` (project)?";

/// Knobs shared by the lookups.
#[derive(Debug, Clone, Default)]
pub struct MatchOptions {
    pub preferred_place_id: Option<u64>,
    pub scientific_name: bool,
    pub locale: Option<String>,
}

impl MatchOptions {
    fn scope(&self) -> MatchScope<'_> {
        MatchScope {
            scientific_name: self.scientific_name,
            locale: self.locale.as_deref(),
        }
    }

    fn params(&self) -> Params {
        let mut params = Params::new();
        if let Some(locale) = &self.locale {
            params.push(param("locale", locale));
        }
        if let Some(place_id) = self.preferred_place_id {
            params.push(param("preferred_place_id", place_id));
        }
        params
    }
}

pub struct TaxonLookup {
    client: Arc<INatClient>,
}

impl TaxonLookup {
    pub fn new(client: Arc<INatClient>) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &Arc<INatClient> {
        &self.client
    }

    /// Look up the single taxon best matching `query`, optionally within
    /// `ancestor_id`.
    pub async fn maybe_match_taxon(
        &self,
        query: &TaxonQuery,
        ancestor_id: Option<u64>,
        options: &MatchOptions,
    ) -> Result<Taxon, ApiError> {
        let mut params = options.params();
        let mut records_read = 0usize;
        let mut total_records = 0usize;

        if let Some(taxon_id) = query.taxon_id {
            if let Some(taxon) = self.client.get_taxon(taxon_id, &params).await? {
                return Ok(taxon);
            }
            return Err(ApiError::NotFound("No matching taxon found.".to_string()));
        }

        if !query.terms.is_empty() {
            params.push(param("q", query.search_text()));
        }
        if !query.ranks.is_empty() {
            params.push(param("rank", query.ranks.join(",")));
        }
        if let Some(ancestor_id) = ancestor_id {
            params.push(param("taxon_id", ancestor_id));
        }

        for page in 0..=MAX_PAGE {
            let mut page_params = params.clone();
            if page == 0 {
                page_params.push(param("per_page", AUTOCOMPLETE_PER_PAGE));
            } else {
                // later pages come from a different endpoint, so counting
                // starts over
                if page == 1 {
                    records_read = 0;
                }
                page_params.push(param("page", page));
                page_params.push(param("per_page", SEARCH_PER_PAGE));
            }

            let response = self.client.search_taxa(&page_params).await?;
            total_records = response.total_results as usize;
            if response.results.is_empty() {
                break;
            }
            records_read += response.results.len();
            debug!(page, records_read, total_records, "Matching taxa page");

            if let Some(taxon) = match_taxon(query, &response.results, options.scope()) {
                return Ok(taxon.clone());
            }
            if records_read >= total_records {
                break;
            }
        }

        if records_read >= total_records {
            return Err(ApiError::NotFound("No matching taxon found.".to_string()));
        }
        Err(ApiError::NotFound(format!(
            "No {}match found in {}{} of {} total records containing those terms.",
            if query.phrases.is_empty() { "" } else { "exact " },
            if options.scientific_name { "scientific name of " } else { "" },
            records_read,
            total_records
        )))
    }

    /// Match the main taxon of `query`, restricted to its `in` ancestor if
    /// one is given.
    pub async fn maybe_match_taxon_compound(
        &self,
        query: &Query,
        options: &MatchOptions,
    ) -> Result<Taxon, ApiError> {
        let main = query
            .main
            .as_ref()
            .ok_or_else(|| ApiError::NotFound("No taxon given.".to_string()))?;

        let Some(ancestor_query) = &query.ancestor else {
            return self.maybe_match_taxon(main, None, options).await;
        };

        let ancestor = self
            .maybe_match_taxon(ancestor_query, None, options)
            .await
            .map_err(|e| with_ancestor_hint(e, None))?;

        let max_query_level = main
            .ranks
            .iter()
            .filter_map(|rank| rank_level(rank))
            .fold(None, |max: Option<f64>, level| Some(max.map_or(level, |m| m.max(level))));
        if let (Some(query_level), Some(ancestor_level)) = (max_query_level, rank_level(&ancestor.rank)) {
            if query_level >= ancestor_level {
                let err = ApiError::NotFound(format!(
                    "Child rank{}: `{}` must be below ancestor rank: `{}`",
                    if main.ranks.len() > 1 { "s" } else { "" },
                    main.ranks.join(","),
                    ancestor.rank
                ));
                return Err(with_ancestor_hint(err, Some(&ancestor)));
            }
        }

        self.maybe_match_taxon(main, Some(ancestor.id), options)
            .await
            .map_err(|e| with_ancestor_hint(e, Some(&ancestor)))
    }

    /// Ancestor of `taxon` at `rank`, if the taxon has one.
    pub async fn get_taxon_ancestor(&self, taxon: &Taxon, rank: &str) -> Result<Option<Taxon>, ApiError> {
        let rank = normalize_rank(rank).unwrap_or(rank);
        let full;
        let taxon = if taxon.ancestors.is_empty() {
            match self.client.get_taxon(taxon.id, &Params::new()).await? {
                Some(record) => {
                    full = record;
                    &full
                }
                None => return Ok(None),
            }
        } else {
            taxon
        };

        let ranks = taxon.ancestor_ranks();
        let Some(index) = ranks.iter().position(|r| r == rank) else {
            return Ok(None);
        };
        match taxon.ancestor_ids.get(index) {
            Some(&ancestor_id) => self.client.get_taxon(ancestor_id, &Params::new()).await,
            None => Ok(None),
        }
    }

    /// Look up each comma-separated query, skipping those that fail.
    /// Returns the distinct taxa found and the queries that weren't.
    pub async fn query_taxa(
        &self,
        queries: &str,
        options: &MatchOptions,
    ) -> Result<(Vec<Taxon>, Vec<String>), ApiError> {
        let parser = NaturalParser::new();
        let mut seen = HashSet::new();
        let mut taxa = Vec::new();
        let mut missing = Vec::new();

        for text in queries.split(',').map(str::trim).filter(|t| !t.is_empty()) {
            let found = match parser.parse(text) {
                Ok(query) if query.main.is_some() => {
                    self.maybe_match_taxon_compound(&query, options).await.ok()
                }
                _ => None,
            };
            match found {
                Some(taxon) => {
                    if seen.insert(taxon.id) {
                        taxa.push(taxon);
                    }
                }
                None => missing.push(text.to_string()),
            }
        }

        if taxa.is_empty() {
            return Err(ApiError::NotFound("No taxon found".to_string()));
        }
        Ok((taxa, missing))
    }

    /// Deepest taxon that all of `taxa` descend from.
    pub async fn common_ancestor(&self, taxa: &[Taxon]) -> Result<Taxon, ApiError> {
        let not_found = || ApiError::NotFound("No taxon found".to_string());
        let first = taxa.first().ok_or_else(not_found)?;
        if taxa.len() == 1 {
            return Ok(first.clone());
        }

        let others: Vec<HashSet<u64>> = taxa[1..]
            .iter()
            .map(|t| t.ancestor_ids.iter().copied().collect())
            .collect();
        let common_id = first
            .ancestor_ids
            .iter()
            .rev()
            .find(|id| others.iter().all(|set| set.contains(id)))
            .copied()
            .unwrap_or(TAXON_ID_LIFE);

        self.client
            .get_taxon(common_id, &Params::new())
            .await?
            .ok_or_else(not_found)
    }
}

fn with_ancestor_hint(err: ApiError, ancestor: Option<&Taxon>) -> ApiError {
    let reason = match err {
        ApiError::NotFound(reason) => reason,
        failed @ ApiError::LookupFailed(_) => failed.to_string(),
        other => return other,
    };
    let ancestor_line = match ancestor {
        Some(ancestor) => format!("Ancestor taxon: {}", format_name(ancestor, NameOptions::with_term())),
        None => "Ancestor taxon not found.".to_string(),
    };
    ApiError::NotFound(format!("{reason}\n{ANCESTOR_HINT}\n\n{ancestor_line}"))
}
