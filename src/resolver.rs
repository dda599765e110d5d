//! Turns a parsed [`Query`] into the iNaturalist records it names.

use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::Arc;
use tracing::debug;

use crate::commands::CommandContext;
use crate::error::{ApiError, CommandError, CommandResult};
use crate::format::taxon::{format_name, NameOptions};
use crate::models::{ControlledTerm, ControlledTermValue, Place, Project, Taxon, User};
use crate::query::urls::{place_from_url, project_from_url, user_from_url};
use crate::query::{DateArg, Query};
use crate::services::inaturalist::{param, INatClient, Params};
use crate::settings::{home_place, SettingsStore};
use crate::taxa::{MatchOptions, TaxonLookup};

static MENTION_PAT: Lazy<Regex> = Lazy::new(|| Regex::new(r"^<@!?(\d+)>$").expect("valid regex"));

/// A controlled term and one of its values.
#[derive(Debug, Clone, PartialEq)]
pub struct TermSelector {
    pub term: ControlledTerm,
    pub value: ControlledTermValue,
}

/// Everything a query refers to, looked up.
#[derive(Debug, Clone, Default)]
pub struct QueryResponse {
    pub taxon: Option<Taxon>,
    pub user: Option<User>,
    pub place: Option<Place>,
    pub project: Option<Project>,
    pub unobserved_by: Option<User>,
    pub except_by: Option<User>,
    pub id_by: Option<User>,
    pub controlled_term: Option<TermSelector>,
    pub options: Vec<(String, String)>,
    pub obs_d1: Option<DateArg>,
    pub obs_d2: Option<DateArg>,
    pub obs_on: Option<DateArg>,
    pub added_d1: Option<DateArg>,
    pub added_d2: Option<DateArg>,
    pub added_on: Option<DateArg>,
}

impl QueryResponse {
    fn option(&self, key: &str) -> Option<&str> {
        self.options
            .iter()
            .rev()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Parameters for an observation search.
    ///
    /// Only verifiable observations are searched unless a user, identifier
    /// or project is given, matching what the website shows for those.
    /// `opt` options override anything set here.
    pub fn obs_params(&self) -> Params {
        let mut params = Params::new();
        if let Some(taxon) = &self.taxon {
            params.push(param("taxon_id", taxon.id));
        }
        if let Some(user) = &self.user {
            params.push(param("user_id", user.id));
        }
        if let Some(project) = &self.project {
            params.push(param("project_id", project.id));
        }
        if let Some(place) = &self.place {
            params.push(param("place_id", place.id));
        }
        if let Some(user) = &self.id_by {
            params.push(param("ident_user_id", user.id));
        }
        if let Some(user) = &self.unobserved_by {
            params.push(param("unobserved_by_user_id", user.id));
            params.push(param("lrank", "species"));
        }
        if let Some(user) = &self.except_by {
            params.push(param("not_user_id", user.id));
        }
        if let Some(selector) = &self.controlled_term {
            params.push(param("term_id", selector.term.id));
            params.push(param("term_value_id", selector.value.id));
        }

        let verifiable = if self.project.is_some() || self.user.is_some() || self.id_by.is_some() {
            "any"
        } else {
            "true"
        };
        params.insert(0, param("verifiable", verifiable));

        for (key, value) in &self.options {
            params.retain(|(k, _)| k != key);
            params.push((key.clone(), value.clone()));
        }

        if let Some(on) = self.obs_on {
            params.push(param("observed_on", on));
        } else {
            if let Some(d1) = self.obs_d1 {
                params.push(param("d1", d1));
            }
            if let Some(d2) = self.obs_d2 {
                params.push(param("d2", d2));
            }
        }
        if let Some(on) = self.added_on {
            params.push(param("created_on", on));
        } else {
            if let Some(d1) = self.added_d1 {
                params.push(param("created_d1", d1));
            }
            if let Some(d2) = self.added_d2 {
                params.push(param("created_d2", d2));
            }
        }
        params
    }

    /// Quality words for the observation search, e.g. `*Research Grade*`.
    pub fn adjectives(&self) -> Vec<&'static str> {
        if self.options.is_empty() {
            return Vec::new();
        }
        let grades: Vec<&str> = self
            .option("quality_grade")
            .map(|g| g.split(',').collect())
            .unwrap_or_default();
        let mut research = false;
        let mut needs_id = false;
        if !grades.contains(&"any") {
            research = grades.contains(&"research");
            needs_id = grades.contains(&"needs_id");
        }
        let verifiable = self.option("verifiable");
        if matches!(verifiable, Some("true" | "")) {
            research = true;
            needs_id = true;
        }

        if verifiable == Some("false") {
            vec!["*not Verifiable*"]
        } else if research && needs_id {
            vec!["*Verifiable*"]
        } else {
            let mut adjectives = Vec::new();
            if research {
                adjectives.push("*Research Grade*");
            }
            if needs_id {
                adjectives.push("*Needs ID*");
            }
            adjectives
        }
    }

    /// One-line summary of the filters, e.g. `*Research Grade* Birds by ben`.
    pub fn description(&self) -> String {
        let mut parts: Vec<String> = self.adjectives().iter().map(|a| a.to_string()).collect();
        if let Some(taxon) = &self.taxon {
            parts.push(format_name(taxon, NameOptions::with_term()));
        }
        if let Some(place) = &self.place {
            parts.push(format!("from {}", place.display_name));
        }
        if let Some(project) = &self.project {
            parts.push(format!("in {}", project.title));
        }
        let mut by = |label: &str, user: &Option<User>| {
            if let Some(user) = user {
                parts.push(format!("{label} {}", user.display_name()));
            }
        };
        by("by", &self.user);
        by("identified by", &self.id_by);
        by("unobserved by", &self.unobserved_by);
        by("except by", &self.except_by);
        parts.join(" ")
    }
}

/// Parse `opt` words: `key=value`, or a bare `key` with an empty value.
pub fn parse_options(options: &[String]) -> Vec<(String, String)> {
    options
        .iter()
        .map(|option| match option.split_once('=') {
            Some((key, value)) => (key.to_string(), value.to_string()),
            None => (option.to_string(), String::new()),
        })
        .collect()
}

/// Term and value by id or case-insensitive label prefix.
pub fn match_controlled_term(
    terms: &[ControlledTerm],
    term_label: &str,
    value_label: &str,
) -> Result<TermSelector, ApiError> {
    let prefix_of = |label: &str, query: &str| {
        label.to_lowercase().starts_with(&query.to_lowercase())
    };
    let term_id = term_label.parse::<u64>().ok();
    let value_id = value_label.parse::<u64>().ok();

    let term = terms
        .iter()
        .find(|t| term_id == Some(t.id) || prefix_of(&t.label, term_label))
        .ok_or_else(|| ApiError::NotFound(format!("No controlled term matching \"`{term_label}`\"")))?;
    let value = term
        .values
        .iter()
        .find(|v| value_id == Some(v.id) || prefix_of(&v.label, value_label))
        .ok_or_else(|| {
            ApiError::NotFound(format!(
                "No value matching \"`{value_label}`\" for controlled term: `{}`",
                term.label
            ))
        })?;
    Ok(TermSelector {
        term: term.clone(),
        value: value.clone(),
    })
}

/// Resolves the users, places, projects and taxa of a query in the context
/// of the message that asked for it.
pub struct QueryResolver {
    lookup: Arc<TaxonLookup>,
    settings: Arc<dyn SettingsStore>,
}

impl QueryResolver {
    pub fn new(lookup: Arc<TaxonLookup>, settings: Arc<dyn SettingsStore>) -> Self {
        Self { lookup, settings }
    }

    pub fn lookup(&self) -> &TaxonLookup {
        &self.lookup
    }

    fn client(&self) -> &INatClient {
        self.lookup.client()
    }

    pub async fn resolve(&self, ctx: &CommandContext, query: &Query) -> CommandResult<QueryResponse> {
        debug!(query = %query, "Resolving query");
        let mut response = QueryResponse {
            options: parse_options(&query.options),
            obs_d1: query.obs_d1,
            obs_d2: query.obs_d2,
            obs_on: query.obs_on,
            added_d1: query.added_d1,
            added_d2: query.added_d2,
            added_on: query.added_on,
            ..QueryResponse::default()
        };

        if let Some(place) = &query.place {
            response.place = Some(self.resolve_place(ctx, place).await?);
        }
        if query.main.is_some() {
            let options = MatchOptions {
                preferred_place_id: response.place.as_ref().map(|p| p.id),
                ..MatchOptions::default()
            };
            response.taxon = Some(self.lookup.maybe_match_taxon_compound(query, &options).await?);
        }
        if let Some(user) = &query.user {
            response.user = Some(self.resolve_user(ctx, user).await?);
        }
        if let Some(user) = &query.id_by {
            response.id_by = Some(self.resolve_user(ctx, user).await?);
        }
        if let Some(user) = &query.unobserved_by {
            response.unobserved_by = Some(self.resolve_user(ctx, user).await?);
        }
        if let Some(user) = &query.except_by {
            response.except_by = Some(self.resolve_user(ctx, user).await?);
        }
        if let Some(project) = &query.project {
            response.project = Some(self.resolve_project(ctx, project).await?);
        }
        if let Some(term) = &query.controlled_term {
            let terms = self.client().get_controlled_terms().await?;
            response.controlled_term = Some(match_controlled_term(&terms, &term.term, &term.value)?);
        }
        Ok(response)
    }

    /// `me`, a Discord mention, an iNat user id or profile URL, or a login.
    pub async fn resolve_user(&self, ctx: &CommandContext, text: &str) -> CommandResult<User> {
        let text = text.trim();
        let discord_id = if text.eq_ignore_ascii_case("me") {
            Some(ctx.author_id)
        } else {
            MENTION_PAT
                .captures(text)
                .and_then(|caps| caps[1].parse::<u64>().ok())
        };

        let key = match discord_id {
            Some(discord_id) => {
                let settings = self.settings.user(discord_id).await?;
                let inat_user_id = settings.inat_user_id.ok_or_else(|| {
                    CommandError::Invalid(
                        "iNat user not known. Use `inat set user <login>` first.".to_string(),
                    )
                })?;
                inat_user_id.to_string()
            }
            None => match user_from_url(text) {
                Some(entity) => entity.as_path(),
                None => text.to_string(),
            },
        };

        match self.client().get_user(&key).await? {
            Some(user) => Ok(user),
            None => Err(ApiError::NotFound(format!("iNat user not found: `{text}`")).into()),
        }
    }

    /// `home`, a guild abbreviation, an id or URL, or a name to autocomplete.
    pub async fn resolve_place(&self, ctx: &CommandContext, text: &str) -> CommandResult<Place> {
        let text = text.trim();
        let abbrev = text.to_lowercase();
        let mut place_id = None;
        if abbrev == "home" {
            place_id = home_place(self.settings.as_ref(), ctx.guild_id, ctx.author_id).await?;
            if place_id.is_none() {
                return Err(CommandError::Invalid(
                    "No home place set. Use `inat set home <place>` first.".to_string(),
                ));
            }
        } else if let Some(guild_id) = ctx.guild_id {
            place_id = self.settings.guild(guild_id).await?.places.get(&abbrev).copied();
        }

        let key = match (place_id, place_from_url(text)) {
            (Some(id), _) => id.to_string(),
            (None, Some(entity)) => entity.as_path(),
            (None, None) if text.parse::<u64>().is_ok() => text.to_string(),
            (None, None) => {
                return self
                    .client()
                    .search_places(text)
                    .await?
                    .into_iter()
                    .next()
                    .ok_or_else(|| ApiError::NotFound(format!("No place found matching `{text}`")).into());
            }
        };
        self.client()
            .get_place(&key)
            .await?
            .ok_or_else(|| ApiError::NotFound(format!("No place found matching `{text}`")).into())
    }

    /// A guild abbreviation, an id or URL, or a name to autocomplete.
    pub async fn resolve_project(&self, ctx: &CommandContext, text: &str) -> CommandResult<Project> {
        let text = text.trim();
        let abbreviated = match ctx.guild_id {
            Some(guild_id) => self
                .settings
                .guild(guild_id)
                .await?
                .projects
                .get(&text.to_lowercase())
                .copied(),
            None => None,
        };

        let key = match (abbreviated, project_from_url(text)) {
            (Some(id), _) => id.to_string(),
            (None, Some(entity)) => entity.as_path(),
            (None, None) if text.parse::<u64>().is_ok() => text.to_string(),
            (None, None) => {
                return self
                    .client()
                    .search_projects(text)
                    .await?
                    .into_iter()
                    .next()
                    .ok_or_else(|| ApiError::NotFound(format!("No project found matching `{text}`")).into());
            }
        };
        self.client()
            .get_project(&key)
            .await?
            .ok_or_else(|| ApiError::NotFound(format!("No project found matching `{text}`")).into())
    }
}
