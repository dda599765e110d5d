//! `search`: observations, taxa, places, projects and users

use super::context::{CommandContext, Reply};
use super::dispatcher::{split_subcommand, CommandDispatcher};
use crate::error::{ApiError, CommandResult};
use crate::format::obs_url;
use crate::format::search::{
    inactive_search_url, obs_result_line, search_embed, search_result_line, site_search_url,
    taxon_result_line, SEARCH_PAGE_SIZE,
};
use crate::query::NaturalParser;
use crate::services::inaturalist::{param, Params};
use crate::settings::home_place;

const SEARCH_USAGE: &str = "search [obs|taxa|places|projects|users|inactive|site] <query>";
const NO_RESULTS: &str = "Nothing matches that query. Check for mistakes in spelling or syntax.";
const INACTIVE_PER_PAGE: u32 = 500;

/// What a search looks through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchKind {
    Obs,
    /// All site sources at once.
    Site,
    Taxa,
    Places,
    Projects,
    Users,
    Inactive,
}

impl SearchKind {
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "obs" | "observations" => Self::Obs,
            "site" | "all" => Self::Site,
            "taxa" | "taxon" => Self::Taxa,
            "places" | "place" => Self::Places,
            "projects" | "project" => Self::Projects,
            "users" | "user" => Self::Users,
            "inactive" => Self::Inactive,
            _ => return None,
        })
    }

    /// The `sources` filter for a site search.
    fn source(self) -> Option<&'static str> {
        match self {
            Self::Taxa => Some("taxa"),
            Self::Places => Some("places"),
            Self::Projects => Some("projects"),
            Self::Users => Some("users"),
            _ => None,
        }
    }
}

impl CommandDispatcher {
    pub(crate) async fn search(&self, ctx: &CommandContext, args: &str) -> CommandResult<Vec<Reply>> {
        let (name, rest) = split_subcommand(args);
        let (kind, query) = match SearchKind::from_name(&name) {
            Some(kind) => (kind, rest),
            None => (SearchKind::Obs, args.trim()),
        };
        if query.is_empty() {
            return Err(self.usage(SEARCH_USAGE));
        }
        let embed = match kind {
            SearchKind::Obs => self.search_obs(ctx, query).await?,
            SearchKind::Inactive => self.search_inactive(query).await?,
            _ => self.search_site(ctx, kind, query).await?,
        };
        Ok(vec![embed])
    }

    async fn search_obs(&self, ctx: &CommandContext, text: &str) -> CommandResult<Reply> {
        let query = NaturalParser::new().parse(text)?;
        let response = self.resolver.resolve(ctx, &query).await?;
        let mut params = response.obs_params();
        let url = obs_url(&params);
        params.push(param("per_page", SEARCH_PAGE_SIZE));
        let page = self.inat.get_observations(&params).await?;
        if page.results.is_empty() {
            return Err(ApiError::NotFound(NO_RESULTS.to_string()).into());
        }
        let lines: Vec<String> = page.results.iter().map(obs_result_line).collect();
        let title = match response.description() {
            d if d.is_empty() => "Observations".to_string(),
            d => d,
        };
        Ok(search_embed(&title, &url, &lines, page.total_results).into())
    }

    async fn search_site(&self, ctx: &CommandContext, kind: SearchKind, query: &str) -> CommandResult<Reply> {
        let source = kind.source();
        let mut params: Params = vec![
            param("q", query),
            param("per_page", if source.is_some() { 100 } else { 30 }),
        ];
        if let Some(source) = source {
            params.push(param("sources", source));
        }
        if let Some(place_id) = home_place(self.settings.as_ref(), ctx.guild_id, ctx.author_id).await? {
            params.push(param("preferred_place_id", place_id));
        }

        let page = self.inat.site_search(&params).await?;
        let lines: Vec<String> = page.results.iter().filter_map(search_result_line).collect();
        if lines.is_empty() {
            return Err(ApiError::NotFound(format!("{NO_RESULTS} (searched for `{query}`)")).into());
        }
        let title = match source {
            Some(source) => format!("{query} in {source}"),
            None => query.to_string(),
        };
        let embed = search_embed(&title, &site_search_url(query, source), &lines, page.total_results);
        Ok(embed.into())
    }

    /// Taxa no longer in use, e.g. after a taxon swap. Autocomplete
    /// skips inactive taxa, so this asks for a full page of `/v1/taxa`.
    async fn search_inactive(&self, query: &str) -> CommandResult<Reply> {
        let params = vec![
            param("q", query),
            param("is_active", "any"),
            param("page", 1),
            param("per_page", INACTIVE_PER_PAGE),
        ];
        let page = self.inat.search_taxa(&params).await?;
        let lines: Vec<String> = page
            .results
            .iter()
            .filter(|taxon| !taxon.is_active)
            .map(taxon_result_line)
            .collect();
        if lines.is_empty() {
            return Err(ApiError::NotFound(format!("{NO_RESULTS} (searched for `{query}`)")).into());
        }
        let title = format!("{query} in inactive taxa");
        let total = lines.len() as u64;
        Ok(search_embed(&title, &inactive_search_url(query), &lines, total).into())
    }
}
