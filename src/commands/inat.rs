//! Taxon, observation and user lookups

use super::context::{CommandContext, Reply};
use super::dispatcher::CommandDispatcher;
use crate::error::{ApiError, CommandResult};
use crate::format::obs::{missing_obs_embed, obs_embed, user_embed};
use crate::format::obs_url;
use crate::format::taxon::{
    name_line, related_embed, taxon_embed, CountsLine, TAXON_COUNTS_HEADER, TAXON_IDBY_HEADER,
    TAXON_NOTBY_HEADER, TAXON_PLACES_HEADER,
};
use crate::models::Taxon;
use crate::query::urls::find_obs_link;
use crate::query::{NaturalParser, Query};
use crate::resolver::QueryResponse;
use crate::services::inaturalist::{param, Params};
use crate::taxa::MatchOptions;

impl CommandDispatcher {
    pub(crate) async fn taxon(&self, ctx: &CommandContext, args: &str) -> CommandResult<Vec<Reply>> {
        if args.is_empty() {
            return Err(self.usage("taxon <query>"));
        }
        let query = NaturalParser::new().parse(args)?;
        self.taxon_replies(ctx, &query).await
    }

    /// Taxon display for a parsed query, with observation counts when the
    /// query names a user or place.
    pub async fn taxon_replies(&self, ctx: &CommandContext, query: &Query) -> CommandResult<Vec<Reply>> {
        if query.main.is_none() {
            return Err(self.usage("taxon <query>"));
        }
        let response = self.resolver.resolve(ctx, query).await?;
        let Some(taxon) = response.taxon.clone() else {
            return Err(ApiError::NotFound("No matching taxon found.".to_string()).into());
        };
        let taxon = self.with_ancestors(taxon).await?;

        let (header, counts) = match counts_header(&response) {
            Some((header, label)) => {
                let params = response.obs_params();
                let (observations, species) = self.inat.get_counts(&params).await?;
                let line = CountsLine {
                    label,
                    observations,
                    species,
                    url: obs_url(&params),
                };
                (Some(header), vec![line])
            }
            None => (None, Vec::new()),
        };
        Ok(vec![taxon_embed(&taxon, None, header, &counts).into()])
    }

    /// Search results omit ancestors; fetch the full record for the
    /// hierarchy, keeping the term the search matched on.
    async fn with_ancestors(&self, taxon: Taxon) -> CommandResult<Taxon> {
        if !taxon.ancestors.is_empty() {
            return Ok(taxon);
        }
        match self.inat.get_taxon(taxon.id, &Params::new()).await? {
            Some(mut full) => {
                if full.matched_term.is_none() {
                    full.matched_term = taxon.matched_term;
                }
                Ok(full)
            }
            None => Ok(taxon),
        }
    }

    pub(crate) async fn tname(&self, ctx: &CommandContext, args: &str) -> CommandResult<Vec<Reply>> {
        if args.is_empty() {
            return Err(self.usage("tname <query>"));
        }
        let query = NaturalParser::new().parse(args)?;
        if query.main.is_none() {
            return Err(self.usage("tname <query>"));
        }
        let response = self.resolver.resolve(ctx, &query).await?;
        match response.taxon {
            Some(taxon) => Ok(vec![Reply::text(name_line(&taxon))]),
            None => Err(ApiError::NotFound("No matching taxon found.".to_string()).into()),
        }
    }

    pub(crate) async fn related(&self, args: &str) -> CommandResult<Vec<Reply>> {
        if args.is_empty() {
            return Err(self.usage("related <taxon1>, <taxon2>, ..."));
        }
        let (taxa, missing) = self.lookup.query_taxa(args, &MatchOptions::default()).await?;
        let ancestor = self.lookup.common_ancestor(&taxa).await?;
        Ok(vec![related_embed(&taxa, &ancestor, &missing).into()])
    }

    /// Observation by id, link, or the latest matching a query.
    pub(crate) async fn obs(&self, ctx: &CommandContext, args: &str) -> CommandResult<Vec<Reply>> {
        if args.is_empty() {
            return Err(self.usage("obs <id|url|query>"));
        }
        let obs_id = match args.parse::<u64>() {
            Ok(id) => Some(id),
            Err(_) => find_obs_link(args).map(|link| link.obs_id),
        };
        if let Some(obs_id) = obs_id {
            return Ok(vec![self.obs_preview(obs_id).await?]);
        }

        let query = NaturalParser::new().parse(args)?;
        let response = self.resolver.resolve(ctx, &query).await?;
        let mut params = response.obs_params();
        params.push(param("per_page", 1));
        let page = self.inat.get_observations(&params).await?;
        match page.results.first() {
            Some(obs) => Ok(vec![obs_embed(obs, None).into()]),
            None => Err(ApiError::NotFound("Nothing found".to_string()).into()),
        }
    }

    /// Embed for one observation, or a note that it is gone.
    pub async fn obs_preview(&self, obs_id: u64) -> CommandResult<Reply> {
        let embed = match self.inat.get_observation(obs_id).await? {
            Some(obs) => obs_embed(&obs, None),
            None => missing_obs_embed(obs_id),
        };
        Ok(embed.into())
    }

    pub(crate) async fn user(&self, ctx: &CommandContext, args: &str) -> CommandResult<Vec<Reply>> {
        if args.is_empty() {
            return Err(self.usage("user <login|@mention|me>"));
        }
        let user = self.resolver.resolve_user(ctx, args).await?;
        let mention = args.starts_with("<@").then_some(args);
        Ok(vec![user_embed(&user, mention).into()])
    }
}

/// Header and row label for the counts under a taxon display.
fn counts_header(response: &QueryResponse) -> Option<(&'static str, String)> {
    if let Some(user) = &response.unobserved_by {
        return Some((TAXON_NOTBY_HEADER, user.profile_link()));
    }
    if let Some(user) = &response.id_by {
        return Some((TAXON_IDBY_HEADER, user.profile_link()));
    }
    if let Some(user) = &response.user {
        return Some((TAXON_COUNTS_HEADER, user.profile_link()));
    }
    response
        .place
        .as_ref()
        .map(|place| (TAXON_PLACES_HEADER, place.display_name.clone()))
}
