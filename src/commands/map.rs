//! `map`: range maps for taxa, and observation search maps

use super::context::{CommandContext, Reply};
use super::dispatcher::{split_subcommand, CommandDispatcher};
use crate::error::CommandResult;
use crate::format::map::map_embed;
use crate::format::Embed;
use crate::models::WWW_BASE_URL;
use crate::query::NaturalParser;
use crate::settings::home_place;
use crate::taxa::MatchOptions;

const MAP_USAGE: &str = "map <taxon1>, <taxon2>, ... | map obs <query>";

impl CommandDispatcher {
    pub(crate) async fn map(&self, ctx: &CommandContext, args: &str) -> CommandResult<Vec<Reply>> {
        if args.trim().is_empty() {
            return Err(self.usage(MAP_USAGE));
        }
        let (name, rest) = split_subcommand(args);
        if name == "obs" {
            if rest.is_empty() {
                return Err(self.usage(MAP_USAGE));
            }
            return Ok(vec![self.obs_map(ctx, rest).await?.into()]);
        }

        let options = MatchOptions {
            preferred_place_id: home_place(self.settings.as_ref(), ctx.guild_id, ctx.author_id).await?,
            ..MatchOptions::default()
        };
        let (taxa, missing) = self.lookup.query_taxa(args, &options).await?;
        let ids: Vec<u64> = taxa.iter().map(|t| t.id).collect();
        let bounds = self.inat.get_observation_bounds(&ids).await?;
        Ok(vec![map_embed(&taxa, bounds.as_ref(), &missing).into()])
    }

    /// Link to the website's map of observations matching the query.
    async fn obs_map(&self, ctx: &CommandContext, text: &str) -> CommandResult<Embed> {
        let query = NaturalParser::new().parse(text)?;
        let response = self.resolver.resolve(ctx, &query).await?;
        let params = url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(response.obs_params())
            .finish();
        let description = match response.description() {
            d if d.is_empty() => "observations".to_string(),
            d => d,
        };
        Ok(Embed::new(format!("Map of {description}"))
            .url(format!("{WWW_BASE_URL}/observations/map?{params}")))
    }
}
