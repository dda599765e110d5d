//! `last`: show the most recent observation or taxon linked in the channel

use super::context::{CommandContext, Reply};
use super::dispatcher::{split_subcommand, CommandDispatcher};
use crate::error::{ApiError, CommandResult};
use crate::format::taxon::taxon_embed;
use crate::query::urls::{find_obs_link, taxon_id_from_url};
use crate::services::inaturalist::Params;

const LAST_USAGE: &str = "last obs|taxon";

impl CommandDispatcher {
    /// Looks through `ctx.history`, newest first.
    pub(crate) async fn last(&self, ctx: &CommandContext, args: &str) -> CommandResult<Vec<Reply>> {
        let (name, _) = split_subcommand(args);
        match name.as_str() {
            "obs" | "o" => {
                let Some(link) = ctx.history.iter().find_map(|text| find_obs_link(text)) else {
                    return Err(ApiError::NotFound("Nothing found".to_string()).into());
                };
                Ok(vec![self.obs_preview(link.obs_id).await?])
            }
            "taxon" | "t" => {
                let Some(taxon_id) = ctx.history.iter().find_map(|text| taxon_id_from_url(text)) else {
                    return Err(ApiError::NotFound("Nothing found".to_string()).into());
                };
                match self.inat.get_taxon(taxon_id, &Params::new()).await? {
                    Some(taxon) => Ok(vec![taxon_embed(&taxon, None, None, &[]).into()]),
                    None => Err(ApiError::NotFound("No matching taxon found.".to_string()).into()),
                }
            }
            _ => Err(self.usage(LAST_USAGE)),
        }
    }
}
