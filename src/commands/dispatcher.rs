//! Routes prefixed command lines to their handlers

use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

use super::context::{CommandContext, Reply};
use crate::error::{CommandError, CommandResult};
use crate::metrics::Metrics;
use crate::resolver::QueryResolver;
use crate::services::{EbirdClient, INatClient};
use crate::settings::SettingsStore;
use crate::taxa::TaxonLookup;

pub const DEFAULT_PREFIX: &str = ",";

/// Built-in command names. Link commands may not shadow these.
pub const BUILTIN_COMMANDS: &[&str] = &[
    "taxon", "t", "tname", "related", "obs", "user", "place", "project", "search", "s", "map",
    "last", "inat", "link", "ebird", "help",
];

pub struct CommandDispatcher {
    pub(crate) prefix: String,
    pub(crate) inat: Arc<INatClient>,
    pub(crate) ebird: Arc<EbirdClient>,
    pub(crate) settings: Arc<dyn SettingsStore>,
    pub(crate) lookup: Arc<TaxonLookup>,
    pub(crate) resolver: QueryResolver,
    pub(crate) metrics: Option<Arc<Metrics>>,
}

impl CommandDispatcher {
    pub fn new(
        prefix: impl Into<String>,
        inat: Arc<INatClient>,
        ebird: Arc<EbirdClient>,
        settings: Arc<dyn SettingsStore>,
    ) -> Self {
        let lookup = Arc::new(TaxonLookup::new(inat.clone()));
        let resolver = QueryResolver::new(lookup.clone(), settings.clone());
        Self {
            prefix: prefix.into(),
            inat,
            ebird,
            settings,
            lookup,
            resolver,
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<Metrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn settings(&self) -> &Arc<dyn SettingsStore> {
        &self.settings
    }

    pub fn metrics(&self) -> Option<&Arc<Metrics>> {
        self.metrics.as_ref()
    }

    /// Split `,taxon birds` into `("taxon", "birds")`. `None` if the
    /// message doesn't start with the prefix followed by a name.
    pub fn split_command<'a>(&self, content: &'a str) -> Option<(String, &'a str)> {
        let rest = content.trim_start().strip_prefix(self.prefix.as_str())?;
        let name_end = rest.find(char::is_whitespace).unwrap_or(rest.len());
        let (name, args) = rest.split_at(name_end);
        if name.is_empty() {
            return None;
        }
        Some((name.to_lowercase(), args.trim()))
    }

    /// Run a command line. `None` if it isn't a command this bot knows.
    pub async fn dispatch(&self, ctx: &CommandContext, content: &str) -> Option<Vec<Reply>> {
        let (name, args) = self.split_command(content)?;
        self.run(ctx, &name, args).await
    }

    /// Run command `name` with `args`. Errors are turned into text replies.
    pub async fn run(&self, ctx: &CommandContext, name: &str, args: &str) -> Option<Vec<Reply>> {
        let start = Instant::now();
        let result = match self.execute(ctx, name, args).await {
            Ok(Some(replies)) => Ok(replies),
            Ok(None) => return None,
            Err(e) => Err(e),
        };

        if let Some(metrics) = &self.metrics {
            metrics.record_command(name, result.is_ok());
        }
        let duration_ms = start.elapsed().as_millis() as u64;
        match result {
            Ok(replies) => {
                info!(command = name, duration_ms, replies = replies.len(), "Command handled");
                Some(replies)
            }
            Err(e) => {
                match &e {
                    CommandError::Api(_) | CommandError::Settings(_) => {
                        warn!(command = name, error = %e, duration_ms, "Command failed")
                    }
                    _ => debug!(command = name, error = %e, "Command rejected"),
                }
                Some(vec![Reply::text(e.to_string())])
            }
        }
    }

    async fn execute(
        &self,
        ctx: &CommandContext,
        name: &str,
        args: &str,
    ) -> CommandResult<Option<Vec<Reply>>> {
        let replies = match name {
            "taxon" | "t" => self.taxon(ctx, args).await?,
            "tname" => self.tname(ctx, args).await?,
            "related" => self.related(args).await?,
            "obs" => self.obs(ctx, args).await?,
            "user" => self.user(ctx, args).await?,
            "place" => self.place(ctx, args).await?,
            "project" => self.project(ctx, args).await?,
            "search" | "s" => self.search(ctx, args).await?,
            "map" => self.map(ctx, args).await?,
            "last" => self.last(ctx, args).await?,
            "inat" => self.inat(ctx, args).await?,
            "link" => self.link(ctx, args).await?,
            "ebird" => self.ebird(ctx, args).await?,
            "help" => self.help(),
            other => return self.link_command(ctx, other, args).await,
        };
        Ok(Some(replies))
    }

    pub(crate) fn usage(&self, usage: &str) -> CommandError {
        CommandError::Usage(format!("{}{usage}", self.prefix))
    }

    pub(crate) fn require_guild(&self, ctx: &CommandContext) -> CommandResult<u64> {
        ctx.guild_id
            .ok_or_else(|| CommandError::Invalid("This only works in a server.".to_string()))
    }

    pub(crate) fn require_manager(&self, ctx: &CommandContext) -> CommandResult<u64> {
        let guild_id = self.require_guild(ctx)?;
        if !ctx.can_manage_guild() {
            return Err(CommandError::Permission(
                "only server managers can change this.".to_string(),
            ));
        }
        Ok(guild_id)
    }

    pub(crate) fn require_owner(&self, ctx: &CommandContext) -> CommandResult<()> {
        if !ctx.is_owner {
            return Err(CommandError::Permission(
                "only the bot owner can change this.".to_string(),
            ));
        }
        Ok(())
    }
}

/// Split off the first word as a lowercased subcommand name.
pub(crate) fn split_subcommand(args: &str) -> (String, &str) {
    let args = args.trim();
    let end = args.find(char::is_whitespace).unwrap_or(args.len());
    let (name, rest) = args.split_at(end);
    (name.to_lowercase(), rest.trim())
}
