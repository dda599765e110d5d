//! Places and projects, with per-server abbreviations

use std::collections::BTreeMap;

use super::context::{CommandContext, Reply};
use super::dispatcher::{split_subcommand, CommandDispatcher};
use crate::error::{CommandError, CommandResult};
use crate::format::obs::{place_embed, project_embed};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    Place,
    Project,
}

impl Kind {
    fn name(self) -> &'static str {
        match self {
            Kind::Place => "place",
            Kind::Project => "project",
        }
    }

    fn abbreviations(self, guild: &mut crate::settings::GuildSettings) -> &mut BTreeMap<String, u64> {
        match self {
            Kind::Place => &mut guild.places,
            Kind::Project => &mut guild.projects,
        }
    }
}

impl CommandDispatcher {
    pub(crate) async fn place(&self, ctx: &CommandContext, args: &str) -> CommandResult<Vec<Reply>> {
        self.abbreviated(ctx, Kind::Place, args).await
    }

    pub(crate) async fn project(&self, ctx: &CommandContext, args: &str) -> CommandResult<Vec<Reply>> {
        self.abbreviated(ctx, Kind::Project, args).await
    }

    async fn abbreviated(&self, ctx: &CommandContext, kind: Kind, args: &str) -> CommandResult<Vec<Reply>> {
        let name = kind.name();
        let (first, rest) = split_subcommand(args);
        match first.as_str() {
            "" => Err(self.usage(&format!("{name} <abbrev|name> | {name} add|remove|list"))),
            "list" if rest.is_empty() => self.list_abbreviations(ctx, kind).await,
            "add" if !rest.is_empty() => {
                let guild_id = self.require_manager(ctx)?;
                let Some((abbrev, target)) = rest.split_once(char::is_whitespace) else {
                    return Err(self.usage(&format!("{name} add <abbrev> <id|url|name>")));
                };
                let abbrev = abbrev.to_lowercase();
                let (id, embed) = match kind {
                    Kind::Place => {
                        let place = self.resolver.resolve_place(ctx, target.trim()).await?;
                        (place.id, place_embed(&place, Some(&abbrev)))
                    }
                    Kind::Project => {
                        let project = self.resolver.resolve_project(ctx, target.trim()).await?;
                        (project.id, project_embed(&project, Some(&abbrev)))
                    }
                };
                let mut guild = self.settings.guild(guild_id).await?;
                if kind.abbreviations(&mut guild).contains_key(&abbrev) {
                    return Err(CommandError::Invalid(format!(
                        "{name} `{abbrev}` is already defined."
                    )));
                }
                kind.abbreviations(&mut guild).insert(abbrev, id);
                self.settings.set_guild(guild_id, &guild).await?;
                Ok(vec![embed.into()])
            }
            "remove" if !rest.is_empty() => {
                let guild_id = self.require_manager(ctx)?;
                let abbrev = rest.to_lowercase();
                let mut guild = self.settings.guild(guild_id).await?;
                if kind.abbreviations(&mut guild).remove(&abbrev).is_none() {
                    return Err(CommandError::Invalid(format!("{name} `{abbrev}` not defined.")));
                }
                self.settings.set_guild(guild_id, &guild).await?;
                Ok(vec![Reply::text(format!("{name} `{abbrev}` removed."))])
            }
            _ => {
                let abbrev = args.to_lowercase();
                let defined = match ctx.guild_id {
                    Some(guild_id) => {
                        let mut guild = self.settings.guild(guild_id).await?;
                        kind.abbreviations(&mut guild).contains_key(&abbrev)
                    }
                    None => false,
                };
                let abbrev = defined.then_some(abbrev.as_str());
                let embed = match kind {
                    Kind::Place => place_embed(&self.resolver.resolve_place(ctx, args).await?, abbrev),
                    Kind::Project => {
                        project_embed(&self.resolver.resolve_project(ctx, args).await?, abbrev)
                    }
                };
                Ok(vec![embed.into()])
            }
        }
    }

    async fn list_abbreviations(&self, ctx: &CommandContext, kind: Kind) -> CommandResult<Vec<Reply>> {
        let guild_id = self.require_guild(ctx)?;
        let mut guild = self.settings.guild(guild_id).await?;
        let abbreviations = kind.abbreviations(&mut guild);
        if abbreviations.is_empty() {
            return Ok(vec![Reply::text(format!("No {}s defined.", kind.name()))]);
        }
        let lines: Vec<String> = abbreviations
            .iter()
            .map(|(abbrev, id)| format!("`{abbrev}`: {id}"))
            .collect();
        Ok(vec![Reply::text(lines.join("\n"))])
    }
}
