//! Custom link commands: a name bound to a URL template per server.

use super::context::{CommandContext, Reply};
use super::dispatcher::{split_subcommand, CommandDispatcher, BUILTIN_COMMANDS};
use crate::error::{CommandError, CommandResult};

/// Fill a link template. `{query}` is replaced form-encoded, `{query_raw}`
/// verbatim. Placeholders in the query itself are left alone.
pub fn expand_link(template: &str, query: &str) -> String {
    let encoded: String = url::form_urlencoded::byte_serialize(query.as_bytes()).collect();
    let mut out = String::with_capacity(template.len() + query.len());
    let mut rest = template;
    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let tail = &rest[start..];
        if let Some(after) = tail.strip_prefix("{query_raw}") {
            out.push_str(query);
            rest = after;
        } else if let Some(after) = tail.strip_prefix("{query}") {
            out.push_str(&encoded);
            rest = after;
        } else {
            out.push('{');
            rest = &tail[1..];
        }
    }
    out.push_str(rest);
    out
}

fn valid_link_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

impl CommandDispatcher {
    pub(crate) async fn link(&self, ctx: &CommandContext, args: &str) -> CommandResult<Vec<Reply>> {
        let (action, rest) = split_subcommand(args);
        let (name, template) = split_subcommand(rest);
        match action.as_str() {
            "add" if !name.is_empty() && !template.is_empty() => {
                let guild_id = self.require_manager(ctx)?;
                if !valid_link_name(&name) {
                    return Err(CommandError::Invalid(format!(
                        "`{name}` can't be a command name. Use letters, digits, `-` and `_`."
                    )));
                }
                if BUILTIN_COMMANDS.contains(&name.as_str()) {
                    return Err(CommandError::Invalid(format!(
                        "`{name}` is already a command."
                    )));
                }
                let template = template.trim();
                if !template.starts_with("http://") && !template.starts_with("https://") {
                    return Err(CommandError::Invalid(
                        "The template must be a URL.".to_string(),
                    ));
                }
                let mut guild = self.settings.guild(guild_id).await?;
                guild.links.insert(name.clone(), template.to_string());
                self.settings.set_guild(guild_id, &guild).await?;
                Ok(vec![Reply::text(format!(
                    "Link `{}{name}` added.",
                    self.prefix
                ))])
            }
            "remove" if !name.is_empty() && template.is_empty() => {
                let guild_id = self.require_manager(ctx)?;
                let mut guild = self.settings.guild(guild_id).await?;
                if guild.links.remove(&name).is_none() {
                    return Err(CommandError::Invalid(format!("No link named `{name}`.")));
                }
                self.settings.set_guild(guild_id, &guild).await?;
                Ok(vec![Reply::text(format!("Link `{name}` removed."))])
            }
            "list" if rest.is_empty() => {
                let guild_id = self.require_guild(ctx)?;
                let guild = self.settings.guild(guild_id).await?;
                if guild.links.is_empty() {
                    return Ok(vec![Reply::text("No links defined.")]);
                }
                let lines: Vec<String> = guild
                    .links
                    .iter()
                    .map(|(name, template)| format!("`{}{name}`: <{template}>", self.prefix))
                    .collect();
                Ok(vec![Reply::text(lines.join("\n"))])
            }
            _ => Err(self.usage("link add <name> <template> | link remove <name> | link list")),
        }
    }

    /// Expand the server's link `name`, if it has one.
    pub(crate) async fn link_command(
        &self,
        ctx: &CommandContext,
        name: &str,
        args: &str,
    ) -> CommandResult<Option<Vec<Reply>>> {
        let Some(guild_id) = ctx.guild_id else {
            return Ok(None);
        };
        let guild = self.settings.guild(guild_id).await?;
        Ok(guild
            .links
            .get(name)
            .map(|template| vec![Reply::text(expand_link(template, args))]))
    }
}
