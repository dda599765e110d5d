//! `inat set ...` and `inat show settings`

use super::context::{CommandContext, Reply};
use super::dispatcher::{split_subcommand, CommandDispatcher};
use crate::error::{ApiError, CommandError, CommandResult};

/// A listener switch, or `inherit` to defer to the server setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Switch {
    On,
    Off,
    Inherit,
}

impl Switch {
    pub fn parse(word: &str) -> Option<Self> {
        match word.to_lowercase().as_str() {
            "on" | "true" | "yes" => Some(Switch::On),
            "off" | "false" | "no" => Some(Switch::Off),
            "inherit" => Some(Switch::Inherit),
            _ => None,
        }
    }

    fn as_option(self) -> Option<bool> {
        match self {
            Switch::On => Some(true),
            Switch::Off => Some(false),
            Switch::Inherit => None,
        }
    }
}

fn on_off(value: bool) -> &'static str {
    if value {
        "on"
    } else {
        "off"
    }
}

fn id_or_unset(value: Option<u64>) -> String {
    value
        .map(|id| id.to_string())
        .unwrap_or_else(|| "not set".to_string())
}

fn inherited(value: Option<bool>) -> &'static str {
    match value {
        Some(value) => on_off(value),
        None => "inherit",
    }
}

impl CommandDispatcher {
    pub(crate) async fn inat(&self, ctx: &CommandContext, args: &str) -> CommandResult<Vec<Reply>> {
        let (name, rest) = split_subcommand(args);
        let (setting, value) = split_subcommand(rest);
        match (name.as_str(), setting.as_str()) {
            ("set", setting) if !setting.is_empty() => {
                let words: Vec<&str> = value.split_whitespace().collect();
                self.inat_set(ctx, setting, &words).await
            }
            ("show", "settings" | "") if value.is_empty() => self.inat_show(ctx).await,
            _ => Err(self.usage("inat set <setting> <value> | inat show settings")),
        }
    }

    async fn inat_set(
        &self,
        ctx: &CommandContext,
        setting: &str,
        args: &[&str],
    ) -> CommandResult<Vec<Reply>> {
        match setting {
            "user" => {
                let key = args.join(" ");
                if key.is_empty() {
                    return Err(self.usage("inat set user <login|id>"));
                }
                let user = self
                    .inat
                    .get_user(&key)
                    .await?
                    .ok_or_else(|| ApiError::NotFound(format!("iNat user not found: `{key}`")))?;
                let mut settings = self.settings.user(ctx.author_id).await?;
                settings.inat_user_id = Some(user.id);
                self.settings.set_user(ctx.author_id, &settings).await?;
                Ok(vec![Reply::text(format!(
                    "Your iNat user is now {}.",
                    user.profile_link()
                ))])
            }
            "home" => {
                let text = args.join(" ");
                if text.is_empty() {
                    return Err(self.usage("inat set home <place>"));
                }
                let place = self.resolver.resolve_place(ctx, &text).await?;
                let mut settings = self.settings.user(ctx.author_id).await?;
                settings.home = Some(place.id);
                self.settings.set_user(ctx.author_id, &settings).await?;
                Ok(vec![Reply::text(format!(
                    "Your home place is now {}.",
                    place.display_name
                ))])
            }
            "server_home" => {
                let guild_id = self.require_manager(ctx)?;
                let text = args.join(" ");
                let mut guild = self.settings.guild(guild_id).await?;
                if text.eq_ignore_ascii_case("none") {
                    guild.home = None;
                    self.settings.set_guild(guild_id, &guild).await?;
                    return Ok(vec![Reply::text("This server's home place is cleared.")]);
                }
                if text.is_empty() {
                    return Err(self.usage("inat set server_home <place>|none"));
                }
                let place = self.resolver.resolve_place(ctx, &text).await?;
                guild.home = Some(place.id);
                self.settings.set_guild(guild_id, &guild).await?;
                Ok(vec![Reply::text(format!(
                    "This server's home place is now {}.",
                    place.display_name
                ))])
            }
            "global_home" => {
                self.require_owner(ctx)?;
                let text = args.join(" ");
                let mut global = self.settings.global().await?;
                if text.eq_ignore_ascii_case("none") {
                    global.home = None;
                    self.settings.set_global(&global).await?;
                    return Ok(vec![Reply::text("The default home place is cleared.")]);
                }
                if text.is_empty() {
                    return Err(self.usage("inat set global_home <place>|none"));
                }
                let place = self.resolver.resolve_place(ctx, &text).await?;
                global.home = Some(place.id);
                self.settings.set_global(&global).await?;
                Ok(vec![Reply::text(format!(
                    "The default home place is now {}.",
                    place.display_name
                ))])
            }
            "autoobs" | "dot_taxon" => self.set_listener(ctx, setting, args).await,
            "listen" => {
                let guild_id = self.require_manager(ctx)?;
                let listen = match args.first().and_then(|w| Switch::parse(w)) {
                    Some(Switch::On) => true,
                    Some(Switch::Off) => false,
                    _ => return Err(self.usage("inat set listen on|off")),
                };
                let mut guild = self.settings.guild(guild_id).await?;
                guild.listen = listen;
                self.settings.set_guild(guild_id, &guild).await?;
                Ok(vec![Reply::text(format!(
                    "Listening in this server is now {}.",
                    on_off(listen)
                ))])
            }
            "bot_prefixes" => {
                let guild_id = self.require_manager(ctx)?;
                let mut guild = self.settings.guild(guild_id).await?;
                guild.bot_prefixes = args.iter().map(|p| p.to_string()).collect();
                self.settings.set_guild(guild_id, &guild).await?;
                if guild.bot_prefixes.is_empty() {
                    Ok(vec![Reply::text("Other bots' prefixes cleared.")])
                } else {
                    Ok(vec![Reply::text(format!(
                        "Messages starting with these prefixes are now ignored: {}",
                        guild.bot_prefixes.join(" ")
                    ))])
                }
            }
            other => Err(CommandError::Invalid(format!(
                "Unknown setting `{other}`. Settings: `user`, `home`, `server_home`, `global_home`, `autoobs`, `dot_taxon`, `listen`, `bot_prefixes`."
            ))),
        }
    }

    /// `autoobs`/`dot_taxon` for this channel, or with `server` for the
    /// whole server.
    async fn set_listener(
        &self,
        ctx: &CommandContext,
        listener: &str,
        args: &[&str],
    ) -> CommandResult<Vec<Reply>> {
        let guild_id = self.require_manager(ctx)?;
        let usage = || self.usage(&format!("inat set {listener} on|off|inherit [server]"));
        let switch = args.first().and_then(|w| Switch::parse(w)).ok_or_else(usage)?;
        let server_wide = match args.get(1) {
            Some(word) if word.eq_ignore_ascii_case("server") => true,
            Some(_) => return Err(usage()),
            None => false,
        };

        if server_wide {
            let Some(value) = switch.as_option() else {
                return Err(CommandError::Invalid(
                    "Only channel settings can inherit.".to_string(),
                ));
            };
            let mut guild = self.settings.guild(guild_id).await?;
            if listener == "autoobs" {
                guild.autoobs = value;
            } else {
                guild.dot_taxon = value;
            }
            self.settings.set_guild(guild_id, &guild).await?;
            return Ok(vec![Reply::text(format!(
                "Server {listener} is now {}.",
                on_off(value)
            ))]);
        }

        let mut channel = self.settings.channel(ctx.channel_id).await?;
        if listener == "autoobs" {
            channel.autoobs = switch.as_option();
        } else {
            channel.dot_taxon = switch.as_option();
        }
        self.settings.set_channel(ctx.channel_id, &channel).await?;
        Ok(vec![Reply::text(format!(
            "Channel {listener} is now {}.",
            inherited(switch.as_option())
        ))])
    }

    async fn inat_show(&self, ctx: &CommandContext) -> CommandResult<Vec<Reply>> {
        let user = self.settings.user(ctx.author_id).await?;
        let mut lines = vec![
            "**Your settings:**".to_string(),
            format!("iNat user id: {}", id_or_unset(user.inat_user_id)),
            format!("home place id: {}", id_or_unset(user.home)),
        ];

        if let Some(guild_id) = ctx.guild_id {
            let guild = self.settings.guild(guild_id).await?;
            let channel = self.settings.channel(ctx.channel_id).await?;
            lines.push("**Server settings:**".to_string());
            lines.push(format!("home place id: {}", id_or_unset(guild.home)));
            lines.push(format!("listen: {}", on_off(guild.listen)));
            lines.push(format!("autoobs: {}", on_off(guild.autoobs)));
            lines.push(format!("dot_taxon: {}", on_off(guild.dot_taxon)));
            if !guild.bot_prefixes.is_empty() {
                lines.push(format!("bot_prefixes: {}", guild.bot_prefixes.join(" ")));
            }
            lines.push("**Channel settings:**".to_string());
            lines.push(format!("autoobs: {}", inherited(channel.autoobs)));
            lines.push(format!("dot_taxon: {}", inherited(channel.dot_taxon)));
        }
        let global = self.settings.global().await?;
        lines.push(format!("Default home place id: {}", id_or_unset(global.home)));
        Ok(vec![Reply::text(lines.join("\n"))])
    }
}
