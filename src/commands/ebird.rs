//! eBird hybrids report and its settings

use super::context::{CommandContext, Reply};
use super::dispatcher::{split_subcommand, CommandDispatcher};
use crate::error::{CommandError, CommandResult};
use crate::format::ebird::hybrids_report;
use crate::format::{paginate_lines, MAX_MESSAGE_LEN};
use crate::models::ebird::is_valid_datetime_format;
use crate::services::ebird::is_valid_region;
use crate::settings::MAX_EBIRD_DAYS;

const EBIRD_USAGE: &str = "ebird hybrids | ebird show | ebird setregion <code> | ebird setdays <1-30> | \
     ebird setchannel [#channel|none] | ebird setformat <strftime>";

/// A channel mention `<#123>` or a bare id.
fn parse_channel(text: &str) -> Option<u64> {
    let id = text
        .strip_prefix("<#")
        .and_then(|t| t.strip_suffix('>'))
        .unwrap_or(text);
    id.parse().ok().filter(|&id| id > 0)
}

impl CommandDispatcher {
    pub(crate) async fn ebird(&self, ctx: &CommandContext, args: &str) -> CommandResult<Vec<Reply>> {
        let (name, rest) = split_subcommand(args);
        let one_word = !rest.is_empty() && !rest.contains(char::is_whitespace);
        match name.as_str() {
            "hybrids" if rest.is_empty() => {
                let lines = self.hybrids_report().await?;
                Ok(paginate_lines(&lines, MAX_MESSAGE_LEN)
                    .into_iter()
                    .map(Reply::Text)
                    .collect())
            }
            "show" if rest.is_empty() => self.ebird_show().await,
            "setregion" if one_word => {
                self.require_owner(ctx)?;
                let region = rest.to_uppercase();
                if !is_valid_region(&region) {
                    return Err(CommandError::Invalid(format!(
                        "`{region}` is not a valid eBird region code."
                    )));
                }
                let mut global = self.settings.global().await?;
                global.ebird_region = region;
                self.settings.set_global(&global).await?;
                Ok(vec![Reply::text("eBird region has been changed.")])
            }
            "setdays" if one_word => {
                self.require_owner(ctx)?;
                let days = rest
                    .parse::<u32>()
                    .ok()
                    .filter(|d| (1..=MAX_EBIRD_DAYS).contains(d))
                    .ok_or_else(|| {
                        CommandError::Invalid(format!(
                            "Days must be a number from 1 to {MAX_EBIRD_DAYS}."
                        ))
                    })?;
                let mut global = self.settings.global().await?;
                global.ebird_days = days;
                self.settings.set_global(&global).await?;
                Ok(vec![Reply::text(
                    "eBird days to include in recent observations has been changed.",
                )])
            }
            "setchannel" if rest.is_empty() || one_word => {
                self.require_owner(ctx)?;
                let channel = match rest.to_lowercase().as_str() {
                    "" => Some(ctx.channel_id),
                    "none" | "off" => None,
                    text => Some(parse_channel(text).ok_or_else(|| {
                        CommandError::Invalid(format!("`{rest}` is not a channel."))
                    })?),
                };
                let mut global = self.settings.global().await?;
                global.report_channel = channel;
                self.settings.set_global(&global).await?;
                Ok(vec![Reply::text(match channel {
                    Some(id) => format!("The hybrids report will be posted to <#{id}>."),
                    None => "The scheduled hybrids report is off.".to_string(),
                })])
            }
            "setformat" if !rest.is_empty() => {
                self.require_owner(ctx)?;
                if !is_valid_datetime_format(rest) {
                    return Err(CommandError::Invalid(format!(
                        "`{rest}` is not a valid date format. Use strftime codes like `%H:%M, %d %b`."
                    )));
                }
                let mut global = self.settings.global().await?;
                global.datetime_format = rest.to_string();
                self.settings.set_global(&global).await?;
                Ok(vec![Reply::text("eBird date format has been changed.")])
            }
            _ => Err(self.usage(EBIRD_USAGE)),
        }
    }

    async fn ebird_show(&self) -> CommandResult<Vec<Reply>> {
        let global = self.settings.global().await?;
        let channel = global
            .report_channel
            .map(|id| format!("<#{id}>"))
            .unwrap_or_else(|| "not set".to_string());
        let lines = [
            "**eBird settings:**".to_string(),
            format!("region: {}", global.ebird_region),
            format!("days: {}", global.ebird_days),
            format!("date format: `{}`", global.datetime_format),
            format!("report channel: {channel}"),
        ];
        Ok(vec![Reply::text(lines.join("\n"))])
    }

    /// Recent hybrid sightings in the configured region, one line each.
    pub async fn hybrids_report(&self) -> CommandResult<Vec<String>> {
        let global = self.settings.global().await?;
        let records = self
            .ebird
            .recent_observations(&global.ebird_region, global.ebird_days, "hybrid")
            .await?;
        Ok(hybrids_report(
            &records,
            global.ebird_days,
            &global.datetime_format,
        ))
    }
}
