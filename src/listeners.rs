//! Replies to ordinary messages: observation link previews (`autoobs`) and
//! `.taxon query.` lookups (`dot_taxon`).

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use crate::commands::{CommandContext, CommandDispatcher, Reply};
use crate::query::urls::find_obs_link;
use crate::query::{NaturalParser, Query};
use crate::settings::listener_settings;

/// `.query.` bounded by whitespace or the ends of the message; at least four
/// characters, not starting or ending with a space or dot.
static DOT_TAXON_PAT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(^|\s)\.(?P<query>[^\s\.].{2,}?[^\s\.])\.(\s|$)").expect("valid regex")
});

/// The first `.query.` in a message.
pub fn find_dot_taxon(content: &str) -> Option<&str> {
    DOT_TAXON_PAT
        .captures(content)
        .and_then(|caps| caps.name("query"))
        .map(|m| m.as_str())
}

/// A message that isn't a command.
#[derive(Debug, Clone)]
pub struct IncomingMessage<'a> {
    pub content: &'a str,
    pub author_is_bot: bool,
}

/// Run the listeners over a message. Empty when nothing applies; lookup
/// failures are logged, not reported, since nobody asked.
pub async fn on_message(
    dispatcher: &CommandDispatcher,
    ctx: &CommandContext,
    message: &IncomingMessage<'_>,
) -> Vec<Reply> {
    if message.author_is_bot || dispatcher.split_command(message.content).is_some() {
        return Vec::new();
    }
    let settings = match listener_settings(dispatcher.settings().as_ref(), ctx.guild_id, ctx.channel_id).await {
        Ok(settings) => settings,
        Err(e) => {
            debug!(error = %e, "Listener settings unavailable");
            return Vec::new();
        }
    };
    if !settings.listen {
        return Vec::new();
    }
    if settings
        .bot_prefixes
        .iter()
        .any(|prefix| !prefix.is_empty() && message.content.starts_with(prefix.as_str()))
    {
        return Vec::new();
    }

    let mut replies = Vec::new();
    if settings.autoobs {
        if let Some(link) = find_obs_link(message.content) {
            record(dispatcher, "autoobs");
            match dispatcher.obs_preview(link.obs_id).await {
                Ok(reply) => replies.push(reply),
                Err(e) => debug!(obs_id = link.obs_id, error = %e, "autoobs lookup failed"),
            }
        }
    }
    if settings.dot_taxon {
        if let Some(query) = find_dot_taxon(message.content).and_then(dot_taxon_query) {
            record(dispatcher, "dot_taxon");
            match dispatcher.taxon_replies(ctx, &query).await {
                Ok(more) => replies.extend(more),
                Err(e) => debug!(error = %e, "dot_taxon lookup failed"),
            }
        }
    }
    replies
}

/// A `.query.` worth looking up: it names a taxon and has no `with`
/// term, which a taxon display can't show.
fn dot_taxon_query(text: &str) -> Option<Query> {
    let query = NaturalParser::new().parse(text).ok()?;
    (query.main.is_some() && query.controlled_term.is_none()).then_some(query)
}

fn record(dispatcher: &CommandDispatcher, listener: &str) {
    if let Some(metrics) = dispatcher.metrics() {
        metrics.record_listener(listener);
    }
}
