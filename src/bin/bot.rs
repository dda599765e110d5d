//! fieldnotes Discord bot
//!
//! Answers prefixed commands and runs the message listeners. Also posts
//! the scheduled eBird hybrids report.

use dotenvy::dotenv;
use fieldnotes::commands::{CommandContext, CommandDispatcher, Reply};
use fieldnotes::config;
use fieldnotes::core::runtime::{Runtime, RuntimeConfig};
use fieldnotes::core::scheduler::{ReportScheduler, ReportSink};
use fieldnotes::format::Embed;
use fieldnotes::listeners::{on_message, IncomingMessage};
use fieldnotes::logging;
use serenity::all::{
    ChannelId, Context, CreateEmbed, CreateEmbedFooter, CreateMessage, EventHandler,
    GatewayIntents, GetMessages, Http, Message, Ready,
};
use serenity::async_trait;
use serenity::Client;
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info, warn};

/// Messages searched by `last`.
const HISTORY_LIMIT: u8 = 100;

struct Handler {
    dispatcher: Arc<CommandDispatcher>,
    owner_ids: Vec<u64>,
}

#[async_trait]
impl EventHandler for Handler {
    async fn ready(&self, _ctx: Context, ready: Ready) {
        info!(user = %ready.user.name, guilds = ready.guilds.len(), "Connected to Discord");
    }

    async fn message(&self, ctx: Context, msg: Message) {
        if msg.author.bot {
            return;
        }
        let mut command_ctx = CommandContext {
            guild_id: msg.guild_id.map(|id| id.get()),
            channel_id: msg.channel_id.get(),
            author_id: msg.author.id.get(),
            is_owner: self.owner_ids.contains(&msg.author.id.get()),
            is_admin: false,
            history: Vec::new(),
        };

        let replies = if let Some((name, _)) = self.dispatcher.split_command(&msg.content) {
            command_ctx.is_admin = is_guild_manager(&ctx, &msg).await;
            if name == "last" {
                command_ctx.history = recent_messages(&ctx, &msg).await;
            }
            self.dispatcher
                .dispatch(&command_ctx, &msg.content)
                .await
                .unwrap_or_default()
        } else {
            let message = IncomingMessage {
                content: &msg.content,
                author_is_bot: msg.author.bot,
            };
            on_message(&self.dispatcher, &command_ctx, &message).await
        };

        for reply in replies {
            let result = match reply {
                Reply::Text(text) => msg.channel_id.say(&ctx.http, text).await,
                Reply::Embed(embed) => {
                    msg.channel_id
                        .send_message(&ctx.http, CreateMessage::new().embed(to_discord(&embed)))
                        .await
                }
            };
            if let Err(e) = result {
                warn!(channel_id = msg.channel_id.get(), error = %e, "Failed to send reply");
            }
        }
    }
}

/// Text and embed links of the messages before `msg`, newest first.
async fn recent_messages(ctx: &Context, msg: &Message) -> Vec<String> {
    let request = GetMessages::new().before(msg.id).limit(HISTORY_LIMIT);
    match msg.channel_id.messages(ctx, request).await {
        Ok(messages) => messages
            .iter()
            .flat_map(|m| {
                std::iter::once(m.content.clone())
                    .chain(m.embeds.iter().filter_map(|embed| embed.url.clone()))
            })
            .filter(|text| !text.is_empty())
            .collect(),
        Err(e) => {
            warn!(channel_id = msg.channel_id.get(), error = %e, "Failed to fetch channel history");
            Vec::new()
        }
    }
}

/// Members with Manage Server may change server settings.
async fn is_guild_manager(ctx: &Context, msg: &Message) -> bool {
    let Some(guild_id) = msg.guild_id else {
        return false;
    };
    let member = match guild_id.member(ctx, msg.author.id).await {
        Ok(member) => member,
        Err(e) => {
            warn!(error = %e, "Failed to fetch member");
            return false;
        }
    };
    ctx.cache
        .guild(guild_id)
        .map(|guild| guild.member_permissions(&member).manage_guild())
        .unwrap_or(false)
}

fn to_discord(embed: &Embed) -> CreateEmbed {
    let mut out = CreateEmbed::new();
    if let Some(title) = &embed.title {
        out = out.title(title);
    }
    if let Some(url) = &embed.url {
        out = out.url(url);
    }
    if let Some(description) = &embed.description {
        out = out.description(description);
    }
    if let Some(thumbnail) = &embed.thumbnail {
        out = out.thumbnail(thumbnail);
    }
    if let Some(image) = &embed.image {
        out = out.image(image);
    }
    if let Some(footer) = &embed.footer {
        out = out.footer(CreateEmbedFooter::new(footer));
    }
    for field in &embed.fields {
        out = out.field(&field.name, &field.value, field.inline);
    }
    out
}

/// Posts scheduled reports to a Discord channel.
struct DiscordSink {
    http: Arc<Http>,
}

#[async_trait]
impl ReportSink for DiscordSink {
    async fn send(
        &self,
        channel_id: u64,
        message: String,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        ChannelId::new(channel_id).say(&*self.http, message).await?;
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    // Load environment variables from .env if present
    dotenv().ok();

    logging::init_logging();

    let env = config::get_environment();
    info!("Starting fieldnotes bot");
    info!(environment = %env, "Environment");

    let token = config::discord_token().ok_or("DISCORD_TOKEN must be set")?;
    let runtime = Runtime::new(RuntimeConfig::from_env()).await?;

    let handler = Handler {
        dispatcher: runtime.dispatcher.clone(),
        owner_ids: config::bot_owner_ids(),
    };
    let intents = GatewayIntents::GUILDS
        | GatewayIntents::GUILD_MESSAGES
        | GatewayIntents::DIRECT_MESSAGES
        | GatewayIntents::MESSAGE_CONTENT;
    let mut client = Client::builder(&token, intents)
        .event_handler(handler)
        .await?;

    let scheduler = ReportScheduler::new(
        runtime.dispatcher.clone(),
        Arc::new(DiscordSink {
            http: client.http.clone(),
        }),
        &config::hybrids_report_cron(),
    )?;
    scheduler.start().await;

    let shard_manager = client.shard_manager.clone();
    tokio::select! {
        result = client.start() => {
            if let Err(e) = result {
                error!(error = %e, "Discord client stopped");
            }
        }
        _ = signal::ctrl_c() => {
            info!("Shutting down bot...");
            shard_manager.shutdown_all().await;
        }
    }

    scheduler.stop().await;
    info!("Bot stopped");
    Ok(())
}
