//! Subcommand: `quipster bot` -- Discord gateway.
//!
//! Answers `/ask` (and `!ask`) in guilds, plus plain messages that mention
//! the bot.  Every reply goes through the shared [`ReplyOrchestrator`]; the
//! cooldown scope is the guild.

use std::sync::Arc;

use anyhow::{Context as _, Result};
use poise::serenity_prelude as serenity;
use tracing::{debug, error, info, warn};

use quipster_agent::{AgentError, ReplyOrchestrator, Scope};
use quipster_web::WebServer;

use crate::settings::Settings;

/// Shared state handed to every command.
pub struct Data {
    pub orchestrator: Arc<ReplyOrchestrator>,
}

pub type Error = anyhow::Error;
pub type Context<'a> = poise::Context<'a, Data, Error>;

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

/// Run the Discord gateway alongside the health server until the gateway
/// stops.
pub async fn cmd_bot(settings: Settings) -> Result<()> {
    settings.validate(true)?;
    let token = settings
        .discord_token
        .clone()
        .context("DISCORD_TOKEN missing")?;

    let client = settings.build_client()?;
    let web = WebServer::new(settings.web_config(), client.clone());
    let orchestrator = Arc::new(settings.build_orchestrator(client)?);

    tokio::spawn(async move {
        if let Err(e) = web.start().await {
            error!(error = %e, "web server stopped");
        }
    });

    let framework = poise::Framework::builder()
        .options(poise::FrameworkOptions {
            commands: vec![ask()],
            prefix_options: poise::PrefixFrameworkOptions {
                prefix: Some("!".into()),
                ..Default::default()
            },
            event_handler: |ctx, event, framework, data| {
                Box::pin(event_handler(ctx, event, framework, data))
            },
            on_error: |error| Box::pin(on_error(error)),
            ..Default::default()
        })
        .setup(move |ctx, ready, framework| {
            Box::pin(async move {
                info!(user = %ready.user.name, "connected to Discord");
                match poise::builtins::register_globally(ctx, &framework.options().commands).await
                {
                    Ok(()) => info!("slash commands registered"),
                    Err(e) => error!(error = %e, "failed to register slash commands"),
                }
                Ok(Data { orchestrator })
            })
        })
        .build();

    let intents = serenity::GatewayIntents::non_privileged()
        | serenity::GatewayIntents::MESSAGE_CONTENT
        | serenity::GatewayIntents::GUILD_MESSAGES;

    let mut client = serenity::ClientBuilder::new(token, intents)
        .framework(framework)
        .await
        .context("failed to create Discord client")?;

    info!("starting Discord gateway");
    client.start().await.context("Discord gateway stopped")?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

/// Ask the bot something.
#[poise::command(slash_command, prefix_command, guild_only)]
pub async fn ask(
    ctx: Context<'_>,
    #[description = "What do you want to ask?"]
    #[rest]
    prompt: String,
) -> Result<(), Error> {
    let Some(guild_id) = ctx.guild_id() else {
        return Ok(());
    };
    let scope = Scope::from(guild_id.get());
    let orchestrator = &ctx.data().orchestrator;

    if let Err(err) = orchestrator.admit(&scope, &prompt) {
        ctx.send(
            poise::CreateReply::default()
                .content(orchestrator.render(&err))
                .ephemeral(true),
        )
        .await?;
        return Ok(());
    }

    debug!(scope = %scope, user = %ctx.author().name, "ask admitted");
    ctx.defer().await?;

    let outcome = orchestrator.respond(&prompt).await;
    ctx.say(orchestrator.finish(&scope, outcome)).await?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Mentions
// ---------------------------------------------------------------------------

async fn event_handler(
    ctx: &serenity::Context,
    event: &serenity::FullEvent,
    framework: poise::FrameworkContext<'_, Data, Error>,
    data: &Data,
) -> Result<(), Error> {
    let serenity::FullEvent::Message { new_message } = event else {
        return Ok(());
    };

    let bot_id = framework.bot_id;
    let Some((scope, text)) = mention_request(
        new_message.author.bot,
        new_message.guild_id.map(|id| id.get()),
        new_message.mentions_user_id(bot_id),
        &new_message.content,
        bot_id.get(),
    ) else {
        return Ok(());
    };

    let orchestrator = &data.orchestrator;
    match orchestrator.admit(&scope, &text) {
        Ok(()) => {}
        Err(AgentError::GateRejected { .. }) => return Ok(()),
        Err(err) => {
            new_message.reply(ctx, orchestrator.render(&err)).await?;
            return Ok(());
        }
    }

    if let Err(e) = new_message.channel_id.broadcast_typing(&ctx.http).await {
        debug!(error = %e, "typing indicator failed");
    }

    let outcome = orchestrator.respond(&text).await;
    new_message
        .reply(ctx, orchestrator.finish(&scope, outcome))
        .await?;
    Ok(())
}

/// Decide whether a gateway message is a mention request.
///
/// Returns the guild scope and the message text with the bot's mention
/// removed, or `None` for bot authors, direct messages, messages that do
/// not mention the bot, and messages that are empty once the mention is
/// stripped.
pub fn mention_request(
    author_is_bot: bool,
    guild_id: Option<u64>,
    mentions_bot: bool,
    content: &str,
    bot_id: u64,
) -> Option<(Scope, String)> {
    if author_is_bot || !mentions_bot {
        return None;
    }
    let guild_id = guild_id?;
    let text = strip_mentions(content, bot_id);
    if text.is_empty() {
        return None;
    }
    Some((Scope::from(guild_id), text))
}

/// Remove both mention forms of `bot_id` and trim.
pub fn strip_mentions(content: &str, bot_id: u64) -> String {
    content
        .replace(&format!("<@{bot_id}>"), "")
        .replace(&format!("<@!{bot_id}>"), "")
        .trim()
        .to_owned()
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

async fn on_error(error: poise::FrameworkError<'_, Data, Error>) {
    match error {
        poise::FrameworkError::Setup { error, .. } => {
            error!(error = %error, "framework setup failed");
        }
        poise::FrameworkError::Command { error, ctx, .. } => {
            warn!(command = %ctx.command().name, error = %error, "command failed");
        }
        poise::FrameworkError::EventHandler { error, .. } => {
            warn!(error = %error, "event handler failed");
        }
        other => {
            if let Err(e) = poise::builtins::on_error(other).await {
                error!(error = %e, "failed to report framework error");
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
