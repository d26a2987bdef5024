// This is the entry point of the moderation bot.
//
// **Architecture Overview:**
// - `core/` = Moderation logic (platform-agnostic)
// - `infra/` = Implementations of core traits (config file)
// - `discord/` = Discord-specific adapters (transport, events)
//
// This file's job is to:
// 1. Load settings from the environment
// 2. Initialize services (dependency injection)
// 3. Set up the Discord framework
// 4. Keep the connection alive, reconnecting after gateway failures

// These attrs point each module declaration at a more descriptive root file
// so we don't end up with half a dozen mod.rs files that all look the same.
#[path = "core/core_layer.rs"]
mod core;
#[path = "discord/discord_layer.rs"]
mod discord;
#[path = "infra/infra_layer.rs"]
mod infra;

use crate::core::moderation::ModerationService;
use crate::discord::moderation::events;
use crate::discord::{Data, Error};
use crate::infra::moderation::JsonConfigStore;
use anyhow::Context as _;
use poise::serenity_prelude as serenity;
use std::sync::Arc;
use std::time::Duration;

const DEFAULT_CONFIG_PATH: &str = "data/config.json";
const DEFAULT_RECONNECT_DELAY_SECS: u64 = 5;

/// Everything the bot reads from the environment.
struct BotSettings {
    token: String,
    admin_id: String,
    config_path: String,
    reconnect_delay: Duration,
}

impl BotSettings {
    fn from_env() -> anyhow::Result<Self> {
        let token = std::env::var("DISCORD_TOKEN").context(
            "Missing DISCORD_TOKEN environment variable! Create a .env file with your bot token.",
        )?;
        let admin_id = std::env::var("MODERATION_ADMIN_ID")
            .context("Missing MODERATION_ADMIN_ID environment variable (the admin's user id)")?;
        let config_path = std::env::var("MODERATION_CONFIG_PATH")
            .unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        let reconnect_delay = std::env::var("RECONNECT_DELAY_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(DEFAULT_RECONNECT_DELAY_SECS);

        Ok(Self {
            token,
            admin_id: admin_id.trim().to_string(),
            config_path,
            reconnect_delay: Duration::from_secs(reconnect_delay),
        })
    }
}

/// Event handler for gateway events. All moderation input arrives as plain messages.
async fn event_handler(
    ctx: &serenity::Context,
    event: &serenity::FullEvent,
    _framework: poise::FrameworkContext<'_, Data, Error>,
    data: &Data,
) -> Result<(), Error> {
    match event {
        serenity::FullEvent::Ready { data_about_bot } => {
            events::handle_ready(ctx, data, data_about_bot).await;
        }
        serenity::FullEvent::Message { new_message } => {
            events::handle_message(ctx, data, new_message).await;
        }
        _ => {}
    }

    Ok(())
}

async fn build_client(token: &str, data: Data) -> Result<serenity::Client, ::serenity::Error> {
    let intents = serenity::GatewayIntents::GUILD_MESSAGES
        | serenity::GatewayIntents::DIRECT_MESSAGES
        | serenity::GatewayIntents::MESSAGE_CONTENT // Required to read message content
        | serenity::GatewayIntents::GUILDS;

    let framework = poise::Framework::builder()
        .options(poise::FrameworkOptions {
            // Commands are plain `!` text parsed by the core, not framework commands.
            commands: vec![],
            event_handler: |ctx, event, framework, data| {
                Box::pin(event_handler(ctx, event, framework, data))
            },
            ..Default::default()
        })
        .setup(|_ctx, _ready, _framework| Box::pin(async move { Ok(data) }))
        .build();

    serenity::ClientBuilder::new(token, intents)
        .framework(framework)
        .await
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging so we can see what's happening
    tracing_subscriber::fmt::init();

    // Load environment variables from .env file (if it exists)
    dotenv::dotenv().ok();

    let settings = BotSettings::from_env()?;

    // ========================================================================
    // DEPENDENCY INJECTION
    // ========================================================================
    // The config file is read once here; the service owns it from now on.

    let store = JsonConfigStore::new(&settings.config_path);
    let moderation = Arc::new(ModerationService::load(store, settings.admin_id.clone()).await);
    tracing::info!(path = %settings.config_path, "Moderation config loaded");

    let data = Data {
        moderation: Arc::clone(&moderation),
    };

    // ========================================================================
    // CONNECTION LOOP
    // ========================================================================
    // Serenity resumes dropped sessions on its own; this loop only handles the
    // client giving up entirely. Bad credentials are the one reason to stop.

    loop {
        let mut client = build_client(&settings.token, data.clone())
            .await
            .context("Error creating client")?;

        match client.start().await {
            Ok(()) => {
                tracing::info!("Client stopped");
                return Ok(());
            }
            Err(::serenity::Error::Gateway(::serenity::gateway::GatewayError::InvalidAuthentication)) => {
                tracing::error!("Discord rejected the bot token, not reconnecting");
                anyhow::bail!("invalid Discord token");
            }
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    delay_secs = settings.reconnect_delay.as_secs(),
                    "Connection closed, reconnecting"
                );
                tokio::time::sleep(settings.reconnect_delay).await;
            }
        }
    }
}
