use anyhow::Result;
use dotenvy::dotenv;
use log::{debug, error, info, warn};
use serenity::async_trait;
use serenity::model::application::interaction::Interaction;
use serenity::model::gateway::Ready;
use serenity::model::id::{ChannelId, GuildId, MessageId};
use serenity::prelude::*;
use std::sync::Arc;

use dicebot::commands::{create_registry, InteractionEngine};
use dicebot::core::Config;
use dicebot::dice::{DicePipeline, StandardEvaluator};
use dicebot::discord::{
    deliver, from_command, from_component, from_modal, register_global_commands,
    register_guild_commands, Incoming,
};
use dicebot::store::{ConfigRepository, SqliteConfigStore};

struct Handler {
    engine: InteractionEngine,
    guild_id: Option<GuildId>,
}

impl Handler {
    fn new(engine: InteractionEngine, guild_id: Option<GuildId>) -> Self {
        Handler { engine, guild_id }
    }

    async fn forget(&self, message_id: MessageId) {
        if let Err(e) = self.engine.forget_message(message_id.0).await {
            warn!("⚠️ Could not drop config of deleted message {message_id}: {e}");
        }
    }
}

#[async_trait]
impl EventHandler for Handler {
    async fn ready(&self, ctx: Context, ready: Ready) {
        info!("🎉 {} is connected and ready!", ready.user.name);
        info!("📡 Connected to {} guilds", ready.guilds.len());
        if let Some(shard) = ready.shard {
            info!("⚡ Shard: {}/{}", shard[0] + 1, shard[1]);
        }

        let definitions = self.engine.registry().definitions();

        // Register slash commands - use guild commands for development (instant), global for production
        if let Some(guild_id) = self.guild_id {
            info!("🔧 Development mode: Registering commands for guild {guild_id}");
            if let Err(e) = register_guild_commands(&ctx, guild_id, &definitions).await {
                error!("❌ Failed to register guild slash commands: {e}");
            } else {
                info!("✅ Successfully registered slash commands for guild {guild_id} (instant update)");
            }
        } else {
            info!("🌍 Production mode: Registering commands globally");
            if let Err(e) = register_global_commands(&ctx, &definitions).await {
                error!("❌ Failed to register global slash commands: {e}");
            } else {
                info!("✅ Successfully registered slash commands globally (may take up to 1 hour to propagate)");
            }
        }
    }

    async fn interaction_create(&self, ctx: Context, interaction: Interaction) {
        let (event, incoming) = match &interaction {
            Interaction::ApplicationCommand(command) => {
                (from_command(command), Incoming::Command(command))
            }
            Interaction::MessageComponent(component) => {
                (from_component(component), Incoming::Component(component))
            }
            Interaction::ModalSubmit(modal) => (from_modal(modal), Incoming::Modal(modal)),
            Interaction::Ping(_) => {
                info!("Ping interaction received - Discord health check");
                return;
            }
            _ => {
                debug!("Ignoring unsupported interaction kind");
                return;
            }
        };

        let outcome = self.engine.dispatch(event).await;
        if let Err(e) = deliver(&ctx, &self.engine, incoming, outcome).await {
            error!("❌ Failed to deliver interaction response: {e}");
        }
    }

    async fn message_delete(
        &self,
        _ctx: Context,
        _channel_id: ChannelId,
        deleted_message_id: MessageId,
        _guild_id: Option<GuildId>,
    ) {
        self.forget(deleted_message_id).await;
    }

    async fn message_delete_bulk(
        &self,
        _ctx: Context,
        _channel_id: ChannelId,
        multiple_deleted_messages_ids: Vec<MessageId>,
        _guild_id: Option<GuildId>,
    ) {
        for message_id in multiple_deleted_messages_ids {
            self.forget(message_id).await;
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenv().ok();

    let config = Config::from_env()?;

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&config.log_level))
        .init();

    info!("Starting dice roller bot...");

    let store = SqliteConfigStore::open(&config.database_path).await?;
    info!("💾 Config store opened at {}", config.database_path);

    // Written once here, read-only afterwards
    let registry = Arc::new(create_registry()?);
    info!("🎲 Registered {} commands", registry.len());

    let dice = DicePipeline::new(
        Arc::new(StandardEvaluator),
        config.dice_limits,
        config.evaluation_timeout,
    )?;
    let engine = InteractionEngine::new(
        registry,
        ConfigRepository::new(Arc::new(store)),
        Arc::new(dice),
        config.cas_max_retries,
    );

    // Guild commands for development mode
    let guild_id = config.discord_guild_id.map(GuildId);

    let handler = Handler::new(engine, guild_id);

    let intents = GatewayIntents::GUILDS | GatewayIntents::GUILD_MESSAGES;

    let mut client = Client::builder(&config.discord_token, intents)
        .event_handler(handler)
        .await
        .map_err(|e| {
            error!("Failed to create Discord client: {e}");
            error!("This could indicate:");
            error!("  - Invalid bot token format");
            error!("  - Network issues reaching Discord API");
            anyhow::anyhow!("Client creation failed: {}", e)
        })?;

    info!("Establishing WebSocket connection to Discord gateway...");
    info!("Gateway intents: {intents:?}");

    if let Err(why) = client.start().await {
        error!("Gateway connection failed: {why:?}");
        return Err(anyhow::anyhow!(
            "Failed to establish gateway connection: {}",
            why
        ));
    }

    Ok(())
}
