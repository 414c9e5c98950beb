//! # Interaction Engine
//!
//! Drives one inbound event through normalize → load → handle → render →
//! compare-and-swap, and turns every failure into an ephemeral notice.
//!
//! - **Version**: 1.1.0
//! - **Since**: 1.0.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 1.1.0: Retry policy per action replay safety
//! - 1.0.0: Initial dispatch loop with pending message creation

use log::{debug, error, info, warn};
use std::sync::Arc;
use std::time::Instant;
use uuid::Uuid;

use super::context::HandlerContext;
use super::handler::{CommandHandler, ConfigChange};
use super::registry::CommandRegistry;
use crate::core::error::{EvaluationError, HandlerError, StoreError};
use crate::dice::DicePipeline;
use crate::interaction::{normalize, InteractionEvent, PlatformEvent};
use crate::render::{render, Notice, PlatformMessage, TargetMessagePolicy};
use crate::store::{CommandConfig, ConfigKey, ConfigRepository, FlavorConfig};

/// What the transport has to do with a dispatched event
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    Reply(PlatformMessage),
    /// Post `message`, then hand its id to [`InteractionEngine::complete_create`]
    PendingCreate {
        message: PlatformMessage,
        config: CommandConfig,
    },
}

impl Outcome {
    pub fn message(&self) -> &PlatformMessage {
        match self {
            Self::Reply(message) | Self::PendingCreate { message, .. } => message,
        }
    }
}

#[derive(Clone)]
pub struct InteractionEngine {
    registry: Arc<CommandRegistry>,
    repository: ConfigRepository,
    dice: Arc<DicePipeline>,
    max_retries: u32,
}

impl InteractionEngine {
    pub fn new(
        registry: Arc<CommandRegistry>,
        repository: ConfigRepository,
        dice: Arc<DicePipeline>,
        max_retries: u32,
    ) -> Self {
        Self {
            registry,
            repository,
            dice,
            max_retries,
        }
    }

    pub fn registry(&self) -> &CommandRegistry {
        &self.registry
    }

    /// Handle one event end to end. Never fails: errors become notices.
    pub async fn dispatch(&self, event: PlatformEvent) -> Outcome {
        let request_id = Uuid::new_v4();
        let started = Instant::now();
        let locale = event.actor.locale.clone();
        let actor_id = event.actor.id;

        let interaction = match normalize(event, &self.registry) {
            Ok(interaction) => interaction,
            Err(err) => {
                info!("[{request_id}] 🚫 Rejected event from {actor_id}: {err}");
                return Outcome::Reply(Notice::from(&err).render(&locale));
            }
        };

        let outcome = match self.registry.resolve(interaction.command()) {
            Ok(handler) => self.run(request_id, handler.as_ref(), &interaction).await,
            Err(err) => {
                warn!("[{request_id}] Normalized event without handler: {err}");
                Err(Notice::UnknownCommand)
            }
        };
        let (outcome, status) = match outcome {
            Ok(outcome) => (outcome, "ok".to_string()),
            Err(notice) => {
                let status = format!("{notice:?}");
                (Outcome::Reply(notice.render(&locale)), status)
            }
        };

        info!(
            "[{request_id}] ✅ {} {}:{} | User: {} | Channel: {} | {} | {}ms",
            interaction.kind.as_str(),
            interaction.command(),
            interaction.action(),
            actor_id,
            interaction.channel_id,
            status,
            started.elapsed().as_millis()
        );
        outcome
    }

    /// Store the config of a freshly posted roller message
    pub async fn complete_create(
        &self,
        message_id: u64,
        config: &CommandConfig,
    ) -> Result<(), StoreError> {
        let key = ConfigKey::Message(message_id);
        self.repository.create(&key, config).await?;
        debug!("Stored {} config under {key}", config.command_name);
        Ok(())
    }

    /// Drop the config of a deleted message; unknown messages are ignored
    pub async fn forget_message(&self, message_id: u64) -> Result<(), StoreError> {
        match self.repository.delete(&ConfigKey::Message(message_id)).await {
            Ok(()) => {
                debug!("Removed config of deleted message {message_id}");
                Ok(())
            }
            Err(StoreError::NotFound(_)) => Ok(()),
            Err(err) => Err(err),
        }
    }

    async fn run(
        &self,
        request_id: Uuid,
        handler: &dyn CommandHandler,
        event: &InteractionEvent,
    ) -> Result<Outcome, Notice> {
        let ctx = self.context_for(request_id, event).await;
        let key = handler.config_key(event);
        let safety = handler.replay_safety(event.action());
        let mut attempts = 0u32;

        loop {
            let snapshot = match &key {
                Some(key) => self.load(request_id, key).await?,
                None => None,
            };
            let keyed_by_message = !matches!(key, Some(ConfigKey::Channel(_)));
            if snapshot.is_none() && !event.is_start() && keyed_by_message {
                return Err(Notice::NoLongerActive);
            }

            let result = handler
                .handle(&ctx, event, snapshot.as_ref().map(|(config, _)| config))
                .await
                .map_err(|err| handler_notice(request_id, &err))?;
            let message = render(&result.answer, result.policy).map_err(|err| {
                error!("[{request_id}] ❌ Failed to render answer: {err}");
                Notice::GenericFailure
            })?;

            let (change, key) = match (result.config, &key) {
                (ConfigChange::Unchanged, _) | (ConfigChange::Delete, None) => {
                    return Ok(Outcome::Reply(message));
                }
                (ConfigChange::Replace(config), None) => {
                    if event.is_start() && result.policy == TargetMessagePolicy::CreateNew {
                        return Ok(Outcome::PendingCreate { message, config });
                    }
                    error!(
                        "[{request_id}] ❌ {} produced a config without a place to store it",
                        event.command()
                    );
                    return Err(Notice::GenericFailure);
                }
                (change, Some(key)) => (change, key),
            };

            let written = match (change, &snapshot) {
                (ConfigChange::Delete, _) => match self.repository.delete(key).await {
                    Ok(()) | Err(StoreError::NotFound(_)) => Ok(()),
                    Err(err) => Err(err),
                },
                (ConfigChange::Replace(config), Some((_, version))) => self
                    .repository
                    .compare_and_swap(key, *version, &config)
                    .await
                    .map(|_| ()),
                (ConfigChange::Replace(config), None) => {
                    self.repository.create(key, &config).await.map(|_| ())
                }
                (ConfigChange::Unchanged, _) => Ok(()),
            };

            match written {
                Ok(()) => return Ok(Outcome::Reply(message)),
                Err(StoreError::NotFound(_)) if keyed_by_message => {
                    debug!("[{request_id}] {key} vanished while writing");
                    return Err(Notice::NoLongerActive);
                }
                Err(err) if err.is_race() => {
                    if !safety.may_retry() {
                        debug!("[{request_id}] Lost race on {key}, not retrying: {err}");
                        return Err(Notice::Superseded);
                    }
                    attempts += 1;
                    if attempts > self.max_retries {
                        warn!("[{request_id}] ⚠️ Giving up on {key} after {attempts} attempts");
                        return Err(Notice::Superseded);
                    }
                    debug!("[{request_id}] 🔁 Lost race on {key}, retry {attempts}");
                }
                Err(err) => return Err(store_notice(request_id, &err)),
            }
        }
    }

    async fn load(
        &self,
        request_id: Uuid,
        key: &ConfigKey,
    ) -> Result<Option<(CommandConfig, u64)>, Notice> {
        match self.repository.load(key).await {
            Ok(loaded) => Ok(Some(loaded)),
            Err(StoreError::NotFound(_)) => Ok(None),
            Err(err) => Err(store_notice(request_id, &err)),
        }
    }

    /// Handlers starting a roller inherit the channel's answer defaults
    async fn context_for(&self, request_id: Uuid, event: &InteractionEvent) -> HandlerContext {
        let ctx = HandlerContext::new(Arc::clone(&self.dice));
        if !event.is_start() {
            return ctx;
        }
        match self
            .repository
            .load(&ConfigKey::Channel(event.channel_id))
            .await
        {
            Ok((config, _)) if config.flavor == FlavorConfig::ChannelDefaults => {
                ctx.with_channel_defaults(Some(config.answer))
            }
            Ok(_) | Err(StoreError::NotFound(_)) => ctx,
            Err(err) => {
                warn!("[{request_id}] ⚠️ Ignoring unreadable channel defaults: {err}");
                ctx
            }
        }
    }
}

fn handler_notice(request_id: Uuid, err: &HandlerError) -> Notice {
    debug!("[{request_id}] Handler declined: {err}");
    if let HandlerError::Evaluation(EvaluationError::InternalError(detail)) = err {
        error!("[{request_id}] ❌ Dice evaluation failed: {detail}");
    }
    Notice::from(err)
}

fn store_notice(request_id: Uuid, err: &StoreError) -> Notice {
    match err {
        StoreError::Corrupt { .. } => {
            warn!("[{request_id}] ⚠️ {err}");
            Notice::StateUnreadable
        }
        _ => {
            error!("[{request_id}] ❌ Config store failure: {err}");
            Notice::GenericFailure
        }
    }
}
