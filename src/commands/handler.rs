//! Command handler trait and its result types
//!
//! - **Version**: 2.0.0
//! - **Since**: 1.0.0
//!
//! ## Changelog
//! - 2.0.0: Handlers return a decision instead of talking to Discord
//! - 1.0.0: Initial implementation for modular command handling

use async_trait::async_trait;

use super::context::HandlerContext;
use super::definition::CommandDefinition;
use crate::core::error::HandlerError;
use crate::interaction::InteractionEvent;
use crate::render::{Answer, TargetMessagePolicy};
use crate::store::{CommandConfig, ConfigKey};

/// How an action behaves when its compare-and-swap loses a race
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReplaySafety {
    /// Never writes the config (plain re-roll)
    Idempotent,
    /// Writes, and recomputing against a fresher snapshot is what the user
    /// asked for (toggles, appends, resets)
    Reapplicable,
    /// Writes based on what the user saw; a lost race becomes `Superseded`
    Exclusive,
}

impl ReplaySafety {
    pub fn may_retry(&self) -> bool {
        !matches!(self, Self::Exclusive)
    }
}

/// What should happen to the stored configuration
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConfigChange {
    Unchanged,
    Replace(CommandConfig),
    /// Terminal: the roller is gone
    Delete,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HandlerResult {
    pub config: ConfigChange,
    pub answer: Answer,
    pub policy: TargetMessagePolicy,
}

impl HandlerResult {
    pub fn unchanged(answer: Answer, policy: TargetMessagePolicy) -> Self {
        Self {
            config: ConfigChange::Unchanged,
            answer,
            policy,
        }
    }

    pub fn replace(config: CommandConfig, answer: Answer, policy: TargetMessagePolicy) -> Self {
        Self {
            config: ConfigChange::Replace(config),
            answer,
            policy,
        }
    }

    pub fn delete(answer: Answer, policy: TargetMessagePolicy) -> Self {
        Self {
            config: ConfigChange::Delete,
            answer,
            policy,
        }
    }
}

/// One dice roller flavor.
///
/// `handle` must be a pure function of the event and the loaded snapshot:
/// the dispatcher may call it again with a fresher snapshot after losing a
/// compare-and-swap race.
///
/// # Example
///
/// ```ignore
/// pub struct CoinHandler;
///
/// #[async_trait]
/// impl CommandHandler for CoinHandler {
///     fn command_name(&self) -> &'static str {
///         "coin"
///     }
///
///     fn definition(&self) -> CommandDefinition {
///         CommandDefinition::new("coin", "Flip a coin")
///     }
///
///     fn replay_safety(&self, _action: &str) -> ReplaySafety {
///         ReplaySafety::Idempotent
///     }
///
///     async fn handle(
///         &self,
///         ctx: &HandlerContext,
///         event: &InteractionEvent,
///         current: Option<&CommandConfig>,
///     ) -> Result<HandlerResult, HandlerError> {
///         let result = ctx.dice.roll("1d2").await?;
///         Ok(HandlerResult::unchanged(
///             Answer::text(result.total.to_string()),
///             TargetMessagePolicy::CreateNew,
///         ))
///     }
/// }
/// ```
#[async_trait]
pub trait CommandHandler: Send + Sync {
    /// Slash command name, also the first custom-id segment
    fn command_name(&self) -> &'static str;

    fn definition(&self) -> CommandDefinition;

    /// Replay safety of a decoded action
    fn replay_safety(&self, action: &str) -> ReplaySafety;

    /// Store key addressed by the event.
    ///
    /// Defaults to the message the component lives on. `None` for a slash
    /// command means the key only exists once the answer has been posted.
    fn config_key(&self, event: &InteractionEvent) -> Option<ConfigKey> {
        event.message_id.map(ConfigKey::Message)
    }

    async fn handle(
        &self,
        ctx: &HandlerContext,
        event: &InteractionEvent,
        current: Option<&CommandConfig>,
    ) -> Result<HandlerResult, HandlerError>;
}
