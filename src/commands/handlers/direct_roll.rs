//! `/r`: roll an expression once, no roller message and no stored state

use async_trait::async_trait;

use super::{bool_option, required_option, unknown_action};
use crate::commands::context::HandlerContext;
use crate::commands::definition::{CommandDefinition, OptionDefinition};
use crate::commands::handler::{CommandHandler, HandlerResult, ReplaySafety};
use crate::core::error::HandlerError;
use crate::interaction::InteractionEvent;
use crate::render::{roll_answer, TargetMessagePolicy};
use crate::store::{AnswerFormat, CommandConfig, ConfigKey};

const COMMAND: &str = "r";

pub struct DirectRollHandler;

#[async_trait]
impl CommandHandler for DirectRollHandler {
    fn command_name(&self) -> &'static str {
        COMMAND
    }

    fn definition(&self) -> CommandDefinition {
        CommandDefinition::new(COMMAND, "Roll a dice expression right away")
            .option(
                OptionDefinition::string("expression", "Dice expression, e.g. 4d6k3").required(),
            )
            .option(OptionDefinition::boolean(
                "hidden",
                "Only show the result to yourself",
            ))
    }

    fn replay_safety(&self, _action: &str) -> ReplaySafety {
        ReplaySafety::Idempotent
    }

    fn config_key(&self, _event: &InteractionEvent) -> Option<ConfigKey> {
        None
    }

    async fn handle(
        &self,
        ctx: &HandlerContext,
        event: &InteractionEvent,
        _current: Option<&CommandConfig>,
    ) -> Result<HandlerResult, HandlerError> {
        if !event.is_start() {
            return Err(unknown_action(event));
        }
        let result = ctx.dice.roll(required_option(event, "expression")?).await?;
        let format = ctx
            .channel_defaults
            .map(|defaults| defaults.format)
            .unwrap_or(AnswerFormat::Full);
        let policy = if bool_option(event, "hidden") {
            TargetMessagePolicy::CreateEphemeral
        } else {
            TargetMessagePolicy::CreateNew
        };
        Ok(HandlerResult::unchanged(
            roll_answer(None, &result, format),
            policy,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::handler::ConfigChange;
    use crate::commands::handlers::test_support::*;

    #[tokio::test]
    async fn test_direct_roll_never_stores() {
        let event = slash(COMMAND, &[("expression", "3d6")]);
        assert_eq!(DirectRollHandler.config_key(&event), None);

        let result = DirectRollHandler
            .handle(&context(), &event, None)
            .await
            .unwrap();
        assert_eq!(result.config, ConfigChange::Unchanged);
        assert_eq!(result.policy, TargetMessagePolicy::CreateNew);
        assert!(result.answer.rows.is_empty());
    }

    #[tokio::test]
    async fn test_hidden_roll_is_ephemeral() {
        let event = slash(COMMAND, &[("expression", "1d20"), ("hidden", "true")]);
        let result = DirectRollHandler
            .handle(&context(), &event, None)
            .await
            .unwrap();
        assert_eq!(result.policy, TargetMessagePolicy::CreateEphemeral);
    }

    #[tokio::test]
    async fn test_syntax_error_surfaces() {
        let event = slash(COMMAND, &[("expression", "2d")]);
        assert!(matches!(
            DirectRollHandler.handle(&context(), &event, None).await,
            Err(HandlerError::Evaluation(_))
        ));
    }
}
