//! `/roll`: a single expression behind a "roll again" button

use async_trait::async_trait;

use super::{
    answer_config, answer_options, clear_button, clear_roller, flavor_mismatch, place_roll,
    require_config, required_option, unknown_action,
};
use crate::commands::context::HandlerContext;
use crate::commands::definition::{CommandDefinition, OptionDefinition};
use crate::commands::handler::{CommandHandler, HandlerResult, ReplaySafety};
use crate::core::error::HandlerError;
use crate::core::i18n::{tr, Text};
use crate::interaction::{CustomId, InteractionEvent};
use crate::render::{roll_answer, Button, ButtonStyle, Component, ComponentRow};
use crate::store::{CommandConfig, FlavorConfig, RollConfig};

const COMMAND: &str = "roll";

pub struct RollHandler;

fn layout(locale: &str) -> Vec<ComponentRow> {
    vec![vec![
        Component::Button(Button::new(
            CustomId::new(COMMAND, "reroll"),
            tr(locale, Text::RollAgain),
            ButtonStyle::Primary,
        )),
        Component::Button(clear_button(COMMAND, locale)),
    ]]
}

impl RollHandler {
    async fn roll(
        ctx: &HandlerContext,
        event: &InteractionEvent,
        config: &CommandConfig,
        roll: &RollConfig,
    ) -> Result<HandlerResult, HandlerError> {
        let result = ctx.dice.roll(&roll.expression).await?;
        let answer = roll_answer(roll.label.as_deref(), &result, config.answer.format);
        let (answer, policy) = place_roll(
            event,
            config.answer.interaction,
            answer,
            layout(&config.locale),
        );
        Ok(if event.is_start() {
            HandlerResult::replace(config.clone(), answer, policy)
        } else {
            HandlerResult::unchanged(answer, policy)
        })
    }
}

#[async_trait]
impl CommandHandler for RollHandler {
    fn command_name(&self) -> &'static str {
        COMMAND
    }

    fn definition(&self) -> CommandDefinition {
        CommandDefinition::new(COMMAND, "Create a roller for a dice expression")
            .option(
                OptionDefinition::string("expression", "Dice expression, e.g. 2d6+3").required(),
            )
            .option(OptionDefinition::string("label", "Name shown with the result"))
            .options(answer_options())
    }

    fn replay_safety(&self, _action: &str) -> ReplaySafety {
        // reroll never writes; clear deletes without a version check
        ReplaySafety::Idempotent
    }

    async fn handle(
        &self,
        ctx: &HandlerContext,
        event: &InteractionEvent,
        current: Option<&CommandConfig>,
    ) -> Result<HandlerResult, HandlerError> {
        if event.is_start() {
            let roll = RollConfig {
                expression: required_option(event, "expression")?.to_string(),
                label: event
                    .input
                    .option("label")
                    .map(str::trim)
                    .filter(|l| !l.is_empty())
                    .map(str::to_string),
            };
            let config = CommandConfig::new(
                COMMAND,
                event.actor.id,
                event.actor.locale.clone(),
                answer_config(ctx, event)?,
                FlavorConfig::Roll(roll.clone()),
            );
            return Self::roll(ctx, event, &config, &roll).await;
        }

        let config = require_config(current)?;
        let FlavorConfig::Roll(roll) = &config.flavor else {
            return Err(flavor_mismatch(config));
        };
        match event.action() {
            "reroll" => Self::roll(ctx, event, config, roll).await,
            "clear" => clear_roller(event, config),
            _ => Err(unknown_action(event)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::handler::ConfigChange;
    use crate::commands::handlers::test_support::*;
    use crate::core::error::EvaluationError;
    use crate::render::TargetMessagePolicy;
    use crate::store::{AnswerFormat, AnswerInteraction};

    #[tokio::test]
    async fn test_start_creates_config_and_posts_roller() {
        let (config, result) = start(&RollHandler, &[("expression", "2d6+3")]).await;

        assert_eq!(config.command_name, "roll");
        assert_eq!(config.owner_id, OWNER);
        assert_eq!(
            config.flavor,
            FlavorConfig::Roll(RollConfig {
                expression: "2d6+3".into(),
                label: None
            })
        );
        assert_eq!(result.policy, TargetMessagePolicy::CreateNew);
        assert_eq!(result.answer.rows.len(), 1);
        let title = result.answer.embed.unwrap().title;
        let total: i64 = title.rsplit(' ').next().unwrap().parse().unwrap();
        assert!((5..=15).contains(&total));
    }

    #[tokio::test]
    async fn test_start_rejects_oversized_expression() {
        let event = slash("roll", &[("expression", "1000d1000")]);
        let err = RollHandler.handle(&context(), &event, None).await.unwrap_err();
        assert!(matches!(
            err,
            HandlerError::Evaluation(EvaluationError::LimitExceeded(_))
        ));
    }

    #[tokio::test]
    async fn test_start_requires_expression() {
        let event = slash("roll", &[]);
        assert!(matches!(
            RollHandler.handle(&context(), &event, None).await,
            Err(HandlerError::InvalidArgument(_))
        ));
    }

    #[tokio::test]
    async fn test_reroll_leaves_config_unchanged() {
        let (config, _) = start(&RollHandler, &[("expression", "2d6+3")]).await;
        let event = click(CustomId::new("roll", "reroll"), STRANGER);

        let result = RollHandler
            .handle(&context(), &event, Some(&config))
            .await
            .unwrap();
        assert_eq!(result.config, ConfigChange::Unchanged);
        assert_eq!(result.policy, TargetMessagePolicy::EditExisting);
        assert_eq!(result.answer.rows.len(), 1);
    }

    #[tokio::test]
    async fn test_button_named_start_does_not_restart_roller() {
        let (config, _) = start(&RollHandler, &[("expression", "1d6")]).await;
        let event = click(CustomId::new("roll", "start"), STRANGER);
        assert!(matches!(
            RollHandler.handle(&context(), &event, Some(&config)).await,
            Err(HandlerError::InvalidArgument(_))
        ));
    }

    #[tokio::test]
    async fn test_append_new_posts_result_without_buttons() {
        let (config, _) = start(
            &RollHandler,
            &[
                ("expression", "1d20"),
                ("label", "Initiative"),
                ("answer_format", "minimal"),
                ("answer_interaction", "append_new"),
            ],
        )
        .await;
        assert_eq!(config.answer.format, AnswerFormat::Minimal);
        assert_eq!(config.answer.interaction, AnswerInteraction::AppendNew);

        let event = click(CustomId::new("roll", "reroll"), OWNER);
        let result = RollHandler
            .handle(&context(), &event, Some(&config))
            .await
            .unwrap();
        assert_eq!(result.policy, TargetMessagePolicy::CreateNew);
        assert!(result.answer.rows.is_empty());
        assert!(result.answer.content.unwrap().starts_with("Initiative ⇒ "));
    }

    #[tokio::test]
    async fn test_clear_restricted_to_owner_or_manager() {
        let (config, _) = start(&RollHandler, &[("expression", "1d6")]).await;

        let stranger = click(CustomId::new("roll", "clear"), STRANGER);
        assert_eq!(
            RollHandler
                .handle(&context(), &stranger, Some(&config))
                .await
                .unwrap_err(),
            HandlerError::Forbidden
        );

        let mut manager = click(CustomId::new("roll", "clear"), STRANGER);
        manager.actor.can_manage_channel = true;
        let result = RollHandler
            .handle(&context(), &manager, Some(&config))
            .await
            .unwrap();
        assert_eq!(result.config, ConfigChange::Delete);
        assert!(result.answer.rows.is_empty());

        let owner = click(CustomId::new("roll", "clear"), OWNER);
        assert!(RollHandler.handle(&context(), &owner, Some(&config)).await.is_ok());
    }
}
