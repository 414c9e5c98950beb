//! `/custom_dice`: one button per user-defined expression, editable in place

use async_trait::async_trait;

use super::{
    answer_config, answer_options, authorize_owner_or_manager, clear_button, clear_roller,
    flavor_mismatch, format_die_buttons, parse_die_buttons, place_roll, require_config,
    required_option, unknown_action,
};
use crate::commands::context::HandlerContext;
use crate::commands::definition::{CommandDefinition, OptionDefinition};
use crate::commands::handler::{CommandHandler, HandlerResult, ReplaySafety};
use crate::core::error::HandlerError;
use crate::core::i18n::{tr, Text};
use crate::interaction::{CustomId, InteractionEvent};
use crate::render::{
    roll_answer, Answer, Button, ButtonStyle, ComponentRow, ModalAnswer, ModalInput,
    TargetMessagePolicy,
};
use crate::store::{CommandConfig, CustomDiceConfig, FlavorConfig};

const COMMAND: &str = "custom_dice";
const BUTTONS_FIELD: &str = "buttons";

pub struct CustomDiceHandler;

fn layout(dice: &CustomDiceConfig, locale: &str) -> Vec<ComponentRow> {
    let buttons = dice
        .buttons
        .iter()
        .enumerate()
        .map(|(i, b)| {
            Button::new(
                CustomId::new(COMMAND, "roll").with_param(i),
                b.label.clone(),
                ButtonStyle::Primary,
            )
        })
        .collect();
    Answer::default()
        .with_button_grid(buttons, 5)
        .with_button_row(vec![
            Button::new(
                CustomId::new(COMMAND, "configure"),
                tr(locale, Text::Configure),
                ButtonStyle::Secondary,
            ),
            clear_button(COMMAND, locale),
        ])
        .rows
}

fn overview(config: &CommandConfig, dice: &CustomDiceConfig) -> Answer {
    Answer::text(tr(&config.locale, Text::ClickToRoll)).with_rows(layout(dice, &config.locale))
}

#[async_trait]
impl CommandHandler for CustomDiceHandler {
    fn command_name(&self) -> &'static str {
        COMMAND
    }

    fn definition(&self) -> CommandDefinition {
        CommandDefinition::new(COMMAND, "Create a roller with your own dice buttons")
            .option(
                OptionDefinition::string(
                    "buttons",
                    "Buttons as label@expression separated by ; e.g. Attack@1d20+5;Damage@2d6",
                )
                .required(),
            )
            .options(answer_options())
    }

    fn replay_safety(&self, action: &str) -> ReplaySafety {
        match action {
            "edit" => ReplaySafety::Exclusive,
            _ => ReplaySafety::Idempotent,
        }
    }

    async fn handle(
        &self,
        ctx: &HandlerContext,
        event: &InteractionEvent,
        current: Option<&CommandConfig>,
    ) -> Result<HandlerResult, HandlerError> {
        if event.is_start() {
            let dice = CustomDiceConfig {
                buttons: parse_die_buttons(required_option(event, "buttons")?, &ctx.dice)?,
            };
            let config = CommandConfig::new(
                COMMAND,
                event.actor.id,
                event.actor.locale.clone(),
                answer_config(ctx, event)?,
                FlavorConfig::CustomDice(dice.clone()),
            );
            let answer = overview(&config, &dice);
            return Ok(HandlerResult::replace(
                config,
                answer,
                TargetMessagePolicy::CreateNew,
            ));
        }

        let config = require_config(current)?;
        let FlavorConfig::CustomDice(dice) = &config.flavor else {
            return Err(flavor_mismatch(config));
        };

        match event.action() {
            "roll" => {
                let button = event
                    .numeric_param(0)
                    .and_then(|i| dice.buttons.get(i))
                    .ok_or_else(|| HandlerError::InvalidArgument("unknown button".into()))?;
                let result = ctx.dice.roll(&button.expression).await?;
                let answer = roll_answer(Some(&button.label), &result, config.answer.format);
                let (answer, policy) = place_roll(
                    event,
                    config.answer.interaction,
                    answer,
                    layout(dice, &config.locale),
                );
                Ok(HandlerResult::unchanged(answer, policy))
            }
            "configure" => {
                authorize_owner_or_manager(event, config)?;
                let locale = &event.actor.locale;
                let modal = ModalAnswer {
                    custom_id: CustomId::new(COMMAND, "edit"),
                    title: tr(locale, Text::EditButtons).to_string(),
                    inputs: vec![ModalInput {
                        id: BUTTONS_FIELD.to_string(),
                        label: "label@expression;...".to_string(),
                        value: format_die_buttons(&dice.buttons),
                        paragraph: true,
                    }],
                };
                Ok(HandlerResult::unchanged(
                    Answer::modal(modal),
                    TargetMessagePolicy::OpenModal,
                ))
            }
            "edit" => {
                authorize_owner_or_manager(event, config)?;
                let raw = event.input.field(BUTTONS_FIELD).ok_or_else(|| {
                    HandlerError::InvalidArgument("missing button definition".into())
                })?;
                let edited = CustomDiceConfig {
                    buttons: parse_die_buttons(raw, &ctx.dice)?,
                };
                let mut next = config.clone();
                next.flavor = FlavorConfig::CustomDice(edited.clone());
                let answer = overview(&next, &edited);
                Ok(HandlerResult::replace(
                    next,
                    answer,
                    TargetMessagePolicy::EditExisting,
                ))
            }
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
    use crate::interaction::{EventKind, RawInput};
    use std::collections::BTreeMap;

    const BUTTONS: &str = "Attack@1d20+5;Damage@2d6+2";

    fn modal_submit(value: &str, actor_id: u64) -> InteractionEvent {
        let mut event = click(CustomId::new(COMMAND, "edit"), actor_id);
        event.kind = EventKind::ModalSubmit;
        let mut fields = BTreeMap::new();
        fields.insert(BUTTONS_FIELD.to_string(), value.to_string());
        event.input = RawInput::Fields(fields);
        event
    }

    #[tokio::test]
    async fn test_start_lays_out_buttons_and_controls() {
        let (config, result) = start(&CustomDiceHandler, &[("buttons", BUTTONS)]).await;
        let FlavorConfig::CustomDice(dice) = &config.flavor else {
            panic!("wrong flavor");
        };
        assert_eq!(dice.buttons.len(), 2);
        // one row of dice, one control row
        assert_eq!(result.answer.rows.len(), 2);
        assert_eq!(result.policy, TargetMessagePolicy::CreateNew);
    }

    #[tokio::test]
    async fn test_roll_uses_button_label() {
        let (config, _) = start(&CustomDiceHandler, &[("buttons", BUTTONS)]).await;
        let event = click(CustomId::new(COMMAND, "roll").with_param(1), STRANGER);
        let result = CustomDiceHandler
            .handle(&context(), &event, Some(&config))
            .await
            .unwrap();
        assert_eq!(result.config, ConfigChange::Unchanged);
        assert!(result.answer.embed.unwrap().title.starts_with("Damage ⇒ "));
    }

    #[tokio::test]
    async fn test_roll_with_unknown_index() {
        let (config, _) = start(&CustomDiceHandler, &[("buttons", BUTTONS)]).await;
        let event = click(CustomId::new(COMMAND, "roll").with_param(9), OWNER);
        assert!(matches!(
            CustomDiceHandler.handle(&context(), &event, Some(&config)).await,
            Err(HandlerError::InvalidArgument(_))
        ));
    }

    #[tokio::test]
    async fn test_configure_opens_prefilled_modal() {
        let (config, _) = start(&CustomDiceHandler, &[("buttons", BUTTONS)]).await;
        let event = click(CustomId::new(COMMAND, "configure"), OWNER);
        let result = CustomDiceHandler
            .handle(&context(), &event, Some(&config))
            .await
            .unwrap();
        assert_eq!(result.policy, TargetMessagePolicy::OpenModal);
        assert_eq!(result.answer.modal.unwrap().inputs[0].value, BUTTONS);

        let stranger = click(CustomId::new(COMMAND, "configure"), STRANGER);
        assert_eq!(
            CustomDiceHandler
                .handle(&context(), &stranger, Some(&config))
                .await
                .unwrap_err(),
            HandlerError::Forbidden
        );
    }

    #[tokio::test]
    async fn test_edit_replaces_buttons() {
        let (config, _) = start(&CustomDiceHandler, &[("buttons", BUTTONS)]).await;
        let result = CustomDiceHandler
            .handle(&context(), &modal_submit("Fireball@8d6", OWNER), Some(&config))
            .await
            .unwrap();
        let next = replaced(&result);
        assert_eq!(
            next.flavor,
            FlavorConfig::CustomDice(CustomDiceConfig {
                buttons: vec![crate::store::DieButton {
                    label: "Fireball".into(),
                    expression: "8d6".into(),
                }],
            })
        );
        assert_eq!(result.policy, TargetMessagePolicy::EditExisting);
        assert_eq!(CustomDiceHandler.replay_safety("edit"), ReplaySafety::Exclusive);
    }

    #[tokio::test]
    async fn test_edit_with_invalid_expression_rejected() {
        let (config, _) = start(&CustomDiceHandler, &[("buttons", BUTTONS)]).await;
        assert!(matches!(
            CustomDiceHandler
                .handle(&context(), &modal_submit("Broken@3d", OWNER), Some(&config))
                .await,
            Err(HandlerError::Evaluation(_))
        ));
    }
}
