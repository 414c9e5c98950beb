//! `/channel_config`: answer formatting defaults for a whole channel
//!
//! Stored under the channel key instead of a message, so the panel itself
//! is ephemeral and can be reopened at any time.

use async_trait::async_trait;

use super::{answer_config, answer_options, flavor_mismatch, unknown_action};
use crate::commands::context::HandlerContext;
use crate::commands::definition::CommandDefinition;
use crate::commands::handler::{CommandHandler, HandlerResult, ReplaySafety};
use crate::core::error::HandlerError;
use crate::core::i18n::{tr, Text};
use crate::interaction::{CustomId, InteractionEvent};
use crate::render::{
    Answer, Button, ButtonStyle, Component, SelectMenu, SelectOption, TargetMessagePolicy,
};
use crate::store::{
    AnswerFormat, AnswerFormattingConfig, AnswerInteraction, CommandConfig, ConfigKey,
    FlavorConfig,
};

const COMMAND: &str = "channel_config";

pub struct ChannelConfigHandler;

fn require_manager(event: &InteractionEvent) -> Result<(), HandlerError> {
    if event.actor.can_manage_channel {
        Ok(())
    } else {
        Err(HandlerError::Forbidden)
    }
}

fn select<T: Copy + PartialEq>(
    action: &str,
    placeholder: &str,
    all: &[T],
    current: T,
    as_str: fn(&T) -> &'static str,
) -> Component {
    Component::Select(SelectMenu {
        custom_id: CustomId::new(COMMAND, action),
        placeholder: placeholder.to_string(),
        options: all
            .iter()
            .map(|value| SelectOption {
                value: as_str(value).to_string(),
                label: as_str(value).replace('_', " "),
                selected: *value == current,
            })
            .collect(),
    })
}

fn panel(answer: &AnswerFormattingConfig, locale: &str) -> Answer {
    Answer::text(format!(
        "{}: `{}` / `{}`",
        tr(locale, Text::ChannelDefaults),
        answer.format.as_str(),
        answer.interaction.as_str()
    ))
    .with_rows(vec![
        vec![select(
            "format",
            "answer_format",
            &AnswerFormat::ALL,
            answer.format,
            AnswerFormat::as_str,
        )],
        vec![select(
            "interaction",
            "answer_interaction",
            &AnswerInteraction::ALL,
            answer.interaction,
            AnswerInteraction::as_str,
        )],
    ])
    .with_button_row(vec![Button::new(
        CustomId::new(COMMAND, "reset"),
        tr(locale, Text::Reset),
        ButtonStyle::Danger,
    )])
}

fn defaults(event: &InteractionEvent, current: Option<&CommandConfig>, answer: AnswerFormattingConfig) -> CommandConfig {
    match current {
        Some(config) => CommandConfig {
            answer,
            ..config.clone()
        },
        None => CommandConfig::new(
            COMMAND,
            event.actor.id,
            event.actor.locale.clone(),
            answer,
            FlavorConfig::ChannelDefaults,
        ),
    }
}

fn picked(event: &InteractionEvent) -> Result<&str, HandlerError> {
    event
        .input
        .selection()
        .first()
        .map(String::as_str)
        .ok_or_else(|| HandlerError::InvalidArgument("nothing selected".into()))
}

#[async_trait]
impl CommandHandler for ChannelConfigHandler {
    fn command_name(&self) -> &'static str {
        COMMAND
    }

    fn definition(&self) -> CommandDefinition {
        CommandDefinition::new(COMMAND, "Set how rollers in this channel answer by default")
            .options(answer_options())
    }

    fn replay_safety(&self, action: &str) -> ReplaySafety {
        match action {
            "reset" => ReplaySafety::Idempotent,
            _ => ReplaySafety::Reapplicable,
        }
    }

    fn config_key(&self, event: &InteractionEvent) -> Option<ConfigKey> {
        Some(ConfigKey::Channel(event.channel_id))
    }

    async fn handle(
        &self,
        ctx: &HandlerContext,
        event: &InteractionEvent,
        current: Option<&CommandConfig>,
    ) -> Result<HandlerResult, HandlerError> {
        require_manager(event)?;
        if let Some(config) = current {
            if config.flavor != FlavorConfig::ChannelDefaults {
                return Err(flavor_mismatch(config));
            }
        }
        let existing = current.map(|c| c.answer).unwrap_or_default();
        let locale = &event.actor.locale;

        let (answer, policy) = match event.action() {
            _ if event.is_start() => {
                let base = ctx.clone().with_channel_defaults(Some(existing));
                (answer_config(&base, event)?, TargetMessagePolicy::CreateEphemeral)
            }
            "format" => {
                let raw = picked(event)?;
                let format = AnswerFormat::parse(raw).ok_or_else(|| {
                    HandlerError::InvalidArgument(format!("unknown answer format {raw}"))
                })?;
                (
                    AnswerFormattingConfig { format, ..existing },
                    TargetMessagePolicy::EditExisting,
                )
            }
            "interaction" => {
                let raw = picked(event)?;
                let interaction = AnswerInteraction::parse(raw).ok_or_else(|| {
                    HandlerError::InvalidArgument(format!("unknown answer interaction {raw}"))
                })?;
                (
                    AnswerFormattingConfig {
                        interaction,
                        ..existing
                    },
                    TargetMessagePolicy::EditExisting,
                )
            }
            "reset" => {
                return Ok(HandlerResult::delete(
                    Answer::text(tr(locale, Text::ChannelDefaultsRemoved)),
                    TargetMessagePolicy::EditExisting,
                ));
            }
            _ => return Err(unknown_action(event)),
        };

        let config = defaults(event, current, answer);
        Ok(HandlerResult::replace(config, panel(&answer, locale), policy))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::handler::ConfigChange;
    use crate::commands::handlers::test_support::*;
    use crate::interaction::{EventKind, RawInput};

    fn manager_slash(options: &[(&str, &str)]) -> InteractionEvent {
        let mut event = slash(COMMAND, options);
        event.actor.can_manage_channel = true;
        event
    }

    fn pick(action: &str, value: &str) -> InteractionEvent {
        let mut event = click(CustomId::new(COMMAND, action), OWNER);
        event.kind = EventKind::SelectMenu;
        event.actor.can_manage_channel = true;
        event.input = RawInput::Selection(vec![value.to_string()]);
        event
    }

    #[tokio::test]
    async fn test_start_requires_manager() {
        let event = slash(COMMAND, &[]);
        assert_eq!(
            ChannelConfigHandler
                .handle(&context(), &event, None)
                .await
                .unwrap_err(),
            HandlerError::Forbidden
        );
    }

    #[tokio::test]
    async fn test_start_creates_channel_defaults() {
        let event = manager_slash(&[("answer_format", "compact")]);
        assert_eq!(
            ChannelConfigHandler.config_key(&event),
            Some(ConfigKey::Channel(10))
        );

        let result = ChannelConfigHandler
            .handle(&context(), &event, None)
            .await
            .unwrap();
        let config = replaced(&result);
        assert_eq!(config.flavor, FlavorConfig::ChannelDefaults);
        assert_eq!(config.answer.format, AnswerFormat::Compact);
        assert_eq!(result.policy, TargetMessagePolicy::CreateEphemeral);
        // two select rows and the reset row
        assert_eq!(result.answer.rows.len(), 3);
    }

    #[tokio::test]
    async fn test_select_updates_single_field() {
        let start = ChannelConfigHandler
            .handle(&context(), &manager_slash(&[("answer_format", "minimal")]), None)
            .await
            .unwrap();
        let config = replaced(&start);

        let result = ChannelConfigHandler
            .handle(&context(), &pick("interaction", "append_new"), Some(&config))
            .await
            .unwrap();
        let next = replaced(&result);
        assert_eq!(next.answer.format, AnswerFormat::Minimal);
        assert_eq!(next.answer.interaction, AnswerInteraction::AppendNew);
        assert_eq!(result.policy, TargetMessagePolicy::EditExisting);

        assert!(matches!(
            ChannelConfigHandler
                .handle(&context(), &pick("format", "shouting"), Some(&config))
                .await,
            Err(HandlerError::InvalidArgument(_))
        ));
    }

    #[tokio::test]
    async fn test_reset_deletes_defaults() {
        let mut event = click(CustomId::new(COMMAND, "reset"), OWNER);
        event.actor.can_manage_channel = true;
        let result = ChannelConfigHandler
            .handle(&context(), &event, None)
            .await
            .unwrap();
        assert_eq!(result.config, ConfigChange::Delete);
        assert_eq!(ChannelConfigHandler.replay_safety("reset"), ReplaySafety::Idempotent);
    }
}
