//! `/fate`: four fudge dice, optionally with a modifier picked per roll
//!
//! Nothing but the button layout is stored, so rolling never writes.

use async_trait::async_trait;
use std::ops::RangeInclusive;

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
use crate::render::{format_answer, Answer, Button, ButtonStyle, ComponentRow, TargetMessagePolicy};
use crate::store::{CommandConfig, FateConfig, FateKind, FlavorConfig};

const COMMAND: &str = "fate";
const MODIFIERS: RangeInclusive<i32> = -4..=10;

pub struct FateHandler;

fn signed(modifier: i32) -> String {
    if modifier > 0 {
        format!("+{modifier}")
    } else {
        modifier.to_string()
    }
}

fn layout(fate: &FateConfig, locale: &str) -> Vec<ComponentRow> {
    let buttons = match fate.kind {
        FateKind::Simple => vec![Button::new(
            CustomId::new(COMMAND, "roll"),
            format!("{} 4dF", tr(locale, Text::Roll)),
            ButtonStyle::Primary,
        )],
        FateKind::WithModifier => MODIFIERS
            .map(|m| {
                Button::new(
                    CustomId::new(COMMAND, "roll").with_param(m),
                    signed(m),
                    ButtonStyle::Primary,
                )
            })
            .collect(),
    };
    Answer::default()
        .with_button_grid(buttons, 5)
        .with_button_row(vec![clear_button(COMMAND, locale)])
        .rows
}

fn symbol(value: i64) -> &'static str {
    match value {
        v if v < 0 => "−",
        0 => "▢",
        _ => "＋",
    }
}

#[async_trait]
impl CommandHandler for FateHandler {
    fn command_name(&self) -> &'static str {
        COMMAND
    }

    fn definition(&self) -> CommandDefinition {
        CommandDefinition::new(COMMAND, "Roll four fate dice")
            .option(
                OptionDefinition::string("type", "Plain 4dF or one button per modifier")
                    .required()
                    .choices(&[FateKind::Simple.as_str(), FateKind::WithModifier.as_str()]),
            )
            .options(answer_options())
    }

    fn replay_safety(&self, _action: &str) -> ReplaySafety {
        ReplaySafety::Idempotent
    }

    async fn handle(
        &self,
        ctx: &HandlerContext,
        event: &InteractionEvent,
        current: Option<&CommandConfig>,
    ) -> Result<HandlerResult, HandlerError> {
        if event.is_start() {
            let raw = required_option(event, "type")?;
            let kind = FateKind::parse(raw)
                .ok_or_else(|| HandlerError::InvalidArgument(format!("unknown fate type {raw}")))?;
            let fate = FateConfig { kind };
            let config = CommandConfig::new(
                COMMAND,
                event.actor.id,
                event.actor.locale.clone(),
                answer_config(ctx, event)?,
                FlavorConfig::Fate(fate.clone()),
            );
            let answer = Answer::text(format!("{}: 4dF", tr(&config.locale, Text::ClickToRoll)))
                .with_rows(layout(&fate, &config.locale));
            return Ok(HandlerResult::replace(
                config,
                answer,
                TargetMessagePolicy::CreateNew,
            ));
        }

        let config = require_config(current)?;
        let FlavorConfig::Fate(fate) = &config.flavor else {
            return Err(flavor_mismatch(config));
        };

        match event.action() {
            "roll" => {
                let modifier = match (fate.kind, event.custom_id.param(0)) {
                    (FateKind::Simple, None) => 0,
                    (FateKind::WithModifier, Some(raw)) => raw
                        .parse::<i32>()
                        .ok()
                        .filter(|m| MODIFIERS.contains(m))
                        .ok_or_else(|| HandlerError::InvalidArgument("unknown modifier".into()))?,
                    _ => return Err(HandlerError::InvalidArgument("unknown modifier".into())),
                };

                let result = ctx.dice.roll("4d3").await?;
                let faces: Vec<i64> = result.values().iter().map(|&v| i64::from(v) - 2).collect();
                let sum: i64 = faces.iter().sum();
                let title = if modifier == 0 {
                    format!("4dF ⇒ {sum}")
                } else {
                    format!("4dF {} ⇒ {}", signed(modifier), sum + i64::from(modifier))
                };
                let details = format!(
                    "[{}]",
                    faces.iter().map(|&f| symbol(f)).collect::<Vec<_>>().join(", ")
                );

                let answer = format_answer(&title, None, &details, config.answer.format);
                let (answer, policy) = place_roll(
                    event,
                    config.answer.interaction,
                    answer,
                    layout(fate, &config.locale),
                );
                Ok(HandlerResult::unchanged(answer, policy))
            }
            "clear" => clear_roller(event, config),
            _ => Err(unknown_action(event)),
        }
    }
}
