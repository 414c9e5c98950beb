//! `/count_successes`: dice pools counted against a target number

use async_trait::async_trait;

use super::{
    answer_config, answer_options, clear_button, clear_roller, flavor_mismatch, integer_option,
    place_roll, require_config, unknown_action,
};
use crate::commands::context::HandlerContext;
use crate::commands::definition::{CommandDefinition, OptionDefinition};
use crate::commands::handler::{CommandHandler, HandlerResult, ReplaySafety};
use crate::core::error::HandlerError;
use crate::core::i18n::{tr, Text};
use crate::interaction::{CustomId, InteractionEvent};
use crate::render::{
    format_answer, mark_values, Answer, Button, ButtonStyle, ComponentRow, TargetMessagePolicy,
};
use crate::store::{CommandConfig, CountSuccessesConfig, FlavorConfig, GlitchOption};

const COMMAND: &str = "count_successes";
const DEFAULT_MAX_DICE: u32 = 15;
/// Four rows of pool buttons, the fifth row holds `clear`
const MAX_POOL_DICE: u32 = 20;

pub struct CountSuccessesHandler;

fn layout(dice: &CountSuccessesConfig, locale: &str) -> Vec<ComponentRow> {
    let buttons = (1..=dice.max_dice.min(MAX_POOL_DICE))
        .map(|n| {
            Button::new(
                CustomId::new(COMMAND, "roll").with_param(n),
                format!("{n}d{}", dice.sides),
                ButtonStyle::Primary,
            )
        })
        .collect();
    Answer::default()
        .with_button_grid(buttons, 5)
        .with_button_row(vec![clear_button(COMMAND, locale)])
        .rows
}

/// Score a pool; returns the success count and notes about ones
fn score(values: &[u32], dice: &CountSuccessesConfig, locale: &str) -> (i64, Vec<String>) {
    let successes = values.iter().filter(|&&v| v >= dice.target).count() as i64;
    let ones = values.iter().filter(|&&v| v == 1).count() as i64;
    let mut notes = Vec::new();
    let total = match dice.glitch {
        GlitchOption::NoGlitch => successes,
        GlitchOption::HalfDiceOne => {
            if ones * 2 > values.len() as i64 {
                notes.push(format!("**{}**", tr(locale, Text::Glitch)));
            }
            successes
        }
        GlitchOption::CountOnes => {
            notes.push(format!("{}: {ones}", tr(locale, Text::Ones)));
            successes
        }
        GlitchOption::SubtractOnes => successes - ones,
    };
    (total, notes)
}

#[async_trait]
impl CommandHandler for CountSuccessesHandler {
    fn command_name(&self) -> &'static str {
        COMMAND
    }

    fn definition(&self) -> CommandDefinition {
        CommandDefinition::new(COMMAND, "Roll dice pools and count successes")
            .option(
                OptionDefinition::integer("dice_sides", "Sides of each die")
                    .required()
                    .range(2, 1000),
            )
            .option(
                OptionDefinition::integer("target_number", "Minimum value of a success")
                    .required()
                    .range(1, 1000),
            )
            .option(OptionDefinition::string("glitch", "How ones are treated").choices(&[
                GlitchOption::NoGlitch.as_str(),
                GlitchOption::HalfDiceOne.as_str(),
                GlitchOption::CountOnes.as_str(),
                GlitchOption::SubtractOnes.as_str(),
            ]))
            .option(
                OptionDefinition::integer("max_dice", "Largest pool offered as a button")
                    .range(1, i64::from(MAX_POOL_DICE)),
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
            let missing = |name: &str| HandlerError::InvalidArgument(format!("missing option {name}"));
            let glitch = match event.input.option("glitch") {
                None => GlitchOption::default(),
                Some(raw) => GlitchOption::parse(raw).ok_or_else(|| {
                    HandlerError::InvalidArgument(format!("unknown glitch option {raw}"))
                })?,
            };
            let dice = CountSuccessesConfig {
                sides: integer_option(event, "dice_sides", 2..=1000)?
                    .ok_or_else(|| missing("dice_sides"))?,
                target: integer_option(event, "target_number", 1..=1000)?
                    .ok_or_else(|| missing("target_number"))?,
                glitch,
                max_dice: integer_option(event, "max_dice", 1..=MAX_POOL_DICE)?.unwrap_or(DEFAULT_MAX_DICE),
            };
            ctx.dice.check_limits(&format!("{}d{}", dice.max_dice, dice.sides))?;

            let config = CommandConfig::new(
                COMMAND,
                event.actor.id,
                event.actor.locale.clone(),
                answer_config(ctx, event)?,
                FlavorConfig::CountSuccesses(dice.clone()),
            );
            let answer = Answer::text(format!(
                "{}: d{} ≥ {}",
                tr(&config.locale, Text::ClickToRoll),
                dice.sides,
                dice.target
            ))
            .with_rows(layout(&dice, &config.locale));
            return Ok(HandlerResult::replace(
                config,
                answer,
                TargetMessagePolicy::CreateNew,
            ));
        }

        let config = require_config(current)?;
        let FlavorConfig::CountSuccesses(dice) = &config.flavor else {
            return Err(flavor_mismatch(config));
        };

        match event.action() {
            "roll" => {
                let count = event
                    .numeric_param(0)
                    .filter(|&n| n >= 1 && n <= dice.max_dice as usize)
                    .ok_or_else(|| HandlerError::InvalidArgument("unknown dice pool".into()))?;
                let result = ctx
                    .dice
                    .evaluate(
                        "{count}d{sides}",
                        &[("count", count.to_string()), ("sides", dice.sides.to_string())],
                    )
                    .await?;

                let mut values = result.values();
                values.sort_unstable_by(|a, b| b.cmp(a));
                let (total, notes) = score(&values, dice, &config.locale);
                let title = format!(
                    "{} ⇒ {total} {}",
                    result.expression,
                    tr(&config.locale, Text::Successes)
                );
                let mut details = mark_values(&values, |_, v| v >= dice.target);
                for note in notes {
                    details.push(' ');
                    details.push_str(&note);
                }

                let answer = format_answer(
                    &title,
                    Some(&format!("{} ≥ {}", result.expression, dice.target)),
                    &details,
                    config.answer.format,
                );
                let (answer, policy) = place_roll(
                    event,
                    config.answer.interaction,
                    answer,
                    layout(dice, &config.locale),
                );
                Ok(HandlerResult::unchanged(answer, policy))
            }
            "clear" => clear_roller(event, config),
            _ => Err(unknown_action(event)),
        }
    }
}
