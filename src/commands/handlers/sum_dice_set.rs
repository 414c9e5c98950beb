//! `/sum_dice_set`: build a set of d4 to d20 dice and a modifier, then roll
//! it as one sum
//!
//! Counts are clamped to ±100 per die; edits that push the set past the dice
//! limits are refused.

use async_trait::async_trait;

use super::{
    answer_config, answer_options, flavor_mismatch, place_stateful_roll, require_config,
    unknown_action,
};
use crate::commands::context::HandlerContext;
use crate::commands::definition::CommandDefinition;
use crate::commands::handler::{CommandHandler, HandlerResult, ReplaySafety};
use crate::core::error::HandlerError;
use crate::core::i18n::{tr, Text};
use crate::interaction::{CustomId, InteractionEvent};
use crate::render::{roll_answer, Answer, Button, ButtonStyle, TargetMessagePolicy};
use crate::store::{CommandConfig, FlavorConfig, SumDiceSetConfig};

const COMMAND: &str = "sum_dice_set";
const MAX_COUNT: i32 = 100;
const DICE: [u32; 6] = [4, 6, 8, 10, 12, 20];
const MODIFIER_STEPS: [i32; 5] = [1, -1, 5, -5, 10];

pub struct SumDiceSetHandler;

/// `2d6-1d4+3`, dice ordered by sides, modifier last
fn expression(set: &SumDiceSetConfig) -> String {
    let mut terms: Vec<String> = set
        .dice
        .iter()
        .map(|(sides, count)| format!("{count:+}d{sides}"))
        .collect();
    if set.modifier != 0 {
        terms.push(format!("{:+}", set.modifier));
    }
    let joined = terms.concat();
    joined.strip_prefix('+').unwrap_or(&joined).to_string()
}

fn clamp(count: i32) -> i32 {
    count.clamp(-MAX_COUNT, MAX_COUNT)
}

fn die_buttons(sides: u32) -> [Button; 2] {
    [1, -1].map(|delta: i32| {
        Button::new(
            CustomId::new(COMMAND, "add").with_param(sides).with_param(delta),
            format!("{delta:+}d{sides}"),
            ButtonStyle::Secondary,
        )
    })
}

fn layout(answer: Answer, locale: &str) -> Answer {
    let mut rows: Vec<Vec<Button>> = DICE
        .chunks(2)
        .map(|pair| pair.iter().flat_map(|&sides| die_buttons(sides)).collect())
        .collect();
    rows[0].push(Button::new(
        CustomId::new(COMMAND, "double"),
        "x2",
        ButtonStyle::Primary,
    ));
    rows[1].push(Button::new(
        CustomId::new(COMMAND, "clear"),
        tr(locale, Text::Clear),
        ButtonStyle::Danger,
    ));
    rows[2].push(Button::new(
        CustomId::new(COMMAND, "roll"),
        tr(locale, Text::Roll),
        ButtonStyle::Success,
    ));
    rows.push(
        MODIFIER_STEPS
            .iter()
            .map(|&step| {
                Button::new(
                    CustomId::new(COMMAND, "modifier").with_param(step),
                    format!("{step:+}"),
                    ButtonStyle::Secondary,
                )
            })
            .collect(),
    );
    rows.into_iter().fold(answer, Answer::with_button_row)
}

fn overview(config: &CommandConfig, set: &SumDiceSetConfig) -> Answer {
    let text = if set.is_empty() {
        tr(&config.locale, Text::ClickToAdd).to_string()
    } else {
        format!("`{}`", expression(set))
    };
    layout(Answer::text(text), &config.locale)
}

fn with_set(config: &CommandConfig, set: SumDiceSetConfig) -> CommandConfig {
    let mut next = config.clone();
    next.flavor = FlavorConfig::SumDiceSet(set);
    next
}

fn param<T: std::str::FromStr>(event: &InteractionEvent, index: usize) -> Result<T, HandlerError> {
    event
        .custom_id
        .param(index)
        .and_then(|p| p.parse().ok())
        .ok_or_else(|| HandlerError::InvalidArgument("malformed dice set button".into()))
}

#[async_trait]
impl CommandHandler for SumDiceSetHandler {
    fn command_name(&self) -> &'static str {
        COMMAND
    }

    fn definition(&self) -> CommandDefinition {
        CommandDefinition::new(COMMAND, "Configure a variable set of d4 to d20 dice")
            .options(answer_options())
    }

    fn replay_safety(&self, action: &str) -> ReplaySafety {
        match action {
            "roll" => ReplaySafety::Exclusive,
            _ => ReplaySafety::Reapplicable,
        }
    }

    async fn handle(
        &self,
        ctx: &HandlerContext,
        event: &InteractionEvent,
        current: Option<&CommandConfig>,
    ) -> Result<HandlerResult, HandlerError> {
        if event.is_start() {
            let set = SumDiceSetConfig::default();
            let config = CommandConfig::new(
                COMMAND,
                event.actor.id,
                event.actor.locale.clone(),
                answer_config(ctx, event)?,
                FlavorConfig::SumDiceSet(set.clone()),
            );
            let answer = overview(&config, &set);
            return Ok(HandlerResult::replace(
                config,
                answer,
                TargetMessagePolicy::CreateNew,
            ));
        }

        let config = require_config(current)?;
        let FlavorConfig::SumDiceSet(set) = &config.flavor else {
            return Err(flavor_mismatch(config));
        };

        let next_set = match event.action() {
            "add" => {
                let sides: u32 = param(event, 0)?;
                let delta: i32 = param(event, 1)?;
                if !DICE.contains(&sides) || delta.abs() != 1 {
                    return Err(HandlerError::InvalidArgument("unknown die".into()));
                }
                let mut next = set.clone();
                let count = clamp(next.dice.get(&sides).copied().unwrap_or(0) + delta);
                if count == 0 {
                    next.dice.remove(&sides);
                } else {
                    next.dice.insert(sides, count);
                }
                next
            }
            "modifier" => {
                let step: i32 = param(event, 0)?;
                if !MODIFIER_STEPS.contains(&step) {
                    return Err(HandlerError::InvalidArgument("unknown modifier".into()));
                }
                SumDiceSetConfig {
                    modifier: clamp(set.modifier + step),
                    ..set.clone()
                }
            }
            "double" => SumDiceSetConfig {
                dice: set
                    .dice
                    .iter()
                    .map(|(&sides, &count)| (sides, clamp(count * 2)))
                    .collect(),
                modifier: clamp(set.modifier * 2),
            },
            "clear" => SumDiceSetConfig::default(),
            "roll" => {
                if set.is_empty() {
                    return Err(HandlerError::InvalidArgument(
                        "add some dice before rolling".into(),
                    ));
                }
                let result = ctx.dice.roll(&expression(set)).await?;
                let next = with_set(config, SumDiceSetConfig::default());
                let (answer, policy) = place_stateful_roll(
                    next.answer.interaction,
                    roll_answer(None, &result, next.answer.format),
                    overview(&next, &SumDiceSetConfig::default()),
                );
                return Ok(HandlerResult::replace(next, answer, policy));
            }
            _ => return Err(unknown_action(event)),
        };

        if !next_set.is_empty() {
            ctx.dice.check_limits(&expression(&next_set))?;
        }
        let next = with_set(config, next_set.clone());
        let answer = overview(&next, &next_set);
        Ok(HandlerResult::replace(
            next,
            answer,
            TargetMessagePolicy::EditExisting,
        ))
    }
}
