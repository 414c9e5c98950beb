//! `/hold_reroll`: roll a pool, hold some dice, reroll the rest
//!
//! The table (current dice, holds, reroll counter) lives in the stored
//! config, so every action here writes and always edits its own message.

use async_trait::async_trait;

use super::{flavor_mismatch, integer_option, require_config, set_option, unknown_action};
use crate::commands::context::HandlerContext;
use crate::commands::definition::{CommandDefinition, OptionDefinition};
use crate::commands::handler::{CommandHandler, HandlerResult, ReplaySafety};
use crate::core::error::HandlerError;
use crate::core::i18n::{tr, Text};
use crate::interaction::{CustomId, InteractionEvent};
use crate::render::{mark_values, Answer, Button, ButtonStyle, TargetMessagePolicy};
use crate::store::{
    AnswerFormattingConfig, CommandConfig, FlavorConfig, HoldRerollConfig, HoldRerollState,
};

const COMMAND: &str = "hold_reroll";
const MAX_POOL: usize = 15;

pub struct HoldRerollHandler;

fn render(config: &CommandConfig, hold: &HoldRerollConfig, headline: Option<String>) -> Answer {
    let locale = &config.locale;
    let state = &hold.state;

    if state.current.is_empty() {
        let buttons = (1..=MAX_POOL)
            .map(|n| {
                Button::new(
                    CustomId::new(COMMAND, "roll").with_param(n),
                    format!("{n}d{}", hold.sides),
                    ButtonStyle::Primary,
                )
            })
            .collect();
        let text = headline.unwrap_or_else(|| tr(locale, Text::ClickToRoll).to_string());
        return Answer::text(text).with_button_grid(buttons, 5);
    }

    let dice = mark_values(&state.current, |_, v| hold.success_set.contains(&v));
    let text = format!(
        "{}d{}: {dice}\n{}: {}",
        state.current.len(),
        hold.sides,
        tr(locale, Text::Rerolls),
        state.reroll_count
    );
    let toggles = state
        .current
        .iter()
        .enumerate()
        .map(|(i, value)| {
            let style = if state.held.contains(&i) {
                ButtonStyle::Success
            } else {
                ButtonStyle::Secondary
            };
            Button::new(CustomId::new(COMMAND, "hold").with_param(i), value.to_string(), style)
        })
        .collect();

    Answer::text(text)
        .with_button_grid(toggles, 5)
        .with_button_row(vec![
            Button::new(
                CustomId::new(COMMAND, "reroll"),
                tr(locale, Text::Reroll),
                ButtonStyle::Primary,
            ),
            Button::new(
                CustomId::new(COMMAND, "finish"),
                tr(locale, Text::Finish),
                ButtonStyle::Success,
            ),
            Button::new(
                CustomId::new(COMMAND, "clear"),
                tr(locale, Text::Clear),
                ButtonStyle::Danger,
            ),
        ])
}

fn summary(config: &CommandConfig, hold: &HoldRerollConfig) -> String {
    let locale = &config.locale;
    let state = &hold.state;
    let successes = state
        .current
        .iter()
        .filter(|&&v| hold.success_set.contains(&v))
        .count();
    let failures = state
        .current
        .iter()
        .filter(|&&v| hold.failure_set.contains(&v))
        .count();
    format!(
        "**{}: {successes}** | {}: {failures} | {}: {}\n{}",
        tr(locale, Text::Successes),
        tr(locale, Text::Failures),
        tr(locale, Text::Rerolls),
        state.reroll_count,
        mark_values(&state.current, |_, v| hold.success_set.contains(&v)),
    )
}

fn with_state(config: &CommandConfig, hold: &HoldRerollConfig, state: HoldRerollState) -> (CommandConfig, HoldRerollConfig) {
    let mut hold = hold.clone();
    hold.state = state;
    let mut next = config.clone();
    next.flavor = FlavorConfig::HoldReroll(hold.clone());
    (next, hold)
}

fn edited(config: CommandConfig, hold: &HoldRerollConfig, headline: Option<String>) -> HandlerResult {
    let answer = render(&config, hold, headline);
    HandlerResult::replace(config, answer, TargetMessagePolicy::EditExisting)
}

#[async_trait]
impl CommandHandler for HoldRerollHandler {
    fn command_name(&self) -> &'static str {
        COMMAND
    }

    fn definition(&self) -> CommandDefinition {
        CommandDefinition::new(COMMAND, "Roll a pool, hold dice and reroll the rest")
            .option(
                OptionDefinition::integer("dice_sides", "Sides of each die")
                    .required()
                    .range(2, 1000),
            )
            .option(OptionDefinition::string(
                "reroll_set",
                "Values that may be rerolled, comma separated (default: all)",
            ))
            .option(OptionDefinition::string(
                "success_set",
                "Values counted as successes, comma separated",
            ))
            .option(OptionDefinition::string(
                "failure_set",
                "Values counted as failures, comma separated",
            ))
    }

    fn replay_safety(&self, action: &str) -> ReplaySafety {
        match action {
            "finish" => ReplaySafety::Exclusive,
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
            let sides = integer_option(event, "dice_sides", 2..=1000)?
                .ok_or_else(|| HandlerError::InvalidArgument("missing option dice_sides".into()))?;
            ctx.dice.check_limits(&format!("{MAX_POOL}d{sides}"))?;
            let hold = HoldRerollConfig {
                sides,
                reroll_set: set_option(event, "reroll_set", sides)?,
                success_set: set_option(event, "success_set", sides)?,
                failure_set: set_option(event, "failure_set", sides)?,
                state: HoldRerollState::default(),
            };
            let config = CommandConfig::new(
                COMMAND,
                event.actor.id,
                event.actor.locale.clone(),
                AnswerFormattingConfig::default(),
                FlavorConfig::HoldReroll(hold.clone()),
            );
            let answer = render(&config, &hold, None);
            return Ok(HandlerResult::replace(
                config,
                answer,
                TargetMessagePolicy::CreateNew,
            ));
        }

        let config = require_config(current)?;
        let FlavorConfig::HoldReroll(hold) = &config.flavor else {
            return Err(flavor_mismatch(config));
        };
        let state = &hold.state;
        let needs_dice = || {
            if state.current.is_empty() {
                Err(HandlerError::InvalidArgument("roll some dice first".into()))
            } else {
                Ok(())
            }
        };

        match event.action() {
            "roll" => {
                let count = event
                    .numeric_param(0)
                    .filter(|n| (1..=MAX_POOL).contains(n))
                    .ok_or_else(|| HandlerError::InvalidArgument("unknown dice pool".into()))?;
                let result = ctx
                    .dice
                    .evaluate(
                        "{count}d{sides}",
                        &[("count", count.to_string()), ("sides", hold.sides.to_string())],
                    )
                    .await?;
                let (next, hold) = with_state(
                    config,
                    hold,
                    HoldRerollState {
                        current: result.values(),
                        ..HoldRerollState::default()
                    },
                );
                Ok(edited(next, &hold, None))
            }
            "hold" => {
                needs_dice()?;
                let index = event
                    .numeric_param(0)
                    .filter(|&i| i < state.current.len())
                    .ok_or_else(|| HandlerError::InvalidArgument("unknown die".into()))?;
                let mut toggled = state.clone();
                if !toggled.held.remove(&index) {
                    toggled.held.insert(index);
                }
                let (next, hold) = with_state(config, hold, toggled);
                Ok(edited(next, &hold, None))
            }
            "reroll" => {
                needs_dice()?;
                let targets: Vec<usize> = state
                    .current
                    .iter()
                    .enumerate()
                    .filter(|&(i, &v)| {
                        !state.held.contains(&i)
                            && (hold.reroll_set.is_empty() || hold.reroll_set.contains(&v))
                    })
                    .map(|(i, _)| i)
                    .collect();
                if targets.is_empty() {
                    return Err(HandlerError::InvalidArgument("no dice left to reroll".into()));
                }
                let result = ctx
                    .dice
                    .evaluate(
                        "{count}d{sides}",
                        &[("count", targets.len().to_string()), ("sides", hold.sides.to_string())],
                    )
                    .await?;

                let mut rerolled = state.clone();
                for (index, value) in targets.into_iter().zip(result.values()) {
                    rerolled.current[index] = value;
                }
                rerolled.reroll_count += 1;
                let (next, hold) = with_state(config, hold, rerolled);
                Ok(edited(next, &hold, None))
            }
            "finish" => {
                needs_dice()?;
                let headline = summary(config, hold);
                let (next, hold) = with_state(config, hold, HoldRerollState::default());
                Ok(edited(next, &hold, Some(headline)))
            }
            "clear" => {
                let (next, hold) = with_state(config, hold, HoldRerollState::default());
                Ok(edited(next, &hold, None))
            }
            _ => Err(unknown_action(event)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::handlers::test_support::*;

    async fn rolled(count: usize) -> CommandConfig {
        let (config, _) = start(
            &HoldRerollHandler,
            &[("dice_sides", "6"), ("success_set", "5,6"), ("failure_set", "1")],
        )
        .await;
        let event = click(CustomId::new(COMMAND, "roll").with_param(count), OWNER);
        let result = HoldRerollHandler
            .handle(&context(), &event, Some(&config))
            .await
            .unwrap();
        replaced(&result)
    }

    fn table(config: &CommandConfig) -> &HoldRerollState {
        match &config.flavor {
            FlavorConfig::HoldReroll(hold) => &hold.state,
            _ => panic!("wrong flavor"),
        }
    }

    #[tokio::test]
    async fn test_start_validates_sets() {
        let bad = slash(COMMAND, &[("dice_sides", "6"), ("success_set", "5,7")]);
        assert!(matches!(
            HoldRerollHandler.handle(&context(), &bad, None).await,
            Err(HandlerError::InvalidArgument(_))
        ));

        let (_, result) = start(&HoldRerollHandler, &[("dice_sides", "10")]).await;
        // 15 pool buttons, three rows
        assert_eq!(result.answer.rows.len(), 3);
    }

    #[tokio::test]
    async fn test_roll_fills_table() {
        let config = rolled(5).await;
        let state = table(&config);
        assert_eq!(state.current.len(), 5);
        assert!(state.held.is_empty());
        assert!(state.current.iter().all(|v| (1..=6).contains(v)));
    }

    #[tokio::test]
    async fn test_hold_toggle_is_an_involution() {
        let config = rolled(4).await;
        let event = click(CustomId::new(COMMAND, "hold").with_param(2), STRANGER);

        let once = replaced(
            &HoldRerollHandler
                .handle(&context(), &event, Some(&config))
                .await
                .unwrap(),
        );
        assert!(table(&once).held.contains(&2));

        let twice = replaced(
            &HoldRerollHandler
                .handle(&context(), &event, Some(&once))
                .await
                .unwrap(),
        );
        assert_eq!(twice, config);
    }

    #[tokio::test]
    async fn test_reroll_keeps_held_dice() {
        let config = rolled(5).await;
        let hold_first = click(CustomId::new(COMMAND, "hold").with_param(0), OWNER);
        let held = replaced(
            &HoldRerollHandler
                .handle(&context(), &hold_first, Some(&config))
                .await
                .unwrap(),
        );

        let reroll = click(CustomId::new(COMMAND, "reroll"), OWNER);
        let after = replaced(
            &HoldRerollHandler
                .handle(&context(), &reroll, Some(&held))
                .await
                .unwrap(),
        );
        assert_eq!(table(&after).current[0], table(&held).current[0]);
        assert_eq!(table(&after).reroll_count, 1);
        assert!(table(&after).held.contains(&0));
    }

    #[tokio::test]
    async fn test_hold_out_of_range_and_without_dice() {
        let (fresh, _) = start(&HoldRerollHandler, &[("dice_sides", "6")]).await;
        let event = click(CustomId::new(COMMAND, "hold").with_param(0), OWNER);
        assert!(matches!(
            HoldRerollHandler.handle(&context(), &event, Some(&fresh)).await,
            Err(HandlerError::InvalidArgument(_))
        ));

        let config = rolled(2).await;
        let event = click(CustomId::new(COMMAND, "hold").with_param(7), OWNER);
        assert!(matches!(
            HoldRerollHandler.handle(&context(), &event, Some(&config)).await,
            Err(HandlerError::InvalidArgument(_))
        ));
    }

    #[tokio::test]
    async fn test_finish_summarises_and_resets() {
        let config = rolled(6).await;
        let event = click(CustomId::new(COMMAND, "finish"), OWNER);
        let result = HoldRerollHandler
            .handle(&context(), &event, Some(&config))
            .await
            .unwrap();
        let next = replaced(&result);
        assert_eq!(table(&next), &HoldRerollState::default());
        assert!(result.answer.content.unwrap().contains("Successes"));
        assert_eq!(result.policy, TargetMessagePolicy::EditExisting);
        assert_eq!(HoldRerollHandler.replay_safety("finish"), ReplaySafety::Exclusive);
        assert_eq!(HoldRerollHandler.replay_safety("hold"), ReplaySafety::Reapplicable);
    }
}
