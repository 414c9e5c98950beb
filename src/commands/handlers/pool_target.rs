//! `/pool_target`: pick a pool, then a target number, and count successes
//!
//! Dice showing a value of the reroll set are rolled again and added to the
//! pool, for at most ten rounds. With the `ask` variant the roller asks
//! before rerolling. Values of the botch set cancel one success each.

use async_trait::async_trait;

use super::{
    answer_config, answer_options, clear_button, flavor_mismatch, integer_option,
    place_stateful_roll, require_config, set_option, unknown_action,
};
use crate::commands::context::HandlerContext;
use crate::commands::definition::{CommandDefinition, OptionDefinition};
use crate::commands::handler::{CommandHandler, HandlerResult, ReplaySafety};
use crate::core::error::HandlerError;
use crate::core::i18n::{tr, Text};
use crate::interaction::{CustomId, InteractionEvent};
use crate::render::{format_answer, mark_values, Answer, Button, ButtonStyle, TargetMessagePolicy};
use crate::store::{
    CommandConfig, FlavorConfig, PoolTargetConfig, PoolTargetState, RerollVariant,
};

const COMMAND: &str = "pool_target";
const MAX_SIDES: u32 = 25;
const MAX_POOL: u32 = 25;
const DEFAULT_MAX_DICE: u32 = 10;
const MAX_REROLL_ROUNDS: usize = 10;

pub struct PoolTargetHandler;

fn joined(values: impl IntoIterator<Item = u32>) -> String {
    values
        .into_iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join(",")
}

/// ` (always reroll:10, botch:1)`, empty without special sets
fn description(pool: &PoolTargetConfig) -> String {
    let mut parts = Vec::new();
    if !pool.reroll_set.is_empty() {
        parts.push(format!(
            "{} reroll:{}",
            pool.reroll_variant.as_str(),
            joined(pool.reroll_set.iter().copied())
        ));
    }
    if !pool.botch_set.is_empty() {
        parts.push(format!("botch:{}", joined(pool.botch_set.iter().copied())));
    }
    if parts.is_empty() {
        String::new()
    } else {
        format!(" ({})", parts.join(", "))
    }
}

fn screen(config: &CommandConfig, pool: &PoolTargetConfig) -> Answer {
    let locale = &config.locale;
    let sides = pool.sides;
    match (pool.state.pool, pool.state.target) {
        (None, _) => {
            let buttons = (1..=pool.max_dice)
                .map(|n| {
                    Button::new(
                        CustomId::new(COMMAND, "pool").with_param(n),
                        format!("{n}d{sides}"),
                        ButtonStyle::Primary,
                    )
                })
                .collect();
            Answer::text(format!("{}{}", tr(locale, Text::ClickToRoll), description(pool)))
                .with_button_grid(buttons, 5)
        }
        (Some(dice), None) => {
            let mut buttons: Vec<Button> = (2..=sides)
                .map(|t| {
                    Button::new(
                        CustomId::new(COMMAND, "target").with_param(t),
                        t.to_string(),
                        ButtonStyle::Primary,
                    )
                })
                .collect();
            buttons.push(clear_button(COMMAND, locale));
            Answer::text(format!(
                "{}: {dice}d{sides}{}",
                tr(locale, Text::PickTarget),
                description(pool)
            ))
            .with_button_grid(buttons, 5)
        }
        (Some(dice), Some(target)) => Answer::text(format!(
            "{} ({})? {dice}d{sides} ≥{target}",
            tr(locale, Text::AskReroll),
            joined(pool.reroll_set.iter().copied())
        ))
        .with_button_row(vec![
            Button::new(
                CustomId::new(COMMAND, "reroll"),
                tr(locale, Text::Reroll),
                ButtonStyle::Primary,
            ),
            Button::new(
                CustomId::new(COMMAND, "no_reroll"),
                tr(locale, Text::NoReroll),
                ButtonStyle::Secondary,
            ),
            clear_button(COMMAND, locale),
        ]),
    }
}

fn with_state(config: &CommandConfig, pool: &PoolTargetConfig, state: PoolTargetState) -> (CommandConfig, PoolTargetConfig) {
    let mut pool = pool.clone();
    pool.state = state;
    let mut next = config.clone();
    next.flavor = FlavorConfig::PoolTarget(pool.clone());
    (next, pool)
}

fn edited(config: CommandConfig, pool: &PoolTargetConfig) -> HandlerResult {
    let answer = screen(&config, pool);
    HandlerResult::replace(config, answer, TargetMessagePolicy::EditExisting)
}

/// Successes minus botches
fn score(values: &[u32], target: u32, pool: &PoolTargetConfig) -> (i64, i64) {
    let successes = values.iter().filter(|&&v| v >= target).count() as i64;
    let botches = values.iter().filter(|v| pool.botch_set.contains(v)).count() as i64;
    (successes - botches, botches)
}

impl PoolTargetHandler {
    async fn roll_pool(
        ctx: &HandlerContext,
        count: usize,
        sides: u32,
    ) -> Result<Vec<u32>, HandlerError> {
        let result = ctx
            .dice
            .evaluate(
                "{count}d{sides}",
                &[("count", count.to_string()), ("sides", sides.to_string())],
            )
            .await?;
        Ok(result.values())
    }

    async fn roll(
        ctx: &HandlerContext,
        config: &CommandConfig,
        pool: &PoolTargetConfig,
        dice: u32,
        target: u32,
        do_reroll: bool,
    ) -> Result<HandlerResult, HandlerError> {
        let mut values = Self::roll_pool(ctx, dice as usize, pool.sides).await?;
        if do_reroll {
            let mut batch = values.clone();
            for _ in 0..MAX_REROLL_ROUNDS {
                let again = batch.iter().filter(|v| pool.reroll_set.contains(v)).count();
                if again == 0 {
                    break;
                }
                batch = Self::roll_pool(ctx, again, pool.sides).await?;
                values.extend_from_slice(&batch);
            }
        }
        values.sort_unstable_by(|a, b| b.cmp(a));

        let locale = &config.locale;
        let (total, botches) = score(&values, target, pool);
        let title = format!("{dice}d{} ⇒ {total} {}", pool.sides, tr(locale, Text::Successes));
        let mut details = mark_values(&values, |_, v| {
            v >= target
                || pool.botch_set.contains(&v)
                || (do_reroll && pool.reroll_set.contains(&v))
        });
        if botches > 0 {
            details.push_str(&format!(" {}: {botches}", tr(locale, Text::Botches)));
        }
        let expression = format!("{dice}d{} ≥{target}", pool.sides);

        let (next, pool) = with_state(config, pool, PoolTargetState::default());
        let (answer, policy) = place_stateful_roll(
            next.answer.interaction,
            format_answer(&title, Some(&expression), &details, next.answer.format),
            screen(&next, &pool),
        );
        Ok(HandlerResult::replace(next, answer, policy))
    }
}

#[async_trait]
impl CommandHandler for PoolTargetHandler {
    fn command_name(&self) -> &'static str {
        COMMAND
    }

    fn definition(&self) -> CommandDefinition {
        CommandDefinition::new(COMMAND, "Roll a dice pool against a target number")
            .option(
                OptionDefinition::integer("dice_sides", "Sides of each die")
                    .required()
                    .range(2, i64::from(MAX_SIDES)),
            )
            .option(
                OptionDefinition::integer("max_dice", "Largest pool offered as a button")
                    .range(1, i64::from(MAX_POOL)),
            )
            .option(OptionDefinition::string(
                "reroll_set",
                "Values that are rolled again, comma separated",
            ))
            .option(OptionDefinition::string(
                "botch_set",
                "Values that cancel a success, comma separated",
            ))
            .option(
                OptionDefinition::string("reroll_variant", "Reroll right away or ask first")
                    .choices(&[RerollVariant::Always.as_str(), RerollVariant::Ask.as_str()]),
            )
            .options(answer_options())
    }

    fn replay_safety(&self, action: &str) -> ReplaySafety {
        match action {
            // these roll based on the choices the user saw
            "target" | "reroll" | "no_reroll" => ReplaySafety::Exclusive,
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
            let sides = integer_option(event, "dice_sides", 2..=MAX_SIDES)?
                .ok_or_else(|| HandlerError::InvalidArgument("missing option dice_sides".into()))?;
            let reroll_variant = match event.input.option("reroll_variant") {
                None => RerollVariant::default(),
                Some(raw) => RerollVariant::parse(raw).ok_or_else(|| {
                    HandlerError::InvalidArgument(format!("unknown reroll variant {raw}"))
                })?,
            };
            let pool = PoolTargetConfig {
                sides,
                max_dice: integer_option(event, "max_dice", 1..=MAX_POOL)?
                    .unwrap_or(DEFAULT_MAX_DICE),
                reroll_set: set_option(event, "reroll_set", sides)?,
                botch_set: set_option(event, "botch_set", sides)?,
                reroll_variant,
                state: PoolTargetState::default(),
            };
            if pool.reroll_set.len() >= sides as usize {
                return Err(HandlerError::InvalidArgument(
                    "the reroll set must not contain every value of the die".into(),
                ));
            }
            ctx.dice.check_limits(&format!("{}d{sides}", pool.max_dice))?;

            let config = CommandConfig::new(
                COMMAND,
                event.actor.id,
                event.actor.locale.clone(),
                answer_config(ctx, event)?,
                FlavorConfig::PoolTarget(pool.clone()),
            );
            let answer = screen(&config, &pool);
            return Ok(HandlerResult::replace(
                config,
                answer,
                TargetMessagePolicy::CreateNew,
            ));
        }

        let config = require_config(current)?;
        let FlavorConfig::PoolTarget(pool) = &config.flavor else {
            return Err(flavor_mismatch(config));
        };
        let state = &pool.state;

        match event.action() {
            "pool" => {
                let dice = event
                    .numeric_param(0)
                    .filter(|&n| n >= 1 && n <= pool.max_dice as usize)
                    .ok_or_else(|| HandlerError::InvalidArgument("unknown dice pool".into()))?;
                let (next, pool) = with_state(
                    config,
                    pool,
                    PoolTargetState {
                        pool: Some(dice as u32),
                        target: None,
                    },
                );
                Ok(edited(next, &pool))
            }
            "target" => {
                let (Some(dice), None) = (state.pool, state.target) else {
                    return Err(HandlerError::InvalidArgument("pick a dice pool first".into()));
                };
                let target = event
                    .numeric_param(0)
                    .filter(|&t| t >= 2 && t <= pool.sides as usize)
                    .ok_or_else(|| HandlerError::InvalidArgument("unknown target number".into()))?
                    as u32;
                if pool.reroll_variant == RerollVariant::Ask && !pool.reroll_set.is_empty() {
                    let (next, pool) = with_state(
                        config,
                        pool,
                        PoolTargetState {
                            pool: Some(dice),
                            target: Some(target),
                        },
                    );
                    return Ok(edited(next, &pool));
                }
                let do_reroll = !pool.reroll_set.is_empty();
                Self::roll(ctx, config, pool, dice, target, do_reroll).await
            }
            action @ ("reroll" | "no_reroll") => {
                let (Some(dice), Some(target)) = (state.pool, state.target) else {
                    return Err(HandlerError::InvalidArgument("pick a target number first".into()));
                };
                Self::roll(ctx, config, pool, dice, target, action == "reroll").await
            }
            "clear" => {
                let (next, pool) = with_state(config, pool, PoolTargetState::default());
                Ok(edited(next, &pool))
            }
            _ => Err(unknown_action(event)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::handlers::test_support::*;

    fn flavor(config: &CommandConfig) -> &PoolTargetConfig {
        match &config.flavor {
            FlavorConfig::PoolTarget(pool) => pool,
            _ => panic!("wrong flavor"),
        }
    }

    fn pool_state(config: &CommandConfig) -> &PoolTargetState {
        &flavor(config).state
    }

    async fn press(config: &CommandConfig, id: CustomId) -> Result<HandlerResult, HandlerError> {
        PoolTargetHandler
            .handle(&context(), &click(id, STRANGER), Some(config))
            .await
    }

    async fn picked(options: &[(&str, &str)], dice: usize) -> CommandConfig {
        let (config, _) = start(&PoolTargetHandler, options).await;
        replaced(
            &press(&config, CustomId::new(COMMAND, "pool").with_param(dice))
                .await
                .unwrap(),
        )
    }

    fn config_with(reroll: &[u32], botch: &[u32]) -> PoolTargetConfig {
        PoolTargetConfig {
            sides: 10,
            max_dice: 10,
            reroll_set: reroll.iter().copied().collect(),
            botch_set: botch.iter().copied().collect(),
            reroll_variant: RerollVariant::Always,
            state: PoolTargetState::default(),
        }
    }

    #[test]
    fn test_description_lists_sets() {
        assert_eq!(description(&config_with(&[], &[])), "");
        assert_eq!(
            description(&config_with(&[9, 10], &[1])),
            " (always reroll:9,10, botch:1)"
        );
    }

    #[test]
    fn test_botches_cancel_successes() {
        let pool = config_with(&[], &[1]);
        assert_eq!(score(&[10, 8, 7, 1, 1], 7, &pool), (1, 2));
        assert_eq!(score(&[2, 3], 7, &pool), (0, 0));
    }

    #[tokio::test]
    async fn test_start_validates_sets() {
        for bad in [
            vec![("dice_sides", "6"), ("botch_set", "7")],
            vec![("dice_sides", "2"), ("reroll_set", "1,2")],
            vec![("dice_sides", "26")],
            vec![("dice_sides", "6"), ("reroll_variant", "sometimes")],
        ] {
            let event = slash(COMMAND, &bad);
            assert!(matches!(
                PoolTargetHandler.handle(&context(), &event, None).await,
                Err(HandlerError::InvalidArgument(_))
            ));
        }

        let (config, result) = start(&PoolTargetHandler, &[("dice_sides", "10")]).await;
        assert_eq!(flavor(&config).max_dice, DEFAULT_MAX_DICE);
        // ten pool buttons, two rows
        assert_eq!(result.answer.rows.len(), 2);
    }

    #[tokio::test]
    async fn test_pool_then_target_screen() {
        let config = picked(&[("dice_sides", "25"), ("max_dice", "25")], 5).await;
        assert_eq!(pool_state(&config).pool, Some(5));

        let target_screen = screen(&config, flavor(&config));
        // targets 2..=25 and clear fill exactly five rows
        assert_eq!(target_screen.rows.len(), 5);
        assert!(target_screen.content.unwrap().ends_with("5d25"));
    }

    #[tokio::test]
    async fn test_target_rolls_and_resets() {
        let config = picked(&[("dice_sides", "10"), ("botch_set", "1")], 6).await;
        let result = press(&config, CustomId::new(COMMAND, "target").with_param(7))
            .await
            .unwrap();
        assert_eq!(pool_state(&replaced(&result)), &PoolTargetState::default());
        assert_eq!(result.policy, TargetMessagePolicy::EditExisting);
        let embed = result.answer.embed.unwrap();
        assert!(embed.title.starts_with("6d10 ⇒ "));
        assert!(embed.description.unwrap().starts_with("`6d10 ≥7`"));
        assert_eq!(PoolTargetHandler.replay_safety("target"), ReplaySafety::Exclusive);
        assert_eq!(PoolTargetHandler.replay_safety("pool"), ReplaySafety::Reapplicable);
    }

    #[tokio::test]
    async fn test_ask_variant_waits_for_decision() {
        let options = [
            ("dice_sides", "10"),
            ("reroll_set", "10"),
            ("reroll_variant", "ask"),
            ("answer_interaction", "append_new"),
        ];
        let config = picked(&options, 4).await;
        let asked = press(&config, CustomId::new(COMMAND, "target").with_param(8))
            .await
            .unwrap();
        let asked_config = replaced(&asked);
        assert_eq!(pool_state(&asked_config).target, Some(8));
        assert_eq!(asked.answer.rows.len(), 1);

        let result = press(&asked_config, CustomId::new(COMMAND, "no_reroll"))
            .await
            .unwrap();
        assert_eq!(result.policy, TargetMessagePolicy::EditAndCreate);
        assert_eq!(pool_state(&replaced(&result)), &PoolTargetState::default());
        let posted = result.answer.follow_up.unwrap();
        assert!(posted.embed.unwrap().title.starts_with("4d10 ⇒ "));
    }

    #[tokio::test]
    async fn test_reroll_adds_dice() {
        // nine of ten faces reroll, so the pool practically always grows
        let options = [("dice_sides", "10"), ("reroll_set", "1,2,3,4,5,6,7,8,9")];
        let config = picked(&options, 3).await;
        let result = press(&config, CustomId::new(COMMAND, "target").with_param(5))
            .await
            .unwrap();
        let details = result.answer.embed.unwrap().description.unwrap();
        let dice = details.matches(", ").count() + 1;
        assert!(dice > 3, "{details}");
        assert!(dice <= 3 * (MAX_REROLL_ROUNDS + 1));
    }

    #[tokio::test]
    async fn test_actions_out_of_order_rejected() {
        let (fresh, _) = start(&PoolTargetHandler, &[("dice_sides", "6")]).await;
        for id in [
            CustomId::new(COMMAND, "target").with_param(4),
            CustomId::new(COMMAND, "reroll"),
            CustomId::new(COMMAND, "pool").with_param(11),
        ] {
            assert!(matches!(
                press(&fresh, id).await,
                Err(HandlerError::InvalidArgument(_))
            ));
        }

        let picked = picked(&[("dice_sides", "6")], 2).await;
        let cleared = replaced(&press(&picked, CustomId::new(COMMAND, "clear")).await.unwrap());
        assert_eq!(pool_state(&cleared), &PoolTargetState::default());
    }
}
