//! `/sum_custom_set`: collect dice from buttons, then roll them as one sum
//!
//! Whoever adds the first die owns the pending sum until it is rolled or
//! cleared; `clear` is open to everyone so an abandoned set can be reset.
//! An add that would push the sum past the dice limits is refused.

use async_trait::async_trait;

use super::{
    answer_config, answer_options, flavor_mismatch, parse_die_buttons, place_stateful_roll,
    require_config, required_option, unknown_action,
};
use crate::commands::context::HandlerContext;
use crate::commands::definition::{CommandDefinition, OptionDefinition};
use crate::commands::handler::{CommandHandler, HandlerResult, ReplaySafety};
use crate::core::error::HandlerError;
use crate::core::i18n::{tr, Text};
use crate::interaction::{CustomId, InteractionEvent};
use crate::render::{roll_answer, Answer, Button, ButtonStyle, TargetMessagePolicy};
use crate::store::{CommandConfig, FlavorConfig, SumCustomSetConfig, SumState};

const COMMAND: &str = "sum_custom_set";

pub struct SumCustomSetHandler;

/// Join the collected expressions into one sum
fn combine(expressions: &[String]) -> String {
    let mut combined = String::new();
    for expression in expressions {
        if !combined.is_empty() && !expression.starts_with(['+', '-']) {
            combined.push('+');
        }
        combined.push_str(expression);
    }
    combined
}

fn layout(answer: Answer, sum: &SumCustomSetConfig, locale: &str) -> Answer {
    let buttons = sum
        .buttons
        .iter()
        .enumerate()
        .map(|(i, b)| {
            Button::new(
                CustomId::new(COMMAND, "add").with_param(i),
                b.label.clone(),
                ButtonStyle::Secondary,
            )
        })
        .collect();
    answer.with_button_grid(buttons, 5).with_button_row(vec![
        Button::new(
            CustomId::new(COMMAND, "back"),
            tr(locale, Text::Back),
            ButtonStyle::Secondary,
        ),
        Button::new(
            CustomId::new(COMMAND, "clear"),
            tr(locale, Text::Clear),
            ButtonStyle::Danger,
        ),
        Button::new(
            CustomId::new(COMMAND, "roll"),
            tr(locale, Text::Roll),
            ButtonStyle::Success,
        ),
    ])
}

fn overview(config: &CommandConfig, sum: &SumCustomSetConfig) -> Answer {
    let text = if sum.state.expressions.is_empty() {
        tr(&config.locale, Text::ClickToRoll).to_string()
    } else {
        format!("`{}`", combine(&sum.state.expressions))
    };
    layout(Answer::text(text), sum, &config.locale)
}

fn with_state(config: &CommandConfig, sum: &SumCustomSetConfig, state: SumState) -> (CommandConfig, SumCustomSetConfig) {
    let mut sum = sum.clone();
    sum.state = state;
    let mut next = config.clone();
    next.flavor = FlavorConfig::SumCustomSet(sum.clone());
    (next, sum)
}

/// Only the user holding the lock may change a locked set
fn require_lock_holder(event: &InteractionEvent, state: &SumState) -> Result<(), HandlerError> {
    match state.locked_to {
        Some(holder) if holder != event.actor.id => Err(HandlerError::Forbidden),
        _ => Ok(()),
    }
}

#[async_trait]
impl CommandHandler for SumCustomSetHandler {
    fn command_name(&self) -> &'static str {
        COMMAND
    }

    fn definition(&self) -> CommandDefinition {
        CommandDefinition::new(COMMAND, "Combine dice buttons into one sum before rolling")
            .option(
                OptionDefinition::string(
                    "buttons",
                    "Buttons as label@expression separated by ; e.g. d6@1d6;+1@1",
                )
                .required(),
            )
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
            let sum = SumCustomSetConfig {
                buttons: parse_die_buttons(required_option(event, "buttons")?, &ctx.dice)?,
                state: SumState::default(),
            };
            let config = CommandConfig::new(
                COMMAND,
                event.actor.id,
                event.actor.locale.clone(),
                answer_config(ctx, event)?,
                FlavorConfig::SumCustomSet(sum.clone()),
            );
            let answer = overview(&config, &sum);
            return Ok(HandlerResult::replace(
                config,
                answer,
                TargetMessagePolicy::CreateNew,
            ));
        }

        let config = require_config(current)?;
        let FlavorConfig::SumCustomSet(sum) = &config.flavor else {
            return Err(flavor_mismatch(config));
        };
        let state = &sum.state;

        let next_state = match event.action() {
            "add" => {
                require_lock_holder(event, state)?;
                let button = event
                    .numeric_param(0)
                    .and_then(|i| sum.buttons.get(i))
                    .ok_or_else(|| HandlerError::InvalidArgument("unknown button".into()))?;
                let mut expressions = state.expressions.clone();
                expressions.push(button.expression.clone());
                ctx.dice.check_limits(&combine(&expressions))?;
                SumState {
                    expressions,
                    locked_to: Some(event.actor.id),
                }
            }
            "back" => {
                require_lock_holder(event, state)?;
                let mut expressions = state.expressions.clone();
                expressions.pop();
                let locked_to = if expressions.is_empty() {
                    None
                } else {
                    state.locked_to
                };
                SumState {
                    expressions,
                    locked_to,
                }
            }
            "clear" => SumState::default(),
            "roll" => {
                require_lock_holder(event, state)?;
                if state.expressions.is_empty() {
                    return Err(HandlerError::InvalidArgument(
                        "add some dice before rolling".into(),
                    ));
                }
                let result = ctx.dice.roll(&combine(&state.expressions)).await?;
                let (next, sum) = with_state(config, sum, SumState::default());
                let (answer, policy) = place_stateful_roll(
                    next.answer.interaction,
                    roll_answer(None, &result, next.answer.format),
                    overview(&next, &sum),
                );
                return Ok(HandlerResult::replace(next, answer, policy));
            }
            _ => return Err(unknown_action(event)),
        };

        let (next, sum) = with_state(config, sum, next_state);
        let answer = overview(&next, &sum);
        Ok(HandlerResult::replace(
            next,
            answer,
            TargetMessagePolicy::EditExisting,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::handlers::test_support::*;
    use crate::core::error::EvaluationError;
    use crate::store::AnswerInteraction;

    const BUTTONS: &str = "d6@1d6;d8@1d8;minus one@-1";

    fn sum_state(config: &CommandConfig) -> &SumState {
        match &config.flavor {
            FlavorConfig::SumCustomSet(sum) => &sum.state,
            _ => panic!("wrong flavor"),
        }
    }

    async fn press(config: &CommandConfig, id: CustomId, actor_id: u64) -> Result<HandlerResult, HandlerError> {
        SumCustomSetHandler
            .handle(&context(), &click(id, actor_id), Some(config))
            .await
    }

    fn add(i: usize) -> CustomId {
        CustomId::new(COMMAND, "add").with_param(i)
    }

    #[test]
    fn test_combine_respects_signs() {
        let parts = vec!["1d6".to_string(), "1d8".to_string(), "-1".to_string()];
        assert_eq!(combine(&parts), "1d6+1d8-1");
        assert_eq!(combine(&[]), "");
    }

    #[tokio::test]
    async fn test_add_locks_to_actor() {
        let (config, result) = start(&SumCustomSetHandler, &[("buttons", BUTTONS)]).await;
        // three dice buttons plus the control row
        assert_eq!(result.answer.rows.len(), 2);

        let after = replaced(&press(&config, add(0), OWNER).await.unwrap());
        assert_eq!(sum_state(&after).expressions, vec!["1d6".to_string()]);
        assert_eq!(sum_state(&after).locked_to, Some(OWNER));

        assert_eq!(
            press(&after, add(1), STRANGER).await.unwrap_err(),
            HandlerError::Forbidden
        );
        assert_eq!(
            press(&after, CustomId::new(COMMAND, "roll"), STRANGER)
                .await
                .unwrap_err(),
            HandlerError::Forbidden
        );
    }

    #[tokio::test]
    async fn test_back_unlocks_when_empty() {
        let (config, _) = start(&SumCustomSetHandler, &[("buttons", BUTTONS)]).await;
        let one = replaced(&press(&config, add(1), OWNER).await.unwrap());
        let none = replaced(
            &press(&one, CustomId::new(COMMAND, "back"), OWNER)
                .await
                .unwrap(),
        );
        assert_eq!(sum_state(&none), &SumState::default());
    }

    #[tokio::test]
    async fn test_anyone_may_clear() {
        let (config, _) = start(&SumCustomSetHandler, &[("buttons", BUTTONS)]).await;
        let locked = replaced(&press(&config, add(0), OWNER).await.unwrap());
        let cleared = replaced(
            &press(&locked, CustomId::new(COMMAND, "clear"), STRANGER)
                .await
                .unwrap(),
        );
        assert_eq!(sum_state(&cleared), &SumState::default());
    }

    #[tokio::test]
    async fn test_roll_sums_and_resets() {
        let (config, _) = start(&SumCustomSetHandler, &[("buttons", BUTTONS)]).await;
        let mut current = config;
        for i in [0, 1, 2] {
            current = replaced(&press(&current, add(i), OWNER).await.unwrap());
        }

        let result = press(&current, CustomId::new(COMMAND, "roll"), OWNER)
            .await
            .unwrap();
        assert_eq!(sum_state(&replaced(&result)), &SumState::default());
        assert_eq!(result.policy, TargetMessagePolicy::EditExisting);
        let title = result.answer.embed.unwrap().title;
        assert!(title.starts_with("1d6+1d8-1 ⇒ "));
        assert_eq!(SumCustomSetHandler.replay_safety("roll"), ReplaySafety::Exclusive);
    }

    #[tokio::test]
    async fn test_roll_with_append_new_posts_result_and_resets_roller() {
        let (config, _) = start(
            &SumCustomSetHandler,
            &[("buttons", BUTTONS), ("answer_interaction", "append_new")],
        )
        .await;
        assert_eq!(config.answer.interaction, AnswerInteraction::AppendNew);
        let one = replaced(&press(&config, add(0), OWNER).await.unwrap());

        let result = press(&one, CustomId::new(COMMAND, "roll"), OWNER)
            .await
            .unwrap();
        assert_eq!(result.policy, TargetMessagePolicy::EditAndCreate);
        assert_eq!(sum_state(&replaced(&result)), &SumState::default());

        // the roller goes back to its empty overview, buttons intact
        assert_eq!(
            result.answer.content.as_deref(),
            Some(tr("en", Text::ClickToRoll))
        );
        assert_eq!(result.answer.rows.len(), 2);

        let posted = result.answer.follow_up.unwrap();
        assert!(posted.rows.is_empty());
        assert!(posted.embed.unwrap().title.starts_with("1d6 ⇒ "));
    }

    #[tokio::test]
    async fn test_add_past_dice_limits_rejected() {
        let (config, _) = start(&SumCustomSetHandler, &[("buttons", BUTTONS)]).await;
        let mut current = config;
        // `1d6+` repeated reaches the 200 character limit after 50 adds
        for _ in 0..50 {
            current = replaced(&press(&current, add(0), OWNER).await.unwrap());
        }
        assert_eq!(sum_state(&current).expressions.len(), 50);

        assert!(matches!(
            press(&current, add(0), OWNER).await,
            Err(HandlerError::Evaluation(EvaluationError::LimitExceeded(_)))
        ));

        // the accepted set still rolls
        let result = press(&current, CustomId::new(COMMAND, "roll"), OWNER)
            .await
            .unwrap();
        assert_eq!(sum_state(&replaced(&result)), &SumState::default());
    }

    #[tokio::test]
    async fn test_start_action_on_existing_roller_is_unknown() {
        let (config, _) = start(&SumCustomSetHandler, &[("buttons", BUTTONS)]).await;
        assert!(matches!(
            press(&config, CustomId::new(COMMAND, "start"), OWNER).await,
            Err(HandlerError::InvalidArgument(_))
        ));
    }

    #[tokio::test]
    async fn test_roll_empty_set_rejected() {
        let (config, _) = start(&SumCustomSetHandler, &[("buttons", BUTTONS)]).await;
        assert!(matches!(
            press(&config, CustomId::new(COMMAND, "roll"), OWNER).await,
            Err(HandlerError::InvalidArgument(_))
        ));
    }
}
