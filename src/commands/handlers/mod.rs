//! Command handler implementations, one per roller flavor
//!
//! - **Version**: 1.1.0
//! - **Since**: 1.0.0
//!
//! ## Changelog
//! - 1.1.0: sum_dice_set, fate and pool_target; results of resetting rollers
//!   can be posted while the roller is edited back
//! - 1.0.0: roll, custom_dice, count_successes, hold_reroll, sum_custom_set,
//!   channel_config and r

mod channel_config;
mod count_successes;
mod custom_dice;
mod direct_roll;
mod fate;
mod hold_reroll;
mod pool_target;
mod roll;
mod sum_custom_set;
mod sum_dice_set;

pub use channel_config::ChannelConfigHandler;
pub use count_successes::CountSuccessesHandler;
pub use custom_dice::CustomDiceHandler;
pub use direct_roll::DirectRollHandler;
pub use fate::FateHandler;
pub use hold_reroll::HoldRerollHandler;
pub use pool_target::PoolTargetHandler;
pub use roll::RollHandler;
pub use sum_custom_set::SumCustomSetHandler;
pub use sum_dice_set::SumDiceSetHandler;

use std::collections::BTreeSet;
use std::ops::RangeInclusive;
use std::sync::Arc;

use super::context::HandlerContext;
use super::definition::OptionDefinition;
use super::handler::{CommandHandler, HandlerResult};
use super::registry::{CommandRegistry, RegistryError};
use crate::core::error::HandlerError;
use crate::core::i18n::{tr, Text};
use crate::core::response::LABEL_LIMIT;
use crate::dice::DicePipeline;
use crate::interaction::{CustomId, InteractionEvent};
use crate::render::{Answer, Button, ButtonStyle, ComponentRow, TargetMessagePolicy};
use crate::store::{AnswerFormat, AnswerFormattingConfig, AnswerInteraction, CommandConfig, DieButton};

/// Maximum number of dice buttons a custom set may define
pub const MAX_CUSTOM_BUTTONS: usize = 20;

/// Create every handler this bot ships with
pub fn create_all_handlers() -> Vec<Arc<dyn CommandHandler>> {
    vec![
        Arc::new(RollHandler),
        Arc::new(CustomDiceHandler),
        Arc::new(CountSuccessesHandler),
        Arc::new(HoldRerollHandler),
        Arc::new(SumCustomSetHandler),
        Arc::new(SumDiceSetHandler),
        Arc::new(FateHandler),
        Arc::new(PoolTargetHandler),
        Arc::new(ChannelConfigHandler),
        Arc::new(DirectRollHandler),
    ]
}

/// Build the process-wide registry
pub fn create_registry() -> Result<CommandRegistry, RegistryError> {
    let mut registry = CommandRegistry::new();
    for handler in create_all_handlers() {
        registry.register(handler)?;
    }
    Ok(registry)
}

/// The snapshot every component event works on
pub(crate) fn require_config(current: Option<&CommandConfig>) -> Result<&CommandConfig, HandlerError> {
    current.ok_or(HandlerError::Superseded)
}

/// Owner of the roller or anyone allowed to manage the channel
pub(crate) fn authorize_owner_or_manager(
    event: &InteractionEvent,
    config: &CommandConfig,
) -> Result<(), HandlerError> {
    if event.actor.id == config.owner_id || event.actor.can_manage_channel {
        Ok(())
    } else {
        Err(HandlerError::Forbidden)
    }
}

pub(crate) fn unknown_action(event: &InteractionEvent) -> HandlerError {
    HandlerError::InvalidArgument(format!("unknown action {:?}", event.action()))
}

pub(crate) fn flavor_mismatch(config: &CommandConfig) -> HandlerError {
    HandlerError::InvalidArgument(format!(
        "stored configuration belongs to {:?}",
        config.command_name
    ))
}

pub(crate) fn required_option<'a>(
    event: &'a InteractionEvent,
    name: &str,
) -> Result<&'a str, HandlerError> {
    event
        .input
        .option(name)
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| HandlerError::InvalidArgument(format!("missing option {name}")))
}

/// Parse an integer option, checking it against `range`
pub(crate) fn integer_option(
    event: &InteractionEvent,
    name: &str,
    range: RangeInclusive<u32>,
) -> Result<Option<u32>, HandlerError> {
    let Some(raw) = event.input.option(name) else {
        return Ok(None);
    };
    let value: u32 = raw
        .trim()
        .parse()
        .map_err(|_| HandlerError::InvalidArgument(format!("{name} must be a whole number")))?;
    if !range.contains(&value) {
        return Err(HandlerError::InvalidArgument(format!(
            "{name} must be between {} and {}",
            range.start(),
            range.end()
        )));
    }
    Ok(Some(value))
}

pub(crate) fn bool_option(event: &InteractionEvent, name: &str) -> bool {
    event.input.option(name) == Some("true")
}

/// Answer formatting for a new roller: explicit options, else channel
/// defaults, else the built-in default
pub(crate) fn answer_config(
    ctx: &HandlerContext,
    event: &InteractionEvent,
) -> Result<AnswerFormattingConfig, HandlerError> {
    let mut config = ctx.channel_defaults.unwrap_or_default();
    if let Some(raw) = event.input.option("answer_format") {
        config.format = AnswerFormat::parse(raw)
            .ok_or_else(|| HandlerError::InvalidArgument(format!("unknown answer format {raw}")))?;
    }
    if let Some(raw) = event.input.option("answer_interaction") {
        config.interaction = AnswerInteraction::parse(raw).ok_or_else(|| {
            HandlerError::InvalidArgument(format!("unknown answer interaction {raw}"))
        })?;
    }
    Ok(config)
}

/// Slash options shared by every roller that renders roll results
pub(crate) fn answer_options() -> Vec<OptionDefinition> {
    vec![
        OptionDefinition::string("answer_format", "How results are displayed").choices(&[
            AnswerFormat::Full.as_str(),
            AnswerFormat::WithoutExpression.as_str(),
            AnswerFormat::Compact.as_str(),
            AnswerFormat::Minimal.as_str(),
        ]),
        OptionDefinition::string(
            "answer_interaction",
            "Edit the roller message or post results as new messages",
        )
        .choices(&[
            AnswerInteraction::RerollInPlace.as_str(),
            AnswerInteraction::AppendNew.as_str(),
        ]),
    ]
}

/// Parse `label@expression;expression;...` and validate every expression
pub(crate) fn parse_die_buttons(
    raw: &str,
    dice: &DicePipeline,
) -> Result<Vec<DieButton>, HandlerError> {
    let mut buttons = Vec::new();
    for definition in raw.split(';').map(str::trim).filter(|d| !d.is_empty()) {
        let (label, expression) = match definition.split_once('@') {
            Some((label, expression)) => (label.trim(), expression.trim()),
            None => (definition, definition),
        };
        if label.is_empty() || expression.is_empty() {
            return Err(HandlerError::InvalidArgument(format!(
                "button {definition:?} needs a label and an expression"
            )));
        }
        if label.chars().count() > LABEL_LIMIT {
            return Err(HandlerError::InvalidArgument(format!(
                "button label {label:?} is longer than {LABEL_LIMIT} characters"
            )));
        }
        dice.validate(expression)?;
        buttons.push(DieButton {
            label: label.to_string(),
            expression: expression.to_string(),
        });
    }

    if buttons.is_empty() || buttons.len() > MAX_CUSTOM_BUTTONS {
        return Err(HandlerError::InvalidArgument(format!(
            "between 1 and {MAX_CUSTOM_BUTTONS} buttons are required"
        )));
    }
    Ok(buttons)
}

/// Inverse of [`parse_die_buttons`], used to prefill the edit modal
pub(crate) fn format_die_buttons(buttons: &[DieButton]) -> String {
    buttons
        .iter()
        .map(|b| {
            if b.label == b.expression {
                b.expression.clone()
            } else {
                format!("{}@{}", b.label, b.expression)
            }
        })
        .collect::<Vec<_>>()
        .join(";")
}

/// Parse a comma separated set of die faces, each within `1..=sides`
pub(crate) fn set_option(
    event: &InteractionEvent,
    name: &str,
    sides: u32,
) -> Result<BTreeSet<u32>, HandlerError> {
    let Some(raw) = event.input.option(name) else {
        return Ok(BTreeSet::new());
    };
    raw.split(',')
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(|v| match v.parse::<u32>() {
            Ok(n) if (1..=sides).contains(&n) => Ok(n),
            _ => Err(HandlerError::InvalidArgument(format!(
                "{name} may only contain numbers from 1 to {sides}"
            ))),
        })
        .collect()
}

/// Place a roll result according to the configured answer interaction.
///
/// Starting a roller always posts it. Afterwards the result either replaces
/// the roller in place (keeping its buttons) or goes to a new message that
/// carries no buttons.
pub(crate) fn place_roll(
    event: &InteractionEvent,
    interaction: AnswerInteraction,
    answer: Answer,
    rows: Vec<ComponentRow>,
) -> (Answer, TargetMessagePolicy) {
    if event.is_start() {
        return (answer.with_rows(rows), TargetMessagePolicy::CreateNew);
    }
    match interaction {
        AnswerInteraction::RerollInPlace => {
            (answer.with_rows(rows), TargetMessagePolicy::EditExisting)
        }
        AnswerInteraction::AppendNew => (answer, TargetMessagePolicy::CreateNew),
    }
}

/// Place the result of a roller whose state resets after rolling.
///
/// In place, the result takes over the roller message with the reset
/// roller's buttons. Otherwise the roller is edited back to `roller` and the
/// result is posted as a new message.
pub(crate) fn place_stateful_roll(
    interaction: AnswerInteraction,
    result: Answer,
    roller: Answer,
) -> (Answer, TargetMessagePolicy) {
    match interaction {
        AnswerInteraction::RerollInPlace => (
            result.with_rows(roller.rows),
            TargetMessagePolicy::EditExisting,
        ),
        AnswerInteraction::AppendNew => (
            roller.with_follow_up(result),
            TargetMessagePolicy::EditAndCreate,
        ),
    }
}

/// Owner-or-manager clear: delete the config and strip the buttons
pub(crate) fn clear_roller(
    event: &InteractionEvent,
    config: &CommandConfig,
) -> Result<HandlerResult, HandlerError> {
    authorize_owner_or_manager(event, config)?;
    Ok(HandlerResult::delete(
        Answer::text(tr(&event.actor.locale, Text::RollerCleared)),
        TargetMessagePolicy::EditExisting,
    ))
}

pub(crate) fn clear_button(command: &str, locale: &str) -> Button {
    Button::new(
        CustomId::new(command, "clear"),
        tr(locale, Text::Clear),
        ButtonStyle::Danger,
    )
}


#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;

    #[test]
    fn test_stateful_roll_placement() {
        let roller = Answer::text("roller").with_button_row(vec![clear_button("x", "en")]);
        let result = Answer::text("1d6 ⇒ 4");

        let (answer, policy) =
            place_stateful_roll(AnswerInteraction::RerollInPlace, result.clone(), roller.clone());
        assert_eq!(policy, TargetMessagePolicy::EditExisting);
        assert_eq!(answer.content.as_deref(), Some("1d6 ⇒ 4"));
        assert_eq!(answer.rows, roller.rows);

        let (answer, policy) =
            place_stateful_roll(AnswerInteraction::AppendNew, result.clone(), roller);
        assert_eq!(policy, TargetMessagePolicy::EditAndCreate);
        assert_eq!(answer.content.as_deref(), Some("roller"));
        assert_eq!(answer.follow_up.as_deref(), Some(&result));
    }

    #[test]
    fn test_registry_contains_every_flavor() {
        let registry = create_registry().unwrap();
        for name in [
            "roll",
            "custom_dice",
            "count_successes",
            "hold_reroll",
            "sum_custom_set",
            "sum_dice_set",
            "fate",
            "pool_target",
            "channel_config",
            "r",
        ] {
            assert!(registry.contains(name), "{name} missing");
        }
        assert_eq!(registry.len(), 10);
    }

    #[test]
    fn test_parse_die_buttons_with_and_without_labels() {
        let ctx = context();
        let buttons = parse_die_buttons("Attack@1d20+5; 2d6 ;", &ctx.dice).unwrap();
        assert_eq!(buttons.len(), 2);
        assert_eq!(buttons[0].label, "Attack");
        assert_eq!(buttons[0].expression, "1d20+5");
        assert_eq!(buttons[1].label, "2d6");
        assert_eq!(format_die_buttons(&buttons), "Attack@1d20+5;2d6");
    }

    #[test]
    fn test_parse_die_buttons_rejects_bad_input() {
        let ctx = context();
        assert!(matches!(
            parse_die_buttons("", &ctx.dice),
            Err(HandlerError::InvalidArgument(_))
        ));
        assert!(matches!(
            parse_die_buttons("Oops@2d", &ctx.dice),
            Err(HandlerError::Evaluation(_))
        ));
        let too_many = vec!["1d6"; 21].join(";");
        assert!(matches!(
            parse_die_buttons(&too_many, &ctx.dice),
            Err(HandlerError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_answer_config_prefers_explicit_options() {
        let ctx = context().with_channel_defaults(Some(AnswerFormattingConfig {
            format: AnswerFormat::Minimal,
            interaction: AnswerInteraction::AppendNew,
        }));

        let inherited = answer_config(&ctx, &slash("roll", &[])).unwrap();
        assert_eq!(inherited.format, AnswerFormat::Minimal);

        let explicit = answer_config(&ctx, &slash("roll", &[("answer_format", "compact")])).unwrap();
        assert_eq!(explicit.format, AnswerFormat::Compact);
        assert_eq!(explicit.interaction, AnswerInteraction::AppendNew);

        assert!(answer_config(&ctx, &slash("roll", &[("answer_format", "loud")])).is_err());
    }

    #[test]
    fn test_integer_option_bounds() {
        let event = slash("count_successes", &[("dice_sides", "1")]);
        assert!(integer_option(&event, "dice_sides", 2..=1000).is_err());
        assert_eq!(integer_option(&event, "missing", 1..=5).unwrap(), None);
    }
}
