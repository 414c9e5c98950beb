//! Event Normalizer: platform payloads to [`InteractionEvent`]

use crate::commands::CommandRegistry;
use crate::core::error::NormalizationError;

use super::{
    CustomId, EventKind, InteractionEvent, PlatformEvent, PlatformPayload, RawInput, START_ACTION,
};

/// Convert a raw platform event into its normalized form.
///
/// Pure mapping. The registry is consulted only to reject commands nobody
/// handles, so callers can answer with a notice instead of failing later.
pub fn normalize(
    event: PlatformEvent,
    registry: &CommandRegistry,
) -> Result<InteractionEvent, NormalizationError> {
    let (kind, custom_id, input) = match event.payload {
        PlatformPayload::Command { name, options } => (
            EventKind::SlashCommand,
            CustomId::new(name, START_ACTION),
            RawInput::Options(options),
        ),
        PlatformPayload::Button { custom_id } => (
            EventKind::ButtonClick,
            CustomId::decode(&custom_id)?,
            RawInput::Empty,
        ),
        PlatformPayload::Select { custom_id, values } => (
            EventKind::SelectMenu,
            CustomId::decode(&custom_id)?,
            RawInput::Selection(values),
        ),
        PlatformPayload::Modal { custom_id, fields } => (
            EventKind::ModalSubmit,
            CustomId::decode(&custom_id)?,
            RawInput::Fields(fields),
        ),
    };

    if !registry.contains(&custom_id.command) {
        return Err(NormalizationError::UnknownCommand(custom_id.command));
    }

    Ok(InteractionEvent {
        kind,
        actor: event.actor,
        guild_id: event.guild_id,
        channel_id: event.channel_id,
        message_id: event.message_id,
        custom_id,
        input,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::handlers::create_registry;
    use crate::interaction::Actor;
    use std::collections::BTreeMap;

    fn platform_event(payload: PlatformPayload) -> PlatformEvent {
        PlatformEvent {
            payload,
            actor: Actor {
                id: 7,
                name: "alice".into(),
                locale: "en-US".into(),
                can_manage_channel: false,
            },
            guild_id: Some(1),
            channel_id: 2,
            message_id: Some(3),
        }
    }

    #[test]
    fn test_slash_command_becomes_start_event() {
        let registry = create_registry().unwrap();
        let mut options = BTreeMap::new();
        options.insert("expression".to_string(), "2d6+3".to_string());
        let event = normalize(
            platform_event(PlatformPayload::Command {
                name: "roll".into(),
                options,
            }),
            &registry,
        )
        .unwrap();

        assert_eq!(event.kind, EventKind::SlashCommand);
        assert_eq!(event.action(), START_ACTION);
        assert_eq!(event.input.option("expression"), Some("2d6+3"));
    }

    #[test]
    fn test_button_click_decodes_custom_id() {
        let registry = create_registry().unwrap();
        let event = normalize(
            platform_event(PlatformPayload::Button {
                custom_id: "custom_dice\u{1e}roll\u{1e}4".into(),
            }),
            &registry,
        )
        .unwrap();

        assert_eq!(event.kind, EventKind::ButtonClick);
        assert_eq!(event.command(), "custom_dice");
        assert_eq!(event.numeric_param(0), Some(4));
    }

    #[test]
    fn test_select_keeps_values() {
        let registry = create_registry().unwrap();
        let event = normalize(
            platform_event(PlatformPayload::Select {
                custom_id: "channel_config\u{1e}format".into(),
                values: vec!["compact".into()],
            }),
            &registry,
        )
        .unwrap();

        assert_eq!(event.kind, EventKind::SelectMenu);
        assert_eq!(event.input.selection(), ["compact".to_string()]);
    }

    #[test]
    fn test_unknown_command_rejected() {
        let registry = create_registry().unwrap();
        let err = normalize(
            platform_event(PlatformPayload::Button {
                custom_id: "poker\u{1e}deal".into(),
            }),
            &registry,
        )
        .unwrap_err();
        assert_eq!(err, NormalizationError::UnknownCommand("poker".into()));
    }

    #[test]
    fn test_malformed_custom_id_rejected() {
        let registry = create_registry().unwrap();
        let err = normalize(
            platform_event(PlatformPayload::Button {
                custom_id: "roll".into(),
            }),
            &registry,
        )
        .unwrap_err();
        assert_eq!(err, NormalizationError::UnparsableCustomId("roll".into()));
    }
}
