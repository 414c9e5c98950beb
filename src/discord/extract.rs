//! serenity interactions → [`PlatformEvent`]

use serde_json::Value;
use serenity::model::application::component::{ActionRowComponent, ComponentType};
use serenity::model::application::interaction::application_command::ApplicationCommandInteraction;
use serenity::model::application::interaction::message_component::MessageComponentInteraction;
use serenity::model::application::interaction::modal::ModalSubmitInteraction;
use serenity::model::guild::Member;
use serenity::model::user::User;
use std::collections::BTreeMap;

use crate::interaction::{Actor, PlatformEvent, PlatformPayload};

/// Render an option value the way the normalizer expects it
pub fn option_value(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Outside guilds there is nobody else to protect the channel from
fn can_manage_channel(member: Option<&Member>) -> bool {
    match member {
        Some(member) => member
            .permissions
            .map(|permissions| permissions.manage_channels())
            .unwrap_or(false),
        None => true,
    }
}

fn actor(user: &User, member: Option<&Member>, locale: &str) -> Actor {
    Actor {
        id: user.id.0,
        name: user.name.clone(),
        locale: locale.to_string(),
        can_manage_channel: can_manage_channel(member),
    }
}

pub fn from_command(interaction: &ApplicationCommandInteraction) -> PlatformEvent {
    let options: BTreeMap<String, String> = interaction
        .data
        .options
        .iter()
        .filter_map(|option| {
            option_value(option.value.as_ref()).map(|value| (option.name.clone(), value))
        })
        .collect();

    PlatformEvent {
        payload: PlatformPayload::Command {
            name: interaction.data.name.clone(),
            options,
        },
        actor: actor(
            &interaction.user,
            interaction.member.as_ref(),
            &interaction.locale,
        ),
        guild_id: interaction.guild_id.map(|id| id.0),
        channel_id: interaction.channel_id.0,
        message_id: None,
    }
}

pub fn from_component(interaction: &MessageComponentInteraction) -> PlatformEvent {
    let custom_id = interaction.data.custom_id.clone();
    let payload = match interaction.data.component_type {
        ComponentType::SelectMenu => PlatformPayload::Select {
            custom_id,
            values: interaction.data.values.clone(),
        },
        _ => PlatformPayload::Button { custom_id },
    };

    PlatformEvent {
        payload,
        actor: actor(
            &interaction.user,
            interaction.member.as_ref(),
            &interaction.locale,
        ),
        guild_id: interaction.guild_id.map(|id| id.0),
        channel_id: interaction.channel_id.0,
        message_id: Some(interaction.message.id.0),
    }
}

pub fn from_modal(interaction: &ModalSubmitInteraction) -> PlatformEvent {
    let mut fields = BTreeMap::new();
    for action_row in &interaction.data.components {
        for component in &action_row.components {
            if let ActionRowComponent::InputText(input) = component {
                fields.insert(input.custom_id.clone(), input.value.clone());
            }
        }
    }

    PlatformEvent {
        payload: PlatformPayload::Modal {
            custom_id: interaction.data.custom_id.clone(),
            fields,
        },
        actor: actor(
            &interaction.user,
            interaction.member.as_ref(),
            &interaction.locale,
        ),
        guild_id: interaction.guild_id.map(|id| id.0),
        channel_id: interaction.channel_id.0,
        message_id: interaction.message.as_ref().map(|message| message.id.0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_option_values_as_strings() {
        assert_eq!(option_value(Some(&json!("2d6"))), Some("2d6".to_string()));
        assert_eq!(option_value(Some(&json!(12))), Some("12".to_string()));
        assert_eq!(option_value(Some(&json!(true))), Some("true".to_string()));
        assert_eq!(option_value(Some(&json!(null))), None);
        assert_eq!(option_value(None), None);
    }

    #[test]
    fn test_direct_messages_count_as_managed() {
        assert!(can_manage_channel(None));
    }
}
