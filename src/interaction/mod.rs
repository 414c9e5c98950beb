//! # Interaction Events
//!
//! Transport-neutral inbound events and their normalized form.
//!
//! - **Version**: 1.0.0
//! - **Since**: 1.0.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 1.0.0: Platform events, normalized interaction events, custom-id codec

pub mod custom_id;
pub mod normalize;

use std::collections::BTreeMap;

pub use custom_id::{CustomId, DELIMITER, MAX_CUSTOM_ID_LENGTH};
pub use normalize::normalize;

/// Action carried by every slash command invocation
pub const START_ACTION: &str = "start";

/// The user who triggered an interaction
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Actor {
    pub id: u64,
    pub name: String,
    /// Discord locale of the user's client, e.g. `en-US`
    pub locale: String,
    /// Holds the manage-channels permission where the event happened
    pub can_manage_channel: bool,
}

/// Raw payload as received from the gateway, before any decoding
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PlatformPayload {
    Command {
        name: String,
        options: BTreeMap<String, String>,
    },
    Button {
        custom_id: String,
    },
    Select {
        custom_id: String,
        values: Vec<String>,
    },
    Modal {
        custom_id: String,
        fields: BTreeMap<String, String>,
    },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlatformEvent {
    pub payload: PlatformPayload,
    pub actor: Actor,
    pub guild_id: Option<u64>,
    pub channel_id: u64,
    /// Message the component lives on; absent for slash commands
    pub message_id: Option<u64>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EventKind {
    SlashCommand,
    ButtonClick,
    SelectMenu,
    ModalSubmit,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SlashCommand => "slash",
            Self::ButtonClick => "button",
            Self::SelectMenu => "select",
            Self::ModalSubmit => "modal",
        }
    }
}

/// User supplied input that accompanies an event
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum RawInput {
    #[default]
    Empty,
    /// Slash command options, values rendered as strings
    Options(BTreeMap<String, String>),
    /// Values picked in a select menu
    Selection(Vec<String>),
    /// Modal text inputs keyed by their custom id
    Fields(BTreeMap<String, String>),
}

impl RawInput {
    pub fn option(&self, name: &str) -> Option<&str> {
        match self {
            Self::Options(options) => options.get(name).map(String::as_str),
            _ => None,
        }
    }

    pub fn field(&self, name: &str) -> Option<&str> {
        match self {
            Self::Fields(fields) => fields.get(name).map(String::as_str),
            _ => None,
        }
    }

    pub fn selection(&self) -> &[String] {
        match self {
            Self::Selection(values) => values,
            _ => &[],
        }
    }
}

/// Normalized, immutable description of one interaction
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InteractionEvent {
    pub kind: EventKind,
    pub actor: Actor,
    pub guild_id: Option<u64>,
    pub channel_id: u64,
    pub message_id: Option<u64>,
    pub custom_id: CustomId,
    pub input: RawInput,
}

impl InteractionEvent {
    pub fn command(&self) -> &str {
        &self.custom_id.command
    }

    pub fn action(&self) -> &str {
        &self.custom_id.action
    }

    pub fn is_start(&self) -> bool {
        self.kind == EventKind::SlashCommand
    }

    /// Parse the `index`-th custom-id parameter as a number
    pub fn numeric_param(&self, index: usize) -> Option<usize> {
        self.custom_id.param(index).and_then(|p| p.parse().ok())
    }
}
