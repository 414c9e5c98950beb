//! Persisted per-message configuration
//!
//! - **Version**: 1.2.0
//! - **Since**: 1.0.0
//!
//! ## Changelog
//! - 1.2.0: Fate, pool target and dice set flavors
//! - 1.1.0: Answer formatting moved into its own sub-object (schema 1)
//! - 1.0.0: Initial flavors

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use super::schema::CURRENT_SCHEMA_VERSION;

/// State owned by one roller message (or one channel, for defaults)
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandConfig {
    pub schema_version: u32,
    pub command_name: String,
    pub owner_id: u64,
    pub locale: String,
    #[serde(default)]
    pub answer: AnswerFormattingConfig,
    pub flavor: FlavorConfig,
}

impl CommandConfig {
    pub fn new(
        command_name: impl Into<String>,
        owner_id: u64,
        locale: impl Into<String>,
        answer: AnswerFormattingConfig,
        flavor: FlavorConfig,
    ) -> Self {
        Self {
            schema_version: CURRENT_SCHEMA_VERSION,
            command_name: command_name.into(),
            owner_id,
            locale: locale.into(),
            answer,
            flavor,
        }
    }
}

/// How roll results are rendered
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerFormattingConfig {
    #[serde(default)]
    pub format: AnswerFormat,
    #[serde(default)]
    pub interaction: AnswerInteraction,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnswerFormat {
    #[default]
    Full,
    WithoutExpression,
    Compact,
    Minimal,
}

impl AnswerFormat {
    pub const ALL: [AnswerFormat; 4] = [
        Self::Full,
        Self::WithoutExpression,
        Self::Compact,
        Self::Minimal,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Full => "full",
            Self::WithoutExpression => "without_expression",
            Self::Compact => "compact",
            Self::Minimal => "minimal",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.as_str() == value)
    }
}

/// Whether a roll edits the roller message or posts a fresh one
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnswerInteraction {
    #[default]
    RerollInPlace,
    AppendNew,
}

impl AnswerInteraction {
    pub const ALL: [AnswerInteraction; 2] = [Self::RerollInPlace, Self::AppendNew];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RerollInPlace => "reroll_in_place",
            Self::AppendNew => "append_new",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|i| i.as_str() == value)
    }
}

/// Flavor specific parameters and state
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FlavorConfig {
    Roll(RollConfig),
    CustomDice(CustomDiceConfig),
    CountSuccesses(CountSuccessesConfig),
    HoldReroll(HoldRerollConfig),
    SumCustomSet(SumCustomSetConfig),
    SumDiceSet(SumDiceSetConfig),
    Fate(FateConfig),
    PoolTarget(PoolTargetConfig),
    ChannelDefaults,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RollConfig {
    pub expression: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DieButton {
    pub label: String,
    pub expression: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomDiceConfig {
    pub buttons: Vec<DieButton>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GlitchOption {
    #[default]
    NoGlitch,
    HalfDiceOne,
    CountOnes,
    SubtractOnes,
}

impl GlitchOption {
    pub const ALL: [GlitchOption; 4] = [
        Self::NoGlitch,
        Self::HalfDiceOne,
        Self::CountOnes,
        Self::SubtractOnes,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NoGlitch => "no_glitch",
            Self::HalfDiceOne => "half_dice_one",
            Self::CountOnes => "count_ones",
            Self::SubtractOnes => "subtract_ones",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|g| g.as_str() == value)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountSuccessesConfig {
    pub sides: u32,
    pub target: u32,
    #[serde(default)]
    pub glitch: GlitchOption,
    pub max_dice: u32,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HoldRerollState {
    pub current: Vec<u32>,
    pub held: BTreeSet<usize>,
    pub reroll_count: u32,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HoldRerollConfig {
    pub sides: u32,
    #[serde(default)]
    pub reroll_set: BTreeSet<u32>,
    #[serde(default)]
    pub success_set: BTreeSet<u32>,
    #[serde(default)]
    pub failure_set: BTreeSet<u32>,
    #[serde(default)]
    pub state: HoldRerollState,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SumState {
    pub expressions: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locked_to: Option<u64>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SumCustomSetConfig {
    pub buttons: Vec<DieButton>,
    #[serde(default)]
    pub state: SumState,
}

/// Pending set of standard dice, keyed by number of sides
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SumDiceSetConfig {
    /// Negative counts subtract their dice
    #[serde(default)]
    pub dice: BTreeMap<u32, i32>,
    #[serde(default)]
    pub modifier: i32,
}

impl SumDiceSetConfig {
    pub fn is_empty(&self) -> bool {
        self.dice.is_empty() && self.modifier == 0
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FateKind {
    #[default]
    Simple,
    WithModifier,
}

impl FateKind {
    pub const ALL: [FateKind; 2] = [Self::Simple, Self::WithModifier];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Simple => "simple",
            Self::WithModifier => "with_modifier",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.as_str() == value)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FateConfig {
    pub kind: FateKind,
}

/// Whether dice in the reroll set are rerolled right away or on request
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RerollVariant {
    #[default]
    Always,
    Ask,
}

impl RerollVariant {
    pub const ALL: [RerollVariant; 2] = [Self::Always, Self::Ask];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Always => "always",
            Self::Ask => "ask",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|v| v.as_str() == value)
    }
}

/// Choices made so far: first the pool, then the target number
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolTargetState {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pool: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<u32>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolTargetConfig {
    pub sides: u32,
    pub max_dice: u32,
    #[serde(default)]
    pub reroll_set: BTreeSet<u32>,
    #[serde(default)]
    pub botch_set: BTreeSet<u32>,
    #[serde(default)]
    pub reroll_variant: RerollVariant,
    #[serde(default)]
    pub state: PoolTargetState,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_roll_config_serialized_shape() {
        let config = CommandConfig::new(
            "roll",
            1,
            "en",
            AnswerFormattingConfig::default(),
            FlavorConfig::Roll(RollConfig {
                expression: "2d6+3".into(),
                label: None,
            }),
        );
        let value = serde_json::to_value(&config).unwrap();
        assert_eq!(value["schema_version"], json!(1));
        assert_eq!(value["flavor"]["type"], json!("roll"));
        assert_eq!(value["flavor"]["expression"], json!("2d6+3"));
        assert_eq!(value["answer"]["format"], json!("full"));
    }

    #[test]
    fn test_channel_defaults_flavor_is_unit() {
        let value = serde_json::to_value(FlavorConfig::ChannelDefaults).unwrap();
        assert_eq!(value, json!({"type": "channel_defaults"}));
    }

    #[test]
    fn test_dice_set_keys_survive_json() {
        let mut set = SumDiceSetConfig::default();
        set.dice.insert(6, 2);
        set.dice.insert(4, -1);
        let value = serde_json::to_value(FlavorConfig::SumDiceSet(set.clone())).unwrap();
        assert_eq!(value["dice"]["6"], json!(2));
        let back: FlavorConfig = serde_json::from_value(value).unwrap();
        assert_eq!(back, FlavorConfig::SumDiceSet(set));
    }

    #[test]
    fn test_option_parsing() {
        assert_eq!(AnswerFormat::parse("compact"), Some(AnswerFormat::Compact));
        assert_eq!(AnswerFormat::parse("fancy"), None);
        assert_eq!(
            AnswerInteraction::parse("append_new"),
            Some(AnswerInteraction::AppendNew)
        );
        assert_eq!(
            GlitchOption::parse("subtract_ones"),
            Some(GlitchOption::SubtractOnes)
        );
        assert_eq!(FateKind::parse("with_modifier"), Some(FateKind::WithModifier));
        assert_eq!(RerollVariant::parse("ask"), Some(RerollVariant::Ask));
        assert_eq!(RerollVariant::parse("never"), None);
    }
}
