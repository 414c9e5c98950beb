//! Config blob encoding and the lazy upgrade chain
//!
//! Blobs carry a `schema_version`. Older blobs are upgraded step by step on
//! load (`v0 -> v1 -> ...`); the upgraded form is written back by the next
//! successful compare-and-swap.

use serde_json::{json, Map, Value};
use thiserror::Error;

use super::model::CommandConfig;

pub const CURRENT_SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("malformed config blob: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("config blob is not a JSON object")]
    NotAnObject,
    #[error("schema version {0} is newer than this build understands")]
    FromFuture(u64),
    #[error("no upgrade registered from schema version {0}")]
    MissingUpgrade(u32),
}

type Upgrade = fn(Map<String, Value>) -> Result<Map<String, Value>, SchemaError>;

/// `UPGRADES[n]` lifts a blob from version `n` to `n + 1`
const UPGRADES: &[Upgrade] = &[upgrade_v0_to_v1];

/// v0 kept a flat `answer_format` string next to the flavor
fn upgrade_v0_to_v1(mut blob: Map<String, Value>) -> Result<Map<String, Value>, SchemaError> {
    let format = blob
        .remove("answer_format")
        .unwrap_or_else(|| Value::String("full".into()));
    blob.insert(
        "answer".into(),
        json!({ "format": format, "interaction": "reroll_in_place" }),
    );
    blob.insert("schema_version".into(), json!(1));
    Ok(blob)
}

pub fn encode(config: &CommandConfig) -> Result<String, SchemaError> {
    Ok(serde_json::to_string(config)?)
}

/// Decode a stored blob, upgrading it to [`CURRENT_SCHEMA_VERSION`] first
pub fn decode(blob: &str) -> Result<CommandConfig, SchemaError> {
    let Value::Object(mut object) = serde_json::from_str::<Value>(blob)? else {
        return Err(SchemaError::NotAnObject);
    };

    let stored = object
        .get("schema_version")
        .and_then(Value::as_u64)
        .unwrap_or(0);
    let mut version = match u32::try_from(stored) {
        Ok(version) if version <= CURRENT_SCHEMA_VERSION => version,
        _ => return Err(SchemaError::FromFuture(stored)),
    };

    while version < CURRENT_SCHEMA_VERSION {
        let upgrade = UPGRADES
            .get(version as usize)
            .ok_or(SchemaError::MissingUpgrade(version))?;
        object = upgrade(object)?;
        version += 1;
    }

    Ok(serde_json::from_value(Value::Object(object))?)
}
