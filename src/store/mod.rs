//! # Config Store
//!
//! Durable keyed storage of roller configurations with optimistic
//! concurrency. Backends store an opaque blob plus a version counter;
//! [`ConfigRepository`] adds typed encoding and the lazy schema upgrade.
//!
//! - **Version**: 1.1.0
//! - **Since**: 1.0.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 1.1.0: Channel-scoped keys for channel defaults
//! - 1.0.0: Message keyed store with SQLite and in-memory backends

pub mod memory;
pub mod model;
pub mod schema;
pub mod sqlite;

use async_trait::async_trait;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::core::error::StoreError;

pub use memory::MemoryConfigStore;
pub use model::{
    AnswerFormat, AnswerFormattingConfig, AnswerInteraction, CommandConfig, CountSuccessesConfig,
    CustomDiceConfig, DieButton, FateConfig, FateKind, FlavorConfig, GlitchOption,
    HoldRerollConfig, HoldRerollState, PoolTargetConfig, PoolTargetState, RerollVariant,
    RollConfig, SumCustomSetConfig, SumDiceSetConfig, SumState,
};
pub use schema::CURRENT_SCHEMA_VERSION;
pub use sqlite::SqliteConfigStore;

/// What a stored configuration is attached to
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ConfigKey {
    Message(u64),
    Channel(u64),
}

impl fmt::Display for ConfigKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Message(id) => write!(f, "message:{id}"),
            Self::Channel(id) => write!(f, "channel:{id}"),
        }
    }
}

impl FromStr for ConfigKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (scope, id) = s
            .split_once(':')
            .ok_or_else(|| format!("config key without scope: {s}"))?;
        let id: u64 = id.parse().map_err(|_| format!("bad id in config key: {s}"))?;
        match scope {
            "message" => Ok(Self::Message(id)),
            "channel" => Ok(Self::Channel(id)),
            other => Err(format!("unknown config key scope: {other}")),
        }
    }
}

/// Serialized configuration with its version as held by a backend
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoredBlob {
    pub blob: String,
    pub version: u64,
}

/// Persistence boundary: four operations on opaque blobs.
///
/// `compare_and_swap` is the only serialization point between concurrent
/// writers. It succeeds only while the stored version equals `expected`
/// and bumps the version by exactly one.
#[async_trait]
pub trait ConfigStore: Send + Sync {
    async fn load(&self, key: &ConfigKey) -> Result<StoredBlob, StoreError>;

    /// Insert a new entry at version 0
    async fn create(&self, key: &ConfigKey, blob: String) -> Result<u64, StoreError>;

    async fn compare_and_swap(
        &self,
        key: &ConfigKey,
        expected: u64,
        blob: String,
    ) -> Result<u64, StoreError>;

    async fn delete(&self, key: &ConfigKey) -> Result<(), StoreError>;
}

/// Typed access to a [`ConfigStore`]
#[derive(Clone)]
pub struct ConfigRepository {
    store: Arc<dyn ConfigStore>,
}

impl ConfigRepository {
    pub fn new(store: Arc<dyn ConfigStore>) -> Self {
        Self { store }
    }

    /// Load and decode, upgrading old schema versions on the fly
    pub async fn load(&self, key: &ConfigKey) -> Result<(CommandConfig, u64), StoreError> {
        let stored = self.store.load(key).await?;
        let config = schema::decode(&stored.blob).map_err(|e| StoreError::Corrupt {
            key: key.to_string(),
            detail: e.to_string(),
        })?;
        Ok((config, stored.version))
    }

    pub async fn create(&self, key: &ConfigKey, config: &CommandConfig) -> Result<u64, StoreError> {
        let blob = self.encode(key, config)?;
        self.store.create(key, blob).await
    }

    pub async fn compare_and_swap(
        &self,
        key: &ConfigKey,
        expected: u64,
        config: &CommandConfig,
    ) -> Result<u64, StoreError> {
        let blob = self.encode(key, config)?;
        self.store.compare_and_swap(key, expected, blob).await
    }

    pub async fn delete(&self, key: &ConfigKey) -> Result<(), StoreError> {
        self.store.delete(key).await
    }

    fn encode(&self, key: &ConfigKey, config: &CommandConfig) -> Result<String, StoreError> {
        schema::encode(config).map_err(|e| StoreError::Corrupt {
            key: key.to_string(),
            detail: e.to_string(),
        })
    }
}
