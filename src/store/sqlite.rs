//! SQLite backed [`ConfigStore`]
//!
//! - **Version**: 1.0.0
//! - **Since**: 1.0.0
//!
//! ## Changelog
//! - 1.0.0: Single `message_config` table, conditional UPDATE for CAS

use async_trait::async_trait;
use log::{debug, info};
use sqlite::{Connection, State};
use std::sync::{Arc, Mutex};

use super::{ConfigKey, ConfigStore, StoredBlob};
use crate::core::error::StoreError;

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS message_config (
        config_key TEXT PRIMARY KEY,
        config TEXT NOT NULL,
        version INTEGER NOT NULL,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    );
";

/// All statements run on the blocking pool under one connection lock
#[derive(Clone)]
pub struct SqliteConfigStore {
    connection: Arc<Mutex<Connection>>,
}

impl SqliteConfigStore {
    /// Open (or create) the database file and ensure the table exists
    pub async fn open(path: &str) -> Result<Self, StoreError> {
        let path = path.to_string();
        let connection = tokio::task::spawn_blocking(move || -> Result<Connection, StoreError> {
            let connection = sqlite::open(&path)?;
            connection.execute("PRAGMA journal_mode = WAL;")?;
            connection.execute(SCHEMA)?;
            info!("Config store opened at {path}");
            Ok(connection)
        })
        .await
        .map_err(|e| StoreError::Unavailable(e.to_string()))??;

        Ok(Self {
            connection: Arc::new(Mutex::new(connection)),
        })
    }

    /// In-memory database, handy for tests
    pub async fn open_in_memory() -> Result<Self, StoreError> {
        Self::open(":memory:").await
    }

    async fn with_connection<T, F>(&self, f: F) -> Result<T, StoreError>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> Result<T, StoreError> + Send + 'static,
    {
        let connection = Arc::clone(&self.connection);
        tokio::task::spawn_blocking(move || {
            let guard = connection
                .lock()
                .map_err(|_| StoreError::Unavailable("connection lock poisoned".into()))?;
            f(&guard)
        })
        .await
        .map_err(|e| StoreError::Unavailable(e.to_string()))?
    }
}

fn current_version(connection: &Connection, key: &str) -> Result<Option<u64>, StoreError> {
    let mut statement =
        connection.prepare("SELECT version FROM message_config WHERE config_key = ?")?;
    statement.bind((1, key))?;
    if let State::Row = statement.next()? {
        Ok(Some(statement.read::<i64, _>("version")? as u64))
    } else {
        Ok(None)
    }
}

#[async_trait]
impl ConfigStore for SqliteConfigStore {
    async fn load(&self, key: &ConfigKey) -> Result<StoredBlob, StoreError> {
        let key = key.to_string();
        self.with_connection(move |connection| {
            let mut statement = connection
                .prepare("SELECT config, version FROM message_config WHERE config_key = ?")?;
            statement.bind((1, key.as_str()))?;
            if let State::Row = statement.next()? {
                Ok(StoredBlob {
                    blob: statement.read::<String, _>("config")?,
                    version: statement.read::<i64, _>("version")? as u64,
                })
            } else {
                Err(StoreError::NotFound(key))
            }
        })
        .await
    }

    async fn create(&self, key: &ConfigKey, blob: String) -> Result<u64, StoreError> {
        let key = key.to_string();
        self.with_connection(move |connection| {
            let now = chrono::Utc::now().to_rfc3339();
            let mut statement = connection.prepare(
                "INSERT OR IGNORE INTO message_config (config_key, config, version, created_at, updated_at)
                 VALUES (?, ?, 0, ?, ?)",
            )?;
            statement.bind((1, key.as_str()))?;
            statement.bind((2, blob.as_str()))?;
            statement.bind((3, now.as_str()))?;
            statement.bind((4, now.as_str()))?;
            statement.next()?;

            if connection.change_count() == 0 {
                return Err(StoreError::AlreadyExists(key));
            }
            debug!("Created config {key}");
            Ok(0)
        })
        .await
    }

    async fn compare_and_swap(
        &self,
        key: &ConfigKey,
        expected: u64,
        blob: String,
    ) -> Result<u64, StoreError> {
        let key = key.to_string();
        self.with_connection(move |connection| {
            let now = chrono::Utc::now().to_rfc3339();
            let mut statement = connection.prepare(
                "UPDATE message_config SET config = ?, version = version + 1, updated_at = ?
                 WHERE config_key = ? AND version = ?",
            )?;
            statement.bind((1, blob.as_str()))?;
            statement.bind((2, now.as_str()))?;
            statement.bind((3, key.as_str()))?;
            statement.bind((4, expected as i64))?;
            statement.next()?;

            if connection.change_count() == 1 {
                return Ok(expected + 1);
            }
            // The lock is still held, so this read sees the state that beat us.
            match current_version(connection, &key)? {
                Some(_) => Err(StoreError::VersionConflict { key, expected }),
                None => Err(StoreError::NotFound(key)),
            }
        })
        .await
    }

    async fn delete(&self, key: &ConfigKey) -> Result<(), StoreError> {
        let key = key.to_string();
        self.with_connection(move |connection| {
            let mut statement =
                connection.prepare("DELETE FROM message_config WHERE config_key = ?")?;
            statement.bind((1, key.as_str()))?;
            statement.next()?;
            if connection.change_count() == 0 {
                return Err(StoreError::NotFound(key));
            }
            debug!("Deleted config {key}");
            Ok(())
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_load_round_trip() {
        let store = SqliteConfigStore::open_in_memory().await.unwrap();
        let key = ConfigKey::Message(100);

        assert_eq!(store.create(&key, "{\"a\":1}".into()).await.unwrap(), 0);
        let loaded = store.load(&key).await.unwrap();
        assert_eq!(loaded.blob, "{\"a\":1}");
        assert_eq!(loaded.version, 0);
    }

    #[tokio::test]
    async fn test_duplicate_create_rejected() {
        let store = SqliteConfigStore::open_in_memory().await.unwrap();
        let key = ConfigKey::Channel(7);
        store.create(&key, "x".into()).await.unwrap();
        assert_eq!(
            store.create(&key, "y".into()).await,
            Err(StoreError::AlreadyExists("channel:7".into()))
        );
    }

    #[tokio::test]
    async fn test_cas_semantics() {
        let store = SqliteConfigStore::open_in_memory().await.unwrap();
        let key = ConfigKey::Message(1);
        store.create(&key, "v0".into()).await.unwrap();

        assert_eq!(store.compare_and_swap(&key, 0, "v1".into()).await.unwrap(), 1);
        assert!(matches!(
            store.compare_and_swap(&key, 0, "stale".into()).await,
            Err(StoreError::VersionConflict { expected: 0, .. })
        ));
        assert_eq!(store.compare_and_swap(&key, 1, "v2".into()).await.unwrap(), 2);

        let loaded = store.load(&key).await.unwrap();
        assert_eq!((loaded.blob.as_str(), loaded.version), ("v2", 2));
    }

    #[tokio::test]
    async fn test_delete_then_cas_is_not_found() {
        let store = SqliteConfigStore::open_in_memory().await.unwrap();
        let key = ConfigKey::Message(2);
        store.create(&key, "v0".into()).await.unwrap();
        store.delete(&key).await.unwrap();

        assert!(matches!(
            store.compare_and_swap(&key, 0, "v1".into()).await,
            Err(StoreError::NotFound(_))
        ));
        assert!(matches!(store.delete(&key).await, Err(StoreError::NotFound(_))));
    }
}
