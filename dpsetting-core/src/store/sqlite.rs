//! SQLite settings store.
//!
//! SQLite has no logins, so the connector ignores the resolved credentials
//! and opens a fixed database file. A single connection is used, which keeps
//! in-memory databases coherent across transactions.

use super::sqlx_store::define_sqlx_settings_store;
use super::{SettingsStore, StoreBackend, StoreConnector};
use crate::Result;
use crate::config::ConnectionConfig;
use crate::error::SettingError;
use crate::security::DatabaseCredentials;
use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::path::{Path, PathBuf};
use std::str::FromStr;

define_sqlx_settings_store!(
    /// Settings store on a SQLite database.
    SqliteSettingsStore,
    sqlx::Sqlite,
    sqlx::SqlitePool,
    sqlx::SqliteConnection,
    StoreBackend::Sqlite
);

impl SqliteSettingsStore {
    /// Opens (creating if needed) the database file at `path`.
    ///
    /// The `settings` table must already exist.
    ///
    /// # Errors
    /// Returns `Datastore` if the file cannot be opened.
    pub async fn open(path: &Path) -> Result<Self> {
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);
        Self::open_with(options, path.display().to_string()).await
    }

    /// Opens a private in-memory database.
    ///
    /// # Errors
    /// Returns `Datastore` if SQLite cannot be initialised.
    pub async fn in_memory() -> Result<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")
            .map_err(|e| SettingError::datastore("Invalid in-memory SQLite options", e))?;
        Self::open_with(options, ":memory:").await
    }

    async fn open_with(options: SqliteConnectOptions, target: impl Into<String>) -> Result<Self> {
        let target = target.into();
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .map_err(|e| SettingError::datastore(format!("Failed to open {}", target), e))?;
        Ok(Self::from_pool(pool, format!("sqlite://{}", target)))
    }
}

/// Connector that opens one SQLite file for every invocation.
#[derive(Debug, Clone)]
pub struct SqliteConnector {
    path: PathBuf,
}

impl SqliteConnector {
    /// Creates a connector for the database file at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl StoreConnector for SqliteConnector {
    async fn connect(
        &self,
        _credentials: &DatabaseCredentials,
        _config: &ConnectionConfig,
    ) -> Result<Box<dyn SettingsStore>> {
        let store = SqliteSettingsStore::open(&self.path).await?;
        Ok(Box::new(store))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CREATE_TABLE: &str =
        "CREATE TABLE settings (name VARCHAR(255) NOT NULL PRIMARY KEY, value TEXT NOT NULL)";

    async fn store_with_table() -> SqliteSettingsStore {
        let store = SqliteSettingsStore::in_memory().await.unwrap();
        sqlx::query(CREATE_TABLE).execute(store.pool()).await.unwrap();
        store
    }

    #[tokio::test]
    async fn test_read_absent_is_none() {
        let store = store_with_table().await;
        assert_eq!(store.read_value("potato.url").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_upsert_creates_then_updates_then_skips() {
        let store = store_with_table().await;

        let created = store.upsert("potato.variety", "russet").await.unwrap();
        assert!(created.created);
        assert!(created.changed);
        assert_eq!(created.value, "russet");

        let updated = store.upsert("potato.variety", "yukon").await.unwrap();
        assert!(!updated.created);
        assert!(updated.changed);
        assert_eq!(updated.value, "yukon");

        let unchanged = store.upsert("potato.variety", "yukon").await.unwrap();
        assert!(!unchanged.created);
        assert!(!unchanged.changed);

        assert_eq!(
            store.read_value("potato.variety").await.unwrap().as_deref(),
            Some("yukon")
        );
    }

    #[tokio::test]
    async fn test_empty_value_is_updated_in_place() {
        let store = store_with_table().await;
        store.upsert("potato.flavour", "").await.unwrap();

        let outcome = store.upsert("potato.flavour", "earthy").await.unwrap();
        assert!(!outcome.created);
        assert!(outcome.changed);
    }

    #[tokio::test]
    async fn test_null_value_reads_empty_and_can_be_repaired() {
        let store = SqliteSettingsStore::in_memory().await.unwrap();
        sqlx::query("CREATE TABLE settings (name TEXT PRIMARY KEY, value TEXT)")
            .execute(store.pool())
            .await
            .unwrap();
        sqlx::query("INSERT INTO settings (name, value) VALUES ('potato.eyes', NULL)")
            .execute(store.pool())
            .await
            .unwrap();

        assert_eq!(
            store.read_value("potato.eyes").await.unwrap().as_deref(),
            Some("")
        );

        let outcome = store.upsert("potato.eyes", "many").await.unwrap();
        assert!(!outcome.created);
        assert!(outcome.changed);
        assert_eq!(outcome.value, "many");
    }

    #[tokio::test]
    async fn test_duplicate_rows_violate_integrity() {
        let store = SqliteSettingsStore::in_memory().await.unwrap();
        sqlx::query("CREATE TABLE settings (name TEXT, value TEXT)")
            .execute(store.pool())
            .await
            .unwrap();
        sqlx::query("INSERT INTO settings VALUES ('dup', 'a'), ('dup', 'b')")
            .execute(store.pool())
            .await
            .unwrap();

        match store.read_value("dup").await {
            Err(SettingError::StoreIntegrity { name, rows }) => {
                assert_eq!(name, "dup");
                assert_eq!(rows, 2);
            }
            other => panic!("expected StoreIntegrity, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_failed_write_rolls_back() {
        let store = SqliteSettingsStore::in_memory().await.unwrap();
        sqlx::query(
            "CREATE TABLE settings (name TEXT PRIMARY KEY, value TEXT NOT NULL CHECK (value <> 'bad'))",
        )
        .execute(store.pool())
        .await
        .unwrap();
        store.upsert("potato.shape", "round").await.unwrap();

        let result = store.upsert("potato.shape", "bad").await;
        assert!(matches!(result, Err(SettingError::Datastore { .. })));
        assert_eq!(
            store.read_value("potato.shape").await.unwrap().as_deref(),
            Some("round")
        );
    }

    #[tokio::test]
    async fn test_missing_table_is_datastore_error() {
        let store = SqliteSettingsStore::in_memory().await.unwrap();
        let result = store.read_value("anything").await;
        assert!(matches!(result, Err(SettingError::Datastore { .. })));
    }

    #[tokio::test]
    async fn test_connector_opens_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.db");

        let bootstrap = SqliteSettingsStore::open(&path).await.unwrap();
        sqlx::query(CREATE_TABLE).execute(bootstrap.pool()).await.unwrap();
        bootstrap.upsert("potato.color", "purple").await.unwrap();
        bootstrap.close().await;

        let connector = SqliteConnector::new(&path);
        let creds = DatabaseCredentials::new("ignored", "ignored", "ignored", "ignored");
        let store = connector
            .connect(&creds, &ConnectionConfig::default())
            .await
            .unwrap();

        assert_eq!(store.backend(), StoreBackend::Sqlite);
        assert_eq!(
            store.read_value("potato.color").await.unwrap().as_deref(),
            Some("purple")
        );
        store.close().await;
    }
}
