//! Settings persistence.
//!
//! The `settings` table holds one row per name:
//!
//! ```sql
//! CREATE TABLE settings (name VARCHAR(255) PRIMARY KEY, value LONGTEXT);
//! ```
//!
//! Every store call runs in its own transaction. A dropped transaction rolls
//! back, so an error part-way through never leaves a write behind.
//!
//! # Module Structure
//! - `sqlx_store`: macro generating a sqlx-backed store for one driver
//! - `mysql`: production backend (feature `mysql`)
//! - `sqlite`: embedded backend for local stores and tests (feature `sqlite`)
//!
//! # Concurrency
//! There is no optimistic locking. Two concurrent upserts of the same name
//! race and the last commit wins.

use crate::Result;
use crate::config::ConnectionConfig;
use crate::models::SettingOutcome;
use crate::security::DatabaseCredentials;
use async_trait::async_trait;

#[cfg(any(feature = "mysql", feature = "sqlite"))]
mod sqlx_store;

#[cfg(feature = "mysql")]
pub mod mysql;

#[cfg(feature = "sqlite")]
pub mod sqlite;

#[cfg(feature = "mysql")]
pub use mysql::{MySqlConnector, MySqlSettingsStore};

#[cfg(feature = "sqlite")]
pub use sqlite::{SqliteConnector, SqliteSettingsStore};

pub(crate) const SELECT_VALUE_SQL: &str = "SELECT value FROM settings WHERE name = ?";
pub(crate) const INSERT_SQL: &str = "INSERT INTO settings (name, value) VALUES (?, ?)";
pub(crate) const UPDATE_SQL: &str = "UPDATE settings SET value = ? WHERE name = ?";

/// Storage engines a settings store can run on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    /// MySQL / MariaDB
    MySql,
    /// SQLite file or in-memory database
    Sqlite,
}

impl std::fmt::Display for StoreBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MySql => write!(f, "MySQL"),
            Self::Sqlite => write!(f, "SQLite"),
        }
    }
}

/// Transactional access to the settings table.
///
/// # Object Safety
/// This trait is object-safe so connectors can hand out
/// `Box<dyn SettingsStore>`.
#[async_trait]
pub trait SettingsStore: Send + Sync {
    /// Reads the value stored under `name`.
    ///
    /// # Errors
    /// - `StoreIntegrity` if more than one row matches
    /// - `Datastore` on any driver failure
    async fn read_value(&self, name: &str) -> Result<Option<String>>;

    /// Creates or updates `name`, skipping the write when the stored value
    /// already equals `value`. The returned value is read back from the
    /// store after the write.
    ///
    /// # Errors
    /// Returns `Datastore` or `StoreIntegrity`; the transaction is rolled
    /// back in either case.
    async fn upsert(&self, name: &str, value: &str) -> Result<SettingOutcome>;

    /// Releases the underlying connection.
    async fn close(&self);

    /// The engine behind this store.
    fn backend(&self) -> StoreBackend;

    /// Connection target without credentials, for logs.
    fn target(&self) -> &str;
}

/// Opens a settings store from resolved credentials.
#[async_trait]
pub trait StoreConnector: Send + Sync {
    /// Connects eagerly, so connection failures surface here.
    ///
    /// # Errors
    /// Returns `Datastore` if the connection cannot be established, or
    /// `Configuration` for invalid connection settings.
    async fn connect(
        &self,
        credentials: &DatabaseCredentials,
        config: &ConnectionConfig,
    ) -> Result<Box<dyn SettingsStore>>;
}
