//! MySQL settings store.
//!
//! # Connection
//! - One pooled connection, opened eagerly so a bad host or password fails
//!   at the connect step rather than on the first query
//! - `host:port` hosts from embedded configs are honoured
//! - Optional unix socket from `ConnectionConfig`
//!
//! # Security
//! Error contexts name `user@host:port/db` only; the password never leaves
//! `MySqlConnectOptions`.

use super::sqlx_store::define_sqlx_settings_store;
use super::{SettingsStore, StoreBackend, StoreConnector};
use crate::Result;
use crate::config::ConnectionConfig;
use crate::error::SettingError;
use crate::security::DatabaseCredentials;
use async_trait::async_trait;
use sqlx::mysql::{MySqlConnectOptions, MySqlPoolOptions};
use tracing::debug;

define_sqlx_settings_store!(
    /// Settings store on a MySQL (or MariaDB) database.
    MySqlSettingsStore,
    sqlx::MySql,
    sqlx::MySqlPool,
    sqlx::MySqlConnection,
    StoreBackend::MySql
);

impl MySqlSettingsStore {
    /// Connects to the settings database.
    ///
    /// # Errors
    /// - `Configuration` if `config` is invalid
    /// - `Datastore` if the server cannot be reached or rejects the login
    pub async fn connect(
        credentials: &DatabaseCredentials,
        config: &ConnectionConfig,
    ) -> Result<Self> {
        config.validate()?;

        let target = credentials.safe_description(config.port);
        let options = connect_options(credentials, config);

        debug!(target_db = %target, "Connecting to settings database");

        let pool = MySqlPoolOptions::new()
            .max_connections(1)
            .min_connections(0)
            .acquire_timeout(config.connect_timeout())
            .test_before_acquire(true)
            .connect_with(options)
            .await
            .map_err(|e| SettingError::datastore(format!("Failed to connect to {}", target), e))?;

        Ok(Self::from_pool(pool, target))
    }
}

/// Builds driver options from credentials and connection settings.
pub fn connect_options(
    credentials: &DatabaseCredentials,
    config: &ConnectionConfig,
) -> MySqlConnectOptions {
    let (host, port) = credentials.endpoint(config.port);

    let options = MySqlConnectOptions::new()
        .host(host)
        .port(port)
        .username(credentials.user())
        .password(credentials.password())
        .database(credentials.dbname());

    match &config.unix_socket {
        Some(socket) => options.socket(socket),
        None => options,
    }
}

/// Connector for the production MySQL backend.
#[derive(Debug, Clone, Copy, Default)]
pub struct MySqlConnector;

#[async_trait]
impl StoreConnector for MySqlConnector {
    async fn connect(
        &self,
        credentials: &DatabaseCredentials,
        config: &ConnectionConfig,
    ) -> Result<Box<dyn SettingsStore>> {
        let store = MySqlSettingsStore::connect(credentials, config).await?;
        Ok(Box::new(store))
    }
}
