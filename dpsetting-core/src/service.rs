//! Read and write a single setting of an installation.
//!
//! Every operation walks the same steps, forward only:
//!
//! 1. resolve the installation (skipped when full credentials are supplied
//!    and no explicit path was given)
//! 2. resolve credentials: caller-supplied, or extracted from the
//!    installation's embedded database config
//! 3. connect to the settings database
//! 4. run the read or upsert in its own transaction
//! 5. close the connection
//!
//! A failure at any step ends the operation with that step's error. Nothing
//! is retried, and no connection is opened before step 3.

use crate::Result;
use crate::config::{Config, ConnectionConfig};
use crate::db_config;
use crate::error::SettingError;
use crate::install::InstallationLocator;
use crate::models::{SettingOutcome, WritePlan};
use crate::security::{CredentialOverrides, DatabaseCredentials, SuppliedCredentials};
use crate::store::{SettingsStore, StoreConnector};
use std::path::PathBuf;
use tracing::{debug, info};

/// Which installation and database an operation applies to.
#[derive(Debug, Clone, Default)]
pub struct SettingTarget {
    /// Explicit installation root; discovery is used when absent
    pub install_path: Option<PathBuf>,
    /// Caller-supplied credentials; all or none
    pub credentials: CredentialOverrides,
}

impl SettingTarget {
    /// Target with an explicit installation root.
    pub fn at_path(path: impl Into<PathBuf>) -> Self {
        Self {
            install_path: Some(path.into()),
            ..Default::default()
        }
    }

    /// Builder method to attach credentials.
    pub fn with_credentials(mut self, credentials: CredentialOverrides) -> Self {
        self.credentials = credentials;
        self
    }
}

/// Orchestrates discovery, credential resolution and the settings store.
pub struct SettingService {
    locator: InstallationLocator,
    connection: ConnectionConfig,
    connector: Box<dyn StoreConnector>,
}

impl std::fmt::Debug for SettingService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SettingService")
            .field("locator", &self.locator)
            .field("connection", &self.connection)
            .finish_non_exhaustive()
    }
}

impl SettingService {
    /// Creates a service that opens stores through `connector`.
    pub fn new(config: &Config, connector: impl StoreConnector + 'static) -> Self {
        Self {
            locator: InstallationLocator::new(config.discovery.clone()),
            connection: config.connection.clone(),
            connector: Box::new(connector),
        }
    }

    /// Creates a service backed by MySQL.
    #[cfg(feature = "mysql")]
    pub fn mysql(config: &Config) -> Self {
        Self::new(config, crate::store::MySqlConnector)
    }

    /// The locator used for discovery.
    pub fn locator(&self) -> &InstallationLocator {
        &self.locator
    }

    /// Reads a setting.
    ///
    /// # Errors
    /// Returns `SettingNotFound` if no row exists, or any resolution or
    /// datastore error.
    pub async fn get_setting(&self, target: &SettingTarget, name: &str) -> Result<String> {
        let store = self.open(target).await?;
        let result = store.read_value(name).await;
        store.close().await;

        result?.ok_or_else(|| SettingError::SettingNotFound {
            name: name.to_string(),
        })
    }

    /// Creates or updates a setting.
    ///
    /// # Errors
    /// Returns any resolution or datastore error; nothing is written then.
    pub async fn set_setting(
        &self,
        target: &SettingTarget,
        name: &str,
        value: &str,
    ) -> Result<SettingOutcome> {
        let store = self.open(target).await?;
        let result = store.upsert(name, value).await;
        store.close().await;
        result
    }

    /// Reports what `set_setting` would do, without writing.
    ///
    /// # Errors
    /// Same as [`Self::get_setting`], except that an absent setting is a
    /// would-be creation rather than an error.
    pub async fn preview_setting(
        &self,
        target: &SettingTarget,
        name: &str,
        value: &str,
    ) -> Result<SettingOutcome> {
        let store = self.open(target).await?;
        let current = store.read_value(name).await;
        store.close().await;

        let plan = WritePlan::for_values(current?.as_deref(), value);
        debug!(setting = name, ?plan, "Previewed setting write");

        Ok(SettingOutcome {
            name: name.to_string(),
            value: value.to_string(),
            created: plan.created(),
            changed: plan.changed(),
        })
    }

    /// Steps 1 and 2: installation and credentials.
    ///
    /// # Errors
    /// - `BrokenInstallation` / `InstallationNotFound` from discovery
    /// - `MissingCredentials` for a partial credential set
    /// - `Io` / `IncompleteConfig` from the embedded config
    pub fn resolve_credentials(&self, target: &SettingTarget) -> Result<DatabaseCredentials> {
        let explicit = target.install_path.as_deref();

        match target.credentials.classify() {
            SuppliedCredentials::Complete(credentials) => {
                if let Some(path) = explicit {
                    self.locator.validate_explicit(path)?;
                }
                info!("Using database credentials supplied by the caller");
                Ok(credentials)
            }
            SuppliedCredentials::Partial { missing } => {
                self.locator.locate(explicit)?;
                Err(SettingError::MissingCredentials { missing })
            }
            SuppliedCredentials::Nothing => {
                let installation = self.locator.locate(explicit)?;
                let config_path = installation.join(&self.locator.layout().db_config);
                let credentials = db_config::extract(&config_path)?;
                info!(
                    installation = %installation.path().display(),
                    build = installation.build(),
                    "Read database credentials from installation config"
                );
                Ok(credentials)
            }
        }
    }

    async fn open(&self, target: &SettingTarget) -> Result<Box<dyn SettingsStore>> {
        let credentials = self.resolve_credentials(target)?;
        let store = self.connector.connect(&credentials, &self.connection).await?;
        debug!(store = store.target(), backend = %store.backend(), "Connected to settings store");
        Ok(store)
    }
}
