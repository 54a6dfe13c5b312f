//! Core library for dpsetting.
//!
//! Reads and writes individual rows of a Deskpro installation's `settings`
//! table. The installation is found on the local filesystem, database
//! credentials are taken from the caller or from the installation's embedded
//! PHP database config, and each read or write runs in a single transaction.
//!
//! # Security Guarantees
//! - Passwords are held in zeroizing containers and never logged
//! - Error messages describe connections as `user@host:port/db` only
//! - The optional config file never contains credentials
//!
//! # Architecture
//! - `install`: locate and validate the installation root
//! - `db_config`: extract credentials from the embedded database config
//! - `store`: transactional settings persistence behind a connector trait
//! - `service`: orchestration of the above for get, set and preview

pub mod config;
pub mod db_config;
pub mod error;
pub mod install;
pub mod logging;
pub mod models;
pub mod security;
pub mod service;
pub mod store;

// Re-export commonly used types
pub use config::{Config, ConnectionConfig, DiscoveryConfig};
pub use error::{Result, SettingError};
pub use install::InstallationLocator;
pub use models::{Installation, Setting, SettingOutcome, WritePlan};
pub use security::{CredentialOverrides, DatabaseCredentials};
pub use service::{SettingService, SettingTarget};
pub use store::{SettingsStore, StoreBackend, StoreConnector};
