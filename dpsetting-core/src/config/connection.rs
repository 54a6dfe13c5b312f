//! Database connection configuration.
//!
//! This module provides the `ConnectionConfig` struct for the settings that
//! shape a datastore connection but are not credentials.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Default MySQL port.
pub const DEFAULT_MYSQL_PORT: u16 = 3306;

/// Configuration for datastore connections.
///
/// # Security
/// This struct intentionally does NOT store passwords or credentials.
/// Credentials are resolved per invocation and held in
/// [`crate::security::DatabaseCredentials`].
///
/// # Example
/// ```rust
/// use dpsetting_core::config::ConnectionConfig;
///
/// let config = ConnectionConfig::default().with_port(3307);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionConfig {
    /// TCP port of the database server
    pub port: u16,
    /// Unix socket to use instead of TCP, when set
    pub unix_socket: Option<PathBuf>,
    /// Seconds to wait for the connection to be established
    pub connect_timeout_secs: u64,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_MYSQL_PORT,
            unix_socket: None,
            connect_timeout_secs: 30,
        }
    }
}

impl ConnectionConfig {
    /// Validates connection configuration parameters.
    ///
    /// # Errors
    /// Returns error if configuration values are invalid
    pub fn validate(&self) -> crate::Result<()> {
        if self.port == 0 {
            return Err(crate::error::SettingError::configuration(
                "port must be greater than 0",
            ));
        }

        if self.connect_timeout_secs == 0 {
            return Err(crate::error::SettingError::configuration(
                "connect_timeout_secs must be greater than 0",
            ));
        }

        if self.connect_timeout_secs > 300 {
            return Err(crate::error::SettingError::configuration(
                "connect_timeout_secs should not exceed 300",
            ));
        }

        Ok(())
    }

    /// Connection timeout as a `Duration`.
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    /// Builder method to set port.
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Builder method to connect through a unix socket.
    pub fn with_unix_socket(mut self, socket: impl Into<PathBuf>) -> Self {
        self.unix_socket = Some(socket.into());
        self
    }

    /// Builder method to set the connect timeout in seconds.
    pub fn with_connect_timeout_secs(mut self, secs: u64) -> Self {
        self.connect_timeout_secs = secs;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_config_default() {
        let config = ConnectionConfig::default();
        assert_eq!(config.port, 3306);
        assert_eq!(config.unix_socket, None);
        assert_eq!(config.connect_timeout(), Duration::from_secs(30));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_connection_config_validation() {
        let config = ConnectionConfig::default().with_port(0);
        assert!(config.validate().is_err());

        let config = ConnectionConfig::default().with_connect_timeout_secs(0);
        assert!(config.validate().is_err());

        let config = ConnectionConfig::default().with_connect_timeout_secs(301);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_connection_config_builder() {
        let config = ConnectionConfig::default()
            .with_port(3307)
            .with_unix_socket("/run/mysqld/mysqld.sock")
            .with_connect_timeout_secs(5);

        assert_eq!(config.port, 3307);
        assert_eq!(
            config.unix_socket,
            Some(PathBuf::from("/run/mysqld/mysqld.sock"))
        );
        assert_eq!(config.connect_timeout_secs, 5);
    }
}
