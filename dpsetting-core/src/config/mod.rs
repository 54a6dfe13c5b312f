//! Configuration types and the optional TOML config file.
//!
//! - `DiscoveryConfig`: pointer file, candidate roots and installation layout
//! - `ConnectionConfig`: non-secret datastore connection settings
//!
//! # Security
//! The config file never holds credentials. They come from the caller or from
//! the installation's embedded database config.

mod connection;
mod discovery;

pub use connection::{ConnectionConfig, DEFAULT_MYSQL_PORT};
pub use discovery::DiscoveryConfig;

use crate::Result;
use crate::error::SettingError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Location of the system-wide config file.
pub const DEFAULT_CONFIG_PATH: &str = "/etc/dpsetting/config.toml";

/// Top-level configuration.
///
/// ```toml
/// [discovery]
/// candidates = ["/opt/deskpro", "/srv/deskpro"]
///
/// [connection]
/// port = 3307
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Installation discovery settings
    #[serde(default)]
    pub discovery: DiscoveryConfig,
    /// Datastore connection settings
    #[serde(default)]
    pub connection: ConnectionConfig,
}

impl Config {
    /// Parses configuration from TOML text.
    ///
    /// # Errors
    /// Returns a configuration error for invalid TOML or invalid values.
    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: Self = toml::from_str(contents)
            .map_err(|e| SettingError::configuration(format!("Invalid config file: {}", e)))?;
        config.connection.validate()?;
        Ok(config)
    }

    /// Loads configuration from a file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            SettingError::io(format!("Failed to read config file {}", path.display()), e)
        })?;
        Self::from_toml(&contents)
    }

    /// Loads the named file, or the system-wide file when it exists, or
    /// falls back to defaults.
    ///
    /// # Errors
    /// Returns an error if an explicitly named file is missing, or if any
    /// file that is read fails to parse.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(config_path) => Self::load_from_file(config_path),
            None => {
                let default_path = PathBuf::from(DEFAULT_CONFIG_PATH);
                if default_path.is_file() {
                    Self::load_from_file(&default_path)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_empty_toml_gives_defaults() {
        let config = Config::from_toml("").unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_partial_toml_keeps_other_defaults() {
        let config = Config::from_toml(
            r#"
            [discovery]
            candidates = ["/opt/deskpro"]

            [connection]
            port = 3307
            "#,
        )
        .unwrap();

        assert_eq!(config.discovery.candidates, vec![PathBuf::from("/opt/deskpro")]);
        assert_eq!(
            config.discovery.pointer_file,
            PathBuf::from("/etc/deskpro/install-path")
        );
        assert_eq!(config.connection.port, 3307);
        assert_eq!(config.connection.connect_timeout_secs, 30);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let result = Config::from_toml("[connection]\nport = 0\n");
        assert!(matches!(result, Err(SettingError::Configuration { .. })));

        let result = Config::from_toml("[discovery\n");
        assert!(matches!(result, Err(SettingError::Configuration { .. })));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[discovery]\npointer_file = \"/tmp/pointer\"").unwrap();

        let config = Config::load_or_default(Some(file.path())).unwrap();
        assert_eq!(config.discovery.pointer_file, PathBuf::from("/tmp/pointer"));
    }

    #[test]
    fn test_missing_explicit_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = Config::load_or_default(Some(&dir.path().join("missing.toml")));
        assert!(matches!(result, Err(SettingError::Io { .. })));
    }
}
