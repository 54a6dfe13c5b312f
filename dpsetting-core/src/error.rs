//! Error types for installation discovery and settings persistence.
//!
//! Every failure a caller can see maps to one variant here. Messages are
//! written to be shown verbatim to an operator: they name the path, field or
//! key involved, but never a database password.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for dpsetting operations.
///
/// # Security
/// Datastore errors carry host and database names only. Credentials are
/// never formatted into any message.
#[derive(Debug, Error)]
pub enum SettingError {
    /// No valid installation was found at the pointer target or any candidate
    #[error("Could not find a Deskpro installation (searched: {})", display_paths(.searched))]
    InstallationNotFound { searched: Vec<PathBuf> },

    /// A read asked for a setting that has never been written
    #[error("Setting `{name}` does not exist")]
    SettingNotFound { name: String },

    /// The path looks like an installation but its layout is inconsistent,
    /// or an explicitly requested path is not an installation at all
    #[error("Broken installation at `{}`: {reason}", .path.display())]
    BrokenInstallation { path: PathBuf, reason: String },

    /// The embedded database config did not yield all four credentials
    #[error(
        "Could not detect database configuration automatically from `{}` (found: [{}], missing: [{}]). \
         Please check the config file for syntax errors or use the `login_*` options to \
         specify the database credentials manually.",
        .path.display(),
        .found.join(", "),
        .missing.join(", ")
    )]
    IncompleteConfig {
        path: PathBuf,
        found: Vec<String>,
        missing: Vec<&'static str>,
    },

    /// Some, but not all, credential options were supplied
    #[error(
        "You need to use either all or no `login_*` options. Missing options: {}",
        .missing.join(", ")
    )]
    MissingCredentials { missing: Vec<&'static str> },

    /// Connection or query failure in the relational store
    #[error("Datastore operation failed: {context}")]
    Datastore {
        context: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The unique-name invariant of the settings table does not hold
    #[error("Store integrity violated: {rows} rows found for setting `{name}`")]
    StoreIntegrity { name: String, rows: usize },

    /// I/O operation failed
    #[error("I/O operation failed: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    /// Configuration or validation error
    #[error("Configuration error: {message}")]
    Configuration { message: String },
}

/// Convenience type alias for Results with SettingError
pub type Result<T> = std::result::Result<T, SettingError>;

fn display_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

impl SettingError {
    /// Creates a datastore error with context, wrapping the driver error
    pub fn datastore<E>(context: impl Into<String>, error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Datastore {
            context: context.into(),
            source: Box::new(error),
        }
    }

    /// Creates a broken installation error
    pub fn broken_installation(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::BrokenInstallation {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Creates an I/O error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Creates a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// True for both flavours of "not found": no installation, or no setting.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::InstallationNotFound { .. } | Self::SettingNotFound { .. }
        )
    }

    /// True when the failure came from the relational store.
    pub fn is_datastore(&self) -> bool {
        matches!(self, Self::Datastore { .. } | Self::StoreIntegrity { .. })
    }
}
