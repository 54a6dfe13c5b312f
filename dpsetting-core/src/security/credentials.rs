//! Database credential containers with automatic memory zeroing.
//!
//! # Security
//! - Passwords are stored in `Zeroizing` containers and cleared on drop
//! - `Debug` output never includes the password
//! - `safe_description` renders a connection target suitable for logs

use std::fmt;
use url::Url;
use zeroize::Zeroizing;

/// External option names, in the order they are reported when missing.
pub const CREDENTIAL_FIELDS: [&str; 4] = ["login_host", "login_user", "login_password", "db"];

/// Complete set of credentials for the settings database.
///
/// # Example
///
/// ```rust
/// use dpsetting_core::security::DatabaseCredentials;
///
/// let creds = DatabaseCredentials::new("localhost", "deskpro", "secret", "deskpro");
/// assert_eq!(creds.user(), "deskpro");
/// assert!(!format!("{:?}", creds).contains("secret"));
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct DatabaseCredentials {
    host: String,
    user: String,
    password: Zeroizing<String>,
    dbname: String,
}

impl DatabaseCredentials {
    /// Creates credentials; the password moves into zeroizing storage.
    pub fn new(
        host: impl Into<String>,
        user: impl Into<String>,
        password: impl Into<String>,
        dbname: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            user: user.into(),
            password: Zeroizing::new(password.into()),
            dbname: dbname.into(),
        }
    }

    /// Database host, possibly with a `:port` suffix
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Database user
    pub fn user(&self) -> &str {
        &self.user
    }

    /// Database password. Do not log.
    pub fn password(&self) -> &str {
        &self.password
    }

    /// Database name
    pub fn dbname(&self) -> &str {
        &self.dbname
    }

    /// Splits the host into name and port, falling back to `default_port`.
    ///
    /// Deskpro configs sometimes write `127.0.0.1:3307` as the host. A bare
    /// IPv6 literal is returned unchanged.
    pub fn endpoint(&self, default_port: u16) -> (&str, u16) {
        if let Some((name, port)) = self.host.rsplit_once(':')
            && !name.contains(':')
            && let Ok(port) = port.parse::<u16>()
        {
            return (name, port);
        }
        (&self.host, default_port)
    }

    /// Renders `mysql://user@host:port/db` for logs and error messages.
    pub fn safe_description(&self, default_port: u16) -> String {
        let (host, port) = self.endpoint(default_port);
        let Ok(mut url) = Url::parse("mysql://localhost") else {
            return "<redacted>".to_string();
        };
        if url.set_host(Some(host)).is_err() {
            return "<redacted>".to_string();
        }
        if url.set_username(&self.user).is_err() || url.set_port(Some(port)).is_err() {
            return "<redacted>".to_string();
        }
        url.set_path(&self.dbname);
        url.to_string()
    }
}

impl fmt::Debug for DatabaseCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseCredentials")
            .field("host", &self.host)
            .field("user", &self.user)
            .field("password", &"****")
            .field("dbname", &self.dbname)
            .finish()
    }
}

/// Credentials supplied by the caller, any of which may be absent.
///
/// Empty strings count as absent.
#[derive(Clone, Default)]
pub struct CredentialOverrides {
    /// `login_host`
    pub login_host: Option<String>,
    /// `login_user`
    pub login_user: Option<String>,
    /// `login_password`
    pub login_password: Option<Zeroizing<String>>,
    /// `db`
    pub db: Option<String>,
}

/// How much of the credential set the caller supplied.
#[derive(Debug)]
pub enum SuppliedCredentials {
    /// Nothing supplied; credentials must be discovered
    Nothing,
    /// Some fields supplied; the rest are listed
    Partial {
        /// Names of the fields that were not supplied
        missing: Vec<&'static str>,
    },
    /// Everything supplied
    Complete(DatabaseCredentials),
}

impl CredentialOverrides {
    /// Builder for a full set of overrides.
    pub fn complete(
        host: impl Into<String>,
        user: impl Into<String>,
        password: impl Into<String>,
        db: impl Into<String>,
    ) -> Self {
        Self {
            login_host: Some(host.into()),
            login_user: Some(user.into()),
            login_password: Some(Zeroizing::new(password.into())),
            db: Some(db.into()),
        }
    }

    /// Classifies the supplied fields.
    pub fn classify(&self) -> SuppliedCredentials {
        let host = non_empty(self.login_host.as_deref());
        let user = non_empty(self.login_user.as_deref());
        let password = non_empty(self.login_password.as_ref().map(|p| p.as_str()));
        let db = non_empty(self.db.as_deref());

        match (host, user, password, db) {
            (Some(host), Some(user), Some(password), Some(db)) => {
                SuppliedCredentials::Complete(DatabaseCredentials::new(host, user, password, db))
            }
            (None, None, None, None) => SuppliedCredentials::Nothing,
            (host, user, password, db) => {
                let present = [host.is_some(), user.is_some(), password.is_some(), db.is_some()];
                let missing = CREDENTIAL_FIELDS
                    .iter()
                    .zip(present)
                    .filter(|(_, present)| !present)
                    .map(|(name, _)| *name)
                    .collect();
                SuppliedCredentials::Partial { missing }
            }
        }
    }
}

impl fmt::Debug for CredentialOverrides {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialOverrides")
            .field("login_host", &self.login_host)
            .field("login_user", &self.login_user)
            .field("login_password", &self.login_password.as_ref().map(|_| "****"))
            .field("db", &self.db)
            .finish()
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_redacts_password() {
        let creds = DatabaseCredentials::new("db.internal", "deskpro", "hunter2", "deskpro");
        let debug = format!("{:?}", creds);
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("db.internal"));

        let overrides = CredentialOverrides::complete("h", "u", "hunter2", "d");
        assert!(!format!("{:?}", overrides).contains("hunter2"));
    }

    #[test]
    fn test_endpoint_splits_port() {
        let creds = DatabaseCredentials::new("127.0.0.1:3307", "u", "p", "d");
        assert_eq!(creds.endpoint(3306), ("127.0.0.1", 3307));

        let creds = DatabaseCredentials::new("localhost", "u", "p", "d");
        assert_eq!(creds.endpoint(3306), ("localhost", 3306));

        let creds = DatabaseCredentials::new("::1", "u", "p", "d");
        assert_eq!(creds.endpoint(3306), ("::1", 3306));
    }

    #[test]
    fn test_safe_description_omits_password() {
        let creds = DatabaseCredentials::new("db.internal", "deskpro", "hunter2", "helpdesk");
        let description = creds.safe_description(3306);
        assert_eq!(description, "mysql://deskpro@db.internal:3306/helpdesk");
        assert!(!description.contains("hunter2"));
    }

    #[test]
    fn test_safe_description_encodes_user_or_redacts() {
        let creds = DatabaseCredentials::new("db.internal:3307", "dp@ops", "hunter2", "helpdesk");
        let description = creds.safe_description(3306);
        assert_eq!(description, "mysql://dp%40ops@db.internal:3307/helpdesk");
        assert!(!description.contains("hunter2"));

        let unparseable = DatabaseCredentials::new("bad host", "deskpro", "hunter2", "helpdesk");
        assert_eq!(unparseable.safe_description(3306), "<redacted>");
    }

    #[test]
    fn test_classify_nothing() {
        assert!(matches!(
            CredentialOverrides::default().classify(),
            SuppliedCredentials::Nothing
        ));

        let empty_strings = CredentialOverrides {
            login_host: Some(String::new()),
            login_user: Some(String::new()),
            login_password: Some(Zeroizing::new(String::new())),
            db: Some(String::new()),
        };
        assert!(matches!(empty_strings.classify(), SuppliedCredentials::Nothing));
    }

    #[test]
    fn test_classify_single_field_lists_other_three() {
        let overrides = CredentialOverrides {
            login_user: Some("deskpro".to_string()),
            ..Default::default()
        };
        match overrides.classify() {
            SuppliedCredentials::Partial { missing } => {
                assert_eq!(missing, vec!["login_host", "login_password", "db"]);
            }
            other => panic!("expected Partial, got {:?}", other),
        }
    }

    #[test]
    fn test_classify_complete() {
        let overrides = CredentialOverrides::complete("localhost", "deskpro", "pw", "deskpro");
        match overrides.classify() {
            SuppliedCredentials::Complete(creds) => {
                assert_eq!(creds.host(), "localhost");
                assert_eq!(creds.password(), "pw");
            }
            other => panic!("expected complete credentials, got {:?}", other),
        }
    }
}
