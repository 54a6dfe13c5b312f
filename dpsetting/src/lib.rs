//! Library module for the dpsetting binary.
//!
//! Holds the argument parser and the result document so they can be tested
//! without spawning the binary. `main.rs` only wires them to the runtime.

use clap::{Args, Parser};
use dpsetting_core::{
    Config, CredentialOverrides, SettingOutcome, SettingService, SettingTarget,
    models::Setting,
};
use serde::Serialize;
use std::path::PathBuf;
use tracing::{debug, error};
use zeroize::Zeroizing;

/// CLI argument structure
#[derive(Debug, Parser)]
#[command(name = "dpsetting")]
#[command(about = "Read or write a Deskpro setting")]
#[command(version)]
#[command(long_about = "
dpsetting - Read or write one row of a Deskpro settings table

With only NAME, the current value is printed. With NAME and VALUE, the setting
is created or updated; nothing is written when it already holds VALUE.

The installation is taken from --install-path, the pointer file
/etc/deskpro/install-path, or the usual install locations. Database
credentials come from the --login-* options when all four are given, and from
the installation's config/config.database.php otherwise.

The result is printed as a single JSON document on stdout. Logs go to stderr.

EXAMPLES:
  dpsetting core.deskpro_url
  dpsetting core.deskpro_url https://support.example.com
  dpsetting --check --install-path /srv/deskpro core.deskpro_url https://support.example.com
")]
pub struct Cli {
    /// Setting name
    #[arg(value_name = "NAME")]
    pub name: String,

    /// New value; omit to read
    #[arg(value_name = "VALUE")]
    pub value: Option<String>,

    /// Installation root
    #[arg(long, env = "DPSETTING_INSTALL_PATH", value_name = "DIR")]
    pub install_path: Option<PathBuf>,

    #[command(flatten)]
    pub credentials: CredentialArgs,

    /// MySQL port, for hosts without an explicit `:port`
    #[arg(long, value_name = "PORT")]
    pub port: Option<u16>,

    /// Config file path
    #[arg(
        long,
        value_name = "FILE",
        help = "TOML config file (default: /etc/dpsetting/config.toml if present)"
    )]
    pub config: Option<PathBuf>,

    /// Preview a write without applying it
    #[arg(long, help = "Report what a write would do without changing anything")]
    pub check: bool,

    #[command(flatten)]
    pub global: GlobalArgs,
}

/// Database credential overrides; all four or none.
#[derive(Args)]
pub struct CredentialArgs {
    /// Database host, optionally `host:port`
    #[arg(long, env = "DPSETTING_LOGIN_HOST", value_name = "HOST")]
    pub login_host: Option<String>,

    /// Database user
    #[arg(long, env = "DPSETTING_LOGIN_USER", value_name = "USER")]
    pub login_user: Option<String>,

    /// Database password
    #[arg(
        long,
        env = "DPSETTING_LOGIN_PASSWORD",
        value_name = "PASS",
        hide_env_values = true
    )]
    pub login_password: Option<String>,

    /// Database name
    #[arg(long, env = "DPSETTING_DB", value_name = "NAME")]
    pub db: Option<String>,
}

impl std::fmt::Debug for CredentialArgs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialArgs")
            .field("login_host", &self.login_host)
            .field("login_user", &self.login_user)
            .field("login_password", &self.login_password.as_ref().map(|_| "****"))
            .field("db", &self.db)
            .finish()
    }
}

/// Verbosity flags
#[derive(Debug, Args)]
pub struct GlobalArgs {
    /// Increase verbosity
    #[arg(
        short,
        long,
        action = clap::ArgAction::Count,
        help = "Increase verbosity (-v, -vv)"
    )]
    pub verbose: u8,

    /// Suppress output
    #[arg(short, long, help = "Suppress all log output except errors")]
    pub quiet: bool,
}

/// What an invocation does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Read the current value
    Read,
    /// Create or update the value
    Write,
    /// Report what a write would do
    Preview,
}

impl Cli {
    /// The operation selected by the arguments.
    pub fn action(&self) -> Action {
        match (&self.value, self.check) {
            (None, _) => Action::Read,
            (Some(_), false) => Action::Write,
            (Some(_), true) => Action::Preview,
        }
    }

    /// Builds the operation target.
    pub fn target(&self) -> SettingTarget {
        let args = &self.credentials;
        SettingTarget {
            install_path: self.install_path.clone(),
            credentials: CredentialOverrides {
                login_host: args.login_host.clone(),
                login_user: args.login_user.clone(),
                login_password: args.login_password.clone().map(Zeroizing::new),
                db: args.db.clone(),
            },
        }
    }

    /// Loads the config file and applies command-line overrides.
    ///
    /// # Errors
    /// Returns an error if a named config file is missing or invalid, or if
    /// the resulting connection settings are invalid.
    pub fn load_config(&self) -> dpsetting_core::Result<Config> {
        let mut config = Config::load_or_default(self.config.as_deref())?;
        if let Some(port) = self.port {
            config.connection.port = port;
            config.connection.validate()?;
        }
        Ok(config)
    }
}

/// Failure document printed on stdout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailureReport {
    /// Always `true`
    pub failed: bool,
    /// Error message
    pub msg: String,
    /// Requested setting name
    pub name: String,
    /// Always `false`
    pub created: bool,
    /// Always `false`
    pub changed: bool,
}

/// Result document of one invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Report {
    /// The operation succeeded
    Success(SettingOutcome),
    /// The operation failed; nothing was changed
    Failure(FailureReport),
}

impl Report {
    /// Builds a failure report for `name`.
    pub fn failure(name: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Failure(FailureReport {
            failed: true,
            msg: msg.into(),
            name: name.into(),
            created: false,
            changed: false,
        })
    }

    /// Process exit code for this report.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Success(_) => 0,
            Self::Failure(_) => 1,
        }
    }

    /// Serializes the report as a single line of JSON.
    ///
    /// # Errors
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// Runs the selected action against `service`.
///
/// # Errors
/// Returns the first error of the operation.
pub async fn execute(
    cli: &Cli,
    service: &SettingService,
) -> dpsetting_core::Result<SettingOutcome> {
    let target = cli.target();
    let action = cli.action();
    debug!(setting = %cli.name, ?action, "Running dpsetting");

    match (action, cli.value.as_deref()) {
        (Action::Write, Some(value)) => service.set_setting(&target, &cli.name, value).await,
        (Action::Preview, Some(value)) => {
            service.preview_setting(&target, &cli.name, value).await
        }
        _ => {
            let value = service.get_setting(&target, &cli.name).await?;
            Ok(SettingOutcome::unchanged(Setting {
                name: cli.name.clone(),
                value,
            }))
        }
    }
}

/// Runs one invocation and converts the result into a report.
pub async fn run(cli: &Cli, service: &SettingService) -> Report {
    match execute(cli, service).await {
        Ok(outcome) => Report::Success(outcome),
        Err(e) => {
            let msg = error_chain(&e);
            error!("{}", msg);
            Report::failure(&cli.name, msg)
        }
    }
}

/// Renders an error with its sources, outermost first.
pub fn error_chain(error: &dyn std::error::Error) -> String {
    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

/// Builds the production service from the arguments.
///
/// # Errors
/// Returns a report-ready error if configuration cannot be loaded.
#[cfg(feature = "mysql")]
pub fn mysql_service(cli: &Cli) -> dpsetting_core::Result<SettingService> {
    let config = cli.load_config()?;
    Ok(SettingService::mysql(&config))
}
