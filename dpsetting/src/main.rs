//! Deskpro setting tool.
//!
//! Reads or writes one setting of a local Deskpro installation and prints
//! the result as JSON.
//!
//! # Security Guarantees
//! - Database passwords are never logged or printed
//! - Every write is a single transaction; failures change nothing

use anyhow::Context;
use clap::Parser;
use dpsetting::{Cli, Report};
use dpsetting_core::logging::init_logging;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_logging(cli.global.verbose, cli.global.quiet)?;

    let report = match build_service(&cli) {
        Ok(service) => dpsetting::run(&cli, &service).await,
        Err(e) => Report::failure(&cli.name, dpsetting::error_chain(&e)),
    };

    let json = report.to_json().context("Failed to serialize result")?;
    println!("{}", json);

    std::process::exit(report.exit_code());
}

#[cfg(feature = "mysql")]
fn build_service(cli: &Cli) -> dpsetting_core::Result<dpsetting_core::SettingService> {
    dpsetting::mysql_service(cli)
}

#[cfg(not(feature = "mysql"))]
fn build_service(cli: &Cli) -> dpsetting_core::Result<dpsetting_core::SettingService> {
    let _ = cli;
    Err(dpsetting_core::SettingError::configuration(
        "dpsetting was built without the `mysql` feature",
    ))
}
