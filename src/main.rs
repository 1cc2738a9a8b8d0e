//! Main application entry point (CLI binary).
//!
//! This is a thin wrapper around the `seo_dashboard` library that handles:
//! - Command-line argument parsing
//! - Environment variable loading (.env file)
//! - Logger initialization
//! - Printing the report or running the dashboard server
//!
//! All core functionality is implemented in the library crate.

use anyhow::{Context, Result};
use clap::Parser;
use std::process;

use seo_dashboard::initialization::init_logger_with;
use seo_dashboard::{generate_site_report, server, Cli, Command};

#[tokio::main]
async fn main() -> Result<()> {
    // .env in the working directory first, then next to the executable
    if dotenvy::dotenv().is_err() {
        if let Ok(exe_path) = std::env::current_exe() {
            if let Some(exe_dir) = exe_path.parent() {
                let env_path = exe_dir.join(".env");
                if env_path.exists() {
                    let _ = dotenvy::from_path(&env_path);
                }
            }
        }
    }

    let Cli { config, command } = Cli::parse();

    let log_level = config.log_level.clone();
    let log_format = config.log_format.clone();
    init_logger_with(log_level.into(), log_format).context("Failed to initialize logger")?;

    match command {
        Command::Serve { port } => {
            if let Err(e) = server::serve(config, port).await {
                eprintln!("seo_dashboard error: {:#}", e);
                process::exit(1);
            }
            Ok(())
        }
        Command::Report { target } => match generate_site_report(&config, &target).await {
            Ok(report) => {
                let json = report
                    .to_json_pretty()
                    .context("Failed to serialize report")?;
                println!("{json}");
                eprintln!(
                    "{} source{}: {} succeeded, {} empty, {} failed",
                    report.summary.total(),
                    if report.summary.total() == 1 { "" } else { "s" },
                    report.summary.succeeded,
                    report.summary.empty,
                    report.summary.failed
                );
                Ok(())
            }
            Err(e) => {
                eprintln!("seo_dashboard error: {:#}", e);
                process::exit(1);
            }
        },
    }
}
