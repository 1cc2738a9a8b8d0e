//! Logger initialization.

use std::io::Write;

use colored::*;
use log::{Level, LevelFilter};

use crate::config::LogFormat;
use crate::error_handling::InitializationError;

/// Initializes the logger with the specified level and format.
///
/// Configures `env_logger` with either a colored, human-readable line format or
/// one JSON object per line. `RUST_LOG` is read first and `level` then
/// overrides the crate's own filter, so `RUST_LOG=reqwest=debug` still works
/// alongside `--log-level`.
///
/// # Errors
///
/// Returns `InitializationError::LoggerError` if a logger is already installed.
///
/// # Examples
///
/// ```bash
/// # Use RUST_LOG for quick debugging (no CLI args needed)
/// RUST_LOG=debug seo_dashboard report example.com
///
/// # Override with CLI args (takes precedence)
/// RUST_LOG=debug seo_dashboard --log-level info serve
///
/// # Per-module filtering via RUST_LOG
/// RUST_LOG=seo_dashboard=debug,reqwest=info seo_dashboard serve
/// ```
pub fn init_logger_with(level: LevelFilter, format: LogFormat) -> Result<(), InitializationError> {
    let mut builder = env_logger::Builder::from_default_env();

    builder.filter_level(level);
    builder.filter_module("html5ever", LevelFilter::Error);
    builder.filter_module("selectors", LevelFilter::Warn);
    builder.filter_module("reqwest", LevelFilter::Info);
    builder.filter_module("hyper", LevelFilter::Info);
    builder.filter_module("hyper_util", LevelFilter::Info);
    builder.filter_module("rustls", LevelFilter::Warn);
    builder.filter_module("seo_dashboard", level);

    match format {
        LogFormat::Json => {
            builder.format(|buf, record| {
                let line = serde_json::json!({
                    "ts": chrono::Utc::now().to_rfc3339(),
                    "level": record.level().as_str(),
                    "target": record.target(),
                    "msg": record.args().to_string(),
                });
                writeln!(buf, "{line}")
            });
        }
        LogFormat::Plain => {
            colored::control::set_override(true);
            builder.format(|buf, record| {
                let label = format!("{:<5}", record.level());
                let level = match record.level() {
                    Level::Error => label.red().bold(),
                    Level::Warn => label.yellow(),
                    Level::Info => label.green(),
                    Level::Debug => label.blue(),
                    Level::Trace => label.purple(),
                };
                writeln!(
                    buf,
                    "{} {} {} {}",
                    chrono::Local::now().format("%H:%M:%S%.3f").to_string().dimmed(),
                    level,
                    record.target().cyan(),
                    record.args()
                )
            });
        }
    }

    // try_init so a second call (tests, embedding) reports instead of panicking
    builder.try_init()?;

    Ok(())
}
