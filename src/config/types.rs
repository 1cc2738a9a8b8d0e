//! Configuration types and CLI options.
//!
//! This module defines enums and structs used for command-line argument parsing
//! and configuration.

use std::time::Duration;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::config::constants::{
    DEFAULT_REDIRECT_URI, DEFAULT_REQUEST_TIMEOUT_SECS, DEFAULT_SERVER_PORT,
    DEFAULT_SOURCE_TIMEOUT_SECS, DEFAULT_SSL_POLL_INTERVAL_SECS, DEFAULT_TRENDS_COOLDOWN_SECS,
    DEFAULT_USER_AGENT,
};
use crate::config::endpoints::Endpoints;

/// Logging level for the application.
///
/// Controls the verbosity of log output, from most restrictive (Error) to most
/// verbose (Trace).
#[derive(Clone, Debug, ValueEnum)]
pub enum LogLevel {
    /// Only error messages
    Error,
    /// Error and warning messages
    Warn,
    /// Error, warning, and informational messages
    Info,
    /// All messages except trace
    Debug,
    /// All messages including trace
    Trace,
}

impl From<LogLevel> for log::LevelFilter {
    fn from(l: LogLevel) -> Self {
        match l {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Log output format.
///
/// Controls how log messages are formatted:
/// - `Plain`: Human-readable format with colors (default)
/// - `Json`: Structured JSON format for machine parsing
#[derive(Clone, Debug, ValueEnum)]
pub enum LogFormat {
    /// Human-readable format with colors (default)
    Plain,
    /// Structured JSON format for machine parsing
    Json,
}

/// Command-line interface.
#[derive(Debug, Parser)]
#[command(name = "seo_dashboard", version, about)]
pub struct Cli {
    #[command(flatten)]
    pub config: Config,

    #[command(subcommand)]
    pub command: Command,
}

/// What to run.
#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Run the dashboard web server
    Serve {
        /// Port to listen on
        #[arg(long, default_value_t = DEFAULT_SERVER_PORT)]
        port: u16,
    },
    /// Generate a site report for one URL or domain and print it as JSON
    Report {
        /// Target URL, bare domain, or `sc-domain:` identifier
        target: String,
    },
}

/// Library configuration.
///
/// Parsed from CLI flags and environment variables by the binary, or
/// constructed programmatically (see [`Config::default`]).
///
/// # Examples
///
/// ```no_run
/// use seo_dashboard::Config;
///
/// let config = Config {
///     pagespeed_api_key: Some("key".to_string()),
///     source_timeout_seconds: 90,
///     ..Default::default()
/// };
/// ```
#[derive(Debug, Clone, Args)]
pub struct Config {
    /// Log level
    #[arg(long, value_enum, default_value = "info", global = true)]
    pub log_level: LogLevel,

    /// Log format
    #[arg(long, value_enum, default_value = "plain", global = true)]
    pub log_format: LogFormat,

    /// Per-request HTTP timeout in seconds
    #[arg(long, default_value_t = DEFAULT_REQUEST_TIMEOUT_SECS, global = true)]
    pub timeout_seconds: u64,

    /// Ceiling for one source inside the pipeline, in seconds
    #[arg(long, default_value_t = DEFAULT_SOURCE_TIMEOUT_SECS, global = true)]
    pub source_timeout_seconds: u64,

    /// HTTP User-Agent header value
    #[arg(long, default_value = DEFAULT_USER_AGENT, global = true)]
    pub user_agent: String,

    /// PageSpeed Insights API key
    #[arg(long, env = "GOOGLE_SEARCH_API_KEY", hide_env_values = true, global = true)]
    pub pagespeed_api_key: Option<String>,

    /// OAuth client id
    #[arg(long, env = "GOOGLE_CLIENT_ID", global = true)]
    pub google_client_id: Option<String>,

    /// OAuth client secret
    #[arg(long, env = "GOOGLE_CLIENT_SECRET", hide_env_values = true, global = true)]
    pub google_client_secret: Option<String>,

    /// OAuth redirect URI
    #[arg(long, env = "REDIRECT_URI", default_value = DEFAULT_REDIRECT_URI, global = true)]
    pub redirect_uri: String,

    /// Delay between SSL Labs status polls, in seconds
    #[arg(long, default_value_t = DEFAULT_SSL_POLL_INTERVAL_SECS, global = true)]
    pub ssl_poll_interval_secs: u64,

    /// Cooldown after a Google Trends rate limit, in seconds
    #[arg(long, default_value_t = DEFAULT_TRENDS_COOLDOWN_SECS, global = true)]
    pub trends_cooldown_secs: u64,

    /// Upstream base URLs (not exposed on the command line)
    #[arg(skip)]
    pub endpoints: Endpoints,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: LogLevel::Info,
            log_format: LogFormat::Plain,
            timeout_seconds: DEFAULT_REQUEST_TIMEOUT_SECS,
            source_timeout_seconds: DEFAULT_SOURCE_TIMEOUT_SECS,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            pagespeed_api_key: None,
            google_client_id: None,
            google_client_secret: None,
            redirect_uri: DEFAULT_REDIRECT_URI.to_string(),
            ssl_poll_interval_secs: DEFAULT_SSL_POLL_INTERVAL_SECS,
            trends_cooldown_secs: DEFAULT_TRENDS_COOLDOWN_SECS,
            endpoints: Endpoints::default(),
        }
    }
}

impl Config {
    /// Per-source ceiling as a `Duration`.
    pub fn source_timeout(&self) -> Duration {
        Duration::from_secs(self.source_timeout_seconds)
    }

    /// Interval between SSL Labs polls.
    pub fn ssl_poll_interval(&self) -> Duration {
        Duration::from_secs(self.ssl_poll_interval_secs)
    }

    /// Cooldown between Google Trends retries.
    pub fn trends_cooldown(&self) -> Duration {
        Duration::from_secs(self.trends_cooldown_secs)
    }
}
