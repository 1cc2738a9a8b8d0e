//! Configuration constants.
//!
//! This module defines the constants used throughout the application,
//! including timeouts, retry bounds, and upstream API limits.

use std::time::Duration;

/// Per-request HTTP timeout in seconds.
/// PageSpeed audits routinely take 20-40s, so this stays generous.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;

/// Ceiling for one source inside the aggregation pipeline, in seconds.
/// A source still running when this expires is abandoned and marked as a timeout failure.
pub const DEFAULT_SOURCE_TIMEOUT_SECS: u64 = 120;

/// TCP connection timeout in seconds
pub const TCP_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Default User-Agent string for HTTP requests.
///
/// Used for the homepage fetch and the scraped endpoints (Trends, News RSS),
/// which serve reduced content to unknown clients.
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";

/// Default port for the dashboard server
pub const DEFAULT_SERVER_PORT: u16 = 8000;

/// Default OAuth redirect URI (must match the one registered with the provider)
pub const DEFAULT_REDIRECT_URI: &str = "http://localhost:8000/callback";

// Retry strategy
/// Initial delay in milliseconds before the first retry; doubles on each attempt
pub const RETRY_INITIAL_DELAY_MS: u64 = 1000;
/// Maximum delay between retries in seconds
pub const RETRY_MAX_DELAY_SECS: u64 = 15;
/// Maximum number of attempts (including the initial attempt)
/// Set to 3 = initial attempt + 2 retries
pub const RETRY_MAX_ATTEMPTS: usize = 3;
/// Upper bound applied to a server-provided `Retry-After` value
pub const RETRY_AFTER_CAP: Duration = Duration::from_secs(60);

// Source-specific pacing
/// Delay between SSL Labs status polls, in seconds
pub const DEFAULT_SSL_POLL_INTERVAL_SECS: u64 = 10;
/// Maximum number of SSL Labs status polls before giving up
/// Polling at the default interval stays inside the source ceiling
pub const SSL_MAX_POLLS: usize = 10;
/// Cooldown after a Google Trends 429 before retrying, in seconds
pub const DEFAULT_TRENDS_COOLDOWN_SECS: u64 = 30;

// Reporting window
/// Trailing window, in days, for analytics and search queries
pub const REPORT_WINDOW_DAYS: i64 = 30;
/// Number of top queries requested per Search Console site
pub const SEARCH_CONSOLE_ROW_LIMIT: u32 = 10;
/// Timeframe requested from Google Trends
pub const TRENDS_TIMEFRAME: &str = "today 5-y";

// GA4 Data API per-request cardinality limits
/// Maximum dimensions accepted by a single runReport call
pub const GA4_MAX_DIMENSIONS_PER_REQUEST: usize = 9;
/// Maximum metrics accepted by a single runReport call
pub const GA4_MAX_METRICS_PER_REQUEST: usize = 10;
/// Maximum pages followed when listing GA4 accounts or properties
pub const GA4_MAX_LIST_PAGES: usize = 20;

// Error message size limits
/// Maximum upstream error message length in characters
/// Raw HTML error pages are truncated to this length
pub const MAX_ERROR_MESSAGE_LENGTH: usize = 500;

// HTTP status codes (for clarity and consistency)
pub const HTTP_STATUS_TOO_MANY_REQUESTS: u16 = 429;
