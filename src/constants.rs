//! # System Constants
//!
//! Defaults and fixed values that bound the export orchestration system.
//! Configuration overrides most of these; the constants document what an
//! unconfigured orchestrator does.

use std::time::Duration;

/// Quiet window applied before a triggered export is submitted
pub const DEFAULT_DEBOUNCE_MS: u64 = 1_000;

/// Maximum number of status checks before an export times out
pub const DEFAULT_MAX_POLL_ATTEMPTS: u32 = 20;

/// Wait between consecutive status checks
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 2_000;

/// HTTP request timeout for backend calls
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 30_000;

/// Backend base URL used when nothing is configured
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";

/// Header carrying the API key when authentication is enabled
pub const DEFAULT_API_KEY_HEADER: &str = "Authorization";

/// User-facing notification messages
pub mod messages {
    pub const EXPORT_STARTED: &str = "Export started...";
    pub const EXPORT_COMPLETE: &str = "Export complete.";
    pub const EXPORT_FAILED: &str = "Export failed.";
}

/// Orchestration operation names used in structured logs
pub mod operations {
    pub const EXPORT_REQUESTED: &str = "export.requested";
    pub const EXPORT_JOINED: &str = "export.joined";
    pub const EXPORT_SUBMITTING: &str = "export.submitting";
    pub const EXPORT_POLLING: &str = "export.polling";
    pub const EXPORT_SUCCEEDED: &str = "export.succeeded";
    pub const EXPORT_FAILED: &str = "export.failed";
}

/// Default debounce window as a [`Duration`]
pub fn default_debounce() -> Duration {
    Duration::from_millis(DEFAULT_DEBOUNCE_MS)
}

/// Default poll interval as a [`Duration`]
pub fn default_poll_interval() -> Duration {
    Duration::from_millis(DEFAULT_POLL_INTERVAL_MS)
}
