//! # Export Orchestrator Configuration
//!
//! YAML-based configuration with per-environment overrides.
//!
//! ## Architecture
//!
//! - **Single Source of Truth**: `export-orchestrator.yaml` in the config directory
//! - **Environment Awareness**: `development`/`test`/`production` sections are
//!   deep-merged over the base values
//! - **Explicit Validation**: invalid values are rejected at load time
//!
//! ## Usage
//!
//! ```rust,no_run
//! use export_orchestrator::config::ConfigManager;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let manager = ConfigManager::load()?;
//!
//! let settings = manager.config().orchestrator_settings();
//! let api = manager.config().api_config();
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod loader;

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::client::{ApiProtocol, ExportApiConfig};
use crate::constants::{
    DEFAULT_API_KEY_HEADER, DEFAULT_BASE_URL, DEFAULT_DEBOUNCE_MS, DEFAULT_MAX_POLL_ATTEMPTS,
    DEFAULT_POLL_INTERVAL_MS, DEFAULT_REQUEST_TIMEOUT_MS,
};
use crate::models::ExportFormat;
use crate::orchestration::{OrchestratorSettings, PollSettings, TransportErrorPolicy};

pub use error::{ConfigResult, ConfigurationError};
pub use loader::ConfigManager;

/// Root configuration structure
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ExporterConfig {
    /// Export service connection
    pub backend: BackendConfig,

    /// What to export and how triggers are coalesced
    pub export: ExportConfig,

    /// Status check cadence and budget
    pub polling: PollingConfig,

    pub logging: LoggingConfig,
}

/// Export service connection settings
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct BackendConfig {
    pub base_url: String,
    pub team_id: u64,
    pub protocol: ApiProtocol,
    pub timeout_ms: u64,
    /// Personal API key; masked in any rendered configuration
    pub api_key: Option<String>,
    pub api_key_header: String,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            team_id: 1,
            protocol: ApiProtocol::default(),
            timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
            api_key: None,
            api_key_header: DEFAULT_API_KEY_HEADER.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ExportConfig {
    pub format: ExportFormat,
    /// Quiet window before a trigger is submitted
    pub debounce_ms: u64,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            format: ExportFormat::default(),
            debounce_ms: DEFAULT_DEBOUNCE_MS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct PollingConfig {
    pub max_attempts: u32,
    pub interval_ms: u64,
    pub transport_error_policy: TransportErrorPolicy,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_POLL_ATTEMPTS,
            interval_ms: DEFAULT_POLL_INTERVAL_MS,
            transport_error_policy: TransportErrorPolicy::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive, e.g. `info` or `export_orchestrator=debug`
    pub level: String,
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl ExporterConfig {
    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.backend.base_url.is_empty() {
            return Err(ConfigurationError::missing_required_field(
                "backend.base_url",
                "backend configuration",
            ));
        }

        if let Err(e) = url::Url::parse(&self.backend.base_url) {
            return Err(ConfigurationError::invalid_value(
                "backend.base_url",
                self.backend.base_url.clone(),
                format!("not a valid URL: {e}"),
            ));
        }

        if self.backend.team_id == 0 {
            return Err(ConfigurationError::invalid_value(
                "backend.team_id",
                "0",
                "team id must be greater than 0",
            ));
        }

        if self.backend.timeout_ms == 0 {
            return Err(ConfigurationError::invalid_value(
                "backend.timeout_ms",
                "0",
                "request timeout must be greater than 0",
            ));
        }

        if self.polling.max_attempts == 0 {
            return Err(ConfigurationError::invalid_value(
                "polling.max_attempts",
                "0",
                "at least one status check is required",
            ));
        }

        if self.polling.interval_ms == 0 {
            return Err(ConfigurationError::invalid_value(
                "polling.interval_ms",
                "0",
                "poll interval must be greater than 0",
            ));
        }

        Ok(())
    }

    pub fn orchestrator_settings(&self) -> OrchestratorSettings {
        OrchestratorSettings {
            debounce: Duration::from_millis(self.export.debounce_ms),
            poll: PollSettings {
                max_attempts: self.polling.max_attempts,
                interval: Duration::from_millis(self.polling.interval_ms),
                transport_error_policy: self.polling.transport_error_policy,
            },
            export_format: self.export.format,
        }
    }

    pub fn api_config(&self) -> ExportApiConfig {
        ExportApiConfig {
            base_url: self.backend.base_url.clone(),
            team_id: self.backend.team_id,
            protocol: self.backend.protocol,
            timeout_ms: self.backend.timeout_ms,
            api_key: self.backend.api_key.clone(),
            api_key_header: self.backend.api_key_header.clone(),
        }
    }
}
