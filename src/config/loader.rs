//! Configuration Loader
//!
//! Environment-aware configuration loading: YAML file discovery, environment
//! detection, and merging of environment-specific overrides.

use super::error::{ConfigResult, ConfigurationError};
use super::ExporterConfig;
use serde_yaml::Value as YamlValue;
use std::env;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

const CONFIG_FILE_NAMES: [&str; 2] = ["export-orchestrator.yaml", "export-orchestrator.yml"];
const ENVIRONMENT_SECTIONS: [&str; 3] = ["development", "test", "production"];

/// Loaded, validated configuration together with where it came from
#[derive(Debug)]
pub struct ConfigManager {
    config: ExporterConfig,
    environment: String,
    config_file: PathBuf,
}

impl ConfigManager {
    /// Load configuration with environment auto-detection
    pub fn load() -> ConfigResult<Arc<ConfigManager>> {
        Self::load_from_directory(None)
    }

    /// Load configuration from a specific directory
    pub fn load_from_directory(config_dir: Option<PathBuf>) -> ConfigResult<Arc<ConfigManager>> {
        let environment = Self::detect_environment();
        Self::load_from_directory_with_env(config_dir, &environment)
    }

    /// Load configuration from a specific directory with explicit environment
    /// This is useful for testing without modifying global environment variables
    pub fn load_from_directory_with_env(
        config_dir: Option<PathBuf>,
        environment: &str,
    ) -> ConfigResult<Arc<ConfigManager>> {
        let config_directory = config_dir.unwrap_or_else(Self::default_config_directory);

        debug!(
            "Loading configuration for environment '{}' from directory: {}",
            environment,
            config_directory.display()
        );

        let config_file = Self::find_config_file(&config_directory)?;
        Self::load_from_file_with_env(&config_file, environment)
    }

    /// Load one specific configuration file with explicit environment
    pub fn load_from_file_with_env(
        config_file: &Path,
        environment: &str,
    ) -> ConfigResult<Arc<ConfigManager>> {
        let config = Self::load_and_merge_config(config_file, environment)?;

        // Validate the loaded configuration
        config.validate()?;

        // Use sanitized configuration for logging to avoid exposing the API key
        let sanitized_config = Self::sanitize_config_for_logging(&config);
        debug!(
            "Configuration loaded successfully: {}",
            serde_json::to_string_pretty(&sanitized_config)
                .unwrap_or_else(|_| "[serialization error]".to_string())
        );

        info!(
            environment = environment,
            config_file = %config_file.display(),
            base_url = %config.backend.base_url,
            max_attempts = config.polling.max_attempts,
            "Configuration loaded successfully"
        );

        Ok(Arc::new(ConfigManager {
            config,
            environment: environment.to_string(),
            config_file: config_file.to_path_buf(),
        }))
    }

    /// Get the loaded configuration
    pub fn config(&self) -> &ExporterConfig {
        &self.config
    }

    /// Get sanitized configuration for debugging/logging that masks sensitive fields
    pub fn debug_config(&self) -> serde_json::Value {
        Self::sanitize_config_for_logging(&self.config)
    }

    /// Get the current environment
    pub fn environment(&self) -> &str {
        &self.environment
    }

    /// Get the file the configuration was read from
    pub fn config_file(&self) -> &Path {
        &self.config_file
    }

    /// Safely read a configuration file with a size limit
    fn read_config_file_safely(path: &Path) -> ConfigResult<String> {
        const MAX_CONFIG_FILE_SIZE: u64 = 1024 * 1024; // 1MB limit

        let metadata = std::fs::metadata(path)
            .map_err(|e| ConfigurationError::file_read_error(path.display().to_string(), e))?;

        if metadata.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigurationError::invalid_value(
                "file_size",
                metadata.len().to_string(),
                format!("Configuration file too large (limit {MAX_CONFIG_FILE_SIZE} bytes)"),
            ));
        }

        if !metadata.is_file() {
            return Err(ConfigurationError::invalid_value(
                "file_type",
                "directory or special file".to_string(),
                "Configuration path must point to a regular file",
            ));
        }

        std::fs::read_to_string(path)
            .map_err(|e| ConfigurationError::file_read_error(path.display().to_string(), e))
    }

    /// Render configuration as JSON with secret fields masked
    pub fn sanitize_config_for_logging(config: &ExporterConfig) -> serde_json::Value {
        let mut config_json = serde_json::json!(config);

        let sensitive_patterns = ["api_key", "secret", "token", "password"];
        Self::sanitize_json_recursive(&mut config_json, &sensitive_patterns);

        config_json
    }

    /// Recursively sanitize sensitive fields in JSON configuration
    fn sanitize_json_recursive(value: &mut serde_json::Value, sensitive_patterns: &[&str]) {
        match value {
            serde_json::Value::Object(map) => {
                for (key, val) in map.iter_mut() {
                    let key_lower = key.to_lowercase();
                    let is_sensitive = sensitive_patterns
                        .iter()
                        .any(|pattern| key_lower.ends_with(pattern));

                    if is_sensitive {
                        match val {
                            serde_json::Value::Null => {}
                            serde_json::Value::String(s) if s.is_empty() => {
                                *val = serde_json::Value::String("[EMPTY]".to_string());
                            }
                            serde_json::Value::String(s) => {
                                // Show only first 2 and last 2 characters for debugging
                                let chars: Vec<char> = s.chars().collect();
                                let masked = if chars.len() > 4 {
                                    let head: String = chars[..2].iter().collect();
                                    let tail: String = chars[chars.len() - 2..].iter().collect();
                                    format!("{head}***{tail}")
                                } else {
                                    "***".to_string()
                                };
                                *val = serde_json::Value::String(format!("[MASKED: {masked}]"));
                            }
                            _ => {
                                *val = serde_json::Value::String("[MASKED]".to_string());
                            }
                        }
                    } else {
                        Self::sanitize_json_recursive(val, sensitive_patterns);
                    }
                }
            }
            serde_json::Value::Array(arr) => {
                for item in arr.iter_mut() {
                    Self::sanitize_json_recursive(item, sensitive_patterns);
                }
            }
            _ => {}
        }
    }

    /// Detect current environment from environment variables:
    /// EXPORT_ENV || APP_ENV || 'development'
    pub fn detect_environment() -> String {
        env::var("EXPORT_ENV")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| "development".to_string())
            .to_lowercase()
    }

    /// `EXPORT_CONFIG_DIR` if set, otherwise `./config`
    fn default_config_directory() -> PathBuf {
        env::var("EXPORT_CONFIG_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("config"))
    }

    /// Find the configuration file
    fn find_config_file(config_directory: &Path) -> ConfigResult<PathBuf> {
        let mut searched_paths = Vec::new();

        for name in CONFIG_FILE_NAMES {
            let config_path = config_directory.join(name);
            searched_paths.push(config_path.clone());

            if config_path.exists() {
                debug!("Found configuration file: {}", config_path.display());
                return Ok(config_path);
            }
        }

        Err(ConfigurationError::config_file_not_found(searched_paths))
    }

    /// Load and merge configuration with environment-specific overrides
    fn load_and_merge_config(config_file: &Path, environment: &str) -> ConfigResult<ExporterConfig> {
        let yaml_content = Self::read_config_file_safely(config_file)?;

        let mut yaml_data: YamlValue = serde_yaml::from_str(&yaml_content)
            .map_err(|e| ConfigurationError::invalid_yaml(config_file.display().to_string(), e))?;

        // An empty file means all defaults
        if yaml_data.is_null() {
            yaml_data = YamlValue::Mapping(Default::default());
        }

        // Apply environment-specific overrides
        if let Some(env_overrides) = yaml_data
            .get(YamlValue::String(environment.to_string()))
            .cloned()
        {
            debug!(
                "Applying environment-specific overrides for: {}",
                environment
            );
            Self::merge_yaml_values(&mut yaml_data, env_overrides);
        }

        // Remove environment sections to avoid confusion
        if let YamlValue::Mapping(ref mut map) = yaml_data {
            for section in ENVIRONMENT_SECTIONS {
                map.remove(YamlValue::String(section.to_string()));
            }
        }

        serde_yaml::from_value(yaml_data).map_err(|e| {
            ConfigurationError::invalid_yaml(
                config_file.display().to_string(),
                format!("Failed to deserialize configuration: {e}"),
            )
        })
    }

    /// Recursively merge YAML values (environment overrides into base config)
    fn merge_yaml_values(base: &mut YamlValue, override_value: YamlValue) {
        match (&mut *base, override_value) {
            (YamlValue::Mapping(base_map), YamlValue::Mapping(override_map)) => {
                for (key, value) in override_map {
                    if let Some(existing_value) = base_map.get_mut(&key) {
                        // Recursively merge nested objects
                        Self::merge_yaml_values(existing_value, value);
                    } else {
                        base_map.insert(key, value);
                    }
                }
            }
            (base_ref, override_val) => {
                // For non-mapping values, override completely
                *base_ref = override_val;
            }
        }
    }
}
