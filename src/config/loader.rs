//! Configuration Loader
//!
//! Environment-aware configuration loading. Merges the base YAML file, an
//! optional per-environment override and `PUSH_SERVICE_*` environment
//! variables.

use super::error::{ConfigResult, ConfigurationError};
use super::{ConfigAttributeResolver, ServiceConfig};
use crate::constants::ENV_PREFIX;
use config::{Config, Environment, File, FileFormat};
use std::env;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

const BASE_FILE_STEM: &str = "push-service";

/// Loaded service configuration plus where it came from
#[derive(Debug)]
pub struct ConfigManager {
    config: ServiceConfig,
    environment: String,
    config_directory: PathBuf,
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

        let config = Self::load_and_merge_config(&config_directory, environment)?;
        config.validate()?;

        info!(
            environment = %environment,
            service_name = %config.service_name,
            attribute_count = config.attribute_map().len(),
            "Configuration loaded successfully"
        );

        Ok(Arc::new(ConfigManager {
            config,
            environment: environment.to_string(),
            config_directory,
        }))
    }

    /// Get the loaded configuration
    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Attribute resolver over the loaded attribute tree
    pub fn attribute_resolver(&self) -> ConfigAttributeResolver {
        self.config.attribute_resolver()
    }

    pub fn environment(&self) -> &str {
        &self.environment
    }

    pub fn config_directory(&self) -> &Path {
        &self.config_directory
    }

    fn detect_environment() -> String {
        env::var("PUSH_ENV")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| "development".to_string())
    }

    fn default_config_directory() -> PathBuf {
        env::var("PUSH_CONFIG_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("config"))
    }

    fn load_and_merge_config(
        config_directory: &Path,
        environment: &str,
    ) -> ConfigResult<ServiceConfig> {
        let base_path = config_directory.join(format!("{BASE_FILE_STEM}.yaml"));
        if !base_path.is_file() {
            return Err(ConfigurationError::ConfigFileNotFound { path: base_path });
        }

        let override_path = config_directory.join(format!("{BASE_FILE_STEM}.{environment}.yaml"));
        if override_path.is_file() {
            debug!("Applying environment override: {}", override_path.display());
        }

        let settings = Config::builder()
            .add_source(
                File::from(base_path.as_path())
                    .format(FileFormat::Yaml)
                    .required(true),
            )
            .add_source(
                File::from(override_path.as_path())
                    .format(FileFormat::Yaml)
                    .required(false),
            )
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()
            .map_err(|e| ConfigurationError::LoadFailed {
                source_name: base_path.display().to_string(),
                error: e.to_string(),
            })?;

        settings
            .try_deserialize::<ServiceConfig>()
            .map_err(|e| ConfigurationError::InvalidStructure(e.to_string()))
    }
}
