//! Resolved client configuration
//!
//! Built from the TOML file plus command-line overrides, following the
//! priority order in [`presenca_common::config`]. Every value is validated
//! here so the rest of the client can trust it.

use crate::utils::retry::RetryPolicy;
use presenca_common::config::{
    load_toml_config, resolve_base_url, resolve_config_path, resolve_root_folder, LoggingConfig,
    TomlConfig,
};
use presenca_common::period::HourWindow;
use presenca_common::time::millis_to_duration;
use presenca_common::{Error, Result, TimeWindowPolicy};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Values given on the command line
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub config_path: Option<PathBuf>,
    pub base_url: Option<String>,
    pub root_folder: Option<PathBuf>,
}

/// Fully resolved configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Config file consulted, if any
    pub config_path: Option<PathBuf>,
    pub base_url: String,
    pub request_timeout: Duration,
    pub root_folder: PathBuf,
    pub retry: RetryPolicy,
    pub windows: TimeWindowPolicy,
    pub tick_interval: Duration,
    pub logging: LoggingConfig,
}

impl ClientConfig {
    /// Locate and read the TOML file, then apply overrides
    pub fn load(overrides: &ConfigOverrides) -> Result<Self> {
        let config_path = resolve_config_path(overrides.config_path.as_deref());
        let toml = match &config_path {
            Some(path) => load_toml_config(path)?,
            None => TomlConfig::default(),
        };

        let mut config = Self::from_toml(&toml, overrides)?;
        config.config_path = config_path;
        Ok(config)
    }

    /// Resolve from an already parsed TOML file
    pub fn from_toml(toml: &TomlConfig, overrides: &ConfigOverrides) -> Result<Self> {
        let base_url = resolve_base_url(
            overrides.base_url.as_deref(),
            toml.backend.base_url.as_deref(),
        );
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(Error::Config(format!(
                "backend base URL must start with http:// or https://, got '{}'",
                base_url
            )));
        }

        if toml.backend.request_timeout_ms == 0 {
            return Err(Error::Config(
                "backend.request_timeout_ms must be greater than 0".to_string(),
            ));
        }

        if toml.attendance.max_attempts == 0 {
            return Err(Error::Config(
                "attendance.max_attempts must be at least 1".to_string(),
            ));
        }

        if toml.scan.tick_interval_ms == 0 {
            return Err(Error::Config(
                "scan.tick_interval_ms must be greater than 0".to_string(),
            ));
        }

        let windows = TimeWindowPolicy::new(
            HourWindow::new(
                toml.windows.morning_start_hour,
                toml.windows.morning_end_hour,
            ),
            HourWindow::new(
                toml.windows.afternoon_start_hour,
                toml.windows.afternoon_end_hour,
            ),
        )?;

        let root_folder = resolve_root_folder(
            overrides.root_folder.as_deref(),
            toml.root_folder.as_deref(),
        );

        Ok(Self {
            config_path: None,
            base_url,
            request_timeout: millis_to_duration(toml.backend.request_timeout_ms),
            root_folder,
            retry: RetryPolicy::new(
                toml.attendance.max_attempts,
                millis_to_duration(toml.attendance.retry_delay_ms),
            ),
            windows,
            tick_interval: millis_to_duration(toml.scan.tick_interval_ms),
            logging: toml.logging.clone(),
        })
    }

    pub fn root_folder(&self) -> &Path {
        &self.root_folder
    }
}
