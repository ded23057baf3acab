//! Configuration loading and root folder resolution
//!
//! Settings sources, highest priority first:
//! 1. Command-line arguments
//! 2. Environment variables (`PRESENCA_*`)
//! 3. TOML configuration file
//! 4. Compiled defaults
//!
//! A missing TOML file is not an error: a warning is logged and defaults
//! are used.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Directory name used under the platform config/data directories
pub const APP_DIR: &str = "presenca";

/// Default configuration file name
pub const CONFIG_FILE_NAME: &str = "presenca.toml";

/// Environment variable naming an explicit config file
pub const ENV_CONFIG: &str = "PRESENCA_CONFIG";

/// Environment variable overriding the root folder
pub const ENV_ROOT_FOLDER: &str = "PRESENCA_ROOT_FOLDER";

/// Environment variable overriding the backend base URL
pub const ENV_BASE_URL: &str = "PRESENCA_BASE_URL";

pub const DEFAULT_BASE_URL: &str = "https://appdiaconato.ddns.net:3000";

/// Complete TOML file schema
///
/// Every section is optional; absent keys take compiled defaults.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct TomlConfig {
    /// Folder holding the session token
    pub root_folder: Option<PathBuf>,
    pub backend: BackendConfig,
    pub attendance: AttendanceConfig,
    pub windows: WindowsConfig,
    pub scan: ScanConfig,
    pub logging: LoggingConfig,
}

/// `[backend]` section
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BackendConfig {
    pub base_url: Option<String>,
    pub request_timeout_ms: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            request_timeout_ms: 30_000,
        }
    }
}

/// `[attendance]` section: submission retry policy
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AttendanceConfig {
    /// Total attempts per submission, including the first
    pub max_attempts: u32,
    /// Fixed delay between attempts
    pub retry_delay_ms: u64,
}

impl Default for AttendanceConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            retry_delay_ms: 1000,
        }
    }
}

/// `[windows]` section: attendance hours, half-open `[start, end)`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct WindowsConfig {
    pub morning_start_hour: u32,
    pub morning_end_hour: u32,
    pub afternoon_start_hour: u32,
    pub afternoon_end_hour: u32,
}

impl Default for WindowsConfig {
    fn default() -> Self {
        Self {
            morning_start_hour: 8,
            morning_end_hour: 12,
            afternoon_start_hour: 13,
            afternoon_end_hour: 18,
        }
    }
}

/// `[scan]` section
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ScanConfig {
    /// Interval between decode attempts (one frame per tick)
    pub tick_interval_ms: u64,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 33,
        }
    }
}

/// `[logging]` section
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Log file path (optional, logs to stderr if not specified)
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
        }
    }
}

/// Locate the configuration file
///
/// Priority: explicit path (CLI) > `PRESENCA_CONFIG` > platform config dir.
/// Returns `None` only when no platform config dir exists.
pub fn resolve_config_path(cli_arg: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = cli_arg {
        return Some(path.to_path_buf());
    }

    if let Some(path) = non_empty_env(ENV_CONFIG) {
        return Some(PathBuf::from(path));
    }

    dirs::config_dir().map(|d| d.join(APP_DIR).join(CONFIG_FILE_NAME))
}

/// Load the TOML configuration file
///
/// A missing file yields defaults with a warning; an unreadable or malformed
/// file is an error.
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    if !path.exists() {
        warn!(
            "Config file {} not found, using built-in defaults",
            path.display()
        );
        return Ok(TomlConfig::default());
    }

    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;
    let config: TomlConfig = toml::from_str(&content)?;

    info!("Loaded configuration from {}", path.display());
    Ok(config)
}

/// Resolve the root folder
///
/// Priority: CLI argument > `PRESENCA_ROOT_FOLDER` > TOML `root_folder` >
/// OS-dependent default.
pub fn resolve_root_folder(cli_arg: Option<&Path>, toml_value: Option<&Path>) -> PathBuf {
    if let Some(path) = cli_arg {
        debug!("Root folder from command line: {}", path.display());
        return path.to_path_buf();
    }

    if let Some(path) = non_empty_env(ENV_ROOT_FOLDER) {
        debug!("Root folder from {}: {}", ENV_ROOT_FOLDER, path);
        return PathBuf::from(path);
    }

    if let Some(path) = toml_value {
        debug!("Root folder from TOML: {}", path.display());
        return path.to_path_buf();
    }

    get_default_root_folder()
}

/// Resolve the backend base URL
///
/// Priority: CLI argument > `PRESENCA_BASE_URL` > TOML > compiled default.
/// Trailing slashes are removed.
pub fn resolve_base_url(cli_arg: Option<&str>, toml_value: Option<&str>) -> String {
    let url = cli_arg
        .map(str::to_string)
        .or_else(|| non_empty_env(ENV_BASE_URL))
        .or_else(|| toml_value.map(str::to_string))
        .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

    url.trim_end_matches('/').to_string()
}

/// Get OS-dependent default root folder path
pub fn get_default_root_folder() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join(APP_DIR))
        .unwrap_or_else(|| PathBuf::from("./presenca_data"))
}

/// Create `path` (and parents) if missing
pub fn ensure_directory_exists(path: &Path) -> Result<()> {
    if !path.exists() {
        std::fs::create_dir_all(path)?;
        info!("Created directory {}", path.display());
    }
    Ok(())
}

/// Write configuration to `path` atomically with private permissions
pub fn write_toml_config(config: &TomlConfig, path: &Path) -> Result<()> {
    let content = toml::to_string_pretty(config)?;
    write_private_file(path, content.as_bytes())
}

/// Atomically write `contents` to `path` (temp file + rename)
///
/// On Unix the file is created with mode 0600 before any byte is written.
/// Parent directories are created as needed.
pub fn write_private_file(path: &Path, contents: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        ensure_directory_exists(parent)?;
    }

    let mut temp_name = path
        .file_name()
        .ok_or_else(|| Error::InvalidInput(format!("{} has no file name", path.display())))?
        .to_os_string();
    temp_name.push(".tmp");
    let temp_path = path.with_file_name(temp_name);

    {
        let mut options = std::fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }
        let mut file = options.open(&temp_path)?;
        file.write_all(contents)?;
        file.sync_all()?;
    }

    if let Err(e) = std::fs::rename(&temp_path, path) {
        let _ = std::fs::remove_file(&temp_path);
        return Err(e.into());
    }

    Ok(())
}

/// True if group or others can read `path`
#[cfg(unix)]
pub fn check_permissions_loose(path: &Path) -> Result<bool> {
    use std::os::unix::fs::PermissionsExt;
    let mode = std::fs::metadata(path)?.permissions().mode();
    Ok(mode & 0o077 != 0)
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}
