//! Unit tests for configuration loading and resolution
//!
//! Covers:
//! - Missing TOML file falls back to defaults
//! - Partial TOML files keep defaults for absent keys
//! - Priority order: CLI > environment > TOML > compiled default
//! - Atomic private writes
//!
//! Tests that touch PRESENCA_* environment variables are marked #[serial]
//! so they never run in parallel.

use presenca_common::config::{
    get_default_root_folder, load_toml_config, resolve_base_url, resolve_config_path,
    resolve_root_folder, write_private_file, write_toml_config, TomlConfig, DEFAULT_BASE_URL,
    ENV_BASE_URL, ENV_CONFIG, ENV_ROOT_FOLDER,
};
use serial_test::serial;
use std::env;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

/// Formatted log output collected from a scoped subscriber
#[derive(Clone, Default)]
struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl CapturedLogs {
    fn text(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }

    /// Run `f` with a debug-level subscriber writing into this buffer
    fn during<T>(&self, f: impl FnOnce() -> T) -> T {
        let sink = self.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_ansi(false)
            .with_writer(move || sink.clone())
            .finish();
        tracing::subscriber::with_default(subscriber, f)
    }
}

impl Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

#[test]
fn test_missing_file_yields_defaults() {
    let temp_dir = TempDir::new().unwrap();
    let config = load_toml_config(&temp_dir.path().join("absent.toml")).unwrap();

    assert_eq!(config, TomlConfig::default());
    assert_eq!(config.attendance.max_attempts, 3);
    assert_eq!(config.attendance.retry_delay_ms, 1000);
    assert_eq!(config.windows.morning_start_hour, 8);
    assert_eq!(config.windows.afternoon_end_hour, 18);
    assert_eq!(config.logging.level, "info");
}

#[test]
fn test_missing_file_logs_warning() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("absent.toml");
    let logs = CapturedLogs::default();

    let config = logs.during(|| load_toml_config(&path)).unwrap();

    assert_eq!(config, TomlConfig::default());
    let output = logs.text();
    assert!(output.contains("WARN"), "output: {}", output);
    assert!(output.contains("not found, using built-in defaults"), "output: {}", output);
    assert!(output.contains("absent.toml"), "output: {}", output);
}

#[test]
fn test_loaded_file_is_logged() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("presenca.toml");
    write_toml_config(&TomlConfig::default(), &path).unwrap();
    let logs = CapturedLogs::default();

    logs.during(|| load_toml_config(&path)).unwrap();

    assert!(logs.text().contains("Loaded configuration from"));
}

#[test]
fn test_partial_file_keeps_other_defaults() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("presenca.toml");
    std::fs::write(
        &path,
        r#"
[backend]
base_url = "http://192.168.10.4:3000"

[attendance]
max_attempts = 5
"#,
    )
    .unwrap();

    let config = load_toml_config(&path).unwrap();
    assert_eq!(
        config.backend.base_url.as_deref(),
        Some("http://192.168.10.4:3000")
    );
    assert_eq!(config.backend.request_timeout_ms, 30_000);
    assert_eq!(config.attendance.max_attempts, 5);
    assert_eq!(config.attendance.retry_delay_ms, 1000);
    assert_eq!(config.scan.tick_interval_ms, 33);
}

#[test]
fn test_malformed_file_is_an_error() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("presenca.toml");
    std::fs::write(&path, "[attendance\nmax_attempts = ").unwrap();

    assert!(load_toml_config(&path).is_err());
}

#[test]
#[serial]
fn test_root_folder_cli_wins() {
    env::set_var(ENV_ROOT_FOLDER, "/tmp/presenca-env");

    let resolved = resolve_root_folder(
        Some(Path::new("/tmp/presenca-cli")),
        Some(Path::new("/tmp/presenca-toml")),
    );
    assert_eq!(resolved, PathBuf::from("/tmp/presenca-cli"));

    env::remove_var(ENV_ROOT_FOLDER);
}

#[test]
#[serial]
fn test_root_folder_env_beats_toml() {
    env::set_var(ENV_ROOT_FOLDER, "/tmp/presenca-env");

    let resolved = resolve_root_folder(None, Some(Path::new("/tmp/presenca-toml")));
    assert_eq!(resolved, PathBuf::from("/tmp/presenca-env"));

    env::remove_var(ENV_ROOT_FOLDER);
}

#[test]
#[serial]
fn test_root_folder_falls_back_to_toml_then_default() {
    env::remove_var(ENV_ROOT_FOLDER);

    let resolved = resolve_root_folder(None, Some(Path::new("/tmp/presenca-toml")));
    assert_eq!(resolved, PathBuf::from("/tmp/presenca-toml"));

    let resolved = resolve_root_folder(None, None);
    assert_eq!(resolved, get_default_root_folder());
    assert!(!resolved.as_os_str().is_empty());
}

#[test]
#[serial]
fn test_empty_env_var_is_ignored() {
    env::set_var(ENV_ROOT_FOLDER, "  ");

    let resolved = resolve_root_folder(None, Some(Path::new("/tmp/presenca-toml")));
    assert_eq!(resolved, PathBuf::from("/tmp/presenca-toml"));

    env::remove_var(ENV_ROOT_FOLDER);
}

#[test]
#[serial]
fn test_base_url_priority_and_trailing_slash() {
    env::remove_var(ENV_BASE_URL);
    assert_eq!(resolve_base_url(None, None), DEFAULT_BASE_URL);
    assert_eq!(
        resolve_base_url(None, Some("http://localhost:3000/")),
        "http://localhost:3000"
    );

    env::set_var(ENV_BASE_URL, "http://env-host:3000");
    assert_eq!(
        resolve_base_url(None, Some("http://localhost:3000")),
        "http://env-host:3000"
    );
    assert_eq!(
        resolve_base_url(Some("http://cli-host:3000//"), Some("http://localhost:3000")),
        "http://cli-host:3000"
    );

    env::remove_var(ENV_BASE_URL);
}

#[test]
#[serial]
fn test_config_path_priority() {
    env::set_var(ENV_CONFIG, "/tmp/presenca-env.toml");
    assert_eq!(
        resolve_config_path(Some(Path::new("/tmp/cli.toml"))),
        Some(PathBuf::from("/tmp/cli.toml"))
    );
    assert_eq!(
        resolve_config_path(None),
        Some(PathBuf::from("/tmp/presenca-env.toml"))
    );
    env::remove_var(ENV_CONFIG);
}

#[test]
fn test_write_then_load_preserves_fields() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("nested").join("presenca.toml");

    let mut config = TomlConfig::default();
    config.root_folder = Some(PathBuf::from("/srv/presenca"));
    config.backend.base_url = Some("http://localhost:3000".to_string());
    config.windows.afternoon_end_hour = 19;

    write_toml_config(&config, &path).unwrap();

    assert!(path.exists());
    assert!(!temp_dir.path().join("nested").join("presenca.toml.tmp").exists());
    assert_eq!(load_toml_config(&path).unwrap(), config);
}

#[test]
fn test_private_file_overwrites() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("session.token");

    write_private_file(&path, b"first").unwrap();
    write_private_file(&path, b"second").unwrap();

    assert_eq!(std::fs::read_to_string(&path).unwrap(), "second");
}

#[cfg(unix)]
#[test]
fn test_private_file_mode_is_0600() {
    use presenca_common::config::check_permissions_loose;
    use std::os::unix::fs::PermissionsExt;

    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("session.token");
    write_private_file(&path, b"secret").unwrap();

    let mode = std::fs::metadata(&path).unwrap().permissions().mode();
    assert_eq!(mode & 0o777, 0o600);
    assert!(!check_permissions_loose(&path).unwrap());
}
