//! Configuration loader
//!
//! Loads [`ClientConfig`] from environment variables or files.
//!
//! ## Loading Strategy
//! 1. First, attempts to load from environment variables
//! 2. If `KRA_API_KEY` is missing or a value is invalid, falls back to a file
//! 3. Probes multiple paths for config files
//! 4. Supports JSON and TOML formats
//!
//! Every loaded configuration is validated before it is returned.
//!
//! ## Environment Variables
//! - `KRA_API_KEY`: API key (required)
//! - `KRA_BASE_URL`: API base URL
//! - `KRA_TIMEOUT_SECS`: Request timeout in seconds
//! - `KRA_MAX_RETRIES`: Retries after the first attempt
//! - `KRA_INITIAL_DELAY_MS`: First backoff delay in milliseconds
//! - `KRA_MAX_DELAY_MS`: Backoff ceiling in milliseconds
//! - `KRA_RATE_LIMIT_ENABLED`: Whether rate limiting is enabled (true/false)
//! - `KRA_RATE_LIMIT_MAX_REQUESTS`: Requests allowed per window
//! - `KRA_RATE_LIMIT_WINDOW_SECS`: Rate-limit window in seconds
//! - `KRA_CACHE_ENABLED`: Whether response caching is enabled (true/false)
//! - `KRA_CACHE_MAX_ENTRIES`: Cache capacity
//! - `KRA_DEBUG`: Log request and response bodies (true/false)
//!
//! ## File Locations
//! The loader searches the following paths (in order):
//! 1. `./kra.{json,toml}` or `./config.{json,toml}` (current working directory)
//! 2. `../config.{json,toml}` and `../../config.{json,toml}`
//! 3. The same names relative to the executable location

use std::fmt::Display;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use kra_connect_common::error::{KraError, KraResult};
use kra_connect_domain::ClientConfig;

/// Load configuration with automatic fallback strategy
///
/// First attempts to load from environment variables. If that fails, falls
/// back to loading from a config file.
///
/// # Errors
/// Returns a `Validation` error if:
/// - Configuration cannot be loaded from either source
/// - File format is invalid
/// - The loaded configuration fails validation
pub fn load() -> KraResult<ClientConfig> {
    match load_from_env() {
        Ok(config) => {
            tracing::info!("Configuration loaded from environment variables");
            Ok(config)
        }
        Err(e) => {
            tracing::debug!(error = %e, "Failed to load from environment, trying file");
            load_from_file(None)
        }
    }
}

/// Load configuration from environment variables
///
/// Only `KRA_API_KEY` is required; every other setting keeps its default
/// when its variable is unset.
///
/// # Errors
/// Returns a `Validation` error if `KRA_API_KEY` is missing, a variable has
/// an unparseable value, or the result fails validation.
pub fn load_from_env() -> KraResult<ClientConfig> {
    let mut config = ClientConfig::new(env_var("KRA_API_KEY")?);

    if let Ok(base_url) = std::env::var("KRA_BASE_URL") {
        config.base_url = base_url;
    }
    if let Some(secs) = env_parse::<u64>("KRA_TIMEOUT_SECS")? {
        config.timeout = Duration::from_secs(secs);
    }
    if let Some(retries) = env_parse::<u32>("KRA_MAX_RETRIES")? {
        config.retry.max_retries = retries;
    }
    if let Some(ms) = env_parse::<u64>("KRA_INITIAL_DELAY_MS")? {
        config.retry.initial_delay = Duration::from_millis(ms);
    }
    if let Some(ms) = env_parse::<u64>("KRA_MAX_DELAY_MS")? {
        config.retry.max_delay = Duration::from_millis(ms);
    }

    config.rate_limit.enabled = env_bool("KRA_RATE_LIMIT_ENABLED", config.rate_limit.enabled);
    if let Some(max) = env_parse::<u32>("KRA_RATE_LIMIT_MAX_REQUESTS")? {
        config.rate_limit.max_requests = max;
    }
    if let Some(secs) = env_parse::<u64>("KRA_RATE_LIMIT_WINDOW_SECS")? {
        config.rate_limit.window = Duration::from_secs(secs);
    }

    config.cache.enabled = env_bool("KRA_CACHE_ENABLED", config.cache.enabled);
    if let Some(entries) = env_parse::<usize>("KRA_CACHE_MAX_ENTRIES")? {
        config.cache.max_entries = entries;
    }

    config.debug = env_bool("KRA_DEBUG", config.debug);

    config.validate()?;
    Ok(config)
}

/// Load configuration from a file
///
/// If `path` is `None`, searches multiple locations for config files.
/// Supports both JSON and TOML formats (detected by file extension).
/// Missing fields keep their defaults.
///
/// # Arguments
/// * `path` - Optional path to config file. If `None`, uses
///   [`search_config_paths`].
///
/// # Errors
/// Returns a `Validation` error if:
/// - File not found (when path is specified)
/// - No config file found (when path is `None`)
/// - File format is invalid
/// - The parsed configuration fails validation
pub fn load_from_file(path: Option<PathBuf>) -> KraResult<ClientConfig> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(config_error(format!("Config file not found: {}", p.display())));
            }
            p
        }
        None => search_config_paths()
            .ok_or_else(|| config_error("No config file found in any of the standard locations"))?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| config_error(format!("Failed to read config file: {e}")))?;

    let config = parse_config(&contents, &config_path)?;
    config.validate()?;
    Ok(config)
}

/// Parse configuration from string content
///
/// Format is detected by file extension (`.json` or `.toml`).
///
/// # Errors
/// Returns a `Validation` error if format is invalid or parsing fails.
fn parse_config(contents: &str, path: &Path) -> KraResult<ClientConfig> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    match extension {
        "toml" => toml::from_str(contents).map_err(|e| config_error(format!("Invalid TOML format: {e}"))),
        "json" => serde_json::from_str(contents).map_err(|e| config_error(format!("Invalid JSON format: {e}"))),
        _ => Err(config_error(format!("Unsupported config format: {extension}"))),
    }
}

/// Probe multiple paths for configuration files
///
/// Searches the current working directory, its two parents and the
/// executable's directory.
///
/// # Returns
/// The first config file found, or `None` if no file exists.
pub fn search_config_paths() -> Option<PathBuf> {
    const NAMES: [&str; 4] = ["kra.json", "kra.toml", "config.json", "config.toml"];
    const PARENTS: [&str; 4] = ["../config.json", "../config.toml", "../../config.json", "../../config.toml"];

    let mut candidates = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        candidates.extend(NAMES.iter().chain(PARENTS.iter()).map(|name| cwd.join(name)));
    }

    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            candidates.extend(NAMES.iter().chain(PARENTS.iter()).map(|name| exe_dir.join(name)));
        }
    }

    candidates.into_iter().find(|path| path.exists())
}

fn config_error(message: impl Into<String>) -> KraError {
    KraError::validation("config", message)
}

/// Get required environment variable
///
/// # Errors
/// Returns a `Validation` error if the variable is not set.
fn env_var(key: &str) -> KraResult<String> {
    std::env::var(key)
        .map_err(|_| KraError::validation(key, format!("Missing required environment variable: {key}")))
}

/// Parse an optional environment variable
///
/// # Errors
/// Returns a `Validation` error naming the variable if it is set but does
/// not parse.
fn env_parse<T>(key: &str) -> KraResult<Option<T>>
where
    T: FromStr,
    T::Err: Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e| KraError::validation(key, format!("Invalid value for {key}: {e}"))),
        Err(_) => Ok(None),
    }
}

/// Parse boolean from environment variable
///
/// Accepts: `1`/`0`, `true`/`false`, `yes`/`no`, `on`/`off` (case-insensitive)
///
/// # Returns
/// The parsed boolean value, or `default` if not set.
fn env_bool(key: &str, default: bool) -> bool {
    std::env::var(key)
        .ok()
        .map(|s| matches!(s.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::sync::Mutex;

    use kra_connect_common::error::ErrorKind;
    use once_cell::sync::Lazy;
    use tempfile::NamedTempFile;

    use super::*;

    static ENV_LOCK: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

    const ALL_VARS: [&str; 12] = [
        "KRA_API_KEY",
        "KRA_BASE_URL",
        "KRA_TIMEOUT_SECS",
        "KRA_MAX_RETRIES",
        "KRA_INITIAL_DELAY_MS",
        "KRA_MAX_DELAY_MS",
        "KRA_RATE_LIMIT_ENABLED",
        "KRA_RATE_LIMIT_MAX_REQUESTS",
        "KRA_RATE_LIMIT_WINDOW_SECS",
        "KRA_CACHE_ENABLED",
        "KRA_CACHE_MAX_ENTRIES",
        "KRA_DEBUG",
    ];

    fn clear_env() {
        for key in ALL_VARS {
            std::env::remove_var(key);
        }
    }

    fn temp_config(contents: &str, extension: &str) -> PathBuf {
        let mut temp_file = NamedTempFile::new().expect("temp file");
        temp_file.write_all(contents.as_bytes()).expect("write temp file");
        let path = temp_file.path().with_extension(extension);
        std::fs::copy(temp_file.path(), &path).expect("copy temp file");
        path
    }

    #[test]
    fn test_env_bool_parsing() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");

        for value in ["1", "true", "yes", "on", "TRUE"] {
            std::env::set_var("KRA_TEST_BOOL", value);
            assert!(env_bool("KRA_TEST_BOOL", false), "{value} should be true");
        }
        for value in ["0", "false", "no", "off"] {
            std::env::set_var("KRA_TEST_BOOL", value);
            assert!(!env_bool("KRA_TEST_BOOL", true), "{value} should be false");
        }

        std::env::remove_var("KRA_TEST_BOOL");
        assert!(env_bool("KRA_TEST_BOOL", true));
        assert!(!env_bool("KRA_TEST_BOOL", false));
    }

    #[test]
    fn test_load_from_env_all_vars_set() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");
        clear_env();

        std::env::set_var("KRA_API_KEY", "abcdefghijklmnop");
        std::env::set_var("KRA_BASE_URL", "https://sandbox.kra.test/v1");
        std::env::set_var("KRA_TIMEOUT_SECS", "15");
        std::env::set_var("KRA_MAX_RETRIES", "5");
        std::env::set_var("KRA_INITIAL_DELAY_MS", "250");
        std::env::set_var("KRA_MAX_DELAY_MS", "4000");
        std::env::set_var("KRA_RATE_LIMIT_ENABLED", "false");
        std::env::set_var("KRA_RATE_LIMIT_MAX_REQUESTS", "20");
        std::env::set_var("KRA_RATE_LIMIT_WINDOW_SECS", "10");
        std::env::set_var("KRA_CACHE_ENABLED", "no");
        std::env::set_var("KRA_CACHE_MAX_ENTRIES", "64");
        std::env::set_var("KRA_DEBUG", "1");

        let result = load_from_env();
        clear_env();

        let config = result.expect("config from env");
        assert_eq!(config.api_key, "abcdefghijklmnop");
        assert_eq!(config.base_url, "https://sandbox.kra.test/v1");
        assert_eq!(config.timeout, Duration::from_secs(15));
        assert_eq!(config.retry.max_retries, 5);
        assert_eq!(config.retry.initial_delay, Duration::from_millis(250));
        assert_eq!(config.retry.max_delay, Duration::from_millis(4000));
        assert!(!config.rate_limit.enabled);
        assert_eq!(config.rate_limit.max_requests, 20);
        assert_eq!(config.rate_limit.window, Duration::from_secs(10));
        assert!(!config.cache.enabled);
        assert_eq!(config.cache.max_entries, 64);
        assert!(config.debug);
    }

    #[test]
    fn test_load_from_env_defaults() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");
        clear_env();
        std::env::set_var("KRA_API_KEY", "abcdefghijklmnop");

        let result = load_from_env();
        clear_env();

        let config = result.expect("config from env");
        assert_eq!(config, ClientConfig::new("abcdefghijklmnop"));
    }

    #[test]
    fn test_load_from_env_missing_key() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");
        clear_env();

        let err = load_from_env().expect_err("missing key");
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(err.to_string().contains("KRA_API_KEY"));
    }

    #[test]
    fn test_load_from_env_invalid_number() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");
        clear_env();
        std::env::set_var("KRA_API_KEY", "abcdefghijklmnop");
        std::env::set_var("KRA_MAX_RETRIES", "lots");

        let result = load_from_env();
        clear_env();

        let err = result.expect_err("invalid retries");
        assert!(err.to_string().contains("KRA_MAX_RETRIES"));
    }

    #[test]
    fn test_load_from_env_validates() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");
        clear_env();
        std::env::set_var("KRA_API_KEY", "abcdefghijklmnop");
        std::env::set_var("KRA_MAX_RETRIES", "11");

        let result = load_from_env();
        clear_env();

        assert_eq!(result.expect_err("too many retries").to_string(), "Max retries cannot exceed 10");
    }

    #[test]
    fn test_load_from_file_json() {
        let path = temp_config(
            r#"{
                "api_key": "abcdefghijklmnop",
                "timeout": 20000,
                "retry": { "max_retries": 2 },
                "cache": { "max_entries": 32 }
            }"#,
            "json",
        );

        let result = load_from_file(Some(path.clone()));
        std::fs::remove_file(path).ok();

        let config = result.expect("config from JSON file");
        assert_eq!(config.timeout, Duration::from_secs(20));
        assert_eq!(config.retry.max_retries, 2);
        assert_eq!(config.cache.max_entries, 32);
        assert_eq!(config.retry.initial_delay, Duration::from_secs(1));
    }

    #[test]
    fn test_load_from_file_toml() {
        let path = temp_config(
            r#"
api_key = "abcdefghijklmnop"
debug = true

[rate_limit]
enabled = false
"#,
            "toml",
        );

        let result = load_from_file(Some(path.clone()));
        std::fs::remove_file(path).ok();

        let config = result.expect("config from TOML file");
        assert!(config.debug);
        assert!(!config.rate_limit.enabled);
    }

    #[test]
    fn test_load_from_file_not_found() {
        let err = load_from_file(Some(PathBuf::from("/nonexistent/kra.json"))).expect_err("missing file");
        assert!(err.to_string().starts_with("Config file not found"));
    }

    #[test]
    fn test_load_from_file_rejects_invalid_config() {
        let path = temp_config(r#"{ "api_key": "short" }"#, "json");

        let result = load_from_file(Some(path.clone()));
        std::fs::remove_file(path).ok();

        assert_eq!(
            result.expect_err("short key").to_string(),
            "API key must be at least 16 characters long"
        );
    }

    #[test]
    fn test_parse_config_invalid_json() {
        let result = parse_config(r#"{ "this is": "not valid json" "#, Path::new("kra.json"));
        assert!(result.expect_err("invalid").to_string().starts_with("Invalid JSON format"));
    }

    #[test]
    fn test_parse_config_unsupported_format() {
        let result = parse_config("some content", Path::new("kra.yaml"));
        assert!(result.is_err(), "Should fail with unsupported format");
    }
}
