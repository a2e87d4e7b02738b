#![forbid(unsafe_code)]

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

pub const CONFIG_PATH_ENV: &str = "VOXTASK_CONFIG_PATH";
pub const STORAGE_DIR_KEY: &str = "VOXTASK_STORAGE_DIR";
pub const BUSY_TIMEOUT_KEY: &str = "VOXTASK_BUSY_TIMEOUT_MS";
pub const LOG_KEY: &str = "VOXTASK_LOG";

const DEFAULT_STORAGE_DIR: &str = ".voxtask";
const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;
const MAX_BUSY_TIMEOUT_MS: u64 = 600_000;
const DEFAULT_LOG_FILTER: &str = "info";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServerConfig {
    pub storage_dir: PathBuf,
    pub busy_timeout: Duration,
    /// Default `tracing` filter; `RUST_LOG` still wins when set.
    pub log_filter: String,
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("{code}: {message}")]
pub struct ConfigError {
    pub code: &'static str,
    pub message: String,
}

impl ServerConfig {
    /// Layers, lowest first: the `KEY=VALUE` file named by `VOXTASK_CONFIG_PATH`, the process
    /// environment, then `--storage-dir` from the command line.
    pub fn load(cli_storage_dir: Option<PathBuf>) -> Result<Self, ConfigError> {
        let mut merged = HashMap::new();

        if let Ok(config_path) = std::env::var(CONFIG_PATH_ENV) {
            let config_path = config_path.trim();
            if !config_path.is_empty() {
                merged.extend(parse_env_file(config_path)?);
            }
        }

        merged.extend(std::env::vars());

        let mut config = Self::from_kv(&merged)?;
        if let Some(dir) = cli_storage_dir {
            config.storage_dir = dir;
        }
        Ok(config)
    }

    pub fn from_kv(kv: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let storage_dir = kv
            .get(STORAGE_DIR_KEY)
            .map(|value| value.trim())
            .filter(|value| !value.is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_STORAGE_DIR));

        let busy_timeout_ms =
            parse_u64(kv.get(BUSY_TIMEOUT_KEY), DEFAULT_BUSY_TIMEOUT_MS, BUSY_TIMEOUT_KEY)?;
        if busy_timeout_ms > MAX_BUSY_TIMEOUT_MS {
            return Err(ConfigError {
                code: "ERR_INVALID_CONFIG",
                message: format!("{BUSY_TIMEOUT_KEY} must be <= {MAX_BUSY_TIMEOUT_MS}"),
            });
        }

        let log_filter = kv
            .get(LOG_KEY)
            .map(|value| value.trim())
            .filter(|value| !value.is_empty())
            .unwrap_or(DEFAULT_LOG_FILTER)
            .to_string();

        Ok(Self {
            storage_dir,
            busy_timeout: Duration::from_millis(busy_timeout_ms),
            log_filter,
        })
    }
}

pub(crate) fn parse_env_file(path: &str) -> Result<HashMap<String, String>, ConfigError> {
    let contents = std::fs::read_to_string(path).map_err(|_| ConfigError {
        code: "ERR_CONFIG_FILE_READ",
        message: format!("failed to read config file at {path}"),
    })?;
    parse_env_lines(&contents)
}

pub(crate) fn parse_env_lines(contents: &str) -> Result<HashMap<String, String>, ConfigError> {
    let mut kv = HashMap::new();

    for (idx, raw_line) in contents.lines().enumerate() {
        let line = raw_line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let (key, value) = line.split_once('=').ok_or_else(|| ConfigError {
            code: "ERR_CONFIG_FILE_PARSE",
            message: format!("invalid config line {} (expected KEY=VALUE)", idx + 1),
        })?;

        let key = key.trim();
        if key.is_empty() {
            return Err(ConfigError {
                code: "ERR_CONFIG_FILE_PARSE",
                message: format!("invalid config line {} (empty key)", idx + 1),
            });
        }

        let value = value.trim().trim_matches('"');
        kv.insert(key.to_string(), value.to_string());
    }

    Ok(kv)
}

fn parse_u64(value: Option<&String>, default: u64, key: &'static str) -> Result<u64, ConfigError> {
    match value {
        None => Ok(default),
        Some(v) if v.trim().is_empty() => Ok(default),
        Some(v) => v.trim().parse::<u64>().map_err(|_| ConfigError {
            code: "ERR_INVALID_CONFIG",
            message: format!("{key} must be an integer"),
        }),
    }
}
