//! Configuration vault – reads/writes `~/.wheelbot/config.toml`.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use wheelbot_types::MotionPolicy;

/// Errors from loading or saving the config file.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Persisted settings for both the device server and the operator client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Address the command server binds.
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Milliseconds a client gets to send its request.
    #[serde(default = "default_read_timeout_ms")]
    pub read_timeout_ms: u64,

    /// Bytes read from one connection at most.
    #[serde(default = "default_max_request_bytes")]
    pub max_request_bytes: usize,

    /// Whether a new command stops the one still running.
    #[serde(default)]
    pub motion_policy: MotionPolicy,

    /// Base URL of the robot, used by `send` and `drive`.
    #[serde(default = "default_robot_url")]
    pub robot_url: String,

    /// Pause between repeated commands while a direction is held.
    #[serde(default = "default_repeat_interval_ms")]
    pub repeat_interval_ms: u64,

    /// HTML file served at `/` instead of the built-in page.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_path: Option<PathBuf>,
}

fn default_bind_addr() -> String {
    wheelbot_server::DEFAULT_ADDR.to_string()
}
fn default_read_timeout_ms() -> u64 {
    2000
}
fn default_max_request_bytes() -> usize {
    1024
}
fn default_robot_url() -> String {
    "http://192.168.4.1".to_string()
}
fn default_repeat_interval_ms() -> u64 {
    300
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            read_timeout_ms: default_read_timeout_ms(),
            max_request_bytes: default_max_request_bytes(),
            motion_policy: MotionPolicy::default(),
            robot_url: default_robot_url(),
            repeat_interval_ms: default_repeat_interval_ms(),
            page_path: None,
        }
    }
}

impl Config {
    /// Read the custom control page, if one is configured.
    pub fn load_page(&self) -> Result<Option<String>, ConfigError> {
        let Some(path) = &self.page_path else {
            return Ok(None);
        };
        fs::read_to_string(path)
            .map(Some)
            .map_err(|source| ConfigError::Read {
                path: path.clone(),
                source,
            })
    }
}

/// Return the path to `~/.wheelbot/config.toml`.
pub fn config_path() -> PathBuf {
    config_path_for_home(
        &std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .unwrap_or_else(|_| ".".to_string()),
    )
}

pub(crate) fn config_path_for_home(home: &str) -> PathBuf {
    PathBuf::from(home).join(".wheelbot").join("config.toml")
}

/// Load `~/.wheelbot/config.toml`, falling back to defaults when the file
/// is missing or unusable.  `WHEELBOT_*` overrides apply either way; an
/// unusable file is returned alongside so the caller can report it.
pub fn load() -> (Config, Option<ConfigError>) {
    load_or_default(&config_path())
}

pub(crate) fn load_or_default(path: &Path) -> (Config, Option<ConfigError>) {
    let (mut cfg, problem) = match load_from(path) {
        Ok(Some(cfg)) => (cfg, None),
        Ok(None) => (Config::default(), None),
        Err(e) => (Config::default(), Some(e)),
    };
    apply_env_overrides(&mut cfg);
    (cfg, problem)
}

/// Load the config from a specific path, without environment overrides.
pub(crate) fn load_from(path: &Path) -> Result<Option<Config>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(Some(toml::from_str(&raw)?))
}

/// Apply `WHEELBOT_*` environment variable overrides to `cfg`.
///
/// | Variable | Config field |
/// |---|---|
/// | `WHEELBOT_BIND_ADDR` | `bind_addr` |
/// | `WHEELBOT_ROBOT_URL` | `robot_url` |
/// | `WHEELBOT_READ_TIMEOUT_MS` | `read_timeout_ms` |
/// | `WHEELBOT_REPEAT_INTERVAL_MS` | `repeat_interval_ms` |
/// | `WHEELBOT_MOTION_POLICY` | `motion_policy` |
///
/// Values that do not parse are ignored.
pub fn apply_env_overrides(cfg: &mut Config) {
    if let Ok(v) = std::env::var("WHEELBOT_BIND_ADDR") {
        cfg.bind_addr = v;
    }
    if let Ok(v) = std::env::var("WHEELBOT_ROBOT_URL") {
        cfg.robot_url = v;
    }
    if let Ok(v) = std::env::var("WHEELBOT_READ_TIMEOUT_MS")
        && let Ok(ms) = v.parse::<u64>()
    {
        cfg.read_timeout_ms = ms;
    }
    if let Ok(v) = std::env::var("WHEELBOT_REPEAT_INTERVAL_MS")
        && let Ok(ms) = v.parse::<u64>()
    {
        cfg.repeat_interval_ms = ms;
    }
    if let Ok(v) = std::env::var("WHEELBOT_MOTION_POLICY")
        && let Ok(policy) = v.parse::<MotionPolicy>()
    {
        cfg.motion_policy = policy;
    }
}

/// Save the config to disk, creating `~/.wheelbot/` if necessary.
pub fn save(cfg: &Config) -> Result<(), ConfigError> {
    save_to(cfg, &config_path())
}

pub(crate) fn save_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    let write_err = |source| ConfigError::Write {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(write_err)?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(parent, fs::Permissions::from_mode(0o700)).map_err(write_err)?;
        }
    }

    let raw = toml::to_string_pretty(cfg)?;

    #[cfg(unix)]
    {
        use std::io::Write;
        use std::os::unix::fs::OpenOptionsExt;
        fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .mode(0o600)
            .open(path)
            .and_then(|mut f| f.write_all(raw.as_bytes()))
            .map_err(write_err)?;
    }
    #[cfg(not(unix))]
    fs::write(path, raw).map_err(write_err)?;

    Ok(())
}
