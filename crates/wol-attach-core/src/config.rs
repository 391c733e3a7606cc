//! Configuration resolution for wol-attach.
//!
//! Implements hierarchical config resolution:
//! 1. Built-in defaults
//! 2. Global config (~/.config/wol-attach/settings.json)
//! 3. Explicit config file (`--config`)
//! 4. Environment variables
//! 5. CLI arguments (highest priority, applied by the binary)

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Complete wol-attach configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub connection: ConnectionConfig,
    #[serde(default)]
    pub attach: AttachConfig,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            connection: ConnectionConfig::default(),
            attach: AttachConfig::default(),
            log_level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Where the machine API lives.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionConfig {
    /// Base WebSocket URL of the machine API (e.g. `ws://nas.lan:3030/machine`).
    pub server_url: String,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            server_url: "ws://127.0.0.1:3030/machine".to_string(),
        }
    }
}

/// Bridge behaviour.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttachConfig {
    /// Forward local input to the remote shell.
    pub bidirectional: bool,
    /// Wrap traffic in the session envelope.
    pub use_envelope: bool,
    /// Session id used inside the envelope.
    pub session_id: u32,
}

impl Default for AttachConfig {
    fn default() -> Self {
        Self {
            bidirectional: true,
            use_envelope: false,
            session_id: 0,
        }
    }
}

/// Load configuration with hierarchical resolution.
///
/// `explicit` is a file named on the command line; unlike the global file it
/// must exist.
pub fn load_config(explicit: Option<&Path>) -> Result<Config> {
    let global = global_config_path().filter(|p| p.exists());
    let mut config = load_layers(global.as_deref(), explicit)?;

    apply_env_overrides(&mut config);

    Ok(config)
}

/// Get the global config file path.
pub fn global_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("wol-attach").join("settings.json"))
}

/// Merge the config files over the built-in defaults, later files winning.
///
/// Each file may set any subset of keys; keys it leaves out keep the value
/// from the layers below it.
fn load_layers(global: Option<&Path>, explicit: Option<&Path>) -> Result<Config> {
    let mut merged = serde_json::to_value(Config::default())?;

    for path in global.into_iter().chain(explicit) {
        merge_config(&mut merged, read_config_file(path)?);
    }

    serde_json::from_value(merged)
        .map_err(|e| Error::Config(format!("Invalid configuration: {e}")))
}

fn read_config_file(path: &Path) -> Result<Value> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        Error::Config(format!(
            "Failed to read config file {}: {}",
            path.display(),
            e
        ))
    })?;
    serde_json::from_str(&content).map_err(|e| {
        Error::Config(format!(
            "Failed to parse config file {}: {}",
            path.display(),
            e
        ))
    })
}

/// Overlay `overlay` onto `base`, recursing into objects.
fn merge_config(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (Value::Object(base), Value::Object(overlay)) => {
            for (key, value) in overlay {
                match base.get_mut(&key) {
                    Some(slot) => merge_config(slot, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (slot, overlay) => *slot = overlay,
    }
}

fn apply_env_overrides(config: &mut Config) {
    apply_overrides(config, |key| std::env::var(key).ok());
}

fn apply_overrides(config: &mut Config, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(val) = lookup("WOL_ATTACH_SERVER_URL") {
        config.connection.server_url = val;
    }
    if let Some(val) = lookup("WOL_ATTACH_LOG_LEVEL") {
        config.log_level = val;
    }
    if let Some(val) = lookup("WOL_ATTACH_BIDIRECTIONAL")
        && let Ok(b) = val.parse()
    {
        config.attach.bidirectional = b;
    }
}

/// Build the terminal WebSocket URL for `machine`: `{base}/{machine}/connect`.
pub fn connect_url(server_url: &str, machine: &str) -> Result<String> {
    if machine.is_empty() || machine.contains('/') {
        return Err(Error::Config(format!("Invalid machine name: {machine:?}")));
    }
    if !(server_url.starts_with("ws://") || server_url.starts_with("wss://")) {
        return Err(Error::Config(format!(
            "Server URL must use ws:// or wss://: {server_url}"
        )));
    }
    Ok(format!(
        "{}/{}/connect",
        server_url.trim_end_matches('/'),
        machine
    ))
}
