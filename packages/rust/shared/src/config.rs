//! Application configuration for harvestdoc.
//!
//! User config lives at `~/.harvestdoc/harvestdoc.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{HarvestError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "harvestdoc.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".harvestdoc";

// ---------------------------------------------------------------------------
// Config structs (matching harvestdoc.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Remote API client settings.
    #[serde(default)]
    pub client: ClientConfig,

    /// HTTP service settings.
    #[serde(default)]
    pub server: ServerConfig,
}

/// `[client]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Whole-request timeout for the concepts API.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Lowest TLS version the client will negotiate.
    #[serde(default)]
    pub min_tls_version: TlsFloor,

    /// `User-Agent` header sent to the API.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            min_tls_version: TlsFloor::default(),
            user_agent: default_user_agent(),
        }
    }
}

fn default_timeout_secs() -> u64 {
    5
}
fn default_user_agent() -> String {
    concat!("harvestdoc/", env!("CARGO_PKG_VERSION")).into()
}

/// Minimum TLS protocol version.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TlsFloor {
    #[default]
    #[serde(rename = "1.2")]
    Tls12,
    #[serde(rename = "1.3")]
    Tls13,
}

/// `[server]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Interface to bind.
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to bind.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".into()
}
fn default_port() -> u16 {
    8080
}

// ---------------------------------------------------------------------------
// Transport policy (runtime, handed to the remote client)
// ---------------------------------------------------------------------------

/// Immutable transport settings for the remote catalog client.
///
/// The client is built on rustls, whose TLS 1.2 suites are all ECDHE, so
/// every negotiated session is forward-secret regardless of the floor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportPolicy {
    /// Whole-request timeout.
    pub timeout: Duration,
    /// Lowest TLS version to negotiate.
    pub min_tls_version: TlsFloor,
    /// `User-Agent` header value.
    pub user_agent: String,
}

impl Default for TransportPolicy {
    fn default() -> Self {
        Self::from(&ClientConfig::default())
    }
}

impl From<&ClientConfig> for TransportPolicy {
    fn from(config: &ClientConfig) -> Self {
        Self {
            timeout: Duration::from_secs(config.timeout_secs),
            min_tls_version: config.min_tls_version,
            user_agent: config.user_agent.clone(),
        }
    }
}

impl From<&AppConfig> for TransportPolicy {
    fn from(config: &AppConfig) -> Self {
        Self::from(&config.client)
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.harvestdoc/`).
pub fn config_dir() -> Result<PathBuf> {
    let home =
        dirs::home_dir().ok_or_else(|| HarvestError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.harvestdoc/harvestdoc.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = match config_file_path() {
        Ok(path) => path,
        Err(e) => {
            tracing::debug!(error = %e, "no home directory, using default config");
            return Ok(AppConfig::default());
        }
    };

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| HarvestError::config(format!("failed to read {}: {e}", path.display())))?;

    let config = toml::from_str(&content).map_err(|e| {
        HarvestError::config(format!("failed to parse {}: {e}", path.display()))
    })?;
    tracing::debug!(?path, "loaded config file");

    Ok(config)
}
